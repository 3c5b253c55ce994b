//! Output records for one extracted article.
//!
//! Every field is always present in the serialized form; an empty string,
//! an empty list or `null` stands for "not found in the source document".

use serde::{Deserialize, Serialize};

/// A resolved `{name, location, country}` triple for one affiliation block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AffiliationRecord {
    pub name: String,
    pub location: String,
    pub country: String,
}

impl AffiliationRecord {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            country: country.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.location.is_empty() && self.country.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub surname: String,
    pub given_names: String,
    pub affiliations: Vec<AffiliationRecord>,
}

/// Day, month and year are independently optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationDate {
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl PublicationDate {
    pub fn is_empty(&self) -> bool {
        self.day.is_none() && self.month.is_none() && self.year.is_none()
    }
}

/// Journal title merged with the publisher block of `journal-meta`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    pub journal_name: String,
    pub publisher_name: String,
    pub publisher_location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureRecord {
    pub caption: String,
    /// Image reference token from the figure's `graphic` element.
    pub graphic: String,
    /// Cleaned figure label, e.g. `Fig 1`.
    pub id: String,
    pub files: Vec<String>,
    pub references: Vec<String>,
}

/// A table that carries real tabular markup. Caption, footer and image are
/// kept as literal markup snippets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlTable {
    pub id: String,
    pub table_html: String,
    pub table_caption: String,
    pub table_footer: String,
    pub table_image: String,
    pub references: Vec<String>,
}

/// A table that only exists as a rendered image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTable {
    pub id: String,
    pub table_image: String,
    pub table_caption: String,
    pub table_footer: String,
    pub references: Vec<String>,
}

/// One `table-wrap` element, classified by whether it holds a `<table>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRecord {
    Html(HtmlTable),
    Image(ImageTable),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_file: String,
    pub authors: Vec<AuthorRecord>,
    pub publisher: Publisher,
    pub publication_date: PublicationDate,
    pub funding_group: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleInfo {
    pub license: String,
    pub article_title: String,
    pub provenance: Provenance,
}

/// The structured record emitted for one article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub pmc_id: String,
    pub metadata: ArticleInfo,
    pub html_tables: Vec<HtmlTable>,
    pub image_tables: Vec<ImageTable>,
    pub figures: Vec<FigureRecord>,
}

impl ArticleMetadata {
    pub fn new(pmc_id: impl Into<String>, license: impl Into<String>) -> Self {
        Self {
            pmc_id: pmc_id.into(),
            metadata: ArticleInfo {
                license: license.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Route each table to the list matching its shape.
    pub fn push_table(&mut self, table: TableRecord) {
        match table {
            TableRecord::Html(table) => self.html_tables.push(table),
            TableRecord::Image(table) => self.image_tables.push(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_article_serializes_every_field() {
        let article = ArticleMetadata::new("PMC1", "CC BY");
        let value = serde_json::to_value(&article).unwrap();

        assert_eq!(value["pmc_id"], "PMC1");
        assert_eq!(value["metadata"]["license"], "CC BY");
        assert_eq!(value["metadata"]["article_title"], "");
        assert_eq!(value["figures"], serde_json::json!([]));
        assert_eq!(value["html_tables"], serde_json::json!([]));
        assert_eq!(value["image_tables"], serde_json::json!([]));

        let provenance = &value["metadata"]["provenance"];
        assert_eq!(provenance["source_file"], "");
        assert_eq!(provenance["authors"], serde_json::json!([]));
        assert_eq!(provenance["funding_group"], "");
        assert!(provenance["publication_date"]["day"].is_null());
        assert_eq!(provenance["publisher"]["journal_name"], "");
    }

    #[test]
    fn test_push_table_routes_by_shape() {
        let mut article = ArticleMetadata::default();
        article.push_table(TableRecord::Html(HtmlTable {
            id: "Table 1".to_string(),
            ..Default::default()
        }));
        article.push_table(TableRecord::Image(ImageTable {
            id: "Table 2".to_string(),
            ..Default::default()
        }));

        assert_eq!(article.html_tables.len(), 1);
        assert_eq!(article.image_tables.len(), 1);
        assert_eq!(article.image_tables[0].id, "Table 2");
    }

    #[test]
    fn test_affiliation_record_emptiness() {
        assert!(AffiliationRecord::default().is_empty());
        assert!(!AffiliationRecord::new("", "", "Spain").is_empty());
    }
}
