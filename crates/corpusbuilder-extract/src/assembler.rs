//! Per-article metadata assembly.

use std::path::Path;

use corpusbuilder_core::{
    ArticleMetadata, AuthorRecord, FigureRecord, HtmlTable, ImageTable, PublicationDate,
    Publisher, TableRecord,
};
use tracing::debug;

use crate::affiliation::{AffiliationIdMap, AffiliationResolver};
use crate::dom::{Document, Node};
use crate::error::Result;
use crate::text::clean_label;

/// Builds one `ArticleMetadata` record from a parsed archive document.
#[derive(Clone, Default)]
pub struct MetadataAssembler {
    resolver: AffiliationResolver,
}

impl MetadataAssembler {
    pub fn new(resolver: AffiliationResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &AffiliationResolver {
        &self.resolver
    }

    /// Read and parse `document`, then assemble its record. Only an unreadable
    /// or unparsable document is an error.
    pub fn assemble(
        &self,
        pmc_id: &str,
        document: &Path,
        license: &str,
        images: &[String],
    ) -> Result<ArticleMetadata> {
        let doc = Document::from_path(document)?;
        let source_file = document.to_string_lossy().replace('\\', "/");
        Ok(self.assemble_document(pmc_id, &source_file, &doc, license, images))
    }

    /// Assemble an already parsed document. Never fails: every missing or
    /// malformed field degrades to its empty value.
    pub fn assemble_document(
        &self,
        pmc_id: &str,
        source_file: &str,
        doc: &Document,
        license: &str,
        images: &[String],
    ) -> ArticleMetadata {
        let root = doc.root();
        let affiliations = self.resolver.resolve_all(root);

        let mut article = ArticleMetadata::new(pmc_id, license);
        article.metadata.article_title = article_title(root);

        let provenance = &mut article.metadata.provenance;
        provenance.source_file = source_file.to_string();
        provenance.authors = authors(root, &affiliations);
        provenance.publisher = publisher(root);
        provenance.publication_date = publication_date(root);
        provenance.funding_group = funding_group(root);

        article.figures = figures(root, images);
        for table in tables(root) {
            article.push_table(table);
        }

        debug!(
            pmc_id,
            affiliations = affiliations.len(),
            authors = article.metadata.provenance.authors.len(),
            figures = article.figures.len(),
            html_tables = article.html_tables.len(),
            image_tables = article.image_tables.len(),
            "assembled article"
        );
        article
    }
}

/// First non-empty `article-title` inside a `title-group`.
pub fn article_title(root: &Node) -> String {
    root.find_all("title-group")
        .into_iter()
        .flat_map(|group| group.find_all("article-title"))
        .map(|title| title.text().trim().to_string())
        .find(|title| !title.is_empty())
        .unwrap_or_default()
}

/// Every `contrib` of type `author` under `article-meta`, with its
/// affiliation cross-references resolved through `affiliations`.
pub fn authors(root: &Node, affiliations: &AffiliationIdMap) -> Vec<AuthorRecord> {
    let Some(article_meta) = root.find("article-meta") else {
        return Vec::new();
    };

    article_meta
        .find_all("contrib")
        .into_iter()
        .filter(|contrib| contrib.attr("contrib-type") == Some("author"))
        .map(|contrib| AuthorRecord {
            surname: contrib.find_text("surname").unwrap_or_default(),
            given_names: contrib.find_text("given-names").unwrap_or_default(),
            affiliations: contrib
                .find_all("xref")
                .into_iter()
                .filter(|xref| xref.attr("ref-type") == Some("aff"))
                .filter_map(|xref| xref.attr("rid"))
                .flat_map(str::split_whitespace)
                .filter_map(|rid| affiliations.get(rid).cloned())
                .collect(),
        })
        .collect()
}

/// Journal title plus the `journal-meta` publisher block.
pub fn publisher(root: &Node) -> Publisher {
    let journal_name = root
        .find("journal-title-group")
        .and_then(|group| group.find_text("journal-title"))
        .unwrap_or_default();

    let block = root
        .find("journal-meta")
        .and_then(|meta| meta.find("publisher"));
    let field = |tag: &str| {
        block
            .and_then(|publisher| publisher.find_text(tag))
            .unwrap_or_default()
    };

    Publisher {
        journal_name,
        publisher_name: field("publisher-name"),
        publisher_location: field("publisher-loc"),
    }
}

/// The electronic publication date. `pub-type="epub…"` dates win over
/// `date-type="pub…" publication-format="electronic…"` ones; among several
/// candidates the last one counts.
pub fn publication_date(root: &Node) -> PublicationDate {
    let epub = root.select("pub-date", &[("pub-type", "epub")]);
    let candidates = if epub.is_empty() {
        root.select(
            "pub-date",
            &[("date-type", "pub"), ("publication-format", "electronic")],
        )
    } else {
        epub
    };

    candidates
        .last()
        .map(|date| PublicationDate {
            day: date_part(date, "day"),
            month: date_part(date, "month"),
            year: date_part(date, "year"),
        })
        .unwrap_or_default()
}

fn date_part<T: std::str::FromStr>(date: &Node, tag: &str) -> Option<T> {
    date.find_text(tag)
        .and_then(|text| text.trim().parse().ok())
}

/// `funding-group/funding-source`, else `grant-num/grant-sponsor`.
pub fn funding_group(root: &Node) -> String {
    let source = root
        .find("funding-group")
        .and_then(|group| group.find_text("funding-source"));
    let sponsor = || {
        root.find("grant-num")
            .and_then(|grant| grant.find_text("grant-sponsor"))
    };
    source
        .or_else(sponsor)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// Every `fig` element with the image files whose path contains its graphic
/// reference.
pub fn figures(root: &Node, images: &[String]) -> Vec<FigureRecord> {
    root.find_all("fig")
        .into_iter()
        .map(|fig| {
            let graphic = fig
                .find("graphic")
                .and_then(|g| g.attr("xlink:href"))
                .unwrap_or_default()
                .to_string();
            let files = if graphic.is_empty() {
                Vec::new()
            } else {
                images
                    .iter()
                    .filter(|file| file.contains(graphic.as_str()))
                    .map(|file| file.replace('\\', "/"))
                    .collect()
            };

            FigureRecord {
                caption: fig
                    .find_text("caption")
                    .map(|text| text.trim().to_string())
                    .unwrap_or_default(),
                id: fig.find_text("label").map(|l| clean_label(&l)).unwrap_or_default(),
                graphic,
                files,
                references: Vec::new(),
            }
        })
        .collect()
}

/// Every `table-wrap`, classified by whether it holds a `<table>`. Caption,
/// footer, image and table are kept as markup.
pub fn tables(root: &Node) -> Vec<TableRecord> {
    root.find_all("table-wrap")
        .into_iter()
        .map(|wrap| {
            let markup = |tag: &str| wrap.find(tag).map(Node::to_markup).unwrap_or_default();
            let id = wrap
                .find_text("label")
                .map(|label| clean_label(&label))
                .unwrap_or_default();

            match wrap.find("table") {
                Some(table) => TableRecord::Html(HtmlTable {
                    id,
                    table_html: table.to_markup(),
                    table_caption: markup("caption"),
                    table_footer: markup("table-wrap-foot"),
                    table_image: markup("graphic"),
                    references: Vec::new(),
                }),
                None => TableRecord::Image(ImageTable {
                    id,
                    table_image: markup("graphic"),
                    table_caption: markup("caption"),
                    table_footer: markup("table-wrap-foot"),
                    references: Vec::new(),
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpusbuilder_core::AffiliationRecord;
    use std::io::Write;

    const ARTICLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE article PUBLIC "-//NLM//DTD JATS (Z39.96) Journal Archiving and Interchange DTD v1.2 20190208//EN" "JATS-archivearticle1.dtd">
<article xmlns:xlink="http://www.w3.org/1999/xlink" article-type="research-article">
  <front>
    <journal-meta>
      <journal-title-group><journal-title>Vaccines</journal-title></journal-title-group>
      <publisher><publisher-name>MDPI</publisher-name><publisher-loc>Basel</publisher-loc></publisher>
    </journal-meta>
    <article-meta>
      <title-group><article-title> Biofilm Formation&#x000a0;in <italic>E. coli</italic> </article-title></title-group>
      <contrib-group>
        <contrib contrib-type="author">
          <name><surname>Pruess</surname><given-names>Birgit</given-names></name>
          <xref ref-type="aff" rid="af1 af2"/>
          <xref ref-type="aff" rid="missing"/>
          <xref ref-type="corresp" rid="c1">*</xref>
        </contrib>
        <contrib contrib-type="editor">
          <name><surname>Editor</surname><given-names>Some</given-names></name>
        </contrib>
        <contrib contrib-type="author">
          <name><surname>Kovacs</surname></name>
        </contrib>
      </contrib-group>
      <aff id="af1"><institution>Bizkaisida</institution>, <addr-line>Bilbao</addr-line>, <country>Spain</country></aff>
      <aff id="af2"><institution-wrap><institution>UC Berkeley, </institution></institution-wrap>Berkeley, CA 94720 USA</aff>
      <pub-date pub-type="ppub"><year>2019</year></pub-date>
      <pub-date pub-type="epub"><day>7</day><month>x</month><year>2020</year></pub-date>
      <pub-date pub-type="epub-original"><day>12</day><month>01</month><year>2021</year></pub-date>
      <funding-group><award-group><funding-source>National Science Foundation</funding-source></award-group></funding-group>
    </article-meta>
  </front>
  <body>
    <fig id="f1"><label>Figure 1.</label><caption><p>Growth curves.</p></caption><graphic xlink:href="vaccines-09-00030-g001"/></fig>
    <fig id="f2"><label>Figure 2.</label><graphic xlink:href=""/></fig>
    <table-wrap id="t1"><label>Table 1.</label><caption><p>Strains.</p></caption><table><tr><td>K-12</td></tr></table><table-wrap-foot><p>n = 3</p></table-wrap-foot></table-wrap>
    <table-wrap id="t2"><label>Table 2</label><graphic xlink:href="t2.jpg"/></table-wrap>
  </body>
</article>"#;

    fn article() -> ArticleMetadata {
        let doc = Document::parse(ARTICLE).unwrap();
        let images = vec![
            "PMC7824000\\vaccines-09-00030-g001.jpg".to_string(),
            "PMC7824000/vaccines-09-00030-g002.jpg".to_string(),
        ];
        MetadataAssembler::default().assemble_document(
            "PMC7824000",
            "PMC7824000/vaccines-09-00030.nxml",
            &doc,
            "CC BY",
            &images,
        )
    }

    #[test]
    fn test_title_journal_and_funding() {
        let article = article();
        assert_eq!(article.pmc_id, "PMC7824000");
        assert_eq!(article.metadata.license, "CC BY");
        assert_eq!(article.metadata.article_title, "Biofilm Formation in E. coli");

        let provenance = &article.metadata.provenance;
        assert_eq!(provenance.source_file, "PMC7824000/vaccines-09-00030.nxml");
        assert_eq!(
            provenance.publisher,
            Publisher {
                journal_name: "Vaccines".into(),
                publisher_name: "MDPI".into(),
                publisher_location: "Basel".into(),
            }
        );
        assert_eq!(provenance.funding_group, "National Science Foundation");
    }

    #[test]
    fn test_authors_resolve_known_affiliations_only() {
        let article = article();
        let authors = &article.metadata.provenance.authors;
        assert_eq!(authors.len(), 2);

        assert_eq!(authors[0].surname, "Pruess");
        assert_eq!(authors[0].given_names, "Birgit");
        assert_eq!(
            authors[0].affiliations,
            vec![
                AffiliationRecord::new("Bizkaisida", "Bilbao", "Spain"),
                AffiliationRecord::new("UC Berkeley", "Berkeley, CA 94720", "USA"),
            ]
        );

        assert_eq!(authors[1].surname, "Kovacs");
        assert_eq!(authors[1].given_names, "");
        assert!(authors[1].affiliations.is_empty());
    }

    #[test]
    fn test_last_epub_date_wins_and_bad_parts_are_empty() {
        let date = article().metadata.provenance.publication_date;
        assert_eq!(
            date,
            PublicationDate {
                day: Some(12),
                month: Some(1),
                year: Some(2021)
            }
        );

        let doc = Document::parse(
            r#"<article-meta><pub-date pub-type="epub"><day>7</day><month>x</month><year>2020</year></pub-date></article-meta>"#,
        )
        .unwrap();
        let date = publication_date(doc.root());
        assert_eq!(date.day, Some(7));
        assert_eq!(date.month, None);
        assert_eq!(date.year, Some(2020));
    }

    #[test]
    fn test_electronic_pub_date_fallback() {
        let doc = Document::parse(
            r#"<article-meta>
                <pub-date date-type="collection"><year>2018</year></pub-date>
                <pub-date date-type="pub" publication-format="electronic"><day>3</day><month>4</month><year>2022</year></pub-date>
            </article-meta>"#,
        )
        .unwrap();
        let date = publication_date(doc.root());
        assert_eq!(date.year, Some(2022));
        assert_eq!(date.month, Some(4));

        let none = Document::parse("<article-meta/>").unwrap();
        assert!(publication_date(none.root()).is_empty());
    }

    #[test]
    fn test_grant_sponsor_fallback() {
        let doc = Document::parse(
            "<article-meta><grant-num>R01<grant-sponsor> NIH </grant-sponsor></grant-num></article-meta>",
        )
        .unwrap();
        assert_eq!(funding_group(doc.root()), "NIH");

        let empty = Document::parse("<article-meta/>").unwrap();
        assert_eq!(funding_group(empty.root()), "");
    }

    #[test]
    fn test_figures_match_image_files() {
        let figures = article().figures;
        assert_eq!(figures.len(), 2);

        assert_eq!(figures[0].id, "Figure 1");
        assert_eq!(figures[0].caption, "Growth curves.");
        assert_eq!(figures[0].graphic, "vaccines-09-00030-g001");
        assert_eq!(
            figures[0].files,
            vec!["PMC7824000/vaccines-09-00030-g001.jpg".to_string()]
        );
        assert!(figures[0].references.is_empty());

        // An empty graphic reference matches nothing.
        assert_eq!(figures[1].graphic, "");
        assert!(figures[1].files.is_empty());
    }

    #[test]
    fn test_tables_split_by_markup() {
        let article = article();
        assert_eq!(article.html_tables.len(), 1);
        assert_eq!(article.image_tables.len(), 1);

        let html = &article.html_tables[0];
        assert_eq!(html.id, "Table 1");
        assert_eq!(html.table_html, "<table><tr><td>K-12</td></tr></table>");
        assert_eq!(html.table_caption, "<caption><p>Strains.</p></caption>");
        assert_eq!(html.table_footer, "<table-wrap-foot><p>n = 3</p></table-wrap-foot>");
        assert_eq!(html.table_image, "");

        let image = &article.image_tables[0];
        assert_eq!(image.id, "Table 2");
        assert_eq!(image.table_image, r#"<graphic xlink:href="t2.jpg"/>"#);
        assert_eq!(image.table_caption, "");
    }

    #[test]
    fn test_article_without_figures_serializes_empty_list() {
        let doc = Document::parse(
            "<article><front><article-meta><title-group><article-title>Plain</article-title></title-group></article-meta></front></article>",
        )
        .unwrap();
        let article = MetadataAssembler::default().assemble_document("PMC1", "PMC1/a.nxml", &doc, "CC0", &[]);

        let value = serde_json::to_value(&article).unwrap();
        assert_eq!(value["figures"], serde_json::json!([]));
        assert_eq!(value["html_tables"], serde_json::json!([]));
        assert_eq!(value["metadata"]["provenance"]["authors"], serde_json::json!([]));
    }

    #[test]
    fn test_assemble_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("article.nxml");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(ARTICLE.as_bytes())
            .unwrap();

        let article = MetadataAssembler::default()
            .assemble("PMC7824000", &path, "CC BY", &[])
            .unwrap();
        assert_eq!(article.metadata.provenance.authors.len(), 2);
        assert!(article.metadata.provenance.source_file.ends_with("article.nxml"));
        assert!(article.figures[0].files.is_empty());

        let missing = MetadataAssembler::default().assemble("PMC0", &dir.path().join("nope.nxml"), "CC BY", &[]);
        assert!(missing.is_err());
    }
}
