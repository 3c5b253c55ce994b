//! Affiliation resolution: turn one `<aff>` block into a
//! `{name, location, country}` record.
//!
//! The cascade, first match wins:
//!
//! 1. `institution-wrap` present: the name is every nested `institution`, and
//!    the text left after removing the wrapper and label is the address.
//! 2. bare `institution` present: same, also dropping superscripts and
//!    `named-content`.
//! 3. neither: the whole remaining text is an address sentence. The country is
//!    peeled off with the gazetteer and the entity splitter separates the
//!    institution from the location.
//!
//! In the structural branches an explicit `addr-line`/`city` or `country` tag
//! overrides the value derived from free text.

use std::sync::Arc;

use corpusbuilder_core::{AffiliationRecord, ExtractConfig};
use indexmap::IndexMap;
use tracing::trace;

use crate::dom::Node;
use crate::entities::{EntityRecognizer, LexiconRecognizer};
use crate::gazetteer::Gazetteer;
use crate::splitter::split_name_location;
use crate::text::strip_trailing_comma;

/// Affiliation id (or positional index) → resolved record, in document order.
pub type AffiliationIdMap = IndexMap<String, AffiliationRecord>;

const WRAPPED_NOISE: &[&str] = &["institution-wrap", "label"];
const INSTITUTION_NOISE: &[&str] = &["institution", "label", "sup", "named-content"];
const FREE_TEXT_NOISE: &[&str] = &[
    "institution-wrap",
    "institution",
    "label",
    "sup",
    "email",
    "named-content",
];

#[derive(Clone)]
pub struct AffiliationResolver {
    gazetteer: Arc<Gazetteer>,
    recognizer: Arc<dyn EntityRecognizer>,
}

impl Default for AffiliationResolver {
    fn default() -> Self {
        Self::new(Gazetteer::standard(), Arc::new(LexiconRecognizer))
    }
}

impl AffiliationResolver {
    pub fn new(gazetteer: Gazetteer, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self {
            gazetteer: Arc::new(gazetteer),
            recognizer,
        }
    }

    /// Standard gazetteer under the configured match policy, with the
    /// rule-based recognizer.
    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(
            Gazetteer::standard().with_policy(config.country_match),
            Arc::new(LexiconRecognizer),
        )
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    /// Resolve a single affiliation element. Never fails; missing parts are
    /// left empty.
    pub fn resolve(&self, aff: &Node) -> AffiliationRecord {
        let record = if aff.contains("institution-wrap") {
            self.resolve_structured(aff, WRAPPED_NOISE)
        } else if aff.contains("institution") {
            self.resolve_structured(aff, INSTITUTION_NOISE)
        } else {
            self.resolve_free_text(aff)
        };
        trace!(?record, "resolved affiliation");
        record
    }

    /// Resolve every `aff` element below `root`. Elements without an `id`
    /// attribute are keyed by their position among all affiliations.
    pub fn resolve_all(&self, root: &Node) -> AffiliationIdMap {
        root.find_all("aff")
            .into_iter()
            .enumerate()
            .map(|(position, aff)| {
                let id = aff
                    .attr("id")
                    .map(str::to_string)
                    .unwrap_or_else(|| position.to_string());
                (id, self.resolve(aff))
            })
            .collect()
    }

    fn resolve_structured(&self, aff: &Node, noise: &[&str]) -> AffiliationRecord {
        let name = institution_name(aff);
        let remaining = aff.without(noise).text();
        let derived = self.gazetteer.separate(remaining.trim());

        let location = address_line(aff).unwrap_or(derived.location);
        let country = country_tag(aff).unwrap_or(derived.country);

        AffiliationRecord {
            name,
            location,
            country,
        }
    }

    fn resolve_free_text(&self, aff: &Node) -> AffiliationRecord {
        let sentence = aff.without(FREE_TEXT_NOISE).text();
        let separated = self.gazetteer.separate(sentence.trim());
        let split = split_name_location(self.recognizer.as_ref(), &separated.location);

        AffiliationRecord {
            name: split.name,
            location: split.location,
            country: separated.country,
        }
    }
}

/// All `institution` texts concatenated, trailing comma removed.
fn institution_name(aff: &Node) -> String {
    let joined: String = aff
        .find_all("institution")
        .into_iter()
        .map(Node::text)
        .collect();
    strip_trailing_comma(&joined)
}

/// Text of `addr-line`, else `city`, when non-empty.
fn address_line(aff: &Node) -> Option<String> {
    ["addr-line", "city"]
        .iter()
        .filter_map(|tag| aff.find_text(tag))
        .next()
        .filter(|text| !text.is_empty())
}

fn country_tag(aff: &Node) -> Option<String> {
    aff.find_text("country").filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::entities::{EntityKind, EntitySpan};

    fn resolve(xml: &str) -> AffiliationRecord {
        resolve_with(&AffiliationResolver::default(), xml)
    }

    fn resolve_with(resolver: &AffiliationResolver, xml: &str) -> AffiliationRecord {
        let doc = Document::parse(xml).unwrap();
        resolver.resolve(doc.find("aff").unwrap())
    }

    #[test]
    fn test_institution_wrap_with_trailing_country() {
        let record = resolve(
            "<aff><institution-wrap><institution>Division of Environmental Health Sciences, </institution><institution>UC Berkeley, </institution></institution-wrap>Berkeley, CA 94720 USA</aff>",
        );
        assert_eq!(
            record,
            AffiliationRecord::new(
                "Division of Environmental Health Sciences, UC Berkeley",
                "Berkeley, CA 94720",
                "USA"
            )
        );
    }

    #[test]
    fn test_institution_wrap_with_ids_and_label() {
        let record = resolve(
            r#"<aff id="Aff3"><label>3</label><institution-wrap><institution-id institution-id-type="GRID">grid.16463.36</institution-id><institution-id institution-id-type="ISNI">0000 0001 0723 4123</institution-id><institution>School of Mathematical Sciences, </institution><institution>University of Kwazulu-Natal, </institution></institution-wrap>Durban, 4000 South Africa </aff>"#,
        );
        assert_eq!(record.name, "School of Mathematical Sciences, University of Kwazulu-Natal");
        assert_eq!(record.location, "Durban, 4000");
        assert_eq!(record.country, "South Africa");
    }

    #[test]
    fn test_institution_with_address_and_country_tags() {
        let record = resolve(
            "<aff><institution>Bizkaisida</institution>, <addr-line>Bilbao</addr-line>, <country>Spain</country></aff>",
        );
        assert_eq!(record, AffiliationRecord::new("Bizkaisida", "Bilbao", "Spain"));

        let with_sup = resolve(
            r#"<aff id="aff4"><sup>4</sup><institution>Bizkaisida</institution>, <addr-line>Bilbao</addr-line>, <country>Spain</country></aff>"#,
        );
        assert_eq!(with_sup, record);
    }

    #[test]
    fn test_country_tag_overrides_free_text() {
        let record = resolve(
            "<aff><institution-wrap><institution>Sorbonne Université</institution></institution-wrap>Paris, France, <country>FR</country></aff>",
        );
        assert_eq!(record.country, "FR");
    }

    #[test]
    fn test_city_tag_used_when_no_addr_line() {
        let record = resolve(
            "<aff><institution>Karolinska Institutet</institution>, <city>Stockholm</city>, Sweden</aff>",
        );
        assert_eq!(record.name, "Karolinska Institutet");
        assert_eq!(record.location, "Stockholm");
        assert_eq!(record.country, "Sweden");
    }

    #[test]
    fn test_addr_line_only_uses_entity_fallback() {
        let record = resolve(
            r#"<aff id="aff003"><label>3</label><addr-line>Commonwealth Trade Partners Inc., Alexandria, VA, United States of America</addr-line></aff>"#,
        );
        assert_eq!(
            record,
            AffiliationRecord::new(
                "Commonwealth Trade Partners Inc.",
                "Alexandria, VA",
                "United States of America"
            )
        );
    }

    #[test]
    fn test_free_text_with_email_and_phone() {
        let xml = r#"<aff id="af1-vaccines-09-00030">Department of Microbiological Sciences, North Dakota State University, Fargo, ND 58104, USA; <email>Birgit.Pruess@ndsu.edu</email>; Tel.: +1-701-231-7848</aff>"#;
        let expected = AffiliationRecord::new(
            "Department of Microbiological Sciences, North Dakota State University",
            "Fargo, ND 58104",
            "USA",
        );

        assert_eq!(resolve(xml), expected);

        // Same result with a recognizer returning fixed spans.
        let stub = |_: &str| {
            vec![
                EntitySpan::org("Department of Microbiological Sciences"),
                EntitySpan::org("North Dakota State University"),
                EntitySpan::new("Fargo", EntityKind::Location),
                EntitySpan::new("ND", EntityKind::Location),
                EntitySpan::new("58104", EntityKind::Number),
            ]
        };
        let resolver = AffiliationResolver::new(Gazetteer::standard(), Arc::new(stub));
        assert_eq!(resolve_with(&resolver, xml), expected);
    }

    #[test]
    fn test_free_text_location_never_contains_country() {
        let record = resolve("<aff>Institute of Physics, Lagos Road, Ibadan, Nigeria</aff>");
        assert_eq!(record.country, "Nigeria");
        assert!(!record.location.contains("Nigeria"));
        assert_eq!(record.name, "Institute of Physics");
        assert_eq!(record.location, "Lagos Road, Ibadan");
    }

    #[test]
    fn test_free_text_without_country_still_splits() {
        // No gazetteer match: the whole text reaches the splitter.
        let record = resolve("<aff>Institute of Physics, Lagos Road, Ibadan</aff>");
        assert_eq!(
            record,
            AffiliationRecord::new("Institute of Physics", "Lagos Road, Ibadan", "")
        );
    }

    #[test]
    fn test_empty_affiliation_is_all_empty() {
        assert_eq!(resolve("<aff><label>1</label></aff>"), AffiliationRecord::default());
    }

    #[test]
    fn test_resolving_twice_is_identical() {
        let doc = Document::parse(
            "<aff><institution>Bizkaisida</institution> Bilbao, Spain</aff>",
        )
        .unwrap();
        let resolver = AffiliationResolver::default();
        let aff = doc.find("aff").unwrap();
        let first = resolver.resolve(aff);
        assert_eq!(first, resolver.resolve(aff));
        assert_eq!(first.location, "Bilbao");
        // The shared tree still carries the pruned elements.
        assert!(aff.contains("institution"));
    }

    #[test]
    fn test_resolve_all_keys_by_id_or_position() {
        let doc = Document::parse(
            r#"<contrib-group>
                <aff id="aff1"><institution>Bizkaisida</institution>, <country>Spain</country></aff>
                <aff><institution>UC Berkeley</institution>, Berkeley, USA</aff>
                <aff id="aff3"><institution>Karolinska Institutet</institution>, Sweden</aff>
            </contrib-group>"#,
        )
        .unwrap();
        let map = AffiliationResolver::default().resolve_all(doc.root());

        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["aff1", "1", "aff3"]);
        assert_eq!(map["1"].name, "UC Berkeley");
        assert_eq!(map["1"].country, "USA");
        assert_eq!(map["aff3"].country, "Sweden");
    }
}
