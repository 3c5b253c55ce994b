//! Name/location splitting for affiliations without institution markup.

use crate::entities::EntityRecognizer;
use crate::text::strip_trailing_comma;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameLocation {
    pub name: String,
    pub location: String,
}

/// Split an address sentence (country already removed) into the institution
/// name and the remaining location.
///
/// One left-to-right pass over the recognized spans: the first non-organization
/// span that follows one or more organization spans cuts the sentence after
/// the last of those organizations. Everything up to the cut is the name; the
/// location runs from the cut to the end of the last non-organization span
/// seen afterwards. Without a cut the sentence up to the last span is the name.
pub fn split_name_location(recognizer: &dyn EntityRecognizer, sentence: &str) -> NameLocation {
    let spans = recognizer.recognize(sentence);
    if spans.is_empty() {
        return NameLocation {
            name: strip_trailing_comma(sentence),
            location: String::new(),
        };
    }

    let mut cut: Option<(String, String)> = None;
    let mut pending_org: Option<&str> = None;
    let mut last_after_cut: Option<&str> = None;
    let mut last_entity: Option<&str> = None;

    for span in &spans {
        let text = span.text.as_str();
        if span.is_organization() {
            pending_org = Some(text);
        } else {
            if cut.is_none()
                && let Some(org) = pending_org.take()
                && let Some(end) = end_of(sentence, org)
            {
                cut = Some((sentence[..end].trim().to_string(), remainder_after(sentence, end)));
            }
            if cut.is_some() {
                last_after_cut = Some(text);
            }
        }
        last_entity = Some(text);
    }

    match cut {
        Some((name, remainder)) => {
            let location = last_after_cut
                .and_then(|last| end_of(&remainder, last))
                .map(|end| remainder[..end].trim().to_string())
                .unwrap_or(remainder);
            NameLocation { name, location }
        }
        None => {
            let name = last_entity
                .and_then(|last| end_of(sentence, last))
                .map(|end| sentence[..end].trim().to_string())
                .unwrap_or_else(|| strip_trailing_comma(sentence));
            NameLocation {
                name,
                location: String::new(),
            }
        }
    }
}

/// Byte offset just past the first occurrence of `needle`.
fn end_of(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack.find(needle).map(|pos| pos + needle.len())
}

/// Text after `end`, skipping the separator character that follows the cut.
fn remainder_after(sentence: &str, end: usize) -> String {
    let mut rest = sentence[end..].chars();
    rest.next();
    rest.as_str().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntityKind, EntitySpan, LexiconRecognizer};

    fn stub(spans: Vec<EntitySpan>) -> impl Fn(&str) -> Vec<EntitySpan> + Send + Sync {
        move |_: &str| spans.clone()
    }

    #[test]
    fn test_cuts_after_last_organization() {
        let recognizer = stub(vec![
            EntitySpan::org("Department of Microbiological Sciences"),
            EntitySpan::org("North Dakota State University"),
            EntitySpan::location("Fargo"),
            EntitySpan::location("ND"),
            EntitySpan::new("58104", EntityKind::Number),
        ]);
        let result = split_name_location(
            &recognizer,
            "Department of Microbiological Sciences, North Dakota State University, Fargo, ND 58104, ; ; Tel.: +1-701-231-7848",
        );
        assert_eq!(
            result.name,
            "Department of Microbiological Sciences, North Dakota State University"
        );
        assert_eq!(result.location, "Fargo, ND 58104");
    }

    #[test]
    fn test_only_organizations_means_no_location() {
        let recognizer = stub(vec![
            EntitySpan::org("Harvard Medical School"),
            EntitySpan::org("Harvard University"),
        ]);
        let result =
            split_name_location(&recognizer, "Harvard Medical School, Harvard University");
        assert_eq!(result.name, "Harvard Medical School, Harvard University");
        assert_eq!(result.location, "");
    }

    #[test]
    fn test_location_before_organization_stays_in_name() {
        let recognizer = stub(vec![
            EntitySpan::location("Leeds"),
            EntitySpan::org("Leeds Teaching Hospitals"),
            EntitySpan::location("Beckett Street"),
        ]);
        let result = split_name_location(
            &recognizer,
            "Leeds, Leeds Teaching Hospitals, Beckett Street",
        );
        assert_eq!(result.name, "Leeds, Leeds Teaching Hospitals");
        assert_eq!(result.location, "Beckett Street");
    }

    #[test]
    fn test_only_one_cut_is_made() {
        let recognizer = stub(vec![
            EntitySpan::org("Acme Inc."),
            EntitySpan::location("Springfield"),
            EntitySpan::org("Second Lab"),
            EntitySpan::location("Shelbyville"),
        ]);
        let result = split_name_location(
            &recognizer,
            "Acme Inc., Springfield, Second Lab, Shelbyville",
        );
        assert_eq!(result.name, "Acme Inc.");
        assert_eq!(result.location, "Springfield, Second Lab, Shelbyville");
    }

    #[test]
    fn test_no_spans_keeps_sentence_as_name() {
        let recognizer = stub(Vec::new());
        let result = split_name_location(&recognizer, "Somewhere unknown,");
        assert_eq!(result.name, "Somewhere unknown");
        assert_eq!(result.location, "");
    }

    #[test]
    fn test_lexicon_recognizer_end_to_end() {
        let result = split_name_location(
            &LexiconRecognizer,
            "Commonwealth Trade Partners Inc., Alexandria, VA",
        );
        assert_eq!(result.name, "Commonwealth Trade Partners Inc.");
        assert_eq!(result.location, "Alexandria, VA");
    }
}
