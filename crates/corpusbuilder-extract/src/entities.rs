//! Entity recognition for free-text affiliations.
//!
//! The affiliation resolver only needs an ordered list of typed spans, so the
//! recognizer is a trait. `LexiconRecognizer` is a rule-based implementation
//! that works on the comma-separated layout affiliation strings almost always
//! use; a statistical NER model can be plugged in behind the same trait.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Organization,
    Location,
    Number,
    Other,
}

/// A contiguous piece of the input text tagged with an entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub text: String,
    pub kind: EntityKind,
}

impl EntitySpan {
    pub fn new(text: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn org(text: impl Into<String>) -> Self {
        Self::new(text, EntityKind::Organization)
    }

    pub fn location(text: impl Into<String>) -> Self {
        Self::new(text, EntityKind::Location)
    }

    pub fn is_organization(&self) -> bool {
        self.kind == EntityKind::Organization
    }
}

/// Produces typed spans, in text order, for one input string.
///
/// Implementations are called concurrently from the extraction pool and must
/// not keep per-call state.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Vec<EntitySpan>;
}

impl<F> EntityRecognizer for F
where
    F: Fn(&str) -> Vec<EntitySpan> + Send + Sync,
{
    fn recognize(&self, text: &str) -> Vec<EntitySpan> {
        self(text)
    }
}

static ORGANIZATION_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(univ\w*|universidad\w*|universidade|hochschule|department|dept|depto|departamento|dipartimento|institute|institut\w*|istituto|instituto|college|school|faculty|facultad|hospital\w*|klinik\w*|clinic\w*|cent(?:er|re)|centro|laborator\w*|lab|labs|division|unit|program(?:me)?|academy|academia|society|council|ministry|agency|foundation|fondation|association|consortium|network|group|service|services|bureau|office|board|authority|trust|museum|observatory|station|facility|company|corporation|corp|inc|ltd|llc|gmbh|plc|partners|organi[sz]ation)\b",
    )
    .unwrap()
});

static CONTACT_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(@|^\s*(tel|fax|phone|e-?mail|orcid)\b)").unwrap()
});

/// Rule-based recognizer over `,`/`;` separated affiliation strings.
///
/// Each non-empty segment becomes one span: `Organization` when it carries an
/// institutional keyword, `Number` when it has no letters, `Location`
/// otherwise. Contact details (e-mail, phone, fax) produce no span.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconRecognizer;

impl LexiconRecognizer {
    pub fn new() -> Self {
        Self
    }

    fn classify(segment: &str) -> Option<EntityKind> {
        if CONTACT_SEGMENT.is_match(segment) {
            return None;
        }
        if !segment.chars().any(char::is_alphanumeric) {
            return None;
        }
        if ORGANIZATION_KEYWORDS.is_match(segment) {
            Some(EntityKind::Organization)
        } else if !segment.chars().any(char::is_alphabetic) {
            Some(EntityKind::Number)
        } else {
            Some(EntityKind::Location)
        }
    }
}

impl EntityRecognizer for LexiconRecognizer {
    fn recognize(&self, text: &str) -> Vec<EntitySpan> {
        text.split([',', ';'])
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .filter_map(|segment| {
                Self::classify(segment).map(|kind| EntitySpan::new(segment, kind))
            })
            .collect()
    }
}
