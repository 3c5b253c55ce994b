//! Metadata extraction from journal-archiving (JATS/NXML) documents.
//!
//! The heavy lifting is affiliation resolution: turning a marked-up or
//! free-text `<aff>` block into `{name, location, country}`.

pub mod affiliation;
pub mod assembler;
pub mod dom;
pub mod entities;
pub mod error;
pub mod gazetteer;
pub mod pipeline;
pub mod splitter;
pub mod text;

pub use affiliation::{AffiliationIdMap, AffiliationResolver};
pub use assembler::MetadataAssembler;
pub use dom::{Document, Node};
pub use entities::{EntityKind, EntityRecognizer, EntitySpan, LexiconRecognizer};
pub use error::{ExtractError, Result};
pub use gazetteer::{Gazetteer, LocationCountry};
pub use pipeline::{ArticleFailure, ExtractSummary, ExtractionPipeline};
pub use splitter::{NameLocation, split_name_location};
