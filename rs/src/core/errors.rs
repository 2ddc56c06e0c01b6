use thiserror::Error;
use xml::reader::Error as XmlError;

/// Failures the core can report to a caller.
///
/// Ingestion failures of every flavor (malformed XML/PBF, an attribute that
/// won't parse) are collapsed into [`GraphError::InputInvalid`] before they
/// reach the caller; the `#[from]` conversions below exist so the parsing
/// layer can use `?` freely while it is still inside the ingestion pipeline,
/// which folds everything into that one variant at the `add_from_osm`
/// boundary. Routing errors are never collapsed — they are reported verbatim.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("input is not valid OSM data: {0}")]
    InputInvalid(String),
    #[error("XML parsing error: {0}")]
    XmlParsing(#[from] XmlError),
    #[error("PBF parsing error: {0}")]
    PbfParsing(#[from] osmpbf::Error),
    #[error("node {0} is not present in the graph")]
    InvalidReference(i64),
    #[error("A* exceeded its step budget before reaching the goal")]
    StepLimitExceeded,
}

pub type Result<T> = std::result::Result<T, GraphError>;
