//! Section routing and document assembly

pub mod assembler;
pub mod router;

pub use assembler::{parse_document, DocumentAssembler, ParsedDocument};
pub use router::{route_sections, Extractor};
