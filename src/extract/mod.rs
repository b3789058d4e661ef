pub mod interface;
pub mod document;

pub use interface::{DocumentKind, TextExtractor};
pub use document::DocumentExtractor;
