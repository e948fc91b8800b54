//! # pdfgraph
//!
//! Typed, ownership-checked access to the object graph of PDF documents.
//!
//! ## Features
//!
//! - **Object model**: every PDF object kind as one closed [`Object`] enum
//! - **Host conversion**: build objects from plain values and back, with positioned errors
//! - **Ownership**: references carry their document, so they never silently cross documents
//! - **Foreign copy**: deep copies between documents that preserve sharing and are cached
//! - **Page collection**: a flat, 0-indexed view over nested page trees
//! - **Cycle-safe formatting**: render arbitrarily cyclic graphs with a purity flag
//!
//! Parsing PDF bytes is the job of a [`DocumentEngine`]. [`BasicEngine`]
//! covers stream filters and writing a classic cross-reference table.
//!
//! ## Quick Start
//!
//! ```rust
//! use pdfgraph::formatter::format;
//! use pdfgraph::{Dictionary, Document, Result};
//!
//! # fn main() -> Result<()> {
//! let mut doc = Document::new();
//!
//! // Blank pages are created unlinked and then placed in the page list
//! let page = doc.new_page([0.0, 0.0, 612.0, 792.0])?;
//! doc.pages().append(page)?;
//! assert_eq!(doc.page_count()?, 1);
//!
//! // Host values convert through the document's codec settings
//! let mut info = Dictionary::new();
//! info.set("/Title", doc.encode("Report".into())?)?;
//! let info = doc.make_indirect(info)?;
//!
//! let rendered = format(&doc, &info.into())?;
//! assert_eq!(rendered.text, "<<\n  /Title (Report)\n>>");
//! assert!(rendered.pure);
//! # Ok(())
//! # }
//! ```
//!
//! ## Copying between documents
//!
//! ```rust
//! use pdfgraph::{Document, Result};
//!
//! # fn main() -> Result<()> {
//! let mut source = Document::new();
//! let page = source.new_page([0.0, 0.0, 100.0, 100.0])?;
//! source.pages().append(page)?;
//!
//! let mut dest = Document::new();
//! let copies = dest.pages().extend_from(&source)?;
//! assert_eq!(dest.page_count()?, 1);
//! assert_ne!(copies[0], page);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`objects`] - Object node types and ownership
//! - [`codec`] - Scalar conversion between host values and objects
//! - [`builder`] - Arrays and dictionaries from host sequences and mappings
//! - [`document`] - Object table, indirection, foreign copy
//! - [`pages`] - Page collection
//! - [`formatter`] - Cycle-safe rendering
//! - [`workspace`] - Registry of open documents
//! - [`engine`] / [`filters`] / [`writer`] - Document engine interface and basic implementation

pub mod builder;
pub mod codec;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod filters;
pub mod formatter;
#[cfg(feature = "serde")]
pub mod json;
pub mod objects;
pub mod pages;
mod traversal;
pub mod workspace;
pub mod writer;

pub use codec::{HostValue, ScalarKind};
pub use config::{CodecConfig, WriteOptions};
pub use document::Document;
pub use engine::{BasicEngine, DocumentEngine, LoadedDocument, StreamCodec, WriteRequest};
pub use error::{ErrorKind, PdfError, Result};
pub use formatter::FormattedObject;
pub use objects::{
    Array, Dictionary, DocumentId, IndirectRef, InlineImage, Name, Object, ObjectId, Operator,
    PdfString, Real, Stream, StringEncoding,
};
pub use pages::Pages;
pub use traversal::MAX_TRAVERSAL_DEPTH;
pub use workspace::Workspace;

/// Current version of pdfgraph
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Document>();
        assert_send_sync::<Object>();
    }

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
    }
}
