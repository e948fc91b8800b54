//! Boundary to the document engine
//!
//! Byte-level parsing, repair, encryption and serialization belong to an
//! external engine. This module defines what the object graph needs from
//! it and ships [`BasicEngine`], which covers stream filters and writing
//! but leaves parsing to a real engine.

use crate::config::WriteOptions;
use crate::error::{PdfError, Result};
use crate::filters;
use crate::objects::{Dictionary, DocumentId, Name, Object, ObjectId};
use crate::writer::PdfWriter;
use std::collections::BTreeMap;
use std::io::Write;

/// Encodes and decodes stream payloads for a filter chain.
pub trait StreamCodec {
    fn decode(&self, data: &[u8], filters: &[Name], parms: &[Option<Dictionary>])
        -> Result<Vec<u8>>;

    fn encode(&self, data: &[u8], filters: &[Name], parms: &[Option<Dictionary>])
        -> Result<Vec<u8>>;
}

/// Object table produced by an engine's `load`.
///
/// References inside `objects` and `trailer` must carry `document`.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: DocumentId,
    pub objects: BTreeMap<ObjectId, Object>,
    pub trailer: Dictionary,
    pub root: ObjectId,
}

impl LoadedDocument {
    /// Empty table with a freshly allocated document id, for engines to fill.
    pub fn new(root: ObjectId) -> Self {
        Self {
            document: DocumentId::new(),
            objects: BTreeMap::new(),
            trailer: Dictionary::new(),
            root,
        }
    }
}

/// Everything the engine needs to serialize a document.
#[derive(Debug)]
pub struct WriteRequest<'a> {
    pub objects: &'a BTreeMap<ObjectId, Object>,
    pub trailer: &'a Dictionary,
    pub root: ObjectId,
    pub options: &'a WriteOptions,
}

pub trait DocumentEngine: StreamCodec {
    fn load(&self, source: &[u8]) -> Result<LoadedDocument>;

    fn write(&self, request: &WriteRequest<'_>, sink: &mut dyn Write) -> Result<()>;
}

/// Filters and classic cross-reference writing, without a parser.
#[derive(Debug, Clone)]
pub struct BasicEngine {
    compression_level: u32,
}

impl BasicEngine {
    pub fn new() -> Self {
        Self {
            compression_level: WriteOptions::default().compression_level,
        }
    }

    pub fn with_compression_level(level: u32) -> Result<Self> {
        if level > 9 {
            return Err(PdfError::InvalidOperation(format!(
                "compression level {level} outside 0..=9"
            )));
        }
        Ok(Self {
            compression_level: level,
        })
    }
}

impl Default for BasicEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamCodec for BasicEngine {
    fn decode(
        &self,
        data: &[u8],
        filters: &[Name],
        parms: &[Option<Dictionary>],
    ) -> Result<Vec<u8>> {
        filters::decode_chain(data, filters, parms)
    }

    fn encode(
        &self,
        data: &[u8],
        filters: &[Name],
        parms: &[Option<Dictionary>],
    ) -> Result<Vec<u8>> {
        filters::encode_chain(data, filters, parms, self.compression_level)
    }
}

impl DocumentEngine for BasicEngine {
    fn load(&self, _source: &[u8]) -> Result<LoadedDocument> {
        Err(PdfError::Engine(
            "the basic engine has no parser; load documents through a full engine".to_string(),
        ))
    }

    fn write(&self, request: &WriteRequest<'_>, sink: &mut dyn Write) -> Result<()> {
        let mut writer = PdfWriter::new_with_writer(sink);
        writer.write_table(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_engine_cannot_load() {
        let engine = BasicEngine::new();
        assert!(matches!(
            engine.load(b"%PDF-1.7"),
            Err(PdfError::Engine(_))
        ));
    }

    #[test]
    fn test_compression_level_bounds() {
        assert!(BasicEngine::with_compression_level(9).is_ok());
        assert!(BasicEngine::with_compression_level(10).is_err());
    }

    #[test]
    fn test_hex_round_trip_through_engine() {
        let engine = BasicEngine::new();
        let filters = vec![Name::new("/ASCIIHexDecode").unwrap()];
        let encoded = engine.encode(b"hi", &filters, &[None]).unwrap();
        assert_eq!(encoded, b"6869>");
        assert_eq!(engine.decode(&encoded, &filters, &[None]).unwrap(), b"hi");
    }

    #[test]
    fn test_loaded_document_has_fresh_id() {
        let a = LoadedDocument::new(ObjectId::new(1, 0));
        let b = LoadedDocument::new(ObjectId::new(1, 0));
        assert_ne!(a.document, b.document);
        assert!(a.objects.is_empty());
    }
}
