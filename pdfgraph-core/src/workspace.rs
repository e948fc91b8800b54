//! Registry of open documents
//!
//! Every [`IndirectRef`] names the document it belongs to, so a workspace
//! can resolve any reference without the caller tracking which document
//! it came from. Closing a document through the workspace keeps its id on
//! record so stale references fail with [`PdfError::DeletedObject`]
//! instead of looking unknown.

use crate::config::{CodecConfig, WriteOptions};
use crate::document::Document;
use crate::engine::DocumentEngine;
use crate::error::{PdfError, Result};
use crate::formatter::{self, FormattedObject};
use crate::objects::{DocumentId, IndirectRef, Object};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Workspace {
    documents: HashMap<DocumentId, Document>,
    closed: HashSet<DocumentId>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new empty document.
    pub fn create(&mut self) -> DocumentId {
        self.open(Document::new())
    }

    pub fn create_with_config(&mut self, config: CodecConfig) -> Result<DocumentId> {
        Ok(self.open(Document::with_config(config)?))
    }

    /// Take ownership of an existing document.
    pub fn open(&mut self, document: Document) -> DocumentId {
        let id = document.id();
        self.documents.insert(id, document);
        debug!(document = %id, "opened document in workspace");
        id
    }

    pub fn load(&mut self, engine: &dyn DocumentEngine, source: &[u8]) -> Result<DocumentId> {
        Ok(self.open(Document::load(engine, source)?))
    }

    /// Close and drop a document. Closing twice is a no-op.
    pub fn close(&mut self, id: DocumentId) -> Result<()> {
        if self.closed.contains(&id) {
            return Ok(());
        }
        let mut document = self.documents.remove(&id).ok_or_else(|| unknown(id))?;
        document.close();
        self.closed.insert(id);
        Ok(())
    }

    pub fn is_open(&self, id: DocumentId) -> bool {
        self.documents.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.documents.keys().copied()
    }

    pub fn document(&self, id: DocumentId) -> Result<&Document> {
        if self.closed.contains(&id) {
            return Err(closed(id));
        }
        self.documents.get(&id).ok_or_else(|| unknown(id))
    }

    pub fn document_mut(&mut self, id: DocumentId) -> Result<&mut Document> {
        if self.closed.contains(&id) {
            return Err(closed(id));
        }
        self.documents.get_mut(&id).ok_or_else(|| unknown(id))
    }

    /// Object behind `reference` in whichever document owns it.
    pub fn resolve(&self, reference: &IndirectRef) -> Result<&Object> {
        self.document(reference.document())?.get(*reference)
    }

    /// Render `object` against its owning document. Unowned values are
    /// rendered as they are.
    pub fn format(&self, object: &Object) -> Result<FormattedObject> {
        match object.owner() {
            Some(owner) => formatter::format(self.document(owner)?, object),
            None => formatter::format(&Document::new(), object),
        }
    }

    /// Copy `object` into `dest` from the document that owns it.
    pub fn copy_foreign(&mut self, dest: DocumentId, object: &Object) -> Result<Object> {
        let source = object.owner().ok_or_else(|| {
            PdfError::ForeignObject(
                "object has no owner; only objects that belong to a document can be copied"
                    .to_string(),
            )
        })?;
        if source == dest {
            self.document(dest)?;
            return Ok(object.clone());
        }
        self.with_pair(dest, source, |dest, source| dest.copy_foreign(source, object))
    }

    /// Insert `page` into the page list of `dest`, copying it first when it
    /// belongs to another open document.
    pub fn insert_page(
        &mut self,
        dest: DocumentId,
        index: usize,
        page: impl Into<Object>,
    ) -> Result<IndirectRef> {
        let page = page.into();
        match page {
            Object::Reference(reference) if reference.document() != dest => {
                self.with_pair(dest, reference.document(), |dest, source| {
                    dest.pages().insert_foreign(index, source, reference)
                })
            }
            local => self.document_mut(dest)?.pages().insert(index, local),
        }
    }

    pub fn save(
        &self,
        id: DocumentId,
        engine: &dyn DocumentEngine,
        sink: &mut dyn Write,
        options: &WriteOptions,
    ) -> Result<()> {
        self.document(id)?.save(engine, sink, options)
    }

    /// Run `operation` with `dest` borrowed mutably and `source` shared.
    fn with_pair<R>(
        &mut self,
        dest: DocumentId,
        source: DocumentId,
        operation: impl FnOnce(&mut Document, &Document) -> Result<R>,
    ) -> Result<R> {
        self.document(source)?;
        self.document(dest)?;
        let mut target = self.documents.remove(&dest).ok_or_else(|| unknown(dest))?;
        let result = match self.documents.get(&source) {
            Some(source) => operation(&mut target, source),
            None => Err(unknown(source)),
        };
        self.documents.insert(dest, target);
        result
    }
}

fn closed(id: DocumentId) -> PdfError {
    PdfError::DeletedObject(format!("{id} has been closed"))
}

fn unknown(id: DocumentId) -> PdfError {
    PdfError::InvalidOperation(format!("{id} is not open in this workspace"))
}
