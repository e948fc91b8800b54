//! Document graph manager
//!
//! A [`Document`] owns the object table of one PDF: every indirect object
//! keyed by its identity, the trailer, and the cache that makes copies
//! from other documents idempotent. Objects point at each other through
//! [`IndirectRef`] handles, so cycles in the graph are plain data.
//!
//! Every mutation validates its input completely before touching the
//! table; a failed call leaves the document as it was.

mod copy;

use crate::codec::{self, HostValue};
use crate::config::{CodecConfig, WriteOptions};
use crate::engine::{DocumentEngine, LoadedDocument, WriteRequest};
use crate::error::{PdfError, Result};
use crate::objects::{
    Array, Dictionary, DocumentId, IndirectRef, Name, Object, ObjectId, Real, Stream,
};
use crate::traversal::TraversalContext;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, trace};

static NULL: Object = Object::Null;

/// Longest chain of references `resolve` follows.
const MAX_REFERENCE_CHAIN: usize = 32;

#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    objects: BTreeMap<ObjectId, Object>,
    next_number: u64,
    trailer: Dictionary,
    root: ObjectId,
    copy_cache: HashMap<(DocumentId, ObjectId), ObjectId>,
    config: CodecConfig,
    closed: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with a catalog and an empty page tree.
    pub fn new() -> Self {
        Self::build(CodecConfig::default())
    }

    pub fn with_config(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CodecConfig) -> Self {
        let id = DocumentId::new();
        let catalog_id = ObjectId::new(1, 0);
        let pages_id = ObjectId::new(2, 0);

        let mut pages = Dictionary::new();
        pages.insert_trusted(Name::known("/Type"), Object::Name(Name::known("/Pages")));
        pages.insert_trusted(Name::known("/Kids"), Object::Array(Array::new()));
        pages.insert_trusted(Name::known("/Count"), Object::Integer(0));

        let mut catalog = Dictionary::new();
        catalog.insert_trusted(Name::known("/Type"), Object::Name(Name::known("/Catalog")));
        catalog.insert_trusted(
            Name::known("/Pages"),
            Object::Reference(IndirectRef::new(id, pages_id)),
        );

        let mut objects = BTreeMap::new();
        objects.insert(catalog_id, Object::Dictionary(catalog));
        objects.insert(pages_id, Object::Dictionary(pages));

        let mut trailer = Dictionary::new();
        trailer.insert_trusted(
            Name::known("/Root"),
            Object::Reference(IndirectRef::new(id, catalog_id)),
        );

        debug!(document = %id, "created document");
        Self {
            id,
            objects,
            next_number: 3,
            trailer,
            root: catalog_id,
            copy_cache: HashMap::new(),
            config,
            closed: false,
        }
    }

    /// Adopt an object table produced by an engine.
    pub fn from_loaded(loaded: LoadedDocument) -> Result<Self> {
        let LoadedDocument {
            document,
            objects,
            mut trailer,
            root,
        } = loaded;

        for (id, object) in &objects {
            if id.is_reserved() {
                return Err(PdfError::InvalidStructure(
                    "object number 0 is reserved".to_string(),
                ));
            }
            if let Some(owner) = object.owner() {
                if owner != document {
                    return Err(PdfError::ForeignObject(format!(
                        "loaded object {id} holds references into {owner}"
                    )));
                }
            }
        }
        if !objects.contains_key(&root) {
            return Err(PdfError::InvalidStructure(format!(
                "catalog {root} is not in the object table"
            )));
        }
        if let Some(owner) = trailer.owner() {
            if owner != document {
                return Err(PdfError::ForeignObject(format!(
                    "trailer holds references into {owner}"
                )));
            }
        }
        trailer.insert(
            Name::known("/Root"),
            Object::Reference(IndirectRef::new(document, root)),
        )?;

        let next_number = objects
            .keys()
            .map(|id| u64::from(id.number()))
            .max()
            .unwrap_or(0)
            + 1;

        debug!(document = %document, objects = objects.len(), "loaded document");
        Ok(Self {
            id: document,
            objects,
            next_number,
            trailer,
            root,
            copy_cache: HashMap::new(),
            config: CodecConfig::default(),
            closed: false,
        })
    }

    /// Parse `source` with `engine` and adopt the result.
    pub fn load(engine: &dyn DocumentEngine, source: &[u8]) -> Result<Self> {
        Self::from_loaded(engine.load(source)?)
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CodecConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release the object table. Every later access fails with
    /// [`PdfError::DeletedObject`].
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.objects.clear();
        self.copy_cache.clear();
        self.closed = true;
        debug!(document = %self.id, "closed document");
    }

    pub fn catalog(&self) -> Result<IndirectRef> {
        self.ensure_open()?;
        Ok(self.reference(self.root))
    }

    pub fn trailer(&self) -> Result<&Dictionary> {
        self.ensure_open()?;
        Ok(&self.trailer)
    }

    pub fn object_count(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.objects.len())
    }

    /// Every indirect object in identity order.
    pub fn objects(&self) -> Result<impl Iterator<Item = (IndirectRef, &Object)>> {
        self.ensure_open()?;
        let id = self.id;
        Ok(self
            .objects
            .iter()
            .map(move |(object_id, object)| (IndirectRef::new(id, *object_id), object)))
    }

    /// Local copy of `id` from `source`, if one was made and still exists.
    pub fn copied_from(&self, source: DocumentId, id: ObjectId) -> Option<IndirectRef> {
        self.copy_cache
            .get(&(source, id))
            .filter(|local| self.objects.contains_key(local))
            .map(|local| self.reference(*local))
    }

    pub fn get(&self, reference: IndirectRef) -> Result<&Object> {
        self.check_reference(reference)?;
        self.objects
            .get(&reference.id())
            .ok_or(PdfError::ObjectNotFound(reference))
    }

    /// Follow references until a direct object is reached.
    pub fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        let mut current = object;
        for _ in 0..MAX_REFERENCE_CHAIN {
            match current {
                Object::Reference(reference) => current = self.get(*reference)?,
                direct => return Ok(direct),
            }
        }
        Err(PdfError::InvalidStructure(format!(
            "reference chain longer than {MAX_REFERENCE_CHAIN}"
        )))
    }

    /// Convert a host value with this document's codec settings.
    pub fn encode(&self, value: HostValue) -> Result<Object> {
        codec::encode(value, &self.config)
    }

    /// Store `object` under a fresh identity `(n, 0)`.
    ///
    /// Identities are never reused, even after [`Document::delete_object`].
    pub fn allocate_indirect(&mut self, object: Object) -> Result<IndirectRef> {
        self.ensure_open()?;
        if let Object::Reference(reference) = object {
            return Err(PdfError::InvalidOperation(format!(
                "{reference} is already indirect"
            )));
        }
        self.check_local(&object)?;
        let id = self.allocate_id()?;
        self.objects.insert(id, object);
        trace!(document = %self.id, object = %id, "allocated indirect object");
        Ok(self.reference(id))
    }

    /// Make `object` indirect. A reference into this document is returned
    /// unchanged; a reference into another one must be copied first.
    pub fn make_indirect(&mut self, object: impl Into<Object>) -> Result<IndirectRef> {
        match object.into() {
            Object::Reference(reference) => {
                self.check_reference(reference)?;
                Ok(reference)
            }
            direct => self.allocate_indirect(direct),
        }
    }

    /// Convert a host value and make the result indirect.
    pub fn make_indirect_value(&mut self, value: HostValue) -> Result<IndirectRef> {
        let object = self.encode(value)?;
        self.make_indirect(object)
    }

    /// Swap the object stored under `target`. Every reference to `target`
    /// observes the new object.
    pub fn replace(&mut self, target: IndirectRef, object: Object) -> Result<Object> {
        self.check_reference(target)?;
        if let Object::Reference(reference) = object {
            return Err(PdfError::InvalidOperation(format!(
                "cannot store reference {reference} as the value of {target}"
            )));
        }
        self.check_local(&object)?;
        let slot = self
            .objects
            .get_mut(&target.id())
            .ok_or(PdfError::ObjectNotFound(target))?;
        let previous = std::mem::replace(slot, object);
        debug!(document = %self.id, object = %target, "replaced object");
        Ok(previous)
    }

    /// Remove an object from the table. References to it become dangling
    /// and read as null.
    pub fn delete_object(&mut self, target: IndirectRef) -> Result<Object> {
        self.check_reference(target)?;
        if target.id() == self.root {
            return Err(PdfError::InvalidOperation(
                "cannot delete the document catalog".to_string(),
            ));
        }
        let removed = self
            .objects
            .remove(&target.id())
            .ok_or(PdfError::ObjectNotFound(target))?;
        self.copy_cache.retain(|_, local| *local != target.id());
        debug!(document = %self.id, object = %target, "deleted object");
        Ok(removed)
    }

    /// Set `key` in the dictionary or stream stored under `target`.
    pub fn set_key(
        &mut self,
        target: IndirectRef,
        key: &str,
        value: impl Into<Object>,
    ) -> Result<Option<Object>> {
        let value = value.into();
        let key = Name::new(key)?;
        self.check_local(&value)?;
        match self.get_mut(target)? {
            Object::Dictionary(dict) => dict.insert(key, value),
            Object::Stream(stream) => stream.set(key.as_str(), value),
            other => Err(other.mismatch("dictionary or stream")),
        }
    }

    pub fn delete_key(&mut self, target: IndirectRef, key: &str) -> Result<Object> {
        match self.get_mut(target)? {
            Object::Dictionary(dict) => dict.remove(key),
            Object::Stream(stream) => stream.remove(key),
            other => Err(other.mismatch("dictionary or stream")),
        }
    }

    pub fn set_item(
        &mut self,
        target: IndirectRef,
        index: usize,
        value: impl Into<Object>,
    ) -> Result<Object> {
        let value = value.into();
        self.check_local(&value)?;
        match self.get_mut(target)? {
            Object::Array(array) => array.set(index, value),
            other => Err(other.mismatch("array")),
        }
    }

    pub fn push_item(&mut self, target: IndirectRef, value: impl Into<Object>) -> Result<()> {
        let value = value.into();
        self.check_local(&value)?;
        match self.get_mut(target)? {
            Object::Array(array) => array.push(value),
            other => Err(other.mismatch("array")),
        }
    }

    pub fn insert_item(
        &mut self,
        target: IndirectRef,
        index: usize,
        value: impl Into<Object>,
    ) -> Result<()> {
        let value = value.into();
        self.check_local(&value)?;
        match self.get_mut(target)? {
            Object::Array(array) => array.insert(index, value),
            other => Err(other.mismatch("array")),
        }
    }

    pub fn remove_item(&mut self, target: IndirectRef, index: usize) -> Result<Object> {
        match self.get_mut(target)? {
            Object::Array(array) => array.remove(index),
            other => Err(other.mismatch("array")),
        }
    }

    /// Edit the object under `target` through a closure.
    ///
    /// The closure works on a copy; the result is checked and swapped in
    /// only if the closure succeeds.
    pub fn update<R>(
        &mut self,
        target: IndirectRef,
        edit: impl FnOnce(&mut Object) -> Result<R>,
    ) -> Result<R> {
        let mut working = self.get(target)?.clone();
        let result = edit(&mut working)?;
        self.replace(target, working)?;
        Ok(result)
    }

    /// Create an indirect stream holding `data` as its encoded payload.
    pub fn make_stream(&mut self, data: Vec<u8>, dictionary: Dictionary) -> Result<IndirectRef> {
        if let Some(owner) = dictionary.owner() {
            self.check_owner(owner)?;
        }
        self.allocate_indirect(Object::Stream(Stream::new(dictionary, data)))
    }

    /// Create a blank page object. It is not part of the page tree until
    /// inserted through [`Document::pages`].
    pub fn new_page(&mut self, media_box: [f64; 4]) -> Result<IndirectRef> {
        let mut coordinates = Array::with_capacity(4);
        for value in media_box {
            coordinates.push(self.number(value)?)?;
        }

        let mut page = Dictionary::new();
        page.insert(Name::known("/Type"), Object::Name(Name::known("/Page")))?;
        page.insert(Name::known("/MediaBox"), Object::Array(coordinates))?;
        page.insert(Name::known("/Resources"), Object::Dictionary(Dictionary::new()))?;
        self.allocate_indirect(Object::Dictionary(page))
    }

    /// Integral values become integers, others reals at the configured precision.
    fn number(&self, value: f64) -> Result<Object> {
        if value.fract() == 0.0 && value.abs() < 1e15 {
            Ok(Object::Integer(value as i64))
        } else {
            Ok(Object::Real(Real::from_f64(value, self.config.real_precision)?))
        }
    }

    /// Deep comparison of `left` (in this document) with `right` (in
    /// `other`), resolving references on both sides. Cycles are handled.
    pub fn structurally_equal(&self, left: &Object, other: &Document, right: &Object) -> Result<bool> {
        self.ensure_open()?;
        other.ensure_open()?;
        let mut context = TraversalContext::new();
        self.equal_nodes(left, other, right, &mut context)
    }

    /// [`Document::structurally_equal`] within this document.
    pub fn objects_equal(&self, left: &Object, right: &Object) -> Result<bool> {
        self.structurally_equal(left, self, right)
    }

    fn equal_nodes(
        &self,
        left: &Object,
        other: &Document,
        right: &Object,
        context: &mut TraversalContext<(ObjectId, ObjectId)>,
    ) -> Result<bool> {
        context.enter()?;
        let result = self.equal_nodes_inner(left, other, right, context);
        context.exit();
        result
    }

    fn equal_nodes_inner(
        &self,
        left: &Object,
        other: &Document,
        right: &Object,
        context: &mut TraversalContext<(ObjectId, ObjectId)>,
    ) -> Result<bool> {
        match (left, right) {
            (Object::Reference(l), Object::Reference(r)) => {
                // a pair already under comparison is assumed equal
                if !context.visit((l.id(), r.id())) {
                    return Ok(true);
                }
                self.equal_nodes(self.lookup_or_null(*l), other, other.lookup_or_null(*r), context)
            }
            (Object::Reference(l), direct) => {
                self.equal_nodes(self.lookup_or_null(*l), other, direct, context)
            }
            (direct, Object::Reference(r)) => {
                self.equal_nodes(direct, other, other.lookup_or_null(*r), context)
            }
            (Object::Array(l), Object::Array(r)) => {
                if l.len() != r.len() {
                    return Ok(false);
                }
                for (a, b) in l.iter().zip(r.iter()) {
                    if !self.equal_nodes(a, other, b, context)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Object::Dictionary(l), Object::Dictionary(r)) => {
                self.equal_dictionaries(l, other, r, context)
            }
            (Object::Stream(l), Object::Stream(r)) => Ok(l.data() == r.data()
                && self.equal_dictionaries(l.dictionary(), other, r.dictionary(), context)?),
            (l, r) => Ok(l == r),
        }
    }

    fn equal_dictionaries(
        &self,
        left: &Dictionary,
        other: &Document,
        right: &Dictionary,
        context: &mut TraversalContext<(ObjectId, ObjectId)>,
    ) -> Result<bool> {
        if left.len() != right.len() {
            return Ok(false);
        }
        for (key, value) in left {
            let Some(counterpart) = right.get(key.as_str()) else {
                return Ok(false);
            };
            if !self.equal_nodes(value, other, counterpart, context)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Hand the object table to `engine` for serialization.
    pub fn save(
        &self,
        engine: &dyn DocumentEngine,
        sink: &mut dyn Write,
        options: &WriteOptions,
    ) -> Result<()> {
        self.ensure_open()?;
        options.validate()?;
        let request = WriteRequest {
            objects: &self.objects,
            trailer: &self.trailer,
            root: self.root,
            options,
        };
        engine.write(&request, sink)?;
        debug!(document = %self.id, objects = self.objects.len(), "saved document");
        Ok(())
    }

    pub fn save_to_file(
        &self,
        engine: &dyn DocumentEngine,
        path: impl AsRef<Path>,
        options: &WriteOptions,
    ) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.save(engine, &mut writer, options)?;
        writer.flush()?;
        Ok(())
    }

    pub fn to_bytes(&self, engine: &dyn DocumentEngine, options: &WriteOptions) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.save(engine, &mut buffer, options)?;
        Ok(buffer)
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(PdfError::DeletedObject(format!(
                "{} has been closed",
                self.id
            )));
        }
        Ok(())
    }

    pub(crate) fn reference(&self, id: ObjectId) -> IndirectRef {
        IndirectRef::new(self.id, id)
    }

    pub(crate) fn check_reference(&self, reference: IndirectRef) -> Result<()> {
        self.ensure_open()?;
        if reference.document() != self.id {
            return Err(PdfError::ForeignObject(format!(
                "{reference} belongs to {}, not {}",
                reference.document(),
                self.id
            )));
        }
        Ok(())
    }

    fn check_owner(&self, owner: DocumentId) -> Result<()> {
        if owner != self.id {
            return Err(PdfError::ForeignObject(format!(
                "value belongs to {owner}, not {}; copy it with copy_foreign first",
                self.id
            )));
        }
        Ok(())
    }

    /// Fails unless `value` is unowned or owned by this document.
    pub(crate) fn check_local(&self, value: &Object) -> Result<()> {
        match value.owner() {
            Some(owner) => self.check_owner(owner),
            None => Ok(()),
        }
    }

    /// Object under a local reference; `None` if dangling, foreign or closed.
    pub(crate) fn lookup(&self, reference: IndirectRef) -> Option<&Object> {
        if self.closed || reference.document() != self.id {
            return None;
        }
        self.objects.get(&reference.id())
    }

    /// Dangling references read as null.
    pub(crate) fn lookup_or_null(&self, reference: IndirectRef) -> &Object {
        self.lookup(reference).unwrap_or(&NULL)
    }

    fn get_mut(&mut self, target: IndirectRef) -> Result<&mut Object> {
        self.check_reference(target)?;
        self.objects
            .get_mut(&target.id())
            .ok_or(PdfError::ObjectNotFound(target))
    }

    /// Unchecked mutable access for page-tree maintenance.
    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    fn allocate_id(&mut self) -> Result<ObjectId> {
        let number = u32::try_from(self.next_number).map_err(|_| {
            PdfError::InvalidOperation("object numbers exhausted".to_string())
        })?;
        self.next_number += 1;
        Ok(ObjectId::new(number, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BasicEngine;
    use crate::objects::PdfString;

    fn name(n: &str) -> Object {
        Object::Name(Name::new(n).unwrap())
    }

    #[test]
    fn test_new_document_has_catalog_and_page_tree() {
        let doc = Document::new();
        let catalog = doc.get(doc.catalog().unwrap()).unwrap().as_dict().unwrap();
        assert_eq!(catalog.type_name(), Some("Catalog"));

        let pages_ref = catalog.get("/Pages").unwrap().as_reference().unwrap();
        let pages = doc.get(pages_ref).unwrap().as_dict().unwrap();
        assert_eq!(pages.type_name(), Some("Pages"));
        assert_eq!(pages.get("/Count"), Some(&Object::Integer(0)));
        assert_eq!(doc.object_count().unwrap(), 2);
    }

    #[test]
    fn test_allocation_is_monotonic() {
        let mut doc = Document::new();
        let a = doc.allocate_indirect(Object::Integer(1)).unwrap();
        let b = doc.allocate_indirect(Object::Integer(2)).unwrap();
        assert_eq!(a.id(), ObjectId::new(3, 0));
        assert_eq!(b.id(), ObjectId::new(4, 0));

        doc.delete_object(b).unwrap();
        let c = doc.allocate_indirect(Object::Integer(3)).unwrap();
        assert_eq!(c.id(), ObjectId::new(5, 0));
    }

    #[test]
    fn test_make_indirect_is_idempotent() {
        let mut doc = Document::new();
        let first = doc.make_indirect(Object::Integer(7)).unwrap();
        let second = doc.make_indirect(first).unwrap();
        assert_eq!(first, second);
        assert_eq!(doc.object_count().unwrap(), 3);
    }

    #[test]
    fn test_make_indirect_rejects_foreign_reference() {
        let mut a = Document::new();
        let mut b = Document::new();
        let foreign = b.make_indirect(Object::Integer(1)).unwrap();
        assert!(matches!(
            a.make_indirect(foreign),
            Err(PdfError::ForeignObject(_))
        ));
    }

    #[test]
    fn test_get_missing_object() {
        let doc = Document::new();
        let missing = IndirectRef::new(doc.id(), ObjectId::new(99, 0));
        assert!(matches!(doc.get(missing), Err(PdfError::ObjectNotFound(_))));
    }

    #[test]
    fn test_replace_is_seen_through_references() {
        let mut doc = Document::new();
        let target = doc.make_indirect(Object::Integer(1)).unwrap();
        let holder = doc.make_indirect(Dictionary::new()).unwrap();
        doc.set_key(holder, "/Value", target).unwrap();

        let old = doc.replace(target, Object::Integer(2)).unwrap();
        assert_eq!(old, Object::Integer(1));

        let holder_dict = doc.get(holder).unwrap().as_dict().unwrap();
        let value = doc.resolve(holder_dict.get("/Value").unwrap()).unwrap();
        assert_eq!(value, &Object::Integer(2));
    }

    #[test]
    fn test_set_key_rejects_foreign_value_and_leaves_target() {
        let mut a = Document::new();
        let mut b = Document::new();
        let holder = a.make_indirect(Dictionary::new()).unwrap();
        let foreign = b.make_indirect(Object::Integer(1)).unwrap();

        let result = a.set_key(holder, "/Foreign", foreign);
        assert!(matches!(result, Err(PdfError::ForeignObject(_))));
        assert!(a.get(holder).unwrap().as_dict().unwrap().is_empty());
    }

    #[test]
    fn test_set_key_rejects_foreign_inside_direct_container() {
        let mut a = Document::new();
        let mut b = Document::new();
        let holder = a.make_indirect(Dictionary::new()).unwrap();
        let foreign = b.make_indirect(Object::Integer(1)).unwrap();

        let nested = Array::from_objects(vec![Object::Integer(0), foreign.into()]).unwrap();
        assert!(matches!(
            a.set_key(holder, "/Nested", nested),
            Err(PdfError::ForeignObject(_))
        ));
    }

    #[test]
    fn test_delete_key_missing_is_key_error() {
        let mut doc = Document::new();
        let holder = doc.make_indirect(Dictionary::new()).unwrap();
        assert!(matches!(
            doc.delete_key(holder, "/Absent"),
            Err(PdfError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_array_item_operations() {
        let mut doc = Document::new();
        let array = doc.make_indirect(Array::new()).unwrap();
        doc.push_item(array, 1).unwrap();
        doc.push_item(array, 3).unwrap();
        doc.insert_item(array, 1, 2).unwrap();
        assert_eq!(doc.set_item(array, 2, 30).unwrap(), Object::Integer(3));
        assert_eq!(doc.remove_item(array, 0).unwrap(), Object::Integer(1));

        let items = doc.get(array).unwrap().as_array().unwrap();
        assert_eq!(items.as_slice(), &[Object::Integer(2), Object::Integer(30)]);

        assert!(matches!(
            doc.set_item(array, 5, 0),
            Err(PdfError::IndexOutOfRange { index: 5, len: 2 })
        ));
        assert!(matches!(
            doc.push_item(doc.catalog().unwrap(), 1),
            Err(PdfError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_stream_length_protected_through_document() {
        let mut doc = Document::new();
        let stream = doc.make_stream(b"q Q".to_vec(), Dictionary::new()).unwrap();
        assert!(matches!(
            doc.set_key(stream, "/Length", 100),
            Err(PdfError::ProtectedKey(_))
        ));
        doc.set_key(stream, "/Subtype", name("/Form")).unwrap();
        let dict = doc.get(stream).unwrap().as_dict().unwrap();
        assert_eq!(dict.get("/Length"), Some(&Object::Integer(3)));
    }

    #[test]
    fn test_update_is_atomic() {
        let mut doc = Document::new();
        let target = doc.make_indirect(Dictionary::new()).unwrap();

        let result: Result<()> = doc.update(target, |object| {
            let dict = object.as_dict_mut().unwrap();
            dict.set("/A", 1)?;
            Err(PdfError::InvalidOperation("abort".to_string()))
        });
        assert!(result.is_err());
        assert!(doc.get(target).unwrap().as_dict().unwrap().is_empty());

        doc.update(target, |object| {
            object.as_dict_mut().unwrap().set("/A", 1).map(|_| ())
        })
        .unwrap();
        assert_eq!(
            doc.get(target).unwrap().as_dict().unwrap().get("/A"),
            Some(&Object::Integer(1))
        );
    }

    #[test]
    fn test_cannot_delete_catalog() {
        let mut doc = Document::new();
        let catalog = doc.catalog().unwrap();
        assert!(doc.delete_object(catalog).is_err());
    }

    #[test]
    fn test_close_invalidates_access() {
        let mut doc = Document::new();
        let target = doc.make_indirect(Object::Integer(1)).unwrap();
        doc.close();

        assert!(doc.is_closed());
        assert!(matches!(doc.get(target), Err(PdfError::DeletedObject(_))));
        assert!(matches!(
            doc.allocate_indirect(Object::Null),
            Err(PdfError::DeletedObject(_))
        ));
        assert!(matches!(doc.catalog(), Err(PdfError::DeletedObject(_))));
    }

    #[test]
    fn test_structural_equality_resolves_references() {
        let mut doc = Document::new();
        let shared = doc.make_indirect(PdfString::from("x")).unwrap();

        let mut left = Dictionary::new();
        left.set("/V", shared).unwrap();
        let mut right = Dictionary::new();
        right.set("/V", PdfString::from("x")).unwrap();

        assert!(doc
            .objects_equal(&Object::Dictionary(left.clone()), &Object::Dictionary(right))
            .unwrap());
        assert_ne!(Object::Dictionary(left), Object::Dictionary(Dictionary::new()));
    }

    #[test]
    fn test_structural_equality_with_cycles() {
        let mut doc = Document::new();
        let a = doc.make_indirect(Dictionary::new()).unwrap();
        let b = doc.make_indirect(Dictionary::new()).unwrap();
        doc.set_key(a, "/Self", a).unwrap();
        doc.set_key(b, "/Self", b).unwrap();
        assert!(doc.objects_equal(&a.into(), &b.into()).unwrap());

        doc.set_key(b, "/Extra", 1).unwrap();
        assert!(!doc.objects_equal(&a.into(), &b.into()).unwrap());
    }

    #[test]
    fn test_new_page_is_unlinked() {
        let mut doc = Document::new();
        let page = doc.new_page([0.0, 0.0, 612.0, 792.5]).unwrap();
        let dict = doc.get(page).unwrap().as_dict().unwrap();
        assert_eq!(dict.type_name(), Some("Page"));
        let media_box = dict.get_array("/MediaBox").unwrap();
        assert_eq!(media_box.get(2), Some(&Object::Integer(612)));
        assert_eq!(
            media_box.get(3).and_then(Object::as_real).map(Real::as_str),
            Some("792.5")
        );
        assert!(!dict.contains_key("/Parent"));
    }

    #[test]
    fn test_from_loaded_validates_ownership() {
        let mut loaded = LoadedDocument::new(ObjectId::new(1, 0));
        let stranger = IndirectRef::new(DocumentId::new(), ObjectId::new(1, 0));
        let mut catalog = Dictionary::new();
        catalog.set("/Bad", stranger).unwrap();
        loaded
            .objects
            .insert(ObjectId::new(1, 0), Object::Dictionary(catalog));

        assert!(matches!(
            Document::from_loaded(loaded),
            Err(PdfError::ForeignObject(_))
        ));
    }

    #[test]
    fn test_from_loaded_continues_numbering() {
        let mut loaded = LoadedDocument::new(ObjectId::new(1, 0));
        loaded
            .objects
            .insert(ObjectId::new(1, 0), Object::Dictionary(Dictionary::new()));
        loaded.objects.insert(ObjectId::new(40, 0), Object::Null);
        let loaded_id = loaded.document;

        let mut doc = Document::from_loaded(loaded).unwrap();
        assert_eq!(doc.id(), loaded_id);
        let next = doc.allocate_indirect(Object::Integer(1)).unwrap();
        assert_eq!(next.id(), ObjectId::new(41, 0));
        assert_eq!(
            doc.trailer().unwrap().get("/Root"),
            Some(&Object::Reference(IndirectRef::new(loaded_id, ObjectId::new(1, 0))))
        );
    }

    #[test]
    fn test_load_with_basic_engine_fails() {
        assert!(matches!(
            Document::load(&BasicEngine::new(), b"%PDF-1.7"),
            Err(PdfError::Engine(_))
        ));
    }

    #[test]
    fn test_save_to_file() {
        let doc = Document::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        doc.save_to_file(&BasicEngine::new(), &path, &WriteOptions::default())
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_encode_uses_document_precision() {
        let doc = Document::with_config(CodecConfig::with_real_precision(2).unwrap()).unwrap();
        let object = doc.encode(HostValue::Float(1.2345)).unwrap();
        assert_eq!(object.as_real().unwrap().as_str(), "1.2");
    }
}
