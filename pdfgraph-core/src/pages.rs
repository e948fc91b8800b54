//! Flat, 0-indexed view of a document's page tree
//!
//! Page trees may nest `/Pages` nodes to any depth and let pages inherit
//! `/Resources`, `/MediaBox`, `/CropBox` and `/Rotate` from their
//! ancestors. Reads walk the tree as it is. The first mutation flattens
//! it: inherited attributes are written onto every page and all pages
//! become direct kids of the root node. Page order never changes by
//! flattening.

use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::objects::{Array, Dictionary, IndirectRef, Name, Object, ObjectId};
use crate::traversal::TraversalContext;
use std::collections::HashSet;
use std::ops::{Bound, Range, RangeBounds};
use tracing::{debug, warn};

/// Page attributes that may be inherited from `/Pages` ancestors.
pub const INHERITABLE_KEYS: [&str; 4] = ["/Resources", "/MediaBox", "/CropBox", "/Rotate"];

#[derive(Debug, Clone)]
struct PageEntry {
    page: IndirectRef,
    inherited: Vec<(Name, Object)>,
}

pub(crate) fn is_pages_node(dict: &Dictionary) -> bool {
    match dict.type_name() {
        Some("Pages") => true,
        Some(_) => false,
        None => dict.contains_key("/Kids"),
    }
}

fn check_page_dictionary(object: &Object) -> Result<()> {
    match object {
        Object::Dictionary(dict) if dict.type_name() == Some("Page") => Ok(()),
        Object::Dictionary(_) => Err(PdfError::TypeMismatch {
            expected: "page",
            found: "dictionary",
        }),
        other => Err(other.mismatch("page")),
    }
}

fn resolve_range(range: impl RangeBounds<usize>, len: usize) -> Result<Range<usize>> {
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&end) => end.saturating_add(1),
        Bound::Excluded(&end) => end,
        Bound::Unbounded => len,
    };
    if end > len {
        return Err(PdfError::IndexOutOfRange {
            index: end - 1,
            len,
        });
    }
    if start > end {
        return Err(PdfError::IndexOutOfRange { index: start, len });
    }
    Ok(start..end)
}

impl Document {
    /// Mutable page collection of this document.
    pub fn pages(&mut self) -> Pages<'_> {
        Pages { document: self }
    }

    /// Page objects in document order.
    pub fn page_refs(&self) -> Result<Vec<IndirectRef>> {
        Ok(self
            .page_entries()?
            .into_iter()
            .map(|entry| entry.page)
            .collect())
    }

    pub fn page_count(&self) -> Result<usize> {
        Ok(self.page_entries()?.len())
    }

    pub fn page(&self, index: usize) -> Result<IndirectRef> {
        let pages = self.page_refs()?;
        pages.get(index).copied().ok_or(PdfError::IndexOutOfRange {
            index,
            len: pages.len(),
        })
    }

    fn page_tree_root(&self) -> Result<IndirectRef> {
        let catalog = self.get(self.catalog()?)?.try_as_dict()?;
        match catalog.get("/Pages") {
            Some(Object::Reference(root)) => Ok(*root),
            Some(other) => Err(PdfError::InvalidStructure(format!(
                "catalog /Pages is a {}, expected a reference",
                other.type_name()
            ))),
            None => Err(PdfError::InvalidStructure(
                "catalog has no /Pages entry".to_string(),
            )),
        }
    }

    fn page_entries(&self) -> Result<Vec<PageEntry>> {
        let root = self.page_tree_root()?;
        let mut context = TraversalContext::new();
        context.visit(root.id());
        let mut entries = Vec::new();
        self.walk_page_tree(root, &[], &mut context, &mut entries)?;
        Ok(entries)
    }

    fn walk_page_tree(
        &self,
        node: IndirectRef,
        inherited: &[(Name, Object)],
        context: &mut TraversalContext<ObjectId>,
        entries: &mut Vec<PageEntry>,
    ) -> Result<()> {
        context.enter()?;
        let result = self.walk_page_tree_node(node, inherited, context, entries);
        context.exit();
        result
    }

    fn walk_page_tree_node(
        &self,
        node: IndirectRef,
        inherited: &[(Name, Object)],
        context: &mut TraversalContext<ObjectId>,
        entries: &mut Vec<PageEntry>,
    ) -> Result<()> {
        let Some(dict) = self.lookup(node).and_then(Object::as_dict) else {
            warn!(node = %node, "page tree node is not a dictionary");
            return Ok(());
        };

        let mut inherited = inherited.to_vec();
        for key in INHERITABLE_KEYS {
            if let Some(value) = dict.get(key) {
                inherited.retain(|(name, _)| name.as_str() != key);
                inherited.push((Name::known(key), value.clone()));
            }
        }

        let Some(kids) = dict
            .get("/Kids")
            .and_then(|kids| self.resolve(kids).ok())
            .and_then(Object::as_array)
        else {
            warn!(node = %node, "page tree node has no /Kids array");
            return Ok(());
        };

        for kid in kids {
            let Some(kid_ref) = kid.as_reference() else {
                warn!(node = %node, "skipping direct object in /Kids");
                continue;
            };
            let Some(kid_dict) = self.lookup(kid_ref).and_then(Object::as_dict) else {
                warn!(node = %node, kid = %kid_ref, "skipping dangling page tree kid");
                continue;
            };
            if is_pages_node(kid_dict) {
                if !context.visit(kid_ref.id()) {
                    warn!(node = %node, kid = %kid_ref, "page tree cycle");
                    continue;
                }
                let result = self.walk_page_tree(kid_ref, &inherited, context, entries);
                context.leave(kid_ref.id());
                result?;
            } else {
                entries.push(PageEntry {
                    page: kid_ref,
                    inherited: inherited.clone(),
                });
            }
        }
        Ok(())
    }

    /// Clone of a page dictionary with inherited attributes written onto it.
    pub(crate) fn materialize_page(&self, page: IndirectRef) -> Result<Dictionary> {
        let object = self.get(page)?;
        check_page_dictionary(object)?;
        let dict = object.try_as_dict()?;

        let mut materialized = dict.clone();
        for key in INHERITABLE_KEYS {
            if materialized.contains_key(key) {
                continue;
            }
            if let Some(value) = self.inherited_from_parents(dict, key) {
                materialized.insert_trusted(Name::known(key), value);
            }
        }
        Ok(materialized)
    }

    fn inherited_from_parents(&self, page: &Dictionary, key: &str) -> Option<Object> {
        let mut seen = HashSet::new();
        let mut current = page.get("/Parent").and_then(Object::as_reference);
        while let Some(parent) = current {
            if !seen.insert(parent.id()) {
                warn!(parent = %parent, "cycle in /Parent chain");
                break;
            }
            let Some(parent_dict) = self.lookup(parent).and_then(Object::as_dict) else {
                break;
            };
            if let Some(value) = parent_dict.get(key) {
                return Some(value.clone());
            }
            current = parent_dict.get("/Parent").and_then(Object::as_reference);
        }
        None
    }

    fn validate_page(&self, page: &Object) -> Result<()> {
        match page {
            Object::Reference(reference) => {
                if reference.document() != self.id() {
                    return Err(PdfError::ForeignObject(format!(
                        "page {reference} belongs to {}; insert it with insert_foreign",
                        reference.document()
                    )));
                }
                check_page_dictionary(self.get(*reference)?)
            }
            Object::Dictionary(_) => {
                self.check_local(page)?;
                check_page_dictionary(page)
            }
            other => Err(other.mismatch("page")),
        }
    }

    fn duplicate_page(&mut self, page: IndirectRef) -> Result<IndirectRef> {
        let copy = self.get(page)?.clone();
        let copy = self.allocate_indirect(copy)?;
        debug!(document = %self.id(), page = %page, copy = %copy, "page already in tree, inserting a copy");
        Ok(copy)
    }

    /// Push inherited attributes onto pages and hang every page directly
    /// under the root node. Returns the root and the pages in order.
    fn flatten_page_tree(&mut self) -> Result<(IndirectRef, Vec<IndirectRef>)> {
        let root = self.page_tree_root()?;
        let entries = self.page_entries()?;

        for entry in &entries {
            let Some(page) = self.object_mut(entry.page.id()).and_then(Object::as_dict_mut) else {
                continue;
            };
            for (key, value) in &entry.inherited {
                if !page.contains_key(key.as_str()) {
                    page.insert_trusted(key.clone(), value.clone());
                }
            }
        }

        let root_dict = self
            .object_mut(root.id())
            .and_then(Object::as_dict_mut)
            .ok_or_else(|| {
                PdfError::InvalidStructure("page tree root is not a dictionary".to_string())
            })?;
        for key in INHERITABLE_KEYS {
            root_dict.remove_trusted(key);
        }

        let pages: Vec<IndirectRef> = entries.into_iter().map(|entry| entry.page).collect();
        self.write_kids(root, &pages)?;
        for page in &pages {
            self.set_parent(*page, Some(root));
        }
        debug!(document = %self.id(), pages = pages.len(), "flattened page tree");
        Ok((root, pages))
    }

    fn write_kids(&mut self, root: IndirectRef, pages: &[IndirectRef]) -> Result<()> {
        let root_dict = self
            .object_mut(root.id())
            .and_then(Object::as_dict_mut)
            .ok_or_else(|| {
                PdfError::InvalidStructure("page tree root is not a dictionary".to_string())
            })?;
        let kids = pages.iter().map(|page| Object::Reference(*page)).collect();
        root_dict.insert_trusted(Name::known("/Kids"), Object::Array(Array::from_trusted(kids)));
        root_dict.insert_trusted(Name::known("/Count"), Object::Integer(pages.len() as i64));
        Ok(())
    }

    fn set_parent(&mut self, page: IndirectRef, parent: Option<IndirectRef>) {
        let Some(dict) = self.object_mut(page.id()).and_then(Object::as_dict_mut) else {
            return;
        };
        match parent {
            Some(parent) => dict.insert_trusted(Name::known("/Parent"), Object::Reference(parent)),
            None => {
                dict.remove_trusted("/Parent");
            }
        }
    }
}

/// Page collection of one document, borrowed mutably.
///
/// Every operation recomputes the page list from the tree, so counts are
/// always current.
pub struct Pages<'a> {
    document: &'a mut Document,
}

impl Pages<'_> {
    pub fn len(&self) -> Result<usize> {
        self.document.page_count()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, index: usize) -> Result<IndirectRef> {
        self.document.page(index)
    }

    pub fn get_slice(&self, range: impl RangeBounds<usize>) -> Result<Vec<IndirectRef>> {
        let pages = self.document.page_refs()?;
        let range = resolve_range(range, pages.len())?;
        Ok(pages[range].to_vec())
    }

    pub fn to_vec(&self) -> Result<Vec<IndirectRef>> {
        self.document.page_refs()
    }

    /// Position of `page`, which must be in the page tree.
    pub fn index_of(&self, page: IndirectRef) -> Result<usize> {
        self.document
            .page_refs()?
            .iter()
            .position(|candidate| *candidate == page)
            .ok_or_else(|| {
                PdfError::InvalidOperation(format!("{page} is not in the page tree"))
            })
    }

    /// Value of `key` on page `index`, looking through ancestors for the
    /// inheritable attributes.
    pub fn inherited_attribute(&self, index: usize, key: &str) -> Result<Option<Object>> {
        let entries = self.document.page_entries()?;
        let entry = entries.get(index).ok_or(PdfError::IndexOutOfRange {
            index,
            len: entries.len(),
        })?;
        let page = self.document.get(entry.page)?.try_as_dict()?;
        if let Some(value) = page.get(key) {
            return Ok(Some(value.clone()));
        }
        Ok(entry
            .inherited
            .iter()
            .find(|(name, _)| name.as_str() == key)
            .map(|(_, value)| value.clone()))
    }

    /// Insert a local page before `index`; `index == len` appends.
    ///
    /// Direct page dictionaries are made indirect. A page that is already
    /// in the tree is inserted as a shallow copy so each position holds a
    /// distinct page object.
    pub fn insert(&mut self, index: usize, page: impl Into<Object>) -> Result<IndirectRef> {
        let page = page.into();
        let len = self.len()?;
        if index > len {
            return Err(PdfError::IndexOutOfRange { index, len });
        }
        self.document.validate_page(&page)?;

        // nothing is allocated until the tree is known to be writable
        let (root, mut pages) = self.document.flatten_page_tree()?;
        let page = match page {
            Object::Reference(reference) if pages.contains(&reference) => {
                self.document.duplicate_page(reference)?
            }
            Object::Reference(reference) => reference,
            direct => self.document.allocate_indirect(direct)?,
        };
        pages.insert(index, page);
        self.document.write_kids(root, &pages)?;
        self.document.set_parent(page, Some(root));

        debug!(document = %self.document.id(), index, page = %page, "inserted page");
        Ok(page)
    }

    /// Copy `page` from `source` with its resources and insert the copy.
    pub fn insert_foreign(
        &mut self,
        index: usize,
        source: &Document,
        page: IndirectRef,
    ) -> Result<IndirectRef> {
        let len = self.len()?;
        if index > len {
            return Err(PdfError::IndexOutOfRange { index, len });
        }
        if page.document() == self.document.id() {
            return self.insert(index, page);
        }
        let local = self.document.copy_foreign_page(source, page)?;
        self.insert(index, local)
    }

    pub fn append(&mut self, page: impl Into<Object>) -> Result<IndirectRef> {
        let len = self.len()?;
        self.insert(len, page)
    }

    /// Append copies of every page of `source`.
    pub fn extend_from(&mut self, source: &Document) -> Result<Vec<IndirectRef>> {
        let pages = source.page_refs()?;
        let mut inserted = Vec::with_capacity(pages.len());
        for page in pages {
            let len = self.len()?;
            inserted.push(self.insert_foreign(len, source, page)?);
        }
        Ok(inserted)
    }

    /// Unlink page `index` from the tree. The page object stays in the
    /// object table.
    pub fn delete(&mut self, index: usize) -> Result<IndirectRef> {
        let len = self.len()?;
        if index >= len {
            return Err(PdfError::IndexOutOfRange { index, len });
        }
        let (root, mut pages) = self.document.flatten_page_tree()?;
        let removed = pages.remove(index);
        self.document.write_kids(root, &pages)?;
        if !pages.contains(&removed) {
            self.document.set_parent(removed, None);
        }

        debug!(document = %self.document.id(), index, page = %removed, "deleted page");
        Ok(removed)
    }

    pub fn delete_range(&mut self, range: impl RangeBounds<usize>) -> Result<Vec<IndirectRef>> {
        let range = resolve_range(range, self.len()?)?;
        let (root, mut pages) = self.document.flatten_page_tree()?;
        let removed: Vec<IndirectRef> = pages.drain(range.clone()).collect();
        self.document.write_kids(root, &pages)?;
        for page in &removed {
            if !pages.contains(page) {
                self.document.set_parent(*page, None);
            }
        }

        debug!(
            document = %self.document.id(),
            start = range.start,
            end = range.end,
            "deleted pages"
        );
        Ok(removed)
    }

    /// Replace page `index`. Afterwards `get(index)` returns the new page.
    pub fn set(&mut self, index: usize, page: impl Into<Object>) -> Result<IndirectRef> {
        let page = page.into();
        let len = self.len()?;
        if index >= len {
            return Err(PdfError::IndexOutOfRange { index, len });
        }
        self.document.validate_page(&page)?;
        if let Object::Reference(reference) = &page {
            if self.get(index)? == *reference {
                return Ok(*reference);
            }
        }
        let inserted = self.insert(index, page)?;
        self.delete(index + 1)?;
        Ok(inserted)
    }

    /// Replace the pages in `range` with `pages`, which may differ in length.
    pub fn set_slice(
        &mut self,
        range: impl RangeBounds<usize>,
        pages: Vec<Object>,
    ) -> Result<Vec<IndirectRef>> {
        let range = resolve_range(range, self.len()?)?;
        for page in &pages {
            self.document.validate_page(page)?;
        }

        self.delete_range(range.clone())?;
        let mut inserted = Vec::with_capacity(pages.len());
        for (offset, page) in pages.into_iter().enumerate() {
            inserted.push(self.insert(range.start + offset, page)?);
        }
        Ok(inserted)
    }

    pub fn reverse(&mut self) -> Result<()> {
        let pages = self.get_slice(..)?;
        self.set_slice(.., pages.into_iter().rev().map(Object::Reference).collect())?;
        Ok(())
    }
}
