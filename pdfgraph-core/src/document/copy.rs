//! Copying objects between documents
//!
//! A copy takes everything reachable from the requested object inside the
//! source document, allocates local identities for it and rewrites the
//! references. Sharing in the source is preserved, and the copy cache
//! maps each source identity to its local copy so repeating a copy
//! returns the same objects.
//!
//! Page tree nodes are boundaries: a reference to another `/Page` or to a
//! `/Pages` node is only kept if that node was already copied, otherwise
//! it becomes null.

use super::Document;
use crate::error::{PdfError, Result};
use crate::objects::{Array, Dictionary, DocumentId, IndirectRef, Object, ObjectId, Stream};
use crate::traversal::TraversalContext;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Local identities reserved for one copy operation, not yet committed.
#[derive(Debug)]
struct CopyPlan {
    mapping: HashMap<ObjectId, ObjectId>,
    order: Vec<ObjectId>,
    next_number: u64,
}

impl CopyPlan {
    fn new(next_number: u64) -> Self {
        Self {
            mapping: HashMap::new(),
            order: Vec::new(),
            next_number,
        }
    }

    fn reserve(&mut self, source_id: ObjectId) -> Result<ObjectId> {
        let number = u32::try_from(self.next_number).map_err(|_| {
            PdfError::InvalidOperation("object numbers exhausted".to_string())
        })?;
        let local = ObjectId::new(number, 0);
        self.next_number += 1;
        self.mapping.insert(source_id, local);
        self.order.push(source_id);
        Ok(local)
    }
}

fn planned(plan: &CopyPlan, source_id: &ObjectId) -> Result<ObjectId> {
    plan.mapping.get(source_id).copied().ok_or_else(|| {
        PdfError::InvalidStructure(format!("{source_id} has no reserved identity"))
    })
}

fn is_page_boundary(object: &Object) -> bool {
    matches!(
        object.as_dict().and_then(Dictionary::type_name),
        Some("Page" | "Pages")
    )
}

impl Document {
    /// Copy `object` from `source` into this document.
    ///
    /// References in the result point at local copies. An object that
    /// already belongs to this document is returned unchanged. Objects
    /// with no owner (scalars and reference-free containers) need no copy
    /// and are rejected.
    pub fn copy_foreign(&mut self, source: &Document, object: &Object) -> Result<Object> {
        self.ensure_open()?;
        source.ensure_open()?;

        let owner = object.owner().ok_or_else(|| {
            PdfError::ForeignObject(
                "object has no owner; only objects that belong to a document can be copied"
                    .to_string(),
            )
        })?;
        if owner == self.id {
            return Ok(object.clone());
        }
        if owner != source.id {
            return Err(PdfError::ForeignObject(format!(
                "object belongs to {owner}, not to the source {}",
                source.id
            )));
        }

        if let Object::Reference(reference) = object {
            let target = source.get(*reference)?;
            match target.as_dict().and_then(Dictionary::type_name) {
                Some("Pages") => {
                    return Err(PdfError::InvalidOperation(
                        "cannot copy a page tree node; copy its pages instead".to_string(),
                    ))
                }
                Some("Page") => {
                    return self
                        .copy_foreign_page(source, *reference)
                        .map(Object::Reference)
                }
                _ => {}
            }
        }

        let plan = self.plan_copy(source, object, None)?;
        self.commit_copy(source, plan, object, None)
    }

    /// Copy one page from `source`.
    ///
    /// Inherited `/Resources`, `/MediaBox`, `/CropBox` and `/Rotate` are
    /// written onto the copy and its `/Parent` is left null until the page
    /// is linked into a page tree.
    pub fn copy_foreign_page(&mut self, source: &Document, page: IndirectRef) -> Result<IndirectRef> {
        self.ensure_open()?;
        source.check_reference(page)?;
        if source.id == self.id {
            return Err(PdfError::InvalidOperation(
                "source and destination are the same document".to_string(),
            ));
        }

        if let Some(local) = self.copied_from(source.id, page.id()) {
            trace!(source = %source.id, page = %page, "page already copied");
            return Ok(local);
        }

        let materialized = Object::Dictionary(source.materialize_page(page)?);
        let plan = self.plan_copy(source, &materialized, Some(page.id()))?;
        match self.commit_copy(source, plan, &materialized, Some(page.id()))? {
            Object::Reference(local) => Ok(local),
            other => Err(PdfError::InvalidStructure(format!(
                "page copy produced a {}",
                other.type_name()
            ))),
        }
    }

    /// Reserve local identities for everything `top` reaches in `source`.
    fn plan_copy(&self, source: &Document, top: &Object, top_page: Option<ObjectId>) -> Result<CopyPlan> {
        let mut plan = CopyPlan::new(self.next_number);
        if let Some(page) = top_page {
            plan.reserve(page)?;
        }

        let mut pending = Vec::new();
        collect_references(top, source.id, &mut pending, &mut TraversalContext::new())?;

        while let Some(source_id) = pending.pop() {
            if plan.mapping.contains_key(&source_id)
                || self.copy_cache.contains_key(&(source.id, source_id))
            {
                continue;
            }
            let Some(object) = source.objects.get(&source_id) else {
                // dangling in the source; copied as null
                continue;
            };
            if is_page_boundary(object) {
                continue;
            }
            plan.reserve(source_id)?;
            collect_references(object, source.id, &mut pending, &mut TraversalContext::new())?;
        }

        Ok(plan)
    }

    /// Rewrite every planned object, then store them all at once.
    fn commit_copy(
        &mut self,
        source: &Document,
        plan: CopyPlan,
        top: &Object,
        top_page: Option<ObjectId>,
    ) -> Result<Object> {
        let mut staged = Vec::with_capacity(plan.order.len());
        for source_id in &plan.order {
            let original = if Some(*source_id) == top_page {
                top
            } else {
                source.objects.get(source_id).ok_or_else(|| {
                    PdfError::InvalidStructure(format!("{source_id} vanished during copy"))
                })?
            };
            let rewritten = self.rewrite(original, source.id, &plan, &mut TraversalContext::new())?;
            staged.push((*source_id, planned(&plan, source_id)?, rewritten));
        }

        let result = match top_page {
            Some(page) => Object::Reference(self.reference(planned(&plan, &page)?)),
            None => self.rewrite(top, source.id, &plan, &mut TraversalContext::new())?,
        };

        let copied = staged.len();
        for (source_id, local, object) in staged {
            self.objects.insert(local, object);
            self.copy_cache.insert((source.id, source_id), local);
        }
        self.next_number = plan.next_number;

        debug!(
            source = %source.id,
            document = %self.id,
            copied,
            "copied foreign objects"
        );
        Ok(result)
    }

    fn translate(&self, source: DocumentId, plan: &CopyPlan, reference: &IndirectRef) -> Option<ObjectId> {
        plan.mapping
            .get(&reference.id())
            .or_else(|| self.copy_cache.get(&(source, reference.id())))
            .copied()
    }

    fn rewrite(
        &self,
        object: &Object,
        source: DocumentId,
        plan: &CopyPlan,
        context: &mut TraversalContext<ObjectId>,
    ) -> Result<Object> {
        context.enter()?;
        let result = match object {
            Object::Reference(reference) => Ok(match self.translate(source, plan, reference) {
                Some(local) => Object::Reference(self.reference(local)),
                None => Object::Null,
            }),
            Object::Array(array) => array
                .iter()
                .map(|item| self.rewrite(item, source, plan, context))
                .collect::<Result<Vec<_>>>()
                .map(|items| Object::Array(Array::from_trusted(items))),
            Object::Dictionary(dict) => self
                .rewrite_dictionary(dict, source, plan, context)
                .map(Object::Dictionary),
            Object::Stream(stream) => {
                let dictionary = self.rewrite_dictionary(stream.dictionary(), source, plan, context)?;
                Ok(Object::Stream(Stream::new(dictionary, stream.data().to_vec())))
            }
            scalar => Ok(scalar.clone()),
        };
        context.exit();
        result
    }

    fn rewrite_dictionary(
        &self,
        dict: &Dictionary,
        source: DocumentId,
        plan: &CopyPlan,
        context: &mut TraversalContext<ObjectId>,
    ) -> Result<Dictionary> {
        let mut rewritten = Dictionary::with_capacity(dict.len());
        for (key, value) in dict {
            let value = self.rewrite(value, source, plan, context)?;
            rewritten.insert_trusted(key.clone(), value);
        }
        Ok(rewritten)
    }
}

/// Push every reference held directly or through nested containers.
fn collect_references(
    object: &Object,
    source: DocumentId,
    out: &mut Vec<ObjectId>,
    context: &mut TraversalContext<ObjectId>,
) -> Result<()> {
    context.enter()?;
    let result = match object {
        Object::Reference(reference) if reference.document() == source => {
            out.push(reference.id());
            Ok(())
        }
        Object::Reference(reference) => Err(PdfError::ForeignObject(format!(
            "{reference} in {source} points into {}",
            reference.document()
        ))),
        Object::Array(array) => array
            .iter()
            .try_for_each(|item| collect_references(item, source, out, context)),
        Object::Dictionary(dict) => dict
            .values()
            .try_for_each(|value| collect_references(value, source, out, context)),
        Object::Stream(stream) => stream
            .dictionary()
            .values()
            .try_for_each(|value| collect_references(value, source, out, context)),
        _ => Ok(()),
    };
    context.exit();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Name, PdfString};

    fn name(n: &str) -> Object {
        Object::Name(Name::new(n).unwrap())
    }

    /// Source with a font shared by two resource dictionaries.
    fn source_with_shared_font() -> (Document, IndirectRef, IndirectRef, IndirectRef) {
        let mut source = Document::new();
        let mut font = Dictionary::new();
        font.set("/Type", Name::new("/Font").unwrap()).unwrap();
        font.set("/BaseFont", Name::new("/Helvetica").unwrap()).unwrap();
        let font = source.make_indirect(font).unwrap();

        let mut first = Dictionary::new();
        first.set("/F1", font).unwrap();
        let first = source.make_indirect(first).unwrap();

        let mut second = Dictionary::new();
        second.set("/F1", font).unwrap();
        let second = source.make_indirect(second).unwrap();

        (source, font, first, second)
    }

    #[test]
    fn test_copy_preserves_sharing() {
        let (source, font, first, second) = source_with_shared_font();
        let mut dest = Document::new();

        let mut both = Array::new();
        both.push(first).unwrap();
        both.push(second).unwrap();
        let copied = dest.copy_foreign(&source, &Object::Array(both)).unwrap();

        let copied = copied.as_array().unwrap();
        let local_first = dest.get(copied.get(0).unwrap().as_reference().unwrap()).unwrap();
        let local_second = dest.get(copied.get(1).unwrap().as_reference().unwrap()).unwrap();
        let font_a = local_first.as_dict().unwrap().get("/F1").unwrap();
        let font_b = local_second.as_dict().unwrap().get("/F1").unwrap();
        assert_eq!(font_a, font_b);
        assert_eq!(
            font_a.as_reference(),
            dest.copied_from(source.id(), font.id())
        );
        assert_eq!(dest.object_count().unwrap(), 2 + 3);
    }

    #[test]
    fn test_copy_is_idempotent_even_after_local_edit() {
        let (source, font, _, _) = source_with_shared_font();
        let mut dest = Document::new();

        let first = dest.copy_foreign(&source, &font.into()).unwrap();
        let local = first.as_reference().unwrap();
        dest.set_key(local, "/Edited", true).unwrap();

        let second = dest.copy_foreign(&source, &font.into()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            dest.get(local).unwrap().as_dict().unwrap().get("/Edited"),
            Some(&Object::Boolean(true))
        );
    }

    #[test]
    fn test_copy_after_local_delete_recopies() {
        let (source, font, _, _) = source_with_shared_font();
        let mut dest = Document::new();

        let first = dest.copy_foreign(&source, &font.into()).unwrap();
        dest.delete_object(first.as_reference().unwrap()).unwrap();
        let second = dest.copy_foreign(&source, &font.into()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_copy_handles_cycles() {
        let mut source = Document::new();
        let a = source.make_indirect(Dictionary::new()).unwrap();
        let b = source.make_indirect(Dictionary::new()).unwrap();
        source.set_key(a, "/Next", b).unwrap();
        source.set_key(b, "/Next", a).unwrap();

        let mut dest = Document::new();
        let copied = dest.copy_foreign(&source, &a.into()).unwrap();
        let local_a = copied.as_reference().unwrap();
        let local_b = dest.get(local_a).unwrap().as_dict().unwrap().get("/Next").unwrap();
        let back = dest
            .get(local_b.as_reference().unwrap())
            .unwrap()
            .as_dict()
            .unwrap()
            .get("/Next")
            .unwrap();
        assert_eq!(back, &Object::Reference(local_a));
        assert!(source.structurally_equal(&a.into(), &dest, &copied).unwrap());
    }

    #[test]
    fn test_copy_of_unowned_object_fails() {
        let source = Document::new();
        let mut dest = Document::new();
        let result = dest.copy_foreign(&source, &Object::Integer(3));
        assert!(matches!(result, Err(PdfError::ForeignObject(_))));
    }

    #[test]
    fn test_copy_of_local_object_is_identity() {
        let source = Document::new();
        let mut dest = Document::new();
        let local = dest.make_indirect(Object::Integer(1)).unwrap();
        assert_eq!(
            dest.copy_foreign(&source, &local.into()).unwrap(),
            Object::Reference(local)
        );
    }

    #[test]
    fn test_copy_of_page_tree_node_fails() {
        let source = Document::new();
        let mut dest = Document::new();
        let catalog = source.get(source.catalog().unwrap()).unwrap();
        let pages = catalog.as_dict().unwrap().get("/Pages").unwrap().clone();
        assert!(matches!(
            dest.copy_foreign(&source, &pages),
            Err(PdfError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_page_boundary_becomes_null() {
        let mut source = Document::new();
        let other_page = source.new_page([0.0, 0.0, 10.0, 10.0]).unwrap();
        let mut annotation = Dictionary::new();
        annotation.set("/Subtype", name("/Link")).unwrap();
        annotation.set("/P", other_page).unwrap();
        let annotation = source.make_indirect(annotation).unwrap();

        let mut dest = Document::new();
        let before = dest.object_count().unwrap();
        let copied = dest.copy_foreign(&source, &annotation.into()).unwrap();
        let dict = dest.get(copied.as_reference().unwrap()).unwrap().as_dict().unwrap();
        assert_eq!(dict.get("/P"), Some(&Object::Null));
        assert_eq!(dest.object_count().unwrap(), before + 1);
    }

    #[test]
    fn test_page_copy_materializes_inherited_attributes() {
        let mut source = Document::new();
        let mut resources = Dictionary::new();
        resources.set("/ProcSet", Array::new()).unwrap();
        let resources = source.make_indirect(resources).unwrap();

        let tree_root = source
            .get(source.catalog().unwrap())
            .unwrap()
            .as_dict()
            .unwrap()
            .get("/Pages")
            .unwrap()
            .as_reference()
            .unwrap();
        source.set_key(tree_root, "/Resources", resources).unwrap();
        source.set_key(tree_root, "/Rotate", 90).unwrap();

        let mut page = Dictionary::new();
        page.set("/Type", name("/Page")).unwrap();
        page.set("/Parent", tree_root).unwrap();
        page.set("/Contents", PdfString::from("ignored")).unwrap();
        let page = source.make_indirect(page).unwrap();

        let mut dest = Document::new();
        let copy = dest.copy_foreign_page(&source, page).unwrap();
        let dict = dest.get(copy).unwrap().as_dict().unwrap();

        assert_eq!(dict.get("/Parent"), Some(&Object::Null));
        assert_eq!(dict.get("/Rotate"), Some(&Object::Integer(90)));
        let local_resources = dict.get("/Resources").unwrap().as_reference().unwrap();
        assert_eq!(
            Some(local_resources),
            dest.copied_from(source.id(), resources.id())
        );

        // copying the same page again returns the first copy
        assert_eq!(dest.copy_foreign_page(&source, page).unwrap(), copy);
    }

    #[test]
    fn test_copy_foreign_routes_pages_to_page_copy() {
        let mut source = Document::new();
        let page = source.new_page([0.0, 0.0, 612.0, 792.0]).unwrap();
        let mut dest = Document::new();
        let copied = dest.copy_foreign(&source, &page.into()).unwrap();
        assert_eq!(copied.as_reference(), dest.copied_from(source.id(), page.id()));
    }

    #[test]
    fn test_direct_container_copy() {
        let (source, font, _, _) = source_with_shared_font();
        let mut dest = Document::new();

        let mut holder = Dictionary::new();
        holder.set("/Font", font).unwrap();
        holder.set("/Size", 12).unwrap();
        let copied = dest.copy_foreign(&source, &holder.into()).unwrap();

        let dict = copied.as_dict().unwrap();
        assert_eq!(dict.owner(), Some(dest.id()));
        assert_eq!(dict.get("/Size"), Some(&Object::Integer(12)));
    }

    #[test]
    fn test_streams_are_copied_with_payload() {
        let mut source = Document::new();
        let stream = source
            .make_stream(b"BT /F1 12 Tf ET".to_vec(), Dictionary::new())
            .unwrap();
        let mut dest = Document::new();
        let copied = dest.copy_foreign(&source, &stream.into()).unwrap();
        let local = dest.get(copied.as_reference().unwrap()).unwrap();
        assert_eq!(local.as_stream().unwrap().data(), b"BT /F1 12 Tf ET");
    }
}
