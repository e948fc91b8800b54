use crate::error::{PdfError, Result};
use crate::objects::{DocumentId, Object};

/// Ordered sequence of objects.
///
/// An array that holds references is owned by the document those
/// references point into; adding a reference from any other document
/// fails with [`PdfError::ForeignObject`] and leaves the array unchanged.
#[derive(Debug, Clone, Default)]
pub struct Array {
    elements: Vec<Object>,
    owner: Option<DocumentId>,
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: Vec::with_capacity(capacity),
            owner: None,
        }
    }

    /// Build from a list of objects, validating ownership of each element.
    pub fn from_objects(objects: Vec<Object>) -> Result<Self> {
        let mut array = Self::with_capacity(objects.len());
        for (index, object) in objects.into_iter().enumerate() {
            array
                .push(object)
                .map_err(|e| annotate(e, index))?;
        }
        Ok(array)
    }

    pub fn owner(&self) -> Option<DocumentId> {
        self.owner
    }

    pub fn push(&mut self, object: impl Into<Object>) -> Result<()> {
        let object = object.into();
        let owner = self.admit(&object)?;
        self.elements.push(object);
        self.owner = owner;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Object> {
        let popped = self.elements.pop();
        self.recompute_owner();
        popped
    }

    /// Insert before `index`; `index == len` appends.
    pub fn insert(&mut self, index: usize, object: impl Into<Object>) -> Result<()> {
        if index > self.elements.len() {
            return Err(PdfError::IndexOutOfRange {
                index,
                len: self.elements.len(),
            });
        }
        let object = object.into();
        let owner = self.admit(&object)?;
        self.elements.insert(index, object);
        self.owner = owner;
        Ok(())
    }

    /// Replace the element at `index`, returning the previous value.
    pub fn set(&mut self, index: usize, object: impl Into<Object>) -> Result<Object> {
        if index >= self.elements.len() {
            return Err(PdfError::IndexOutOfRange {
                index,
                len: self.elements.len(),
            });
        }
        let object = object.into();
        let owner = self.admit(&object)?;
        let previous = std::mem::replace(&mut self.elements[index], object);
        self.owner = owner;
        self.recompute_owner();
        Ok(previous)
    }

    pub fn remove(&mut self, index: usize) -> Result<Object> {
        if index >= self.elements.len() {
            return Err(PdfError::IndexOutOfRange {
                index,
                len: self.elements.len(),
            });
        }
        let removed = self.elements.remove(index);
        self.recompute_owner();
        Ok(removed)
    }

    pub fn get(&self, index: usize) -> Option<&Object> {
        self.elements.get(index)
    }

    pub fn try_get(&self, index: usize) -> Result<&Object> {
        self.elements.get(index).ok_or(PdfError::IndexOutOfRange {
            index,
            len: self.elements.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.owner = None;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Object> {
        self.elements.iter()
    }

    pub fn as_slice(&self) -> &[Object] {
        &self.elements
    }

    pub fn reverse(&mut self) {
        self.elements.reverse();
    }

    /// Owner the array would have after accepting `object`.
    fn admit(&self, object: &Object) -> Result<Option<DocumentId>> {
        object.check_embeddable()?;
        match (self.owner, object.owner()) {
            (Some(mine), Some(theirs)) if mine != theirs => Err(PdfError::ForeignObject(format!(
                "array holds objects of {mine} but the value belongs to {theirs}; copy it with copy_foreign first"
            ))),
            (Some(mine), _) => Ok(Some(mine)),
            (None, theirs) => Ok(theirs),
        }
    }

    fn recompute_owner(&mut self) {
        self.owner = self.elements.iter().find_map(Object::owner);
    }

    /// Unchecked construction for values already known to share one owner.
    pub(crate) fn from_trusted(elements: Vec<Object>) -> Self {
        let owner = elements.iter().find_map(Object::owner);
        Self { elements, owner }
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl TryFrom<Vec<Object>> for Array {
    type Error = PdfError;

    fn try_from(objects: Vec<Object>) -> Result<Self> {
        Array::from_objects(objects)
    }
}

impl From<Array> for Vec<Object> {
    fn from(array: Array) -> Self {
        array.elements
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Object;
    type IntoIter = std::slice::Iter<'a, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

fn annotate(error: PdfError, index: usize) -> PdfError {
    match error {
        PdfError::ForeignObject(message) => {
            PdfError::ForeignObject(format!("element {index}: {message}"))
        }
        other => other,
    }
}
