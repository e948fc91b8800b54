use crate::error::{PdfError, Result};
use crate::objects::{Array, DocumentId, Name, Object};
use indexmap::IndexMap;

/// Name-keyed mapping that keeps keys in insertion order.
///
/// Ownership follows the same rule as [`Array`]: a dictionary holding
/// references belongs to their document and refuses references from any
/// other.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: IndexMap<Name, Object>,
    owner: Option<DocumentId>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
            owner: None,
        }
    }

    pub fn owner(&self) -> Option<DocumentId> {
        self.owner
    }

    /// Set `key` (a `/`-prefixed name) to `value`, returning any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<Object>) -> Result<Option<Object>> {
        let key = Name::new(key)?;
        self.insert(key, value.into())
    }

    pub fn insert(&mut self, key: Name, value: Object) -> Result<Option<Object>> {
        value.check_embeddable()?;
        let owner = match (self.owner, value.owner()) {
            (Some(mine), Some(theirs)) if mine != theirs => {
                return Err(PdfError::ForeignObject(format!(
                    "key {key}: dictionary holds objects of {mine} but the value belongs to {theirs}; copy it with copy_foreign first"
                )));
            }
            (Some(mine), _) => Some(mine),
            (None, theirs) => theirs,
        };
        let previous = self.entries.insert(key, value);
        self.owner = owner;
        if previous.as_ref().and_then(Object::owner).is_some() {
            self.recompute_owner();
        }
        Ok(previous)
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.entries.get(key)
    }

    pub fn try_get(&self, key: &str) -> Result<&Object> {
        self.entries
            .get(key)
            .ok_or_else(|| PdfError::KeyNotFound(key.to_string()))
    }

    /// Remove `key`; absent keys are an error.
    pub fn remove(&mut self, key: &str) -> Result<Object> {
        let removed = self
            .entries
            .shift_remove(key)
            .ok_or_else(|| PdfError::KeyNotFound(key.to_string()))?;
        if removed.owner().is_some() {
            self.recompute_owner();
        }
        Ok(removed)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.owner = None;
    }

    pub fn keys(&self) -> impl Iterator<Item = &Name> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Object> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Object)> {
        self.entries.iter()
    }

    pub fn get_name(&self, key: &str) -> Option<&Name> {
        self.get(key).and_then(Object::as_name)
    }

    pub fn get_dict(&self, key: &str) -> Option<&Dictionary> {
        self.get(key).and_then(Object::as_dict)
    }

    pub fn get_array(&self, key: &str) -> Option<&Array> {
        self.get(key).and_then(Object::as_array)
    }

    /// Value of `/Type` without the leading slash.
    pub fn type_name(&self) -> Option<&str> {
        self.get_name("/Type").map(Name::bare)
    }

    fn recompute_owner(&mut self) {
        self.owner = self.entries.values().find_map(Object::owner);
    }

    /// Unchecked insertion for values already known to share one owner.
    pub(crate) fn insert_trusted(&mut self, key: Name, value: Object) {
        if self.owner.is_none() {
            self.owner = value.owner();
        }
        self.entries.insert(key, value);
    }

    pub(crate) fn remove_trusted(&mut self, key: &str) -> Option<Object> {
        let removed = self.entries.shift_remove(key);
        if removed.as_ref().and_then(Object::owner).is_some() {
            self.recompute_owner();
        }
        removed
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        // key order is presentation only
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| other.entries.get(key) == Some(value))
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a Name, &'a Object);
    type IntoIter = indexmap::map::Iter<'a, Name, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{IndirectRef, ObjectId, PdfString, Stream};

    fn reference(doc: DocumentId, number: u32) -> Object {
        Object::Reference(IndirectRef::new(doc, ObjectId::new(number, 0)))
    }

    #[test]
    fn test_new_dictionary() {
        let dict = Dictionary::new();
        assert!(dict.is_empty());
        assert_eq!(dict.len(), 0);
        assert_eq!(dict.owner(), None);
    }

    #[test]
    fn test_set_and_get() {
        let mut dict = Dictionary::new();
        dict.set("/Name", PdfString::from("Test")).unwrap();
        dict.set("/Age", 42).unwrap();
        dict.set("/Active", true).unwrap();

        assert_eq!(
            dict.get("/Name"),
            Some(&Object::String(PdfString::from("Test")))
        );
        assert_eq!(dict.get("/Age"), Some(&Object::Integer(42)));
        assert_eq!(dict.get("/Active"), Some(&Object::Boolean(true)));
        assert_eq!(dict.get("/Missing"), None);
    }

    #[test]
    fn test_set_rejects_bad_keys() {
        let mut dict = Dictionary::new();
        assert!(matches!(dict.set("Type", 1), Err(PdfError::InvalidName(_))));
        assert!(matches!(dict.set("/", 1), Err(PdfError::InvalidName(_))));
        assert!(dict.is_empty());
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let mut dict = Dictionary::new();
        dict.set("/Zeta", 1).unwrap();
        dict.set("/Alpha", 2).unwrap();
        dict.set("/Mid", 3).unwrap();
        dict.set("/Alpha", 4).unwrap();

        let keys: Vec<_> = dict.keys().map(Name::as_str).collect();
        assert_eq!(keys, vec!["/Zeta", "/Alpha", "/Mid"]);
    }

    #[test]
    fn test_remove_preserves_order_of_rest() {
        let mut dict = Dictionary::new();
        dict.set("/A", 1).unwrap();
        dict.set("/B", 2).unwrap();
        dict.set("/C", 3).unwrap();

        assert_eq!(dict.remove("/B").unwrap(), Object::Integer(2));
        let keys: Vec<_> = dict.keys().map(Name::as_str).collect();
        assert_eq!(keys, vec!["/A", "/C"]);
    }

    #[test]
    fn test_remove_missing_key_is_error() {
        let mut dict = Dictionary::new();
        match dict.remove("/Temp") {
            Err(PdfError::KeyNotFound(key)) => assert_eq!(key, "/Temp"),
            other => panic!("Expected KeyNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_try_get() {
        let mut dict = Dictionary::new();
        dict.set("/Present", Object::Null).unwrap();
        assert!(dict.try_get("/Present").is_ok());
        assert!(matches!(
            dict.try_get("/Absent"),
            Err(PdfError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_type_name() {
        let mut dict = Dictionary::new();
        dict.set("/Type", Name::new("/Page").unwrap()).unwrap();
        assert_eq!(dict.type_name(), Some("Page"));
    }

    #[test]
    fn test_foreign_reference_rejected_and_dict_unchanged() {
        let doc_a = DocumentId::new();
        let doc_b = DocumentId::new();
        let mut dict = Dictionary::new();
        dict.set("/Local", reference(doc_a, 1)).unwrap();

        let result = dict.set("/Other", reference(doc_b, 2));
        assert!(matches!(result, Err(PdfError::ForeignObject(_))));
        assert!(!dict.contains_key("/Other"));
        assert_eq!(dict.owner(), Some(doc_a));
    }

    #[test]
    fn test_owner_recomputed_after_overwrite() {
        let doc = DocumentId::new();
        let mut dict = Dictionary::new();
        dict.set("/Ref", reference(doc, 1)).unwrap();
        dict.set("/Ref", 0).unwrap();
        assert_eq!(dict.owner(), None);
    }

    #[test]
    fn test_direct_stream_rejected() {
        let mut dict = Dictionary::new();
        let stream = Stream::new(Dictionary::new(), vec![]);
        assert!(dict.set("/S", stream).is_err());
        assert!(dict.is_empty());
    }

    #[test]
    fn test_equality_ignores_key_order() {
        let mut a = Dictionary::new();
        a.set("/X", 1).unwrap();
        a.set("/Y", 2).unwrap();
        let mut b = Dictionary::new();
        b.set("/Y", 2).unwrap();
        b.set("/X", 1).unwrap();
        assert_eq!(a, b);

        b.set("/Z", 3).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_nested_dictionaries() {
        let mut root = Dictionary::new();
        let mut level1 = Dictionary::new();
        let mut level2 = Dictionary::new();

        level2.set("/DeepValue", PdfString::from("Found")).unwrap();
        level1.set("/Level2", level2).unwrap();
        root.set("/Level1", level1).unwrap();

        let deep_value = root
            .get_dict("/Level1")
            .and_then(|l1| l1.get_dict("/Level2"))
            .and_then(|l2| l2.get("/DeepValue"));

        assert_eq!(
            deep_value,
            Some(&Object::String(PdfString::from("Found")))
        );
    }
}
