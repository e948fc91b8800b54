use crate::error::{PdfError, Result};
use crate::objects::{Array, Dictionary, Name, PdfString, Real, Stream};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique tag identifying one open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Allocate a fresh id. Ids are never reused within a process.
    pub fn new() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    number: u32,
    generation: u16,
}

impl ObjectId {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }

    /// `(0, 0)` is the head of the free list and never names a real object.
    pub fn is_reserved(&self) -> bool {
        self.number == 0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// Handle to an indirect object: its identity plus the document that owns it.
///
/// Two handles are equal when they name the same object in the same
/// document. Use [`crate::Document::structurally_equal`] to compare the
/// objects they point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndirectRef {
    document: DocumentId,
    id: ObjectId,
}

impl IndirectRef {
    pub fn new(document: DocumentId, id: ObjectId) -> Self {
        Self { document, id }
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn is_owned_by(&self, document: DocumentId) -> bool {
        self.document == document
    }
}

impl fmt::Display for IndirectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

/// Content stream operator keyword, e.g. `Tj` or `re`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operator(String);

impl Operator {
    pub fn new(keyword: impl Into<String>) -> Result<Self> {
        let keyword = keyword.into();
        if keyword.is_empty() || keyword.bytes().any(|b| b.is_ascii_whitespace()) {
            return Err(PdfError::InvalidOperation(format!(
                "invalid operator keyword {keyword:?}"
            )));
        }
        Ok(Self(keyword))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Raw bytes of an inline image (`BI ... ID ... EI`) as found in a content stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage(Vec<u8>);

impl InlineImage {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    pub fn data(&self) -> &[u8] {
        &self.0
    }
}

/// One node of a document's object graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(Real),
    Name(Name),
    String(PdfString),
    Operator(Operator),
    Array(Array),
    Dictionary(Dictionary),
    Stream(Stream),
    InlineImage(InlineImage),
    Reference(IndirectRef),
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Boolean(_) => "boolean",
            Object::Integer(_) => "integer",
            Object::Real(_) => "real",
            Object::Name(_) => "name",
            Object::String(_) => "string",
            Object::Operator(_) => "operator",
            Object::Array(_) => "array",
            Object::Dictionary(_) => "dictionary",
            Object::Stream(_) => "stream",
            Object::InlineImage(_) => "inline image",
            Object::Reference(_) => "reference",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Object::Null
                | Object::Boolean(_)
                | Object::Integer(_)
                | Object::Real(_)
                | Object::Name(_)
                | Object::String(_)
                | Object::Operator(_)
        )
    }

    /// True for a handle to an indirect object.
    pub fn is_indirect(&self) -> bool {
        matches!(self, Object::Reference(_))
    }

    /// The document this node belongs to, if any.
    ///
    /// A reference is owned by the document it points into; a direct
    /// container is owned by the document whose references it holds.
    /// Scalars and reference-free containers have no owner.
    pub fn owner(&self) -> Option<DocumentId> {
        match self {
            Object::Reference(r) => Some(r.document()),
            Object::Array(array) => array.owner(),
            Object::Dictionary(dict) => dict.owner(),
            Object::Stream(stream) => stream.dictionary().owner(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<&Real> {
        match self {
            Object::Real(r) => Some(r),
            _ => None,
        }
    }

    /// Numeric value of an integer or real.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(r.to_f64()),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(stream.dictionary()),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<IndirectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Mutable dictionary of a dictionary or stream, bypassing stream key protection.
    pub(crate) fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(stream.dictionary_trusted_mut()),
            _ => None,
        }
    }

    pub fn try_as_array(&self) -> Result<&Array> {
        self.as_array().ok_or_else(|| self.mismatch("array"))
    }

    pub fn try_as_dict(&self) -> Result<&Dictionary> {
        self.as_dict().ok_or_else(|| self.mismatch("dictionary"))
    }

    pub fn try_as_stream(&self) -> Result<&Stream> {
        self.as_stream().ok_or_else(|| self.mismatch("stream"))
    }

    pub fn try_as_reference(&self) -> Result<IndirectRef> {
        self.as_reference().ok_or_else(|| self.mismatch("reference"))
    }

    pub(crate) fn mismatch(&self, expected: &'static str) -> PdfError {
        PdfError::TypeMismatch {
            expected,
            found: self.type_name(),
        }
    }

    /// Fails if this value cannot be embedded in a container.
    ///
    /// Streams only exist as indirect objects.
    pub(crate) fn check_embeddable(&self) -> Result<()> {
        if let Object::Stream(_) = self {
            return Err(PdfError::InvalidOperation(
                "streams must be indirect objects; make the stream indirect and store its reference"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Boolean(b)
    }
}

impl From<i32> for Object {
    fn from(i: i32) -> Self {
        Object::Integer(i as i64)
    }
}

impl From<i64> for Object {
    fn from(i: i64) -> Self {
        Object::Integer(i)
    }
}

impl From<u32> for Object {
    fn from(i: u32) -> Self {
        Object::Integer(i as i64)
    }
}

impl From<Real> for Object {
    fn from(r: Real) -> Self {
        Object::Real(r)
    }
}

impl From<Name> for Object {
    fn from(n: Name) -> Self {
        Object::Name(n)
    }
}

impl From<PdfString> for Object {
    fn from(s: PdfString) -> Self {
        Object::String(s)
    }
}

impl From<Array> for Object {
    fn from(a: Array) -> Self {
        Object::Array(a)
    }
}

impl From<Dictionary> for Object {
    fn from(d: Dictionary) -> Self {
        Object::Dictionary(d)
    }
}

impl From<Stream> for Object {
    fn from(s: Stream) -> Self {
        Object::Stream(s)
    }
}

impl From<IndirectRef> for Object {
    fn from(r: IndirectRef) -> Self {
        Object::Reference(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_ids_are_unique() {
        let a = DocumentId::new();
        let b = DocumentId::new();
        assert_ne!(a, b);
        assert!(b.value() > a.value());
    }

    #[test]
    fn test_object_id_display() {
        let id = ObjectId::new(12, 3);
        assert_eq!(id.to_string(), "12 3 R");
        assert!(!id.is_reserved());
        assert!(ObjectId::new(0, 0).is_reserved());
    }

    #[test]
    fn test_indirect_ref_identity() {
        let doc = DocumentId::new();
        let other = DocumentId::new();
        let a = IndirectRef::new(doc, ObjectId::new(1, 0));
        let b = IndirectRef::new(doc, ObjectId::new(1, 0));
        let c = IndirectRef::new(other, ObjectId::new(1, 0));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is_owned_by(doc));
        assert!(!c.is_owned_by(doc));
        assert_eq!(a.to_string(), "1 0 R");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Object::Null.type_name(), "null");
        assert_eq!(Object::from(true).type_name(), "boolean");
        assert_eq!(Object::from(7).type_name(), "integer");
        assert_eq!(Object::from(Array::new()).type_name(), "array");
        assert_eq!(Object::from(Dictionary::new()).type_name(), "dictionary");
        assert_eq!(
            Object::InlineImage(InlineImage::new(vec![1, 2])).type_name(),
            "inline image"
        );
    }

    #[test]
    fn test_scalar_equality() {
        assert_eq!(Object::Integer(3), Object::Integer(3));
        assert_ne!(Object::Integer(3), Object::Boolean(true));
        assert_ne!(Object::Integer(1), Object::Boolean(true));
        assert_eq!(Object::Null, Object::Null);
    }

    #[test]
    fn test_owner_of_reference_and_scalar() {
        let doc = DocumentId::new();
        let r = Object::Reference(IndirectRef::new(doc, ObjectId::new(4, 0)));
        assert_eq!(r.owner(), Some(doc));
        assert!(r.is_indirect());
        assert_eq!(Object::Integer(5).owner(), None);
        assert!(!Object::Integer(5).is_indirect());
    }

    #[test]
    fn test_try_as_reports_type_mismatch() {
        let obj = Object::Array(Array::new());
        match obj.try_as_dict() {
            Err(PdfError::TypeMismatch { expected, found }) => {
                assert_eq!(expected, "dictionary");
                assert_eq!(found, "array");
            }
            other => panic!("Expected type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_operator_validation() {
        assert_eq!(Operator::new("Tj").unwrap().as_str(), "Tj");
        assert!(Operator::new("").is_err());
        assert!(Operator::new("T j").is_err());
    }

    #[test]
    fn test_as_number() {
        assert_eq!(Object::Integer(2).as_number(), Some(2.0));
        let real = Real::parse("2.5").unwrap();
        assert_eq!(Object::Real(real).as_number(), Some(2.5));
        assert_eq!(Object::Null.as_number(), None);
    }
}
