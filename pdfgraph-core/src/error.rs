use crate::objects::IndirectRef;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    /// A host value could not be mapped to any object kind.
    #[error("{location}: {message}")]
    Conversion { location: String, message: String },

    /// An object owned by one document was used where another (or no) owner was required.
    #[error("Foreign object: {0}")]
    ForeignObject(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The owning document has been closed.
    #[error("Object deleted: {0}")]
    DeletedObject(String),

    #[error("Invalid object reference: {0}")]
    ObjectNotFound(IndirectRef),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid real number: {0}")]
    InvalidReal(String),

    #[error("Key {0} is managed automatically and cannot be set")]
    ProtectedKey(String),

    #[error("Invalid PDF structure: {0}")]
    InvalidStructure(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Document engine error: {0}")]
    Engine(String),

    #[error("Compression error: {0}")]
    CompressionError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error categories callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Conversion,
    ForeignObject,
    TypeMismatch,
    Index,
    Key,
    DeletedObject,
    Structure,
    Engine,
}

impl PdfError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfError::Conversion { .. } | PdfError::InvalidName(_) | PdfError::InvalidReal(_) => {
                ErrorKind::Conversion
            }
            PdfError::ForeignObject(_) => ErrorKind::ForeignObject,
            PdfError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            PdfError::IndexOutOfRange { .. } => ErrorKind::Index,
            PdfError::KeyNotFound(_) | PdfError::ObjectNotFound(_) => ErrorKind::Key,
            PdfError::DeletedObject(_) => ErrorKind::DeletedObject,
            PdfError::ProtectedKey(_)
            | PdfError::InvalidStructure(_)
            | PdfError::InvalidOperation(_) => ErrorKind::Structure,
            PdfError::Engine(_) | PdfError::CompressionError(_) | PdfError::Io(_) => {
                ErrorKind::Engine
            }
        }
    }

    pub(crate) fn conversion(location: impl Into<String>, message: impl Into<String>) -> Self {
        PdfError::Conversion {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Prefix the location of a conversion error with an enclosing position.
    pub(crate) fn within(self, outer: &str) -> Self {
        match self {
            PdfError::Conversion { location, message } => PdfError::Conversion {
                location: format!("{outer} → {location}"),
                message,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;
