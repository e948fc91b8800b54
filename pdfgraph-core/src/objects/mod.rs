mod array;
mod dictionary;
mod name;
mod primitive;
mod real;
mod stream;
mod string;

pub use array::Array;
pub use dictionary::Dictionary;
pub use name::Name;
pub use primitive::{DocumentId, IndirectRef, InlineImage, Object, ObjectId, Operator};
pub use real::{Real, DEFAULT_REAL_PRECISION, MAX_REAL_PRECISION};
pub use stream::Stream;
pub use string::{PdfString, StringEncoding};
