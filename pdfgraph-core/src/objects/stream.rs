use crate::engine::StreamCodec;
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Name, Object};
use std::sync::OnceLock;

/// Stream object: a describing dictionary plus an opaque encoded payload.
///
/// `/Length` always equals the payload length and is maintained here.
/// The decoded payload is produced on first request through a
/// [`StreamCodec`] and cached until the payload changes.
#[derive(Debug, Clone)]
pub struct Stream {
    dictionary: Dictionary,
    data: Vec<u8>,
    decoded: OnceLock<Vec<u8>>,
}

impl Stream {
    /// Build a stream from a dictionary and already-encoded bytes.
    ///
    /// Any `/Length` in `dictionary` is replaced by the payload length.
    pub fn new(dictionary: Dictionary, data: Vec<u8>) -> Self {
        let mut dictionary = dictionary;
        dictionary.insert_trusted(Name::known("/Length"), Object::Integer(data.len() as i64));
        Self {
            dictionary,
            data,
            decoded: OnceLock::new(),
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Encoded payload as stored.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Set a dictionary entry. `/Length` is derived and cannot be set.
    pub fn set(&mut self, key: &str, value: impl Into<Object>) -> Result<Option<Object>> {
        if key == "/Length" {
            return Err(PdfError::ProtectedKey(key.to_string()));
        }
        let previous = self.dictionary.set(key, value)?;
        if matches!(key, "/Filter" | "/DecodeParms") {
            self.decoded = OnceLock::new();
        }
        Ok(previous)
    }

    pub fn remove(&mut self, key: &str) -> Result<Object> {
        if key == "/Length" {
            return Err(PdfError::ProtectedKey(key.to_string()));
        }
        let removed = self.dictionary.remove(key)?;
        if matches!(key, "/Filter" | "/DecodeParms") {
            self.decoded = OnceLock::new();
        }
        Ok(removed)
    }

    /// Replace the encoded payload; filters are left as they are.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.dictionary.insert_trusted(
            Name::known("/Length"),
            Object::Integer(data.len() as i64),
        );
        self.data = data;
        self.decoded = OnceLock::new();
    }

    /// Replace the payload with unencoded bytes, dropping any filters.
    pub fn set_decoded_data(&mut self, data: Vec<u8>) {
        self.dictionary.remove_trusted("/Filter");
        self.dictionary.remove_trusted("/DecodeParms");
        self.set_data(data);
    }

    /// Filter names in application order.
    pub fn filters(&self) -> Result<Vec<Name>> {
        match self.dictionary.get("/Filter") {
            None | Some(Object::Null) => Ok(Vec::new()),
            Some(Object::Name(name)) => Ok(vec![name.clone()]),
            Some(Object::Array(array)) => array
                .iter()
                .map(|item| {
                    item.as_name()
                        .cloned()
                        .ok_or_else(|| item.mismatch("name"))
                })
                .collect(),
            Some(other) => Err(other.mismatch("name or array")),
        }
    }

    /// Decode parameters aligned with [`Stream::filters`].
    pub fn decode_parms(&self) -> Result<Vec<Option<Dictionary>>> {
        let count = self.filters()?.len();
        let parms = match self.dictionary.get("/DecodeParms") {
            None | Some(Object::Null) => vec![None; count],
            Some(Object::Dictionary(dict)) => vec![Some(dict.clone())],
            Some(Object::Array(array)) => array
                .iter()
                .map(|item| match item {
                    Object::Dictionary(dict) => Ok(Some(dict.clone())),
                    Object::Null => Ok(None),
                    other => Err(other.mismatch("dictionary or null")),
                })
                .collect::<Result<_>>()?,
            Some(other) => return Err(other.mismatch("dictionary or array")),
        };
        if parms.len() != count {
            return Err(PdfError::InvalidStructure(format!(
                "{} decode parameter entries for {count} filters",
                parms.len()
            )));
        }
        Ok(parms)
    }

    /// Decoded payload, computed on first use.
    pub fn decoded(&self, codec: &dyn StreamCodec) -> Result<&[u8]> {
        if let Some(decoded) = self.decoded.get() {
            return Ok(decoded);
        }
        let filters = self.filters()?;
        let decoded = if filters.is_empty() {
            self.data.clone()
        } else {
            codec.decode(&self.data, &filters, &self.decode_parms()?)?
        };
        Ok(self.decoded.get_or_init(|| decoded))
    }

    pub fn is_decoded(&self) -> bool {
        self.decoded.get().is_some()
    }

    pub(crate) fn dictionary_trusted_mut(&mut self) -> &mut Dictionary {
        &mut self.dictionary
    }
}

impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        self.dictionary == other.dictionary && self.data == other.data
    }
}
