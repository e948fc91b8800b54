//! Conversion between host values and object nodes
//!
//! [`HostValue`] is the dynamically typed value a caller hands in. Scalars
//! map to scalar nodes in a fixed order (node pass-through, boolean,
//! integer, float or decimal, byte or text string, null); sequences and
//! mappings go through the [`crate::builder`].

use crate::builder;
use crate::config::CodecConfig;
use crate::error::{PdfError, Result};
use crate::objects::{Name, Object, Operator, PdfString, Real};
use std::fmt;

/// A value from the calling program.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    /// Decimal number in text form, optionally with an exponent.
    Decimal(String),
    Bytes(Vec<u8>),
    Text(String),
    /// Name in `/`-prefixed form.
    Name(String),
    Seq(Vec<HostValue>),
    /// Mapping with `/`-prefixed keys, in insertion order.
    Map(Vec<(String, HostValue)>),
    /// An object node passed through unchanged.
    Node(Object),
}

impl HostValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::Decimal(_) => "decimal",
            HostValue::Bytes(_) => "bytes",
            HostValue::Text(_) => "text",
            HostValue::Name(_) => "name",
            HostValue::Seq(_) => "sequence",
            HostValue::Map(_) => "mapping",
            HostValue::Node(_) => "node",
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, HostValue::Seq(_) | HostValue::Map(_))
    }

    /// Numeric value of an int, float or decimal.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Int(i) => Some(*i as f64),
            HostValue::Float(f) => Some(*f),
            HostValue::Decimal(d) => d.parse().ok(),
            _ => None,
        }
    }
}

/// Target kind for [`encode_as`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Null,
    Boolean,
    Integer,
    Real,
    Name,
    String,
    Operator,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Null => "null",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Integer => "integer",
            ScalarKind::Real => "real",
            ScalarKind::Name => "name",
            ScalarKind::String => "string",
            ScalarKind::Operator => "operator",
        };
        f.write_str(name)
    }
}

/// Convert any host value, building containers for sequences and mappings.
pub fn encode(value: HostValue, config: &CodecConfig) -> Result<Object> {
    match value {
        HostValue::Seq(items) => builder::build_array(items, config).map(Object::Array),
        HostValue::Map(entries) => builder::build_dict(entries, config).map(Object::Dictionary),
        scalar => encode_scalar(scalar, config),
    }
}

/// Convert a scalar host value. Sequences and mappings are rejected.
pub fn encode_scalar(value: HostValue, config: &CodecConfig) -> Result<Object> {
    match value {
        HostValue::Node(object) => Ok(object),
        HostValue::Bool(b) => Ok(Object::Boolean(b)),
        HostValue::Int(i) => encode_integer(i),
        HostValue::Float(f) => Ok(Object::Real(Real::from_f64(f, config.real_precision)?)),
        HostValue::Decimal(d) => Ok(Object::Real(Real::from_decimal(
            &d,
            config.real_precision,
        )?)),
        HostValue::Bytes(bytes) => Ok(Object::String(PdfString::new(bytes))),
        HostValue::Text(text) => Ok(Object::String(PdfString::from_text(&text))),
        HostValue::Name(name) => Ok(Object::Name(Name::new(name)?)),
        HostValue::Null => Ok(Object::Null),
        composite => Err(PdfError::conversion(
            "value",
            format!(
                "don't know how to convert {} to a scalar",
                composite.kind_name()
            ),
        )),
    }
}

/// Convert a scalar host value into a specific kind.
pub fn encode_as(value: HostValue, kind: ScalarKind, config: &CodecConfig) -> Result<Object> {
    let found = value.kind_name();
    let object = match (kind, value) {
        (_, HostValue::Node(object)) => {
            return if object.type_name() == kind.to_string() {
                Ok(object)
            } else {
                Err(PdfError::conversion(
                    "value",
                    format!("cannot use a {} node as {kind}", object.type_name()),
                ))
            }
        }
        (ScalarKind::Null, HostValue::Null) => Object::Null,
        (ScalarKind::Boolean, HostValue::Bool(b)) => Object::Boolean(b),
        (ScalarKind::Boolean, HostValue::Int(i)) => Object::Boolean(i != 0),
        (ScalarKind::Integer, HostValue::Int(i)) => encode_integer(i)?,
        (ScalarKind::Integer, HostValue::Bool(b)) => Object::Integer(b as i64),
        (ScalarKind::Integer, HostValue::Float(f)) if f.fract() == 0.0 && f.is_finite() => {
            encode_integer(f as i128)?
        }
        (ScalarKind::Real, HostValue::Float(f)) => {
            Object::Real(Real::from_f64(f, config.real_precision)?)
        }
        (ScalarKind::Real, HostValue::Decimal(d)) => {
            Object::Real(Real::from_decimal(&d, config.real_precision)?)
        }
        (ScalarKind::Real, HostValue::Int(i)) => {
            Object::Real(Real::from_decimal(&i.to_string(), config.real_precision)?)
        }
        (ScalarKind::Name, HostValue::Name(n) | HostValue::Text(n)) => Object::Name(Name::new(n)?),
        (ScalarKind::String, HostValue::Text(t)) => Object::String(PdfString::from_text(&t)),
        (ScalarKind::String, HostValue::Bytes(b)) => Object::String(PdfString::new(b)),
        (ScalarKind::String, HostValue::Name(n)) => Object::String(PdfString::from_text(&n)),
        (ScalarKind::Operator, HostValue::Text(t)) => Object::Operator(Operator::new(t)?),
        (kind, _) => {
            return Err(PdfError::conversion(
                "value",
                format!("don't know how to convert {found} to {kind}"),
            ))
        }
    };
    Ok(object)
}

/// Convert a scalar node back to a host value.
///
/// Reals come back as exact [`HostValue::Decimal`] text. Strings made from
/// text come back as [`HostValue::Text`], any other string as raw
/// [`HostValue::Bytes`]; [`decode_text`] reads any string as text.
pub fn decode_scalar(object: &Object) -> Result<HostValue> {
    match object {
        Object::Null => Ok(HostValue::Null),
        Object::Boolean(b) => Ok(HostValue::Bool(*b)),
        Object::Integer(i) => Ok(HostValue::Int(*i as i128)),
        Object::Real(r) => Ok(HostValue::Decimal(r.as_str().to_string())),
        Object::Name(n) => Ok(HostValue::Name(n.as_str().to_string())),
        Object::String(s) if s.is_text() => s.to_text().map(HostValue::Text),
        Object::String(s) => Ok(HostValue::Bytes(s.as_bytes().to_vec())),
        Object::Operator(_) => Ok(HostValue::Node(object.clone())),
        other => Err(PdfError::conversion(
            "value",
            format!("{} is not a scalar", other.type_name()),
        )),
    }
}

/// Convert a node tree back to host values. References stay as nodes.
pub fn decode(object: &Object) -> Result<HostValue> {
    match object {
        Object::Array(array) => array
            .iter()
            .enumerate()
            .map(|(index, item)| decode(item).map_err(|e| e.within(&format!("element {index}"))))
            .collect::<Result<Vec<_>>>()
            .map(HostValue::Seq),
        Object::Dictionary(dict) => dict
            .iter()
            .map(|(key, value)| {
                decode(value)
                    .map(|v| (key.as_str().to_string(), v))
                    .map_err(|e| e.within(&format!("key {:?}", key.as_str())))
            })
            .collect::<Result<Vec<_>>>()
            .map(HostValue::Map),
        Object::Stream(_) | Object::InlineImage(_) | Object::Reference(_) => {
            Ok(HostValue::Node(object.clone()))
        }
        scalar => decode_scalar(scalar),
    }
}

/// Text of a string node, honouring its declared encoding.
pub fn decode_text(object: &Object) -> Result<String> {
    match object {
        Object::String(s) => s.to_text(),
        other => Err(other.mismatch("string")),
    }
}

fn encode_integer(value: i128) -> Result<Object> {
    i64::try_from(value)
        .map(Object::Integer)
        .map_err(|_| PdfError::conversion("value", format!("integer {value} does not fit in 64 bits")))
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<i32> for HostValue {
    fn from(i: i32) -> Self {
        HostValue::Int(i as i128)
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Int(i as i128)
    }
}

impl From<u64> for HostValue {
    fn from(i: u64) -> Self {
        HostValue::Int(i as i128)
    }
}

impl From<f64> for HostValue {
    fn from(f: f64) -> Self {
        HostValue::Float(f)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Text(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Text(s)
    }
}

impl From<Vec<u8>> for HostValue {
    fn from(bytes: Vec<u8>) -> Self {
        HostValue::Bytes(bytes)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(items: Vec<HostValue>) -> Self {
        HostValue::Seq(items)
    }
}

impl From<Object> for HostValue {
    fn from(object: Object) -> Self {
        HostValue::Node(object)
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(HostValue::Null, Into::into)
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Value> for HostValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => HostValue::Null,
            Value::Bool(b) => HostValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    HostValue::Int(i as i128)
                } else if let Some(u) = n.as_u64() {
                    HostValue::Int(u as i128)
                } else {
                    HostValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => HostValue::Text(s),
            Value::Array(items) => HostValue::Seq(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                HostValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
