//! JSON export of object graphs
//!
//! Names keep their leading slash, references are written as `"n g R"`,
//! strings are prefixed `u:` when they decode to text and `b:` followed by
//! lowercase hex otherwise. Streams export their dictionary only.

use crate::document::Document;
use crate::error::Result;
use crate::objects::{Object, ObjectId};
use crate::traversal::TraversalContext;
use serde_json::{Map, Number, Value};

/// Convert `object` to JSON.
///
/// With `dereference` set, references are replaced by the objects they
/// point to, except where that would re-enter an object already on the
/// current path.
pub fn to_json(document: &Document, object: &Object, dereference: bool) -> Result<Value> {
    document.ensure_open()?;
    let mut context = TraversalContext::new();
    convert(document, object, dereference, &mut context)
}

fn convert(
    document: &Document,
    object: &Object,
    dereference: bool,
    context: &mut TraversalContext<ObjectId>,
) -> Result<Value> {
    context.enter()?;
    let value = convert_node(document, object, dereference, context);
    context.exit();
    value
}

fn convert_node(
    document: &Document,
    object: &Object,
    dereference: bool,
    context: &mut TraversalContext<ObjectId>,
) -> Result<Value> {
    let value = match object {
        Object::Null => Value::Null,
        Object::Boolean(b) => Value::Bool(*b),
        Object::Integer(i) => Value::Number((*i).into()),
        Object::Real(real) => match Number::from_f64(real.to_f64()) {
            Some(number) => Value::Number(number),
            None => Value::String(real.as_str().to_string()),
        },
        Object::Name(name) => Value::String(name.as_str().to_string()),
        Object::String(string) => match string.to_text() {
            Ok(text) => Value::String(format!("u:{text}")),
            Err(_) => Value::String(format!("b:{}", hex(string.as_bytes()))),
        },
        Object::Operator(operator) => Value::String(operator.as_str().to_string()),
        Object::InlineImage(image) => Value::String(format!("b:{}", hex(image.data()))),
        Object::Array(array) => Value::Array(
            array
                .iter()
                .map(|item| convert(document, item, dereference, context))
                .collect::<Result<Vec<_>>>()?,
        ),
        Object::Dictionary(dict) => {
            let mut map = Map::with_capacity(dict.len());
            for (key, value) in dict {
                map.insert(
                    key.as_str().to_string(),
                    convert(document, value, dereference, context)?,
                );
            }
            Value::Object(map)
        }
        Object::Stream(stream) => {
            let dict = convert_node(
                document,
                &Object::Dictionary(stream.dictionary().clone()),
                dereference,
                context,
            )?;
            let mut map = Map::with_capacity(1);
            map.insert("dict".to_string(), dict);
            Value::Object(map)
        }
        Object::Reference(reference) => {
            let handle = Value::String(format!(
                "{} {} R",
                reference.id().number(),
                reference.id().generation()
            ));
            if !dereference || context.is_on_path(&reference.id()) {
                return Ok(handle);
            }
            match document.lookup(*reference) {
                Some(target) => {
                    context.visit(reference.id());
                    let value = convert(document, target, dereference, context);
                    context.leave(reference.id());
                    value?
                }
                None => handle,
            }
        }
    };
    Ok(value)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
