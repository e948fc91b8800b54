//! Recursive construction of arrays and dictionaries from host values

use crate::codec::{encode_scalar, HostValue};
use crate::config::CodecConfig;
use crate::error::{PdfError, Result};
use crate::objects::{Array, Dictionary, Name, Object};

/// Deepest container nesting accepted from host input.
pub const MAX_NESTING_DEPTH: usize = 1000;

/// Build an array, converting each element in order.
///
/// A failure names the offending position, e.g.
/// `element 1 → key "/Kids" → element 3: don't know how to convert ...`.
pub fn build_array(items: Vec<HostValue>, config: &CodecConfig) -> Result<Array> {
    build_array_at(items, config, 1)
}

/// Build a dictionary. Keys must be `/`-prefixed names; later duplicates win.
pub fn build_dict(entries: Vec<(String, HostValue)>, config: &CodecConfig) -> Result<Dictionary> {
    build_dict_at(entries, config, 1)
}

fn build_array_at(items: Vec<HostValue>, config: &CodecConfig, depth: usize) -> Result<Array> {
    check_depth(depth)?;
    let mut array = Array::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let location = format!("element {index}");
        let object = build_value(item, config, depth).map_err(|e| locate(e, &location))?;
        array.push(object).map_err(|e| locate(e, &location))?;
    }
    Ok(array)
}

fn build_dict_at(
    entries: Vec<(String, HostValue)>,
    config: &CodecConfig,
    depth: usize,
) -> Result<Dictionary> {
    check_depth(depth)?;
    let mut dict = Dictionary::with_capacity(entries.len());
    for (key, value) in entries {
        let location = format!("key {key:?}");
        let name = Name::new(key).map_err(|e| locate(e, &location))?;
        let object = build_value(value, config, depth).map_err(|e| locate(e, &location))?;
        dict.insert(name, object).map_err(|e| locate(e, &location))?;
    }
    Ok(dict)
}

fn build_value(value: HostValue, config: &CodecConfig, depth: usize) -> Result<Object> {
    match value {
        HostValue::Seq(items) => build_array_at(items, config, depth + 1).map(Object::Array),
        HostValue::Map(entries) => build_dict_at(entries, config, depth + 1).map(Object::Dictionary),
        scalar => encode_scalar(scalar, config).map_err(|e| match e {
            // strip the generic location; the caller supplies the position
            PdfError::Conversion { message, .. } => PdfError::conversion("", message),
            other => other,
        }),
    }
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(PdfError::conversion(
            "",
            format!("nesting deeper than {MAX_NESTING_DEPTH} levels"),
        ));
    }
    Ok(())
}

/// Attach a position to an error raised while converting one entry.
fn locate(error: PdfError, location: &str) -> PdfError {
    match error {
        PdfError::Conversion { location: inner, message } if inner.is_empty() => {
            PdfError::conversion(location, message)
        }
        conversion @ PdfError::Conversion { .. } => conversion.within(location),
        PdfError::InvalidName(message) | PdfError::InvalidReal(message) => {
            PdfError::conversion(location, message)
        }
        PdfError::ForeignObject(message) => {
            PdfError::ForeignObject(format!("{location}: {message}"))
        }
        PdfError::InvalidOperation(message) => PdfError::conversion(location, message),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::objects::{DocumentId, IndirectRef, ObjectId, Stream};

    fn config() -> CodecConfig {
        CodecConfig::default()
    }

    fn reference(doc: DocumentId, number: u32) -> HostValue {
        HostValue::Node(Object::Reference(IndirectRef::new(
            doc,
            ObjectId::new(number, 0),
        )))
    }

    #[test]
    fn test_build_flat_array() {
        let array = build_array(
            vec![1.into(), 2.5.into(), "x".into(), HostValue::Null],
            &config(),
        )
        .unwrap();
        assert_eq!(array.len(), 4);
        assert_eq!(array.get(0), Some(&Object::Integer(1)));
        assert_eq!(array.get(3), Some(&Object::Null));
    }

    #[test]
    fn test_build_nested_dict_keeps_order() {
        let dict = build_dict(
            vec![
                ("/Type".into(), HostValue::Name("/Page".into())),
                (
                    "/MediaBox".into(),
                    HostValue::Seq(vec![0.into(), 0.into(), 612.into(), 792.into()]),
                ),
                (
                    "/Resources".into(),
                    HostValue::Map(vec![("/ProcSet".into(), HostValue::Seq(vec![]))]),
                ),
            ],
            &config(),
        )
        .unwrap();

        let keys: Vec<_> = dict.keys().map(Name::as_str).collect();
        assert_eq!(keys, vec!["/Type", "/MediaBox", "/Resources"]);
        assert_eq!(dict.get_array("/MediaBox").unwrap().len(), 4);
        assert!(dict.get_dict("/Resources").unwrap().contains_key("/ProcSet"));
    }

    #[test]
    fn test_error_names_element_position() {
        let error = build_array(
            vec![1.into(), 2.into(), 3.into(), HostValue::Int(i128::MAX)],
            &config(),
        )
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Conversion);
        assert!(
            error.to_string().starts_with("element 3: "),
            "unexpected message: {error}"
        );
    }

    #[test]
    fn test_error_names_nested_path() {
        let error = build_dict(
            vec![(
                "/Kids".into(),
                HostValue::Seq(vec![HostValue::Null, HostValue::Float(f64::NAN)]),
            )],
            &config(),
        )
        .unwrap_err();
        assert!(
            error.to_string().starts_with("key \"/Kids\" → element 1: "),
            "unexpected message: {error}"
        );
    }

    #[test]
    fn test_bad_key_is_conversion_error() {
        let error = build_dict(vec![("Type".into(), 1.into())], &config()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Conversion);
        assert!(error.to_string().starts_with("key \"Type\": "));
    }

    #[test]
    fn test_foreign_reference_mix_rejected() {
        let a = DocumentId::new();
        let b = DocumentId::new();
        let error = build_array(vec![reference(a, 1), reference(b, 1)], &config()).unwrap_err();
        match error {
            PdfError::ForeignObject(message) => assert!(message.starts_with("element 1: ")),
            other => panic!("Expected foreign object error, got {other:?}"),
        }
    }

    #[test]
    fn test_direct_stream_rejected_with_position() {
        let stream = HostValue::Node(Object::Stream(Stream::new(Dictionary::new(), vec![])));
        let error = build_dict(vec![("/S".into(), stream)], &config()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Conversion);
        assert!(error.to_string().starts_with("key \"/S\": "));
    }

    #[test]
    fn test_nesting_limit() {
        let mut value = HostValue::Seq(vec![]);
        for _ in 0..MAX_NESTING_DEPTH {
            value = HostValue::Seq(vec![value]);
        }
        let HostValue::Seq(items) = value else {
            unreachable!()
        };
        let error = build_array(items, &config()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Conversion);
        assert!(error.to_string().contains("nesting deeper than"));
    }

    #[test]
    fn test_nesting_at_limit_is_accepted() {
        let mut value = HostValue::Seq(vec![]);
        for _ in 1..MAX_NESTING_DEPTH - 1 {
            value = HostValue::Seq(vec![value]);
        }
        assert!(build_array(vec![value], &config()).is_ok());
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let dict = build_dict(
            vec![("/A".into(), 1.into()), ("/A".into(), 2.into())],
            &config(),
        )
        .unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get("/A"), Some(&Object::Integer(2)));
    }
}
