//! Stream filters available to the basic engine
//!
//! Only FlateDecode (behind the `compression` feature) and ASCIIHexDecode
//! are implemented; image codecs and encryption filters are the external
//! engine's job.

use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Name};

#[cfg(feature = "compression")]
use flate2::read::ZlibDecoder;
#[cfg(feature = "compression")]
use flate2::write::ZlibEncoder;
#[cfg(feature = "compression")]
use flate2::Compression;
#[cfg(feature = "compression")]
use std::io::{Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    ASCIIHexDecode,
    FlateDecode,
}

impl Filter {
    pub fn from_name(name: &Name) -> Result<Self> {
        match name.bare() {
            "ASCIIHexDecode" | "AHx" => Ok(Filter::ASCIIHexDecode),
            "FlateDecode" | "Fl" => Ok(Filter::FlateDecode),
            other => Err(PdfError::Engine(format!("unsupported filter /{other}"))),
        }
    }
}

/// Apply the decode side of each filter in order.
pub fn decode_chain(data: &[u8], filters: &[Name], parms: &[Option<Dictionary>]) -> Result<Vec<u8>> {
    let mut result = data.to_vec();
    for (index, name) in filters.iter().enumerate() {
        check_predictor(parms.get(index).and_then(Option::as_ref))?;
        result = match Filter::from_name(name)? {
            Filter::ASCIIHexDecode => decode_ascii_hex(&result)?,
            Filter::FlateDecode => decode_flate(&result)?,
        };
    }
    Ok(result)
}

/// Apply the encode side of each filter, last filter first.
pub fn encode_chain(
    data: &[u8],
    filters: &[Name],
    parms: &[Option<Dictionary>],
    level: u32,
) -> Result<Vec<u8>> {
    let mut result = data.to_vec();
    for (index, name) in filters.iter().enumerate().rev() {
        check_predictor(parms.get(index).and_then(Option::as_ref))?;
        result = match Filter::from_name(name)? {
            Filter::ASCIIHexDecode => encode_ascii_hex(&result),
            Filter::FlateDecode => encode_flate(&result, level)?,
        };
    }
    Ok(result)
}

fn check_predictor(parms: Option<&Dictionary>) -> Result<()> {
    let predictor = parms
        .and_then(|p| p.get("/Predictor"))
        .and_then(|p| p.as_integer())
        .unwrap_or(1);
    if predictor > 1 {
        return Err(PdfError::Engine(format!(
            "predictor {predictor} is not supported by the basic engine"
        )));
    }
    Ok(())
}

#[cfg(feature = "compression")]
pub fn decode_flate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut result = Vec::new();
    decoder
        .read_to_end(&mut result)
        .map_err(|e| PdfError::CompressionError(format!("Flate decode error: {e}")))?;
    Ok(result)
}

#[cfg(not(feature = "compression"))]
pub fn decode_flate(_data: &[u8]) -> Result<Vec<u8>> {
    Err(PdfError::Engine(
        "FlateDecode requires the compression feature".to_string(),
    ))
}

#[cfg(feature = "compression")]
pub fn encode_flate(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder
        .write_all(data)
        .map_err(|e| PdfError::CompressionError(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| PdfError::CompressionError(e.to_string()))
}

#[cfg(not(feature = "compression"))]
pub fn encode_flate(_data: &[u8], _level: u32) -> Result<Vec<u8>> {
    Err(PdfError::Engine(
        "FlateDecode requires the compression feature".to_string(),
    ))
}

pub fn decode_ascii_hex(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;

    for &byte in data {
        if byte == b'>' {
            break;
        }
        if byte.is_ascii_whitespace() {
            continue;
        }
        let nibble = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            _ => {
                return Err(PdfError::CompressionError(format!(
                    "Invalid hex character: {}",
                    byte as char
                )))
            }
        };
        match high.take() {
            Some(h) => result.push((h << 4) | nibble),
            None => high = Some(nibble),
        }
    }

    // odd trailing digit is padded with 0
    if let Some(h) = high {
        result.push(h << 4);
    }
    Ok(result)
}

pub fn encode_ascii_hex(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() * 2 + 1);
    for byte in data {
        result.extend_from_slice(format!("{byte:02x}").as_bytes());
    }
    result.push(b'>');
    result
}
