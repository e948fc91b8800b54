//! PDF strings and text encodings
//!
//! A string is an arbitrary byte sequence. When it carries text, the bytes
//! are either PDFDocEncoding, UTF-16BE with a `FE FF` byte order mark, or
//! (PDF 2.0) UTF-8 with an `EF BB BF` mark.

use crate::error::{PdfError, Result};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

const UTF16BE_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Undefined code points in PDFDocEncoding are marked with `0`.
#[rustfmt::skip]
const PDF_DOC_ENCODING: [u32; 256] = [
    0x0000, 0x0001, 0x0002, 0x0003, 0x0004, 0x0005, 0x0006, 0x0007,
    0x0008, 0x0009, 0x000A, 0x000B, 0x000C, 0x000D, 0x000E, 0x000F,
    0x0010, 0x0011, 0x0012, 0x0013, 0x0014, 0x0015, 0x0016, 0x0017,
    0x02D8, 0x02C7, 0x02C6, 0x02D9, 0x02DD, 0x02DB, 0x02DA, 0x02DC,
    0x0020, 0x0021, 0x0022, 0x0023, 0x0024, 0x0025, 0x0026, 0x0027,
    0x0028, 0x0029, 0x002A, 0x002B, 0x002C, 0x002D, 0x002E, 0x002F,
    0x0030, 0x0031, 0x0032, 0x0033, 0x0034, 0x0035, 0x0036, 0x0037,
    0x0038, 0x0039, 0x003A, 0x003B, 0x003C, 0x003D, 0x003E, 0x003F,
    0x0040, 0x0041, 0x0042, 0x0043, 0x0044, 0x0045, 0x0046, 0x0047,
    0x0048, 0x0049, 0x004A, 0x004B, 0x004C, 0x004D, 0x004E, 0x004F,
    0x0050, 0x0051, 0x0052, 0x0053, 0x0054, 0x0055, 0x0056, 0x0057,
    0x0058, 0x0059, 0x005A, 0x005B, 0x005C, 0x005D, 0x005E, 0x005F,
    0x0060, 0x0061, 0x0062, 0x0063, 0x0064, 0x0065, 0x0066, 0x0067,
    0x0068, 0x0069, 0x006A, 0x006B, 0x006C, 0x006D, 0x006E, 0x006F,
    0x0070, 0x0071, 0x0072, 0x0073, 0x0074, 0x0075, 0x0076, 0x0077,
    0x0078, 0x0079, 0x007A, 0x007B, 0x007C, 0x007D, 0x007E, 0x0000,
    0x2022, 0x2020, 0x2021, 0x2026, 0x2014, 0x2013, 0x0192, 0x2044,
    0x2039, 0x203A, 0x2212, 0x2030, 0x201E, 0x201C, 0x201D, 0x2018,
    0x2019, 0x201A, 0x2122, 0xFB01, 0xFB02, 0x0141, 0x0152, 0x0160,
    0x0178, 0x017D, 0x0131, 0x0142, 0x0153, 0x0161, 0x017E, 0x0000,
    0x20AC, 0x00A1, 0x00A2, 0x00A3, 0x00A4, 0x00A5, 0x00A6, 0x00A7,
    0x00A8, 0x00A9, 0x00AA, 0x00AB, 0x00AC, 0x0000, 0x00AE, 0x00AF,
    0x00B0, 0x00B1, 0x00B2, 0x00B3, 0x00B4, 0x00B5, 0x00B6, 0x00B7,
    0x00B8, 0x00B9, 0x00BA, 0x00BB, 0x00BC, 0x00BD, 0x00BE, 0x00BF,
    0x00C0, 0x00C1, 0x00C2, 0x00C3, 0x00C4, 0x00C5, 0x00C6, 0x00C7,
    0x00C8, 0x00C9, 0x00CA, 0x00CB, 0x00CC, 0x00CD, 0x00CE, 0x00CF,
    0x00D0, 0x00D1, 0x00D2, 0x00D3, 0x00D4, 0x00D5, 0x00D6, 0x00D7,
    0x00D8, 0x00D9, 0x00DA, 0x00DB, 0x00DC, 0x00DD, 0x00DE, 0x00DF,
    0x00E0, 0x00E1, 0x00E2, 0x00E3, 0x00E4, 0x00E5, 0x00E6, 0x00E7,
    0x00E8, 0x00E9, 0x00EA, 0x00EB, 0x00EC, 0x00ED, 0x00EE, 0x00EF,
    0x00F0, 0x00F1, 0x00F2, 0x00F3, 0x00F4, 0x00F5, 0x00F6, 0x00F7,
    0x00F8, 0x00F9, 0x00FA, 0x00FB, 0x00FC, 0x00FD, 0x00FE, 0x00FF,
];

lazy_static! {
    static ref PDF_DOC_REVERSE: HashMap<char, u8> = {
        let mut map = HashMap::with_capacity(256);
        for (byte, &code) in PDF_DOC_ENCODING.iter().enumerate() {
            if code == 0 && byte != 0 {
                continue;
            }
            if let Some(ch) = char::from_u32(code) {
                map.insert(ch, byte as u8);
            }
        }
        map
    };
}

/// How the bytes of a string are to be read as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringEncoding {
    PdfDoc,
    Utf16Be,
    Utf8,
}

/// Equality and hashing look at the bytes and encoding only; whether the
/// string was built from text does not make two strings different.
#[derive(Debug, Clone)]
pub struct PdfString {
    bytes: Vec<u8>,
    encoding: StringEncoding,
    from_text: bool,
}

impl PartialEq for PdfString {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes && self.encoding == other.encoding
    }
}

impl Eq for PdfString {}

impl Hash for PdfString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
        self.encoding.hash(state);
    }
}

impl PdfString {
    /// Wrap raw bytes; the text encoding is inferred from a byte order mark.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let encoding = detect_encoding(&bytes);
        Self {
            bytes,
            encoding,
            from_text: false,
        }
    }

    /// Encode text as PDFDocEncoding when every character fits, otherwise UTF-16BE.
    pub fn from_text(text: &str) -> Self {
        if let Some(bytes) = encode_pdf_doc(text) {
            if detect_encoding(&bytes) == StringEncoding::PdfDoc {
                return Self {
                    bytes,
                    encoding: StringEncoding::PdfDoc,
                    from_text: true,
                };
            }
        }

        let mut bytes = Vec::with_capacity(2 + text.len() * 2);
        bytes.extend_from_slice(&UTF16BE_BOM);
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Self {
            bytes,
            encoding: StringEncoding::Utf16Be,
            from_text: true,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn encoding(&self) -> StringEncoding {
        self.encoding
    }

    /// True when the string was made by [`PdfString::from_text`].
    pub fn is_text(&self) -> bool {
        self.from_text
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the bytes as text using the declared encoding.
    pub fn to_text(&self) -> Result<String> {
        match self.encoding {
            StringEncoding::Utf16Be => {
                let body = &self.bytes[UTF16BE_BOM.len()..];
                if body.len() % 2 != 0 {
                    return Err(PdfError::conversion(
                        "string",
                        "UTF-16BE text has an odd number of bytes",
                    ));
                }
                let units: Vec<u16> = body
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units)
                    .map_err(|e| PdfError::conversion("string", format!("invalid UTF-16BE: {e}")))
            }
            StringEncoding::Utf8 => std::str::from_utf8(&self.bytes[UTF8_BOM.len()..])
                .map(str::to_string)
                .map_err(|e| PdfError::conversion("string", format!("invalid UTF-8: {e}"))),
            StringEncoding::PdfDoc => self
                .bytes
                .iter()
                .map(|&byte| {
                    let code = PDF_DOC_ENCODING[byte as usize];
                    if code == 0 && byte != 0 {
                        return Err(PdfError::conversion(
                            "string",
                            format!("byte 0x{byte:02X} is undefined in PDFDocEncoding"),
                        ));
                    }
                    char::from_u32(code).ok_or_else(|| {
                        PdfError::conversion("string", format!("bad code point {code:#X}"))
                    })
                })
                .collect(),
        }
    }

    /// Decode as text, replacing anything undecodable with U+FFFD.
    pub fn to_text_lossy(&self) -> String {
        match self.to_text() {
            Ok(text) => text,
            Err(_) => match self.encoding {
                StringEncoding::Utf16Be => {
                    let units: Vec<u16> = self.bytes[UTF16BE_BOM.len()..]
                        .chunks(2)
                        .map(|pair| match pair {
                            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
                            _ => 0xFFFD,
                        })
                        .collect();
                    String::from_utf16_lossy(&units)
                }
                StringEncoding::Utf8 => {
                    String::from_utf8_lossy(&self.bytes[UTF8_BOM.len()..]).into_owned()
                }
                StringEncoding::PdfDoc => self
                    .bytes
                    .iter()
                    .map(|&byte| {
                        char::from_u32(PDF_DOC_ENCODING[byte as usize])
                            .filter(|_| PDF_DOC_ENCODING[byte as usize] != 0 || byte == 0)
                            .unwrap_or('\u{FFFD}')
                    })
                    .collect(),
            },
        }
    }
}

impl From<&str> for PdfString {
    fn from(text: &str) -> Self {
        PdfString::from_text(text)
    }
}

impl From<Vec<u8>> for PdfString {
    fn from(bytes: Vec<u8>) -> Self {
        PdfString::new(bytes)
    }
}

fn detect_encoding(bytes: &[u8]) -> StringEncoding {
    if bytes.starts_with(&UTF16BE_BOM) {
        StringEncoding::Utf16Be
    } else if bytes.starts_with(&UTF8_BOM) {
        StringEncoding::Utf8
    } else {
        StringEncoding::PdfDoc
    }
}

fn encode_pdf_doc(text: &str) -> Option<Vec<u8>> {
    text.chars()
        .map(|ch| PDF_DOC_REVERSE.get(&ch).copied())
        .collect()
}
