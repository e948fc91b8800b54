//! Explicit settings for value conversion and document writing

use crate::error::{PdfError, Result};
use crate::objects::{DEFAULT_REAL_PRECISION, MAX_REAL_PRECISION};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings used when converting host values into objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodecConfig {
    /// Significant digits kept when a float becomes a real.
    pub real_precision: usize,
}

impl CodecConfig {
    pub fn with_real_precision(precision: usize) -> Result<Self> {
        let config = Self {
            real_precision: precision,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_REAL_PRECISION).contains(&self.real_precision) {
            return Err(PdfError::InvalidOperation(format!(
                "real precision {} outside 1..={MAX_REAL_PRECISION}",
                self.real_precision
            )));
        }
        Ok(())
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            real_precision: DEFAULT_REAL_PRECISION,
        }
    }
}

/// Options handed to the engine when a document is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WriteOptions {
    /// Flate-compress streams that carry no filter yet.
    pub compress_streams: bool,
    /// zlib level, 0..=9.
    pub compression_level: u32,
    /// Version written in the `%PDF-` header.
    pub pdf_version: String,
}

impl WriteOptions {
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > 9 {
            return Err(PdfError::InvalidOperation(format!(
                "compression level {} outside 0..=9",
                self.compression_level
            )));
        }
        let valid_version = self
            .pdf_version
            .split_once('.')
            .map(|(major, minor)| {
                !major.is_empty()
                    && !minor.is_empty()
                    && major.bytes().all(|b| b.is_ascii_digit())
                    && minor.bytes().all(|b| b.is_ascii_digit())
            })
            .unwrap_or(false);
        if !valid_version {
            return Err(PdfError::InvalidOperation(format!(
                "invalid PDF version {:?}",
                self.pdf_version
            )));
        }
        Ok(())
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compress_streams: cfg!(feature = "compression"),
            compression_level: 6,
            pdf_version: "1.7".to_string(),
        }
    }
}
