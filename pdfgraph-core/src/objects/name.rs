use crate::error::{PdfError, Result};
use std::borrow::Borrow;
use std::fmt;

/// PDF name, stored with its leading `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    /// Validate and build a name from its `/`-prefixed form.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !name.starts_with('/') {
            return Err(PdfError::InvalidName(format!(
                "{name:?}: name must begin with '/'"
            )));
        }
        if name.len() == 1 {
            return Err(PdfError::InvalidName(
                "name must not be empty after '/'".to_string(),
            ));
        }
        if name.contains('\0') {
            return Err(PdfError::InvalidName(format!(
                "{name:?}: name must not contain NUL"
            )));
        }
        Ok(Self(name))
    }

    /// Names this crate writes itself; callers go through [`Name::new`].
    pub(crate) fn known(name: &'static str) -> Self {
        debug_assert!(name.starts_with('/') && name.len() > 1);
        Self(name.to_string())
    }

    /// The name including its leading `/`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name without its leading `/`.
    pub fn bare(&self) -> &str {
        &self.0[1..]
    }

    /// PDF syntax for the name, escaping delimiters and non-regular bytes as `#xx`.
    pub fn escaped(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        out.push('/');
        for byte in self.bare().bytes() {
            let regular = byte > b' '
                && byte < 0x7F
                && !matches!(
                    byte,
                    b'#' | b'/' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'%'
                );
            if regular {
                out.push(byte as char);
            } else {
                out.push_str(&format!("#{byte:02X}"));
            }
        }
        out
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Name {
    type Error = PdfError;

    fn try_from(value: &str) -> Result<Self> {
        Name::new(value)
    }
}

impl TryFrom<String> for Name {
    type Error = PdfError;

    fn try_from(value: String) -> Result<Self> {
        Name::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_name() {
        let name = Name::new("/Type").unwrap();
        assert_eq!(name.as_str(), "/Type");
        assert_eq!(name.bare(), "Type");
        assert_eq!(name.to_string(), "/Type");
    }

    #[test]
    fn test_name_requires_prefix() {
        assert!(matches!(Name::new("Type"), Err(PdfError::InvalidName(_))));
    }

    #[test]
    fn test_name_rejects_empty() {
        assert!(matches!(Name::new("/"), Err(PdfError::InvalidName(_))));
        assert!(matches!(Name::new(""), Err(PdfError::InvalidName(_))));
    }

    #[test]
    fn test_name_rejects_nul() {
        assert!(Name::new("/A\0B").is_err());
    }

    #[test]
    fn test_escaped() {
        assert_eq!(Name::new("/Type").unwrap().escaped(), "/Type");
        assert_eq!(Name::new("/A B").unwrap().escaped(), "/A#20B");
        assert_eq!(Name::new("/a#b").unwrap().escaped(), "/a#23b");
        assert_eq!(Name::new("/x(y)").unwrap().escaped(), "/x#28y#29");
    }

    #[test]
    fn test_borrow_lookup() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Name::new("/Kids").unwrap());
        assert!(set.contains("/Kids"));
        assert!(!set.contains("Kids"));
    }
}
