//! Validated text types shared across the gallery crates.
//!
//! Gallery and photo names arrive from URLs, JSON bodies and multipart headers, and every one of
//! them ends up joined onto the gallery root. The types here are the only way those names reach
//! the filesystem layer.

/// Maximum length, in bytes, of a single path component on common filesystems.
pub const MAX_COMPONENT_LEN: usize = 255;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The input is `.` or `..`
    #[error("'{0}' is a reserved name")]
    Reserved(String),

    /// The input contains a path separator or NUL byte
    #[error("name must not contain path separators or NUL bytes")]
    Separator,

    /// The input starts with `.`
    #[error("name must not start with '.'")]
    Hidden,

    /// The input exceeds [`MAX_COMPONENT_LEN`] bytes
    #[error("name exceeds {MAX_COMPONENT_LEN} bytes")]
    TooLong,
}

/// A single, visible filesystem path component.
///
/// Used for gallery directory names and photo file names. The input is not trimmed:
/// `" a.jpg"` and `"a.jpg"` are different files.
///
/// Rejects:
/// - empty input
/// - `.` and `..`
/// - `/`, `\` and NUL anywhere in the name
/// - a leading `.` (hidden entries are never listed, so they are never created either)
/// - names longer than [`MAX_COMPONENT_LEN`] bytes
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathComponent(String);

impl PathComponent {
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let input = input.as_ref();

        if input.trim().is_empty() {
            return Err(TextError::Empty);
        }
        if input == "." || input == ".." {
            return Err(TextError::Reserved(input.to_owned()));
        }
        if input.contains(['/', '\\', '\0']) {
            return Err(TextError::Separator);
        }
        if input.starts_with('.') {
            return Err(TextError::Hidden);
        }
        if input.len() > MAX_COMPONENT_LEN {
            return Err(TextError::TooLong);
        }

        Ok(Self(input.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name without its final extension, e.g. `photo1` for `photo1.jpg`.
    ///
    /// Matches [`std::path::Path::file_stem`]: `archive.tar.gz` yields `archive.tar`.
    pub fn stem(&self) -> &str {
        std::path::Path::new(&self.0)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.0)
    }
}

impl std::fmt::Display for PathComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PathComponent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for PathComponent {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl std::str::FromStr for PathComponent {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for PathComponent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PathComponent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PathComponent::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Percent-encodes a string the way a browser's `encodeURI` does.
///
/// Bytes outside the URI unreserved and reserved sets are written as `%XX` (upper-case hex) of
/// their UTF-8 encoding. Reserved characters such as `/`, `?` and `#` are left alone.
pub fn encode_uri(input: &str) -> String {
    const KEEP: &[u8] = b";,/?:@&=+$-_.!~*'()#";
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        if b.is_ascii_alphanumeric() || KEEP.contains(&b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[usize::from(b >> 4)] as char);
            out.push(HEX[usize::from(b & 0x0f)] as char);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_component_accepts_plain_names() {
        for name in ["trip", "photo1.jpg", "Summer 2024", "über", "a..b"] {
            assert!(PathComponent::new(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn test_path_component_rejects_traversal() {
        assert_eq!(PathComponent::new(""), Err(TextError::Empty));
        assert_eq!(PathComponent::new("  "), Err(TextError::Empty));
        assert_eq!(
            PathComponent::new(".."),
            Err(TextError::Reserved("..".into()))
        );
        assert_eq!(PathComponent::new("."), Err(TextError::Reserved(".".into())));
        assert_eq!(PathComponent::new("a/b"), Err(TextError::Separator));
        assert_eq!(PathComponent::new("..\\b"), Err(TextError::Separator));
        assert_eq!(PathComponent::new("a\0b"), Err(TextError::Separator));
        assert_eq!(PathComponent::new(".hidden"), Err(TextError::Hidden));
        assert_eq!(
            PathComponent::new("x".repeat(MAX_COMPONENT_LEN + 1)),
            Err(TextError::TooLong)
        );
    }

    #[test]
    fn test_path_component_keeps_whitespace() {
        let name = PathComponent::new(" spaced.jpg").unwrap();
        assert_eq!(name.as_str(), " spaced.jpg");
    }

    #[test]
    fn test_stem_strips_last_extension() {
        assert_eq!(PathComponent::new("photo1.jpg").unwrap().stem(), "photo1");
        assert_eq!(
            PathComponent::new("archive.tar.gz").unwrap().stem(),
            "archive.tar"
        );
        assert_eq!(PathComponent::new("README").unwrap().stem(), "README");
    }

    #[test]
    fn test_path_component_deserialize_rejects_invalid() {
        let ok: PathComponent = serde_json::from_str("\"trip\"").unwrap();
        assert_eq!(ok.as_str(), "trip");
        assert!(serde_json::from_str::<PathComponent>("\"../etc\"").is_err());
    }

    #[test]
    fn test_encode_uri() {
        assert_eq!(encode_uri("trip"), "trip");
        assert_eq!(encode_uri("Summer 2024"), "Summer%202024");
        assert_eq!(encode_uri("a/b?c#d"), "a/b?c#d");
        assert_eq!(encode_uri("über"), "%C3%BCber");
        assert_eq!(encode_uri("100%"), "100%25");
    }
}
