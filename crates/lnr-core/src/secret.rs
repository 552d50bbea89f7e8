use std::fmt;

/// Characters of a key that may ever be rendered.
const VISIBLE_PREFIX: usize = 4;
/// Keys shorter than this render as a bare mask.
const MIN_LEN_FOR_PREFIX: usize = 16;
const MASK: &str = "****";

/// An API key.
///
/// Has no `Display` impl and a masking `Debug` impl, so it cannot end up in
/// log lines or error messages by accident. Use [`Secret::expose`] at the
/// single point where the raw value is needed (the auth header, the secrets
/// file).
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Returns `None` for empty or whitespace-only input: an empty value is
    /// an absent credential, never a usable one.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Secret(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// At most the first four characters followed by a mask.
    pub fn masked(&self) -> String {
        if self.0.chars().count() < MIN_LEN_FOR_PREFIX {
            return MASK.to_string();
        }
        let prefix: String = self.0.chars().take(VISIBLE_PREFIX).collect();
        format!("{prefix}{MASK}")
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", self.masked())
    }
}

/// Replace every occurrence of the raw key in `text` with its mask.
pub fn redact(text: &str, secret: &Secret) -> String {
    text.replace(secret.expose(), &secret.masked())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "lin_api_0123456789abcdefghij";

    #[test]
    fn empty_values_are_absent() {
        assert!(Secret::new("").is_none());
        assert!(Secret::new("   \n").is_none());
    }

    #[test]
    fn new_trims_surrounding_whitespace() {
        let s = Secret::new(format!("  {KEY}\n")).unwrap();
        assert_eq!(s.expose(), KEY);
    }

    #[test]
    fn masked_shows_only_short_prefix() {
        let s = Secret::new(KEY).unwrap();
        assert_eq!(s.masked(), "lin_****");
        assert!(!s.masked().contains("api_0123"));
    }

    #[test]
    fn short_keys_are_fully_masked() {
        let s = Secret::new("abc123").unwrap();
        assert_eq!(s.masked(), "****");
    }

    #[test]
    fn debug_never_prints_value() {
        let s = Secret::new(KEY).unwrap();
        let rendered = format!("{s:?}");
        assert!(!rendered.contains(KEY));
        assert_eq!(rendered, "Secret(lin_****)");
    }

    #[test]
    fn redact_scrubs_all_occurrences() {
        let s = Secret::new(KEY).unwrap();
        let text = format!("header {KEY} and again {KEY}");
        let out = redact(&text, &s);
        assert!(!out.contains(KEY));
        assert_eq!(out.matches("lin_****").count(), 2);
    }
}
