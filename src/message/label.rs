//! Message label parsing and precedence keys.
//!
//! A label names a message on the bus. It is either *bare* (`"say-hello"`)
//! or *qualified* with the sender's identity (`"#foo:say-hello"`). The
//! listener table is keyed by `Label`, so the qualified-beats-bare
//! precedence rule is a pair of map lookups rather than ad hoc string
//! splitting.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identifiers::ModuleId;

// ============================================================================
// Label
// ============================================================================

/// A message label, optionally qualified with its sender.
///
/// # Example
///
/// ```
/// use modnet::Label;
///
/// let bare = Label::parse("say-hello")?;
/// assert_eq!(bare.name(), "say-hello");
/// assert!(bare.sender().is_none());
///
/// let qualified = Label::parse("#foo:say-hello")?;
/// assert_eq!(qualified.name(), "say-hello");
/// assert_eq!(qualified.sender().map(|s| s.as_str()), Some("#foo"));
/// # Ok::<(), modnet::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    /// Sender qualification, if any.
    sender: Option<ModuleId>,

    /// The bare message name.
    name: String,
}

impl Label {
    /// Parses a raw label string.
    ///
    /// A colon separates the sender prefix from the message name; only the
    /// first colon is significant, so names themselves may contain colons.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedLabel`] if the label is empty, or if
    /// either side of the colon is empty.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.split_once(':') {
            Some((prefix, name)) => {
                if prefix.is_empty() || name.is_empty() {
                    return Err(Error::malformed_label(raw));
                }
                let sender = if prefix == crate::identifiers::WILDCARD {
                    ModuleId::wildcard()
                } else {
                    ModuleId::new(prefix)?
                };
                Ok(Self {
                    sender: Some(sender),
                    name: name.to_string(),
                })
            }
            None => {
                if raw.is_empty() {
                    return Err(Error::malformed_label(raw));
                }
                Ok(Self {
                    sender: None,
                    name: raw.to_string(),
                })
            }
        }
    }

    /// Creates a bare label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedLabel`] if `name` is empty or contains a
    /// colon.
    pub fn bare(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.contains(':') {
            return Err(Error::malformed_label(name));
        }
        Ok(Self { sender: None, name })
    }

    /// Creates a label from already-validated parts.
    #[inline]
    pub(crate) fn from_parts(sender: Option<ModuleId>, name: String) -> Self {
        Self { sender, name }
    }

    /// Returns the bare message name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the sender qualification, if any.
    #[inline]
    #[must_use]
    pub fn sender(&self) -> Option<&ModuleId> {
        self.sender.as_ref()
    }

    /// Returns `true` if this label carries a sender prefix.
    #[inline]
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.sender.is_some()
    }

    /// Returns this label qualified with `sender`, keeping an existing
    /// qualification.
    #[must_use]
    pub fn qualify(self, sender: &ModuleId) -> Self {
        match self.sender {
            Some(_) => self,
            None => Self {
                sender: Some(sender.clone()),
                name: self.name,
            },
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sender {
            Some(sender) => write!(f, "{}:{}", sender, self.name),
            None => f.write_str(&self.name),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_parse_bare() {
        let label = Label::parse("switch-view").expect("valid label");
        assert_eq!(label.name(), "switch-view");
        assert!(label.sender().is_none());
        assert!(!label.is_qualified());
    }

    #[test]
    fn test_parse_qualified() {
        let label = Label::parse("#foo:switch-view").expect("valid label");
        assert_eq!(label.name(), "switch-view");
        assert_eq!(label.sender().map(ModuleId::as_str), Some("#foo"));
    }

    #[test]
    fn test_parse_wildcard_prefix() {
        let label = Label::parse("*:announce").expect("valid label");
        assert!(label.sender().is_some_and(ModuleId::is_wildcard));
    }

    #[test]
    fn test_parse_name_keeps_extra_colons() {
        let label = Label::parse("#foo:a:b").expect("valid label");
        assert_eq!(label.name(), "a:b");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Label::parse("").is_err());
        assert!(Label::parse(":say-hello").is_err());
        assert!(Label::parse("#foo:").is_err());
    }

    #[test]
    fn test_bare_rejects_colon() {
        assert!(Label::bare("a:b").is_err());
        assert!(Label::bare("").is_err());
    }

    #[test]
    fn test_qualify() {
        let sender = ModuleId::new("#foo").expect("valid id");
        let other = ModuleId::new("#bar").expect("valid id");

        let bare = Label::bare("ping").expect("valid label");
        let qualified = bare.qualify(&sender);
        assert_eq!(qualified.sender(), Some(&sender));

        // An existing qualification is kept.
        let kept = qualified.qualify(&other);
        assert_eq!(kept.sender(), Some(&sender));
    }

    #[test]
    fn test_display_round_trip() {
        for raw in ["ping", "#foo:ping", "*:announce"] {
            let label = Label::parse(raw).expect("valid label");
            assert_eq!(label.to_string(), raw);
        }
    }

    proptest! {
        #[test]
        fn prop_parse_display_round_trip(
            prefix in proptest::option::of("[#.]?[a-z][a-z0-9-]{0,12}"),
            name in "[a-z][a-z0-9-]{0,16}",
        ) {
            let raw = match &prefix {
                Some(p) => format!("{p}:{name}"),
                None => name.clone(),
            };
            let label = Label::parse(&raw).expect("valid label");
            prop_assert_eq!(label.to_string(), raw);
            prop_assert_eq!(label.is_qualified(), prefix.is_some());
        }
    }
}
