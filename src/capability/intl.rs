//! Translated string lookup.
//!
//! A [`Translator`] resolves user-facing strings for one module. Keys are
//! composed as `group-element-key`: the translation group, the module's
//! element name (identity minus the selector sigil), and the string key,
//! matching how resources are organized per page region. Missing keys fall
//! back to a caller-supplied default, with a warning, so an incomplete
//! resource bundle never breaks a page.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::module::Module;

// ============================================================================
// TranslationStore
// ============================================================================

/// External translation resource store.
pub trait TranslationStore: Send + Sync {
    /// Looks up the string for `(group, element, key)`.
    fn lookup(&self, group: &str, element: &str, key: &str) -> Option<String>;
}

// ============================================================================
// Translator
// ============================================================================

/// Translation capability for one module.
///
/// # Example
///
/// ```ignore
/// let translator = Translator::for_module(&module, "checkout", store);
/// let label = translator.get("submit-label", "Submit");
/// let greeting = translator.get_with(
///     "greeting",
///     "Hello, {name}!",
///     &[("name", "Ada")],
/// );
/// ```
pub struct Translator {
    /// Translation group (resource bundle name).
    group: String,

    /// Element name the keys are scoped to.
    element: String,

    /// The resource store.
    store: Arc<dyn TranslationStore>,
}

impl Translator {
    /// Creates a translator scoped to `module` within `group`.
    #[must_use]
    pub fn for_module(module: &Module, group: impl Into<String>, store: Arc<dyn TranslationStore>) -> Self {
        Self {
            group: group.into(),
            element: module.id().element_name().to_string(),
            store,
        }
    }

    /// Returns the translation group.
    #[inline]
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Resolves `key`, falling back to `default` when untranslated.
    #[must_use]
    pub fn get(&self, key: &str, default: &str) -> String {
        match self.store.lookup(&self.group, &self.element, key) {
            Some(text) => text,
            None => {
                warn!(
                    group = %self.group,
                    element = %self.element,
                    key,
                    "key has no translation yet; using default"
                );
                default.to_string()
            }
        }
    }

    /// Resolves `key` and substitutes `{name}` placeholders from `tokens`.
    #[must_use]
    pub fn get_with(&self, key: &str, default: &str, tokens: &[(&str, &str)]) -> String {
        let mut text = self.get(key, default);
        for (name, value) in tokens {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("group", &self.group)
            .field("element", &self.element)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
