// src/services/template_service.rs
use std::collections::HashMap;

use crate::errors::{NotifyError, NotifyResult};

const NAMESPACE: &str = "notifications";

const BUILTIN_BUNDLES: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("he", include_str!("../../locales/he.json")),
];

const DEFAULT_SECONDARY_LANGUAGE: &str = "en";

/// Translation bundles keyed by language tag.
///
/// Recipients with no stored language get `fallback_language`. A stored
/// language without a bundle renders in `secondary_language`.
/// Lookups never fail: a missing key renders as the key itself.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    bundles: HashMap<String, serde_json::Value>,
    fallback_language: String,
    secondary_language: String,
}

impl TemplateCatalog {
    /// Bundles shipped with the binary.
    pub fn builtin(fallback_language: impl Into<String>) -> NotifyResult<Self> {
        let mut bundles = HashMap::new();
        for (language, raw) in BUILTIN_BUNDLES {
            let bundle: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
                NotifyError::InvalidConfiguration(format!("bundle '{}': {}", language, e))
            })?;
            bundles.insert(language.to_string(), bundle);
        }

        Ok(Self::from_bundles(bundles, fallback_language))
    }

    pub fn from_bundles(
        bundles: HashMap<String, serde_json::Value>,
        fallback_language: impl Into<String>,
    ) -> Self {
        Self {
            bundles,
            fallback_language: fallback_language.into(),
            secondary_language: DEFAULT_SECONDARY_LANGUAGE.to_string(),
        }
    }

    pub fn with_secondary_language(mut self, language: impl Into<String>) -> Self {
        self.secondary_language = language.into();
        self
    }

    pub fn fallback_language(&self) -> &str {
        &self.fallback_language
    }

    fn bundle_for(&self, language: &str) -> Option<&serde_json::Value> {
        self.bundles
            .get(language)
            .or_else(|| self.bundles.get(&self.secondary_language))
            .or_else(|| self.bundles.get(&self.fallback_language))
    }

    /// Raw `(title, body)` templates for `key`. Each missing field falls back
    /// to the key string.
    pub fn lookup(&self, language: &str, key: &str) -> (String, String) {
        let entry = self
            .bundle_for(language)
            .and_then(|bundle| bundle.get(NAMESPACE))
            .and_then(|ns| ns.get(key));

        let field = |name: &str| {
            entry
                .and_then(|e| e.get(name))
                .and_then(|v| v.as_str())
                .unwrap_or(key)
                .to_string()
        };

        (field("title"), field("body"))
    }

    pub fn render(
        &self,
        language: &str,
        key: &str,
        params: &HashMap<String, String>,
    ) -> (String, String) {
        let (title, body) = self.lookup(language, key);
        (substitute(&title, params), substitute(&body, params))
    }
}

/// Replaces every `{{name}}` with `params[name]` in one left-to-right pass.
/// Inserted values are never rescanned. Unknown tokens stay literal.
pub fn substitute(template: &str, params: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];

        let Some(close) = after_open.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };

        let name = &after_open[..close];
        match params.get(name) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after_open[close + 2..];
    }

    out.push_str(rest);
    out
}
