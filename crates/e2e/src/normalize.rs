//! Label normalization for URL comparisons

use std::fmt;

use unicode_normalization::UnicodeNormalization;

/// Canonical, accent-free, whitespace-free, lowercase form of a label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocaleToken(String);

impl LocaleToken {
    pub fn new(label: &str) -> Self {
        Self(normalize_label(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path fragment a menu entry is expected to navigate to: `/{token}/`
    pub fn url_fragment(&self) -> String {
        format!("/{}/", self.0)
    }
}

impl fmt::Display for LocaleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// `"Gestión OT"` -> `"gestionot"`
pub fn normalize_label(label: &str) -> String {
    // Lowercasing can emit combining marks (U+0130 -> "i\u{307}"), so the
    // filter runs after it.
    label
        .nfd()
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining_diacritic(*c) && !c.is_whitespace())
        .collect()
}

pub fn expected_url_fragment(label: &str) -> String {
    LocaleToken::new(label).url_fragment()
}
