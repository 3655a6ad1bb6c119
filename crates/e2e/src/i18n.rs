//! Translated UI labels
//!
//! Labels live in `<locale>.json` files with nested objects, looked up with
//! dotted keys (`LOGIN.BTN_ACCESO`). The locale is always passed in by the
//! caller.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "es-ES")]
    EsEs,
    #[default]
    #[serde(rename = "en-GB")]
    EnGb,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::EsEs, Locale::EnGb];

    pub fn tag(&self) -> &'static str {
        match self {
            Locale::EsEs => "es-ES",
            Locale::EnGb => "en-GB",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::ALL
            .into_iter()
            .find(|l| l.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| E2eError::Config(format!("unsupported locale: {}", s)))
    }
}

/// Loaded translation tables
#[derive(Debug, Clone, Default)]
pub struct Translations {
    tables: HashMap<Locale, Value>,
}

impl Translations {
    /// Read every supported `<locale>.json` present in `dir`
    pub fn load(dir: &Path) -> E2eResult<Self> {
        let mut tables = HashMap::new();
        for locale in Locale::ALL {
            let path = dir.join(format!("{}.json", locale.tag()));
            if !path.exists() {
                debug!("No translations for {} at {}", locale, path.display());
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            tables.insert(locale, serde_json::from_str(&content)?);
        }
        Ok(Self { tables })
    }

    pub fn from_tables(tables: impl IntoIterator<Item = (Locale, Value)>) -> Self {
        Self {
            tables: tables.into_iter().collect(),
        }
    }

    fn lookup(&self, locale: Locale, key: &str) -> Option<String> {
        let mut node = self.tables.get(&locale)?;
        for part in key.split('.') {
            node = node.get(part)?;
        }
        node.as_str().map(str::to_string)
    }

    /// Translate `key`, falling back to the default locale and then to the key
    pub fn translate(&self, locale: Locale, key: &str) -> String {
        if let Some(text) = self.lookup(locale, key) {
            return text;
        }
        if locale != Locale::default() {
            if let Some(text) = self.lookup(Locale::default(), key) {
                warn!("Missing {} translation for {}, using {}", locale, key, Locale::default());
                return text;
            }
        }
        warn!("Missing translation for {} ({})", key, locale);
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tables() -> Translations {
        Translations::from_tables([
            (
                Locale::EsEs,
                json!({ "LOGIN": { "BTN_ACCESO": "Acceso", "ENTRAR": "Entrar" } }),
            ),
            (
                Locale::EnGb,
                json!({ "LOGIN": { "BTN_ACCESO": "Access", "ENTRAR": "Sign in", "LOGIN_USER": "User" } }),
            ),
        ])
    }

    #[test]
    fn test_translate_nested_key() {
        let t = tables();
        assert_eq!(t.translate(Locale::EsEs, "LOGIN.BTN_ACCESO"), "Acceso");
        assert_eq!(t.translate(Locale::EnGb, "LOGIN.ENTRAR"), "Sign in");
    }

    #[test]
    fn test_translate_falls_back() {
        let t = tables();
        assert_eq!(t.translate(Locale::EsEs, "LOGIN.LOGIN_USER"), "User");
        assert_eq!(t.translate(Locale::EsEs, "LOGIN.MISSING"), "LOGIN.MISSING");
        assert_eq!(t.translate(Locale::EsEs, "LOGIN"), "LOGIN");
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!("es-es".parse::<Locale>().unwrap(), Locale::EsEs);
        assert!("de-DE".parse::<Locale>().is_err());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("es-ES.json"),
            r#"{"LOGIN":{"ENTRAR":"Entrar"}}"#,
        )
        .unwrap();
        let t = Translations::load(dir.path()).unwrap();
        assert_eq!(t.translate(Locale::EsEs, "LOGIN.ENTRAR"), "Entrar");
    }
}
