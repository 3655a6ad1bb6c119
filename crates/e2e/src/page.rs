//! Browser capability set consumed by the helpers
//!
//! Everything above this module talks to the browser only through [`Page`]:
//! locate-by-role, locate-by-text, locate-by-css, click, fill, read-text,
//! observe-responses and wait-for-state. [`crate::playwright::PlaywrightPage`]
//! is the production implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::E2eResult;

/// Role-based lookup (`getByRole`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByRole {
    pub role: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_exact")]
    pub exact: bool,
}

impl ByRole {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            name: None,
            exact: true,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }
}

/// Text-based lookup (`getByText`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByText {
    pub text: String,
    #[serde(default = "default_exact")]
    pub exact: bool,
}

impl ByText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            exact: true,
        }
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }
}

fn default_exact() -> bool {
    true
}

/// How a single locator segment finds its elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Selector {
    Role(ByRole),
    Text(ByText),
    /// CSS selector; Playwright also accepts `//` and `(//` XPath here
    Css { selector: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(flatten)]
    pub selector: Selector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nth: Option<usize>,
}

/// Lazily evaluated element query, resolved by the page on every call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub chain: Vec<Segment>,
}

impl Locator {
    fn from_selector(selector: Selector) -> Self {
        Self {
            chain: vec![Segment {
                selector,
                has_text: None,
                nth: None,
            }],
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css {
            selector: selector.into(),
        })
    }

    pub fn role(by: ByRole) -> Self {
        Self::from_selector(Selector::Role(by))
    }

    pub fn text(by: ByText) -> Self {
        Self::from_selector(Selector::Text(by))
    }

    /// Keep only elements containing `text` (applies to the last segment)
    pub fn has_text(mut self, text: impl Into<String>) -> Self {
        if let Some(last) = self.chain.last_mut() {
            last.has_text = Some(text.into());
        }
        self
    }

    /// 0-based pick among the matches of the last segment
    pub fn nth(mut self, index: usize) -> Self {
        if let Some(last) = self.chain.last_mut() {
            last.nth = Some(index);
        }
        self
    }

    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Scope `child` inside the elements matched by `self`
    pub fn locator(mut self, child: Locator) -> Self {
        self.chain.extend(child.chain);
        self
    }

    /// Short human-readable form for logs and error messages
    pub fn describe(&self) -> String {
        self.chain
            .iter()
            .map(|s| {
                let mut out = match &s.selector {
                    Selector::Role(r) => match &r.name {
                        Some(name) => format!("role={}[name=\"{}\"]", r.role, name),
                        None => format!("role={}", r.role),
                    },
                    Selector::Text(t) => format!("text=\"{}\"", t.text),
                    Selector::Css { selector } => selector.clone(),
                };
                if let Some(t) = &s.has_text {
                    out.push_str(&format!(" >> has-text=\"{}\"", t));
                }
                if let Some(n) = s.nth {
                    out.push_str(&format!(" >> nth={}", n));
                }
                out
            })
            .collect::<Vec<_>>()
            .join(" >> ")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Load,
    DomContentLoaded,
    NetworkIdle,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Load => "load",
            LoadState::DomContentLoaded => "domcontentloaded",
            LoadState::NetworkIdle => "networkidle",
        }
    }
}

/// A network response observed by the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkResponse {
    pub url: String,
    pub status: u16,
}

pub type SubscriptionId = u64;

/// Live stream of responses; hand the id back to [`Page::off_response`]
pub struct ResponseSubscription {
    pub id: SubscriptionId,
    pub responses: mpsc::UnboundedReceiver<NetworkResponse>,
}

#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, url: &str) -> E2eResult<()>;

    async fn title(&self) -> E2eResult<String>;

    async fn url(&self) -> E2eResult<String>;

    async fn count(&self, locator: &Locator) -> E2eResult<usize>;

    async fn click(&self, locator: &Locator) -> E2eResult<()>;

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()>;

    async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()>;

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>>;

    async fn all_text_contents(&self, locator: &Locator) -> E2eResult<Vec<String>>;

    async fn attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>>;

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool>;

    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()>;

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> E2eResult<()>;

    /// Start observing responses. Every call must be paired with exactly
    /// one [`Page::off_response`].
    fn on_response(&self) -> ResponseSubscription;

    fn off_response(&self, id: SubscriptionId);

    async fn close(&self) -> E2eResult<()>;
}

/// Opens a fresh page per scenario
#[async_trait]
pub trait PageFactory: Send + Sync {
    async fn new_page(&self) -> E2eResult<Arc<dyn Page>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_defaults_to_exact() {
        let by = ByRole::new("button").name("Columnas");
        assert!(by.exact);
        assert_eq!(by.name.as_deref(), Some("Columnas"));
    }

    #[test]
    fn test_locator_chain_and_describe() {
        let loc = Locator::css(".dx-treeview-node")
            .has_text("Estado")
            .locator(Locator::css(".dx-checkbox"))
            .first();
        assert_eq!(loc.chain.len(), 2);
        assert_eq!(loc.chain[0].has_text.as_deref(), Some("Estado"));
        assert_eq!(loc.chain[1].nth, Some(0));
        assert_eq!(
            loc.describe(),
            ".dx-treeview-node >> has-text=\"Estado\" >> .dx-checkbox >> nth=0"
        );
    }

    #[test]
    fn test_locator_serializes_flat_segments() {
        let loc = Locator::role(ByRole::new("tab").name("Sin nombre").exact(false));
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["chain"][0]["by"], "role");
        assert_eq!(json["chain"][0]["role"], "tab");
        assert_eq!(json["chain"][0]["exact"], false);
        assert!(json["chain"][0].get("nth").is_none());
    }
}
