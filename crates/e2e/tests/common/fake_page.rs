//! In-memory stand-in for a Wakamiti grid page
//!
//! Understands exactly the locators the helpers build from the default
//! `GridSelectors`, and records what was done to it.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use wakamiti_e2e::config::GridSelectors;
use wakamiti_e2e::error::{E2eError, E2eResult};
use wakamiti_e2e::page::{
    LoadState, Locator, NetworkResponse, Page, ResponseSubscription, Segment, Selector,
    SubscriptionId, WaitState,
};

#[derive(Default)]
pub struct FakeState {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// What the grid renders after a filter is committed; `None` filters `rows`
    pub render_after_filter: Option<Vec<Vec<String>>>,
    pub rendered: Vec<Vec<String>>,
    pub hidden: HashSet<String>,
    /// Hidden headers keep rendering
    pub lag_hide: bool,
    /// A re-shown column renders after the other labelled columns
    pub move_on_show: bool,
    /// Header reads left that rotate the labelled headers afterwards
    pub rotate_header_reads: usize,

    pub filters: Vec<(usize, String)>,
    pub committed: Vec<(usize, String)>,
    pub suggestion_visible: bool,
    pub suggestions: Vec<String>,
    pub suggestion_clicked: Option<String>,

    pub picker_opened: usize,
    pub checkbox_clicks: usize,

    pub ready_texts: HashSet<String>,
    pub clicked_texts: Vec<String>,
    pub responses_on_click: HashMap<String, Vec<NetworkResponse>>,
    pub subscribers: HashMap<SubscriptionId, mpsc::UnboundedSender<NetworkResponse>>,
    pub next_subscription: SubscriptionId,
    pub on_response_calls: usize,
    pub off_response_calls: Vec<SubscriptionId>,

    pub network_busy: bool,
    pub spinner_visible: bool,

    pub title: String,
    pub url: String,
    pub visible_css: HashSet<String>,
    pub clicks: Vec<String>,
    pub events: Vec<String>,
}

pub struct FakePage {
    pub state: Mutex<FakeState>,
    selectors: GridSelectors,
}

enum Target {
    Headers(Option<String>),
    SampleRows,
    SampleRowCells(usize),
    RenderedRows,
    RenderedCell { row: usize, column: usize },
    FilterInput(usize),
    SuggestionPanel,
    SuggestionOption(String),
    Spinner,
    PickerButton,
    PickerCheckbox(String),
    ReadyText(String),
    Other(String),
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                title: "Wakamiti".to_string(),
                url: "http://127.0.0.1:8080/".to_string(),
                ..Default::default()
            }),
            selectors: GridSelectors::default(),
        }
    }

    /// Grid with the given headers and rows, rendered as-is
    pub fn with_grid(headers: &[&str], rows: &[&[&str]]) -> Self {
        let page = Self::new();
        {
            let mut s = page.state.lock();
            s.headers = strings(headers);
            s.rows = rows.iter().map(|r| strings(r)).collect();
            s.rendered = s.rows.clone();
        }
        page
    }

    fn classify(&self, locator: &Locator) -> Target {
        let first = &locator.chain[0];
        let second = locator.chain.get(1);

        if let Selector::Role(role) = &first.selector {
            if role.role == "button" && role.name.as_deref() == Some(self.selectors.column_picker_button.as_str()) {
                return Target::PickerButton;
            }
            return Target::Other(locator.describe());
        }
        let Selector::Css { selector } = &first.selector else {
            return Target::Other(locator.describe());
        };
        let sel = selector.as_str();

        if sel == self.selectors.column_header {
            Target::Headers(first.has_text.clone())
        } else if sel == self.selectors.sample_row {
            match second {
                Some(_) => Target::SampleRowCells(first.nth.unwrap_or(0)),
                None => Target::SampleRows,
            }
        } else if sel == self.selectors.rendered_row {
            match second.and_then(css_of) {
                Some(css) if css.starts_with("td:nth-child(") => {
                    let column = css
                        .trim_start_matches("td:nth-child(")
                        .trim_end_matches(')')
                        .parse()
                        .unwrap_or(0);
                    Target::RenderedCell {
                        row: first.nth.unwrap_or(0),
                        column,
                    }
                }
                _ => Target::RenderedRows,
            }
        } else if sel.starts_with("(//input") {
            let n = sel
                .rsplit('[')
                .next()
                .and_then(|s| s.trim_end_matches(']').parse().ok())
                .unwrap_or(0);
            Target::FilterInput(n)
        } else if sel == self.selectors.suggestion_panel {
            Target::SuggestionPanel
        } else if let Some(rest) = sel.strip_prefix(".dx-item.dx-list-item[title=\"") {
            Target::SuggestionOption(rest.trim_end_matches("\"]").to_string())
        } else if sel == self.selectors.spinner {
            Target::Spinner
        } else if sel == self.selectors.column_picker_node {
            Target::PickerCheckbox(first.has_text.clone().unwrap_or_default())
        } else if let Some(text) = sel.strip_prefix("text=") {
            Target::ReadyText(text.to_string())
        } else {
            Target::Other(sel.to_string())
        }
    }

    fn visible_headers(state: &FakeState) -> Vec<String> {
        state
            .headers
            .iter()
            .filter(|h| state.lag_hide || !state.hidden.contains(*h))
            .cloned()
            .collect()
    }

    pub fn click_count_on_checkboxes(&self) -> usize {
        self.state.lock().checkbox_clicks
    }
}

fn css_of(segment: &Segment) -> Option<&str> {
    match &segment.selector {
        Selector::Css { selector } => Some(selector),
        _ => None,
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        let mut s = self.state.lock();
        s.url = url.to_string();
        s.events.push(format!("goto:{}", url));
        Ok(())
    }

    async fn title(&self) -> E2eResult<String> {
        Ok(self.state.lock().title.clone())
    }

    async fn url(&self) -> E2eResult<String> {
        Ok(self.state.lock().url.clone())
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        let target = self.classify(locator);
        let s = self.state.lock();
        Ok(match target {
            Target::Headers(Some(text)) => Self::visible_headers(&s)
                .iter()
                .filter(|h| h.contains(&text))
                .count(),
            Target::Headers(None) => Self::visible_headers(&s).len(),
            Target::SampleRows => s.rows.len(),
            Target::RenderedRows => s.rendered.len(),
            Target::FilterInput(n) => {
                let inputs = s.headers.iter().filter(|h| !h.trim().is_empty()).count();
                usize::from(n >= 1 && n <= inputs)
            }
            Target::SuggestionOption(v) => s.suggestions.iter().filter(|o| **o == v).count(),
            Target::PickerCheckbox(label) => usize::from(s.headers.contains(&label)),
            Target::Other(css) => usize::from(s.visible_css.contains(&css)),
            _ => 0,
        })
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        let target = self.classify(locator);
        let mut s = self.state.lock();
        match target {
            Target::PickerButton => s.picker_opened += 1,
            Target::PickerCheckbox(label) => {
                if !s.headers.contains(&label) {
                    return Err(E2eError::ElementNotFound(label));
                }
                s.checkbox_clicks += 1;
                if !s.hidden.remove(&label) {
                    s.hidden.insert(label);
                } else if s.move_on_show {
                    let labelled = s.headers.iter().filter(|h| !h.is_empty()).count();
                    if let Some(from) = s.headers.iter().position(|h| *h == label) {
                        let moved = s.headers.remove(from);
                        s.headers.insert(labelled - 1, moved);
                    }
                }
            }
            Target::SuggestionOption(v) => s.suggestion_clicked = Some(v),
            Target::ReadyText(text) => {
                if !s.ready_texts.contains(&text) {
                    return Err(E2eError::ElementNotFound(text));
                }
                s.events.push(format!("click:{}", text));
                s.clicked_texts.push(text.clone());
                let responses = s.responses_on_click.get(&text).cloned().unwrap_or_default();
                for response in responses {
                    s.subscribers
                        .retain(|_, tx| tx.send(response.clone()).is_ok());
                }
            }
            _ => {
                let described = locator.describe();
                s.clicks.push(described);
            }
        }
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        let target = self.classify(locator);
        let mut s = self.state.lock();
        match target {
            Target::FilterInput(n) => s.filters.push((n, value.to_string())),
            _ => s.events.push(format!("fill:{}={}", locator.describe(), value)),
        }
        Ok(())
    }

    async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()> {
        let target = self.classify(locator);
        let mut s = self.state.lock();
        if let (Target::FilterInput(n), "Enter") = (target, key) {
            let value = s
                .filters
                .iter()
                .rev()
                .find(|(col, _)| *col == n)
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            s.committed.push((n, value.clone()));
            let rendered = match &s.render_after_filter {
                Some(rows) => rows.clone(),
                None => s
                    .rows
                    .iter()
                    .filter(|r| r.get(n - 1).map(|c| c.trim()) == Some(value.trim()))
                    .cloned()
                    .collect(),
            };
            s.rendered = rendered;
        }
        Ok(())
    }

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>> {
        let target = self.classify(locator);
        let s = self.state.lock();
        Ok(match target {
            Target::RenderedCell { row, column } => s
                .rendered
                .get(row)
                .and_then(|r| r.get(column.wrapping_sub(1)))
                .cloned(),
            _ => None,
        })
    }

    async fn all_text_contents(&self, locator: &Locator) -> E2eResult<Vec<String>> {
        let target = self.classify(locator);
        let mut s = self.state.lock();
        Ok(match target {
            Target::Headers(_) => {
                let headers = Self::visible_headers(&s);
                if s.rotate_header_reads > 0 {
                    s.rotate_header_reads -= 1;
                    let labelled = s.headers.iter().filter(|h| !h.is_empty()).count();
                    s.headers[..labelled].rotate_left(1);
                }
                headers
            }
            Target::SampleRowCells(i) => s.rows.get(i).cloned().unwrap_or_default(),
            _ => Vec::new(),
        })
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        let target = self.classify(locator);
        let s = self.state.lock();
        Ok(match (target, name) {
            (Target::PickerCheckbox(label), "aria-checked") => {
                Some((!s.hidden.contains(&label)).to_string())
            }
            _ => None,
        })
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        let target = self.classify(locator);
        let s = self.state.lock();
        Ok(match target {
            Target::SuggestionPanel => s.suggestion_visible,
            Target::Spinner => s.spinner_visible,
            Target::Other(css) => s.visible_css.contains(&css),
            _ => false,
        })
    }

    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()> {
        let target = self.classify(locator);
        let s = self.state.lock();
        let ok = match (target, state) {
            (Target::Spinner, WaitState::Hidden) => !s.spinner_visible,
            (Target::ReadyText(text), _) => s.ready_texts.contains(&text),
            (Target::RenderedCell { row, .. }, _) => row < s.rendered.len(),
            _ => true,
        };
        if ok {
            Ok(())
        } else {
            Err(E2eError::Timeout(format!(
                "{} ({} ms)",
                locator.describe(),
                timeout.as_millis()
            )))
        }
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> E2eResult<()> {
        let busy = self.state.lock().network_busy;
        if busy && state == LoadState::NetworkIdle {
            Err(E2eError::Timeout(format!("networkidle ({} ms)", timeout.as_millis())))
        } else {
            Ok(())
        }
    }

    fn on_response(&self) -> ResponseSubscription {
        let mut s = self.state.lock();
        s.next_subscription += 1;
        let id = s.next_subscription;
        let (tx, rx) = mpsc::unbounded_channel();
        s.subscribers.insert(id, tx);
        s.on_response_calls += 1;
        s.events.push("on_response".to_string());
        ResponseSubscription { id, responses: rx }
    }

    fn off_response(&self, id: SubscriptionId) {
        let mut s = self.state.lock();
        s.subscribers.remove(&id);
        s.off_response_calls.push(id);
        s.events.push("off_response".to_string());
    }

    async fn close(&self) -> E2eResult<()> {
        self.state.lock().events.push("close".to_string());
        Ok(())
    }
}
