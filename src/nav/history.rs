//! Browser history and location seam.

use parking_lot::Mutex;
use reqwest::Url;

use crate::error::HistoryError;

/// How a committed swap touches the history stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    /// Forward navigation via a step link
    Push,
    /// Programmatic reload or submission response for the current entry
    Replace,
    /// Back/forward: the browser already moved the pointer
    PassThrough,
}

/// Where to bring the viewport after an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollTarget {
    /// Top of the swapped region, smooth
    RegionStart(String),
    /// Center on a field (first invalid one)
    FieldCenter(String),
}

/// Window-level operations the synchronizer needs from its host
pub trait Browser: Send + Sync {
    /// Location of the current history entry
    fn current_url(&self) -> Url;

    fn push_state(&self, url: &Url) -> Result<(), HistoryError>;

    fn replace_state(&self, url: &Url) -> Result<(), HistoryError>;

    /// Full page load (hard navigation)
    fn assign(&self, url: &Url);

    fn scroll_into_view(&self, target: ScrollTarget);
}

/// Apply `mode` for `url` against the host history.
pub fn apply_history(
    browser: &dyn Browser,
    mode: HistoryMode,
    url: &Url,
) -> Result<(), HistoryError> {
    match mode {
        HistoryMode::Push => browser.push_state(url),
        HistoryMode::Replace => browser.replace_state(url),
        HistoryMode::PassThrough => Ok(()),
    }
}

#[derive(Debug)]
struct HeadlessState {
    entries: Vec<Url>,
    index: usize,
    hard_navigations: Vec<Url>,
    scrolls: Vec<ScrollTarget>,
    reject_writes: bool,
}

/// In-process browser for the CLI and tests.
///
/// Keeps a session history with a pointer, so back/forward behave like a real
/// tab: pushing truncates any forward entries.
#[derive(Debug)]
pub struct HeadlessBrowser {
    state: Mutex<HeadlessState>,
}

impl HeadlessBrowser {
    pub fn new(initial: Url) -> Self {
        Self {
            state: Mutex::new(HeadlessState {
                entries: vec![initial],
                index: 0,
                hard_navigations: Vec::new(),
                scrolls: Vec::new(),
                reject_writes: false,
            }),
        }
    }

    /// Make every subsequent push/replace fail
    pub fn reject_history_writes(&self, reject: bool) {
        self.state.lock().reject_writes = reject;
    }

    /// Move back one entry; returns the new current URL
    pub fn back(&self) -> Option<Url> {
        let mut state = self.state.lock();
        if state.index == 0 {
            return None;
        }
        state.index -= 1;
        Some(state.entries[state.index].clone())
    }

    /// Move forward one entry; returns the new current URL
    pub fn forward(&self) -> Option<Url> {
        let mut state = self.state.lock();
        if state.index + 1 >= state.entries.len() {
            return None;
        }
        state.index += 1;
        Some(state.entries[state.index].clone())
    }

    pub fn entries(&self) -> Vec<Url> {
        self.state.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    pub fn hard_navigations(&self) -> Vec<Url> {
        self.state.lock().hard_navigations.clone()
    }

    pub fn scrolls(&self) -> Vec<ScrollTarget> {
        self.state.lock().scrolls.clone()
    }

    fn check_write(state: &HeadlessState, url: &Url) -> Result<(), HistoryError> {
        if state.reject_writes {
            return Err(HistoryError::Rejected(url.to_string()));
        }
        let current = &state.entries[state.index];
        if current.origin() != url.origin() {
            return Err(HistoryError::CrossOrigin(url.to_string()));
        }
        Ok(())
    }
}

impl Browser for HeadlessBrowser {
    fn current_url(&self) -> Url {
        let state = self.state.lock();
        state.entries[state.index].clone()
    }

    fn push_state(&self, url: &Url) -> Result<(), HistoryError> {
        let mut state = self.state.lock();
        Self::check_write(&state, url)?;
        let keep = state.index + 1;
        state.entries.truncate(keep);
        state.entries.push(url.clone());
        state.index = keep;
        Ok(())
    }

    fn replace_state(&self, url: &Url) -> Result<(), HistoryError> {
        let mut state = self.state.lock();
        Self::check_write(&state, url)?;
        let index = state.index;
        state.entries[index] = url.clone();
        Ok(())
    }

    fn assign(&self, url: &Url) {
        let mut state = self.state.lock();
        tracing::info!(url = %url, "Hard navigation");
        state.hard_navigations.push(url.clone());
        let keep = state.index + 1;
        state.entries.truncate(keep);
        state.entries.push(url.clone());
        state.index = keep;
    }

    fn scroll_into_view(&self, target: ScrollTarget) {
        self.state.lock().scrolls.push(target);
    }
}
