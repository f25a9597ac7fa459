// History-based page router
// Maps browser-style locations, optionally under a base path, onto the route table
// and keeps the navigation history
//
// Numan Thabit 2025 Nov

use super::history::History;
use super::routes::{find_by_name, resolve, RouteMatch};
use tracing::debug;

/// Router over the two client pages
#[derive(Debug, Clone)]
pub struct Router {
    base: String,
    history: History,
}

impl Router {
    /// `base_path` prefixes every location, e.g. `/app/`; empty or `/` means none.
    pub fn new(base_path: Option<&str>) -> Self {
        Self::with_initial_location(base_path, "/")
    }

    pub fn with_initial_location(base_path: Option<&str>, path: &str) -> Self {
        let base = base_path
            .map(|b| b.trim().trim_end_matches('/'))
            .filter(|b| !b.is_empty())
            .map(|b| format!("/{}", b.trim_start_matches('/')))
            .unwrap_or_default();
        let mut router = Self {
            history: History::new(String::new()),
            base,
        };
        let initial = router.href(path);
        router.history.replace(initial);
        router
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Full location for an in-app path.
    pub fn href(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// In-app path for a full location; `None` when it lies outside the base.
    pub fn strip_base<'a>(&self, location: &'a str) -> Option<&'a str> {
        if self.base.is_empty() {
            return Some(location);
        }
        let rest = location.strip_prefix(self.base.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with(['/', '?', '#']) {
            Some(rest)
        } else {
            None
        }
    }

    pub fn current_location(&self) -> &str {
        self.history.current()
    }

    pub fn current_route(&self) -> Option<RouteMatch> {
        self.strip_base(self.history.current()).and_then(resolve)
    }

    pub fn push(&mut self, path: &str) -> Option<RouteMatch> {
        let location = self.href(path);
        debug!(location = %location, "navigate");
        self.history.push(location);
        self.current_route()
    }

    pub fn push_named(&mut self, name: &str) -> Option<RouteMatch> {
        let record = find_by_name(name)?;
        self.push(record.path)
    }

    pub fn replace(&mut self, path: &str) -> Option<RouteMatch> {
        let location = self.href(path);
        debug!(location = %location, "navigate (replace)");
        self.history.replace(location);
        self.current_route()
    }

    /// Step back; `None` when already at the first entry.
    pub fn back(&mut self) -> Option<RouteMatch> {
        if self.history.back() {
            self.current_route()
        } else {
            None
        }
    }

    pub fn forward(&mut self) -> Option<RouteMatch> {
        if self.history.forward() {
            self.current_route()
        } else {
            None
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(None)
    }
}
