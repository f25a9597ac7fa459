// Route table
// The client has exactly two pages: the scheduling form at `/` and the transfer
// history at `/transfers`
//
// Numan Thabit 2025 Nov

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    /// Scheduling form with fee preview
    Home,
    /// Scheduled transfer history
    TransferList,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Home => f.write_str("home"),
            View::TransferList => f.write_str("transfer-list"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRecord {
    pub path: &'static str,
    pub name: &'static str,
    pub view: View,
}

pub const ROUTES: [RouteRecord; 2] = [
    RouteRecord {
        path: "/",
        name: "home",
        view: View::Home,
    },
    RouteRecord {
        path: "/transfers",
        name: "transfers",
        view: View::TransferList,
    },
];

/// A resolved location: the matched record plus the path as navigated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub record: RouteRecord,
    pub full_path: String,
}

impl RouteMatch {
    pub fn view(&self) -> View {
        self.record.view
    }

    pub fn name(&self) -> &'static str {
        self.record.name
    }
}

/// Drop query and fragment, collapse repeated and trailing slashes.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

pub fn resolve(path: &str) -> Option<RouteMatch> {
    let normalized = normalize_path(path);
    ROUTES
        .iter()
        .find(|record| record.path == normalized)
        .map(|record| RouteMatch {
            record: *record,
            full_path: path.to_string(),
        })
}

pub fn find_by_name(name: &str) -> Option<&'static RouteRecord> {
    ROUTES.iter().find(|record| record.name == name)
}
