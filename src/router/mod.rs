// Router module - client page routing
// This file wires the route table, the navigation history and the router itself
//
// Numan Thabit 2025 Nov

pub mod history;
pub mod routes;

#[allow(clippy::module_inception)]
pub mod router;

pub use history::History;
pub use router::Router;
pub use routes::{find_by_name, normalize_path, resolve, RouteMatch, RouteRecord, View, ROUTES};
