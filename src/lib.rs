// Library root module for transfer-client
// This file defines the public API and module structure of the transfer scheduling client:
// form validation, the backend API client, cached data access and page routing
//
// Numan Thabit 2025 Nov

pub mod cache;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod queries;
pub mod router;
pub mod submission;
pub mod transport;
pub mod validation;
