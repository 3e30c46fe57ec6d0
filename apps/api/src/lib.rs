//! Study-sheet layout service: pagination, overflow detection and content
//! prioritization for multi-column printable sheets.

pub mod config;
pub mod errors;
pub mod layout;
pub mod models;
pub mod routes;
pub mod state;
