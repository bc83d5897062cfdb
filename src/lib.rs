pub mod background;
pub mod canvas;
pub mod compute_conflicts;
pub mod config;
pub mod error;
pub mod generator;
pub mod layout;
pub mod routes;
pub mod schedule_api;
pub mod table_import;
pub mod week_filter;
