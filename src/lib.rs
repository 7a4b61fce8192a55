pub mod api;
pub mod backend;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod report;
