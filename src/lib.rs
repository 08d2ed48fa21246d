pub mod api;
pub mod config;
pub mod executor;
pub mod humanize;
pub mod manifest;
pub mod observability;
pub mod pipeline;
pub mod queue;
pub mod report;
pub mod transport;
