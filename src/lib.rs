pub mod app;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod report;
pub mod server;
pub mod storage;
pub mod validate;
