pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod oracle;
pub mod run;
pub mod store;
