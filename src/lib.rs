pub mod case;
pub mod config;
pub mod engine;
pub mod errors;
pub mod orchestrator;
pub mod reconcile;
pub mod relay;
pub mod request;
pub mod store;
pub mod ui;
pub mod util;
pub mod validate;
