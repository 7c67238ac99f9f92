pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod server;
pub mod store;
pub mod timer;
pub mod tui;
pub mod ui;
pub mod validate;
