pub mod app;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod i18n;
pub mod state;
pub mod users;
