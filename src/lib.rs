pub mod config;
pub mod discovery;
pub mod error;
pub mod link;
pub mod logging;
pub mod mocks;
pub mod protocol;
pub mod session;
pub mod status_label;
pub mod threads;
pub mod user_console_thread;
pub mod utils;
