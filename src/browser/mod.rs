//! Chrome/Chromium control through the DevTools protocol

pub mod config;
pub mod session;
pub mod url;

pub use config::{ConnectionOptions, DEFAULT_IDLE_TIMEOUT, LaunchOptions};
pub use session::BrowserSession;
pub use url::normalize_target;
