pub mod app;
pub mod cli;
pub mod config;
pub mod filters;
pub mod highlight;
pub mod history;
pub mod session;
pub mod store;
pub mod toggles;
pub mod tokens;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use session::{ReviewError, ReviewSession};
pub use store::{HttpItemStore, ItemSource, StoreError};
