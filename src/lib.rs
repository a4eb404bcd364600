pub mod app;
pub mod config;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod session;
pub mod state;
pub mod storage;
pub mod store;
pub mod ui;

pub use app::{build_app, roster_router, tables_router};
pub use config::{Config, Mode};
pub use errors::{AppError, AppResult};
