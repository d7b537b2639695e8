// Library interface for rust_manga_reader
// Session, routing and API gateway core shared by the reading site and the dashboards

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod follow;
pub mod gateway;
pub mod guard;
pub mod helpers;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod policy;
pub mod reader;
pub mod routes;
pub mod search_log;
pub mod session;
pub mod storage;
pub mod theme;

pub use app::{Navigation, Portal};
pub use error::{ApiError, ErrorKind};
