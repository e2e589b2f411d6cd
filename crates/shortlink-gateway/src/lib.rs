//! HTTP transport for the short link service.

pub mod app;
pub mod cli;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
