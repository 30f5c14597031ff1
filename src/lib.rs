pub mod app;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod state;
pub mod store;

pub use error::AuthError;
pub use state::AppState;
