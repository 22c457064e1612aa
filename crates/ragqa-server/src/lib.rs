//! ragqa server: HTTP surface over ingestion and question answering.

pub mod error;
pub mod indexing;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
