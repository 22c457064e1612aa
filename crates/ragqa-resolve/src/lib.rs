//! ragqa resolve: retrieval of the fragments nearest to a question.

pub mod retrieve;
pub mod types;

pub use retrieve::Retriever;
pub use types::*;
