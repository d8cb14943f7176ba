//! GitHub API client

pub mod client;
pub mod errors;
pub mod traits;
pub mod types;

pub use client::GhClient;
pub use errors::GhError;
pub use traits::{Page, ReleaseHost};
pub use types::*;
