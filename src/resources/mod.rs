//! Resource facades binding a client to an organization or repository.

mod common;
pub mod git_data;
mod organization;
mod repository;

pub use organization::Organization;
pub use repository::{Repository, RunFilter};
