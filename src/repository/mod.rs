mod base;
pub mod http;

pub use base::{PostRepository, RepositoryError};
pub use http::HttpPostRepository;
