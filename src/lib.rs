//! Post feed client: a REST repository for posts and the controller that
//! turns its results into observable feed state.

pub mod config;
pub mod feed;
pub mod post;
pub mod repository;

pub use feed::{FeedController, FeedState};
pub use post::Post;
pub use repository::{HttpPostRepository, PostRepository, RepositoryError};
