mod controller;
mod state;

pub use controller::FeedController;
pub use state::{Failure, FeedState};
