use std::collections::HashSet;

use tracing::warn;

use crate::post::Post;

/// Which flag a failed operation raises.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Failure {
    /// The server itself is in trouble (5xx).
    Network,
    Generic,
}

/// Snapshot of everything the feed screen shows.
///
/// Values are never edited in place; every transition builds a new one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedState {
    posts: Vec<Post>,
    pub loading: bool,
    pub error: bool,
    pub network_error: bool,
}

impl FeedState {
    /// Feed holding `posts`, all flags cleared. Repeated ids keep the first one.
    pub fn with_posts(posts: Vec<Post>) -> Self {
        let mut seen = HashSet::with_capacity(posts.len());
        let total = posts.len();
        let posts: Vec<Post> = posts.into_iter().filter(|p| seen.insert(p.id)).collect();
        if posts.len() != total {
            warn!(dropped = total - posts.len(), "feed contained duplicate post ids");
        }

        Self { posts, ..Self::default() }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn find(&self, id: i64) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn started_loading(&self) -> Self {
        Self { posts: self.posts.clone(), loading: true, ..Self::default() }
    }

    /// Same posts, loading cleared, exactly one error flag raised.
    pub fn failed(&self, failure: Failure) -> Self {
        Self {
            posts: self.posts.clone(),
            loading: false,
            error: failure == Failure::Generic,
            network_error: failure == Failure::Network,
        }
    }

    /// Appends `post`. An older element with the same id is dropped first.
    pub fn appended(&self, post: Post) -> Self {
        let mut posts: Vec<Post> = self.posts.iter().filter(|p| p.id != post.id).cloned().collect();
        posts.push(post);
        Self { posts, ..Self::default() }
    }

    /// Swaps the element with `post.id` for `post`, leaving the rest in place.
    pub fn replaced(&self, post: Post) -> Self {
        let posts = self
            .posts
            .iter()
            .map(|p| if p.id == post.id { post.clone() } else { p.clone() })
            .collect();
        Self { posts, ..Self::default() }
    }

    pub fn removed(&self, id: i64) -> Self {
        let posts = self.posts.iter().filter(|p| p.id != id).cloned().collect();
        Self { posts, ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: i64, content: &str) -> Post {
        Post { id, content: content.into(), ..Post::default() }
    }

    fn ids(state: &FeedState) -> Vec<i64> {
        state.posts().iter().map(|p| p.id).collect()
    }

    #[test]
    fn empty_follows_posts() {
        assert!(FeedState::default().empty());
        assert!(FeedState::with_posts(vec![]).empty());
        assert!(!FeedState::with_posts(vec![post(1, "a")]).empty());
        assert!(FeedState::with_posts(vec![post(1, "a")]).removed(1).empty());
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let state = FeedState::with_posts(vec![post(3, "first"), post(1, "x"), post(3, "second")]);
        assert_eq!(ids(&state), vec![3, 1]);
        assert_eq!(state.find(3).unwrap().content, "first");
    }

    #[test]
    fn failure_raises_one_flag_and_keeps_posts() {
        let state = FeedState::with_posts(vec![post(1, "a")]).started_loading();
        assert!(state.loading);

        let network = state.failed(Failure::Network);
        assert!(network.network_error && !network.error && !network.loading);
        assert_eq!(ids(&network), vec![1]);

        let generic = state.failed(Failure::Generic);
        assert!(generic.error && !generic.network_error && !generic.loading);
    }

    #[test]
    fn started_loading_clears_errors() {
        let state = FeedState::default().failed(Failure::Network).started_loading();
        assert!(state.loading && !state.error && !state.network_error);
    }

    #[test]
    fn replace_keeps_order() {
        let state = FeedState::with_posts(vec![post(3, "c"), post(2, "b"), post(1, "a")]);
        let next = state.replaced(post(2, "B"));
        assert_eq!(ids(&next), vec![3, 2, 1]);
        assert_eq!(next.find(2).unwrap().content, "B");
        assert_eq!(next.find(3), state.find(3));
    }

    #[test]
    fn replace_unknown_id_changes_nothing() {
        let state = FeedState::with_posts(vec![post(1, "a")]);
        assert_eq!(state.replaced(post(9, "z")).posts(), state.posts());
    }

    #[test]
    fn append_keeps_ids_unique() {
        let state = FeedState::with_posts(vec![post(1, "a"), post(2, "b")]).failed(Failure::Generic);
        let next = state.appended(post(3, "c"));
        assert_eq!(ids(&next), vec![1, 2, 3]);
        assert!(!next.error);

        let again = next.appended(post(1, "edited"));
        assert_eq!(ids(&again), vec![2, 3, 1]);
        assert_eq!(again.find(1).unwrap().content, "edited");
    }

    #[test]
    fn remove_is_idempotent() {
        let state = FeedState::with_posts(vec![post(1, "a"), post(2, "b")]);
        let once = state.removed(1);
        assert_eq!(ids(&once), vec![2]);
        assert_eq!(once.removed(1), once);
    }
}
