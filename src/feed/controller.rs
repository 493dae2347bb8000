use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::debug;

use super::state::{Failure, FeedState};
use crate::{
    post::Post,
    repository::{PostRepository, RepositoryError},
};

/// Everything observers can see. Request tasks only keep a weak handle to it.
struct FeedStore {
    state: watch::Sender<FeedState>,
    draft: watch::Sender<Post>,
    created: Mutex<Option<mpsc::UnboundedSender<Post>>>,
}

impl FeedStore {
    /// Replaces the current state with one derived from it, in one publish.
    fn publish(&self, next: impl FnOnce(&FeedState) -> FeedState) {
        self.state.send_modify(|state| *state = next(state));
    }

    fn fail(&self, what: &str, err: &RepositoryError, failure: Failure) {
        debug!(error = %err, ?failure, "{} failed", what);
        self.publish(|state| state.failed(failure));
    }

    fn notify_created(&self, post: Post) {
        let created = self.created.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = created.as_ref() {
            // Observer may have gone away; nothing to deliver then.
            let _ = tx.send(post);
        }
    }
}

/// Feed screen logic: turns repository results into `FeedState` updates.
///
/// List operations start a request on the tokio runtime and return its
/// handle. State only changes once the server has answered.
pub struct FeedController<R> {
    repository: Arc<R>,
    store: Arc<FeedStore>,
}

impl<R: PostRepository> FeedController<R> {
    pub fn new(repository: R) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        let (draft, _) = watch::channel(Post::default());

        Self {
            repository: Arc::new(repository),
            store: Arc::new(FeedStore { state, draft, created: Mutex::new(None) }),
        }
    }

    pub fn state(&self) -> FeedState {
        self.store.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<FeedState> {
        self.store.state.subscribe()
    }

    pub fn draft(&self) -> Post {
        self.store.draft.borrow().clone()
    }

    pub fn subscribe_draft(&self) -> watch::Receiver<Post> {
        self.store.draft.subscribe()
    }

    /// Receiver for "post created" events.
    ///
    /// Only the latest receiver is served: calling this again disconnects
    /// the previous one. Events emitted before the call are not replayed.
    pub fn created_events(&self) -> mpsc::UnboundedReceiver<Post> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.store.created.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        rx
    }

    /// Runs `request` in the background and hands its result to `apply`,
    /// unless the controller has been dropped in the meantime.
    fn spawn<T, Fut, A>(&self, what: &'static str, request: Fut, apply: A) -> JoinHandle<()>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, RepositoryError>> + Send + 'static,
        A: FnOnce(&FeedStore, Result<T, RepositoryError>) + Send + 'static,
    {
        let store = Arc::downgrade(&self.store);
        tokio::spawn(async move {
            let result = request.await;
            match store.upgrade() {
                Some(store) => apply(&store, result),
                None => debug!("{}: controller dropped, discarding result", what),
            }
        })
    }

    /// Refreshes the whole feed.
    ///
    /// A 5xx answer raises `network_error`; any other failure raises `error`.
    pub fn load(&self) -> JoinHandle<()> {
        self.store.publish(FeedState::started_loading);

        let repository = self.repository.clone();
        self.spawn("load", async move { repository.list_all().await }, |store, result| match result {
            Ok(posts) => {
                debug!(count = posts.len(), "feed loaded");
                store.publish(|_| FeedState::with_posts(posts));
            }
            Err(err) => {
                let failure = if err.is_server_failure() { Failure::Network } else { Failure::Generic };
                store.fail("load", &err, failure);
            }
        })
    }

    /// Shows only the post with `id`.
    pub fn load_one(&self, id: i64) -> JoinHandle<()> {
        let repository = self.repository.clone();
        self.spawn("load one", async move { repository.get_one(id).await }, |store, result| match result {
            Ok(post) => store.publish(|_| FeedState::with_posts(vec![post])),
            Err(err) => store.fail("load one", &err, Failure::Generic),
        })
    }

    pub fn begin_edit(&self, post: Post) {
        self.store.draft.send_replace(post);
    }

    /// Sets the draft text (trimmed). Returns false, and notifies nobody,
    /// when the text is unchanged.
    pub fn update_draft_content(&self, text: &str) -> bool {
        let text = text.trim();
        self.store.draft.send_if_modified(|draft| {
            if draft.content == text {
                return false;
            }
            *draft = draft.with_content(text);
            true
        })
    }

    /// Sends the draft to the server. `None` if there is nothing to send.
    pub fn submit_draft(&self) -> Option<JoinHandle<()>> {
        let draft = self.draft();
        if draft.is_blank() {
            debug!("draft is blank, not saving");
            return None;
        }

        let repository = self.repository.clone();
        Some(self.spawn("save", async move { repository.create(&draft).await }, |store, result| match result {
            Ok(saved) => {
                debug!(id = saved.id, "post saved");
                store.publish(|state| state.appended(saved.clone()));
                store.draft.send_replace(Post::default());
                store.notify_created(saved);
            }
            Err(err) => store.fail("save", &err, Failure::Generic),
        }))
    }

    /// Likes the post, or takes the like back if it is already liked.
    /// `None` if the post is not in the feed.
    pub fn toggle_like(&self, id: i64) -> Option<JoinHandle<()>> {
        let liked_by_me = match self.store.state.borrow().find(id) {
            Some(post) => post.liked_by_me,
            None => {
                debug!(id, "like: no such post in feed");
                return None;
            }
        };

        let repository = self.repository.clone();
        let request = async move { repository.set_liked(id, !liked_by_me).await };
        Some(self.spawn("like", request, |store, result| match result {
            Ok(post) => store.publish(|state| state.replaced(post)),
            Err(err) => store.fail("like", &err, Failure::Generic),
        }))
    }

    pub fn remove(&self, id: i64) -> JoinHandle<()> {
        let repository = self.repository.clone();
        self.spawn("remove", async move { repository.delete(id).await }, move |store, result| match result {
            Ok(()) => store.publish(|state| state.removed(id)),
            Err(err) => store.fail("remove", &err, Failure::Generic),
        })
    }
}
