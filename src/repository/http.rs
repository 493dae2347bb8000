use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use super::{PostRepository, RepositoryError};
use crate::{config::ApiConfig, post::Post};

/// `PostRepository` backed by the REST API under `{base_url}/api`.
pub struct HttpPostRepository {
    http: reqwest::Client,
    base_url: String,
    /// Use the artificially delayed list endpoint.
    slow: bool,
}

impl HttpPostRepository {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, false)
    }

    pub fn from_config(cfg: &ApiConfig) -> Result<Self, RepositoryError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = cfg.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| RepositoryError::Transport(format!("client setup: {}", e)))?;

        Ok(Self::with_client(http, cfg.base_url.clone(), cfg.slow))
    }

    fn with_client(http: reqwest::Client, base_url: impl Into<String>, slow: bool) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            slow,
        }
    }

    fn posts_url(&self) -> String {
        format!("{}/api/posts", self.base_url)
    }

    fn list_url(&self) -> String {
        if self.slow {
            format!("{}/api/slow/posts", self.base_url)
        } else {
            self.posts_url()
        }
    }

    fn post_url(&self, id: i64) -> String {
        format!("{}/{}", self.posts_url(), id)
    }

    fn likes_url(&self, id: i64) -> String {
        format!("{}/likes", self.post_url(id))
    }

    /// Sends the request and turns anything but a 2xx into an error.
    async fn execute(&self, req: RequestBuilder, what: &str) -> Result<Response, RepositoryError> {
        let resp = req.send().await.map_err(|e| {
            error!(error = %e, "{}: request failed", what);
            RepositoryError::Transport(e.to_string())
        })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %message, "{}: server returned an error", what);
            return Err(RepositoryError::Server { status: status.as_u16(), message });
        }

        Ok(resp)
    }

    /// Reads the whole body and decodes it. An empty body is a decode error.
    async fn parse<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T, RepositoryError> {
        let bytes = resp.bytes().await.map_err(|e| {
            error!(error = %e, "{}: failed to read body", what);
            RepositoryError::Transport(e.to_string())
        })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            error!("{}: body is empty", what);
            return Err(RepositoryError::Decode("body is empty".into()));
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            error!(error = %e, "{}: malformed body", what);
            RepositoryError::Decode(e.to_string())
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T, RepositoryError> {
        let resp = self.execute(req, what).await?;
        Self::parse(resp, what).await
    }
}

#[async_trait]
impl PostRepository for HttpPostRepository {
    async fn list_all(&self) -> Result<Vec<Post>, RepositoryError> {
        self.fetch(self.http.get(self.list_url()), "list posts").await
    }

    async fn get_one(&self, id: i64) -> Result<Post, RepositoryError> {
        self.fetch(self.http.get(self.post_url(id)), "get post").await
    }

    async fn create(&self, post: &Post) -> Result<Post, RepositoryError> {
        self.fetch(self.http.post(self.posts_url()).json(post), "save post").await
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        self.execute(self.http.delete(self.post_url(id)), "delete post").await?;
        Ok(())
    }

    async fn like(&self, id: i64) -> Result<Post, RepositoryError> {
        self.fetch(self.http.post(self.likes_url(id)), "like post").await
    }

    async fn unlike(&self, id: i64) -> Result<Post, RepositoryError> {
        self.fetch(self.http.delete(self.likes_url(id)), "unlike post").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls() {
        let repo = HttpPostRepository::new("http://localhost:9999/");
        assert_eq!(repo.list_url(), "http://localhost:9999/api/posts");
        assert_eq!(repo.post_url(5), "http://localhost:9999/api/posts/5");
        assert_eq!(repo.likes_url(5), "http://localhost:9999/api/posts/5/likes");
    }

    #[test]
    fn slow_list_url() {
        let mut cfg = ApiConfig::new("http://localhost:9999");
        cfg.slow = true;
        let repo = HttpPostRepository::from_config(&cfg).unwrap();
        assert_eq!(repo.list_url(), "http://localhost:9999/api/slow/posts");
        assert_eq!(repo.posts_url(), "http://localhost:9999/api/posts");
    }
}
