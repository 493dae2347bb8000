use serde::{Deserialize, Serialize};

/// A single feed item as the server sends it.
///
/// `Post::default()` is the blank draft: id 0, every field empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Server-assigned. 0 until the post has been saved.
    pub id: i64,
    pub author: String,
    pub author_avatar: String,
    pub content: String,
    /// Publication time, formatted by the server.
    pub published: String,
    pub likes: u64,
    pub liked_by_me: bool,
}

impl Post {
    pub fn is_new(&self) -> bool {
        self.id == 0
    }

    /// True if there is nothing worth sending to the server.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self { content: content.into(), ..self.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_server_shape() {
        let json = r#"{
            "id": 7,
            "author": "Нетология",
            "authorAvatar": "netology.jpg",
            "content": "Привет!",
            "published": "21 мая в 18:36",
            "likes": 12,
            "likedByMe": true
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();

        assert_eq!(post.id, 7);
        assert_eq!(post.author_avatar, "netology.jpg");
        assert_eq!(post.likes, 12);
        assert!(post.liked_by_me);
    }

    #[test]
    fn wire_round_trip_keeps_every_field() {
        let post = Post {
            id: 42,
            author: "Alice".into(),
            author_avatar: "alice.png".into(),
            content: "hello".into(),
            published: "2024-01-01 10:00".into(),
            likes: 3,
            liked_by_me: true,
        };
        let value = serde_json::to_value(&post).unwrap();

        assert_eq!(value["authorAvatar"], "alice.png");
        assert_eq!(value["likedByMe"], true);
        assert_eq!(value["likes"], 3);
        assert_eq!(serde_json::from_value::<Post>(value).unwrap(), post);
    }

    #[test]
    fn blank_draft() {
        assert!(Post::default().is_new());
        assert!(Post::default().is_blank());
        assert!(Post::default().with_content("  \n").is_blank());
        assert!(!Post::default().with_content("x").is_blank());
    }
}
