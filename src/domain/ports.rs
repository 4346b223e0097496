use crate::domain::model::{NewPost, NotificationToken, Post, SessionUser, TopicGroup};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Remote store holding subreddits and posts.
#[async_trait]
pub trait DataLayer: Send + Sync {
    /// Exact, case-sensitive match on `topic`, in backend order.
    async fn find_topic_groups(&self, topic: &str) -> Result<Vec<TopicGroup>>;
    async fn create_topic_group(&self, topic: &str) -> Result<TopicGroup>;
    async fn create_post(&self, new_post: &NewPost) -> Result<Post>;
    async fn refetch_post_list(&self) -> Result<Vec<Post>>;
}

/// Toast-style status surface. A token is opened pending and resolved once.
pub trait Notifier: Send + Sync {
    fn open(&self, message: &str) -> NotificationToken;
    fn resolve_success(&self, token: NotificationToken, message: &str) -> Result<()>;
    fn resolve_failure(&self, token: NotificationToken, message: &str) -> Result<()>;
}

pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<SessionUser>;
}

pub trait ConfigProvider: Send + Sync {
    fn graphql_endpoint(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn request_timeout_seconds(&self) -> Option<u64>;
    fn call_timeout_seconds(&self) -> Option<u64>;
    fn extra_headers(&self) -> &HashMap<String, String>;
}

#[async_trait]
impl<T: DataLayer + ?Sized> DataLayer for std::sync::Arc<T> {
    async fn find_topic_groups(&self, topic: &str) -> Result<Vec<TopicGroup>> {
        (**self).find_topic_groups(topic).await
    }

    async fn create_topic_group(&self, topic: &str) -> Result<TopicGroup> {
        (**self).create_topic_group(topic).await
    }

    async fn create_post(&self, new_post: &NewPost) -> Result<Post> {
        (**self).create_post(new_post).await
    }

    async fn refetch_post_list(&self) -> Result<Vec<Post>> {
        (**self).refetch_post_list().await
    }
}

impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    fn open(&self, message: &str) -> NotificationToken {
        (**self).open(message)
    }

    fn resolve_success(&self, token: NotificationToken, message: &str) -> Result<()> {
        (**self).resolve_success(token, message)
    }

    fn resolve_failure(&self, token: NotificationToken, message: &str) -> Result<()> {
        (**self).resolve_failure(token, message)
    }
}
