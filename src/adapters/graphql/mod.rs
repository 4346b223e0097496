pub mod operations;

use crate::domain::model::{NewPost, Post, TopicGroup};
use crate::domain::ports::{ConfigProvider, DataLayer};
use crate::utils::error::{PostBoxError, Result};
use async_trait::async_trait;
use operations::{
    GraphQlRequest, GraphQlResponse, InsertedPost, InsertedSubreddit, PostList,
    SubredditListByTopic, ADD_POST, ADD_SUBREDDIT, GET_ALL_POSTS, GET_SUBREDDIT_BY_TOPIC,
};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

/// Minimal GraphQL-over-HTTP client for the StepZen endpoint.
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl GraphQlClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
            headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        let mut client = Self::new(config.graphql_endpoint());
        if let Some(key) = config.api_key() {
            client = client.with_api_key(key);
        }
        if let Some(seconds) = config.request_timeout_seconds() {
            client = client.with_timeout(Duration::from_secs(seconds));
        }
        for (key, value) in config.extra_headers() {
            client = client.with_header(key, value);
        }
        client
    }

    /// Sent as `Authorization: Apikey <key>`.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn execute<T: DeserializeOwned>(
        &self,
        operation_name: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        tracing::debug!("GraphQL {} -> {}", operation_name, self.endpoint);

        let mut request = self.client.post(&self.endpoint).json(&GraphQlRequest {
            operation_name,
            query,
            variables,
        });

        if let Some(api_key) = &self.api_key {
            request = request.header(AUTHORIZATION, format!("Apikey {}", api_key));
        }

        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("GraphQL {} response status: {}", operation_name, status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PostBoxError::HttpStatusError {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let envelope: GraphQlResponse<T> = serde_json::from_slice(&bytes)?;

        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            return Err(PostBoxError::GraphQlError {
                messages: errors.into_iter().map(|error| error.message).collect(),
            });
        }

        envelope.data.ok_or_else(|| PostBoxError::MissingFieldError {
            field: "data".to_string(),
        })
    }
}

#[async_trait]
impl DataLayer for GraphQlClient {
    async fn find_topic_groups(&self, topic: &str) -> Result<Vec<TopicGroup>> {
        let data: SubredditListByTopic = self
            .execute(
                "GetSubredditListByTopic",
                GET_SUBREDDIT_BY_TOPIC,
                serde_json::json!({ "topic": topic }),
            )
            .await?;

        // StepZen answers `null` rather than `[]` when nothing matches.
        Ok(data.get_subreddit_list_by_topic.unwrap_or_default())
    }

    async fn create_topic_group(&self, topic: &str) -> Result<TopicGroup> {
        let data: InsertedSubreddit = self
            .execute(
                "InsertSubredditByTopic",
                ADD_SUBREDDIT,
                serde_json::json!({ "topic": topic }),
            )
            .await?;

        data.insert_subreddit_by_topic
            .ok_or_else(|| PostBoxError::MissingFieldError {
                field: "insertSubredditByTopic".to_string(),
            })
    }

    async fn create_post(&self, new_post: &NewPost) -> Result<Post> {
        let data: InsertedPost = self
            .execute("InsertPost", ADD_POST, serde_json::to_value(new_post)?)
            .await?;

        data.insert_post.ok_or_else(|| PostBoxError::MissingFieldError {
            field: "insertPost".to_string(),
        })
    }

    async fn refetch_post_list(&self) -> Result<Vec<Post>> {
        let data: PostList = self
            .execute("GetPostList", GET_ALL_POSTS, serde_json::json!({}))
            .await?;

        Ok(data.get_post_list.unwrap_or_default())
    }
}
