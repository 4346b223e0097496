//! Query documents and response envelopes for the StepZen schema.

use crate::domain::model::{Post, TopicGroup};
use serde::{Deserialize, Serialize};

pub const GET_SUBREDDIT_BY_TOPIC: &str = r#"
query GetSubredditListByTopic($topic: String!) {
  getSubredditListByTopic(topic: $topic) {
    id
    topic
    created_at
  }
}
"#;

pub const ADD_SUBREDDIT: &str = r#"
mutation InsertSubredditByTopic($topic: String!) {
  insertSubredditByTopic(topic: $topic) {
    id
    topic
    created_at
  }
}
"#;

pub const ADD_POST: &str = r#"
mutation InsertPost(
  $body: String!
  $image: String!
  $subreddit_id: ID!
  $title: String!
  $username: String
) {
  insertPost(
    body: $body
    image: $image
    subreddit_id: $subreddit_id
    title: $title
    username: $username
  ) {
    id
    body
    created_at
    image
    subreddit_id
    title
    username
  }
}
"#;

pub const GET_ALL_POSTS: &str = r#"
query GetPostList {
  getPostList {
    id
    body
    created_at
    image
    subreddit_id
    title
    username
  }
}
"#;

#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
    #[serde(rename = "operationName")]
    pub operation_name: &'a str,
    pub query: &'a str,
    pub variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlErrorMessage>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlErrorMessage {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubredditListByTopic {
    pub get_subreddit_list_by_topic: Option<Vec<TopicGroup>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedSubreddit {
    pub insert_subreddit_by_topic: Option<TopicGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedPost {
    pub insert_post: Option<Post>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostList {
    pub get_post_list: Option<Vec<Post>>,
}
