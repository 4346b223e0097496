use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// GraphQL `ID` values arrive as either strings or integers depending on the
/// backing connector, so both shapes are accepted and normalised to text.
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserialize_id(deserializer).map(Self)
            }
        }

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(TopicGroupId);
opaque_id!(PostId);

/// Immutable view of the form at submit time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub target_topic: String,
}

/// A subreddit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicGroup {
    pub id: TopicGroupId,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "subreddit_id")]
    pub topic_group_id: TopicGroupId,
    #[serde(rename = "username", default)]
    pub author_handle: Option<String>,
}

/// Variables of the post-creation mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub image: String,
    #[serde(rename = "subreddit_id")]
    pub topic_group_id: TopicGroupId,
    #[serde(rename = "username")]
    pub author_handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub handle: String,
}

impl SessionUser {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
        }
    }
}

/// What the surrounding page knows when a submission starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitContext {
    /// Set when the form lives on a subreddit page and the topic is implied.
    pub fixed_topic: Option<String>,
    pub author_handle: Option<String>,
}

impl SubmitContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixed_topic(mut self, topic: impl Into<String>) -> Self {
        self.fixed_topic = Some(topic.into());
        self
    }

    pub fn with_author(mut self, handle: impl Into<String>) -> Self {
        self.author_handle = Some(handle.into());
        self
    }

    pub fn from_session(session: Option<&SessionUser>, fixed_topic: Option<&str>) -> Self {
        Self {
            fixed_topic: fixed_topic.map(str::to_string),
            author_handle: session.map(|user| user.handle.clone()),
        }
    }

    /// The fixed topic, ignoring an empty value.
    pub fn fixed_topic(&self) -> Option<&str> {
        self.fixed_topic.as_deref().filter(|topic| !topic.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationToken(pub u64);

impl fmt::Display for NotificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "notification#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationState {
    Pending,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionNotification {
    pub token: NotificationToken,
    pub state: NotificationState,
    pub message: String,
    pub opened_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl SubmissionNotification {
    pub fn is_pending(&self) -> bool {
        self.state == NotificationState::Pending
    }
}
