use crate::domain::model::{PostDraft, SessionUser};
use crate::utils::validation::checked_http_url;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Title,
    Body,
    ImageUrl,
    Topic,
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "title" | "postTitle" => Ok(Self::Title),
            "body" | "postBody" => Ok(Self::Body),
            "image" | "imageUrl" | "postImage" => Ok(Self::ImageUrl),
            "topic" | "subreddit" => Ok(Self::Topic),
            other => Err(format!("unknown form field: {}", other)),
        }
    }
}

/// Violated input constraints. Empty means the form may be submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub missing_title: bool,
    pub missing_topic: bool,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        !self.missing_title && !self.missing_topic
    }

    /// Per-field messages in display order.
    pub fn messages(&self) -> Vec<&'static str> {
        let mut messages = Vec::new();
        if self.missing_title {
            messages.push("A post title is required");
        }
        if self.missing_topic {
            messages.push("A Subreddit is required");
        }
        messages
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join(", "))
    }
}

/// Which inputs the rendering layer should show, derived from current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormLayout {
    pub title_enabled: bool,
    pub title_placeholder: String,
    pub image_panel_open: bool,
    pub show_body: bool,
    pub show_topic: bool,
    pub show_image: bool,
    pub show_submit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    title: String,
    body: String,
    image_url: String,
    topic: String,
    image_panel_open: bool,
}

/// Form shared between the rendering layer and the orchestrator. The lock is
/// only held for synchronous reads and writes, never across an await.
pub type SharedForm = Arc<Mutex<FormState>>;

pub fn shared(form: FormState) -> SharedForm {
    Arc::new(Mutex::new(form))
}

/// Locks a shared form, recovering the data if a previous holder panicked.
pub fn lock(form: &SharedForm) -> MutexGuard<'_, FormState> {
    form.lock().unwrap_or_else(PoisonError::into_inner)
}

// Whitespace is content: only a truly empty field is missing.
fn is_blank(value: &str) -> bool {
    value.is_empty()
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Title => self.title = value,
            FormField::Body => self.body = value,
            FormField::ImageUrl => self.image_url = value,
            FormField::Topic => self.topic = value,
        }
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::Body => &self.body,
            FormField::ImageUrl => &self.image_url,
            FormField::Topic => &self.topic,
        }
    }

    pub fn toggle_image_panel(&mut self) {
        self.image_panel_open = !self.image_panel_open;
    }

    pub fn image_panel_open(&self) -> bool {
        self.image_panel_open
    }

    pub fn validate(&self, fixed_topic: Option<&str>) -> ValidationErrors {
        validate_draft(&self.snapshot(), fixed_topic)
    }

    pub fn snapshot(&self) -> PostDraft {
        PostDraft {
            title: self.title.clone(),
            body: Some(self.body.clone()).filter(|body| !body.is_empty()),
            image_url: checked_http_url(&self.image_url).map(str::to_string),
            target_topic: self.topic.clone(),
        }
    }

    /// Clears every field and closes the image panel.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn layout(&self, session: Option<&SessionUser>, fixed_topic: Option<&str>) -> FormLayout {
        let fixed_topic = fixed_topic.filter(|topic| !is_blank(topic));
        let title_placeholder = match (session, fixed_topic) {
            (None, _) => "Sign in to Post".to_string(),
            (Some(_), Some(topic)) => format!("Create a Post in Subreddit /r{}", topic),
            (Some(_), None) => "Create a post by entering a title!".to_string(),
        };
        let has_title = !self.title.is_empty();

        FormLayout {
            title_enabled: session.is_some(),
            title_placeholder,
            image_panel_open: self.image_panel_open,
            show_body: has_title,
            show_topic: has_title && fixed_topic.is_none(),
            show_image: has_title && self.image_panel_open,
            show_submit: has_title && session.is_some(),
        }
    }
}

/// `missing_topic` only applies when the page does not supply a topic.
pub fn validate_draft(draft: &PostDraft, fixed_topic: Option<&str>) -> ValidationErrors {
    let has_fixed_topic = fixed_topic.is_some_and(|topic| !is_blank(topic));
    ValidationErrors {
        missing_title: is_blank(&draft.title),
        missing_topic: !has_fixed_topic && is_blank(&draft.target_topic),
    }
}
