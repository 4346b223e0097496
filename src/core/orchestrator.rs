use crate::core::form::{self, validate_draft, SharedForm, ValidationErrors};
use crate::domain::model::{
    NewPost, NotificationToken, Post, PostDraft, SubmitContext, TopicGroupId,
};
use crate::domain::ports::{DataLayer, Notifier};
use crate::utils::error::{PostBoxError, Result};
use crate::utils::validation::checked_http_url;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PENDING_MESSAGE: &str = "Creating new post...";
pub const DEFAULT_SUCCESS_MESSAGE: &str = "New post Created";
pub const DEFAULT_FAILURE_MESSAGE: &str = "Oops! Something went wrong...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessages {
    pub pending: String,
    pub success: String,
    pub failure: String,
}

impl Default for NotificationMessages {
    fn default() -> Self {
        Self {
            pending: DEFAULT_PENDING_MESSAGE.to_string(),
            success: DEFAULT_SUCCESS_MESSAGE.to_string(),
            failure: DEFAULT_FAILURE_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Upper bound for each remote call. `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
    pub messages: NotificationMessages,
}

/// Where the current attempt is. `Idle` between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    Idle,
    Validating,
    Rejected,
    LookingUp,
    CreatingTopic,
    CreatingPost,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitErrorKind {
    Lookup,
    TopicCreation,
    PostCreation,
}

/// Remote failure of one attempt, tagged with the step that failed.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Subreddit lookup failed: {0}")]
    Lookup(#[source] PostBoxError),

    #[error("Subreddit creation failed: {0}")]
    TopicCreation(#[source] PostBoxError),

    #[error("Post creation failed: {0}")]
    PostCreation(#[source] PostBoxError),
}

impl SubmitError {
    pub fn kind(&self) -> SubmitErrorKind {
        match self {
            Self::Lookup(_) => SubmitErrorKind::Lookup,
            Self::TopicCreation(_) => SubmitErrorKind::TopicCreation,
            Self::PostCreation(_) => SubmitErrorKind::PostCreation,
        }
    }

    pub fn is_timeout(&self) -> bool {
        let source = match self {
            Self::Lookup(e) | Self::TopicCreation(e) | Self::PostCreation(e) => e,
        };
        matches!(source, PostBoxError::TimeoutError { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub post: Post,
    pub topic_group_id: TopicGroupId,
    /// True when the subreddit did not exist and was created by this attempt.
    pub created_topic: bool,
    pub notification: NotificationToken,
}

#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Local validation failed; nothing was sent.
    Rejected(ValidationErrors),
    Succeeded(SubmissionReceipt),
    Failed {
        error: SubmitError,
        notification: NotificationToken,
    },
    /// Another attempt from this form was still in flight; ignored.
    Busy,
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn terminal_phase(&self) -> AttemptPhase {
        match self {
            Self::Rejected(_) => AttemptPhase::Rejected,
            Self::Succeeded(_) => AttemptPhase::Succeeded,
            Self::Failed { .. } => AttemptPhase::Failed,
            Self::Busy => AttemptPhase::Idle,
        }
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the pending notification of one attempt. If the attempt future is
/// dropped before resolving, the notification is failed on drop so it never
/// stays pending.
struct PendingNotification<'a, N: Notifier> {
    notifier: &'a N,
    token: NotificationToken,
    failure_message: &'a str,
    resolved: bool,
}

impl<'a, N: Notifier> PendingNotification<'a, N> {
    fn open(notifier: &'a N, messages: &'a NotificationMessages) -> Self {
        let token = notifier.open(&messages.pending);
        Self {
            notifier,
            token,
            failure_message: &messages.failure,
            resolved: false,
        }
    }

    fn succeed(mut self, message: &str) -> NotificationToken {
        self.resolved = true;
        if let Err(e) = self.notifier.resolve_success(self.token, message) {
            tracing::error!("Could not resolve {} as success: {}", self.token, e);
        }
        self.token
    }

    fn fail(mut self) -> NotificationToken {
        self.resolved = true;
        if let Err(e) = self.notifier.resolve_failure(self.token, self.failure_message) {
            tracing::error!("Could not resolve {} as failure: {}", self.token, e);
        }
        self.token
    }
}

impl<N: Notifier> Drop for PendingNotification<'_, N> {
    fn drop(&mut self) {
        if !self.resolved {
            tracing::warn!("Submission abandoned while in flight, failing {}", self.token);
            if let Err(e) = self.notifier.resolve_failure(self.token, self.failure_message) {
                tracing::error!("Could not resolve {} as failure: {}", self.token, e);
            }
        }
    }
}

struct CreatedPost {
    post: Post,
    topic_group_id: TopicGroupId,
    created_topic: bool,
}

/// Runs the lookup → (create subreddit) → create post sequence for one form.
pub struct SubmissionOrchestrator<D: DataLayer, N: Notifier> {
    data_layer: D,
    notifier: N,
    form: SharedForm,
    options: SubmitOptions,
    in_flight: AtomicBool,
    phase: Mutex<AttemptPhase>,
}

impl<D, N> SubmissionOrchestrator<D, N>
where
    D: DataLayer + Clone + 'static,
    N: Notifier,
{
    pub fn new(data_layer: D, notifier: N, form: SharedForm) -> Self {
        Self::with_options(data_layer, notifier, form, SubmitOptions::default())
    }

    pub fn with_options(data_layer: D, notifier: N, form: SharedForm, options: SubmitOptions) -> Self {
        Self {
            data_layer,
            notifier,
            form,
            options,
            in_flight: AtomicBool::new(false),
            phase: Mutex::new(AttemptPhase::Idle),
        }
    }

    pub fn form(&self) -> &SharedForm {
        &self.form
    }

    pub fn phase(&self) -> AttemptPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Snapshots the attached form and submits it.
    pub async fn submit_form(&self, context: &SubmitContext) -> SubmissionOutcome {
        let draft = form::lock(&self.form).snapshot();
        self.submit(draft, context).await
    }

    pub async fn submit(&self, draft: PostDraft, context: &SubmitContext) -> SubmissionOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::warn!("Submission ignored: another submission is still in flight");
            return SubmissionOutcome::Busy;
        };

        let outcome = self.run_attempt(draft, context).await;
        self.set_phase(AttemptPhase::Idle);
        outcome
    }

    async fn run_attempt(&self, draft: PostDraft, context: &SubmitContext) -> SubmissionOutcome {
        self.set_phase(AttemptPhase::Validating);
        let errors = validate_draft(&draft, context.fixed_topic());
        if !errors.is_empty() {
            tracing::info!("Submission rejected: {}", errors);
            self.set_phase(AttemptPhase::Rejected);
            return SubmissionOutcome::Rejected(errors);
        }

        let notification = PendingNotification::open(&self.notifier, &self.options.messages);

        match self.create_post(&draft, context).await {
            Ok(created) => {
                form::lock(&self.form).reset();
                self.spawn_post_list_refresh();
                self.set_phase(AttemptPhase::Succeeded);
                tracing::info!(
                    "✅ Post {} created in subreddit {}",
                    created.post.id,
                    created.topic_group_id
                );
                let token = notification.succeed(&self.options.messages.success);
                SubmissionOutcome::Succeeded(SubmissionReceipt {
                    post: created.post,
                    topic_group_id: created.topic_group_id,
                    created_topic: created.created_topic,
                    notification: token,
                })
            }
            Err(error) => {
                tracing::error!(kind = ?error.kind(), "❌ Submission failed: {}", error);
                self.set_phase(AttemptPhase::Failed);
                let token = notification.fail();
                SubmissionOutcome::Failed {
                    error,
                    notification: token,
                }
            }
        }
    }

    async fn create_post(
        &self,
        draft: &PostDraft,
        context: &SubmitContext,
    ) -> std::result::Result<CreatedPost, SubmitError> {
        let topic = context.fixed_topic().unwrap_or(&draft.target_topic);

        self.set_phase(AttemptPhase::LookingUp);
        tracing::debug!("Looking up subreddit '{}'", topic);
        let existing = self
            .bounded("subreddit lookup", self.data_layer.find_topic_groups(topic))
            .await
            .map_err(SubmitError::Lookup)?;

        // First match wins when the backend holds duplicates.
        let (topic_group_id, created_topic) = match existing.into_iter().next() {
            Some(group) => {
                if group.id.is_empty() {
                    return Err(SubmitError::Lookup(missing_id("getSubredditListByTopic")));
                }
                tracing::debug!("Using existing subreddit {} for '{}'", group.id, topic);
                (group.id, false)
            }
            None => {
                self.set_phase(AttemptPhase::CreatingTopic);
                tracing::info!("Subreddit '{}' is new, creating it", topic);
                let group = self
                    .bounded("subreddit creation", self.data_layer.create_topic_group(topic))
                    .await
                    .map_err(SubmitError::TopicCreation)?;
                if group.id.is_empty() {
                    return Err(SubmitError::TopicCreation(missing_id(
                        "insertSubredditByTopic",
                    )));
                }
                (group.id, true)
            }
        };

        self.set_phase(AttemptPhase::CreatingPost);
        let new_post = NewPost {
            title: draft.title.clone(),
            body: draft.body.clone().unwrap_or_default(),
            image: draft
                .image_url
                .as_deref()
                .and_then(checked_http_url)
                .unwrap_or_default()
                .to_string(),
            topic_group_id: topic_group_id.clone(),
            author_handle: context.author_handle.clone(),
        };
        tracing::debug!("Creating post '{}' in subreddit {}", new_post.title, topic_group_id);
        let post = self
            .bounded("post creation", self.data_layer.create_post(&new_post))
            .await
            .map_err(SubmitError::PostCreation)?;
        if post.id.is_empty() {
            return Err(SubmitError::PostCreation(missing_id("insertPost")));
        }

        Ok(CreatedPost {
            post,
            topic_group_id,
            created_topic,
        })
    }

    /// Fire-and-forget: the post already exists, so a slow or failed refresh
    /// only leaves the list stale and never touches the attempt's outcome.
    fn spawn_post_list_refresh(&self) {
        let data_layer = self.data_layer.clone();
        let call_timeout = self.options.call_timeout;
        tokio::spawn(async move {
            match bounded(call_timeout, "post list refresh", data_layer.refetch_post_list()).await {
                Ok(posts) => tracing::debug!("Post list refreshed ({} posts)", posts.len()),
                Err(e) => tracing::warn!("Post list refresh failed: {}", e),
            }
        });
    }

    async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        bounded(self.options.call_timeout, operation, call).await
    }

    fn set_phase(&self, phase: AttemptPhase) {
        let mut current = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != phase {
            tracing::trace!("Attempt phase {:?} -> {:?}", *current, phase);
            *current = phase;
        }
    }
}

async fn bounded<T, F>(limit: Option<Duration>, operation: &str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
            PostBoxError::TimeoutError {
                operation: operation.to_string(),
                after: limit,
            }
        })?,
        None => call.await,
    }
}

fn missing_id(operation: &str) -> PostBoxError {
    PostBoxError::MissingFieldError {
        field: format!("{}.id", operation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::notifier::NotificationCenter;
    use crate::core::form::{shared, FormField, FormState};
    use crate::domain::model::{NotificationState, PostId, TopicGroup};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Lookup(String),
        CreateTopic(String),
        CreatePost(NewPost),
        Refetch,
    }

    #[derive(Default)]
    struct MockDataLayer {
        calls: Mutex<Vec<Call>>,
        existing: Vec<TopicGroup>,
        fail_lookup: bool,
        fail_topic: bool,
        topic_without_id: bool,
        fail_post: bool,
        fail_refetch: bool,
        lookup_gate: Option<Arc<Notify>>,
        lookup_delay: Option<Duration>,
        refetch_gate: Option<Arc<Notify>>,
        refetched: Notify,
    }

    impl MockDataLayer {
        fn with_existing(groups: Vec<TopicGroup>) -> Self {
            Self {
                existing: groups,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        /// Waits for the background post list refresh to finish.
        async fn wait_for_refetch(&self) {
            tokio::time::timeout(Duration::from_secs(1), self.refetched.notified())
                .await
                .expect("post list refresh never ran");
        }
    }

    fn backend_error() -> PostBoxError {
        PostBoxError::GraphQlError {
            messages: vec!["boom".to_string()],
        }
    }

    #[async_trait]
    impl DataLayer for MockDataLayer {
        async fn find_topic_groups(&self, topic: &str) -> Result<Vec<TopicGroup>> {
            self.record(Call::Lookup(topic.to_string()));
            if let Some(gate) = &self.lookup_gate {
                gate.notified().await;
            }
            if let Some(delay) = self.lookup_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_lookup {
                return Err(backend_error());
            }
            Ok(self
                .existing
                .iter()
                .filter(|group| group.topic == topic)
                .cloned()
                .collect())
        }

        async fn create_topic_group(&self, topic: &str) -> Result<TopicGroup> {
            self.record(Call::CreateTopic(topic.to_string()));
            if self.fail_topic {
                return Err(backend_error());
            }
            let id = if self.topic_without_id { "" } else { "t1" };
            Ok(TopicGroup {
                id: TopicGroupId::new(id),
                topic: topic.to_string(),
            })
        }

        async fn create_post(&self, new_post: &NewPost) -> Result<Post> {
            self.record(Call::CreatePost(new_post.clone()));
            if self.fail_post {
                return Err(backend_error());
            }
            Ok(Post {
                id: PostId::new("p1"),
                title: new_post.title.clone(),
                body: Some(new_post.body.clone()),
                image: Some(new_post.image.clone()),
                topic_group_id: new_post.topic_group_id.clone(),
                author_handle: new_post.author_handle.clone(),
            })
        }

        async fn refetch_post_list(&self) -> Result<Vec<Post>> {
            self.record(Call::Refetch);
            if let Some(gate) = &self.refetch_gate {
                gate.notified().await;
            }
            self.refetched.notify_one();
            if self.fail_refetch {
                return Err(backend_error());
            }
            Ok(vec![])
        }
    }

    fn filled_form(title: &str, topic: &str) -> SharedForm {
        let mut form = FormState::new();
        form.set_field(FormField::Title, title);
        form.set_field(FormField::Topic, topic);
        shared(form)
    }

    fn orchestrator(
        data_layer: MockDataLayer,
        form: SharedForm,
    ) -> (
        SubmissionOrchestrator<Arc<MockDataLayer>, Arc<NotificationCenter>>,
        Arc<MockDataLayer>,
        Arc<NotificationCenter>,
    ) {
        let data_layer = Arc::new(data_layer);
        let notifier = Arc::new(NotificationCenter::new());
        let orchestrator =
            SubmissionOrchestrator::new(data_layer.clone(), notifier.clone(), form);
        (orchestrator, data_layer, notifier)
    }

    fn context() -> SubmitContext {
        SubmitContext::new().with_author("alice")
    }

    #[tokio::test]
    async fn test_new_topic_creates_subreddit_then_post() {
        let form = filled_form("Hello", "reactjs");
        let (orchestrator, data_layer, notifier) = orchestrator(MockDataLayer::default(), form.clone());

        let outcome = orchestrator.submit_form(&context()).await;

        let SubmissionOutcome::Succeeded(receipt) = outcome else {
            panic!("expected success, got {:?}", outcome);
        };
        assert!(receipt.created_topic);
        assert_eq!(receipt.topic_group_id, TopicGroupId::new("t1"));
        assert_eq!(receipt.post.id, PostId::new("p1"));

        data_layer.wait_for_refetch().await;
        let calls = data_layer.calls();
        assert_eq!(calls[0], Call::Lookup("reactjs".to_string()));
        assert_eq!(calls[1], Call::CreateTopic("reactjs".to_string()));
        assert_eq!(
            calls[2],
            Call::CreatePost(NewPost {
                title: "Hello".to_string(),
                body: String::new(),
                image: String::new(),
                topic_group_id: TopicGroupId::new("t1"),
                author_handle: Some("alice".to_string()),
            })
        );
        assert_eq!(calls[3], Call::Refetch);
        assert_eq!(calls.len(), 4);

        let notification = notifier.get(receipt.notification).unwrap();
        assert_eq!(notification.state, NotificationState::Success);
        assert_eq!(notification.message, DEFAULT_SUCCESS_MESSAGE);
        assert!(form::lock(&form).is_empty());
        assert_eq!(orchestrator.phase(), AttemptPhase::Idle);
    }

    #[tokio::test]
    async fn test_existing_topic_skips_creation() {
        let data_layer = MockDataLayer::with_existing(vec![TopicGroup {
            id: TopicGroupId::new("t9"),
            topic: "reactjs".to_string(),
        }]);
        let (orchestrator, data_layer, _) = orchestrator(data_layer, filled_form("Hello", "reactjs"));

        let outcome = orchestrator.submit_form(&context()).await;

        assert!(outcome.is_success());
        let calls = data_layer.calls();
        assert!(!calls.iter().any(|call| matches!(call, Call::CreateTopic(_))));
        let Call::CreatePost(new_post) = &calls[1] else {
            panic!("expected post creation second, got {:?}", calls);
        };
        assert_eq!(new_post.topic_group_id, TopicGroupId::new("t9"));
    }

    #[tokio::test]
    async fn test_first_of_duplicate_topics_wins() {
        let data_layer = MockDataLayer::with_existing(vec![
            TopicGroup {
                id: TopicGroupId::new("t3"),
                topic: "rust".to_string(),
            },
            TopicGroup {
                id: TopicGroupId::new("t4"),
                topic: "rust".to_string(),
            },
        ]);
        let (orchestrator, _, _) = orchestrator(data_layer, filled_form("Hello", "rust"));

        let SubmissionOutcome::Succeeded(receipt) = orchestrator.submit_form(&context()).await else {
            panic!("expected success");
        };
        assert_eq!(receipt.topic_group_id, TopicGroupId::new("t3"));
        assert!(!receipt.created_topic);
    }

    #[tokio::test]
    async fn test_missing_title_makes_no_remote_calls() {
        let form = filled_form("", "reactjs");
        let (orchestrator, data_layer, notifier) = orchestrator(MockDataLayer::default(), form.clone());

        let outcome = orchestrator.submit_form(&context()).await;

        let SubmissionOutcome::Rejected(errors) = outcome else {
            panic!("expected rejection");
        };
        assert!(errors.missing_title);
        assert!(!errors.missing_topic);
        assert!(data_layer.calls().is_empty());
        assert!(notifier.all().is_empty());
        assert_eq!(form::lock(&form).field(FormField::Topic), "reactjs");
    }

    #[tokio::test]
    async fn test_missing_topic_without_fixed_topic_is_rejected() {
        let (orchestrator, data_layer, _) = orchestrator(MockDataLayer::default(), filled_form("Hello", ""));

        let outcome = orchestrator.submit_form(&context()).await;

        assert!(matches!(
            outcome,
            SubmissionOutcome::Rejected(ValidationErrors {
                missing_title: false,
                missing_topic: true
            })
        ));
        assert!(data_layer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fixed_topic_overrides_empty_topic_field() {
        let (orchestrator, data_layer, _) = orchestrator(MockDataLayer::default(), filled_form("Hello", ""));
        let context = context().with_fixed_topic("rust");

        let outcome = orchestrator.submit_form(&context).await;

        assert!(outcome.is_success());
        let calls = data_layer.calls();
        assert_eq!(calls[0], Call::Lookup("rust".to_string()));
        assert_eq!(calls[1], Call::CreateTopic("rust".to_string()));
    }

    #[tokio::test]
    async fn test_lookup_failure_keeps_form_and_fails_notification() {
        let form = filled_form("Hello", "reactjs");
        let data_layer = MockDataLayer {
            fail_lookup: true,
            ..MockDataLayer::default()
        };
        let (orchestrator, data_layer, notifier) = orchestrator(data_layer, form.clone());

        let outcome = orchestrator.submit_form(&context()).await;

        let SubmissionOutcome::Failed { error, notification } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.kind(), SubmitErrorKind::Lookup);
        assert_eq!(data_layer.calls().len(), 1);

        let notification = notifier.get(notification).unwrap();
        assert_eq!(notification.state, NotificationState::Failure);
        assert_eq!(notification.message, DEFAULT_FAILURE_MESSAGE);
        assert_eq!(form::lock(&form).field(FormField::Title), "Hello");
        assert_eq!(form::lock(&form).field(FormField::Topic), "reactjs");
    }

    #[tokio::test]
    async fn test_topic_creation_failure_does_not_create_post() {
        let data_layer = MockDataLayer {
            fail_topic: true,
            ..MockDataLayer::default()
        };
        let (orchestrator, data_layer, notifier) = orchestrator(data_layer, filled_form("Hello", "reactjs"));

        let outcome = orchestrator.submit_form(&context()).await;

        let SubmissionOutcome::Failed { error, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.kind(), SubmitErrorKind::TopicCreation);
        assert!(!data_layer
            .calls()
            .iter()
            .any(|call| matches!(call, Call::CreatePost(_))));
        assert!(notifier.pending().is_empty());
    }

    #[tokio::test]
    async fn test_topic_creation_without_id_is_a_failure() {
        let data_layer = MockDataLayer {
            topic_without_id: true,
            ..MockDataLayer::default()
        };
        let (orchestrator, data_layer, _) = orchestrator(data_layer, filled_form("Hello", "reactjs"));

        let outcome = orchestrator.submit_form(&context()).await;

        let SubmissionOutcome::Failed { error, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.kind(), SubmitErrorKind::TopicCreation);
        assert_eq!(data_layer.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_post_creation_failure_keeps_form() {
        let form = filled_form("Hello", "reactjs");
        {
            let mut form = form::lock(&form);
            form.set_field(FormField::Body, "draft body");
            form.toggle_image_panel();
        }
        let data_layer = MockDataLayer {
            fail_post: true,
            ..MockDataLayer::default()
        };
        let (orchestrator, _, notifier) = orchestrator(data_layer, form.clone());

        let outcome = orchestrator.submit_form(&context()).await;

        let SubmissionOutcome::Failed { error, notification } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.kind(), SubmitErrorKind::PostCreation);
        assert_eq!(
            notifier.get(notification).unwrap().state,
            NotificationState::Failure
        );
        let form = form::lock(&form);
        assert_eq!(form.field(FormField::Body), "draft body");
        assert!(form.image_panel_open());
    }

    #[tokio::test]
    async fn test_refresh_failure_does_not_fail_submission() {
        let data_layer = MockDataLayer {
            fail_refetch: true,
            ..MockDataLayer::default()
        };
        let form = filled_form("Hello", "reactjs");
        let (orchestrator, data_layer, notifier) = orchestrator(data_layer, form.clone());

        let SubmissionOutcome::Succeeded(receipt) = orchestrator.submit_form(&context()).await else {
            panic!("expected success");
        };
        data_layer.wait_for_refetch().await;
        assert_eq!(
            notifier.get(receipt.notification).unwrap().state,
            NotificationState::Success
        );
        assert!(form::lock(&form).is_empty());
    }

    #[tokio::test]
    async fn test_image_and_body_are_forwarded() {
        let form = filled_form("Cat", "pics");
        {
            let mut form = form::lock(&form);
            form.toggle_image_panel();
            form.set_field(FormField::ImageUrl, "https://i.imgur.com/cat.png");
            form.set_field(FormField::Body, "look");
        }
        let (orchestrator, data_layer, _) = orchestrator(MockDataLayer::default(), form);

        assert!(orchestrator.submit_form(&context()).await.is_success());

        let calls = data_layer.calls();
        let Call::CreatePost(new_post) = &calls[2] else {
            panic!("expected post creation, got {:?}", calls);
        };
        assert_eq!(new_post.image, "https://i.imgur.com/cat.png");
        assert_eq!(new_post.body, "look");
    }

    #[tokio::test]
    async fn test_invalid_image_on_raw_draft_is_sent_empty() {
        let (orchestrator, data_layer, _) =
            orchestrator(MockDataLayer::default(), shared(FormState::new()));
        let draft = PostDraft {
            title: "Hello".to_string(),
            body: None,
            image_url: Some("not a url".to_string()),
            target_topic: "reactjs".to_string(),
        };

        assert!(orchestrator.submit(draft, &context()).await.is_success());

        let calls = data_layer.calls();
        let Call::CreatePost(new_post) = &calls[2] else {
            panic!("expected post creation, got {:?}", calls);
        };
        assert_eq!(new_post.image, "");
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_ignored() {
        let gate = Arc::new(Notify::new());
        let data_layer = MockDataLayer {
            lookup_gate: Some(gate.clone()),
            ..MockDataLayer::default()
        };
        let (orchestrator, data_layer, notifier) = orchestrator(data_layer, filled_form("Hello", "reactjs"));
        let context = context();

        let (first, second) = tokio::join!(orchestrator.submit_form(&context), async {
            let outcome = orchestrator.submit_form(&context).await;
            gate.notify_one();
            outcome
        });

        assert!(first.is_success());
        assert!(matches!(second, SubmissionOutcome::Busy));
        let topic_creations = data_layer
            .calls()
            .iter()
            .filter(|call| matches!(call, Call::CreateTopic(_)))
            .count();
        assert_eq!(topic_creations, 1);
        assert_eq!(notifier.all().len(), 1);
        assert!(!orchestrator.is_in_flight());
    }

    #[tokio::test]
    async fn test_timeout_resolves_notification_once() {
        let data_layer = MockDataLayer {
            lookup_delay: Some(Duration::from_secs(5)),
            ..MockDataLayer::default()
        };
        let form = filled_form("Hello", "reactjs");
        let data_layer = Arc::new(data_layer);
        let notifier = Arc::new(NotificationCenter::new());
        let options = SubmitOptions {
            call_timeout: Some(Duration::from_millis(20)),
            ..SubmitOptions::default()
        };
        let orchestrator =
            SubmissionOrchestrator::with_options(data_layer.clone(), notifier.clone(), form.clone(), options);

        let outcome = orchestrator.submit_form(&context()).await;

        let SubmissionOutcome::Failed { error, notification } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.kind(), SubmitErrorKind::Lookup);
        assert!(error.is_timeout());
        assert_eq!(
            notifier.get(notification).unwrap().state,
            NotificationState::Failure
        );
        assert_eq!(notifier.all().len(), 1);
        assert_eq!(form::lock(&form).field(FormField::Title), "Hello");
    }

    #[tokio::test]
    async fn test_dropped_attempt_fails_its_notification() {
        let gate = Arc::new(Notify::new());
        let data_layer = MockDataLayer {
            lookup_gate: Some(gate),
            ..MockDataLayer::default()
        };
        let (orchestrator, _, notifier) = orchestrator(data_layer, filled_form("Hello", "reactjs"));

        let ctx = context();
        let attempt = orchestrator.submit_form(&ctx);
        let timed_out = tokio::time::timeout(Duration::from_millis(20), attempt).await;

        assert!(timed_out.is_err());
        assert!(notifier.pending().is_empty());
        assert_eq!(notifier.all()[0].state, NotificationState::Failure);
        assert!(!orchestrator.is_in_flight());
    }

    #[tokio::test]
    async fn test_slow_refresh_does_not_hold_back_success() {
        let gate = Arc::new(Notify::new());
        let data_layer = MockDataLayer {
            refetch_gate: Some(gate.clone()),
            ..MockDataLayer::default()
        };
        let form = filled_form("Hello", "reactjs");
        let (orchestrator, data_layer, notifier) = orchestrator(data_layer, form.clone());
        let ctx = context();

        let completed =
            tokio::time::timeout(Duration::from_millis(200), orchestrator.submit_form(&ctx)).await;

        let Ok(SubmissionOutcome::Succeeded(receipt)) = completed else {
            panic!("submission should finish while the refresh is still pending");
        };
        assert_eq!(
            notifier.get(receipt.notification).unwrap().state,
            NotificationState::Success
        );
        assert!(form::lock(&form).is_empty());
        assert!(!orchestrator.is_in_flight());

        gate.notify_one();
        data_layer.wait_for_refetch().await;
        assert_eq!(data_layer.calls().last(), Some(&Call::Refetch));
        assert_eq!(
            notifier.get(receipt.notification).unwrap().state,
            NotificationState::Success
        );
    }

    #[tokio::test]
    async fn test_topic_is_looked_up_exactly_as_typed() {
        let (orchestrator, data_layer, _) =
            orchestrator(MockDataLayer::default(), filled_form("Hello", " ReactJS "));

        assert!(orchestrator.submit_form(&context()).await.is_success());

        let calls = data_layer.calls();
        assert_eq!(calls[0], Call::Lookup(" ReactJS ".to_string()));
        assert_eq!(calls[1], Call::CreateTopic(" ReactJS ".to_string()));
    }

    #[tokio::test]
    async fn test_whitespace_title_is_submitted() {
        let (orchestrator, data_layer, _) =
            orchestrator(MockDataLayer::default(), filled_form("  ", "reactjs"));

        assert!(orchestrator.submit_form(&context()).await.is_success());

        let calls = data_layer.calls();
        let Call::CreatePost(new_post) = &calls[2] else {
            panic!("expected post creation, got {:?}", calls);
        };
        assert_eq!(new_post.title, "  ");
    }

    #[tokio::test]
    async fn test_image_url_is_sent_as_typed() {
        let (orchestrator, data_layer, _) =
            orchestrator(MockDataLayer::default(), shared(FormState::new()));
        let draft = PostDraft {
            title: "Hello".to_string(),
            body: None,
            image_url: Some(" https://Example.COM ".to_string()),
            target_topic: "reactjs".to_string(),
        };

        assert!(orchestrator.submit(draft, &context()).await.is_success());

        let calls = data_layer.calls();
        let Call::CreatePost(new_post) = &calls[2] else {
            panic!("expected post creation, got {:?}", calls);
        };
        assert_eq!(new_post.image, "https://Example.COM");
    }

    #[test]
    fn test_custom_messages_are_used() {
        let options = SubmitOptions {
            call_timeout: None,
            messages: NotificationMessages {
                pending: "Posting...".to_string(),
                success: "Posted".to_string(),
                failure: "Failed".to_string(),
            },
        };
        let data_layer = Arc::new(MockDataLayer::default());
        let notifier = Arc::new(NotificationCenter::new());
        let orchestrator = SubmissionOrchestrator::with_options(
            data_layer,
            notifier.clone(),
            filled_form("Hello", "reactjs"),
            options,
        );

        let outcome = tokio_test::block_on(orchestrator.submit_form(&context()));

        let SubmissionOutcome::Succeeded(receipt) = outcome else {
            panic!("expected success");
        };
        assert_eq!(notifier.get(receipt.notification).unwrap().message, "Posted");
    }
}
