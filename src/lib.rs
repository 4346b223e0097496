pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use crate::adapters::{graphql::GraphQlClient, identity::StaticIdentity, notifier::NotificationCenter};
pub use crate::core::form::{FormField, FormLayout, FormState, SharedForm, ValidationErrors};
pub use crate::core::orchestrator::{
    AttemptPhase, SubmissionOrchestrator, SubmissionOutcome, SubmissionReceipt, SubmitError,
    SubmitErrorKind, SubmitOptions,
};
pub use crate::domain::model::{PostDraft, SessionUser, SubmitContext};
pub use crate::utils::error::{PostBoxError, Result};
