pub mod form;
pub mod orchestrator;

pub use crate::domain::model::{PostDraft, SubmitContext};
pub use crate::domain::ports::{ConfigProvider, DataLayer, IdentityProvider, Notifier};
pub use crate::utils::error::Result;
