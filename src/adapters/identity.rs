use crate::domain::model::SessionUser;
use crate::domain::ports::IdentityProvider;

/// Session fixed at construction; `None` is a signed-out visitor.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<SessionUser>,
}

impl StaticIdentity {
    pub fn signed_in(handle: impl Into<String>) -> Self {
        Self {
            user: Some(SessionUser::new(handle)),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn from_handle(handle: Option<String>) -> Self {
        Self {
            user: handle
                .filter(|handle| !handle.trim().is_empty())
                .map(SessionUser::new),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<SessionUser> {
        self.user.clone()
    }
}
