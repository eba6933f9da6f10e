use async_trait::async_trait;

use crate::actor::Actor;

/// Session lookup. The workflow never authenticates on its own.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_actor(&self) -> Actor;
}

/// Identity fixed at construction, e.g. from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    session: Option<Actor>,
}

impl StaticIdentity {
    pub fn signed_in(actor: Actor) -> Self {
        Self {
            session: Some(actor),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_actor(&self) -> Actor {
        self.session.clone().unwrap_or_else(Actor::guest)
    }
}
