use itinera_model::ModelProvider;

use super::PlannerSession;
use crate::gateway::Gateway;
use crate::prompt::Edition;

/// [`PlannerSession`] builder.
#[derive(Debug)]
pub struct SessionBuilder {
    pub(crate) gateway: Gateway,
    pub(crate) edition: Edition,
}

impl SessionBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            gateway: Gateway::new(provider),
            edition: Edition::default(),
        }
    }

    /// Creates a new builder without a model provider.
    ///
    /// The session still works offline: saved itineraries can be browsed
    /// and exported, but nothing can be generated.
    #[inline]
    pub fn unconfigured() -> Self {
        Self {
            gateway: Gateway::unconfigured(),
            edition: Edition::default(),
        }
    }

    /// Selects the edition, Pro by default.
    #[inline]
    pub fn with_edition(mut self, edition: Edition) -> Self {
        self.edition = edition;
        self
    }

    /// Builds the session.
    #[inline]
    pub fn build(self) -> PlannerSession {
        PlannerSession::from_builder(self)
    }
}
