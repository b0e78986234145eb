//! Journey facade
//!
//! [`Journey`] bundles the step registry, the stores and the configuration,
//! and answers the questions a step screen asks: where is this user, may they
//! enter this step, and how far along are they. Every call names its user.

use crate::config::EngineConfig;
use crate::engine::FormEngine;
use crate::error::{JourneyError, SaveStage};
use journey_forms::FormContract;
use journey_progress::{
    CachedLedger, FormStore, GatingResolver, JourneyProgress, ProgressLedger, ProgressRecord,
    StepStatus, UserId,
};
use journey_registry::{standard_journey, StepId, StepRegistry};
use std::sync::Arc;
use tracing::{debug, info};

/// Entry point for step screens
#[derive(Clone)]
pub struct Journey {
    registry: Arc<StepRegistry>,
    ledger: Arc<dyn ProgressLedger>,
    forms: Arc<dyn FormStore>,
    config: EngineConfig,
}

impl std::fmt::Debug for Journey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journey")
            .field("steps", &self.registry.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Journey {
    /// Create with default configuration
    #[must_use]
    pub fn new(
        registry: Arc<StepRegistry>,
        ledger: Arc<dyn ProgressLedger>,
        forms: Arc<dyn FormStore>,
    ) -> Self {
        Self::with_config(registry, ledger, forms, EngineConfig::default())
    }

    /// Create with explicit configuration
    ///
    /// Wraps the ledger in a [`CachedLedger`] when `ledger_cache.enabled`.
    #[must_use]
    pub fn with_config(
        registry: Arc<StepRegistry>,
        ledger: Arc<dyn ProgressLedger>,
        forms: Arc<dyn FormStore>,
        config: EngineConfig,
    ) -> Self {
        let ledger: Arc<dyn ProgressLedger> = if config.ledger_cache.enabled {
            Arc::new(CachedLedger::with_ttl(
                ledger,
                config.ledger_cache.capacity,
                config.ledger_cache.ttl(),
            ))
        } else {
            ledger
        };

        Self {
            registry,
            ledger,
            forms,
            config,
        }
    }

    /// Journey over the built-in catalog
    ///
    /// # Errors
    /// - `JourneyError::Config` if `config` is invalid
    /// - `JourneyError::Registry` if the built-in catalog is inconsistent
    pub fn standard(
        ledger: Arc<dyn ProgressLedger>,
        forms: Arc<dyn FormStore>,
        config: EngineConfig,
    ) -> Result<Self, JourneyError> {
        config.validate()?;
        let registry = Arc::new(standard_journey()?);
        Ok(Self::with_config(registry, ledger, forms, config))
    }

    /// Step registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<StepRegistry> {
        &self.registry
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ledger used for gating, cached if configured
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &Arc<dyn ProgressLedger> {
        &self.ledger
    }

    /// Form store
    #[inline]
    #[must_use]
    pub fn forms(&self) -> &Arc<dyn FormStore> {
        &self.forms
    }

    async fn read(&self, user: &UserId) -> Result<GatingResolver, JourneyError> {
        let records = self
            .ledger
            .records(user)
            .await
            .map_err(JourneyError::LedgerRead)?;
        let resolver = GatingResolver::new(self.registry.clone(), records);
        if resolver.skipped_records() > 0 {
            debug!(
                user = %user,
                skipped = resolver.skipped_records(),
                "ledger holds records for unregistered steps"
            );
        }
        Ok(resolver)
    }

    /// Make the first step available for a user without ledger records
    ///
    /// Returns the created record, or `None` if the user already started.
    /// Safe to call repeatedly.
    ///
    /// # Errors
    /// - `JourneyError::LedgerRead` if the ledger cannot be read
    /// - `JourneyError::Save` at [`SaveStage::Bootstrap`] if the first
    ///   record cannot be written
    pub async fn start(&self, user: &UserId) -> Result<Option<ProgressRecord>, JourneyError> {
        let resolver = self.read(user).await?;
        let Some(record) = resolver.bootstrap_record(user) else {
            return Ok(None);
        };

        let step = record.step_id;
        let stored = self.ledger.upsert(record).await.map_err(|source| JourneyError::Save {
            step,
            stage: SaveStage::Bootstrap,
            source,
        })?;
        info!(user = %user, step = %step, "journey started");
        Ok(Some(stored))
    }

    /// Gating view of a user
    ///
    /// Bootstraps users without records first when `bootstrap_on_start` is
    /// set.
    ///
    /// # Errors
    /// - `JourneyError::LedgerRead` if the ledger cannot be read
    /// - `JourneyError::Save` if bootstrapping fails
    pub async fn resolver(&self, user: &UserId) -> Result<GatingResolver, JourneyError> {
        let resolver = self.read(user).await?;
        if resolver.is_fresh() && self.config.bootstrap_on_start {
            self.start(user).await?;
            return self.read(user).await;
        }
        Ok(resolver)
    }

    /// Status of one step for a user
    ///
    /// # Errors
    /// - `JourneyError::NotFound` for an unknown step
    /// - ledger errors as in [`resolver`](Self::resolver)
    pub async fn classify(&self, user: &UserId, step: StepId) -> Result<StepStatus, JourneyError> {
        self.registry.get(step)?;
        Ok(self.resolver(user).await?.classify(step)?)
    }

    /// Earliest pending step of a user
    ///
    /// # Errors
    /// - ledger errors as in [`resolver`](Self::resolver)
    pub async fn current_step(&self, user: &UserId) -> Result<Option<StepId>, JourneyError> {
        Ok(self.resolver(user).await?.current_step())
    }

    /// Open the step screen of contract `C` for a user
    ///
    /// The returned engine holds the initial state; call
    /// [`FormEngine::load`] to fetch stored answers.
    ///
    /// # Errors
    /// - `JourneyError::NotFound` if `C::STEP` is not registered
    /// - `JourneyError::StepLocked` if gating is enforced and the step is
    ///   locked for this user
    /// - ledger errors as in [`resolver`](Self::resolver)
    pub async fn open<C: FormContract>(&self, user: &UserId) -> Result<FormEngine<C>, JourneyError> {
        self.registry.get(C::STEP)?;

        if self.config.enforce_gating && !self.resolver(user).await?.can_enter(C::STEP)? {
            debug!(user = %user, step = %C::STEP, "refusing locked step");
            return Err(JourneyError::StepLocked(C::STEP));
        }

        FormEngine::new(
            &self.registry,
            user.clone(),
            self.ledger.clone(),
            self.forms.clone(),
        )
    }

    /// Progress summary of a user
    ///
    /// # Errors
    /// - ledger errors as in [`resolver`](Self::resolver)
    pub async fn progress(&self, user: &UserId) -> Result<JourneyProgress, JourneyError> {
        Ok(JourneyProgress::compute(&self.resolver(user).await?))
    }
}
