//! Form persistence engine
//!
//! One [`FormEngine`] serves one step screen for one user. It loads the
//! step's stored answers through the step's [`FormContract`], keeps the
//! edited draft in memory and submits it as an ordered sequence of writes:
//!
//! 1. the form row (insert for append-only steps or when no row exists,
//!    update otherwise)
//! 2. the step's ledger record, marked completed
//! 3. an available ledger record for every successor without one
//!
//! A failure stops the sequence, so a step is never completed before its
//! form row is stored. Every write is safe to repeat: while a submit is
//! unfinished the engine remembers the payload stored in (1) and skips that
//! write when a retry submits the same payload, and ledger upserts merge
//! monotonically. Once all three writes succeed the next submit writes again,
//! so append-only steps get one history row per completed submit.

use crate::error::{JourneyError, SaveStage};
use chrono::Utc;
use futures::future::try_join_all;
use journey_forms::FormContract;
use journey_progress::{FormStore, ProgressLedger, ProgressRecord, StoreError, StoredRow, UserId};
use journey_registry::{StepDescriptor, StepId, StepRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use ulid::Ulid;

/// Result of a successful submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    /// Submitted step
    pub step: StepId,
    /// Form row holding the submitted payload
    pub row_id: Ulid,
    /// Successors made available by this submit, in registry order
    pub unlocked: Vec<StepId>,
    /// Terminal step completed
    pub journey_complete: bool,
}

#[derive(Debug, Clone)]
struct SavedPayload {
    payload: Value,
    row_id: Ulid,
}

/// Per-step load / edit / submit controller
///
/// `update` and `submit` take `&mut self`, so a submit can never interleave
/// with another submit or an edit of the same engine.
pub struct FormEngine<C: FormContract> {
    user: UserId,
    step: StepDescriptor,
    successors: Vec<StepDescriptor>,
    terminal: StepId,
    ledger: Arc<dyn ProgressLedger>,
    forms: Arc<dyn FormStore>,
    draft: C::State,
    live_row: Option<Ulid>,
    saved: Option<SavedPayload>,
    // Set after (1) succeeds, cleared once (2) and (3) succeed
    unfinished: bool,
}

impl<C: FormContract> std::fmt::Debug for FormEngine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormEngine")
            .field("contract", &C::NAME)
            .field("user", &self.user)
            .field("step", &self.step.id)
            .field("draft", &self.draft)
            .field("live_row", &self.live_row)
            .finish_non_exhaustive()
    }
}

impl<C: FormContract> FormEngine<C> {
    /// Bind the contract's step for `user`
    ///
    /// The draft starts as the contract's initial state; call
    /// [`load`](Self::load) to fetch stored answers.
    ///
    /// # Errors
    /// - `JourneyError::NotFound` if `C::STEP` is not registered
    pub fn new(
        registry: &StepRegistry,
        user: UserId,
        ledger: Arc<dyn ProgressLedger>,
        forms: Arc<dyn FormStore>,
    ) -> Result<Self, JourneyError> {
        let step = registry.get(C::STEP)?.clone();
        let successors = registry
            .successors(C::STEP)?
            .iter()
            .map(|id| registry.get(*id).cloned())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            user,
            step,
            successors,
            terminal: registry.terminal(),
            ledger,
            forms,
            draft: C::initial(),
            live_row: None,
            saved: None,
            unfinished: false,
        })
    }

    /// Bound step
    #[inline]
    #[must_use]
    pub fn step(&self) -> &StepDescriptor {
        &self.step
    }

    /// Bound user
    #[inline]
    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Current draft
    #[inline]
    #[must_use]
    pub fn draft(&self) -> &C::State {
        &self.draft
    }

    /// Whether the draft differs from the last payload this engine stored
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.saved
            .as_ref()
            .map_or(true, |saved| saved.payload != C::serialize(&self.draft))
    }

    fn row_key(&self) -> Option<StepId> {
        self.step.persistence.row_key(self.step.id)
    }

    /// Replace the draft with the most recent stored answers
    ///
    /// Falls back to the contract's initial state when nothing is stored.
    /// Legacy payloads never fail here; only store failures do.
    ///
    /// # Errors
    /// - `JourneyError::Load` if the form store fails; safe to retry
    pub async fn load(&mut self) -> Result<C::State, JourneyError> {
        let latest = self
            .forms
            .latest(&self.step.storage_table, &self.user, self.row_key())
            .await
            .map_err(|source| self.load_error(source))?;

        self.draft = match latest {
            Some(row) => {
                if !self.step.persistence.is_append_only() {
                    self.live_row = Some(row.row_id);
                }
                C::normalize(&row.payload)
            }
            None => C::initial(),
        };
        debug!(user = %self.user, step = %self.step.id, "form loaded");
        Ok(self.draft.clone())
    }

    /// Every stored submission, oldest first
    ///
    /// Single-row steps yield at most one entry.
    ///
    /// # Errors
    /// - `JourneyError::Load` if the form store fails
    pub async fn history(&self) -> Result<Vec<C::State>, JourneyError> {
        let rows = self
            .forms
            .history(&self.step.storage_table, &self.user, self.row_key())
            .await
            .map_err(|source| self.load_error(source))?;
        Ok(rows.iter().map(|row| C::normalize(&row.payload)).collect())
    }

    /// Edit the draft in place; no I/O
    pub fn update(&mut self, edit: impl FnOnce(&mut C::State)) {
        edit(&mut self.draft);
    }

    /// Replace the whole draft; no I/O
    pub fn replace(&mut self, state: C::State) {
        self.draft = state;
    }

    /// Save the draft, complete the step and unlock its successors
    ///
    /// On failure the draft is kept and calling `submit` again converges to
    /// the same end state without a second form row.
    ///
    /// # Errors
    /// - `JourneyError::Save` naming the [`SaveStage`] that failed
    pub async fn submit(&mut self) -> Result<SubmitOutcome, JourneyError> {
        let payload = C::serialize(&self.draft);

        let row_id = match &self.saved {
            Some(saved) if self.unfinished && saved.payload == payload => {
                debug!(
                    user = %self.user,
                    step = %self.step.id,
                    row = %saved.row_id,
                    "form record already stored, resuming submit"
                );
                saved.row_id
            }
            _ => {
                let row = self
                    .write_form(payload.clone())
                    .await
                    .map_err(|source| self.save_error(SaveStage::FormRecord, source))?;
                if !self.step.persistence.is_append_only() {
                    self.live_row = Some(row.row_id);
                }
                self.saved = Some(SavedPayload {
                    payload,
                    row_id: row.row_id,
                });
                self.unfinished = true;
                row.row_id
            }
        };

        self.ledger
            .upsert(ProgressRecord::completed(&self.user, &self.step, Utc::now()))
            .await
            .map_err(|source| self.save_error(SaveStage::MarkCompleted, source))?;

        let (unlocked, journey_complete) = self
            .unlock_successors()
            .await
            .map_err(|source| self.save_error(SaveStage::UnlockSuccessors, source))?;
        self.unfinished = false;

        info!(
            user = %self.user,
            step = %self.step.id,
            unlocked = unlocked.len(),
            journey_complete,
            "step submitted"
        );

        Ok(SubmitOutcome {
            step: self.step.id,
            row_id,
            unlocked,
            journey_complete,
        })
    }

    async fn write_form(&self, payload: Value) -> Result<StoredRow, StoreError> {
        let table = self.step.storage_table.as_str();
        let key = self.row_key();

        if self.step.persistence.is_append_only() {
            return self.forms.insert(table, &self.user, key, payload).await;
        }

        // Engines that never loaded still must not add a second live row
        let live = match self.live_row {
            Some(row_id) => Some(row_id),
            None => self
                .forms
                .latest(table, &self.user, key)
                .await?
                .map(|row| row.row_id),
        };

        match live {
            Some(row_id) => self.forms.update(table, row_id, payload).await,
            None => self.forms.insert(table, &self.user, key, payload).await,
        }
    }

    /// Upsert successors that have no ledger record yet
    ///
    /// Returns the newly unlocked steps and whether the terminal step is
    /// completed.
    async fn unlock_successors(&self) -> Result<(Vec<StepId>, bool), StoreError> {
        let records = self.ledger.records(&self.user).await?;
        let journey_complete = records
            .iter()
            .any(|r| r.step_id == self.terminal && r.completed)
            || self.step.id == self.terminal;

        let missing: Vec<&StepDescriptor> = self
            .successors
            .iter()
            .filter(|next| !records.iter().any(|r| r.step_id == next.id))
            .collect();

        try_join_all(
            missing
                .iter()
                .map(|next| self.ledger.upsert(ProgressRecord::unlocked(&self.user, next))),
        )
        .await?;

        Ok((missing.iter().map(|next| next.id).collect(), journey_complete))
    }

    fn load_error(&self, source: StoreError) -> JourneyError {
        warn!(user = %self.user, step = %self.step.id, error = %source, "form load failed");
        JourneyError::Load {
            step: self.step.id,
            source,
        }
    }

    fn save_error(&self, stage: SaveStage, source: StoreError) -> JourneyError {
        warn!(
            user = %self.user,
            step = %self.step.id,
            %stage,
            error = %source,
            "submit stopped"
        );
        JourneyError::Save {
            step: self.step.id,
            stage,
            source,
        }
    }
}
