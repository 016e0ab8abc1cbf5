//! Allocation session: load → edit → validate → save.
//!
//! State machine:
//!
//! ```text
//! Idle ──begin_load──▶ Loading ──finish_load──▶ Ready
//! Ready ──begin_load──▶ Loading
//! Ready ──begin_save──▶ Saving ──finish_save(ok)──▶ Loading ──▶ Ready
//!                              └─finish_save(err)─▶ Ready (edits kept)
//! any  ──unexpected completion──▶ Error ──recover──▶ Ready
//! ```
//!
//! The two store calls are the only suspension points. They are split into
//! `begin_*` / `finish_*` so a cooperative driver can interleave other work;
//! [`AllocationSession::load`] and [`AllocationSession::save`] compose them
//! against the configured store. While a call is in flight every mutation is
//! rejected with [`SessionError::Busy`].
//!
//! After every row mutation the aggregate is recomputed before returning, so
//! the remainder read by the caller always matches the rows in memory.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::aggregate::{recompute, AggregateState};
use crate::collection::{CollectionError, RowCollection};
use crate::row::{RowEditError, RowReconciler};
use crate::store::{AllocationStore, DisbursementRecord, Notifier, RowSubmission, StoreError};
use crate::types::{
    AllocationRow, CategorySelection, Disbursement, DisbursementStatus, RowEvent, RowId,
};

// ---------------------------------------------------------------------------
// State + errors
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Ready,
    Saving,
    Error,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Ready => "ready",
            SessionState::Saving => "saving",
            SessionState::Error => "error",
        }
    }

    /// A store call is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Loading | SessionState::Saving)
    }
}

/// Reasons a save is refused locally, before any store call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationFailure {
    /// A real row lacks a category or an amount.
    MissingFields,
    /// Rows add up to more than the total.
    OverAllocated { remaining: Decimal },
    /// Some row has no usable amount.
    InvalidRows,
    /// Disbursement status does not allow editing.
    NotEligible { status: DisbursementStatus },
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields => write!(f, "every allocation needs a GAU and an amount"),
            Self::OverAllocated { remaining } => {
                write!(f, "allocations exceed the disbursement total by {}", -*remaining)
            }
            Self::InvalidRows => write!(f, "one or more allocations have an invalid amount"),
            Self::NotEligible { status } => write!(
                f,
                "allocations cannot be changed on a {} disbursement",
                status.as_str()
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// A store call is in flight; the request was ignored.
    Busy { state: SessionState },
    /// No disbursement is loaded.
    NotLoaded,
    Validation(ValidationFailure),
    Load(StoreError),
    Save(StoreError),
    Row(RowEditError),
    Collection(CollectionError),
    /// The session is in `Error` and must be recovered or reloaded first.
    NotReady { state: SessionState },
    /// A store completion arrived in a state that was not waiting for it.
    UnexpectedCompletion { state: SessionState },
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy { state } => write!(f, "session is busy ({})", state.as_str()),
            Self::NotLoaded => write!(f, "no disbursement is loaded"),
            Self::Validation(v) => write!(f, "{v}"),
            Self::Load(e) => write!(f, "load failed: {e}"),
            Self::Save(e) => write!(f, "save failed: {e}"),
            Self::Row(e) => write!(f, "{e}"),
            Self::Collection(e) => write!(f, "{e}"),
            Self::NotReady { state } => write!(f, "session is not ready ({})", state.as_str()),
            Self::UnexpectedCompletion { state } => {
                write!(f, "unexpected store completion while {}", state.as_str())
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<RowEditError> for SessionError {
    fn from(e: RowEditError) -> Self {
        SessionError::Row(e)
    }
}

impl From<CollectionError> for SessionError {
    fn from(e: CollectionError) -> Self {
        SessionError::Collection(e)
    }
}

impl From<ValidationFailure> for SessionError {
    fn from(v: ValidationFailure) -> Self {
        SessionError::Validation(v)
    }
}

/// User-facing notice texts. Validation notices fall back to the
/// [`ValidationFailure`] description when unset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionMessages {
    pub save_success: String,
    pub missing_fields: Option<String>,
}

impl Default for SessionMessages {
    fn default() -> Self {
        Self {
            save_success: "Allocations saved.".to_string(),
            missing_fields: None,
        }
    }
}

impl SessionMessages {
    fn for_failure(&self, v: &ValidationFailure) -> String {
        match (v, &self.missing_fields) {
            (ValidationFailure::MissingFields, Some(custom)) => custom.clone(),
            _ => v.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// AllocationSession
// ---------------------------------------------------------------------------

pub struct AllocationSession {
    store: Arc<dyn AllocationStore>,
    notifier: Arc<dyn Notifier>,
    messages: SessionMessages,
    state: SessionState,
    disbursement: Option<Disbursement>,
    rows: RowCollection,
    aggregate: AggregateState,
    eligible_status: bool,
    last_error: Option<String>,
}

impl AllocationSession {
    pub fn new(store: Arc<dyn AllocationStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            messages: SessionMessages::default(),
            state: SessionState::Idle,
            disbursement: None,
            rows: RowCollection::placeholder(),
            aggregate: AggregateState::unallocated(Decimal::ZERO),
            eligible_status: false,
            last_error: None,
        }
    }

    pub fn with_messages(mut self, messages: SessionMessages) -> Self {
        self.messages = messages;
        self
    }

    // --- accessors ---------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn disbursement(&self) -> Option<&Disbursement> {
        self.disbursement.as_ref()
    }

    pub fn rows(&self) -> &RowCollection {
        &self.rows
    }

    pub fn aggregate(&self) -> &AggregateState {
        &self.aggregate
    }

    /// Whether the disbursement's status allows editing allocations.
    pub fn eligible_status(&self) -> bool {
        self.eligible_status
    }

    /// Last error surfaced to the user, cleared on a successful load.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Rows as currently held, for callers that render them.
    pub fn snapshot(&self) -> Vec<AllocationRow> {
        self.rows.all().cloned().collect()
    }

    /// Every row individually valid.
    pub fn report_row_validity(&self) -> bool {
        self.aggregate.rows_valid
    }

    fn total_amount(&self) -> Decimal {
        self.disbursement
            .as_ref()
            .map_or(Decimal::ZERO, |d| d.total_amount)
    }

    /// Reconciler over the stored row, bound to the current total.
    pub fn reconciler(&self, row_id: RowId) -> Result<RowReconciler, SessionError> {
        let row = self
            .rows
            .get(row_id)
            .cloned()
            .ok_or(CollectionError::UnknownRow(row_id))?;
        Ok(RowReconciler::new(row, self.total_amount()))
    }

    // --- load --------------------------------------------------------------

    /// Idle/Ready/Error → Loading.
    pub fn begin_load(&mut self, disbursement_id: &str) -> Result<(), SessionError> {
        self.ensure_not_busy()?;
        info!(disbursement_id = %disbursement_id, "allocation load started");
        self.state = SessionState::Loading;
        Ok(())
    }

    /// Loading → Ready. A failure leaves one blank row and no disbursement.
    pub fn finish_load(
        &mut self,
        result: Result<DisbursementRecord, StoreError>,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Loading {
            return Err(self.unexpected_completion());
        }

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "allocation load failed");
                self.reset_unloaded();
                self.state = SessionState::Ready;
                self.surface_error(e.to_string());
                return Err(SessionError::Load(e));
            }
        };

        let disbursement = record.disbursement();
        let total = disbursement.total_amount;
        let stored_rows = record.rows.len();
        let rows = record
            .rows
            .into_iter()
            .map(|stored| RowReconciler::prefill(stored.into_row(), total).into_row());

        let rows = match RowCollection::initialize(rows) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "stored allocations are inconsistent");
                self.reset_unloaded();
                self.state = SessionState::Ready;
                self.surface_error(e.to_string());
                return Err(SessionError::Collection(e));
            }
        };

        self.eligible_status = match disbursement.status {
            DisbursementStatus::Cancelled => false,
            DisbursementStatus::Paid => stored_rows == 0,
            DisbursementStatus::Open => true,
        };
        self.rows = rows;
        self.aggregate = recompute(self.rows.all(), total);
        info!(
            disbursement_id = %disbursement.id,
            rows = self.rows.len(),
            eligible = self.eligible_status,
            remaining = %self.aggregate.remaining_amount,
            "allocation load finished"
        );
        self.disbursement = Some(disbursement);
        self.last_error = None;
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Fetch `disbursement_id` from the store and rebuild the rows.
    pub async fn load(&mut self, disbursement_id: &str) -> Result<(), SessionError> {
        self.begin_load(disbursement_id)?;
        let result = self.store.get(disbursement_id).await;
        self.finish_load(result)
    }

    // --- row events --------------------------------------------------------

    /// Apply a row event and recompute the aggregate. Ready only.
    pub fn handle_row_event(&mut self, event: RowEvent) -> Result<(), SessionError> {
        self.ensure_ready()?;
        match event {
            RowEvent::Update(row) => {
                debug!(row_id = %row.row_id, "row update");
                self.rows.apply_update(row)?;
            }
            RowEvent::Delete(row) => {
                debug!(row_id = %row.row_id, "row delete");
                self.rows.apply_delete(row.row_id)?;
            }
        }
        self.recompute();
        Ok(())
    }

    pub fn add_row(&mut self) -> Result<RowId, SessionError> {
        self.ensure_ready()?;
        let id = self.rows.add_row()?;
        self.recompute();
        Ok(id)
    }

    pub fn set_amount(&mut self, row_id: RowId, raw: Option<&str>) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let mut r = self.reconciler(row_id)?;
        match r.set_amount(raw)? {
            Some(event) => self.handle_row_event(event),
            None => Ok(()),
        }
    }

    pub fn set_percent(&mut self, row_id: RowId, raw: Option<&str>) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let mut r = self.reconciler(row_id)?;
        match r.set_percent(raw)? {
            Some(event) => self.handle_row_event(event),
            None => Ok(()),
        }
    }

    pub fn set_category(
        &mut self,
        row_id: RowId,
        selection: &[CategorySelection],
    ) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let mut r = self.reconciler(row_id)?;
        let event = r.set_category(selection)?;
        self.handle_row_event(event)
    }

    pub fn delete_row(&mut self, row_id: RowId) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let event = self.reconciler(row_id)?.request_delete();
        self.handle_row_event(event)
    }

    fn recompute(&mut self) {
        self.aggregate = recompute(self.rows.all(), self.total_amount());
        debug!(
            used = %self.aggregate.used_amount,
            remaining = %self.aggregate.remaining_amount,
            save_eligible = self.aggregate.save_eligible,
            "aggregate recomputed"
        );
    }

    // --- save --------------------------------------------------------------

    /// `MissingFields` when any real row lacks a category or an amount.
    ///
    /// A lone blank row stands for "no allocations" and passes.
    pub fn validate_for_save(&self) -> Result<(), ValidationFailure> {
        if self.rows.is_placeholder_only() {
            return Ok(());
        }
        if self.rows.all().any(|r| !r.is_complete()) {
            return Err(ValidationFailure::MissingFields);
        }
        Ok(())
    }

    /// Rows to submit. A lone blank row submits nothing (clears all).
    pub fn save_payload(&self) -> Vec<RowSubmission> {
        if self.rows.is_placeholder_only() {
            return Vec::new();
        }
        self.rows
            .all()
            .filter_map(|r| match (&r.gau_id, r.amount) {
                (Some(gau_id), Some(amount)) => Some(RowSubmission {
                    gau_id: gau_id.clone(),
                    amount,
                }),
                _ => None,
            })
            .collect()
    }

    fn check_save_gates(&self) -> Result<(), ValidationFailure> {
        if let Some(d) = &self.disbursement {
            if !self.eligible_status {
                return Err(ValidationFailure::NotEligible { status: d.status });
            }
        }
        self.validate_for_save()?;
        if self.rows.is_placeholder_only() {
            return Ok(());
        }
        if !self.aggregate.rows_valid {
            return Err(ValidationFailure::InvalidRows);
        }
        if self.aggregate.is_over_allocated() {
            return Err(ValidationFailure::OverAllocated {
                remaining: self.aggregate.remaining_amount,
            });
        }
        Ok(())
    }

    /// Ready → Saving. Returns the payload to hand to the store.
    ///
    /// A local validation failure is surfaced and the session stays Ready.
    pub fn begin_save(&mut self) -> Result<Vec<RowSubmission>, SessionError> {
        self.ensure_ready()?;
        if let Err(v) = self.check_save_gates() {
            warn!(reason = %v, "save blocked");
            let notice = self.messages.for_failure(&v);
            self.surface_error(notice);
            return Err(SessionError::Validation(v));
        }

        let payload = self.save_payload();
        info!(rows = payload.len(), "allocation save started");
        self.state = SessionState::Saving;
        Ok(payload)
    }

    /// Saving → Loading on success (caller reloads), Saving → Ready on
    /// failure with all rows untouched.
    ///
    /// Returns the disbursement id to reload.
    pub fn finish_save(&mut self, result: Result<(), StoreError>) -> Result<String, SessionError> {
        if self.state != SessionState::Saving {
            return Err(self.unexpected_completion());
        }
        if let Err(e) = result {
            warn!(error = %e, "allocation save failed");
            self.state = SessionState::Ready;
            self.surface_error(e.to_string());
            return Err(SessionError::Save(e));
        }
        let Some(id) = self.disbursement.as_ref().map(|d| d.id.clone()) else {
            return Err(self.unexpected_completion());
        };

        info!(disbursement_id = %id, "allocation save finished");
        self.notifier.notify_success(&self.messages.save_success);
        self.state = SessionState::Loading;
        Ok(id)
    }

    /// Validate, submit, and reload on success.
    pub async fn save(&mut self) -> Result<(), SessionError> {
        let payload = self.begin_save()?;
        let id = self
            .disbursement
            .as_ref()
            .map(|d| d.id.clone())
            .ok_or(SessionError::NotLoaded)?;
        let result = self.store.save(&id, &payload).await;
        let reload_id = self.finish_save(result)?;
        let record = self.store.get(&reload_id).await;
        self.finish_load(record)
    }

    /// Error → Ready. Rows are kept as they were.
    pub fn recover(&mut self) {
        if self.state == SessionState::Error {
            self.state = SessionState::Ready;
        }
    }

    // --- helpers -----------------------------------------------------------

    fn ensure_not_busy(&self) -> Result<(), SessionError> {
        if self.state.is_busy() {
            warn!(state = self.state.as_str(), "request rejected while busy");
            return Err(SessionError::Busy { state: self.state });
        }
        Ok(())
    }

    /// Ready with a disbursement loaded. A failed load leaves the view
    /// non-actionable until a load succeeds.
    fn ensure_ready(&self) -> Result<(), SessionError> {
        self.ensure_not_busy()?;
        match self.state {
            SessionState::Ready if self.disbursement.is_some() => Ok(()),
            SessionState::Ready | SessionState::Idle => Err(SessionError::NotLoaded),
            other => Err(SessionError::NotReady { state: other }),
        }
    }

    fn unexpected_completion(&mut self) -> SessionError {
        let state = self.state;
        warn!(state = state.as_str(), "unexpected store completion");
        self.state = SessionState::Error;
        SessionError::UnexpectedCompletion { state }
    }

    fn reset_unloaded(&mut self) {
        self.disbursement = None;
        self.rows = RowCollection::placeholder();
        self.aggregate = AggregateState::unallocated(Decimal::ZERO);
        self.eligible_status = false;
    }

    fn surface_error(&mut self, message: String) {
        self.notifier.notify_error(&message);
        self.last_error = Some(message);
    }
}
