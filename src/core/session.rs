//! Interactive curation session.
//!
//! State machine:
//!
//! ```text
//! FetchingForms → AwaitingForm ⇄ PresentingForm ⇄ PresentingCandidate
//!                      ↓
//!                    Done
//! ```
//!
//! - `start` fetches forms and drops those already finished or declined
//! - `next_form` collects candidates for the next open form, sorted by
//!   word count; forms without candidates are passed over and stay open
//! - `next_candidate` presents the next candidate of the current form
//! - `decide` applies the operator's choice: accept uploads and finishes
//!   the form, skip moves on, decline closes the form
//!
//! Nothing is written until a terminal decision, so stopping at any point
//! loses no state.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::aggregator::{AggregateError, SourceAggregator};
use super::decision_store::{DecisionStore, DecisionStoreError, RecordResult};
use crate::collaborators::{
    FormProvider, FormProviderError, UploadError, UploadOutcome, UsageExampleUploader,
};
use crate::domain::{Candidate, Form, LanguageCode, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    FetchingForms,
    /// Between forms
    AwaitingForm,
    /// A form is current; no candidate shown yet
    PresentingForm,
    PresentingCandidate,
    Done,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::FetchingForms => "fetching forms",
            SessionState::AwaitingForm => "awaiting form",
            SessionState::PresentingForm => "presenting form",
            SessionState::PresentingCandidate => "presenting candidate",
            SessionState::Done => "done",
        };
        f.write_str(label)
    }
}

/// Operator choice for the current candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Use this candidate as the form's usage example
    Accept,

    /// Pass over this candidate only
    Skip,

    /// Never work on this form again
    DeclineForm,
}

/// What a decision led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionResult {
    /// Uploaded; the form is finished
    Finished,

    /// The uploader found no fitting sense; treated as a skip
    NoFittingSense,

    Skipped,

    Declined,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },

    #[error("Failed to fetch forms: {0}")]
    Forms(#[from] FormProviderError),

    #[error("Decision store error: {0}")]
    Store(#[from] DecisionStoreError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// Retryable: the current candidate stays selected
    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),
}

impl SessionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Upload(_))
    }
}

/// Counters for one session run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub forms_fetched: usize,
    pub already_decided: usize,
    pub without_candidates: usize,
    pub finished: usize,
    pub declined: usize,
    pub candidates_total: usize,
    pub candidates_skipped: usize,
    pub no_fitting_sense: usize,
    pub fetch_duration: Duration,
}

/// Collaborators a session needs
pub struct SessionDeps {
    pub forms: Arc<dyn FormProvider>,
    pub aggregator: Arc<SourceAggregator>,
    pub uploader: Arc<dyn UsageExampleUploader>,
    pub store: DecisionStore,
}

pub struct CurationSession {
    id: Uuid,
    language: LanguageCode,
    state: SessionState,
    pending: VecDeque<Form>,
    current_form: Option<Form>,
    candidates: VecDeque<Candidate>,
    current_candidate: Option<Candidate>,
    aggregator: Arc<SourceAggregator>,
    uploader: Arc<dyn UsageExampleUploader>,
    store: DecisionStore,
    summary: SessionSummary,
}

impl CurationSession {
    /// Fetch forms for `language` and drop the ones already decided
    #[instrument(skip(deps), fields(language = %language))]
    pub async fn start(language: LanguageCode, deps: SessionDeps) -> Result<Self, SessionError> {
        let id = Uuid::new_v4();
        let mut session = Self {
            id,
            language: language.clone(),
            state: SessionState::FetchingForms,
            pending: VecDeque::new(),
            current_form: None,
            candidates: VecDeque::new(),
            current_candidate: None,
            aggregator: deps.aggregator,
            uploader: deps.uploader,
            store: deps.store,
            summary: SessionSummary::default(),
        };

        let forms = deps.forms.fetch_forms(&language).await?;
        session.summary.forms_fetched = forms.len();

        for form in forms {
            if session.store.contains(&form.id) {
                session.summary.already_decided += 1;
            } else {
                session.pending.push_back(form);
            }
        }

        session.state = if session.pending.is_empty() {
            SessionState::Done
        } else {
            SessionState::AwaitingForm
        };

        info!(
            session = %id,
            fetched = session.summary.forms_fetched,
            already_decided = session.summary.already_decided,
            open = session.pending.len(),
            "Session started"
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_form(&self) -> Option<&Form> {
        self.current_form.as_ref()
    }

    pub fn current_candidate(&self) -> Option<&Candidate> {
        self.current_candidate.as_ref()
    }

    /// Candidates of the current form not yet presented
    pub fn remaining_candidates(&self) -> usize {
        self.candidates.len()
    }

    /// Open forms not yet presented
    pub fn remaining_forms(&self) -> usize {
        self.pending.len()
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub fn store(&self) -> &DecisionStore {
        &self.store
    }

    /// Move to the next open form that has candidates.
    ///
    /// Leaves the current form (if any) open. Returns `None` when no forms
    /// remain. Fails only when every source is unavailable, which ends the
    /// session.
    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn next_form(&mut self) -> Result<Option<Form>, SessionError> {
        if self.state == SessionState::FetchingForms {
            return Err(self.invalid("move to the next form"));
        }
        self.leave_form();

        while let Some(form) = self.pending.pop_front() {
            if self.store.contains(&form.id) {
                self.summary.already_decided += 1;
                continue;
            }

            let aggregation = match self.aggregator.collect(&form).await {
                Ok(aggregation) => aggregation,
                Err(e) => {
                    self.state = SessionState::Done;
                    return Err(e.into());
                }
            };
            self.summary.fetch_duration += aggregation.elapsed;
            for report in &aggregation.reports {
                debug!(form = %form.id, "{}", report);
            }

            if aggregation.candidates.is_empty() {
                info!(form = %form.id, "No candidates found, form stays open");
                self.summary.without_candidates += 1;
                continue;
            }

            let mut candidates = aggregation.candidates;
            // Stable sort keeps source priority among equal lengths
            candidates.sort_by_key(|c| c.word_count);
            self.summary.candidates_total += candidates.len();

            info!(form = %form.id, candidates = candidates.len(), "Presenting form");
            self.candidates = candidates.into();
            self.current_form = Some(form.clone());
            self.state = SessionState::PresentingForm;
            return Ok(Some(form));
        }

        self.state = SessionState::Done;
        info!(
            finished = self.summary.finished,
            declined = self.summary.declined,
            "No more forms"
        );
        Ok(None)
    }

    /// Present the next candidate of the current form.
    ///
    /// An undecided current candidate counts as skipped. Returns `None` when
    /// the form has no candidates left; the form then stays open.
    pub fn next_candidate(&mut self) -> Result<Option<Candidate>, SessionError> {
        match self.state {
            SessionState::PresentingForm | SessionState::PresentingCandidate => {}
            SessionState::AwaitingForm | SessionState::Done => return Ok(None),
            SessionState::FetchingForms => return Err(self.invalid("present a candidate")),
        }

        if self.current_candidate.take().is_some() {
            self.summary.candidates_skipped += 1;
        }

        match self.candidates.pop_front() {
            Some(candidate) => {
                self.current_candidate = Some(candidate.clone());
                self.state = SessionState::PresentingCandidate;
                Ok(Some(candidate))
            }
            None => {
                if let Some(form) = &self.current_form {
                    info!(form = %form.id, "All candidates skipped, form stays open");
                }
                self.leave_form();
                Ok(None)
            }
        }
    }

    /// Apply the operator's decision to the current candidate
    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn decide(&mut self, decision: Decision) -> Result<DecisionResult, SessionError> {
        if self.state != SessionState::PresentingCandidate {
            return Err(self.invalid("decide"));
        }
        let (form, candidate) = match (&self.current_form, &self.current_candidate) {
            (Some(form), Some(candidate)) => (form.clone(), candidate.clone()),
            _ => return Err(self.invalid("decide")),
        };

        match decision {
            Decision::Skip => {
                self.current_candidate = None;
                self.summary.candidates_skipped += 1;
                self.state = SessionState::PresentingForm;
                Ok(DecisionResult::Skipped)
            }
            Decision::Accept => {
                // On error the candidate stays current so the operator can retry
                let outcome = self.uploader.upload(&form, &candidate).await.map_err(|e| {
                    warn!(form = %form.id, error = %e, "Upload failed");
                    SessionError::from(e)
                })?;

                match outcome {
                    UploadOutcome::Uploaded => {
                        self.close_form(&form, Outcome::Finished).await?;
                        self.summary.finished += 1;
                        info!(form = %form.id, example = %candidate.content_id(), "Form finished");
                        Ok(DecisionResult::Finished)
                    }
                    UploadOutcome::NoFittingSense => {
                        self.current_candidate = None;
                        self.summary.no_fitting_sense += 1;
                        self.state = SessionState::PresentingForm;
                        info!(form = %form.id, "No fitting sense, candidate skipped");
                        Ok(DecisionResult::NoFittingSense)
                    }
                }
            }
            Decision::DeclineForm => {
                self.close_form(&form, Outcome::Declined).await?;
                self.summary.declined += 1;
                info!(form = %form.id, "Form declined");
                Ok(DecisionResult::Declined)
            }
        }
    }

    /// Consume the session, releasing the decision store lock
    pub fn finish(self) -> SessionSummary {
        info!(session = %self.id, summary = ?self.summary, "Session finished");
        self.summary
    }

    async fn close_form(&mut self, form: &Form, outcome: Outcome) -> Result<(), SessionError> {
        if let RecordResult::AlreadyDecided(existing) = self.store.record(&form.id, outcome).await? {
            warn!(form = %form.id, existing = existing.as_str(), "Form was already decided");
        }
        self.leave_form();
        Ok(())
    }

    fn leave_form(&mut self) {
        self.current_form = None;
        self.current_candidate = None;
        self.candidates.clear();
        self.state = if self.pending.is_empty() && self.state == SessionState::Done {
            SessionState::Done
        } else {
            SessionState::AwaitingForm
        };
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            state: self.state,
            action,
        }
    }
}
