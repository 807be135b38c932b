//! Submission state machine
//!
//! `Idle -> Submitting -> {Success | RateLimited | NetworkFallback | Error}`.
//! Validation runs first and never consumes a rate-limit attempt. A failed
//! primary delivery is not retried; the payload is handed to the native form
//! fallback instead.

use super::fallback::{FallbackSubmitter, NativeFormPost};
use super::form::SubmissionForm;
use super::payload::FormPayload;
use super::transport::{Transport, TransportError};
use crate::metrics::SubmissionMetrics;
use crate::rate_limit::{RateLimiter, RATE_LIMIT_MESSAGE};
use crate::validation::ValidationResult;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Success,
    RateLimited,
    NetworkFallback,
    Error,
}

/// How an accepted submission left the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    Primary,
    Fallback,
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("submission failed validation")]
    Validation(ValidationResult),

    #[error("{0}")]
    RateLimited(String),

    #[error("a submission is already in progress")]
    InFlight,

    #[error("delivery failed: {0}")]
    Delivery(TransportError),
}

pub struct SubmissionOrchestrator {
    transport: Arc<dyn Transport>,
    fallback: Arc<dyn FallbackSubmitter>,
    rate_limiter: RateLimiter,
    fallback_action: String,
    metrics: SubmissionMetrics,
    state: Mutex<SubmissionState>,
}

impl SubmissionOrchestrator {
    pub fn new(
        transport: Arc<dyn Transport>,
        fallback: Arc<dyn FallbackSubmitter>,
        rate_limiter: RateLimiter,
        fallback_action: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            fallback,
            rate_limiter,
            fallback_action: fallback_action.into(),
            metrics: SubmissionMetrics::new(),
            state: Mutex::new(SubmissionState::Idle),
        }
    }

    pub fn with_metrics(mut self, metrics: SubmissionMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn state(&self) -> SubmissionState {
        *self.state.lock()
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Validates, rate-limits and delivers `form`. On primary success the
    /// form's values are cleared.
    pub async fn submit<F>(&self, form: &mut F) -> Result<Delivery, SubmitError>
    where
        F: SubmissionForm + ?Sized,
    {
        let submission_id = Uuid::new_v4();

        let fields = match form.sanitized_fields() {
            Ok(fields) => fields,
            Err(result) => {
                debug!(
                    %submission_id,
                    form = form.form_name(),
                    fields = ?result.errors.keys().collect::<Vec<_>>(),
                    "submission failed validation"
                );
                self.metrics.record_invalid();
                return Err(SubmitError::Validation(result));
            }
        };

        self.begin(submission_id)?;

        let payload = FormPayload::new(form.form_name(), fields);

        match self.transport.deliver(&payload).await {
            Ok(status) if (200..300).contains(&status) => {
                self.set_state(SubmissionState::Success);
                form.clear();
                self.metrics.record_delivered();
                info!(%submission_id, form = payload.form_name(), status, "form delivered");
                Ok(Delivery::Primary)
            }
            Ok(status) => self.fall_back(submission_id, &payload, TransportError::Status(status)),
            Err(err) => self.fall_back(submission_id, &payload, err),
        }
    }

    /// Moves to `Submitting` unless another submission is in flight or the
    /// rate limiter refuses. The limiter's read-modify-write happens under
    /// the state lock.
    fn begin(&self, submission_id: Uuid) -> Result<(), SubmitError> {
        let mut state = self.state.lock();

        if *state == SubmissionState::Submitting {
            warn!(%submission_id, "rejecting overlapping submission");
            return Err(SubmitError::InFlight);
        }

        if !self.rate_limiter.check() {
            *state = SubmissionState::RateLimited;
            self.metrics.record_rate_limited();
            return Err(SubmitError::RateLimited(RATE_LIMIT_MESSAGE.to_string()));
        }

        *state = SubmissionState::Submitting;
        Ok(())
    }

    fn fall_back(
        &self,
        submission_id: Uuid,
        payload: &FormPayload,
        cause: TransportError,
    ) -> Result<Delivery, SubmitError> {
        warn!(%submission_id, form = payload.form_name(), error = %cause, "primary delivery failed, falling back to native form post");

        let post = NativeFormPost::from_payload(&self.fallback_action, payload);
        match self.fallback.submit_native(post) {
            Ok(()) => {
                self.set_state(SubmissionState::NetworkFallback);
                self.metrics.record_fallback();
                Ok(Delivery::Fallback)
            }
            Err(err) => {
                self.set_state(SubmissionState::Error);
                self.metrics.record_failed();
                warn!(%submission_id, error = %err, "native form fallback could not be dispatched");
                Err(SubmitError::Delivery(err))
            }
        }
    }

    fn set_state(&self, next: SubmissionState) {
        *self.state.lock() = next;
    }
}
