//! Client-side submission flow shared by the login, contact, upload and
//! profile forms.
//!
//! A [`SubmissionMachine`] owns one draft, validates it on submit, runs at
//! most one operation at a time, and reports the result through injected
//! notification and navigation sinks.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use shared::{
    error::{OperationError, UnknownField, ValidationError},
    protocol::{Notice, OperationPayload},
};
use thiserror::Error;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, info, warn};

pub mod descriptor;
pub mod draft;
pub mod executor;
pub mod failure;
pub mod sinks;

pub use descriptor::{CommitPolicy, FormDescriptor, SuccessEffect};
pub use draft::{ContactDraft, Draft, LoginDraft, ProfileDraft, UploadDraft};
pub use executor::{OperationExecutor, SimulatedExecutor, SimulatedResponse};
pub use sinks::{ChannelSink, Navigator, Notifier, RecordingSink, Sinks, UiEvent};

pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    /// One-shot form accepting input.
    Idle,
    /// View/edit form showing the committed value.
    Viewing,
    Editing,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Started,
    /// An operation is already in flight; nothing new was started.
    AlreadyPending,
    /// Validation failed; the machine did not leave its current state.
    Invalid(ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: MachineState,
    },
    #[error(transparent)]
    UnknownField(#[from] UnknownField),
    #[error("form has been torn down")]
    TornDown,
    #[error("no async runtime available to run the submission")]
    NoRuntime,
}

struct Inner<D> {
    state: MachineState,
    committed: D,
    draft: Option<D>,
    /// State to fall back to when the in-flight operation fails.
    resume_state: MachineState,
    in_flight: Option<JoinHandle<()>>,
    last_payload: Option<OperationPayload>,
    torn_down: bool,
}

pub struct SubmissionMachine<D: Draft> {
    inner: Arc<Mutex<Inner<D>>>,
    descriptor: Arc<FormDescriptor<D>>,
    executor: Arc<dyn OperationExecutor<D>>,
    sinks: Sinks,
    timeout: Duration,
}

impl<D: Draft> SubmissionMachine<D> {
    pub fn new(
        descriptor: FormDescriptor<D>,
        executor: Arc<dyn OperationExecutor<D>>,
        sinks: Sinks,
    ) -> Self {
        let (state, draft) = match descriptor.commit_policy() {
            CommitPolicy::ClearDraft => (MachineState::Idle, Some(D::default())),
            CommitPolicy::CommitDraft => (MachineState::Viewing, None),
        };

        Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                committed: D::default(),
                draft,
                resume_state: state,
                in_flight: None,
                last_payload: None,
                torn_down: false,
            })),
            descriptor: Arc::new(descriptor),
            executor,
            sinks,
            timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_committed(self, committed: D) -> Self {
        self.lock().committed = committed;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn state(&self) -> MachineState {
        self.lock().state
    }

    pub fn is_pending(&self) -> bool {
        self.state() == MachineState::Pending
    }

    pub fn committed(&self) -> D {
        self.lock().committed.clone()
    }

    /// Current in-progress value, if the machine has one.
    pub fn draft(&self) -> Option<D> {
        self.lock().draft.clone()
    }

    pub fn last_payload(&self) -> Option<OperationPayload> {
        self.lock().last_payload.clone()
    }

    /// Viewing -> Editing, seeding the draft from the committed value.
    pub fn begin_edit(&self) -> Result<(), MachineError> {
        let mut inner = self.lock();
        inner.ensure_live()?;
        if inner.state != MachineState::Viewing {
            return Err(invalid("begin editing", inner.state));
        }
        inner.draft = Some(inner.committed.clone());
        inner.state = MachineState::Editing;
        debug!(form = self.name(), "editing started");
        Ok(())
    }

    /// Writes one field of the draft. No validation happens here.
    pub fn update_field(&self, key: &str, value: impl Into<String>) -> Result<(), MachineError> {
        let mut inner = self.lock();
        inner.ensure_live()?;
        let state = inner.state;
        match (state, inner.draft.as_mut()) {
            (MachineState::Idle | MachineState::Editing, Some(draft)) => {
                draft.set_field(key, value.into())?;
                Ok(())
            }
            _ => Err(invalid("update a field", state)),
        }
    }

    /// Editing -> Viewing, dropping the draft.
    pub fn cancel(&self) -> Result<(), MachineError> {
        let mut inner = self.lock();
        inner.ensure_live()?;
        if inner.state != MachineState::Editing {
            return Err(invalid("cancel", inner.state));
        }
        inner.draft = None;
        inner.state = MachineState::Viewing;
        debug!(form = self.name(), "editing cancelled");
        Ok(())
    }

    /// Replaces the draft of a one-shot form with an empty one.
    pub fn reset(&self) -> Result<(), MachineError> {
        let mut inner = self.lock();
        inner.ensure_live()?;
        if inner.state != MachineState::Idle {
            return Err(invalid("reset", inner.state));
        }
        inner.draft = Some(D::default());
        Ok(())
    }

    /// Validates the draft and, if it passes, starts the operation.
    ///
    /// Calling this while an operation is pending starts nothing and returns
    /// [`SubmitOutcome::AlreadyPending`].
    pub fn submit(&self) -> Result<SubmitOutcome, MachineError> {
        let mut inner = self.lock();
        inner.ensure_live()?;

        let state = inner.state;
        let snapshot = match (state, inner.draft.as_ref()) {
            (MachineState::Pending, _) => {
                debug!(form = self.name(), "submit ignored; operation already pending");
                return Ok(SubmitOutcome::AlreadyPending);
            }
            (MachineState::Idle | MachineState::Editing, Some(draft)) => draft.clone(),
            _ => return Err(invalid("submit", state)),
        };

        if let Err(err) = self.descriptor.validate(&snapshot) {
            debug!(form = self.name(), %err, "submission failed validation");
            return Ok(SubmitOutcome::Invalid(err));
        }

        let runtime = Handle::try_current().map_err(|_| MachineError::NoRuntime)?;

        inner.resume_state = state;
        inner.state = MachineState::Pending;
        inner.last_payload = None;

        let resolver = Resolver {
            inner: Arc::clone(&self.inner),
            descriptor: Arc::clone(&self.descriptor),
            sinks: self.sinks.clone(),
        };
        let executor = Arc::clone(&self.executor);
        let timeout = self.timeout;

        inner.in_flight = Some(runtime.spawn(async move {
            let result = match tokio::time::timeout(timeout, executor.execute(&snapshot)).await {
                Ok(result) => result,
                Err(_) => Err(OperationError::Timeout(timeout_millis(timeout))),
            };
            resolver.resolve(result);
        }));

        info!(form = self.name(), "submission started");
        Ok(SubmitOutcome::Started)
    }

    /// Waits for the in-flight operation, if any, to resolve.
    pub async fn settle(&self) -> MachineState {
        let handle = self.lock().in_flight.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    warn!(form = self.name(), %err, "submission task failed");
                }
            }
        }
        self.state()
    }

    /// Abandons the form. An in-flight operation is aborted and will not
    /// notify, navigate, or touch the draft. A sink call that is already
    /// running on another thread is allowed to finish.
    pub fn teardown(&self) {
        let mut inner = self.lock();
        if inner.torn_down {
            return;
        }
        inner.torn_down = true;
        if let Some(handle) = inner.in_flight.take() {
            handle.abort();
            debug!(form = self.name(), "in-flight submission abandoned");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<D>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D: Draft> Drop for SubmissionMachine<D> {
    fn drop(&mut self) {
        self.teardown();
    }
}

struct Resolver<D> {
    inner: Arc<Mutex<Inner<D>>>,
    descriptor: Arc<FormDescriptor<D>>,
    sinks: Sinks,
}

impl<D: Draft> Resolver<D> {
    fn resolve(self, result: Result<OperationPayload, OperationError>) {
        let notice = {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if inner.torn_down || inner.state != MachineState::Pending {
                debug!(
                    form = self.descriptor.name,
                    "discarding resolution of abandoned submission"
                );
                return;
            }
            inner.in_flight = None;

            match result {
                Ok(payload) => {
                    match self.descriptor.commit_policy() {
                        CommitPolicy::ClearDraft => {
                            inner.draft = Some(D::default());
                            inner.state = MachineState::Idle;
                        }
                        CommitPolicy::CommitDraft => {
                            if let Some(draft) = inner.draft.take() {
                                inner.committed = draft;
                            }
                            inner.state = MachineState::Viewing;
                        }
                    }
                    inner.last_payload = Some(payload);
                    info!(form = self.descriptor.name, "submission succeeded");
                    Ok(self.descriptor.on_success.notice.clone())
                }
                Err(err) => {
                    inner.state = inner.resume_state;
                    warn!(form = self.descriptor.name, %err, "submission failed");
                    Err(Notice::error(
                        self.descriptor.failure_title,
                        failure::describe(&err),
                    ))
                }
            }
        };

        // Sinks run unlocked; each call re-checks for a teardown that landed
        // in between.
        let (notice, route) = match notice {
            Ok(notice) => (notice, self.descriptor.on_success.navigate),
            Err(notice) => (notice, None),
        };
        if !self.is_live() {
            return;
        }
        self.sinks.notifier.notify(notice);
        if let Some(route) = route {
            if self.is_live() {
                self.sinks.navigator.navigate_to(route);
            }
        }
    }

    fn is_live(&self) -> bool {
        !self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .torn_down
    }
}

impl<D> Inner<D> {
    fn ensure_live(&self) -> Result<(), MachineError> {
        if self.torn_down {
            Err(MachineError::TornDown)
        } else {
            Ok(())
        }
    }
}

pub(crate) fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

fn invalid(action: &'static str, state: MachineState) -> MachineError {
    MachineError::InvalidTransition { action, state }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
