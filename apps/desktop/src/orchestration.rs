//! Wires CLI commands to report queries and form machines.

use std::{path::Path, sync::Arc};

use anyhow::{bail, Result};
use client_core::{
    descriptor, ChannelSink, ContactDraft, Draft, LoginDraft, MachineState, ProfileDraft,
    SimulatedExecutor, Sinks, SubmissionMachine, SubmitOutcome, UiEvent, UploadDraft,
};
use crossbeam_channel::Receiver;
use records::{
    is_category_option, is_status_option, option_keys, FilterState, JsonFileRecordSource,
    RecordSource, ReportBoard, StaticRecordSource, CATEGORY_OPTIONS, STATUS_OPTIONS,
};
use shared::{
    domain::Report,
    error::ValidationError,
    protocol::OperationPayload,
};
use tracing::debug;

use crate::{
    cli::{parse_assignment, Command},
    config::Settings,
    render,
};

const UI_EVENT_QUEUE: usize = 64;

#[derive(Debug)]
pub enum FormOutcome {
    Invalid(ValidationError),
    Cancelled,
    Resolved {
        state: MachineState,
        events: Vec<UiEvent>,
        payload: Option<OperationPayload>,
    },
}

impl FormOutcome {
    /// Judged from the settled machine, not from the events that reached
    /// the queue; a full queue may have dropped some of them.
    pub fn succeeded(&self) -> bool {
        match self {
            FormOutcome::Invalid(_) => false,
            FormOutcome::Cancelled => true,
            FormOutcome::Resolved { state, payload, .. } => {
                *state != MachineState::Pending && payload.is_some()
            }
        }
    }
}

/// One console session: settings plus the UI event queue every form reports to.
pub struct Session {
    settings: Settings,
    sink: ChannelSink,
    events: Receiver<UiEvent>,
    json: bool,
}

impl Session {
    pub fn new(settings: Settings, json: bool) -> Self {
        let (tx, events) = crossbeam_channel::bounded(UI_EVENT_QUEUE);
        Self {
            settings,
            sink: ChannelSink::new(tx),
            events,
            json,
        }
    }

    fn sinks(&self) -> Sinks {
        Sinks::new(Arc::new(self.sink.clone()), Arc::new(self.sink.clone()))
    }

    pub fn drain_events(&self) -> Vec<UiEvent> {
        self.events.try_iter().collect()
    }

    pub fn login_form(&self) -> SubmissionMachine<LoginDraft> {
        SubmissionMachine::new(
            descriptor::login(),
            Arc::new(SimulatedExecutor::succeeding(self.settings.login_latency())),
            self.sinks(),
        )
        .with_timeout(self.settings.operation_timeout())
    }

    pub fn contact_form(&self) -> SubmissionMachine<ContactDraft> {
        SubmissionMachine::new(
            descriptor::contact(),
            Arc::new(SimulatedExecutor::succeeding(self.settings.contact_latency())),
            self.sinks(),
        )
        .with_timeout(self.settings.operation_timeout())
    }

    pub fn upload_form(&self) -> SubmissionMachine<UploadDraft> {
        SubmissionMachine::new(
            descriptor::upload(),
            Arc::new(SimulatedExecutor::with_receipt(self.settings.upload_latency())),
            self.sinks(),
        )
        .with_timeout(self.settings.operation_timeout())
    }

    pub fn profile_form(&self) -> SubmissionMachine<ProfileDraft> {
        SubmissionMachine::new(
            descriptor::profile(),
            Arc::new(SimulatedExecutor::succeeding(self.settings.profile_latency())),
            self.sinks(),
        )
        .with_committed(ProfileDraft::sample())
        .with_timeout(self.settings.operation_timeout())
    }

    /// `--source` wins over the configured path; otherwise the built-in catalog.
    pub async fn load_reports(&self, source: Option<&Path>) -> Result<Vec<Report>> {
        let path = source.or(self.settings.reports_path.as_deref());
        match path {
            Some(path) => JsonFileRecordSource::new(path).load().await,
            None => StaticRecordSource::mock_catalog().load().await,
        }
    }
}

/// Types each non-empty value into the form, submits, and waits for the result.
pub async fn fill_and_submit<D: Draft>(
    session: &Session,
    machine: &SubmissionMachine<D>,
    fields: &[(&str, &str)],
) -> Result<FormOutcome> {
    for (key, value) in fields {
        if !value.is_empty() {
            machine.update_field(key, *value)?;
        }
    }

    match machine.submit()? {
        SubmitOutcome::Invalid(err) => Ok(FormOutcome::Invalid(err)),
        SubmitOutcome::Started | SubmitOutcome::AlreadyPending => {
            let state = machine.settle().await;
            Ok(FormOutcome::Resolved {
                state,
                events: session.drain_events(),
                payload: machine.last_payload(),
            })
        }
    }
}

pub async fn edit_profile(
    session: &Session,
    assignments: &[String],
    cancel: bool,
) -> Result<(FormOutcome, ProfileDraft)> {
    let machine = session.profile_form();
    machine.begin_edit()?;
    for raw in assignments {
        let (key, value) = parse_assignment(raw)?;
        machine.update_field(key, value)?;
    }

    if cancel {
        machine.cancel()?;
        return Ok((FormOutcome::Cancelled, machine.committed()));
    }

    let outcome = match machine.submit()? {
        SubmitOutcome::Invalid(err) => FormOutcome::Invalid(err),
        SubmitOutcome::Started | SubmitOutcome::AlreadyPending => {
            let state = machine.settle().await;
            FormOutcome::Resolved {
                state,
                events: session.drain_events(),
                payload: machine.last_payload(),
            }
        }
    };
    Ok((outcome, machine.committed()))
}

/// Rejects status and type values the reports page does not offer.
pub fn checked_filters(search: String, status: String, category: String) -> Result<FilterState> {
    if !is_status_option(&status) {
        bail!(
            "unknown status '{status}'; expected one of: {}",
            option_keys(&STATUS_OPTIONS)
        );
    }
    if !is_category_option(&category) {
        bail!(
            "unknown report type '{category}'; expected one of: {}",
            option_keys(&CATEGORY_OPTIONS)
        );
    }
    Ok(FilterState {
        search,
        status,
        category,
    })
}

/// Runs one command; `Ok(false)` means the command completed but did not succeed.
pub async fn dispatch(session: &Session, command: Command) -> Result<bool> {
    debug!(command = command.name(), "dispatching console command");
    let json = session.json;

    match command {
        Command::Reports {
            search,
            status,
            category,
            source,
        } => {
            let filters = checked_filters(search, status, category)?;
            let mut board = ReportBoard::new(session.load_reports(source.as_deref()).await?);
            board.set_filters(filters);
            render::reports(&board.outcome(), json)?;
            Ok(true)
        }
        Command::Summary { source } => {
            let board = ReportBoard::new(session.load_reports(source.as_deref()).await?);
            render::summary(&board.summary(), json)?;
            Ok(true)
        }
        Command::Login(args) => {
            let machine = session.login_form();
            let outcome = fill_and_submit(session, &machine, &args.fields()).await?;
            render::form_outcome(machine.name(), &outcome, json)?;
            Ok(outcome.succeeded())
        }
        Command::Contact(args) => {
            let machine = session.contact_form();
            let outcome = fill_and_submit(session, &machine, &args.fields()).await?;
            render::form_outcome(machine.name(), &outcome, json)?;
            Ok(outcome.succeeded())
        }
        Command::Upload(args) => {
            let machine = session.upload_form();
            let outcome = fill_and_submit(session, &machine, &args.fields()).await?;
            render::form_outcome(machine.name(), &outcome, json)?;
            Ok(outcome.succeeded())
        }
        Command::Profile { set, cancel } => {
            let (outcome, profile) = edit_profile(session, &set, cancel).await?;
            render::form_outcome("profile", &outcome, json)?;
            render::profile(&profile, json)?;
            Ok(outcome.succeeded())
        }
    }
}

#[cfg(test)]
#[path = "tests/orchestration_tests.rs"]
mod tests;
