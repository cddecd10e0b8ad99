use super::*;
use async_trait::async_trait;
use shared::{
    error::FieldProblem,
    protocol::{NoticeKind, Route},
};
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        OnceLock, Weak,
    },
};

const LATENCY: Duration = Duration::from_millis(1500);

struct ScriptedExecutor {
    latency: Duration,
    responses: Mutex<VecDeque<Result<OperationPayload, OperationError>>>,
    calls: AtomicUsize,
}

impl ScriptedExecutor {
    fn new(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            responses: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn then(self: Arc<Self>, response: Result<OperationPayload, OperationError>) -> Arc<Self> {
        self.responses.lock().expect("responses").push_back(response);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<D: Sync> OperationExecutor<D> for ScriptedExecutor {
    async fn execute(&self, _draft: &D) -> Result<OperationPayload, OperationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        let next = self.responses.lock().expect("responses").pop_front();
        next.unwrap_or(Ok(OperationPayload::None))
    }
}

fn login_machine(
    executor: Arc<ScriptedExecutor>,
    sink: &Arc<RecordingSink>,
) -> SubmissionMachine<LoginDraft> {
    SubmissionMachine::new(descriptor::login(), executor, sink.sinks())
}

fn profile_machine(
    executor: Arc<ScriptedExecutor>,
    sink: &Arc<RecordingSink>,
) -> SubmissionMachine<ProfileDraft> {
    SubmissionMachine::new(descriptor::profile(), executor, sink.sinks())
        .with_committed(ProfileDraft::sample())
}

fn fill_login(machine: &SubmissionMachine<LoginDraft>) {
    machine
        .update_field("email", "sarah.johnson@hospital.com")
        .expect("email");
    machine.update_field("password", "hunter2").expect("password");
}

#[tokio::test(start_paused = true)]
async fn login_success_clears_draft_notifies_once_and_navigates() {
    let executor = ScriptedExecutor::new(LATENCY);
    let sink = RecordingSink::new();
    let machine = login_machine(executor.clone(), &sink);
    fill_login(&machine);

    assert_eq!(machine.submit().expect("submit"), SubmitOutcome::Started);
    assert_eq!(machine.state(), MachineState::Pending);

    assert_eq!(machine.settle().await, MachineState::Idle);
    assert_eq!(machine.draft(), Some(LoginDraft::default()));
    assert_eq!(executor.calls(), 1);

    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Success);
    assert_eq!(notices[0].title, "Login Successful");
    assert_eq!(sink.routes(), vec![Route::Dashboard]);
}

#[tokio::test(start_paused = true)]
async fn missing_required_field_fails_synchronously_without_pending() {
    let executor = ScriptedExecutor::new(LATENCY);
    let sink = RecordingSink::new();
    let machine = login_machine(executor.clone(), &sink);
    machine.update_field("email", "a@b.c").expect("email");

    let outcome = machine.submit().expect("submit");
    let err = match outcome {
        SubmitOutcome::Invalid(err) => err,
        other => panic!("expected validation failure, got {other:?}"),
    };
    assert_eq!(err.missing().collect::<Vec<_>>(), vec!["password"]);
    assert_eq!(machine.state(), MachineState::Idle);
    assert_eq!(machine.draft().expect("draft").email, "a@b.c");

    machine.settle().await;
    assert_eq!(executor.calls(), 0);
    assert!(sink.notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn whitespace_only_counts_as_missing() {
    let sink = RecordingSink::new();
    let machine = login_machine(ScriptedExecutor::new(LATENCY), &sink);
    machine.update_field("email", "   ").expect("email");
    machine.update_field("password", "pw").expect("password");

    let outcome = machine.submit().expect("submit");
    assert!(matches!(outcome, SubmitOutcome::Invalid(ref e) if e.missing().eq(["email"])));
}

#[tokio::test(start_paused = true)]
async fn repeated_submit_while_pending_runs_one_operation() {
    let executor = ScriptedExecutor::new(LATENCY);
    let sink = RecordingSink::new();
    let machine = login_machine(executor.clone(), &sink);
    fill_login(&machine);

    assert_eq!(machine.submit().expect("first"), SubmitOutcome::Started);
    assert_eq!(machine.submit().expect("second"), SubmitOutcome::AlreadyPending);
    assert_eq!(machine.submit().expect("third"), SubmitOutcome::AlreadyPending);

    machine.settle().await;
    assert_eq!(executor.calls(), 1);
    assert_eq!(sink.notices().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn edits_are_rejected_while_pending() {
    let sink = RecordingSink::new();
    let machine = login_machine(ScriptedExecutor::new(LATENCY), &sink);
    fill_login(&machine);
    machine.submit().expect("submit");

    let err = machine.update_field("email", "x").expect_err("pending");
    assert_eq!(
        err,
        MachineError::InvalidTransition {
            action: "update a field",
            state: MachineState::Pending,
        }
    );
    machine.settle().await;
}

#[tokio::test(start_paused = true)]
async fn cancel_restores_value_from_begin_edit() {
    let sink = RecordingSink::new();
    let machine = profile_machine(ScriptedExecutor::new(LATENCY), &sink);
    assert_eq!(machine.state(), MachineState::Viewing);
    assert_eq!(machine.draft(), None);

    machine.begin_edit().expect("edit");
    machine.update_field("hospital", "General").expect("hospital");
    machine.update_field("bio", "").expect("bio");
    assert_eq!(machine.draft().expect("draft").hospital, "General");

    machine.cancel().expect("cancel");
    assert_eq!(machine.state(), MachineState::Viewing);
    assert_eq!(machine.draft(), None);
    assert_eq!(machine.committed(), ProfileDraft::sample());

    machine.begin_edit().expect("edit again");
    assert_eq!(machine.draft(), Some(ProfileDraft::sample()));
    assert!(sink.notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn profile_save_commits_draft() {
    let sink = RecordingSink::new();
    let machine = profile_machine(ScriptedExecutor::new(LATENCY), &sink);
    machine.begin_edit().expect("edit");
    machine.update_field("location", "Boston, MA").expect("location");

    assert_eq!(machine.submit().expect("submit"), SubmitOutcome::Started);
    assert_eq!(machine.committed().location, "New York, NY");

    assert_eq!(machine.settle().await, MachineState::Viewing);
    assert_eq!(machine.committed().location, "Boston, MA");
    assert_eq!(machine.draft(), None);
    assert_eq!(sink.notices()[0].title, "Profile Updated");
    assert!(sink.routes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn profile_requires_edit_mode_for_changes() {
    let sink = RecordingSink::new();
    let machine = profile_machine(ScriptedExecutor::new(LATENCY), &sink);

    assert!(matches!(
        machine.update_field("bio", "x"),
        Err(MachineError::InvalidTransition { .. })
    ));
    assert!(matches!(
        machine.submit(),
        Err(MachineError::InvalidTransition { .. })
    ));
    assert!(matches!(
        machine.cancel(),
        Err(MachineError::InvalidTransition { .. })
    ));

    machine.begin_edit().expect("edit");
    assert!(matches!(
        machine.begin_edit(),
        Err(MachineError::InvalidTransition { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn unknown_field_is_reported() {
    let sink = RecordingSink::new();
    let machine = login_machine(ScriptedExecutor::new(LATENCY), &sink);
    let err = machine.update_field("remember", "yes").expect_err("unknown");
    assert_eq!(err, MachineError::UnknownField(UnknownField("remember".into())));
}

#[tokio::test(start_paused = true)]
async fn failure_keeps_draft_and_returns_to_editing() {
    let executor = ScriptedExecutor::new(LATENCY)
        .then(Err(OperationError::Transport("connection refused".into())));
    let sink = RecordingSink::new();
    let machine = profile_machine(executor, &sink);
    machine.begin_edit().expect("edit");
    machine.update_field("phone", "555-0000").expect("phone");
    machine.submit().expect("submit");

    assert_eq!(machine.settle().await, MachineState::Editing);
    assert_eq!(machine.draft().expect("draft").phone, "555-0000");
    assert_eq!(machine.committed(), ProfileDraft::sample());

    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Error);
    assert_eq!(notices[0].title, "Profile Not Saved");
    assert!(notices[0].description.contains("Server unreachable"));
}

#[tokio::test(start_paused = true)]
async fn retry_after_failure_is_a_new_submit() {
    let executor = ScriptedExecutor::new(LATENCY)
        .then(Err(OperationError::Rejected("invalid credentials".into())))
        .then(Ok(OperationPayload::None));
    let sink = RecordingSink::new();
    let machine = login_machine(executor.clone(), &sink);
    fill_login(&machine);

    machine.submit().expect("first");
    assert_eq!(machine.settle().await, MachineState::Idle);
    assert_eq!(machine.draft().expect("draft").password, "hunter2");
    assert!(sink.routes().is_empty());
    assert_eq!(executor.calls(), 1);

    machine.submit().expect("retry");
    machine.settle().await;
    assert_eq!(executor.calls(), 2);
    assert_eq!(sink.routes(), vec![Route::Dashboard]);

    let kinds: Vec<_> = sink.notices().iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NoticeKind::Error, NoticeKind::Success]);
}

#[tokio::test(start_paused = true)]
async fn slow_operation_times_out_into_failure() {
    let sink = RecordingSink::new();
    let machine = login_machine(ScriptedExecutor::new(Duration::from_secs(60)), &sink)
        .with_timeout(Duration::from_secs(5));
    fill_login(&machine);
    machine.submit().expect("submit");

    assert_eq!(machine.settle().await, MachineState::Idle);
    assert_eq!(machine.draft().expect("draft").email, "sarah.johnson@hospital.com");

    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Login Failed");
    assert!(notices[0].description.contains("took too long"));
}

#[tokio::test(start_paused = true)]
async fn teardown_suppresses_late_resolution() {
    let executor = ScriptedExecutor::new(LATENCY);
    let sink = RecordingSink::new();
    let machine = login_machine(executor.clone(), &sink);
    fill_login(&machine);
    machine.submit().expect("submit");

    machine.teardown();
    tokio::time::sleep(LATENCY * 2).await;

    assert!(sink.notices().is_empty());
    assert!(sink.routes().is_empty());
    assert_eq!(machine.submit(), Err(MachineError::TornDown));
}

/// Tears the form down from inside the success notice, the way a UI closing
/// on another thread would.
struct TearingDownNotifier {
    machine: OnceLock<Weak<SubmissionMachine<LoginDraft>>>,
    notices: AtomicUsize,
}

impl Notifier for TearingDownNotifier {
    fn notify(&self, _notice: Notice) {
        self.notices.fetch_add(1, Ordering::SeqCst);
        if let Some(machine) = self.machine.get().and_then(Weak::upgrade) {
            machine.teardown();
        }
    }
}

#[tokio::test(start_paused = true)]
async fn teardown_during_resolution_stops_later_effects() {
    let notifier = Arc::new(TearingDownNotifier {
        machine: OnceLock::new(),
        notices: AtomicUsize::new(0),
    });
    let recorder = RecordingSink::new();
    let machine = Arc::new(SubmissionMachine::new(
        descriptor::login(),
        ScriptedExecutor::new(LATENCY),
        Sinks::new(notifier.clone(), recorder.clone()),
    ));
    let _ = notifier.machine.set(Arc::downgrade(&machine));
    fill_login(&machine);

    machine.submit().expect("submit");
    tokio::time::sleep(LATENCY * 2).await;

    assert_eq!(notifier.notices.load(Ordering::SeqCst), 1);
    assert!(recorder.routes().is_empty());
    assert_eq!(machine.submit(), Err(MachineError::TornDown));
}

#[tokio::test(start_paused = true)]
async fn dropping_a_pending_form_abandons_it() {
    let sink = RecordingSink::new();
    {
        let machine = login_machine(ScriptedExecutor::new(LATENCY), &sink);
        fill_login(&machine);
        machine.submit().expect("submit");
    }
    tokio::time::sleep(LATENCY * 2).await;
    assert!(sink.notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn upload_checks_scan_format_and_returns_receipt() {
    let sink = RecordingSink::new();
    let machine = SubmissionMachine::new(
        descriptor::upload(),
        Arc::new(SimulatedExecutor::with_receipt(Duration::from_secs(3))),
        sink.sinks(),
    );
    for (key, value) in [
        ("scan_file", "chest.bmp"),
        ("patient_name", "John Smith"),
        ("patient_id", "PT001"),
    ] {
        machine.update_field(key, value).expect("field");
    }

    let outcome = machine.submit().expect("submit");
    let err = match outcome {
        SubmitOutcome::Invalid(err) => err,
        other => panic!("expected validation failure, got {other:?}"),
    };
    assert_eq!(
        err.problem_for("scan_file"),
        Some(FieldProblem::UnsupportedFormat)
    );
    assert_eq!(machine.state(), MachineState::Idle);

    machine.update_field("scan_file", "chest.DCM").expect("file");
    assert_eq!(machine.submit().expect("submit"), SubmitOutcome::Started);
    machine.settle().await;

    assert!(matches!(
        machine.last_payload(),
        Some(OperationPayload::UploadReceipt { .. })
    ));
    assert_eq!(machine.draft(), Some(UploadDraft::default()));
    assert_eq!(sink.notices()[0].title, "Upload Successful");
}

#[test]
fn optional_form_fields_may_stay_blank() {
    let mut contact = ContactDraft::default();
    for (key, value) in [
        ("first_name", "Ada"),
        ("last_name", "Lovelace"),
        ("email", "ada@example.com"),
        ("subject", "Pilot"),
        ("message", "Interested in a demo."),
    ] {
        contact.set_field(key, value.into()).expect("field");
    }
    assert_eq!(descriptor::contact().validate(&contact), Ok(()));

    let mut upload = UploadDraft::default();
    for (key, value) in [
        ("scan_file", "spine.png"),
        ("patient_name", "Emma Brown"),
        ("patient_id", "PT004"),
    ] {
        upload.set_field(key, value.into()).expect("field");
    }
    assert_eq!(descriptor::upload().validate(&upload), Ok(()));
}

#[tokio::test(start_paused = true)]
async fn contact_form_reset_discards_input() {
    let sink = RecordingSink::new();
    let machine = SubmissionMachine::new(
        descriptor::contact(),
        Arc::new(SimulatedExecutor::succeeding(Duration::from_secs(2))),
        sink.sinks(),
    );
    machine.update_field("subject", "Demo").expect("subject");
    machine.reset().expect("reset");
    assert_eq!(machine.draft(), Some(ContactDraft::default()));
}

#[tokio::test(start_paused = true)]
async fn independent_machines_do_not_share_state() {
    let sink = RecordingSink::new();
    let first = login_machine(ScriptedExecutor::new(LATENCY), &sink);
    let second = login_machine(ScriptedExecutor::new(LATENCY * 2), &sink);
    fill_login(&first);
    fill_login(&second);

    first.submit().expect("first");
    assert_eq!(second.state(), MachineState::Idle);
    assert_eq!(second.submit().expect("second"), SubmitOutcome::Started);

    assert_eq!(first.settle().await, MachineState::Idle);
    assert_eq!(second.state(), MachineState::Pending);
    second.settle().await;
    assert_eq!(sink.notices().len(), 2);
}

#[test]
fn submit_without_runtime_is_an_error() {
    let sink = RecordingSink::new();
    let machine = login_machine(ScriptedExecutor::new(LATENCY), &sink);
    fill_login(&machine);
    assert_eq!(machine.submit(), Err(MachineError::NoRuntime));
    assert_eq!(machine.state(), MachineState::Idle);
}

#[test]
fn channel_sink_forwards_events() {
    let (tx, rx) = crossbeam_channel::bounded(4);
    let sink = ChannelSink::new(tx);
    sink.notify(Notice::success("ok", "done"));
    sink.navigate_to(Route::Reports);

    assert_eq!(
        rx.try_recv().expect("notice"),
        UiEvent::Notice(Notice::success("ok", "done"))
    );
    assert_eq!(rx.try_recv().expect("route"), UiEvent::Navigate(Route::Reports));
}

#[test]
fn channel_sink_drops_events_when_full() {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let sink = ChannelSink::new(tx);
    sink.navigate_to(Route::Reports);
    sink.navigate_to(Route::Profile);
    assert_eq!(rx.len(), 1);
}

#[test]
fn timeout_millis_saturate() {
    assert_eq!(timeout_millis(Duration::from_millis(1500)), 1500);
    assert_eq!(timeout_millis(Duration::MAX), u64::MAX);
}

#[test]
fn failures_are_classified() {
    use crate::failure::{classify, FailureCategory};

    assert_eq!(
        classify(&OperationError::Timeout(10)),
        FailureCategory::Timeout
    );
    assert_eq!(
        classify(&OperationError::Rejected("401 Unauthorized".into())),
        FailureCategory::Auth
    );
    assert_eq!(
        classify(&OperationError::Rejected("missing patient id".into())),
        FailureCategory::Validation
    );
    assert_eq!(
        classify(&OperationError::Rejected("service unavailable".into())),
        FailureCategory::Transport
    );
    assert_eq!(
        classify(&OperationError::Rejected("quota exceeded".into())),
        FailureCategory::Unknown
    );
}

#[test]
fn draft_fields_are_listed_in_order() {
    assert_eq!(LoginDraft::FIELDS, &["email", "password"]);
    assert_eq!(UploadDraft::FIELDS[0], "scan_file");
    let mut draft = ContactDraft::default();
    draft.set_field("message", "hi".into()).expect("message");
    assert_eq!(draft.field("message"), Some("hi"));
    assert_eq!(draft.field("nope"), None);
}
