//! Run lifecycle tracking
//!
//! [`RunLifecycleTracker`] submits a run, polls its status on a fixed
//! interval and fetches results once the run succeeds. It owns the single
//! active poller; submitting again or cancelling stops it.
//!
//! ```text
//! IDLE -> STARTING -> RUNNING <-> RUNNING -> { SUCCEEDED, FAILED, ABORTED }
//! ```
//!
//! Every transition is delivered as an immutable [`RunState`] snapshot on
//! the [`RunHandle`] returned by `submit`. Each run gets its own channel, so
//! a superseded run can never deliver events to its successor's subscriber.

mod poller;

use std::sync::Arc;
use tether_core::ProviderGateway;
use tether_core::domain::run::RunState;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{error, info};

use crate::binder::BoundInputs;
use crate::config::Config;
use crate::error::{Result, SessionError};
use poller::RunPoller;

/// Notification about the tracked run
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// A new snapshot after a status change or once results are attached
    State(RunState),

    /// Tracking stopped on a polling or result-fetch failure
    Halted(SessionError),
}

/// Coarse state of the tracker itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerPhase {
    /// Nothing submitted, or tracking was cancelled
    Idle,

    /// A poller is live
    Tracking,

    /// The last run reached a terminal status and was fully processed
    Finished,

    /// Tracking stopped on an error; the run's true status may be unknown
    Halted,
}

/// Latest known progress of a run, shared between the poller and the tracker
#[derive(Debug, Clone)]
pub(crate) struct Progress {
    pub(crate) state: RunState,
    pub(crate) halted: Option<SessionError>,
    /// Set by the poller before its last event goes out
    pub(crate) finished: bool,
}

/// Subscription to the events of one submitted run
///
/// The channel closes when tracking of the run ends for any reason.
#[derive(Debug)]
pub struct RunHandle {
    run_id: String,
    events: mpsc::UnboundedReceiver<RunEvent>,
}

impl RunHandle {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Waits for the next event, `None` once tracking has ended
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Drains all events and returns the last snapshot
    ///
    /// Fails with the halting error if tracking stopped on a failure.
    pub async fn wait(mut self) -> Result<Option<RunState>> {
        let mut last = None;
        while let Some(event) = self.events.recv().await {
            match event {
                RunEvent::State(state) => last = Some(state),
                RunEvent::Halted(err) => return Err(err),
            }
        }
        Ok(last)
    }
}

struct ActiveRun {
    run_id: String,
    task: JoinHandle<()>,
    progress: watch::Receiver<Progress>,
}

/// Submits runs and tracks them to completion, one at a time
pub struct RunLifecycleTracker {
    gateway: Arc<dyn ProviderGateway>,
    poll_interval: Duration,
    active: Option<ActiveRun>,
}

impl RunLifecycleTracker {
    pub fn new(gateway: Arc<dyn ProviderGateway>, config: &Config) -> Self {
        Self {
            gateway,
            poll_interval: config.poll_interval,
            active: None,
        }
    }

    /// Submits a run of `job_id` and starts tracking it
    ///
    /// Any run tracked so far is dropped first. On failure the tracker is
    /// left idle and no polling starts.
    pub async fn submit(&mut self, job_id: &str, inputs: &BoundInputs) -> Result<RunHandle> {
        self.cancel();

        let payload = inputs.to_payload()?;

        info!("Submitting run of {} with {} input(s)", job_id, payload.len());
        let run = self
            .gateway
            .submit_run(job_id, &payload)
            .await
            .map_err(|e| {
                error!("Failed to submit run of {}: {:#}", job_id, e);
                SessionError::submission(&e)
            })?;
        info!("Run {} started for {}", run.run_id, job_id);

        let initial = RunState::starting(run.run_id.clone());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (progress_tx, progress_rx) = watch::channel(Progress {
            state: initial.clone(),
            halted: None,
            finished: false,
        });
        let _ = events_tx.send(RunEvent::State(initial));

        let poller = RunPoller::new(
            Arc::clone(&self.gateway),
            run.run_id.clone(),
            self.poll_interval,
            progress_tx,
            events_tx,
        );
        let task = tokio::spawn(poller.run());

        self.active = Some(ActiveRun {
            run_id: run.run_id.clone(),
            task,
            progress: progress_rx,
        });

        Ok(RunHandle {
            run_id: run.run_id,
            events: events_rx,
        })
    }

    /// Stops observing the current run, if any
    ///
    /// Only local polling stops; the remote run is not aborted. Safe to
    /// call in any state.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            if !active.task.is_finished() {
                info!("Stopped tracking run {}", active.run_id);
            }
            active.task.abort();
        }
    }

    /// Latest snapshot of the current or last finished run
    pub fn current(&self) -> Option<RunState> {
        self.active
            .as_ref()
            .map(|active| active.progress.borrow().state.clone())
    }

    /// The error that halted tracking of the current run, if any
    pub fn last_error(&self) -> Option<SessionError> {
        self.active
            .as_ref()
            .and_then(|active| active.progress.borrow().halted.clone())
    }

    /// Whether a poller is live
    pub fn is_tracking(&self) -> bool {
        self.phase() == TrackerPhase::Tracking
    }

    pub fn phase(&self) -> TrackerPhase {
        let Some(active) = &self.active else {
            return TrackerPhase::Idle;
        };
        let progress = active.progress.borrow();
        if progress.halted.is_some() {
            TrackerPhase::Halted
        } else if progress.finished {
            TrackerPhase::Finished
        } else if active.task.is_finished() {
            // The poller went away without reporting an end
            TrackerPhase::Idle
        } else {
            TrackerPhase::Tracking
        }
    }
}

impl Drop for RunLifecycleTracker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::InputBinder;
    use async_trait::async_trait;
    use serde_json::{Map, Value as JsonValue, json};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tether_core::domain::job::{JobDefinition, JobSummary};
    use tether_core::domain::run::{RunInfo, RunStatus, RunStatusInfo};
    use tether_core::domain::schema::{FieldDescriptor, FieldType, InputSchema};

    /// Scripted poll response
    enum Poll {
        Status(RunStatus, Option<&'static str>),
        Fail(&'static str),
    }

    /// In-memory gateway replaying scripted responses and counting calls
    ///
    /// Runs whose script is exhausted keep reporting RUNNING.
    #[derive(Default)]
    struct ScriptedGateway {
        submissions: Mutex<VecDeque<std::result::Result<&'static str, &'static str>>>,
        polls: Mutex<HashMap<String, VecDeque<Poll>>>,
        results: Vec<JsonValue>,
        fail_results: bool,
        submitted: Mutex<Vec<(String, Map<String, JsonValue>)>>,
        poll_calls: Mutex<HashMap<String, usize>>,
        fetch_calls: AtomicUsize,
    }

    impl ScriptedGateway {
        fn accept(self, run_id: &'static str, polls: Vec<Poll>) -> Self {
            self.submissions.lock().unwrap().push_back(Ok(run_id));
            self.polls
                .lock()
                .unwrap()
                .insert(run_id.to_string(), polls.into_iter().collect());
            self
        }

        fn reject(self, message: &'static str) -> Self {
            self.submissions.lock().unwrap().push_back(Err(message));
            self
        }

        fn with_results(mut self, results: Vec<JsonValue>) -> Self {
            self.results = results;
            self
        }

        fn failing_results(mut self) -> Self {
            self.fail_results = true;
            self
        }

        fn polls_of(&self, run_id: &str) -> usize {
            self.poll_calls
                .lock()
                .unwrap()
                .get(run_id)
                .copied()
                .unwrap_or(0)
        }

        fn fetches(&self) -> usize {
            self.fetch_calls.load(Ordering::SeqCst)
        }

        fn submitted(&self) -> Vec<(String, Map<String, JsonValue>)> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProviderGateway for ScriptedGateway {
        async fn list_job_definitions(&self) -> anyhow::Result<Vec<JobSummary>> {
            Ok(Vec::new())
        }

        async fn get_job_definition(&self, job_id: &str) -> anyhow::Result<JobDefinition> {
            anyhow::bail!("unknown job {}", job_id)
        }

        async fn submit_run(
            &self,
            job_id: &str,
            input: &Map<String, JsonValue>,
        ) -> anyhow::Result<RunInfo> {
            self.submitted
                .lock()
                .unwrap()
                .push((job_id.to_string(), input.clone()));
            match self.submissions.lock().unwrap().pop_front() {
                Some(Ok(run_id)) => Ok(RunInfo {
                    run_id: run_id.to_string(),
                    status: RunStatus::Starting,
                }),
                Some(Err(message)) => Err(anyhow::anyhow!(message)),
                None => Err(anyhow::anyhow!("no submission scripted")),
            }
        }

        async fn poll_status(&self, run_id: &str) -> anyhow::Result<RunStatusInfo> {
            *self
                .poll_calls
                .lock()
                .unwrap()
                .entry(run_id.to_string())
                .or_default() += 1;
            let next = self
                .polls
                .lock()
                .unwrap()
                .get_mut(run_id)
                .and_then(VecDeque::pop_front);
            match next {
                Some(Poll::Fail(message)) => Err(anyhow::anyhow!(message)),
                Some(Poll::Status(status, message)) => Ok(RunStatusInfo {
                    run_id: run_id.to_string(),
                    status,
                    status_message: message.map(str::to_string),
                }),
                None => Ok(RunStatusInfo {
                    run_id: run_id.to_string(),
                    status: RunStatus::Running,
                    status_message: None,
                }),
            }
        }

        async fn fetch_results(&self, _run_id: &str) -> anyhow::Result<Vec<JsonValue>> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_results {
                anyhow::bail!("dataset unavailable");
            }
            Ok(self.results.clone())
        }
    }

    fn tracker(gateway: &Arc<ScriptedGateway>) -> RunLifecycleTracker {
        let gateway: Arc<dyn ProviderGateway> = gateway.clone();
        RunLifecycleTracker::new(gateway, &Config::default())
    }

    fn count_inputs() -> BoundInputs {
        let mut schema = InputSchema::new();
        schema.insert("count", FieldDescriptor::new(FieldType::Number));
        let binder = InputBinder::new(schema);
        let mut bound = binder.seed();
        binder.apply(&mut bound, "count", "5");
        bound
    }

    async fn collect(mut handle: RunHandle) -> Vec<RunEvent> {
        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }
        events
    }

    fn statuses(events: &[RunEvent]) -> Vec<RunStatus> {
        events
            .iter()
            .filter_map(|event| match event {
                RunEvent::State(state) => Some(state.status),
                RunEvent::Halted(_) => None,
            })
            .collect()
    }

    async fn idle_for(duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_success() {
        let gateway = Arc::new(
            ScriptedGateway::default()
                .accept(
                    "r1",
                    vec![
                        Poll::Status(RunStatus::Running, None),
                        Poll::Status(RunStatus::Succeeded, None),
                    ],
                )
                .with_results(vec![json!({"title": "first"}), json!({"title": "second"})]),
        );
        let mut tracker = tracker(&gateway);

        let handle = tracker.submit("X", &count_inputs()).await.unwrap();
        assert_eq!(handle.run_id(), "r1");

        let events = collect(handle).await;
        assert_eq!(
            statuses(&events),
            vec![
                RunStatus::Starting,
                RunStatus::Running,
                RunStatus::Succeeded,
                RunStatus::Succeeded
            ]
        );

        let last = tracker.current().unwrap();
        assert_eq!(last.run_id, "r1");
        assert_eq!(last.status, RunStatus::Succeeded);
        assert_eq!(
            last.final_results,
            Some(vec![json!({"title": "first"}), json!({"title": "second"})])
        );

        let submitted = gateway.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].0, "X");
        assert_eq!(submitted[0].1.get("count"), Some(&json!(5)));

        assert_eq!(gateway.polls_of("r1"), 2);
        assert_eq!(gateway.fetches(), 1);
        assert_eq!(tracker.phase(), TrackerPhase::Finished);
        assert!(!tracker.is_tracking());

        idle_for(Duration::from_secs(30)).await;
        assert_eq!(gateway.polls_of("r1"), 2);
        assert_eq!(gateway.fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_successful_snapshot_carries_results() {
        let gateway = Arc::new(
            ScriptedGateway::default()
                .accept("r1", vec![Poll::Status(RunStatus::Succeeded, None)])
                .with_results(vec![json!(1)]),
        );
        let mut tracker = tracker(&gateway);

        let events = collect(tracker.submit("X", &BoundInputs::new()).await.unwrap()).await;
        for event in &events {
            if let RunEvent::State(state) = event {
                if state.final_results.is_some() {
                    assert_eq!(state.status, RunStatus::Succeeded);
                }
            }
        }
        assert_eq!(gateway.fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_and_aborted_never_fetch_results() {
        for terminal in [RunStatus::Failed, RunStatus::Aborted] {
            let gateway = Arc::new(ScriptedGateway::default().accept(
                "r1",
                vec![
                    Poll::Status(RunStatus::Running, None),
                    Poll::Status(terminal, Some("out of memory")),
                ],
            ));
            let mut tracker = tracker(&gateway);

            let handle = tracker.submit("X", &BoundInputs::new()).await.unwrap();
            let last = handle.wait().await.unwrap().unwrap();

            assert_eq!(last.status, terminal);
            assert_eq!(last.status_message.as_deref(), Some("out of memory"));
            assert!(last.final_results.is_none());
            assert_eq!(gateway.fetches(), 0);
            assert_eq!(tracker.phase(), TrackerPhase::Finished);

            idle_for(Duration::from_secs(30)).await;
            assert_eq!(gateway.polls_of("r1"), 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_status_emits_once_but_message_changes_emit() {
        let gateway = Arc::new(ScriptedGateway::default().accept(
            "r1",
            vec![
                Poll::Status(RunStatus::Running, None),
                Poll::Status(RunStatus::Running, None),
                Poll::Status(RunStatus::Running, Some("page 2 of 3")),
                Poll::Status(RunStatus::Aborted, None),
            ],
        ));
        let mut tracker = tracker(&gateway);

        let events = collect(tracker.submit("X", &BoundInputs::new()).await.unwrap()).await;
        assert_eq!(
            statuses(&events),
            vec![
                RunStatus::Starting,
                RunStatus::Running,
                RunStatus::Running,
                RunStatus::Aborted
            ]
        );
        assert_eq!(gateway.polls_of("r1"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_failure_halts_without_retry() {
        let gateway = Arc::new(ScriptedGateway::default().accept(
            "r1",
            vec![
                Poll::Status(RunStatus::Running, None),
                Poll::Fail("connection reset"),
            ],
        ));
        let mut tracker = tracker(&gateway);

        let handle = tracker.submit("X", &BoundInputs::new()).await.unwrap();
        let err = handle.wait().await.unwrap_err();

        assert_eq!(err.kind(), "PollingError");
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(tracker.phase(), TrackerPhase::Halted);
        assert_eq!(tracker.last_error(), Some(err));
        assert_eq!(tracker.current().unwrap().status, RunStatus::Running);

        idle_for(Duration::from_secs(30)).await;
        assert_eq!(gateway.polls_of("r1"), 2);
        assert_eq!(gateway.fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_fetch_failure_is_reported() {
        let gateway = Arc::new(
            ScriptedGateway::default()
                .accept("r1", vec![Poll::Status(RunStatus::Succeeded, None)])
                .failing_results(),
        );
        let mut tracker = tracker(&gateway);

        let err = tracker
            .submit("X", &BoundInputs::new())
            .await
            .unwrap()
            .wait()
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "ResultFetchError");
        assert_eq!(gateway.fetches(), 1);
        assert_eq!(tracker.phase(), TrackerPhase::Halted);
        assert_eq!(tracker.current().unwrap().status, RunStatus::Succeeded);
        assert!(tracker.current().unwrap().final_results.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_failure_leaves_tracker_idle() {
        let gateway = Arc::new(ScriptedGateway::default().reject("actor not found"));
        let mut tracker = tracker(&gateway);

        let err = tracker.submit("X", &BoundInputs::new()).await.unwrap_err();

        assert_eq!(err.kind(), "SubmissionError");
        assert!(err.to_string().contains("actor not found"));
        assert_eq!(tracker.phase(), TrackerPhase::Idle);
        assert!(tracker.current().is_none());

        idle_for(Duration::from_secs(30)).await;
        assert_eq!(gateway.poll_calls.lock().unwrap().len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_input_is_rejected_before_submission() {
        let gateway = Arc::new(ScriptedGateway::default().accept("r1", Vec::new()));
        let mut tracker = tracker(&gateway);

        let mut schema = InputSchema::new();
        schema.insert("count", FieldDescriptor::new(FieldType::Integer));
        let binder = InputBinder::new(schema);
        let mut bound = binder.seed();
        binder.apply(&mut bound, "count", "12a");

        let err = tracker.submit("X", &bound).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidInput");
        assert!(gateway.submitted().is_empty());
        assert_eq!(tracker.phase(), TrackerPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubmit_supersedes_previous_run() {
        let gateway = Arc::new(
            ScriptedGateway::default()
                .accept("r1", Vec::new())
                .accept(
                    "r2",
                    vec![
                        Poll::Status(RunStatus::Running, None),
                        Poll::Status(RunStatus::Succeeded, None),
                    ],
                ),
        );
        let mut tracker = tracker(&gateway);

        let mut first = tracker.submit("X", &BoundInputs::new()).await.unwrap();
        idle_for(Duration::from_secs(7)).await;
        assert_eq!(gateway.polls_of("r1"), 2);
        assert!(tracker.is_tracking());

        let second = tracker.submit("X", &BoundInputs::new()).await.unwrap();
        assert_eq!(tracker.current().unwrap().run_id, "r2");

        // The first run's stream ends without any event from the second
        while let Some(event) = first.next_event().await {
            if let RunEvent::State(state) = event {
                assert_eq!(state.run_id, "r1");
            }
        }

        let last = second.wait().await.unwrap().unwrap();
        assert_eq!(last.run_id, "r2");
        assert_eq!(last.status, RunStatus::Succeeded);

        let r1_polls = gateway.polls_of("r1");
        idle_for(Duration::from_secs(60)).await;
        assert_eq!(gateway.polls_of("r1"), r1_polls);
        assert_eq!(gateway.polls_of("r2"), 2);
        assert_eq!(gateway.fetches(), 1);
        assert!(!tracker.is_tracking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() {
        let gateway = Arc::new(ScriptedGateway::default().accept("r1", Vec::new()));
        let mut tracker = tracker(&gateway);

        let handle = tracker.submit("X", &BoundInputs::new()).await.unwrap();
        idle_for(Duration::from_secs(4)).await;
        assert_eq!(gateway.polls_of("r1"), 1);

        tracker.cancel();
        assert_eq!(tracker.phase(), TrackerPhase::Idle);
        let last = handle.wait().await.unwrap().unwrap();
        assert_eq!(last.status, RunStatus::Running);

        idle_for(Duration::from_secs(30)).await;
        assert_eq!(gateway.polls_of("r1"), 1);
    }

    #[tokio::test]
    async fn test_cancel_when_idle_is_noop() {
        let gateway = Arc::new(ScriptedGateway::default());
        let mut tracker = tracker(&gateway);

        tracker.cancel();
        tracker.cancel();
        assert_eq!(tracker.phase(), TrackerPhase::Idle);
        assert!(tracker.current().is_none());
        assert!(tracker.last_error().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_phase_is_settled_once_events_end() {
        let config = Config::default().with_poll_interval(Duration::from_millis(1));

        for _ in 0..200 {
            let gateway = Arc::new(ScriptedGateway::default().accept(
                "r1",
                vec![Poll::Status(RunStatus::Failed, Some("boom"))],
            ));
            let mut tracker = RunLifecycleTracker::new(gateway, &config);

            let handle = tracker.submit("X", &BoundInputs::new()).await.unwrap();
            let last = handle.wait().await.unwrap().unwrap();

            assert_eq!(last.status, RunStatus::Failed);
            assert_eq!(tracker.phase(), TrackerPhase::Finished);
            assert!(!tracker.is_tracking());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_phase_is_halted_when_halt_event_arrives() {
        let config = Config::default().with_poll_interval(Duration::from_millis(1));

        for _ in 0..200 {
            let gateway = Arc::new(
                ScriptedGateway::default().accept("r1", vec![Poll::Fail("connection reset")]),
            );
            let mut tracker = RunLifecycleTracker::new(gateway, &config);

            let mut handle = tracker.submit("X", &BoundInputs::new()).await.unwrap();
            loop {
                match handle.next_event().await {
                    Some(RunEvent::Halted(_)) => break,
                    Some(RunEvent::State(_)) => continue,
                    None => panic!("stream ended without a halt"),
                }
            }

            assert_eq!(tracker.phase(), TrackerPhase::Halted);
            assert!(!tracker.is_tracking());
        }
    }
}
