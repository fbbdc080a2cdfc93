//! Run poller
//!
//! Polls the provider for the status of one run on a fixed interval until
//! the run reaches a terminal status or polling fails. Each poll completes
//! before the next tick is awaited, so status updates are applied strictly
//! in order.

use std::sync::Arc;
use tether_core::ProviderGateway;
use tether_core::domain::run::{RunState, RunStatus};
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{Progress, RunEvent};
use crate::error::SessionError;

/// Polling loop for a single run
pub(crate) struct RunPoller {
    gateway: Arc<dyn ProviderGateway>,
    run_id: String,
    poll_interval: Duration,
    progress: watch::Sender<Progress>,
    events: mpsc::UnboundedSender<RunEvent>,
}

impl RunPoller {
    pub(crate) fn new(
        gateway: Arc<dyn ProviderGateway>,
        run_id: String,
        poll_interval: Duration,
        progress: watch::Sender<Progress>,
        events: mpsc::UnboundedSender<RunEvent>,
    ) -> Self {
        Self {
            gateway,
            run_id,
            poll_interval,
            progress,
            events,
        }
    }

    /// Runs until the run is terminal or a gateway call fails
    pub(crate) async fn run(self) {
        debug!(
            "Starting poller for run {} (interval: {:?})",
            self.run_id, self.poll_interval
        );

        // First poll happens one interval after submission
        let mut ticker = time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            debug!("Polling status of run {}", self.run_id);

            let info = match self.gateway.poll_status(&self.run_id).await {
                Ok(info) => info,
                Err(e) => {
                    let err = SessionError::polling(&self.run_id, &e);
                    warn!("{}", err);
                    self.halt(err);
                    return;
                }
            };

            let current = self.progress.borrow().state.clone();
            let changed = current.differs_from(&info);
            if changed {
                info!("Run {} is now {}", self.run_id, info.status);
            }

            match info.status {
                RunStatus::Starting | RunStatus::Running => {
                    if changed {
                        self.publish(current.observe(&info), false);
                    }
                }
                RunStatus::Succeeded => {
                    if changed {
                        self.publish(current.observe(&info), false);
                    }
                    self.fetch_results().await;
                    return;
                }
                RunStatus::Failed | RunStatus::Aborted => {
                    info!(
                        "Run {} finished with status {}: {}",
                        self.run_id,
                        info.status,
                        info.status_message.as_deref().unwrap_or("N/A")
                    );
                    if changed {
                        self.publish(current.observe(&info), true);
                    } else {
                        self.progress.send_modify(|progress| progress.finished = true);
                    }
                    return;
                }
            }
        }
    }

    /// Fetches the results of a succeeded run, exactly once
    async fn fetch_results(&self) {
        match self.gateway.fetch_results(&self.run_id).await {
            Ok(results) => {
                info!(
                    "Fetched {} result record(s) for run {}",
                    results.len(),
                    self.run_id
                );
                let state = self.progress.borrow().state.with_results(results);
                self.publish(state, true);
            }
            Err(e) => {
                let err = SessionError::result_fetch(&self.run_id, &e);
                warn!("{}", err);
                self.halt(err);
            }
        }
    }

    /// Records `state`, and the end of tracking when `last`, before the
    /// subscriber can see the event
    fn publish(&self, state: RunState, last: bool) {
        self.progress.send_modify(|progress| {
            progress.state = state.clone();
            progress.finished |= last;
        });
        // The subscriber may have dropped its handle; tracking continues
        let _ = self.events.send(RunEvent::State(state));
    }

    fn halt(&self, err: SessionError) {
        self.progress.send_modify(|progress| {
            progress.halted = Some(err.clone());
            progress.finished = true;
        });
        let _ = self.events.send(RunEvent::Halted(err));
    }
}
