//! Single-task runtime driving a [`ConsoleContext`].
//!
//! The loop multiplexes the ledger event stream, the earliest pending-action
//! deadline, the periodic snapshot refresh and operator commands. Only this
//! task touches the context, so event handling, refresh replacement and
//! deadline expiry never interleave.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use crate::board::{
    domain::{ActionRequest, OverrideField, PendingAction, TaskKey},
    ports::{KeyValueStore, LedgerEventSource, ResolutionNotifier, SnapshotResult, SnapshotSource},
    services::{ConsoleContext, TrackerResult},
};

type FetchFuture = Pin<Box<dyn Future<Output = SnapshotResult<Value>> + Send>>;

/// Operator request delivered to a running console.
#[derive(Debug)]
pub enum ConsoleCommand {
    /// Track an action whose submission the backend accepted.
    TrackAction {
        /// The accepted request.
        request: ActionRequest,
        /// Receives the registration result.
        reply: oneshot::Sender<TrackerResult<PendingAction>>,
    },
    /// Write an operator override.
    SetOverride {
        /// Task being edited.
        task_id: TaskKey,
        /// Edited field.
        field: OverrideField,
        /// New value.
        value: Value,
    },
    /// Drop an operator override.
    ClearOverride {
        /// Task being edited.
        task_id: TaskKey,
        /// Field to clear.
        field: OverrideField,
    },
    /// Start a snapshot fetch now unless one is in flight.
    RefreshNow,
    /// Hide the refresh error indicator.
    DismissRefreshError,
    /// Drop all session state.
    Reset,
}

/// Cloneable sender for [`ConsoleCommand`]s.
#[derive(Debug, Clone)]
pub struct ConsoleHandle {
    commands: mpsc::Sender<ConsoleCommand>,
}

impl ConsoleHandle {
    /// Registers an accepted action and waits for the tracker's answer.
    ///
    /// Returns `None` when the runtime has stopped.
    pub async fn track_action(
        &self,
        request: ActionRequest,
    ) -> Option<TrackerResult<PendingAction>> {
        let (reply, answer) = oneshot::channel();
        self.commands
            .send(ConsoleCommand::TrackAction { request, reply })
            .await
            .ok()?;
        answer.await.ok()
    }

    /// Sends a command; returns `false` when the runtime has stopped.
    pub async fn send(&self, command: ConsoleCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }
}

/// Runtime owning one console context.
pub struct ConsoleRuntime<S, N, C, Src, E>
where
    S: KeyValueStore,
    N: ResolutionNotifier,
    C: Clock + Send + Sync,
    Src: SnapshotSource + 'static,
    E: LedgerEventSource,
{
    context: ConsoleContext<S, N, C>,
    clock: Arc<C>,
    snapshots: Arc<Src>,
    events: E,
    commands: mpsc::Receiver<ConsoleCommand>,
    in_flight: Option<FetchFuture>,
}

impl<S, N, C, Src, E> ConsoleRuntime<S, N, C, Src, E>
where
    S: KeyValueStore,
    N: ResolutionNotifier,
    C: Clock + Send + Sync,
    Src: SnapshotSource + 'static,
    E: LedgerEventSource,
{
    /// Wires a runtime around `context` and returns the handle used to send
    /// it commands.
    #[must_use]
    pub fn new(
        context: ConsoleContext<S, N, C>,
        clock: Arc<C>,
        snapshots: Arc<Src>,
        events: E,
    ) -> (Self, ConsoleHandle) {
        let (sender, commands) = mpsc::channel(64);
        let runtime = Self {
            context,
            clock,
            snapshots,
            events,
            commands,
            in_flight: None,
        };
        (runtime, ConsoleHandle { commands: sender })
    }

    /// Returns the owned context.
    #[must_use]
    pub const fn context(&self) -> &ConsoleContext<S, N, C> {
        &self.context
    }

    /// Runs until `shutdown` completes and returns the context.
    ///
    /// The first refresh starts immediately. A closed event stream or a
    /// dropped handle does not stop the loop; refreshes and deadlines keep
    /// running until shutdown.
    pub async fn run<F>(mut self, shutdown: F) -> ConsoleContext<S, N, C>
    where
        F: Future<Output = ()>,
    {
        let period = self
            .context
            .config()
            .runtime
            .refresh_interval()
            .max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut events_open = true;
        let mut commands_open = true;
        tokio::pin!(shutdown);

        tracing::info!("console runtime started");
        loop {
            let deadline = self.until_next_deadline();

            tokio::select! {
                biased;

                () = &mut shutdown => break,

                delivered = self.events.next_event(), if events_open => match delivered {
                    Some(event) => {
                        self.context.handle_event(event);
                    }
                    None => {
                        tracing::warn!("ledger event stream closed");
                        events_open = false;
                    }
                },

                received = self.commands.recv(), if commands_open => match received {
                    Some(command) => self.apply(command),
                    None => commands_open = false,
                },

                () = sleep_for(deadline), if deadline.is_some() => {
                    self.context.expire_actions();
                }

                fetched = await_fetch(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.in_flight = None;
                    if self.context.apply_snapshot(fetched).is_err() {
                        tracing::debug!("refresh failed, error kept on the context");
                    }
                }

                _ = ticker.tick() => self.start_fetch(),
            }
        }

        tracing::info!(
            pending = self.context.tracker().pending().len(),
            "console runtime stopped"
        );
        self.context
    }

    fn apply(&mut self, command: ConsoleCommand) {
        match command {
            ConsoleCommand::TrackAction { request, reply } => {
                let registered = self.context.track_action(request);
                if reply.send(registered).is_err() {
                    tracing::debug!("track action caller went away before the reply");
                }
            }
            ConsoleCommand::SetOverride {
                task_id,
                field,
                value,
            } => {
                self.context.set_override(&task_id, field, value);
            }
            ConsoleCommand::ClearOverride { task_id, field } => {
                self.context.clear_override(&task_id, field);
            }
            ConsoleCommand::RefreshNow => self.start_fetch(),
            ConsoleCommand::DismissRefreshError => self.context.dismiss_refresh_error(),
            ConsoleCommand::Reset => {
                self.in_flight = None;
                self.context.reset();
            }
        }
    }

    fn start_fetch(&mut self) {
        if self.in_flight.is_some() {
            tracing::trace!("snapshot fetch already in flight");
            return;
        }
        let source = Arc::clone(&self.snapshots);
        self.in_flight = Some(Box::pin(async move { source.fetch_snapshot().await }));
    }

    fn until_next_deadline(&self) -> Option<Duration> {
        let deadline = self.context.next_deadline()?;
        let remaining = deadline.signed_duration_since(self.clock.utc());
        Some(remaining.to_std().unwrap_or(Duration::ZERO))
    }
}

async fn sleep_for(remaining: Option<Duration>) {
    match remaining {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

async fn await_fetch(in_flight: &mut Option<FetchFuture>) -> SnapshotResult<Value> {
    match in_flight {
        Some(fetch) => fetch.await,
        None => std::future::pending().await,
    }
}
