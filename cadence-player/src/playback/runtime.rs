//! Tokio runtime wrapper
//!
//! Runs one [`PlaybackEngine`] in a dedicated task. A `tokio::time::interval`
//! measures real elapsed time and advances the engine clock; host commands
//! arrive over an mpsc channel and are applied between advances, so the
//! engine itself stays single-threaded. The latest snapshot is published on
//! a watch channel after every step.

use std::time::Duration;

use cadence_common::time;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::engine::PlaybackEngine;
use super::snapshot::PlaybackSnapshot;
use crate::error::{Error, Result};

const COMMAND_QUEUE: usize = 32;

/// Host command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    TogglePause,
    Next,
    Previous,
    Exit { confirm: bool },
    EnableAudio,
}

struct Command {
    kind: CommandKind,
    reply: oneshot::Sender<Result<PlaybackSnapshot>>,
}

/// Cloneable control surface for a running engine
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<PlaybackSnapshot>,
    cancel: CancellationToken,
}

impl EngineHandle {
    /// Apply a command and return the resulting snapshot
    pub async fn send(&self, kind: CommandKind) -> Result<PlaybackSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command { kind, reply })
            .await
            .map_err(|_| Error::EngineStopped)?;
        rx.await.map_err(|_| Error::EngineStopped)?
    }

    pub async fn toggle_pause(&self) -> Result<PlaybackSnapshot> {
        self.send(CommandKind::TogglePause).await
    }

    pub async fn next(&self) -> Result<PlaybackSnapshot> {
        self.send(CommandKind::Next).await
    }

    pub async fn previous(&self) -> Result<PlaybackSnapshot> {
        self.send(CommandKind::Previous).await
    }

    pub async fn exit(&self, confirm: bool) -> Result<PlaybackSnapshot> {
        self.send(CommandKind::Exit { confirm }).await
    }

    pub async fn enable_audio(&self) -> Result<PlaybackSnapshot> {
        self.send(CommandKind::EnableAudio).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.clone()
    }

    /// Tear the engine down; the task exits after its next step
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

pub struct EngineRuntime;

impl EngineRuntime {
    /// Start the engine and drive it until it ends or is cancelled
    ///
    /// The task's result is the final snapshot.
    pub fn spawn(
        mut engine: PlaybackEngine,
        tick: Duration,
    ) -> Result<(EngineHandle, JoinHandle<PlaybackSnapshot>)> {
        engine.start()?;
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
        let cancel = CancellationToken::new();

        let handle = EngineHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(run(engine, tick, command_rx, snapshot_tx, cancel));
        Ok((handle, task))
    }
}

async fn run(
    mut engine: PlaybackEngine,
    tick: Duration,
    mut commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<PlaybackSnapshot>,
    cancel: CancellationToken,
) -> PlaybackSnapshot {
    let mut interval = tokio::time::interval(tick.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();
    info!("Engine runtime started (tick {:?})", tick);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Engine runtime cancelled");
                engine.teardown();
                break;
            }
            _ = interval.tick() => {
                catch_up(&mut engine, &mut last);
            }
            Some(command) = commands.recv() => {
                // Catch up first so the command lands at the right logical time
                catch_up(&mut engine, &mut last);

                let result = apply(&mut engine, command.kind);
                if let Err(e) = &result {
                    debug!("Command {:?} rejected: {}", command.kind, e);
                }
                let reply = result.map(|()| engine.snapshot());
                if command.reply.send(reply).is_err() {
                    warn!("Command {:?} caller went away", command.kind);
                }
            }
        }

        snapshots.send_replace(engine.snapshot());
        if engine.is_finished() {
            break;
        }
    }

    let last_snapshot = engine.snapshot();
    snapshots.send_replace(last_snapshot.clone());
    info!("Engine runtime stopped ({})", last_snapshot.status);
    last_snapshot
}

/// Advance the engine by the whole milliseconds elapsed since `last`
///
/// `last` moves forward by exactly the time consumed, so sub-millisecond
/// remainders carry over to the next step instead of being lost.
fn catch_up(engine: &mut PlaybackEngine, last: &mut Instant) {
    let elapsed_ms = time::duration_to_millis(Instant::now().duration_since(*last));
    if elapsed_ms > 0 {
        engine.advance_ms(elapsed_ms);
        *last += Duration::from_millis(elapsed_ms);
    }
}

fn apply(engine: &mut PlaybackEngine, kind: CommandKind) -> Result<()> {
    match kind {
        CommandKind::TogglePause => engine.toggle_pause().map(|_| ()),
        CommandKind::Next => engine.next(),
        CommandKind::Previous => engine.previous(),
        CommandKind::Exit { confirm } => engine.exit(confirm),
        CommandKind::EnableAudio => engine.enable_audio(),
    }
}
