// src/engine/runtime.rs

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info};

use crate::build::{BuildOutcome, BuildStep};
use crate::engine::gate::TriggerGate;
use crate::exec::{Generation, Launcher, Supervisor};
use crate::report::DiagnosticReporter;

/// Events sent into the runtime from the watcher, supervised processes, or
/// external signals.
///
/// - the watcher sends `ChangeDetected` once per settled burst of changes
/// - the process launcher sends `ProcessExited` when a child stops
/// - Ctrl-C handling sends `ShutdownRequested`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    ChangeDetected,
    ProcessExited {
        generation: Generation,
        code: Option<i32>,
    },
    ShutdownRequested,
}

/// Which kind of cycle is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleKind {
    Startup,
    Change,
}

/// Options that influence how the runtime behaves.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// If true, the startup cycle launches the artifact even when the initial
    /// build failed. Later cycles always require a successful build.
    pub launch_on_startup_failure: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            launch_on_startup_failure: true,
        }
    }
}

/// The build-and-supervise loop.
///
/// Responsibilities:
/// - Run the startup cycle (build, then launch).
/// - Consume `LoopEvent`s and turn each change trigger into a build, followed
///   by a restart only when the build succeeded.
/// - Keep cycles strictly sequential through the [`TriggerGate`].
///
/// Everything runs on the task that calls [`run`](Self::run); child output
/// forwarding and file watching live in their own tasks and only talk to the
/// runtime through the event channel.
pub struct Runtime<B: BuildStep, L: Launcher> {
    builder: B,
    supervisor: Supervisor<L>,
    reporter: DiagnosticReporter,
    gate: TriggerGate,
    options: RuntimeOptions,
    events_rx: mpsc::Receiver<LoopEvent>,
    cycles: u64,
    shutdown: bool,
}

impl<B: BuildStep, L: Launcher> Runtime<B, L> {
    pub fn new(
        builder: B,
        supervisor: Supervisor<L>,
        reporter: DiagnosticReporter,
        options: RuntimeOptions,
        events_rx: mpsc::Receiver<LoopEvent>,
    ) -> Self {
        Self {
            builder,
            supervisor,
            reporter,
            gate: TriggerGate::new(),
            options,
            events_rx,
            cycles: 0,
            shutdown: false,
        }
    }

    pub fn supervisor(&self) -> &Supervisor<L> {
        &self.supervisor
    }

    /// Number of build cycles completed so far, startup included.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Main event loop: startup cycle, then react to events until shutdown.
    pub async fn run(mut self) -> Result<()> {
        info!("devloop runtime started");

        let mut keep_running = self.startup().await;

        while keep_running {
            let Some(event) = self.events_rx.recv().await else {
                debug!("event channel closed");
                break;
            };
            keep_running = self.handle_event(event).await;
        }

        self.supervisor.terminate();
        info!("devloop runtime exiting");
        Ok(())
    }

    /// Run the startup cycle plus any follow-up queued while it ran.
    ///
    /// Returns `false` if a shutdown was requested meanwhile.
    pub async fn startup(&mut self) -> bool {
        if !self.gate.try_begin() {
            return true;
        }
        self.run_serialized(CycleKind::Startup).await
    }

    /// Handle one event. Returns `false` once the runtime should stop.
    pub async fn handle_event(&mut self, event: LoopEvent) -> bool {
        debug!(?event, "runtime received event");

        match event {
            LoopEvent::ChangeDetected => {
                if !self.gate.try_begin() {
                    return true;
                }
                self.run_serialized(CycleKind::Change).await
            }
            LoopEvent::ProcessExited { generation, code } => {
                self.supervisor.handle_exit(generation, code);
                true
            }
            LoopEvent::ShutdownRequested => {
                info!("shutdown requested, stopping runtime");
                false
            }
        }
    }

    /// Run `first`, then keep running change cycles for as long as triggers
    /// were queued during the previous one.
    async fn run_serialized(&mut self, first: CycleKind) -> bool {
        let mut kind = first;
        loop {
            self.run_cycle(kind).await;
            self.drain_queued();

            if self.shutdown {
                info!("shutdown requested, stopping runtime");
                return false;
            }
            if !self.gate.finish() {
                return true;
            }
            kind = CycleKind::Change;
        }
    }

    /// One build, then report or restart.
    async fn run_cycle(&mut self, kind: CycleKind) {
        self.cycles += 1;
        info!(cycle = self.cycles, ?kind, "starting build cycle");

        let outcome = self.builder.build().await;

        match outcome {
            BuildOutcome::Success => {
                self.supervisor.restart();
            }
            BuildOutcome::Failure { diagnostic_lines } => {
                self.reporter.report(&diagnostic_lines);

                if kind == CycleKind::Startup && self.options.launch_on_startup_failure {
                    info!("initial build failed; launching the existing artifact anyway");
                    self.supervisor.restart();
                } else if self.supervisor.is_running() {
                    info!("build failed; keeping the current process running");
                }
            }
        }
    }

    /// Apply every event that arrived while a cycle was running.
    ///
    /// Change triggers only fill the gate's pending slot here, so any number
    /// of them collapses into one follow-up cycle.
    fn drain_queued(&mut self) {
        loop {
            match self.events_rx.try_recv() {
                Ok(LoopEvent::ChangeDetected) => {
                    self.gate.try_begin();
                }
                Ok(LoopEvent::ProcessExited { generation, code }) => {
                    self.supervisor.handle_exit(generation, code);
                }
                Ok(LoopEvent::ShutdownRequested) => {
                    self.shutdown = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }
}
