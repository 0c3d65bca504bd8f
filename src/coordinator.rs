//! Execution Coordinator - submit a motion and wait for its terminal notification
//!
//! Every invocation runs the same protocol:
//! 1. Resolve the command against the device (named pose handles, actuator count)
//! 2. Subscribe to the notification topic
//! 3. Submit the action or sequence
//! 4. Wait, bounded by the timeout, for a terminal notification
//! 5. Unsubscribe, on every exit path
//!
//! A [`Coordinator`] is consumed by the invocation it runs, so its state
//! machine cannot be reused across calls.

use crate::action::{MotionCommand, Resolver, Sequence};
use crate::device::{Action, ArmDevice, SequenceDescriptor};
use crate::error::{AbortReason, DeviceError, ExecutionError, SubscriptionLeak};
use crate::events::{EventSink, ExecutionEvent, ExecutionKind, NoOpEvents};
use crate::subscription::{
    action_completion_handler, sequence_completion_handler, CompletionSlot, Listener, Subscription,
};
use crossbeam::channel::{self, Receiver};
use crossbeam::select;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Default bound on the wait for a terminal notification
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Final outcome observed for a submitted motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalEvent {
    Completed,
    Aborted(AbortReason),
    TimedOut,
}

/// Why an invocation ended in the aborted state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortCause {
    ResolutionFailed,
    SubmissionFailed,
    Device(AbortReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    Submitted,
    AwaitingCompletion,
    Completed,
    Aborted(AbortCause),
    TimedOut,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Completed | ExecutionState::Aborted(_) | ExecutionState::TimedOut
        )
    }
}

/// Per-invocation execution settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionOptions {
    pub timeout: Duration,
    /// Issue a stop to the device when the wait times out. Off by default:
    /// the device may still finish the motion after the caller gave up.
    pub cancel_on_timeout: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            cancel_on_timeout: false,
        }
    }
}

impl ExecutionOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Everything known about a finished invocation
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub invocation: Uuid,
    pub state: ExecutionState,
    pub result: Result<(), ExecutionError>,
    pub elapsed: Duration,
    /// Sequence tasks reported complete before the terminal event
    pub tasks_completed: usize,
    /// Set when the subscription could not be released
    pub leak: Option<SubscriptionLeak>,
}

impl ExecutionReport {
    /// Terminal event, if the invocation got far enough to wait for one
    pub fn terminal_event(&self) -> Option<TerminalEvent> {
        match self.state {
            ExecutionState::Completed => Some(TerminalEvent::Completed),
            ExecutionState::Aborted(AbortCause::Device(reason)) => Some(TerminalEvent::Aborted(reason)),
            ExecutionState::TimedOut => Some(TerminalEvent::TimedOut),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_result(self) -> Result<(), ExecutionError> {
        self.result
    }
}

/// Single-use executor for one action or one sequence
pub struct Coordinator<'a> {
    device: &'a dyn ArmDevice,
    options: ExecutionOptions,
    events: &'a dyn EventSink,
    invocation: Uuid,
    state: ExecutionState,
    started: Instant,
}

impl<'a> Coordinator<'a> {
    pub fn new(device: &'a dyn ArmDevice, options: ExecutionOptions) -> Self {
        Self {
            device,
            options,
            events: &NoOpEvents,
            invocation: Uuid::new_v4(),
            state: ExecutionState::Idle,
            started: Instant::now(),
        }
    }

    pub fn with_events(mut self, events: &'a dyn EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn invocation(&self) -> Uuid {
        self.invocation
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Execute one motion command and wait for it to finish
    pub fn execute(self, command: &MotionCommand) -> ExecutionReport {
        self.run_action(command)
    }

    /// Execute a sequence as one unit and wait for it to finish
    pub fn execute_sequence(self, sequence: &Sequence) -> ExecutionReport {
        self.run_sequence(sequence)
    }

    fn run_action(mut self, command: &MotionCommand) -> ExecutionReport {
        self.started = Instant::now();
        let kind = ExecutionKind::Action;

        let action = match Resolver::new(self.device).resolve(command) {
            Ok(action) => action,
            Err(e) => {
                error!("Cannot resolve {:?}: {}", command, e);
                return self.fail(kind, AbortCause::ResolutionFailed, e.into(), None);
            }
        };

        let slot = CompletionSlot::new();
        let listener = Listener::Action(action_completion_handler(Arc::clone(&slot)));
        let subscription = match Subscription::open(self.device, listener) {
            Ok(subscription) => subscription,
            Err(e) => {
                error!("Failed to subscribe to action notifications: {}", e);
                return self.fail(kind, AbortCause::SubmissionFailed, ExecutionError::SubmissionFailed(e), None);
            }
        };

        info!("Executing action '{}'", action.name);
        if let Err(e) = self.submit_action(&subscription, &action) {
            error!("Device rejected action '{}': {}", action.name, e);
            let leak = Self::release(subscription);
            return self.fail(kind, AbortCause::SubmissionFailed, ExecutionError::SubmissionFailed(e), leak);
        }
        self.events.emit(&ExecutionEvent::submitted(self.invocation, kind, &action.name));

        self.await_terminal(kind, &slot, channel::never(), subscription)
    }

    fn run_sequence(mut self, sequence: &Sequence) -> ExecutionReport {
        self.started = Instant::now();
        let kind = ExecutionKind::Sequence;

        if sequence.is_empty() {
            info!("Sequence is empty, nothing to execute");
            self.state = ExecutionState::Completed;
            self.events.emit(&ExecutionEvent::completed(self.invocation, kind));
            return self.report(Ok(()), 0, None);
        }

        info!("Creating a sequence of {} task(s)", sequence.len());
        let descriptor = match Resolver::new(self.device).resolve_sequence(sequence) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                error!("Cannot resolve sequence: {}", e);
                return self.fail(kind, AbortCause::ResolutionFailed, e.into(), None);
            }
        };

        let slot = CompletionSlot::new();
        let (progress_tx, progress_rx) = channel::unbounded();
        let listener = Listener::Sequence(sequence_completion_handler(Arc::clone(&slot), progress_tx));
        let subscription = match Subscription::open(self.device, listener) {
            Ok(subscription) => subscription,
            Err(e) => {
                error!("Failed to subscribe to sequence notifications: {}", e);
                return self.fail(kind, AbortCause::SubmissionFailed, ExecutionError::SubmissionFailed(e), None);
            }
        };

        info!("Creating sequence on device and executing it");
        if let Err(e) = self.submit_sequence(&subscription, &descriptor) {
            error!("Device rejected sequence '{}': {}", descriptor.name, e);
            let leak = Self::release(subscription);
            return self.fail(kind, AbortCause::SubmissionFailed, ExecutionError::SubmissionFailed(e), leak);
        }
        self.events.emit(&ExecutionEvent::submitted(self.invocation, kind, &descriptor.name));

        self.await_terminal(kind, &slot, progress_rx, subscription)
    }

    /// Submission takes the live subscription so that it cannot happen
    /// before the handler is registered.
    fn submit_action(&mut self, _armed: &Subscription<'_>, action: &Action) -> Result<(), DeviceError> {
        self.device.execute_action(action)?;
        self.state = ExecutionState::Submitted;
        Ok(())
    }

    fn submit_sequence(
        &mut self,
        _armed: &Subscription<'_>,
        descriptor: &SequenceDescriptor,
    ) -> Result<(), DeviceError> {
        let handle = self.device.create_sequence(descriptor)?;
        self.device.play_sequence(handle)?;
        self.state = ExecutionState::Submitted;
        Ok(())
    }

    fn await_terminal(
        mut self,
        kind: ExecutionKind,
        slot: &CompletionSlot<TerminalEvent>,
        progress: Receiver<u32>,
        subscription: Subscription<'_>,
    ) -> ExecutionReport {
        self.state = ExecutionState::AwaitingCompletion;
        info!("Waiting for movement to finish ...");

        let deadline = Instant::now() + self.options.timeout;
        let idle = channel::never();
        let mut progress_open = true;
        let mut tasks_completed = 0usize;
        let observed = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let progress_rx = if progress_open { &progress } else { &idle };
            select! {
                recv(slot.notified()) -> _ => break slot.get().copied(),
                recv(progress_rx) -> task => match task {
                    Ok(task_index) => {
                        tasks_completed += 1;
                        self.task_completed(task_index);
                    }
                    Err(_) => progress_open = false,
                },
                default(remaining) => break slot.get().copied(),
            }
        };

        // Task reports queued ahead of the terminal notification
        for task_index in progress.try_iter() {
            tasks_completed += 1;
            self.task_completed(task_index);
        }

        let leak = Self::release(subscription);

        let result = match observed {
            Some(TerminalEvent::Completed) => {
                info!("Motion completed");
                self.state = ExecutionState::Completed;
                self.events.emit(&ExecutionEvent::completed(self.invocation, kind));
                Ok(())
            }
            Some(TerminalEvent::Aborted(reason)) => {
                warn!("Motion aborted with {}", reason);
                self.state = ExecutionState::Aborted(AbortCause::Device(reason));
                self.events.emit(&ExecutionEvent::aborted(self.invocation, kind, reason.code()));
                Err(ExecutionError::Aborted(reason))
            }
            Some(TerminalEvent::TimedOut) | None => {
                warn!("Timeout on notification wait after {:?}", self.options.timeout);
                self.state = ExecutionState::TimedOut;
                if self.options.cancel_on_timeout {
                    self.cancel_in_flight();
                }
                let waited_ms = self.started.elapsed().as_millis();
                self.events.emit(&ExecutionEvent::timed_out(self.invocation, kind, waited_ms));
                Err(ExecutionError::TimedOut(self.options.timeout))
            }
        };

        self.report(result, tasks_completed, leak)
    }

    fn task_completed(&self, task_index: u32) {
        info!("Sequence task {} completed", task_index);
        self.events.emit(&ExecutionEvent::task_completed(self.invocation, task_index));
    }

    fn cancel_in_flight(&self) {
        info!("Stopping in-flight motion after timeout");
        if let Err(e) = self.device.stop_action() {
            warn!("Failed to stop motion after timeout: {}", e);
        }
    }

    fn release(subscription: Subscription<'_>) -> Option<SubscriptionLeak> {
        match subscription.close() {
            Ok(()) => None,
            Err(leak) => {
                warn!("{}", leak);
                Some(leak)
            }
        }
    }

    fn fail(
        mut self,
        kind: ExecutionKind,
        cause: AbortCause,
        error: ExecutionError,
        leak: Option<SubscriptionLeak>,
    ) -> ExecutionReport {
        self.state = ExecutionState::Aborted(cause);
        self.events.emit(&ExecutionEvent::failed(self.invocation, kind, &error.to_string()));
        self.report(Err(error), 0, leak)
    }

    fn report(
        self,
        result: Result<(), ExecutionError>,
        tasks_completed: usize,
        leak: Option<SubscriptionLeak>,
    ) -> ExecutionReport {
        debug!("Invocation {} finished in state {:?}", self.invocation, self.state);
        ExecutionReport {
            invocation: self.invocation,
            state: self.state,
            result,
            elapsed: self.started.elapsed(),
            tasks_completed,
            leak,
        }
    }
}

/// Execute `command` and wait at most `timeout` for it to finish
pub fn execute(device: &dyn ArmDevice, command: &MotionCommand, timeout: Duration) -> Result<(), ExecutionError> {
    Coordinator::new(device, ExecutionOptions::with_timeout(timeout))
        .execute(command)
        .into_result()
}

/// Execute `sequence` and wait at most `timeout` for it to finish
pub fn execute_sequence(
    device: &dyn ArmDevice,
    sequence: &Sequence,
    timeout: Duration,
) -> Result<(), ExecutionError> {
    Coordinator::new(device, ExecutionOptions::with_timeout(timeout))
        .execute_sequence(sequence)
        .into_result()
}
