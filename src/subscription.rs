//! Notification subscriptions
//!
//! A [`Subscription`] owns one registration on a device notification topic
//! and releases it exactly once, either through [`Subscription::close`] or on
//! drop. Handlers built here only record into a [`CompletionSlot`] and never
//! call back into the waiting side.

use crate::coordinator::TerminalEvent;
use crate::device::{
    ActionEvent, ActionHandler, ActionNotification, ArmDevice, NotificationHandle, SequenceEvent,
    SequenceHandler, SequenceNotification,
};
use crate::error::{AbortReason, DeviceError, SubscriptionLeak};
use crossbeam::channel::{self, Receiver, Sender};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Device notification topics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Action,
    SequenceInfo,
}

/// Handler paired with the topic it listens on
pub enum Listener {
    Action(ActionHandler),
    Sequence(SequenceHandler),
}

impl Listener {
    pub fn topic(&self) -> Topic {
        match self {
            Listener::Action(_) => Topic::Action,
            Listener::Sequence(_) => Topic::SequenceInfo,
        }
    }
}

/// Single-assignment outcome shared between a delivery thread and one waiter
pub struct CompletionSlot<T> {
    value: OnceLock<T>,
    notify_tx: Sender<()>,
    notify_rx: Receiver<()>,
}

impl<T> CompletionSlot<T> {
    pub fn new() -> Arc<Self> {
        let (notify_tx, notify_rx) = channel::bounded(1);
        Arc::new(Self {
            value: OnceLock::new(),
            notify_tx,
            notify_rx,
        })
    }

    /// Store `value` if nothing was stored yet. Returns false when the slot
    /// was already set; the later value is dropped.
    pub fn signal(&self, value: T) -> bool {
        if self.value.set(value).is_ok() {
            let _ = self.notify_tx.try_send(());
            true
        } else {
            false
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    pub fn is_set(&self) -> bool {
        self.value.get().is_some()
    }

    /// Receiver that yields once when the slot is first set
    pub fn notified(&self) -> &Receiver<()> {
        &self.notify_rx
    }

    /// Block until the slot is set or `timeout` elapses
    pub fn wait(&self, timeout: Duration) -> Option<&T> {
        let _ = self.notify_rx.recv_timeout(timeout);
        self.value.get()
    }
}

/// Handler for the action topic: ACTION_END and ACTION_ABORT are terminal
pub fn action_completion_handler(slot: Arc<CompletionSlot<TerminalEvent>>) -> ActionHandler {
    Box::new(move |notification: &ActionNotification| {
        let outcome = match notification.action_event {
            ActionEvent::ActionEnd => TerminalEvent::Completed,
            ActionEvent::ActionAbort => {
                TerminalEvent::Aborted(AbortReason(notification.abort_details))
            }
            _ => return,
        };
        slot.signal(outcome);
    })
}

/// Handler for the sequence-info topic.
///
/// Completed task indices are forwarded on `progress` without blocking;
/// SEQUENCE_COMPLETED and SEQUENCE_ABORTED are terminal.
pub fn sequence_completion_handler(
    slot: Arc<CompletionSlot<TerminalEvent>>,
    progress: Sender<u32>,
) -> SequenceHandler {
    Box::new(move |notification: &SequenceNotification| match notification.event_identifier {
        SequenceEvent::SequenceTaskCompleted => {
            if !slot.is_set() {
                let _ = progress.try_send(notification.task_index);
            }
        }
        SequenceEvent::SequenceAborted => {
            slot.signal(TerminalEvent::Aborted(AbortReason(notification.abort_details)));
        }
        SequenceEvent::SequenceCompleted => {
            slot.signal(TerminalEvent::Completed);
        }
        _ => {}
    })
}

/// An active registration on a device notification topic
pub struct Subscription<'a> {
    device: &'a dyn ArmDevice,
    handle: NotificationHandle,
    topic: Topic,
    released: bool,
}

impl<'a> Subscription<'a> {
    /// Register `listener` on its topic
    pub fn open(device: &'a dyn ArmDevice, listener: Listener) -> Result<Self, DeviceError> {
        let topic = listener.topic();
        let handle = match listener {
            Listener::Action(handler) => device.subscribe_action_events(handler)?,
            Listener::Sequence(handler) => device.subscribe_sequence_events(handler)?,
        };
        debug!("Subscribed to {:?} notifications (handle {})", topic, handle);

        Ok(Self {
            device,
            handle,
            topic,
            released: false,
        })
    }

    pub fn handle(&self) -> NotificationHandle {
        self.handle
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Unsubscribe, surfacing a failure as a [`SubscriptionLeak`]
    pub fn close(mut self) -> Result<(), SubscriptionLeak> {
        self.release()
    }

    fn release(&mut self) -> Result<(), SubscriptionLeak> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        self.device
            .unsubscribe(self.handle)
            .map(|_| debug!("Unsubscribed from {:?} notifications (handle {})", self.topic, self.handle))
            .map_err(|source| SubscriptionLeak {
                handle: self.handle.0,
                source,
            })
    }
}

impl Drop for Subscription<'_> {
    fn drop(&mut self) {
        if let Err(leak) = self.release() {
            warn!("{}", leak);
        }
    }
}
