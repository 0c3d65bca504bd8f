//! Execution lifecycle events
//!
//! Structured JSON events describing what happened to each motion
//! invocation, for consumption by external tools. Where they go is decided
//! by an [`EventSink`].

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Get current timestamp as an RFC 3339 string with microsecond precision
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// What was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionKind {
    Action,
    Sequence,
}

/// Lifecycle status of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Submitted,
    TaskCompleted,
    Completed,
    Aborted,
    TimedOut,
    Failed,
}

/// One lifecycle event of a motion invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub timestamp: String,
    /// Event type for JSON parsing
    #[serde(rename = "type")]
    pub event_type: String,
    pub invocation: Uuid,
    pub kind: ExecutionKind,
    pub status: ExecutionStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_index: Option<u32>,
    /// Device abort detail code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
}

impl ExecutionEvent {
    pub fn new(invocation: Uuid, kind: ExecutionKind, status: ExecutionStatus, message: &str) -> Self {
        Self {
            timestamp: current_timestamp(),
            event_type: "execution".to_string(),
            invocation,
            kind,
            status,
            message: message.to_string(),
            task_index: None,
            code: None,
        }
    }

    pub fn submitted(invocation: Uuid, kind: ExecutionKind, name: &str) -> Self {
        Self::new(invocation, kind, ExecutionStatus::Submitted, &format!("Submitted {}", name))
    }

    pub fn task_completed(invocation: Uuid, task_index: u32) -> Self {
        Self {
            task_index: Some(task_index),
            ..Self::new(
                invocation,
                ExecutionKind::Sequence,
                ExecutionStatus::TaskCompleted,
                &format!("Sequence task {} completed", task_index),
            )
        }
    }

    pub fn completed(invocation: Uuid, kind: ExecutionKind) -> Self {
        Self::new(invocation, kind, ExecutionStatus::Completed, "Motion completed")
    }

    pub fn aborted(invocation: Uuid, kind: ExecutionKind, code: u32) -> Self {
        Self {
            code: Some(code),
            ..Self::new(
                invocation,
                kind,
                ExecutionStatus::Aborted,
                &format!("Motion aborted with sub-error code {}", code),
            )
        }
    }

    pub fn timed_out(invocation: Uuid, kind: ExecutionKind, waited_ms: u128) -> Self {
        Self::new(
            invocation,
            kind,
            ExecutionStatus::TimedOut,
            &format!("No terminal notification after {} ms", waited_ms),
        )
    }

    pub fn failed(invocation: Uuid, kind: ExecutionKind, error_msg: &str) -> Self {
        Self::new(invocation, kind, ExecutionStatus::Failed, error_msg)
    }
}

/// Destination for execution events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ExecutionEvent);
}

/// Discards all events
#[derive(Debug, Clone, Default)]
pub struct NoOpEvents;

impl EventSink for NoOpEvents {
    fn emit(&self, _event: &ExecutionEvent) {}
}

/// Prints events to stdout as JSON lines
#[derive(Debug, Clone, Default)]
pub struct ConsoleEvents {
    pub pretty_print: bool,
}

impl ConsoleEvents {
    pub fn new() -> Self {
        Self { pretty_print: false }
    }

    pub fn pretty() -> Self {
        Self { pretty_print: true }
    }
}

impl EventSink for ConsoleEvents {
    fn emit(&self, event: &ExecutionEvent) {
        let json = if self.pretty_print {
            serde_json::to_string_pretty(event)
        } else {
            serde_json::to_string(event)
        };
        if let Ok(json) = json {
            println!("{}", json);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Collects events for assertions
    #[derive(Default)]
    pub(crate) struct RecordingEvents {
        pub events: Mutex<Vec<ExecutionEvent>>,
    }

    impl RecordingEvents {
        pub fn statuses(&self) -> Vec<ExecutionStatus> {
            self.events.lock().unwrap().iter().map(|e| e.status).collect()
        }
    }

    impl EventSink for RecordingEvents {
        fn emit(&self, event: &ExecutionEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_event_json_shape() {
        let id = Uuid::new_v4();
        let event = ExecutionEvent::aborted(id, ExecutionKind::Sequence, 42);
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "execution");
        assert_eq!(json["kind"], "sequence");
        assert_eq!(json["status"], "aborted");
        assert_eq!(json["code"], 42);
        assert_eq!(json["invocation"], id.to_string());
        assert!(json.get("task_index").is_none());
    }

    #[test]
    fn test_task_completed_carries_index() {
        let event = ExecutionEvent::task_completed(Uuid::new_v4(), 3);
        assert_eq!(event.task_index, Some(3));
        assert_eq!(event.status, ExecutionStatus::TaskCompleted);
        assert_eq!(event.message, "Sequence task 3 completed");
    }
}
