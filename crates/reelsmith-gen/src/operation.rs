//! Long-running operation polling
//!
//! Video generation starts an operation and then polls it until it is done.
//! Polling is split into a pure part ([`interpret`] and [`transition`]) and a
//! driver ([`drive`]) that takes the fetch and sleep functions as arguments.

use reelsmith_core::{ReelError, Result};
use std::time::Duration;

pub const POLL_INTERVAL_SECS: u64 = 10;
pub const MAX_POLL_ATTEMPTS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(POLL_INTERVAL_SECS),
            max_attempts: MAX_POLL_ATTEMPTS,
        }
    }
}

/// What one poll response says about the operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Pending,
    /// Base64 video payload
    Completed(String),
    Errored(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    Running { attempts: u32 },
    Succeeded(String),
    Failed(String),
    TimedOut { attempts: u32 },
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationState::Running { .. })
    }
}

/// Read a Vertex AI operation document
///
/// `done: true` with an `error` fails; with
/// `response.generatedSamples[0].video.bytesBase64Encoded` succeeds.
pub fn interpret(status: &serde_json::Value) -> Observation {
    let done = status
        .get("done")
        .and_then(|d| d.as_bool())
        .unwrap_or(false);
    if !done {
        return Observation::Pending;
    }

    if let Some(error) = status.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error");
        return Observation::Errored(message.to_string());
    }

    status
        .pointer("/response/generatedSamples/0/video/bytesBase64Encoded")
        .and_then(|v| v.as_str())
        .map(|data| Observation::Completed(data.to_string()))
        .unwrap_or_else(|| Observation::Errored("No video data in completed operation".to_string()))
}

/// Advance the state by one observation. Terminal states never change.
pub fn transition(state: OperationState, observation: Observation, max_attempts: u32) -> OperationState {
    match state {
        OperationState::Running { attempts } => {
            let attempts = attempts + 1;
            match observation {
                Observation::Completed(data) => OperationState::Succeeded(data),
                Observation::Errored(msg) => OperationState::Failed(msg),
                Observation::Pending if attempts >= max_attempts => {
                    OperationState::TimedOut { attempts }
                }
                Observation::Pending => OperationState::Running { attempts },
            }
        }
        terminal => terminal,
    }
}

/// Poll until the operation settles, sleeping `policy.interval` before each
/// fetch. Returns the base64 payload.
pub fn drive<F, S>(policy: PollPolicy, mut fetch: F, mut sleep: S) -> Result<String>
where
    F: FnMut() -> Result<serde_json::Value>,
    S: FnMut(Duration),
{
    let mut state = OperationState::Running { attempts: 0 };
    while let OperationState::Running { attempts } = state {
        sleep(policy.interval);
        let observation = interpret(&fetch()?);
        if observation == Observation::Pending {
            println!("  Still processing... ({}/{})", attempts + 1, policy.max_attempts);
        }
        state = transition(state, observation, policy.max_attempts);
    }

    match state {
        OperationState::Succeeded(data) => Ok(data),
        OperationState::Failed(msg) => Err(ReelError::Generation(format!(
            "Video generation failed: {}",
            msg
        ))),
        OperationState::TimedOut { attempts } => Err(ReelError::Timeout(format!(
            "Video generation timed out after {} polls",
            attempts
        ))),
        OperationState::Running { .. } => unreachable!("loop exits only on a terminal state"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn done_with_video(data: &str) -> serde_json::Value {
        json!({
            "done": true,
            "response": { "generatedSamples": [{ "video": { "bytesBase64Encoded": data } }] }
        })
    }

    #[test]
    fn test_interpret() {
        assert_eq!(interpret(&json!({ "name": "op" })), Observation::Pending);
        assert_eq!(interpret(&json!({ "done": false })), Observation::Pending);
        assert_eq!(
            interpret(&done_with_video("AAAA")),
            Observation::Completed("AAAA".to_string())
        );
        assert_eq!(
            interpret(&json!({ "done": true, "error": { "message": "quota" } })),
            Observation::Errored("quota".to_string())
        );
        assert!(matches!(
            interpret(&json!({ "done": true, "response": {} })),
            Observation::Errored(_)
        ));
    }

    #[test]
    fn test_transition_times_out_at_budget() {
        let state = OperationState::Running { attempts: 59 };
        assert_eq!(
            transition(state, Observation::Pending, 60),
            OperationState::TimedOut { attempts: 60 }
        );
        let state = OperationState::Running { attempts: 3 };
        assert_eq!(
            transition(state, Observation::Pending, 60),
            OperationState::Running { attempts: 4 }
        );
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        let done = OperationState::Failed("boom".to_string());
        assert_eq!(
            transition(done.clone(), Observation::Completed("x".into()), 60),
            done
        );
        assert!(done.is_terminal());
    }

    #[test]
    fn test_drive_sleeps_before_each_poll() {
        let mut responses = vec![json!({ "done": false }), json!({}), done_with_video("Zm9v")].into_iter();
        let mut sleeps = Vec::new();
        let data = drive(
            PollPolicy::default(),
            || Ok(responses.next().unwrap()),
            |d| sleeps.push(d),
        )
        .unwrap();

        assert_eq!(data, "Zm9v");
        assert_eq!(sleeps, vec![Duration::from_secs(10); 3]);
    }

    #[test]
    fn test_drive_timeout() {
        let policy = PollPolicy {
            interval: Duration::from_millis(1),
            max_attempts: 4,
        };
        let mut polls = 0;
        let err = drive(
            policy,
            || {
                polls += 1;
                Ok(json!({ "done": false }))
            },
            |_| {},
        )
        .unwrap_err();
        assert_eq!(polls, 4);
        assert!(matches!(err, ReelError::Timeout(_)));
    }

    #[test]
    fn test_drive_reports_operation_error() {
        let err = drive(
            PollPolicy::default(),
            || Ok(json!({ "done": true, "error": { "message": "safety filter" } })),
            |_| {},
        )
        .unwrap_err();
        assert!(err.to_string().contains("safety filter"));
    }
}
