use crate::{errors::RejectReason, events::Event};
use serde::Serialize;

/// The protocol-level result of a completed call. `success == false` reports a claim which did
/// not hold, which is not an error of the call itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub label: &'static str,
    pub success: bool,
}

impl From<&Event> for Outcome {
    fn from(event: &Event) -> Self {
        Self { label: event.label(), success: event.success() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResult {
    /// The call was malformed or unauthorized and had no effect
    Rejected(RejectReason),
    /// The call committed and appended an event
    Completed(Outcome),
}

impl CallResult {
    pub fn is_rejected(&self) -> bool {
        matches!(self, CallResult::Rejected(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallResult::Completed(Outcome { success: true, .. }))
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        match self {
            CallResult::Completed(outcome) => Some(outcome),
            CallResult::Rejected(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            CallResult::Rejected(reason) => Some(reason),
            CallResult::Completed(_) => None,
        }
    }

    /// The label of the completed call, or the reason it was rejected
    pub fn message(&self) -> String {
        match self {
            CallResult::Completed(outcome) => outcome.label.to_owned(),
            CallResult::Rejected(reason) => reason.to_string(),
        }
    }
}
