//! State machine for a single publish invocation
//!
//! Each invocation builds its own machine, so nothing is shared or persisted.
//! Transitions outside the publish graph are rejected.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Publishing phase
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishPhase {
    Start,
    Validating,
    DryRunPreview,
    CredentialCheck,
    Executing,
    Done,
    Errored,
}

impl fmt::Display for PublishPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishPhase::Start => "start",
            PublishPhase::Validating => "validating",
            PublishPhase::DryRunPreview => "dry-run-preview",
            PublishPhase::CredentialCheck => "credential-check",
            PublishPhase::Executing => "executing",
            PublishPhase::Done => "done",
            PublishPhase::Errored => "errored",
        };
        f.write_str(name)
    }
}

impl PublishPhase {
    /// Terminal phases accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PublishPhase::DryRunPreview | PublishPhase::Done | PublishPhase::Errored
        )
    }

    fn can_transition_to(&self, to: PublishPhase) -> bool {
        use PublishPhase::*;
        matches!(
            (self, to),
            (Start, Validating)
                | (Validating, Errored)
                | (Validating, DryRunPreview)
                | (Validating, CredentialCheck)
                | (CredentialCheck, Errored)
                | (CredentialCheck, Executing)
                | (Executing, Errored)
                | (Executing, Done)
        )
    }
}

/// Rejected transition
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid publish transition: {from} -> {to}")]
pub struct StateError {
    pub from: PublishPhase,
    pub to: PublishPhase,
}

/// State transition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: PublishPhase,
    pub to: PublishPhase,
}

/// State machine for tracking one publish invocation
#[derive(Debug)]
pub struct PublishStateMachine {
    current: PublishPhase,
    transitions: Vec<PhaseTransition>,
}

impl Default for PublishStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishStateMachine {
    pub fn new() -> Self {
        Self {
            current: PublishPhase::Start,
            transitions: Vec::new(),
        }
    }

    /// Transition to a new phase
    pub fn transition(&mut self, to: PublishPhase) -> Result<(), StateError> {
        let from = self.current;
        if !from.can_transition_to(to) {
            return Err(StateError { from, to });
        }

        log::debug!("publish phase: {} -> {}", from, to);
        self.transitions.push(PhaseTransition { from, to });
        self.current = to;
        Ok(())
    }

    /// Get current phase
    pub fn phase(&self) -> PublishPhase {
        self.current
    }

    /// Transition history, oldest first
    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let machine = PublishStateMachine::new();
        assert_eq!(machine.phase(), PublishPhase::Start);
        assert!(machine.transitions().is_empty());
    }

    #[test]
    fn test_publish_path() {
        let mut machine = PublishStateMachine::new();
        for phase in [
            PublishPhase::Validating,
            PublishPhase::CredentialCheck,
            PublishPhase::Executing,
            PublishPhase::Done,
        ] {
            machine.transition(phase).unwrap();
        }

        assert_eq!(machine.phase(), PublishPhase::Done);
        assert!(machine.phase().is_terminal());
        assert_eq!(machine.transitions().len(), 4);
        assert_eq!(
            machine.transitions()[0],
            PhaseTransition {
                from: PublishPhase::Start,
                to: PublishPhase::Validating
            }
        );
    }

    #[test]
    fn test_dry_run_path() {
        let mut machine = PublishStateMachine::new();
        machine.transition(PublishPhase::Validating).unwrap();
        machine.transition(PublishPhase::DryRunPreview).unwrap();

        assert!(machine.phase().is_terminal());
        assert!(machine.transition(PublishPhase::Executing).is_err());
    }

    #[test]
    fn test_errored_reachable_from_each_working_phase() {
        for path in [
            vec![PublishPhase::Validating],
            vec![PublishPhase::Validating, PublishPhase::CredentialCheck],
            vec![
                PublishPhase::Validating,
                PublishPhase::CredentialCheck,
                PublishPhase::Executing,
            ],
        ] {
            let mut machine = PublishStateMachine::new();
            for phase in path {
                machine.transition(phase).unwrap();
            }
            assert!(machine.transition(PublishPhase::Errored).is_ok());
        }
    }

    #[test]
    fn test_invalid_transition() {
        let mut machine = PublishStateMachine::new();
        let err = machine.transition(PublishPhase::Executing).unwrap_err();

        assert_eq!(
            err,
            StateError {
                from: PublishPhase::Start,
                to: PublishPhase::Executing
            }
        );
        assert_eq!(err.to_string(), "invalid publish transition: start -> executing");
        assert_eq!(machine.phase(), PublishPhase::Start);
    }

    #[test]
    fn test_dry_run_skips_credential_check() {
        let mut machine = PublishStateMachine::new();
        machine.transition(PublishPhase::Validating).unwrap();
        machine.transition(PublishPhase::CredentialCheck).unwrap();
        assert!(machine.transition(PublishPhase::DryRunPreview).is_err());
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&PublishPhase::DryRunPreview).unwrap();
        assert_eq!(json, r#""DRY_RUN_PREVIEW""#);
    }
}
