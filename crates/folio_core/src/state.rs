//! Per-build state machine.
//!
//! ```text
//! Idle ──► Querying ──► Binding ──► Validating ──► Emitted
//!   │          │           │            │
//!   └──────────┴───────────┴────────────┴──────► Failed
//! ```
//!
//! `Emitted` and `Failed` are terminal: retrying means starting a new build.

use crate::error::{PipelineError, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildState {
    #[default]
    Idle,
    Querying,
    Binding,
    Validating,
    Emitted,
    Failed,
}

impl BuildState {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Querying => "QUERYING",
            Self::Binding => "BINDING",
            Self::Validating => "VALIDATING",
            Self::Emitted => "EMITTED",
            Self::Failed => "FAILED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Emitted | Self::Failed)
    }

    pub const fn can_advance_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Emitted | Self::Failed, _) => false,
            (_, Self::Failed) => true,
            (Self::Idle, Self::Querying)
            | (Self::Querying, Self::Binding)
            | (Self::Binding, Self::Validating)
            | (Self::Validating, Self::Emitted) => true,
            _ => false,
        }
    }

    /// Move to `next`, rejecting transitions the machine does not allow.
    pub fn advance(&mut self, next: Self) -> Result<()> {
        if !self.can_advance_to(next) {
            return Err(PipelineError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    /// Record the outcome of a stage, moving to `Failed` on error.
    pub fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() && !self.is_terminal() {
            *self = Self::Failed;
        }
        result
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = BuildState::default();
        for next in [
            BuildState::Querying,
            BuildState::Binding,
            BuildState::Validating,
            BuildState::Emitted,
        ] {
            state.advance(next).unwrap();
        }
        assert_eq!(state, BuildState::Emitted);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut state = BuildState::Binding;
        state.advance(BuildState::Failed).unwrap();

        let err = state.advance(BuildState::Querying).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidTransition {
                from: BuildState::Failed,
                to: BuildState::Querying
            }
        ));
        assert!(state.advance(BuildState::Failed).is_err());
    }

    #[test]
    fn test_stages_cannot_be_skipped() {
        let mut state = BuildState::Idle;
        assert!(state.advance(BuildState::Validating).is_err());
        assert_eq!(state, BuildState::Idle);
    }

    #[test]
    fn test_track_marks_failure() {
        let mut state = BuildState::Querying;
        let result: Result<()> = state.track(Err(PipelineError::Cancelled));
        assert!(result.is_err());
        assert_eq!(state, BuildState::Failed);

        let mut state = BuildState::Querying;
        assert_eq!(state.track(Ok(3)).unwrap(), 3);
        assert_eq!(state, BuildState::Querying);
    }
}
