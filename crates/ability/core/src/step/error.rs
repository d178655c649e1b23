//! Per-step diagnostics.
//!
//! None of these abort a cast: the step is skipped (or never fires) and the
//! error is reported through `tracing`.

use crate::env::EnvError;
use crate::error::{AbilityError, ErrorSeverity};

use super::StepIndex;

/// Errors raised while resolving or executing a single step.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    /// The entry's id does not name any registered step kind.
    #[error("unknown step kind '{0}'")]
    UnknownStepKind(String),

    /// A result lookup used an index outside the recipe.
    #[error("step result index {index} is outside the recipe ({len} steps)")]
    ResultIndexOutOfRange { index: StepIndex, len: usize },

    /// The step depends on a result that was never produced.
    #[error("step depends on step {dependency} which produced no result")]
    MissingDependency { dependency: StepIndex },

    /// A collaborator needed by the step is not configured on the host.
    #[error(transparent)]
    Collaborator(#[from] EnvError),
}

impl AbilityError for StepError {
    fn severity(&self) -> ErrorSeverity {
        use StepError::*;
        match self {
            UnknownStepKind(_) | ResultIndexOutOfRange { .. } => ErrorSeverity::Validation,
            MissingDependency { .. } => ErrorSeverity::Recoverable,
            Collaborator(error) => error.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        use StepError::*;
        match self {
            UnknownStepKind(_) => "STEP_UNKNOWN_KIND",
            ResultIndexOutOfRange { .. } => "STEP_RESULT_INDEX_OUT_OF_RANGE",
            MissingDependency { .. } => "STEP_MISSING_DEPENDENCY",
            Collaborator(error) => error.error_code(),
        }
    }
}
