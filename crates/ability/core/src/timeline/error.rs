//! Activation errors.

use crate::error::{AbilityError, ErrorSeverity};

/// Configuration errors that prevent a cast from starting.
///
/// When activation fails no interpreter exists, so no collaborator has been
/// touched and there is nothing to clean up.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActivationError {
    #[error("recipe '{recipe}' has no steps")]
    EmptyRecipe { recipe: String },

    #[error("recipe '{recipe}' has no step that can run")]
    NoValidSteps { recipe: String },
}

impl AbilityError for ActivationError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ActivationError::EmptyRecipe { .. } => ErrorSeverity::Fatal,
            ActivationError::NoValidSteps { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ActivationError::EmptyRecipe { .. } => "ACTIVATION_EMPTY_RECIPE",
            ActivationError::NoValidSteps { .. } => "ACTIVATION_NO_VALID_STEPS",
        }
    }
}
