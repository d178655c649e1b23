use ability_core::{AbilityError, ActivationError, ErrorSeverity};

/// Errors raised by the ability slots.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// The slot index does not exist on this caster.
    #[error("ability slot {slot} out of range ({len} slots)")]
    SlotOutOfRange { slot: usize, len: usize },

    /// A cast is already running in the slot.
    #[error("ability slot {slot} is busy casting '{recipe}'")]
    SlotBusy { slot: usize, recipe: String },

    /// The recipe could not be activated.
    #[error(transparent)]
    Activation(#[from] ActivationError),
}

impl AbilityError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::SlotOutOfRange { .. } => ErrorSeverity::Validation,
            RuntimeError::SlotBusy { .. } => ErrorSeverity::Recoverable,
            RuntimeError::Activation(error) => error.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RuntimeError::SlotOutOfRange { .. } => "RUNTIME_SLOT_OUT_OF_RANGE",
            RuntimeError::SlotBusy { .. } => "RUNTIME_SLOT_BUSY",
            RuntimeError::Activation(error) => error.error_code(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
