//! Common error infrastructure for ability-core.
//!
//! Domain-specific errors (`ActivationError`, `StepError`, `EnvError`) live next
//! to the code that raises them and share the severity classification below.
//!
//! # Propagation
//!
//! Only activation can fail outright. Everything that goes wrong while a cast
//! is running is reported through `tracing` and contained to the step that
//! caused it, so one broken step never disturbs the schedule of another.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the cast continues, the offending step is skipped
/// - **Validation**: authored data is invalid and must be fixed offline
/// - **Internal**: an invariant of the engine was violated
/// - **Fatal**: the cast cannot run at all
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - the step is skipped and the cast continues.
    ///
    /// Examples: collaborator not configured, dependency never produced
    Recoverable,

    /// Validation error - malformed authored data.
    ///
    /// Examples: unknown step kind, result index outside the recipe
    Validation,

    /// Internal error - unexpected state inconsistency.
    Internal,

    /// Fatal error - nothing can be executed.
    ///
    /// Examples: empty recipe
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common interface implemented by every error enum in the crate.
pub trait AbilityError: std::error::Error {
    /// Returns the severity classification of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a stable, machine-readable error code.
    fn error_code(&self) -> &'static str;
}
