//! Step domain - registry, entries and parameter resolution.
//!
//! # Module Structure
//!
//! - `kind`: Closed enum of step kinds (`StepKind`) and their stable ids
//! - `param`: Typed parameter values and sparse tables
//! - `definition`: Shared, immutable definitions and the `StepRegistry`
//! - `entry`: One placement of a definition on a timeline (`StepEntry`)
//! - `resolve`: Per-cast resolution of entries into typed `ResolvedStep`s
//! - `error`: Per-step diagnostics (`StepError`)

pub mod definition;
pub mod entry;
pub mod error;
pub mod kind;
pub mod param;
pub mod resolve;

pub use definition::{StepDefinition, StepRegistry};
pub use entry::StepEntry;
pub use error::StepError;
pub use kind::StepKind;
pub use param::{ObjectRef, ParamTable, ParamValue, keys};
pub use resolve::{
    DamageCircleParams, DamageRectangleParams, Dependency, ResolvedStep, SpawnEffectParams,
    StepOp,
};

use std::fmt;

/// Position of an entry in its recipe's top-level step list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StepIndex(pub usize);

impl StepIndex {
    /// Converts an authored index where negative values mean "none".
    pub fn from_authored(value: i64) -> Option<Self> {
        usize::try_from(value).ok().map(StepIndex)
    }
}

impl fmt::Display for StepIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
