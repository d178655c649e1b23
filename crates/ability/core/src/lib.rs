//! Timeline-driven ability execution.
//!
//! `ability-core` turns declarative recipes (ordered, percentage-timed steps
//! with an optional channel loop) into ordered side-effect dispatches against
//! a per-cast clock. It is pure logic: hosts plug their world in through the
//! collaborator traits in [`env`] and drive each cast with
//! [`TimelineInterpreter::tick`].
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod recipe;
pub mod stats;
pub mod step;
pub mod timeline;

pub use config::EngineConfig;
pub use context::{ExecutionContext, StepResult, StepResults};
pub use env::{
    AnimationFeedback, CastEnv, CastHost, DamageSnapshot, DamageSnapshotFactory, Damageable,
    DamageableQuery, EffectHandle, EffectRequest, EffectSpawner, EnvError, HostCall, MovementLock,
    OwnerOracle, RecordingHost, StatDamageFactory, TrainingDummy,
};
pub use error::{AbilityError, ErrorSeverity};
pub use recipe::{ChannelSettings, ChannelSpec, Recipe, RecipeSpec, StepSpec};
pub use stats::{StatKind, StatSnapshot, StatsProvider};
pub use step::{
    ObjectRef, ParamTable, ParamValue, ResolvedStep, StepDefinition, StepEntry, StepError,
    StepIndex, StepKind, StepOp, StepRegistry,
};
pub use timeline::{
    ActivationError, CastOutcome, CastPhase, Dispatch, Signal, TickReport, TimelineInterpreter,
};
