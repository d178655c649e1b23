//! Collaborators the interpreter drives while a cast runs.
//!
//! The interpreter never owns the world. Every side effect goes through a
//! [`CastHost`], which hands out the collaborators it has configured. The
//! [`CastEnv`] aggregate assembles a host from independent borrowed parts;
//! [`RecordingHost`] implements everything in memory for tools and tests.
mod animation;
mod damage;
mod effects;
mod error;
mod movement;
mod owner;
mod recording;
mod rng;

pub use animation::AnimationFeedback;
pub use damage::{
    DamageSnapshot, DamageSnapshotFactory, Damageable, DamageableQuery, StatDamageFactory,
};
pub use effects::{EffectHandle, EffectRequest, EffectSpawner};
pub use error::EnvError;
pub use movement::MovementLock;
pub use owner::OwnerOracle;
pub use recording::{HostCall, RecordingHost, TrainingDummy};
pub use rng::{PcgRng, RngOracle, compute_seed};

/// Access to the collaborators of one casting entity.
///
/// Each accessor fails with [`EnvError`] when the collaborator is not
/// configured; the interpreter logs the failure and skips that side effect.
pub trait CastHost {
    fn owner(&self) -> Result<&dyn OwnerOracle, EnvError>;

    fn movement(&mut self) -> Result<&mut dyn MovementLock, EnvError>;

    fn animation(&mut self) -> Result<&mut dyn AnimationFeedback, EnvError>;

    fn effects(&mut self) -> Result<&mut dyn EffectSpawner, EnvError>;

    fn damageables(&mut self) -> Result<&mut dyn DamageableQuery, EnvError>;

    fn damage_factory(&mut self) -> Result<&mut dyn DamageSnapshotFactory, EnvError>;

    /// Clears the owner's casting flag once the cast has been cleaned up.
    fn clear_casting(&mut self) {}
}

/// Aggregates borrowed collaborators into a [`CastHost`].
#[derive(Default)]
pub struct CastEnv<'a> {
    owner: Option<&'a dyn OwnerOracle>,
    movement: Option<&'a mut dyn MovementLock>,
    animation: Option<&'a mut dyn AnimationFeedback>,
    effects: Option<&'a mut dyn EffectSpawner>,
    damageables: Option<&'a mut dyn DamageableQuery>,
    damage_factory: Option<&'a mut dyn DamageSnapshotFactory>,
}

impl<'a> CastEnv<'a> {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_owner(mut self, owner: &'a dyn OwnerOracle) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_movement(mut self, movement: &'a mut dyn MovementLock) -> Self {
        self.movement = Some(movement);
        self
    }

    pub fn with_animation(mut self, animation: &'a mut dyn AnimationFeedback) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn with_effects(mut self, effects: &'a mut dyn EffectSpawner) -> Self {
        self.effects = Some(effects);
        self
    }

    pub fn with_damageables(mut self, damageables: &'a mut dyn DamageableQuery) -> Self {
        self.damageables = Some(damageables);
        self
    }

    pub fn with_damage_factory(mut self, factory: &'a mut dyn DamageSnapshotFactory) -> Self {
        self.damage_factory = Some(factory);
        self
    }
}

impl CastHost for CastEnv<'_> {
    fn owner(&self) -> Result<&dyn OwnerOracle, EnvError> {
        self.owner.ok_or(EnvError::OwnerNotAvailable)
    }

    fn movement(&mut self) -> Result<&mut dyn MovementLock, EnvError> {
        let movement = self
            .movement
            .as_deref_mut()
            .ok_or(EnvError::MovementNotAvailable)?;
        Ok(movement)
    }

    fn animation(&mut self) -> Result<&mut dyn AnimationFeedback, EnvError> {
        let animation = self
            .animation
            .as_deref_mut()
            .ok_or(EnvError::AnimationNotAvailable)?;
        Ok(animation)
    }

    fn effects(&mut self) -> Result<&mut dyn EffectSpawner, EnvError> {
        let effects = self
            .effects
            .as_deref_mut()
            .ok_or(EnvError::EffectsNotAvailable)?;
        Ok(effects)
    }

    fn damageables(&mut self) -> Result<&mut dyn DamageableQuery, EnvError> {
        let damageables = self
            .damageables
            .as_deref_mut()
            .ok_or(EnvError::DamageQueryNotAvailable)?;
        Ok(damageables)
    }

    fn damage_factory(&mut self) -> Result<&mut dyn DamageSnapshotFactory, EnvError> {
        let factory = self
            .damage_factory
            .as_deref_mut()
            .ok_or(EnvError::DamageFactoryNotAvailable)?;
        Ok(factory)
    }
}
