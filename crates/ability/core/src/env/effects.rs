//! Visual effect spawning.

use glam::Vec2;

use crate::step::ObjectRef;

/// Opaque handle returned by an [`EffectSpawner`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectHandle(pub u64);

/// Everything a spawner needs to place one effect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectRequest {
    /// Asset reference, when the step names one.
    pub asset: Option<ObjectRef>,
    pub position: Vec2,
    pub scale: f32,
    /// Unit facing direction of the owner.
    pub facing: Vec2,
    /// Seconds, already scaled by cast speed.
    pub lifetime: f32,
}

pub trait EffectSpawner {
    fn spawn(&mut self, request: &EffectRequest) -> EffectHandle;
}
