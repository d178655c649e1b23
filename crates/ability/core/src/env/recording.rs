//! In-memory host recording every collaborator call.

use glam::Vec2;

use super::animation::AnimationFeedback;
use super::damage::{
    DamageSnapshot, DamageSnapshotFactory, Damageable, DamageableQuery, StatDamageFactory,
};
use super::effects::{EffectHandle, EffectRequest, EffectSpawner};
use super::error::EnvError;
use super::movement::MovementLock;
use super::owner::OwnerOracle;
use super::CastHost;
use crate::stats::StatSnapshot;

/// One collaborator call observed by a [`RecordingHost`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HostCall {
    SetLocked(bool),
    BeginWindup,
    WindupPhase(f32),
    SnapToStrike,
    RecoveryPhase(f32),
    ResetAnimation,
    Spawn(EffectRequest),
    CreateSnapshot {
        multiplier: f32,
    },
    QueryCircle {
        center: Vec2,
        radius: f32,
        hits: Vec<u32>,
    },
    QueryRectangle {
        center: Vec2,
        size: Vec2,
        angle: f32,
        hits: Vec<u32>,
    },
    ClearCasting,
}

/// Circular damage target owned by a [`RecordingHost`].
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingDummy {
    pub id: u32,
    pub position: Vec2,
    pub radius: f32,
    pub hits: Vec<DamageSnapshot>,
}

impl TrainingDummy {
    pub fn new(id: u32, position: Vec2, radius: f32) -> Self {
        Self {
            id,
            position,
            radius,
            hits: Vec::new(),
        }
    }

    pub fn total_damage(&self) -> f32 {
        self.hits.iter().map(|hit| hit.amount).sum()
    }

    fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        self.position.distance(center) <= radius + self.radius
    }

    fn overlaps_rectangle(&self, center: Vec2, size: Vec2, angle: f32) -> bool {
        let local = Vec2::from_angle(-angle).rotate(self.position - center);
        let half = size * 0.5 + Vec2::splat(self.radius);
        local.x.abs() <= half.x && local.y.abs() <= half.y
    }
}

impl Damageable for TrainingDummy {
    fn take_damage(&mut self, snapshot: &DamageSnapshot) {
        self.hits.push(*snapshot);
    }
}

/// Host implementing every collaborator in memory.
///
/// Calls are appended to [`RecordingHost::calls`] in the order the
/// interpreter made them.
#[derive(Clone, Debug)]
pub struct RecordingHost {
    pub position: Vec2,
    pub active: bool,
    pub locked: bool,
    pub casting: bool,
    pub calls: Vec<HostCall>,
    pub dummies: Vec<TrainingDummy>,
    pub factory: StatDamageFactory,
    next_handle: u64,
}

impl RecordingHost {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            active: true,
            locked: false,
            casting: true,
            calls: Vec::new(),
            dummies: Vec::new(),
            factory: StatDamageFactory::default(),
            next_handle: 0,
        }
    }

    pub fn with_dummy(mut self, dummy: TrainingDummy) -> Self {
        self.dummies.push(dummy);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.factory = StatDamageFactory::new(seed);
        self
    }

    pub fn dummy(&self, id: u32) -> Option<&TrainingDummy> {
        self.dummies.iter().find(|dummy| dummy.id == id)
    }

    /// Drains the recorded calls.
    pub fn take_calls(&mut self) -> Vec<HostCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl OwnerOracle for RecordingHost {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl MovementLock for RecordingHost {
    fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
        self.calls.push(HostCall::SetLocked(locked));
    }
}

impl AnimationFeedback for RecordingHost {
    fn begin_windup(&mut self) {
        self.calls.push(HostCall::BeginWindup);
    }

    fn set_windup_phase(&mut self, phase: f32) {
        self.calls.push(HostCall::WindupPhase(phase));
    }

    fn snap_to_strike(&mut self) {
        self.calls.push(HostCall::SnapToStrike);
    }

    fn set_recovery_phase(&mut self, phase: f32) {
        self.calls.push(HostCall::RecoveryPhase(phase));
    }

    fn reset(&mut self) {
        self.calls.push(HostCall::ResetAnimation);
    }
}

impl EffectSpawner for RecordingHost {
    fn spawn(&mut self, request: &EffectRequest) -> EffectHandle {
        self.calls.push(HostCall::Spawn(request.clone()));
        self.next_handle += 1;
        EffectHandle(self.next_handle)
    }
}

impl DamageableQuery for RecordingHost {
    fn query_circle(&mut self, center: Vec2, radius: f32) -> Vec<&mut dyn Damageable> {
        let hits = self
            .dummies
            .iter()
            .filter(|dummy| dummy.overlaps_circle(center, radius))
            .map(|dummy| dummy.id)
            .collect::<Vec<_>>();
        self.calls.push(HostCall::QueryCircle {
            center,
            radius,
            hits,
        });
        self.dummies
            .iter_mut()
            .filter(|dummy| dummy.overlaps_circle(center, radius))
            .map(|dummy| dummy as &mut dyn Damageable)
            .collect()
    }

    fn query_rectangle(
        &mut self,
        center: Vec2,
        size: Vec2,
        angle: f32,
    ) -> Vec<&mut dyn Damageable> {
        let hits = self
            .dummies
            .iter()
            .filter(|dummy| dummy.overlaps_rectangle(center, size, angle))
            .map(|dummy| dummy.id)
            .collect::<Vec<_>>();
        self.calls.push(HostCall::QueryRectangle {
            center,
            size,
            angle,
            hits,
        });
        self.dummies
            .iter_mut()
            .filter(|dummy| dummy.overlaps_rectangle(center, size, angle))
            .map(|dummy| dummy as &mut dyn Damageable)
            .collect()
    }
}

impl DamageSnapshotFactory for RecordingHost {
    fn create(&mut self, stats: &StatSnapshot, multiplier: f32) -> DamageSnapshot {
        self.calls.push(HostCall::CreateSnapshot { multiplier });
        self.factory.create(stats, multiplier)
    }
}

impl CastHost for RecordingHost {
    fn owner(&self) -> Result<&dyn OwnerOracle, EnvError> {
        Ok(self)
    }

    fn movement(&mut self) -> Result<&mut dyn MovementLock, EnvError> {
        Ok(self)
    }

    fn animation(&mut self) -> Result<&mut dyn AnimationFeedback, EnvError> {
        Ok(self)
    }

    fn effects(&mut self) -> Result<&mut dyn EffectSpawner, EnvError> {
        Ok(self)
    }

    fn damageables(&mut self) -> Result<&mut dyn DamageableQuery, EnvError> {
        Ok(self)
    }

    fn damage_factory(&mut self) -> Result<&mut dyn DamageSnapshotFactory, EnvError> {
        Ok(self)
    }

    fn clear_casting(&mut self) {
        self.casting = false;
        self.calls.push(HostCall::ClearCasting);
    }
}
