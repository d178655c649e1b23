//! Damage collaborators: target queries, snapshots and the snapshot factory.

use glam::Vec2;

use crate::stats::{StatKind, StatSnapshot};

use super::rng::{PcgRng, RngOracle, compute_seed};

/// Damage rolled once per firing and applied to every target it hits.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageSnapshot {
    pub amount: f32,
    pub critical: bool,
    /// Step multiplier the snapshot was created with.
    pub multiplier: f32,
}

/// An entity that can receive damage.
pub trait Damageable {
    fn take_damage(&mut self, snapshot: &DamageSnapshot);
}

/// Physical overlap query returning the damageable entities inside a shape.
pub trait DamageableQuery {
    fn query_circle(&mut self, center: Vec2, radius: f32) -> Vec<&mut dyn Damageable>;

    /// `size` is `(length, width)`; `angle` rotates the length axis from +x, in radians.
    fn query_rectangle(&mut self, center: Vec2, size: Vec2, angle: f32)
    -> Vec<&mut dyn Damageable>;
}

/// Builds the damage snapshot of one firing from the owner's stats.
pub trait DamageSnapshotFactory {
    fn create(&mut self, stats: &StatSnapshot, multiplier: f32) -> DamageSnapshot;
}

/// Default factory: `base_damage × multiplier`, with one critical roll per
/// firing against `crit_chance`.
#[derive(Clone, Debug)]
pub struct StatDamageFactory {
    seed: u64,
    cast: u64,
    firings: u32,
    rng: PcgRng,
}

impl StatDamageFactory {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            cast: 0,
            firings: 0,
            rng: PcgRng,
        }
    }

    /// Starts a new cast: later firings roll from a fresh seed sequence.
    pub fn begin_cast(&mut self, cast: u64) {
        self.cast = cast;
        self.firings = 0;
    }

    /// Number of snapshots created since the last `begin_cast`.
    pub fn firings(&self) -> u32 {
        self.firings
    }
}

impl Default for StatDamageFactory {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DamageSnapshotFactory for StatDamageFactory {
    fn create(&mut self, stats: &StatSnapshot, multiplier: f32) -> DamageSnapshot {
        let seed = compute_seed(self.seed, self.cast, self.firings);
        self.firings = self.firings.wrapping_add(1);

        let chance = stats.get(StatKind::CritChance).clamp(0.0, 1.0);
        let critical = chance > 0.0 && self.rng.unit_f32(seed) < chance;

        let mut amount = stats.get(StatKind::BaseDamage) * multiplier;
        if critical {
            amount *= stats.get(StatKind::CritMultiplier);
        }

        tracing::trace!(amount, critical, multiplier, "rolled damage snapshot");
        DamageSnapshot {
            amount,
            critical,
            multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_scales_with_base_damage_and_multiplier() {
        let stats = StatSnapshot::neutral().with(StatKind::BaseDamage, 10.0);
        let snapshot = StatDamageFactory::new(3).create(&stats, 1.5);
        assert_eq!(snapshot.amount, 15.0);
        assert!(!snapshot.critical);
    }

    #[test]
    fn certain_crit_applies_multiplier() {
        let stats = StatSnapshot::neutral()
            .with(StatKind::BaseDamage, 10.0)
            .with(StatKind::CritChance, 1.0)
            .with(StatKind::CritMultiplier, 2.0);
        let snapshot = StatDamageFactory::new(3).create(&stats, 1.0);
        assert!(snapshot.critical);
        assert_eq!(snapshot.amount, 20.0);
    }

    #[test]
    fn replaying_a_cast_replays_its_rolls() {
        let stats = StatSnapshot::neutral()
            .with(StatKind::BaseDamage, 10.0)
            .with(StatKind::CritChance, 0.5);
        let roll = |factory: &mut StatDamageFactory| {
            factory.begin_cast(9);
            (0..16)
                .map(|_| factory.create(&stats, 1.0).critical)
                .collect::<Vec<_>>()
        };
        let mut factory = StatDamageFactory::new(77);
        let first = roll(&mut factory);
        assert_eq!(factory.firings(), 16);
        assert_eq!(roll(&mut factory), first);
    }
}
