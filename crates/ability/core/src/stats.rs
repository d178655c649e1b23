//! Owner stats consumed by a cast.
//!
//! Stats are read through [`StatsProvider`] exactly once, when a cast is
//! activated, and frozen into a [`StatSnapshot`]. Later stat changes (level up,
//! equipment swap) never alter a cast that is already running.

use strum::{EnumCount, IntoEnumIterator};

/// Stats the engine reads from the owning entity.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
    strum::EnumCount,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatKind {
    /// Attacks per second; the cast lasts `1 / attack_speed` seconds.
    AttackSpeed,
    /// Multiplier applied to spawned effect lifetimes (divides them).
    CastSpeed,
    /// Multiplier applied to effect and damage area sizes.
    AreaOfEffect,
    /// Base damage before step multipliers.
    BaseDamage,
    /// Critical hit chance in `[0, 1]`.
    CritChance,
    /// Damage multiplier applied on a critical hit.
    CritMultiplier,
}

impl StatKind {
    /// Value assumed when a provider cannot supply a meaningful one.
    pub const fn neutral_value(self) -> f32 {
        match self {
            StatKind::AttackSpeed | StatKind::CastSpeed | StatKind::AreaOfEffect => 1.0,
            StatKind::BaseDamage | StatKind::CritChance => 0.0,
            StatKind::CritMultiplier => 1.5,
        }
    }
}

/// Live stats source of the owning entity.
pub trait StatsProvider {
    /// Returns the current value of a stat.
    fn value(&self, stat: StatKind) -> f32;
}

/// Frozen copy of every [`StatKind`] taken at activation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatSnapshot {
    values: [f32; StatKind::COUNT],
}

impl StatSnapshot {
    /// Reads every stat once from the provider.
    ///
    /// Non-finite values are replaced by the stat's neutral value so a broken
    /// provider cannot poison durations or area sizes.
    pub fn capture(provider: &(impl StatsProvider + ?Sized)) -> Self {
        let mut values = [0.0; StatKind::COUNT];
        for kind in StatKind::iter() {
            let value = provider.value(kind);
            values[kind as usize] = if value.is_finite() {
                value
            } else {
                tracing::warn!(stat = %kind, value, "non-finite stat value replaced");
                kind.neutral_value()
            };
        }
        Self { values }
    }

    /// Snapshot where every stat holds its neutral value.
    pub fn neutral() -> Self {
        let mut values = [0.0; StatKind::COUNT];
        for kind in StatKind::iter() {
            values[kind as usize] = kind.neutral_value();
        }
        Self { values }
    }

    /// Builder: override one stat.
    pub fn with(mut self, stat: StatKind, value: f32) -> Self {
        self.values[stat as usize] = value;
        self
    }

    pub fn get(&self, stat: StatKind) -> f32 {
        self.values[stat as usize]
    }

    pub fn attack_speed(&self) -> f32 {
        self.get(StatKind::AttackSpeed)
    }

    pub fn cast_speed(&self) -> f32 {
        self.get(StatKind::CastSpeed)
    }

    pub fn area_of_effect(&self) -> f32 {
        self.get(StatKind::AreaOfEffect)
    }
}

impl Default for StatSnapshot {
    fn default() -> Self {
        Self::neutral()
    }
}

impl StatsProvider for StatSnapshot {
    fn value(&self, stat: StatKind) -> f32 {
        self.get(stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStats;

    impl StatsProvider for BrokenStats {
        fn value(&self, stat: StatKind) -> f32 {
            match stat {
                StatKind::AttackSpeed => f32::NAN,
                StatKind::BaseDamage => 12.0,
                _ => f32::INFINITY,
            }
        }
    }

    #[test]
    fn capture_replaces_non_finite_values() {
        let snapshot = StatSnapshot::capture(&BrokenStats);
        assert_eq!(snapshot.attack_speed(), 1.0);
        assert_eq!(snapshot.get(StatKind::BaseDamage), 12.0);
        assert_eq!(snapshot.get(StatKind::CritMultiplier), 1.5);
    }

    #[test]
    fn snapshot_is_detached_from_provider() {
        let live = StatSnapshot::neutral().with(StatKind::AttackSpeed, 2.0);
        let frozen = StatSnapshot::capture(&live);
        let _live = live.with(StatKind::AttackSpeed, 4.0);
        assert_eq!(frozen.attack_speed(), 2.0);
    }

    #[test]
    fn stat_names_parse_case_insensitively() {
        assert_eq!("Area_Of_Effect".parse::<StatKind>(), Ok(StatKind::AreaOfEffect));
        assert_eq!(StatKind::CritChance.as_ref(), "crit_chance");
    }
}
