/// Engine tuning constants and tolerances used by the timeline interpreter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Tolerance for normalized-clock comparisons and for clamping inverted
    /// duration windows (`end = start + epsilon`).
    pub percent_epsilon: f32,

    /// Lower bound applied to attack speed before computing the cast duration.
    pub min_attack_speed: f32,

    /// Lower bound applied to cast speed before scaling effect lifetimes.
    pub min_cast_speed: f32,

    /// Shortest channel iteration accepted; shorter values are raised to this.
    pub min_channel_tick: f32,

    /// Seconds a deferred trigger may keep waiting once nothing else in the
    /// cast can run. Pending triggers still waiting after that are abandoned.
    pub deferred_timeout: f32,
}

impl EngineConfig {
    // ===== runtime-tunable defaults =====
    pub const DEFAULT_PERCENT_EPSILON: f32 = 1e-4;
    pub const DEFAULT_MIN_ATTACK_SPEED: f32 = 1e-4;
    pub const DEFAULT_MIN_CAST_SPEED: f32 = 1e-4;
    pub const DEFAULT_MIN_CHANNEL_TICK: f32 = 0.01;
    pub const DEFAULT_DEFERRED_TIMEOUT: f32 = 10.0;

    pub fn new() -> Self {
        Self {
            percent_epsilon: Self::DEFAULT_PERCENT_EPSILON,
            min_attack_speed: Self::DEFAULT_MIN_ATTACK_SPEED,
            min_cast_speed: Self::DEFAULT_MIN_CAST_SPEED,
            min_channel_tick: Self::DEFAULT_MIN_CHANNEL_TICK,
            deferred_timeout: Self::DEFAULT_DEFERRED_TIMEOUT,
        }
    }

    pub fn with_deferred_timeout(mut self, seconds: f32) -> Self {
        self.deferred_timeout = seconds;
        self
    }

    /// Total cast duration in seconds for the given attack speed.
    pub fn total_duration(&self, attack_speed: f32) -> f32 {
        1.0 / sanitize_speed(attack_speed, self.min_attack_speed)
    }

    /// Effect lifetime in seconds for a base duration scaled by cast speed.
    pub fn effect_lifetime(&self, base_duration: f32, cast_speed: f32) -> f32 {
        base_duration.max(0.0) / sanitize_speed(cast_speed, self.min_cast_speed)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn sanitize_speed(speed: f32, floor: f32) -> f32 {
    if speed.is_finite() {
        speed.max(floor)
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_duration_is_inverse_attack_speed() {
        let config = EngineConfig::new();
        assert!((config.total_duration(2.0) - 0.5).abs() < 1e-6);
        assert!((config.total_duration(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_or_invalid_attack_speed_is_floored() {
        let config = EngineConfig::new();
        let expected = 1.0 / EngineConfig::DEFAULT_MIN_ATTACK_SPEED;
        assert_eq!(config.total_duration(0.0), expected);
        assert_eq!(config.total_duration(-3.0), expected);
        assert_eq!(config.total_duration(f32::NAN), expected);
    }

    #[test]
    fn effect_lifetime_scales_with_cast_speed() {
        let config = EngineConfig::new();
        assert!((config.effect_lifetime(1.2, 2.0) - 0.6).abs() < 1e-6);
        assert_eq!(config.effect_lifetime(-1.0, 1.0), 0.0);
    }
}
