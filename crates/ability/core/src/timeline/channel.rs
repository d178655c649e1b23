//! Channel loop replaying a subset of steps once per iteration.
//!
//! Iteration `k` (1-based) spans `[(k - 1) * tick, k * tick)` of channel
//! time, which starts at zero when the main pass ends. Duration steps open
//! at the start of each iteration, progress every tick and close at the
//! boundary; instantaneous steps fire at the boundary.

use crate::config::EngineConfig;
use crate::env::CastHost;
use crate::recipe::ChannelSettings;
use crate::step::ResolvedStep;

use super::dispatch::Dispatcher;

#[derive(Clone, Debug)]
pub(crate) struct ChannelLoop {
    /// Channel steps in recipe order.
    steps: Vec<ResolvedStep>,
    tick: f32,
    iterations: u32,
    completed: u32,
    /// Duration steps of the current iteration have begun.
    open: bool,
    started_at: f32,
}

impl ChannelLoop {
    pub fn new(mut steps: Vec<ResolvedStep>, settings: &ChannelSettings, config: &EngineConfig) -> Self {
        steps.sort_by_key(|step| step.index);

        let tick = if settings.tick_duration.is_finite()
            && settings.tick_duration >= config.min_channel_tick
        {
            settings.tick_duration
        } else {
            tracing::warn!(
                tick = settings.tick_duration,
                min = config.min_channel_tick,
                "channel tick too short, raising to the minimum"
            );
            config.min_channel_tick
        };

        let max = if settings.max_duration.is_finite() && settings.max_duration >= 0.0 {
            settings.max_duration
        } else {
            tracing::warn!(max = settings.max_duration, "invalid channel limit, channel disabled");
            0.0
        };

        // Saturating float-to-int conversion.
        let iterations = (max / tick + config.percent_epsilon).floor() as u32;

        Self {
            steps,
            tick,
            iterations,
            completed: 0,
            open: false,
            started_at: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn is_done(&self) -> bool {
        self.steps.is_empty() || self.completed >= self.iterations
    }

    /// Starts the channel clock at cast time `now`.
    pub fn start(&mut self, now: f32) {
        self.started_at = now;
        tracing::debug!(
            iterations = self.iterations,
            tick = self.tick,
            steps = self.steps.len(),
            "channel started"
        );
    }

    /// Runs every iteration boundary reached by the dispatcher's clock.
    /// Returns `true` once the last iteration has closed.
    pub fn advance<H: CastHost + ?Sized>(&mut self, dispatcher: &mut Dispatcher<'_, H>) -> bool {
        let channel_time = dispatcher.now - self.started_at;
        let tolerance = dispatcher.config.percent_epsilon * self.tick;

        while !self.is_done() {
            let iteration_start = self.completed as f32 * self.tick;

            if !self.open {
                self.open = true;
                for step in self.steps.iter().filter(|step| step.is_duration_step()) {
                    dispatcher.begin(step);
                }
            }

            if channel_time + tolerance < iteration_start + self.tick {
                let phase = ((channel_time - iteration_start) / self.tick).clamp(0.0, 1.0);
                for step in self.steps.iter().filter(|step| step.is_duration_step()) {
                    dispatcher.progress(step, phase);
                }
                break;
            }

            for step in &self.steps {
                if step.is_parallel_group() {
                    dispatcher.fire(step);
                } else if step.is_duration_step() {
                    dispatcher.end(step);
                } else {
                    dispatcher.trigger(step);
                }
            }
            self.completed += 1;
            self.open = false;
            tracing::trace!(iteration = self.completed, "channel iteration closed");
        }

        self.is_done()
    }
}
