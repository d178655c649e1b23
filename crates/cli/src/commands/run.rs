//! Cast one recipe against a recording host and print what happened.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ability_content::RecipeLibrary;
use ability_core::{
    CastOutcome, ExecutionContext, HostCall, Recipe, RecordingHost, StatKind, StatSnapshot,
    TickReport, TrainingDummy,
};
use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use glam::Vec2;
use runtime::{AbilitySlots, RuntimeConfig, SlotReport};
use serde::Serialize;

/// Cast one recipe and print its dispatch trace
#[derive(Parser)]
pub struct RunCast {
    /// Recipe name from the library, or a path to a `.ron` recipe file
    #[arg(value_name = "RECIPE")]
    recipe: String,

    /// Frame delta in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Attack speed stat (the cast lasts 1 / attack speed seconds)
    #[arg(long, default_value_t = 1.0)]
    attack_speed: f32,

    /// Cast speed stat (divides effect lifetimes)
    #[arg(long, default_value_t = 1.0)]
    cast_speed: f32,

    /// Area of effect stat
    #[arg(long, default_value_t = 1.0)]
    area: f32,

    /// Base damage stat
    #[arg(long, default_value_t = 10.0)]
    base_damage: f32,

    /// Critical hit chance in [0, 1]
    #[arg(long, default_value_t = 0.0)]
    crit_chance: f32,

    /// Facing angle in degrees (0 faces +X)
    #[arg(long, default_value_t = 0.0)]
    facing: f32,

    /// Damage roll seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Training dummy as `x,y` or `x,y,radius` (repeatable)
    #[arg(long = "dummy", value_name = "X,Y[,R]", value_parser = parse_dummy)]
    dummies: Vec<(Vec2, f32)>,

    /// Cancel the cast once this many seconds have elapsed
    #[arg(long, value_name = "SECONDS")]
    cancel_at: Option<f32>,

    /// Disable the caster once this many seconds have elapsed
    #[arg(long, value_name = "SECONDS")]
    disable_at: Option<f32>,

    /// Give up and clean up after this many simulated seconds
    #[arg(long, default_value_t = 60.0)]
    max_seconds: f32,

    /// Pace frames in real time instead of simulating instantly
    #[arg(long)]
    realtime: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Styled dispatch list per frame
    Summary,
    /// Full JSON trace (frames, host calls, dummy totals)
    Json,
}

/// One simulated frame.
#[derive(Serialize)]
struct Frame {
    elapsed: f32,
    #[serde(flatten)]
    report: TickReport,
}

#[derive(Serialize)]
struct DummyTotals {
    id: u32,
    hits: usize,
    damage: f32,
}

#[derive(Serialize)]
struct Trace<'a> {
    recipe: &'a str,
    dt: f32,
    total_duration: f32,
    outcome: Option<CastOutcome>,
    frames: &'a [Frame],
    dummies: Vec<DummyTotals>,
    calls: &'a [HostCall],
}

impl RunCast {
    pub async fn execute(self, config: &RuntimeConfig) -> Result<()> {
        anyhow::ensure!(
            self.dt.is_finite() && self.dt > 0.0,
            "Frame delta must be a positive number of seconds, got {}",
            self.dt
        );

        let engine = config
            .load_engine_config()
            .context("Failed to load engine configuration")?;
        let mut library = config
            .load_library()
            .context("Failed to load recipe library")?;
        let recipe = self.resolve_recipe(&mut library)?;

        let stats = StatSnapshot::neutral()
            .with(StatKind::AttackSpeed, self.attack_speed)
            .with(StatKind::CastSpeed, self.cast_speed)
            .with(StatKind::AreaOfEffect, self.area)
            .with(StatKind::BaseDamage, self.base_damage)
            .with(StatKind::CritChance, self.crit_chance);
        let facing = Vec2::from_angle(self.facing.to_radians());
        let context = ExecutionContext::from_snapshot(stats, facing, &engine);
        let total_duration = context.total_duration;

        let mut host = self
            .dummies
            .iter()
            .zip(1..)
            .fold(RecordingHost::default().with_seed(self.seed), |host, (&(position, radius), id)| {
                host.with_dummy(TrainingDummy::new(id, position, radius))
            });

        let mut slots = AbilitySlots::new(1, engine);
        slots.cast(0, Arc::clone(&recipe), context)?;
        tracing::info!(recipe = %recipe.name, total_duration, "simulating cast");

        let (frames, outcome) = self.simulate(&mut slots, &mut host).await?;

        match self.format {
            OutputFormat::Summary => {
                print_summary(&recipe, total_duration, &frames, outcome, &host);
            }
            OutputFormat::Json => {
                let trace = Trace {
                    recipe: &recipe.name,
                    dt: self.dt,
                    total_duration,
                    outcome,
                    frames: &frames,
                    dummies: dummy_totals(&host),
                    calls: &host.calls,
                };
                let json = serde_json::to_string_pretty(&trace)
                    .context("Failed to serialize trace to JSON")?;
                println!("{}", json);
            }
        }

        Ok(())
    }

    fn resolve_recipe(&self, library: &mut RecipeLibrary) -> Result<Arc<Recipe>> {
        let path = Path::new(&self.recipe);
        if path.extension().is_some_and(|ext| ext == "ron") {
            return library
                .load_file(path)
                .with_context(|| format!("Failed to load recipe file: {}", path.display()));
        }

        library.get(&self.recipe).with_context(|| {
            format!(
                "Unknown recipe '{}'\n\nHint: available recipes are {}",
                self.recipe,
                library.names().collect::<Vec<_>>().join(", ")
            )
        })
    }

    async fn simulate(
        &self,
        slots: &mut AbilitySlots,
        host: &mut RecordingHost,
    ) -> Result<(Vec<Frame>, Option<CastOutcome>)> {
        let mut pacer = self
            .realtime
            .then(|| tokio::time::interval(Duration::from_secs_f32(self.dt)));
        let mut cancel_at = self.cancel_at;
        let mut elapsed = 0.0;
        let mut frames = Vec::new();
        let mut outcome = None;

        while slots.is_casting(0) {
            if let Some(interval) = pacer.as_mut() {
                interval.tick().await;
            }

            if cancel_at.is_some_and(|at| elapsed >= at) {
                cancel_at = None;
                slots.cancel(0)?;
                tracing::info!(elapsed, "cast cancelled");
            }
            if self.disable_at.is_some_and(|at| elapsed >= at) {
                host.active = false;
            }

            let reports = if elapsed >= self.max_seconds {
                tracing::warn!(elapsed, "simulation limit reached, disabling caster");
                slots.disable(host)
            } else {
                elapsed += self.dt;
                slots.tick(self.dt, host)
            };

            for SlotReport { report, .. } in reports {
                if let Some(finished) = report.phase.outcome() {
                    outcome = Some(finished);
                }
                frames.push(Frame { elapsed, report });
            }
        }

        Ok((frames, outcome))
    }
}

fn print_summary(
    recipe: &Recipe,
    total_duration: f32,
    frames: &[Frame],
    outcome: Option<CastOutcome>,
    host: &RecordingHost,
) {
    println!("{} {}", style("Recipe:").bold().cyan(), recipe.name);
    println!(
        "{} {:.3}s ({} steps)",
        style("Duration:").bold().cyan(),
        total_duration,
        recipe.len()
    );
    println!();

    println!("{}", style("=== Dispatches ===").bold().green());
    for frame in frames.iter().filter(|frame| !frame.report.is_empty()) {
        println!(
            "{} {}",
            style(format!("{:>8.3}s", frame.elapsed)).dim(),
            style(format!("T={:.3} {:?}", frame.report.clock, frame.report.phase)).yellow()
        );
        for dispatch in &frame.report.dispatches {
            println!("           {}", dispatch);
        }
        if frame.report.cleanup {
            println!("           {}", style("cleanup").bold());
        }
    }
    println!();

    println!("{}", style("Result:").bold().yellow());
    match outcome {
        Some(outcome) => println!("  Outcome: {:?}", outcome),
        None => println!("  Outcome: unfinished"),
    }
    println!("  Frames: {}", frames.len());
    println!("  Host calls: {}", host.calls.len());
    println!("  Movement locked: {}", host.locked);

    let dummies = dummy_totals(host);
    if !dummies.is_empty() {
        println!();
        println!("{}", style("Dummies:").bold().yellow());
        for dummy in dummies {
            println!(
                "  Dummy {} - hits: {}, damage: {:.1}",
                dummy.id, dummy.hits, dummy.damage
            );
        }
    }
}

fn dummy_totals(host: &RecordingHost) -> Vec<DummyTotals> {
    host.dummies
        .iter()
        .map(|dummy| DummyTotals {
            id: dummy.id,
            hits: dummy.hits.len(),
            damage: dummy.total_damage(),
        })
        .collect()
}

fn parse_dummy(value: &str) -> Result<(Vec2, f32), String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| format!("invalid dummy '{value}': {error}"))?;

    match parts.as_slice() {
        [x, y] => Ok((Vec2::new(*x, *y), 0.5)),
        [x, y, radius] if *radius >= 0.0 => Ok((Vec2::new(*x, *y), *radius)),
        _ => Err(format!("invalid dummy '{value}': expected X,Y or X,Y,RADIUS")),
    }
}
