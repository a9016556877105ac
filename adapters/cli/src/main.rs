#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Myth-Forge Defence combat headlessly.

mod script;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use myth_forge_core::{CombatConfig, Event, Level};
use myth_forge_simulation::{CombatLoop, PlayerCommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::script::ScriptedCommand;

const FIRST_TRIAL: &str = include_str!("../levels/first_trial.toml");
const VALLEY_OF_DEATH: &str = include_str!("../levels/valley_of_death.toml");

/// Levels bundled with the binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BuiltinLevel {
    /// "The First Trial".
    FirstTrial,
    /// "Valley of Death".
    ValleyOfDeath,
}

impl BuiltinLevel {
    fn source(self) -> &'static str {
        match self {
            Self::FirstTrial => FIRST_TRIAL,
            Self::ValleyOfDeath => VALLEY_OF_DEATH,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "myth-forge")]
#[command(about = "Runs a Myth-Forge Defence combat simulation without a window")]
struct Args {
    /// Bundled level to play
    #[arg(long, value_enum, default_value_t = BuiltinLevel::FirstTrial)]
    level: BuiltinLevel,

    /// Level TOML file used instead of a bundled level
    #[arg(long)]
    level_file: Option<PathBuf>,

    /// Combat configuration TOML overriding the default tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames simulated per second of run time
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,

    /// Run time limit in seconds
    #[arg(long, default_value_t = 300.0)]
    seconds: f32,

    /// Initial speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f32,

    /// Timed command such as `2.0:place:3:cannon`; repeatable
    #[arg(long = "script", value_name = "TIME:ACTION[:ARGS]")]
    script: Vec<ScriptedCommand>,
}

/// Tallies gathered from frame events for the final report.
#[derive(Debug, Default)]
struct Tally {
    kills: u32,
    escapes: u32,
    shots: u32,
    bonuses: u32,
    rejected: u32,
}

impl Tally {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::EnemyKilled { .. } => self.kills += 1,
                Event::EnemyReachedGoal { .. } => self.escapes += 1,
                Event::ProjectileFired { .. } => self.shots += 1,
                Event::WaveBonusAwarded { amount, .. } => self.bonuses += amount,
                Event::GameOver { outcome } => info!(?outcome, "campaign decided"),
                _ => {}
            }
        }
    }
}

/// Entry point for the Myth-Forge Defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let level = load_level(args.level, args.level_file.as_deref())?;
    let config = load_config(args.config.as_deref())?;
    let mut combat = CombatLoop::new(config, level).context("invalid combat configuration")?;

    if args.speed != 1.0 {
        combat
            .submit(PlayerCommand::SetSpeed {
                multiplier: args.speed,
            })
            .context("invalid initial speed multiplier")?;
    }

    let limit = Duration::try_from_secs_f32(args.seconds)
        .context("run time must be a non-negative number of seconds")?;
    let tally = run(&mut combat, &args, limit);
    print_summary(&combat, &tally);
    Ok(())
}

fn load_level(builtin: BuiltinLevel, file: Option<&Path>) -> Result<Level> {
    match file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read level file {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse level file {}", path.display()))
        }
        None => toml::from_str(builtin.source())
            .with_context(|| format!("bundled level {builtin:?} is malformed")),
    }
}

fn load_config(file: Option<&Path>) -> Result<CombatConfig> {
    let Some(path) = file else {
        return Ok(CombatConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Steps frames until the run time elapses or the campaign is decided.
fn run(combat: &mut CombatLoop, args: &Args, limit: Duration) -> Tally {
    let frame = Duration::from_secs_f64(1.0 / f64::from(args.fps));
    let mut script = args.script.clone();
    script.sort_by_key(|entry| entry.at);
    let mut pending = script.into_iter().peekable();

    let mut tally = Tally::default();
    let mut clock = Duration::ZERO;
    while clock < limit && combat.outcome().is_none() {
        while let Some(entry) = pending.next_if(|entry| entry.at <= clock) {
            if let Err(rejection) = combat.submit(entry.command) {
                tally.rejected += 1;
                warn!(at = ?entry.at, command = ?entry.command, %rejection, "scripted command rejected");
            }
        }

        tally.record(combat.step(frame));
        clock += frame;
    }
    tally
}

fn print_summary(combat: &CombatLoop, tally: &Tally) {
    let hud = combat.hud();
    let level = combat.level_name();
    let outcome = hud
        .outcome
        .map_or_else(|| String::from("undecided"), |outcome| format!("{outcome:?}"));

    println!("level: {level}");
    println!("outcome: {outcome}");
    println!("simulated: {:.1}s", combat.elapsed().as_secs_f32());
    println!(
        "wave: {}/{} (in progress: {})",
        hud.waves.current_wave, hud.waves.total_waves, hud.waves.wave_in_progress
    );
    println!("money: {}  lives: {}", hud.money, hud.lives);
    println!("towers: {}", combat.towers().iter().count());
    println!(
        "kills: {}  escapes: {}  shots: {}  bonuses: {}  rejected commands: {}",
        tally.kills, tally.escapes, tally.shots, tally.bonuses, tally.rejected
    );
}
