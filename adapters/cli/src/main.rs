#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Skirmish battle headlessly.

mod summary;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use skirmish_core::{assets::CatalogAssets, Command, MapDefinition, RulesBook, SimulationConfig};
use skirmish_rendering::{Color, HeadlessBackend, Presentation, RenderingBackend, Scene};
use skirmish_world::{self as world, query, World};
use tracing::info;
use tracing_subscriber::EnvFilter;

use summary::BattleSummary;

/// Frames composited per simulation tick.
const FRAMES_PER_TICK: u32 = 2;

/// Command-line arguments accepted by the headless runner.
#[derive(Debug, Parser)]
#[command(name = "skirmish", about = "Runs a Skirmish battle without a window")]
struct CliArgs {
    /// Rules tables in TOML.
    #[arg(long, value_name = "PATH")]
    rules: PathBuf,
    /// Map definition in TOML.
    #[arg(long, value_name = "PATH")]
    map: PathBuf,
    /// Simulation tunables in TOML; defaults apply when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 300)]
    ticks: u32,
    /// Viewport width in pixels.
    #[arg(long, default_value_t = 640.0)]
    width: f32,
    /// Viewport height in pixels.
    #[arg(long, default_value_t = 400.0)]
    height: f32,
    /// Draws impassable cells and facing vectors.
    #[arg(long)]
    debug: bool,
}

/// Entry point for the Skirmish command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let rules = fs::read_to_string(&args.rules)
        .with_context(|| format!("failed to read rules from {}", args.rules.display()))?;
    let rules = RulesBook::from_toml_str(&rules).context("invalid rules tables")?;
    let map = fs::read_to_string(&args.map)
        .with_context(|| format!("failed to read map from {}", args.map.display()))?;
    let map = MapDefinition::from_toml_str(&map).context("invalid map definition")?;
    let config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config from {}", path.display()))?;
            SimulationConfig::from_toml_str(&contents).context("invalid simulation config")?
        }
        None => SimulationConfig::default(),
    };

    let summary = run(&args, &map, rules, config)?;
    info!(ticks = summary.ticks(), fingerprint = summary.fingerprint(), "battle finished");
    println!("{summary}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(
    args: &CliArgs,
    map: &MapDefinition,
    rules: RulesBook,
    config: SimulationConfig,
) -> Result<BattleSummary> {
    let tick = config.tick_duration();
    let frame_time = tick / FRAMES_PER_TICK;
    let mut summary = BattleSummary::default();
    let mut events = Vec::new();
    let mut world = World::from_map(
        map,
        rules,
        config.clone(),
        Box::new(CatalogAssets::default()),
        &mut events,
    );
    summary.record(&events);
    world::apply(
        &mut world,
        Command::ResizeViewport {
            size: Vec2::new(args.width, args.height),
        },
        &mut events,
    );

    let mut scene = Scene::new(
        query::viewport(&world),
        map.columns,
        map.rows,
        config.fog_redraw_interval,
    );
    scene.debug = args.debug;
    let presentation = Presentation::new("Skirmish", Color::from_rgb_u8(0, 0, 0), scene);

    let mut pending = Duration::ZERO;
    let mut remaining = args.ticks;
    // One spare tick of frames absorbs the rounding of `frame_time`.
    let frames = args
        .ticks
        .saturating_add(1)
        .saturating_mul(FRAMES_PER_TICK);
    HeadlessBackend::new(frames, frame_time).run(presentation, |dt, scene| {
        pending += dt;
        while pending >= tick && remaining > 0 {
            pending -= tick;
            remaining -= 1;
            events.clear();
            world::apply(&mut world, Command::Tick, &mut events);
            summary.record(&events);
        }

        let _ = scene.fog.refresh(|mask| world::redraw_fog(&mut world, mask));
        scene.viewport = query::viewport(&world);
        scene.entities = query::entities(&world);
        scene.projectiles = query::projectiles(&world);
        scene.impassable = query::walkability(&world).blocked_cells().collect();
        scene.fog_visible = query::is_fow_visible(&world);
    })?;

    world.teardown();
    Ok(summary)
}
