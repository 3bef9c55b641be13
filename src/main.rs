//! framestep headless demo.
//!
//! Loads an engine configuration and a JSON scene, then simulates a number of
//! frames with a scripted input sequence and logs the event traffic. There is
//! no window: a logging [`SpriteRenderer`] stands in for the drawing backend.
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run -- --frames 120 --hold D@0..30 --hold Space@40..41
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use framestep::error::EngineResult;
use framestep::events::animation::{AnimationCompletedEvent, AnimationLoopedEvent};
use framestep::events::bus::EventBus;
use framestep::events::collision::{CollisionEnterEvent, TriggerEnterEvent};
use framestep::events::gameplay::ItemCollectedEvent;
use framestep::events::gamestate::{GamePausedEvent, GameResumedEvent, SceneChangedEvent};
use framestep::events::input::InputActionEvent;
use framestep::events::ui::UiButtonClickedEvent;
use framestep::game::{Scene, SceneManager};
use framestep::resources::gameconfig::EngineConfig;
use framestep::resources::input::{InputSnapshot, Key};
use framestep::systems::render::{RenderView, SpriteRenderer};
use framestep::template::SceneFile;
use framestep::world::World;

const DEFAULT_SCENE: &str = include_str!("../demos/arena.json");

/// framestep engine core, headless
#[derive(Parser)]
#[command(version, about = "Runs a framestep scene without a window and logs its events.")]
struct Cli {
    /// INI engine configuration. Defaults are used when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON scene file. The built-in arena is used when omitted.
    #[arg(long, value_name = "PATH")]
    scene: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Seconds per frame.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Hold a key over a frame range, e.g. `D@0..30`. Repeatable.
    #[arg(long = "hold", value_name = "KEY@START..END", value_parser = parse_hold)]
    holds: Vec<Hold>,

    /// Write the effective configuration to this path and exit.
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

/// A key held from `start` (inclusive) to `end` (exclusive).
#[derive(Debug, Clone, Copy)]
struct Hold {
    key: Key,
    start: u32,
    end: u32,
}

fn parse_hold(s: &str) -> Result<Hold, String> {
    let (key, range) = s
        .split_once('@')
        .ok_or_else(|| format!("expected KEY@START..END, got '{s}'"))?;
    let (start, end) = range
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got '{range}'"))?;
    let key: Key = key.trim().parse()?;
    let start: u32 = start.trim().parse().map_err(|e| format!("start: {e}"))?;
    let end: u32 = end.trim().parse().map_err(|e| format!("end: {e}"))?;
    if end < start {
        return Err(format!("empty range {start}..{end}"));
    }
    Ok(Hold { key, start, end })
}

fn snapshot_for(frame: u32, holds: &[Hold]) -> InputSnapshot {
    let mut snapshot = InputSnapshot::new();
    for hold in holds.iter().filter(|h| (h.start..h.end).contains(&frame)) {
        snapshot.press_key(hold.key);
    }
    snapshot
}

/// Counts draw calls and logs the first few views of each frame at trace level.
#[derive(Default)]
struct LogRenderer {
    frames: u64,
    draws: u64,
}

impl SpriteRenderer for LogRenderer {
    fn begin_frame(&mut self) {
        self.frames += 1;
    }

    fn draw(&mut self, view: &RenderView) {
        self.draws += 1;
        log::trace!(
            "draw {} '{}' at ({:.1}, {:.1}) depth {}",
            view.entity,
            view.tex_key,
            view.position.x,
            view.position.y,
            view.depth
        );
    }
}

fn subscribe_loggers(bus: &mut EventBus) {
    bus.subscribe(|e: &mut CollisionEnterEvent, _: &mut World, _: &mut EventBus| {
        info!("collision {} ({}) <-> {} ({})", e.a, e.a_tag, e.b, e.b_tag);
        Ok(())
    });
    bus.subscribe(|e: &mut TriggerEnterEvent, _: &mut World, _: &mut EventBus| {
        info!("trigger {} ({}) touched by {}", e.trigger, e.trigger_tag, e.other);
        Ok(())
    });
    bus.subscribe(|e: &mut InputActionEvent, _: &mut World, _: &mut EventBus| {
        info!("entity {} {:?}", e.entity, e.action);
        Ok(())
    });
    bus.subscribe(|e: &mut AnimationLoopedEvent, _: &mut World, _: &mut EventBus| {
        log::debug!("entity {} looped {:?} ({})", e.entity, e.action, e.loop_count);
        Ok(())
    });
    bus.subscribe(|e: &mut AnimationCompletedEvent, _: &mut World, _: &mut EventBus| {
        info!("entity {} finished {:?}", e.entity, e.action);
        Ok(())
    });
    bus.subscribe(|e: &mut UiButtonClickedEvent, _: &mut World, _: &mut EventBus| {
        info!("button '{}' clicked by {:?}", e.name, e.source);
        Ok(())
    });
    bus.subscribe(|_: &mut GamePausedEvent, _: &mut World, _: &mut EventBus| {
        info!("paused");
        Ok(())
    });
    bus.subscribe(|_: &mut GameResumedEvent, _: &mut World, _: &mut EventBus| {
        info!("resumed");
        Ok(())
    });
    bus.subscribe(|e: &mut SceneChangedEvent, _: &mut World, _: &mut EventBus| {
        info!("entered scene '{}'", e.to);
        Ok(())
    });
}

/// Triggers tagged "coin" are collected by whatever touches them.
fn subscribe_pickups(bus: &mut EventBus) {
    bus.subscribe(|e: &mut TriggerEnterEvent, world: &mut World, bus: &mut EventBus| {
        if e.trigger_tag == "coin" {
            bus.publish(world, ItemCollectedEvent::new(e.trigger, e.other));
        }
        Ok(())
    });
}

fn run(cli: Cli) -> EngineResult<()> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = EngineConfig::with_path(path);
            config.load_from_file()?;
            config
        }
        None => EngineConfig::new(),
    };
    if let Some(path) = cli.write_config {
        config.config_path = path;
        return config.save_to_file();
    }

    let scene_file = match &cli.scene {
        Some(path) => SceneFile::load(path)?,
        None => SceneFile::from_json(DEFAULT_SCENE)?,
    };

    let mut scene = Scene::new("demo", config);
    subscribe_loggers(scene.bus_mut());
    subscribe_pickups(scene.bus_mut());
    scene_file.populate(&mut scene)?;

    let mut manager = SceneManager::new();
    manager.register(scene)?;
    manager.switch_to("demo")?;

    let mut renderer = LogRenderer::default();
    for frame in 0..cli.frames {
        manager.frame(snapshot_for(frame, &cli.holds), cli.dt)?;
        if let Some(scene) = manager.active_mut() {
            scene.render(&mut renderer, None);
        }
    }

    if let Some(scene) = manager.active() {
        let stats = scene.bus().stats();
        info!(
            "simulated {} frames: {} entities, {} events dispatched, {} queued, {} handler failures, {} draws",
            cli.frames,
            scene.world().len(),
            stats.dispatched,
            stats.queued,
            stats.handler_failures,
            renderer.draws
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
