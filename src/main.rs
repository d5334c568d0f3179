//! Headless cutscene runner.
//!
//! Loads `config.ini`, a playlist JSON file and a directory of scene JSON
//! files, then plays the playlist with fixed ticks and logs everything that
//! happens: camera shots, broadcast events, scene loads.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --playlist assets/playlist.json --scenes assets/scenes
//! RUST_LOG=debug cargo run -- --inline-loader
//! ```
//!
//! The runner stops once the playlist finishes or aborts, or after
//! `max_seconds` of simulated time.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use clap::Parser;
use log::{LevelFilter, error, info, warn};

use cutscene_engine::assets::load_playlist;
use cutscene_engine::components::persistent::Persistent;
use cutscene_engine::events::cutscene::{CutsceneEvent, CutsceneRequest};
use cutscene_engine::events::sceneloader::SceneActivated;
use cutscene_engine::game;
use cutscene_engine::resources::cutsceneconfig::CutsceneConfig;
use cutscene_engine::resources::cutsceneplayer::CutscenePlayer;
use cutscene_engine::resources::gameeventbus::GameEventBus;
use cutscene_engine::resources::sceneloader::DirectorySceneSource;
use cutscene_engine::resources::worldtime::WorldTime;

/// Headless cutscene runner
#[derive(Parser)]
#[command(version, about = "Plays a cutscene playlist headlessly and logs the timeline.")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Playlist JSON file (overrides [assets] playlist).
    #[arg(long, value_name = "PATH")]
    playlist: Option<PathBuf>,

    /// Directory holding `<scene>.json` files (overrides [assets] scenes_dir).
    #[arg(long, value_name = "DIR")]
    scenes: Option<PathBuf>,

    /// First playlist entry to play.
    #[arg(long)]
    start_index: Option<usize>,

    /// Fixed ticks per second.
    #[arg(long)]
    tick_rate: Option<u32>,

    /// Give up after this many simulated seconds.
    #[arg(long)]
    max_seconds: Option<u32>,

    /// Fetch scenes on the main thread instead of a worker thread.
    #[arg(long)]
    inline_loader: bool,
}

fn main() {
    let cli = Cli::parse();

    let mut config = CutsceneConfig::with_path(&cli.config);
    let config_result = config.load_from_file();
    if let Some(path) = cli.playlist {
        config.playlist_path = path;
    }
    if let Some(dir) = cli.scenes {
        config.scenes_dir = dir;
    }
    if let Some(index) = cli.start_index {
        config.start_index = index;
    }
    if let Some(rate) = cli.tick_rate {
        config.tick_rate = rate.max(1);
    }
    if let Some(seconds) = cli.max_seconds {
        config.max_seconds = seconds;
    }
    if cli.inline_loader {
        config.threaded_loader = false;
    }

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if config.verbose_logs {
        logger.filter_module("cutscene_engine", LevelFilter::Debug);
    }
    logger.init();

    if let Err(e) = config_result {
        warn!("{}; using defaults", e);
    }

    let playlist = match load_playlist(&config.playlist_path) {
        Ok(playlist) => playlist,
        Err(e) => {
            error!("Cannot load playlist {:?}: {}", config.playlist_path, e);
            std::process::exit(1);
        }
    };

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    let source = Arc::new(DirectorySceneSource::new(&config.scenes_dir));
    game::setup(&mut world, &config, source, playlist);

    world.resource_mut::<GameEventBus>().subscribe(|ev| {
        info!(
            "[event] '{}' at t={:.3} from {:?}",
            ev.key, ev.sequence_time, ev.source
        );
    });

    let done = Arc::new(AtomicBool::new(false));
    let done_flag = Arc::clone(&done);
    world
        .add_observer(move |ev: On<CutsceneEvent>| {
            match &*ev {
                CutsceneEvent::Started { index, name } => info!("[cutscene] #{} '{}' started", index, name),
                CutsceneEvent::ShotStarted {
                    shot,
                    camera_id,
                    camera_found,
                    ..
                } => info!("[cutscene] shot {} on '{}' (found: {})", shot, camera_id, camera_found),
                CutsceneEvent::Finished { index, name } => info!("[cutscene] #{} '{}' finished", index, name),
                CutsceneEvent::PlaylistFinished => {
                    info!("[cutscene] playlist finished");
                    done_flag.store(true, Ordering::Relaxed);
                }
                CutsceneEvent::Aborted { index, error } => {
                    error!("[cutscene] #{} aborted: {}", index, error);
                    done_flag.store(true, Ordering::Relaxed);
                }
            }
        })
        .insert(Persistent);
    world
        .add_observer(|ev: On<SceneActivated>| {
            info!("[scene] '{}' active ({:?}, {} entities)", ev.name, ev.mode, ev.spawned);
        })
        .insert(Persistent);
    world.flush();

    if !config.play_on_start {
        info!("play_on_start is disabled, nothing to do");
        game::teardown(&mut world);
        return;
    }
    world.trigger(CutsceneRequest::PlayPlaylist(config.start_index));
    world.flush();
    if !world.resource::<CutscenePlayer>().is_playing() {
        warn!("Playlist {:?} did not start, nothing to do", config.playlist_path);
        game::teardown(&mut world);
        return;
    }

    let mut update = game::build_update_schedule();
    let dt = config.tick_seconds();
    let max_seconds = config.max_seconds as f32;

    // --------------- Main loop ---------------
    while !done.load(Ordering::Relaxed) && world.resource::<CutscenePlayer>().is_playing() {
        game::tick(&mut world, &mut update, dt);
        if world.resource::<WorldTime>().elapsed >= max_seconds {
            warn!("Stopping after {} simulated seconds", config.max_seconds);
            break;
        }
    }

    info!(
        "Ran {} ticks ({:.2}s simulated)",
        world.resource::<WorldTime>().frame_count,
        world.resource::<WorldTime>().elapsed
    );
    game::teardown(&mut world);
}
