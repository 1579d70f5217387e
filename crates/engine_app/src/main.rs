//! # engine_app: scene host
//!
//! Loads a stage file into a [`SceneGraph`] and drives it with the fixed-rate
//! frame loop.
//!
//! ## Startup Sequence
//!
//! 1. Parse CLI flags and initialise structured logging.
//! 2. Read the stage file (`.json`, or `.msgpack` / `.mpk`), or fall back to
//!    a small built-in scene.
//! 3. Load it as the scene root.
//! 4. Run the frame loop until `--frames` is reached or the scene empties.

mod host;
mod tick;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine_component::{Script, TextLabel, Transform2D};
use engine_math::Vec2;
use engine_scene::{ReparentPolicy, SceneConfig, SceneGraph, StageNode};
use host::LoggingHost;
use tick::{FrameConfig, FrameLoop};

#[derive(Parser, Debug)]
#[command(name = "engine_app", about = "Run a scene graph from a stage file")]
struct Args {
    /// Stage file to load (.json, .msgpack or .mpk)
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Number of frames to run (0 = until the scene empties)
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    /// Target frames per second
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Fixed physics steps per second
    #[arg(long, default_value_t = 60.0)]
    physics_fps: f64,

    /// What re-parenting does to pending deletions: preserve, cancel or reject
    #[arg(long, default_value = "preserve")]
    reparent_policy: ReparentPolicy,

    /// Global multiplier applied on top of every node's time dilation
    #[arg(long, default_value_t = 1.0)]
    world_time_dilation: f64,

    /// Maximum tree depth
    #[arg(long, default_value_t = 1024)]
    max_depth: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "engine_app=info,engine_scene=info".into()),
        )
        .init();

    let args = Args::parse();
    anyhow::ensure!(args.fps > 0.0, "--fps must be positive");
    anyhow::ensure!(args.physics_fps > 0.0, "--physics-fps must be positive");

    let stage = match &args.scene {
        Some(path) => read_stage(path)?,
        None => {
            info!("no --scene given, using the built-in demo scene");
            demo_stage()
        }
    };

    let config = SceneConfig::new()
        .with_reparent_policy(args.reparent_policy)
        .with_world_time_dilation(args.world_time_dilation)
        .with_max_depth(args.max_depth);
    let mut graph = SceneGraph::new(config);
    let root = graph.load(&stage).context("failed to load scene")?;
    info!(root = %root, nodes = graph.entity_count(), "scene host starting");

    let frame_config = FrameConfig {
        frame_rate: args.fps,
        physics_rate: args.physics_fps,
        max_frames: args.frames,
    };
    let mut frames = FrameLoop::new(frame_config, graph, LoggingHost::new());
    frames.run();

    info!(
        frames = frames.frame_id(),
        started = frames.host().started(),
        ended = frames.host().ended(),
        "scene host shut down"
    );
    Ok(())
}

/// Read a stage description, picking the decoder from the file extension.
fn read_stage(path: &Path) -> Result<StageNode> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read stage file {}", path.display()))?;
    let stage = match path.extension().and_then(|e| e.to_str()) {
        Some("msgpack" | "mpk") => StageNode::from_msgpack_slice(&bytes),
        _ => StageNode::from_json_slice(&bytes),
    }
    .with_context(|| format!("failed to decode stage file {}", path.display()))?;
    info!(path = %path.display(), nodes = stage.node_count(), "stage file loaded");
    Ok(stage)
}

fn demo_stage() -> StageNode {
    StageNode::new("Main", "Node2D")
        .with_component(Script {
            class_path: "src.main".to_string(),
            class_name: "Main".to_string(),
        })
        .with_child(
            StageNode::new("Player", "Sprite")
                .with_tag("player")
                .with_component(Transform2D::from_position(Vec2::new(64.0, 64.0))),
        )
        .with_child(StageNode::new("Score", "TextLabel").with_component(TextLabel {
            text: "0".to_string(),
            ..TextLabel::default()
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_defaults() {
        let args = Args::parse_from(["engine_app"]);
        assert!(args.scene.is_none());
        assert_eq!(args.frames, 600);
        assert_eq!(args.fps, 60.0);
        assert_eq!(args.reparent_policy, ReparentPolicy::Preserve);
        assert_eq!(args.world_time_dilation, 1.0);
    }

    #[test]
    fn test_args_parse_policy() {
        let args = Args::parse_from([
            "engine_app",
            "--scene",
            "demos/main.json",
            "--frames",
            "10",
            "--reparent-policy",
            "reject",
            "--world-time-dilation",
            "0.5",
        ]);
        assert_eq!(args.scene, Some(PathBuf::from("demos/main.json")));
        assert_eq!(args.frames, 10);
        assert_eq!(args.reparent_policy, ReparentPolicy::Reject);
        assert_eq!(args.world_time_dilation, 0.5);
    }

    #[test]
    fn test_demo_stage_loads() {
        let mut graph = SceneGraph::default();
        let root = graph.load(&demo_stage()).unwrap();
        assert_eq!(graph.entity_count(), 3);
        let player = graph.get_child(root, "Player").unwrap();
        assert!(graph.has_tag(player, "player"));
    }

    #[test]
    fn test_read_stage_json_and_msgpack() {
        let dir = std::env::temp_dir();
        let json_path = dir.join(format!("engine_app_stage_{}.json", std::process::id()));
        let mpk_path = dir.join(format!("engine_app_stage_{}.msgpack", std::process::id()));
        let stage = demo_stage();
        std::fs::write(&json_path, stage.to_json_string().unwrap()).unwrap();
        std::fs::write(&mpk_path, stage.to_msgpack().unwrap()).unwrap();

        assert_eq!(read_stage(&json_path).unwrap(), stage);
        assert_eq!(read_stage(&mpk_path).unwrap(), stage);

        std::fs::remove_file(json_path).unwrap();
        std::fs::remove_file(mpk_path).unwrap();
    }

    #[test]
    fn test_read_stage_missing_file() {
        let err = read_stage(Path::new("/nonexistent/stage.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read stage file"));
    }
}
