//! Host frame loop.
//!
//! Each frame runs in a fixed order:
//!
//! 1. Fixed-step physics callbacks, as many steps as the accumulated time
//!    allows (capped).
//! 2. One update callback per node.
//! 3. `on_end` for every node the barrier is about to free.
//! 4. The frame barrier: queued creations, deletions and scene changes.
//! 5. `on_start` for every node the barrier created.
//!
//! Callback deltas are scaled by each node's effective time dilation.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use engine_component::Entity;
use engine_scene::{FrameChanges, PendingMutation, SceneGraph};
use tracing::{debug, info, warn};

use crate::host::ScriptHost;

/// Physics steps allowed per frame before the backlog is dropped.
const MAX_PHYSICS_STEPS: u32 = 8;

/// Configuration for the host frame loop.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Target frames per second.
    pub frame_rate: f64,
    /// Fixed physics steps per second.
    pub physics_rate: f64,
    /// Maximum number of frames to run (0 = unlimited).
    pub max_frames: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            physics_rate: 60.0,
            max_frames: 0,
        }
    }
}

/// Drives a [`SceneGraph`] with a [`ScriptHost`].
#[derive(Debug)]
pub struct FrameLoop<H> {
    frame_id: u64,
    config: FrameConfig,
    graph: SceneGraph,
    host: H,
    /// Unconsumed physics time, in unscaled seconds.
    accumulator: f64,
    started: bool,
}

impl<H: ScriptHost> FrameLoop<H> {
    #[must_use]
    pub fn new(config: FrameConfig, graph: SceneGraph, host: H) -> Self {
        Self {
            frame_id: 0,
            config,
            graph,
            host,
            accumulator: 0.0,
            started: false,
        }
    }

    #[must_use]
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Fire `on_start` for every node of the loaded scene. Runs once; the
    /// first [`frame`](Self::frame) calls it if needed.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let nodes = self.graph.traverse();
        info!(nodes = nodes.len(), "starting scene");
        for entity in nodes {
            self.host.on_start(&mut self.graph, entity);
        }
    }

    /// Run one frame of `dt` unscaled seconds.
    pub fn frame(&mut self, dt: f64) -> FrameChanges {
        self.start();
        self.frame_id += 1;

        self.physics(dt);

        for entity in self.graph.traverse() {
            let scaled = self.graph.scaled_delta(entity, dt);
            self.host.on_update(&mut self.graph, entity, scaled);
        }

        self.end_pending();

        let changes = self.graph.process_queued_mutations();
        self.start_created(&changes);

        debug!(
            frame_id = self.frame_id,
            dt,
            nodes = self.graph.entity_count(),
            "frame complete"
        );
        changes
    }

    fn physics(&mut self, dt: f64) {
        let step = 1.0 / self.config.physics_rate;
        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= step {
            if steps == MAX_PHYSICS_STEPS {
                warn!(
                    frame_id = self.frame_id,
                    dropped_s = self.accumulator,
                    "physics fell behind, dropping backlog"
                );
                self.accumulator = 0.0;
                break;
            }
            for entity in self.graph.traverse() {
                let scaled = self.graph.scaled_delta(entity, step);
                self.host.on_physics_update(&mut self.graph, entity, scaled);
            }
            self.accumulator -= step;
            steps += 1;
        }
    }

    /// Fire `on_end` for every node the barrier will free. Deletions queued
    /// from inside `on_end` are picked up until the set stops growing.
    fn end_pending(&mut self) {
        let mut ended: HashSet<Entity> = HashSet::new();
        loop {
            let batch: Vec<Entity> = self
                .pending_removals()
                .into_iter()
                .filter(|e| !ended.contains(e))
                .collect();
            if batch.is_empty() {
                break;
            }
            for entity in batch {
                ended.insert(entity);
                self.host.on_end(&mut self.graph, entity);
            }
        }
    }

    /// Every node the next barrier will free, children before parents.
    fn pending_removals(&self) -> Vec<Entity> {
        let tree = self.graph.tree();
        let mut seen = HashSet::new();
        let mut targets: Vec<Entity> = self
            .graph
            .queue()
            .iter()
            .filter_map(|m| match m {
                PendingMutation::Delete { target } => Some(*target),
                _ => None,
            })
            .collect();
        if self.graph.queue().has_scene_change() {
            // Everything goes: the tree and any detached subtrees.
            targets.extend(self.graph.root());
            targets.extend(
                self.graph
                    .table()
                    .iter()
                    .map(|(e, _)| e)
                    .filter(|&e| tree.get_parent(e).is_none()),
            );
        }
        targets
            .into_iter()
            .flat_map(|target| tree.post_order(target))
            .filter(|&e| seen.insert(e))
            .collect()
    }

    fn start_created(&mut self, changes: &FrameChanges) {
        let mut fresh: Vec<Entity> = Vec::new();
        for &(_, top) in &changes.created {
            fresh.push(top);
            fresh.extend(self.graph.descendants(top));
        }
        if let Some(root) = changes.scene_changed {
            fresh.push(root);
            fresh.extend(self.graph.descendants(root));
        }
        for entity in fresh {
            if self.graph.is_alive(entity) {
                self.host.on_start(&mut self.graph, entity);
            }
        }
    }

    /// Run the frame loop for the configured number of frames, or
    /// indefinitely.
    pub fn run(&mut self) {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate);
        let mut frame_count = 0u64;

        info!(
            frame_rate = self.config.frame_rate,
            physics_rate = self.config.physics_rate,
            max_frames = self.config.max_frames,
            "starting frame loop"
        );

        loop {
            let start = Instant::now();

            self.frame(frame_duration.as_secs_f64());

            frame_count += 1;
            if self.config.max_frames > 0 && frame_count >= self.config.max_frames {
                info!(frames = frame_count, "frame loop complete");
                break;
            }
            if self.graph.root().is_none() {
                info!(frames = frame_count, "scene emptied, stopping");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            } else {
                warn!(
                    frame_id = self.frame_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = frame_duration.as_millis() as u64,
                    "frame exceeded time budget"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use engine_scene::{SceneConfig, StageNode};

    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        events: Vec<(&'static str, String)>,
        physics_dt: Vec<f64>,
        update_dt: Vec<(String, f64)>,
        /// Node names to queue for deletion on their first update.
        doomed: Vec<String>,
        /// When the first node ends, queue the second for deletion.
        on_end_delete: Vec<(String, String)>,
    }

    impl Recorder {
        fn name(graph: &SceneGraph, entity: Entity) -> String {
            graph.get_name(entity).unwrap_or_default().to_string()
        }

        fn count(&self, kind: &str) -> usize {
            self.events.iter().filter(|(k, _)| *k == kind).count()
        }
    }

    impl ScriptHost for Recorder {
        fn on_start(&mut self, graph: &mut SceneGraph, entity: Entity) {
            self.events.push(("start", Self::name(graph, entity)));
        }

        fn on_update(&mut self, graph: &mut SceneGraph, entity: Entity, dt: f64) {
            let name = Self::name(graph, entity);
            if self.doomed.contains(&name) && !graph.is_queued_for_deletion(entity) {
                graph.queue_deletion(entity).unwrap();
            }
            self.update_dt.push((name, dt));
        }

        fn on_physics_update(&mut self, _graph: &mut SceneGraph, _entity: Entity, dt: f64) {
            self.physics_dt.push(dt);
        }

        fn on_end(&mut self, graph: &mut SceneGraph, entity: Entity) {
            assert!(graph.is_alive(entity));
            let name = Self::name(graph, entity);
            for (trigger, target) in &self.on_end_delete {
                if *trigger == name {
                    let root = graph.root().unwrap();
                    let victim = graph.get_child(root, target).unwrap();
                    graph.queue_deletion(victim).unwrap();
                }
            }
            self.events.push(("end", name));
        }
    }

    fn scene() -> SceneGraph {
        let mut graph = SceneGraph::new(SceneConfig::default());
        graph
            .load(
                &StageNode::new("Main", "Node2D")
                    .with_child(StageNode::new("Player", "Sprite").with_child(StageNode::new("Gun", "Node2D"))),
            )
            .unwrap();
        graph
    }

    fn config() -> FrameConfig {
        FrameConfig {
            frame_rate: 1000.0,
            physics_rate: 1000.0,
            max_frames: 3,
        }
    }

    #[test]
    fn test_frame_advances_counter_and_barrier() {
        let mut frames = FrameLoop::new(config(), scene(), Recorder::default());
        assert_eq!(frames.frame_id(), 0);
        frames.frame(0.001);
        frames.frame(0.001);
        assert_eq!(frames.frame_id(), 2);
        assert_eq!(frames.graph().frame(), 2);
    }

    #[test]
    fn test_start_runs_once_for_every_node() {
        let mut frames = FrameLoop::new(config(), scene(), Recorder::default());
        frames.frame(0.001);
        frames.frame(0.001);
        let starts: Vec<&str> = frames
            .host()
            .events
            .iter()
            .filter(|(k, _)| *k == "start")
            .map(|(_, n)| n.as_str())
            .collect();
        assert_eq!(starts, vec!["Main", "Player", "Gun"]);
    }

    #[test]
    fn test_update_dt_scaled_by_dilation() {
        let mut graph = scene();
        let root = graph.root().unwrap();
        let player = graph.get_child(root, "Player").unwrap();
        graph.set_time_dilation(player, 0.5).unwrap();
        graph.set_world_time_dilation(2.0);

        let mut frames = FrameLoop::new(config(), graph, Recorder::default());
        frames.frame(0.25);
        let dts = &frames.host().update_dt;
        assert_eq!(dts[0], ("Main".to_string(), 0.5));
        assert_eq!(dts[1], ("Player".to_string(), 0.25));
        assert_eq!(dts[2], ("Gun".to_string(), 0.25));
    }

    #[test]
    fn test_physics_steps_are_fixed() {
        let cfg = FrameConfig {
            frame_rate: 60.0,
            physics_rate: 4.0,
            max_frames: 0,
        };
        let mut frames = FrameLoop::new(cfg, scene(), Recorder::default());
        // Not enough time for a step yet.
        frames.frame(0.125);
        assert!(frames.host().physics_dt.is_empty());
        // 0.125 + 0.5 = 0.625 -> two steps of 0.25 for each of three nodes.
        frames.frame(0.5);
        assert_eq!(frames.host().physics_dt.len(), 6);
        assert!(frames.host().physics_dt.iter().all(|&dt| dt == 0.25));
    }

    #[test]
    fn test_physics_backlog_is_capped() {
        let cfg = FrameConfig {
            frame_rate: 60.0,
            physics_rate: 100.0,
            max_frames: 0,
        };
        let mut frames = FrameLoop::new(cfg, scene(), Recorder::default());
        frames.frame(10.0);
        assert_eq!(
            frames.host().physics_dt.len(),
            MAX_PHYSICS_STEPS as usize * 3
        );
    }

    #[test]
    fn test_on_end_before_free_children_first() {
        let host = Recorder {
            doomed: vec!["Player".to_string()],
            ..Recorder::default()
        };
        let mut frames = FrameLoop::new(config(), scene(), host);
        let changes = frames.frame(0.001);
        assert_eq!(changes.deleted.len(), 2);
        let ends: Vec<&str> = frames
            .host()
            .events
            .iter()
            .filter(|(k, _)| *k == "end")
            .map(|(_, n)| n.as_str())
            .collect();
        assert_eq!(ends, vec!["Gun", "Player"]);
        assert_eq!(frames.graph().entity_count(), 1);
    }

    #[test]
    fn test_deletion_queued_from_on_end_gets_on_end() {
        let mut graph = SceneGraph::default();
        graph
            .load(
                &StageNode::new("Main", "Node")
                    .with_child(StageNode::new("Player", "Node"))
                    .with_child(StageNode::new("Shadow", "Node")),
            )
            .unwrap();
        let host = Recorder {
            doomed: vec!["Player".to_string()],
            on_end_delete: vec![("Player".to_string(), "Shadow".to_string())],
            ..Recorder::default()
        };
        let mut frames = FrameLoop::new(config(), graph, host);
        let changes = frames.frame(0.001);

        assert_eq!(changes.deleted.len(), 2);
        assert_eq!(frames.host().count("end"), 2);
        let ends: Vec<&str> = frames
            .host()
            .events
            .iter()
            .filter(|(k, _)| *k == "end")
            .map(|(_, n)| n.as_str())
            .collect();
        assert_eq!(ends, vec!["Player", "Shadow"]);
    }

    #[test]
    fn test_scene_change_ends_detached_nodes() {
        let mut frames = FrameLoop::new(config(), scene(), Recorder::default());
        frames.frame(0.001);
        let loose = frames.graph_mut().create("Loose", "Node").unwrap();
        frames
            .graph_mut()
            .queue_scene_change(StageNode::new("Level2", "Node"))
            .unwrap();
        let changes = frames.frame(0.001);
        assert!(changes.deleted.contains(&loose));
        assert_eq!(frames.host().count("end"), 4);
        assert!(frames.host().events.contains(&("end", "Loose".to_string())));
    }

    #[test]
    fn test_queued_creations_get_on_start() {
        let mut frames = FrameLoop::new(config(), scene(), Recorder::default());
        frames.frame(0.001);
        let root = frames.graph().root().unwrap();
        frames
            .graph_mut()
            .queue_instance(
                root,
                StageNode::new("Enemy", "Node2D").with_child(StageNode::new("Eye", "Sprite")),
            )
            .unwrap();
        frames.frame(0.001);
        assert_eq!(frames.host().count("start"), 5);
        assert_eq!(frames.host().events[3], ("start", "Enemy".to_string()));
        assert_eq!(frames.host().events[4], ("start", "Eye".to_string()));
    }

    #[test]
    fn test_scene_change_ends_old_and_starts_new() {
        let mut frames = FrameLoop::new(config(), scene(), Recorder::default());
        frames.frame(0.001);
        frames
            .graph_mut()
            .queue_scene_change(StageNode::new("Level2", "Node"))
            .unwrap();
        let changes = frames.frame(0.001);
        assert!(changes.scene_changed.is_some());
        assert_eq!(frames.host().count("end"), 3);
        assert_eq!(
            frames.host().events.last(),
            Some(&("start", "Level2".to_string()))
        );
    }

    #[test]
    fn test_run_limited_frames() {
        let mut frames = FrameLoop::new(config(), scene(), Recorder::default());
        frames.run();
        assert_eq!(frames.frame_id(), 3);
    }

    #[test]
    fn test_run_stops_when_scene_emptied() {
        let host = Recorder {
            doomed: vec!["Main".to_string()],
            ..Recorder::default()
        };
        let cfg = FrameConfig {
            max_frames: 0,
            ..config()
        };
        let mut frames = FrameLoop::new(cfg, scene(), host);
        frames.run();
        assert_eq!(frames.frame_id(), 1);
        assert_eq!(frames.graph().entity_count(), 0);
    }
}
