//! Shared test utilities and fixtures
//!
//! A scripted port stands in for the domain when a test needs to hand the
//! scene exact snapshots; the real playground covers everything else.

#![allow(dead_code)]

use std::time::Duration;

use tokio::sync::watch;

use blockfall_config::{AnimationSettings, CompletionStrategy, Settings};
use blockfall_domain::{CommitError, PhaseRequestError, PlaygroundManager, PlaygroundPort};
use blockfall_engine::{BoardLayout, Scene, SceneEvent};
use blockfall_types::{ContractViolation, GlobalPhase, GridSnapshot};

pub const FRAME: Duration = Duration::from_millis(8);
pub const ANIMATION: Duration = Duration::from_millis(40);
pub const THROTTLE: Duration = Duration::from_millis(20);

/// Port whose snapshots are published by the test itself.
#[derive(Debug)]
pub struct ScriptedPort {
    tx: watch::Sender<GridSnapshot>,
    pub requests: Vec<GlobalPhase>,
    pub commits: Vec<usize>,
    pub reject_with: Option<PhaseRequestError>,
}

impl ScriptedPort {
    pub fn new(initial: GridSnapshot) -> Self {
        let (tx, _) = watch::channel(initial);
        Self {
            tx,
            requests: Vec::new(),
            commits: Vec::new(),
            reject_with: None,
        }
    }

    pub fn publish(&self, snapshot: GridSnapshot) {
        self.tx.send_replace(snapshot);
    }
}

impl PlaygroundPort for ScriptedPort {
    fn subscribe(&self) -> watch::Receiver<GridSnapshot> {
        self.tx.subscribe()
    }

    fn commit(&mut self, column: usize) -> Result<(), CommitError> {
        self.commits.push(column);
        Ok(())
    }

    fn request_phase(&mut self, phase: GlobalPhase) -> Result<(), PhaseRequestError> {
        self.requests.push(phase);
        match &self.reject_with {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

pub fn animation(completion: CompletionStrategy) -> AnimationSettings {
    AnimationSettings {
        duration: ANIMATION,
        completion,
        snapshot_throttle: THROTTLE,
    }
}

pub fn layout(columns: usize, rows: usize) -> BoardLayout {
    BoardLayout::new(columns, rows, 10.0, 1.0)
}

pub fn settings(completion: CompletionStrategy) -> Settings {
    let mut settings = Settings::default();
    settings.animation = animation(completion);
    settings
}

pub fn debounce() -> CompletionStrategy {
    CompletionStrategy::Debounce {
        window: Duration::from_millis(100),
    }
}

/// Scene over a scripted port, already past the initial snapshot.
pub fn scripted_scene(initial: GridSnapshot) -> Scene<ScriptedPort> {
    scripted_scene_with(initial, CompletionStrategy::Latch)
}

pub fn scripted_scene_with(
    initial: GridSnapshot,
    completion: CompletionStrategy,
) -> Scene<ScriptedPort> {
    let layout = layout(initial.columns, initial.rows);
    let mut scene = Scene::new(ScriptedPort::new(initial), layout, &animation(completion));
    run(&mut scene, 3).expect("initial snapshot is valid");
    scene.take_events();
    scene
}

pub fn playground_scene(
    columns: usize,
    rows: usize,
    upcoming: &[u32],
    completion: CompletionStrategy,
) -> Scene<PlaygroundManager> {
    let mut playground = PlaygroundManager::new(columns, rows, Some(1));
    playground.set_upcoming(upcoming.iter().copied());
    let mut scene = Scene::new(playground, layout(columns, rows), &animation(completion));
    run(&mut scene, 3).expect("initial snapshot is valid");
    scene
}

pub fn run<P: PlaygroundPort>(
    scene: &mut Scene<P>,
    frames: usize,
) -> Result<(), ContractViolation> {
    for _ in 0..frames {
        scene.tick(FRAME)?;
    }
    Ok(())
}

/// Tick until the scene rests in STATIC. Panics if it never does.
pub fn settle<P: PlaygroundPort>(scene: &mut Scene<P>) {
    for _ in 0..500 {
        scene.tick(FRAME).expect("no contract violation");
        if scene.is_idle() {
            return;
        }
    }
    panic!("scene never settled; phase {:?}", scene.phase());
}

pub fn requested(events: &[SceneEvent]) -> Vec<GlobalPhase> {
    events
        .iter()
        .filter_map(|event| match event {
            SceneEvent::PhaseRequested(request) => Some(request.to),
            _ => None,
        })
        .collect()
}

pub fn entered(events: &[SceneEvent]) -> Vec<GlobalPhase> {
    events
        .iter()
        .filter_map(|event| match event {
            SceneEvent::PhaseEntered { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect()
}
