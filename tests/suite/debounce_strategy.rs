//! Debounced completion: bursts of finished motions become one transition,
//! released once the channel has been quiet for the window.

use std::time::Duration;

use blockfall_config::CompletionStrategy;
use blockfall_engine::SceneEvent;
use blockfall_types::{BlockId, BlockSnapshot, GlobalPhase, GridPos, GridSnapshot};

use crate::common::{
    FRAME, debounce, playground_scene, requested, run, scripted_scene_with, settle,
};

const WINDOW: Duration = Duration::from_millis(100);

fn stacked_pair() -> GridSnapshot {
    GridSnapshot {
        phase: GlobalPhase::Static,
        columns: 2,
        rows: 3,
        blocks: vec![
            BlockSnapshot::new(BlockId::new(0), GridPos::new(0, 0), 2),
            BlockSnapshot::new(BlockId::new(1), GridPos::new(0, 1), 2),
        ],
    }
}

fn collapsing_pair() -> GridSnapshot {
    let target = GridPos::new(0, 1);
    GridSnapshot {
        phase: GlobalPhase::Collapsing,
        columns: 2,
        rows: 3,
        blocks: vec![
            BlockSnapshot::new(BlockId::new(0), GridPos::new(0, 0), 2).collapsing_into(target),
            BlockSnapshot::new(BlockId::new(1), target, 2)
                .collapsing_into(target)
                .merging_to(3),
        ],
    }
}

/// Frames from the collapse finishing to the MOVING request.
fn frames_until_request(completion: CompletionStrategy) -> usize {
    let mut scene = scripted_scene_with(stacked_pair(), completion);
    scene.port().publish(collapsing_pair());

    let mut absorbed_at = None;
    for frame in 0..200 {
        scene.tick(FRAME).unwrap();
        let events = scene.take_events();
        if events
            .iter()
            .any(|event| matches!(event, SceneEvent::EntityAbsorbed(_)))
        {
            absorbed_at = Some(frame);
        }
        if !scene.port().requests.is_empty() {
            assert_eq!(scene.port().requests, vec![GlobalPhase::Moving]);
            let absorbed_at = absorbed_at.expect("collapse finished before the request");
            return frame - absorbed_at;
        }
    }
    panic!("no request was made");
}

#[test]
fn latch_requests_on_the_frame_the_last_motion_ends() {
    assert_eq!(frames_until_request(CompletionStrategy::Latch), 0);
}

#[test]
fn debounce_waits_out_the_window_and_requests_once() {
    let frames = frames_until_request(debounce());
    let waited = FRAME * u32::try_from(frames).unwrap();
    assert!(waited >= WINDOW, "requested after only {waited:?}");
    assert!(waited < WINDOW + FRAME * 2, "waited {waited:?}");
}

#[test]
fn debounce_with_nothing_to_animate_advances_at_once() {
    let mut scene = scripted_scene_with(stacked_pair(), debounce());
    let mut moving = stacked_pair();
    moving.phase = GlobalPhase::Moving;
    scene.port().publish(moving);

    // Throttle delay only.
    run(&mut scene, 4).unwrap();
    assert_eq!(scene.port().requests, vec![GlobalPhase::Static]);
}

#[test]
fn debounced_merge_game_still_settles_in_order() {
    let mut scene = playground_scene(3, 3, &[2, 2], debounce());
    for _ in 0..2 {
        scene.commit(0).unwrap();
        settle(&mut scene);
    }
    let events = scene.take_events();
    assert_eq!(
        requested(&events),
        vec![
            GlobalPhase::Collapsing,
            GlobalPhase::Moving,
            GlobalPhase::Static,
            GlobalPhase::Collapsing,
            GlobalPhase::Moving,
            GlobalPhase::Static,
        ]
    );
    let survivor = scene.mirror().at(GridPos::new(0, 0)).expect("merged block");
    assert_eq!(survivor.value(), 3);
    assert_eq!(scene.mirror().len(), 1);
}
