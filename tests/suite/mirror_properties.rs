//! Mirror invariants observed from outside the scene.

use blockfall_engine::SceneEvent;
use blockfall_types::{BlockId, BlockSnapshot, GlobalPhase, GridPos, GridSnapshot};

use crate::common::{FRAME, run, scripted_scene};

fn board() -> GridSnapshot {
    GridSnapshot {
        phase: GlobalPhase::Static,
        columns: 3,
        rows: 4,
        blocks: vec![
            BlockSnapshot::new(BlockId::new(0), GridPos::new(0, 0), 1),
            BlockSnapshot::new(BlockId::new(1), GridPos::new(0, 1), 3),
            BlockSnapshot::new(BlockId::new(2), GridPos::new(2, 0), 5),
        ],
    }
}

#[test]
fn rebuild_puts_every_entity_at_rest() {
    let scene = scripted_scene(board());
    assert_eq!(scene.mirror().generation(), 1);
    assert_eq!(scene.mirror().len(), 3);
    for entity in scene.entities() {
        assert_eq!(entity.position(), scene.layout().resting(entity.pos()));
        assert!(!entity.is_animating());
    }
    let top = scene.mirror().get(BlockId::new(1)).expect("block 1");
    assert_eq!(top.pos(), GridPos::new(0, 1));
    assert_eq!(top.display_value(), 3);
}

#[test]
fn moving_without_targets_changes_nothing() {
    let mut scene = scripted_scene(board());
    let before: Vec<_> = scene
        .entities()
        .iter()
        .map(|entity| (entity.id(), entity.position()))
        .collect();

    let mut moving = board();
    moving.phase = GlobalPhase::Moving;
    scene.port().publish(moving);
    run(&mut scene, 6).unwrap();

    let after: Vec<_> = scene
        .entities()
        .iter()
        .map(|entity| (entity.id(), entity.position()))
        .collect();
    assert_eq!(before, after);
    assert_eq!(scene.mirror().generation(), 1);
    assert!(scene.take_events().contains(&SceneEvent::PhaseEntered {
        phase: GlobalPhase::Moving,
        started: 0
    }));
    assert_eq!(scene.port().requests, vec![GlobalPhase::Static]);
}

#[test]
fn placing_rebuild_flies_the_new_block_in() {
    let mut scene = scripted_scene(board());
    let mut placing = board();
    placing.phase = GlobalPhase::Placing;
    placing
        .blocks
        .push(BlockSnapshot::new(BlockId::new(3), GridPos::new(1, 0), 2).entering());
    scene.port().publish(placing);

    while scene.mirror().generation() == 1 {
        scene.tick(FRAME).unwrap();
    }
    let layout = *scene.layout();
    let newcomer = scene.mirror().get(BlockId::new(3)).expect("new block");
    assert!(newcomer.is_animating());
    assert_eq!(newcomer.position(), layout.spawn_point(1));
    let settled = scene.mirror().get(BlockId::new(0)).expect("old block");
    assert!(!settled.is_animating());
    assert_eq!(settled.position(), layout.resting(GridPos::new(0, 0)));

    run(&mut scene, 10).unwrap();
    let newcomer = scene.mirror().get(BlockId::new(3)).expect("new block");
    assert_eq!(newcomer.position(), layout.resting(GridPos::new(1, 0)));
    assert_eq!(scene.port().requests, vec![GlobalPhase::Collapsing]);
}

#[test]
fn in_place_update_keeps_identity_and_slides_to_target() {
    let mut scene = scripted_scene(board());
    let mut moving = board();
    moving.phase = GlobalPhase::Moving;
    moving.blocks[1] = moving.blocks[1].clone().moving_to(GridPos::new(1, 0));
    scene.port().publish(moving);
    run(&mut scene, 4).unwrap();
    assert_eq!(scene.mirror().generation(), 1);
    assert!(scene.mirror().is_animating());

    run(&mut scene, 10).unwrap();
    let layout = *scene.layout();
    let moved = scene.mirror().get(BlockId::new(1)).expect("block 1");
    // The cell only changes with the next snapshot.
    assert_eq!(moved.pos(), GridPos::new(0, 1));
    assert_eq!(moved.move_target(), Some(GridPos::new(1, 0)));
    assert_eq!(moved.position(), layout.resting(GridPos::new(1, 0)));
    assert_eq!(scene.port().requests, vec![GlobalPhase::Static]);
}
