//! Snapshots that break the contract stop the scene. Refused requests are
//! reported and asked again.

use std::time::Duration;

use blockfall_domain::PhaseRequestError;
use blockfall_engine::{AdvanceRequest, REJECTED_RETRY_DELAY, SceneEvent};
use blockfall_types::{
    BlockId, BlockSnapshot, ContractViolation, GlobalPhase, GridPos, GridSnapshot,
};

use crate::common::{FRAME, run, scripted_scene};

fn single(phase: GlobalPhase) -> GridSnapshot {
    GridSnapshot {
        phase,
        columns: 3,
        rows: 3,
        blocks: vec![BlockSnapshot::new(BlockId::new(0), GridPos::new(0, 0), 1)],
    }
}

#[test]
fn duplicate_identity_surfaces_from_tick() {
    let mut scene = scripted_scene(single(GlobalPhase::Static));
    let mut twice = single(GlobalPhase::Static);
    twice
        .blocks
        .push(BlockSnapshot::new(BlockId::new(0), GridPos::new(1, 0), 1));
    twice.phase = GlobalPhase::Collapsing;
    scene.port().publish(twice);

    assert_eq!(
        run(&mut scene, 6),
        Err(ContractViolation::DuplicateIdentity {
            id: BlockId::new(0),
            phase: GlobalPhase::Collapsing,
        })
    );
}

#[test]
fn in_place_update_of_an_unknown_block_is_refused_untouched() {
    let mut scene = scripted_scene(single(GlobalPhase::Static));
    let mut moving = single(GlobalPhase::Moving);
    moving.blocks.push(
        BlockSnapshot::new(BlockId::new(9), GridPos::new(2, 1), 4).moving_to(GridPos::new(2, 0)),
    );
    scene.port().publish(moving);

    let err = run(&mut scene, 6).unwrap_err();
    assert_eq!(err.block(), BlockId::new(9));
    assert!(matches!(err, ContractViolation::UnknownEntity { .. }));
    assert_eq!(scene.mirror().len(), 1);
    assert_eq!(scene.mirror().generation(), 1);
    assert!(!scene.mirror().is_animating());
}

#[test]
fn collapse_into_an_empty_cell_is_refused() {
    let mut scene = scripted_scene(single(GlobalPhase::Static));
    let mut collapsing = single(GlobalPhase::Collapsing);
    collapsing.blocks[0] = collapsing.blocks[0]
        .clone()
        .collapsing_into(GridPos::new(1, 1));
    scene.port().publish(collapsing);

    assert_eq!(
        run(&mut scene, 6),
        Err(ContractViolation::CollapseTargetVacant {
            id: BlockId::new(0),
            target: GridPos::new(1, 1),
        })
    );
}

#[test]
fn move_off_the_board_is_refused() {
    let mut scene = scripted_scene(single(GlobalPhase::Static));
    let mut moving = single(GlobalPhase::Moving);
    moving.blocks[0] = moving.blocks[0].clone().moving_to(GridPos::new(0, 3));
    scene.port().publish(moving);

    assert!(matches!(
        run(&mut scene, 6),
        Err(ContractViolation::TargetOutOfBounds { columns: 3, rows: 3, .. })
    ));
}

fn placing_one() -> GridSnapshot {
    GridSnapshot {
        phase: GlobalPhase::Placing,
        columns: 3,
        rows: 3,
        blocks: vec![BlockSnapshot::new(BlockId::new(4), GridPos::new(2, 0), 1).entering()],
    }
}

fn out_of_order() -> PhaseRequestError {
    PhaseRequestError::OutOfOrder {
        current: GlobalPhase::Static,
        requested: GlobalPhase::Collapsing,
    }
}

fn frames_in(span: Duration) -> usize {
    usize::try_from(span.as_millis() / FRAME.as_millis()).unwrap() + 1
}

#[test]
fn rejected_request_falls_back_and_is_reported() {
    let mut scene = scripted_scene(GridSnapshot::empty(3, 3));
    let error = out_of_order();
    scene.port_mut().reject_with = Some(error.clone());
    scene.port().publish(placing_one());

    run(&mut scene, 20).unwrap();
    assert_eq!(scene.port().requests, vec![GlobalPhase::Collapsing]);
    assert_eq!(scene.phase(), Some(GlobalPhase::Placing));
    assert!(scene.take_events().contains(&SceneEvent::RequestRejected {
        request: AdvanceRequest {
            from: GlobalPhase::Placing,
            to: GlobalPhase::Collapsing,
        },
        error,
    }));
}

#[test]
fn rejected_request_is_asked_again_until_accepted() {
    let mut scene = scripted_scene(GridSnapshot::empty(3, 3));
    scene.port_mut().reject_with = Some(out_of_order());
    scene.port().publish(placing_one());
    run(&mut scene, 20).unwrap();
    assert_eq!(scene.port().requests, vec![GlobalPhase::Collapsing]);

    scene.port_mut().reject_with = None;
    run(&mut scene, frames_in(REJECTED_RETRY_DELAY)).unwrap();
    assert_eq!(
        scene.port().requests,
        vec![GlobalPhase::Collapsing, GlobalPhase::Collapsing]
    );
    assert_eq!(scene.phase(), Some(GlobalPhase::Collapsing));

    run(&mut scene, frames_in(REJECTED_RETRY_DELAY * 2)).unwrap();
    assert_eq!(scene.port().requests.len(), 2);
}
