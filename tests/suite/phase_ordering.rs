//! The scene walks PLACING -> COLLAPSING -> MOVING -> STATIC without skipping
//! or repeating a step, whatever the domain answers with.

use blockfall_config::CompletionStrategy;
use blockfall_domain::CommitError;
use blockfall_engine::SceneEvent;
use blockfall_types::{BlockId, BlockSnapshot, GlobalPhase, GridPos, GridSnapshot};

use crate::common::{entered, playground_scene, requested, run, scripted_scene, settle};

#[test]
fn merge_commit_traverses_every_phase_in_order() {
    let mut scene = playground_scene(3, 3, &[2, 2], CompletionStrategy::Latch);
    scene.commit(0).unwrap();
    settle(&mut scene);
    scene.take_events();

    scene.commit(0).unwrap();
    settle(&mut scene);
    let events = scene.take_events();

    let entries: Vec<(GlobalPhase, usize)> = events
        .iter()
        .filter_map(|event| match event {
            SceneEvent::PhaseEntered { phase, started } => Some((*phase, *started)),
            _ => None,
        })
        .collect();
    assert_eq!(
        entries,
        vec![
            (GlobalPhase::Placing, 1),
            (GlobalPhase::Collapsing, 2),
            (GlobalPhase::Moving, 1),
            (GlobalPhase::Static, 0),
        ]
    );
    assert_eq!(
        requested(&events),
        vec![
            GlobalPhase::Collapsing,
            GlobalPhase::Moving,
            GlobalPhase::Static
        ]
    );
}

#[test]
fn chain_reaction_loops_back_through_collapsing() {
    // Column 1 holds a 3. Two 2s in column 0 merge into a 3 that falls next
    // to it, and that pair merges again.
    let mut scene = playground_scene(2, 3, &[3, 2, 2], CompletionStrategy::Latch);
    for column in [1, 0, 0] {
        scene.commit(column).unwrap();
        settle(&mut scene);
    }
    let events = scene.take_events();

    assert_eq!(
        entered(&events)
            .into_iter()
            .rev()
            .take(6)
            .rev()
            .collect::<Vec<_>>(),
        vec![
            GlobalPhase::Placing,
            GlobalPhase::Collapsing,
            GlobalPhase::Moving,
            GlobalPhase::Collapsing,
            GlobalPhase::Moving,
            GlobalPhase::Static,
        ]
    );
    assert_eq!(scene.mirror().len(), 1);
    let survivor = scene.mirror().at(GridPos::new(0, 0)).expect("merged block");
    assert_eq!(survivor.value(), 4);
}

#[test]
fn commit_is_refused_until_the_move_resolves() {
    let mut scene = playground_scene(3, 3, &[1, 2], CompletionStrategy::Latch);
    scene.commit(0).unwrap();
    assert_eq!(
        scene.commit(1),
        Err(CommitError::Busy {
            phase: GlobalPhase::Placing
        })
    );
    settle(&mut scene);
    assert!(scene.commit(1).is_ok());
}

#[test]
fn one_request_per_finished_phase() {
    let mut scene = scripted_scene(GridSnapshot::empty(3, 3));
    scene.port().publish(GridSnapshot {
        phase: GlobalPhase::Placing,
        columns: 3,
        rows: 3,
        blocks: vec![BlockSnapshot::new(BlockId::new(0), GridPos::new(1, 0), 1).entering()],
    });

    run(&mut scene, 20).unwrap();
    assert_eq!(scene.port().requests, vec![GlobalPhase::Collapsing]);
    assert_eq!(scene.phase(), Some(GlobalPhase::Collapsing));

    // The domain has not answered; nothing else is asked for.
    run(&mut scene, 40).unwrap();
    assert_eq!(scene.port().requests, vec![GlobalPhase::Collapsing]);
}
