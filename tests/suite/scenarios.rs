//! Whole-game scenarios through [`App`].

use std::time::Duration;

use blockfall_config::{BoardSettings, CompletionStrategy, Settings};
use blockfall_domain::{
    BEST_SCORE_KEY, FileScoreStore, Game, MemoryScoreStore, ScoreState, ScoreStore,
};
use blockfall_engine::{App, SceneEvent};
use blockfall_types::{GlobalPhase, GridPos};
use tempfile::tempdir;

use crate::common::{FRAME, entered, playground_scene, settings, settle};

fn settle_app(app: &mut App) {
    for _ in 0..500 {
        app.tick(FRAME).expect("no contract violation");
        if app.scene().is_idle() {
            return;
        }
    }
    panic!("app never settled");
}

fn game_settings(columns: usize, rows: usize) -> Settings {
    let mut settings = settings(CompletionStrategy::Latch);
    settings.board = BoardSettings { columns, rows };
    settings
}

fn scripted_app(settings: &Settings, store: Box<dyn ScoreStore + Send>, upcoming: &[u32]) -> App {
    let mut game = Game::new(settings.board.columns, settings.board.rows, store, Some(11));
    game.playground_mut().set_upcoming(upcoming.iter().copied());
    let mut app = App::with_game(game, settings);
    settle_app(&mut app);
    app
}

#[test]
fn lone_block_passes_through_without_animating_merges() {
    let mut scene = playground_scene(3, 3, &[4], CompletionStrategy::Latch);
    scene.take_events();
    scene.commit(2).unwrap();
    settle(&mut scene);

    let events = scene.take_events();
    assert_eq!(
        entered(&events),
        vec![
            GlobalPhase::Placing,
            GlobalPhase::Collapsing,
            GlobalPhase::Moving,
            GlobalPhase::Static,
        ]
    );
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, SceneEvent::EntityAbsorbed(_)))
    );
    let block = scene.mirror().at(GridPos::new(2, 0)).expect("landed");
    assert_eq!(block.value(), 4);
    assert_eq!(scene.mirror().len(), 1);
}

#[test]
fn pair_merge_leaves_one_survivor_with_the_next_value() {
    let mut scene = playground_scene(3, 3, &[2, 2], CompletionStrategy::Latch);
    scene.commit(1).unwrap();
    settle(&mut scene);
    let first = scene.mirror().at(GridPos::new(1, 0)).expect("first").id();
    scene.commit(1).unwrap();
    settle(&mut scene);

    let absorbed: Vec<_> = scene
        .take_events()
        .into_iter()
        .filter_map(|event| match event {
            SceneEvent::EntityAbsorbed(id) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(absorbed, vec![first]);
    assert_eq!(scene.mirror().len(), 1);
    let survivor = scene.mirror().at(GridPos::new(1, 0)).expect("survivor");
    assert_ne!(survivor.id(), first);
    assert_eq!(survivor.value(), 3);
    assert_eq!(survivor.display_value(), 3);
}

#[test]
fn merge_scores_and_best_survives_a_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scores.json");
    let settings = game_settings(3, 3);

    let mut app = scripted_app(&settings, Box::new(FileScoreStore::new(&path)), &[2, 2]);
    app.commit(0);
    settle_app(&mut app);
    app.commit(0);
    settle_app(&mut app);
    assert_eq!(app.score(), ScoreState { score: 8, best: 8 });
    assert_eq!(
        FileScoreStore::new(&path).get(BEST_SCORE_KEY).unwrap(),
        Some(8)
    );

    let restarted = scripted_app(&settings, Box::new(FileScoreStore::new(&path)), &[1]);
    assert_eq!(restarted.score(), ScoreState { score: 0, best: 8 });
}

#[test]
fn full_board_ends_the_game() {
    let settings = game_settings(2, 1);
    let mut app = scripted_app(&settings, Box::new(MemoryScoreStore::new()), &[1, 3]);
    app.commit(0);
    settle_app(&mut app);
    assert!(!app.is_game_over());
    app.commit(1);
    settle_app(&mut app);

    assert!(app.is_game_over());
    assert_eq!(app.status_message(), Some("Game over. Press q to quit."));
    assert_eq!(app.phase_label(), "STATIC");
}

#[test]
fn refused_commit_is_shown_to_the_player() {
    let settings = game_settings(2, 2);
    let mut app = scripted_app(&settings, Box::new(MemoryScoreStore::new()), &[1]);
    app.commit(7);
    assert_eq!(app.cursor(), 1);
    assert_eq!(
        app.status_message(),
        Some("column 7 does not exist (board has 2)")
    );
    app.tick(Duration::from_millis(8)).unwrap();
    assert_eq!(app.scene().port().snapshot().blocks.len(), 0);
}
