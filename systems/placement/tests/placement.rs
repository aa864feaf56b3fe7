use glam::Vec3;
use gridlock_core::{
    BlockColor, BlockId, CellCoord, Command, Event, GridSpec, PlacementError, Rotation,
    ShapeGeometry,
};
use gridlock_system_placement::{DragConfig, PlacementController};
use gridlock_world::{self as world, query, World};

fn world_with_block(rows: &[&str], anchor: CellCoord, walls: &[CellCoord]) -> (World, BlockId) {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureGrid {
            spec: GridSpec::new(10, 10, 1.0),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::PlaceWalls {
            cells: walls.to_vec(),
        },
        &mut events,
    );
    events.clear();
    world::apply(
        &mut world,
        Command::AddBlock {
            shape: ShapeGeometry::from_rows(rows).expect("valid rows"),
            color: BlockColor::Orange,
            anchor,
            rotation: Rotation::Deg0,
        },
        &mut events,
    );
    let block = match events.as_slice() {
        [Event::BlockAdded { block, .. }] => *block,
        other => panic!("block was not added: {other:?}"),
    };
    world::apply(&mut world, Command::StartLevel, &mut events);
    (world, block)
}

const SINGLE: [&str; 3] = ["", "", "..#"];

#[test]
fn begin_move_is_refused_while_dragging() {
    let (world, block) = world_with_block(&SINGLE, CellCoord::new(2, 2), &[]);
    let mut controller = PlacementController::default();

    assert!(controller.begin_move(&world, block));
    assert!(
        !controller.begin_move(&world, block),
        "second begin should be ignored while a drag is active"
    );
    assert_eq!(controller.active_block(), Some(block));
}

#[test]
fn begin_move_is_refused_for_unknown_blocks() {
    let (world, _) = world_with_block(&SINGLE, CellCoord::new(2, 2), &[]);
    let mut controller = PlacementController::default();

    assert!(!controller.begin_move(&world, BlockId::new(42)));
    assert_eq!(controller.active_block(), None);
}

#[test]
fn drag_lifts_block_above_its_cell() {
    let (world, block) = world_with_block(&SINGLE, CellCoord::new(2, 2), &[]);
    let mut controller = PlacementController::default();

    assert!(controller.begin_move(&world, block));
    let position = controller.position().expect("dragging");
    assert_eq!(position.x, 2.0);
    assert_eq!(position.z, 2.0);
    assert!((position.y - 0.05).abs() < 1e-6);
}

#[test]
fn update_position_never_mutates_occupancy() {
    let (world, block) = world_with_block(
        &["", "", "..#", "..#"],
        CellCoord::new(2, 2),
        &[CellCoord::new(2, 4)],
    );
    let before = query::grid(&world).clone();
    let mut controller = PlacementController::default();
    assert!(controller.begin_move(&world, block));

    let feedback = controller
        .update_position(&world, Vec3::new(2.0, 0.0, 3.0))
        .expect("dragging");

    assert_eq!(feedback.anchor, CellCoord::new(2, 3));
    assert_eq!(feedback.cells, vec![CellCoord::new(2, 3), CellCoord::new(2, 4)]);
    assert!(!feedback.valid);
    assert!(!feedback.smoothed_valid);
    assert_eq!(query::grid(&world), &before);
}

#[test]
fn update_position_is_ignored_while_idle() {
    let (world, _) = world_with_block(&SINGLE, CellCoord::new(2, 2), &[]);
    let mut controller = PlacementController::default();

    assert!(controller
        .update_position(&world, Vec3::new(3.0, 0.0, 3.0))
        .is_none());
}

#[test]
fn threshold_flags_positions_leaning_into_a_wall() {
    let (world, block) = world_with_block(&SINGLE, CellCoord::new(2, 2), &[CellCoord::new(4, 2)]);
    let mut controller = PlacementController::default();
    assert!(controller.begin_move(&world, block));

    let leaning = controller
        .update_position(&world, Vec3::new(3.3, 0.0, 2.0))
        .expect("dragging");
    assert!(leaning.valid);
    assert!(!leaning.smoothed_valid);

    let centred = controller
        .update_position(&world, Vec3::new(2.95, 0.0, 2.0))
        .expect("dragging");
    assert!(centred.valid);
    assert!(centred.smoothed_valid);
}

#[test]
fn threshold_does_not_influence_commit() {
    let (mut world, block) =
        world_with_block(&SINGLE, CellCoord::new(2, 2), &[CellCoord::new(4, 2)]);
    let mut controller = PlacementController::default();
    assert!(controller.begin_move(&world, block));
    let _ = controller.update_position(&world, Vec3::new(3.3, 0.0, 2.0));

    let mut events = Vec::new();
    assert!(controller.commit(&mut world, &mut events));
    assert!(query::grid(&world).is_occupied(CellCoord::new(3, 2)));
}

#[test]
fn commit_without_moving_succeeds() {
    let (mut world, block) = world_with_block(&SINGLE, CellCoord::new(5, 5), &[]);
    let mut controller = PlacementController::default();
    assert!(controller.begin_move(&world, block));

    let mut events = Vec::new();
    assert!(controller.commit(&mut world, &mut events));
    assert_eq!(
        events,
        vec![Event::BlockMoved {
            block,
            from: vec![CellCoord::new(5, 5)],
            to: vec![CellCoord::new(5, 5)],
        }]
    );
    assert_eq!(controller.active_block(), None);
}

#[test]
fn rejected_commit_leaves_block_at_rollback_anchor() {
    let (mut world, block) = world_with_block(
        &["", "", "..#", "..#"],
        CellCoord::new(2, 2),
        &[CellCoord::new(2, 4)],
    );
    let before = query::grid(&world).clone();
    let mut controller = PlacementController::default();
    assert!(controller.begin_move(&world, block));
    let _ = controller.update_position(&world, Vec3::new(2.0, 0.0, 3.0));

    let mut events = Vec::new();
    assert!(!controller.commit(&mut world, &mut events));
    assert_eq!(
        events,
        vec![Event::BlockMoveRejected {
            block,
            anchor: CellCoord::new(2, 3),
            reason: PlacementError::Wall,
        }]
    );
    assert_eq!(query::grid(&world), &before);
    assert_eq!(
        controller.revert_position(&world, 0.0),
        Some(Vec3::new(2.0, 0.0, 2.0))
    );
}

#[test]
fn cancel_returns_to_idle_without_touching_world() {
    let (world, block) = world_with_block(&SINGLE, CellCoord::new(1, 1), &[]);
    let mut controller = PlacementController::default();
    assert!(controller.begin_move(&world, block));

    assert_eq!(controller.cancel(), Some(block));
    assert_eq!(controller.cancel(), None);
    assert!(query::grid(&world).is_occupied(CellCoord::new(1, 1)));
}

#[test]
fn fast_drag_stops_short_of_a_wall() {
    let (mut world, block) =
        world_with_block(&SINGLE, CellCoord::new(2, 2), &[CellCoord::new(5, 2)]);
    let mut controller = PlacementController::default();
    assert!(controller.begin_move(&world, block));

    for _ in 0..4 {
        let _ = controller.drag_by(&world, Vec3::new(1.0, 0.0, 0.0));
    }
    let position = controller.position().expect("dragging");

    assert!(
        position.x >= 3.9 && position.x < 4.1,
        "block should rest just before the wall, got {position:?}"
    );
    let mut events = Vec::new();
    assert!(controller.commit(&mut world, &mut events));
    assert_eq!(
        query::block(&world, block).map(|snapshot| snapshot.anchor),
        Some(CellCoord::new(4, 2))
    );
}

#[test]
fn slow_drag_slides_along_a_blocked_axis() {
    let (world, block) = world_with_block(&SINGLE, CellCoord::new(2, 2), &[CellCoord::new(3, 2)]);
    let mut controller = PlacementController::default();
    assert!(controller.begin_move(&world, block));

    let position = controller
        .drag_by(&world, Vec3::new(0.6, 0.0, 0.3))
        .expect("dragging");

    assert!(position.x < 2.1, "x should be blocked, got {position:?}");
    assert!((position.z - 2.3).abs() < 1e-4, "z should move freely, got {position:?}");
}

#[test]
fn low_threshold_allows_edge_positions() {
    let (world, block) = world_with_block(&SINGLE, CellCoord::new(2, 2), &[CellCoord::new(4, 2)]);
    let config = DragConfig {
        collision_threshold: 0.4,
        ..DragConfig::default()
    };
    let mut controller = PlacementController::new(config);
    assert!(controller.begin_move(&world, block));

    let feedback = controller
        .update_position(&world, Vec3::new(3.45, 0.0, 2.0))
        .expect("dragging");
    assert!(feedback.smoothed_valid);
}
