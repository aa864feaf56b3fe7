use gridlock_core::{
    BlockColor, BlockId, BlockPhase, CellCoord, Command, Event, GridSpec, LevelState,
    PlacementError, Rotation, ShapeGeometry,
};
use gridlock_world::{self as world, query, World};

fn configured_world(width: u32, length: u32) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureGrid {
            spec: GridSpec::new(width, length, 1.0),
        },
        &mut events,
    );
    world
}

fn add_block(world: &mut World, rows: &[&str], color: BlockColor, anchor: CellCoord) -> BlockId {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::AddBlock {
            shape: ShapeGeometry::from_rows(rows).expect("valid rows"),
            color,
            anchor,
            rotation: Rotation::Deg0,
        },
        &mut events,
    );
    match events.as_slice() {
        [Event::BlockAdded { block, .. }] => *block,
        other => panic!("block was not added: {other:?}"),
    }
}

fn start(world: &mut World) {
    let mut events = Vec::new();
    world::apply(world, Command::StartLevel, &mut events);
}

fn occupancy(world: &World) -> Vec<bool> {
    query::grid(world).occupied_cells().to_vec()
}

#[test]
fn single_cell_block_on_matching_gate_is_removed() {
    let mut world = configured_world(10, 10);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::RegisterGate {
            color: BlockColor::Red,
            cells: vec![CellCoord::new(0, 0)],
        },
        &mut events,
    );
    let gate = match events.as_slice() {
        [Event::GateRegistered { gate, .. }] => *gate,
        other => panic!("gate was not registered: {other:?}"),
    };
    let block = add_block(&mut world, &["", "", "..#"], BlockColor::Red, CellCoord::new(0, 0));
    start(&mut world);

    assert_eq!(query::passable_gate(&world, block), Some(gate));

    events.clear();
    world::apply(&mut world, Command::PullThroughGate { block }, &mut events);
    assert_eq!(
        events,
        vec![Event::BlockPulledThroughGate {
            block,
            gate,
            cells: vec![CellCoord::new(0, 0)],
        }]
    );
    assert!(
        !query::grid(&world).is_occupied(CellCoord::new(0, 0)),
        "cell should be vacated as soon as the block starts falling"
    );
    assert_eq!(
        query::block(&world, block).map(|snapshot| snapshot.phase),
        Some(BlockPhase::Falling)
    );

    events.clear();
    world::apply(&mut world, Command::CompleteRemoval { block }, &mut events);
    assert_eq!(
        events,
        vec![
            Event::BlockRemoved {
                block,
                remaining: 0
            },
            Event::LevelCompleted,
        ]
    );
    assert!(query::block(&world, block).is_none());
    assert_eq!(query::level_state(&world), LevelState::Completed);
}

#[test]
fn move_onto_wall_is_rejected_and_occupancy_unchanged() {
    let mut world = configured_world(10, 10);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceWalls {
            cells: vec![CellCoord::new(2, 4)],
        },
        &mut events,
    );
    let block = add_block(
        &mut world,
        &["", "", "..#", "..#"],
        BlockColor::Blue,
        CellCoord::new(2, 2),
    );
    start(&mut world);
    let before = occupancy(&world);

    assert!(!query::is_valid_placement(
        &world,
        Some(block),
        &[CellCoord::new(2, 3), CellCoord::new(2, 4)]
    ));

    events.clear();
    world::apply(
        &mut world,
        Command::MoveBlock {
            block,
            anchor: CellCoord::new(2, 3),
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::BlockMoveRejected {
            block,
            anchor: CellCoord::new(2, 3),
            reason: PlacementError::Wall,
        }]
    );
    assert_eq!(occupancy(&world), before, "rejected move must not touch occupancy");
    assert_eq!(
        query::block(&world, block).map(|snapshot| snapshot.cells),
        Some(vec![CellCoord::new(2, 2), CellCoord::new(2, 3)])
    );
}

#[test]
fn move_onto_another_block_is_rejected() {
    let mut world = configured_world(10, 10);
    let first = add_block(&mut world, &["", "", "..#"], BlockColor::Red, CellCoord::new(5, 5));
    let second = add_block(&mut world, &["", "", "..#"], BlockColor::Green, CellCoord::new(6, 5));
    start(&mut world);

    assert!(!query::is_valid_placement(
        &world,
        Some(second),
        &[CellCoord::new(5, 5)]
    ));

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::MoveBlock {
            block: second,
            anchor: CellCoord::new(5, 5),
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::BlockMoveRejected {
            block: second,
            anchor: CellCoord::new(5, 5),
            reason: PlacementError::Occupied,
        }]
    );
    assert_eq!(
        query::block(&world, first).map(|snapshot| snapshot.cells),
        Some(vec![CellCoord::new(5, 5)])
    );
}

#[test]
fn commit_at_unchanged_position_succeeds() {
    let mut world = configured_world(10, 10);
    let block = add_block(
        &mut world,
        &["", ".###", "..#"],
        BlockColor::Purple,
        CellCoord::new(4, 4),
    );
    start(&mut world);
    let before = occupancy(&world);
    let cells = query::block(&world, block)
        .map(|snapshot| snapshot.cells)
        .expect("block exists");

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::MoveBlock {
            block,
            anchor: CellCoord::new(4, 4),
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::BlockMoved {
            block,
            from: cells.clone(),
            to: cells,
        }]
    );
    assert_eq!(occupancy(&world), before);
}

#[test]
fn overlapping_move_frees_only_vacated_cells() {
    let mut world = configured_world(10, 10);
    let block = add_block(
        &mut world,
        &["", "", "..#", "..#"],
        BlockColor::Blue,
        CellCoord::new(2, 2),
    );
    start(&mut world);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::MoveBlock {
            block,
            anchor: CellCoord::new(2, 3),
        },
        &mut events,
    );

    let grid = query::grid(&world);
    assert!(!grid.is_occupied(CellCoord::new(2, 2)));
    assert!(grid.is_occupied(CellCoord::new(2, 3)));
    assert!(grid.is_occupied(CellCoord::new(2, 4)));
    assert!(matches!(events.as_slice(), [Event::BlockMoved { .. }]));
}

#[test]
fn block_partially_on_gate_is_not_pulled() {
    let mut world = configured_world(10, 10);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::RegisterGate {
            color: BlockColor::Yellow,
            cells: vec![CellCoord::new(0, 0)],
        },
        &mut events,
    );
    let block = add_block(&mut world, &["", "", "..##"], BlockColor::Yellow, CellCoord::new(0, 0));
    start(&mut world);

    assert_eq!(query::passable_gate(&world, block), None);

    events.clear();
    world::apply(&mut world, Command::PullThroughGate { block }, &mut events);
    assert!(events.is_empty());
    assert!(query::grid(&world).is_occupied(CellCoord::new(1, 0)));
}

#[test]
fn falling_block_cannot_move() {
    let mut world = configured_world(4, 4);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::RegisterGate {
            color: BlockColor::Cyan,
            cells: vec![CellCoord::new(3, 3)],
        },
        &mut events,
    );
    let block = add_block(&mut world, &["", "", "..#"], BlockColor::Cyan, CellCoord::new(3, 3));
    let _ = add_block(&mut world, &["", "", "..#"], BlockColor::Red, CellCoord::new(0, 0));
    start(&mut world);
    world::apply(&mut world, Command::PullThroughGate { block }, &mut events);

    events.clear();
    world::apply(
        &mut world,
        Command::MoveBlock {
            block,
            anchor: CellCoord::new(2, 2),
        },
        &mut events,
    );
    world::apply(&mut world, Command::CompleteRemoval { block }, &mut events);

    assert_eq!(
        events,
        vec![
            Event::BlockMoveRejected {
                block,
                anchor: CellCoord::new(2, 2),
                reason: PlacementError::BlockFalling,
            },
            Event::BlockRemoved {
                block,
                remaining: 1
            },
        ]
    );
    assert_eq!(query::level_state(&world), LevelState::InProgress);
}
