use star_pilot_core::{
    CellCoord, Color, Command, CommandKind, Event, Function, FunctionIndex, Orientation, Outcome,
    Tile,
};
use star_pilot_world::{self as world, query, Grid, RunState, RunStatus, Ship};

fn start(grid: Grid, at: CellCoord, facing: Orientation, budget: u32) -> RunState {
    RunState::new(grid, Ship::new(at, facing), budget).expect("valid run state")
}

fn with_program(mut state: RunState, functions: Vec<Vec<Command>>) -> RunState {
    state.load_program(functions.into_iter().map(Function::new).collect());
    state
}

fn green_with_star_at(columns: u32, rows: u32, star: CellCoord) -> Grid {
    let rows = (0..rows)
        .map(|row| {
            (0..columns)
                .map(|column| Tile::new(Color::Green, CellCoord::new(column, row) == star))
                .collect()
        })
        .collect();
    Grid::from_rows(rows).expect("grid")
}

#[test]
fn corridor_ends_on_the_white_tile() {
    let grid = Grid::from_rows(vec![vec![
        Tile::plain(Color::Red),
        Tile::plain(Color::Green),
        Tile::plain(Color::White),
    ]])
    .expect("grid");
    let mut state = with_program(
        start(grid, CellCoord::new(0, 0), Orientation::East, 10),
        vec![vec![Command::move_forward(), Command::move_forward()]],
    );
    let mut events = Vec::new();

    world::step(&mut state, &mut events);
    assert_eq!(query::ship(&state).position(), CellCoord::new(1, 0));
    assert_eq!(query::status(&state), RunStatus::Running);

    world::step(&mut state, &mut events);
    assert_eq!(query::ship(&state).position(), CellCoord::new(2, 0));
    assert_eq!(query::status(&state), RunStatus::Over(Outcome::Loss));
    assert!(query::is_over(&state));
    assert!(!query::is_win(&state));
}

#[test]
fn turning_route_collects_the_only_star() {
    let grid = green_with_star_at(2, 2, CellCoord::new(1, 1));
    let mut state = with_program(
        start(grid, CellCoord::new(0, 0), Orientation::East, 10),
        vec![vec![
            Command::move_forward(),
            Command::turn_right(),
            Command::move_forward(),
        ]],
    );
    let mut events = Vec::new();

    world::run(&mut state, &mut events);

    assert!(query::is_win(&state));
    assert_eq!(query::ship(&state).collected_stars(), 1);
    assert_eq!(query::ship(&state).position(), CellCoord::new(1, 1));
    assert_eq!(query::ship(&state).orientation(), Orientation::South);
    assert_eq!(query::grid(&state).stars_remaining(), 0);
    assert_eq!(
        events.last(),
        Some(&Event::RunEnded {
            outcome: Outcome::Win
        })
    );
}

#[test]
fn gate_mismatch_consumes_budget_without_effect() {
    let mut grid_rows = vec![vec![Tile::plain(Color::Red); 3]; 3];
    grid_rows[2][2] = Tile::new(Color::Red, true);
    let grid = Grid::from_rows(grid_rows).expect("grid");
    let mut state = with_program(
        start(grid, CellCoord::new(1, 1), Orientation::West, 10),
        vec![vec![
            Command::move_forward().gated(Color::Green),
            Command::turn_left().gated(Color::Blue),
            Command::turn_right(),
        ]],
    );
    let mut events = Vec::new();

    world::step(&mut state, &mut events);
    world::step(&mut state, &mut events);

    let ship = query::ship(&state);
    assert_eq!(ship.position(), CellCoord::new(1, 1));
    assert_eq!(ship.orientation(), Orientation::West);
    assert_eq!(query::executed(&state), 2);
    assert_eq!(query::status(&state), RunStatus::Running);
    assert_eq!(
        events,
        vec![
            Event::CommandSkipped {
                command: Command::move_forward().gated(Color::Green),
                tile: Color::Red,
            },
            Event::CommandSkipped {
                command: Command::turn_left().gated(Color::Blue),
                tile: Color::Red,
            },
        ]
    );
}

#[test]
fn matching_gate_lets_the_command_fire() {
    let grid = Grid::from_rows(vec![vec![
        Tile::plain(Color::Blue),
        Tile::plain(Color::Green),
        Tile::new(Color::Green, true),
    ]])
    .expect("grid");
    let mut state = with_program(
        start(grid, CellCoord::new(0, 0), Orientation::East, 10),
        vec![vec![
            Command::move_forward().gated(Color::Blue),
            Command::move_forward().gated(Color::Blue),
            Command::move_forward().gated(Color::Green),
        ]],
    );
    let mut events = Vec::new();

    world::run(&mut state, &mut events);

    assert_eq!(query::ship(&state).position(), CellCoord::new(2, 0));
    assert_eq!(query::executed(&state), 3);
    assert!(query::is_win(&state));
}

#[test]
fn blocking_tile_beats_star_collection() {
    let grid = Grid::from_rows(vec![vec![
        Tile::plain(Color::Green),
        Tile::new(Color::White, true),
    ]])
    .expect("grid");
    let mut state = with_program(
        start(grid, CellCoord::new(0, 0), Orientation::East, 10),
        vec![vec![Command::move_forward(), Command::turn_left()]],
    );
    let mut events = Vec::new();

    world::step(&mut state, &mut events);

    assert_eq!(query::status(&state), RunStatus::Over(Outcome::Loss));
    assert_eq!(query::ship(&state).collected_stars(), 0);
    assert_eq!(query::grid(&state).stars_remaining(), 1);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::StarCollected { .. })));
}

#[test]
fn finished_runs_ignore_further_steps() {
    let grid = green_with_star_at(3, 1, CellCoord::new(1, 0));
    let mut state = with_program(
        start(grid, CellCoord::new(0, 0), Orientation::East, 10),
        vec![vec![Command::move_forward(), Command::move_forward()]],
    );
    let mut events = Vec::new();
    world::run(&mut state, &mut events);
    assert!(query::is_over(&state));

    let frozen = state.clone();
    let mut later = Vec::new();
    for _ in 0..5 {
        world::step(&mut state, &mut later);
        world::run(&mut state, &mut later);
    }

    assert_eq!(state, frozen);
    assert!(later.is_empty());
}

#[test]
fn calls_append_behind_queued_siblings() {
    let grid = green_with_star_at(4, 4, CellCoord::new(3, 3));
    let a = Command::turn_left();
    let b = Command::turn_right();
    let x = Command::move_forward();
    let y = Command::turn_left().gated(Color::Red);
    let mut state = with_program(
        start(grid, CellCoord::new(1, 1), Orientation::North, 20),
        vec![vec![a, Command::call(FunctionIndex::new(1)), b], vec![x, y]],
    );
    let mut events = Vec::new();

    world::step(&mut state, &mut events);
    assert_eq!(
        query::pending_commands(&state),
        vec![Command::call(FunctionIndex::new(1)), b]
    );

    world::step(&mut state, &mut events);
    assert_eq!(query::pending_commands(&state), vec![b, x, y]);
    assert!(events.contains(&Event::FunctionExpanded {
        function: FunctionIndex::new(1),
        enqueued: 2,
    }));
}

#[test]
fn unqualified_call_targets_the_entry_function() {
    let grid = green_with_star_at(3, 3, CellCoord::new(2, 2));
    let mut state = with_program(
        start(grid, CellCoord::new(0, 0), Orientation::East, 20),
        vec![vec![Command::new(CommandKind::CallFunction), Command::turn_right()]],
    );
    let mut events = Vec::new();

    world::step(&mut state, &mut events);

    assert_eq!(
        query::pending_commands(&state),
        vec![
            Command::turn_right(),
            Command::new(CommandKind::CallFunction),
            Command::turn_right(),
        ]
    );
}

#[test]
fn self_recursion_stops_at_the_budget() {
    let grid = green_with_star_at(5, 5, CellCoord::new(4, 4));
    let budget = 37;
    let mut state = with_program(
        start(grid, CellCoord::new(0, 0), Orientation::East, budget),
        vec![vec![Command::turn_left(), Command::call(FunctionIndex::MAIN)]],
    );
    let mut events = Vec::new();

    world::run(&mut state, &mut events);

    assert_eq!(query::executed(&state), budget);
    assert_eq!(query::status(&state), RunStatus::Over(Outcome::Loss));
    assert!(query::pending(&state).count() > 0);
}

#[test]
fn empty_program_settles_on_first_step() {
    let grid = green_with_star_at(2, 1, CellCoord::new(1, 0));
    let mut state = start(grid, CellCoord::new(0, 0), Orientation::East, 10);
    let mut events = Vec::new();

    world::step(&mut state, &mut events);

    assert_eq!(query::executed(&state), 0);
    assert_eq!(query::status(&state), RunStatus::Over(Outcome::Loss));
    assert_eq!(
        events,
        vec![Event::RunEnded {
            outcome: Outcome::Loss
        }]
    );
}

#[test]
fn starless_grid_wins_once_the_queue_drains() {
    let grid = Grid::filled(3, 1, Tile::plain(Color::Blue)).expect("grid");
    let mut state = with_program(
        start(grid, CellCoord::new(0, 0), Orientation::East, 10),
        vec![vec![Command::move_forward(), Command::move_forward()]],
    );
    let mut events = Vec::new();

    world::step(&mut state, &mut events);
    assert_eq!(query::status(&state), RunStatus::Running);

    world::step(&mut state, &mut events);
    assert_eq!(query::status(&state), RunStatus::Over(Outcome::Win));
}

#[test]
fn random_programs_keep_the_ship_on_the_grid() {
    let mut rng = 0x5eed_1234_abcd_0001_u64;
    for _ in 0..200 {
        rng = next_random(rng);
        let columns = 1 + (rng % 6) as u32;
        rng = next_random(rng);
        let rows = 1 + (rng % 6) as u32;

        let mut tiles = Vec::new();
        for _ in 0..rows {
            let mut row = Vec::new();
            for _ in 0..columns {
                rng = next_random(rng);
                let color = Color::ALL[(rng % 4) as usize];
                rng = next_random(rng);
                row.push(Tile::new(color, rng % 5 == 0));
            }
            tiles.push(row);
        }
        let grid = Grid::from_rows(tiles).expect("grid");

        rng = next_random(rng);
        let at = CellCoord::new((rng % u64::from(columns)) as u32, 0);
        rng = next_random(rng);
        let facing = Orientation::ALL[(rng % 4) as usize];

        let mut functions = Vec::new();
        for _ in 0..2 {
            let mut commands = Vec::new();
            for _ in 0..6 {
                rng = next_random(rng);
                let kind = CommandKind::ALL[(rng % 4) as usize];
                rng = next_random(rng);
                let mut command = Command::new(kind).with_function(FunctionIndex::new((rng % 3) as usize));
                rng = next_random(rng);
                if rng % 3 == 0 {
                    command = command.gated(Color::ALL[(rng % 5) as usize]);
                }
                commands.push(command);
            }
            functions.push(commands);
        }

        let budget = 60;
        let mut state = with_program(start(grid, at, facing, budget), functions);
        let mut events = Vec::new();
        let mut steps = 0;
        while !query::is_over(&state) {
            world::step(&mut state, &mut events);
            steps += 1;
            let grid = query::grid(&state);
            assert!(grid.contains(query::ship(&state).position()));
            assert!(query::executed(&state) <= budget);
            assert!(steps <= budget + 1, "run failed to terminate");
        }

        let stars_left = query::grid(&state).stars_remaining();
        assert_eq!(query::is_win(&state), stars_left == 0);
    }
}

fn next_random(state: u64) -> u64 {
    state
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1_442_695_040_888_963_407)
}
