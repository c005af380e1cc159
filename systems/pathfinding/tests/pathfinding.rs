use glam::Vec2;
use horde_core::{AgentId, CellCoord};
use horde_system_pathfinding::{
    PathError, PathOutcome, PathService, PathServiceConfig, PathTicket,
};
use horde_world::{Level, OccupancyGrid};

const TILE: f32 = 10.0;

fn center(column: u32, row: u32) -> Vec2 {
    Vec2::new((column as f32 + 0.5) * TILE, (row as f32 + 0.5) * TILE)
}

fn run_to_completion(service: &mut PathService, grid: &OccupancyGrid) -> Vec<PathOutcome> {
    let mut outcomes = Vec::new();
    for _ in 0..1_000 {
        service.calculate(grid);
        service.drain_completed(&mut outcomes);
        if service.pending() == 0 {
            break;
        }
    }
    outcomes
}

fn single(outcomes: Vec<PathOutcome>, ticket: PathTicket) -> PathOutcome {
    assert_eq!(outcomes.len(), 1, "expected exactly one outcome");
    let outcome = outcomes.into_iter().next().expect("one outcome");
    assert_eq!(outcome.ticket, ticket);
    outcome
}

#[test]
fn diagonal_corridor_on_open_grid() {
    let grid = OccupancyGrid::open(10, 10, TILE);
    let mut service = PathService::default();

    let ticket = service.find_path(&grid, center(0, 0), center(9, 9), AgentId::new(1));
    let outcome = single(run_to_completion(&mut service, &grid), ticket);
    let path = outcome.result.expect("open grid has a path");

    assert_eq!(outcome.requester, AgentId::new(1));
    assert_eq!(path.len(), 9);
    assert_eq!(path.waypoints().last(), Some(&center(9, 9)));
    assert_eq!(path.end_cell(), CellCoord::new(9, 9));
    assert!(!path.cells().contains(&CellCoord::new(0, 0)));
}

#[test]
fn blocked_goal_fails_but_neighbor_query_succeeds() {
    let mut grid = OccupancyGrid::open(10, 10, TILE);
    grid.set_walkable(center(5, 5), false);
    let mut service = PathService::default();

    let direct = service.find_path(&grid, center(0, 5), center(5, 5), AgentId::new(1));
    let outcome = single(run_to_completion(&mut service, &grid), direct);
    assert_eq!(outcome.result, Err(PathError::NoPath));

    let around = service.find_path_to_neighbor_of(&grid, center(0, 5), center(5, 5), AgentId::new(1));
    let outcome = single(run_to_completion(&mut service, &grid), around);
    let path = outcome.result.expect("west neighbour is reachable");
    assert_eq!(path.end_cell(), CellCoord::new(4, 5));
    assert_eq!(path.end_cell().manhattan_distance(CellCoord::new(5, 5)), 1);
}

#[test]
fn neighbor_ties_prefer_north_before_west() {
    let mut grid = OccupancyGrid::open(5, 5, TILE);
    grid.set_walkable(center(2, 2), false);
    let mut service = PathService::default();

    let ticket = service.find_path_to_neighbor_of(&grid, center(0, 0), center(2, 2), AgentId::new(3));
    let outcome = single(run_to_completion(&mut service, &grid), ticket);

    assert_eq!(
        outcome.result.map(|path| path.end_cell()),
        Ok(CellCoord::new(2, 1))
    );
}

#[test]
fn unreachable_neighbor_falls_back_to_the_next() {
    // The west side of the barricade is a sealed pocket even though it is the
    // closest neighbour to the start.
    let level = Level::from_ascii(
        [
            "##.##", //
            "#.B..",
            ".#...",
            ".....",
        ],
        TILE,
        3,
    )
    .expect("map loads");
    let mut service = PathService::default();

    let ticket =
        service.find_path_to_neighbor_of(level.grid(), center(0, 2), center(2, 1), AgentId::new(2));
    let outcome = single(run_to_completion(&mut service, level.grid()), ticket);

    assert_eq!(
        outcome.result.map(|path| path.end_cell()),
        Ok(CellCoord::new(2, 2))
    );
}

#[test]
fn diagonals_never_cut_corners() {
    let mut grid = OccupancyGrid::open(3, 3, TILE);
    grid.set_walkable(center(1, 0), false);
    let mut service = PathService::default();

    let ticket = service.find_path(&grid, center(0, 0), center(2, 1), AgentId::new(1));
    let path = single(run_to_completion(&mut service, &grid), ticket)
        .result
        .expect("route exists through row 1");

    let mut previous = CellCoord::new(0, 0);
    for &cell in path.cells() {
        let columns = cell.column() as i32 - previous.column() as i32;
        let rows = cell.row() as i32 - previous.row() as i32;
        if columns != 0 && rows != 0 {
            let horizontal = previous.offset(columns, 0).expect("in range");
            let vertical = previous.offset(0, rows).expect("in range");
            assert!(grid.is_walkable(horizontal) && grid.is_walkable(vertical));
        }
        previous = cell;
    }
    assert_eq!(previous, CellCoord::new(2, 1));
}

#[test]
fn walled_in_goal_exhausts_to_no_path() {
    let level = Level::from_ascii(
        [
            ".......", //
            "..###..",
            "..#.#..",
            "..###..",
            ".......",
        ],
        TILE,
        1,
    )
    .expect("map loads");
    let mut service = PathService::default();

    let ticket = service.find_path(level.grid(), center(0, 0), center(3, 2), AgentId::new(9));
    let outcome = single(run_to_completion(&mut service, level.grid()), ticket);

    assert_eq!(outcome.result, Err(PathError::NoPath));
}

#[test]
fn out_of_range_coordinates_are_invalid() {
    let grid = OccupancyGrid::open(4, 4, TILE);
    let mut service = PathService::default();

    let first = service.find_path(&grid, Vec2::new(-5.0, 5.0), center(1, 1), AgentId::new(1));
    let second =
        service.find_path_to_neighbor_of(&grid, center(1, 1), Vec2::new(400.0, 5.0), AgentId::new(1));

    let mut outcomes = Vec::new();
    service.drain_completed(&mut outcomes);
    assert_eq!(service.pending(), 0);
    assert_eq!(
        outcomes
            .iter()
            .map(|outcome| (outcome.ticket, outcome.result.clone().map(|path| path.len())))
            .collect::<Vec<_>>(),
        vec![
            (first, Err(PathError::InvalidCoordinate)),
            (second, Err(PathError::InvalidCoordinate)),
        ]
    );
}

#[test]
fn long_searches_span_several_ticks() {
    let grid = OccupancyGrid::open(30, 1, TILE);
    let mut service = PathService::new(PathServiceConfig {
        iterations_per_tick: 4,
    });

    let ticket = service.find_path(&grid, center(0, 0), center(29, 0), AgentId::new(1));
    let mut outcomes = Vec::new();
    let mut ticks = 0;
    while outcomes.is_empty() {
        service.calculate(&grid);
        service.drain_completed(&mut outcomes);
        ticks += 1;
        assert!(ticks < 100, "search never finished");
    }

    assert!(ticks > 1, "budget should force more than one tick");
    let outcome = single(outcomes, ticket);
    assert_eq!(outcome.result.map(|path| path.len()), Ok(29));
}

#[test]
fn zero_budget_still_makes_progress() {
    let grid = OccupancyGrid::open(10, 1, TILE);
    let mut service = PathService::new(PathServiceConfig {
        iterations_per_tick: 0,
    });
    assert_eq!(service.config().iterations_per_tick, 1);

    let ticket = service.find_path(&grid, center(0, 0), center(9, 0), AgentId::new(1));
    let mut outcomes = Vec::new();
    let mut ticks = 0;
    while outcomes.is_empty() {
        service.calculate(&grid);
        service.drain_completed(&mut outcomes);
        ticks += 1;
        assert!(ticks < 100, "search never finished");
    }

    let outcome = single(outcomes, ticket);
    assert_eq!(outcome.result.map(|path| path.len()), Ok(9));
}

#[test]
fn searches_read_the_live_grid() {
    let mut grid = OccupancyGrid::open(10, 3, TILE);
    for row in [0, 2] {
        for column in 0..10 {
            grid.set_walkable(center(column, row), false);
        }
    }
    let mut service = PathService::new(PathServiceConfig {
        iterations_per_tick: 2,
    });

    let ticket = service.find_path(&grid, center(0, 1), center(9, 1), AgentId::new(4));
    service.calculate(&grid);
    grid.set_walkable(center(6, 1), false);

    let outcome = single(run_to_completion(&mut service, &grid), ticket);
    assert_eq!(outcome.result, Err(PathError::NoPath));
}

#[test]
fn resized_grid_fails_pending_search() {
    let grid = OccupancyGrid::open(10, 10, TILE);
    let rebuilt = OccupancyGrid::open(12, 12, TILE);
    let mut service = PathService::new(PathServiceConfig {
        iterations_per_tick: 1,
    });

    let ticket = service.find_path_to_neighbor_of(&grid, center(0, 0), center(9, 9), AgentId::new(1));
    service.calculate(&grid);

    let outcome = single(run_to_completion(&mut service, &rebuilt), ticket);
    assert_eq!(outcome.result, Err(PathError::NoPath));
}

#[test]
fn pending_requests_are_served_in_order() {
    let grid = OccupancyGrid::open(10, 10, TILE);
    let mut service = PathService::default();

    let tickets: Vec<PathTicket> = (0..3)
        .map(|agent| service.find_path(&grid, center(0, agent), center(9, 9), AgentId::new(agent)))
        .collect();
    assert_eq!(service.pending(), 3);

    let outcomes = run_to_completion(&mut service, &grid);
    assert_eq!(
        outcomes.iter().map(|outcome| outcome.ticket).collect::<Vec<_>>(),
        tickets
    );
    assert!(outcomes.iter().all(|outcome| outcome.result.is_ok()));
}
