//! Properties every generated field must hold regardless of the layout of the
//! grid
//!

use bevy::prelude::*;
use bevy_flowfield_grid_plugin::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Row-major costs of a `columns` x `rows` grid with roughly a fifth of the
/// cells impassable and the rest costing between 1 and 5
fn random_costs(rng: &mut StdRng, columns: usize, rows: usize) -> Vec<u8> {
	(0..columns * rows)
		.map(|_| {
			if rng.random_bool(0.2) {
				IMPASSABLE
			} else {
				rng.random_range(1..=5)
			}
		})
		.collect()
}

/// Manager over a unit sized [CostMap] of `costs` with the given queue
/// `strategy`
fn manager_over(
	costs: Vec<u8>,
	columns: usize,
	rows: usize,
	strategy: QueueStrategy,
) -> FlowFieldManager<CostMap> {
	let dimensions = GridDimensions::new(Vec2::ZERO, 1.0, columns, rows).unwrap();
	let cost_map = CostMap::new(dimensions, costs).unwrap();
	let settings = FlowFieldSettings::new(dimensions).with_queue_strategy(strategy);
	FlowFieldManager::new(settings, cost_map).unwrap()
}

/// World position of the centre of a unit cell
fn centre(cell: GridCell) -> Vec2 {
	Vec2::new(cell.get_column() as f32 + 0.5, cell.get_row() as f32 + 0.5)
}

/// Pick `count` distinct walkable cells of the grid
fn random_walkable(rng: &mut StdRng, grid: &Grid, count: usize) -> Vec<GridCell> {
	let columns = grid.get_dimensions().get_columns();
	let rows = grid.get_dimensions().get_rows();
	let mut cells = Vec::new();
	while cells.len() < count {
		let cell = GridCell::new(rng.random_range(0..columns), rng.random_range(0..rows));
		if grid.get_cost_field().is_walkable(cell) && !cells.contains(&cell) {
			cells.push(cell);
		}
	}
	cells
}

/// Relax every edge between 8-connected walkable cells of row-major `costs`
/// until nothing improves. Entering a cell of cost `c` orthogonally costs
/// `10 * c` and diagonally `14 * c`, diagonals are never filtered
fn bellman_ford(costs: &[u8], columns: usize, rows: usize, goals: &[GridCell]) -> Vec<u16> {
	let unreached = u16::MAX as u32;
	let mut distance = vec![unreached; costs.len()];
	for goal in goals {
		distance[goal.get_row() * columns + goal.get_column()] = 0;
	}
	loop {
		let mut improved = false;
		for row in 0..rows as i64 {
			for column in 0..columns as i64 {
				let index = (row as usize) * columns + column as usize;
				if distance[index] == unreached || costs[index] == 0 {
					continue;
				}
				for dr in -1..=1_i64 {
					for dc in -1..=1_i64 {
						if dr == 0 && dc == 0 {
							continue;
						}
						let (c, r) = (column + dc, row + dr);
						if c < 0 || r < 0 || c >= columns as i64 || r >= rows as i64 {
							continue;
						}
						let n_index = (r as usize) * columns + c as usize;
						let cost = costs[n_index] as u32;
						if cost == 0 {
							continue;
						}
						let step = if dr != 0 && dc != 0 { 14 * cost } else { 10 * cost };
						let candidate = (distance[index] + step).min(unreached);
						if candidate < distance[n_index] {
							distance[n_index] = candidate;
							improved = true;
						}
					}
				}
			}
		}
		if !improved {
			break;
		}
	}
	distance.into_iter().map(|d| d as u16).collect()
}

/// Directions as raw bits so comparisons are exact
fn direction_bits(field: &FlowField) -> Vec<(u32, u32)> {
	field
		.get()
		.iter()
		.map(|d| (d.x.to_bits(), d.y.to_bits()))
		.collect()
}

#[test]
fn determinism() {
	let mut rng = StdRng::seed_from_u64(7);
	let costs = random_costs(&mut rng, 16, 12);
	let mut first = manager_over(costs.clone(), 16, 12, QueueStrategy::BinaryHeap);
	let mut second = manager_over(costs, 16, 12, QueueStrategy::BinaryHeap);
	let goals: Vec<Vec2> = random_walkable(&mut rng, first.grid(), 2)
		.into_iter()
		.map(centre)
		.collect();
	first.generate(goals[0]).unwrap();
	second.generate(goals[0]).unwrap();
	let (a, b) = (first.snapshot(), second.snapshot());
	assert_eq!(a.get_integration_field().get(), b.get_integration_field().get());
	assert_eq!(direction_bits(a.get_flow_field()), direction_bits(b.get_flow_field()));
	// regenerating a multi-goal field on the same manager is identical too
	first.generate_many(&goals).unwrap();
	let a = first.snapshot();
	first.generate_many(&goals).unwrap();
	let b = first.snapshot();
	assert!(!std::sync::Arc::ptr_eq(&a, &b));
	assert_eq!(a.get_integration_field().get(), b.get_integration_field().get());
	assert_eq!(direction_bits(a.get_flow_field()), direction_bits(b.get_flow_field()));
}

#[test]
fn partition_matches_brute_force() {
	for strategy in [QueueStrategy::BinaryHeap, QueueStrategy::Fifo] {
		for seed in 0..8 {
			let mut rng = StdRng::seed_from_u64(seed);
			let costs = random_costs(&mut rng, 10, 10);
			let dimensions = GridDimensions::new(Vec2::ZERO, 1.0, 10, 10).unwrap();
			let settings = FlowFieldSettings::new(dimensions)
				.with_queue_strategy(strategy)
				.with_diagonal_movement(DiagonalMovement::Always);
			let cost_map = CostMap::new(dimensions, costs.clone()).unwrap();
			let mut manager = FlowFieldManager::new(settings, cost_map).unwrap();
			let goals = random_walkable(&mut rng, manager.grid(), 3);
			let positions: Vec<Vec2> = goals.iter().map(|g| centre(*g)).collect();
			manager.generate_many(&positions).unwrap();
			let snapshot = manager.snapshot();
			let result = snapshot.get_integration_field().get();
			assert_eq!(bellman_ford(&costs, 10, 10, &goals).as_slice(), result);
			// every cell carries the cost of its nearest goal
			let singles: Vec<Vec<u16>> = goals
				.iter()
				.map(|g| bellman_ford(&costs, 10, 10, &[*g]))
				.collect();
			for (index, cost) in result.iter().enumerate() {
				let nearest = singles.iter().map(|s| s[index]).min().unwrap();
				assert_eq!(nearest, *cost, "seed {} index {}", seed, index);
			}
		}
	}
}

#[test]
fn descent_is_monotonic() {
	for seed in 100..110 {
		let mut rng = StdRng::seed_from_u64(seed);
		let costs = random_costs(&mut rng, 20, 20);
		let mut manager = manager_over(costs, 20, 20, QueueStrategy::BinaryHeap);
		let goal = random_walkable(&mut rng, manager.grid(), 1)[0];
		manager.generate(centre(goal)).unwrap();
		let snapshot = manager.snapshot();
		let integration = snapshot.get_integration_field();
		let flow = snapshot.get_flow_field();
		for index in 0..400 {
			let cell = GridCell::from_index(index, 20);
			let cost = integration.get_field_cell_value(cell);
			let ordinal = flow.get_ordinal(cell);
			if cost == INTEGRATION_SENTINEL || cell == goal {
				assert_eq!(Ordinal::Zero, ordinal, "seed {} cell {:?}", seed, cell);
				continue;
			}
			let next = cell.get_neighbour(ordinal, 20, 20).unwrap();
			assert!(
				integration.get_field_cell_value(next) < cost,
				"seed {} cell {:?} does not descend",
				seed,
				cell
			);
		}
	}
}

#[test]
fn enclosed_pocket_unreachable() {
	let dimensions = GridDimensions::new(Vec2::ZERO, 1.0, 8, 8).unwrap();
	let mut obstacles = ObstacleMap::new(1);
	// hollow ring of walls from (2, 2) to (5, 5)
	obstacles.place(Obstacle::impassable(Rect::new(2.0, 2.0, 6.0, 3.0)));
	obstacles.place(Obstacle::impassable(Rect::new(2.0, 5.0, 6.0, 6.0)));
	obstacles.place(Obstacle::impassable(Rect::new(2.0, 2.0, 3.0, 6.0)));
	obstacles.place(Obstacle::impassable(Rect::new(5.0, 2.0, 6.0, 6.0)));
	let mut manager =
		FlowFieldManager::new(FlowFieldSettings::new(dimensions), obstacles).unwrap();
	manager.generate(Vec2::new(0.5, 0.5)).unwrap();
	for position in [Vec2::new(3.5, 3.5), Vec2::new(4.5, 4.5)] {
		assert!(manager.is_walkable(position));
		assert_eq!(None, manager.path_cost(position));
		assert_eq!(Vec2::ZERO, manager.snapshot().get_flow_field().get_field_cell_value(
			manager.grid().get_dimensions().world_to_cell(position).unwrap()
		));
		assert!(!manager.path_exists(position, Vec2::new(0.5, 0.5)));
	}
	assert!(manager.path_cost(Vec2::new(7.5, 7.5)).is_some());
}

#[test]
fn sampling_is_continuous() {
	let dimensions = GridDimensions::new(Vec2::ZERO, 1.0, 20, 20).unwrap();
	let mut manager =
		FlowFieldManager::new(FlowFieldSettings::new(dimensions), OpenTerrain::default()).unwrap();
	manager.generate(Vec2::new(19.5, 10.5)).unwrap();
	let mut previous = manager.sample(Vec2::new(2.3, 1.0));
	let mut y = 1.0;
	while y <= 18.0 {
		let current = manager.sample(Vec2::new(2.3, y));
		assert!((current.length() - 1.0).abs() < 0.001);
		assert!(
			(current - previous).length() < 0.1,
			"jump at y {}: {} to {}",
			y,
			previous,
			current
		);
		previous = current;
		y += 0.01;
	}
}
