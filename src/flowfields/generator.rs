//! Builds fields for a set of goals over a [Grid].
//!
//! Generation happens in two phases:
//!
//! 1. An [IntegrationField] is calculated by expanding a wavefront from every
//!    goal across the [CostField] of the grid
//! 2. A [FlowField] is derived from the integration field by pointing each
//!    cell at its cheapest neighbour
//!
//! The output is an immutable [FieldSnapshot] ready to be published. The
//! generator keeps its work queue between calls so repeated generation does
//! not reallocate it.
//!

use std::collections::BTreeSet;

use crate::prelude::*;
use bevy::prelude::*;

/// Counters describing the work done by one generation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationStats {
	/// Number of distinct goals the field was seeded with
	pub goals: usize,
	/// Cells popped from the work queue and expanded
	pub expansions: usize,
	/// Times a cell's integration cost was improved
	pub relaxations: usize,
	/// Cells that ended with a cost to a goal
	pub reached: usize,
}

/// Runs the integration and flow phases against a [Grid]
#[derive(Clone, Debug)]
pub struct FieldGenerator {
	/// Reusable work queue
	frontier: Frontier,
	/// Number of fields generated so far
	computations: u64,
}

impl Default for FieldGenerator {
	fn default() -> Self {
		FieldGenerator::new(QueueStrategy::default())
	}
}

impl FieldGenerator {
	/// Create a generator ordering its wavefront with `strategy`
	pub fn new(strategy: QueueStrategy) -> Self {
		FieldGenerator {
			frontier: Frontier::new(strategy),
			computations: 0,
		}
	}
	/// Ordering used by the work queue
	pub fn get_queue_strategy(&self) -> QueueStrategy {
		self.frontier.strategy()
	}
	/// Number of fields generated so far
	pub fn computations(&self) -> u64 {
		self.computations
	}
	/// Calculate the fields of the `grid` descending towards the nearest of
	/// `goals`.
	///
	/// Every goal must be inside the grid and walkable, otherwise no work is
	/// done and the offending goal is reported. Repeated goals are collapsed
	pub fn generate(
		&mut self,
		grid: &Grid,
		goals: &[GridCell],
	) -> Result<(FieldSnapshot, GenerationStats), FlowFieldError> {
		if goals.is_empty() {
			return Err(FlowFieldError::NoDestinations);
		}
		let mut unique_goals: Vec<GridCell> = Vec::with_capacity(goals.len());
		let mut seen: BTreeSet<GridCell> = BTreeSet::new();
		for goal in goals.iter() {
			let walkable = grid
				.cell(*goal)
				.map(|c| c.is_walkable())
				.unwrap_or(false);
			if !walkable {
				return Err(FlowFieldError::GoalNotWalkable(*goal));
			}
			if seen.insert(*goal) {
				unique_goals.push(*goal);
			}
		}
		let dimensions = *grid.get_dimensions();
		let (columns, rows) = (dimensions.get_columns(), dimensions.get_rows());
		let diagonals = grid.get_diagonal_movement();

		let mut integration_field = IntegrationField::new(columns, rows);
		let (expansions, relaxations) = integration_field.calculate_field(
			&unique_goals,
			grid.get_cost_field(),
			diagonals,
			&mut self.frontier,
		);
		let mut flow_field = FlowField::new(columns, rows);
		flow_field.calculate(&integration_field, grid.get_cost_field(), diagonals);

		self.computations += 1;
		let stats = GenerationStats {
			goals: unique_goals.len(),
			expansions,
			relaxations,
			reached: integration_field.reached_count(),
		};
		debug!(
			"Generated field for {} goal(s): {} expansions, {} relaxations, {}/{} cells reached",
			stats.goals,
			stats.expansions,
			stats.relaxations,
			stats.reached,
			dimensions.get_cell_count()
		);
		let snapshot = FieldSnapshot::new(
			unique_goals,
			integration_field,
			flow_field,
			dimensions,
			grid.get_cost_revision(),
		);
		Ok((snapshot, stats))
	}
}
