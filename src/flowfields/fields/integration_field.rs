//! The IntegrationField contains a flat array of 16-bit values and it uses a
//! [CostField] to produce a cumulative cost of reaching the nearest goal.
//!
//! When a new field needs to be processed every cell is reset to
//! [INTEGRATION_SENTINEL] and the cells containing the goals are set to `0`.
//! The goals are pushed onto a [Frontier] and a wavefront expands from them:
//!
//! 1. Pop a cell from the frontier
//! 2. Find its traversable neighbours (walkable, and diagonals permitted by
//!    the [DiagonalMovement] rule)
//! 3. The candidate cost of a neighbour is the integration cost of the popped
//!    cell plus the step cost into the neighbour, `10 x cost` orthogonally or
//!    `14 x cost` diagonally
//! 4. If the candidate beats the neighbours current value it is stored and
//!    the neighbour is pushed onto the frontier
//!
//! Once the frontier is empty every reachable cell holds the cost of its
//! cheapest route to the closest goal (the underlying `CostField` is set to
//! `1` here):
//!
//! ```text
//!  _____________________________
//! |     |     |     |     |     |
//! | 28  | 24  | 20  | 24  | 28  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! | 24  | 14  | 10  | 14  | 24  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! | 20  | 10  |  0  | 10  | 20  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! | 24  | 14  | 10  | 14  | 24  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! | 28  | 24  | 20  | 24  | 28  |
//! |_____|_____|_____|_____|_____|
//! ```
//!
//! Impassable cells are never entered so the wave flows around them, cells it
//! cannot reach keep [INTEGRATION_SENTINEL]. A candidate that would exceed
//! the range of a `u16` saturates to the sentinel and so is treated as
//! unreachable.
//!

use std::{
	cmp::Reverse,
	collections::{BinaryHeap, VecDeque},
};

use crate::prelude::*;
use bevy::prelude::*;

/// How the wavefront of an [IntegrationField] calculation is ordered
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum QueueStrategy {
	/// First-in first-out label correcting relaxation. A cell is never queued
	/// twice at the same time but may be queued again after its cost improves
	Fifo,
	/// Dijkstra ordered by `(cost, index)`, each cell is expanded exactly once
	#[default]
	BinaryHeap,
}

/// The work queue of cells waiting to be expanded. The storage is kept
/// between calculations to avoid reallocating it for every field
#[derive(Clone, Debug)]
pub enum Frontier {
	/// Queue for [QueueStrategy::Fifo]
	Fifo {
		/// Row-major indices of cells waiting to be expanded
		queue: VecDeque<usize>,
		/// Whether the cell at a row-major index is currently in `queue`
		queued: Vec<bool>,
	},
	/// Min-heap for [QueueStrategy::BinaryHeap] of `(cost, index)` pairs
	BinaryHeap(BinaryHeap<Reverse<(u16, usize)>>),
}

impl Frontier {
	/// Create an empty frontier using the given `strategy`
	pub fn new(strategy: QueueStrategy) -> Self {
		match strategy {
			QueueStrategy::Fifo => Frontier::Fifo {
				queue: VecDeque::new(),
				queued: Vec::new(),
			},
			QueueStrategy::BinaryHeap => Frontier::BinaryHeap(BinaryHeap::new()),
		}
	}
	/// The ordering used by the frontier
	pub fn strategy(&self) -> QueueStrategy {
		match self {
			Frontier::Fifo { .. } => QueueStrategy::Fifo,
			Frontier::BinaryHeap(_) => QueueStrategy::BinaryHeap,
		}
	}
	/// Whether there is nothing left to expand
	pub fn is_empty(&self) -> bool {
		match self {
			Frontier::Fifo { queue, .. } => queue.is_empty(),
			Frontier::BinaryHeap(heap) => heap.is_empty(),
		}
	}
	/// Drop any queued work and size the frontier for a field of `cell_count`
	/// cells
	fn clear(&mut self, cell_count: usize) {
		match self {
			Frontier::Fifo { queue, queued } => {
				queue.clear();
				queued.clear();
				queued.resize(cell_count, false);
			}
			Frontier::BinaryHeap(heap) => heap.clear(),
		}
	}
	/// Queue the cell at `index` which now has an integration cost of `cost`
	fn push(&mut self, index: usize, cost: u16) {
		match self {
			Frontier::Fifo { queue, queued } => {
				if !queued[index] {
					queued[index] = true;
					queue.push_back(index);
				}
			}
			Frontier::BinaryHeap(heap) => heap.push(Reverse((cost, index))),
		}
	}
	/// Take the next cell to expand. Heap entries whose cost no longer matches
	/// the `costs` of the field are stale and skipped
	fn pop(&mut self, costs: &[u16]) -> Option<usize> {
		match self {
			Frontier::Fifo { queue, queued } => {
				let index = queue.pop_front()?;
				queued[index] = false;
				Some(index)
			}
			Frontier::BinaryHeap(heap) => {
				while let Some(Reverse((cost, index))) = heap.pop() {
					if cost == costs[index] {
						return Some(index);
					}
				}
				None
			}
		}
	}
}

/// Accumulated cost of reaching the nearest goal from each cell
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct IntegrationField {
	/// Number of columns
	columns: usize,
	/// Number of rows
	rows: usize,
	/// Row-major fixed-point costs
	costs: Vec<u16>,
}

impl Field<u16> for IntegrationField {
	fn get(&self) -> &[u16] {
		&self.costs
	}
	fn get_columns(&self) -> usize {
		self.columns
	}
	fn get_rows(&self) -> usize {
		self.rows
	}
	/// Retrieve a field cell value
	fn get_field_cell_value(&self, field_cell: GridCell) -> u16 {
		if field_cell.get_column() >= self.columns || field_cell.get_row() >= self.rows {
			panic!("Cannot get a IntegrationField value, index out of bounds. Asked for column {}, row {}, field column length is {}, field row length is {}", field_cell.get_column(), field_cell.get_row(), self.columns, self.rows)
		}
		self.costs[field_cell.to_index(self.columns)]
	}
	/// Set a field cell to a value
	fn set_field_cell_value(&mut self, value: u16, field_cell: GridCell) {
		if field_cell.get_column() >= self.columns || field_cell.get_row() >= self.rows {
			panic!("Cannot set a IntegrationField value, index out of bounds. Asked for column {}, row {}, field column length is {}, field row length is {}", field_cell.get_column(), field_cell.get_row(), self.columns, self.rows)
		}
		self.costs[field_cell.to_index(self.columns)] = value;
	}
}

impl IntegrationField {
	/// Creates a new [IntegrationField] where every cell is unreached
	pub fn new(columns: usize, rows: usize) -> Self {
		IntegrationField {
			columns,
			rows,
			costs: vec![INTEGRATION_SENTINEL; columns * rows],
		}
	}
	/// Cost of the cell at a row-major `index`
	pub fn get_index_value(&self, index: usize) -> u16 {
		self.costs[index]
	}
	/// Number of cells that hold a cost to a goal
	pub fn reached_count(&self) -> usize {
		self.costs
			.iter()
			.filter(|c| **c != INTEGRATION_SENTINEL)
			.count()
	}
	/// Reset all the cells to [INTEGRATION_SENTINEL] apart from the `goals`
	/// which are the starting points of calculating the field and are set to
	/// `0`
	pub fn reset(&mut self, goals: &[GridCell]) {
		self.costs.fill(INTEGRATION_SENTINEL);
		for goal in goals {
			self.set_field_cell_value(0, *goal);
		}
	}
	/// From a list of walkable `goals` expand a wavefront over the
	/// `cost_field` and calculate the cost of every reachable cell. Returns
	/// the number of cells expanded and the number of cost improvements made
	pub fn calculate_field(
		&mut self,
		goals: &[GridCell],
		cost_field: &CostField,
		diagonals: DiagonalMovement,
		frontier: &mut Frontier,
	) -> (usize, usize) {
		self.reset(goals);
		frontier.clear(self.costs.len());
		for goal in goals {
			frontier.push(goal.to_index(self.columns), 0);
		}
		let mut expansions = 0;
		let mut relaxations = 0;
		while let Some(index) = frontier.pop(&self.costs) {
			expansions += 1;
			let current = self.costs[index] as u32;
			let field_cell = GridCell::from_index(index, self.columns);
			for (neighbour, ordinal) in cost_field
				.traversable_neighbours(field_cell, diagonals)
				.iter()
			{
				let n_index = neighbour.to_index(self.columns);
				let step = ordinal.step_cost(cost_field.get_index_value(n_index));
				let candidate = (current + step).min(INTEGRATION_SENTINEL as u32) as u16;
				if candidate < self.costs[n_index] {
					self.costs[n_index] = candidate;
					frontier.push(n_index, candidate);
					relaxations += 1;
				}
			}
		}
		(expansions, relaxations)
	}
}
