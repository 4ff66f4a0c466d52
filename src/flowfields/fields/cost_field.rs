//! The CostField contains a flat array of 8-bit values. The values correspond
//! to the cost of moving through that cell of the grid. A value of `0` is a
//! special case that indicates the cell is strictly forbidden from being used
//! in a pathing calculation (effectively saying there is a wall or
//! cliff/impassable terrain there). `1` is the default and easiest cost, any
//! other value indicates a harder cost of movement which could be from a slope
//! or marshland or others.
//!
//! An example cost field may look like (row 0 at the bottom):
//!
//! ```text
//!  _____________________________
//! |  1  |  1  |  1  |  1  |  1  |
//! |_____|_____|_____|_____|_____|
//! |  1  |  0  |  0  |  0  |  1  |
//! |_____|_____|_____|_____|_____|
//! |  1  |  1  |  1  | 56  | 56  |
//! |_____|_____|_____|_____|_____|
//! |  1  |  1  |  1  |  1  |  1  |
//! |_____|_____|_____|_____|_____|
//! ```
//!
//! Values are only ever written by probing a [SurfaceOracle], either for the
//! whole field or for a bounded region after an obstacle has changed.
//!

use crate::prelude::*;
use bevy::prelude::*;
use smallvec::SmallVec;

/// Per-cell traversal weights of the grid
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CostField {
	/// Number of columns
	columns: usize,
	/// Number of rows
	rows: usize,
	/// Row-major costs
	costs: Vec<u8>,
}

impl Field<u8> for CostField {
	fn get(&self) -> &[u8] {
		&self.costs
	}
	fn get_columns(&self) -> usize {
		self.columns
	}
	fn get_rows(&self) -> usize {
		self.rows
	}
	/// Retrieve a field cell value
	fn get_field_cell_value(&self, field_cell: GridCell) -> u8 {
		if field_cell.get_column() >= self.columns || field_cell.get_row() >= self.rows {
			panic!("Cannot get a CostField value, index out of bounds. Asked for column {}, row {}, field column length is {}, field row length is {}", field_cell.get_column(), field_cell.get_row(), self.columns, self.rows)
		}
		self.costs[field_cell.to_index(self.columns)]
	}
	/// Set a field cell to a value
	fn set_field_cell_value(&mut self, value: u8, field_cell: GridCell) {
		if field_cell.get_column() >= self.columns || field_cell.get_row() >= self.rows {
			panic!("Cannot set a CostField value, index out of bounds. Asked for column {}, row {}, field column length is {}, field row length is {}", field_cell.get_column(), field_cell.get_row(), self.columns, self.rows)
		}
		self.costs[field_cell.to_index(self.columns)] = value;
	}
}

impl CostField {
	/// Create a field where every cell is given the same `cost`
	pub fn new_with_cost(columns: usize, rows: usize, cost: u8) -> Self {
		CostField {
			columns,
			rows,
			costs: vec![cost; columns * rows],
		}
	}
	/// Cost of the cell at a row-major `index`
	pub fn get_index_value(&self, index: usize) -> u8 {
		self.costs[index]
	}
	/// Whether a cell can be moved through
	pub fn is_walkable(&self, field_cell: GridCell) -> bool {
		self.get_field_cell_value(field_cell) != IMPASSABLE
	}
	/// Probe the centre of every cell against the `oracle`, walkable cells get
	/// the cost the oracle reports (at least `1`), everything else is marked
	/// impassable
	pub fn initialise(&mut self, dimensions: &GridDimensions, oracle: &impl SurfaceOracle) {
		for index in 0..self.costs.len() {
			let cell = GridCell::from_index(index, self.columns);
			self.costs[index] = probe_cost(oracle, dimensions.cell_to_world(cell));
		}
	}
	/// Re-probe only the cells whose centres sit within `bounds`. Returns the
	/// cells whose cost was changed by the probe
	pub fn patch(
		&mut self,
		dimensions: &GridDimensions,
		bounds: Rect,
		oracle: &impl SurfaceOracle,
	) -> Vec<GridCell> {
		let mut changed = Vec::new();
		for cell in dimensions.cells_within(bounds) {
			let cost = probe_cost(oracle, dimensions.cell_to_world(cell));
			if cost != self.get_field_cell_value(cell) {
				self.set_field_cell_value(cost, cell);
				changed.push(cell);
			}
		}
		changed
	}
	/// The neighbours of `field_cell` a path may step into: walkable cells
	/// inside the field, with diagonals filtered by the `diagonals` rule
	pub fn traversable_neighbours(
		&self,
		field_cell: GridCell,
		diagonals: DiagonalMovement,
	) -> SmallVec<[(GridCell, Ordinal); 8]> {
		let mut neighbours = field_cell.get_all_cell_neighbours(self.columns, self.rows);
		neighbours.retain(|(n, ord)| {
			if self.get_index_value(n.to_index(self.columns)) == IMPASSABLE {
				return false;
			}
			match (diagonals, ord.flanks()) {
				(DiagonalMovement::Always, _) | (_, None) => true,
				(DiagonalMovement::NoSqueeze, Some((a, b))) => {
					self.is_flank_walkable(field_cell, a) || self.is_flank_walkable(field_cell, b)
				}
				(DiagonalMovement::NoCornerCutting, Some((a, b))) => {
					self.is_flank_walkable(field_cell, a) && self.is_flank_walkable(field_cell, b)
				}
			}
		});
		neighbours
	}
	/// Whether the orthogonal neighbour of `field_cell` in direction `ordinal`
	/// exists and is walkable
	fn is_flank_walkable(&self, field_cell: GridCell, ordinal: Ordinal) -> bool {
		field_cell
			.get_neighbour(ordinal, self.columns, self.rows)
			.map(|n| self.is_walkable(n))
			.unwrap_or(false)
	}
}

/// Rules for when a diagonal step between two walkable cells is allowed
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum DiagonalMovement {
	/// Every walkable diagonal neighbour inside the grid can be used
	#[default]
	Always,
	/// A diagonal is ignored when both cells flanking it are impassable, i.e
	///
	/// ```text
	///   X ~ <- ignore diagonal from o
	///   o X
	/// ```
	///
	/// so that a diagonal line of walls cannot be slipped through
	NoSqueeze,
	/// A diagonal is ignored when either cell flanking it is impassable so
	/// that the corners of obstacles are never clipped
	NoCornerCutting,
}

/// Ask the oracle about a world position and convert the answer to a traversal
/// cost
fn probe_cost(oracle: &impl SurfaceOracle, position: Vec2) -> u8 {
	match oracle.traversal_cost(position) {
		Some(cost) => cost.max(DEFAULT_TRAVERSAL_COST),
		None => IMPASSABLE,
	}
}
