//! The kinds of fields used by the algorithm.
//!
//! Every field is a flat, row-major array sized to the grid it belongs to, a
//! [GridCell] `(column, row)` is turned into an index with
//! `row * columns + column`
//!

pub mod cost_field;
pub mod flow_field;
pub mod integration_field;

use crate::prelude::*;
use bevy::prelude::*;
use smallvec::SmallVec;

/// Defines required access to field arrays
pub trait Field<T> {
	/// Get a reference to the flat field array
	fn get(&self) -> &[T];
	/// Number of columns in the field
	fn get_columns(&self) -> usize;
	/// Number of rows in the field
	fn get_rows(&self) -> usize;
	/// Retrieve a field cell value
	fn get_field_cell_value(&self, field_cell: GridCell) -> T;
	/// Set a field cell to a value
	fn set_field_cell_value(&mut self, value: T, field_cell: GridCell);
}

/// ID of a cell within the grid
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct GridCell((usize, usize));

impl GridCell {
	/// Create a new instance of [GridCell]
	pub fn new(column: usize, row: usize) -> Self {
		GridCell((column, row))
	}
	/// Get the `(column, row)` tuple
	pub fn get_column_row(&self) -> (usize, usize) {
		self.0
	}
	/// Get the column
	pub fn get_column(&self) -> usize {
		self.0 .0
	}
	/// Get the row
	pub fn get_row(&self) -> usize {
		self.0 .1
	}
	/// Index of the cell in a row-major array with `columns` cells per row
	pub fn to_index(&self, columns: usize) -> usize {
		self.get_row() * columns + self.get_column()
	}
	/// Recover a cell from its index in a row-major array with `columns`
	/// cells per row
	pub fn from_index(index: usize, columns: usize) -> Self {
		GridCell::new(index % columns, index / columns)
	}
	/// Find the neighbouring cell in the direction of `ordinal`, [None] if it
	/// would sit outside of a `columns` by `rows` grid
	pub fn get_neighbour(&self, ordinal: Ordinal, columns: usize, rows: usize) -> Option<GridCell> {
		let (column_offset, row_offset) = ordinal.offset();
		let column = self.get_column() as i64 + column_offset as i64;
		let row = self.get_row() as i64 + row_offset as i64;
		if column < 0 || row < 0 || column >= columns as i64 || row >= rows as i64 {
			None
		} else {
			Some(GridCell::new(column as usize, row as usize))
		}
	}
	/// Based on the cell position find all possible neighbours, including
	/// diagonals, within a `columns` by `rows` grid (up to 8). Neighbours are
	/// ordered as [Ordinal::ALL]
	pub fn get_all_cell_neighbours(
		&self,
		columns: usize,
		rows: usize,
	) -> SmallVec<[(GridCell, Ordinal); 8]> {
		let mut neighbours = SmallVec::new();
		for ordinal in Ordinal::ALL.iter() {
			if let Some(n) = self.get_neighbour(*ordinal, columns, rows) {
				neighbours.push((n, *ordinal));
			}
		}
		neighbours
	}
}

/// A snapshot of the three values the grid stores about a single cell
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Cell {
	/// Cost of moving through the cell, `0` is impassable
	pub traversal_cost: u8,
	/// Accumulated cost from the cell to the nearest goal of the published
	/// field, [INTEGRATION_SENTINEL] when unreached
	pub integration_cost: u16,
	/// Unit (or zero) direction of descent towards the nearest goal
	pub flow_direction: Vec2,
}

impl Cell {
	/// Whether the cell can be moved through
	pub fn is_walkable(&self) -> bool {
		self.traversal_cost != IMPASSABLE
	}
	/// Whether the published field reached the cell
	pub fn is_reached(&self) -> bool {
		self.integration_cost != INTEGRATION_SENTINEL
	}
}
