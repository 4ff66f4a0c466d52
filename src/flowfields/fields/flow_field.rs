//! A [FlowField] is a flat array of direction vectors, one per cell of the
//! grid. Each vector is either of unit length, pointing at the neighbouring
//! cell with the cheapest [IntegrationField] value, or exactly zero for goals,
//! local minima, unreached and impassable cells. A steering pipeline/character
//! controller should read and interpret a [FlowField] to provide movement,
//! usually by sampling it at an agents position with [FlowField::sample].
//!
//! ```text
//!  _____________________________
//! |     |     |     |     |     |
//! |  ↘  |  ↘  |  ↓  |  ↙  |  ↙  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  ↘  |  ↘  |  ↓  |  ↙  |  ↙  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  →  |  →  |  x  |  ←  |  ←  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  ↗  |  ↗  |  ↑  |  ↖  |  ↖  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  ↗  |  ↗  |  ↑  |  ↖  |  ↖  |
//! |_____|_____|_____|_____|_____|
//! ```
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Direction of descent of each cell towards the nearest goal
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct FlowField {
	/// Number of columns
	columns: usize,
	/// Number of rows
	rows: usize,
	/// Row-major directions
	directions: Vec<Vec2>,
}

impl Field<Vec2> for FlowField {
	fn get(&self) -> &[Vec2] {
		&self.directions
	}
	fn get_columns(&self) -> usize {
		self.columns
	}
	fn get_rows(&self) -> usize {
		self.rows
	}
	/// Retrieve a field cell value
	fn get_field_cell_value(&self, field_cell: GridCell) -> Vec2 {
		if field_cell.get_column() >= self.columns || field_cell.get_row() >= self.rows {
			panic!("Cannot get a FlowField value, index out of bounds. Asked for column {}, row {}, field column length is {}, field row length is {}", field_cell.get_column(), field_cell.get_row(), self.columns, self.rows)
		}
		self.directions[field_cell.to_index(self.columns)]
	}
	/// Set a field cell to a value
	fn set_field_cell_value(&mut self, value: Vec2, field_cell: GridCell) {
		if field_cell.get_column() >= self.columns || field_cell.get_row() >= self.rows {
			panic!("Cannot set a FlowField value, index out of bounds. Asked for column {}, row {}, field column length is {}, field row length is {}", field_cell.get_column(), field_cell.get_row(), self.columns, self.rows)
		}
		self.directions[field_cell.to_index(self.columns)] = value;
	}
}

impl FlowField {
	/// Create a field where every cell has no direction
	pub fn new(columns: usize, rows: usize) -> Self {
		FlowField {
			columns,
			rows,
			directions: vec![Vec2::ZERO; columns * rows],
		}
	}
	/// The [Ordinal] a cell points in, [Ordinal::Zero] for cells with no
	/// direction
	pub fn get_ordinal(&self, field_cell: GridCell) -> Ordinal {
		Ordinal::from_unit_vector(self.get_field_cell_value(field_cell))
	}
	/// Derive the direction of every cell from an [IntegrationField]. Each
	/// walkable, reached cell points at the first of its traversable
	/// neighbours with a strictly smaller integration cost than any seen
	/// before it (starting from the cells own cost), so goals and local minima
	/// are left with [Vec2::ZERO]
	pub fn calculate(
		&mut self,
		integration_field: &IntegrationField,
		cost_field: &CostField,
		diagonals: DiagonalMovement,
	) {
		for index in 0..self.directions.len() {
			let current_cost = integration_field.get_index_value(index);
			if current_cost == INTEGRATION_SENTINEL || cost_field.get_index_value(index) == IMPASSABLE
			{
				self.directions[index] = Vec2::ZERO;
				continue;
			}
			let field_cell = GridCell::from_index(index, self.columns);
			let mut cheapest_value = current_cost;
			let mut cheapest_ordinal = Ordinal::Zero;
			for (n, ord) in cost_field.traversable_neighbours(field_cell, diagonals).iter() {
				let neighbour_cost = integration_field.get_field_cell_value(*n);
				if neighbour_cost < cheapest_value {
					cheapest_value = neighbour_cost;
					cheapest_ordinal = *ord;
				}
			}
			self.directions[index] = cheapest_ordinal.to_unit_vector();
		}
	}
	/// Smoothly sample the field at a world `position`.
	///
	/// The directions stored at the four cell centres surrounding the
	/// position are bilinearly interpolated (cells along the border are
	/// repeated beyond the grid edge) and the result is normalised, a zero
	/// blend stays zero. Positions outside of the grid produce [Vec2::ZERO]
	pub fn sample(&self, dimensions: &GridDimensions, position: Vec2) -> Vec2 {
		if !dimensions.contains(position) || self.directions.is_empty() {
			return Vec2::ZERO;
		}
		let grid_position = (position - dimensions.get_origin()) / dimensions.get_cell_size() - 0.5;
		let floor = grid_position.floor();
		let t = grid_position - floor;
		let max_column = self.columns as i64 - 1;
		let max_row = self.rows as i64 - 1;
		let c0 = (floor.x as i64).clamp(0, max_column) as usize;
		let c1 = (floor.x as i64 + 1).clamp(0, max_column) as usize;
		let r0 = (floor.y as i64).clamp(0, max_row) as usize;
		let r1 = (floor.y as i64 + 1).clamp(0, max_row) as usize;
		let bottom = self.directions[r0 * self.columns + c0]
			.lerp(self.directions[r0 * self.columns + c1], t.x);
		let top = self.directions[r1 * self.columns + c0]
			.lerp(self.directions[r1 * self.columns + c1], t.x);
		bottom.lerp(top, t.y).normalize_or_zero()
	}
}
