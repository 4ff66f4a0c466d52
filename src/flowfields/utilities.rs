//! Useful structures and tools used by the fields
//!

use bevy::prelude::*;

/// Integration cost of a [crate::prelude::GridCell] that has not been reached
/// by the wavefront (isolated by impassable cells or too expensive to reach)
pub const INTEGRATION_SENTINEL: u16 = u16::MAX;
/// Fixed-point integration cost of one orthogonal step across a cell with a
/// traversal cost of `1`
pub const ORTHOGONAL_STEP: u32 = 10;
/// Fixed-point integration cost of one diagonal step across a cell with a
/// traversal cost of `1`, `√2` rounded to one decimal place
pub const DIAGONAL_STEP: u32 = 14;
/// Divisor turning a fixed-point integration cost back into traversal units
pub const INTEGRATION_SCALE: f32 = ORTHOGONAL_STEP as f32;
/// Traversal cost given to walkable cells when no other cost is known
pub const DEFAULT_TRAVERSAL_COST: u8 = 1;
/// Traversal cost marking a cell as impassable
pub const IMPASSABLE: u8 = 0;

/// The 8 directions of movement between neighbouring cells of the grid.
///
/// Rows grow towards `+y` in world space so [Ordinal::North] points along
/// `+y` and [Ordinal::East] along `+x`
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Reflect)]
pub enum Ordinal {
	North,
	East,
	South,
	West,
	NorthEast,
	SouthEast,
	SouthWest,
	NorthWest,
	/// Special case, used to indicate a cell with no direction of movement
	Zero,
}

impl Ordinal {
	/// Every direction of movement in neighbour enumeration order, orthogonals
	/// first so that ties resolve towards orthogonal movement
	pub const ALL: [Ordinal; 8] = [
		Ordinal::North,
		Ordinal::East,
		Ordinal::South,
		Ordinal::West,
		Ordinal::NorthEast,
		Ordinal::SouthEast,
		Ordinal::SouthWest,
		Ordinal::NorthWest,
	];
	/// The `(column, row)` offset of moving one cell in this direction
	pub fn offset(&self) -> (i32, i32) {
		match self {
			Ordinal::North => (0, 1),
			Ordinal::East => (1, 0),
			Ordinal::South => (0, -1),
			Ordinal::West => (-1, 0),
			Ordinal::NorthEast => (1, 1),
			Ordinal::SouthEast => (1, -1),
			Ordinal::SouthWest => (-1, -1),
			Ordinal::NorthWest => (-1, 1),
			Ordinal::Zero => (0, 0),
		}
	}
	/// Whether the direction moves along a diagonal
	pub fn is_diagonal(&self) -> bool {
		matches!(
			self,
			Ordinal::NorthEast | Ordinal::SouthEast | Ordinal::SouthWest | Ordinal::NorthWest
		)
	}
	/// Geometric length of the edge between two cells in this direction,
	/// measured in cells
	pub fn edge_weight(&self) -> f32 {
		match self {
			Ordinal::Zero => 0.0,
			ord if ord.is_diagonal() => std::f32::consts::SQRT_2,
			_ => 1.0,
		}
	}
	/// Fixed-point integration cost of stepping in this direction into a cell
	/// of `traversal_cost`
	pub fn step_cost(&self, traversal_cost: u8) -> u32 {
		match self {
			Ordinal::Zero => 0,
			ord if ord.is_diagonal() => DIAGONAL_STEP * traversal_cost as u32,
			_ => ORTHOGONAL_STEP * traversal_cost as u32,
		}
	}
	/// Unit vector of the direction, [Ordinal::Zero] produces [Vec2::ZERO]
	pub fn to_unit_vector(&self) -> Vec2 {
		let (column, row) = self.offset();
		Vec2::new(column as f32, row as f32).normalize_or_zero()
	}
	/// For a diagonal direction get the two orthogonal directions flanking it,
	/// [None] for orthogonal directions
	pub fn flanks(&self) -> Option<(Ordinal, Ordinal)> {
		match self {
			Ordinal::NorthEast => Some((Ordinal::North, Ordinal::East)),
			Ordinal::SouthEast => Some((Ordinal::South, Ordinal::East)),
			Ordinal::SouthWest => Some((Ordinal::South, Ordinal::West)),
			Ordinal::NorthWest => Some((Ordinal::North, Ordinal::West)),
			_ => None,
		}
	}
	/// Find the [Ordinal] a flow direction vector was derived from, anything
	/// that isn't one of the 8 unit directions produces [Ordinal::Zero]
	pub fn from_unit_vector(direction: Vec2) -> Self {
		if direction == Vec2::ZERO {
			return Ordinal::Zero;
		}
		let column = direction.x.round() as i32;
		let row = direction.y.round() as i32;
		match (column, row) {
			(0, 1) => Ordinal::North,
			(1, 1) => Ordinal::NorthEast,
			(1, 0) => Ordinal::East,
			(1, -1) => Ordinal::SouthEast,
			(0, -1) => Ordinal::South,
			(-1, -1) => Ordinal::SouthWest,
			(-1, 0) => Ordinal::West,
			(-1, 1) => Ordinal::NorthWest,
			_ => Ordinal::Zero,
		}
	}
}
