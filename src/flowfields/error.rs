//! Errors raised while building a grid or generating fields
//!

use bevy::prelude::*;
use thiserror::Error;

use crate::prelude::GridCell;

/// Flow field error type
#[derive(Error, Debug)]
pub enum FlowFieldError {
	#[error("Cell size must be finite and positive, got {0}")]
	InvalidCellSize(f32),

	#[error("Grid must contain at least one cell, got {columns} columns and {rows} rows")]
	EmptyGrid {
		/// Requested number of columns
		columns: usize,
		/// Requested number of rows
		rows: usize,
	},

	#[error("Surface does not report walkable bounds, the grid bounds must be given explicitly")]
	UnboundedSurface,

	#[error("Destination {0} is outside of the grid")]
	DestinationOutOfBounds(Vec2),

	#[error("Destination {0} is not walkable")]
	DestinationNotWalkable(Vec2),

	#[error("Goal cell {0:?} is outside of the grid or not walkable")]
	GoalNotWalkable(GridCell),

	#[error("No destinations were supplied")]
	NoDestinations,

	#[error("Cost map expected {expected} values, found {found}")]
	MalformedCostMap {
		/// Number of values the map dimensions require
		expected: usize,
		/// Number of values read
		found: usize,
	},

	#[cfg(any(feature = "ron", feature = "csv", feature = "heightmap"))]
	#[error("Failed to read cost map: {0}")]
	Io(#[from] std::io::Error),

	#[cfg(feature = "ron")]
	#[error("Failed to parse ron cost map: {0}")]
	Ron(#[from] ron::error::SpannedError),

	#[cfg(feature = "csv")]
	#[error("Failed to parse csv cost map: {0}")]
	Csv(#[from] csv::Error),

	#[cfg(feature = "csv")]
	#[error("Invalid cost value {0:?}, expected an integer in 0..=255")]
	InvalidCostValue(String),

	#[cfg(feature = "heightmap")]
	#[error("Failed to read heightmap: {0}")]
	Heightmap(String),
}
