//! The navigation grid. A rectangle of world space is divided into
//! `columns x rows` square cells of equal size, column `0` and row `0` sit
//! at the minimum corner (`origin`) of the rectangle with columns growing
//! towards `+x` and rows towards `+y`:
//!
//! ```text
//!            ____________________ (origin + size)
//!   row 2   |      |      |      |
//!           |______|______|______|
//!   row 1   |      |      |      |
//!           |______|______|______|
//!   row 0   |      |      |      |
//!           |______|______|______|
//!     origin  col 0  col 1  col 2
//! ```
//!
//! The [Grid] owns the [CostField] describing how hard each cell is to cross
//! and the [FieldSnapshot] currently published for agents to sample. It knows
//! nothing about how fields are searched, that lives in the generator.
//!

use std::{ops::RangeInclusive, sync::Arc};

use crate::prelude::*;
use bevy::prelude::*;
use smallvec::SmallVec;

/// Affine mapping between world space and the cells of the grid
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct GridDimensions {
	/// World position of the minimum corner of the grid
	origin: Vec2,
	/// Edge length of a cell in world units
	cell_size: f32,
	/// Number of columns along `x`
	columns: usize,
	/// Number of rows along `y`
	rows: usize,
}

impl GridDimensions {
	/// Create a new instance of [GridDimensions]. The `cell_size` must be
	/// finite and positive and the grid must contain at least one cell
	pub fn new(
		origin: Vec2,
		cell_size: f32,
		columns: usize,
		rows: usize,
	) -> Result<Self, FlowFieldError> {
		if !cell_size.is_finite() || cell_size <= 0.0 {
			return Err(FlowFieldError::InvalidCellSize(cell_size));
		}
		if columns == 0 || rows == 0 || !origin.is_finite() {
			return Err(FlowFieldError::EmptyGrid { columns, rows });
		}
		Ok(GridDimensions {
			origin,
			cell_size,
			columns,
			rows,
		})
	}
	/// Size a grid to cover `bounds`, partial cells along the maximum edges are
	/// rounded up to a whole cell
	pub fn from_bounds(bounds: Rect, cell_size: f32) -> Result<Self, FlowFieldError> {
		if !cell_size.is_finite() || cell_size <= 0.0 {
			return Err(FlowFieldError::InvalidCellSize(cell_size));
		}
		let size = bounds.size();
		if !size.is_finite() {
			return Err(FlowFieldError::EmptyGrid {
				columns: 0,
				rows: 0,
			});
		}
		// tolerate float error so that a 10.0 wide area of 0.1 cells is 100
		// columns rather than 101
		let columns = ((size.x / cell_size) - 1e-4).ceil().max(0.0) as usize;
		let rows = ((size.y / cell_size) - 1e-4).ceil().max(0.0) as usize;
		GridDimensions::new(bounds.min, cell_size, columns, rows)
	}
	/// Size a grid to cover the [SurfaceOracle::walkable_bounds] of a surface
	pub fn from_surface(
		oracle: &impl SurfaceOracle,
		cell_size: f32,
	) -> Result<Self, FlowFieldError> {
		let bounds = oracle
			.walkable_bounds()
			.ok_or(FlowFieldError::UnboundedSurface)?;
		GridDimensions::from_bounds(bounds, cell_size)
	}
	/// World position of the minimum corner
	pub fn get_origin(&self) -> Vec2 {
		self.origin
	}
	/// Edge length of a cell in world units
	pub fn get_cell_size(&self) -> f32 {
		self.cell_size
	}
	/// Number of columns
	pub fn get_columns(&self) -> usize {
		self.columns
	}
	/// Number of rows
	pub fn get_rows(&self) -> usize {
		self.rows
	}
	/// Total number of cells
	pub fn get_cell_count(&self) -> usize {
		self.columns * self.rows
	}
	/// World space extent of the grid
	pub fn get_size(&self) -> Vec2 {
		Vec2::new(self.columns as f32, self.rows as f32) * self.cell_size
	}
	/// World space rectangle covered by the grid
	pub fn get_bounds(&self) -> Rect {
		Rect::from_corners(self.origin, self.origin + self.get_size())
	}
	/// Whether a world `position` lies within the grid, edges included
	pub fn contains(&self, position: Vec2) -> bool {
		let max = self.origin + self.get_size();
		position.x >= self.origin.x
			&& position.y >= self.origin.y
			&& position.x <= max.x
			&& position.y <= max.y
	}
	/// Find the cell containing a world `position`. A position exactly on the
	/// maximum edge of the grid belongs to the last column/row, anything
	/// outside of the grid is [None]
	pub fn world_to_cell(&self, position: Vec2) -> Option<GridCell> {
		if !self.contains(position) {
			return None;
		}
		let local = (position - self.origin) / self.cell_size;
		let column = (local.x.floor() as usize).min(self.columns - 1);
		let row = (local.y.floor() as usize).min(self.rows - 1);
		Some(GridCell::new(column, row))
	}
	/// World position of the centre of a cell
	pub fn cell_to_world(&self, field_cell: GridCell) -> Vec2 {
		self.origin
			+ Vec2::new(
				field_cell.get_column() as f32 + 0.5,
				field_cell.get_row() as f32 + 0.5,
			) * self.cell_size
	}
	/// Move a world `position` to the centre of the cell containing it
	pub fn snap(&self, position: Vec2) -> Option<Vec2> {
		self.world_to_cell(position).map(|c| self.cell_to_world(c))
	}
	/// Every cell whose centre lies within `bounds` (edges included), row by
	/// row from the minimum corner. Parts of `bounds` outside of the grid are
	/// ignored
	pub fn cells_within(&self, bounds: Rect) -> impl Iterator<Item = GridCell> {
		let spans = if bounds.min.is_nan() || bounds.max.is_nan() {
			None
		} else {
			axis_span(bounds.min.x, bounds.max.x, self.origin.x, self.cell_size, self.columns)
				.zip(axis_span(bounds.min.y, bounds.max.y, self.origin.y, self.cell_size, self.rows))
		};
		let (columns, rows) = spans.unwrap_or((1..=0, 1..=0));
		rows.flat_map(move |row| {
			columns
				.clone()
				.map(move |column| GridCell::new(column, row))
		})
	}
}

/// Indices along one axis whose cell centres lie within `min..=max`
fn axis_span(
	min: f32,
	max: f32,
	origin: f32,
	cell_size: f32,
	count: usize,
) -> Option<RangeInclusive<usize>> {
	let first = ((min - origin) / cell_size - 0.5).ceil() as i64;
	let last = ((max - origin) / cell_size - 0.5).floor() as i64;
	let first = first.max(0);
	let last = last.min(count as i64 - 1);
	if first > last {
		None
	} else {
		Some(first as usize..=last as usize)
	}
}

/// The immutable result of one field generation. Published behind an [Arc]
/// so replacing the active field is a pointer swap and any holder of a
/// snapshot always sees a complete field
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSnapshot {
	/// Goal cells the field descends towards, empty for a blank field
	goals: Vec<GridCell>,
	/// Phase 1 output
	integration_field: IntegrationField,
	/// Phase 2 output
	flow_field: FlowField,
	/// Grid the fields were generated on
	dimensions: GridDimensions,
	/// Revision of the [CostField] the field was generated against
	cost_revision: u64,
}

impl FieldSnapshot {
	/// Bundle the output of a generation
	pub fn new(
		goals: Vec<GridCell>,
		integration_field: IntegrationField,
		flow_field: FlowField,
		dimensions: GridDimensions,
		cost_revision: u64,
	) -> Self {
		FieldSnapshot {
			goals,
			integration_field,
			flow_field,
			dimensions,
			cost_revision,
		}
	}
	/// A field with no goals, every cell unreached and without direction
	pub fn empty(dimensions: GridDimensions, cost_revision: u64) -> Self {
		let (columns, rows) = (dimensions.get_columns(), dimensions.get_rows());
		FieldSnapshot {
			goals: Vec::new(),
			integration_field: IntegrationField::new(columns, rows),
			flow_field: FlowField::new(columns, rows),
			dimensions,
			cost_revision,
		}
	}
	/// Goal cells of the field
	pub fn get_goals(&self) -> &[GridCell] {
		&self.goals
	}
	/// Accumulated costs to the goals
	pub fn get_integration_field(&self) -> &IntegrationField {
		&self.integration_field
	}
	/// Directions of descent
	pub fn get_flow_field(&self) -> &FlowField {
		&self.flow_field
	}
	/// Grid the field was generated on
	pub fn get_dimensions(&self) -> &GridDimensions {
		&self.dimensions
	}
	/// Cost revision the field was generated against
	pub fn get_cost_revision(&self) -> u64 {
		self.cost_revision
	}
	/// Whether the field was generated without any goals
	pub fn is_empty(&self) -> bool {
		self.goals.is_empty()
	}
	/// Whether `field_cell` is one of the goals of the field
	pub fn has_goal(&self, field_cell: GridCell) -> bool {
		self.goals.contains(&field_cell)
	}
	/// Smoothly sample the flow direction at a world `position`, see
	/// [FlowField::sample]
	pub fn sample(&self, position: Vec2) -> Vec2 {
		self.flow_field.sample(&self.dimensions, position)
	}
	/// Integration cost of the cell containing `position`,
	/// [INTEGRATION_SENTINEL] outside of the grid
	pub fn integration_cost_at(&self, position: Vec2) -> u16 {
		match self.dimensions.world_to_cell(position) {
			Some(cell) => self.integration_field.get_field_cell_value(cell),
			None => INTEGRATION_SENTINEL,
		}
	}
}

/// Fixed size navigation grid, holding the per-cell traversal costs and the
/// currently published field
#[derive(Clone, Debug)]
pub struct Grid {
	/// World to cell mapping
	dimensions: GridDimensions,
	/// Traversal cost of every cell
	cost_field: CostField,
	/// The field agents currently sample
	field: Arc<FieldSnapshot>,
	/// Bumped every time the cost field changes
	cost_revision: u64,
	/// Rule for stepping diagonally past impassable cells
	diagonals: DiagonalMovement,
}

impl Grid {
	/// Create a grid where every cell has the default traversal cost and an
	/// empty field is published
	pub fn new(dimensions: GridDimensions, diagonals: DiagonalMovement) -> Self {
		Grid {
			dimensions,
			cost_field: CostField::new_with_cost(
				dimensions.get_columns(),
				dimensions.get_rows(),
				DEFAULT_TRAVERSAL_COST,
			),
			field: Arc::new(FieldSnapshot::empty(dimensions, 0)),
			cost_revision: 0,
			diagonals,
		}
	}
	/// World to cell mapping
	pub fn get_dimensions(&self) -> &GridDimensions {
		&self.dimensions
	}
	/// Traversal cost of every cell
	pub fn get_cost_field(&self) -> &CostField {
		&self.cost_field
	}
	/// Rule applied to diagonal steps
	pub fn get_diagonal_movement(&self) -> DiagonalMovement {
		self.diagonals
	}
	/// Revision of the cost field, bumped whenever a cost changes
	pub fn get_cost_revision(&self) -> u64 {
		self.cost_revision
	}
	/// Every neighbour of a cell inside the grid, ordered N, E, S, W, NE, SE,
	/// SW, NW
	pub fn neighbours(&self, field_cell: GridCell) -> SmallVec<[(GridCell, Ordinal); 8]> {
		field_cell.get_all_cell_neighbours(self.dimensions.get_columns(), self.dimensions.get_rows())
	}
	/// The neighbours of a cell that a path may step into
	pub fn traversable_neighbours(
		&self,
		field_cell: GridCell,
	) -> SmallVec<[(GridCell, Ordinal); 8]> {
		self.cost_field
			.traversable_neighbours(field_cell, self.diagonals)
	}
	/// Probe every cell of the grid against the `oracle` and publish an empty
	/// field
	pub fn initialize_cost_field(&mut self, oracle: &impl SurfaceOracle) {
		self.cost_field.initialise(&self.dimensions, oracle);
		self.cost_revision += 1;
		self.field = Arc::new(FieldSnapshot::empty(self.dimensions, self.cost_revision));
		debug!(
			"Initialised cost field of {}x{} cells",
			self.dimensions.get_columns(),
			self.dimensions.get_rows()
		);
	}
	/// Re-probe the cells whose centres lie within `bounds`, returning how
	/// many changed cost
	pub fn patch_cost_field(&mut self, bounds: Rect, oracle: &impl SurfaceOracle) -> usize {
		let changed = self.cost_field.patch(&self.dimensions, bounds, oracle).len();
		if changed > 0 {
			self.cost_revision += 1;
		}
		changed
	}
	/// The published field
	pub fn field(&self) -> &Arc<FieldSnapshot> {
		&self.field
	}
	/// Replace the published field
	pub fn publish(&mut self, field: Arc<FieldSnapshot>) {
		self.field = field;
	}
	/// Whether the published field was generated against the current costs
	pub fn is_field_current(&self) -> bool {
		self.field.get_cost_revision() == self.cost_revision
	}
	/// Smoothly sample the published field at a world `position`
	pub fn sample_direction(&self, position: Vec2) -> Vec2 {
		self.field.sample(position)
	}
	/// Whether the cell containing `position` can be moved through, `false`
	/// outside of the grid
	pub fn is_walkable(&self, position: Vec2) -> bool {
		self.cost_at(position) != IMPASSABLE
	}
	/// Traversal cost of the cell containing `position`, impassable outside of
	/// the grid
	pub fn cost_at(&self, position: Vec2) -> u8 {
		match self.dimensions.world_to_cell(position) {
			Some(cell) => self.cost_field.get_field_cell_value(cell),
			None => IMPASSABLE,
		}
	}
	/// Integration cost of the cell containing `position` in the published
	/// field
	pub fn integration_cost_at(&self, position: Vec2) -> u16 {
		self.field.integration_cost_at(position)
	}
	/// Everything known about a single cell, [None] outside of the grid
	pub fn cell(&self, field_cell: GridCell) -> Option<Cell> {
		if field_cell.get_column() >= self.dimensions.get_columns()
			|| field_cell.get_row() >= self.dimensions.get_rows()
		{
			return None;
		}
		Some(Cell {
			traversal_cost: self.cost_field.get_field_cell_value(field_cell),
			integration_cost: self
				.field
				.get_integration_field()
				.get_field_cell_value(field_cell),
			flow_direction: self.field.get_flow_field().get_field_cell_value(field_cell),
		})
	}
}
