//! The navigable surface a grid is built over. Anything that can answer "can
//! I walk here, and how hard is it" for a world position is a
//! [SurfaceOracle], the grid probes it at the centre of each cell when
//! initialising the cost field and again for any region an obstacle changes.
//!
//! Ready made surfaces:
//!
//! - [OpenTerrain] - everywhere is walkable at the same cost
//! - [ObstacleMap] - a base cost with rectangular obstacles placed on top
//! - [CostMap] - a raster of per-cell costs, optionally loaded from `ron`,
//!   `csv` or a greyscale heightmap image
//! - any `Fn(Vec2) -> Option<u8>` closure
//!

use std::collections::BTreeMap;

use crate::prelude::*;
use bevy::prelude::*;

/// Answers navigation queries about world positions
pub trait SurfaceOracle: Send + Sync + 'static {
	/// [None] when `position` cannot be walked on, otherwise the base cost of
	/// crossing it (a cost of `0` is treated as `1`)
	fn traversal_cost(&self, position: Vec2) -> Option<u8>;
	/// The rectangle containing everything walkable, used to size a grid
	/// automatically. [None] for unbounded surfaces
	fn walkable_bounds(&self) -> Option<Rect> {
		None
	}
}

impl<F> SurfaceOracle for F
where
	F: Fn(Vec2) -> Option<u8> + Send + Sync + 'static,
{
	fn traversal_cost(&self, position: Vec2) -> Option<u8> {
		self(position)
	}
}

/// Unbounded surface that is walkable everywhere with a uniform cost
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenTerrain {
	/// Cost of every position
	cost: u8,
}

impl Default for OpenTerrain {
	fn default() -> Self {
		OpenTerrain {
			cost: DEFAULT_TRAVERSAL_COST,
		}
	}
}

impl OpenTerrain {
	/// Create terrain where every position has the same `cost`
	pub fn new(cost: u8) -> Self {
		OpenTerrain { cost }
	}
}

impl SurfaceOracle for OpenTerrain {
	fn traversal_cost(&self, _position: Vec2) -> Option<u8> {
		Some(self.cost)
	}
}

/// Unique ID of an obstacle placed in an [ObstacleMap]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct ObstacleId(u64);

impl ObstacleId {
	/// Get the raw ID
	pub fn get(&self) -> u64 {
		self.0
	}
}

/// A rectangular area of an [ObstacleMap] that is either impassable or
/// overrides the cost of the ground beneath it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
	/// World space area covered, edges included
	bounds: Rect,
	/// Cost of crossing the obstacle, [None] when it cannot be crossed
	cost: Option<u8>,
}

impl Obstacle {
	/// An obstacle nothing can move through
	pub fn impassable(bounds: Rect) -> Self {
		Obstacle { bounds, cost: None }
	}
	/// Terrain such as mud or shallow water that can be crossed at `cost`
	pub fn with_cost(bounds: Rect, cost: u8) -> Self {
		Obstacle {
			bounds,
			cost: Some(cost),
		}
	}
	/// Area covered by the obstacle
	pub fn get_bounds(&self) -> Rect {
		self.bounds
	}
	/// Cost of crossing, [None] when impassable
	pub fn get_cost(&self) -> Option<u8> {
		self.cost
	}
}

/// A surface with a uniform base cost and a set of rectangular obstacles.
///
/// Where obstacles overlap an impassable one always wins, otherwise the
/// highest cost of the obstacles covering a position is used. Placing or
/// removing an obstacle returns the area that changed so it can be handed to
/// [crate::prelude::FlowFieldManager::on_obstacle_changed]
#[derive(Clone, Debug, Default)]
pub struct ObstacleMap {
	/// Cost of positions not covered by an obstacle
	base_cost: u8,
	/// Optional limit of the walkable area
	bounds: Option<Rect>,
	/// Placed obstacles
	obstacles: BTreeMap<ObstacleId, Obstacle>,
	/// ID handed to the next placed obstacle
	next_id: u64,
}

impl ObstacleMap {
	/// Create an unbounded map with no obstacles
	pub fn new(base_cost: u8) -> Self {
		ObstacleMap {
			base_cost,
			..Default::default()
		}
	}
	/// Limit the walkable area to `bounds`, positions outside of it are never
	/// walkable
	pub fn with_bounds(mut self, bounds: Rect) -> Self {
		self.bounds = Some(bounds);
		self
	}
	/// Cost of positions not covered by an obstacle
	pub fn get_base_cost(&self) -> u8 {
		self.base_cost
	}
	/// Add an obstacle, returning its ID and the area it covers
	pub fn place(&mut self, obstacle: Obstacle) -> (ObstacleId, Rect) {
		let id = ObstacleId(self.next_id);
		self.next_id += 1;
		self.obstacles.insert(id, obstacle);
		(id, obstacle.get_bounds())
	}
	/// Remove an obstacle, returning the area it used to cover
	pub fn remove(&mut self, id: ObstacleId) -> Option<Rect> {
		self.obstacles.remove(&id).map(|o| o.get_bounds())
	}
	/// Remove every obstacle, returning the area that covers all of them
	pub fn clear(&mut self) -> Option<Rect> {
		let area = self
			.obstacles
			.values()
			.map(|o| o.get_bounds())
			.reduce(|a, b| a.union(b));
		self.obstacles.clear();
		area
	}
	/// Get an obstacle
	pub fn get(&self, id: ObstacleId) -> Option<&Obstacle> {
		self.obstacles.get(&id)
	}
	/// Iterate over the placed obstacles in order of placement
	pub fn iter(&self) -> impl Iterator<Item = (&ObstacleId, &Obstacle)> {
		self.obstacles.iter()
	}
	/// Number of placed obstacles
	pub fn len(&self) -> usize {
		self.obstacles.len()
	}
	/// Whether no obstacles have been placed
	pub fn is_empty(&self) -> bool {
		self.obstacles.is_empty()
	}
}

impl SurfaceOracle for ObstacleMap {
	fn traversal_cost(&self, position: Vec2) -> Option<u8> {
		if let Some(bounds) = self.bounds {
			if !bounds.contains(position) {
				return None;
			}
		}
		let mut cost = None;
		for obstacle in self.obstacles.values() {
			if obstacle.bounds.contains(position) {
				let c = obstacle.cost?;
				cost = Some(cost.map_or(c, |current: u8| current.max(c)));
			}
		}
		Some(cost.unwrap_or(self.base_cost))
	}
	fn walkable_bounds(&self) -> Option<Rect> {
		self.bounds
	}
}

/// A raster of per-cell traversal costs laid over the world, `0` marks an
/// impassable cell.
///
/// The raster has its own dimensions, independent of the grid that probes
/// it, so a coarse grid can be built over a fine cost map and vice versa
#[derive(Clone, Debug, PartialEq)]
pub struct CostMap {
	/// Placement of the raster in the world
	dimensions: GridDimensions,
	/// Row-major costs with row `0` at the minimum `y`
	costs: Vec<u8>,
}

/// On disk layout of a [CostMap]
#[cfg(feature = "ron")]
#[derive(serde::Deserialize)]
struct CostMapFile {
	/// `(x, y)` of the minimum corner
	origin: (f32, f32),
	/// Edge length of a raster cell
	cell_size: f32,
	/// Number of columns
	columns: usize,
	/// Number of rows
	rows: usize,
	/// Costs listed row by row starting from the top (maximum `y`) row so the
	/// file reads like the map
	costs: Vec<u8>,
}

impl CostMap {
	/// Create a cost map from row-major `costs` with row `0` at the minimum
	/// `y` of the `dimensions`
	pub fn new(dimensions: GridDimensions, costs: Vec<u8>) -> Result<Self, FlowFieldError> {
		let expected = dimensions.get_cell_count();
		if costs.len() != expected {
			return Err(FlowFieldError::MalformedCostMap {
				expected,
				found: costs.len(),
			});
		}
		Ok(CostMap { dimensions, costs })
	}
	/// Create a cost map from rows listed top (maximum `y`) first, the way a
	/// map is drawn
	pub fn from_rows_top_down(
		origin: Vec2,
		cell_size: f32,
		rows: &[Vec<u8>],
	) -> Result<Self, FlowFieldError> {
		let columns = rows.first().map(|r| r.len()).unwrap_or(0);
		let dimensions = GridDimensions::new(origin, cell_size, columns, rows.len())?;
		let mut costs = Vec::with_capacity(dimensions.get_cell_count());
		for row in rows.iter().rev() {
			if row.len() != columns {
				return Err(FlowFieldError::MalformedCostMap {
					expected: columns,
					found: row.len(),
				});
			}
			costs.extend_from_slice(row);
		}
		CostMap::new(dimensions, costs)
	}
	/// Placement of the raster in the world
	pub fn get_dimensions(&self) -> &GridDimensions {
		&self.dimensions
	}
	/// Raw row-major costs, row `0` at the minimum `y`
	pub fn get_costs(&self) -> &[u8] {
		&self.costs
	}
	/// Cost of a raster cell, [None] outside of the raster
	pub fn get_cost(&self, field_cell: GridCell) -> Option<u8> {
		if field_cell.get_column() >= self.dimensions.get_columns()
			|| field_cell.get_row() >= self.dimensions.get_rows()
		{
			return None;
		}
		Some(self.costs[field_cell.to_index(self.dimensions.get_columns())])
	}
	/// From a `ron` file describing the origin, cell size, columns, rows and
	/// the costs (top row first) generate a [CostMap]
	#[cfg(feature = "ron")]
	pub fn from_ron(path: &str) -> Result<Self, FlowFieldError> {
		let file = std::fs::File::open(path)?;
		let data: CostMapFile = ron::de::from_reader(file)?;
		let dimensions = GridDimensions::new(
			Vec2::new(data.origin.0, data.origin.1),
			data.cell_size,
			data.columns,
			data.rows,
		)?;
		let expected = dimensions.get_cell_count();
		if data.costs.len() != expected {
			return Err(FlowFieldError::MalformedCostMap {
				expected,
				found: data.costs.len(),
			});
		}
		let rows: Vec<Vec<u8>> = data.costs.chunks(data.columns).map(|r| r.to_vec()).collect();
		CostMap::from_rows_top_down(dimensions.get_origin(), data.cell_size, &rows)
	}
	/// From a CSV file of `u8` costs generate a [CostMap]. The first line of
	/// the file is the top (maximum `y`) row of the map
	#[cfg(feature = "csv")]
	pub fn from_csv(path: &str, origin: Vec2, cell_size: f32) -> Result<Self, FlowFieldError> {
		let mut rdr = csv::ReaderBuilder::new()
			.has_headers(false)
			.trim(csv::Trim::All)
			.from_path(path)?;
		let mut rows = Vec::new();
		for record in rdr.records() {
			let record = record?;
			let mut row = Vec::with_capacity(record.len());
			for value in record.iter() {
				let cost: u8 = value
					.parse()
					.map_err(|_| FlowFieldError::InvalidCostValue(value.to_string()))?;
				row.push(cost);
			}
			rows.push(row);
		}
		CostMap::from_rows_top_down(origin, cell_size, &rows)
	}
	/// Create a [CostMap] from a greyscale image where each pixel represents
	/// the cost of a cell. White is the easiest cost of `1`, darker pixels are
	/// more costly and pure black is impassable
	#[cfg(feature = "heightmap")]
	pub fn from_heightmap(path: &str, origin: Vec2, cell_size: f32) -> Result<Self, FlowFieldError> {
		use photon_rs::native::open_image;
		let img = open_image(path).map_err(|e| FlowFieldError::Heightmap(format!("{:?}", e)))?;
		let width = img.get_width() as usize;
		let height = img.get_height() as usize;
		let raw_pixels = img.get_raw_pixels();
		if width == 0 || height == 0 {
			return Err(FlowFieldError::EmptyGrid {
				columns: width,
				rows: height,
			});
		}
		// raw pixels are arranged from the top left of the image in sets of
		// either 3 or 4 (alpha) channels
		let channels = raw_pixels.len() / (width * height);
		if channels < 3 {
			return Err(FlowFieldError::Heightmap(format!(
				"expected RGB or RGBA pixels, found {} channels",
				channels
			)));
		}
		let rows: Vec<Vec<u8>> = raw_pixels
			.chunks(channels * width)
			.map(|line| {
				line.chunks(channels)
					.map(|px| {
						// careful of u8 overflow
						let colour_avg = (px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0;
						match 255 - colour_avg.round() as u8 {
							255 => IMPASSABLE,
							value => value.max(DEFAULT_TRAVERSAL_COST),
						}
					})
					.collect()
			})
			.collect();
		CostMap::from_rows_top_down(origin, cell_size, &rows)
	}
}

impl SurfaceOracle for CostMap {
	fn traversal_cost(&self, position: Vec2) -> Option<u8> {
		let cell = self.dimensions.world_to_cell(position)?;
		match self.costs[cell.to_index(self.dimensions.get_columns())] {
			IMPASSABLE => None,
			cost => Some(cost),
		}
	}
	fn walkable_bounds(&self) -> Option<Rect> {
		Some(self.dimensions.get_bounds())
	}
}
