//! The [FlowFieldManager] is the entry point for using flowfields. It owns the
//! [Grid], the [FieldGenerator], the [FieldCache] and the [SurfaceOracle]
//! describing the world, and exposes everything agents and game logic need:
//!
//! - generating a field towards one destination (cached) or many (never
//!   cached)
//! - sampling a direction of movement at any position
//! - telling the grid that obstacles changed in an area
//! - asking whether and at what cost a destination can be reached
//!
//! It is a [Component] so it can be spawned onto an entity and driven by the
//! [crate::plugin::FlowFieldPlugin], but nothing about it needs an `App`.
//!

use std::{sync::Arc, time::Duration};

use crate::prelude::*;
use bevy::prelude::*;

/// Default number of single-destination fields kept in the cache
pub const DEFAULT_CACHE_CAPACITY: usize = 8;
/// Default age after which a cached field is cleared down, 15 minutes
pub const DEFAULT_CACHE_MAX_AGE: Duration = Duration::from_secs(900);

/// Configuration of a [FlowFieldManager]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowFieldSettings {
	/// Placement and size of the grid
	pub dimensions: GridDimensions,
	/// Maximum number of single-destination fields kept, `0` disables the
	/// cache
	pub cache_capacity: usize,
	/// Age after which a cached field is no longer used, [None] to keep
	/// fields until evicted
	pub cache_max_age: Option<Duration>,
	/// Ordering of the integration wavefront
	pub queue_strategy: QueueStrategy,
	/// Rule for diagonal steps past impassable cells
	pub diagonal_movement: DiagonalMovement,
}

impl FlowFieldSettings {
	/// Settings for a grid of `dimensions` with every other option at its
	/// default
	pub fn new(dimensions: GridDimensions) -> Self {
		FlowFieldSettings {
			dimensions,
			cache_capacity: DEFAULT_CACHE_CAPACITY,
			cache_max_age: Some(DEFAULT_CACHE_MAX_AGE),
			queue_strategy: QueueStrategy::default(),
			diagonal_movement: DiagonalMovement::default(),
		}
	}
	/// Set the cache capacity
	pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
		self.cache_capacity = capacity;
		self
	}
	/// Set the cache max age
	pub fn with_cache_max_age(mut self, max_age: Option<Duration>) -> Self {
		self.cache_max_age = max_age;
		self
	}
	/// Set the queue strategy
	pub fn with_queue_strategy(mut self, strategy: QueueStrategy) -> Self {
		self.queue_strategy = strategy;
		self
	}
	/// Set the diagonal movement rule
	pub fn with_diagonal_movement(mut self, diagonals: DiagonalMovement) -> Self {
		self.diagonal_movement = diagonals;
		self
	}
}

/// How a successful generation request was satisfied
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationStatus {
	/// A cached field was published without any search
	Cached,
	/// A new field was calculated and published
	Computed(GenerationStats),
}

impl GenerationStatus {
	/// Whether the field came from the cache
	pub fn is_cached(&self) -> bool {
		matches!(self, GenerationStatus::Cached)
	}
}

/// Owns the grid, generator, cache and surface of a navigable area
#[derive(Component)]
pub struct FlowFieldManager<O: SurfaceOracle> {
	/// Costs and the published field
	grid: Grid,
	/// Runs searches
	generator: FieldGenerator,
	/// Previously generated single-destination fields
	cache: FieldCache,
	/// The world being navigated
	oracle: O,
	/// Time used to stamp and expire cache entries
	elapsed: Duration,
}

impl<O: SurfaceOracle> FlowFieldManager<O> {
	/// Build the grid described by `settings` and probe its costs from the
	/// `oracle`
	pub fn new(settings: FlowFieldSettings, oracle: O) -> Result<Self, FlowFieldError> {
		let dimensions = GridDimensions::new(
			settings.dimensions.get_origin(),
			settings.dimensions.get_cell_size(),
			settings.dimensions.get_columns(),
			settings.dimensions.get_rows(),
		)?;
		let mut grid = Grid::new(dimensions, settings.diagonal_movement);
		grid.initialize_cost_field(&oracle);
		debug!(
			"Created flowfield manager over {}x{} cells of size {} at {}",
			dimensions.get_columns(),
			dimensions.get_rows(),
			dimensions.get_cell_size(),
			dimensions.get_origin()
		);
		Ok(FlowFieldManager {
			grid,
			generator: FieldGenerator::new(settings.queue_strategy),
			cache: FieldCache::new(settings.cache_capacity, settings.cache_max_age),
			oracle,
			elapsed: Duration::ZERO,
		})
	}
	/// Build a grid of `cell_size` cells fitted to the walkable bounds the
	/// `oracle` reports, every other setting at its default
	pub fn from_surface(oracle: O, cell_size: f32) -> Result<Self, FlowFieldError> {
		let dimensions = GridDimensions::from_surface(&oracle, cell_size)?;
		FlowFieldManager::new(FlowFieldSettings::new(dimensions), oracle)
	}
	/// The grid
	pub fn grid(&self) -> &Grid {
		&self.grid
	}
	/// The cache of single-destination fields
	pub fn cache(&self) -> &FieldCache {
		&self.cache
	}
	/// The surface being navigated
	pub fn oracle(&self) -> &O {
		&self.oracle
	}
	/// Mutable access to the surface, after changing it report the affected
	/// area with [FlowFieldManager::on_obstacle_changed]
	pub fn oracle_mut(&mut self) -> &mut O {
		&mut self.oracle
	}
	/// Number of fields calculated so far (cache hits are not counted)
	pub fn computations(&self) -> u64 {
		self.generator.computations()
	}
	/// The published field. Holders of the returned snapshot keep a complete
	/// field even if another one is published afterwards
	pub fn snapshot(&self) -> Arc<FieldSnapshot> {
		self.grid.field().clone()
	}
	/// Whether the published field was generated against the current costs
	pub fn is_field_current(&self) -> bool {
		self.grid.is_field_current()
	}
	/// Time used to stamp and expire cache entries
	pub fn get_elapsed(&self) -> Duration {
		self.elapsed
	}
	/// Advance the time used to stamp and expire cache entries, usually the
	/// elapsed time of the app
	pub fn set_elapsed(&mut self, elapsed: Duration) {
		self.elapsed = elapsed;
	}
	/// Clear down cached fields older than the max age, returning how many
	/// were removed
	pub fn expire_cache_entries(&mut self) -> usize {
		let expired = self.cache.expire(self.elapsed);
		if expired > 0 {
			debug!("Expired {} cached field(s)", expired);
		}
		expired
	}
	/// Drop every cached field, returning how many were removed
	pub fn invalidate_all(&mut self) -> usize {
		let cleared = self.cache.clear();
		debug!("Invalidated all {} cached field(s)", cleared);
		cleared
	}
	/// Find the walkable cell containing a destination
	fn resolve_destination(&self, destination: Vec2) -> Result<GridCell, FlowFieldError> {
		let cell = self
			.grid
			.get_dimensions()
			.world_to_cell(destination)
			.ok_or(FlowFieldError::DestinationOutOfBounds(destination))?;
		if !self.grid.get_cost_field().is_walkable(cell) {
			return Err(FlowFieldError::DestinationNotWalkable(destination));
		}
		Ok(cell)
	}
	/// Publish a field leading to `destination`.
	///
	/// The destination is snapped to the cell containing it. If the cache
	/// holds a field for that cell generated against the current costs it is
	/// published as is, otherwise a new field is calculated, published and
	/// cached (replacing any outdated entry). A destination outside of
	/// the grid or on an impassable cell is an error and leaves the published
	/// field untouched
	pub fn generate(&mut self, destination: Vec2) -> Result<GenerationStatus, FlowFieldError> {
		let cell = self.resolve_destination(destination)?;
		let revision = self.grid.get_cost_revision();
		let cached = self
			.cache
			.get(cell, self.elapsed)
			.filter(|f| f.get_cost_revision() == revision)
			.cloned();
		if let Some(field) = cached {
			trace!("Cache hit for destination cell {:?}", cell);
			self.grid.publish(field);
			return Ok(GenerationStatus::Cached);
		}
		let (snapshot, stats) = self.generator.generate(&self.grid, &[cell])?;
		let field = Arc::new(snapshot);
		self.grid.publish(field.clone());
		self.cache.insert(cell, field, self.elapsed);
		Ok(GenerationStatus::Computed(stats))
	}
	/// Publish a field leading to the nearest of several `destinations`.
	///
	/// Multi-destination fields are always calculated and never cached.
	/// Destinations outside of the grid or on impassable cells are skipped,
	/// if none remain the first problem is returned and the published field
	/// is left untouched
	pub fn generate_many(
		&mut self,
		destinations: &[Vec2],
	) -> Result<GenerationStatus, FlowFieldError> {
		let mut goals = Vec::with_capacity(destinations.len());
		let mut first_error = None;
		for destination in destinations.iter() {
			match self.resolve_destination(*destination) {
				Ok(cell) => goals.push(cell),
				Err(e) => {
					warn!("Skipping destination: {}", e);
					if first_error.is_none() {
						first_error = Some(e);
					}
				}
			}
		}
		if goals.is_empty() {
			return Err(first_error.unwrap_or(FlowFieldError::NoDestinations));
		}
		let (snapshot, stats) = self.generator.generate(&self.grid, &goals)?;
		self.grid.publish(Arc::new(snapshot));
		Ok(GenerationStatus::Computed(stats))
	}
	/// Smoothly sample the direction of movement at a world `position`, zero
	/// at goals, in unreachable areas and outside of the grid
	pub fn sample(&self, position: Vec2) -> Vec2 {
		self.grid.sample_direction(position)
	}
	/// Re-probe the surface within `bounds` after obstacles were placed,
	/// moved or removed there, and drop cached fields whose destination lies
	/// within it. Returns the number of cells whose cost changed. Cached
	/// fields elsewhere are kept but recalculated on their next request when
	/// any cost changed.
	///
	/// The published field is not regenerated, use
	/// [FlowFieldManager::is_field_current] to find out whether it is stale
	pub fn on_obstacle_changed(&mut self, bounds: Rect) -> usize {
		let changed = self.grid.patch_cost_field(bounds, &self.oracle);
		let evicted = self.cache.evict_within(self.grid.get_dimensions(), bounds);
		debug!(
			"Obstacle change over {:?} updated {} cell(s) and evicted {} cached field(s)",
			bounds, changed, evicted
		);
		changed
	}
	/// Whether the cell containing `position` can be moved through
	pub fn is_walkable(&self, position: Vec2) -> bool {
		self.grid.is_walkable(position)
	}
	/// Traversal cost of the cell containing `position`, `0` when impassable
	/// or outside of the grid
	pub fn cost_at(&self, position: Vec2) -> u8 {
		self.grid.cost_at(position)
	}
	/// Cost of travelling from `position` to the nearest goal of the published
	/// field, in traversal units. [None] when unreachable
	pub fn path_cost(&self, position: Vec2) -> Option<f32> {
		match self.grid.integration_cost_at(position) {
			INTEGRATION_SENTINEL => None,
			cost => Some(cost as f32 / INTEGRATION_SCALE),
		}
	}
	/// Whether an agent at `from` can reach `to` given the current costs.
	///
	/// A current field for `to` is reused when one is cached or published,
	/// otherwise one is calculated and cached without being published
	pub fn path_exists(&mut self, from: Vec2, to: Vec2) -> bool {
		let Ok(target) = self.resolve_destination(to) else {
			return false;
		};
		let Some(source) = self.grid.get_dimensions().world_to_cell(from) else {
			return false;
		};
		let revision = self.grid.get_cost_revision();
		let is_current = |f: &Arc<FieldSnapshot>| f.get_cost_revision() == revision;
		let cached = self
			.cache
			.get(target, self.elapsed)
			.filter(|f| is_current(*f))
			.cloned();
		let published = Some(self.grid.field().clone())
			.filter(|f| f.get_goals() == [target] && is_current(f));
		let field = match cached.or(published) {
			Some(field) => field,
			None => match self.generator.generate(&self.grid, &[target]) {
				Ok((snapshot, _)) => {
					let field = Arc::new(snapshot);
					self.cache.insert(target, field.clone(), self.elapsed);
					field
				}
				Err(e) => {
					error!("Failed to test for a path: {}", e);
					return false;
				}
			},
		};
		field.get_integration_field().get_field_cell_value(source) != INTEGRATION_SENTINEL
	}
	/// Sample the field on the `x-z` plane of a 3d world, `y` of the result
	/// is always `0`
	#[cfg(feature = "3d")]
	pub fn sample_xz(&self, position: Vec3) -> Vec3 {
		let direction = self.sample(Vec2::new(position.x, position.z));
		Vec3::new(direction.x, 0.0, direction.y)
	}
	/// Whether a position on the `x-z` plane of a 3d world can be moved
	/// through
	#[cfg(feature = "3d")]
	pub fn is_walkable_xz(&self, position: Vec3) -> bool {
		self.is_walkable(Vec2::new(position.x, position.z))
	}
}
