//! Drive a [FlowFieldManager] through the situations a game puts it in:
//! agents steering towards a destination, obstacles appearing under them and
//! destinations being revisited
//!

use std::sync::Arc;

use bevy::prelude::*;
use bevy_flowfield_grid_plugin::prelude::*;

/// 5x5 grid of unit cells with the origin at `(0, 0)`
fn five_by_five() -> FlowFieldManager<ObstacleMap> {
	let dimensions = GridDimensions::new(Vec2::ZERO, 1.0, 5, 5).unwrap();
	FlowFieldManager::new(FlowFieldSettings::new(dimensions), ObstacleMap::new(1)).unwrap()
}

#[test]
fn open_grid_centre_destination() {
	let mut manager = five_by_five();
	manager.generate(Vec2::new(2.5, 2.5)).unwrap();
	let snapshot = manager.snapshot();
	let integration = snapshot.get_integration_field();
	assert_eq!(0, integration.get_field_cell_value(GridCell::new(2, 2)));
	for cell in [(1, 2), (3, 2), (2, 1), (2, 3)] {
		assert_eq!(10, integration.get_field_cell_value(GridCell::new(cell.0, cell.1)));
	}
	assert_eq!(14, integration.get_field_cell_value(GridCell::new(1, 1)));
	let direction = snapshot.get_flow_field().get_field_cell_value(GridCell::new(0, 0));
	assert!((direction - Vec2::new(0.70710677, 0.70710677)).length() < 0.0001);
	assert_eq!(Ordinal::NorthEast, snapshot.get_flow_field().get_ordinal(GridCell::new(0, 0)));
	// sampling at the centre of a cell gives its direction
	assert!((manager.sample(Vec2::new(0.5, 0.5)) - direction).length() < 0.0001);
	assert_eq!(Vec2::ZERO, manager.sample(Vec2::new(2.5, 2.5)));
}

#[test]
fn wall_forces_detour() {
	let mut manager = five_by_five();
	manager.generate(Vec2::new(2.5, 2.5)).unwrap();
	let before = manager.snapshot();
	assert_eq!(20, before.get_integration_field().get_field_cell_value(GridCell::new(2, 4)));
	assert_eq!(Ordinal::South, before.get_flow_field().get_ordinal(GridCell::new(2, 4)));
	let (_, bounds) = manager
		.oracle_mut()
		.place(Obstacle::impassable(Rect::new(2.0, 3.0, 3.0, 4.0)));
	manager.on_obstacle_changed(bounds);
	assert!(!manager.is_walkable(Vec2::new(2.5, 3.5)));
	// the old field is still published, but is known to be stale
	assert!(Arc::ptr_eq(&before, &manager.snapshot()));
	assert!(!manager.is_field_current());
	// the cached field predates the wall so it is recalculated
	assert!(!manager.generate(Vec2::new(2.5, 2.5)).unwrap().is_cached());
	assert!(manager.is_field_current());
	let wall = manager.grid().cell(GridCell::new(2, 3)).unwrap();
	assert_eq!(INTEGRATION_SENTINEL, wall.integration_cost);
	assert_eq!(Vec2::ZERO, wall.flow_direction);
	let after = manager.snapshot();
	let behind = GridCell::new(2, 4);
	assert_eq!(28, after.get_integration_field().get_field_cell_value(behind));
	let ordinal = after.get_flow_field().get_ordinal(behind);
	assert_ne!(Ordinal::South, ordinal);
	assert!(ordinal.is_diagonal());
}

#[test]
fn removing_an_obstacle_restores_the_route() {
	let mut manager = five_by_five();
	let (id, bounds) = manager
		.oracle_mut()
		.place(Obstacle::impassable(Rect::new(2.0, 3.0, 3.0, 4.0)));
	manager.on_obstacle_changed(bounds);
	manager.generate(Vec2::new(2.5, 2.5)).unwrap();
	assert_eq!(Some(2.8), manager.path_cost(Vec2::new(2.5, 4.5)));
	let bounds = manager.oracle_mut().remove(id).unwrap();
	assert_eq!(1, manager.on_obstacle_changed(bounds));
	assert!(!manager.generate(Vec2::new(2.5, 2.5)).unwrap().is_cached());
	assert_eq!(Some(2.0), manager.path_cost(Vec2::new(2.5, 4.5)));
	assert!(manager.is_field_current());
}

#[test]
fn cache_serves_repeat_destinations() {
	let dimensions = GridDimensions::new(Vec2::ZERO, 1.0, 5, 5).unwrap();
	let settings = FlowFieldSettings::new(dimensions).with_cache_capacity(2);
	let mut manager = FlowFieldManager::new(settings, OpenTerrain::default()).unwrap();
	let a = Vec2::new(0.5, 0.5);
	let b = Vec2::new(4.5, 0.5);
	let c = Vec2::new(4.5, 4.5);
	for _ in 0..5 {
		manager.generate(a).unwrap();
	}
	assert_eq!(1, manager.computations());
	manager.generate(b).unwrap();
	// full, inserting c evicts a as the oldest insertion
	manager.generate(c).unwrap();
	assert_eq!(3, manager.computations());
	assert!(!manager.cache().contains(GridCell::new(0, 0)));
	assert!(manager.generate(b).unwrap().is_cached());
	assert!(!manager.generate(a).unwrap().is_cached());
	assert_eq!(4, manager.computations());
}

#[test]
fn disabled_cache_always_computes() {
	let dimensions = GridDimensions::new(Vec2::ZERO, 1.0, 5, 5).unwrap();
	let settings = FlowFieldSettings::new(dimensions).with_cache_capacity(0);
	let mut manager = FlowFieldManager::new(settings, OpenTerrain::default()).unwrap();
	manager.generate(Vec2::new(1.5, 1.5)).unwrap();
	manager.generate(Vec2::new(1.5, 1.5)).unwrap();
	assert_eq!(2, manager.computations());
	assert!(manager.cache().is_empty());
}

#[test]
fn closure_surface() {
	// a river runs along x = 3 with a ford at y = 0
	let river = |position: Vec2| -> Option<u8> {
		if (3.0..4.0).contains(&position.x) && position.y >= 1.0 {
			None
		} else {
			Some(1)
		}
	};
	let dimensions = GridDimensions::new(Vec2::ZERO, 1.0, 7, 5).unwrap();
	let mut manager = FlowFieldManager::new(FlowFieldSettings::new(dimensions), river).unwrap();
	manager.generate(Vec2::new(6.5, 4.5)).unwrap();
	assert!(manager.path_exists(Vec2::new(0.5, 4.5), Vec2::new(6.5, 4.5)));
	// heading south to the ford rather than east into the river
	let direction = manager.sample(Vec2::new(2.5, 4.5));
	assert!(direction.y < 0.0);
	let cost = manager.path_cost(Vec2::new(0.5, 4.5)).unwrap();
	assert!(cost > 6.0);
}

#[test]
fn invalid_settings_rejected() {
	assert!(matches!(
		GridDimensions::new(Vec2::ZERO, 0.0, 5, 5),
		Err(FlowFieldError::InvalidCellSize(_))
	));
	assert!(matches!(
		GridDimensions::new(Vec2::ZERO, 1.0, 0, 5),
		Err(FlowFieldError::EmptyGrid { .. })
	));
	assert!(matches!(
		FlowFieldManager::from_surface(OpenTerrain::default(), 1.0),
		Err(FlowFieldError::UnboundedSurface)
	));
}
