//! Defines the Bevy [Plugin] for FlowFieldGrid
//!

use std::marker::PhantomData;

use crate::prelude::*;
use bevy::prelude::*;

pub mod cost_layer;
pub mod flow_layer;

/// Ordering of the plugin systems within [Update]
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum OrderingSet {
	/// Cache clear down
	Tidy,
	/// Obstacle changes then field generation
	Calculate,
}

/// Drives every [FlowFieldManager] over the surface `O` spawned in the world.
///
/// Obstacle changes sent as [EventObstacleChanged] are always applied before
/// the [EventFlowFieldRequest]s of the same tick are processed. Add one
/// instance per surface type in use
pub struct FlowFieldPlugin<O: SurfaceOracle>(PhantomData<fn() -> O>);

impl<O: SurfaceOracle> Default for FlowFieldPlugin<O> {
	fn default() -> Self {
		FlowFieldPlugin(PhantomData)
	}
}

impl<O: SurfaceOracle> Plugin for FlowFieldPlugin<O> {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<Ordinal>()
			.register_type::<GridCell>()
			.register_type::<GridDimensions>()
			.register_type::<QueueStrategy>()
			.register_type::<DiagonalMovement>()
			.add_event::<EventObstacleChanged>()
			.add_event::<EventFlowFieldRequest>()
			.add_event::<EventFlowFieldReady>()
			.add_event::<EventFlowFieldFailed>()
			.configure_sets(Update, (OrderingSet::Tidy, OrderingSet::Calculate).chain())
			.add_systems(
				Update,
				(
					flow_layer::cleanup_old_fields::<O>.in_set(OrderingSet::Tidy),
					(
						cost_layer::process_obstacle_events::<O>,
						flow_layer::process_generation_requests::<O>,
					)
						.chain()
						.in_set(OrderingSet::Calculate),
				),
			);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;
	/// App with the plugin and a 6x6 unit grid manager over an [ObstacleMap]
	fn app() -> (App, Entity) {
		let mut app = App::new();
		app.init_resource::<Time>()
			.add_plugins(FlowFieldPlugin::<ObstacleMap>::default());
		let dimensions = GridDimensions::new(Vec2::ZERO, 1.0, 6, 6).unwrap();
		let manager =
			FlowFieldManager::new(FlowFieldSettings::new(dimensions), ObstacleMap::new(1))
				.unwrap();
		let entity = app.world_mut().spawn(manager).id();
		(app, entity)
	}
	fn manager(app: &App, entity: Entity) -> &FlowFieldManager<ObstacleMap> {
		app.world()
			.get::<FlowFieldManager<ObstacleMap>>(entity)
			.unwrap()
	}
	#[test]
	fn request_publishes_field() {
		let (mut app, entity) = app();
		app.world_mut()
			.send_event(EventFlowFieldRequest::single(Vec2::new(5.5, 5.5)));
		app.update();
		let manager = manager(&app, entity);
		assert!(manager.snapshot().has_goal(GridCell::new(5, 5)));
		assert!(manager.sample(Vec2::new(0.5, 0.5)).x > 0.0);
		let ready = app.world().resource::<Events<EventFlowFieldReady>>();
		let result: Vec<&EventFlowFieldReady> = ready.iter_current_update_events().collect();
		assert_eq!(1, result.len());
		assert_eq!(entity, result[0].get_entity());
		assert!(!result[0].get_status().is_cached());
	}
	#[test]
	fn duplicate_requests_coalesce() {
		let (mut app, entity) = app();
		for _ in 0..10 {
			app.world_mut()
				.send_event(EventFlowFieldRequest::single(Vec2::new(5.5, 5.5)));
		}
		app.update();
		assert_eq!(1, manager(&app, entity).computations());
	}
	#[test]
	fn failed_request_reported() {
		let (mut app, entity) = app();
		app.world_mut()
			.send_event(EventFlowFieldRequest::many(vec![Vec2::new(-1.0, 0.0)]));
		app.update();
		let failed = app.world().resource::<Events<EventFlowFieldFailed>>();
		let result: Vec<&EventFlowFieldFailed> = failed.iter_current_update_events().collect();
		assert_eq!(1, result.len());
		assert!(matches!(
			result[0].get_error(),
			FlowFieldError::DestinationOutOfBounds(_)
		));
		assert!(manager(&app, entity).snapshot().is_empty());
	}
	#[test]
	fn obstacles_applied_before_requests() {
		let (mut app, entity) = app();
		let bounds = {
			let mut entity_mut = app.world_mut().entity_mut(entity);
			let mut manager = entity_mut
				.get_mut::<FlowFieldManager<ObstacleMap>>()
				.unwrap();
			let (_, bounds) = manager
				.oracle_mut()
				.place(Obstacle::impassable(Rect::new(5.0, 5.0, 6.0, 6.0)));
			bounds
		};
		// sent out of order, obstacles still land first
		app.world_mut()
			.send_event(EventFlowFieldRequest::single(Vec2::new(5.5, 5.5)));
		app.world_mut().send_event(EventObstacleChanged::new(bounds));
		app.update();
		let failed = app.world().resource::<Events<EventFlowFieldFailed>>();
		assert_eq!(1, failed.iter_current_update_events().count());
		assert_eq!(0, manager(&app, entity).computations());
	}
	#[test]
	fn old_fields_cleared_down() {
		let (mut app, entity) = app();
		app.world_mut()
			.send_event(EventFlowFieldRequest::single(Vec2::new(5.5, 5.5)));
		app.update();
		assert_eq!(1, manager(&app, entity).cache().len());
		app.world_mut()
			.resource_mut::<Time>()
			.advance_by(Duration::from_secs(901));
		app.update();
		let manager = manager(&app, entity);
		assert_eq!(Duration::from_secs(901), manager.get_elapsed());
		assert!(manager.cache().is_empty());
	}
}
