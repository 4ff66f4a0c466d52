//! Logic relating to [FlowField] generation
//!

use crate::prelude::*;
use bevy::prelude::*;

/// A request to generate and publish a field leading to the nearest of one or
/// more destinations. Single destination requests are served from the cache
/// when possible
#[derive(Event, Clone, Debug, PartialEq)]
pub struct EventFlowFieldRequest {
	/// World positions to lead towards
	destinations: Vec<Vec2>,
}

impl EventFlowFieldRequest {
	/// Request a field leading to one `destination`
	pub fn single(destination: Vec2) -> Self {
		EventFlowFieldRequest {
			destinations: vec![destination],
		}
	}
	/// Request a field leading to the nearest of `destinations`
	pub fn many(destinations: Vec<Vec2>) -> Self {
		EventFlowFieldRequest { destinations }
	}
	/// The requested destinations
	pub fn get_destinations(&self) -> &[Vec2] {
		&self.destinations
	}
}

/// Sent when a manager has published a field for a request
#[derive(Event, Clone, Debug, PartialEq)]
pub struct EventFlowFieldReady {
	/// Entity holding the manager
	entity: Entity,
	/// Destinations of the request
	destinations: Vec<Vec2>,
	/// Whether the field came from the cache
	status: GenerationStatus,
}

impl EventFlowFieldReady {
	/// Entity holding the manager
	pub fn get_entity(&self) -> Entity {
		self.entity
	}
	/// Destinations of the request
	pub fn get_destinations(&self) -> &[Vec2] {
		&self.destinations
	}
	/// How the request was satisfied
	pub fn get_status(&self) -> GenerationStatus {
		self.status
	}
}

/// Sent when a manager could not satisfy a request, its published field is
/// unchanged
#[derive(Event, Debug)]
pub struct EventFlowFieldFailed {
	/// Entity holding the manager
	entity: Entity,
	/// Destinations of the request
	destinations: Vec<Vec2>,
	/// Why the request failed
	error: FlowFieldError,
}

impl EventFlowFieldFailed {
	/// Entity holding the manager
	pub fn get_entity(&self) -> Entity {
		self.entity
	}
	/// Destinations of the request
	pub fn get_destinations(&self) -> &[Vec2] {
		&self.destinations
	}
	/// Why the request failed
	pub fn get_error(&self) -> &FlowFieldError {
		&self.error
	}
}

/// Process [EventFlowFieldRequest] against every manager using the surface
/// `O`, reporting each outcome with [EventFlowFieldReady] or
/// [EventFlowFieldFailed]
#[cfg(not(tarpaulin_include))]
pub fn process_generation_requests<O: SurfaceOracle>(
	mut events: EventReader<EventFlowFieldRequest>,
	mut query: Query<(Entity, &mut FlowFieldManager<O>)>,
	mut event_ready: EventWriter<EventFlowFieldReady>,
	mut event_failed: EventWriter<EventFlowFieldFailed>,
) {
	// several actors may send the same request at once, only process a fresh
	// request once per tick
	let mut requests: Vec<&EventFlowFieldRequest> = Vec::new();
	for event in events.read() {
		if !requests.contains(&event) {
			requests.push(event);
		}
	}
	for request in requests.iter() {
		for (entity, mut manager) in query.iter_mut() {
			let destinations = request.get_destinations();
			let result = if destinations.len() == 1 {
				manager.generate(destinations[0])
			} else {
				manager.generate_many(destinations)
			};
			match result {
				Ok(status) => {
					event_ready.write(EventFlowFieldReady {
						entity,
						destinations: destinations.to_vec(),
						status,
					});
				}
				Err(error) => {
					error!("Failed to generate field for {:?}: {}", destinations, error);
					event_failed.write(EventFlowFieldFailed {
						entity,
						destinations: destinations.to_vec(),
						error,
					});
				}
			}
		}
	}
}

/// Advance the cache clock of every manager and purge any fields older than
/// their max age (15 minutes by default)
#[cfg(not(tarpaulin_include))]
pub fn cleanup_old_fields<O: SurfaceOracle>(
	mut query: Query<&mut FlowFieldManager<O>>,
	time: Res<Time>,
) {
	for mut manager in query.iter_mut() {
		manager.set_elapsed(time.elapsed());
		manager.expire_cache_entries();
	}
}
