//! Logic for handling obstacles being placed, moved or removed. The affected
//! area of the grid is re-probed from the surface and cached fields leading
//! into that area are dropped
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Tell every [FlowFieldManager] that the surface changed within an area
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct EventObstacleChanged {
	/// World space area whose cells should be re-probed, edges included
	bounds: Rect,
}

impl EventObstacleChanged {
	/// Create a new instance of [EventObstacleChanged]
	pub fn new(bounds: Rect) -> Self {
		EventObstacleChanged { bounds }
	}
	/// Area that changed
	pub fn get_bounds(&self) -> Rect {
		self.bounds
	}
}

/// Read [EventObstacleChanged] and patch the cost fields of every manager
/// using the surface `O`
#[cfg(not(tarpaulin_include))]
pub fn process_obstacle_events<O: SurfaceOracle>(
	mut events: EventReader<EventObstacleChanged>,
	mut query: Query<&mut FlowFieldManager<O>>,
) {
	// coalesce events to avoid processing duplicates
	let mut coalesced: Vec<Rect> = Vec::new();
	for event in events.read() {
		if !coalesced.contains(&event.get_bounds()) {
			coalesced.push(event.get_bounds());
		}
	}
	if coalesced.is_empty() {
		return;
	}
	for mut manager in query.iter_mut() {
		let mut changed = 0;
		for bounds in coalesced.iter() {
			changed += manager.on_obstacle_changed(*bounds);
		}
		debug!(
			"Applied {} obstacle change(s), {} cell(s) updated",
			coalesced.len(),
			changed
		);
	}
}
