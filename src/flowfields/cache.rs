//! Each generated single-destination field is placed into this cache so that
//! asking for the same destination again is a lookup rather than a search.
//!
//! Entries are keyed by the [GridCell] containing the destination. The cache
//! is bounded, once full inserting a new destination evicts the entry that was
//! inserted first (reading an entry does not refresh it). Entries also record
//! when they were generated so that long lived fields can be cleared down.
//!

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use crate::prelude::*;
use bevy::prelude::*;

/// A cached field along with when it was inserted
#[derive(Clone, Debug)]
pub struct FieldCacheEntry {
	/// The stored field
	field: Arc<FieldSnapshot>,
	/// Insertion order, lower values were inserted earlier
	sequence: u64,
	//? If a game is running for 136 years bad things will start happening here
	/// Marks the field based on time elapsed since app start, used to enable
	/// automatic cleardown of long lived fields that are probably not needed
	/// anymore
	time_generated: Duration,
}

impl FieldCacheEntry {
	/// Get the stored field
	pub fn get_field(&self) -> &Arc<FieldSnapshot> {
		&self.field
	}
	/// Get the insertion sequence number
	pub fn get_sequence(&self) -> u64 {
		self.sequence
	}
	/// Get when the field was generated
	pub fn get_time_generated(&self) -> Duration {
		self.time_generated
	}
	/// Whether the entry is older than `max_age` at `elapsed`
	fn is_expired(&self, elapsed: Duration, max_age: Option<Duration>) -> bool {
		match max_age {
			Some(max_age) => elapsed.saturating_sub(self.time_generated) > max_age,
			None => false,
		}
	}
}

/// Bounded map of destination cell to generated field
#[derive(Clone, Debug, Default)]
pub struct FieldCache {
	/// Stored fields
	entries: BTreeMap<GridCell, FieldCacheEntry>,
	/// Maximum number of entries, `0` disables caching
	capacity: usize,
	/// Age past which an entry is no longer used
	max_age: Option<Duration>,
	/// Sequence number handed to the next insertion
	next_sequence: u64,
}

impl FieldCache {
	/// Create an empty cache holding up to `capacity` fields, each usable for
	/// `max_age` after it was generated ([None] for forever)
	pub fn new(capacity: usize, max_age: Option<Duration>) -> Self {
		FieldCache {
			entries: BTreeMap::new(),
			capacity,
			max_age,
			next_sequence: 0,
		}
	}
	/// Maximum number of entries
	pub fn get_capacity(&self) -> usize {
		self.capacity
	}
	/// Age past which an entry is no longer used
	pub fn get_max_age(&self) -> Option<Duration> {
		self.max_age
	}
	/// Number of stored fields
	pub fn len(&self) -> usize {
		self.entries.len()
	}
	/// Whether nothing is stored
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
	/// Whether a field is stored for `destination`, expired or not
	pub fn contains(&self, destination: GridCell) -> bool {
		self.entries.contains_key(&destination)
	}
	/// Get the entry of a destination, expired or not
	pub fn get_entry(&self, destination: GridCell) -> Option<&FieldCacheEntry> {
		self.entries.get(&destination)
	}
	/// Get the field of a destination if it has not expired at `elapsed`
	pub fn get(&self, destination: GridCell, elapsed: Duration) -> Option<&Arc<FieldSnapshot>> {
		self.entries
			.get(&destination)
			.filter(|e| !e.is_expired(elapsed, self.max_age))
			.map(|e| &e.field)
	}
	/// Iterate over the stored destinations and entries
	pub fn iter(&self) -> impl Iterator<Item = (&GridCell, &FieldCacheEntry)> {
		self.entries.iter()
	}
	/// Store the field of a `destination` generated at `elapsed`. Replacing an
	/// existing destination counts as a fresh insertion. When the cache is
	/// full the oldest insertion is evicted and its destination returned
	pub fn insert(
		&mut self,
		destination: GridCell,
		field: Arc<FieldSnapshot>,
		elapsed: Duration,
	) -> Option<GridCell> {
		if self.capacity == 0 {
			return None;
		}
		let mut evicted = None;
		if !self.entries.contains_key(&destination) && self.entries.len() >= self.capacity {
			let oldest = self
				.entries
				.iter()
				.min_by_key(|(_, e)| e.sequence)
				.map(|(cell, _)| *cell);
			if let Some(oldest) = oldest {
				self.entries.remove(&oldest);
				debug!("Cache full, evicted field for destination {:?}", oldest);
				evicted = Some(oldest);
			}
		}
		let entry = FieldCacheEntry {
			field,
			sequence: self.next_sequence,
			time_generated: elapsed,
		};
		self.next_sequence += 1;
		self.entries.insert(destination, entry);
		evicted
	}
	/// Remove the field of a destination
	pub fn remove(&mut self, destination: GridCell) -> Option<FieldCacheEntry> {
		self.entries.remove(&destination)
	}
	/// Remove every entry whose destination cell centre lies within `bounds`,
	/// returning how many were removed
	pub fn evict_within(&mut self, dimensions: &GridDimensions, bounds: Rect) -> usize {
		let before = self.entries.len();
		self.entries
			.retain(|cell, _| !bounds.contains(dimensions.cell_to_world(*cell)));
		before - self.entries.len()
	}
	/// Remove every entry older than the max age at `elapsed`, returning how
	/// many were removed
	pub fn expire(&mut self, elapsed: Duration) -> usize {
		let max_age = self.max_age;
		let before = self.entries.len();
		self.entries.retain(|_, e| !e.is_expired(elapsed, max_age));
		before - self.entries.len()
	}
	/// Remove everything, returning how many entries there were
	pub fn clear(&mut self) -> usize {
		let count = self.entries.len();
		self.entries.clear();
		count
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	fn dimensions() -> GridDimensions {
		GridDimensions::new(Vec2::ZERO, 1.0, 10, 10).unwrap()
	}
	fn field() -> Arc<FieldSnapshot> {
		Arc::new(FieldSnapshot::empty(dimensions(), 0))
	}
	#[test]
	fn insert_and_get() {
		let mut cache = FieldCache::new(2, None);
		let field = field();
		cache.insert(GridCell::new(1, 1), field.clone(), Duration::ZERO);
		let result = cache.get(GridCell::new(1, 1), Duration::from_secs(5000)).unwrap();
		assert!(Arc::ptr_eq(&field, result));
		assert!(cache.get(GridCell::new(2, 2), Duration::ZERO).is_none());
	}
	#[test]
	fn evict_oldest_insertion() {
		let mut cache = FieldCache::new(2, None);
		assert_eq!(None, cache.insert(GridCell::new(0, 0), field(), Duration::ZERO));
		assert_eq!(None, cache.insert(GridCell::new(1, 0), field(), Duration::ZERO));
		// reading does not refresh
		cache.get(GridCell::new(0, 0), Duration::ZERO);
		let evicted = cache.insert(GridCell::new(2, 0), field(), Duration::ZERO);
		assert_eq!(Some(GridCell::new(0, 0)), evicted);
		assert_eq!(2, cache.len());
		assert!(cache.contains(GridCell::new(1, 0)));
		assert!(cache.contains(GridCell::new(2, 0)));
	}
	#[test]
	fn replace_refreshes_sequence() {
		let mut cache = FieldCache::new(2, None);
		cache.insert(GridCell::new(0, 0), field(), Duration::ZERO);
		cache.insert(GridCell::new(1, 0), field(), Duration::ZERO);
		assert_eq!(None, cache.insert(GridCell::new(0, 0), field(), Duration::ZERO));
		let evicted = cache.insert(GridCell::new(2, 0), field(), Duration::ZERO);
		assert_eq!(Some(GridCell::new(1, 0)), evicted);
	}
	#[test]
	fn zero_capacity_disables() {
		let mut cache = FieldCache::new(0, None);
		assert_eq!(None, cache.insert(GridCell::new(0, 0), field(), Duration::ZERO));
		assert!(cache.is_empty());
	}
	#[test]
	fn expired_entries_ignored() {
		let mut cache = FieldCache::new(4, Some(Duration::from_secs(900)));
		cache.insert(GridCell::new(0, 0), field(), Duration::from_secs(10));
		cache.insert(GridCell::new(1, 0), field(), Duration::from_secs(500));
		assert!(cache.get(GridCell::new(0, 0), Duration::from_secs(910)).is_some());
		assert!(cache.get(GridCell::new(0, 0), Duration::from_secs(911)).is_none());
		assert_eq!(1, cache.expire(Duration::from_secs(911)));
		assert!(!cache.contains(GridCell::new(0, 0)));
		assert!(cache.contains(GridCell::new(1, 0)));
	}
	#[test]
	fn evict_by_bounds() {
		let mut cache = FieldCache::new(4, None);
		cache.insert(GridCell::new(0, 0), field(), Duration::ZERO);
		cache.insert(GridCell::new(5, 5), field(), Duration::ZERO);
		cache.insert(GridCell::new(9, 9), field(), Duration::ZERO);
		// covers the centre of (5, 5) only
		let removed = cache.evict_within(&dimensions(), Rect::new(5.2, 5.2, 6.0, 6.0));
		assert_eq!(1, removed);
		assert!(!cache.contains(GridCell::new(5, 5)));
		assert_eq!(2, cache.clear());
	}
}
