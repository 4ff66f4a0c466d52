//! This is a plugin for Bevy game engine to setup and handle the logic for
//! calculating pathfinding FlowFields over a single navigation grid
//!
//! A [prelude::FlowFieldManager] can be used on its own, without an `App`,
//! or spawned onto an entity and driven by events through the
//! [plugin::FlowFieldPlugin]
//!

pub mod flowfields;
pub mod manager;
pub mod plugin;

pub mod prelude;
