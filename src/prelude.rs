//! `use bevy_flowfield_grid_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::flowfields::{
	cache::*,
	error::*,
	fields::{cost_field::*, flow_field::*, integration_field::*, *},
	generator::*,
	grid::*,
	surface::*,
	utilities::*,
};

#[doc(hidden)]
pub use crate::{
	manager::*,
	plugin::{cost_layer::*, flow_layer::*, *},
};
