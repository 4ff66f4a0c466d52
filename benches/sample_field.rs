//! Measure sampling the published field for a crowd of agents, the call made
//! by every agent on every tick
//!

use bevy::prelude::*;
use bevy_flowfield_grid_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Manager with a field towards the centre of a 256 x 256 grid published
fn prepare_manager() -> FlowFieldManager<OpenTerrain> {
	let dimensions = GridDimensions::new(Vec2::ZERO, 1.0, 256, 256).unwrap();
	let mut manager =
		FlowFieldManager::new(FlowFieldSettings::new(dimensions), OpenTerrain::default()).unwrap();
	manager.generate(Vec2::new(128.0, 128.0)).unwrap();
	manager
}

/// Sample the direction of every agent
fn sample_crowd(manager: &FlowFieldManager<OpenTerrain>, agents: &[Vec2]) -> Vec2 {
	let mut sum = Vec2::ZERO;
	for agent in agents.iter() {
		sum += manager.sample(*agent);
	}
	sum
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("algorithm_use");
	group.significance_level(0.05).sample_size(100);
	let manager = prepare_manager();
	let agents: Vec<Vec2> = (0..10_000)
		.map(|i| Vec2::new((i % 250) as f32 + 0.37, (i / 40) as f32 + 0.61))
		.collect();
	group.bench_function("sample_field_10k", |b| {
		b.iter(|| sample_crowd(&manager, black_box(&agents)))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
