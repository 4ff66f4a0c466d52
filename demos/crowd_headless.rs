//! Runs a headless simulation of a crowd of agents crossing a 40x30 world
//! towards a rally point. Halfway through a barricade is dropped across the
//! direct route, the field is regenerated and the crowd flows around it.
//!
//! Run with `RUST_LOG=bevy_flowfield_grid_plugin=debug` to see the plugin
//! working
//!

use std::time::Duration;

use bevy::{app::ScheduleRunnerPlugin, log::LogPlugin, prelude::*};
use bevy_flowfield_grid_plugin::prelude::*;

/// Edge length of a grid cell in world units
const CELL_SIZE: f32 = 2.0;
/// Distance an agent covers each second
const AGENT_SPEED: f32 = 6.0;
/// Where the crowd is heading
const RALLY_POINT: Vec2 = Vec2::new(76.0, 30.0);
/// Frame the barricade is dropped on
const BARRICADE_FRAME: u32 = 120;
/// Frame the simulation stops on
const FINAL_FRAME: u32 = 600;

fn main() {
	App::new()
		.add_plugins((
			MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
				1.0 / 60.0,
			))),
			LogPlugin::default(),
		))
		.add_plugins(FlowFieldPlugin::<ObstacleMap>::default())
		.add_systems(Startup, (setup_navigation, setup_agents))
		.add_systems(
			Update,
			(drop_barricade, report_results)
				.chain()
				.before(OrderingSet::Calculate),
		)
		.add_systems(Update, steer_agents.after(OrderingSet::Calculate))
		.run();
}

/// Labels an agent of the crowd
#[derive(Component)]
struct Agent;

/// Spawn the manager and ask for a field towards the rally point
fn setup_navigation(mut cmds: Commands, mut event: EventWriter<EventFlowFieldRequest>) {
	let bounds = Rect::new(0.0, 0.0, 80.0, 60.0);
	let mut obstacles = ObstacleMap::new(1).with_bounds(bounds);
	// a pond with a muddy bank part way across the world
	obstacles.place(Obstacle::with_cost(Rect::new(30.0, 10.0, 44.0, 24.0), 3));
	obstacles.place(Obstacle::impassable(Rect::new(32.0, 12.0, 42.0, 22.0)));
	match FlowFieldManager::from_surface(obstacles, CELL_SIZE) {
		Ok(manager) => {
			cmds.spawn(manager);
			event.write(EventFlowFieldRequest::single(RALLY_POINT));
		}
		Err(e) => error!("Unable to create the navigation grid: {}", e),
	}
}

/// Spawn the crowd along the western edge
fn setup_agents(mut cmds: Commands) {
	for i in 0..50 {
		let position = Vec2::new(1.0 + (i % 5) as f32 * 1.5, 2.0 + (i / 5) as f32 * 5.5);
		cmds.spawn((Agent, Transform::from_translation(position.extend(0.0))));
	}
}

/// Move each agent along the published field
fn steer_agents(
	time: Res<Time>,
	manager_q: Query<&FlowFieldManager<ObstacleMap>>,
	mut agent_q: Query<&mut Transform, With<Agent>>,
) {
	let Ok(manager) = manager_q.single() else {
		return;
	};
	let field = manager.snapshot();
	for mut tform in agent_q.iter_mut() {
		let direction = field.sample(tform.translation.truncate());
		tform.translation += (direction * AGENT_SPEED * time.delta_secs()).extend(0.0);
	}
}

/// Block the direct route to the rally point and request a fresh field
fn drop_barricade(
	mut frame: Local<u32>,
	mut manager_q: Query<&mut FlowFieldManager<ObstacleMap>>,
	mut obstacle_event: EventWriter<EventObstacleChanged>,
	mut request_event: EventWriter<EventFlowFieldRequest>,
) {
	*frame += 1;
	if *frame != BARRICADE_FRAME {
		return;
	}
	let Ok(mut manager) = manager_q.single_mut() else {
		return;
	};
	let (_, bounds) = manager
		.oracle_mut()
		.place(Obstacle::impassable(Rect::new(60.0, 4.0, 62.0, 56.0)));
	info!("Barricade dropped over {:?}", bounds);
	obstacle_event.write(EventObstacleChanged::new(bounds));
	request_event.write(EventFlowFieldRequest::single(RALLY_POINT));
}

/// Log how the crowd got on and stop the app
fn report_results(
	mut frame: Local<u32>,
	manager_q: Query<&FlowFieldManager<ObstacleMap>>,
	agent_q: Query<&Transform, With<Agent>>,
	mut ready: EventReader<EventFlowFieldReady>,
	mut exit: EventWriter<AppExit>,
) {
	for event in ready.read() {
		info!(
			"Field ready for {:?}, {:?}",
			event.get_destinations(),
			event.get_status()
		);
	}
	*frame += 1;
	if *frame < FINAL_FRAME {
		return;
	}
	let Ok(manager) = manager_q.single() else {
		exit.write(AppExit::Success);
		return;
	};
	let arrived = agent_q
		.iter()
		.filter(|t| t.translation.truncate().distance(RALLY_POINT) < CELL_SIZE * 2.0)
		.count();
	let stuck = agent_q
		.iter()
		.filter(|t| !manager.is_walkable(t.translation.truncate()))
		.count();
	info!(
		"{} of {} agents reached the rally point, {} ended up inside an obstacle, {} field(s) calculated",
		arrived,
		agent_q.iter().count(),
		stuck,
		manager.computations()
	);
	exit.write(AppExit::Success);
}
