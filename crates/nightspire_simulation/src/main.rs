//! Headless симуляция NIGHTSPIRE
//!
//! Bevy App без рендера: цель + melee/ranged агенты, несколько сотен
//! тиков FixedUpdate с периодическим выводом состояния.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use nightspire_simulation::{
    create_headless_app, spawn_agent, AgentConfig, BehaviorState, CombatVariant, Health, HitLayer,
    PrimaryTarget,
};
use nightspire_simulation::components::layers;

fn main() {
    let seed = 42;
    println!("Starting NIGHTSPIRE headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    // Один FixedUpdate tick на app.update()
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
        1.0 / 60.0,
    )));

    // Цель (стоит на месте)
    let target = app
        .world_mut()
        .spawn((
            Transform::from_xyz(0.0, 0.0, 0.0),
            Health::new(200),
            HitLayer(layers::PLAYER),
        ))
        .id();
    app.world_mut().insert_resource(PrimaryTarget(Some(target)));

    // Melee агент недалеко от цели, патрулирует квадрат
    spawn_agent(
        app.world_mut(),
        Vec3::new(18.0, 0.0, 0.0),
        vec![
            Vec3::new(18.0, 0.0, 0.0),
            Vec3::new(24.0, 0.0, 0.0),
            Vec3::new(24.0, 0.0, 6.0),
            Vec3::new(18.0, 0.0, 6.0),
        ],
        AgentConfig::default(),
        CombatVariant::melee(),
    )
    .expect("default melee config is valid");

    // Ranged агент подальше
    spawn_agent(
        app.world_mut(),
        Vec3::new(-25.0, 0.0, 0.0),
        vec![Vec3::new(-25.0, 0.0, 0.0), Vec3::new(-30.0, 0.0, 5.0)],
        AgentConfig::default(),
        CombatVariant::ranged(),
    )
    .expect("default ranged config is valid");

    for tick in 0..600 {
        app.update();

        if tick % 60 == 0 {
            let world = app.world_mut();
            let target_hp = world.get::<Health>(target).map(|h| h.current).unwrap_or(0);
            let mut states = world.query_filtered::<&BehaviorState, With<nightspire_simulation::Agent>>();
            let summary: Vec<&str> = states.iter(world).map(|s| s.kind()).collect();
            println!(
                "Tick {}: target hp={}, agents={:?}",
                tick, target_hp, summary
            );
        }
    }

    println!("Simulation complete!");
}
