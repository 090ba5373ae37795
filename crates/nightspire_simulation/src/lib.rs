//! NIGHTSPIRE Simulation Core
//!
//! Headless ECS-симуляция враждебных агентов на Bevy 0.16.
//! Агент — конечный автомат Patrol / Chase / Attack с тремя
//! концентрическими радиусами детекции и melee/ranged вариантами боя.
//!
//! Детерминизм: FixedUpdate 60Hz + seeded ChaCha8 RNG. Вся случайность
//! (micro-search паузы, wander) идёт через `DeterministicRng`.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod components;
pub mod logger;
pub mod navigation;
pub mod util;

// Re-export для удобства
pub use ai::{BehaviorPlugin, BehaviorState, Detection, DetectionRanges, PatrolRoute, PrimaryTarget};
pub use combat::{
    AttackSwing, CombatKind, CombatPlugin, CombatVariant, DamageDealt, Dead, EntityDied,
    MeleeAttack, Projectile, RangedAttack, Trajectory, CORPSE_LINGER,
};
pub use components::*;
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, LogLevel};
pub use navigation::{NavAgent, NavBounds, NavigationPlugin};

/// Порядок подсистем внутри FixedUpdate tick'а
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Детекция + машина поведения (решения)
    Behavior,
    /// Свинги, снаряды, урон, смерть
    Combat,
    /// Locomotion: исполнение destination'ов
    Navigation,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            .init_resource::<NavBounds>();

        // Seed по умолчанию; create_headless_app мог уже вставить свой
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.configure_sets(
            FixedUpdate,
            (SimSet::Behavior, SimSet::Combat, SimSet::Navigation).chain(),
        );

        app.add_plugins((BehaviorPlugin, CombatPlugin, NavigationPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .add_plugins(SimulationPlugin);

    app
}

/// Спавнит агента с валидацией конфига.
///
/// Невалидные радиусы (detection < chase, chase < attack) отклоняются
/// до того, как агент попадёт в мир.
pub fn spawn_agent(
    world: &mut World,
    position: Vec3,
    route: Vec<Vec3>,
    config: AgentConfig,
    variant: CombatVariant,
) -> Result<Entity, AgentConfigError> {
    config.validate()?;

    let entity = world
        .spawn((
            Transform::from_translation(position),
            Agent { faction_id: 1 },
            HitLayer(layers::AGENT),
            BehaviorState::default(),
            PatrolRoute::new(route, position),
            config,
            variant,
        ))
        .id();

    Ok(entity)
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
