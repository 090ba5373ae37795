//! Применение урона и смерть.
//!
//! Урон течёт через события (melee strike / projectile hit → DamageDealt),
//! применяется одной системой. `EntityDied` эмитится ровно один раз —
//! на переходе alive → dead. Трупы агентов задерживаются на
//! `CORPSE_LINGER` секунд (scoped timer), затем despawn.

use bevy::prelude::*;

use crate::components::{Agent, Health};
use crate::util::ScopedTimer;

/// Сколько труп агента остаётся в мире (секунды)
pub const CORPSE_LINGER: f32 = 5.0;

/// Event: урон нанесён цели
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub target: Entity,
    pub amount: u32,
    pub source: Option<Entity>,
}

/// Event: entity умер (alive → dead edge, эмитится один раз)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Маркер: entity мёртв. Поведение замирает, despawn отложен.
#[derive(Component, Debug, Default)]
pub struct Dead;

/// Отложенный despawn трупа (scoped: повторная смерть невозможна,
/// но повторный start отменил бы прошлый запуск)
#[derive(Component, Debug, Default)]
pub struct CorpseTimer(pub ScopedTimer);

/// Система: применение DamageDealt к Health
pub fn apply_damage(
    mut damage_events: EventReader<DamageDealt>,
    mut targets: Query<&mut Health>,
    mut died_events: EventWriter<EntityDied>,
) {
    for event in damage_events.read() {
        let Ok(mut health) = targets.get_mut(event.target) else {
            // Цель уже despawned — не ошибка
            continue;
        };

        let was_alive = health.is_alive();
        health.take_damage(event.amount);

        if was_alive && !health.is_alive() {
            died_events.write(EntityDied {
                entity: event.target,
                killer: event.source,
            });
            crate::logger::log_info(&format!(
                "Combat: {:?} killed by {:?}",
                event.target, event.source
            ));
        }
    }
}

/// Система: смерть агента → маркер Dead + таймер уборки трупа
///
/// Не-агенты (цель) маркируются Dead без уборки.
pub fn handle_deaths(
    mut died_events: EventReader<EntityDied>,
    agents: Query<(), With<Agent>>,
    mut commands: Commands,
) {
    for event in died_events.read() {
        let Ok(mut entity_commands) = commands.get_entity(event.entity) else {
            continue;
        };
        entity_commands.insert(Dead);

        if agents.get(event.entity).is_ok() {
            entity_commands.insert(CorpseTimer(ScopedTimer::started(CORPSE_LINGER)));
        }
    }
}

/// Система: despawn трупов по истечении таймера
pub fn tick_corpse_timers(
    mut corpses: Query<(Entity, &mut CorpseTimer)>,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
) {
    let delta = time.delta_secs();
    for (entity, mut timer) in corpses.iter_mut() {
        if timer.0.tick(delta) {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpse_timer_duration() {
        let mut timer = ScopedTimer::started(CORPSE_LINGER);
        assert!(!timer.tick(CORPSE_LINGER - 0.1));
        assert!(timer.tick(0.2));
    }

    #[test]
    fn test_died_emitted_once_per_death_edge() {
        let mut app = App::new();
        app.add_event::<DamageDealt>();
        app.add_event::<EntityDied>();
        app.add_systems(Update, apply_damage);

        let target = app.world_mut().spawn(Health::new(10)).id();
        let mut cursor = app.world().resource::<Events<EntityDied>>().get_cursor();

        // Два летальных события в одном тике: edge alive→dead ровно один
        app.world_mut().send_event(DamageDealt {
            target,
            amount: 50,
            source: None,
        });
        app.world_mut().send_event(DamageDealt {
            target,
            amount: 50,
            source: None,
        });
        app.update();
        let died = cursor
            .read(app.world().resource::<Events<EntityDied>>())
            .count();
        assert_eq!(died, 1);

        // Урон по уже мёртвой цели: повторного EntityDied нет
        app.world_mut().send_event(DamageDealt {
            target,
            amount: 50,
            source: None,
        });
        app.update();
        let died = cursor
            .read(app.world().resource::<Events<EntityDied>>())
            .count();
        assert_eq!(died, 0);
    }
}
