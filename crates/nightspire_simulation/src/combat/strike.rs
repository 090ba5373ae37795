//! Melee strike разрешение: bounded-radius overlap по hit mask.

use bevy::prelude::*;

use crate::combat::damage::DamageDealt;
use crate::combat::spatial::overlap_sphere;
use crate::components::{Agent, Health, HitLayer, HitMask};

/// Event: melee удар достиг активной фазы (spatial query pending)
#[derive(Event, Debug, Clone)]
pub struct MeleeStrike {
    pub attacker: Entity,
    /// Фракция атакующего (союзники не поражаются)
    pub faction: u64,
    /// Центр сферы hitbox'а (world space)
    pub anchor: Vec3,
    pub radius: f32,
    pub damage: u32,
    pub mask: HitMask,
}

/// Система: overlap test вокруг anchor'а, урон каждой валидной цели
///
/// Пустой результат запроса — норма, не ошибка (удар в воздух).
pub fn resolve_melee_strikes(
    mut strikes: EventReader<MeleeStrike>,
    targets: Query<(Entity, &Transform, &HitLayer, &Health, Option<&Agent>)>,
    mut damage_events: EventWriter<DamageDealt>,
) {
    for strike in strikes.read() {
        let hits = overlap_sphere(
            strike.anchor,
            strike.radius,
            strike.mask,
            strike.attacker,
            Some(strike.faction),
            targets.iter(),
        );

        for &target in &hits {
            damage_events.write(DamageDealt {
                target,
                amount: strike.damage,
                source: Some(strike.attacker),
            });
        }

        if !hits.is_empty() {
            crate::logger::log(&format!(
                "Combat: melee strike by {:?} hit {} target(s)",
                strike.attacker,
                hits.len()
            ));
        }
    }
}
