//! Снаряды: кинетические, с конечным lifetime.
//!
//! Снаряд самоуничтожается по истечении lifetime независимо от попаданий.
//! Попадание — proximity test по hit mask; стрелявший исключается.

use bevy::prelude::*;

use crate::combat::damage::DamageDealt;
use crate::combat::spatial::overlap_sphere;
use crate::components::{Agent, Health, HitLayer, HitMask};

/// Кинетический снаряд
#[derive(Component, Debug, Clone, Reflect)]
pub struct Projectile {
    pub velocity: Vec3,
    /// 0 для прямых выстрелов
    pub gravity: f32,
    pub damage: u32,
    /// Остаток жизни (секунды)
    pub lifetime: f32,
    pub shooter: Entity,
    /// Фракция стрелявшего (союзники не поражаются)
    pub faction: u64,
    pub hit_mask: HitMask,
    /// Радиус proximity-попадания
    pub hit_radius: f32,
}

/// Система: интеграция движения + lifetime
pub fn update_projectiles(
    mut projectiles: Query<(Entity, &mut Transform, &mut Projectile)>,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
) {
    let delta = time.delta_secs();

    for (entity, mut transform, mut projectile) in projectiles.iter_mut() {
        projectile.lifetime -= delta;
        if projectile.lifetime <= 0.0 {
            commands.entity(entity).despawn();
            continue;
        }

        projectile.velocity.y -= projectile.gravity * delta;
        let step = projectile.velocity * delta;
        transform.translation += step;
    }
}

/// Система: proximity попадания
///
/// Первое валидное попадание наносит урон и уничтожает снаряд.
pub fn projectile_hits(
    projectiles: Query<(Entity, &Transform, &Projectile)>,
    targets: Query<(Entity, &Transform, &HitLayer, &Health, Option<&Agent>)>,
    mut damage_events: EventWriter<DamageDealt>,
    mut commands: Commands,
) {
    for (projectile_entity, projectile_transform, projectile) in projectiles.iter() {
        let hit = overlap_sphere(
            projectile_transform.translation,
            projectile.hit_radius,
            projectile.hit_mask,
            projectile.shooter,
            Some(projectile.faction),
            targets.iter(),
        )
        .into_iter()
        .next();

        if let Some(target) = hit {
            damage_events.write(DamageDealt {
                target,
                amount: projectile.damage,
                source: Some(projectile.shooter),
            });
            commands.entity(projectile_entity).despawn();
        }
    }
}
