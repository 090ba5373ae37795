//! Spatial queries по ECS entities (headless: без физдвижка).

use bevy::prelude::*;

use crate::components::{Agent, Health, HitLayer, HitMask};

/// Sphere overlap: живые entity внутри радиуса, категория в mask.
/// `exclude` (обычно атакующий/стрелявший) и его фракция (friendly fire)
/// исключаются.
pub fn overlap_sphere<'a>(
    center: Vec3,
    radius: f32,
    mask: HitMask,
    exclude: Entity,
    exclude_faction: Option<u64>,
    candidates: impl IntoIterator<Item = (Entity, &'a Transform, &'a HitLayer, &'a Health, Option<&'a Agent>)>,
) -> Vec<Entity> {
    candidates
        .into_iter()
        .filter(|(entity, transform, layer, health, agent)| {
            let same_faction =
                exclude_faction.is_some() && agent.map(|a| a.faction_id) == exclude_faction;
            *entity != exclude
                && !same_faction
                && mask.contains(**layer)
                && health.is_alive()
                && transform.translation.distance(center) <= radius
        })
        .map(|(entity, ..)| entity)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::layers;

    #[test]
    fn test_overlap_filters_by_mask_radius_and_liveness() {
        let attacker = Entity::from_raw(0);
        let near_player = Entity::from_raw(1);
        let far_player = Entity::from_raw(2);
        let near_agent = Entity::from_raw(3);
        let dead_player = Entity::from_raw(4);

        let t_near = Transform::from_xyz(0.5, 0.0, 0.0);
        let t_far = Transform::from_xyz(5.0, 0.0, 0.0);
        let player = HitLayer(layers::PLAYER);
        let agent = HitLayer(layers::AGENT);
        let alive = Health::new(100);
        let mut dead = Health::new(100);
        dead.take_damage(100);

        let candidates = vec![
            (near_player, &t_near, &player, &alive, None),
            (far_player, &t_far, &player, &alive, None),
            (near_agent, &t_near, &agent, &alive, None),
            (dead_player, &t_near, &player, &dead, None),
        ];

        let hits = overlap_sphere(Vec3::ZERO, 1.0, HitMask::PLAYERS, attacker, None, candidates);
        assert_eq!(hits, vec![near_player]);
    }

    #[test]
    fn test_overlap_excludes_attacker() {
        let attacker = Entity::from_raw(7);
        let t = Transform::default();
        let player = HitLayer(layers::PLAYER);
        let alive = Health::new(100);

        let hits = overlap_sphere(
            Vec3::ZERO,
            1.0,
            HitMask::PLAYERS,
            attacker,
            None,
            vec![(attacker, &t, &player, &alive, None)],
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn test_overlap_skips_same_faction() {
        let attacker = Entity::from_raw(0);
        let ally = Entity::from_raw(1);
        let enemy = Entity::from_raw(2);

        let t = Transform::from_xyz(0.5, 0.0, 0.0);
        let layer = HitLayer(layers::AGENT);
        let alive = Health::new(100);
        let ally_agent = Agent { faction_id: 1 };
        let enemy_agent = Agent { faction_id: 2 };

        // Mask включает агентов: без faction фильтра союзник попал бы под удар
        let mask = HitMask(layers::AGENT);
        let candidates = vec![
            (ally, &t, &layer, &alive, Some(&ally_agent)),
            (enemy, &t, &layer, &alive, Some(&enemy_agent)),
        ];

        let hits = overlap_sphere(Vec3::ZERO, 1.0, mask, attacker, Some(1), candidates);
        assert_eq!(hits, vec![enemy]);
    }
}
