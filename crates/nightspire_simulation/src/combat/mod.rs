//! Combat подсистема.
//!
//! ECS ответственность:
//! - `CombatVariant` — melee/ranged специализация + cooldown запись
//! - `AttackSwing` — фазы атаки (наличие = mid-attack-animation)
//! - Events: MeleeStrike → overlap, DamageDealt → Health, EntityDied
//! - Снаряды целиком в ECS (headless: нет tactical слоя)
//!
//! Порядок выполнения (chain):
//! 1. update_attack_swings — фазы + strike callback
//! 2. resolve_melee_strikes — overlap → DamageDealt
//! 3. update_projectiles / projectile_hits — полёт и попадания
//! 4. apply_damage — DamageDealt → Health, EntityDied edge
//! 5. handle_deaths / tick_corpse_timers — уборка трупов

use bevy::prelude::*;

pub mod ballistics;
pub mod damage;
pub mod projectile;
pub mod spatial;
pub mod strike;
pub mod swing;
pub mod variant;

pub use ballistics::{launch_velocity, straight_shot};
pub use spatial::overlap_sphere;
pub use damage::{apply_damage, CorpseTimer, DamageDealt, Dead, EntityDied, CORPSE_LINGER};
pub use projectile::Projectile;
pub use strike::MeleeStrike;
pub use swing::{AttackSwing, SwingPhase};
pub use variant::{
    AttackCooldown, CombatKind, CombatVariant, MeleeAttack, RangedAttack, SwingProfile, Trajectory,
};

use crate::SimSet;

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<MeleeStrike>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>();

        app.add_systems(
            FixedUpdate,
            (
                swing::update_attack_swings,
                strike::resolve_melee_strikes,
                projectile::update_projectiles,
                projectile::projectile_hits,
                damage::apply_damage,
                damage::handle_deaths,
                damage::tick_corpse_timers,
            )
                .chain()
                .in_set(SimSet::Combat),
        );
    }
}
