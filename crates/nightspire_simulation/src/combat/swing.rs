//! Attack swing фазы: Windup → Strike → Recovery.
//!
//! Наличие `AttackSwing` компонента = агент "mid-attack-animation":
//! behavior машина не стартует новую атаку и не отступает, пока swing идёт.
//! Эффект атаки исполняется ровно один раз — при входе в Strike фазу
//! (аналог animation-driven callback'а): melee кладёт `MeleeStrike` event,
//! ranged спавнит снаряд по текущей позиции цели.

use bevy::prelude::*;

use crate::ai::PrimaryTarget;
use crate::combat::ballistics;
use crate::combat::projectile::Projectile;
use crate::combat::strike::MeleeStrike;
use crate::combat::variant::{CombatKind, CombatVariant, SwingProfile, Trajectory};
use crate::components::{Agent, AnimationSink};

/// Фаза активного swing'а
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum SwingPhase {
    /// Замах (прерываний нет, hitbox неактивен)
    Windup,
    /// Удар — callback эффекта исполнен при входе
    Strike,
    /// Восстановление
    Recovery,
}

/// Активный attack swing (эфемерный: живёт windup+strike+recovery)
#[derive(Component, Debug, Clone, Reflect)]
pub struct AttackSwing {
    pub phase: SwingPhase,
    pub timer: f32,
}

impl AttackSwing {
    pub fn begin(profile: &SwingProfile) -> Self {
        Self {
            phase: SwingPhase::Windup,
            timer: profile.windup,
        }
    }
}

/// Система: продвижение фаз swing'а
///
/// Windup → Strike исполняет эффект варианта; Recovery истёк →
/// компонент снимается и playback tag очищается.
pub fn update_attack_swings(
    mut swings: Query<(
        Entity,
        &mut AttackSwing,
        &CombatVariant,
        &Transform,
        &mut AnimationSink,
        &Agent,
    )>,
    primary: Res<PrimaryTarget>,
    transforms: Query<&Transform, Without<AttackSwing>>,
    mut strikes: EventWriter<MeleeStrike>,
    mut commands: Commands,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut swing, variant, transform, mut anim, agent) in swings.iter_mut() {
        swing.timer -= delta;
        if swing.timer > 0.0 {
            continue;
        }

        match swing.phase {
            SwingPhase::Windup => {
                swing.phase = SwingPhase::Strike;
                swing.timer = variant.swing.strike;
                // Cross-fade в attack клип завершён к моменту удара
                anim.in_transition = false;

                // Animation-driven callback point
                match &variant.kind {
                    CombatKind::Melee(melee) => {
                        let anchor =
                            transform.translation + transform.rotation * melee.anchor_offset;
                        strikes.write(MeleeStrike {
                            attacker: entity,
                            faction: agent.faction_id,
                            anchor,
                            radius: melee.hitbox_radius,
                            damage: melee.damage,
                            mask: melee.hit_mask,
                        });
                    }
                    CombatKind::Ranged(ranged) => {
                        let origin =
                            transform.translation + transform.rotation * ranged.muzzle_offset;
                        // Цель берём на момент удара, не на момент решения
                        let aim = primary
                            .0
                            .and_then(|e| transforms.get(e).ok())
                            .map(|t| t.translation)
                            .unwrap_or_else(|| origin + *transform.forward() * 10.0);

                        let (velocity, gravity) = match ranged.trajectory {
                            Trajectory::Straight => {
                                (ballistics::straight_shot(aim - origin, ranged.projectile_speed), 0.0)
                            }
                            Trajectory::Ballistic { gravity } => (
                                ballistics::launch_velocity(
                                    ranged.projectile_speed,
                                    gravity,
                                    origin,
                                    aim,
                                ),
                                gravity,
                            ),
                        };

                        commands.spawn((
                            Transform::from_translation(origin),
                            Projectile {
                                velocity,
                                gravity,
                                damage: ranged.damage,
                                lifetime: ranged.projectile_lifetime,
                                shooter: entity,
                                faction: agent.faction_id,
                                hit_mask: ranged.hit_mask,
                                hit_radius: ranged.projectile_radius,
                            },
                        ));
                        crate::logger::log(&format!(
                            "Combat: {:?} fired projectile ({:?})",
                            entity, ranged.trajectory
                        ));
                    }
                }
            }
            SwingPhase::Strike => {
                swing.phase = SwingPhase::Recovery;
                swing.timer = variant.swing.recovery;
            }
            SwingPhase::Recovery => {
                commands.entity(entity).remove::<AttackSwing>();
                anim.current_tag = None;
                anim.in_transition = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swing_begins_in_windup() {
        let profile = SwingProfile {
            windup: 0.3,
            strike: 0.2,
            recovery: 0.3,
        };
        let swing = AttackSwing::begin(&profile);
        assert_eq!(swing.phase, SwingPhase::Windup);
        assert_eq!(swing.timer, 0.3);
    }
}
