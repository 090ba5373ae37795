//! Combat variant — melee/ranged специализация атаки.
//!
//! Архитектурное решение:
//! - Attack state НЕ инспектирует тип агента — он зовёт через `CombatVariant`
//! - Общий контракт: cooldown-gated `can_attack(now)` / `mark_attacked(now)`
//! - Сам эффект атаки (overlap / projectile) исполняется в strike фазе
//!   swing'а (см. swing.rs), не в момент решения

use bevy::prelude::*;

use crate::components::HitMask;

/// Cooldown запись: один timestamp на агента, живёт весь lifetime агента
///
/// `can_attack(now)` истинно ровно начиная с `last_attack + cooldown`.
#[derive(Debug, Clone, Copy, Reflect)]
pub struct AttackCooldown {
    pub cooldown: f32,
    last_attack: f32,
}

impl AttackCooldown {
    /// Новая запись; первый `can_attack` сразу true
    pub fn new(cooldown: f32) -> Self {
        Self {
            cooldown,
            last_attack: f32::NEG_INFINITY,
        }
    }

    pub fn can_attack(&self, now: f32) -> bool {
        now >= self.last_attack + self.cooldown
    }

    pub fn mark_attacked(&mut self, now: f32) {
        self.last_attack = now;
    }

    pub fn last_attack(&self) -> f32 {
        self.last_attack
    }
}

/// Тайминги фаз attack swing'а (секунды)
#[derive(Debug, Clone, Copy, Reflect)]
pub struct SwingProfile {
    /// Замах (до callback'а)
    pub windup: f32,
    /// Активная фаза (callback исполняется при входе)
    pub strike: f32,
    /// Восстановление после удара
    pub recovery: f32,
}

impl SwingProfile {
    pub fn total(&self) -> f32 {
        self.windup + self.strike + self.recovery
    }
}

/// Melee специализация: bounded-radius overlap вокруг hit anchor'а
#[derive(Debug, Clone, Reflect)]
pub struct MeleeAttack {
    pub damage: u32,
    /// Радиус сферы hitbox'а (метры)
    pub hitbox_radius: f32,
    /// Смещение anchor'а от агента (local space, вперёд = -Z)
    pub anchor_offset: Vec3,
    pub hit_mask: HitMask,
}

/// Траектория снаряда
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum Trajectory {
    /// Прямой выстрел без гравитации
    Straight,
    /// Баллистическая дуга (низкое из двух решений)
    Ballistic { gravity: f32 },
}

/// Ranged специализация: spawn снаряда с launch velocity
#[derive(Debug, Clone, Reflect)]
pub struct RangedAttack {
    pub damage: u32,
    /// Launch speed снаряда (м/с)
    pub projectile_speed: f32,
    /// Радиус proximity-попадания снаряда
    pub projectile_radius: f32,
    /// Lifetime снаряда (секунды); истёк → despawn независимо от попаданий
    pub projectile_lifetime: f32,
    /// Точка выпуска (local space)
    pub muzzle_offset: Vec3,
    pub trajectory: Trajectory,
    pub hit_mask: HitMask,
}

#[derive(Debug, Clone, Reflect)]
pub enum CombatKind {
    Melee(MeleeAttack),
    Ranged(RangedAttack),
}

/// Melee-vs-ranged специализация агента (фиксируется на весь lifetime)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct CombatVariant {
    pub cooldown: AttackCooldown,
    pub swing: SwingProfile,
    pub kind: CombatKind,
}

impl Default for CombatVariant {
    fn default() -> Self {
        Self::melee()
    }
}

impl CombatVariant {
    /// Melee bruiser (параметры из archetype'а melee агента)
    pub fn melee() -> Self {
        Self {
            cooldown: AttackCooldown::new(1.2),
            swing: SwingProfile {
                windup: 0.3,
                strike: 0.2,
                recovery: 0.3,
            },
            kind: CombatKind::Melee(MeleeAttack {
                damage: 20,
                hitbox_radius: 1.0,
                anchor_offset: Vec3::new(0.0, 0.0, -1.2),
                hit_mask: HitMask::PLAYERS,
            }),
        }
    }

    /// Ranged shooter (прямой выстрел)
    pub fn ranged() -> Self {
        Self {
            cooldown: AttackCooldown::new(1.5),
            swing: SwingProfile {
                windup: 0.25,
                strike: 0.1,
                recovery: 0.25,
            },
            kind: CombatKind::Ranged(RangedAttack {
                damage: 10,
                projectile_speed: 20.0,
                projectile_radius: 0.5,
                projectile_lifetime: 5.0,
                muzzle_offset: Vec3::new(0.0, 1.4, -0.6),
                trajectory: Trajectory::Straight,
                hit_mask: HitMask::PLAYERS,
            }),
        }
    }

    /// Ranged lobber (баллистическая дуга)
    pub fn lobber() -> Self {
        let mut variant = Self::ranged();
        if let CombatKind::Ranged(ranged) = &mut variant.kind {
            ranged.projectile_speed = 14.0;
            ranged.trajectory = Trajectory::Ballistic { gravity: 9.81 };
        }
        variant
    }

    pub fn can_attack(&self, now: f32) -> bool {
        self.cooldown.can_attack(now)
    }

    pub fn mark_attacked(&mut self, now: f32) {
        self.cooldown.mark_attacked(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_allows_immediate_first_attack() {
        let cd = AttackCooldown::new(1.5);
        assert!(cd.can_attack(0.0));
    }

    #[test]
    fn test_cooldown_boundary_is_exact() {
        let mut cd = AttackCooldown::new(1.5);
        cd.mark_attacked(10.0);

        assert!(!cd.can_attack(10.0));
        assert!(!cd.can_attack(11.499));
        // Истинно РОВНО на границе
        assert!(cd.can_attack(11.5));
        assert!(cd.can_attack(12.0));
    }

    #[test]
    fn test_mark_attacked_overwrites() {
        let mut cd = AttackCooldown::new(1.0);
        cd.mark_attacked(5.0);
        cd.mark_attacked(7.0);
        assert_eq!(cd.last_attack(), 7.0);
        assert!(!cd.can_attack(7.5));
        assert!(cd.can_attack(8.0));
    }

    #[test]
    fn test_swing_profile_total() {
        let swing = CombatVariant::melee().swing;
        assert!((swing.total() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_variant_constructors() {
        assert!(matches!(CombatVariant::melee().kind, CombatKind::Melee(_)));
        assert!(matches!(CombatVariant::ranged().kind, CombatKind::Ranged(_)));
        let CombatKind::Ranged(lob) = CombatVariant::lobber().kind else {
            panic!("lobber must be ranged");
        };
        assert!(matches!(lob.trajectory, Trajectory::Ballistic { .. }));
    }
}
