//! Баллистический solve для launch velocity.
//!
//! Из двух валидных углов детерминированно выбирается низкий (flatter) —
//! иначе lob/прямая дуга выбирались бы неоднозначно. Недостижимая цель
//! (отрицательный дискриминант) деградирует в прямой выстрел, не в ошибку.

use bevy::prelude::*;

/// Launch velocity для снаряда со скоростью `speed` под гравитацией `gravity`.
///
/// Решение по низкой дуге:
/// `disc = s⁴ − g·(g·h² + 2·v·s²)`;
/// `θ = atan((s² − √disc) / (g·h))`;
/// `velocity = horizontal_dir·cosθ·s + up·sinθ·s`.
///
/// Деградация в прямой выстрел: `disc < 0` (цель вне досягаемости на этой
/// скорости), вырожденная горизонталь (цель прямо над/под нами) или
/// нулевая гравитация.
pub fn launch_velocity(speed: f32, gravity: f32, origin: Vec3, target: Vec3) -> Vec3 {
    let delta = target - origin;
    let flat = Vec3::new(delta.x, 0.0, delta.z);
    let h = flat.length();
    let v = delta.y;

    if h < 1e-4 || gravity <= 0.0 {
        return straight_shot(delta, speed);
    }

    let s2 = speed * speed;
    let disc = s2 * s2 - gravity * (gravity * h * h + 2.0 * v * s2);
    if disc < 0.0 {
        return straight_shot(delta, speed);
    }

    let theta = ((s2 - disc.sqrt()) / (gravity * h)).atan();
    let horizontal_dir = flat / h;
    horizontal_dir * theta.cos() * speed + Vec3::Y * theta.sin() * speed
}

/// Прямой выстрел вдоль линии на цель
pub fn straight_shot(delta: Vec3, speed: f32) -> Vec3 {
    delta.normalize_or_zero() * speed
}
