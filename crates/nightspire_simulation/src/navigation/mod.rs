//! Навигационный collaborator (headless stand-in).
//!
//! Архитектура:
//! - Поведенческие системы пишут high-level команды в `NavAgent`
//!   (destination, speed, stop flag) — контракт внешнего pathfinding агента
//! - `drive_nav_agents` выполняет straight-line locomotion в FixedUpdate:
//!   замена полноценному navmesh pathfinding'у в headless режиме
//! - `NavBounds` валидирует sampled точки (аналог navmesh sample query)
//!
//! Pathfinding алгоритм сознательно вне scope — контракт совпадает,
//! реализация может быть заменена на настоящую навигацию без изменения AI.

use bevy::prelude::*;

use crate::components::Health;
use crate::SimSet;

/// Навигационный агент (контракт внешнего pathfinding collaborator'а)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct NavAgent {
    /// Скорость движения (м/с), задаётся состоянием (patrol/chase)
    pub speed: f32,
    /// Скорость поворота к направлению движения (slerp rate, 1/сек)
    pub turn_speed: f32,
    /// Дистанция, на которой агент считается прибывшим
    pub stopping_distance: f32,
    /// Принудительная остановка (destination сохраняется)
    pub is_stopped: bool,
    /// Агент сам поворачивается по направлению движения
    pub update_rotation: bool,
    /// Текущая скорость (м/с), пишется locomotion системой
    pub velocity: Vec3,
    /// Путь ещё вычисляется (один тик после set_destination)
    pub path_pending: bool,
    /// Остаток пути до destination (пишется locomotion системой)
    pub remaining: f32,
    destination: Option<Vec3>,
}

impl Default for NavAgent {
    fn default() -> Self {
        Self {
            speed: 3.0,
            turn_speed: 8.0,
            stopping_distance: 0.5,
            is_stopped: false,
            update_rotation: true,
            velocity: Vec3::ZERO,
            path_pending: false,
            destination: None,
            remaining: 0.0,
        }
    }
}

impl NavAgent {
    pub fn set_destination(&mut self, point: Vec3) {
        self.destination = Some(point);
        self.path_pending = true;
        self.remaining = f32::INFINITY;
    }

    /// Обновить destination движущейся цели.
    ///
    /// Repath threshold 1m: маленькие сдвиги цели не перезапускают
    /// вычисление пути (иначе преследование теряло бы тик на каждый repath).
    pub fn update_destination(&mut self, point: Vec3) {
        match self.destination {
            Some(current) if current.distance(point) < 1.0 => {
                self.destination = Some(point);
            }
            _ => self.set_destination(point),
        }
    }

    pub fn reset_path(&mut self) {
        self.destination = None;
        self.path_pending = false;
        self.remaining = 0.0;
        self.velocity = Vec3::ZERO;
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    pub fn remaining_distance(&self) -> f32 {
        self.remaining
    }

    /// Прибыли: путь вычислен и остаток пути внутри stopping distance
    pub fn has_arrived(&self) -> bool {
        self.destination.is_some() && !self.path_pending && self.remaining <= self.stopping_distance
    }
}

/// Границы проходимого мира (аналог navmesh sample query)
#[derive(Resource, Debug, Clone, Copy)]
pub struct NavBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for NavBounds {
    fn default() -> Self {
        Self {
            min: Vec3::new(-100.0, 0.0, -100.0),
            max: Vec3::new(100.0, 0.0, 100.0),
        }
    }
}

impl NavBounds {
    /// Валидирует точку как navigable; Y проецируется на уровень земли.
    /// None если точка вне проходимой области.
    pub fn sample_navigable(&self, point: Vec3) -> Option<Vec3> {
        if point.x < self.min.x || point.x > self.max.x || point.z < self.min.z || point.z > self.max.z
        {
            return None;
        }
        Some(Vec3::new(point.x, self.min.y, point.z))
    }
}

/// Система: headless locomotion
///
/// Двигает Transform к destination со скоростью `speed`, обновляет
/// velocity/remaining, поворачивает по направлению движения при
/// `update_rotation`. Мёртвые агенты замирают на месте.
pub fn drive_nav_agents(
    mut query: Query<(&mut Transform, &mut NavAgent, Option<&Health>)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (mut transform, mut nav, health) in query.iter_mut() {
        if health.is_some_and(|h| !h.is_alive()) {
            nav.velocity = Vec3::ZERO;
            continue;
        }

        let Some(dest) = nav.destination else {
            nav.velocity = Vec3::ZERO;
            continue;
        };

        // Один тик "вычисления пути" после set_destination
        if nav.path_pending {
            nav.path_pending = false;
            let flat = dest - transform.translation;
            nav.remaining = Vec3::new(flat.x, 0.0, flat.z).length();
            continue;
        }

        let to_dest = dest - transform.translation;
        let flat = Vec3::new(to_dest.x, 0.0, to_dest.z);
        nav.remaining = flat.length();

        if nav.is_stopped || nav.remaining <= nav.stopping_distance {
            nav.velocity = Vec3::ZERO;
            continue;
        }

        let dir = flat / nav.remaining;
        let step = (nav.speed * delta).min(nav.remaining);
        transform.translation += dir * step;
        nav.remaining -= step;
        nav.velocity = dir * nav.speed;

        if nav.update_rotation {
            let target = Transform::default().looking_to(dir, Vec3::Y).rotation;
            let t = (nav.turn_speed * delta).min(1.0);
            transform.rotation = transform.rotation.slerp(target, t);
        }
    }
}

pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavBounds>()
            .add_systems(FixedUpdate, drive_nav_agents.in_set(SimSet::Navigation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(transform: &mut Transform, nav: &mut NavAgent, delta: f32) {
        // Ручной эквивалент drive_nav_agents для одного агента
        let Some(dest) = nav.destination else {
            nav.velocity = Vec3::ZERO;
            return;
        };
        if nav.path_pending {
            nav.path_pending = false;
            let flat = dest - transform.translation;
            nav.remaining = Vec3::new(flat.x, 0.0, flat.z).length();
            return;
        }
        let to_dest = dest - transform.translation;
        let flat = Vec3::new(to_dest.x, 0.0, to_dest.z);
        nav.remaining = flat.length();
        if nav.is_stopped || nav.remaining <= nav.stopping_distance {
            nav.velocity = Vec3::ZERO;
            return;
        }
        let dir = flat / nav.remaining;
        let step = (nav.speed * delta).min(nav.remaining);
        transform.translation += dir * step;
        nav.remaining -= step;
        nav.velocity = dir * nav.speed;
    }

    #[test]
    fn test_path_pending_clears_after_one_tick() {
        let mut nav = NavAgent::default();
        let mut transform = Transform::default();
        nav.set_destination(Vec3::new(10.0, 0.0, 0.0));
        assert!(nav.path_pending);

        tick(&mut transform, &mut nav, 1.0 / 60.0);
        assert!(!nav.path_pending);
        assert_eq!(transform.translation, Vec3::ZERO); // ещё не двигались
    }

    #[test]
    fn test_agent_reaches_destination() {
        let mut nav = NavAgent {
            speed: 5.0,
            ..Default::default()
        };
        let mut transform = Transform::default();
        nav.set_destination(Vec3::new(3.0, 0.0, 0.0));

        for _ in 0..120 {
            tick(&mut transform, &mut nav, 1.0 / 60.0);
        }
        assert!(nav.has_arrived());
        assert!(nav.remaining_distance() <= nav.stopping_distance);
    }

    #[test]
    fn test_stopped_agent_does_not_move() {
        let mut nav = NavAgent::default();
        let mut transform = Transform::default();
        nav.set_destination(Vec3::new(10.0, 0.0, 0.0));
        nav.is_stopped = true;

        for _ in 0..10 {
            tick(&mut transform, &mut nav, 1.0 / 60.0);
        }
        assert_eq!(transform.translation, Vec3::ZERO);
        assert_eq!(nav.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_bounds_sampling() {
        let bounds = NavBounds::default();
        assert!(bounds.sample_navigable(Vec3::new(5.0, 3.0, 5.0)).is_some());
        assert!(bounds.sample_navigable(Vec3::new(500.0, 0.0, 0.0)).is_none());
        // Y проецируется на землю
        let sampled = bounds.sample_navigable(Vec3::new(1.0, 7.0, 1.0)).unwrap();
        assert_eq!(sampled.y, 0.0);
    }
}
