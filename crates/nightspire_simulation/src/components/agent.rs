//! Базовые компоненты агентов: Agent, Health, hit layers, config.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::detection::DetectionRanges;

/// Hostile agent marker (owns a behavior state machine)
///
/// Required components добавляют Health, NavAgent, AnimationSink автоматически.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health, crate::navigation::NavAgent, crate::components::AnimationSink)]
pub struct Agent {
    /// Stable faction ID (friendly fire filtering)
    pub faction_id: u64,
}

/// Запас прочности живых entity (агенты и их цель)
///
/// `current` держится в `[0, max]`: урон вычитается saturating,
/// лечение клампится к `max`.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = (self.current + amount).min(self.max);
    }
}

/// Hit category layer (какой категории принадлежит entity)
///
/// Spatial queries фильтруют цели через `HitMask::contains`.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct HitLayer(pub u32);

pub mod layers {
    pub const PLAYER: u32 = 1 << 0;
    pub const AGENT: u32 = 1 << 1;
}

/// Bitmask категорий, которые атака может поразить
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub struct HitMask(pub u32);

impl HitMask {
    pub const NONE: HitMask = HitMask(0);
    pub const PLAYERS: HitMask = HitMask(layers::PLAYER);

    pub fn contains(self, layer: HitLayer) -> bool {
        self.0 & layer.0 != 0
    }
}

/// Ошибки валидации конфигурации агента
#[derive(Debug, Error, PartialEq)]
pub enum AgentConfigError {
    /// Инвариант: detection ≥ chase ≥ attack
    #[error("range ordering violated: detection {detection} >= chase {chase} >= attack {attack} required")]
    RangeOrdering {
        detection: f32,
        chase: f32,
        attack: f32,
    },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
}

/// Параметры micro-search (осмотр на waypoint'е)
#[derive(Debug, Clone, Reflect, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Длительность паузы на waypoint'е (секунды)
    pub duration: f32,
    /// Интервал между случайными поворотами головы (min, max секунды)
    pub look_interval: (f32, f32),
    /// Радиус коротких разведочных перемещений вокруг waypoint'а
    pub wander_radius: f32,
    /// Шанс разведочного перемещения за тик
    pub wander_chance: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            duration: 4.0,
            look_interval: (1.2, 2.5),
            wander_radius: 5.0,
            wander_chance: 0.005,
        }
    }
}

/// Конфигурация агента (archetype, загружается из данных)
///
/// Валидируется при спавне: `validate()` отклоняет нарушение инварианта
/// detection ≥ chase ≥ attack вместо тихого clamping.
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct AgentConfig {
    pub patrol_speed: f32,
    pub chase_speed: f32,
    /// Скорость поворота (slerp rate, 1/сек)
    pub rotation_speed: f32,
    /// Порог угла (радианы), выше которого chase замедляется для разворота
    pub turn_slowdown_angle: f32,
    pub ranges: DetectionRanges,
    pub search: SearchConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            patrol_speed: 3.0,
            chase_speed: 6.0,
            rotation_speed: 5.0,
            turn_slowdown_angle: std::f32::consts::FRAC_PI_4,
            ranges: DetectionRanges {
                detection: 20.0,
                chase: 12.0,
                attack: 2.5,
            },
            search: SearchConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), AgentConfigError> {
        self.ranges.validate()?;

        for (field, value) in [
            ("patrol_speed", self.patrol_speed),
            ("chase_speed", self.chase_speed),
            ("rotation_speed", self.rotation_speed),
            ("search.duration", self.search.duration),
        ] {
            if value <= 0.0 {
                return Err(AgentConfigError::NonPositive { field, value });
            }
        }

        Ok(())
    }
}
