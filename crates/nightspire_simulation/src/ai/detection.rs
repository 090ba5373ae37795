//! Distance-based детекция цели.
//!
//! Три концентрических порога: detection ≥ chase ≥ attack.
//! Никакого hysteresis band на этом слое — устойчивость к flapping'у даёт
//! сама структура state graph'а (Attack отпускает цель на 1.2 × attack range).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::agent::AgentConfigError;

/// Пороговые дистанции агента
///
/// Инвариант detection ≥ chase ≥ attack проверяется в `validate()`
/// при конфигурации, не в рантайме.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct DetectionRanges {
    /// Радиус осведомлённости (агент "насторожился")
    pub detection: f32,
    /// Радиус преследования
    pub chase: f32,
    /// Радиус атаки
    pub attack: f32,
}

impl DetectionRanges {
    pub fn new(detection: f32, chase: f32, attack: f32) -> Result<Self, AgentConfigError> {
        let ranges = Self {
            detection,
            chase,
            attack,
        };
        ranges.validate()?;
        Ok(ranges)
    }

    pub fn validate(&self) -> Result<(), AgentConfigError> {
        if self.detection < self.chase || self.chase < self.attack || self.attack < 0.0 {
            return Err(AgentConfigError::RangeOrdering {
                detection: self.detection,
                chase: self.chase,
                attack: self.attack,
            });
        }
        Ok(())
    }

    /// Оценка сигналов за тик. Отсутствующая или мёртвая цель → все false.
    pub fn evaluate(&self, agent_pos: Vec3, target_pos: Option<Vec3>, target_alive: bool) -> Detection {
        let Some(target_pos) = target_pos else {
            return Detection::NONE;
        };
        if !target_alive {
            return Detection::NONE;
        }

        let distance = agent_pos.distance(target_pos);
        Detection {
            detected: distance <= self.detection,
            in_chase_range: distance <= self.chase,
            in_attack_range: distance <= self.attack,
        }
    }
}

/// Транзиентный результат детекции (живёт один тик, не персистится)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Detection {
    pub detected: bool,
    pub in_chase_range: bool,
    pub in_attack_range: bool,
}

impl Detection {
    pub const NONE: Detection = Detection {
        detected: false,
        in_chase_range: false,
        in_attack_range: false,
    };
}
