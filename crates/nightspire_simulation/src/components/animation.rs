//! Animation sink — параметры для внешнего animation playback.
//!
//! Архитектура:
//! - ECS системы пишут named параметры (float/bool/trigger)
//! - Внешний playback слой (рендер-клиент) читает и проигрывает клипы
//! - Playback состояние (current tag, transition flag) пишется обратно сюда
//!
//! Headless симуляция использует sink и как запись, и как playback stand-in:
//! attack swing выставляет tag "attack" на время фаз.

use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

/// Приёмник анимационных параметров (контракт внешнего Animator'а)
#[derive(Component, Debug, Clone, Default)]
pub struct AnimationSink {
    floats: HashMap<String, f32>,
    bools: HashMap<String, bool>,
    triggers: HashSet<String>,
    /// Tag текущего playback клипа (например "attack")
    pub current_tag: Option<String>,
    /// Playback находится в cross-fade переходе
    pub in_transition: bool,
}

impl AnimationSink {
    pub fn set_float(&mut self, name: &str, value: f32) {
        self.floats.insert(name.to_owned(), value);
    }

    /// Smoothed float write (exponential damp, как movement speed параметр)
    pub fn set_float_smoothed(&mut self, name: &str, target: f32, rate: f32, delta: f32) {
        let current = self.float(name);
        let t = (rate * delta).min(1.0);
        self.floats.insert(name.to_owned(), current + (target - current) * t);
    }

    pub fn float(&self, name: &str) -> f32 {
        self.floats.get(name).copied().unwrap_or(0.0)
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.bools.insert(name.to_owned(), value);
    }

    pub fn bool(&self, name: &str) -> bool {
        self.bools.get(name).copied().unwrap_or(false)
    }

    pub fn set_trigger(&mut self, name: &str) {
        self.triggers.insert(name.to_owned());
    }

    pub fn reset_trigger(&mut self, name: &str) {
        self.triggers.remove(name);
    }

    /// Потребить trigger (playback слой забирает его ровно один раз)
    pub fn take_trigger(&mut self, name: &str) -> bool {
        self.triggers.remove(name)
    }

    /// Принадлежит ли текущий playback указанному tag'у
    pub fn is_tag(&self, tag: &str) -> bool {
        self.current_tag.as_deref() == Some(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_defaults_to_zero() {
        let sink = AnimationSink::default();
        assert_eq!(sink.float("speed"), 0.0);
    }

    #[test]
    fn test_smoothed_float_approaches_target() {
        let mut sink = AnimationSink::default();
        sink.set_float_smoothed("speed", 10.0, 10.0, 0.05);
        let first = sink.float("speed");
        assert!(first > 0.0 && first < 10.0);

        sink.set_float_smoothed("speed", 10.0, 10.0, 0.05);
        assert!(sink.float("speed") > first);
    }

    #[test]
    fn test_trigger_consumed_once() {
        let mut sink = AnimationSink::default();
        sink.set_trigger("attack");
        assert!(sink.take_trigger("attack"));
        assert!(!sink.take_trigger("attack"));
    }

    #[test]
    fn test_reset_trigger_clears_pending() {
        let mut sink = AnimationSink::default();
        sink.set_trigger("attack");
        sink.reset_trigger("attack");
        assert!(!sink.take_trigger("attack"));
    }

    #[test]
    fn test_bool_defaults_false_and_persists() {
        let mut sink = AnimationSink::default();
        assert!(!sink.bool("in_combat"));
        sink.set_bool("in_combat", true);
        assert!(sink.bool("in_combat"));
        sink.set_bool("in_combat", false);
        assert!(!sink.bool("in_combat"));
    }

    #[test]
    fn test_tag_query() {
        let mut sink = AnimationSink::default();
        assert!(!sink.is_tag("attack"));
        sink.current_tag = Some("attack".into());
        assert!(sink.is_tag("attack"));
    }
}
