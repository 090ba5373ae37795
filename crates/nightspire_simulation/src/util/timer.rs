//! Scoped cancellable timer для deferred эффектов.
//!
//! Все отложенные действия в симуляции — elapsed-time счётчики, не
//! блокирующие ожидания. `start` на уже идущем таймере ОТМЕНЯЕТ прошлый
//! запуск: два таймера никогда не гонятся за одним ресурсом.

use bevy::prelude::*;

/// Одноразовый countdown; повторный `start` отменяет предыдущий запуск
#[derive(Debug, Clone, Default, Reflect)]
pub struct ScopedTimer {
    remaining: Option<f32>,
}

impl ScopedTimer {
    pub fn started(duration: f32) -> Self {
        Self {
            remaining: Some(duration),
        }
    }

    /// Запустить; прошлый запуск (если был) отменяется
    pub fn start(&mut self, duration: f32) {
        self.remaining = Some(duration);
    }

    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    pub fn pending(&self) -> bool {
        self.remaining.is_some()
    }

    /// Tick; true ровно один раз на запуск — в момент истечения
    pub fn tick(&mut self, delta: f32) -> bool {
        let Some(remaining) = &mut self.remaining else {
            return false;
        };
        *remaining -= delta;
        if *remaining <= 0.0 {
            self.remaining = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_exactly_once() {
        let mut timer = ScopedTimer::started(0.1);
        assert!(!timer.tick(0.05));
        assert!(timer.tick(0.06));
        // После срабатывания — ничего
        assert!(!timer.tick(1.0));
        assert!(!timer.pending());
    }

    #[test]
    fn test_restart_cancels_previous_run() {
        let mut timer = ScopedTimer::started(1.0);
        timer.tick(0.9);

        // Новый запуск отменяет старый: старый дедлайн не срабатывает
        timer.start(1.0);
        assert!(!timer.tick(0.9));
        assert!(timer.tick(0.2));
    }

    #[test]
    fn test_cancel_discards_pending() {
        let mut timer = ScopedTimer::started(0.5);
        timer.cancel();
        assert!(!timer.pending());
        assert!(!timer.tick(10.0));
    }

    #[test]
    fn test_idle_timer_never_fires() {
        let mut timer = ScopedTimer::default();
        assert!(!timer.tick(100.0));
    }
}
