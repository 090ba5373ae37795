//! Утилиты симуляции

pub mod timer;

pub use timer::ScopedTimer;
