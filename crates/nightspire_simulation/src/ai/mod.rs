//! AI подсистема: детекция + машина поведения агента.
//!
//! Машина — enum-компонент `BehaviorState` (Patrol / Chase / Attack) с
//! явными enter/exit хуками на переходах. Детекция — три концентрических
//! радиуса, читаемых заново каждый tick: гистерезис в структуре правил
//! (detection ≥ chase ≥ attack), без временнЫх порогов.

use bevy::prelude::*;

pub mod detection;
pub mod state;
pub mod systems;

pub use detection::{Detection, DetectionRanges};
pub use state::{switch_state, BehaviorCtx, BehaviorState, PatrolRoute, SearchPause, StepResult};

use crate::SimSet;

/// Единственная отслеживаемая цель симуляции.
///
/// `None` → для всех агентов сигналы детекции false (Patrol).
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct PrimaryTarget(pub Option<Entity>);

pub struct BehaviorPlugin;

impl Plugin for BehaviorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PrimaryTarget>();

        app.add_systems(
            FixedUpdate,
            (systems::enter_initial_states, systems::behavior_update)
                .chain()
                .in_set(SimSet::Behavior),
        );
    }
}
