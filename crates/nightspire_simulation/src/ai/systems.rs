//! Behavior машина: tick системы.
//!
//! Поток за тик: детекция обновляется → текущее состояние update'ится
//! (может запросить переход) → переход исполняется (exit старого полностью
//! до enter нового) → movement-derived параметры уходят в animation sink.

use bevy::prelude::*;

use crate::ai::detection::Detection;
use crate::ai::state::{enter_state, switch_state, BehaviorCtx, BehaviorState, PatrolRoute};
use crate::ai::PrimaryTarget;
use crate::combat::{AttackSwing, CombatVariant};
use crate::components::{Agent, AgentConfig, AnimationSink, Health};
use crate::navigation::{NavAgent, NavBounds};
use crate::DeterministicRng;

/// Система: enter начального состояния для только что заспавненных агентов
///
/// Машина никогда не существует без состояния: Patrol назначается при
/// спавне, а его enter (скорость, первый waypoint) исполняется здесь,
/// до первого update'а.
pub fn enter_initial_states(
    mut agents: Query<
        (
            Entity,
            &mut BehaviorState,
            &mut Transform,
            &mut NavAgent,
            &mut AnimationSink,
            &mut PatrolRoute,
            &mut CombatVariant,
            &AgentConfig,
        ),
        (Added<BehaviorState>, With<Agent>),
    >,
    bounds: Res<NavBounds>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
) {
    for (entity, mut state, mut transform, mut nav, mut anim, mut route, mut combat, config) in
        agents.iter_mut()
    {
        let mut ctx = BehaviorCtx {
            transform: &mut transform,
            nav: &mut nav,
            anim: &mut anim,
            route: &mut route,
            combat: &mut combat,
            config,
            bounds: &bounds,
            rng: &mut rng.rng,
            detection: Detection::NONE,
            target_pos: None,
            target_alive: false,
            mid_swing: false,
            now: time.elapsed_secs(),
            delta: time.delta_secs(),
        };
        enter_state(&mut state, &mut ctx);
        crate::logger::log(&format!("FSM: {:?} spawned in {}", entity, state.kind()));
    }
}

/// Система: tick машины поведения
///
/// Мёртвый агент замирает: update — no-op до despawn'а трупа.
pub fn behavior_update(
    mut agents: Query<
        (
            Entity,
            &mut BehaviorState,
            &mut Transform,
            &mut NavAgent,
            &mut AnimationSink,
            &mut PatrolRoute,
            &mut CombatVariant,
            &AgentConfig,
            &Health,
            Option<&AttackSwing>,
        ),
        With<Agent>,
    >,
    primary: Res<PrimaryTarget>,
    // Цель — не агент; Without даёт дизъюнктность с &mut Transform агентов
    targets: Query<(&Transform, &Health), Without<Agent>>,
    bounds: Res<NavBounds>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
) {
    let now = time.elapsed_secs();
    let delta = time.delta_secs();

    // Один отслеживаемый target на симуляцию; отсутствует → сигналы false
    let (target_pos, target_alive) = match primary.0.and_then(|e| targets.get(e).ok()) {
        Some((transform, health)) => (Some(transform.translation), health.is_alive()),
        None => (None, false),
    };

    for (entity, mut state, mut transform, mut nav, mut anim, mut route, mut combat, config, health, swing) in
        agents.iter_mut()
    {
        if !health.is_alive() {
            continue;
        }

        let detection = config
            .ranges
            .evaluate(transform.translation, target_pos, target_alive);

        let mut ctx = BehaviorCtx {
            transform: &mut transform,
            nav: &mut nav,
            anim: &mut anim,
            route: &mut route,
            combat: &mut combat,
            config,
            bounds: &bounds,
            rng: &mut rng.rng,
            detection,
            target_pos,
            target_alive,
            mid_swing: swing.is_some(),
            now,
            delta,
        };

        let step = state.update(&mut ctx);

        if let Some(next) = step.transition {
            crate::logger::log(&format!(
                "FSM: {:?} {} -> {}",
                entity,
                state.kind(),
                next.kind()
            ));
            switch_state(&mut state, next, &mut ctx);
        }

        if step.start_swing {
            ctx.anim.current_tag = Some("attack".into());
            // Cross-fade в attack клип идёт, пока не началась strike фаза
            ctx.anim.in_transition = true;
            commands
                .entity(entity)
                .insert(AttackSwing::begin(&ctx.combat.swing));
        }

        // Movement-derived параметры для анимации
        ctx.anim
            .set_bool("in_combat", !matches!(&*state, BehaviorState::Patrol { .. }));
        let speed = ctx.nav.velocity.length();
        ctx.anim.set_float_smoothed("speed", speed, 10.0, delta);
        let turn = if speed > 1e-3 {
            let facing: Vec3 = *ctx.transform.forward();
            facing.angle_between(ctx.nav.velocity)
        } else {
            0.0
        };
        ctx.anim.set_float("turn", turn);
    }
}
