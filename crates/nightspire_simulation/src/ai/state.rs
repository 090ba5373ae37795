//! Behavior state machine: Patrol / Chase / Attack.
//!
//! Состояния — tagged variants с per-instance данными в полях варианта.
//! Данные варианта эфемерны (пересоздаются на каждый переход); курсор
//! патрульного маршрута живёт на персистентном `PatrolRoute`, поэтому бой
//! не сбрасывает маршрут (см. DESIGN.md).
//!
//! Гарантия перехода: exit старого состояния полностью завершается до
//! enter нового, без частичного перекрытия. Переход в состояние того же
//! вида допустим и заново исполняет enter.

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::ai::detection::Detection;
use crate::combat::CombatVariant;
use crate::components::{AgentConfig, AnimationSink, SearchConfig};
use crate::navigation::{NavAgent, NavBounds};

/// Патрульный маршрут агента (персистентный, в отличие от state данных)
///
/// Пустой маршрут → spawn позиция (`home`) выступает единственным waypoint'ом.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct PatrolRoute {
    pub waypoints: Vec<Vec3>,
    pub cursor: usize,
    /// Spawn позиция агента
    pub home: Vec3,
}

impl PatrolRoute {
    pub fn new(waypoints: Vec<Vec3>, home: Vec3) -> Self {
        Self {
            waypoints,
            cursor: 0,
            home,
        }
    }

    /// Следующий waypoint (wrapping modulo), сдвигает курсор
    pub fn advance(&mut self) -> Vec3 {
        if self.waypoints.is_empty() {
            return self.home;
        }
        self.cursor = (self.cursor + 1) % self.waypoints.len();
        self.waypoints[self.cursor]
    }

    /// Текущий waypoint без сдвига курсора
    pub fn current(&self) -> Vec3 {
        if self.waypoints.is_empty() {
            self.home
        } else {
            self.waypoints[self.cursor]
        }
    }
}

/// Micro-search: bounded пауза на waypoint'е со случайными осмотрами
///
/// Живёт только внутри активного Patrol варианта.
#[derive(Debug, Clone, Reflect)]
pub struct SearchPause {
    /// Остаток окна ожидания (секунды)
    pub remaining: f32,
    /// До следующей смены случайного yaw
    pub look_timer: f32,
    /// Текущий целевой yaw осмотра (радианы)
    pub target_yaw: f32,
    /// Waypoint, вокруг которого осматриваемся
    pub anchor: Vec3,
}

impl SearchPause {
    pub fn begin(anchor: Vec3, config: &SearchConfig, rng: &mut ChaCha8Rng) -> Self {
        let (lo, hi) = config.look_interval;
        Self {
            remaining: config.duration,
            look_timer: rng.gen_range(lo..hi),
            target_yaw: rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI),
            anchor,
        }
    }
}

/// Активное состояние машины поведения (ровно одно на агента)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub enum BehaviorState {
    /// Обход маршрута + micro-search на waypoint'ах
    Patrol {
        /// Активная пауза осмотра (None = в пути к waypoint'у)
        search: Option<SearchPause>,
    },
    /// Преследование цели
    Chase,
    /// Бой на месте, атаки через CombatVariant
    Attack,
}

impl Default for BehaviorState {
    fn default() -> Self {
        Self::Patrol { search: None }
    }
}

impl BehaviorState {
    pub fn patrol() -> Self {
        Self::Patrol { search: None }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BehaviorState::Patrol { .. } => "Patrol",
            BehaviorState::Chase => "Chase",
            BehaviorState::Attack => "Attack",
        }
    }
}

/// Per-tick контекст состояния (собирается `behavior_update` системой)
pub struct BehaviorCtx<'a> {
    pub transform: &'a mut Transform,
    pub nav: &'a mut NavAgent,
    pub anim: &'a mut AnimationSink,
    pub route: &'a mut PatrolRoute,
    pub combat: &'a mut CombatVariant,
    pub config: &'a AgentConfig,
    pub bounds: &'a NavBounds,
    pub rng: &'a mut ChaCha8Rng,
    /// Сигналы детекции этого тика
    pub detection: Detection,
    pub target_pos: Option<Vec3>,
    pub target_alive: bool,
    /// Attack swing в процессе (агент "mid-attack-animation")
    pub mid_swing: bool,
    /// Монотонное время симуляции (секунды)
    pub now: f32,
    pub delta: f32,
}

/// Результат update'а состояния за тик
#[derive(Debug, Default)]
pub struct StepResult {
    /// Запрошенный переход (exit+enter исполнит switch_state)
    pub transition: Option<BehaviorState>,
    /// Начать attack swing (windup → strike → recovery)
    pub start_swing: bool,
}

impl StepResult {
    pub fn stay() -> Self {
        Self::default()
    }

    pub fn to(state: BehaviorState) -> Self {
        Self {
            transition: Some(state),
            start_swing: false,
        }
    }
}

impl BehaviorState {
    /// Tick текущего состояния. Переходы НЕ применяются здесь —
    /// caller зовёт `switch_state` с результатом.
    pub fn update(&mut self, ctx: &mut BehaviorCtx) -> StepResult {
        match self {
            BehaviorState::Patrol { search } => update_patrol(search, ctx),
            BehaviorState::Chase => update_chase(ctx),
            BehaviorState::Attack => update_attack(ctx),
        }
    }
}

/// Переход: exit старого состояния завершается полностью до enter нового.
/// Повторный вход в состояние того же вида не special-case'ится.
pub fn switch_state(state: &mut BehaviorState, next: BehaviorState, ctx: &mut BehaviorCtx) {
    exit_state(state, ctx);
    *state = next;
    enter_state(state, ctx);
}

pub(crate) fn enter_state(state: &mut BehaviorState, ctx: &mut BehaviorCtx) {
    match state {
        BehaviorState::Patrol { search } => {
            *search = None;
            ctx.nav.speed = ctx.config.patrol_speed;
            ctx.nav.stopping_distance = 0.5;
            ctx.nav.is_stopped = false;
            ctx.nav.update_rotation = true;
            let next_waypoint = ctx.route.advance();
            ctx.nav.set_destination(next_waypoint);
        }
        BehaviorState::Chase => {
            ctx.nav.speed = ctx.config.chase_speed;
            // Останавливаемся чуть внутри attack range
            ctx.nav.stopping_distance = ctx.config.ranges.attack * 0.9;
            ctx.nav.is_stopped = false;
            ctx.nav.update_rotation = true;
        }
        BehaviorState::Attack => {
            ctx.nav.is_stopped = true;
            // Агент сам доворачивается на цель
            ctx.nav.update_rotation = false;
            ctx.anim.reset_trigger("attack");
        }
    }
}

fn exit_state(state: &mut BehaviorState, ctx: &mut BehaviorCtx) {
    match state {
        BehaviorState::Patrol { .. } => {
            // Restore rotation-follow навигации
            ctx.nav.update_rotation = true;
            ctx.nav.is_stopped = false;
        }
        BehaviorState::Chase => {
            ctx.nav.reset_path();
        }
        BehaviorState::Attack => {
            ctx.nav.is_stopped = false;
            ctx.nav.update_rotation = true;
        }
    }
}

fn update_patrol(search: &mut Option<SearchPause>, ctx: &mut BehaviorCtx) -> StepResult {
    // 1. Живая цель в chase range → преследуем
    if ctx.detection.in_chase_range {
        return StepResult::to(BehaviorState::Chase);
    }

    // 2. Замечена, но вне chase range → настораживаемся на месте
    if ctx.detection.detected {
        ctx.nav.is_stopped = true;
        ctx.nav.update_rotation = false;
        *search = None;
        if let Some(target) = ctx.target_pos {
            look_toward(ctx.transform, target, ctx.config.rotation_speed, ctx.delta);
        }
        return StepResult::stay();
    }

    // 3. Обычный обход + micro-search
    ctx.nav.is_stopped = false;

    match search {
        None => {
            ctx.nav.update_rotation = true;
            if ctx.nav.has_arrived() {
                *search = Some(SearchPause::begin(ctx.route.current(), &ctx.config.search, ctx.rng));
            }
        }
        Some(pause) => {
            pause.remaining -= ctx.delta;

            if pause.remaining <= 0.0 {
                // Окно ожидания истекло → следующий основной waypoint
                *search = None;
                ctx.nav.update_rotation = true;
                let next_waypoint = ctx.route.advance();
                ctx.nav.set_destination(next_waypoint);
                return StepResult::stay();
            }

            // Случайные осмотры: новый yaw каждые 1.2–2.5 сек
            pause.look_timer -= ctx.delta;
            if pause.look_timer <= 0.0 {
                let (lo, hi) = ctx.config.search.look_interval;
                pause.look_timer = ctx.rng.gen_range(lo..hi);
                pause.target_yaw =
                    ctx.rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
            }

            ctx.nav.update_rotation = false;
            let target_rotation = Quat::from_rotation_y(pause.target_yaw);
            let t = (ctx.config.rotation_speed * ctx.delta).min(1.0);
            ctx.transform.rotation = ctx.transform.rotation.slerp(target_rotation, t);

            // Редкое разведочное перемещение, пока осталось > 1 сек окна
            if pause.remaining > 1.0 && ctx.rng.gen::<f32>() < ctx.config.search.wander_chance {
                let candidate =
                    random_point_around(pause.anchor, ctx.config.search.wander_radius, ctx.rng);
                if let Some(valid) = ctx.bounds.sample_navigable(candidate) {
                    ctx.nav.set_destination(valid);
                }
            }
        }
    }

    StepResult::stay()
}

fn update_chase(ctx: &mut BehaviorCtx) -> StepResult {
    // Цель потеряна или мертва → назад в патруль
    if !ctx.detection.detected {
        return StepResult::to(BehaviorState::patrol());
    }

    if ctx.detection.in_attack_range {
        return StepResult::to(BehaviorState::Attack);
    }

    // Цель убежала за chase range
    if !ctx.detection.in_chase_range {
        return StepResult::to(BehaviorState::patrol());
    }

    let Some(target) = ctx.target_pos else {
        return StepResult::to(BehaviorState::patrol());
    };

    ctx.nav.update_destination(target);

    // Разворот: при большом угле к направлению движения сбрасываем скорость,
    // чтобы не орбитить вокруг цели на полном ходу
    let to_target = target - ctx.transform.translation;
    let flat = Vec3::new(to_target.x, 0.0, to_target.z);
    if flat.length_squared() > 1e-6 {
        let facing: Vec3 = *ctx.transform.forward();
        let angle = facing.angle_between(flat.normalize());
        ctx.nav.speed = if angle > ctx.config.turn_slowdown_angle {
            ctx.config.chase_speed * 0.4
        } else {
            ctx.config.chase_speed
        };
    }

    StepResult::stay()
}

fn update_attack(ctx: &mut BehaviorCtx) -> StepResult {
    let Some(target) = ctx.target_pos else {
        return StepResult::to(BehaviorState::patrol());
    };
    if !ctx.target_alive {
        return StepResult::to(BehaviorState::patrol());
    }

    // Пока не мид-swing — плавно доворачиваемся на цель
    if !ctx.mid_swing {
        look_toward(ctx.transform, target, ctx.config.rotation_speed, ctx.delta);
    }

    // Цель вышла за attack range с запасом → догоняем.
    // Margin 1.2× и есть hysteresis: вход в Attack на 1.0×, выход на 1.2×.
    let distance = ctx.transform.translation.distance(target);
    if distance > ctx.config.ranges.attack * 1.2 && !ctx.mid_swing {
        return StepResult::to(BehaviorState::Chase);
    }

    if ctx.combat.can_attack(ctx.now) && !ctx.mid_swing {
        ctx.anim.set_trigger("attack");
        ctx.combat.mark_attacked(ctx.now);
        return StepResult {
            transition: None,
            start_swing: true,
        };
    }

    StepResult::stay()
}

/// Yaw-only плавный поворот к точке
pub fn look_toward(transform: &mut Transform, target: Vec3, rotation_speed: f32, delta: f32) {
    let mut direction = target - transform.translation;
    direction.y = 0.0;
    if direction.length_squared() < 1e-6 {
        return;
    }
    let target_rotation = Transform::default()
        .looking_to(direction.normalize(), Vec3::Y)
        .rotation;
    let t = (rotation_speed * delta).min(1.0);
    transform.rotation = transform.rotation.slerp(target_rotation, t);
}

/// Случайная точка в горизонтальном диске вокруг anchor'а
fn random_point_around(anchor: Vec3, radius: f32, rng: &mut ChaCha8Rng) -> Vec3 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    // sqrt для равномерного распределения по площади диска
    let r = radius * rng.gen::<f32>().sqrt();
    anchor + Vec3::new(angle.cos() * r, 0.0, angle.sin() * r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::detection::DetectionRanges;
    use rand::SeedableRng;

    /// Владелец компонентов для сборки ctx в тестах
    struct Rig {
        transform: Transform,
        nav: NavAgent,
        anim: AnimationSink,
        route: PatrolRoute,
        combat: CombatVariant,
        config: AgentConfig,
        bounds: NavBounds,
        rng: ChaCha8Rng,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                transform: Transform::default(),
                nav: NavAgent::default(),
                anim: AnimationSink::default(),
                route: PatrolRoute::new(
                    vec![
                        Vec3::new(10.0, 0.0, 0.0),
                        Vec3::new(10.0, 0.0, 10.0),
                        Vec3::new(0.0, 0.0, 10.0),
                    ],
                    Vec3::ZERO,
                ),
                combat: CombatVariant::melee(),
                config: AgentConfig {
                    ranges: DetectionRanges {
                        detection: 15.0,
                        chase: 12.0,
                        attack: 5.0,
                    },
                    ..Default::default()
                },
                bounds: NavBounds::default(),
                rng: ChaCha8Rng::seed_from_u64(7),
            }
        }

        fn ctx(&mut self, target_pos: Option<Vec3>, target_alive: bool, mid_swing: bool, now: f32) -> BehaviorCtx<'_> {
            let detection =
                self.config
                    .ranges
                    .evaluate(self.transform.translation, target_pos, target_alive);
            BehaviorCtx {
                transform: &mut self.transform,
                nav: &mut self.nav,
                anim: &mut self.anim,
                route: &mut self.route,
                combat: &mut self.combat,
                config: &self.config,
                bounds: &self.bounds,
                rng: &mut self.rng,
                detection,
                target_pos,
                target_alive,
                mid_swing,
                now,
                delta: 1.0 / 60.0,
            }
        }
    }

    #[test]
    fn test_patrol_to_chase_in_chase_range() {
        let mut rig = Rig::new();
        let mut state = BehaviorState::patrol();
        let step = state.update(&mut rig.ctx(Some(Vec3::new(10.0, 0.0, 0.0)), true, false, 0.0));
        assert!(matches!(step.transition, Some(BehaviorState::Chase)));
    }

    #[test]
    fn test_patrol_alert_holds_outside_chase_range() {
        let mut rig = Rig::new();
        let mut state = BehaviorState::patrol();
        // Дистанция 14: detected, но вне chase range 12
        let step = state.update(&mut rig.ctx(Some(Vec3::new(14.0, 0.0, 0.0)), true, false, 0.0));
        assert!(step.transition.is_none());
        assert!(rig.nav.is_stopped);
        assert!(!rig.nav.update_rotation);
    }

    #[test]
    fn test_patrol_ignores_dead_target() {
        let mut rig = Rig::new();
        let mut state = BehaviorState::patrol();
        let step = state.update(&mut rig.ctx(Some(Vec3::new(10.0, 0.0, 0.0)), false, false, 0.0));
        assert!(step.transition.is_none());
        assert!(!rig.nav.is_stopped);
    }

    #[test]
    fn test_chase_to_attack_within_attack_range() {
        let mut rig = Rig::new();
        let mut state = BehaviorState::Chase;
        let step = state.update(&mut rig.ctx(Some(Vec3::new(4.0, 0.0, 0.0)), true, false, 0.0));
        assert!(matches!(step.transition, Some(BehaviorState::Attack)));
    }

    #[test]
    fn test_chase_to_patrol_when_target_lost() {
        let mut rig = Rig::new();
        let mut state = BehaviorState::Chase;
        let step = state.update(&mut rig.ctx(Some(Vec3::new(30.0, 0.0, 0.0)), true, false, 0.0));
        assert!(matches!(step.transition, Some(BehaviorState::Patrol { .. })));
    }

    #[test]
    fn test_chase_to_patrol_when_target_escapes_chase_range() {
        let mut rig = Rig::new();
        let mut state = BehaviorState::Chase;
        // Дистанция 13: detected (≤15), но вне chase (>12)
        let step = state.update(&mut rig.ctx(Some(Vec3::new(13.0, 0.0, 0.0)), true, false, 0.0));
        assert!(matches!(step.transition, Some(BehaviorState::Patrol { .. })));
    }

    #[test]
    fn test_attack_to_chase_beyond_margin() {
        let mut rig = Rig::new();
        let mut state = BehaviorState::Attack;
        // 6.5 > 5.0 × 1.2
        let step = state.update(&mut rig.ctx(Some(Vec3::new(6.5, 0.0, 0.0)), true, false, 0.0));
        assert!(matches!(step.transition, Some(BehaviorState::Chase)));
    }

    #[test]
    fn test_attack_holds_within_margin() {
        let mut rig = Rig::new();
        rig.combat.mark_attacked(0.0); // cooldown не готов — чистая проверка дистанции
        let mut state = BehaviorState::Attack;
        // 5.5 ≤ 6.0 — внутри margin, остаёмся в Attack
        let step = state.update(&mut rig.ctx(Some(Vec3::new(5.5, 0.0, 0.0)), true, false, 0.1));
        assert!(step.transition.is_none());
        assert!(!step.start_swing);
    }

    #[test]
    fn test_attack_no_retreat_mid_swing() {
        let mut rig = Rig::new();
        let mut state = BehaviorState::Attack;
        let step = state.update(&mut rig.ctx(Some(Vec3::new(6.5, 0.0, 0.0)), true, true, 0.0));
        assert!(step.transition.is_none());
        assert!(!step.start_swing);
    }

    #[test]
    fn test_attack_to_patrol_on_dead_target() {
        let mut rig = Rig::new();
        let mut state = BehaviorState::Attack;
        let step = state.update(&mut rig.ctx(Some(Vec3::new(3.0, 0.0, 0.0)), false, false, 0.0));
        assert!(matches!(step.transition, Some(BehaviorState::Patrol { .. })));
    }

    #[test]
    fn test_attack_starts_swing_and_marks_cooldown() {
        let mut rig = Rig::new();
        let mut state = BehaviorState::Attack;

        let step = state.update(&mut rig.ctx(Some(Vec3::new(3.0, 0.0, 0.0)), true, false, 10.0));
        assert!(step.start_swing);
        assert!(rig.anim.take_trigger("attack"));
        assert_eq!(rig.combat.cooldown.last_attack(), 10.0);

        // Следующий тик: cooldown не готов, swing не стартует
        let step = state.update(&mut rig.ctx(Some(Vec3::new(3.0, 0.0, 0.0)), true, false, 10.5));
        assert!(!step.start_swing);
    }

    #[test]
    fn test_switch_same_kind_reruns_enter() {
        let mut rig = Rig::new();
        let mut state = BehaviorState::patrol();
        {
            let mut ctx = rig.ctx(None, false, false, 0.0);
            enter_state(&mut state, &mut ctx);
        }
        let first_cursor = rig.route.cursor;

        // Patrol → Patrol: enter обязан исполниться заново (курсор сдвигается)
        {
            let mut ctx = rig.ctx(None, false, false, 0.0);
            switch_state(&mut state, BehaviorState::patrol(), &mut ctx);
        }
        assert_ne!(rig.route.cursor, first_cursor);
        assert_eq!(rig.nav.destination(), Some(rig.route.current()));
    }

    #[test]
    fn test_route_resumes_after_combat_interruption() {
        let mut rig = Rig::new();
        let mut state = BehaviorState::patrol();
        {
            let mut ctx = rig.ctx(None, false, false, 0.0);
            enter_state(&mut state, &mut ctx);
        }
        let cursor_before = rig.route.cursor;

        // Patrol → Chase → Patrol (цель зашла и вышла)
        {
            let mut ctx = rig.ctx(Some(Vec3::new(10.0, 0.0, 0.0)), true, false, 0.0);
            switch_state(&mut state, BehaviorState::Chase, &mut ctx);
        }
        {
            let mut ctx = rig.ctx(None, false, false, 1.0);
            switch_state(&mut state, BehaviorState::patrol(), &mut ctx);
        }

        // Маршрут продолжился: сдвиг не более чем на один waypoint
        let skipped = (rig.route.cursor + rig.route.waypoints.len() - cursor_before)
            % rig.route.waypoints.len();
        assert!(skipped <= 1, "skipped {} waypoints", skipped);
    }

    #[test]
    fn test_chase_exit_resets_path_before_patrol_enter() {
        let mut rig = Rig::new();
        let mut state = BehaviorState::Chase;
        {
            let mut ctx = rig.ctx(Some(Vec3::new(8.0, 0.0, 0.0)), true, false, 0.0);
            enter_state(&mut state, &mut ctx);
            state.update(&mut ctx);
        }
        assert!(rig.nav.destination().is_some());

        {
            let mut ctx = rig.ctx(None, false, false, 1.0);
            switch_state(&mut state, BehaviorState::patrol(), &mut ctx);
        }
        // Patrol enter выдал новый destination (а не остаток chase пути)
        assert_eq!(rig.nav.destination(), Some(rig.route.current()));
        assert_eq!(rig.nav.speed, rig.config.patrol_speed);
        assert!(!rig.nav.is_stopped);
    }

    #[test]
    fn test_micro_search_wait_expiry_advances_waypoint() {
        let mut rig = Rig::new();
        let mut state = BehaviorState::patrol();
        {
            let mut ctx = rig.ctx(None, false, false, 0.0);
            enter_state(&mut state, &mut ctx);
        }
        let cursor_at_arrival = rig.route.cursor;

        // Прибытие: нав агент у waypoint'а
        rig.transform.translation = rig.route.current();
        rig.nav.set_destination(rig.route.current());
        // Path "вычислился", остаток нулевой
        rig.nav.path_pending = false;
        rig.nav.remaining = 0.0;
        {
            let mut ctx = rig.ctx(None, false, false, 0.0);
            let step = state.update(&mut ctx);
            assert!(step.transition.is_none());
        }
        let BehaviorState::Patrol { search: Some(_) } = &state else {
            panic!("expected micro-search to begin at waypoint");
        };

        // Прогоняем окно ожидания до конца
        for _ in 0..((rig.config.search.duration * 60.0) as usize + 10) {
            let mut ctx = rig.ctx(None, false, false, 0.0);
            state.update(&mut ctx);
        }
        let BehaviorState::Patrol { search: None } = &state else {
            panic!("expected micro-search to end after wait window");
        };
        assert_ne!(rig.route.cursor, cursor_at_arrival);
    }

    #[test]
    fn test_random_point_stays_in_radius() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let anchor = Vec3::new(5.0, 0.0, -3.0);
        for _ in 0..100 {
            let p = random_point_around(anchor, 4.0, &mut rng);
            assert!(p.distance(anchor) <= 4.0 + 1e-4);
            assert_eq!(p.y, anchor.y);
        }
    }
}
