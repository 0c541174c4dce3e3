//! Per-frame simulation step
//!
//! Order within a tick: drain queued input, move the paddle, move the ball
//! and resolve its single nearest contact, apply deferred brick removals,
//! check for a cleared level, then let the AI queue commands for the next
//! tick.

use super::collision::{Contact, gather_targets};
use super::geometry::CollisionFace;
use super::paddle::{MoveIntent, PaddleResponse, respond};
use super::pool::{BrickHandle, BrickHit};
use super::raycast::{TargetId, WallSide};
use super::state::{BallState, GameEvent, GamePhase, GameState, InputCommand, InputSource, SoundId};
use crate::consts::*;

/// Advance the game by `dt` seconds
pub fn tick(state: &mut GameState, dt: f32) {
    process_inputs(state);

    if !state.is_running() {
        return;
    }
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    state.frame += 1;

    update_paddle(state, dt);

    match state.ball_state {
        BallState::Attached { .. } => state.attach_ball(),
        BallState::Free => step_ball(state, dt),
    }

    for handle in state.bricks.drain_removals() {
        state.emit(GameEvent::BrickRemoved { handle });
    }

    if state.is_running() {
        check_level_clear(state);
    }

    if state.phase == GamePhase::Demo {
        run_ai(state, dt);
    }
}

/// Apply every queued command in arrival order
fn process_inputs(state: &mut GameState) {
    while let Some((source, command)) = state.inputs.pop_front() {
        match command {
            InputCommand::Pause => toggle_pause(state),
            InputCommand::ToggleDemo => toggle_demo(state),
            InputCommand::Move(intent) => {
                // Key releases during a pause still land; the paddle is frozen anyway
                if accepts(controlling_phase(state), source) {
                    state.paddle.set_intent(intent);
                }
            }
            InputCommand::Fire => {
                if accepts(state.phase, source) {
                    state.launch_ball();
                }
            }
        }
    }
}

/// The phase whose owner steers the paddle, looking through a pause
fn controlling_phase(state: &GameState) -> GamePhase {
    match state.phase {
        GamePhase::Paused => state.resume_phase,
        phase => phase,
    }
}

/// Movement and fire only count from whoever owns the paddle in `phase`
fn accepts(phase: GamePhase, source: InputSource) -> bool {
    match (phase, source) {
        (GamePhase::Playing, InputSource::Player) => true,
        (GamePhase::Demo, InputSource::Ai) => true,
        _ => false,
    }
}

fn toggle_pause(state: &mut GameState) {
    match state.phase {
        GamePhase::Playing | GamePhase::Demo => {
            state.resume_phase = state.phase;
            state.phase = GamePhase::Paused;
            log::info!("Paused");
        }
        GamePhase::Paused => {
            state.phase = state.resume_phase;
            log::info!("Resumed");
        }
        GamePhase::GameOver => {}
    }
}

fn toggle_demo(state: &mut GameState) {
    match state.phase {
        GamePhase::Playing => {
            state.phase = GamePhase::Demo;
            state.resume_phase = GamePhase::Demo;
            state.ai.reset();
            log::info!("Demo mode on");
        }
        GamePhase::Demo => {
            state.phase = GamePhase::Playing;
            state.resume_phase = GamePhase::Playing;
            state.paddle.set_intent(MoveIntent::Stop);
            log::info!("Demo mode off");
        }
        GamePhase::Paused => {
            state.resume_phase = if state.resume_phase == GamePhase::Demo {
                GamePhase::Playing
            } else {
                state.ai.reset();
                GamePhase::Demo
            };
        }
        GamePhase::GameOver => {
            log::info!("Starting demo");
            state.restart(GamePhase::Demo);
        }
    }
}

fn update_paddle(state: &mut GameState, dt: f32) {
    let field_width = state.settings.field_width;
    if let Some(expired) = state.paddle.update(dt, field_width) {
        log::debug!("Powerup expired: {:?}", expired);
        state.emit(GameEvent::PowerupExpired(expired));
    }
}

/// Move the free ball and resolve what it hit
fn step_ball(state: &mut GameState, dt: f32) {
    let frame = state.frame;
    state.targets.clear();
    gather_targets(state.bricks.targets_mut(), frame, &mut state.targets);
    gather_targets(
        std::iter::once((TargetId::Paddle, &mut state.paddle)),
        frame,
        &mut state.targets,
    );

    let Some(contact) = state.collision.step_ball(&mut state.ball, &state.targets, dt) else {
        return;
    };

    // Back out of the surface before the response so the next cast starts clear
    state.ball.pos += contact.normal * contact.penetration;

    match contact.target {
        TargetId::Paddle => hit_paddle(state, &contact),
        TargetId::Brick(handle) => hit_brick(state, handle, &contact),
        TargetId::Wall(WallSide::Bottom) => {
            state.lose_life();
            return;
        }
        TargetId::Wall(_) => {
            state.ball.reflect_off(contact.face);
            state.play_sound(SoundId::WallHit, contact.point);
        }
    }

    if state.ball.is_moving {
        state.ball.track_oscillation(&mut state.rng);
    }
}

fn hit_paddle(state: &mut GameState, contact: &Contact) {
    state.play_sound(SoundId::PaddleHit, contact.point);

    // Side or underside: plain reflection, the ball is already lost
    if contact.face != CollisionFace::Top {
        state.ball.reflect_off(contact.face);
        return;
    }

    match respond(&state.paddle, state.ball.pos.x, state.ball.speed_ratio) {
        PaddleResponse::Bounce { angle, speed_ratio } => {
            state.ball.set_angle(angle);
            state.ball.speed_ratio = speed_ratio;
        }
        PaddleResponse::Stick { offset } => state.stick_ball(offset),
    }
}

fn hit_brick(state: &mut GameState, handle: BrickHandle, contact: &Contact) {
    state.ball.reflect_off(contact.face);

    let Some(brick) = state.bricks.get_mut(handle) else {
        return;
    };
    match brick.take_hit() {
        BrickHit::Deflected => {
            state.play_sound(SoundId::IndestructibleHit, contact.point);
        }
        BrickHit::Damaged { .. } => {
            state.add_score(SCORE_BRICK_DAMAGED);
            state.play_sound(SoundId::BrickHit, contact.point);
        }
        BrickHit::Destroyed { preset } => {
            state.bricks.request_removal(handle);
            state.add_score(preset.map_or(SCORE_BRICK_DESTROYED, |p| p.score));
            state.play_sound(SoundId::BrickDestroyed, contact.point);

            if let Some(kind) = preset.and_then(|p| p.drops) {
                let field_width = state.settings.field_width;
                state.paddle.apply_powerup(kind, field_width);
                log::debug!("Powerup activated: {:?}", kind);
                state.emit(GameEvent::PowerupActivated(kind));
                state.play_sound(SoundId::Powerup, contact.point);
            }
        }
    }
}

/// Level completes after the breakable count has stayed at zero for a while
fn check_level_clear(state: &mut GameState) {
    if state.bricks.breakable_remaining() > 0 {
        state.level_clear_ticks = 0;
        return;
    }

    state.level_clear_ticks += 1;
    if state.level_clear_ticks < LEVEL_CLEAR_DEBOUNCE_TICKS {
        return;
    }

    let level = state.level;
    log::info!("Level {} complete, score {}", level, state.score);
    state.emit(GameEvent::LevelComplete { level });
    state.play_sound(SoundId::LevelComplete, state.ball.pos);
    state.start_level(level + 1);
}

/// Queue the AI's commands; they take effect next tick
fn run_ai(state: &mut GameState, dt: f32) {
    let view = state.ai_view();
    let command = state.ai.update(&view, dt, &mut state.rng);
    state.push_input(InputSource::Ai, InputCommand::Move(command.intent));
    if command.fire {
        state.push_input(InputSource::Ai, InputCommand::Fire);
    }
}

/// Fixed-timestep driver for variable frame deltas
///
/// Accumulates wall-clock time and runs whole `SIM_DT` ticks, at most
/// `MAX_SUBSTEPS` per frame so a long stall can't snowball.
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    /// Longest frame delta accepted before clamping
    pub const MAX_FRAME_DT: f32 = 0.1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Run as many ticks as `frame_dt` covers; returns how many ran
    pub fn advance(&mut self, state: &mut GameState, frame_dt: f32) -> u32 {
        let frame_dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, Self::MAX_FRAME_DT)
        } else {
            0.0
        };
        self.accumulator += frame_dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(state, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog rather than carrying it into the next frame
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::geometry::Rect;
    use crate::sim::paddle::{Powerup, stationary_angle};
    use crate::sim::presets::preset;
    use glam::Vec2;
    use std::f32::consts::FRAC_PI_2;

    fn new_state() -> GameState {
        GameState::new(Settings {
            seed: Some(12345),
            ..Default::default()
        })
        .unwrap()
    }

    /// Ball in flight from `pos` at `angle`
    fn free_ball(state: &mut GameState, pos: Vec2, angle: f32) {
        state.ball_state = BallState::Free;
        state.ball.pos = pos;
        state.ball.launch(angle);
    }

    /// Remove every brick but one at `rect`
    fn single_brick(state: &mut GameState, rect: Rect, id: &str) -> BrickHandle {
        state.bricks.clear();
        state.bricks.checkout(rect, preset(id).unwrap()).unwrap()
    }

    #[test]
    fn test_tick_serve_to_playing() {
        let mut state = new_state();
        tick(&mut state, SIM_DT);
        assert_eq!(state.ball_state, BallState::Attached { offset: 0.0 });

        state.push_input(InputSource::Player, InputCommand::Fire);
        tick(&mut state, SIM_DT);
        assert_eq!(state.ball_state, BallState::Free);
        assert!(state.ball.is_moving);
        assert!(state.ball.direction().y < 0.0);
    }

    #[test]
    fn test_attached_ball_follows_paddle() {
        let mut state = new_state();
        state.push_input(InputSource::Player, InputCommand::Move(MoveIntent::Left));
        for _ in 0..30 {
            tick(&mut state, SIM_DT);
        }
        assert!(state.paddle.x < FIELD_WIDTH / 2.0);
        assert!((state.ball.pos.x - state.paddle.x).abs() < 1e-4);
    }

    #[test]
    fn test_tick_pause() {
        let mut state = new_state();
        state.push_input(InputSource::Player, InputCommand::Fire);
        tick(&mut state, SIM_DT);

        state.push_input(InputSource::Player, InputCommand::Pause);
        tick(&mut state, SIM_DT);
        assert_eq!(state.phase, GamePhase::Paused);
        let frozen = state.ball.pos;
        let frame = state.frame;
        for _ in 0..10 {
            tick(&mut state, SIM_DT);
        }
        assert_eq!(state.ball.pos, frozen);
        assert_eq!(state.frame, frame);

        state.push_input(InputSource::Player, InputCommand::Pause);
        tick(&mut state, SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_ne!(state.ball.pos, frozen);
    }

    #[test]
    fn test_key_release_during_pause_stops_paddle() {
        let mut state = new_state();
        state.push_input(InputSource::Player, InputCommand::Move(MoveIntent::Left));
        tick(&mut state, SIM_DT);
        state.push_input(InputSource::Player, InputCommand::Pause);
        tick(&mut state, SIM_DT);

        state.push_input(InputSource::Player, InputCommand::Move(MoveIntent::Stop));
        // Fire still waits for the game to resume
        state.push_input(InputSource::Player, InputCommand::Fire);
        tick(&mut state, SIM_DT);
        assert_eq!(state.ball_state, BallState::Attached { offset: 0.0 });

        state.push_input(InputSource::Player, InputCommand::Pause);
        tick(&mut state, SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        let x = state.paddle.x;
        for _ in 0..10 {
            tick(&mut state, SIM_DT);
        }
        assert_eq!(state.paddle.velocity_sign(), 0.0);
        assert_eq!(state.paddle.x, x);

        // The AI can't steer a paused player game
        state.push_input(InputSource::Player, InputCommand::Pause);
        state.push_input(InputSource::Ai, InputCommand::Move(MoveIntent::Right));
        tick(&mut state, SIM_DT);
        assert_eq!(state.paddle.velocity_sign(), 0.0);
    }

    #[test]
    fn test_demo_ignores_player_and_serves() {
        let mut state = new_state();
        state.push_input(InputSource::Player, InputCommand::ToggleDemo);
        tick(&mut state, SIM_DT);
        assert_eq!(state.phase, GamePhase::Demo);

        state.push_input(InputSource::Player, InputCommand::Fire);
        tick(&mut state, SIM_DT);
        assert_eq!(state.ball_state, BallState::Attached { offset: 0.0 });

        // AI fires once its serve delay has passed
        let delay_ticks = (state.ai.params().serve_delay / SIM_DT) as usize + 10;
        for _ in 0..delay_ticks {
            tick(&mut state, SIM_DT);
        }
        assert_eq!(state.ball_state, BallState::Free);

        state.push_input(InputSource::Player, InputCommand::ToggleDemo);
        tick(&mut state, SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        // AI commands no longer apply
        state.push_input(InputSource::Ai, InputCommand::Move(MoveIntent::Right));
        tick(&mut state, SIM_DT);
        assert_eq!(state.paddle.velocity_sign(), 0.0);
    }

    #[test]
    fn test_level_complete_after_debounce() {
        let mut state = new_state();
        let breakable: Vec<_> = state
            .bricks
            .placed()
            .filter(|b| b.is_breakable())
            .map(|b| b.handle)
            .collect();
        assert!(!breakable.is_empty());
        for handle in breakable {
            state.bricks.request_removal(handle);
        }
        state.drain_events();

        for _ in 0..LEVEL_CLEAR_DEBOUNCE_TICKS - 1 {
            tick(&mut state, SIM_DT);
        }
        assert_eq!(state.level, 1);
        assert!(
            !state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::LevelComplete { .. }))
        );

        tick(&mut state, SIM_DT);
        assert_eq!(state.level, 2);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::LevelComplete { level: 1 }));
        assert!(events.iter().any(|e| matches!(e, GameEvent::LevelStarted { level: 2, .. })));
        assert!(state.bricks.breakable_remaining() > 0);
        assert_eq!(state.ball_state, BallState::Attached { offset: 0.0 });
    }

    #[test]
    fn test_brick_hits_score() {
        let mut state = new_state();
        single_brick(&mut state, Rect::new(380.0, 100.0, 40.0, 20.0), "silver");
        free_ball(&mut state, Vec2::new(400.0, 300.0), -FRAC_PI_2);
        state.drain_events();

        for _ in 0..100 {
            tick(&mut state, SIM_DT);
        }
        assert_eq!(state.score, SCORE_BRICK_DAMAGED);
        assert!(state.ball.direction().y > 0.0, "ball bounced back down");
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::ScoreChanged { delta: 5, total: 5 }));
        assert_eq!(state.bricks.breakable_remaining(), 1);
    }

    #[test]
    fn test_destroying_special_brick_grants_powerup() {
        let mut state = new_state();
        let handle = single_brick(&mut state, Rect::new(380.0, 100.0, 40.0, 20.0), "enlarge");
        free_ball(&mut state, Vec2::new(400.0, 300.0), -FRAC_PI_2);
        state.drain_events();

        // Contact on tick 58; stop well before the level-clear debounce runs out
        for _ in 0..65 {
            tick(&mut state, SIM_DT);
        }
        assert_eq!(state.score, SCORE_BRICK_DESTROYED);
        assert_eq!(state.level, 1);
        assert_eq!(state.bricks.placed_count(), 0, "removal drained");
        assert_eq!(state.paddle.width, PADDLE_WIDTH * ENLARGE_FACTOR);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::PowerupActivated(Powerup::Enlarge)));
        assert!(events.contains(&GameEvent::BrickRemoved { handle }));
    }

    #[test]
    fn test_sticky_paddle_catches_and_releases() {
        let mut state = new_state();
        single_brick(&mut state, Rect::new(0.0, 60.0, 40.0, 20.0), "red");
        state.paddle.apply_powerup(Powerup::Sticky, FIELD_WIDTH);
        let start_x = state.paddle.x + 20.0;
        free_ball(&mut state, Vec2::new(start_x, 450.0), FRAC_PI_2);

        for _ in 0..120 {
            tick(&mut state, SIM_DT);
        }
        let BallState::Attached { offset } = state.ball_state else {
            panic!("ball was not caught: {:?}", state.ball_state);
        };
        assert!((offset - 0.4).abs() < 1e-3);
        assert!(!state.ball.is_moving);

        state.push_input(InputSource::Player, InputCommand::Fire);
        tick(&mut state, SIM_DT);
        assert_eq!(state.ball_state, BallState::Free);
        assert!((state.ball.angle() - stationary_angle(offset)).abs() < 1e-5);
    }

    #[test]
    fn test_paddle_bounce_centre() {
        let mut state = new_state();
        single_brick(&mut state, Rect::new(0.0, 60.0, 40.0, 20.0), "red");
        let x = state.paddle.x;
        free_ball(&mut state, Vec2::new(x, 450.0), FRAC_PI_2);
        for _ in 0..60 {
            tick(&mut state, SIM_DT);
        }
        assert!((state.ball.angle() - PADDLE_BASE_ANGLE).abs() < 1e-5);
        assert!(state.ball.speed_ratio > 1.0);
    }

    #[test]
    fn test_life_lost_then_game_over() {
        let mut state = GameState::new(Settings {
            seed: Some(7),
            starting_lives: 2,
            ..Default::default()
        })
        .unwrap();

        free_ball(&mut state, Vec2::new(40.0, 575.0), FRAC_PI_2);
        for _ in 0..20 {
            tick(&mut state, SIM_DT);
        }
        assert_eq!(state.lives, 1);
        assert_eq!(state.ball_state, BallState::Attached { offset: 0.0 });
        assert!(state.drain_events().contains(&GameEvent::LifeLost { remaining: 1 }));

        free_ball(&mut state, Vec2::new(40.0, 575.0), FRAC_PI_2);
        for _ in 0..20 {
            tick(&mut state, SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::GameOver { .. }))
        );

        // Toggling demo from game over starts a fresh run
        state.push_input(InputSource::Player, InputCommand::ToggleDemo);
        tick(&mut state, SIM_DT);
        assert_eq!(state.phase, GamePhase::Demo);
        assert_eq!(state.lives, 2);
    }

    #[test]
    fn test_determinism() {
        let run = || {
            let mut state = new_state();
            state.push_input(InputSource::Player, InputCommand::ToggleDemo);
            for _ in 0..3000 {
                tick(&mut state, SIM_DT);
            }
            (state.frame, state.score, state.lives, state.level, state.ball.pos)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_rect_overlap_mode_plays() {
        let mut state = GameState::new(Settings {
            seed: Some(3),
            collision_mode: crate::CollisionMode::RectOverlap,
            ..Default::default()
        })
        .unwrap();
        single_brick(&mut state, Rect::new(380.0, 100.0, 40.0, 20.0), "red");
        free_ball(&mut state, Vec2::new(400.0, 300.0), -FRAC_PI_2);
        for _ in 0..100 {
            tick(&mut state, SIM_DT);
        }
        assert_eq!(state.score, SCORE_BRICK_DESTROYED);
    }

    #[test]
    fn test_fixed_step_caps_substeps() {
        let mut state = new_state();
        let mut stepper = FixedStep::new();
        assert_eq!(stepper.advance(&mut state, SIM_DT * 0.5), 0);
        assert_eq!(stepper.advance(&mut state, SIM_DT * 0.6), 1);
        assert_eq!(stepper.advance(&mut state, 10.0), MAX_SUBSTEPS);
        assert_eq!(state.frame, 1 + MAX_SUBSTEPS as u64);
        assert_eq!(stepper.advance(&mut state, f32::NAN), 1);
    }
}
