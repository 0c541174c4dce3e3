//! Brick Rally headless runner
//!
//! Plays the simulation in demo mode with no window and logs what happens.
//!
//! Usage: `brick-rally [settings.json] [ticks]`

use anyhow::{Context, Result};

use brick_rally::Settings;
use brick_rally::consts::SIM_DT;
use brick_rally::sim::{
    GameEvent, GamePhase, GameState, InputCommand, InputSource, SoundId, tick,
};

/// One minute of simulated play
const DEFAULT_TICKS: u64 = 120 * 60;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Brick Rally (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load(&path)?,
        None => Settings::default(),
    };
    let ticks = match args.next() {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("invalid tick count `{raw}`"))?,
        None => DEFAULT_TICKS,
    };

    let mut state = GameState::new(settings)?;
    state.push_input(InputSource::Player, InputCommand::ToggleDemo);

    let mut bricks_destroyed = 0u64;
    let mut sounds = 0u64;
    for _ in 0..ticks {
        tick(&mut state, SIM_DT);
        for event in state.drain_events() {
            match event {
                GameEvent::Sound { id, .. } => {
                    sounds += 1;
                    if id == SoundId::BrickDestroyed {
                        bricks_destroyed += 1;
                    }
                }
                GameEvent::BrickPlaced { .. } | GameEvent::BrickRemoved { .. } => {}
                score @ GameEvent::ScoreChanged { .. } => log::debug!("{score:?}"),
                other => log::info!("{other:?}"),
            }
        }
        if state.phase == GamePhase::GameOver {
            break;
        }
    }

    println!("seed:             {}", state.seed);
    println!("ticks:            {}", state.frame);
    println!("simulated time:   {:.1}s", state.frame as f32 * SIM_DT);
    println!("level reached:    {}", state.level);
    println!("score:            {}", state.score);
    println!("lives left:       {}", state.lives);
    println!("bricks destroyed: {}", bricks_destroyed);
    println!("sound cues:       {}", sounds);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No headless runner on wasm; embed the library instead
}
