//! Flag Rally headless runner
//!
//! Plays one demo run with the autopilot and logs what happened.
//! Usage: `flag-rally [seed] [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    if let Err(err) = run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No headless runner on the web
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<(), Box<dyn std::error::Error>> {
    use flag_rally::Settings;
    use flag_rally::sim::{GamePhase, GameState, Mode, TickInput, tick};
    use flag_rally::view::Frame;

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(arg) => arg.parse::<u64>()?,
        None => 7,
    };
    let settings = match args.next() {
        Some(path) => Settings::from_json(&std::fs::read_to_string(path)?)?,
        None => Settings::default(),
    };

    log::info!("Flag Rally demo starting (seed {seed})");

    let mut state = GameState::begin(&settings, seed, Mode::Demo)?;
    let input = TickInput::default();

    while state.is_running() {
        tick(&mut state, &settings, &input);
        for event in state.take_events() {
            log::debug!("tick {}: {:?}", state.time_ticks, event);
        }
    }

    let frame = Frame::capture(&state, &settings);
    log::info!(
        "Round over after {} ticks: {:?}, score {}",
        state.round_ticks,
        state.outcome,
        state.score
    );

    state.finish_round(&settings)?;
    for event in state.take_events() {
        log::info!("{:?}", event);
    }
    debug_assert_eq!(state.phase, GamePhase::GameOver);

    println!("{}", serde_json::to_string_pretty(&frame)?);
    Ok(())
}
