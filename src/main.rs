//! Quadrant Run headless runner
//!
//! Drives a `Session` with a scripted autopilot and prints the round
//! summaries as JSON. The browser host embeds the library instead.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::{Path, PathBuf};
    use std::process::ExitCode;

    use clap::Parser;
    use glam::Vec2;

    use quadrant_run::audio::CueLog;
    use quadrant_run::consts::{SCREEN_HEIGHT, SCREEN_WIDTH, STEP_MS};
    use quadrant_run::input::{BUTTON_PRIMARY, BUTTON_SECONDARY, InputState};
    use quadrant_run::platform::{Phase, Session};
    use quadrant_run::render::NullCanvas;
    use quadrant_run::sim::{RoundSummary, SimConfig};
    use quadrant_run::{QualityPreset, Settings, Tuning};

    #[derive(Parser, Debug)]
    #[command(name = "quadrant-run", version, about = "Run Quadrant Run rounds without a display")]
    pub struct Args {
        /// Level template file (JSON array of cell columns)
        #[arg(short, long)]
        levels: Option<PathBuf>,

        /// Balance overrides (JSON, missing fields use defaults)
        #[arg(long)]
        tuning: Option<PathBuf>,

        /// Player settings file
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Quality preset overriding the settings file (low, medium, high)
        #[arg(short, long)]
        quality: Option<String>,

        /// Write the effective settings here before playing
        #[arg(long)]
        save_settings: Option<PathBuf>,

        /// World seed
        #[arg(short, long, default_value_t = 1)]
        seed: u64,

        /// Simulation steps per round before giving up
        #[arg(short, long, default_value_t = 3600)]
        ticks: u64,

        /// Rounds to play; a death restarts until this many are done
        #[arg(short, long, default_value_t = 1)]
        rounds: u32,
    }

    fn read(path: &Path) -> Result<String, String> {
        std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))
    }

    /// Circle-strafe, sweep the aim and keep the trigger down
    fn autopilot(input: &mut InputState, frame: u64) {
        input.reset();
        let phase = (frame / 90) % 4;
        let key = ["W", "D", "S", "A"][phase as usize];
        input.key_down(key);
        if frame % 240 < 120 {
            input.key_down("D");
        }

        let center = Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT) * 0.5;
        let sweep = Vec2::from_angle(frame as f32 * 0.03) * 180.0;
        let aim = center + sweep;
        input.pointer_moved(aim.x, aim.y);

        input.button_down(BUTTON_PRIMARY);
        if frame % 300 == 150 {
            input.button_down(BUTTON_SECONDARY);
        }
    }

    pub fn run(args: Args) -> ExitCode {
        let tuning = match args.tuning.as_deref().map(read).transpose() {
            Ok(Some(json)) => match Tuning::from_json(&json) {
                Ok(tuning) => tuning,
                Err(e) => {
                    log::error!("Bad tuning file: {e}");
                    return ExitCode::FAILURE;
                }
            },
            Ok(None) => Tuning::default(),
            Err(e) => {
                log::error!("Cannot read tuning: {e}");
                return ExitCode::FAILURE;
            }
        };
        let mut settings = args.settings.as_deref().map(Settings::load).unwrap_or_default();
        if let Some(name) = args.quality.as_deref() {
            let Some(preset) = QualityPreset::from_name(name) else {
                log::error!("Unknown quality preset '{name}'");
                return ExitCode::FAILURE;
            };
            settings.apply_preset(preset);
        }
        log::info!("Quality {}", settings.quality.as_str());
        if let Some(path) = args.save_settings.as_deref() {
            if let Err(e) = settings.save(path) {
                log::error!("Cannot save settings to {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        }

        let mut session = Session::new(SimConfig {
            seed: args.seed,
            tuning,
            settings,
        });

        // Levels arrive through the load gate like they would from a fetch
        match args.levels.as_deref().map(read).transpose() {
            Ok(Some(json)) => session.provide_templates_json(&json),
            Ok(None) => session.provide_templates_json("[]"),
            Err(e) => {
                log::error!("Cannot read levels: {e}");
                return ExitCode::FAILURE;
            }
        }
        log::info!("{} level templates", session.templates().len());

        if !session.start() {
            log::error!("Session not ready to start");
            return ExitCode::FAILURE;
        }

        let mut canvas = NullCanvas;
        let mut audio = CueLog::default();
        let mut summaries: Vec<RoundSummary> = Vec::new();
        let mut now_ms = 0.0;
        let mut frame = 0u64;
        let mut round_ticks = 0u64;

        while summaries.len() < args.rounds as usize {
            autopilot(session.input_mut(), frame);
            round_ticks += u64::from(session.frame(now_ms, &mut canvas, &mut audio));
            now_ms += STEP_MS;
            frame += 1;

            let out_of_time = round_ticks >= args.ticks;
            if session.phase() == Phase::PlayerDead || out_of_time {
                if let Some(summary) = session.summary() {
                    log::info!("Round {} over after {} ticks", summaries.len() + 1, summary.ticks);
                    summaries.push(summary);
                }
                round_ticks = 0;
                if out_of_time {
                    session.quit_to_title();
                    if summaries.len() < args.rounds as usize && !session.start() {
                        break;
                    }
                } else {
                    session.restart();
                }
            }
        }
        log::info!("{} sound cues played", audio.cues.len());

        match serde_json::to_string_pretty(&summaries) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Cannot encode summaries: {e}");
                ExitCode::FAILURE
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use clap::Parser;

    env_logger::init();
    log::info!("Quadrant Run (headless) starting...");
    headless::run(headless::Args::parse())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser host links the library and drives a Session itself
}
