//! Platform glue
//!
//! Frame pacing, the load rendezvous that gates the first round, and the
//! round state machine. Nothing here touches a browser or a window: a host
//! feeds timestamps, input events and loaded data into a `Session` and hands
//! it a `Canvas` and an `AudioSink` every animation frame.

use crate::audio::AudioSink;
use crate::consts::{MAX_SUBSTEPS, STEP_MS};
use crate::input::InputState;
use crate::render::Canvas;
use crate::sim::{Game, RoundSummary, SimConfig, TemplateSet, tick};

/// Fixed-step accumulator
#[derive(Debug, Clone, Default)]
pub struct FrameDriver {
    accumulator_ms: f64,
    last_ms: Option<f64>,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps to simulate for an animation frame at `now_ms`.
    ///
    /// At most `MAX_SUBSTEPS` per frame; whole steps still owed after that
    /// are dropped rather than carried into later frames.
    pub fn advance(&mut self, now_ms: f64) -> u32 {
        let elapsed = match self.last_ms {
            Some(last) => (now_ms - last).max(0.0),
            None => STEP_MS,
        };
        self.last_ms = Some(now_ms);
        self.accumulator_ms += elapsed;

        let mut steps = 0;
        while self.accumulator_ms >= STEP_MS && steps < MAX_SUBSTEPS {
            self.accumulator_ms -= STEP_MS;
            steps += 1;
        }
        if self.accumulator_ms >= STEP_MS {
            self.accumulator_ms %= STEP_MS;
        }
        steps
    }

    /// Forget timing history (after a pause, restart or focus loss)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Proof of a registered loader; completing consumes it
#[derive(Debug, PartialEq, Eq)]
pub struct LoadTicket(u32);

/// Counter rendezvous: every registered loader must complete before play
#[derive(Debug, Default)]
pub struct LoadGate {
    registered: u32,
    completed: u32,
}

impl LoadGate {
    pub fn register(&mut self) -> LoadTicket {
        self.registered += 1;
        LoadTicket(self.registered)
    }

    pub fn complete(&mut self, ticket: LoadTicket) {
        log::debug!("Loader {} done ({}/{})", ticket.0, self.completed + 1, self.registered);
        self.completed += 1;
    }

    pub fn pending(&self) -> u32 {
        self.registered - self.completed
    }

    pub fn is_ready(&self) -> bool {
        self.pending() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Running,
    /// The round is over; the world keeps animating until restart
    PlayerDead,
}

/// One player's run of rounds
#[derive(Debug)]
pub struct Session {
    config: SimConfig,
    templates: TemplateSet,
    gate: LoadGate,
    levels: Option<LoadTicket>,
    driver: FrameDriver,
    input: InputState,
    game: Option<Game>,
    phase: Phase,
    round: u64,
    focused: bool,
    last_summary: Option<RoundSummary>,
}

impl Session {
    /// New session waiting for its level templates
    pub fn new(config: SimConfig) -> Self {
        let mut gate = LoadGate::default();
        let levels = Some(gate.register());
        Self {
            config,
            templates: TemplateSet::new(),
            gate,
            levels,
            driver: FrameDriver::new(),
            input: InputState::new(),
            game: None,
            phase: Phase::NotStarted,
            round: 0,
            focused: true,
            last_summary: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn game_mut(&mut self) -> Option<&mut Game> {
        self.game.as_mut()
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// For hosts with extra loaders (sounds, fonts) to gate on
    pub fn gate_mut(&mut self) -> &mut LoadGate {
        &mut self.gate
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Deliver the level file. A malformed file is logged and play continues
    /// with open sectors.
    pub fn provide_templates_json(&mut self, json: &str) {
        let templates = match TemplateSet::from_json(json) {
            Ok(templates) => templates,
            Err(err) => {
                log::warn!("Level templates unusable, using open sectors: {err}");
                TemplateSet::new()
            }
        };
        self.provide_templates(templates);
    }

    pub fn provide_templates(&mut self, templates: TemplateSet) {
        self.templates = templates;
        if let Some(ticket) = self.levels.take() {
            self.gate.complete(ticket);
        }
    }

    /// Begin the first round; needs every loader done
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::NotStarted || !self.gate.is_ready() {
            return false;
        }
        self.begin_round();
        true
    }

    /// Fresh round after a death
    pub fn restart(&mut self) -> bool {
        if self.phase != Phase::PlayerDead {
            return false;
        }
        log::info!("Restarting");
        self.begin_round();
        true
    }

    fn begin_round(&mut self) {
        let config = SimConfig {
            seed: self.config.seed.wrapping_add(self.round),
            ..self.config.clone()
        };
        self.round += 1;
        self.game = Some(Game::new(config, self.templates.clone()));
        self.driver.reset();
        self.phase = Phase::Running;
    }

    /// Drop the round and any held input
    pub fn quit_to_title(&mut self) {
        if let Some(game) = self.game.take() {
            self.last_summary = Some(game.summary());
        }
        self.input.reset();
        self.driver.reset();
        self.phase = Phase::NotStarted;
    }

    /// Focus lost: release held keys and buttons so nothing sticks
    pub fn blur(&mut self) {
        self.focused = false;
        self.input.reset();
        self.driver.reset();
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Run one animation frame: fixed steps, then sound delivery.
    /// Returns the number of steps simulated.
    pub fn frame(&mut self, now_ms: f64, canvas: &mut dyn Canvas, audio: &mut dyn AudioSink) -> u32 {
        let Some(game) = self.game.as_mut() else {
            return 0;
        };
        let steps = self.driver.advance(now_ms);
        for _ in 0..steps {
            tick(game, &self.input, canvas);
        }

        let muted = !self.focused && game.settings.mute_on_blur;
        let gain = game.settings.sfx_gain();
        for cue in game.drain_sounds() {
            if !muted {
                audio.play(&cue.scaled(gain));
            }
        }

        if self.phase == Phase::Running && !game.player_alive() {
            let summary = game.summary();
            log::info!("Player dead: {summary:?}");
            self.last_summary = Some(summary);
            self.phase = Phase::PlayerDead;
        }
        steps
    }

    /// Current round's summary, or the last finished one
    pub fn summary(&self) -> Option<RoundSummary> {
        self.game.as_ref().map(Game::summary).or_else(|| self.last_summary.clone())
    }
}
