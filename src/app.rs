//! App: terminal init, main loop, wiring of game state, gravity timer and music.

use crate::GameConfig;
use crate::audio::{AudioController, RodioMusic};
use crate::game::{GameState, Spawned, Status, Tick, tick_interval};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::timer::TickTimer;
use anyhow::Result;
use crossterm::event::{self, Event};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Upper bound on one loop iteration, so effects animate smoothly (~60 FPS).
const FRAME: Duration = Duration::from_millis(16);

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    timer: TickTimer,
    audio: AudioController,
    /// TachyonFX fade over the board once the game is over.
    game_over_effect: Option<Effect>,
    /// Last time the fade was processed (for delta).
    game_over_effect_time: Option<Instant>,
    quit: bool,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let audio = match &config.track {
            Some(track) => {
                AudioController::new(Box::new(RodioMusic::new(track.clone(), config.volume)))
            }
            None => AudioController::muted(),
        };
        Self {
            state: GameState::new(config.seed),
            config,
            theme,
            timer: TickTimer::new(),
            audio,
            game_over_effect: None,
            game_over_effect_time: None,
            quit: false,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        self.audio.start();
        let result = self.run_loop(&mut terminal);
        self.audio.sync(false);

        // Restore
        let _ = terminal.show_cursor();
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        while !self.quit {
            let now = Instant::now();
            self.spawn_if_needed(now);

            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    &self.state,
                    &self.theme,
                    self.audio.is_blocked(),
                    self.config.animation,
                    &mut self.game_over_effect,
                    &mut self.game_over_effect_time,
                    now,
                );
            })?;

            let timeout = self
                .timer
                .remaining(Instant::now())
                .map_or(FRAME, |r| r.min(FRAME));
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        self.handle_action(key_to_action(key), Instant::now());
                    }
                }
            }

            let now = Instant::now();
            if self.timer.fire(now) {
                self.on_tick();
            }
        }
        Ok(())
    }

    /// Empty board slot: bring in the next piece and arm gravity at the current speed.
    fn spawn_if_needed(&mut self, now: Instant) {
        if !self.state.needs_piece() {
            return;
        }
        match self.state.spawn() {
            Ok(Spawned::Falling) => {
                if self.state.status() == Status::Running {
                    self.timer.start(now, tick_interval(self.state.score()));
                }
            }
            Ok(Spawned::ToppedOut) => self.on_game_over(),
            Err(e) => log::error!("spawn failed: {e}"),
        }
    }

    fn on_tick(&mut self) {
        match self.state.tick() {
            Ok(Tick::Fell) => {}
            Ok(Tick::Locked { lines }) => {
                // Re-armed with the new score's speed when the next piece spawns.
                self.timer.cancel();
                if lines > 0 {
                    log::info!(
                        "cleared {} line(s), score {}, next interval {:?}",
                        lines,
                        self.state.score(),
                        tick_interval(self.state.score())
                    );
                }
            }
            Err(e) => {
                log::error!("tick failed: {e}");
                self.timer.cancel();
            }
        }
    }

    fn on_game_over(&mut self) {
        log::info!(
            "game over: score {}, lines {}",
            self.state.score(),
            self.state.lines_cleared()
        );
        self.timer.cancel();
        self.audio.sync(false);
    }

    fn handle_action(&mut self, action: Action, now: Instant) {
        match action {
            Action::Move(mv) => {
                if let Err(e) = self.state.apply(mv) {
                    log::debug!("{mv:?} ignored: {e}");
                }
            }
            Action::TogglePause => match self.state.toggle_pause() {
                Ok(Status::Running) => {
                    if self.state.piece().is_some() {
                        self.timer.start(now, tick_interval(self.state.score()));
                    }
                    self.audio.sync(true);
                }
                Ok(_) => {
                    self.timer.cancel();
                    self.audio.sync(false);
                }
                Err(e) => log::debug!("pause ignored: {e}"),
            },
            Action::NewGame => {
                self.state.reset();
                self.timer.cancel();
                self.game_over_effect = None;
                self.game_over_effect_time = None;
                self.audio.restart();
            }
            Action::StartAudio => {
                self.audio.retry();
            }
            Action::Quit => self.quit = true,
            Action::None => {}
        }
    }
}
