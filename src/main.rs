//! Blockfall: falling-block puzzle game in the terminal, with background music.

mod app;
mod audio;
mod game;
mod input;
mod theme;
mod timer;
mod ui;

use anyhow::{Context, Result};
use app::App;
use audio::Track;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Options derived from CLI that affect the game and its music.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub seed: Option<u64>,
    /// `None` when muted.
    pub track: Option<Track>,
    pub volume: f32,
    pub animation: bool,
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Self {
        let track = (!args.mute).then(|| match &args.music {
            Some(path) => Track::File(path.clone()),
            None => Track::Builtin,
        });
        Self {
            seed: args.seed,
            track,
            volume: args.volume.clamp(0.0, 1.0),
            animation: !args.no_animation,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("theme not loaded, using default: {e}");
        theme::Theme::default()
    });
    let config = GameConfig::from_args(&args);
    log::info!("starting blockfall with {:?}", config);
    let mut app = App::new(config, theme);
    app.run()?;
    Ok(())
}

/// Logs go to a file: the terminal belongs to the game.
fn init_logging(path: &std::path::Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("logger already initialised")?;
    Ok(())
}

/// Falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockfall",
    version,
    about = "Falling-block puzzle in the terminal. Complete rows to clear them; the game speeds up every 500 points.",
    long_about = "Blockfall is a terminal falling-block puzzle.\n\n\
        Pieces fall one row per tick. Fill a row completely to clear it for 100 points. \
        Every 500 points the fall speed increases, down to a 100 ms tick.\n\n\
        CONTROLS:\n  Left/Right  Move    Up         Rotate     Down     Move down\n  \
        P / Space   Pause/Resume   N   New game   A   Start audio (if blocked)   Q / Esc  Quit\n\n\
        Vim keys h/j/k/l work as arrows."
)]
pub struct Args {
    /// Seed for the piece sequence (same seed, same pieces).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Music file to loop (wav, ogg, flac, mp3). Uses a built-in tune if not set.
    #[arg(long, value_name = "FILE")]
    pub music: Option<PathBuf>,

    /// Do not play music.
    #[arg(long)]
    pub mute: bool,

    /// Music volume from 0.0 to 1.0.
    #[arg(long, default_value = "0.5", value_name = "VOL")]
    pub volume: f32,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the game-over fade.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (level from RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
