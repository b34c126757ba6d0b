//! Background music: a looping track behind a small trait, plus the blocked/retry flag.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("cannot create sink: {0}")]
    Play(#[from] rodio::PlayError),
    #[error("cannot decode music: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("cannot open music file: {0}")]
    Io(#[from] std::io::Error),
}

/// Playback of one looping track.
pub trait Music {
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self);
    /// Seek back to the start and play.
    fn restart(&mut self) -> Result<(), AudioError>;
}

/// Where the track comes from.
#[derive(Debug, Clone)]
pub enum Track {
    File(PathBuf),
    Builtin,
}

/// rodio-backed music. The output device is opened on first play, so a missing
/// device shows up as a play error instead of failing start-up.
pub struct RodioMusic {
    track: Track,
    volume: f32,
    output: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
}

impl RodioMusic {
    pub fn new(track: Track, volume: f32) -> Self {
        Self {
            track,
            volume: volume.clamp(0.0, 1.0),
            output: None,
            sink: None,
        }
    }

    fn new_sink(&mut self) -> Result<Sink, AudioError> {
        if self.output.is_none() {
            self.output = Some(OutputStream::try_default()?);
        }
        let Some((_, handle)) = &self.output else {
            return Err(rodio::StreamError::NoDevice.into());
        };
        let sink = Sink::try_new(handle)?;
        sink.set_volume(self.volume);
        match &self.track {
            Track::File(path) => {
                let decoder = Decoder::new(BufReader::new(File::open(path)?))?;
                sink.append(decoder.repeat_infinite());
            }
            Track::Builtin => sink.append(Arpeggio::new()),
        }
        Ok(sink)
    }
}

impl Music for RodioMusic {
    fn play(&mut self) -> Result<(), AudioError> {
        if self.sink.is_none() {
            self.sink = Some(self.new_sink()?);
        }
        if let Some(sink) = &self.sink {
            sink.play();
        }
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn restart(&mut self) -> Result<(), AudioError> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.play()
    }
}

/// Procedural loop so the game has music without shipping an asset.
#[derive(Debug, Clone)]
struct Arpeggio {
    sample_rate: u32,
    frame: u64,
}

impl Arpeggio {
    /// A minor / F / C / G, two beats each.
    const NOTES_HZ: [f32; 16] = [
        220.0, 261.63, 329.63, 261.63, 174.61, 220.0, 261.63, 220.0, 261.63, 329.63, 392.0,
        329.63, 196.0, 246.94, 293.66, 246.94,
    ];

    fn new() -> Self {
        Self {
            sample_rate: 44_100,
            frame: 0,
        }
    }
}

impl Iterator for Arpeggio {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let note_len = u64::from(self.sample_rate) / 5;
        let idx = ((self.frame / note_len) % Self::NOTES_HZ.len() as u64) as usize;
        let pos = self.frame % note_len;
        let t = pos as f32 / self.sample_rate as f32;
        let phase = std::f32::consts::TAU * Self::NOTES_HZ[idx] * t;

        let attack = u64::from(self.sample_rate) / 100;
        let release = u64::from(self.sample_rate) / 40;
        let env = if pos < attack {
            pos as f32 / attack as f32
        } else if pos + release >= note_len {
            (note_len - pos) as f32 / release as f32
        } else {
            1.0
        };

        self.frame = self.frame.wrapping_add(1);
        Some((phase.sin() + (phase * 2.0).sin() * 0.3) * 0.2 * env)
    }
}

impl Source for Arpeggio {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Drives the music from game events. Never fails: errors are logged, and a failed
/// first start (or manual retry) raises the `blocked` flag the UI shows.
pub struct AudioController {
    music: Option<Box<dyn Music>>,
    blocked: bool,
}

impl AudioController {
    pub fn new(music: Box<dyn Music>) -> Self {
        Self {
            music: Some(music),
            blocked: false,
        }
    }

    /// No device is ever opened.
    pub fn muted() -> Self {
        Self {
            music: None,
            blocked: false,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Initial start at launch.
    pub fn start(&mut self) {
        let Some(music) = self.music.as_mut() else {
            return;
        };
        match music.play() {
            Ok(()) => {
                log::info!("music started");
                self.blocked = false;
            }
            Err(e) => {
                log::error!("initial music start failed: {e}");
                self.blocked = true;
            }
        }
    }

    /// Follows the game: plays while running, pauses when paused or over.
    pub fn sync(&mut self, running: bool) {
        let Some(music) = self.music.as_mut() else {
            return;
        };
        if !running {
            music.pause();
            return;
        }
        match music.play() {
            Ok(()) => self.blocked = false,
            Err(e) => log::error!("music play failed: {e}"),
        }
    }

    /// New game: from the top.
    pub fn restart(&mut self) {
        let Some(music) = self.music.as_mut() else {
            return;
        };
        match music.restart() {
            Ok(()) => {
                log::info!("music restarted with new game");
                self.blocked = false;
            }
            Err(e) => log::error!("music restart failed: {e}"),
        }
    }

    /// Manual start after a blocked launch. Returns true if the music is now playing.
    pub fn retry(&mut self) -> bool {
        if !self.blocked {
            return false;
        }
        let Some(music) = self.music.as_mut() else {
            return false;
        };
        match music.play() {
            Ok(()) => {
                log::info!("music started manually");
                self.blocked = false;
                true
            }
            Err(e) => {
                log::error!("manual music start failed: {e}");
                false
            }
        }
    }
}
