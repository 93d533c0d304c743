use crate::input::Keymap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FRAME_RATE: u32 = 60;
pub const DEFAULT_INSTRUCTIONS_PER_FRAME: u32 = 20;
pub const DEFAULT_KEY_HOLD_FRAMES: u32 = 6;

/// which key layout to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum KeymapPreset {
    /// x123 / qwe / asd / zc4rfv, plus arrow keys
    #[default]
    Conventional,
    /// 0-9, a-f
    Literal,
}

impl KeymapPreset {
    pub fn keymap(self) -> Keymap {
        match self {
            KeymapPreset::Conventional => Keymap::conventional(),
            KeymapPreset::Literal => Keymap::literal(),
        }
    }
}

/// how a run is set up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rom_path: PathBuf,
    pub frame_rate: u32,
    pub instructions_per_frame: u32,
    pub flag_path: Option<PathBuf>,
    pub keymap: KeymapPreset,
    pub key_hold_frames: u32,
    pub seed: Option<u64>,
}

impl Settings {
    pub fn new(rom_path: impl Into<PathBuf>) -> Self {
        Settings {
            rom_path: rom_path.into(),
            frame_rate: DEFAULT_FRAME_RATE,
            instructions_per_frame: DEFAULT_INSTRUCTIONS_PER_FRAME,
            flag_path: None,
            keymap: KeymapPreset::default(),
            key_hold_frames: DEFAULT_KEY_HOLD_FRAMES,
            seed: None,
        }
    }

    /// wall clock time of one frame; a zero frame rate means run flat out
    pub fn frame_duration(&self) -> Duration {
        match self.frame_rate {
            0 => Duration::ZERO,
            rate => Duration::from_secs(1) / rate,
        }
    }
}
