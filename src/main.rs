use std::error::Error;
use std::fs;
use std::path::PathBuf;

use chip8vm::config::{
    KeymapPreset, Settings, DEFAULT_FRAME_RATE, DEFAULT_INSTRUCTIONS_PER_FRAME,
    DEFAULT_KEY_HOLD_FRAMES,
};
use chip8vm::display::MonoTermDisplay;
use chip8vm::emulator::Emulator;
use chip8vm::flags::{FileFlagStore, FlagStore, MemoryFlagStore};
use chip8vm::input::StdinInput;
use chip8vm::interpreter::{SCREEN_HEIGHT, SCREEN_WIDTH};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// run a CHIP-8 program in the terminal. Esc quits
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// path to the ROM to run
    rom: PathBuf,

    #[arg(long, default_value_t = DEFAULT_FRAME_RATE, help = "Frames per second, 0 to run flat out")]
    frame_rate: u32,

    #[arg(long, default_value_t = DEFAULT_INSTRUCTIONS_PER_FRAME)]
    instructions_per_frame: u32,

    #[arg(long, help = "Keep the flag registers in this file between runs")]
    flag_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = KeymapPreset::Conventional)]
    keymap: KeymapPreset,

    #[arg(long, default_value_t = DEFAULT_KEY_HOLD_FRAMES, help = "Frames a key stays down after a press")]
    key_hold: u32,

    #[arg(long, help = "Seed for CXNN, for repeatable runs")]
    seed: Option<u64>,

    #[arg(long, help = "Stop after this many frames")]
    max_frames: Option<u64>,
}

impl Args {
    fn settings(&self) -> Settings {
        let mut settings = Settings::new(&self.rom);
        settings.frame_rate = self.frame_rate;
        settings.instructions_per_frame = self.instructions_per_frame;
        settings.flag_path = self.flag_file.clone();
        settings.keymap = self.keymap;
        settings.key_hold_frames = self.key_hold;
        settings.seed = self.seed;
        settings
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // stdout belongs to the display
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = args.settings();
    let rom = fs::read(&settings.rom_path)?;

    let mut flag_store: Box<dyn FlagStore> = match &settings.flag_path {
        Some(path) => Box::new(FileFlagStore::new(path)),
        None => Box::new(MemoryFlagStore::new()),
    };
    let mut display = MonoTermDisplay::new(SCREEN_WIDTH, SCREEN_HEIGHT)?;
    let mut input = StdinInput::new(settings.key_hold_frames)?;

    let summary = {
        let mut emulator = Emulator::new(settings, &mut display, &mut input, flag_store.as_mut());
        emulator.load_rom(&rom)?;
        emulator.main_loop(args.max_frames)?
    };
    drop(input);

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..12 {
        println!();
    }
    tracing::info!(
        frames = summary.frames,
        instructions = summary.instructions,
        halted = summary.halted,
        "run finished"
    );
    Ok(())
}
