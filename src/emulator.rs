//! # emulator
//!
//! The driver: owns the machine, pumps input, runs a batch of instructions
//! per frame, redraws after draw instructions and sleeps off whatever is left
//! of the frame.
//!
//!  main loop
//!   |-- input.pump()              key events -> machine.keys; Esc quits
//!   |-- execute_next() x N        stop early on halt or error
//!   |-- display.draw()            only if one of those N was a DXYN
//!   `-- spin_sleep(rest of frame)

use crate::config::Settings;
use crate::display::{frame_to_string, Display};
use crate::error::Result;
use crate::flags::FlagStore;
use crate::input::{Control, Input, Keymap};
use crate::interpreter::{Chip8Interpreter, Step, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::machine::Machine;
use crate::memory::CHIP8_PROGRAM_ADDR;
use std::time::Instant;

/// how a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub frames: u64,
    pub instructions: u64,
    /// false if stopped by the user or the frame limit
    pub halted: bool,
}

pub struct Emulator<'a> {
    machine: Machine,
    interpreter: Chip8Interpreter,
    keymap: Keymap,
    settings: Settings,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    flag_store: &'a mut dyn FlagStore,
}

impl<'a> Emulator<'a> {
    pub fn new(
        settings: Settings,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        flag_store: &'a mut dyn FlagStore,
    ) -> Self {
        let interpreter = match settings.seed {
            Some(seed) => Chip8Interpreter::with_seed(seed),
            None => Chip8Interpreter::new(),
        };
        Emulator {
            machine: Machine::new(),
            interpreter,
            keymap: settings.keymap.keymap(),
            settings,
            display,
            input,
            flag_store,
        }
    }

    /// load a program, start it from the top and bring back saved flags
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        self.machine.load_rom(rom);
        self.machine.pc = CHIP8_PROGRAM_ADDR;
        if let Some(flags) = self.flag_store.load()? {
            self.machine.flags = flags;
        }
        Ok(())
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    /// run until the program halts, the user quits or `max_frames` pass.
    /// flags are stored whichever way it ends
    pub fn main_loop(&mut self, max_frames: Option<u64>) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let outcome = self.run_frames(max_frames, &mut summary);
        if let Err(e) = &outcome {
            tracing::error!(error = %e, pc = self.machine.pc, "execution stopped");
        }
        self.flag_store.store(&self.machine.flags)?;
        outcome.map(|_| summary)
    }

    fn run_frames(&mut self, max_frames: Option<u64>, summary: &mut RunSummary) -> Result<()> {
        let frame_duration = self.settings.frame_duration();
        while max_frames.map_or(true, |max| summary.frames < max) {
            let frame_start = Instant::now();

            if self.input.pump(&mut self.machine, &self.keymap)? == Control::Quit {
                tracing::debug!(frames = summary.frames, "quit requested");
                return Ok(());
            }

            let mut dirty = false;
            for _ in 0..self.settings.instructions_per_frame {
                match self.interpreter.execute_next(&mut self.machine)? {
                    Step::Halted => summary.halted = true,
                    step => {
                        summary.instructions += 1;
                        dirty |= step.is_draw();
                    }
                }
                if summary.halted {
                    break;
                }
            }
            summary.frames += 1;

            if dirty {
                self.display.draw(self.machine.framebuffer())?;
            }
            if summary.halted {
                tracing::trace!(
                    "final frame\n{}",
                    frame_to_string(self.machine.framebuffer(), SCREEN_WIDTH, SCREEN_HEIGHT)
                );
                return Ok(());
            }

            if let Some(rest) = frame_duration.checked_sub(frame_start.elapsed()) {
                spin_sleep::sleep(rest);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::RecordingDisplay;
    use crate::error::Chip8Error;
    use crate::flags::MemoryFlagStore;
    use crate::input::{KeyChange, ScriptedInput};

    fn settings() -> Settings {
        let mut s = Settings::new("test.ch8");
        s.frame_rate = 0;
        s.seed = Some(1);
        s
    }

    fn rom(program: &[u16]) -> Vec<u8> {
        program.iter().flat_map(|op| op.to_be_bytes()).collect()
    }

    #[test]
    fn test_runs_to_halt() -> Result<()> {
        let mut display = RecordingDisplay::new();
        let mut input = ScriptedInput::new(vec![]);
        let mut flags = MemoryFlagStore::new();
        let mut emu = Emulator::new(settings(), &mut display, &mut input, &mut flags);
        // 25 no-ops then jump to self
        let mut program = vec![0x0000; 25];
        program.push(0x1232);
        emu.load_rom(&rom(&program))?;
        let summary = emu.main_loop(Some(100))?;
        assert_eq!(
            summary,
            RunSummary {
                frames: 2,
                instructions: 25,
                halted: true
            }
        );
        assert!(display.frames.is_empty());
        Ok(())
    }

    #[test]
    fn test_redraws_after_draw() -> Result<()> {
        let mut display = RecordingDisplay::new();
        let mut input = ScriptedInput::new(vec![]);
        let mut flags = MemoryFlagStore::new();
        let mut emu = Emulator::new(settings(), &mut display, &mut input, &mut flags);
        // I = glyph 0, draw it at (0, 0), then stop
        emu.load_rom(&rom(&[0xA000, 0xD005, 0x1204]))?;
        emu.main_loop(None)?;
        assert_eq!(display.frames.len(), 1);
        let frame = display.last_frame().unwrap();
        assert_eq!(frame[0], 0xF0);
        assert_eq!(frame[8], 0x90);
        Ok(())
    }

    #[test]
    fn test_frame_limit_and_quit() -> Result<()> {
        let mut display = RecordingDisplay::new();
        let mut input = ScriptedInput::new(vec![]).quit_at(2);
        let mut flags = MemoryFlagStore::new();
        let mut emu = Emulator::new(settings(), &mut display, &mut input, &mut flags);
        // wait for a key forever
        emu.load_rom(&rom(&[0xF00A]))?;
        let summary = emu.main_loop(Some(10))?;
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.instructions, 40);
        assert!(!summary.halted);
        Ok(())
    }

    #[test]
    fn test_key_releases_wait() -> Result<()> {
        let mut display = RecordingDisplay::new();
        let mut input = ScriptedInput::new(vec![KeyChange {
            frame: 1,
            identifier: "ArrowUp".into(),
            pressed: true,
        }]);
        let mut flags = MemoryFlagStore::new();
        let mut emu = Emulator::new(settings(), &mut display, &mut input, &mut flags);
        emu.load_rom(&rom(&[0xF50A]))?;
        let summary = emu.main_loop(Some(10))?;
        assert!(summary.halted);
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.instructions, 21);
        assert_eq!(emu.machine().v[5], 1);
        Ok(())
    }

    #[test]
    fn test_key_set_by_host() -> Result<()> {
        let mut display = RecordingDisplay::new();
        let mut input = ScriptedInput::new(vec![]);
        let mut flags = MemoryFlagStore::new();
        let mut emu = Emulator::new(settings(), &mut display, &mut input, &mut flags);
        emu.load_rom(&rom(&[0xF20A]))?;
        emu.machine_mut().press_key(0xF, true);
        let summary = emu.main_loop(Some(1))?;
        assert_eq!((summary.instructions, summary.halted), (1, true));
        assert_eq!(emu.machine().v[2], 1);
        Ok(())
    }

    #[test]
    fn test_flags_restored_and_stored() -> Result<()> {
        let mut display = RecordingDisplay::new();
        let mut input = ScriptedInput::new(vec![]);
        let mut flags = MemoryFlagStore::new();
        flags.saved = Some("[5,6]".to_string());
        {
            let mut emu = Emulator::new(settings(), &mut display, &mut input, &mut flags);
            // V0..V1 = flags; V1 += 1; flags = V0..V1
            emu.load_rom(&rom(&[0xF185, 0x7101, 0xF175]))?;
            assert_eq!(emu.machine().flags[1], 6);
            emu.main_loop(None)?;
        }
        assert_eq!(flags.saved.as_deref(), Some("[5,7,0,0,0,0,0,0,0,0,0,0,0,0,0,0]"));
        Ok(())
    }

    #[test]
    fn test_error_still_stores_flags() {
        let mut display = RecordingDisplay::new();
        let mut input = ScriptedInput::new(vec![]);
        let mut flags = MemoryFlagStore::new();
        let result = {
            let mut emu = Emulator::new(settings(), &mut display, &mut input, &mut flags);
            emu.load_rom(&rom(&[0x6009, 0xF075, 0xFFFF])).unwrap();
            emu.main_loop(None)
        };
        assert!(matches!(result, Err(Chip8Error::InvalidOpcode { opcode: 0xFFFF })));
        assert_eq!(flags.load().unwrap().unwrap()[0], 9);
    }

    #[test]
    fn test_reload_restarts_program() -> Result<()> {
        let mut display = RecordingDisplay::new();
        let mut input = ScriptedInput::new(vec![]);
        let mut flags = MemoryFlagStore::new();
        let mut emu = Emulator::new(settings(), &mut display, &mut input, &mut flags);
        emu.load_rom(&rom(&[0x6107, 0x0000]))?;
        emu.main_loop(None)?;
        assert_eq!(emu.machine().pc, 0x204);
        emu.load_rom(&rom(&[0x6203]))?;
        assert_eq!(emu.machine().pc, 0x200);
        assert_eq!(emu.machine().v[1], 0);
        emu.main_loop(None)?;
        assert_eq!(emu.machine().v[2], 3);
        Ok(())
    }
}
