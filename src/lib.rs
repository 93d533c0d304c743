//! A CHIP-8 virtual machine
//!
//! ## Design
//!
//! * one flat 4K address space; the call stack and the screen live in it, so
//!   programs can (and do) scribble over both
//! * run a fixed number of instructions per frame, then sleep out the frame
//! * timers count instructions, not wall clock: one step every 6 executed
//! * abstract display and input so the core runs headless; the terminal is
//!   just one front-end
//! * a program ends by running off its end or jumping to itself
//!
//! Model
//!
//! Emulator
//!  |-- settings, keymap, display, input, flag store
//!  |-- machine
//!  |    |-- memory map (font, program, stack, screen)
//!  |    `-- registers, flags, timers, keys
//!  |-- interpreter(machine)
//!  |    `-- instruction set
//!  `-- main loop
//!       |-- input.pump(machine)
//!       |-- interpreter.execute_next(machine) x instructions_per_frame
//!       |-- display.draw(framebuffer) if anything was drawn
//!       `-- sleep(rest of frame)
pub mod config;
pub mod display;
pub mod emulator;
pub mod error;
pub mod flags;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod machine;
pub mod memory;

pub use config::{KeymapPreset, Settings};
pub use emulator::{Emulator, RunSummary};
pub use error::{Chip8Error, Result};
pub use input::Keymap;
pub use interpreter::{Chip8Interpreter, Step};
pub use machine::Machine;
