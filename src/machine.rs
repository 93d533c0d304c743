//! # machine
//!
//! All of the mutable state of one CHIP-8 VM. The interpreter works on a
//! `&mut Machine`; the driver owns it and is the only thing that touches it
//! between steps (key events, flag restore).
//!
//!  V0-VF      general purpose, VF doubles as the carry/collision flag
//!  FLAG0-F    persistent storage, only touched by FX75/FX85
//!  I          address register
//!  PC         program counter, starts at 0x200
//!  SP         index of the next free stack slot; 0 is empty
//!  DT, ST     delay and sound timers, counted down every 6 instructions

use crate::error::{Chip8Error, Result};
use crate::input::Keymap;
use crate::memory::{
    Chip8MemoryMap, MemoryMap, CHIP8_DISPLAY_ADDR, CHIP8_PROGRAM_ADDR, CHIP8_STACK_SLOTS,
};

pub const REGISTER_COUNT: usize = 16;
pub const KEY_COUNT: usize = 16;

/// timers count down once per this many executed instructions
pub const TICKS_PER_TIMER_STEP: u32 = 6;

pub struct Machine {
    pub memory: Chip8MemoryMap,
    pub v: [u8; REGISTER_COUNT],
    pub flags: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub sp: usize,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub keys: [bool; KEY_COUNT],
    pub ticks: u32,
    rom_size: Option<usize>,
    first_load: bool,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            memory: Chip8MemoryMap::new(),
            v: [0; REGISTER_COUNT],
            flags: [0; REGISTER_COUNT],
            i: 0,
            pc: CHIP8_PROGRAM_ADDR,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            keys: [false; KEY_COUNT],
            ticks: 0,
            rom_size: None,
            first_load: true,
        }
    }

    /// zero everything a fresh program shouldn't inherit. PC is left alone,
    /// resetting it is up to whoever loads the next program
    pub fn reset(&mut self) {
        self.sp = 0;
        self.i = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.ticks = 0;
        self.v.fill(0);
        self.flags.fill(0);
        self.memory.screen_mut().fill(0);
        self.memory.clear_stack();
    }

    /// load a program at 0x200. a program big enough to reach display RAM is
    /// not copied at all; the screen gets its own buffer instead
    pub fn load_rom(&mut self, rom: &[u8]) {
        if self.first_load {
            self.first_load = false;
        } else {
            self.reset();
        }
        self.rom_size = Some(rom.len());

        let limit = (CHIP8_DISPLAY_ADDR - CHIP8_PROGRAM_ADDR) as usize;
        if rom.len() >= limit {
            tracing::info!(
                size = rom.len(),
                limit,
                "ROM reaches display RAM, using a detached screen buffer"
            );
            self.memory.detach_screen();
            return;
        }
        self.memory.attach_screen();
        self.memory.load_program(rom);
        tracing::debug!(size = rom.len(), "ROM loaded");
    }

    pub fn rom_size(&self) -> Option<usize> {
        self.rom_size
    }

    /// the half-open range of addresses PC may fetch from
    pub fn program_bounds(&self) -> Option<(u16, usize)> {
        self.rom_size
            .map(|size| (CHIP8_PROGRAM_ADDR, CHIP8_PROGRAM_ADDR as usize + size))
    }

    /// bit-packed 64x32 screen, MSB is the leftmost pixel
    pub fn framebuffer(&self) -> &[u8] {
        self.memory.screen()
    }

    /// update a key by the name the front-end knows it by; names the keymap
    /// doesn't know are ignored
    pub fn set_key(&mut self, keymap: &Keymap, identifier: &str, pressed: bool) {
        if let Some(index) = keymap.resolve(identifier) {
            self.press_key(index, pressed);
        }
    }

    pub fn press_key(&mut self, index: u8, pressed: bool) {
        if let Some(key) = self.keys.get_mut(index as usize) {
            *key = pressed;
        }
    }

    pub fn is_key_pressed(&self, index: u8) -> bool {
        self.keys.get(index as usize).copied().unwrap_or(false)
    }

    /// push a return address
    pub fn push(&mut self, addr: u16) -> Result<()> {
        if self.sp >= CHIP8_STACK_SLOTS {
            return Err(Chip8Error::StackOverflow {
                capacity: CHIP8_STACK_SLOTS,
            });
        }
        self.memory.set_stack_slot(self.sp, addr);
        self.sp += 1;
        Ok(())
    }

    /// pop a return address
    pub fn pop(&mut self) -> Result<u16> {
        if self.sp == 0 {
            return Err(Chip8Error::StackUnderflow);
        }
        self.sp -= 1;
        Ok(self.memory.stack_slot(self.sp))
    }

    /// count one executed instruction; every 6th one steps the timers
    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        if self.ticks % TICKS_PER_TIMER_STEP != 0 {
            return;
        }
        let mut stepped = false;
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
            stepped = true;
        }
        if self.sound_timer > 0 {
            self.sound_timer -= 1;
            stepped = true;
        }
        if stepped {
            self.ticks = 0;
        }
    }

    pub fn read_byte(&self, addr: usize) -> u8 {
        self.memory.read_byte(addr)
    }

    pub fn write_byte(&mut self, addr: usize, value: u8) {
        self.memory.write_byte(addr, value)
    }
}
