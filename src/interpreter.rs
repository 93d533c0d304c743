//! # interpreter
//!
//! Fetch, decode and execute one instruction at a time against a `Machine`.
//! The interpreter itself keeps nothing but a random number source, so one
//! can drive any number of machines.
//!
//!  fetch    PC must be inside the loaded program, else we've halted
//!  guard    a jump to itself is how programs end; halt instead of spinning
//!  decode   see `Instruction::decode`
//!  execute  mutate the machine, then count the instruction for the timers

use crate::error::{Chip8Error, Result};
use crate::instruction::Instruction;
use crate::machine::Machine;
use crate::memory::{MemoryMap, CHIP8_FONT_ADDR, CHIP8_GLYPH_BYTES};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// what happened on one call to `execute_next`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// this opcode ran
    Executed(u16),
    /// nothing left to run: PC left the program, or the program jumped to itself
    Halted,
}

impl Step {
    /// the raw value a driver loop keys off: the opcode, or -1 once halted
    pub fn as_raw(self) -> i32 {
        match self {
            Step::Executed(opcode) => opcode as i32,
            Step::Halted => -1,
        }
    }

    /// true after a DXYN, i.e. when the screen is worth redrawing
    pub fn is_draw(self) -> bool {
        matches!(self, Step::Executed(opcode) if opcode >> 12 == 0xD)
    }
}

pub struct Chip8Interpreter {
    rng: StdRng,
}

impl Default for Chip8Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip8Interpreter {
    pub fn new() -> Self {
        Chip8Interpreter {
            rng: StdRng::from_os_rng(),
        }
    }

    /// same seed, same CXNN results
    pub fn with_seed(seed: u64) -> Self {
        Chip8Interpreter {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// read the opcode at PC and move PC past it; None once PC has left the
    /// program
    pub fn fetch(&self, machine: &mut Machine) -> Result<Option<u16>> {
        let (start, end) = machine.program_bounds().ok_or(Chip8Error::RomNotLoaded)?;
        let pc = machine.pc;
        if pc < start || pc as usize >= end {
            return Ok(None);
        }
        let opcode = machine.memory.get_word(pc as usize);
        machine.pc = pc.wrapping_add(2);
        Ok(Some(opcode))
    }

    /// run one instruction
    pub fn execute_next(&mut self, machine: &mut Machine) -> Result<Step> {
        let opcode = match self.fetch(machine)? {
            Some(opcode) => opcode,
            None => {
                tracing::debug!(pc = machine.pc, "PC outside program, halting");
                return Ok(Step::Halted);
            }
        };

        // dead loop check, before the jump happens
        if opcode >> 12 == 0x1 && opcode & 0x0FFF == machine.pc.wrapping_sub(2) {
            tracing::debug!(pc = machine.pc.wrapping_sub(2), "jump to self, halting");
            return Ok(Step::Halted);
        }

        let instruction = Instruction::decode(opcode)?;
        self.execute(machine, instruction)?;
        machine.tick();
        Ok(Step::Executed(opcode))
    }

    fn execute(&mut self, m: &mut Machine, instruction: Instruction) -> Result<()> {
        match instruction {
            Instruction::Nop => {}
            Instruction::ClearScreen => {
                m.memory.screen_mut().fill(0);
            }
            Instruction::Return => {
                m.pc = m.pop()?;
            }
            Instruction::Jump(addr) => {
                m.pc = addr;
            }
            Instruction::Call(addr) => {
                m.push(m.pc)?;
                m.pc = addr;
            }
            Instruction::SkipIfEqualByte(x, value) => {
                if m.v[x] == value {
                    skip(m);
                }
            }
            Instruction::SkipIfNotEqualByte(x, value) => {
                if m.v[x] != value {
                    skip(m);
                }
            }
            Instruction::SkipIfRegistersEqual(x, y) => {
                if m.v[x] == m.v[y] {
                    skip(m);
                }
            }
            Instruction::SetRegister(x, value) => {
                m.v[x] = value;
            }
            Instruction::AddToRegister(x, value) => {
                m.v[x] = m.v[x].wrapping_add(value);
            }
            Instruction::Copy(x, y) => {
                m.v[x] = m.v[y];
            }
            Instruction::Or(x, y) => {
                m.v[x] |= m.v[y];
            }
            Instruction::And(x, y) => {
                m.v[x] &= m.v[y];
            }
            Instruction::Xor(x, y) => {
                m.v[x] ^= m.v[y];
            }
            // NB. in the arithmetic ops VF is written last, so with X = F the
            // flag wins over the result
            Instruction::AddWithCarry(x, y) => {
                let (sum, overflow) = m.v[x].overflowing_add(m.v[y]);
                m.v[x] = sum;
                m.v[0xF] = overflow as u8;
            }
            Instruction::Subtract(x, y) => {
                let (diff, borrow) = m.v[x].overflowing_sub(m.v[y]);
                m.v[x] = diff;
                m.v[0xF] = !borrow as u8;
            }
            Instruction::ShiftRight(x, y) => {
                let vx = m.v[x];
                m.v[x] = m.v[y] >> 1;
                m.v[0xF] = vx & 1;
            }
            Instruction::SubtractReversed(x, y) => {
                let (diff, borrow) = m.v[y].overflowing_sub(m.v[x]);
                m.v[x] = diff;
                m.v[0xF] = !borrow as u8;
            }
            Instruction::ShiftLeft(x, y) => {
                let vx = m.v[x];
                m.v[x] = m.v[y] << 1;
                m.v[0xF] = (vx >> 7) & 1;
            }
            Instruction::SkipIfRegistersNotEqual(x, y) => {
                if m.v[x] != m.v[y] {
                    skip(m);
                }
            }
            Instruction::SetIndex(addr) => {
                m.i = addr;
            }
            Instruction::JumpOffset(addr) => {
                m.pc = addr + m.v[0] as u16;
            }
            Instruction::Random(x, mask) => {
                let n: u8 = self.rng.random();
                m.v[x] = n & mask;
            }
            Instruction::Draw(x, y, rows) => {
                let (vx, vy) = (m.v[x], m.v[y]);
                let collision = draw_sprite(m, vx, vy, rows);
                m.v[0xF] = collision as u8;
            }
            Instruction::SkipIfKeyPressed(x) => {
                if m.is_key_pressed(m.v[x]) {
                    skip(m);
                }
            }
            Instruction::SkipIfKeyNotPressed(x) => {
                if !m.is_key_pressed(m.v[x]) {
                    skip(m);
                }
            }
            Instruction::ReadDelayTimer(x) => {
                m.v[x] = m.delay_timer;
            }
            Instruction::WaitForKey(x) => {
                // stores whether the key is down, not which key it was
                let mut any_pressed = false;
                for pressed in m.keys {
                    if pressed {
                        any_pressed = true;
                        m.v[x] = pressed as u8;
                    }
                }
                if !any_pressed {
                    // run this again next step
                    m.pc = m.pc.wrapping_sub(2);
                }
            }
            Instruction::SetDelayTimer(x) => {
                m.delay_timer = m.v[x];
            }
            Instruction::SetSoundTimer(x) => {
                m.sound_timer = m.v[x];
            }
            Instruction::AddToIndex(x) => {
                m.i = m.i.wrapping_add(m.v[x] as u16);
            }
            Instruction::FontGlyph(x) => {
                m.i = CHIP8_FONT_ADDR + m.v[x] as u16 * CHIP8_GLYPH_BYTES;
            }
            Instruction::StoreBcd(x) => {
                let value = m.v[x];
                let i = m.i as usize;
                m.write_byte(i, value / 100);
                m.write_byte(i + 1, (value / 10) % 10);
                m.write_byte(i + 2, value % 10);
            }
            Instruction::StoreRegisters(x) => {
                let i = m.i as usize;
                for r in 0..=x {
                    m.write_byte(i + r, m.v[r]);
                }
                m.i = m.i.wrapping_add(x as u16 + 1);
            }
            Instruction::LoadRegisters(x) => {
                let i = m.i as usize;
                for r in 0..=x {
                    m.v[r] = m.read_byte(i + r);
                }
                m.i = m.i.wrapping_add(x as u16 + 1);
            }
            Instruction::SaveFlags(x) => {
                m.flags[..=x].copy_from_slice(&m.v[..=x]);
            }
            Instruction::RestoreFlags(x) => {
                m.v[..=x].copy_from_slice(&m.flags[..=x]);
            }
        }
        Ok(())
    }
}

fn skip(m: &mut Machine) {
    m.pc = m.pc.wrapping_add(2);
}

/// XOR `rows` bytes of sprite from I onto the screen at (x, y). every pixel
/// wraps around the edges on its own. true if any lit pixel was turned off
fn draw_sprite(m: &mut Machine, x: u8, y: u8, rows: u8) -> bool {
    let base = m.i as usize;
    let mut collision = false;
    for row in 0..rows as usize {
        let sprite = m.read_byte(base + row);
        for col in 0..8 {
            if sprite & (0x80 >> col) == 0 {
                continue;
            }
            let px = (x as usize + col) % SCREEN_WIDTH;
            let py = (y as usize + row) % SCREEN_HEIGHT;
            collision |= toggle_pixel(m.memory.screen_mut(), px, py);
        }
    }
    collision
}

/// flip one pixel; true if it was lit. pixels past the end of a short
/// (detached) screen don't exist and never collide
fn toggle_pixel(screen: &mut [u8], x: usize, y: usize) -> bool {
    let index = y * SCREEN_WIDTH + x;
    let mask = 0x80u8 >> (index % 8);
    match screen.get_mut(index / 8) {
        Some(byte) => {
            let was_lit = *byte & mask != 0;
            *byte ^= mask;
            was_lit
        }
        None => false,
    }
}
