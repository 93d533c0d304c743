use crate::error::{Chip8Error, Result};

/// a register index, 0x0-0xf
pub type Reg = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 0N00 - do nothing
    Nop,
    /// 0NE0 - clear screen
    ClearScreen,
    /// 0NEE - return from subroutine
    Return,
    /// 1NNN - jump to NNN
    Jump(u16),
    /// 2NNN - call subroutine at NNN
    Call(u16),
    /// 3XNN - skip next if VX equals NN
    SkipIfEqualByte(Reg, u8),
    /// 4XNN - skip next if VX does not equal NN
    SkipIfNotEqualByte(Reg, u8),
    /// 5XY0 - skip next if VX equals VY
    SkipIfRegistersEqual(Reg, Reg),
    /// 6XNN - set VX to NN
    SetRegister(Reg, u8),
    /// 7XNN - add NN to VX, no carry
    AddToRegister(Reg, u8),
    /// 8XY0 - set VX to VY
    Copy(Reg, Reg),
    /// 8XY1 - VX |= VY
    Or(Reg, Reg),
    /// 8XY2 - VX &= VY
    And(Reg, Reg),
    /// 8XY3 - VX ^= VY
    Xor(Reg, Reg),
    /// 8XY4 - VX += VY, VF = carry
    AddWithCarry(Reg, Reg),
    /// 8XY5 - VX -= VY, VF = 1 unless it went negative
    Subtract(Reg, Reg),
    /// 8XY6 - VX = VY >> 1, VF = old VX & 1
    ShiftRight(Reg, Reg),
    /// 8XY7 - VX = VY - VX, VF = 1 unless it went negative
    SubtractReversed(Reg, Reg),
    /// 8XYE - VX = VY << 1, VF = old VX >> 7
    ShiftLeft(Reg, Reg),
    /// 9XY0 - skip next if VX does not equal VY
    SkipIfRegistersNotEqual(Reg, Reg),
    /// ANNN - set I to NNN
    SetIndex(u16),
    /// BNNN - jump to NNN + V0
    JumpOffset(u16),
    /// CXNN - set VX to a random byte & NN
    Random(Reg, u8),
    /// DXYN - draw N rows of sprite from I at VX, VY
    Draw(Reg, Reg, u8),
    /// EX9E - skip next if key VX is down
    SkipIfKeyPressed(Reg),
    /// EXA1 - skip next if key VX is up
    SkipIfKeyNotPressed(Reg),
    /// FX07 - set VX to the delay timer
    ReadDelayTimer(Reg),
    /// FX0A - wait for any key, then VX = 1
    WaitForKey(Reg),
    /// FX15 - set the delay timer to VX
    SetDelayTimer(Reg),
    /// FX18 - set the sound timer to VX
    SetSoundTimer(Reg),
    /// FX1E - I += VX
    AddToIndex(Reg),
    /// FX29 - point I at the font glyph for VX
    FontGlyph(Reg),
    /// FX33 - store BCD of VX at I, I+1, I+2
    StoreBcd(Reg),
    /// FX55 - dump V0..=VX to memory at I, then I += X + 1
    StoreRegisters(Reg),
    /// FX65 - load V0..=VX from memory at I, then I += X + 1
    LoadRegisters(Reg),
    /// FX75 - save V0..=VX into the flag registers
    SaveFlags(Reg),
    /// FX85 - restore V0..=VX from the flag registers
    RestoreFlags(Reg),
}

impl Instruction {
    pub fn decode(opcode: u16) -> Result<Self> {
        let family = opcode >> 12;
        let nnn = opcode & 0x0FFF;
        let nn = (opcode & 0x00FF) as u8;
        let n = (opcode & 0x000F) as u8;
        let x = ((opcode >> 8) & 0xF) as Reg;
        let y = ((opcode >> 4) & 0xF) as Reg;
        let invalid = Err(Chip8Error::InvalidOpcode { opcode });

        // NB. families 0, E and F only look at the low byte; the X nibble of a
        // 0-family opcode is ignored
        let instruction = match (family, nn) {
            (0x0, 0x00) => Instruction::Nop,
            (0x0, 0xE0) => Instruction::ClearScreen,
            (0x0, 0xEE) => Instruction::Return,
            (0x0, _) => return invalid,
            (0x1, _) => Instruction::Jump(nnn),
            (0x2, _) => Instruction::Call(nnn),
            (0x3, _) => Instruction::SkipIfEqualByte(x, nn),
            (0x4, _) => Instruction::SkipIfNotEqualByte(x, nn),
            (0x5, _) if n == 0 => Instruction::SkipIfRegistersEqual(x, y),
            (0x6, _) => Instruction::SetRegister(x, nn),
            (0x7, _) => Instruction::AddToRegister(x, nn),
            (0x8, _) => match n {
                0x0 => Instruction::Copy(x, y),
                0x1 => Instruction::Or(x, y),
                0x2 => Instruction::And(x, y),
                0x3 => Instruction::Xor(x, y),
                0x4 => Instruction::AddWithCarry(x, y),
                0x5 => Instruction::Subtract(x, y),
                0x6 => Instruction::ShiftRight(x, y),
                0x7 => Instruction::SubtractReversed(x, y),
                0xE => Instruction::ShiftLeft(x, y),
                _ => return invalid,
            },
            (0x9, _) if n == 0 => Instruction::SkipIfRegistersNotEqual(x, y),
            (0xA, _) => Instruction::SetIndex(nnn),
            (0xB, _) => Instruction::JumpOffset(nnn),
            (0xC, _) => Instruction::Random(x, nn),
            (0xD, _) => Instruction::Draw(x, y, n),
            (0xE, 0x9E) => Instruction::SkipIfKeyPressed(x),
            (0xE, 0xA1) => Instruction::SkipIfKeyNotPressed(x),
            (0xF, 0x07) => Instruction::ReadDelayTimer(x),
            (0xF, 0x0A) => Instruction::WaitForKey(x),
            (0xF, 0x15) => Instruction::SetDelayTimer(x),
            (0xF, 0x18) => Instruction::SetSoundTimer(x),
            (0xF, 0x1E) => Instruction::AddToIndex(x),
            (0xF, 0x29) => Instruction::FontGlyph(x),
            (0xF, 0x33) => Instruction::StoreBcd(x),
            (0xF, 0x55) => Instruction::StoreRegisters(x),
            (0xF, 0x65) => Instruction::LoadRegisters(x),
            (0xF, 0x75) => Instruction::SaveFlags(x),
            (0xF, 0x85) => Instruction::RestoreFlags(x),
            // 5XYN, 9XYN with N != 0, and unknown E/F codes
            _ => return invalid,
        };
        Ok(instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(opcode: u16) {
        match Instruction::decode(opcode) {
            Err(Chip8Error::InvalidOpcode { opcode: got }) => assert_eq!(got, opcode),
            other => panic!("{:04X} decoded to {:?}", opcode, other),
        }
    }

    #[test]
    fn test_decode_operands() {
        assert_eq!(Instruction::decode(0x1234).unwrap(), Instruction::Jump(0x234));
        assert_eq!(Instruction::decode(0x3A42).unwrap(), Instruction::SkipIfEqualByte(0xA, 0x42));
        assert_eq!(Instruction::decode(0x8AB4).unwrap(), Instruction::AddWithCarry(0xA, 0xB));
        assert_eq!(Instruction::decode(0xD125).unwrap(), Instruction::Draw(1, 2, 5));
        assert_eq!(Instruction::decode(0xBFFF).unwrap(), Instruction::JumpOffset(0xFFF));
        assert_eq!(Instruction::decode(0xF385).unwrap(), Instruction::RestoreFlags(3));
    }

    #[test]
    fn test_family_zero_ignores_high_nibble() {
        assert_eq!(Instruction::decode(0x0000).unwrap(), Instruction::Nop);
        assert_eq!(Instruction::decode(0x03E0).unwrap(), Instruction::ClearScreen);
        assert_eq!(Instruction::decode(0x00EE).unwrap(), Instruction::Return);
    }

    #[test]
    fn test_decode_invalid() {
        for opcode in [0x0123, 0x00E1, 0x5121, 0x912F, 0x8128, 0x812F, 0xE19F, 0xF100, 0xF1FF] {
            assert_invalid(opcode);
        }
    }
}
