// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the flat address space. Reads outside of it yield 0 and writes
/// outside of it are dropped, which is what a ROM poking past 0xfff expects.
pub trait MemoryMap {
    /// write a chunk of bytes into "RAM", clipping whatever falls off the end
    fn write(&mut self, data: &[u8], addr: usize) {
        for (offset, byte) in data.iter().enumerate() {
            self.write_byte(addr + offset, *byte);
        }
    }

    /// get a big-endian two-byte word (opcode fetch)
    fn get_word(&self, addr: usize) -> u16 {
        ((self.read_byte(addr) as u16) << 8) | self.read_byte(addr + 1) as u16
    }

    fn read_byte(&self, addr: usize) -> u8;

    fn write_byte(&mut self, addr: usize, value: u8);

    /// get a r/o slice of the underlying memory (heap)
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8];
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the font glyphs live; 16 glyphs of 5 bytes each
pub const CHIP8_FONT_ADDR: u16 = 0x000;
pub const CHIP8_GLYPH_BYTES: u16 = 5;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// call stack, 16bit words in 0x0ea0-0x0eff
pub const CHIP8_STACK_ADDR: u16 = 0x0ea0;
pub const CHIP8_STACK_SLOTS: usize = (0x0f00 - CHIP8_STACK_ADDR as usize) / 2;

/// display, 64x32 one-bit pixels
pub const CHIP8_DISPLAY_ADDR: u16 = 0x0f00;
pub const CHIP8_DISPLAY_BYTES: usize = 0x100;

/// size of the stand-alone screen used when a ROM would run into display RAM
pub const CHIP8_DETACHED_DISPLAY_BYTES: usize = 0xff;

/// where the screen currently lives
enum Screen {
    /// 0x0f00-0x0fff of main memory
    Mapped,
    /// a separate buffer, so an oversized ROM can't be drawn over
    Detached(Box<[u8]>),
}

/// Defines the CHIP-8 memory map (4K configuration):
///   0x0000-0x004f  font
///   0x0050-0x01ff  unused (interpreter on the original hardware)
///   0x0200-0x0e9f  program
///   0x0ea0-0x0eff  stack
///   0x0f00-0x0fff  display
///
/// the stack and display are views over the same bytes as everything else;
/// a program that writes into them through I will corrupt them, as it should
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
    screen: Screen,
}

impl MemoryMap for Chip8MemoryMap {
    fn read_byte(&self, addr: usize) -> u8 {
        self.bytes.get(addr).copied().unwrap_or(0)
    }

    fn write_byte(&mut self, addr: usize, value: u8) {
        if let Some(byte) = self.bytes.get_mut(addr) {
            *byte = value;
        }
    }

    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8] {
        let a = (addr as usize).min(CHIP8_RAM_SIZE_BYTES);
        let end = (a + len).min(CHIP8_RAM_SIZE_BYTES);
        &self.bytes[a..end]
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip8MemoryMap {
    /// initialises memory with the font baked in at 0x000
    pub fn new() -> Self {
        let mut mm = Chip8MemoryMap {
            bytes: vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice(),
            screen: Screen::Mapped,
        };
        mm.write(&CHIP8_FONT, CHIP8_FONT_ADDR as usize);
        mm
    }

    /// copy a CHIP-8 program to 0x200
    pub fn load_program(&mut self, rom: &[u8]) {
        self.write(rom, CHIP8_PROGRAM_ADDR as usize);
    }

    /// the framebuffer, wherever it is at the moment
    pub fn screen(&self) -> &[u8] {
        match &self.screen {
            Screen::Mapped => {
                let a = CHIP8_DISPLAY_ADDR as usize;
                &self.bytes[a..a + CHIP8_DISPLAY_BYTES]
            }
            Screen::Detached(buf) => &buf[..],
        }
    }

    pub fn screen_mut(&mut self) -> &mut [u8] {
        match &mut self.screen {
            Screen::Mapped => {
                let a = CHIP8_DISPLAY_ADDR as usize;
                &mut self.bytes[a..a + CHIP8_DISPLAY_BYTES]
            }
            Screen::Detached(buf) => &mut buf[..],
        }
    }

    pub fn is_screen_detached(&self) -> bool {
        matches!(self.screen, Screen::Detached(_))
    }

    /// move the screen out of main memory into its own 255 byte buffer
    pub fn detach_screen(&mut self) {
        self.screen = Screen::Detached(vec![0u8; CHIP8_DETACHED_DISPLAY_BYTES].into_boxed_slice());
    }

    /// put the screen back at 0x0f00, blank
    pub fn attach_screen(&mut self) {
        if self.is_screen_detached() {
            self.screen = Screen::Mapped;
            self.screen_mut().fill(0);
        }
    }

    /// read stack slot n. NB. slots are stored little-endian, like the
    /// typed-array view the layout comes from
    pub fn stack_slot(&self, slot: usize) -> u16 {
        let a = CHIP8_STACK_ADDR as usize + slot * 2;
        u16::from_le_bytes([self.read_byte(a), self.read_byte(a + 1)])
    }

    pub fn set_stack_slot(&mut self, slot: usize, value: u16) {
        let a = CHIP8_STACK_ADDR as usize + slot * 2;
        let [lo, hi] = value.to_le_bytes();
        self.write_byte(a, lo);
        self.write_byte(a + 1, hi);
    }

    pub fn clear_stack(&mut self) {
        let a = CHIP8_STACK_ADDR as usize;
        self.bytes[a..a + CHIP8_STACK_SLOTS * 2].fill(0);
    }
}

const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_zeroed() {
        let m = Chip8MemoryMap::new();
        // NB. memory is zeroed from 0x50 because before that we bake in the font
        assert!(m.bytes[0x50..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_font_glyph_zero() {
        let m = Chip8MemoryMap::new();
        assert_eq!(m.get_ro_slice(0, 5), &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        // F is the last glyph
        assert_eq!(m.get_ro_slice(75, 5), &[0xF0, 0x80, 0xF0, 0x80, 0x80]);
    }

    #[test]
    fn test_write_past_end_is_clipped() {
        let mut dst = Chip8MemoryMap::new();
        dst.write(&[9; 8], 4092);
        assert_eq!(dst.get_ro_slice(4092, 8), &[9, 9, 9, 9]);
        assert_eq!(dst.read_byte(4096), 0);
        assert_eq!(dst.read_byte(usize::MAX - 1), 0);
    }

    #[test]
    fn test_read_word() {
        let mut m = Chip8MemoryMap::new();
        m.write(&[0, 1, 2, 3, 4, 5, 6, 7], 0x200);
        assert_eq!(m.get_word(0x204), 0x0405);
        // second byte past the end reads as zero
        m.write_byte(0xfff, 0x12);
        assert_eq!(m.get_word(0xfff), 0x1200);
    }

    #[test]
    fn test_program_load_ok() {
        let mut dst = Chip8MemoryMap::new();
        dst.load_program(&[0x00, 0xe0]); // clear screen
        assert_eq!(dst.get_ro_slice(0x200, 2), &[0x00, 0xe0]);
    }

    #[test]
    fn test_mem_layout() {
        assert_eq!(CHIP8_STACK_SLOTS, 48);
        assert_eq!(CHIP8_DISPLAY_ADDR as usize + CHIP8_DISPLAY_BYTES, CHIP8_RAM_SIZE_BYTES);
    }

    #[test]
    fn test_screen_aliases_ram() {
        let mut m = Chip8MemoryMap::new();
        m.write_byte(0xf00, 0x80);
        assert_eq!(m.screen()[0], 0x80);
        m.screen_mut()[255] = 0x01;
        assert_eq!(m.read_byte(0xfff), 0x01);
    }

    #[test]
    fn test_detached_screen_is_separate() {
        let mut m = Chip8MemoryMap::new();
        m.detach_screen();
        assert_eq!(m.screen().len(), 255);
        m.write_byte(0xf00, 0xff);
        assert_eq!(m.screen()[0], 0);
        m.attach_screen();
        assert_eq!(m.screen().len(), 256);
        assert_eq!(m.read_byte(0xf00), 0);
    }

    #[test]
    fn test_stack_slots_alias_ram() {
        let mut m = Chip8MemoryMap::new();
        m.set_stack_slot(0, 0x0234);
        assert_eq!(m.get_ro_slice(0xea0, 2), &[0x34, 0x02]);
        m.write_byte(0xea3, 0x0a);
        assert_eq!(m.stack_slot(1), 0x0a00);
        m.clear_stack();
        assert_eq!(m.stack_slot(0), 0);
        assert_eq!(m.stack_slot(1), 0);
    }
}
