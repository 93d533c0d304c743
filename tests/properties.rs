use chip8vm::interpreter::{Chip8Interpreter, Step};
use chip8vm::machine::Machine;
use chip8vm::memory::MemoryMap;
use proptest::prelude::*;

fn machine_with(program: &[u16]) -> Machine {
    let rom: Vec<u8> = program.iter().flat_map(|op| op.to_be_bytes()).collect();
    let mut m = Machine::new();
    m.load_rom(&rom);
    m
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        rng_algorithm: proptest::test_runner::RngAlgorithm::ChaCha,
        rng_seed: proptest::test_runner::RngSeed::Fixed(0x0C_48),
        .. ProptestConfig::default()
    })]

    #[test]
    fn set_then_add_wraps(x in 0u16..16, nn in any::<u8>(), nn2 in any::<u8>()) {
        let mut m = machine_with(&[0x6000 | x << 8 | nn as u16, 0x7000 | x << 8 | nn2 as u16]);
        let mut i = Chip8Interpreter::with_seed(0);
        i.execute_next(&mut m).unwrap();
        i.execute_next(&mut m).unwrap();
        prop_assert_eq!(m.v[x as usize], nn.wrapping_add(nn2));
    }

    #[test]
    fn add_sets_carry_on_overflow(
        x in 0usize..16,
        y in 0usize..16,
        regs in proptest::array::uniform16(any::<u8>()),
    ) {
        let mut m = machine_with(&[0x8004 | (x as u16) << 8 | (y as u16) << 4]);
        m.v = regs;
        let mut i = Chip8Interpreter::with_seed(0);
        i.execute_next(&mut m).unwrap();
        let carry = regs[x] as u16 + regs[y] as u16 > 255;
        prop_assert_eq!(m.v[0xF], carry as u8);
        if x != 0xF {
            prop_assert_eq!(m.v[x], regs[x].wrapping_add(regs[y]));
        }
    }

    #[test]
    fn load_round_trips_or_detaches(rom in proptest::collection::vec(1u8.., 0..0xE00usize)) {
        let mut m = Machine::new();
        m.load_rom(&rom);
        if 0x200 + rom.len() < 0xF00 {
            prop_assert_eq!(m.memory.get_ro_slice(0x200, rom.len()), &rom[..]);
            prop_assert_eq!(m.framebuffer().len(), 256);
        } else {
            prop_assert_eq!(m.framebuffer().len(), 255);
            prop_assert!(m.memory.get_ro_slice(0x200, 0xD00).iter().all(|b| *b == 0));
        }
    }

    #[test]
    fn self_jump_halts_anywhere(pad in 0usize..64) {
        let mut program = vec![0x0000; pad];
        program.push(0x1200 + 2 * pad as u16);
        let mut m = machine_with(&program);
        let mut i = Chip8Interpreter::with_seed(0);
        for _ in 0..pad {
            prop_assert_eq!(i.execute_next(&mut m).unwrap(), Step::Executed(0x0000));
        }
        prop_assert_eq!(i.execute_next(&mut m).unwrap(), Step::Halted);
        prop_assert_eq!(m.ticks as usize, pad);
    }
}
