use std::fmt;

use crate::cpu::flags;
use crate::cpu::flags::Flags;
use crate::utils::bits;

const STACK_PAGE: u8 = 0x01;

// Registers
#[derive(Clone, Eq, PartialEq)]
pub struct Reg {
    // Accumulator
    pub a: u8,

    // Indexes
    pub x: u8,
    pub y: u8,

    // Program counter
    pub pc: u16,

    // Stack pointer
    pub s: u8,

    // P Flags
    pub p: Flags,
}

impl Reg {
    // Power up state
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            s: 0xfd,
            p: flags::INTERRUPT_DISABLE | flags::UNUSED,
        }
    }

    // Stack always lives in page one
    pub fn stack_addr(&self) -> u16 { bits::word(STACK_PAGE, self.s) }
}

impl Default for Reg {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Reg {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        let p = self.p;

        write!(formatter,
               "a: {:02x}, x: {:02x}, y: {:02x}, pc: {:04x}, s: {:02x}, p: {:02x} {}{}__{}{}{}{}",
               self.a, self.x, self.y,
               self.pc, self.s, p.0,
               if p.get_negative() { 'n' } else { '_' },
               if p.get_overflow() { 'v' } else { '_' },
               if p.get_decimal_mode() { 'd' } else { '_' },
               if p.get_interrupt_disable() { 'i' } else { '_' },
               if p.get_zero() { 'z' } else { '_' },
               if p.get_carry() { 'c' } else { '_' })
    }
}
