use std::ops;

// Bit for each flag
pub const CARRY: Flags = Flags(0b0000_0001);
pub const ZERO: Flags = Flags(0b0000_0010);
pub const INTERRUPT_DISABLE: Flags = Flags(0b0000_0100);
pub const DECIMAL_MODE: Flags = Flags(0b0000_1000);
pub const BREAK_COMMAND: Flags = Flags(0b0001_0000);
pub const UNUSED: Flags = Flags(0b0010_0000);
pub const OVERFLOW: Flags = Flags(0b0100_0000);
pub const NEGATIVE: Flags = Flags(0b1000_0000);

// Flags for the P register
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Flags(pub u8);

impl Flags {
    pub fn change(&mut self, other: Self, condition: bool) {
        self.0 = if condition { self.0 | other.0 } else { self.0 & !other.0 }
    }

    pub fn contains(self, flags: Self) -> bool {
        (self.0 & flags.0) == flags.0
    }

    // Set and clear
    pub fn set(&mut self, flags: Self) { self.0 |= flags.0 }
    pub fn clear(&mut self, flags: Self) { self.0 &= !flags.0 }

    // Getter
    pub fn get_carry(self) -> bool { self.contains(CARRY) }
    pub fn get_zero(self) -> bool { self.contains(ZERO) }
    pub fn get_interrupt_disable(self) -> bool { self.contains(INTERRUPT_DISABLE) }
    pub fn get_decimal_mode(self) -> bool { self.contains(DECIMAL_MODE) }
    pub fn get_overflow(self) -> bool { self.contains(OVERFLOW) }
    pub fn get_negative(self) -> bool { self.contains(NEGATIVE) }

    pub fn change_zero_negative(&mut self, value: u8) {
        self.change(ZERO, value == 0);
        self.change(NEGATIVE, (value & 0b1000_0000) != 0);
    }

    // Set the Zero, Negative and Carry flag based on a comparison
    pub fn change_cmp(&mut self, value: u8, other: u8) {
        self.change(ZERO, value == other);
        self.change(CARRY, value >= other);

        // Negative has the same bit as the 7th of the difference
        let diff = value.wrapping_sub(other);
        self.change(NEGATIVE, (diff & 0b1000_0000) != 0);
    }

    // Value pulled from the stack. B doesn't exist in the register and bit 5 is always set.
    pub fn from_stack(data: u8) -> Self {
        Self((data & !BREAK_COMMAND.0) | UNUSED.0)
    }
}

impl From<u8> for Flags {
    fn from(data: u8) -> Self { Self(data) }
}

impl From<Flags> for u8 {
    fn from(flags: Flags) -> u8 { flags.0 }
}

impl ops::BitOr for Flags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}
