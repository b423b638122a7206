use crate::cpu::flags;
use crate::cpu::flags::Flags;
use crate::cpu::{Cpu, Memory};
use crate::utils::bits;

// Where an instruction finds its operand
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    IndirectX,
    IndirectY,
}

impl Cpu {
    // region Miscellaneous

    pub(crate) fn fetch(&mut self, memory: &mut dyn Memory) -> u8 {
        let data = memory.read(self.reg.pc);
        self.reg.pc = self.reg.pc.wrapping_add(1);
        data
    }

    pub(crate) fn fetch_word(&mut self, memory: &mut dyn Memory) -> u16 {
        let low = self.fetch(memory);
        let high = self.fetch(memory);
        bits::word(high, low)
    }

    pub(crate) fn read_word(memory: &mut dyn Memory, addr: u16) -> u16 {
        let low = memory.read(addr);
        let high = memory.read(addr.wrapping_add(1));
        bits::word(high, low)
    }

    // Pointers in the zero page wrap around inside it
    fn read_zero_page_word(memory: &mut dyn Memory, addr: u8) -> u16 {
        let low = memory.read(u16::from(addr));
        let high = memory.read(u16::from(addr.wrapping_add(1)));
        bits::word(high, low)
    }

    pub(crate) fn push(&mut self, memory: &mut dyn Memory, data: u8) {
        memory.write(self.reg.stack_addr(), data);
        self.reg.s = self.reg.s.wrapping_sub(1);
    }

    pub(crate) fn pull(&mut self, memory: &mut dyn Memory) -> u8 {
        self.reg.s = self.reg.s.wrapping_add(1);
        memory.read(self.reg.stack_addr())
    }

    pub(crate) fn push_word(&mut self, memory: &mut dyn Memory, data: u16) {
        self.push(memory, bits::high(data));
        self.push(memory, bits::low(data));
    }

    fn pull_word(&mut self, memory: &mut dyn Memory) -> u16 {
        let low = self.pull(memory);
        let high = self.pull(memory);
        bits::word(high, low)
    }

    // Effective address of the operand and whether indexing crossed a page
    pub(crate) fn address(&mut self, memory: &mut dyn Memory, mode: Mode) -> (u16, bool) {
        match mode {
            Mode::Immediate => {
                let addr = self.reg.pc;
                self.reg.pc = addr.wrapping_add(1);
                (addr, false)
            }
            Mode::ZeroPage => (u16::from(self.fetch(memory)), false),
            Mode::ZeroPageX => (u16::from(self.fetch(memory).wrapping_add(self.reg.x)), false),
            Mode::ZeroPageY => (u16::from(self.fetch(memory).wrapping_add(self.reg.y)), false),
            Mode::Absolute => (self.fetch_word(memory), false),
            Mode::AbsoluteX => {
                let base = self.fetch_word(memory);
                let addr = base.wrapping_add(u16::from(self.reg.x));
                (addr, bits::crosses_page(base, addr))
            }
            Mode::AbsoluteY => {
                let base = self.fetch_word(memory);
                let addr = base.wrapping_add(u16::from(self.reg.y));
                (addr, bits::crosses_page(base, addr))
            }
            Mode::IndirectX => {
                let pointer = self.fetch(memory).wrapping_add(self.reg.x);
                (Self::read_zero_page_word(memory, pointer), false)
            }
            Mode::IndirectY => {
                let pointer = self.fetch(memory);
                let base = Self::read_zero_page_word(memory, pointer);
                let addr = base.wrapping_add(u16::from(self.reg.y));
                (addr, bits::crosses_page(base, addr))
            }
        }
    }

    // endregion

    // region Loads and transfers

    pub fn lda(&mut self, data: u8) {
        trace!(target: "opcode", "lda, data: 0x{:02x}", data);
        self.reg.a = data;
        self.reg.p.change_zero_negative(data);
    }

    pub fn ldx(&mut self, data: u8) {
        trace!(target: "opcode", "ldx, data: 0x{:02x}", data);
        self.reg.x = data;
        self.reg.p.change_zero_negative(data);
    }

    pub fn ldy(&mut self, data: u8) {
        trace!(target: "opcode", "ldy, data: 0x{:02x}", data);
        self.reg.y = data;
        self.reg.p.change_zero_negative(data);
    }

    // Load into A and X at once
    pub fn lax(&mut self, data: u8) {
        self.lda(data);
        self.reg.x = data;
    }

    // A, X and S take the memory value and'ed with S
    pub fn las(&mut self, data: u8) {
        let res = data & self.reg.s;
        self.reg.s = res;
        self.lax(res);
    }

    // Copy a register into another, updating the flags
    pub fn transfer(&mut self, value: u8) -> u8 {
        self.reg.p.change_zero_negative(value);
        value
    }

    // endregion

    // region Arithmetic and logic

    pub fn ora(&mut self, data: u8) {
        trace!(target: "opcode", "ora, data: 0x{:02x}", data);
        self.reg.a |= data;
        self.reg.p.change_zero_negative(self.reg.a);
    }

    pub fn and(&mut self, data: u8) {
        trace!(target: "opcode", "and, data: 0x{:02x}", data);
        self.reg.a &= data;
        self.reg.p.change_zero_negative(self.reg.a);
    }

    pub fn eor(&mut self, data: u8) {
        trace!(target: "opcode", "eor, data: 0x{:02x}", data);
        self.reg.a ^= data;
        self.reg.p.change_zero_negative(self.reg.a);
    }

    // Decimal mode doesn't exist on the 2A03
    pub fn adc(&mut self, data: u8) {
        trace!(target: "opcode", "adc, data: 0x{:02x}", data);
        let a = self.reg.a;
        let res = u16::from(a) + u16::from(data) + u16::from(self.reg.p.get_carry());
        self.reg.p.change(flags::CARRY, res > 0xff);

        let res = res as u8;
        self.reg.p.change(flags::OVERFLOW, (!(a ^ data) & (a ^ res) & 0x80) != 0);

        self.reg.a = res;
        self.reg.p.change_zero_negative(res);
    }

    // Subtraction is the addition of the complement
    pub fn sbc(&mut self, data: u8) {
        self.adc(!data)
    }

    pub fn cmp(&mut self, data: u8) { self.reg.p.change_cmp(self.reg.a, data) }
    pub fn cpx(&mut self, data: u8) { self.reg.p.change_cmp(self.reg.x, data) }
    pub fn cpy(&mut self, data: u8) { self.reg.p.change_cmp(self.reg.y, data) }

    pub fn bit(&mut self, data: u8) {
        self.reg.p.change(flags::ZERO, self.reg.a & data == 0);
        self.reg.p.change(flags::OVERFLOW, bits::is_set(data, 6));
        self.reg.p.change(flags::NEGATIVE, bits::is_set(data, 7));
    }

    // Read and discard
    pub fn nop(&mut self, _data: u8) {}

    // endregion

    // region Read-modify-write

    pub fn asl(&mut self, data: u8) -> u8 {
        self.reg.p.change(flags::CARRY, bits::is_set(data, 7));
        let res = data << 1;
        self.reg.p.change_zero_negative(res);
        res
    }

    pub fn lsr(&mut self, data: u8) -> u8 {
        self.reg.p.change(flags::CARRY, bits::is_set(data, 0));
        let res = data >> 1;
        self.reg.p.change_zero_negative(res);
        res
    }

    pub fn rol(&mut self, data: u8) -> u8 {
        let carry = self.reg.p.get_carry() as u8;
        self.reg.p.change(flags::CARRY, bits::is_set(data, 7));
        let res = (data << 1) | carry;
        self.reg.p.change_zero_negative(res);
        res
    }

    pub fn ror(&mut self, data: u8) -> u8 {
        let carry = (self.reg.p.get_carry() as u8) << 7;
        self.reg.p.change(flags::CARRY, bits::is_set(data, 0));
        let res = (data >> 1) | carry;
        self.reg.p.change_zero_negative(res);
        res
    }

    pub fn inc(&mut self, data: u8) -> u8 {
        let res = data.wrapping_add(1);
        self.reg.p.change_zero_negative(res);
        res
    }

    pub fn dec(&mut self, data: u8) -> u8 {
        let res = data.wrapping_sub(1);
        self.reg.p.change_zero_negative(res);
        res
    }

    // endregion

    // region Unofficial combinations

    pub fn slo(&mut self, data: u8) -> u8 {
        let res = self.asl(data);
        self.ora(res);
        res
    }

    pub fn rla(&mut self, data: u8) -> u8 {
        let res = self.rol(data);
        self.and(res);
        res
    }

    pub fn sre(&mut self, data: u8) -> u8 {
        let res = self.lsr(data);
        self.eor(res);
        res
    }

    pub fn rra(&mut self, data: u8) -> u8 {
        let res = self.ror(data);
        self.adc(res);
        res
    }

    pub fn dcp(&mut self, data: u8) -> u8 {
        let res = data.wrapping_sub(1);
        self.cmp(res);
        res
    }

    pub fn isc(&mut self, data: u8) -> u8 {
        let res = data.wrapping_add(1);
        self.sbc(res);
        res
    }

    // And then copy N into C
    pub fn anc(&mut self, data: u8) {
        self.and(data);
        let negative = self.reg.p.get_negative();
        self.reg.p.change(flags::CARRY, negative);
    }

    // And then shift right
    pub fn alr(&mut self, data: u8) {
        self.and(data);
        self.reg.a = self.lsr(self.reg.a);
    }

    // And then rotate right. C is bit 6, V is bit 6 xor bit 5.
    pub fn arr(&mut self, data: u8) {
        self.and(data);
        self.reg.a = self.ror(self.reg.a);
        let a = self.reg.a;
        self.reg.p.change(flags::CARRY, bits::is_set(a, 6));
        self.reg.p.change(flags::OVERFLOW, bits::is_set(a, 6) ^ bits::is_set(a, 5));
    }

    // X = (A & X) - data, without borrow
    pub fn axs(&mut self, data: u8) {
        let value = self.reg.a & self.reg.x;
        self.reg.p.change_cmp(value, data);
        self.reg.x = value.wrapping_sub(data);
    }

    // endregion

    // region Control flow

    pub(crate) fn branch(&mut self, memory: &mut dyn Memory, condition: bool) -> u32 {
        let offset = self.fetch(memory) as i8;
        if !condition { return 0; }

        let target = self.reg.pc.wrapping_add(offset as u16);
        let extra = if bits::crosses_page(self.reg.pc, target) { 2 } else { 1 };
        self.reg.pc = target;
        extra
    }

    pub(crate) fn jsr(&mut self, memory: &mut dyn Memory) {
        let target = self.fetch_word(memory);
        // Return address points to the last byte of the instruction
        self.push_word(memory, self.reg.pc.wrapping_sub(1));
        self.reg.pc = target;
    }

    pub(crate) fn rts(&mut self, memory: &mut dyn Memory) {
        self.reg.pc = self.pull_word(memory).wrapping_add(1);
    }

    pub(crate) fn rti(&mut self, memory: &mut dyn Memory) {
        let p = self.pull(memory);
        self.reg.p = Flags::from_stack(p);
        self.reg.pc = self.pull_word(memory);
    }

    // Indirect jumps never carry into the high byte of the pointer
    pub(crate) fn jmp_indirect(&mut self, memory: &mut dyn Memory) {
        let pointer = self.fetch_word(memory);
        let low = memory.read(pointer);
        let high = memory.read((pointer & 0xff00) | (pointer.wrapping_add(1) & 0x00ff));
        self.reg.pc = bits::word(high, low);
    }

    pub(crate) fn php(&mut self, memory: &mut dyn Memory) {
        let p = self.reg.p | flags::BREAK_COMMAND | flags::UNUSED;
        self.push(memory, p.into());
    }

    pub(crate) fn plp(&mut self, memory: &mut dyn Memory) {
        let p = self.pull(memory);
        self.reg.p = Flags::from_stack(p);
    }

    pub(crate) fn pla(&mut self, memory: &mut dyn Memory) {
        let a = self.pull(memory);
        self.lda(a);
    }

    // Software interrupt. The byte after the opcode is skipped.
    pub(crate) fn brk(&mut self, memory: &mut dyn Memory) {
        trace!(target: "opcode", "brk");
        self.reg.pc = self.reg.pc.wrapping_add(1);
        self.push_word(memory, self.reg.pc);
        self.php(memory);
        self.reg.p.set(flags::INTERRUPT_DISABLE);
        self.reg.pc = Self::read_word(memory, super::IRQ_VECTOR);
    }

    // endregion
}
