use std::fmt;

use crate::cpu::opc::Mode;
use crate::cpu::reg::Reg;
use crate::ppu::InterruptLine;

pub mod cycle;
pub mod flags;
pub mod opc;
pub mod reg;

pub const NMI_VECTOR: u16 = 0xfffa;
pub const RESET_VECTOR: u16 = 0xfffc;
pub const IRQ_VECTOR: u16 = 0xfffe;

// Everything the CPU can see
pub trait Memory {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Interrupt {
    Nmi,
    Irq,
}

// 2A03 core.
//
// Instructions run at once when they start. The cycles they take are then
// spent idle, one per call to step, so the rest of the console keeps its pace.
#[derive(Clone, Eq, PartialEq)]
pub struct Cpu {
    // Registers
    pub reg: Reg,

    // Interrupts waiting for the next instruction boundary
    nmi_pending: bool,
    irq_pending: bool,

    // Cycles left before the next instruction
    skip_cycles: u32,

    // Number of cycles since reset
    cycles: u64,

    // A jam opcode locked the CPU
    jammed: bool,
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            reg: Reg::new(),
            nmi_pending: false,
            irq_pending: false,
            skip_cycles: 0,
            cycles: 0,
            jammed: false,
        }
    }

    pub fn reset(&mut self, memory: &mut dyn Memory) {
        *self = Self::new();
        self.reg.pc = Self::read_word(memory, RESET_VECTOR);
        debug!("CPU reset. PC 0x{:04x}.", self.reg.pc);
    }

    pub fn cycles(&self) -> u64 { self.cycles }

    pub fn skip_cycles(&self) -> u32 { self.skip_cycles }

    pub fn is_jammed(&self) -> bool { self.jammed }

    // Raise an interrupt line. It's serviced when the current instruction is done.
    pub fn interrupt(&mut self, kind: Interrupt) {
        match kind {
            Interrupt::Nmi => self.nmi_pending = true,
            Interrupt::Irq => self.irq_pending = true,
        }
    }

    // The CPU halts while OAM DMA runs. One more cycle to align on odd cycles.
    pub fn skip_dma_cycles(&mut self) {
        self.skip_cycles += cycle::DMA + (self.cycles & 1) as u32;
    }

    // Step a cycle
    pub fn step(&mut self, memory: &mut dyn Memory) {
        self.cycles += 1;

        if self.skip_cycles > 1 {
            self.skip_cycles -= 1;
            return;
        }
        self.skip_cycles = 0;

        if self.nmi_pending {
            self.nmi_pending = false;
            return self.service(memory, NMI_VECTOR);
        }

        if self.irq_pending && !self.reg.p.get_interrupt_disable() {
            self.irq_pending = false;
            return self.service(memory, IRQ_VECTOR);
        }

        let pc = self.reg.pc;
        let opcode = self.fetch(memory);
        trace!(target: "opcode", "0x{:04x}: 0x{:02x} | {:?}", pc, opcode, self.reg);

        let extra = self.execute(memory, opcode);
        self.skip_cycles += u32::from(cycle::OPERATION[opcode as usize]) + extra;
    }

    // Step until the next instruction has finished
    pub fn step_instruction(&mut self, memory: &mut dyn Memory) {
        while self.skip_cycles > 1 { self.step(memory); }
        self.step(memory);
        while self.skip_cycles > 1 { self.step(memory); }
    }

    fn service(&mut self, memory: &mut dyn Memory, vector: u16) {
        trace!(target: "opcode", "interrupt, vector: 0x{:04x}", vector);
        self.push_word(memory, self.reg.pc);

        let mut p = self.reg.p | flags::UNUSED;
        p.clear(flags::BREAK_COMMAND);
        self.push(memory, p.into());

        self.reg.p.set(flags::INTERRUPT_DISABLE);
        self.reg.pc = Self::read_word(memory, vector);
        self.skip_cycles += cycle::INTERRUPT;
    }

    // Run an opcode. Returns the cycles taken beyond the base count.
    #[allow(clippy::cognitive_complexity)]
    fn execute(&mut self, memory: &mut dyn Memory, opcode: u8) -> u32 {
        // Read an operand. Indexing across a page costs one cycle.
        macro_rules! read {
            ($code:ident, $mode:ident) => {{
                let (addr, crossed) = self.address(memory, Mode::$mode);
                let data = memory.read(addr);
                self.$code(data);
                crossed as u32
            }};
        }

        // Read, change and write back an operand
        macro_rules! modify {
            ($code:ident, $mode:ident) => {{
                let (addr, _) = self.address(memory, Mode::$mode);
                let data = memory.read(addr);
                let res = self.$code(data);
                memory.write(addr, res);
                0
            }};
        }

        macro_rules! store {
            ($value:expr, $mode:ident) => {{
                let (addr, _) = self.address(memory, Mode::$mode);
                let value = $value;
                memory.write(addr, value);
                0
            }};
        }

        macro_rules! accumulator {
            ($code:ident) => {{
                self.reg.a = self.$code(self.reg.a);
                0
            }};
        }

        macro_rules! implied {
            ($($body:tt)*) => {{
                $($body)*;
                0
            }};
        }

        // Behaviour depends on analog effects. Only the operand is consumed.
        macro_rules! unstable {
            ($mode:ident) => {{
                let (addr, _) = self.address(memory, Mode::$mode);
                debug!("Unstable opcode 0x{:02x} at 0x{:04x} ignored.", opcode, addr);
                0
            }};
        }

        #[allow(clippy::match_same_arms)]
        match opcode {
            0x00 => implied!(self.brk(memory)),                             // Brk
            0x01 => read!(ora, IndirectX),                                  // Ora
            0x03 => modify!(slo, IndirectX),                                // Slo
            0x04 => read!(nop, ZeroPage),                                   // Nop
            0x05 => read!(ora, ZeroPage),                                   // Ora
            0x06 => modify!(asl, ZeroPage),                                 // Asl
            0x07 => modify!(slo, ZeroPage),                                 // Slo
            0x08 => implied!(self.php(memory)),                             // Php
            0x09 => read!(ora, Immediate),                                  // Ora
            0x0A => accumulator!(asl),                                      // Asl
            0x0B => read!(anc, Immediate),                                  // Anc
            0x0C => read!(nop, Absolute),                                   // Nop
            0x0D => read!(ora, Absolute),                                   // Ora
            0x0E => modify!(asl, Absolute),                                 // Asl
            0x0F => modify!(slo, Absolute),                                 // Slo
            0x10 => self.branch(memory, !self.reg.p.get_negative()),        // Bpl
            0x11 => read!(ora, IndirectY),                                  // Ora
            0x13 => modify!(slo, IndirectY),                                // Slo
            0x14 => read!(nop, ZeroPageX),                                  // Nop
            0x15 => read!(ora, ZeroPageX),                                  // Ora
            0x16 => modify!(asl, ZeroPageX),                                // Asl
            0x17 => modify!(slo, ZeroPageX),                                // Slo
            0x18 => implied!(self.reg.p.clear(flags::CARRY)),               // Clc
            0x19 => read!(ora, AbsoluteY),                                  // Ora
            0x1A => implied!(),                                             // Nop
            0x1B => modify!(slo, AbsoluteY),                                // Slo
            0x1C => read!(nop, AbsoluteX),                                  // Nop
            0x1D => read!(ora, AbsoluteX),                                  // Ora
            0x1E => modify!(asl, AbsoluteX),                                // Asl
            0x1F => modify!(slo, AbsoluteX),                                // Slo
            0x20 => implied!(self.jsr(memory)),                             // Jsr
            0x21 => read!(and, IndirectX),                                  // And
            0x23 => modify!(rla, IndirectX),                                // Rla
            0x24 => read!(bit, ZeroPage),                                   // Bit
            0x25 => read!(and, ZeroPage),                                   // And
            0x26 => modify!(rol, ZeroPage),                                 // Rol
            0x27 => modify!(rla, ZeroPage),                                 // Rla
            0x28 => implied!(self.plp(memory)),                             // Plp
            0x29 => read!(and, Immediate),                                  // And
            0x2A => accumulator!(rol),                                      // Rol
            0x2B => read!(anc, Immediate),                                  // Anc
            0x2C => read!(bit, Absolute),                                   // Bit
            0x2D => read!(and, Absolute),                                   // And
            0x2E => modify!(rol, Absolute),                                 // Rol
            0x2F => modify!(rla, Absolute),                                 // Rla
            0x30 => self.branch(memory, self.reg.p.get_negative()),         // Bmi
            0x31 => read!(and, IndirectY),                                  // And
            0x33 => modify!(rla, IndirectY),                                // Rla
            0x34 => read!(nop, ZeroPageX),                                  // Nop
            0x35 => read!(and, ZeroPageX),                                  // And
            0x36 => modify!(rol, ZeroPageX),                                // Rol
            0x37 => modify!(rla, ZeroPageX),                                // Rla
            0x38 => implied!(self.reg.p.set(flags::CARRY)),                 // Sec
            0x39 => read!(and, AbsoluteY),                                  // And
            0x3A => implied!(),                                             // Nop
            0x3B => modify!(rla, AbsoluteY),                                // Rla
            0x3C => read!(nop, AbsoluteX),                                  // Nop
            0x3D => read!(and, AbsoluteX),                                  // And
            0x3E => modify!(rol, AbsoluteX),                                // Rol
            0x3F => modify!(rla, AbsoluteX),                                // Rla
            0x40 => implied!(self.rti(memory)),                             // Rti
            0x41 => read!(eor, IndirectX),                                  // Eor
            0x43 => modify!(sre, IndirectX),                                // Sre
            0x44 => read!(nop, ZeroPage),                                   // Nop
            0x45 => read!(eor, ZeroPage),                                   // Eor
            0x46 => modify!(lsr, ZeroPage),                                 // Lsr
            0x47 => modify!(sre, ZeroPage),                                 // Sre
            0x48 => implied!(self.push(memory, self.reg.a)),                // Pha
            0x49 => read!(eor, Immediate),                                  // Eor
            0x4A => accumulator!(lsr),                                      // Lsr
            0x4B => read!(alr, Immediate),                                  // Alr
            0x4C => implied!(self.reg.pc = self.fetch_word(memory)),        // Jmp
            0x4D => read!(eor, Absolute),                                   // Eor
            0x4E => modify!(lsr, Absolute),                                 // Lsr
            0x4F => modify!(sre, Absolute),                                 // Sre
            0x50 => self.branch(memory, !self.reg.p.get_overflow()),        // Bvc
            0x51 => read!(eor, IndirectY),                                  // Eor
            0x53 => modify!(sre, IndirectY),                                // Sre
            0x54 => read!(nop, ZeroPageX),                                  // Nop
            0x55 => read!(eor, ZeroPageX),                                  // Eor
            0x56 => modify!(lsr, ZeroPageX),                                // Lsr
            0x57 => modify!(sre, ZeroPageX),                                // Sre
            0x58 => implied!(self.reg.p.clear(flags::INTERRUPT_DISABLE)),   // Cli
            0x59 => read!(eor, AbsoluteY),                                  // Eor
            0x5A => implied!(),                                             // Nop
            0x5B => modify!(sre, AbsoluteY),                                // Sre
            0x5C => read!(nop, AbsoluteX),                                  // Nop
            0x5D => read!(eor, AbsoluteX),                                  // Eor
            0x5E => modify!(lsr, AbsoluteX),                                // Lsr
            0x5F => modify!(sre, AbsoluteX),                                // Sre
            0x60 => implied!(self.rts(memory)),                             // Rts
            0x61 => read!(adc, IndirectX),                                  // Adc
            0x63 => modify!(rra, IndirectX),                                // Rra
            0x64 => read!(nop, ZeroPage),                                   // Nop
            0x65 => read!(adc, ZeroPage),                                   // Adc
            0x66 => modify!(ror, ZeroPage),                                 // Ror
            0x67 => modify!(rra, ZeroPage),                                 // Rra
            0x68 => implied!(self.pla(memory)),                             // Pla
            0x69 => read!(adc, Immediate),                                  // Adc
            0x6A => accumulator!(ror),                                      // Ror
            0x6B => read!(arr, Immediate),                                  // Arr
            0x6C => implied!(self.jmp_indirect(memory)),                    // Jmp
            0x6D => read!(adc, Absolute),                                   // Adc
            0x6E => modify!(ror, Absolute),                                 // Ror
            0x6F => modify!(rra, Absolute),                                 // Rra
            0x70 => self.branch(memory, self.reg.p.get_overflow()),         // Bvs
            0x71 => read!(adc, IndirectY),                                  // Adc
            0x73 => modify!(rra, IndirectY),                                // Rra
            0x74 => read!(nop, ZeroPageX),                                  // Nop
            0x75 => read!(adc, ZeroPageX),                                  // Adc
            0x76 => modify!(ror, ZeroPageX),                                // Ror
            0x77 => modify!(rra, ZeroPageX),                                // Rra
            0x78 => implied!(self.reg.p.set(flags::INTERRUPT_DISABLE)),     // Sei
            0x79 => read!(adc, AbsoluteY),                                  // Adc
            0x7A => implied!(),                                             // Nop
            0x7B => modify!(rra, AbsoluteY),                                // Rra
            0x7C => read!(nop, AbsoluteX),                                  // Nop
            0x7D => read!(adc, AbsoluteX),                                  // Adc
            0x7E => modify!(ror, AbsoluteX),                                // Ror
            0x7F => modify!(rra, AbsoluteX),                                // Rra
            0x80 => read!(nop, Immediate),                                  // Nop
            0x81 => store!(self.reg.a, IndirectX),                          // Sta
            0x82 => read!(nop, Immediate),                                  // Nop
            0x83 => store!(self.reg.a & self.reg.x, IndirectX),             // Sax
            0x84 => store!(self.reg.y, ZeroPage),                           // Sty
            0x85 => store!(self.reg.a, ZeroPage),                           // Sta
            0x86 => store!(self.reg.x, ZeroPage),                           // Stx
            0x87 => store!(self.reg.a & self.reg.x, ZeroPage),              // Sax
            0x88 => implied!(self.reg.y = self.dec(self.reg.y)),            // Dey
            0x89 => read!(nop, Immediate),                                  // Nop
            0x8A => implied!(self.reg.a = self.transfer(self.reg.x)),       // Txa
            0x8B => unstable!(Immediate),                                   // Xaa
            0x8C => store!(self.reg.y, Absolute),                           // Sty
            0x8D => store!(self.reg.a, Absolute),                           // Sta
            0x8E => store!(self.reg.x, Absolute),                           // Stx
            0x8F => store!(self.reg.a & self.reg.x, Absolute),              // Sax
            0x90 => self.branch(memory, !self.reg.p.get_carry()),           // Bcc
            0x91 => store!(self.reg.a, IndirectY),                          // Sta
            0x93 => unstable!(IndirectY),                                   // Ahx
            0x94 => store!(self.reg.y, ZeroPageX),                          // Sty
            0x95 => store!(self.reg.a, ZeroPageX),                          // Sta
            0x96 => store!(self.reg.x, ZeroPageY),                          // Stx
            0x97 => store!(self.reg.a & self.reg.x, ZeroPageY),             // Sax
            0x98 => implied!(self.reg.a = self.transfer(self.reg.y)),       // Tya
            0x99 => store!(self.reg.a, AbsoluteY),                          // Sta
            0x9A => implied!(self.reg.s = self.reg.x),                      // Txs
            0x9B => unstable!(AbsoluteY),                                   // Tas
            0x9C => unstable!(AbsoluteX),                                   // Shy
            0x9D => store!(self.reg.a, AbsoluteX),                          // Sta
            0x9E => unstable!(AbsoluteY),                                   // Shx
            0x9F => unstable!(AbsoluteY),                                   // Ahx
            0xA0 => read!(ldy, Immediate),                                  // Ldy
            0xA1 => read!(lda, IndirectX),                                  // Lda
            0xA2 => read!(ldx, Immediate),                                  // Ldx
            0xA3 => read!(lax, IndirectX),                                  // Lax
            0xA4 => read!(ldy, ZeroPage),                                   // Ldy
            0xA5 => read!(lda, ZeroPage),                                   // Lda
            0xA6 => read!(ldx, ZeroPage),                                   // Ldx
            0xA7 => read!(lax, ZeroPage),                                   // Lax
            0xA8 => implied!(self.reg.y = self.transfer(self.reg.a)),       // Tay
            0xA9 => read!(lda, Immediate),                                  // Lda
            0xAA => implied!(self.reg.x = self.transfer(self.reg.a)),       // Tax
            0xAB => read!(lax, Immediate),                                  // Lax
            0xAC => read!(ldy, Absolute),                                   // Ldy
            0xAD => read!(lda, Absolute),                                   // Lda
            0xAE => read!(ldx, Absolute),                                   // Ldx
            0xAF => read!(lax, Absolute),                                   // Lax
            0xB0 => self.branch(memory, self.reg.p.get_carry()),            // Bcs
            0xB1 => read!(lda, IndirectY),                                  // Lda
            0xB3 => read!(lax, IndirectY),                                  // Lax
            0xB4 => read!(ldy, ZeroPageX),                                  // Ldy
            0xB5 => read!(lda, ZeroPageX),                                  // Lda
            0xB6 => read!(ldx, ZeroPageY),                                  // Ldx
            0xB7 => read!(lax, ZeroPageY),                                  // Lax
            0xB8 => implied!(self.reg.p.clear(flags::OVERFLOW)),            // Clv
            0xB9 => read!(lda, AbsoluteY),                                  // Lda
            0xBA => implied!(self.reg.x = self.transfer(self.reg.s)),       // Tsx
            0xBB => read!(las, AbsoluteY),                                  // Las
            0xBC => read!(ldy, AbsoluteX),                                  // Ldy
            0xBD => read!(lda, AbsoluteX),                                  // Lda
            0xBE => read!(ldx, AbsoluteY),                                  // Ldx
            0xBF => read!(lax, AbsoluteY),                                  // Lax
            0xC0 => read!(cpy, Immediate),                                  // Cpy
            0xC1 => read!(cmp, IndirectX),                                  // Cmp
            0xC2 => read!(nop, Immediate),                                  // Nop
            0xC3 => modify!(dcp, IndirectX),                                // Dcp
            0xC4 => read!(cpy, ZeroPage),                                   // Cpy
            0xC5 => read!(cmp, ZeroPage),                                   // Cmp
            0xC6 => modify!(dec, ZeroPage),                                 // Dec
            0xC7 => modify!(dcp, ZeroPage),                                 // Dcp
            0xC8 => implied!(self.reg.y = self.inc(self.reg.y)),            // Iny
            0xC9 => read!(cmp, Immediate),                                  // Cmp
            0xCA => implied!(self.reg.x = self.dec(self.reg.x)),            // Dex
            0xCB => read!(axs, Immediate),                                  // Axs
            0xCC => read!(cpy, Absolute),                                   // Cpy
            0xCD => read!(cmp, Absolute),                                   // Cmp
            0xCE => modify!(dec, Absolute),                                 // Dec
            0xCF => modify!(dcp, Absolute),                                 // Dcp
            0xD0 => self.branch(memory, !self.reg.p.get_zero()),            // Bne
            0xD1 => read!(cmp, IndirectY),                                  // Cmp
            0xD3 => modify!(dcp, IndirectY),                                // Dcp
            0xD4 => read!(nop, ZeroPageX),                                  // Nop
            0xD5 => read!(cmp, ZeroPageX),                                  // Cmp
            0xD6 => modify!(dec, ZeroPageX),                                // Dec
            0xD7 => modify!(dcp, ZeroPageX),                                // Dcp
            0xD8 => implied!(self.reg.p.clear(flags::DECIMAL_MODE)),        // Cld
            0xD9 => read!(cmp, AbsoluteY),                                  // Cmp
            0xDA => implied!(),                                             // Nop
            0xDB => modify!(dcp, AbsoluteY),                                // Dcp
            0xDC => read!(nop, AbsoluteX),                                  // Nop
            0xDD => read!(cmp, AbsoluteX),                                  // Cmp
            0xDE => modify!(dec, AbsoluteX),                                // Dec
            0xDF => modify!(dcp, AbsoluteX),                                // Dcp
            0xE0 => read!(cpx, Immediate),                                  // Cpx
            0xE1 => read!(sbc, IndirectX),                                  // Sbc
            0xE2 => read!(nop, Immediate),                                  // Nop
            0xE3 => modify!(isc, IndirectX),                                // Isc
            0xE4 => read!(cpx, ZeroPage),                                   // Cpx
            0xE5 => read!(sbc, ZeroPage),                                   // Sbc
            0xE6 => modify!(inc, ZeroPage),                                 // Inc
            0xE7 => modify!(isc, ZeroPage),                                 // Isc
            0xE8 => implied!(self.reg.x = self.inc(self.reg.x)),            // Inx
            0xE9 => read!(sbc, Immediate),                                  // Sbc
            0xEA => implied!(),                                             // Nop
            0xEB => read!(sbc, Immediate),                                  // Sbc
            0xEC => read!(cpx, Absolute),                                   // Cpx
            0xED => read!(sbc, Absolute),                                   // Sbc
            0xEE => modify!(inc, Absolute),                                 // Inc
            0xEF => modify!(isc, Absolute),                                 // Isc
            0xF0 => self.branch(memory, self.reg.p.get_zero()),             // Beq
            0xF1 => read!(sbc, IndirectY),                                  // Sbc
            0xF3 => modify!(isc, IndirectY),                                // Isc
            0xF4 => read!(nop, ZeroPageX),                                  // Nop
            0xF5 => read!(sbc, ZeroPageX),                                  // Sbc
            0xF6 => modify!(inc, ZeroPageX),                                // Inc
            0xF7 => modify!(isc, ZeroPageX),                                // Isc
            0xF8 => implied!(self.reg.p.set(flags::DECIMAL_MODE)),          // Sed
            0xF9 => read!(sbc, AbsoluteY),                                  // Sbc
            0xFA => implied!(),                                             // Nop
            0xFB => modify!(isc, AbsoluteY),                                // Isc
            0xFC => read!(nop, AbsoluteX),                                  // Nop
            0xFD => read!(sbc, AbsoluteX),                                  // Sbc
            0xFE => modify!(inc, AbsoluteX),                                // Inc
            0xFF => modify!(isc, AbsoluteX),                                // Isc

            // Jam. The CPU stops fetching; the opcode runs forever.
            0x02 | 0x12 | 0x22 | 0x32 | 0x42 | 0x52 | 0x62 | 0x72 | 0x92 | 0xB2 | 0xD2 | 0xF2 => {
                if !self.jammed {
                    error!("Jam opcode 0x{:02x} at 0x{:04x}. CPU halted.", opcode, self.reg.pc.wrapping_sub(1));
                    self.jammed = true;
                }
                self.reg.pc = self.reg.pc.wrapping_sub(1);
                0
            }
        }
    }
}

impl Default for Cpu {
    fn default() -> Self { Self::new() }
}

// The PPU pulls the NMI line of the CPU
impl InterruptLine for Cpu {
    fn nmi(&mut self) { self.interrupt(Interrupt::Nmi) }
}

impl fmt::Debug for Cpu {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{:?} | cycles: {}, skip: {}, nmi: {}, irq: {}",
               self.reg, self.cycles, self.skip_cycles, self.nmi_pending, self.irq_pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 64kb of plain RAM
    struct Flat(Vec<u8>);

    impl Memory for Flat {
        fn read(&mut self, addr: u16) -> u8 { self.0[addr as usize] }
        fn write(&mut self, addr: u16, data: u8) { self.0[addr as usize] = data }
    }

    fn with_program(program: &[u8]) -> (Cpu, Flat) {
        let mut memory = Flat(vec![0; 0x10000]);
        memory.0[0x8000..0x8000 + program.len()].copy_from_slice(program);
        memory.0[RESET_VECTOR as usize] = 0x00;
        memory.0[RESET_VECTOR as usize + 1] = 0x80;
        memory.0[NMI_VECTOR as usize] = 0x00;
        memory.0[NMI_VECTOR as usize + 1] = 0x90;
        memory.0[IRQ_VECTOR as usize] = 0x00;
        memory.0[IRQ_VECTOR as usize + 1] = 0xa0;

        let mut cpu = Cpu::new();
        cpu.reset(&mut memory);
        (cpu, memory)
    }

    // Steps needed until the next instruction starts
    fn steps_to_boundary(cpu: &mut Cpu, memory: &mut Flat) -> u32 {
        let mut steps = 1;
        cpu.step(memory);
        while cpu.skip_cycles() > 1 {
            cpu.step(memory);
            steps += 1;
        }
        steps
    }

    #[test]
    fn reset_state() {
        let (cpu, _) = with_program(&[]);
        assert_eq!(cpu.reg.pc, 0x8000);
        assert_eq!(cpu.reg.s, 0xfd);
        assert!(cpu.reg.p.get_interrupt_disable());
    }

    #[test]
    fn instruction_takes_its_cycles() {
        // lda #$01; lda $0200,x (page not crossed); lda $02ff,x (crossed)
        let (mut cpu, mut memory) = with_program(&[0xa9, 0x01, 0xbd, 0x00, 0x02, 0xbd, 0xff, 0x02]);
        cpu.reg.x = 1;
        assert_eq!(steps_to_boundary(&mut cpu, &mut memory), 2);
        assert_eq!(steps_to_boundary(&mut cpu, &mut memory), 4);
        assert_eq!(steps_to_boundary(&mut cpu, &mut memory), 5);
    }

    #[test]
    fn nmi_waits_for_boundary() {
        // nop; nop
        let (mut cpu, mut memory) = with_program(&[0xea, 0xea]);
        cpu.step(&mut memory);
        cpu.interrupt(Interrupt::Nmi);
        assert_eq!(cpu.reg.pc, 0x8001);

        cpu.step(&mut memory);
        assert_eq!(cpu.reg.pc, 0x8001);

        cpu.step(&mut memory);
        assert_eq!(cpu.reg.pc, 0x9000);
        assert_eq!(cpu.reg.s, 0xfa);
        assert_eq!(memory.0[0x01fd], 0x80);
        assert_eq!(memory.0[0x01fc], 0x01);
        assert_eq!(memory.0[0x01fb] & 0x30, 0x20);
        assert_eq!(cpu.skip_cycles(), 7);
    }

    #[test]
    fn irq_is_masked() {
        // cli; nop
        let (mut cpu, mut memory) = with_program(&[0xea, 0x58, 0xea]);
        cpu.interrupt(Interrupt::Irq);
        cpu.step_instruction(&mut memory);
        assert_eq!(cpu.reg.pc, 0x8001);
        cpu.step_instruction(&mut memory);
        assert_eq!(cpu.reg.pc, 0x8002);
        cpu.step_instruction(&mut memory);
        assert_eq!(cpu.reg.pc, 0xa000);
    }

    #[test]
    fn dma_stall() {
        let (mut cpu, mut memory) = with_program(&[0xea, 0xea, 0xea]);

        // Even cycle count when the stall starts
        cpu.step(&mut memory);
        cpu.step(&mut memory);
        assert_eq!(cpu.cycles() & 1, 0);
        cpu.skip_dma_cycles();
        assert_eq!(steps_to_boundary(&mut cpu, &mut memory), 513);

        // Odd cycle count pays one more
        assert_eq!(cpu.cycles() & 1, 1);
        cpu.skip_dma_cycles();
        assert_eq!(steps_to_boundary(&mut cpu, &mut memory), 514);
        assert_eq!(cpu.reg.pc, 0x8001);
    }

    #[test]
    fn stack_wraps() {
        // pha
        let (mut cpu, mut memory) = with_program(&[0x48]);
        cpu.reg.s = 0x00;
        cpu.reg.a = 0x42;
        cpu.step_instruction(&mut memory);
        assert_eq!(memory.0[0x0100], 0x42);
        assert_eq!(cpu.reg.s, 0xff);
    }

    #[test]
    fn jam_halts() {
        let (mut cpu, mut memory) = with_program(&[0x02, 0xea]);
        for _ in 0..10 { cpu.step_instruction(&mut memory); }
        assert!(cpu.is_jammed());
        assert_eq!(cpu.reg.pc, 0x8000);
    }

    #[test]
    fn indirect_jump_page_bug() {
        let (mut cpu, mut memory) = with_program(&[0x6c, 0xff, 0x02]);
        memory.0[0x02ff] = 0x34;
        memory.0[0x0200] = 0x12;
        memory.0[0x0300] = 0x56;
        cpu.step_instruction(&mut memory);
        assert_eq!(cpu.reg.pc, 0x1234);
    }
}
