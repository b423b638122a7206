#![allow(dead_code)]

use std::path::PathBuf;

use nestep::cpu::{Cpu, Memory, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR};
use nestep::utils::bits;

pub const PROGRAM_START: u16 = 0x8000;
pub const NMI_HANDLER: u16 = 0x9000;
pub const IRQ_HANDLER: u16 = 0xa000;

// Runaway programs stop here
const MAX_INSTRUCTIONS: usize = 10_000;

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn lsb(word: u16) -> u8 { bits::low(word) }
pub fn msb(word: u16) -> u8 { bits::high(word) }

// 64kb of plain RAM with the program at 0x8000
pub struct Flat(pub Vec<u8>);

impl Flat {
    pub fn with_program(program: &[u8]) -> Self {
        let mut memory = Flat(vec![0; 0x10000]);
        memory.load(PROGRAM_START, program);
        memory.load(RESET_VECTOR, &[lsb(PROGRAM_START), msb(PROGRAM_START)]);
        memory.load(NMI_VECTOR, &[lsb(NMI_HANDLER), msb(NMI_HANDLER)]);
        memory.load(IRQ_VECTOR, &[lsb(IRQ_HANDLER), msb(IRQ_HANDLER)]);
        memory
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.0[start..start + data.len()].copy_from_slice(data);
    }

    pub fn at(&self, addr: u16) -> u8 { self.0[addr as usize] }

    // Run until the program counter leaves the program
    pub fn run(&mut self, cpu: &mut Cpu, length: usize) {
        let end = PROGRAM_START as usize + length;
        for _ in 0..MAX_INSTRUCTIONS {
            let pc = cpu.reg.pc as usize;
            if pc < PROGRAM_START as usize || pc >= end { return; }
            cpu.step_instruction(self);
        }
        panic!("Program didn't finish.\n{:?}", cpu);
    }
}

impl Memory for Flat {
    fn read(&mut self, addr: u16) -> u8 { self.0[addr as usize] }
    fn write(&mut self, addr: u16, data: u8) { self.0[addr as usize] = data }
}

pub fn flag(cpu: &Cpu, name: &str) -> bool {
    let p = cpu.reg.p;
    match name {
        "c" => p.get_carry(),
        "z" => p.get_zero(),
        "i" => p.get_interrupt_disable(),
        "d" => p.get_decimal_mode(),
        "o" => p.get_overflow(),
        "n" => p.get_negative(),
        _ => panic!("No flag named {}.", name),
    }
}

// Runs a program over flat memory and checks the outcome.
//
// run!(opc: [opc::Adc::Immediate, 0xff];
//      reg: [a => 0x80];
//      ram: [0x0e => 0xff];
//      res: [a => 0x7f];
//      flags: [n => false, c => true];
//      mem: [0x0e => 0xff]);
#[macro_export]
macro_rules! run {
    (
        opc: [$($opc:expr),* $(,)?]
        $(; reg: [$($reg:ident => $reg_value:expr),* $(,)?])?
        $(; ram: [$($ram_addr:expr => $ram_data:expr),* $(,)?])?
        $(; res: [$($res:ident => $res_value:expr),* $(,)?])?
        $(; flags: [$($flag:ident => $flag_value:expr),* $(,)?])?
        $(; mem: [$($mem_addr:expr => $mem_data:expr),* $(,)?])?
    ) => {{
        $crate::common::init();

        let program: Vec<u8> = vec![$($opc),*];
        let mut memory = $crate::common::Flat::with_program(&program);
        let mut cpu = nestep::cpu::Cpu::new();
        nestep::cpu::Cpu::reset(&mut cpu, &mut memory);

        $($(cpu.reg.$reg = $reg_value;)*)?
        $($(memory.0[$ram_addr as usize] = $ram_data;)*)?

        memory.run(&mut cpu, program.len());

        $($(assert_eq!(cpu.reg.$res, $res_value, "register {}\n{:?}", stringify!($res), cpu);)*)?
        $($(assert_eq!($crate::common::flag(&cpu, stringify!($flag)), $flag_value,
                       "flag {}\n{:?}", stringify!($flag), cpu);)*)?
        $($(assert_eq!(memory.at($mem_addr), $mem_data, "memory 0x{:04x}\n{:?}", $mem_addr, cpu);)*)?

        (cpu, memory)
    }};
}

// Opcodes by mnemonic and addressing mode
#[allow(non_snake_case, non_upper_case_globals)]
pub mod opc {
    macro_rules! opcodes {
        ($($mnemonic:ident { $($mode:ident = $code:expr),* $(,)? })*) => {
            $(pub mod $mnemonic { $(pub const $mode: u8 = $code;)* })*
        };
    }

    opcodes! {
        Adc { Immediate = 0x69, ZeroPage = 0x65, ZeroPageX = 0x75, Absolute = 0x6d, AbsoluteX = 0x7d, AbsoluteY = 0x79, IndirectX = 0x61, IndirectY = 0x71 }
        Sbc { Immediate = 0xe9, ZeroPage = 0xe5, Absolute = 0xed }
        And { Immediate = 0x29, ZeroPage = 0x25 }
        Ora { Immediate = 0x09, ZeroPage = 0x05 }
        Eor { Immediate = 0x49, ZeroPage = 0x45 }
        Bit { ZeroPage = 0x24, Absolute = 0x2c }
        Cmp { Immediate = 0xc9, ZeroPage = 0xc5 }
        Cpx { Immediate = 0xe0 }
        Cpy { Immediate = 0xc0 }
        Lda { Immediate = 0xa9, ZeroPage = 0xa5, ZeroPageX = 0xb5, Absolute = 0xad, AbsoluteX = 0xbd, AbsoluteY = 0xb9, IndirectX = 0xa1, IndirectY = 0xb1 }
        Ldx { Immediate = 0xa2, ZeroPage = 0xa6, ZeroPageY = 0xb6, Absolute = 0xae }
        Ldy { Immediate = 0xa0, ZeroPage = 0xa4, ZeroPageX = 0xb4, Absolute = 0xac }
        Lax { ZeroPage = 0xa7 }
        Sta { ZeroPage = 0x85, ZeroPageX = 0x95, Absolute = 0x8d, AbsoluteX = 0x9d, AbsoluteY = 0x99, IndirectX = 0x81, IndirectY = 0x91 }
        Stx { ZeroPage = 0x86, ZeroPageY = 0x96, Absolute = 0x8e }
        Sty { ZeroPage = 0x84, ZeroPageX = 0x94, Absolute = 0x8c }
        Sax { ZeroPage = 0x87 }
        Inc { ZeroPage = 0xe6, Absolute = 0xee }
        Dec { ZeroPage = 0xc6, Absolute = 0xce }
        Asl { Accumulator = 0x0a, ZeroPage = 0x06 }
        Lsr { Accumulator = 0x4a, ZeroPage = 0x46 }
        Rol { Accumulator = 0x2a }
        Ror { Accumulator = 0x6a }
        Dcp { ZeroPage = 0xc7 }
        Isc { ZeroPage = 0xe7 }
        Jmp { Absolute = 0x4c, Indirect = 0x6c }
        Jsr { Absolute = 0x20 }
        Implied {
            Rts = 0x60, Rti = 0x40, Pha = 0x48, Pla = 0x68, Php = 0x08, Plp = 0x28,
            Tax = 0xaa, Tay = 0xa8, Txa = 0x8a, Tya = 0x98, Tsx = 0xba, Txs = 0x9a,
            Inx = 0xe8, Iny = 0xc8, Dex = 0xca, Dey = 0x88,
            Clc = 0x18, Sec = 0x38, Cli = 0x58, Sei = 0x78, Clv = 0xb8, Cld = 0xd8, Sed = 0xf8,
            Nop = 0xea, Brk = 0x00,
        }
        Branch { Bpl = 0x10, Bmi = 0x30, Bvc = 0x50, Bvs = 0x70, Bcc = 0x90, Bcs = 0xb0, Bne = 0xd0, Beq = 0xf0 }
    }
}

// iNES image built in memory
pub struct RomBuilder {
    mapper: u8,
    flags6: u8,
    prg: Vec<u8>,
    prg_banks: u8,
    chr_banks: u8,
    // Bytes that differ between PRG banks: (offset in the image, data)
    patches: Vec<(usize, u8)>,
}

impl RomBuilder {
    // One 16kb PRG bank of NOPs, CHR RAM, program at 0x8000, NMI and IRQ handlers RTI
    pub fn new() -> Self {
        let mut prg = vec![0xea; 0x4000];
        let vectors = [lsb(NMI_HANDLER), msb(NMI_HANDLER), lsb(PROGRAM_START), msb(PROGRAM_START),
                       lsb(IRQ_HANDLER), msb(IRQ_HANDLER)];
        prg[0x3ffa..].copy_from_slice(&vectors);
        prg[(NMI_HANDLER as usize) & 0x3fff] = 0x40;
        prg[(IRQ_HANDLER as usize) & 0x3fff] = 0x40;
        Self { mapper: 0, flags6: 0, prg, prg_banks: 1, chr_banks: 0, patches: Vec::new() }
    }

    pub fn mapper(mut self, id: u8) -> Self {
        self.mapper = id;
        self
    }

    pub fn vertical(mut self) -> Self {
        self.flags6 |= 1;
        self
    }

    // Every PRG bank holds the same code
    pub fn prg_banks(mut self, banks: u8) -> Self {
        self.prg_banks = banks;
        self
    }

    pub fn bank_byte(mut self, bank: u8, addr: u16, data: u8) -> Self {
        self.patches.push((bank as usize * 0x4000 + (addr as usize & 0x3fff), data));
        self
    }

    pub fn chr_banks(mut self, banks: u8) -> Self {
        self.chr_banks = banks;
        self
    }

    fn place(mut self, addr: u16, code: &[u8]) -> Self {
        let start = addr as usize & 0x3fff;
        self.prg[start..start + code.len()].copy_from_slice(code);
        self
    }

    pub fn program(self, code: &[u8]) -> Self { self.place(PROGRAM_START, code) }
    pub fn nmi(self, code: &[u8]) -> Self { self.place(NMI_HANDLER, code) }

    pub fn build(&self) -> Vec<u8> {
        let mut file = b"NES\x1a".to_vec();
        file.extend_from_slice(&[self.prg_banks, self.chr_banks, self.flags6 | (self.mapper << 4), self.mapper & 0xf0]);
        file.resize(0x10, 0);

        let mut prg = self.prg.repeat(self.prg_banks as usize);
        for &(offset, data) in &self.patches { prg[offset] = data; }
        file.extend_from_slice(&prg);
        file.extend(std::iter::repeat(0).take(self.chr_banks as usize * 0x2000));
        file
    }

    // Write the image to the temp dir
    pub fn write(&self, name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("nestep-{}-{}.nes", name, std::process::id()));
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}
