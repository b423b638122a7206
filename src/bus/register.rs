use crate::cartridge::Mirroring;

// Memory mapped registers of the console
pub const PPUCTRL: u16 = 0x2000;
pub const PPUMASK: u16 = 0x2001;
pub const PPUSTATUS: u16 = 0x2002;
pub const OAMADDR: u16 = 0x2003;
pub const OAMDATA: u16 = 0x2004;
pub const PPUSCROLL: u16 = 0x2005;
pub const PPUADDR: u16 = 0x2006;
pub const PPUDATA: u16 = 0x2007;
pub const OAMDMA: u16 = 0x4014;
pub const JOY1: u16 = 0x4016;
pub const JOY2: u16 = 0x4017;

// Hardware behind a register port
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Register {
    PpuCtrl,
    PpuMask,
    PpuStatus,
    OamAddr,
    OamData,
    PpuScroll,
    PpuAddr,
    PpuData,
    OamDma,
    Joy1,
    Joy2,
}

impl Register {
    // Ports the CPU reads. Write only PPU registers answer with the PPU latch.
    pub const READABLE: [(u16, Register); 11] = [
        (PPUCTRL, Register::PpuCtrl),
        (PPUMASK, Register::PpuMask),
        (PPUSTATUS, Register::PpuStatus),
        (OAMADDR, Register::OamAddr),
        (OAMDATA, Register::OamData),
        (PPUSCROLL, Register::PpuScroll),
        (PPUADDR, Register::PpuAddr),
        (PPUDATA, Register::PpuData),
        (OAMDMA, Register::OamDma),
        (JOY1, Register::Joy1),
        (JOY2, Register::Joy2),
    ];

    // Ports the CPU writes. 0x4017 is the APU frame counter on writes.
    pub const WRITABLE: [(u16, Register); 11] = [
        (PPUCTRL, Register::PpuCtrl),
        (PPUMASK, Register::PpuMask),
        (PPUSTATUS, Register::PpuStatus),
        (OAMADDR, Register::OamAddr),
        (OAMDATA, Register::OamData),
        (PPUSCROLL, Register::PpuScroll),
        (PPUADDR, Register::PpuAddr),
        (PPUDATA, Register::PpuData),
        (OAMDMA, Register::OamDma),
        (JOY1, Register::Joy1),
        (JOY2, Register::Joy2),
    ];
}

// The hardware on the other side of the register ports.
// Bus accesses to a bound address are forwarded here.
pub trait Ports {
    fn read(&mut self, register: Register) -> u8;
    fn write(&mut self, register: Register, data: u8);

    // Value seen when reading an address with nothing bound
    fn open_bus(&mut self, _addr: u16) -> u8 { 0 }

    // The mapper switched nametable layout
    fn mirroring_changed(&mut self, _mirroring: Mirroring) {}
}
