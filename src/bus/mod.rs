use std::fmt;

use pretty_hex::PrettyHex;

use crate::bus::register::{Ports, Register};
use crate::cpu::Memory;
use crate::error::Error;
use crate::mapper::SharedMapper;

pub mod picture;
pub mod register;

pub const RAM_CAPACITY: usize = 0x0800;
pub const EXTENDED_RAM_CAPACITY: usize = 0x2000;
pub const PAGE_SIZE: usize = 0x100;

// Eight PPU registers followed by the 0x20 APU and I/O registers
const PORT_SLOTS: usize = 0x08 + 0x20;

// CPU address space.
//
// 0x0000-0x1fff  2kb RAM, mirrored
// 0x2000-0x3fff  PPU registers, mirrored every 8 bytes
// 0x4000-0x401f  APU and I/O registers
// 0x4020-0x5fff  expansion, unused
// 0x6000-0x7fff  extended RAM on the cartridge
// 0x8000-0xffff  PRG ROM through the mapper
#[derive(Clone)]
pub struct Bus {
    ram: [u8; RAM_CAPACITY],
    extended_ram: Vec<u8>,
    read_ports: [Option<Register>; PORT_SLOTS],
    write_ports: [Option<Register>; PORT_SLOTS],
    mapper: Option<SharedMapper>,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            ram: [0; RAM_CAPACITY],
            extended_ram: Vec::new(),
            read_ports: [None; PORT_SLOTS],
            write_ports: [None; PORT_SLOTS],
            mapper: None,
        }
    }

    // Slot of a register address. Mirrors collapse into the same slot.
    fn slot(addr: u16) -> Option<usize> {
        match addr {
            0x2000..=0x3fff => Some((addr & 0x0007) as usize),
            0x4000..=0x401f => Some(0x08 + (addr - 0x4000) as usize),
            _ => None,
        }
    }

    fn bind(ports: &mut [Option<Register>; PORT_SLOTS], addr: u16, register: Register) -> Result<(), Error> {
        let slot = Self::slot(addr)
            .ok_or_else(|| Error::Configuration(format!("0x{:04x} is not a register address", addr)))?;

        match ports[slot] {
            Some(bound) => Err(Error::Configuration(
                format!("0x{:04x} is already bound to {:?}", addr, bound))),
            None => {
                ports[slot] = Some(register);
                Ok(())
            }
        }
    }

    pub fn set_read_port(&mut self, addr: u16, register: Register) -> Result<(), Error> {
        Self::bind(&mut self.read_ports, addr, register)
    }

    pub fn set_write_port(&mut self, addr: u16, register: Register) -> Result<(), Error> {
        Self::bind(&mut self.write_ports, addr, register)
    }

    // Every register the console needs must be bound before running
    pub fn check_ports(&self) -> Result<(), Error> {
        let check = |ports: &[Option<Register>; PORT_SLOTS], kind: &str, expected: &[(u16, Register)]| {
            for &(addr, register) in expected {
                let bound = Self::slot(addr).and_then(|slot| ports[slot]);
                if bound != Some(register) {
                    return Err(Error::Configuration(
                        format!("{} port 0x{:04x} should be {:?}, found {:?}", kind, addr, register, bound)));
                }
            }
            Ok(())
        };

        check(&self.read_ports, "read", &Register::READABLE)?;
        check(&self.write_ports, "write", &Register::WRITABLE)
    }

    // Rebinding a board with extended RAM keeps its contents
    pub fn set_mapper(&mut self, mapper: SharedMapper) {
        if !mapper.borrow().has_extended_ram() {
            self.extended_ram.clear();
        } else if self.extended_ram.len() != EXTENDED_RAM_CAPACITY {
            self.extended_ram = vec![0; EXTENDED_RAM_CAPACITY];
        }
        self.mapper = Some(mapper);
    }

    fn mapper(&self, addr: u16) -> &SharedMapper {
        match &self.mapper {
            Some(mapper) => mapper,
            None => panic!("Cartridge access at 0x{:04x} with no mapper bound.", addr),
        }
    }

    pub fn ram(&self) -> &[u8] { &self.ram }

    pub fn extended_ram(&self) -> &[u8] { &self.extended_ram }

    pub fn read(&mut self, addr: u16, ports: &mut dyn Ports) -> u8 {
        match addr {
            0x0000..=0x1fff => self.ram[addr as usize % RAM_CAPACITY],

            0x2000..=0x401f => match Self::slot(addr).and_then(|slot| self.read_ports[slot]) {
                Some(register) => ports.read(register),
                None => {
                    trace!("Reading from unbound register 0x{:04x}.", addr);
                    ports.open_bus(addr)
                }
            },

            0x4020..=0x5fff => {
                trace!("Reading from expansion area 0x{:04x}.", addr);
                0
            }

            0x6000..=0x7fff => self.read_extended_ram(addr),

            _ => self.mapper(addr).borrow().read_prg(addr),
        }
    }

    pub fn write(&mut self, addr: u16, data: u8, ports: &mut dyn Ports) {
        match addr {
            0x0000..=0x1fff => self.ram[addr as usize % RAM_CAPACITY] = data,

            0x2000..=0x401f => match Self::slot(addr).and_then(|slot| self.write_ports[slot]) {
                Some(register) => ports.write(register, data),
                None => trace!("Writing to unbound register 0x{:04x}, data 0x{:02x}.", addr, data),
            },

            0x4020..=0x5fff => trace!("Writing to expansion area 0x{:04x}.", addr),

            0x6000..=0x7fff => {
                match self.extended_ram.get_mut((addr - 0x6000) as usize) {
                    Some(cell) => *cell = data,
                    None => debug!("Write to missing extended RAM 0x{:04x}.", addr),
                }
            }

            _ => {
                let change = self.mapper(addr).borrow_mut().write_prg(addr, data);
                if let Some(mirroring) = change {
                    ports.mirroring_changed(mirroring);
                }
            }
        }
    }

    fn read_extended_ram(&self, addr: u16) -> u8 {
        match self.extended_ram.get((addr - 0x6000) as usize) {
            Some(&data) => data,
            None => {
                debug!("Read from missing extended RAM 0x{:04x}.", addr);
                0
            }
        }
    }

    // Read without touching any register
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1fff => self.ram[addr as usize % RAM_CAPACITY],
            0x6000..=0x7fff => self.read_extended_ram(addr),
            0x8000..=0xffff => self.mapper(addr).borrow().read_prg(addr),
            _ => 0,
        }
    }

    // Direct view of a page for DMA. Only RAM backed pages have one.
    pub fn get_page_pointer(&self, page: u8) -> Option<&[u8]> {
        match page {
            0x00..=0x1f => {
                let start = (page as usize & 0x07) * PAGE_SIZE;
                Some(&self.ram[start..start + PAGE_SIZE])
            }
            0x60..=0x7f if !self.extended_ram.is_empty() => {
                let start = (page as usize - 0x60) * PAGE_SIZE;
                Some(&self.extended_ram[start..start + PAGE_SIZE])
            }
            _ => None,
        }
    }

    // Pair the bus with the hardware behind its ports so the CPU can drive it
    pub fn attach<'a>(&'a mut self, ports: &'a mut dyn Ports) -> Attached<'a> {
        Attached { bus: self, ports }
    }
}

impl Default for Bus {
    fn default() -> Self { Self::new() }
}

impl PartialEq for Bus {
    fn eq(&self, other: &Self) -> bool {
        self.ram[..] == other.ram[..]
            && self.extended_ram == other.extended_ram
            && self.read_ports == other.read_ports
            && self.write_ports == other.write_ports
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        writeln!(formatter, "RAM | {:?}\n", (&self.ram[..]).hex_dump())?;
        write!(formatter, "Extended RAM | {:?}", (&self.extended_ram[..]).hex_dump())
    }
}

pub struct Attached<'a> {
    bus: &'a mut Bus,
    ports: &'a mut dyn Ports,
}

impl<'a> Memory for Attached<'a> {
    fn read(&mut self, addr: u16) -> u8 { self.bus.read(addr, self.ports) }
    fn write(&mut self, addr: u16, data: u8) { self.bus.write(addr, data, self.ports) }
}
