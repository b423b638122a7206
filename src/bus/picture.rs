use std::fmt;

use pretty_hex::PrettyHex;

use crate::cartridge::Mirroring;
use crate::mapper::SharedMapper;

const NAMETABLE_SIZE: usize = 0x400;
const VRAM_CAPACITY: usize = 4 * NAMETABLE_SIZE;
const PALETTE_CAPACITY: usize = 0x20;

// PPU address space.
//
// 0x0000-0x1fff  pattern tables through the mapper
// 0x2000-0x2fff  four nametables, laid over the VRAM by the mirroring
// 0x3000-0x3eff  mirror of 0x2000-0x2eff
// 0x3f00-0x3fff  palette, 0x20 bytes mirrored
#[derive(Clone)]
pub struct PictureBus {
    vram: Vec<u8>,
    palette: [u8; PALETTE_CAPACITY],

    // Start of each logical nametable inside the VRAM
    nametables: [usize; 4],

    mapper: Option<SharedMapper>,
}

impl PictureBus {
    pub fn new() -> Self {
        Self {
            vram: vec![0; VRAM_CAPACITY],
            palette: [0; PALETTE_CAPACITY],
            nametables: Self::layout(Mirroring::Horizontal),
            mapper: None,
        }
    }

    fn layout(mirroring: Mirroring) -> [usize; 4] {
        const N: usize = NAMETABLE_SIZE;
        match mirroring {
            Mirroring::Horizontal => [0, 0, N, N],
            Mirroring::Vertical => [0, N, 0, N],
            Mirroring::OneScreenLower => [0, 0, 0, 0],
            Mirroring::OneScreenUpper => [N, N, N, N],
            Mirroring::FourScreen => [0, N, 2 * N, 3 * N],
        }
    }

    pub fn set_mapper(&mut self, mapper: SharedMapper) {
        self.mapper = Some(mapper);
        self.update_mirroring();
    }

    // Rebuild the nametable layout from the mapper
    pub fn update_mirroring(&mut self) {
        let mirroring = match &self.mapper {
            Some(mapper) => mapper.borrow().mirroring(),
            None => return,
        };
        debug!("Nametable mirroring {:?}.", mirroring);
        self.nametables = Self::layout(mirroring);
    }

    fn mapper(&self, addr: u16) -> &SharedMapper {
        match &self.mapper {
            Some(mapper) => mapper,
            None => panic!("Pattern table access at 0x{:04x} with no mapper bound.", addr),
        }
    }

    fn nametable_index(&self, addr: u16) -> usize {
        let addr = (addr & 0x0fff) as usize;
        self.nametables[addr / NAMETABLE_SIZE] + (addr % NAMETABLE_SIZE)
    }

    // Sprite backdrops alias the background ones
    fn palette_index(addr: u16) -> usize {
        let index = (addr & 0x1f) as usize;
        if index >= 0x10 && index & 0x03 == 0 { index & 0x0f } else { index }
    }

    pub fn read(&self, addr: u16) -> u8 {
        let addr = addr & 0x3fff;
        match addr {
            0x0000..=0x1fff => self.mapper(addr).borrow().read_chr(addr),
            0x2000..=0x3eff => self.vram[self.nametable_index(addr)],
            _ => self.palette[Self::palette_index(addr)],
        }
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        let addr = addr & 0x3fff;
        match addr {
            0x0000..=0x1fff => self.mapper(addr).borrow_mut().write_chr(addr, data),
            0x2000..=0x3eff => {
                let index = self.nametable_index(addr);
                self.vram[index] = data
            }
            _ => self.palette[Self::palette_index(addr)] = data & 0x3f,
        }
    }

    // Color from the palette RAM, index 0x00-0x1f
    pub fn read_palette(&self, index: u8) -> u8 {
        self.palette[Self::palette_index(u16::from(index))]
    }
}

impl Default for PictureBus {
    fn default() -> Self { Self::new() }
}

impl PartialEq for PictureBus {
    fn eq(&self, other: &Self) -> bool {
        self.vram == other.vram && self.palette == other.palette && self.nametables == other.nametables
    }
}

impl fmt::Debug for PictureBus {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        writeln!(formatter, "Nametables | {:x?}", self.nametables)?;
        writeln!(formatter, "VRAM | {:?}\n", (&self.vram[..]).hex_dump())?;
        write!(formatter, "Palette | {:?}", (&self.palette[..]).hex_dump())
    }
}
