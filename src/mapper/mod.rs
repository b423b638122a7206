use std::cell::RefCell;
use std::rc::Rc;

use crate::cartridge::{Cartridge, Mirroring, CHR_BANK_SIZE};
use crate::error::Error;
use crate::mapper::mapper000::Mapper000;
use crate::mapper::mapper001::Mapper001;
use crate::mapper::mapper002::Mapper002;
use crate::mapper::mapper003::Mapper003;

pub mod mapper000;
pub mod mapper001;
pub mod mapper002;
pub mod mapper003;

// One mapper per console. Both buses hold a handle to it.
pub type SharedMapper = Rc<RefCell<Box<dyn Mapper>>>;

// Bank switching hardware on the cartridge board.
//
// Translations are pure functions of the banking registers and always land
// inside the PRG ROM or CHR memory of the cartridge.
pub trait Mapper {
    fn cartridge(&self) -> &Cartridge;

    fn chr(&self) -> &Chr;
    fn chr_mut(&mut self) -> &mut Chr;

    // Offset into PRG ROM for a CPU address in 0x8000..=0xffff
    fn translate_prg(&self, addr: u16) -> usize;

    // Offset into CHR memory for a PPU address in 0x0000..=0x1fff
    fn translate_chr(&self, addr: u16) -> usize;

    // Register writes land here. Returns the new mirroring if the write changed it.
    fn write_prg(&mut self, addr: u16, data: u8) -> Option<Mirroring>;

    fn mirroring(&self) -> Mirroring { self.cartridge().mirroring() }

    fn has_extended_ram(&self) -> bool { self.cartridge().has_extended_ram() }

    fn box_clone(&self) -> Box<dyn Mapper>;

    fn read_prg(&self, addr: u16) -> u8 {
        self.cartridge().prg_rom()[self.translate_prg(addr)]
    }

    fn read_chr(&self, addr: u16) -> u8 {
        self.chr().read(self.translate_chr(addr))
    }

    fn write_chr(&mut self, addr: u16, data: u8) {
        let index = self.translate_chr(addr);
        self.chr_mut().write(index, data)
    }
}

impl Clone for Box<dyn Mapper> {
    fn clone(&self) -> Self { self.box_clone() }
}

// Build the mapper the cartridge asks for
pub fn create(cartridge: Rc<Cartridge>) -> Result<Box<dyn Mapper>, Error> {
    let mapper: Box<dyn Mapper> = match cartridge.mapper_id() {
        0 => Box::new(Mapper000::new(cartridge)),
        1 => Box::new(Mapper001::new(cartridge)),
        2 => Box::new(Mapper002::new(cartridge)),
        3 => Box::new(Mapper003::new(cartridge)),
        id => return Err(Error::UnsupportedMapper(id)),
    };
    Ok(mapper)
}

pub fn share(mapper: Box<dyn Mapper>) -> SharedMapper {
    Rc::new(RefCell::new(mapper))
}

// Pattern table memory. CHR ROM lives in the cartridge; boards without it carry 8kb of RAM.
#[derive(Clone)]
pub struct Chr {
    cartridge: Rc<Cartridge>,
    ram: Vec<u8>,
}

impl Chr {
    pub fn new(cartridge: Rc<Cartridge>) -> Self {
        let ram = if cartridge.has_chr_ram() { vec![0; CHR_BANK_SIZE] } else { Vec::new() };
        Self { cartridge, ram }
    }

    pub fn len(&self) -> usize {
        if self.ram.is_empty() { self.cartridge.chr_rom().len() } else { self.ram.len() }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn is_ram(&self) -> bool { !self.ram.is_empty() }

    pub fn read(&self, index: usize) -> u8 {
        if self.ram.is_empty() { self.cartridge.chr_rom()[index] } else { self.ram[index] }
    }

    pub fn write(&mut self, index: usize, data: u8) {
        if self.ram.is_empty() {
            warn!("Write to CHR ROM ignored. Offset 0x{:04x}, data 0x{:02x}.", index, data);
            return;
        }
        self.ram[index] = data;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cartridge::PRG_BANK_SIZE;

    // Build a cartridge where every 16kb PRG bank is filled with its index and
    // every 8kb CHR bank with 0x80 | index.
    pub fn cartridge(mapper: u8, prg_banks: u8, chr_banks: u8, flags6: u8) -> Rc<Cartridge> {
        let mut file = b"NES\x1a".to_vec();
        file.extend_from_slice(&[prg_banks, chr_banks, flags6 | (mapper << 4), mapper & 0xf0]);
        file.resize(0x10, 0);
        for bank in 0..prg_banks {
            file.extend(std::iter::repeat(bank).take(PRG_BANK_SIZE));
        }
        for bank in 0..chr_banks {
            file.extend(std::iter::repeat(0x80 | bank).take(CHR_BANK_SIZE));
        }
        Rc::new(Cartridge::from_bytes(&file).unwrap())
    }

    #[test]
    fn unsupported_mapper() {
        let res = create(cartridge(4, 1, 1, 0));
        assert!(matches!(res, Err(Error::UnsupportedMapper(4))));
    }

    #[test]
    fn supported_mappers() {
        for id in 0..=3 {
            assert!(create(cartridge(id, 2, 1, 0)).is_ok(), "mapper {}", id);
        }
    }

    #[test]
    fn chr_ram_is_writable() {
        let mut mapper = create(cartridge(0, 1, 0, 0)).unwrap();
        assert!(mapper.chr().is_ram());
        mapper.write_chr(0x1234, 0x56);
        assert_eq!(mapper.read_chr(0x1234), 0x56);
    }

    #[test]
    fn chr_rom_is_not_writable() {
        let mut mapper = create(cartridge(0, 1, 1, 0)).unwrap();
        mapper.write_chr(0x0010, 0x56);
        assert_eq!(mapper.read_chr(0x0010), 0x80);
    }

    #[test]
    fn boxed_clone_is_independent() {
        let mut mapper = create(cartridge(2, 4, 0, 0)).unwrap();
        mapper.write_prg(0x8000, 2);
        let copy = mapper.clone();
        mapper.write_prg(0x8000, 1);
        assert_eq!(copy.read_prg(0x8000), 2);
        assert_eq!(mapper.read_prg(0x8000), 1);
    }
}
