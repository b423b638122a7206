use std::rc::Rc;

use crate::cartridge::{Cartridge, Mirroring, CHR_BANK_SIZE};
use crate::mapper::{Chr, Mapper};

// CNROM. Fixed PRG like NROM with a switchable 8kb CHR bank.
#[derive(Clone)]
pub struct Mapper003 {
    cartridge: Rc<Cartridge>,
    chr: Chr,
    select: u8,
}

impl Mapper003 {
    pub fn new(cartridge: Rc<Cartridge>) -> Self {
        let chr = Chr::new(cartridge.clone());
        Self { cartridge, chr, select: 0 }
    }
}

impl Mapper for Mapper003 {
    fn cartridge(&self) -> &Cartridge { &self.cartridge }
    fn chr(&self) -> &Chr { &self.chr }
    fn chr_mut(&mut self) -> &mut Chr { &mut self.chr }

    fn translate_prg(&self, addr: u16) -> usize {
        (addr as usize & 0x7fff) % self.cartridge.prg_rom().len()
    }

    fn translate_chr(&self, addr: u16) -> usize {
        let banks = self.chr.len() / CHR_BANK_SIZE;
        (self.select as usize % banks) * CHR_BANK_SIZE + (addr as usize & 0x1fff)
    }

    fn write_prg(&mut self, _addr: u16, data: u8) -> Option<Mirroring> {
        debug!("CNROM CHR bank {}.", data & 0b11);
        self.select = data & 0b11;
        None
    }

    fn box_clone(&self) -> Box<dyn Mapper> { Box::new(self.clone()) }
}
