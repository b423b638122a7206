use std::rc::Rc;

use crate::cartridge::{Cartridge, Mirroring};
use crate::mapper::{Chr, Mapper};

// NROM. No bank switching; 16kb boards mirror their single bank.
#[derive(Clone)]
pub struct Mapper000 {
    cartridge: Rc<Cartridge>,
    chr: Chr,
}

impl Mapper000 {
    pub fn new(cartridge: Rc<Cartridge>) -> Self {
        let chr = Chr::new(cartridge.clone());
        Self { cartridge, chr }
    }
}

impl Mapper for Mapper000 {
    fn cartridge(&self) -> &Cartridge { &self.cartridge }
    fn chr(&self) -> &Chr { &self.chr }
    fn chr_mut(&mut self) -> &mut Chr { &mut self.chr }

    fn translate_prg(&self, addr: u16) -> usize {
        (addr as usize & 0x7fff) % self.cartridge.prg_rom().len()
    }

    fn translate_chr(&self, addr: u16) -> usize {
        (addr as usize & 0x1fff) % self.chr.len()
    }

    fn write_prg(&mut self, addr: u16, data: u8) -> Option<Mirroring> {
        warn!("Write to PRG ROM ignored. Addr 0x{:04x}, data 0x{:02x}.", addr, data);
        None
    }

    fn box_clone(&self) -> Box<dyn Mapper> { Box::new(self.clone()) }
}
