use std::rc::Rc;

use crate::cartridge::{Cartridge, Mirroring, PRG_BANK_SIZE};
use crate::mapper::{Chr, Mapper};

// UxROM. Switchable 16kb bank at 0x8000, last bank fixed at 0xc000.
#[derive(Clone)]
pub struct Mapper002 {
    cartridge: Rc<Cartridge>,
    chr: Chr,
    select: u8,
}

impl Mapper002 {
    pub fn new(cartridge: Rc<Cartridge>) -> Self {
        let chr = Chr::new(cartridge.clone());
        Self { cartridge, chr, select: 0 }
    }
}

impl Mapper for Mapper002 {
    fn cartridge(&self) -> &Cartridge { &self.cartridge }
    fn chr(&self) -> &Chr { &self.chr }
    fn chr_mut(&mut self) -> &mut Chr { &mut self.chr }

    fn translate_prg(&self, addr: u16) -> usize {
        let banks = self.cartridge.prg_banks();
        let bank = if addr < 0xc000 { self.select as usize % banks } else { banks - 1 };
        bank * PRG_BANK_SIZE + (addr as usize & 0x3fff)
    }

    fn translate_chr(&self, addr: u16) -> usize {
        (addr as usize & 0x1fff) % self.chr.len()
    }

    fn write_prg(&mut self, _addr: u16, data: u8) -> Option<Mirroring> {
        debug!("UxROM bank {}.", data);
        self.select = data;
        None
    }

    fn box_clone(&self) -> Box<dyn Mapper> { Box::new(self.clone()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::tests::cartridge;

    #[test]
    fn switch_and_fixed_banks() {
        let mut mapper = Mapper002::new(cartridge(2, 8, 0, 0));
        assert_eq!(mapper.read_prg(0x8000), 0);
        mapper.write_prg(0x8000, 6);
        assert_eq!(mapper.read_prg(0x8000), 6);
        assert_eq!(mapper.read_prg(0xbfff), 6);
        assert_eq!(mapper.read_prg(0xc000), 7);
    }

    #[test]
    fn bank_select_wraps() {
        let mut mapper = Mapper002::new(cartridge(2, 4, 0, 0));
        mapper.write_prg(0xffff, 0xfe);
        assert_eq!(mapper.read_prg(0x8000), 2);
    }
}
