use std::rc::Rc;

use crate::cartridge::{Cartridge, Mirroring, PRG_BANK_SIZE};
use crate::mapper::{Chr, Mapper};

// Serial register holds a marker bit. When the marker reaches bit 0 the next write completes it.
const SHIFT_RESET: u8 = 0b1_0000;
const CHR_BANK_SIZE: usize = 0x1000;

// MMC1 / SxROM.
//
// Registers are written one bit at a time through a 5 bit shift register.
// The fifth write selects the target register from the address:
//
// 0x8000-0x9fff  control   CPPMM: C chr mode, PP prg mode, MM mirroring
// 0xa000-0xbfff  chr bank 0
// 0xc000-0xdfff  chr bank 1
// 0xe000-0xffff  prg bank
//
// Writing a value with bit 7 set clears the shift register and locks the last bank at 0xc000.
#[derive(Clone)]
pub struct Mapper001 {
    cartridge: Rc<Cartridge>,
    chr: Chr,

    shift: u8,
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
}

impl Mapper001 {
    pub fn new(cartridge: Rc<Cartridge>) -> Self {
        let chr = Chr::new(cartridge.clone());

        // Boards start in prg mode 3. Keep the header mirroring until the game picks one.
        let mirroring = match cartridge.mirroring() {
            Mirroring::Vertical => 0b10,
            _ => 0b11,
        };

        Self {
            cartridge,
            chr,
            shift: SHIFT_RESET,
            control: 0b0_1100 | mirroring,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
        }
    }

    fn prg_mode(&self) -> u8 { (self.control >> 2) & 0b11 }

    fn chr_4k_mode(&self) -> bool { self.control & 0b1_0000 != 0 }
}

impl Mapper for Mapper001 {
    fn cartridge(&self) -> &Cartridge { &self.cartridge }
    fn chr(&self) -> &Chr { &self.chr }
    fn chr_mut(&mut self) -> &mut Chr { &mut self.chr }

    fn translate_prg(&self, addr: u16) -> usize {
        let banks = self.cartridge.prg_banks();
        let select = (self.prg_bank & 0x0f) as usize;
        let high = addr >= 0xc000;

        let bank = match self.prg_mode() {
            // 32kb switch, low bit ignored
            0 | 1 => (select & !1) + high as usize,
            // First bank fixed at 0x8000
            2 => if high { select } else { 0 },
            // Last bank fixed at 0xc000
            _ => if high { banks - 1 } else { select },
        };

        (bank % banks) * PRG_BANK_SIZE + (addr as usize & 0x3fff)
    }

    fn translate_chr(&self, addr: u16) -> usize {
        let banks = self.chr.len() / CHR_BANK_SIZE;
        let high = addr >= 0x1000;

        let bank = if self.chr_4k_mode() {
            if high { self.chr_bank1 as usize } else { self.chr_bank0 as usize }
        } else {
            (self.chr_bank0 & 0x1e) as usize + high as usize
        };

        (bank % banks) * CHR_BANK_SIZE + (addr as usize & 0x0fff)
    }

    fn write_prg(&mut self, addr: u16, data: u8) -> Option<Mirroring> {
        if data & 0x80 != 0 {
            self.shift = SHIFT_RESET;
            self.control |= 0b0_1100;
            return None;
        }

        let complete = self.shift & 1 != 0;
        self.shift = (self.shift >> 1) | ((data & 1) << 4);
        if !complete { return None; }

        let value = self.shift;
        self.shift = SHIFT_RESET;

        match addr {
            0x8000..=0x9fff => {
                let before = self.mirroring();
                self.control = value;
                debug!("MMC1 control 0x{:02x}.", value);

                let after = self.mirroring();
                if before != after { return Some(after); }
            }
            0xa000..=0xbfff => self.chr_bank0 = value,
            0xc000..=0xdfff => self.chr_bank1 = value,
            _ => self.prg_bank = value,
        }

        None
    }

    fn mirroring(&self) -> Mirroring {
        match self.control & 0b11 {
            0 => Mirroring::OneScreenLower,
            1 => Mirroring::OneScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }

    // SxROM boards carry 8kb of PRG RAM
    fn has_extended_ram(&self) -> bool { true }

    fn box_clone(&self) -> Box<dyn Mapper> { Box::new(self.clone()) }
}
