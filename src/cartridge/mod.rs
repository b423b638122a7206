use pretty_hex::PrettyHex;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::LoadError;
use crate::utils::bits;

pub const PRG_BANK_SIZE: usize = 0x4000;
pub const CHR_BANK_SIZE: usize = 0x2000;
const HEADER_SIZE: usize = 0x10;
const TRAINER_SIZE: usize = 0x200;

// How the four logical nametables map into the console VRAM
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
    OneScreenLower,
    OneScreenUpper,
}

// Contents of an iNES file. Never changes after loading.
pub struct Cartridge {
    prg_rom: Vec<u8>,
    chr_rom: Vec<u8>,
    mapper_id: u8,
    mirroring: Mirroring,
    has_extended_ram: bool,
}

impl Cartridge {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = fs::read(path).map_err(|source| LoadError::Io { path: path.to_owned(), source })?;
        Self::from_bytes(&file)
    }

    pub fn from_bytes(file: &[u8]) -> Result<Self, LoadError> {
        // Check header
        if file.len() < HEADER_SIZE || file[0..4] != b"NES\x1a"[..] {
            return Err(LoadError::InvalidHeader);
        }

        let flags6 = file[0x06];
        let flags7 = file[0x07];

        // A trainer sits between the header and PRG ROM. It is skipped.
        let prg_start = if bits::is_set(flags6, 2) { HEADER_SIZE + TRAINER_SIZE } else { HEADER_SIZE };

        // PRG ROM has 0x04 * 16kb in size
        let prg_end = prg_start + file[0x04] as usize * PRG_BANK_SIZE;
        let prg_rom = file.get(prg_start..prg_end).ok_or(LoadError::UnableToReadPrgRom)?;
        if prg_rom.is_empty() { return Err(LoadError::UnableToReadPrgRom); }

        // CHR ROM has 0x05 * 8kb in size. Zero means the board has CHR RAM.
        let chr_end = prg_end + file[0x05] as usize * CHR_BANK_SIZE;
        let chr_rom = file.get(prg_end..chr_end).ok_or(LoadError::UnableToReadChrRom)?;

        // High nybble of 6 contains the lower nybble of the mapper.
        // High nybble of 7 contains the higher nybble of the mapper.
        let mapper_id = (flags6 >> 4) | (flags7 & 0xf0);

        let mirroring = if bits::is_set(flags6, 3) {
            Mirroring::FourScreen
        } else if bits::is_set(flags6, 0) {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        debug!("Cartridge loaded. Mapper {}, PRG ROM 0x{:x} bytes, CHR ROM 0x{:x} bytes, {:?}.",
               mapper_id, prg_rom.len(), chr_rom.len(), mirroring);

        Ok(Self {
            prg_rom: prg_rom.to_vec(),
            chr_rom: chr_rom.to_vec(),
            mapper_id,
            mirroring,
            has_extended_ram: bits::is_set(flags6, 1),
        })
    }

    pub fn prg_rom(&self) -> &[u8] { &self.prg_rom }
    pub fn chr_rom(&self) -> &[u8] { &self.chr_rom }
    pub fn mapper_id(&self) -> u8 { self.mapper_id }
    pub fn mirroring(&self) -> Mirroring { self.mirroring }
    pub fn has_extended_ram(&self) -> bool { self.has_extended_ram }

    // Number of 16kb PRG banks
    pub fn prg_banks(&self) -> usize { self.prg_rom.len() / PRG_BANK_SIZE }

    // Boards without CHR ROM carry 8kb of CHR RAM
    pub fn has_chr_ram(&self) -> bool { self.chr_rom.is_empty() }
}

impl fmt::Debug for Cartridge {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        writeln!(formatter, "Mapper {} | {:?}", self.mapper_id, self.mirroring)?;
        writeln!(formatter, "PRG ROM | {:?}\n", (&self.prg_rom[..]).hex_dump())?;
        write!(formatter, "CHR ROM | {:?}", (&self.chr_rom[..]).hex_dump())
    }
}
