// Registers written by the CPU, decoded once on write.

use crate::utils::bits;

// T and V are composed this way during rendering:
// yyy NN YYYYY XXXXX
// ||| || ||||| +++++-- coarse X scroll
// ||| || +++++-------- coarse Y scroll
// ||| ++-------------- nametable select
// +++----------------- fine Y scroll
pub const COARSE_X: u16 = 0b000_00_00000_11111;
pub const COARSE_Y: u16 = 0b000_00_11111_00000;
pub const NAMETABLE_X: u16 = 0b000_01_00000_00000;
pub const NAMETABLE_Y: u16 = 0b000_10_00000_00000;
pub const NAMETABLE: u16 = NAMETABLE_X | NAMETABLE_Y;
pub const FINE_Y: u16 = 0b111_00_00000_00000;

// Bits copied from T into V at the start of a line and during pre-render
pub const HORIZONTAL: u16 = NAMETABLE_X | COARSE_X;
pub const VERTICAL: u16 = FINE_Y | NAMETABLE_Y | COARSE_Y;

// V is 15 bits wide
pub const VRAM_ADDR_MASK: u16 = 0x7fff;

pub fn inc_coarse_x(v: u16) -> u16 {
    if v & COARSE_X == COARSE_X {
        (v & !COARSE_X) ^ NAMETABLE_X
    } else {
        v + 1
    }
}

pub fn inc_fine_y(v: u16) -> u16 {
    if v & FINE_Y != FINE_Y {
        return v + 0x1000;
    }

    let v = v & !FINE_Y;
    let coarse_y = (v & COARSE_Y) >> 5;
    let (coarse_y, v) = match coarse_y {
        // Last row of tiles. Move to the next nametable.
        29 => (0, v ^ NAMETABLE_Y),
        // Attribute rows. Wrap without switching.
        31 => (0, v),
        _ => (coarse_y + 1, v),
    };
    (v & !COARSE_Y) | (coarse_y << 5)
}

// Copy the bits in the mask from T
pub fn copy(v: u16, t: u16, mask: u16) -> u16 { bits::copy(v, t, mask) }

pub fn fine_y(v: u16) -> u16 { (v & FINE_Y) >> 12 }

// Nametable entry under V, fine Y masked out
pub fn tile_addr(v: u16) -> u16 { 0x2000 | (v & 0x0fff) }

// Address of attribute is composed like so:
// NN 1111 YYY XXX
// || |||| ||| +++-- high 3 bits of coarse X (x/4)
// || |||| +++------ high 3 bits of coarse Y (y/4)
// || ++++---------- attribute offset (960 bytes)
// ++--------------- nametable select
pub fn attribute_addr(v: u16) -> u16 {
    0x23c0 | (v & NAMETABLE) | ((v >> 4) & 0x38) | ((v >> 2) & 0x07)
}

// Position of the two palette bits of a tile inside its attribute byte
pub fn attribute_shift(v: u16) -> u8 {
    (((v >> 4) & 0x04) | (v & 0x02)) as u8
}

// PPUCTRL
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Control {
    pub nametable: u16,
    pub increment: u16,
    pub sprite_page: u16,
    pub background_page: u16,
    pub long_sprites: bool,
    pub generate_interrupt: bool,
}

impl From<u8> for Control {
    fn from(data: u8) -> Self {
        Self {
            nametable: u16::from(data & 0b11),
            increment: if bits::is_set(data, 2) { 32 } else { 1 },
            sprite_page: if bits::is_set(data, 3) { 0x1000 } else { 0 },
            background_page: if bits::is_set(data, 4) { 0x1000 } else { 0 },
            long_sprites: bits::is_set(data, 5),
            generate_interrupt: bits::is_set(data, 7),
        }
    }
}

// PPUMASK
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Mask {
    pub greyscale: bool,
    pub show_edge_background: bool,
    pub show_edge_sprites: bool,
    pub show_background: bool,
    pub show_sprites: bool,
    pub emphasis: u8,
}

impl From<u8> for Mask {
    fn from(data: u8) -> Self {
        Self {
            greyscale: bits::is_set(data, 0),
            show_edge_background: bits::is_set(data, 1),
            show_edge_sprites: bits::is_set(data, 2),
            show_background: bits::is_set(data, 3),
            show_sprites: bits::is_set(data, 4),
            emphasis: data >> 5,
        }
    }
}

impl Mask {
    pub fn rendering(&self) -> bool { self.show_background || self.show_sprites }
}
