use std::fmt;

use pretty_hex::PrettyHex;

use crate::bus::picture::PictureBus;
use crate::ppu::registers::{Control, Mask};
use crate::utils::bits;

pub mod palette;
pub mod registers;

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;
pub const SCREEN_SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

pub const CYCLES_PER_SCANLINE: u16 = 341;
pub const SCANLINES_PER_FRAME: u16 = 262;
pub const VBLANK_SCANLINE: u16 = 241;
pub const PRE_RENDER_SCANLINE: u16 = 261;

const LAST_CYCLE: u16 = CYCLES_PER_SCANLINE - 1;
const OAM_CAPACITY: usize = 0x100;
const SPRITES_PER_SCANLINE: usize = 8;
const SPRITE_PALETTES: u8 = 0x10;

// Who gets told when vertical blank starts
pub trait InterruptLine {
    fn nmi(&mut self);
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    PreRender,
    Render,
    PostRender,
    VerticalBlank,
}

#[derive(Clone, PartialEq)]
pub struct Ppu {
    // Rendering position
    scanline: u16,
    cycle: u16,
    even_frame: bool,
    frame: u64,

    // Decoded PPUCTRL and PPUMASK
    control: Control,
    mask: Mask,

    // PPUSTATUS
    vblank: bool,
    sprite_zero_hit: bool,
    sprite_overflow: bool,

    // Internal registers
    // Current VRAM address. 15 bits.
    v: u16,
    // Temporary VRAM address. 15 bits.
    t: u16,
    // Fine X scroll. 3 bits.
    fine_x: u8,
    // Write toggle shared by PPUSCROLL and PPUADDR. True before the first write.
    first_write: bool,

    // PPUDATA reads below the palette come from here
    data_buffer: u8,

    // Internal PPU bus. Any read or write to its registers fills it.
    latch: u8,

    oam_address: u8,
    oam: [u8; OAM_CAPACITY],

    // OAM indexes of the sprites on the line being drawn
    scanline_sprites: Vec<u8>,

    // NES color index of every pixel
    screen: Vec<u8>,
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            scanline: PRE_RENDER_SCANLINE,
            cycle: 0,
            even_frame: true,
            frame: 0,
            control: Control::from(0),
            mask: Mask::from(0),
            vblank: false,
            sprite_zero_hit: false,
            sprite_overflow: false,
            v: 0,
            t: 0,
            fine_x: 0,
            first_write: true,
            data_buffer: 0,
            latch: 0,
            oam_address: 0,
            oam: [0; OAM_CAPACITY],
            scanline_sprites: Vec::with_capacity(SPRITES_PER_SCANLINE),
            screen: vec![0; SCREEN_SIZE],
        }
    }

    // Power up state. The picture is kept.
    pub fn reset(&mut self) {
        let screen = std::mem::replace(&mut self.screen, Vec::new());
        *self = Self { screen, ..Self::new() };
    }

    pub fn screen(&self) -> &[u8] { &self.screen }
    pub fn oam(&self) -> &[u8] { &self.oam }
    pub fn frame(&self) -> u64 { self.frame }
    pub fn scanline(&self) -> u16 { self.scanline }
    pub fn cycle(&self) -> u16 { self.cycle }
    pub fn vram_addr(&self) -> u16 { self.v }
    pub fn temp_addr(&self) -> u16 { self.t }
    pub fn fine_x(&self) -> u8 { self.fine_x }
    pub fn oam_address(&self) -> u8 { self.oam_address }
    pub fn in_vblank(&self) -> bool { self.vblank }

    pub fn phase(&self) -> Phase {
        match self.scanline {
            0..=239 => Phase::Render,
            240 => Phase::PostRender,
            PRE_RENDER_SCANLINE => Phase::PreRender,
            _ => Phase::VerticalBlank,
        }
    }

    // region Registers

    // Write PPUCTRL
    pub fn control(&mut self, data: u8) {
        self.latch = data;
        self.control = Control::from(data);
        self.t = (self.t & !registers::NAMETABLE) | (self.control.nametable << 10);
    }

    // Write PPUMASK
    pub fn set_mask(&mut self, data: u8) {
        self.latch = data;
        self.mask = Mask::from(data);
    }

    // Read PPUSTATUS
    pub fn get_status(&mut self) -> u8 {
        // PPU status has some unused bits, so fill in from the latch.
        let status = (self.latch & 0b0001_1111)
            | ((self.sprite_overflow as u8) << 5)
            | ((self.sprite_zero_hit as u8) << 6)
            | ((self.vblank as u8) << 7);

        // Vertical blank and the write toggle are cleared after reading status
        self.vblank = false;
        self.first_write = true;
        self.latch = status;
        status
    }

    // Write PPUADDR. High six bits first.
    pub fn set_data_address(&mut self, data: u8) {
        self.latch = data;
        if self.first_write {
            self.t = bits::copy(self.t, u16::from(data & 0x3f) << 8, 0xff00);
        } else {
            self.t = bits::copy(self.t, u16::from(data), 0x00ff);
            self.v = self.t;
        }
        self.first_write = !self.first_write;
    }

    // Write PPUSCROLL. X first, then Y.
    pub fn set_scroll(&mut self, data: u8) {
        self.latch = data;
        let data16 = u16::from(data);
        if self.first_write {
            self.t = bits::copy(self.t, data16 >> 3, registers::COARSE_X);
            self.fine_x = data & 0b111;
        } else {
            self.t = bits::copy(self.t, ((data16 & 0b111) << 12) | ((data16 & 0xf8) << 2),
                                registers::FINE_Y | registers::COARSE_Y);
        }
        self.first_write = !self.first_write;
    }

    // Read PPUDATA
    pub fn get_data(&mut self, bus: &PictureBus) -> u8 {
        let addr = self.v & 0x3fff;

        // Palette data is read immediately, filling the buffer with the nametable underneath.
        // Everything else is read into a buffer and the previous contents of the buffer is returned.
        let data = if addr >= 0x3f00 {
            self.data_buffer = bus.read(addr & 0x2fff);
            bus.read(addr)
        } else {
            let data = self.data_buffer;
            self.data_buffer = bus.read(addr);
            data
        };

        self.increment_address();
        self.latch = data;
        data
    }

    // Write PPUDATA
    pub fn set_data(&mut self, bus: &mut PictureBus, data: u8) {
        self.latch = data;
        bus.write(self.v & 0x3fff, data);
        self.increment_address();
    }

    fn increment_address(&mut self) {
        self.v = self.v.wrapping_add(self.control.increment) & registers::VRAM_ADDR_MASK;
    }

    // Write OAMADDR
    pub fn set_oam_address(&mut self, data: u8) {
        self.latch = data;
        self.oam_address = data;
    }

    // Read OAMDATA. Doesn't increment.
    pub fn get_oam_data(&mut self) -> u8 {
        self.latch = self.oam[self.oam_address as usize];
        self.latch
    }

    // Write OAMDATA
    pub fn set_oam_data(&mut self, data: u8) {
        self.latch = data;
        self.oam[self.oam_address as usize] = data;
        self.oam_address = self.oam_address.wrapping_add(1);
    }

    // Fill OAM from a CPU page, starting at OAMADDR and wrapping around
    pub fn do_dma(&mut self, page: &[u8]) {
        for (i, &data) in page.iter().take(OAM_CAPACITY).enumerate() {
            let index = (self.oam_address as usize + i) % OAM_CAPACITY;
            self.oam[index] = data;
        }
    }

    // Reading a write only register returns what is left on the internal bus
    pub fn open_bus(&self) -> u8 { self.latch }

    // Writing any register fills the internal bus
    pub fn set_latch(&mut self, data: u8) { self.latch = data }

    // endregion

    // region Rendering

    // Step a cycle
    pub fn step<I: InterruptLine + ?Sized>(&mut self, bus: &mut PictureBus, line: &mut I) {
        match self.phase() {
            Phase::Render => self.render(bus),
            Phase::PostRender => {}
            Phase::VerticalBlank => {
                if self.scanline == VBLANK_SCANLINE && self.cycle == 1 {
                    self.vblank = true;
                    trace!(target: "ppu", "Vblank start. Frame {}.", self.frame);
                    if self.control.generate_interrupt { line.nmi(); }
                }
            }
            Phase::PreRender => self.pre_render(),
        }

        self.advance();
    }

    fn advance(&mut self) {
        // When rendering, odd frames skip the last cycle of pre-render
        let last = if self.scanline == PRE_RENDER_SCANLINE && !self.even_frame && self.mask.rendering() {
            LAST_CYCLE - 1
        } else {
            LAST_CYCLE
        };

        if self.cycle < last {
            self.cycle += 1;
            return;
        }

        self.cycle = 0;
        self.scanline += 1;
        if self.scanline == SCANLINES_PER_FRAME {
            self.scanline = 0;
            self.even_frame = !self.even_frame;
            self.frame += 1;
        }
    }

    fn pre_render(&mut self) {
        let rendering = self.mask.rendering();
        match self.cycle {
            1 => {
                self.vblank = false;
                self.sprite_zero_hit = false;
                self.sprite_overflow = false;
                // Sprites picked on the last visible line belong to the post-render line
                self.scanline_sprites.clear();
                trace!(target: "ppu", "Vblank end.");
            }
            258 if rendering => self.v = registers::copy(self.v, self.t, registers::HORIZONTAL),
            281..=304 if rendering => self.v = registers::copy(self.v, self.t, registers::VERTICAL),
            _ => {}
        }
    }

    fn render(&mut self, bus: &PictureBus) {
        let rendering = self.mask.rendering();
        match self.cycle {
            1..=256 => self.draw_pixel(bus),
            257 if rendering => self.v = registers::inc_fine_y(self.v),
            258 if rendering => self.v = registers::copy(self.v, self.t, registers::HORIZONTAL),
            LAST_CYCLE if rendering => self.evaluate_sprites(),
            _ => {}
        }
    }

    // Background pixel: palette entry 0-15, opaque when the low two bits aren't zero
    fn background_pixel(&mut self, bus: &PictureBus, x: usize) -> u8 {
        if !self.mask.show_background { return 0; }

        let fine_x = (usize::from(self.fine_x) + x) % 8;
        let mut color = 0;

        if self.mask.show_edge_background || x >= 8 {
            let tile = u16::from(bus.read(registers::tile_addr(self.v)));
            let addr = self.control.background_page + tile * 16 + registers::fine_y(self.v);
            let shift = 7 ^ fine_x;
            color = ((bus.read(addr) >> shift) & 1) | (((bus.read(addr + 8) >> shift) & 1) << 1);

            if color != 0 {
                let attribute = bus.read(registers::attribute_addr(self.v));
                color |= ((attribute >> registers::attribute_shift(self.v)) & 0b11) << 2;
            }
        }

        // Move to the next tile
        if fine_x == 7 {
            self.v = registers::inc_coarse_x(self.v);
        }

        color
    }

    // First opaque sprite pixel: (palette entry 16-31, in front of background, sprite zero)
    fn sprite_pixel(&self, bus: &PictureBus, x: usize, y: usize) -> Option<(u8, bool, bool)> {
        if !self.mask.show_sprites || (!self.mask.show_edge_sprites && x < 8) { return None; }

        let length = if self.control.long_sprites { 16 } else { 8 };

        for &index in &self.scanline_sprites {
            let sprite = &self.oam[index as usize * 4..index as usize * 4 + 4];
            let sprite_x = usize::from(sprite[3]);
            if x < sprite_x || x - sprite_x >= 8 { continue; }

            let sprite_y = usize::from(sprite[0]) + 1;
            let tile = u16::from(sprite[1]);
            let attribute = sprite[2];

            let mut x_shift = (x - sprite_x) % 8;
            let mut y_offset = (y.wrapping_sub(sprite_y) % length) as u16;

            // Flip
            if !bits::is_set(attribute, 6) { x_shift ^= 7; }
            if bits::is_set(attribute, 7) { y_offset ^= length as u16 - 1; }

            let addr = if self.control.long_sprites {
                // Bit 0 of the tile selects the table, the bottom half is the next tile
                let y_offset = (y_offset & 7) | ((y_offset & 8) << 1);
                ((tile & 1) << 12) | ((tile >> 1) * 32 + y_offset)
            } else {
                self.control.sprite_page + tile * 16 + y_offset
            };

            let color = ((bus.read(addr) >> x_shift) & 1) | (((bus.read(addr + 8) >> x_shift) & 1) << 1);
            if color == 0 { continue; }

            let color = SPRITE_PALETTES | ((attribute & 0b11) << 2) | color;
            let front = !bits::is_set(attribute, 5);
            return Some((color, front, index == 0));
        }

        None
    }

    fn draw_pixel(&mut self, bus: &PictureBus) {
        let x = usize::from(self.cycle - 1);
        let y = usize::from(self.scanline);

        let background = self.background_pixel(bus, x);
        let background_opaque = background & 0b11 != 0;

        let mut entry = if background_opaque { background } else { 0 };

        if let Some((sprite, front, sprite_zero)) = self.sprite_pixel(bus, x, y) {
            if sprite_zero && background_opaque && x != 255 {
                self.sprite_zero_hit = true;
            }
            if !background_opaque || front {
                entry = sprite;
            }
        }

        let mut color = bus.read_palette(entry);
        if self.mask.greyscale { color &= 0x30; }
        self.screen[y * SCREEN_WIDTH + x] = color;
    }

    // Pick the sprites of the next line, at most eight
    fn evaluate_sprites(&mut self) {
        let length = if self.control.long_sprites { 16 } else { 8 };
        let scanline = usize::from(self.scanline);

        self.scanline_sprites.clear();
        for index in usize::from(self.oam_address / 4)..OAM_CAPACITY / 4 {
            let top = usize::from(self.oam[index * 4]);
            if scanline < top || scanline - top >= length { continue; }

            if self.scanline_sprites.len() == SPRITES_PER_SCANLINE {
                self.sprite_overflow = true;
                break;
            }
            self.scanline_sprites.push(index as u8);
        }
    }

    // endregion
}

impl Default for Ppu {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Ppu {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        writeln!(formatter, "Scanline: {}, cycle: {}, frame: {}, {:?}", self.scanline, self.cycle, self.frame, self.phase())?;
        writeln!(formatter, "{:?} | {:?}", self.control, self.mask)?;
        writeln!(formatter, "v: {:04x}, t: {:04x}, x: {}, w: {}, vblank: {}, sprite zero: {}, overflow: {}",
                 self.v, self.t, self.fine_x, !self.first_write, self.vblank, self.sprite_zero_hit, self.sprite_overflow)?;
        write!(formatter, "OAM | {:?}", (&self.oam[..]).hex_dump())
    }
}
