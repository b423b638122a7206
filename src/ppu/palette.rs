use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;

use crate::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

const COLOR_AMOUNT: usize = 0x40;
const COLOR_DEPTH: usize = 3;

// 2C02 colors
#[rustfmt::skip]
const NTSC: [u32; COLOR_AMOUNT] = [
    0x666666, 0x002a88, 0x1412a7, 0x3b00a4, 0x5c007e, 0x6e0040, 0x6c0600, 0x561d00,
    0x333500, 0x0b4800, 0x005200, 0x004f08, 0x00404d, 0x000000, 0x000000, 0x000000,
    0xadadad, 0x155fd9, 0x4240ff, 0x7527fe, 0xa01acc, 0xb71e7b, 0xb53120, 0x994e00,
    0x6b6d00, 0x388700, 0x0c9300, 0x008f32, 0x007c8d, 0x000000, 0x000000, 0x000000,
    0xfffeff, 0x64b0ff, 0x9290ff, 0xc676ff, 0xf36aff, 0xfe6ecc, 0xfe8170, 0xea9e22,
    0xbcbe00, 0x88d800, 0x5ce430, 0x45e082, 0x48cdde, 0x4f4f4f, 0x000000, 0x000000,
    0xfffeff, 0xc0dfff, 0xd3d2ff, 0xe8c8ff, 0xfbc2ff, 0xfec4ea, 0xfeccc5, 0xf7d8a5,
    0xe4e594, 0xcfef96, 0xbdf4ab, 0xb3f3cc, 0xb5ebf2, 0xb8b8b8, 0x000000, 0x000000,
];

// Maps the 64 NES colors into RGB
#[derive(Clone)]
pub struct Palette {
    colors: [image::Rgb<u8>; COLOR_AMOUNT],
}

impl Palette {
    // Load a .pal file: 64 RGB triplets
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, io::Error> {
        let mut file = File::open(path)?;

        let mut rgb_colors = [0_u8; COLOR_AMOUNT * COLOR_DEPTH];
        file.read_exact(&mut rgb_colors)?;

        let mut colors = [image::Rgb::<u8>([0, 0, 0]); COLOR_AMOUNT];
        for (rgb, color) in rgb_colors.chunks(COLOR_DEPTH).zip(colors.iter_mut()) {
            *color = image::Rgb::<u8>([rgb[0], rgb[1], rgb[2]])
        }

        Ok(Self { colors })
    }

    pub fn rgb(&self, color: u8) -> [u8; 3] {
        self.colors[color as usize % COLOR_AMOUNT].0
    }

    // Flatten the screen into RGB triplets, row by row
    pub fn map_rgb(&self, pixels: &[u8]) -> Vec<u8> {
        pixels.iter().flat_map(|&pixel| self.rgb(pixel).to_vec()).collect()
    }

    // Map a list of pixels into an image
    pub fn map(&self, pixels: &[u8], image: &mut image::RgbImage) {
        for (dest, &source) in image.pixels_mut().zip(pixels) {
            *dest = self.colors[source as usize % COLOR_AMOUNT];
        }
    }

    pub fn to_image(&self, pixels: &[u8]) -> image::RgbImage {
        let mut image = image::RgbImage::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
        self.map(pixels, &mut image);
        image
    }
}

impl Default for Palette {
    fn default() -> Self {
        let mut colors = [image::Rgb::<u8>([0, 0, 0]); COLOR_AMOUNT];
        for (&rgb, color) in NTSC.iter().zip(colors.iter_mut()) {
            *color = image::Rgb::<u8>([(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8]);
        }
        Self { colors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppu::SCREEN_SIZE;

    #[test]
    fn default_colors() {
        let palette = Palette::default();
        assert_eq!(palette.rgb(0x00), [0x66, 0x66, 0x66]);
        assert_eq!(palette.rgb(0x16), [0xb5, 0x31, 0x20]);
        assert_eq!(palette.rgb(0x0f), [0, 0, 0]);
    }

    #[test]
    fn image_size() {
        let palette = Palette::default();
        let mut pixels = vec![0x0f; SCREEN_SIZE];
        pixels[SCREEN_WIDTH + 1] = 0x30;
        let image = palette.to_image(&pixels);
        assert_eq!(image.dimensions(), (256, 240));
        assert_eq!(image.get_pixel(1, 1).0, [0xff, 0xfe, 0xff]);
        assert_eq!(palette.map_rgb(&pixels).len(), SCREEN_SIZE * 3);
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join(format!("palette-{}.pal", std::process::id()));
        let data: Vec<u8> = (0..COLOR_AMOUNT * COLOR_DEPTH).map(|i| i as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let palette = Palette::from_file(&path).unwrap();
        assert_eq!(palette.rgb(1), [3, 4, 5]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn short_file() {
        let path = std::env::temp_dir().join(format!("short-{}.pal", std::process::id()));
        std::fs::write(&path, &[0u8; 10]).unwrap();
        assert!(Palette::from_file(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
