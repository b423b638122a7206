// Bit manipulation module

// Check if a bit is set
pub fn is_set(byte: u8, index: u8) -> bool {
    (byte & (1 << index)) != 0
}

// Copy the source into the destination filtering by the mask
pub fn copy(dest: u16, source: u16, mask: u16) -> u16 {
    (dest & !mask) | (source & mask)
}

// Create a word based on the two bytes
pub fn word(high: u8, low: u8) -> u16 { (u16::from(high) << 8) | u16::from(low) }

// Get the low byte of a word
pub fn low(word: u16) -> u8 { word as u8 }

// Get the high byte of a word
pub fn high(word: u16) -> u8 { (word >> 8) as u8 }

// True when both addresses live in different 256 bytes pages
pub fn crosses_page(from: u16, to: u16) -> bool {
    (from & 0xff00) != (to & 0xff00)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_from_bytes() {
        assert_eq!(word(0x12, 0x34), 0x1234);
        assert_eq!(high(0x1234), 0x12);
        assert_eq!(low(0x1234), 0x34);
    }

    #[test]
    fn copy_masked() {
        assert_eq!(copy(0xffff, 0x0000, 0x0c00), 0xf3ff);
        assert_eq!(copy(0x0000, 0x0403, 0x0c00), 0x0400);
    }

    #[test]
    fn page_crossing() {
        assert!(!crosses_page(0x12f0, 0x12ff));
        assert!(crosses_page(0x12ff, 0x1300));
        assert!(crosses_page(0xffff, 0x0000));
    }

    #[test]
    fn bit_check() {
        assert!(is_set(0b0000_0100, 2));
        assert!(!is_set(0b0000_0100, 3));
    }
}
