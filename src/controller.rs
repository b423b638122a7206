// Standard gamepad. A serial shift register read one button at a time through 0x4016/0x4017.

// Bit position of each button in the action mask
pub mod button {
    pub const A: u8 = 1 << 0;
    pub const B: u8 = 1 << 1;
    pub const SELECT: u8 = 1 << 2;
    pub const START: u8 = 1 << 3;
    pub const UP: u8 = 1 << 4;
    pub const DOWN: u8 = 1 << 5;
    pub const LEFT: u8 = 1 << 6;
    pub const RIGHT: u8 = 1 << 7;

    pub const NAMES: [(&str, u8); 8] = [
        ("a", A), ("b", B), ("select", SELECT), ("start", START),
        ("up", UP), ("down", DOWN), ("left", LEFT), ("right", RIGHT),
    ];

    // Parse a list like "a+right". Case insensitive.
    pub fn parse(text: &str) -> Option<u8> {
        let mut mask = 0;
        for name in text.split(|c| c == '+' || c == ',').map(str::trim).filter(|name| !name.is_empty()) {
            let name = name.to_ascii_lowercase();
            let (_, bit) = NAMES.iter().find(|(button, _)| *button == name)?;
            mask |= bit;
        }
        Some(mask)
    }
}

// Upper bits of a controller read come from the data bus. Games expect 0x40.
pub const OPEN_BUS: u8 = 0x40;

// Official pads report 1 once all eight buttons were shifted out
pub const IDLE: u8 = 1;

const BUTTON_COUNT: u8 = 8;

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Controller {
    buttons: u8,
    latch: u8,
    index: u8,
    strobe: bool,
}

impl Controller {
    pub fn new() -> Self { Self::default() }

    // Input from the host. One bit per button, A on bit 0.
    pub fn write_buttons(&mut self, buttons: u8) {
        self.buttons = buttons;
        if self.strobe { self.latch = buttons; }
    }

    pub fn buttons(&self) -> u8 { self.buttons }

    // Write to 0x4016. Bit 0 high keeps reloading the latch.
    pub fn strobe(&mut self, data: u8) {
        self.strobe = data & 1 != 0;
        self.latch = self.buttons;
        self.index = 0;
    }

    // Read from 0x4016/0x4017
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            return (self.buttons & 1) | OPEN_BUS;
        }

        if self.index >= BUTTON_COUNT {
            return IDLE | OPEN_BUS;
        }

        let bit = (self.latch >> self.index) & 1;
        self.index += 1;
        bit | OPEN_BUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latched(buttons: u8) -> Controller {
        let mut controller = Controller::new();
        controller.write_buttons(buttons);
        controller.strobe(1);
        controller.strobe(0);
        controller
    }

    #[test]
    fn bit_order() {
        let mut controller = latched(button::A | button::START | button::LEFT);
        let bits: Vec<u8> = (0..8).map(|_| controller.read() & 1).collect();
        assert_eq!(bits, vec![1, 0, 0, 1, 0, 0, 1, 0]);
    }

    #[test]
    fn idle_after_eight_reads() {
        let mut controller = latched(0);
        for _ in 0..8 { assert_eq!(controller.read(), OPEN_BUS); }
        assert_eq!(controller.read(), IDLE | OPEN_BUS);
        assert_eq!(controller.read(), IDLE | OPEN_BUS);
    }

    #[test]
    fn strobe_high_reports_a() {
        let mut controller = Controller::new();
        controller.strobe(1);
        controller.write_buttons(button::A | button::B);
        assert_eq!(controller.read(), 1 | OPEN_BUS);
        assert_eq!(controller.read(), 1 | OPEN_BUS);
        controller.write_buttons(button::B);
        assert_eq!(controller.read(), OPEN_BUS);
    }

    #[test]
    fn latch_is_frozen_while_low() {
        let mut controller = latched(button::RIGHT);
        controller.write_buttons(button::A);
        let bits: Vec<u8> = (0..8).map(|_| controller.read() & 1).collect();
        assert_eq!(bits, vec![0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn parse_button_names() {
        assert_eq!(button::parse("A+Right"), Some(button::A | button::RIGHT));
        assert_eq!(button::parse("start, select"), Some(button::START | button::SELECT));
        assert_eq!(button::parse(""), Some(0));
        assert_eq!(button::parse("turbo"), None);
    }

    #[test]
    fn strobe_restarts_sequence() {
        let mut controller = latched(button::B);
        controller.read();
        controller.read();
        controller.strobe(0);
        assert_eq!(controller.read() & 1, 0);
        assert_eq!(controller.read() & 1, 1);
    }
}
