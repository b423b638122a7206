use std::path::Path;
use std::rc::Rc;

use crate::bus::picture::PictureBus;
use crate::bus::register::{Ports, Register};
use crate::bus::Bus;
use crate::cartridge::{Cartridge, Mirroring};
use crate::config::{Config, InputPorts};
use crate::controller::Controller;
use crate::cpu::Cpu;
use crate::error::Error;
use crate::mapper;
use crate::mapper::{Mapper, SharedMapper};
use crate::ppu::palette::Palette;
use crate::ppu::Ppu;
use crate::utils::bits;

const PPU_STEPS_PER_CPU_STEP: u32 = 3;

// What the CPU sees behind the register ports during one CPU step
struct Wiring<'a> {
    ppu: &'a mut Ppu,
    picture_bus: &'a mut PictureBus,
    controllers: &'a mut [Controller; 2],

    // Page written to OAMDMA, copied once the CPU step is done
    dma_page: Option<u8>,
}

impl<'a> Ports for Wiring<'a> {
    fn read(&mut self, register: Register) -> u8 {
        match register {
            Register::PpuStatus => self.ppu.get_status(),
            Register::OamData => self.ppu.get_oam_data(),
            Register::PpuData => self.ppu.get_data(self.picture_bus),
            Register::Joy1 => self.controllers[0].read(),
            Register::Joy2 => self.controllers[1].read(),
            Register::PpuCtrl | Register::PpuMask | Register::OamAddr
            | Register::PpuScroll | Register::PpuAddr => self.ppu.open_bus(),
            // Nothing drives the data lines
            Register::OamDma => 0,
        }
    }

    fn write(&mut self, register: Register, data: u8) {
        match register {
            Register::PpuCtrl => self.ppu.control(data),
            Register::PpuMask => self.ppu.set_mask(data),
            Register::OamAddr => self.ppu.set_oam_address(data),
            Register::OamData => self.ppu.set_oam_data(data),
            Register::PpuScroll => self.ppu.set_scroll(data),
            Register::PpuAddr => self.ppu.set_data_address(data),
            Register::PpuData => self.ppu.set_data(self.picture_bus, data),
            Register::OamDma => self.dma_page = Some(data),
            // One strobe line reaches both controllers
            Register::Joy1 => self.controllers.iter_mut().for_each(|controller| controller.strobe(data)),
            // Read only, the write still lands on the internal bus
            Register::PpuStatus => self.ppu.set_latch(data),
            Register::Joy2 => trace!("APU frame counter 0x{:02x} ignored.", data),
        }
    }

    fn mirroring_changed(&mut self, _mirroring: Mirroring) {
        self.picture_bus.update_mirroring();
    }
}

// Full copy of the console. The mapper is copied too since bank registers
// and CHR RAM are part of the state.
#[derive(Clone)]
pub struct Snapshot {
    bus: Bus,
    picture_bus: PictureBus,
    cpu: Cpu,
    ppu: Ppu,
    controllers: [Controller; 2],
    mapper: Box<dyn Mapper>,
}

impl Snapshot {
    pub fn cpu(&self) -> &Cpu { &self.cpu }
    pub fn ppu(&self) -> &Ppu { &self.ppu }
    pub fn frame(&self) -> u64 { self.ppu.frame() }
}

pub struct Emulator {
    config: Config,
    cartridge: Rc<Cartridge>,
    mapper: SharedMapper,

    bus: Bus,
    picture_bus: PictureBus,
    cpu: Cpu,
    ppu: Ppu,
    controllers: [Controller; 2],

    palette: Palette,
    backup: Option<Snapshot>,
}

impl Emulator {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::with_config(path, Config::default())
    }

    pub fn with_config<P: AsRef<Path>>(path: P, config: Config) -> Result<Self, Error> {
        let cartridge = Cartridge::from_file(&path)?;
        info!("Loaded {}.", path.as_ref().display());
        Self::with_cartridge(cartridge, config)
    }

    pub fn from_bytes(rom: &[u8], config: Config) -> Result<Self, Error> {
        Self::with_cartridge(Cartridge::from_bytes(rom)?, config)
    }

    fn with_cartridge(cartridge: Cartridge, config: Config) -> Result<Self, Error> {
        config.validate()?;

        let cartridge = Rc::new(cartridge);
        let mapper = mapper::share(mapper::create(cartridge.clone())?);

        let mut bus = Bus::new();
        for &(addr, register) in Register::READABLE.iter() {
            bus.set_read_port(addr, register)?;
        }
        for &(addr, register) in Register::WRITABLE.iter() {
            bus.set_write_port(addr, register)?;
        }
        bus.check_ports()?;
        bus.set_mapper(mapper.clone());

        let mut picture_bus = PictureBus::new();
        picture_bus.set_mapper(mapper.clone());

        let mut emulator = Self {
            config,
            cartridge,
            mapper,
            bus,
            picture_bus,
            cpu: Cpu::new(),
            ppu: Ppu::new(),
            controllers: [Controller::new(); 2],
            palette: Palette::default(),
            backup: None,
        };
        emulator.reset();

        debug!("Mapper {}, {:?} mirroring, {:?}.",
               emulator.cartridge.mapper_id(), emulator.cartridge.mirroring(), emulator.config);
        Ok(emulator)
    }

    // Power cycle the CPU and PPU. Memory is kept.
    pub fn reset(&mut self) {
        self.ppu.reset();
        self.controllers = [Controller::new(); 2];

        let mut wiring = Wiring {
            ppu: &mut self.ppu,
            picture_bus: &mut self.picture_bus,
            controllers: &mut self.controllers,
            dma_page: None,
        };
        self.cpu.reset(&mut self.bus.attach(&mut wiring));
    }

    // region Execution

    // Run one frame worth of CPU cycles with the buttons in `action` held down
    pub fn step(&mut self, action: u8) {
        self.controllers[0].write_buttons(action);
        if self.config.input_ports == InputPorts::Both {
            self.controllers[1].write_buttons(action);
        }

        for _ in 0..self.config.cpu_cycles_per_frame {
            for _ in 0..PPU_STEPS_PER_CPU_STEP {
                self.ppu.step(&mut self.picture_bus, &mut self.cpu);
            }
            self.step_cpu();
        }
    }

    pub fn run_frames(&mut self, frames: u32, action: u8) {
        for _ in 0..frames { self.step(action); }
    }

    fn step_cpu(&mut self) {
        let mut wiring = Wiring {
            ppu: &mut self.ppu,
            picture_bus: &mut self.picture_bus,
            controllers: &mut self.controllers,
            dma_page: None,
        };
        self.cpu.step(&mut self.bus.attach(&mut wiring));

        if let Some(page) = wiring.dma_page {
            self.dma(page);
        }
    }

    // Copy a CPU page into OAM. The CPU is stalled while it happens.
    pub fn dma(&mut self, page: u8) {
        self.cpu.skip_dma_cycles();
        trace!(target: "ppu", "OAM DMA from page 0x{:02x}.", page);

        let bus = &self.bus;
        match bus.get_page_pointer(page) {
            Some(data) => self.ppu.do_dma(data),
            None => {
                let data: Vec<u8> = (0..=0xff).map(|low| bus.peek(bits::word(page, low))).collect();
                self.ppu.do_dma(&data);
            }
        }
    }

    // endregion

    // region Snapshots

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bus: self.bus.clone(),
            picture_bus: self.picture_bus.clone(),
            cpu: self.cpu.clone(),
            ppu: self.ppu.clone(),
            controllers: self.controllers,
            mapper: self.mapper.borrow().box_clone(),
        }
    }

    // Replace the whole state. Everything is copied before anything is assigned.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) {
        let mapper = mapper::share(snapshot.mapper.clone());

        let mut bus = snapshot.bus.clone();
        bus.set_mapper(mapper.clone());

        let mut picture_bus = snapshot.picture_bus.clone();
        picture_bus.set_mapper(mapper.clone());

        let cpu = snapshot.cpu.clone();
        let ppu = snapshot.ppu.clone();

        self.mapper = mapper;
        self.bus = bus;
        self.picture_bus = picture_bus;
        self.cpu = cpu;
        self.ppu = ppu;
        self.controllers = snapshot.controllers;
    }

    pub fn backup(&mut self) {
        self.backup = Some(self.snapshot());
    }

    pub fn restore(&mut self) {
        match self.backup.take() {
            Some(snapshot) => {
                self.load_snapshot(&snapshot);
                self.backup = Some(snapshot);
            }
            None => warn!("Nothing to restore. Call backup first."),
        }
    }

    pub fn has_backup(&self) -> bool { self.backup.is_some() }

    // endregion

    // region Output

    // NES color index of each pixel, row by row
    pub fn screen(&self) -> &[u8] { self.ppu.screen() }

    // RGB triplets of each pixel, row by row
    pub fn screen_rgb(&self) -> Vec<u8> { self.palette.map_rgb(self.ppu.screen()) }

    pub fn screenshot(&self) -> image::RgbImage { self.palette.to_image(self.ppu.screen()) }

    pub fn set_palette(&mut self, palette: Palette) { self.palette = palette }

    // endregion

    pub fn config(&self) -> &Config { &self.config }
    pub fn cartridge(&self) -> &Cartridge { &self.cartridge }
    pub fn cpu(&self) -> &Cpu { &self.cpu }
    pub fn ppu(&self) -> &Ppu { &self.ppu }
    pub fn bus(&self) -> &Bus { &self.bus }
    pub fn picture_bus(&self) -> &PictureBus { &self.picture_bus }
    pub fn controller(&self, port: usize) -> &Controller { &self.controllers[port] }
    pub fn frame(&self) -> u64 { self.ppu.frame() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::button;

    // NROM image with `program` at 0x8000 and `nmi` at 0x9000
    fn rom(program: &[u8], nmi: &[u8], flags6: u8) -> Vec<u8> {
        let mut file = b"NES\x1a\x01\x00".to_vec();
        file.push(flags6);
        file.resize(0x10, 0);

        let mut prg = vec![0xea; 0x4000];
        prg[..program.len()].copy_from_slice(program);
        prg[0x1000..0x1000 + nmi.len()].copy_from_slice(nmi);
        prg[0x3ffa..].copy_from_slice(&[0x00, 0x90, 0x00, 0x80, 0x00, 0x90]);

        file.extend(prg);
        file
    }

    fn emulator(program: &[u8]) -> Emulator {
        Emulator::from_bytes(&rom(program, &[0x40], 0), Config::default()).unwrap()
    }

    #[test]
    fn starts_at_reset_vector() {
        let emulator = emulator(&[0x4c, 0x00, 0x80]);
        assert_eq!(emulator.cpu().reg.pc, 0x8000);
        assert_eq!(emulator.frame(), 0);
    }

    #[test]
    fn open_bus_on_write_only_register() {
        let emulator = {
            // LDA #$1e; STA $2001; LDA $2000; STA $00; JMP *
            let mut emulator = emulator(&[
                0xa9, 0x1e, 0x8d, 0x01, 0x20, 0xad, 0x00, 0x20, 0x85, 0x00, 0x4c, 0x0a, 0x80]);
            emulator.step(0);
            emulator
        };
        assert_eq!(emulator.bus().ram()[0x00], 0x1e);
    }

    #[test]
    fn status_write_fills_latch() {
        // LDA #$5a; STA $2002; LDA $2005; STA $00; JMP *
        let mut emulator = emulator(&[
            0xa9, 0x5a, 0x8d, 0x02, 0x20, 0xad, 0x05, 0x20, 0x85, 0x00, 0x4c, 0x0a, 0x80]);
        emulator.step(0);
        assert_eq!(emulator.bus().ram()[0x00], 0x5a);
    }

    #[test]
    fn ppu_data_through_ports() {
        // LDA #$21; STA $2006; LDA #$08; STA $2006; LDA #$5c; STA $2007; JMP *
        let mut emulator = emulator(&[
            0xa9, 0x21, 0x8d, 0x06, 0x20, 0xa9, 0x08, 0x8d, 0x06, 0x20,
            0xa9, 0x5c, 0x8d, 0x07, 0x20, 0x4c, 0x0f, 0x80]);
        emulator.step(0);
        assert_eq!(emulator.picture_bus().read(0x2108), 0x5c);
    }

    #[test]
    fn only_first_port_driven() {
        let config = Config { input_ports: InputPorts::First, ..Config::default() };
        let mut emulator = Emulator::from_bytes(&rom(&[0x4c, 0x00, 0x80], &[0x40], 0), config).unwrap();
        emulator.step(button::START);
        assert_eq!(emulator.controller(0).buttons(), button::START);
        assert_eq!(emulator.controller(1).buttons(), 0);
    }

    #[test]
    fn restore_without_backup() {
        let mut emulator = emulator(&[0x4c, 0x00, 0x80]);
        emulator.step(0);
        let cpu = emulator.cpu().clone();
        emulator.restore();
        assert!(!emulator.has_backup());
        assert_eq!(emulator.cpu(), &cpu);
    }

    #[test]
    fn zero_cycle_config() {
        let config = Config { cpu_cycles_per_frame: 0, ..Config::default() };
        let res = Emulator::from_bytes(&rom(&[], &[], 0), config);
        assert!(matches!(res, Err(Error::Configuration(_))));
    }
}
