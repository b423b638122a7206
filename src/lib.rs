#[macro_use]
extern crate log;

pub mod bus;
pub mod cartridge;
pub mod config;
pub mod controller;
pub mod cpu;
pub mod emulator;
pub mod error;
pub mod mapper;
pub mod ppu;
pub mod utils;

pub use crate::config::{Config, InputPorts};
pub use crate::controller::button;
pub use crate::emulator::{Emulator, Snapshot};
pub use crate::error::{Error, LoadError};
