use crate::error::Error;

// NTSC: 1.79 MHz CPU at 60.1 frames per second
pub const CPU_CYCLES_PER_FRAME: u32 = 29781;

// Controller ports fed by the action given to each step
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InputPorts {
    Both,
    First,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Config {
    pub cpu_cycles_per_frame: u32,
    pub input_ports: InputPorts,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        if self.cpu_cycles_per_frame == 0 {
            return Err(Error::Configuration("a step must run at least one CPU cycle".to_owned()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { cpu_cycles_per_frame: CPU_CYCLES_PER_FRAME, input_ports: InputPorts::Both }
    }
}
