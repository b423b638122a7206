use std::path::PathBuf;
use std::process;

use clap::Parser;

use nestep::ppu::palette::Palette;
use nestep::{button, Config, Emulator, InputPorts};

/// Run a ROM for a number of frames and save the last picture
#[derive(Parser, Debug)]
#[command(name = "nestep")]
#[command(about = "Frame stepped NES emulator", long_about = None)]
struct Args {
    /// Path to the iNES ROM file
    rom: PathBuf,

    /// Number of frames to run
    #[arg(short, long, default_value = "60")]
    frames: u32,

    /// Buttons held on every frame, e.g. "start" or "a+right"
    #[arg(short, long, default_value = "", value_parser = parse_action)]
    action: u8,

    /// Where to save the screenshot. Defaults to a timestamped PNG.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// .pal file with the 64 RGB colors
    #[arg(short, long)]
    palette: Option<PathBuf>,

    /// Leave the second controller idle
    #[arg(long)]
    first_port_only: bool,

    /// Print the CPU and PPU state when done
    #[arg(short, long)]
    dump: bool,
}

fn parse_action(text: &str) -> Result<u8, String> {
    button::parse(text).ok_or_else(|| {
        let names: Vec<&str> = button::NAMES.iter().map(|(name, _)| *name).collect();
        format!("unknown button in \"{}\". Expected any of {}.", text, names.join(", "))
    })
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = Config {
        input_ports: if args.first_port_only { InputPorts::First } else { InputPorts::Both },
        ..Config::default()
    };

    let mut emulator = match Emulator::with_config(&args.rom, config) {
        Ok(emulator) => emulator,
        Err(err) => {
            eprintln!("Failed to start {}: {}", args.rom.display(), err);
            process::exit(1);
        }
    };

    if let Some(path) = &args.palette {
        match Palette::from_file(path) {
            Ok(palette) => emulator.set_palette(palette),
            Err(err) => {
                eprintln!("Failed to read palette {}: {}", path.display(), err);
                process::exit(1);
            }
        }
    }

    emulator.run_frames(args.frames, args.action);
    println!("Ran {} frames.", emulator.frame());

    if args.dump {
        println!("{:?}", emulator.cpu());
        println!("{:?}", emulator.ppu());
    }

    let output = args.output.unwrap_or_else(|| {
        PathBuf::from(format!("nestep-{}.png", chrono::Local::now().format("%Y%m%d-%H%M%S")))
    });

    if let Err(err) = emulator.screenshot().save(&output) {
        eprintln!("Failed to save {}: {}", output.display(), err);
        process::exit(1);
    }
    println!("Saved {}.", output.display());
}
