use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;

use dcpu16_core::prelude::*;
use dcpu16_core::{image, machine};

mod config;
mod debugger;
#[cfg(feature = "graphics")]
mod graphics;
mod screen_dump;
mod terminal;

const SPEC_VERSION: &str = "1.7";
const MODS: &str = "+img +die +dbg";
const DEFAULT_KHZ: u32 = 150;

/// A cycle-paced DCPU-16 emulator with a terminal display and an
/// interactive debugger.
#[derive(Debug, Parser)]
#[command(name = "dcpu16", version, about)]
struct Args {
    /// Memory image to boot.
    image: PathBuf,

    /// Target clock rate in kilohertz [default: 150].
    #[arg(long, value_name = "KHZ")]
    khz: Option<u32>,

    /// Read the image as little-endian words.
    #[arg(long, conflicts_with = "big_endian")]
    little_endian: bool,

    /// Read the image as big-endian words (the default).
    #[arg(long)]
    big_endian: bool,

    /// Enter the debugger before the first instruction.
    #[arg(long)]
    debug_boot: bool,

    /// Break into the debugger when an instruction jumps to itself.
    #[arg(long)]
    detect_loops: bool,

    /// After halting, print the final screen contents as ASCII.
    #[arg(long)]
    dump_screen: bool,

    /// Render the display in a window instead of the terminal.
    #[arg(long)]
    graphics: bool,
}

fn main() -> ExitCode {
    terminal::init_logging();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    match emulate(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("dcpu16: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn emulate(args: Args) -> Result<()> {
    let cfg = config::load();
    let khz = args.khz.or(cfg.khz).unwrap_or(DEFAULT_KHZ).max(1);
    let little_endian =
        args.little_endian || (!args.big_endian && cfg.little_endian.unwrap_or(false));
    let detect_loops = args.detect_loops || cfg.detect_loops.unwrap_or(false);
    let graphics = args.graphics || cfg.graphics.unwrap_or(false);

    println!("welcome to dcpu-16, version {SPEC_VERSION}");
    println!("clock rate: {khz}kHz");
    println!("mods: {MODS}");

    // SIGINT lands in the debugger rather than killing the process;
    // in raw mode ctrl-c arrives as a key event and does the same.
    ctrlc::set_handler(machine::request_break)?;

    let mut m = Machine::new(khz);
    m.detect_loops = detect_loops;
    m.attach(Device::Clock(Clock::new())).expect("empty bus");
    m.attach(Device::Keyboard(Keyboard::new(Box::new(
        terminal::TermKeys::new(),
    ))))
    .expect("empty bus");
    m.attach(Device::Lem(Lem::new(make_screen(graphics)?)))
        .expect("empty bus");

    image::load(&mut m.cpu, &args.image, !little_endian)?;

    println!("press ctrl-c for the debugger, ctrl-d to exit.");
    println!("booting...");

    run(&mut m, args.debug_boot)?;

    if args.dump_screen {
        if let Some(lem) = m.devices().iter().find_map(|d| d.as_lem()) {
            print!("{}", screen_dump::render(&lem.frame(&m.cpu)));
        }
    }

    println!("dcpu-16 halted.");
    Ok(())
}

fn make_screen(graphics: bool) -> Result<Box<dyn Screen>> {
    #[cfg(feature = "graphics")]
    if graphics {
        return Ok(Box::new(graphics::SdlScreen::new()?));
    }
    #[cfg(not(feature = "graphics"))]
    if graphics {
        log::warn!("built without graphics support; using the terminal display");
    }
    Ok(Box::new(terminal::TermScreen::new()))
}

/// The outer control loop: run until halt, dropping in and out of the
/// debugger on request.
fn run(m: &mut Machine, debug_boot: bool) -> Result<()> {
    let mut running = true;
    if debug_boot {
        running = debugger::enter(m);
    }

    while running && !machine::take_die() {
        let mut wants_debugger = false;
        {
            let _raw = terminal::RunGuard::enter()?;
            terminal::message("running...");
            m.start();
            loop {
                match m.step() {
                    Action::Exit => {
                        running = false;
                        break;
                    }
                    Action::Break => {
                        wants_debugger = true;
                        break;
                    }
                    Action::Continue => {}
                }
                if machine::take_break() {
                    wants_debugger = true;
                    break;
                }
                if machine::take_die() {
                    running = false;
                    break;
                }
            }
        }
        if wants_debugger {
            running = debugger::enter(m);
        }
    }
    Ok(())
}
