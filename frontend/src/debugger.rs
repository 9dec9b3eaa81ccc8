//! Interactive debugger: a small line-oriented command loop over the
//! stopped machine. Unambiguous command prefixes are accepted.

use std::io::{self, BufRead, Write};

use dcpu16_core::cpu::{RAM_WORDS, Reg};
use dcpu16_core::disasm;
use dcpu16_core::image;
use dcpu16_core::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Help,
    Continue,
    Step(usize),
    Dump,
    Print { addr: u16, len: u16 },
    Core,
    Quit,
}

/// Prefix match bounded below by the shortest unambiguous form.
fn matches(token: &str, min: &str, full: &str) -> bool {
    token.len() >= min.len() && full.to_lowercase().starts_with(&token.to_lowercase())
}

fn parse_word(token: &str) -> Option<u16> {
    let hex = token.strip_prefix("0x").unwrap_or(token);
    u16::from_str_radix(hex, 16).ok()
}

fn parse(line: &str) -> Result<Option<Command>, String> {
    let mut tokens = line.split_whitespace();
    let Some(cmd) = tokens.next() else {
        return Ok(None);
    };

    let command = if matches(cmd, "h", "help") || cmd == "?" {
        Command::Help
    } else if matches(cmd, "con", "continue") {
        Command::Continue
    } else if matches(cmd, "s", "step") {
        let count = match tokens.next() {
            Some(n) => n
                .parse()
                .map_err(|_| format!("bad step count: {n}"))?,
            None => 1,
        };
        Command::Step(count)
    } else if matches(cmd, "d", "dump") {
        Command::Dump
    } else if matches(cmd, "p", "print") {
        let addr = tokens
            .next()
            .ok_or_else(|| "print needs an address".to_string())?;
        let addr = parse_word(addr).ok_or_else(|| format!("bad address: {addr}"))?;
        let len = match tokens.next() {
            Some(n) => parse_word(n).ok_or_else(|| format!("bad length: {n}"))?,
            None => 1,
        };
        Command::Print { addr, len }
    } else if matches(cmd, "cor", "core") {
        Command::Core
    } else if matches(cmd, "e", "exit") || matches(cmd, "q", "quit") {
        Command::Quit
    } else {
        return Err(format!("unrecognized or ambiguous command: {cmd}"));
    };

    if tokens.next().is_some() {
        return Err(format!("trailing arguments after {cmd}"));
    }
    Ok(Some(command))
}

fn dump_header() {
    println!("pc   sp   ex   ia   a    b    c    x    y    z    i    j    instruction");
    println!("---- ---- ---- ---- ---- ---- ---- ---- ---- ---- ---- ---- -----------");
}

fn dump_state(m: &Machine) {
    let (text, _) = disasm::disassemble(&m.cpu, m.cpu.pc);
    print!(
        "{:04x} {:04x} {:04x} {:04x}",
        m.cpu.pc, m.cpu.sp, m.cpu.ex, m.cpu.ia
    );
    for reg in Reg::ALL {
        print!(" {:04x}", m.cpu.reg(reg));
    }
    println!(" {text}");
}

fn print_ram(m: &Machine, addr: u16, len: u16) {
    let len = usize::from(len).clamp(1, RAM_WORDS);
    for i in 0..len {
        let cell = addr.wrapping_add(i as u16);
        if i % 8 == 0 {
            if i > 0 {
                println!();
            }
            print!("0x{cell:04x}:");
        }
        print!(" {:04x}", m.cpu.read(cell));
    }
    println!();
}

fn help() {
    println!("  help, ?: show this message");
    println!("  continue: resume running");
    println!("  step [n]: execute n instructions (default 1)");
    println!("  dump: display the state of the cpu");
    println!("  print addr [len]: display ram contents (hex args)");
    println!("  core: dump ram image to {}", image::COREFILE_NAME);
    println!("  exit, quit: exit emulator");
    println!("unambiguous abbreviations are recognized (e.g., s for step or con for continue).");
}

/// Run the debugger until the user resumes or quits. Returns false when
/// the emulator should exit.
pub fn enter(m: &mut Machine) -> bool {
    println!();
    println!("entering emulator debugger: enter 'h' for help.");
    dump_header();
    dump_state(m);

    let stdin = io::stdin();
    loop {
        print!(" * ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return false, // EOF
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return false,
        }

        match parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Help)) => help(),
            Ok(Some(Command::Continue)) => return true,
            Ok(Some(Command::Step(count))) => {
                for _ in 0..count {
                    m.step();
                }
                dump_state(m);
            }
            Ok(Some(Command::Dump)) => {
                dump_header();
                dump_state(m);
            }
            Ok(Some(Command::Print { addr, len })) => print_ram(m, addr, len),
            Ok(Some(Command::Core)) => match image::core_dump(&m.cpu, 0) {
                Ok(()) => println!("core written to {}", image::COREFILE_NAME),
                Err(e) => println!("{e}"),
            },
            Ok(Some(Command::Quit)) => return false,
            Err(e) => println!("{e}"),
        }
    }
}
