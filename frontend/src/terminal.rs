//! Terminal backend: renders the LEM as a bordered text grid, feeds the
//! keyboard device, and owns the message area below the display.
//!
//! While the machine runs the terminal sits in raw mode on the alternate
//! screen; debugger sessions drop back to ordinary line-buffered I/O.
//! Log output is routed through the same message area so it cannot tear
//! the display.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers, poll, read};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};

use dcpu16_core::device::keyboard::KeySource;
use dcpu16_core::device::lem::{Frame, SCR_HEIGHT, SCR_WIDTH, Screen};
use dcpu16_core::machine;

/// The bordered video box: 12 rows of tiles plus the border rows, 32
/// columns plus two border columns each side.
const BOX_ROWS: u16 = SCR_HEIGHT as u16 + 2;
const BOX_COLS: u16 = SCR_WIDTH as u16 + 4;

/// First terminal row of the message area.
const MSG_TOP: u16 = BOX_ROWS + 1;

static RAW_MODE: AtomicBool = AtomicBool::new(false);
static MESSAGES: Mutex<VecDeque<String>> = Mutex::new(VecDeque::new());

fn raw_mode() -> bool {
    RAW_MODE.load(Ordering::Relaxed)
}

/// Route `log` output through the message area.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(buf, "{}: {}", record.level().as_str().to_lowercase(), record.args())
        })
        .target(env_logger::Target::Pipe(Box::new(MessageWriter::default())))
        .init();
}

/// Print one line to the message area (or plainly, outside raw mode).
pub fn message(text: &str) {
    if !raw_mode() {
        println!("{text}");
        return;
    }

    let rows = crossterm::terminal::size().map(|(_, h)| h).unwrap_or(24);
    let capacity = usize::from(rows.saturating_sub(MSG_TOP)).max(1);

    let mut lines = MESSAGES.lock().expect("message area poisoned");
    lines.push_back(text.to_string());
    while lines.len() > capacity {
        lines.pop_front();
    }

    let mut out = io::stdout();
    for (i, line) in lines.iter().enumerate() {
        let _ = queue!(
            out,
            MoveTo(0, MSG_TOP + i as u16),
            Clear(ClearType::CurrentLine),
            Print(line)
        );
    }
    let _ = out.flush();
}

/// Collects log bytes and forwards whole lines to [`message`].
#[derive(Default)]
struct MessageWriter {
    partial: Vec<u8>,
}

impl Write for MessageWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.partial.extend_from_slice(buf);
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            message(String::from_utf8_lossy(&line[..pos]).trim_end());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Raw-mode guard for the running machine. Construction switches to the
/// alternate screen with the cursor hidden; dropping it restores
/// line-buffered I/O for the debugger or exit.
pub struct RunGuard;

impl RunGuard {
    pub fn enter() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        RAW_MODE.store(true, Ordering::Relaxed);
        Ok(Self)
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        RAW_MODE.store(false, Ordering::Relaxed);
        MESSAGES.lock().expect("message area poisoned").clear();
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Key source polling the terminal without blocking.
pub struct TermKeys;

impl TermKeys {
    pub fn new() -> Self {
        Self
    }
}

impl KeySource for TermKeys {
    fn poll_key(&mut self) -> Option<u16> {
        // Outside raw mode the debugger owns stdin.
        if !raw_mode() {
            return None;
        }
        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(event) = read() else { return None };
            let Event::Key(key) = event else { continue };
            if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                continue;
            }
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                match key.code {
                    KeyCode::Char('c') => machine::request_break(),
                    KeyCode::Char('d') => machine::request_die(),
                    _ => {}
                }
                continue;
            }
            if let Some(code) = map_key(key.code) {
                return Some(code);
            }
        }
        None
    }
}

/// Map a terminal key to the keyboard device's code space.
fn map_key(code: KeyCode) -> Option<u16> {
    match code {
        // DEL and backspace both land on the keyboard spec's backspace.
        KeyCode::Backspace | KeyCode::Delete | KeyCode::Char('\u{7f}') => Some(0x10),
        KeyCode::Enter => Some(0x11),
        KeyCode::Up => Some(0x80),
        KeyCode::Down => Some(0x81),
        KeyCode::Left => Some(0x82),
        KeyCode::Right => Some(0x83),
        KeyCode::Tab => Some(0x09),
        KeyCode::Esc => Some(0x1b),
        KeyCode::Char(c) if c.is_ascii() && !c.is_control() => Some(c as u16),
        _ => None,
    }
}

/// Text renderer for LEM frames.
pub struct TermScreen;

impl TermScreen {
    pub fn new() -> Self {
        Self
    }
}

fn palette_color(frame: &Frame, index: u16) -> Color {
    let [r, g, b] = Frame::rgb(frame.palette[(index & 0xf) as usize]);
    Color::Rgb { r, g, b }
}

fn cell_char(cell: u16, blink_on: bool) -> char {
    let glyph = (cell & 0x7f) as u8;
    if cell & 0x80 != 0 && !blink_on {
        return ' ';
    }
    if glyph.is_ascii_graphic() {
        glyph as char
    } else {
        ' '
    }
}

impl Screen for TermScreen {
    fn redraw(&mut self, frame: &Frame) {
        if !raw_mode() {
            return;
        }
        let mut out = io::stdout();
        let border = palette_color(frame, frame.border);

        // Border box.
        let _ = queue!(out, SetBackgroundColor(border));
        let blank = " ".repeat(usize::from(BOX_COLS));
        let _ = queue!(out, MoveTo(0, 0), Print(&blank));
        let _ = queue!(out, MoveTo(0, BOX_ROWS - 1), Print(&blank));
        for row in 1..BOX_ROWS - 1 {
            let _ = queue!(out, MoveTo(0, row), Print("  "));
            let _ = queue!(out, MoveTo(BOX_COLS - 2, row), Print("  "));
        }

        if frame.mapped {
            for row in 0..SCR_HEIGHT {
                let _ = queue!(out, MoveTo(2, row as u16 + 1));
                for col in 0..SCR_WIDTH {
                    let cell = frame.cells[row * SCR_WIDTH + col];
                    let _ = queue!(
                        out,
                        SetForegroundColor(palette_color(frame, cell >> 12)),
                        SetBackgroundColor(palette_color(frame, cell >> 8)),
                        Print(cell_char(cell, frame.blink_on))
                    );
                }
            }
        }

        let _ = queue!(out, ResetColor);
        let _ = out.flush();
    }
}
