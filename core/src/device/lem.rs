//! LEM-1802 display device.
//!
//! The device owns the mapping state (video/font/palette RAM bases and
//! the border color) and builds complete frames from CPU RAM at the
//! display rate. Rendering backends implement [`Screen`] and only
//! translate a finished [`Frame`] to their medium — a terminal draws
//! the cell words as colored characters, a pixel backend calls
//! [`Frame::rasterize`].

use crate::cpu::{Dcpu, Reg};

pub const HW_ID: u32 = 0x7349_f615;
pub const HW_MFR: u32 = 0x1c6c_8b36;
pub const HW_VERSION: u16 = 0x1802;

/// Screen size in tiles.
pub const SCR_WIDTH: usize = 32;
pub const SCR_HEIGHT: usize = 12;
pub const CELLS: usize = SCR_WIDTH * SCR_HEIGHT;

/// Frame rate of the tick hook.
const DISPLAY_HZ: u64 = 30;

/// Blink phase flips twice a second.
const BLINK_NS: u64 = 500_000_000;

/// Border thickness in pixels when rasterized.
const BORDER_PX: usize = 4;

/// Default palette: 12-bit RGB, the usual 16-color ramp.
pub const PALETTE_ROM: [u16; 16] = [
    0x000, 0x00a, 0x0a0, 0x0aa, 0xa00, 0xa0a, 0xa50, 0xaaa, 0x555, 0x55f, 0x5f5, 0x5ff, 0xf55,
    0xf5f, 0xff5, 0xfff,
];

/// Built-in 4x8 font, two words per glyph. The first word holds columns
/// 0 and 1 (column 0 in the high byte), the second columns 2 and 3;
/// within a column byte the MSB is the top row. Glyphs 0x20..=0x7f are
/// a 3x5 face centered in the cell; the control range is blank.
pub const FONT_ROM: [u16; 256] = build_font();

/// Printable glyphs as three 5-bit columns, top bit first. Column 3 and
/// the control range stay empty.
const GLYPHS_3X5: [[u8; 3]; 96] = [
    [0b00000, 0b00000, 0b00000], // space
    [0b00000, 0b11101, 0b00000], // !
    [0b11000, 0b00000, 0b11000], // "
    [0b01010, 0b11111, 0b01010], // #
    [0b01001, 0b11111, 0b10010], // $
    [0b11001, 0b00100, 0b10011], // %
    [0b01111, 0b10101, 0b01011], // &
    [0b00000, 0b11000, 0b00000], // '
    [0b01110, 0b10001, 0b00000], // (
    [0b00000, 0b10001, 0b01110], // )
    [0b01010, 0b00100, 0b01010], // *
    [0b00100, 0b01110, 0b00100], // +
    [0b00001, 0b00010, 0b00000], // ,
    [0b00100, 0b00100, 0b00100], // -
    [0b00000, 0b00001, 0b00000], // .
    [0b00011, 0b00100, 0b11000], // /
    [0b11111, 0b10001, 0b11111], // 0
    [0b01001, 0b11111, 0b00001], // 1
    [0b10111, 0b10101, 0b11101], // 2
    [0b10001, 0b10101, 0b11111], // 3
    [0b11100, 0b00100, 0b11111], // 4
    [0b11101, 0b10101, 0b10111], // 5
    [0b11111, 0b10101, 0b10111], // 6
    [0b10000, 0b10000, 0b11111], // 7
    [0b11111, 0b10101, 0b11111], // 8
    [0b11101, 0b10101, 0b11111], // 9
    [0b00000, 0b01010, 0b00000], // :
    [0b00001, 0b01010, 0b00000], // ;
    [0b00100, 0b01010, 0b10001], // <
    [0b01010, 0b01010, 0b01010], // =
    [0b10001, 0b01010, 0b00100], // >
    [0b10000, 0b10101, 0b11000], // ?
    [0b11111, 0b10001, 0b11101], // @
    [0b01111, 0b10100, 0b01111], // A
    [0b11111, 0b10101, 0b01010], // B
    [0b01110, 0b10001, 0b10001], // C
    [0b11111, 0b10001, 0b01110], // D
    [0b11111, 0b10101, 0b10001], // E
    [0b11111, 0b10100, 0b10000], // F
    [0b01110, 0b10001, 0b10111], // G
    [0b11111, 0b00100, 0b11111], // H
    [0b10001, 0b11111, 0b10001], // I
    [0b00010, 0b00001, 0b11110], // J
    [0b11111, 0b00100, 0b11011], // K
    [0b11111, 0b00001, 0b00001], // L
    [0b11111, 0b01000, 0b11111], // M
    [0b11111, 0b00110, 0b11111], // N
    [0b01110, 0b10001, 0b01110], // O
    [0b11111, 0b10100, 0b01000], // P
    [0b01110, 0b10011, 0b01111], // Q
    [0b11111, 0b10110, 0b01001], // R
    [0b01001, 0b10101, 0b10010], // S
    [0b10000, 0b11111, 0b10000], // T
    [0b11110, 0b00001, 0b11110], // U
    [0b11100, 0b00011, 0b11100], // V
    [0b11111, 0b00010, 0b11111], // W
    [0b11011, 0b00100, 0b11011], // X
    [0b11000, 0b00111, 0b11000], // Y
    [0b10011, 0b10101, 0b11001], // Z
    [0b00000, 0b11111, 0b10001], // [
    [0b11000, 0b00100, 0b00011], // backslash
    [0b10001, 0b11111, 0b00000], // ]
    [0b01000, 0b10000, 0b01000], // ^
    [0b00001, 0b00001, 0b00001], // _
    [0b10000, 0b01000, 0b00000], // `
    [0b01111, 0b10100, 0b01111], // a
    [0b11111, 0b10101, 0b01010], // b
    [0b01110, 0b10001, 0b10001], // c
    [0b11111, 0b10001, 0b01110], // d
    [0b11111, 0b10101, 0b10001], // e
    [0b11111, 0b10100, 0b10000], // f
    [0b01110, 0b10001, 0b10111], // g
    [0b11111, 0b00100, 0b11111], // h
    [0b10001, 0b11111, 0b10001], // i
    [0b00010, 0b00001, 0b11110], // j
    [0b11111, 0b00100, 0b11011], // k
    [0b11111, 0b00001, 0b00001], // l
    [0b11111, 0b01000, 0b11111], // m
    [0b11111, 0b00110, 0b11111], // n
    [0b01110, 0b10001, 0b01110], // o
    [0b11111, 0b10100, 0b01000], // p
    [0b01110, 0b10011, 0b01111], // q
    [0b11111, 0b10110, 0b01001], // r
    [0b01001, 0b10101, 0b10010], // s
    [0b10000, 0b11111, 0b10000], // t
    [0b11110, 0b00001, 0b11110], // u
    [0b11100, 0b00011, 0b11100], // v
    [0b11111, 0b00010, 0b11111], // w
    [0b11011, 0b00100, 0b11011], // x
    [0b11000, 0b00111, 0b11000], // y
    [0b10011, 0b10101, 0b11001], // z
    [0b00100, 0b11011, 0b10001], // {
    [0b00000, 0b11111, 0b00000], // |
    [0b10001, 0b11011, 0b00100], // }
    [0b01000, 0b00100, 0b01000], // ~
    [0b10101, 0b01010, 0b10101], // del
];

const fn build_font() -> [u16; 256] {
    let mut rom = [0u16; 256];
    let mut i = 0;
    while i < GLYPHS_3X5.len() {
        let g = GLYPHS_3X5[i];
        // 5-bit columns sit in rows 1..=5 of the 8-row cell.
        let c0 = (g[0] as u16) << 2;
        let c1 = (g[1] as u16) << 2;
        let c2 = (g[2] as u16) << 2;
        rom[(0x20 + i) * 2] = (c0 << 8) | c1;
        rom[(0x20 + i) * 2 + 1] = c2 << 8;
        i += 1;
    }
    rom
}

/// One rendered display state: everything a backend needs, resolved
/// against CPU RAM at capture time.
pub struct Frame {
    /// Tile words, row-major. Bits 0-6 glyph, bit 7 blink, 8-11
    /// background, 12-15 foreground.
    pub cells: [u16; CELLS],
    pub font: [u16; 256],
    pub palette: [u16; 16],
    /// Border palette index.
    pub border: u16,
    /// Current blink phase; blinking glyphs are hidden while false.
    pub blink_on: bool,
    /// False while no video RAM is mapped (backends show a dark
    /// screen).
    pub mapped: bool,
}

impl Frame {
    /// Rasterized size in pixels, border included.
    pub const WIDTH: usize = SCR_WIDTH * 4 + 2 * BORDER_PX;
    pub const HEIGHT: usize = SCR_HEIGHT * 8 + 2 * BORDER_PX;

    /// Expand a 12-bit palette entry to 8-bit RGB.
    pub fn rgb(color: u16) -> [u8; 3] {
        let scale = |nibble: u16| (nibble * 17) as u8;
        [
            scale((color >> 8) & 0xf),
            scale((color >> 4) & 0xf),
            scale(color & 0xf),
        ]
    }

    fn glyph_column(&self, glyph: u16, col: usize) -> u8 {
        let word = self.font[(glyph as usize) * 2 + col / 2];
        if col % 2 == 0 { (word >> 8) as u8 } else { word as u8 }
    }

    /// Render into an RGB24 buffer of at least `WIDTH * HEIGHT * 3`
    /// bytes, left-to-right, top-to-bottom.
    pub fn rasterize(&self, buffer: &mut [u8]) {
        let border = Self::rgb(self.palette[(self.border & 0xf) as usize]);
        for px in buffer.chunks_exact_mut(3).take(Self::WIDTH * Self::HEIGHT) {
            px.copy_from_slice(&border);
        }
        if !self.mapped {
            return;
        }

        for (i, &cell) in self.cells.iter().enumerate() {
            let glyph = cell & 0x7f;
            let blink = cell & 0x80 != 0;
            let fg = Self::rgb(self.palette[(cell >> 12) as usize]);
            let bg = Self::rgb(self.palette[((cell >> 8) & 0xf) as usize]);
            let visible = !blink || self.blink_on;

            let x0 = BORDER_PX + (i % SCR_WIDTH) * 4;
            let y0 = BORDER_PX + (i / SCR_WIDTH) * 8;
            for col in 0..4 {
                let bits = self.glyph_column(glyph, col);
                for row in 0..8 {
                    let lit = visible && bits & (0x80 >> row) != 0;
                    let offset = ((y0 + row) * Self::WIDTH + x0 + col) * 3;
                    buffer[offset..offset + 3].copy_from_slice(if lit { &fg } else { &bg });
                }
            }
        }
    }
}

/// Rendering backend seam. Implementations must not touch CPU state;
/// the frame is a complete snapshot.
pub trait Screen {
    fn redraw(&mut self, frame: &Frame);
}

/// Backend that discards frames, for headless use.
pub struct NullScreen;

impl Screen for NullScreen {
    fn redraw(&mut self, _frame: &Frame) {}
}

pub struct Lem {
    vram: u16,
    fontram: u16,
    palram: u16,
    border: u16,
    tickns: u64,
    nexttick: u64,
    blink_on: bool,
    nextblink: u64,
    screen: Box<dyn Screen>,
}

impl Lem {
    pub fn new(screen: Box<dyn Screen>) -> Self {
        Self {
            vram: 0,
            fontram: 0,
            palram: 0,
            border: 0,
            tickns: 1_000_000_000 / DISPLAY_HZ,
            nexttick: 0,
            blink_on: true,
            nextblink: 0,
            screen,
        }
    }

    /// Current video RAM base (zero while unmapped).
    pub fn vram(&self) -> u16 {
        self.vram
    }

    /// Capture a frame from CPU RAM. All base addresses wrap; zero
    /// font/palette bases select the built-in ROMs.
    pub fn frame(&self, cpu: &Dcpu) -> Frame {
        let mut cells = [0u16; CELLS];
        if self.vram != 0 {
            // Indirect per word: video RAM mapped near the top of the
            // address space wraps around to the bottom.
            for (i, cell) in cells.iter_mut().enumerate() {
                *cell = cpu.read(self.vram.wrapping_add(i as u16));
            }
        }

        let mut font = FONT_ROM;
        if self.fontram != 0 {
            for (i, word) in font.iter_mut().enumerate() {
                *word = cpu.read(self.fontram.wrapping_add(i as u16));
            }
        }

        let mut palette = PALETTE_ROM;
        if self.palram != 0 {
            for (i, word) in palette.iter_mut().enumerate() {
                *word = cpu.read(self.palram.wrapping_add(i as u16));
            }
        }

        Frame {
            cells,
            font,
            palette,
            border: self.border,
            blink_on: self.blink_on,
            mapped: self.vram != 0,
        }
    }

    pub fn hwi(&mut self, cpu: &mut Dcpu) -> u16 {
        let b = cpu.reg(Reg::B);
        match cpu.reg(Reg::A) {
            0 => self.vram = b,
            1 => self.fontram = b,
            2 => self.palram = b,
            3 => self.border = b & 0xf,
            4 => {
                for (i, &word) in FONT_ROM.iter().enumerate() {
                    cpu.write(b.wrapping_add(i as u16), word);
                }
                return FONT_ROM.len() as u16;
            }
            5 => {
                for (i, &word) in PALETTE_ROM.iter().enumerate() {
                    cpu.write(b.wrapping_add(i as u16), word);
                }
                return PALETTE_ROM.len() as u16;
            }
            other => log::warn!("unknown display HWI: 0x{other:04x}"),
        }
        0
    }

    pub fn tick(&mut self, cpu: &mut Dcpu, now_ns: u64) {
        if now_ns > self.nextblink {
            self.blink_on = !self.blink_on;
            self.nextblink = now_ns + BLINK_NS;
        }
        if now_ns > self.nexttick {
            let frame = self.frame(cpu);
            self.screen.redraw(&frame);
            self.nexttick = now_ns + self.tickns;
        }
    }
}
