//! ASCII rendering of a display frame, for `--dump-screen`.

use dcpu16_core::device::lem::{Frame, SCR_HEIGHT, SCR_WIDTH};

/// Render the frame's glyphs as plain text: one line per screen row,
/// low-7-bit glyph codes as ASCII, blanks for zero and non-printable
/// glyphs. An unmapped screen renders all blank.
pub fn render(frame: &Frame) -> String {
    let mut out = String::with_capacity((SCR_WIDTH + 1) * SCR_HEIGHT);
    for row in 0..SCR_HEIGHT {
        for col in 0..SCR_WIDTH {
            let glyph = if frame.mapped {
                (frame.cells[row * SCR_WIDTH + col] & 0x7f) as u8
            } else {
                0
            };
            out.push(if glyph.is_ascii_graphic() {
                glyph as char
            } else {
                ' '
            });
        }
        out.push('\n');
    }
    out
}
