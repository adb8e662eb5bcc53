pub mod detail;
pub mod entry_list;
pub mod scrollbar;
pub mod style;
pub mod wrap;

use ratatui::buffer::Buffer;
use ratatui::style::Style;
use unicode_width::UnicodeWidthChar;

use style::StyledCell;

/// Display width of a character. Control characters are drawn as a single
/// replacement glyph, so they count as one column.
pub fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(1)
}

fn display_char(ch: char) -> char {
    match ch {
        '\t' => ' ',
        ch if ch.is_control() => '\u{fffd}',
        ch => ch,
    }
}

/// Draw one visual row of cells starting at `(x, y)`, never past `right`.
/// `restyle` gets a chance to adjust each cell's style (active-row
/// highlighting).
pub(crate) fn draw_row(
    buf: &mut Buffer,
    x: u16,
    y: u16,
    right: u16,
    cells: &[StyledCell],
    mut restyle: impl FnMut(Style) -> Style,
) {
    let mut col = x;
    for cell in cells {
        let width = char_width(cell.ch) as u16;
        if width == 0 {
            continue;
        }
        if col.saturating_add(width) > right {
            break;
        }
        if let Some(target) = buf.cell_mut((col, y)) {
            target
                .set_char(display_char(cell.ch))
                .set_style(restyle(cell.style));
        }
        col += width;
    }
}

/// Paint the background of a row, used for the active-row highlight.
pub(crate) fn fill_row(buf: &mut Buffer, x: u16, y: u16, right: u16, style: Style) {
    for col in x..right {
        if let Some(target) = buf.cell_mut((col, y)) {
            target.set_char(' ').set_style(style);
        }
    }
}
