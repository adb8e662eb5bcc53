use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;

const UP_ARROW: char = '▲';
const DOWN_ARROW: char = '▼';
const THUMB: char = '┃';

/// Rows reserved at the ends of the track for the arrows and the thumb
/// itself.
const TRACK_RESERVED: usize = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollbarGeometry {
    pub up: bool,
    pub down: bool,
    /// Row offset of the thumb from the top of the track.
    pub thumb: Option<usize>,
}

/// `first` is the index of the first visible item, `last` is one past the
/// last visible item, `total` is the number of items.
pub fn scrollbar_geometry(height: usize, first: usize, last: usize, total: usize) -> ScrollbarGeometry {
    let up = first > 0;
    let down = last < total;
    if (!up && !down) || height < TRACK_RESERVED {
        return ScrollbarGeometry {
            up,
            down,
            thumb: None,
        };
    }
    let available = height - TRACK_RESERVED;
    let window = last.saturating_sub(first);
    let span = total.saturating_sub(window).max(1);
    let position = (available * first / span).min(available);
    ScrollbarGeometry {
        up,
        down,
        thumb: Some(position + 1),
    }
}

/// Draw the indicators for `geometry` in the right-most column of `area`.
pub fn draw_scrollbar(buf: &mut Buffer, area: Rect, geometry: ScrollbarGeometry, style: Style) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let x = area.right() - 1;
    let mut put = |row: u16, symbol: char| {
        if row < area.height {
            if let Some(cell) = buf.cell_mut((x, area.y + row)) {
                cell.set_char(symbol).set_style(style);
            }
        }
    };
    if let Some(thumb) = geometry.thumb {
        put(thumb as u16, THUMB);
    }
    if geometry.up {
        put(0, UP_ARROW);
    }
    if geometry.down {
        put(area.height - 1, DOWN_ARROW);
    }
}
