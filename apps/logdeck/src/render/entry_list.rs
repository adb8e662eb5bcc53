use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::{Block, StatefulWidget, Widget};

use super::scrollbar::{draw_scrollbar, scrollbar_geometry};
use super::style::{StyledCell, Theme, parse_styles};
use super::wrap::{truncate_cells, wrap_cells};
use super::{draw_row, fill_row};
use crate::store::EntryStore;
use crate::viewport::ListViewport;

/// Left pane: one row per entry, newest at the top, showing each entry's
/// first line.
pub struct EntryList<'a> {
    store: &'a EntryStore,
    theme: &'a Theme,
    block: Option<Block<'a>>,
    wrap_rows: bool,
}

impl<'a> EntryList<'a> {
    pub fn new(store: &'a EntryStore, theme: &'a Theme) -> Self {
        Self {
            store,
            theme,
            block: None,
            wrap_rows: true,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn wrap_rows(mut self, wrap_rows: bool) -> Self {
        self.wrap_rows = wrap_rows;
        self
    }

    fn row_lines(&self, index: usize, width: usize) -> Vec<Vec<StyledCell>> {
        let Some(entry) = self.store.get(index) else {
            return Vec::new();
        };
        let cells = parse_styles(entry.header(), self.theme.text);
        if self.wrap_rows {
            wrap_cells(&cells, width)
                .lines()
                .map(|line| line.to_vec())
                .collect()
        } else {
            vec![truncate_cells(&cells, width)]
        }
    }
}

impl StatefulWidget for EntryList<'_> {
    type State = ListViewport;

    fn render(mut self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let inner = match self.block.take() {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        // last column belongs to the scrollbar
        let text_right = inner.right().saturating_sub(1).max(inner.x + 1);
        let text_width = usize::from(text_right - inner.x);

        state.set_pane_height(usize::from(inner.height));
        if self.wrap_rows {
            state.ensure_visible(|index| self.row_lines(index, text_width).len());
        }

        let total = self.store.len();
        let bottom = inner.bottom();
        let mut y = inner.y;
        let mut index = state.scroll_top();
        while y < bottom && index < total {
            let active = state.active() == Some(index);
            for line in self.row_lines(index, text_width) {
                if y >= bottom {
                    break;
                }
                if active {
                    fill_row(buf, inner.x, y, text_right, self.theme.active_row);
                    draw_row(buf, inner.x, y, text_right, &line, |style| {
                        self.theme.active_cell_style(style)
                    });
                } else {
                    draw_row(buf, inner.x, y, text_right, &line, |style| style);
                }
                y += 1;
            }
            index += 1;
        }

        let geometry = scrollbar_geometry(usize::from(inner.height), state.scroll_top(), index, total);
        draw_scrollbar(buf, inner, geometry, self.theme.scrollbar);
    }
}
