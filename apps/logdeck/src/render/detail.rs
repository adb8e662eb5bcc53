use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::{Block, StatefulWidget, Widget};

use super::draw_row;
use super::scrollbar::{draw_scrollbar, scrollbar_geometry};
use super::style::{Theme, parse_styles};
use super::wrap::wrap_cells;
use crate::store::Entry;
use crate::viewport::TextViewport;

/// Right pane: the full text of one entry, wrapped to the pane width.
pub struct DetailView<'a> {
    entry: Option<&'a Entry>,
    theme: &'a Theme,
    block: Option<Block<'a>>,
}

impl<'a> DetailView<'a> {
    pub fn new(entry: Option<&'a Entry>, theme: &'a Theme) -> Self {
        Self {
            entry,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl StatefulWidget for DetailView<'_> {
    type State = TextViewport;

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
        let Some(entry) = self.entry else {
            state.set_content(0, usize::from(inner.height));
            return;
        };

        let text_right = inner.right().saturating_sub(1).max(inner.x + 1);
        let text_width = usize::from(text_right - inner.x);
        let cells = parse_styles(entry.text(), self.theme.text);
        let wrapped = wrap_cells(&cells, text_width);
        state.set_content(wrapped.line_count, usize::from(inner.height));

        let rows = wrapped
            .lines()
            .skip(state.scroll_top())
            .take(usize::from(inner.height));
        for (y, line) in (inner.y..).zip(rows) {
            draw_row(buf, inner.x, y, text_right, line, |style| style);
        }

        let geometry = scrollbar_geometry(
            usize::from(inner.height),
            state.scroll_top(),
            state.visible_end(),
            wrapped.line_count,
        );
        draw_scrollbar(buf, inner, geometry, self.theme.scrollbar);
    }
}
