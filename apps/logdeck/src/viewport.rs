/// Navigation requests shared by the entry list and the detail pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Motion {
    Up,
    Down,
    PageUp,
    PageDown,
    HalfPageUp,
    HalfPageDown,
    Top,
    Bottom,
}

/// Selection-driven window into an entry list.
///
/// `active` is `None` when nothing is selected. Whenever an entry is
/// selected it lies inside `[scroll_top, scroll_top + pane_height)` once any
/// public method returns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListViewport {
    active: Option<usize>,
    scroll_top: usize,
    pane_height: usize,
}

impl ListViewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn pane_height(&self) -> usize {
        self.pane_height
    }

    pub fn set_pane_height(&mut self, height: usize) {
        self.pane_height = height;
        self.ensure_visible(|_| 1);
    }

    pub fn apply(&mut self, motion: Motion, entry_count: usize) {
        if entry_count == 0 {
            self.deselect();
            return;
        }
        let page = self.pane_height.max(1) as isize;
        let half = (page / 2).max(1);
        let current = self.active.map_or(-1, |active| active as isize);
        let target = match motion {
            Motion::Up => current - 1,
            Motion::Down => current + 1,
            Motion::PageUp => match self.active {
                Some(active) if active > self.scroll_top => self.scroll_top as isize,
                _ => current - page,
            },
            Motion::PageDown => current + page,
            Motion::HalfPageUp => current - half,
            Motion::HalfPageDown => current + half,
            Motion::Top => 0,
            Motion::Bottom => entry_count as isize - 1,
        };
        self.active = Some(target.clamp(0, entry_count as isize - 1) as usize);
        self.ensure_visible(|_| 1);
    }

    pub fn deselect(&mut self) {
        self.active = None;
        self.scroll_top = 0;
    }

    /// A new entry was pushed at index 0. The selection follows its entry,
    /// and the window moves with it so the visible rows stay put.
    pub fn on_insert_front(&mut self) {
        if let Some(active) = self.active {
            self.active = Some(active + 1);
            self.scroll_top += 1;
        }
    }

    /// Recompute `scroll_top` for the current selection. `row_height` gives
    /// the number of screen lines entry `i` occupies when drawn.
    pub fn ensure_visible(&mut self, mut row_height: impl FnMut(usize) -> usize) {
        let Some(active) = self.active else {
            self.scroll_top = 0;
            return;
        };
        let visible = self.pane_height.max(1);
        if active >= self.scroll_top + visible {
            self.scroll_top = active + 1 - visible;
        } else if active < self.scroll_top {
            self.scroll_top = active;
        }

        let heights: Vec<usize> = (self.scroll_top..=active)
            .map(|index| row_height(index).max(1))
            .collect();
        let mut used: usize = heights.iter().sum();
        let mut skipped = 0;
        while self.scroll_top < active && used > visible {
            used -= heights[skipped];
            skipped += 1;
            self.scroll_top += 1;
        }
    }
}

/// Line-granular scroll state for free text (the detail pane).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextViewport {
    scroll_top: usize,
    line_count: usize,
    pane_height: usize,
}

impl TextViewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// One past the last visible line.
    pub fn visible_end(&self) -> usize {
        (self.scroll_top + self.pane_height).min(self.line_count)
    }

    pub fn set_content(&mut self, line_count: usize, pane_height: usize) {
        self.line_count = line_count;
        self.pane_height = pane_height;
        self.scroll_top = self.scroll_top.min(self.max_top());
    }

    pub fn reset(&mut self) {
        self.scroll_top = 0;
    }

    pub fn apply(&mut self, motion: Motion) {
        let page = self.pane_height.max(1) as isize;
        let half = (page / 2).max(1);
        match motion {
            Motion::Up => self.scroll_by(-1),
            Motion::Down => self.scroll_by(1),
            Motion::PageUp => self.scroll_by(-page),
            Motion::PageDown => self.scroll_by(page),
            Motion::HalfPageUp => self.scroll_by(-half),
            Motion::HalfPageDown => self.scroll_by(half),
            Motion::Top => self.scroll_top = 0,
            Motion::Bottom => {
                self.scroll_top = self.line_count.saturating_sub(self.pane_height.max(1));
            }
        }
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let target = self.scroll_top as isize + delta;
        self.scroll_top = target.clamp(0, self.max_top() as isize) as usize;
    }

    fn max_top(&self) -> usize {
        self.line_count.saturating_sub(1)
    }
}
