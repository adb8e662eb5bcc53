use crossterm::event::{Event, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use tracing::{debug, warn};

use super::clipboard;
use super::dispatch::{Command, HINTS, command_for, describe_key};
use crate::config::UiConfig;
use crate::ingest::{SourceEvent, SourceId};
use crate::render::detail::DetailView;
use crate::render::entry_list::EntryList;
use crate::render::style::Theme;
use crate::store::{Entry, EntryStore, StoreChange};
use crate::telemetry::PerfGuard;
use crate::viewport::{ListViewport, TextViewport};

const DETAIL_TITLE: &str = " Log View ";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Tabs,
    LeftPane,
    RightPane,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Tabs => Focus::LeftPane,
            Focus::LeftPane => Focus::RightPane,
            Focus::RightPane => Focus::Tabs,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceStatus {
    Starting,
    Running,
    Exited(Option<i32>),
    Failed(String),
}

/// Everything the coordinator keeps per source.
#[derive(Debug)]
pub struct SourcePane {
    title: String,
    store: EntryStore,
    list: ListViewport,
    status: SourceStatus,
}

impl SourcePane {
    fn new(title: String) -> Self {
        Self {
            title,
            store: EntryStore::new(),
            list: ListViewport::new(),
            status: SourceStatus::Starting,
        }
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn list(&self) -> &ListViewport {
        &self.list
    }

    pub fn status(&self) -> &SourceStatus {
        &self.status
    }

    /// Title plus exit state and the number of lines that arrived before
    /// any entry could hold them.
    pub fn label(&self) -> String {
        let mut notes = Vec::new();
        match &self.status {
            SourceStatus::Starting | SourceStatus::Running => {}
            SourceStatus::Exited(Some(code)) => notes.push(format!("exited {code}")),
            SourceStatus::Exited(None) => notes.push("exited".to_string()),
            SourceStatus::Failed(_) => notes.push("failed".to_string()),
        }
        let dropped = self.store.dropped_lines();
        if dropped > 0 {
            notes.push(format!("{dropped} dropped"));
        }
        if notes.is_empty() {
            self.title.clone()
        } else {
            format!("{} ({})", self.title, notes.join(", "))
        }
    }

    /// Index of the entry the detail pane shows: the selection, or the newest
    /// entry when nothing is selected.
    fn displayed_index(&self) -> Option<usize> {
        let index = self.list.active().unwrap_or(0);
        (index < self.store.len()).then_some(index)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct StatusLine {
    text: String,
    is_error: bool,
}

/// Coordinator-owned UI state. Only the coordinator thread touches it;
/// ingestion tasks reach it through [`SourceEvent`]s.
pub struct Dashboard {
    panes: Vec<SourcePane>,
    active_tab: usize,
    focus: Focus,
    left_hidden: bool,
    detail: TextViewport,
    /// (tab, entry ordinal) currently shown in the detail pane.
    detail_key: Option<(usize, usize)>,
    status: StatusLine,
    ui: UiConfig,
    theme: Theme,
    quit: bool,
}

impl Dashboard {
    pub fn new(titles: Vec<String>, ui: UiConfig, theme: Theme) -> Self {
        Self {
            panes: titles.into_iter().map(SourcePane::new).collect(),
            active_tab: 0,
            focus: Focus::default(),
            left_hidden: false,
            detail: TextViewport::new(),
            detail_key: None,
            status: StatusLine::default(),
            ui,
            theme,
            quit: false,
        }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn active_tab(&self) -> usize {
        self.active_tab
    }

    pub fn left_hidden(&self) -> bool {
        self.left_hidden
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn pane(&self, source: SourceId) -> Option<&SourcePane> {
        self.panes.get(source.0)
    }

    pub fn detail(&self) -> &TextViewport {
        &self.detail
    }

    pub fn status_text(&self) -> (&str, bool) {
        (&self.status.text, self.status.is_error)
    }

    /// The entry currently shown in the detail pane.
    pub fn displayed_entry(&self) -> Option<&Entry> {
        let pane = self.panes.get(self.active_tab)?;
        pane.store.get(pane.displayed_index()?)
    }

    fn selected_entry(&self) -> Option<&Entry> {
        let pane = self.panes.get(self.active_tab)?;
        pane.store.get(pane.list.active()?)
    }

    /// Apply a terminal event. Returns whether a redraw is needed.
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Resize(cols, rows) => {
                debug!(target: "logdeck::ui", cols, rows, "terminal resized");
                true
            }
            _ => false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let Some(command) = command_for(&key, self.focus) else {
            return false;
        };
        self.set_status(describe_key(&key), false);
        self.apply_command(command);
        true
    }

    pub fn apply_command(&mut self, command: Command) {
        match command {
            Command::Quit => self.quit = true,
            Command::AdvanceFocus => {
                self.focus = self.focus.next();
                if self.left_hidden && self.focus == Focus::LeftPane {
                    self.focus = self.focus.next();
                }
            }
            Command::ToggleLeftPane => {
                self.left_hidden = !self.left_hidden;
                if self.left_hidden && self.focus == Focus::LeftPane {
                    self.focus = Focus::RightPane;
                }
            }
            Command::PrevTab => self.cycle_tab(self.panes.len().saturating_sub(1)),
            Command::NextTab => self.cycle_tab(1),
            Command::Navigate(motion) => match self.focus {
                Focus::RightPane => self.detail.apply(motion),
                Focus::Tabs | Focus::LeftPane => {
                    if let Some(pane) = self.panes.get_mut(self.active_tab) {
                        pane.list.apply(motion, pane.store.len());
                    }
                }
            },
            Command::Deselect => {
                if let Some(pane) = self.panes.get_mut(self.active_tab) {
                    pane.list.deselect();
                }
            }
            Command::Copy => self.copy_selected(),
        }
        self.sync_detail();
    }

    /// Fold one ingestion event into the owning pane. Returns whether the
    /// screen changed.
    pub fn apply_source_event(&mut self, event: SourceEvent) -> bool {
        let source = event.source();
        let Some(pane) = self.panes.get_mut(source.0) else {
            warn!(target: "logdeck::ui", source = source.0, "event for unknown source");
            return false;
        };
        let redraw = match event {
            SourceEvent::Line { line, .. } => match pane.store.apply(line) {
                StoreChange::Inserted => {
                    pane.list.on_insert_front();
                    source.0 == self.active_tab
                }
                StoreChange::Appended => source.0 == self.active_tab,
                // The tab label carries the dropped count.
                StoreChange::Dropped => true,
            },
            SourceEvent::Started { .. } => {
                pane.status = SourceStatus::Running;
                true
            }
            SourceEvent::Exited { code, .. } => {
                pane.status = SourceStatus::Exited(code);
                let message = match code {
                    Some(code) => format!("{} exited with status {code}", pane.title),
                    None => format!("{} exited", pane.title),
                };
                self.set_status(message, false);
                true
            }
            SourceEvent::Failed { error, .. } => {
                let message = format!("{}: {error}", pane.title);
                pane.status = SourceStatus::Failed(error);
                self.set_status(message, true);
                true
            }
        };
        self.sync_detail();
        redraw
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let _perf = PerfGuard::new("ui.render");
        self.sync_detail();

        let [tabs_area, body, status_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.render_tabs(frame, tabs_area);

        let (list_area, detail_area) = self.split_body(body);
        if let Some(list_area) = list_area {
            self.render_list(frame, list_area);
        }
        self.render_detail(frame, detail_area);

        let status_style = if self.status.is_error {
            self.theme.status_error
        } else {
            self.theme.status
        };
        frame.render_widget(
            Paragraph::new(self.status.text.as_str()).style(status_style),
            status_area,
        );
        frame.render_widget(Paragraph::new(HINTS).style(self.theme.hint), hints_area);
    }

    fn split_body(&self, body: Rect) -> (Option<Rect>, Rect) {
        if self.left_hidden {
            return (None, body);
        }
        let percent = self.ui.list_percent;
        let [list, detail] = Layout::horizontal([
            Constraint::Percentage(percent),
            Constraint::Percentage(100 - percent),
        ])
        .areas(body);
        (Some(list), detail)
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = self
            .panes
            .iter()
            .map(|pane| Line::from(pane.label()))
            .collect();
        let (style, highlight) = if self.focus == Focus::Tabs {
            (self.theme.tab_inactive, self.theme.tab_active)
        } else {
            (
                self.theme.text,
                self.theme.tab_active.remove_modifier(Modifier::all()),
            )
        };
        let tabs = Tabs::new(titles)
            .select(self.active_tab)
            .style(style)
            .highlight_style(highlight);
        frame.render_widget(tabs, area);
    }

    fn pane_block(&self, title: String, focused: bool) -> Block<'static> {
        let style = if focused {
            self.theme.border_focused
        } else {
            self.theme.border
        };
        Block::bordered()
            .title(title)
            .title_style(style)
            .border_style(style)
    }

    fn render_list(&mut self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::LeftPane;
        let Some(title) = self
            .panes
            .get(self.active_tab)
            .map(|pane| format!(" {} ", pane.label()))
        else {
            return;
        };
        let block = self.pane_block(title, focused);
        let Some(pane) = self.panes.get_mut(self.active_tab) else {
            return;
        };
        let widget = EntryList::new(&pane.store, &self.theme)
            .block(block)
            .wrap_rows(self.ui.wrap_rows);
        frame.render_stateful_widget(widget, area, &mut pane.list);
    }

    fn render_detail(&mut self, frame: &mut Frame, area: Rect) {
        let mut block = self.pane_block(DETAIL_TITLE.to_string(), self.focus == Focus::RightPane);
        if self.left_hidden {
            block = block.borders(Borders::TOP | Borders::BOTTOM);
        }
        let entry = self
            .panes
            .get(self.active_tab)
            .and_then(|pane| pane.store.get(pane.displayed_index()?));
        let widget = DetailView::new(entry, &self.theme).block(block);
        frame.render_stateful_widget(widget, area, &mut self.detail);
    }

    fn cycle_tab(&mut self, step: usize) {
        if self.panes.is_empty() {
            return;
        }
        self.active_tab = (self.active_tab + step) % self.panes.len();
    }

    fn copy_selected(&mut self) {
        let Some(entry) = self.selected_entry() else {
            self.set_status("select an entry to copy".to_string(), false);
            return;
        };
        let text = entry.plain_text();
        let lines = entry.line_count();
        match clipboard::set(&text) {
            Ok(()) => {
                debug!(target: "logdeck::ui", lines, "copied entry to clipboard");
                self.set_status(format!("copied {lines} line(s) to clipboard"), false);
            }
            Err(err) => {
                warn!(target: "logdeck::ui", error = %err, "clipboard write failed");
                self.set_status(format!("clipboard: {err}"), true);
            }
        }
    }

    fn set_status(&mut self, text: String, is_error: bool) {
        self.status = StatusLine { text, is_error };
    }

    fn sync_detail(&mut self) {
        let key = self.panes.get(self.active_tab).and_then(|pane| {
            let index = pane.displayed_index()?;
            Some((self.active_tab, pane.store.ordinal(index)?))
        });
        if key != self.detail_key {
            self.detail.reset();
            self.detail_key = key;
        }
    }
}
