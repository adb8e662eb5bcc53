use ratatui::style::{Color, Modifier, Style};

const ESC: char = '\u{1b}';

/// Upper bound on the bytes scanned after `ESC [` while looking for the final
/// byte. Anything longer is treated as literal text.
const MAX_ESCAPE_LOOKAHEAD: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StyledCell {
    pub ch: char,
    pub style: Style,
}

impl StyledCell {
    pub fn new(ch: char, style: Style) -> Self {
        Self { ch, style }
    }

    /// A cell inserted by layout (line breaks, wrap markers) rather than
    /// taken from the source text.
    pub fn clear(ch: char) -> Self {
        Self {
            ch,
            style: Style::default(),
        }
    }
}

/// Colours and modifiers used by every widget. Built once at startup and
/// handed to the widgets that need it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Theme {
    pub text: Style,
    pub active_row: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub border: Style,
    pub border_focused: Style,
    pub scrollbar: Style,
    pub status: Style,
    pub status_error: Style,
    pub hint: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text: Style::default(),
            active_row: Style::default().fg(Color::Black).bg(Color::Gray),
            tab_active: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            tab_inactive: Style::default().add_modifier(Modifier::BOLD),
            border: Style::default(),
            border_focused: Style::default().add_modifier(Modifier::BOLD),
            scrollbar: Style::default().fg(Color::White),
            status: Style::default().fg(Color::Gray),
            status_error: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            hint: Style::default().fg(Color::DarkGray),
        }
    }
}

impl Theme {
    /// Re-style a cell of the active row. Attributes the log line set
    /// explicitly survive; anything still at the pane default takes the
    /// active-row value.
    pub fn active_cell_style(&self, style: Style) -> Style {
        let mut merged = style;
        if style.fg == self.text.fg {
            merged.fg = self.active_row.fg;
        }
        if style.bg == self.text.bg {
            merged.bg = self.active_row.bg;
        }
        if style.add_modifier == self.text.add_modifier {
            merged.add_modifier = self.active_row.add_modifier;
        }
        merged
    }
}

struct ControlSequence<'a> {
    params: &'a [char],
    final_byte: char,
    len: usize,
}

/// Recognise `ESC [ <params> <final>` at the start of `chars`. Returns `None`
/// when the sequence is malformed or unterminated within the lookahead.
fn scan_control_sequence(chars: &[char]) -> Option<ControlSequence<'_>> {
    if chars.first() != Some(&ESC) || chars.get(1) != Some(&'[') {
        return None;
    }
    let body = &chars[2..];
    for (offset, ch) in body.iter().enumerate().take(MAX_ESCAPE_LOOKAHEAD) {
        match *ch {
            '0'..='?' => continue,
            '@'..='~' => {
                return Some(ControlSequence {
                    params: &body[..offset],
                    final_byte: *ch,
                    len: offset + 3,
                });
            }
            _ => return None,
        }
    }
    None
}

fn ansi_color(index: u16) -> Color {
    match index {
        0 => Color::Black,
        1 => Color::Red,
        2 => Color::Green,
        3 => Color::Yellow,
        4 => Color::Blue,
        5 => Color::Magenta,
        6 => Color::Cyan,
        _ => Color::Gray,
    }
}

fn apply_sgr(mut style: Style, default: Style, params: &[char]) -> Style {
    let params: String = params.iter().collect();
    let mut codes = params.split(';').map(|raw| {
        if raw.is_empty() {
            Some(0)
        } else {
            raw.parse::<u16>().ok()
        }
    });
    while let Some(code) = codes.next() {
        let Some(code) = code else {
            continue;
        };
        style = match code {
            0 => default,
            1 => style.add_modifier(Modifier::BOLD),
            4 => style.add_modifier(Modifier::UNDERLINED),
            30..=37 => style.fg(ansi_color(code - 30)),
            39 => Style {
                fg: default.fg,
                ..style
            },
            40..=47 => style.bg(ansi_color(code - 40)),
            49 => Style {
                bg: default.bg,
                ..style
            },
            // Extended colours are not rendered; their arguments are not codes.
            38 | 48 => {
                let skip = match codes.next().flatten() {
                    Some(5) => 1,
                    Some(2) => 3,
                    _ => 0,
                };
                codes.by_ref().take(skip).for_each(drop);
                style
            }
            _ => style,
        };
    }
    style
}

/// Convert text with embedded SGR sequences into styled cells. Style changes
/// persist until the next change; `default` is both the starting style and
/// the target of reset codes.
pub fn parse_styles(text: &str, default: Style) -> Vec<StyledCell> {
    let chars: Vec<char> = text.chars().collect();
    let mut cells = Vec::with_capacity(chars.len());
    let mut style = default;
    let mut idx = 0;
    while idx < chars.len() {
        if let Some(seq) = scan_control_sequence(&chars[idx..]) {
            if seq.final_byte == 'm' {
                style = apply_sgr(style, default, seq.params);
            }
            idx += seq.len;
            continue;
        }
        cells.push(StyledCell::new(chars[idx], style));
        idx += 1;
    }
    cells
}

/// Remove every well-formed control sequence, leaving plain text.
pub fn strip_codes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut plain = String::with_capacity(text.len());
    let mut idx = 0;
    while idx < chars.len() {
        if let Some(seq) = scan_control_sequence(&chars[idx..]) {
            idx += seq.len;
            continue;
        }
        plain.push(chars[idx]);
        idx += 1;
    }
    plain
}

pub fn cells_to_string(cells: &[StyledCell]) -> String {
    cells.iter().map(|cell| cell.ch).collect()
}
