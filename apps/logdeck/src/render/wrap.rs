use super::char_width;
use super::style::StyledCell;

/// Drawn at the end of a row when a token had to be split mid-word.
pub const WRAP_MARKER: char = '↵';

pub const ELLIPSIS: char = '…';

/// Columns held back from a forced break, and the minimum number of
/// characters that must follow the break point for the split to be worth it.
const FORCE_WRAP_GUARD: usize = 3;

/// Narrower targets are clamped up to this width.
pub const MIN_WRAP_WIDTH: usize = FORCE_WRAP_GUARD + 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wrapped {
    pub cells: Vec<StyledCell>,
    pub line_count: usize,
}

impl Wrapped {
    pub fn lines(&self) -> impl Iterator<Item = &[StyledCell]> {
        split_lines(&self.cells)
    }
}

pub fn split_lines(cells: &[StyledCell]) -> impl Iterator<Item = &[StyledCell]> {
    cells.split(|cell| cell.ch == '\n')
}

pub fn span_width(cells: &[StyledCell]) -> usize {
    cells.iter().map(|cell| char_width(cell.ch)).sum()
}

/// Reflow `cells` so that no visual line is wider than `width` columns.
///
/// Breaks fall between words where possible. A token that still does not fit
/// is split mid-word, leaving a [`WRAP_MARKER`] at the end of each broken
/// row. Existing line breaks are kept. Cells inserted by wrapping carry the
/// default style.
pub fn wrap_cells(cells: &[StyledCell], width: usize) -> Wrapped {
    let width = width.max(MIN_WRAP_WIDTH);
    let mut out: Vec<StyledCell> = Vec::with_capacity(cells.len() + cells.len() / width + 1);

    for chunk in cells.split_inclusive(|cell| cell.ch == '\n') {
        let (line, newline) = match chunk.split_last() {
            Some((last, rest)) if last.ch == '\n' => (rest, Some(*last)),
            _ => (chunk, None),
        };
        let rows = force_wrap(word_wrap(line, width), width);
        for (idx, row) in rows.into_iter().enumerate() {
            if idx > 0 {
                out.push(StyledCell::clear('\n'));
            }
            out.extend(row);
        }
        if let Some(newline) = newline {
            out.push(newline);
        }
    }

    let line_count = out.iter().filter(|cell| cell.ch == '\n').count() + 1;
    Wrapped {
        cells: out,
        line_count,
    }
}

/// Fit a single row into `width` columns, replacing the overflow with an
/// ellipsis in the last column.
pub fn truncate_cells(cells: &[StyledCell], width: usize) -> Vec<StyledCell> {
    if span_width(cells) <= width {
        return cells.to_vec();
    }
    if width == 0 {
        return Vec::new();
    }
    let keep = prefix_len(cells, width - 1);
    let mut row = cells[..keep].to_vec();
    let style = row.last().map(|cell| cell.style).unwrap_or_default();
    row.push(StyledCell::new(ELLIPSIS, style));
    row
}

fn is_blank(token: &[StyledCell]) -> bool {
    token.first().is_some_and(|cell| cell.ch.is_whitespace())
}

/// Maximal runs of whitespace / non-whitespace cells.
fn tokens(line: &[StyledCell]) -> Vec<&[StyledCell]> {
    let mut out = Vec::new();
    let mut start = 0;
    for idx in 1..=line.len() {
        if idx == line.len() || line[idx].ch.is_whitespace() != line[start].ch.is_whitespace() {
            out.push(&line[start..idx]);
            start = idx;
        }
    }
    out
}

fn word_wrap(line: &[StyledCell], width: usize) -> Vec<Vec<StyledCell>> {
    let mut rows = Vec::new();
    let mut row: Vec<StyledCell> = Vec::new();
    let mut col = 0;
    let mut pending: &[StyledCell] = &[];
    let mut placed_word = false;

    for token in tokens(line) {
        let token_width = span_width(token);
        if is_blank(token) {
            if placed_word {
                pending = token;
            } else {
                // indentation
                row.extend_from_slice(token);
                col += token_width;
            }
            continue;
        }

        let gap = span_width(pending);
        if col > 0 && col + gap + token_width > width {
            rows.push(std::mem::take(&mut row));
            col = 0;
        } else {
            row.extend_from_slice(pending);
            col += gap;
        }
        row.extend_from_slice(token);
        col += token_width;
        pending = &[];
        placed_word = true;
    }

    for cell in pending {
        let cell_width = char_width(cell.ch);
        if col + cell_width > width {
            break;
        }
        row.push(*cell);
        col += cell_width;
    }
    rows.push(row);
    rows
}

fn force_wrap(rows: Vec<Vec<StyledCell>>, width: usize) -> Vec<Vec<StyledCell>> {
    let budget = width - FORCE_WRAP_GUARD;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut rest: &[StyledCell] = &row;
        while span_width(rest) > width {
            let split = prefix_len(rest, budget);
            if rest.len() - split >= FORCE_WRAP_GUARD {
                let mut head = rest[..split].to_vec();
                head.push(StyledCell::clear(WRAP_MARKER));
                out.push(head);
            } else {
                let split = prefix_len(rest, width);
                out.push(rest[..split].to_vec());
                rest = &rest[split..];
                continue;
            }
            rest = &rest[split..];
        }
        out.push(rest.to_vec());
    }
    out
}

/// Number of leading cells that fit in `budget` columns; always at least one
/// when `cells` is non-empty.
fn prefix_len(cells: &[StyledCell], budget: usize) -> usize {
    let mut col = 0;
    for (idx, cell) in cells.iter().enumerate() {
        let cell_width = char_width(cell.ch);
        if col + cell_width > budget && idx > 0 {
            return idx;
        }
        col += cell_width;
    }
    cells.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::style::{cells_to_string, parse_styles};
    use ratatui::style::{Color, Style};

    fn plain(text: &str) -> Vec<StyledCell> {
        parse_styles(text, Style::default())
    }

    fn wrapped_text(text: &str, width: usize) -> String {
        cells_to_string(&wrap_cells(&plain(text), width).cells)
    }

    const SAMPLES: &[&str] = &[
        "the quick brown fox jumps over the lazy dog",
        "  indented continuation line that keeps going and going",
        "Exception in thread main java.lang.IllegalStateException: boom",
        "averyveryveryveryveryverylongtokenwithoutanyspacesatall and tail",
        "trailing spaces      ",
        "wide 日本語のテキストを折り返す test",
        "multi\nline\n\nblock with  double  gaps",
        "",
        "                                                  ",
    ];

    #[test_timeout::timeout]
    fn breaks_between_words() {
        assert_eq!(
            wrapped_text("the quick brown fox", 10),
            "the quick\nbrown fox"
        );
        assert_eq!(wrap_cells(&plain("the quick brown fox"), 10).line_count, 2);
    }

    #[test_timeout::timeout]
    fn long_tokens_are_split_with_marker() {
        let text = wrapped_text("abcdefghijklmnopqrstuvwxyz", 10);
        assert_eq!(text, "abcdefg↵\nhijklmn↵\nopqrstu↵\nvwxyz");
    }

    #[test_timeout::timeout]
    fn no_split_near_the_end_of_a_token() {
        assert_eq!(wrapped_text("abcdefghij", 10), "abcdefghij");
        assert_eq!(wrapped_text("abcdefghijk", 10), "abcdefg↵\nhijk");
    }

    #[test_timeout::timeout]
    fn empty_input_is_one_line() {
        let wrapped = wrap_cells(&[], 20);
        assert!(wrapped.cells.is_empty());
        assert_eq!(wrapped.line_count, 1);
    }

    #[test_timeout::timeout]
    fn indentation_survives() {
        assert_eq!(
            wrapped_text("  continuation of entry", 14),
            "  continuation\nof entry"
        );
    }

    #[test_timeout::timeout]
    fn no_line_exceeds_width() {
        for text in SAMPLES {
            for width in MIN_WRAP_WIDTH..40 {
                let wrapped = wrap_cells(&plain(text), width);
                for line in wrapped.lines() {
                    assert!(
                        span_width(line) <= width,
                        "{text:?} at {width}: {:?}",
                        cells_to_string(line)
                    );
                }
                assert_eq!(wrapped.lines().count(), wrapped.line_count);
            }
        }
    }

    #[test_timeout::timeout]
    fn wrapping_is_idempotent() {
        for text in SAMPLES {
            for width in MIN_WRAP_WIDTH..40 {
                let once = wrap_cells(&plain(text), width);
                let twice = wrap_cells(&once.cells, width);
                assert_eq!(once, twice, "{text:?} at {width}");
            }
        }
    }

    #[test_timeout::timeout]
    fn styles_follow_their_characters() {
        let red = Style::default().fg(Color::Red);
        let cells = parse_styles("plain \x1b[31mred\x1b[0m words", Style::default());
        let wrapped = wrap_cells(&cells, 9);
        let text = cells_to_string(&wrapped.cells);
        assert_eq!(text, "plain red\nwords");
        for (idx, cell) in wrapped.cells.iter().enumerate() {
            let expected = if (6..9).contains(&idx) { red } else { Style::default() };
            assert_eq!(cell.style, expected, "cell {idx} {:?}", cell.ch);
        }
    }

    #[test_timeout::timeout]
    fn tiny_widths_are_clamped() {
        let wrapped = wrap_cells(&plain("abcdefgh"), 1);
        for line in wrapped.lines() {
            assert!(span_width(line) <= MIN_WRAP_WIDTH);
        }
    }

    #[test_timeout::timeout]
    fn truncation_adds_ellipsis() {
        let row = truncate_cells(&plain("0123456789"), 5);
        assert_eq!(cells_to_string(&row), "0123…");
        let row = truncate_cells(&plain("0123"), 5);
        assert_eq!(cells_to_string(&row), "0123");
    }
}
