use std::borrow::Cow;

use clap::ValueEnum;
use textwrap::core::display_width;
use textwrap::{Options, WrapAlgorithm};

use crate::format::{Region, single_line};
use crate::search::ComparisonResult;

const COLUMN_GAP: &str = " │ ";
const MIN_COLUMN_WIDTH: usize = 20;
/// Narrowest total width at which three columns fit without overflowing.
pub const MIN_TOTAL_WIDTH: usize = 3 * MIN_COLUMN_WIDTH + 2 * 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// All three regions side by side.
    #[default]
    Columns,
    /// One region after another, each under its own tab header.
    Tabs,
}

struct Panel {
    tab: &'static str,
    title: &'static str,
    region: Region,
}

fn panels(result: &ComparisonResult) -> [Panel; 3] {
    [
        Panel {
            tab: "Conversational Search",
            title: "RAG Output",
            region: Region::from_generation(&result.generation),
        },
        Panel {
            tab: "ESRE Search",
            title: "ESRE Search",
            region: Region::from_hits(&result.semantic),
        },
        Panel {
            tab: "Keyword Search",
            title: "Keyword Search",
            region: Region::from_hits(&result.keyword),
        },
    ]
}

pub fn render(result: &ComparisonResult, layout: Layout, width: usize) -> String {
    let panels = panels(result);
    let mut out = format!("# Search: {}\n\n", single_line(result.query.as_str()));
    match layout {
        Layout::Columns => render_columns(&panels, width, &mut out),
        Layout::Tabs => render_tabs(&panels, &mut out),
    }
    out
}

fn render_tabs(panels: &[Panel], out: &mut String) {
    for (i, panel) in panels.iter().enumerate() {
        out.push_str(&format!("── [{}] {} ──\n\n", i + 1, panel.tab));
        out.push_str(&format!("## {}\n\n", panel.title));
        for paragraph in panel.region.paragraphs() {
            for line in paragraph {
                out.push_str(&line);
                out.push('\n');
            }
            out.push('\n');
        }
    }
}

fn render_columns(panels: &[Panel], width: usize, out: &mut String) {
    let gaps = display_width(COLUMN_GAP) * (panels.len() - 1);
    let col_width = (width.saturating_sub(gaps) / panels.len()).max(MIN_COLUMN_WIDTH);

    let columns: Vec<Vec<String>> = panels
        .iter()
        .map(|panel| {
            let mut lines = wrap(panel.title, col_width);
            lines.push("─".repeat(col_width));
            for (i, paragraph) in panel.region.paragraphs().iter().enumerate() {
                if i > 0 {
                    lines.push(String::new());
                }
                for line in paragraph {
                    lines.extend(wrap(line, col_width));
                }
            }
            lines
        })
        .collect();

    let height = columns.iter().map(Vec::len).max().unwrap_or(0);
    for row in 0..height {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| pad(col.get(row).map_or("", String::as_str), col_width))
            .collect();
        out.push_str(cells.join(COLUMN_GAP).trim_end());
        out.push('\n');
    }
}

/// Greedy wrap by display width; words wider than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let options = Options::new(width)
        .break_words(true)
        .wrap_algorithm(WrapAlgorithm::FirstFit);
    textwrap::wrap(text, options)
        .into_iter()
        .map(Cow::into_owned)
        .collect()
}

fn pad(s: &str, width: usize) -> String {
    let mut padded = s.to_string();
    padded.extend(std::iter::repeat_n(' ', width.saturating_sub(display_width(s))));
    padded
}
