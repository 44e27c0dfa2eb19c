//! Startup banner: CONVO-RANK in figlet's standard font, then a short run summary
//! so the operator sees which model and paths a (possibly paid) run will use.

use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

const TITLE: &str = "CONVO-RANK";

/// Art colour at the top line and at the bottom line.
const TOP: Color = Color::Rgb {
    r: 0xff,
    g: 0xb0,
    b: 0x00,
};
const BOTTOM: Color = Color::Rgb {
    r: 0x00,
    g: 0xc2,
    b: 0xa8,
};

/// What the banner reports about the run that is about to start.
#[derive(Debug, Clone, Default)]
pub struct RunInfo {
    pub model: String,
    pub input: String,
    pub output: String,
    pub cache_policy: String,
}

impl RunInfo {
    fn lines(&self) -> Vec<String> {
        vec![
            format!("v{}", env!("CARGO_PKG_VERSION")),
            format!("model   {}", self.model),
            format!("input   {}", self.input),
            format!("output  {}", self.output),
            format!("cache   {}", self.cache_policy),
        ]
    }
}

/// Colour for art line `row` of `rows`, blended from TOP to BOTTOM.
fn row_color(row: usize, rows: usize) -> Color {
    let (Color::Rgb { r: r0, g: g0, b: b0 }, Color::Rgb { r: r1, g: g1, b: b1 }) = (TOP, BOTTOM)
    else {
        return BOTTOM;
    };
    let span = rows.saturating_sub(1).max(1) as i32;
    let step = row.min(rows.saturating_sub(1)) as i32;
    let mix = |a: u8, b: u8| (i32::from(a) + (i32::from(b) - i32::from(a)) * step / span) as u8;
    Color::Rgb {
        r: mix(r0, r1),
        g: mix(g0, g1),
        b: mix(b0, b1),
    }
}

/// Banner text as (colour, line) pairs: the art, then the run summary.
fn banner_lines(info: &RunInfo) -> Vec<(Color, String)> {
    let art: Vec<String> = FIGfont::standard()
        .ok()
        .and_then(|font| font.convert(TITLE).map(|f| f.to_string()))
        .unwrap_or_else(|| TITLE.to_string())
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect();
    let rows = art.len();

    art.into_iter()
        .enumerate()
        .map(|(i, line)| (row_color(i, rows), line))
        .chain(info.lines().into_iter().map(|line| (BOTTOM, line)))
        .collect()
}

/// Writes the banner to stdout. Terminal errors are ignored.
pub fn print_welcome(info: &RunInfo) {
    let mut out = stdout();
    for (color, line) in banner_lines(info) {
        let _ = queue!(out, SetForegroundColor(color), Print(line), Print("\r\n"));
    }
    let _ = queue!(out, ResetColor);
    let _ = out.flush();
}
