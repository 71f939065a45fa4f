//! Plain-text mine layouts.
//!
//! ```text
//! # width height
//! 9 9
//! # mines
//! 10
//! # mine coordinates, x y
//! 0 0
//! 4 7
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. The first remaining line holds the
//! size, the second the mine count, every later line one mine position.

use alloc::format;
use alloc::string::String;
use core::fmt::{self, Write};
use core::str::SplitWhitespace;
use ndarray::Array2;
use thiserror::Error;

use crate::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    /// `line` is 0-based.
    #[error("{line} - {message}")]
    Format { line: usize, message: String },
}

impl LevelError {
    fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Self::Format { line, .. } => *line,
        }
    }
}

type LevelResult<T> = core::result::Result<T, LevelError>;

struct Tokens<'a> {
    line: usize,
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(line: usize, text: &'a str) -> Self {
        Self {
            line,
            inner: text.split_whitespace(),
        }
    }

    fn integer(&mut self, name: &str) -> LevelResult<i64> {
        let token = self
            .inner
            .next()
            .ok_or_else(|| LevelError::format(self.line, format!("{name}: missing")))?;
        token.parse().map_err(|_| {
            LevelError::format(self.line, format!("{name}: not integral. Found {token}"))
        })
    }

    fn bounded(&mut self, name: &str, min: i64, max: i64) -> LevelResult<i64> {
        let value = self.integer(name)?;
        if (min..=max).contains(&value) {
            Ok(value)
        } else {
            Err(LevelError::format(
                self.line,
                format!("{name}: not in bounds [{min}, {max}]. Found {value}"),
            ))
        }
    }

    fn finish(mut self) -> LevelResult<()> {
        match self.inner.next() {
            Some(extra) => Err(LevelError::format(
                self.line,
                format!("unexpected token {extra}"),
            )),
            None => Ok(()),
        }
    }
}

/// Reads a mine layout. Fails on the first malformed line; nothing is returned for a
/// partially read level.
pub fn parse_level(input: &str) -> LevelResult<MineLayout> {
    let mut size: Option<Coord2> = None;
    let mut declared: Option<CellCount> = None;
    let mut mines: Array2<bool> = Array2::default([0, 0]);
    let mut placed: CellCount = 0;
    let mut line_count = 0;

    for (line_nr, raw) in input.lines().enumerate() {
        line_count = line_nr + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let mut tokens = Tokens::new(line_nr, text);

        let Some((width, height)) = size else {
            let width = tokens.bounded("width", MIN_WIDTH.into(), MAX_WIDTH.into())? as Coord;
            let height = tokens.bounded("height", MIN_HEIGHT.into(), MAX_HEIGHT.into())? as Coord;
            tokens.finish()?;
            size = Some((width, height));
            mines = Array2::default((width, height).to_nd_index());
            continue;
        };

        let Some(declared) = declared else {
            let max = max_mines((width, height));
            let count = tokens.bounded("mines", MIN_MINES.into(), max.into())? as CellCount;
            tokens.finish()?;
            declared = Some(count);
            continue;
        };

        let x = tokens.bounded("x", 0, i64::from(width) - 1)? as Coord;
        let y = tokens.bounded("y", 0, i64::from(height) - 1)? as Coord;
        tokens.finish()?;

        let slot = &mut mines[(x, y).to_nd_index()];
        if *slot {
            return Err(LevelError::format(
                line_nr,
                format!("mine at {x} {y} listed twice"),
            ));
        }
        if placed == declared {
            return Err(LevelError::format(
                line_nr,
                format!("more than the declared {declared} mines"),
            ));
        }
        *slot = true;
        placed += 1;
    }

    if size.is_none() {
        return Err(LevelError::format(line_count, "missing width and height"));
    }
    let Some(declared) = declared else {
        return Err(LevelError::format(line_count, "missing mine count"));
    };
    if placed != declared {
        return Err(LevelError::format(
            line_count,
            format!("expected {declared} mines, found {placed}"),
        ));
    }

    log::debug!("Parsed level with {} mines", placed);
    Ok(MineLayout::from_mine_mask_unchecked(mines))
}

/// Writes a layout in the format [`parse_level`] reads, one mine per line in row-major
/// order.
pub fn write_level<W: Write>(out: &mut W, layout: &MineLayout) -> fmt::Result {
    let (width, height) = layout.size();
    writeln!(out, "# width height")?;
    writeln!(out, "{width} {height}")?;
    writeln!(out, "# mines")?;
    writeln!(out, "{}", layout.mine_count())?;
    writeln!(out, "# mine coordinates, x y")?;
    for (x, y) in layout.iter_mines() {
        writeln!(out, "{x} {y}")?;
    }
    Ok(())
}

/// Formats as level text, see [`write_level`].
impl fmt::Display for MineLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_level(f, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# sample level
9 9

# mines
10
0 0
1 0
2 0
3 0
4 0
# second row
0 8
1 8
2 8
3 8
8 8
";

    fn error_line(input: &str) -> usize {
        parse_level(input).unwrap_err().line()
    }

    #[test]
    fn parses_sample() {
        let layout = parse_level(SAMPLE).unwrap();
        assert_eq!(layout.size(), (9, 9));
        assert_eq!(layout.mine_count(), 10);
        assert!(layout.contains_mine((4, 0)));
        assert!(layout.contains_mine((8, 8)));
        assert!(!layout.contains_mine((4, 8)));
    }

    #[test]
    fn round_trips_generated_layout() {
        let layout = RandomLayoutGenerator::new(3).generate(BoardConfig::new((30, 16), 99));
        let text = layout.to_string();
        assert_eq!(parse_level(&text).unwrap(), layout);
    }

    #[test]
    fn writes_one_mine_per_line() {
        let layout = parse_level(SAMPLE).unwrap();
        let text = layout.to_string();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[1], "9 9");
        assert_eq!(lines[3], "10");
        assert_eq!(lines[5], "0 0");
        assert_eq!(lines[10], "0 8");
        assert_eq!(lines.len(), 15);
    }

    #[test]
    fn rejects_bad_width() {
        let err = parse_level("# c\n8 9\n10\n").unwrap_err();
        assert_eq!(err.line(), 1);
        assert_eq!(
            err.to_string(),
            "1 - width: not in bounds [9, 30]. Found 8"
        );
        assert_eq!(error_line("31 9\n10\n"), 0);
    }

    #[test]
    fn rejects_bad_height() {
        assert_eq!(error_line("9 25\n10\n"), 0);
        assert_eq!(error_line("9\n10\n"), 0);
        let err = parse_level("9 x\n").unwrap_err();
        assert_eq!(err.to_string(), "0 - height: not integral. Found x");
    }

    #[test]
    fn rejects_bad_mine_count() {
        assert_eq!(error_line("9 9\n9\n"), 1);
        assert_eq!(error_line("9 9\n65\n"), 1);
        assert_eq!(error_line("9 9\nten\n"), 1);
        assert_eq!(error_line("9 9\n10 2\n"), 1);
    }

    #[test]
    fn rejects_bad_mine_lines() {
        assert_eq!(error_line("9 9\n10\n0 0\n\n9 0\n"), 4);
        assert_eq!(error_line("9 9\n10\n0 a\n"), 2);
        assert_eq!(error_line("9 9\n10\n0 -1\n"), 2);
        assert_eq!(error_line("9 9\n10\n0 0\n0 0\n"), 3);
    }

    #[test]
    fn rejects_wrong_number_of_mines() {
        let err = parse_level("9 9\n10\n0 0\n").unwrap_err();
        assert_eq!(err.line(), 3);
        assert_eq!(err.to_string(), "3 - expected 10 mines, found 1");

        let mut eleven = String::from("9 9\n10\n");
        for x in 0..9 {
            eleven.push_str(&format!("{x} 0\n"));
        }
        eleven.push_str("0 1\n1 1\n");
        assert_eq!(error_line(&eleven), 12);
    }

    #[test]
    fn rejects_missing_header() {
        assert_eq!(error_line(""), 0);
        assert_eq!(error_line("# only comments\n"), 1);
        assert_eq!(error_line("9 9\n"), 1);
    }
}
