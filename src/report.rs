/// Per-line boundary and width reports printed by the `mbcursor` binary.

use crate::config::ReportFormat;
use crate::core::{c_strlen, DecodeState, Decoded, MbContext};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineReport {
    pub line: usize,
    pub bytes: usize,
    pub chars: usize,
    pub columns: usize,
    /// Start offset of every character, followed by the line length.
    pub boundaries: Vec<usize>,
    /// Display columns of every character, in boundary order.
    pub widths: Vec<u8>,
    /// Offsets of bytes that did not decode.
    pub invalid: Vec<usize>,
}

impl LineReport {
    pub fn build(ctx: &mut MbContext, line: usize, buf: &[u8]) -> Self {
        let length = c_strlen(buf);
        let boundaries = ctx.boundaries(buf);
        let starts = &boundaries[..boundaries.len() - 1];
        let mut widths = Vec::with_capacity(starts.len());
        let mut invalid = Vec::new();
        let mut state = DecodeState::new();
        for &pos in starts {
            match ctx.backend().decode(&buf[pos..length], &mut state) {
                Decoded::Char { codepoint, .. } => widths.push(ctx.width_or_default(codepoint)),
                _ => {
                    state.reset();
                    invalid.push(pos);
                    widths.push(1);
                }
            }
        }
        let columns = widths.iter().map(|&w| w as usize).sum();
        Self { line, bytes: length, chars: widths.len(), columns, boundaries, widths, invalid }
    }

    fn write_text(&self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{}: {} bytes, {} chars, {} columns", self.line, self.bytes, self.chars, self.columns)?;
        if !self.invalid.is_empty() {
            write!(out, ", {} invalid", self.invalid.len())?;
        }
        writeln!(out)?;
        let starts: Vec<String> = self.boundaries.iter().map(|b| b.to_string()).collect();
        writeln!(out, "  boundaries: {}", starts.join(" "))?;
        let widths: Vec<String> = self.widths.iter().map(|w| w.to_string()).collect();
        writeln!(out, "  widths:     {}", widths.join(" "))
    }

    pub fn write(&self, out: &mut impl Write, format: ReportFormat) -> io::Result<()> {
        match format {
            ReportFormat::Text => self.write_text(out),
            ReportFormat::Json => {
                serde_json::to_writer(&mut *out, self).map_err(io::Error::from)?;
                writeln!(out)
            }
        }
    }
}
