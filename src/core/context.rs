/// The navigation context an editor owns: one encoding backend, one width
/// cache and a fallback decode state. Independent contexts share nothing.

use crate::config::Config;
use crate::core::backend::{EncodingBackend, Utf8Codec};
use crate::core::compare;
use crate::core::scan::{self, ScanFlags};
use crate::core::surface::{SurfaceProbe, TerminalSurface};
use crate::core::utf8::{DecodeState, Decoded, EncodeError, MAX_CHAR_LEN};
use crate::core::width::{ProbeKind, UnicodeTableProbe, WidthCache, WidthProbe};
use crate::shell;

pub struct MbContext {
    backend: Box<dyn EncodingBackend>,
    widths: WidthCache,
    state: DecodeState,
}

impl MbContext {
    pub fn new(backend: Box<dyn EncodingBackend>, widths: WidthCache) -> Self {
        Self { backend, widths, state: DecodeState::new() }
    }

    /// Bundled UTF-8 with table widths.
    pub fn utf8() -> Self {
        Self::new(Box::new(Utf8Codec), WidthCache::new(Box::new(UnicodeTableProbe)))
    }

    /// Build from configuration. A terminal probe that cannot be opened
    /// falls back to table widths.
    pub fn from_config(config: &Config) -> Self {
        let backend = config.encoding.backend.build();
        let probe: Box<dyn WidthProbe> = match config.width.probe {
            ProbeKind::Table => Box::new(UnicodeTableProbe),
            ProbeKind::Terminal => {
                match TerminalSurface::open(shell::terminal_columns(), config.width.probe_timeout_ms) {
                    Ok(surface) => Box::new(SurfaceProbe::new(surface)),
                    Err(e) => {
                        log::warn!("terminal width probe unavailable, using tables: {}", e);
                        Box::new(UnicodeTableProbe)
                    }
                }
            }
        };
        let mut widths = WidthCache::with_capacity(probe, config.width.initial_capacity);
        widths.set_unknown_width(config.width.unknown_width);
        log::debug!("context: backend={} probe={}", backend.name(), widths.probe_name());
        Self::new(backend, widths)
    }

    pub fn backend(&self) -> &dyn EncodingBackend {
        self.backend.as_ref()
    }

    pub fn widths(&self) -> &WidthCache {
        &self.widths
    }

    pub fn widths_mut(&mut self) -> &mut WidthCache {
        &mut self.widths
    }

    /// Decode state used when the caller does not track one.
    pub fn fallback_state(&mut self) -> &mut DecodeState {
        &mut self.state
    }

    /// Decode one character using the fallback state.
    pub fn decode(&mut self, bytes: &[u8]) -> Decoded {
        self.backend.decode(bytes, &mut self.state)
    }

    pub fn encode(&self, codepoint: u32, out: &mut [u8; MAX_CHAR_LEN]) -> Result<usize, EncodeError> {
        self.backend.encode(codepoint, out)
    }

    /// Move forward `count` characters from `seed`.
    pub fn find_next(&mut self, buf: &[u8], seed: usize, count: usize, flags: ScanFlags) -> usize {
        scan::find_next(self.backend.as_ref(), &mut self.widths, buf, seed, count, flags)
    }

    /// Move back one character from `seed`.
    pub fn find_prev(&mut self, buf: &[u8], seed: usize, flags: ScanFlags) -> usize {
        scan::find_prev(self.backend.as_ref(), &mut self.widths, buf, seed, flags)
    }

    /// Distance from `point` to the next boundary, `None` past the end.
    /// Uses the fallback state when `state` is `None`.
    pub fn adjust_point(&mut self, buf: &[u8], point: usize, state: Option<&mut DecodeState>) -> Option<usize> {
        let state = state.unwrap_or(&mut self.state);
        scan::adjust_point(self.backend.as_ref(), buf, point, state)
    }

    /// `point` moved onto the nearest boundary at or after it.
    pub fn snap(&mut self, buf: &[u8], point: usize) -> Option<usize> {
        self.adjust_point(buf, point, None).map(|delta| point + delta)
    }

    pub fn boundaries(&self, buf: &[u8]) -> Vec<usize> {
        scan::boundaries(self.backend.as_ref(), buf)
    }

    pub fn width_of(&mut self, codepoint: u32) -> Option<u8> {
        self.widths.width_of(codepoint)
    }

    pub fn width_or_default(&mut self, codepoint: u32) -> u8 {
        self.widths.width_or_default(codepoint)
    }

    /// Display columns of the whole string. Invalid bytes count one column.
    pub fn display_width(&mut self, buf: &[u8]) -> usize {
        let mut state = DecodeState::new();
        let mut columns = 0;
        let mut pos = 0;
        let length = scan::c_strlen(buf);
        while pos < length {
            match self.backend.decode(&buf[pos..length], &mut state) {
                Decoded::Char { len, codepoint } => {
                    columns += self.widths.width_or_default(codepoint) as usize;
                    pos += len;
                }
                _ => {
                    state.reset();
                    columns += 1;
                    pos += 1;
                }
            }
        }
        columns
    }

    /// Length-only decode at `pos`, resetting the fallback state on failure.
    pub fn char_len(&mut self, buf: &[u8], pos: usize) -> Decoded {
        compare::char_len(self.backend.as_ref(), scan::tail(buf, pos), &mut self.state)
    }

    pub fn chars_equal(
        &self,
        a: &[u8],
        pos_a: usize,
        state_a: &mut DecodeState,
        b: &[u8],
        pos_b: usize,
        state_b: &mut DecodeState,
    ) -> bool {
        compare::chars_equal(self.backend.as_ref(), a, pos_a, state_a, b, pos_b, state_b)
    }

    pub fn char_value(&self, buf: &[u8], index: usize) -> u32 {
        compare::char_value(self.backend.as_ref(), buf, index)
    }
}

impl Default for MbContext {
    fn default() -> Self {
        Self::utf8()
    }
}
