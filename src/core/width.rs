/// Display width lookup: a lazily filled per-codepoint cache in front of a
/// width probe. Entries are written once by the probe and never change.

use crate::core::utf8::MAX_CODEPOINT;
use serde::Deserialize;
use std::fmt;
use std::io;
use unicode_width::UnicodeWidthChar;

const UNMEASURED: i8 = -1;
const MIN_CAPACITY: usize = 256;

#[derive(Debug)]
pub enum ProbeError {
    /// Reading or writing the display surface failed.
    Io(io::Error),
    /// The codepoint is not a Unicode scalar value.
    InvalidCodepoint(u32),
    /// The probe has no width for this codepoint.
    Unsupported(u32),
    /// The surface answered with something unusable.
    Malformed(String),
    /// The surface did not answer in time.
    Timeout,
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Io(e) => write!(f, "display surface I/O failed: {}", e),
            ProbeError::InvalidCodepoint(cp) => write!(f, "U+{:04X} is not a character", cp),
            ProbeError::Unsupported(cp) => write!(f, "no width known for U+{:04X}", cp),
            ProbeError::Malformed(msg) => write!(f, "unusable probe answer: {}", msg),
            ProbeError::Timeout => write!(f, "display surface did not answer"),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ProbeError {
    fn from(e: io::Error) -> Self {
        ProbeError::Io(e)
    }
}

impl From<nix::Error> for ProbeError {
    fn from(e: nix::Error) -> Self {
        ProbeError::Io(io::Error::from(e))
    }
}

/// Something that can tell how many columns a codepoint occupies.
pub trait WidthProbe: Send {
    fn name(&self) -> &'static str;
    fn probe(&mut self, codepoint: u32) -> Result<u8, ProbeError>;
}

/// Which probe a context measures widths with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// Unicode East Asian Width tables.
    #[default]
    Table,
    /// Ask the controlling terminal.
    Terminal,
}

/// Width from the Unicode tables, the platform's direct width function.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeTableProbe;

impl WidthProbe for UnicodeTableProbe {
    fn name(&self) -> &'static str {
        "table"
    }

    fn probe(&mut self, codepoint: u32) -> Result<u8, ProbeError> {
        let ch = char::from_u32(codepoint).ok_or(ProbeError::InvalidCodepoint(codepoint))?;
        ch.width()
            .map(|w| w as u8)
            .ok_or(ProbeError::Unsupported(codepoint))
    }
}

/// Capacity covering `idx`: the next power of two above it, at least 256.
pub fn next_capacity(idx: usize) -> usize {
    (idx + 1).next_power_of_two().max(MIN_CAPACITY)
}

pub struct WidthCache {
    widths: Vec<i8>,
    probe: Box<dyn WidthProbe>,
    unknown_width: u8,
    probes: usize,
    grows: usize,
}

impl WidthCache {
    pub fn new(probe: Box<dyn WidthProbe>) -> Self {
        Self {
            widths: Vec::new(),
            probe,
            unknown_width: 1,
            probes: 0,
            grows: 0,
        }
    }

    /// Cache with room for codepoints below `capacity` allocated up front.
    /// Requests beyond the codepoint range are clamped to it.
    pub fn with_capacity(probe: Box<dyn WidthProbe>, capacity: usize) -> Self {
        let mut cache = Self::new(probe);
        let limit = MAX_CODEPOINT as usize + 1;
        if capacity > limit {
            log::warn!("width cache capacity {} exceeds the codepoint range, using {}", capacity, limit);
        }
        let capacity = capacity.min(limit);
        if capacity > 0 {
            cache.grow_to(capacity - 1);
        }
        cache
    }

    /// Width assumed by `width_or_default` when the probe fails.
    pub fn set_unknown_width(&mut self, width: u8) {
        self.unknown_width = width;
    }

    pub fn unknown_width(&self) -> u8 {
        self.unknown_width
    }

    pub fn capacity(&self) -> usize {
        self.widths.len()
    }

    /// Number of times the probe has been invoked.
    pub fn probe_count(&self) -> usize {
        self.probes
    }

    /// Number of times the table has been enlarged.
    pub fn grow_count(&self) -> usize {
        self.grows
    }

    pub fn probe_name(&self) -> &'static str {
        self.probe.name()
    }

    /// Cached width without probing.
    pub fn cached(&self, codepoint: u32) -> Option<u8> {
        let w = *self.widths.get(codepoint as usize)?;
        (w != UNMEASURED).then_some(w as u8)
    }

    /// Columns occupied by `codepoint`, probing on first request.
    /// `None` means the width is unknown; nothing is cached in that case.
    pub fn width_of(&mut self, codepoint: u32) -> Option<u8> {
        if codepoint > MAX_CODEPOINT {
            return None;
        }
        let idx = codepoint as usize;
        if idx >= self.widths.len() {
            self.grow_to(idx);
        }
        let cached = self.widths[idx];
        if cached != UNMEASURED {
            return Some(cached as u8);
        }

        self.probes += 1;
        let measured = self
            .probe
            .probe(codepoint)
            .and_then(|w| {
                i8::try_from(w).map_err(|_| ProbeError::Malformed(format!("width {} too large", w)))
            });
        match measured {
            Ok(w) => {
                log::debug!("width of U+{:04X} = {} ({})", codepoint, w, self.probe.name());
                self.widths[idx] = w;
                Some(w as u8)
            }
            Err(e) => {
                log::warn!("width probe failed for U+{:04X}: {}", codepoint, e);
                None
            }
        }
    }

    /// Like `width_of`, substituting the unknown-width default on failure.
    pub fn width_or_default(&mut self, codepoint: u32) -> u8 {
        self.width_of(codepoint).unwrap_or(self.unknown_width)
    }

    fn grow_to(&mut self, idx: usize) {
        let new_len = next_capacity(idx);
        if new_len <= self.widths.len() {
            return;
        }
        log::debug!("width cache grows {} -> {}", self.widths.len(), new_len);
        self.widths.resize(new_len, UNMEASURED);
        self.grows += 1;
    }
}

impl fmt::Debug for WidthCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidthCache")
            .field("probe", &self.probe.name())
            .field("capacity", &self.widths.len())
            .field("probes", &self.probes)
            .finish()
    }
}
