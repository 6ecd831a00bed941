/// Width probing by measurement: print a character on a display surface and
/// see how far the cursor moved.
///
/// `TerminalSurface` talks to the controlling terminal with cursor position
/// reports (CSI 6n, answered by CSI row;col R). Measurements happen on the
/// alternate screen so the editor's line and cursor are left untouched.

use crate::core::width::{ProbeError, WidthProbe};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::termios::{cfmakeraw, tcgetattr, tcsetattr, SetArg, Termios};
use regex::bytes::Regex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsFd;
use std::sync::LazyLock;

/// Columns kept free at the right edge before probing, so the probed
/// character never wraps.
const RIGHT_MARGIN: u16 = 5;

/// Longest cursor report accepted before giving up.
const MAX_REPORT_LEN: usize = 32;

/// Switch to the alternate screen, saving the cursor.
const ENTER_PROBE_SCREEN: &[u8] = b"\x1b[?1049h";
/// Back to the main screen, restoring the cursor.
const LEAVE_PROBE_SCREEN: &[u8] = b"\x1b[?1049l";

static REPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[(\d+);(\d+)R").expect("cursor report regex")
});

pub trait DisplaySurface: Send {
    /// Zero-based cursor column.
    fn cursor_column(&mut self) -> Result<u16, ProbeError>;
    /// Width of the surface in columns.
    fn columns(&self) -> u16;
    fn write_char(&mut self, ch: char) -> Result<(), ProbeError>;
    fn newline(&mut self) -> Result<(), ProbeError>;

    /// Called before each measurement. Whatever the measurement writes,
    /// including newlines, must be undone by `end`.
    fn begin(&mut self) -> Result<(), ProbeError> {
        Ok(())
    }

    /// Called after each measurement, whether or not it succeeded. Restores
    /// the display and cursor position saved by `begin`.
    fn end(&mut self) {}
}

pub struct SurfaceProbe<S> {
    surface: S,
}

impl<S: DisplaySurface> SurfaceProbe<S> {
    pub fn new(surface: S) -> Self {
        Self { surface }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

impl<S: DisplaySurface> WidthProbe for SurfaceProbe<S> {
    fn name(&self) -> &'static str {
        "surface"
    }

    fn probe(&mut self, codepoint: u32) -> Result<u8, ProbeError> {
        let ch = char::from_u32(codepoint).ok_or(ProbeError::InvalidCodepoint(codepoint))?;
        self.surface.begin()?;
        let measured = self.measure(ch);
        self.surface.end();
        measured
    }
}

impl<S: DisplaySurface> SurfaceProbe<S> {
    fn measure(&mut self, ch: char) -> Result<u8, ProbeError> {
        let mut before = self.surface.cursor_column()?;
        if before >= self.surface.columns().saturating_sub(RIGHT_MARGIN) {
            self.surface.newline()?;
            before = self.surface.cursor_column()?;
        }
        self.surface.write_char(ch)?;
        let after = self.surface.cursor_column()?;

        if after < before {
            return Err(ProbeError::Malformed(format!(
                "cursor moved backwards from {} to {}",
                before, after
            )));
        }
        u8::try_from(after - before)
            .map_err(|_| ProbeError::Malformed(format!("displacement {} too large", after - before)))
    }
}

/// Parse a cursor position report into one-based (row, col).
pub fn parse_cursor_report(bytes: &[u8]) -> Option<(u16, u16)> {
    split_cursor_report(bytes).map(|(_, pos)| pos)
}

/// Split terminal input into the bytes that arrived before a cursor report
/// and the report's one-based (row, col).
pub fn split_cursor_report(bytes: &[u8]) -> Option<(&[u8], (u16, u16))> {
    let caps = REPORT_RE.captures(bytes)?;
    let start = caps.get(0)?.start();
    let row = std::str::from_utf8(&caps[1]).ok()?.parse().ok()?;
    let col = std::str::from_utf8(&caps[2]).ok()?.parse().ok()?;
    Some((&bytes[..start], (row, col)))
}

/// The controlling terminal. Raw mode and the alternate screen are entered
/// for each measurement only. Keystrokes that arrive during a measurement are
/// kept for the editor in `take_input`.
pub struct TerminalSurface {
    tty: File,
    saved: Option<Termios>,
    on_probe_screen: bool,
    input: Vec<u8>,
    columns: u16,
    timeout_ms: u16,
}

impl TerminalSurface {
    pub fn open(columns: u16, timeout_ms: u16) -> Result<Self, ProbeError> {
        let tty = OpenOptions::new().read(true).write(true).open("/dev/tty")?;
        log::debug!("terminal surface opened ({} columns)", columns);
        Ok(Self {
            tty,
            saved: None,
            on_probe_screen: false,
            input: Vec::new(),
            columns,
            timeout_ms,
        })
    }

    /// Input typed while measuring, in arrival order. Drains the buffer.
    pub fn take_input(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.input)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ProbeError> {
        self.tty.write_all(bytes)?;
        self.tty.flush()?;
        Ok(())
    }

    fn read_report(&mut self) -> Result<Vec<u8>, ProbeError> {
        let mut report = Vec::with_capacity(MAX_REPORT_LEN);
        loop {
            let ready = {
                let mut fds = [PollFd::new(self.tty.as_fd(), PollFlags::POLLIN)];
                poll(&mut fds, PollTimeout::from(self.timeout_ms))?
            };
            if ready == 0 {
                return Err(ProbeError::Timeout);
            }
            let mut byte = [0u8; 1];
            if self.tty.read(&mut byte)? == 0 {
                return Err(ProbeError::Malformed("terminal closed".into()));
            }
            report.push(byte[0]);
            if byte[0] == b'R' && REPORT_RE.is_match(&report) {
                return Ok(report);
            }
            if report.len() >= MAX_REPORT_LEN {
                let msg = String::from_utf8_lossy(&report).into_owned();
                self.input.extend_from_slice(&report);
                return Err(ProbeError::Malformed(msg));
            }
        }
    }

    fn restore(&mut self) {
        if self.on_probe_screen {
            self.on_probe_screen = false;
            if let Err(e) = self.write_all(LEAVE_PROBE_SCREEN) {
                log::warn!("failed to leave probe screen: {}", e);
            }
        }
        if let Some(saved) = self.saved.take() {
            if let Err(e) = tcsetattr(&self.tty, SetArg::TCSANOW, &saved) {
                log::warn!("failed to restore terminal attributes: {}", e);
            }
        }
    }
}

impl DisplaySurface for TerminalSurface {
    fn cursor_column(&mut self) -> Result<u16, ProbeError> {
        self.write_all(b"\x1b[6n")?;
        let report = self.read_report()?;
        let (typed, (_, col)) = split_cursor_report(&report)
            .ok_or_else(|| ProbeError::Malformed(String::from_utf8_lossy(&report).into_owned()))?;
        self.input.extend_from_slice(typed);
        Ok(col.saturating_sub(1))
    }

    fn columns(&self) -> u16 {
        self.columns
    }

    fn write_char(&mut self, ch: char) -> Result<(), ProbeError> {
        let mut buf = [0u8; 4];
        self.write_all(ch.encode_utf8(&mut buf).as_bytes())
    }

    fn newline(&mut self) -> Result<(), ProbeError> {
        self.write_all(b"\r\n")
    }

    fn begin(&mut self) -> Result<(), ProbeError> {
        let saved = tcgetattr(&self.tty)?;
        let mut raw = saved.clone();
        cfmakeraw(&mut raw);
        tcsetattr(&self.tty, SetArg::TCSANOW, &raw)?;
        self.saved = Some(saved);
        self.on_probe_screen = true;
        if let Err(e) = self.write_all(ENTER_PROBE_SCREEN) {
            self.restore();
            return Err(e);
        }
        Ok(())
    }

    fn end(&mut self) {
        self.restore();
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        self.restore();
    }
}
