/// Shell-side services an embedding editor expects next to the navigation
/// core: quoting, environment access, home directory and fd blocking mode.

use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::unistd::{Uid, User};
use std::os::fd::RawFd;
use std::path::PathBuf;

const DEFAULT_COLUMNS: u16 = 80;

/// Quote `s` for a POSIX shell: wrap in single quotes, embedded quotes
/// become `'\''`.
pub fn single_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        out.push(c);
        if c == '\'' {
            out.push_str("\\''");
        }
    }
    out.push('\'');
    out
}

/// Export the screen size as `LINES` and `COLUMNS`.
pub fn set_lines_and_columns(lines: u16, cols: u16) {
    std::env::set_var("LINES", lines.to_string());
    std::env::set_var("COLUMNS", cols.to_string());
}

pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Home directory from the password database, falling back to `$HOME`.
pub fn home_dir() -> Option<PathBuf> {
    match User::from_uid(Uid::current()) {
        Ok(Some(user)) => Some(user.dir),
        Ok(None) => env_value("HOME").map(PathBuf::from),
        Err(e) => {
            log::debug!("password lookup failed: {}", e);
            env_value("HOME").map(PathBuf::from)
        }
    }
}

/// Screen width from `COLUMNS`, 80 if unset or unparsable.
pub fn terminal_columns() -> u16 {
    env_value("COLUMNS")
        .and_then(|v| v.trim().parse().ok())
        .filter(|&c| c > 0)
        .unwrap_or(DEFAULT_COLUMNS)
}

pub fn is_nodelay(fd: RawFd) -> nix::Result<bool> {
    let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
    Ok(flags.contains(OFlag::O_NONBLOCK))
}

/// Put `fd` into blocking mode. Returns whether the mode changed.
pub fn unset_nodelay_mode(fd: RawFd) -> nix::Result<bool> {
    let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
    if !flags.contains(OFlag::O_NONBLOCK) {
        return Ok(false);
    }
    fcntl(fd, FcntlArg::F_SETFL(flags - OFlag::O_NONBLOCK))?;
    log::debug!("fd {} set to blocking", fd);
    Ok(true)
}

/// Put `fd` into non-blocking mode. Returns whether the mode changed.
pub fn set_nodelay_mode(fd: RawFd) -> nix::Result<bool> {
    let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
    if flags.contains(OFlag::O_NONBLOCK) {
        return Ok(false);
    }
    fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
    Ok(true)
}
