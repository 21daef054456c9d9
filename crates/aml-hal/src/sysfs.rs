//! Sysfs accessor primitives
//!
//! Every node the Amlogic drivers expose is a tiny text file. Backends only
//! move bytes; the string and integer accessors are provided on top.

use crate::{AmlError, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// Bytes read by [`Sysfs::get_int`]
const INT_READ_LIMIT: usize = 16;

/// Byte-level access to sysfs nodes, addressed by their absolute kernel path
pub trait Sysfs {
    /// Read at most `limit` bytes from the node
    fn read_bytes(&self, path: &str, limit: usize) -> io::Result<Vec<u8>>;

    /// Open the node with create/truncate semantics and write `value`
    fn write_bytes(&self, path: &str, value: &[u8]) -> io::Result<()>;

    /// Write a string value
    fn set_str(&self, path: &str, value: &str) -> Result<()> {
        self.write_bytes(path, value.as_bytes())
            .map_err(|source| unavailable(path, source))?;
        tracing::info!("set_sysfs_str k={} v={}", path, value);
        Ok(())
    }

    /// Read a string value of at most `max_size - 1` bytes, cut at the first NUL
    fn get_str(&self, path: &str, max_size: usize) -> Result<String> {
        let bytes = self
            .read_bytes(path, max_size.saturating_sub(1))
            .map_err(|source| unavailable(path, source))?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let value = String::from_utf8_lossy(&bytes[..end]).into_owned();
        tracing::info!("get_sysfs_str k={} v={}", path, value);
        Ok(value)
    }

    /// Write an integer as decimal text
    fn set_int(&self, path: &str, value: i32) -> Result<()> {
        self.set_str(path, &value.to_string())
    }

    /// Read an integer, parsed as base 16.
    ///
    /// The kernel mostly prints these nodes in decimal; callers only rely on
    /// the read succeeding, so the value itself is best effort.
    fn get_int(&self, path: &str) -> Result<i32> {
        let bytes = self
            .read_bytes(path, INT_READ_LIMIT)
            .map_err(|source| unavailable(path, source))?;
        Ok(parse_hex(&bytes))
    }
}

fn unavailable(path: &str, source: io::Error) -> AmlError {
    AmlError::NodeUnavailable {
        path: path.to_string(),
        source,
    }
}

/// Parse like C `strtol(s, NULL, 16)`: leading whitespace, optional sign,
/// optional `0x`, then hex digits up to the first non-digit. No digits is 0.
pub fn parse_hex(bytes: &[u8]) -> i32 {
    let mut rest = bytes;
    while let [b, tail @ ..] = rest {
        if !b.is_ascii_whitespace() {
            break;
        }
        rest = tail;
    }

    let negative = match rest {
        [b'-', tail @ ..] => {
            rest = tail;
            true
        }
        [b'+', tail @ ..] => {
            rest = tail;
            false
        }
        _ => false,
    };

    if let [b'0', b'x' | b'X', d, ..] = rest
        && d.is_ascii_hexdigit()
    {
        rest = &rest[2..];
    }

    let mut value: i64 = 0;
    for b in rest {
        let Some(digit) = (*b as char).to_digit(16) else {
            break;
        };
        value = value.saturating_mul(16).saturating_add(i64::from(digit));
    }

    let value = if negative { -value } else { value };
    value as i32
}

/// Real sysfs, with node paths resolved under `root`
#[derive(Debug, Clone)]
pub struct SysfsRoot {
    root: PathBuf,
}

impl SysfsRoot {
    /// Create a backend rooted at `root` (`/` on a device)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Default for SysfsRoot {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Sysfs for SysfsRoot {
    fn read_bytes(&self, path: &str, limit: usize) -> io::Result<Vec<u8>> {
        let file = File::open(self.resolve(path))?;
        let mut buf = Vec::with_capacity(limit);
        file.take(limit as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn write_bytes(&self, path: &str, value: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o644)
            .open(self.resolve(path))?;

        // Drivers may reject a value after a successful open; that is not
        // reported to callers.
        if let Err(e) = file.write_all(value) {
            tracing::debug!("Short write to {}: {}", path, e);
        }
        Ok(())
    }
}
