//! Append-only string pool backing the BTF string section.

use std::collections::HashMap;
use std::io::Write;

use crate::cbtf;
use crate::{Error, Result};

/// The BTF string table. Strings are kept in insertion order and each is
/// followed by a NUL byte in the emitted section; offsets are byte offsets
/// from the section start and never move once returned.
///
/// The table does not deduplicate by content unless built with
/// [`BtfStringTable::with_dedup`]: adding the same string twice yields two
/// offsets, matching what BTF readers expect from compiler output.
pub struct BtfStringTable {
    table: Vec<String>,
    // Total emitted size in bytes, NUL terminators included.
    size: usize,
    // Recorded start offset -> index into `table`.
    offsets: HashMap<u32, usize>,
    dedup: Option<HashMap<String, u32>>,
}

impl BtfStringTable {
    pub fn new() -> BtfStringTable {
        BtfStringTable {
            table: Vec::new(),
            size: 0,
            offsets: HashMap::new(),
            dedup: None,
        }
    }

    /// A table deduplicating by content: adding a string twice returns the
    /// first offset. The section only gets smaller; no returned offset is
    /// ever invalidated.
    pub fn with_dedup() -> BtfStringTable {
        BtfStringTable {
            dedup: Some(HashMap::new()),
            ..BtfStringTable::new()
        }
    }

    /// Append `s`, returning the offset it starts at.
    pub fn add(&mut self, s: &str) -> Result<u32> {
        if let Some(seen) = &self.dedup {
            if let Some(offset) = seen.get(s) {
                return Ok(*offset);
            }
        }

        if self.size > cbtf::BTF_MAX_NAME_OFFSET as usize {
            return Err(Error::StringTableOverflow(self.size));
        }
        let offset = self.size as u32;

        self.offsets.insert(offset, self.table.len());
        if let Some(seen) = &mut self.dedup {
            seen.insert(s.to_string(), offset);
        }

        self.table.push(s.to_string());
        self.size += s.len() + 1;

        Ok(offset)
    }

    /// The string starting at `offset`. Only offsets previously returned by
    /// [`BtfStringTable::add`] resolve.
    pub fn get(&self, offset: u32) -> Result<&str> {
        self.offsets
            .get(&offset)
            .map(|&idx| self.table[idx].as_str())
            .ok_or(Error::InvalidString(offset))
    }

    /// Total emitted length in bytes, NUL terminators included.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Write each string followed by its NUL terminator, in insertion
    /// order.
    pub fn emit<W: Write>(&self, w: &mut W) -> Result<()> {
        for s in &self.table {
            w.write_all(s.as_bytes())?;
            w.write_all(b"\0")?;
        }
        Ok(())
    }

    pub(crate) fn show<W: Write>(&self, w: &mut W) -> Result<()> {
        for s in &self.table {
            writeln!(w, "{s}")?;
        }
        Ok(())
    }
}

impl Default for BtfStringTable {
    fn default() -> BtfStringTable {
        BtfStringTable::new()
    }
}
