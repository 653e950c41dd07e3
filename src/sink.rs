//! Byte sinks receiving the emitted BTF blob.

use std::io::{self, Write};

use crate::Result;

/// Destination for emitted bytes. The emitter switches to a named output
/// section once, then streams the blob through the `io::Write` impl;
/// multi-byte integers are written little-endian.
pub trait ByteSink: Write {
    fn switch_section(&mut self, name: &str) -> Result<()>;
}

/// In-memory sink collecting one byte buffer per named section.
#[derive(Debug, Default)]
pub struct SectionSink {
    sections: Vec<(String, Vec<u8>)>,
    current: Option<usize>,
}

impl SectionSink {
    pub fn new() -> SectionSink {
        SectionSink::default()
    }

    /// Bytes emitted into a section so far, if it exists.
    pub fn section(&self, name: &str) -> Option<&[u8]> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, bytes)| bytes.as_slice())
    }
}

impl Write for SectionSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.current {
            Some(idx) => {
                self.sections[idx].1.extend_from_slice(buf);
                Ok(buf.len())
            }
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "no output section selected",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteSink for SectionSink {
    fn switch_section(&mut self, name: &str) -> Result<()> {
        let idx = match self.sections.iter().position(|(n, _)| n == name) {
            Some(idx) => idx,
            None => {
                self.sections.push((name.to_string(), Vec::new()));
                self.sections.len() - 1
            }
        };
        self.current = Some(idx);
        Ok(())
    }
}
