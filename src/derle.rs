use crate::{Corruption, Run, MAX_RUN_LENGTH};
use std::io;

pub struct DeRle<W> {
    pending: Option<u8>,
    offset: u64,
    writer: W,
}

impl<W: io::Write> DeRle<W> {
    pub fn new(writer: W) -> DeRle<W> {
        DeRle {
            pending: None,
            offset: 0,
            writer,
        }
    }

    /// Expands one run into the writer.
    #[inline(always)]
    pub fn update(&mut self, run: Run) -> io::Result<()> {
        trace!("decode: {:?} at offset {}", run, self.offset);
        if run.length == 0 {
            return Err(Corruption::ZeroLength {
                offset: self.offset,
            }
            .into());
        }
        let fill = [run.value; MAX_RUN_LENGTH as usize];
        self.writer.write_all(&fill[..run.length as usize])?;
        self.offset += 2;
        Ok(())
    }

    /// Checks that the stream ended on a pair boundary and returns the inner writer.
    #[inline(always)]
    pub fn finalize(mut self) -> io::Result<W> {
        if let Some(value) = self.pending {
            trace!("dangling value 0x{:02X}", value);
            return Err(Corruption::TruncatedPair {
                offset: self.offset,
            }
            .into());
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: io::Write> io::Write for DeRle<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        if let Some(value) = self.pending {
            let Some((&length, tail)) = rest.split_first() else {
                return Ok(0);
            };
            self.update(Run { value, length })?;
            self.pending = None;
            rest = tail;
        }
        let iter = rest.chunks_exact(2);
        let rem = iter.remainder();
        for pair in iter {
            self.update(Run {
                value: pair[0],
                length: pair[1],
            })?;
        }
        if let [value] = rem {
            self.pending = Some(*value);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
