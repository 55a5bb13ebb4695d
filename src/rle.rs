use crate::{Run, MAX_RUN_LENGTH};
use std::io;

pub struct Rle<W> {
    status: RleStatus,
    written: u64,
    writer: W,
}

#[derive(Copy, Clone, Debug)]
enum RleStatus {
    Run(Run),
    Wait,
}

impl RleStatus {
    /// Feeds one byte, returning the run it closed, if any.
    #[inline(always)]
    fn push(&mut self, byte: u8) -> Option<Run> {
        match *self {
            RleStatus::Wait => {
                *self = RleStatus::Run(Run {
                    value: byte,
                    length: 1,
                });
                trace!("transit to {:?}", self);
                None
            }
            RleStatus::Run(run) if run.value == byte && run.length < MAX_RUN_LENGTH => {
                *self = RleStatus::Run(Run {
                    length: run.length + 1,
                    ..run
                });
                None
            }
            RleStatus::Run(run) => {
                if run.value == byte {
                    trace!("cut! run of 0x{:02X} reached {}", byte, MAX_RUN_LENGTH);
                }
                *self = RleStatus::Run(Run {
                    value: byte,
                    length: 1,
                });
                trace!("emit {:?}, transit to {:?}", run, self);
                Some(run)
            }
        }
    }

    #[inline(always)]
    fn take(&mut self) -> Option<Run> {
        match std::mem::replace(self, RleStatus::Wait) {
            RleStatus::Run(run) => Some(run),
            RleStatus::Wait => None,
        }
    }
}

pub(crate) fn encode_into(input: &[u8], out: &mut Vec<u8>) {
    let mut status = RleStatus::Wait;
    for &byte in input {
        if let Some(run) = status.push(byte) {
            out.extend_from_slice(&run.to_bytes());
        }
    }
    if let Some(run) = status.take() {
        out.extend_from_slice(&run.to_bytes());
    }
}

impl<W: io::Write> Rle<W> {
    pub fn new(writer: W) -> Self {
        Rle {
            status: RleStatus::Wait,
            written: 0,
            writer,
        }
    }

    #[inline(always)]
    pub fn update(&mut self, byte: u8) -> io::Result<()> {
        if let Some(run) = self.status.push(byte) {
            self.emit(run)?;
        }
        Ok(())
    }

    #[inline(always)]
    fn emit(&mut self, run: Run) -> io::Result<()> {
        self.writer.write_all(&run.to_bytes())?;
        self.written += 2;
        Ok(())
    }

    /// Number of encoded bytes handed to the writer so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Writes the pending run, returning the inner writer and the encoded size.
    pub fn finalize(mut self) -> io::Result<(W, u64)> {
        if let Some(run) = self.status.take() {
            trace!("last block: {:?}", run);
            self.emit(run)?;
        }
        self.writer.flush()?;
        Ok((self.writer, self.written))
    }
}

impl<W: io::Write> io::Write for Rle<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for byte in buf.iter() {
            self.update(*byte)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
