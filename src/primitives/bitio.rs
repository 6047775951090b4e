//! Bit-level I/O over byte streams
//!
//! Both directions are MSB-first. Output bytes are written and flushed as
//! soon as their eighth bit arrives; a trailing partial byte is never
//! written. Input bytes are pulled one at a time when the current one is
//! used up.

use std::io::{self, Read, Write};

/// Host side of the two impure builtins
pub trait BitIo {
    fn emit_bit(&mut self, bit: bool) -> io::Result<()>;

    /// `None` once the source is exhausted
    fn read_bit(&mut self) -> io::Result<Option<bool>>;
}

impl<T: BitIo + ?Sized> BitIo for &mut T {
    fn emit_bit(&mut self, bit: bool) -> io::Result<()> {
        (**self).emit_bit(bit)
    }

    fn read_bit(&mut self) -> io::Result<Option<bool>> {
        (**self).read_bit()
    }
}

impl<T: BitIo + ?Sized> BitIo for Box<T> {
    fn emit_bit(&mut self, bit: bool) -> io::Result<()> {
        (**self).emit_bit(bit)
    }

    fn read_bit(&mut self) -> io::Result<Option<bool>> {
        (**self).read_bit()
    }
}

/// 8-bit shift register in front of a byte sink
#[derive(Debug)]
pub struct BitWriter<W> {
    out: W,
    byte: u8,
    filled: u8,
    bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(out: W) -> Self {
        BitWriter {
            out,
            byte: 0,
            filled: 0,
            bits_written: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.byte = (self.byte << 1) | bit as u8;
        self.filled += 1;
        self.bits_written += 1;
        if self.filled == 8 {
            let byte = self.byte;
            self.byte = 0;
            self.filled = 0;
            self.out.write_all(&[byte])?;
            self.out.flush()?;
        }
        Ok(())
    }

    /// Total bits accepted, including any in the pending partial byte
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Bits waiting for the rest of their byte
    pub fn pending_bits(&self) -> u8 {
        self.filled
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// 8-bit shift register behind a byte source
#[derive(Debug)]
pub struct BitReader<R> {
    input: R,
    byte: u8,
    remaining: u8,
    exhausted: bool,
}

impl<R: Read> BitReader<R> {
    pub fn new(input: R) -> Self {
        BitReader {
            input,
            byte: 0,
            remaining: 0,
            exhausted: false,
        }
    }

    pub fn read_bit(&mut self) -> io::Result<Option<bool>> {
        if self.remaining == 0 {
            if self.exhausted {
                return Ok(None);
            }
            let mut buf = [0u8; 1];
            loop {
                match self.input.read(&mut buf) {
                    Ok(0) => {
                        self.exhausted = true;
                        return Ok(None);
                    }
                    Ok(_) => break,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            }
            self.byte = buf[0];
            self.remaining = 8;
        }
        self.remaining -= 1;
        Ok(Some((self.byte >> self.remaining) & 1 == 1))
    }
}

/// A bit source and a bit sink bundled for the evaluator
#[derive(Debug)]
pub struct BitPort<R, W> {
    pub reader: BitReader<R>,
    pub writer: BitWriter<W>,
}

impl<R: Read, W: Write> BitPort<R, W> {
    pub fn new(input: R, output: W) -> Self {
        BitPort {
            reader: BitReader::new(input),
            writer: BitWriter::new(output),
        }
    }
}

impl<R: Read, W: Write> BitIo for BitPort<R, W> {
    fn emit_bit(&mut self, bit: bool) -> io::Result<()> {
        self.writer.write_bit(bit)
    }

    fn read_bit(&mut self) -> io::Result<Option<bool>> {
        self.reader.read_bit()
    }
}

/// In-memory port that also records every emitted bit.
///
/// Used by tests and benchmarks to compare runs bit for bit, including a
/// trailing partial byte the byte-oriented writer would hold back.
#[derive(Debug, Default, Clone)]
pub struct MemoryIo {
    input: Vec<u8>,
    cursor: usize,
    pending: Option<(u8, u8)>,
    bits: Vec<bool>,
}

impl MemoryIo {
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        MemoryIo {
            input: input.into(),
            ..Self::default()
        }
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Complete bytes emitted so far, MSB-first
    pub fn bytes(&self) -> Vec<u8> {
        self.bits
            .chunks_exact(8)
            .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8))
            .collect()
    }

    /// Number of input bytes consumed
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl BitIo for MemoryIo {
    fn emit_bit(&mut self, bit: bool) -> io::Result<()> {
        self.bits.push(bit);
        Ok(())
    }

    fn read_bit(&mut self) -> io::Result<Option<bool>> {
        let (byte, remaining) = match self.pending.take() {
            Some(state) => state,
            None => match self.input.get(self.cursor) {
                Some(&byte) => {
                    self.cursor += 1;
                    (byte, 8)
                }
                None => return Ok(None),
            },
        };
        let remaining = remaining - 1;
        if remaining > 0 {
            self.pending = Some((byte, remaining));
        }
        Ok(Some((byte >> remaining) & 1 == 1))
    }
}
