//! CRLF to LF normalization applied before hashing text files.
//!
//! Classification follows git's `core.autocrlf` heuristics: content with a
//! NUL byte, a CR not followed by LF, or too many non-printable bytes is
//! binary and left untouched.

use std::io::{self, Read};

const CHUNK: usize = 8 * 1024;

/// Byte-class counts over a whole stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextStat {
    pub nul: u64,
    pub lone_cr: u64,
    pub lone_lf: u64,
    pub crlf: u64,
    pub printable: u64,
    pub nonprintable: u64,
}

impl TextStat {
    /// Count byte classes in `reader`, consuming it to the end.
    pub fn gather(reader: &mut dyn Read) -> io::Result<Self> {
        let mut stat = Self::default();
        let mut buf = [0u8; CHUNK];
        let mut pending_cr = false;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            for &b in &buf[..n] {
                if pending_cr {
                    pending_cr = false;
                    if b == b'\n' {
                        stat.crlf += 1;
                        continue;
                    }
                    stat.lone_cr += 1;
                }
                stat.count(b, &mut pending_cr);
            }
        }
        if pending_cr {
            stat.lone_cr += 1;
        }
        Ok(stat)
    }

    fn count(&mut self, b: u8, pending_cr: &mut bool) {
        match b {
            b'\r' => *pending_cr = true,
            b'\n' => self.lone_lf += 1,
            0 => {
                self.nul += 1;
                self.nonprintable += 1;
            }
            // backspace, tab, escape, form feed
            0x08 | b'\t' | 0x1b | 0x0c => self.printable += 1,
            0x7f => self.nonprintable += 1,
            b if b < 0x20 => self.nonprintable += 1,
            _ => self.printable += 1,
        }
    }

    pub fn is_binary(&self) -> bool {
        self.lone_cr > 0 || self.nul > 0 || (self.printable >> 7) < self.nonprintable
    }
}

/// A CRLF normalization strategy.
pub trait LineEndingFilter: Send + Sync {
    /// Classify the content of `reader`, consuming it.
    fn stat(&self, reader: &mut dyn Read) -> io::Result<TextStat>;

    /// Wrap `reader` so that it yields normalized content. For text input
    /// the result is exactly `stat.crlf` bytes shorter.
    fn normalize<'a>(&self, reader: &'a mut dyn Read) -> Box<dyn Read + 'a>;
}

/// Rewrites every CRLF pair to a single LF.
#[derive(Clone, Copy, Debug, Default)]
pub struct CrlfToLf;

impl LineEndingFilter for CrlfToLf {
    fn stat(&self, reader: &mut dyn Read) -> io::Result<TextStat> {
        TextStat::gather(reader)
    }

    fn normalize<'a>(&self, reader: &'a mut dyn Read) -> Box<dyn Read + 'a> {
        Box::new(LfReader::new(reader))
    }
}

/// Reader adapter that drops the CR of every CRLF pair, including pairs
/// split across reads of the inner reader.
pub struct LfReader<R> {
    inner: R,
    out: Vec<u8>,
    pos: usize,
    pending_cr: bool,
}

impl<R: Read> LfReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            out: Vec::with_capacity(CHUNK),
            pos: 0,
            pending_cr: false,
        }
    }

    /// Refill `out`. Returns `false` at end of input.
    fn fill(&mut self) -> io::Result<bool> {
        let mut chunk = [0u8; CHUNK];
        self.out.clear();
        self.pos = 0;
        while self.out.is_empty() {
            let n = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                if std::mem::take(&mut self.pending_cr) {
                    self.out.push(b'\r');
                    return Ok(true);
                }
                return Ok(false);
            }
            for &b in &chunk[..n] {
                if std::mem::take(&mut self.pending_cr) && b != b'\n' {
                    self.out.push(b'\r');
                }
                if b == b'\r' {
                    self.pending_cr = true;
                } else {
                    self.out.push(b);
                }
            }
        }
        Ok(true)
    }
}

impl<R: Read> Read for LfReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pos == self.out.len() && !self.fill()? {
            return Ok(0);
        }
        let n = buf.len().min(self.out.len() - self.pos);
        buf[..n].copy_from_slice(&self.out[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
