//! Sorted runs for the external sort
//!
//! Document indexing produces `(term, docno, tf)` triples far faster than they
//! can be kept in memory. `RunWriter` buffers up to `chunk_limit` triples,
//! sorts them by `(term, docno)` and spills them to `chunk_<n>.bin`. The merge
//! only sees the `SortedRun` trait, so the storage of a run can change without
//! touching it.
//!
//! Run record layout (little-endian):
//! `u32 term length, term bytes, u32 docno, u32 term frequency`

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::codec::{read_u32_le, read_u32_le_or_eof, write_u32_le};
use super::types::{DocNo, Triple};
use crate::error::{IndexError, Result};

/// A source of triples in ascending `(term, docno)` order
pub trait SortedRun {
    /// Next triple, or `None` once the run is exhausted
    fn next_triple(&mut self) -> Result<Option<Triple>>;
}

impl<S: SortedRun + ?Sized> SortedRun for Box<S> {
    fn next_triple(&mut self) -> Result<Option<Triple>> {
        (**self).next_triple()
    }
}

/// In-memory run, sorted on construction
pub struct VecRun {
    triples: std::vec::IntoIter<Triple>,
}

impl VecRun {
    pub fn new(mut triples: Vec<Triple>) -> Self {
        triples.sort_by(|a, b| a.key_cmp(b));
        Self {
            triples: triples.into_iter(),
        }
    }
}

impl SortedRun for VecRun {
    fn next_triple(&mut self) -> Result<Option<Triple>> {
        Ok(self.triples.next())
    }
}

/// Buffers triples and spills them as sorted run files
pub struct RunWriter {
    dir: PathBuf,
    chunk_limit: usize,
    buffer: Vec<Triple>,
    runs: Vec<PathBuf>,
}

impl RunWriter {
    pub fn new(dir: impl Into<PathBuf>, chunk_limit: usize) -> Self {
        let chunk_limit = chunk_limit.max(1);
        Self {
            dir: dir.into(),
            chunk_limit,
            // Large limits grow the buffer on demand
            buffer: Vec::with_capacity(chunk_limit.min(64 * 1024)),
            runs: Vec::new(),
        }
    }

    /// Buffer a triple, spilling a run when the buffer is full
    pub fn push(&mut self, triple: Triple) -> Result<()> {
        self.buffer.push(triple);
        if self.buffer.len() >= self.chunk_limit {
            self.flush()?;
        }
        Ok(())
    }

    /// Sort and spill the buffered triples, if any
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let path = self.dir.join(format!("chunk_{}.bin", self.runs.len()));
        write_run(&mut self.buffer, &path)?;
        debug!(run = self.runs.len(), path = %path.display(), "Flushed sorted run");

        self.buffer.clear();
        self.runs.push(path);
        Ok(())
    }

    /// Triples currently held in memory
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Runs spilled so far
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Spill the remainder and return every run path in creation order
    pub fn finish(mut self) -> Result<Vec<PathBuf>> {
        self.flush()?;
        Ok(self.runs)
    }
}

/// Sort `entries` by `(term, docno)` and write them as one run file
pub fn write_run(entries: &mut [Triple], path: &Path) -> Result<()> {
    entries.sort_unstable_by(|a, b| a.key_cmp(b));

    let mut out = BufWriter::new(File::create(path)?);
    for e in entries.iter() {
        let term_len = u32::try_from(e.term.len())
            .map_err(|_| IndexError::InvalidArgument("term longer than u32::MAX bytes".into()))?;
        write_u32_le(&mut out, term_len)?;
        out.write_all(e.term.as_bytes())?;
        write_u32_le(&mut out, e.docno.as_u32())?;
        write_u32_le(&mut out, e.term_frequency)?;
    }
    out.flush()?;
    Ok(())
}

/// Sequential reader over one run file
pub struct RunReader<R> {
    input: R,
    name: String,
}

impl RunReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: Read> RunReader<R> {
    pub fn new(input: R, name: impl Into<String>) -> Self {
        Self {
            input,
            name: name.into(),
        }
    }

    fn truncated(&self, e: std::io::Error) -> IndexError {
        if e.kind() == ErrorKind::UnexpectedEof {
            IndexError::corrupt(format!("truncated record in run {}", self.name))
        } else {
            IndexError::Io(e)
        }
    }
}

impl<R: Read> SortedRun for RunReader<R> {
    fn next_triple(&mut self) -> Result<Option<Triple>> {
        let term_len = match read_u32_le_or_eof(&mut self.input) {
            Ok(Some(len)) => len,
            Ok(None) => return Ok(None),
            Err(e) => return Err(self.truncated(e)),
        };

        let mut term_bytes = Vec::new();
        (&mut self.input)
            .take(term_len as u64)
            .read_to_end(&mut term_bytes)?;
        if term_bytes.len() != term_len as usize {
            return Err(IndexError::corrupt(format!(
                "truncated term in run {}",
                self.name
            )));
        }
        let docno = read_u32_le(&mut self.input).map_err(|e| self.truncated(e))?;
        let term_frequency = read_u32_le(&mut self.input).map_err(|e| self.truncated(e))?;

        let term = String::from_utf8(term_bytes)
            .map_err(|_| IndexError::corrupt(format!("non UTF-8 term in run {}", self.name)))?;

        Ok(Some(Triple {
            term,
            docno: DocNo(docno),
            term_frequency,
        }))
    }
}
