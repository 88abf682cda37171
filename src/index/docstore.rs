//! Document store: external ids, paths and token counts addressed by `DocNo`
//!
//! - `docstore_data.bin`: `(varint len, id bytes, varint len, path bytes)` per document
//! - `docstore_offsets.bin`: one u64 start offset into the data file per document
//! - `docstore_doclen.bin`: one u32 token count per document
//!
//! All three files are appended in document order while the corpus streams
//! by, so the writer holds no per-document state.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use super::codec::{read_len_prefixed, write_len_prefixed, write_u32_le, write_u64_le, CountingWriter};
use super::files;
use super::types::{DocNo, DocRecord};
use crate::error::{IndexError, Result};

/// Totals produced once the store is complete
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DocStoreSummary {
    pub document_count: u64,
    pub total_tokens: u64,
}

/// Append-only document store writer
pub struct DocStoreWriter {
    data: CountingWriter<BufWriter<File>>,
    offsets: BufWriter<File>,
    lengths: BufWriter<File>,
    summary: DocStoreSummary,
}

impl DocStoreWriter {
    /// Create the three store files inside `dir`, truncating existing ones
    pub fn create(dir: &Path) -> Result<Self> {
        let open = |name: &str| -> Result<BufWriter<File>> {
            Ok(BufWriter::new(File::create(dir.join(name))?))
        };

        Ok(Self {
            data: CountingWriter::new(open(files::DOCSTORE_DATA)?),
            offsets: open(files::DOCSTORE_OFFSETS)?,
            lengths: open(files::DOCSTORE_DOCLEN)?,
            summary: DocStoreSummary::default(),
        })
    }

    /// Append a document and return the number assigned to it
    pub fn append(&mut self, external_id: &str, path: &str, token_count: u32) -> Result<DocNo> {
        let docno = u32::try_from(self.summary.document_count)
            .map(DocNo::new)
            .map_err(|_| IndexError::TooManyDocuments)?;

        let offset = self.data.position();
        write_len_prefixed(&mut self.data, external_id.as_bytes())?;
        write_len_prefixed(&mut self.data, path.as_bytes())?;
        write_u64_le(&mut self.offsets, offset)?;
        write_u32_le(&mut self.lengths, token_count)?;

        self.summary.document_count += 1;
        self.summary.total_tokens += token_count as u64;
        Ok(docno)
    }

    /// Documents appended so far
    pub fn document_count(&self) -> u64 {
        self.summary.document_count
    }

    /// Flush all files and return the totals
    pub fn finish(self) -> Result<DocStoreSummary> {
        self.data.into_inner().flush()?;
        let mut offsets = self.offsets;
        offsets.flush()?;
        let mut lengths = self.lengths;
        lengths.flush()?;
        Ok(self.summary)
    }
}

/// Read-side document store
///
/// Offsets and lengths are resident; records are read from the data file on
/// demand.
pub struct DocStoreReader {
    data: BufReader<File>,
    data_len: u64,
    offsets: Vec<u64>,
    lengths: Vec<u32>,
}

impl DocStoreReader {
    pub fn open(dir: &Path) -> Result<Self> {
        let data_file = File::open(dir.join(files::DOCSTORE_DATA))?;
        let data_len = data_file.metadata()?.len();

        let offsets: Vec<u64> = read_fixed_table(&dir.join(files::DOCSTORE_OFFSETS), 8)?
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
            .collect();
        let lengths: Vec<u32> = read_fixed_table(&dir.join(files::DOCSTORE_DOCLEN), 4)?
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        if offsets.len() != lengths.len() {
            return Err(IndexError::corrupt(format!(
                "docstore has {} offsets but {} lengths",
                offsets.len(),
                lengths.len()
            )));
        }
        if u32::try_from(offsets.len()).is_err() {
            return Err(IndexError::TooManyDocuments);
        }
        if offsets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(IndexError::corrupt("docstore offsets are not increasing"));
        }
        if offsets.last().map_or(false, |&last| last >= data_len) {
            return Err(IndexError::corrupt("docstore offset beyond end of data file"));
        }

        Ok(Self {
            data: BufReader::new(data_file),
            data_len,
            offsets,
            lengths,
        })
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Token count of a document
    pub fn doc_length(&self, docno: DocNo) -> Option<u32> {
        self.lengths.get(docno.as_usize()).copied()
    }

    /// All token counts, indexed by docno
    pub fn doc_lengths(&self) -> &[u32] {
        &self.lengths
    }

    /// Read the stored record of a document
    pub fn get(&mut self, docno: DocNo) -> Result<DocRecord> {
        let offset = *self.offsets.get(docno.as_usize()).ok_or_else(|| {
            IndexError::corrupt(format!("{} is outside the docstore", docno))
        })?;
        debug_assert!(offset < self.data_len);

        self.data.seek(SeekFrom::Start(offset))?;
        let external_id = read_string(&mut self.data, docno)?;
        let path = read_string(&mut self.data, docno)?;
        Ok(DocRecord { external_id, path })
    }
}

fn read_fixed_table(path: &Path, width: usize) -> Result<Vec<u8>> {
    let bytes = fs::read(path)?;
    if bytes.len() % width != 0 {
        return Err(IndexError::corrupt(format!(
            "{} is {} bytes, not a multiple of {}",
            path.display(),
            bytes.len(),
            width
        )));
    }
    Ok(bytes)
}

fn read_string(data: &mut BufReader<File>, docno: DocNo) -> Result<String> {
    let bytes = read_len_prefixed(data).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::InvalidData => {
            IndexError::corrupt(format!("truncated docstore record for {}", docno))
        }
        _ => IndexError::Io(e),
    })?;
    String::from_utf8(bytes)
        .map_err(|_| IndexError::corrupt(format!("docstore record for {} is not UTF-8", docno)))
}
