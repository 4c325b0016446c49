//! Uploaded-file contract and extension sniffing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Spreadsheet formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Office Open XML workbook.
    Xlsx,
    /// Legacy BIFF workbook.
    Xls,
    /// Comma-separated values.
    Csv,
}

impl FileFormat {
    /// Parse a format from a file extension (case-insensitive, without the leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Infer the format from an upload's file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        file_extension(name).and_then(Self::from_extension)
    }

    /// Whether the format is parsed as a binary/zip workbook (as opposed to delimited text).
    pub fn is_workbook(self) -> bool {
        matches!(self, Self::Xlsx | Self::Xls)
    }
}

/// Extension of the last path component, without the dot.
///
/// A name consisting only of an extension (`".csv"`) still has one; a trailing dot does not.
pub fn file_extension(name: &str) -> Option<&str> {
    let base = Path::new(name).file_name()?.to_str()?;
    let (_, ext) = base.rsplit_once('.')?;
    if ext.is_empty() { None } else { Some(ext) }
}

/// An uploaded file as handed over by the caller.
///
/// The name is only used to derive the extension; bytes are read once per processing call.
pub trait UploadedFile {
    /// Client-supplied file name.
    fn file_name(&self) -> &str;

    /// Size of the upload in bytes. Zero-length uploads are skipped.
    fn len(&self) -> u64;

    /// Load the full contents into memory.
    fn read_bytes(&self) -> io::Result<Vec<u8>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: UploadedFile + ?Sized> UploadedFile for &T {
    fn file_name(&self) -> &str {
        (**self).file_name()
    }

    fn len(&self) -> u64 {
        (**self).len()
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        (**self).read_bytes()
    }
}

impl<T: UploadedFile + ?Sized> UploadedFile for Box<T> {
    fn file_name(&self) -> &str {
        (**self).file_name()
    }

    fn len(&self) -> u64 {
        (**self).len()
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        (**self).read_bytes()
    }
}

/// An upload already held in memory (e.g. a buffered multipart field).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryUpload {
    name: String,
    bytes: Vec<u8>,
}

impl InMemoryUpload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl UploadedFile for InMemoryUpload {
    fn file_name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// An upload spooled to disk. The length is taken from file metadata at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathUpload {
    name: String,
    path: PathBuf,
    len: u64,
}

impl PathUpload {
    /// Use the file's own name as the upload name.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::with_name(name, path)
    }

    /// Spooled uploads usually live under a temp name; keep the client-supplied one.
    pub fn with_name(name: impl Into<String>, path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let len = fs::metadata(&path)?.len();
        Ok(Self {
            name: name.into(),
            path,
            len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UploadedFile for PathUpload {
    fn file_name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

/// `true` if every upload has a `.xlsx`, `.xls` or `.csv` extension (case-insensitive).
///
/// An empty collection is vacuously valid.
pub fn validate_file_types<F: UploadedFile>(files: &[F]) -> bool {
    first_invalid(files).is_none()
}

pub(crate) fn first_invalid<F: UploadedFile>(files: &[F]) -> Option<&F> {
    files
        .iter()
        .find(|f| FileFormat::from_file_name(f.file_name()).is_none())
}
