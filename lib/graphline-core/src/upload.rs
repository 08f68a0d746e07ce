//! Binary payloads destined for a multipart part.
//!
//! An [`UploadableValue`] wraps exactly one payload (a byte buffer, an opened
//! file, or any reader) together with the filename and content type announced
//! in its multipart headers. It is consumed by the multipart builder: reading
//! it twice is not possible.
//!
//! # Example
//!
//! ```
//! use graphline_core::UploadableValue;
//!
//! let photo = UploadableValue::from_bytes(vec![0x89, 0x50, 0x4E, 0x47]).with_filename("cat.png");
//! assert_eq!(photo.content_type(), "image/png");
//! ```

use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use bytes::Bytes;

use crate::{Error, Result};

/// Filename announced for payloads that do not come with one.
pub const DEFAULT_FILENAME: &str = "upload.bin";

enum UploadSource {
    Bytes(Bytes),
    Reader(Box<dyn Read + Send>),
}

/// A single-use binary payload with its multipart metadata.
///
/// Two uploads are never equal, even with identical bytes: every occurrence
/// in a parameter mapping becomes its own multipart part. For that reason the
/// type implements neither `Clone` nor `PartialEq`.
pub struct UploadableValue {
    source: UploadSource,
    filename: String,
    content_type: Option<String>,
}

impl fmt::Debug for UploadableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            UploadSource::Bytes(bytes) => format!("{} bytes", bytes.len()),
            UploadSource::Reader(_) => "reader".to_string(),
        };
        f.debug_struct("UploadableValue")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type())
            .field("source", &source)
            .finish()
    }
}

impl UploadableValue {
    /// Wrap an in-memory buffer.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self {
            source: UploadSource::Bytes(data.into()),
            filename: DEFAULT_FILENAME.to_string(),
            content_type: None,
        }
    }

    /// Wrap an arbitrary reader. It is read to the end once, when the
    /// multipart body is built.
    #[must_use]
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self {
            source: UploadSource::Reader(Box::new(reader)),
            filename: DEFAULT_FILENAME.to_string(),
            content_type: None,
        }
    }

    /// Open a file for upload.
    ///
    /// The file is opened right away so an unreadable path fails here rather
    /// than halfway through building a request. The filename defaults to the
    /// path's last component.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();

        let file =
            File::open(path).map_err(|e| Error::invalid_upload_source(&origin, e.to_string()))?;
        let metadata = file
            .metadata()
            .map_err(|e| Error::invalid_upload_source(&origin, e.to_string()))?;
        if !metadata.is_file() {
            return Err(Error::invalid_upload_source(origin, "not a regular file"));
        }

        let filename = path
            .file_name()
            .map_or_else(|| DEFAULT_FILENAME.to_string(), |name| name.to_string_lossy().into_owned());

        Ok(Self {
            source: UploadSource::Reader(Box::new(file)),
            filename,
            content_type: None,
        })
    }

    /// Set the filename announced in the part headers.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Set the content type explicitly instead of guessing it from the filename.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Content type of the part: the explicit one, or a guess from the filename.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or_else(|| guess_content_type(&self.filename))
    }

    /// Filename of the part.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Open the payload as a byte stream, consuming the upload.
    #[must_use]
    pub fn open_stream(self) -> Box<dyn Read + Send> {
        match self.source {
            UploadSource::Bytes(bytes) => Box::new(Cursor::new(bytes)),
            UploadSource::Reader(reader) => reader,
        }
    }

    /// Read the whole payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the stream fails before its end.
    pub fn read_to_bytes(self) -> Result<Bytes> {
        if let UploadSource::Bytes(bytes) = self.source {
            return Ok(bytes);
        }

        let filename = self.filename.clone();
        let mut buf = Vec::new();
        self.open_stream()
            .read_to_end(&mut buf)
            .map_err(|e| Error::encoding(format!("failed to read upload '{filename}': {e}")))?;
        Ok(Bytes::from(buf))
    }
}

/// Guess a content type from a filename extension.
///
/// Unknown extensions map to `application/octet-stream`.
#[must_use]
pub fn guess_content_type(filename: &str) -> &'static str {
    let Some((_, extension)) = filename.rsplit_once('.') else {
        return "application/octet-stream";
    };

    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "wmv" => "video/x-ms-wmv",
        "3gp" => "video/3gpp",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use assert2::{check, let_assert};

    use super::*;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }
    }

    #[test]
    fn bytes_upload_defaults() {
        let upload = UploadableValue::from_bytes(vec![1, 2, 3]);
        assert_eq!(upload.filename(), DEFAULT_FILENAME);
        assert_eq!(upload.content_type(), "application/octet-stream");
        assert_eq!(upload.read_to_bytes().expect("bytes").as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn content_type_follows_filename_unless_explicit() {
        let upload = UploadableValue::from_bytes("x").with_filename("clip.MOV");
        assert_eq!(upload.content_type(), "video/quicktime");

        let upload = UploadableValue::from_bytes("x")
            .with_filename("clip.mov")
            .with_content_type("application/x-custom");
        assert_eq!(upload.content_type(), "application/x-custom");
    }

    #[test]
    fn path_upload_reads_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".jpg")
            .tempfile()
            .expect("tempfile");
        file.write_all(b"\xFF\xD8\xFF").expect("write");

        let upload = UploadableValue::from_path(file.path()).expect("upload");
        let expected_name = file
            .path()
            .file_name()
            .expect("file name")
            .to_string_lossy()
            .into_owned();
        assert_eq!(upload.filename(), expected_name);
        assert_eq!(upload.content_type(), "image/jpeg");
        assert_eq!(
            upload.read_to_bytes().expect("bytes").as_ref(),
            b"\xFF\xD8\xFF"
        );
    }

    #[test]
    fn missing_path_is_invalid_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.png");
        let result = UploadableValue::from_path(&missing);

        let_assert!(Err(Error::InvalidUploadSource { origin, .. }) = result);
        check!(origin == missing.display().to_string());
    }

    #[test]
    fn directory_is_invalid_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = UploadableValue::from_path(dir.path()).expect_err("should fail");
        assert!(err.is_invalid_upload_source());
        assert!(err.to_string().contains("not a regular file"));
    }

    #[test]
    fn failing_reader_is_encoding_error() {
        let upload = UploadableValue::from_reader(FailingReader).with_filename("broken.bin");
        let err = upload.read_to_bytes().expect_err("should fail");
        assert!(err.is_encoding());
        assert!(err.to_string().contains("broken.bin"));
    }

    #[test]
    fn open_stream_yields_payload() {
        let mut stream = UploadableValue::from_bytes("hello").open_stream();
        let mut out = String::new();
        stream.read_to_string(&mut out).expect("read");
        assert_eq!(out, "hello");
    }

    #[test]
    fn guess_content_type_common() {
        assert_eq!(guess_content_type("photo.jpeg"), "image/jpeg");
        assert_eq!(guess_content_type("PHOTO.PNG"), "image/png");
        assert_eq!(guess_content_type("movie.mp4"), "video/mp4");
        assert_eq!(guess_content_type("README"), "application/octet-stream");
        assert_eq!(guess_content_type("data.xyz"), "application/octet-stream");
    }
}
