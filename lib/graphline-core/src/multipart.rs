//! Multipart form data for requests carrying uploads.
//!
//! [`MultipartBuilder`] turns a [`Params`] mapping holding scalar values and
//! [`UploadableValue`](crate::UploadableValue)s into a `multipart/form-data`
//! body. Parts are emitted in key order. Upload parts carry a filename and a
//! `Content-Type`; scalar parts carry neither and hold the same text the
//! query-string encoder would produce.
//!
//! # Example
//!
//! ```
//! use graphline_core::{MultipartBuilder, Params, UploadableValue};
//!
//! let params = Params::new()
//!     .with("message", "Look at this")
//!     .with("source", UploadableValue::from_bytes(vec![0xFF, 0xD8]).with_filename("cat.jpg"));
//!
//! let multipart = MultipartBuilder::new().build(params).expect("multipart");
//! assert!(multipart.content_type().starts_with("multipart/form-data; boundary="));
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::{ContentType, Error, ParamValue, Params, Result};

const BOUNDARY_PREFIX: &str = "----GraphlineBoundary";

/// A single encoded part.
#[derive(Debug, Clone)]
struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl Part {
    fn from_param(name: String, value: ParamValue) -> Result<Self> {
        match value {
            ParamValue::Upload(upload) => {
                let filename = upload.filename().to_string();
                let content_type = upload.content_type().to_string();
                Ok(Self {
                    name,
                    filename: Some(filename),
                    content_type: Some(content_type),
                    data: upload.read_to_bytes()?,
                })
            }
            scalar => Ok(Self {
                name,
                filename: None,
                content_type: None,
                data: Bytes::from(scalar.to_text()?),
            }),
        }
    }
}

/// An encoded multipart body with its boundary.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    body: Bytes,
}

impl MultipartBody {
    /// The boundary shared by every part and the closing delimiter.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// `Content-Type` header value: `multipart/form-data; boundary=<boundary>`.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("{}; boundary={}", ContentType::FormData, self.boundary)
    }

    /// Encoded body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume into (content-type header value, body bytes).
    #[must_use]
    pub fn into_parts(self) -> (String, Bytes) {
        let content_type = self.content_type();
        (content_type, self.body)
    }
}

/// Builds `multipart/form-data` bodies from parameter mappings.
#[derive(Debug, Clone, Default)]
pub struct MultipartBuilder {
    boundary: Option<String>,
}

impl MultipartBuilder {
    /// A builder that draws a fresh random boundary for every body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed boundary instead of a random one.
    ///
    /// Building fails if the boundary occurs inside any part.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: Some(boundary.into()),
        }
    }

    /// Encode the mapping.
    ///
    /// Uploads are read to the end here, so a stream failure surfaces before
    /// anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if an upload cannot be fully read, or if a
    /// fixed boundary collides with part content.
    pub fn build(self, params: Params) -> Result<MultipartBody> {
        let parts = params
            .into_iter()
            .map(|(name, value)| Part::from_param(name, value))
            .collect::<Result<Vec<_>>>()?;

        let boundary = match self.boundary {
            Some(boundary) if boundary.is_empty() => {
                return Err(Error::encoding("multipart boundary must not be empty"));
            }
            Some(boundary) if collides(&boundary, &parts) => {
                return Err(Error::encoding(format!(
                    "multipart boundary '{boundary}' occurs in part content"
                )));
            }
            Some(boundary) => boundary,
            None => loop {
                let candidate = generate_boundary();
                if !collides(&candidate, &parts) {
                    break candidate;
                }
            },
        };

        let body = encode(&boundary, &parts);
        Ok(MultipartBody { boundary, body })
    }
}

fn encode(boundary: &str, parts: &[Part]) -> Bytes {
    let mut buf = BytesMut::new();

    for part in parts {
        buf.put_slice(b"--");
        buf.put_slice(boundary.as_bytes());
        buf.put_slice(b"\r\n");

        buf.put_slice(b"Content-Disposition: form-data; name=\"");
        buf.put_slice(escape_quoted(&part.name).as_bytes());
        buf.put_slice(b"\"");
        if let Some(filename) = &part.filename {
            buf.put_slice(b"; filename=\"");
            buf.put_slice(escape_quoted(filename).as_bytes());
            buf.put_slice(b"\"");
        }
        buf.put_slice(b"\r\n");

        if let Some(content_type) = &part.content_type {
            buf.put_slice(b"Content-Type: ");
            buf.put_slice(content_type.as_bytes());
            buf.put_slice(b"\r\n");
        }

        buf.put_slice(b"\r\n");
        buf.put_slice(&part.data);
        buf.put_slice(b"\r\n");
    }

    buf.put_slice(b"--");
    buf.put_slice(boundary.as_bytes());
    buf.put_slice(b"--\r\n");

    buf.freeze()
}

/// Percent-escape the characters that would break a quoted header parameter.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn collides(boundary: &str, parts: &[Part]) -> bool {
    let needle = boundary.as_bytes();
    parts
        .iter()
        .any(|part| part.data.windows(needle.len()).any(|window| window == needle))
}

fn generate_boundary() -> String {
    format!("{BOUNDARY_PREFIX}{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::UploadableValue;

    fn body_str(multipart: &MultipartBody) -> String {
        String::from_utf8_lossy(multipart.body()).into_owned()
    }

    #[test]
    fn scalar_and_upload_parts() {
        let params = Params::new()
            .with("message", "hello")
            .with(
                "source",
                UploadableValue::from_bytes("PNGDATA").with_filename("cat.png"),
            );

        let multipart = MultipartBuilder::with_boundary("XyZ").build(params).expect("build");

        let rendered = body_str(&multipart)
            .replace("\r\n", "\\r\\n\n")
            .trim_end()
            .to_string();

        insta::assert_snapshot!(rendered, @r#"
        --XyZ\r\n
        Content-Disposition: form-data; name="message"\r\n
        \r\n
        hello\r\n
        --XyZ\r\n
        Content-Disposition: form-data; name="source"; filename="cat.png"\r\n
        Content-Type: image/png\r\n
        \r\n
        PNGDATA\r\n
        --XyZ--\r\n
        "#);
    }

    #[test]
    fn two_parts_share_one_boundary() {
        let params = Params::new()
            .with("caption", "sunset")
            .with("file", UploadableValue::from_bytes("bytes"));

        let multipart = MultipartBuilder::new().build(params).expect("build");
        let body = body_str(&multipart);
        let delimiter = format!("--{}\r\n", multipart.boundary());

        assert_eq!(body.matches(&delimiter).count(), 2);
        assert!(body.ends_with(&format!("--{}--\r\n", multipart.boundary())));
        assert_eq!(body.matches("Content-Type:").count(), 1);
        assert!(body.contains("name=\"caption\"\r\n\r\nsunset\r\n"));
        assert!(body.contains("Content-Type: application/octet-stream\r\n\r\nbytes\r\n"));
    }

    #[test]
    fn scalar_parts_use_json_text_for_non_strings() {
        let params = Params::new()
            .with("count", 3)
            .with("published", false)
            .with("tags", json!(["a", "b"]));

        let multipart = MultipartBuilder::with_boundary("b0").build(params).expect("build");
        let body = body_str(&multipart);

        assert!(body.contains("name=\"count\"\r\n\r\n3\r\n"));
        assert!(body.contains("name=\"published\"\r\n\r\nfalse\r\n"));
        assert!(body.contains("name=\"tags\"\r\n\r\n[\"a\",\"b\"]\r\n"));
    }

    #[test]
    fn identical_uploads_become_distinct_parts() {
        let params = Params::new()
            .with("first", UploadableValue::from_bytes("same"))
            .with("second", UploadableValue::from_bytes("same"));

        let multipart = MultipartBuilder::new().build(params).expect("build");
        assert_eq!(body_str(&multipart).matches("filename=").count(), 2);
    }

    #[test]
    fn fresh_boundary_per_build() {
        let first = MultipartBuilder::new().build(Params::new().with("a", "1")).expect("build");
        let second = MultipartBuilder::new().build(Params::new().with("a", "1")).expect("build");

        assert!(first.boundary().starts_with(BOUNDARY_PREFIX));
        assert_ne!(first.boundary(), second.boundary());
        assert_eq!(
            first.content_type(),
            format!("multipart/form-data; boundary={}", first.boundary())
        );
    }

    #[test]
    fn colliding_fixed_boundary_is_rejected() {
        let params = Params::new().with("text", "contains --edge inside");
        let err = MultipartBuilder::with_boundary("edge").build(params).expect_err("collision");
        assert!(err.is_encoding());
    }

    #[test]
    fn unreadable_upload_is_encoding_error() {
        struct Broken;
        impl std::io::Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk gone"))
            }
        }

        let params = Params::new().with("source", UploadableValue::from_reader(Broken));
        let err = MultipartBuilder::new().build(params).expect_err("read failure");
        assert!(err.is_encoding());
    }

    #[test]
    fn quotes_in_names_are_escaped() {
        let params = Params::new().with(
            "file",
            UploadableValue::from_bytes("x").with_filename("a\"b.txt"),
        );
        let multipart = MultipartBuilder::with_boundary("q").build(params).expect("build");
        assert!(body_str(&multipart).contains("filename=\"a%22b.txt\""));
    }

    #[test]
    fn empty_mapping_yields_closing_delimiter_only() {
        let multipart = MultipartBuilder::with_boundary("e").build(Params::new()).expect("build");
        assert_eq!(multipart.body().as_ref(), b"--e--\r\n");
    }
}
