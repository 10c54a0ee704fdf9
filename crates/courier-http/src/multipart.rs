//! multipart/form-data body encoding
//!
//! Bodies are fully buffered. The boundary is never checked against field
//! values or file content; picking a collision-free boundary is up to the
//! caller (the default is a random UUID).

use uuid::Uuid;

const CRLF: &[u8] = b"\r\n";

/// Form fields plus exactly one file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartSpec {
    pub boundary: String,
    pub file_bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
    /// Emitted in insertion order
    pub fields: Vec<(String, String)>,
}

impl MultipartSpec {
    /// New spec with a fresh random boundary and no extra fields
    pub fn new(
        file_bytes: impl Into<Vec<u8>>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            boundary: format!("Boundary-{}", Uuid::new_v4()),
            file_bytes: file_bytes.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    /// Append a text field; duplicates are kept and emitted in order
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Value for the paired `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Exact size of [`encode`](Self::encode)'s output
    pub fn encoded_len(&self) -> usize {
        let delimiter = 2 + self.boundary.len() + CRLF.len();
        let fields: usize = self
            .fields
            .iter()
            .map(|(key, value)| {
                delimiter
                    + field_disposition(key).len()
                    + 2 * CRLF.len()
                    + value.len()
                    + CRLF.len()
            })
            .sum();
        let file = delimiter
            + file_disposition(&self.file_name).len()
            + CRLF.len()
            + format!("Content-Type: {}", self.mime_type).len()
            + 2 * CRLF.len()
            + self.file_bytes.len()
            + CRLF.len();
        let closing = 2 + self.boundary.len() + 2 + CRLF.len();
        fields + file + closing
    }

    /// Serialize into a single body buffer
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(self.encoded_len());

        for (key, value) in &self.fields {
            self.write_delimiter(&mut body);
            body.extend_from_slice(field_disposition(key).as_bytes());
            body.extend_from_slice(CRLF);
            body.extend_from_slice(CRLF);
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(CRLF);
        }

        self.write_delimiter(&mut body);
        body.extend_from_slice(file_disposition(&self.file_name).as_bytes());
        body.extend_from_slice(CRLF);
        body.extend_from_slice(format!("Content-Type: {}", self.mime_type).as_bytes());
        body.extend_from_slice(CRLF);
        body.extend_from_slice(CRLF);
        body.extend_from_slice(&self.file_bytes);
        body.extend_from_slice(CRLF);

        body.extend_from_slice(b"--");
        body.extend_from_slice(self.boundary.as_bytes());
        body.extend_from_slice(b"--");
        body.extend_from_slice(CRLF);

        body
    }

    fn write_delimiter(&self, body: &mut Vec<u8>) {
        body.extend_from_slice(b"--");
        body.extend_from_slice(self.boundary.as_bytes());
        body.extend_from_slice(CRLF);
    }
}

fn field_disposition(name: &str) -> String {
    format!("Content-Disposition: form-data; name=\"{name}\"")
}

fn file_disposition(file_name: &str) -> String {
    format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_layout_with_fields() {
        let spec = MultipartSpec::new(b"PNG".to_vec(), "a.png", "image/png")
            .with_boundary("XyZ")
            .field("caption", "hello")
            .field("album", "7");

        let expected = concat!(
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"caption\"\r\n\r\n",
            "hello\r\n",
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"album\"\r\n\r\n",
            "7\r\n",
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\n",
            "Content-Type: image/png\r\n\r\n",
            "PNG\r\n",
            "--XyZ--\r\n",
        );
        assert_eq!(String::from_utf8(spec.encode()).unwrap(), expected);
    }

    #[test]
    fn test_encoded_len_matches_output() {
        let spec = MultipartSpec::new(vec![0u8, 255, 13, 10], "bin.dat", "application/octet-stream")
            .field("k", "v");
        assert_eq!(spec.encoded_len(), spec.encode().len());

        let bare = MultipartSpec::new(Vec::new(), "", "text/plain");
        assert_eq!(bare.encoded_len(), bare.encode().len());
    }

    #[test]
    fn test_content_type_carries_boundary() {
        let spec = MultipartSpec::new(Vec::new(), "f", "text/plain").with_boundary("abc");
        assert_eq!(spec.content_type(), "multipart/form-data; boundary=abc");
    }

    #[test]
    fn test_fresh_boundaries_differ() {
        let a = MultipartSpec::new(Vec::new(), "f", "text/plain");
        let b = MultipartSpec::new(Vec::new(), "f", "text/plain");
        assert_ne!(a.boundary, b.boundary);
        assert!(a.boundary.starts_with("Boundary-"));
    }

    #[test]
    fn test_binary_file_bytes_are_verbatim() {
        let bytes: Vec<u8> = (0..=255).collect();
        let spec = MultipartSpec::new(bytes.clone(), "all.bin", "application/octet-stream")
            .with_boundary("b");
        let body = spec.encode();
        let header_end = body
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .unwrap()
            + 4;
        assert_eq!(&body[header_end..header_end + bytes.len()], bytes.as_slice());
    }
}
