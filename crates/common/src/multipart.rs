//! `multipart/form-data` encoding for sample uploads.
//!
//! The appliance expects a single file part per upload, so only that shape is
//! supported.

use uuid::Uuid;

use crate::transport::RequestBody;

/// Encode one file part under `field_name`.
pub fn file_part(field_name: &str, file_name: &str, contents: &[u8]) -> RequestBody {
    let boundary = format!("------------------------{}", Uuid::new_v4().simple());
    file_part_with_boundary(&boundary, field_name, file_name, contents)
}

pub(crate) fn file_part_with_boundary(
    boundary: &str,
    field_name: &str,
    file_name: &str,
    contents: &[u8],
) -> RequestBody {
    let mut bytes = Vec::with_capacity(contents.len() + 256);
    bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    bytes.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            escape_quoted(field_name),
            escape_quoted(file_name)
        )
        .as_bytes(),
    );
    bytes.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    bytes.extend_from_slice(contents);
    bytes.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    RequestBody {
        content_type: format!("multipart/form-data; boundary={boundary}"),
        bytes,
    }
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_part_layout() {
        let body = file_part_with_boundary("XYZ", "uploadsample", "sample.exe", b"MZ\x90\x00");

        assert_eq!(body.content_type, "multipart/form-data; boundary=XYZ");
        let mut expected = Vec::new();
        expected.extend_from_slice(b"--XYZ\r\n");
        expected.extend_from_slice(
            b"Content-Disposition: form-data; name=\"uploadsample\"; filename=\"sample.exe\"\r\n",
        );
        expected.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        expected.extend_from_slice(b"MZ\x90\x00");
        expected.extend_from_slice(b"\r\n--XYZ--\r\n");
        assert_eq!(body.bytes, expected);
    }

    #[test]
    fn test_file_name_is_escaped() {
        let body = file_part_with_boundary("B", "f", "a\"b\r\n.txt", b"");
        let text = String::from_utf8(body.bytes).expect("ascii body");
        assert!(text.contains("filename=\"a\\\"b  .txt\""));
    }

    #[test]
    fn test_boundaries_are_unique() {
        let a = file_part("f", "x", b"1");
        let b = file_part("f", "x", b"1");
        assert_ne!(a.content_type, b.content_type);
    }
}
