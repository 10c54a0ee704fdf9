//! Property-based tests for URL building and multipart encoding

use courier_http::{ApiVersion, EndpointDescriptor, MultipartSpec};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}"
}

fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..4).prop_map(|segments| segments.join("/"))
}

/// Property: the URL is base + `/api/{tag}/` + path (or base + `/` + path when
/// unversioned), with no doubled or missing slashes, whatever slashes the
/// caller put at the seams.
#[test]
fn prop_versioned_url_concatenation() {
    proptest!(|(
        host in segment(),
        trailing_slash in any::<bool>(),
        path in path_strategy(),
        leading_slash in any::<bool>(),
        tag in prop::option::of("v[0-9]{1,2}"),
    )| {
        let base = format!("https://{host}.example.com{}", if trailing_slash { "/" } else { "" });
        let raw_path = format!("{}{path}", if leading_slash { "/" } else { "" });
        let version = match &tag {
            Some(tag) => ApiVersion::new(tag.clone()),
            None => ApiVersion::unversioned(),
        };

        let url = EndpointDescriptor::get(base, raw_path)
            .with_version(version)
            .url()
            .unwrap();

        let expected = match tag {
            Some(tag) => format!("https://{host}.example.com/api/{tag}/{path}"),
            None => format!("https://{host}.example.com/{path}"),
        };
        prop_assert_eq!(url.as_str(), expected);
    });
}

/// Property: a single query parameter is appended as `?key=value`; none
/// leaves the URL without a query component.
#[test]
fn prop_query_parameter_rendering() {
    proptest!(|(
        path in path_strategy(),
        param in prop::option::of(("[a-z]{1,8}", "[a-zA-Z0-9]{1,12}")),
    )| {
        let mut endpoint = EndpointDescriptor::get("https://api.example.com", path.clone());
        if let Some((key, value)) = &param {
            endpoint = endpoint.with_query(key.clone(), value);
        }
        let url = endpoint.url().unwrap();

        let base = format!("https://api.example.com/api/v1/{path}");
        match param {
            Some((key, value)) => prop_assert_eq!(url.as_str(), format!("{base}?{key}={value}")),
            None => {
                prop_assert_eq!(url.as_str(), base);
                prop_assert!(url.query().is_none());
            }
        }
    });
}

/// Property: every encoded body opens with the first delimiter, closes with
/// the terminator, carries the file bytes verbatim in exactly one file part
/// and is exactly `encoded_len` bytes long.
#[test]
fn prop_multipart_framing() {
    proptest!(|(
        boundary in "[A-Za-z0-9]{8,32}",
        file_bytes in prop::collection::vec(any::<u8>(), 0..2048),
        file_name in "[a-z]{1,10}\\.(png|jpg|bin)",
        fields in prop::collection::vec(("[a-z]{1,8}", "[a-zA-Z0-9 ]{0,16}"), 0..5),
    )| {
        let mut spec = MultipartSpec::new(file_bytes.clone(), file_name.clone(), "application/octet-stream")
            .with_boundary(boundary.clone());
        for (name, value) in &fields {
            spec = spec.field(name.clone(), value.clone());
        }
        let body = spec.encode();

        prop_assert_eq!(body.len(), spec.encoded_len());
        let opening = format!("--{boundary}\r\n");
        prop_assert!(body.starts_with(opening.as_bytes()));

        let suffix = format!("\r\n--{boundary}--\r\n");
        prop_assert!(body.ends_with(suffix.as_bytes()));

        let file_header = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        );
        let file_start = body.len() - suffix.len() - file_bytes.len();
        prop_assert_eq!(&body[file_start..body.len() - suffix.len()], file_bytes.as_slice());
        prop_assert!(body[..file_start].ends_with(file_header.as_bytes()));

        // Only the file part carries a filename
        let text = String::from_utf8_lossy(&body[..file_start]);
        prop_assert_eq!(text.matches("filename=").count(), 1);
        prop_assert_eq!(text.matches("Content-Disposition: form-data; name=").count(), fields.len() + 1);
    });
}
