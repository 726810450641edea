#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Helpers for turning a `$ref` string into the name of a schema held by a
//! `SchemaDocument`, with respect to the document's `$self` URI.
//!
//! These never fetch external documents: absolute or relative references are
//! only treated as local when their document part matches `$self`.

use percent_encoding::percent_decode_str;
use std::path::Path;
use url::Url;

/// Pointer prefixes under which named schemas live.
const SCHEMA_SECTIONS: [&[&str]; 2] = [&["components", "schemas"], &["definitions"]];

/// Extracts the schema name a reference points to.
///
/// Accepts:
/// - `#/components/schemas/{name}` (OAS 3.x)
/// - `#/definitions/{name}` (Swagger 2.0)
/// - a bare `{name}`
/// - `{document}#/components/schemas/{name}` when `{document}` matches `self_uri`
///
/// Returns `None` for external references and unsupported pointers.
pub(crate) fn schema_name_from_ref(ref_str: &str, self_uri: Option<&str>) -> Option<String> {
    if !ref_str.contains('#') && !ref_str.contains('/') {
        return (!ref_str.is_empty()).then(|| ref_str.to_string());
    }

    let pointer = local_pointer(ref_str, self_uri)?;
    let segments: Vec<&str> = pointer
        .trim_start_matches('#')
        .trim_start_matches('/')
        .split('/')
        .collect();

    for section in SCHEMA_SECTIONS {
        if segments.len() == section.len() + 1 && segments[..section.len()] == *section {
            let name = decode_pointer_segment(segments[section.len()]);
            return (!name.is_empty()).then_some(name);
        }
    }
    None
}

/// Returns the fragment of `ref_str` when it targets the current document.
fn local_pointer(ref_str: &str, self_uri: Option<&str>) -> Option<String> {
    if ref_str.starts_with('#') {
        return Some(ref_str.to_string());
    }

    let (document, fragment) = ref_str.split_once('#')?;
    let self_uri = self_uri?;
    ref_doc_matches_self(document, self_uri).then(|| format!("#{}", fragment))
}

/// Decodes a JSON Pointer segment (handles `~1`, `~0` and percent-encoding).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

fn ref_doc_matches_self(ref_doc: &str, self_uri: &str) -> bool {
    if ref_doc == self_uri {
        return true;
    }

    if let (Ok(ref_url), Ok(self_url)) = (Url::parse(ref_doc), Url::parse(self_uri)) {
        return ref_url.scheme() == self_url.scheme()
            && ref_url.host() == self_url.host()
            && ref_url.port() == self_url.port()
            && ref_url.path() == self_url.path();
    }

    // `$self` given as an absolute path (e.g. "/api/openapi.yaml").
    if self_uri.starts_with('/') {
        if let Ok(ref_url) = Url::parse(ref_doc) {
            return ref_url.path() == self_uri;
        }
    }

    if !self_uri.contains("://") && !ref_doc.contains("://") {
        return Path::new(ref_doc) == Path::new(self_uri);
    }

    false
}
