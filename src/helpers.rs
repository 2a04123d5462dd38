use crate::constants::SUPPORTED_METHODS;
use http::Method;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::str::Utf8Error;

pub(crate) fn is_supported_method(method: &Method) -> bool {
    SUPPORTED_METHODS.contains(method)
}

pub(crate) fn percent_decode_request_path(val: &str) -> Result<Cow<'_, str>, Utf8Error> {
    percent_decode_str(val).decode_utf8()
}

/// Joins a group's base path with a relative route path.
///
/// The result is cleaned, and it keeps a trailing slash only when `relative` ends with one.
pub(crate) fn join_paths(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_owned();
    }

    let mut joined = clean_path(&format!("{}/{}", base, relative));
    if relative.ends_with('/') && !joined.ends_with('/') {
        joined.push('/');
    }
    joined
}

/// Returns the canonical form of `path`: a single leading slash, no empty,
/// `.` or `..` elements, and no trailing slash unless the result is `/`.
pub(crate) fn clean_path(path: &str) -> String {
    let mut elems: Vec<&str> = Vec::new();
    for elem in path.split('/') {
        match elem {
            "" | "." => {}
            ".." => {
                elems.pop();
            }
            _ => elems.push(elem),
        }
    }

    if elems.is_empty() {
        return "/".to_owned();
    }

    let mut cleaned = String::with_capacity(path.len() + 1);
    for elem in elems {
        cleaned.push('/');
        cleaned.push_str(elem);
    }
    cleaned
}
