use std::collections::{BTreeMap, HashSet};

use crate::Request;

/// Polynomial string hash over UTF-16 code units with multiplier 31
fn string_hash(value: &str) -> i32 {
    value
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as i32))
}

/// Order-independent digest of every header not named in `exclude`
fn headers_hash(request: &Request, exclude: &HashSet<String>) -> i32 {
    let sorted: BTreeMap<&str, &[String]> = request
        .headers()
        .iter()
        .filter(|(name, _)| !exclude.contains(*name))
        .collect();

    sorted.into_iter().fold(0i32, |hash, (name, values)| {
        let entry = format!("{name}={}", values.join(","));
        hash.wrapping_mul(31).wrapping_add(string_hash(&entry))
    })
}

/// Identity used to group coalescable requests: `METHOD:url|h=<digest>`.
///
/// Header names are matched against `exclude` case-sensitively, and the order
/// headers were added in does not matter. The body is not part of the key.
pub fn request_key(request: &Request, exclude: &HashSet<String>) -> String {
    format!(
        "{}:{}|h={}",
        request.method(),
        request.url(),
        headers_hash(request, exclude)
    )
}
