use sha2::{Digest, Sha256};

/// Local file name for a downloaded result.
///
/// Prefers the `Content-Disposition` filename, then the last path segment of
/// the url, and falls back to `download--{short_hash(url)}`. The result is
/// safe on every platform.
pub fn download_filename(url: &str, content_disposition: Option<&str>) -> String {
    let candidate = content_disposition
        .and_then(disposition_filename)
        .or_else(|| last_segment(url));
    match candidate.map(|name| sanitize(&name)) {
        Some(name) if !name.is_empty() => name,
        _ => format!("download--{}", short_hash(url)),
    }
}

fn disposition_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("filename")
                .then(|| value.trim().trim_matches('"').to_string())
        })
        .filter(|name| !name.is_empty())
}

fn last_segment(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .next()
        .map(str::to_string)
        .filter(|segment| !segment.is_empty())
}

fn sanitize(input: &str) -> String {
    // Keep only the final component of anything path-like.
    let base = input.rsplit(['/', '\\']).next().unwrap_or(input);
    let cleaned: String = base
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let mut cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.len() > 120 {
        let mut end = 120;
        while !cleaned.is_char_boundary(end) {
            end -= 1;
        }
        cleaned.truncate(end);
    }
    let stem_len = cleaned.find('.').unwrap_or(cleaned.len());
    if is_reserved_windows_name(&cleaned[..stem_len]) {
        cleaned.insert(stem_len, '_');
    }
    cleaned
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
