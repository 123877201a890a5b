//! Body-text normalization shared by every write path.
//!
//! One rule set, applied on import, live tracking and direct edits alike:
//! HTML stripped with line breaks preserved, blank runs collapsed, per-line
//! whitespace trimmed, list bullets unified.

use crate::models::{ImageOrigin, ReviewImage};
use regex::Regex;
use std::sync::OnceLock;

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex"))
}

static RE_BR: OnceLock<Regex> = OnceLock::new();
static RE_P_CLOSE: OnceLock<Regex> = OnceLock::new();
static RE_TAG: OnceLock<Regex> = OnceLock::new();
static RE_BLANK_RUN: OnceLock<Regex> = OnceLock::new();
static RE_SPACE_RUN: OnceLock<Regex> = OnceLock::new();
static RE_BULLET: OnceLock<Regex> = OnceLock::new();
static RE_IMG: OnceLock<Regex> = OnceLock::new();

pub fn normalize_body(raw: &str) -> String {
    // <br> 与 </p> 都视为换行，其余标签直接剥掉
    let text = re(&RE_BR, r"(?i)<br\s*/?>").replace_all(raw, "\n");
    let text = re(&RE_P_CLOSE, r"(?i)</p\s*>").replace_all(&text, "\n");
    let text = re(&RE_TAG, r"<[^>]*>").replace_all(&text, "");

    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    // 3 个以上连续空行压成 2 个
    let text = re(&RE_BLANK_RUN, r"\n{3,}").replace_all(&text, "\n\n");

    let lines: Vec<String> = text
        .split('\n')
        .map(|line| {
            let line = line.trim();
            re(&RE_SPACE_RUN, r"[ \t]{2,}").replace_all(line, " ").into_owned()
        })
        .collect();
    let text = lines.join("\n");

    // Unify leading list bullets so exports render consistently
    let text = re(&RE_BULLET, r"\n\s*[-–*•]\s+").replace_all(&text, "\n– ");

    text.trim().to_string()
}

/// Scans the *raw* (pre-strip) body for embedded `<img>` tags. Runs before
/// `normalize_body`, which would otherwise have erased them.
pub fn detect_embedded_images(raw: &str) -> Vec<ReviewImage> {
    re(&RE_IMG, r#"(?i)<img[^>]+src=['"]([^'"]+)['"][^>]*>"#)
        .captures_iter(raw)
        .map(|cap| ReviewImage {
            url: cap[1].to_string(),
            origin: ImageOrigin::Embedded,
        })
        .collect()
}
