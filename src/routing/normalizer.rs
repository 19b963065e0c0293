//! 쿼리 정규화
//!
//! 소문자화 → 특수문자 제거 → 공백 압축 → 앞뒤 공백 제거.
//! 모든 스코어 계산기의 입력이 됩니다.

use std::sync::LazyLock;

use regex::Regex;

/// 단어 문자 / 공백 / 한글 음절 이외의 문자
static SPECIAL_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\s가-힣]").expect("special-char regex is valid")
});

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// 쿼리 정규화
///
/// 빈 문자열, 이모지만 있는 입력도 에러 없이 처리하며 결과는 빈 문자열일 수 있습니다.
pub fn normalize_query(query: &str) -> String {
    let lowered = query.to_lowercase();
    let stripped = SPECIAL_CHARS_RE.replace_all(&lowered, " ");
    let collapsed = WHITESPACE_RE.replace_all(&stripped, " ");
    collapsed.trim().to_string()
}

/// 문자 경계를 지키며 앞에서부터 `max_chars` 문자만 남김
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

// ============================================================================
// Tests
// ============================================================================
