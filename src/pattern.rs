//! 패턴 매칭 모듈
//!
//! glob 패턴을 사용한 파일 이름 필터링을 담당합니다.
//! 확장자 대소문자는 구분하지 않습니다 (`song.MP3`도 `*.mp3`에 매칭).

use glob::{MatchOptions, Pattern};

use crate::error::{MislabelError, Result};

/// 기본 파일 이름 패턴
pub const DEFAULT_PATTERN: &str = "*.mp3";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// 컴파일된 패턴 매처
pub struct PatternMatcher {
    source: String,
    pattern: Pattern,
}

impl PatternMatcher {
    /// 새 패턴 매처 생성
    ///
    /// # Arguments
    /// * `pattern` - 글로브 패턴 문자열 (예: `*.mp3`)
    ///
    /// # Examples
    /// ```
    /// use mislabel::pattern::PatternMatcher;
    ///
    /// let matcher = PatternMatcher::new("*.mp3").unwrap();
    /// assert!(matcher.matches("song.mp3"));
    /// assert!(matcher.matches("SONG.MP3"));
    /// assert!(!matcher.matches("song.flac"));
    /// ```
    pub fn new(pattern: &str) -> Result<Self> {
        let compiled = Pattern::new(pattern).map_err(|_| MislabelError::InvalidPattern {
            pattern: pattern.to_string(),
        })?;

        Ok(Self {
            source: pattern.to_string(),
            pattern: compiled,
        })
    }

    /// 파일 이름이 패턴과 일치하는지 확인
    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.matches_with(file_name, MATCH_OPTIONS)
    }

    /// 원본 패턴 문자열
    pub fn as_str(&self) -> &str {
        &self.source
    }
}
