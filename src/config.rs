//! 실행 설정 모듈
//!
//! 대화형 입력(폴더 경로, 예/아니오 질문)은 `main`에서 한 번에 해석되어
//! 여기의 설정 구조체로 넘어옵니다. 핵심 로직은 표준 입력을 읽지 않습니다.

use std::path::PathBuf;
use std::time::Duration;

use crate::candidates::{DEFAULT_CANDIDATE_LIST, DEFAULT_FAILURE_LIST};
use crate::error::{MislabelError, Result};
use crate::pattern::DEFAULT_PATTERN;
use crate::probe::DEFAULT_EXPECTED_FORMAT;
use crate::transcode::DEFAULT_CODEC;

/// 기본 워커 수
pub const DEFAULT_POOL_SIZE: usize = 4;

/// 기본 임시 폴더 이름 (시스템 임시 폴더 아래)
pub const DEFAULT_SCRATCH_DIR: &str = "mislabel-scratch";

/// 스캔 단계 설정
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// 검사할 최상위 폴더 (하위 폴더 포함)
    pub root: PathBuf,
    /// 파일 이름 패턴 (예: `*.mp3`)
    pub pattern: String,
    /// 기대하는 논리적 포맷
    pub expected_format: String,
    /// 후보 목록 파일
    pub list_path: PathBuf,
    /// 이전 결과 삭제 여부
    pub clear_prior_results: bool,
    /// 최대 폴더 탐색 깊이
    pub max_depth: Option<usize>,
}

impl ScanConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pattern: DEFAULT_PATTERN.to_string(),
            expected_format: DEFAULT_EXPECTED_FORMAT.to_string(),
            list_path: PathBuf::from(DEFAULT_CANDIDATE_LIST),
            clear_prior_results: false,
            max_depth: None,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_expected_format(mut self, format: impl Into<String>) -> Self {
        self.expected_format = format.into();
        self
    }

    pub fn with_list_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.list_path = path.into();
        self
    }

    pub fn with_clear_prior_results(mut self, clear: bool) -> Self {
        self.clear_prior_results = clear;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// 변환 단계 설정
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// 후보 목록 파일 (스캔 단계 결과)
    pub list_path: PathBuf,
    /// 실패 목록 파일 (매 실행마다 덮어씀)
    pub failure_path: PathBuf,
    /// 실행 단위 임시 폴더 루트
    pub scratch_root: PathBuf,
    /// 동시 워커 수
    pub pool_size: usize,
    /// 누락 파일이 있어도 나머지를 진행할지 여부
    pub proceed_despite_missing: bool,
    /// 파일 하나당 변환 제한 시간 (None이면 무제한)
    pub timeout: Option<Duration>,
    /// 목표 코덱
    pub codec: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            list_path: PathBuf::from(DEFAULT_CANDIDATE_LIST),
            failure_path: PathBuf::from(DEFAULT_FAILURE_LIST),
            // 프로세스마다 다른 폴더
            scratch_root: std::env::temp_dir()
                .join(format!("{DEFAULT_SCRATCH_DIR}-{}", std::process::id())),
            pool_size: DEFAULT_POOL_SIZE,
            proceed_despite_missing: true,
            timeout: None,
            codec: DEFAULT_CODEC.to_string(),
        }
    }
}

impl ConvertConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.list_path = path.into();
        self
    }

    pub fn with_failure_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.failure_path = path.into();
        self
    }

    pub fn with_scratch_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.scratch_root = path.into();
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_proceed_despite_missing(mut self, proceed: bool) -> Self {
        self.proceed_despite_missing = proceed;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }

    /// 설정 유효성 검사
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(MislabelError::InvalidPoolSize);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_defaults() {
        let config = ConvertConfig::new();
        assert_eq!(config.pool_size, 4);
        assert!(config.proceed_despite_missing);
        assert!(config.timeout.is_none());
        assert_eq!(config.list_path, PathBuf::from("missing-mp3-files.txt"));
        let scratch_name = config.scratch_root.file_name().unwrap().to_string_lossy();
        assert_eq!(
            scratch_name,
            format!("{DEFAULT_SCRATCH_DIR}-{}", std::process::id())
        );
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let config = ConvertConfig::new().with_pool_size(0);
        assert!(matches!(
            config.validate(),
            Err(MislabelError::InvalidPoolSize)
        ));
        assert!(ConvertConfig::new().with_pool_size(1).validate().is_ok());
    }

    #[test]
    fn test_scan_builder() {
        let config = ScanConfig::new("/music")
            .with_pattern("*.MP3")
            .with_expected_format("mp3")
            .with_clear_prior_results(true)
            .with_max_depth(Some(3));

        assert_eq!(config.root, PathBuf::from("/music"));
        assert_eq!(config.pattern, "*.MP3");
        assert!(config.clear_prior_results);
        assert_eq!(config.max_depth, Some(3));
    }
}
