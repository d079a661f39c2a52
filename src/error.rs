//! 에러 타입 정의 모듈
//!
//! mislabel에서 발생할 수 있는 모든 에러 타입을 정의합니다.

use std::path::PathBuf;
use thiserror::Error;

/// mislabel에서 발생할 수 있는 에러 타입
#[derive(Error, Debug)]
pub enum MislabelError {
    /// 검사할 폴더가 존재하지 않음
    #[error("입력 폴더를 찾을 수 없습니다: {path}")]
    InputNotFound { path: PathBuf },

    /// 입력이 폴더가 아님
    #[error("입력 경로가 폴더가 아닙니다: {path}")]
    NotADirectory { path: PathBuf },

    /// 후보 목록 파일 없음 (스캔을 먼저 실행해야 함)
    #[error("후보 목록 파일이 없습니다: {path} (먼저 scan을 실행하세요)")]
    MissingCandidateList { path: PathBuf },

    /// 목록 파일 읽기/쓰기 실패
    #[error("목록 파일 처리 실패 ({path}): {reason}")]
    ListIo { path: PathBuf, reason: String },

    /// 외부 도구 실행 실패
    #[error("외부 도구를 실행할 수 없습니다 ({program}): {reason}")]
    ToolLaunch { program: String, reason: String },

    /// 외부 도구 시간 초과
    #[error("외부 도구 시간 초과 ({file}): {seconds}초")]
    ToolTimeout { file: PathBuf, seconds: u64 },

    /// 변환 결과 파일이 없거나 비어 있음
    #[error("변환 결과가 생성되지 않았습니다: {file}")]
    NoOutput { file: PathBuf },

    /// 원본 파일 교체 실패
    #[error("원본 파일 교체 실패 ({file}): {reason}")]
    ReplaceFailed { file: PathBuf, reason: String },

    /// 임시 폴더 생성/삭제 실패
    #[error("임시 폴더 처리 실패 ({path}): {reason}")]
    Scratch { path: PathBuf, reason: String },

    /// 워커 수가 0
    #[error("워커 수는 1 이상이어야 합니다")]
    InvalidPoolSize,

    /// 스레드 풀 초기화 실패 또는 풀 실행 중 치명적 오류
    #[error("워커 풀 실행 실패: {reason}")]
    PoolFailure { reason: String },

    /// 유효하지 않은 패턴
    #[error("유효하지 않은 패턴: {pattern}")]
    InvalidPattern { pattern: String },

    /// 누락 파일 때문에 사용자가 진행을 거부함
    #[error("누락된 파일 {count}개 때문에 변환을 중단했습니다")]
    Declined { count: usize },
}

/// mislabel 결과 타입 별칭
pub type Result<T> = std::result::Result<T, MislabelError>;
