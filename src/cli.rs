//! CLI 인자 파싱 모듈
//!
//! clap을 사용한 명령줄 인자 정의 및 파싱을 담당합니다.
//! 두 단계가 각각 하위 명령입니다: `scan` (검사) → `convert` (재인코딩).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::candidates::{DEFAULT_CANDIDATE_LIST, DEFAULT_FAILURE_LIST};
use crate::config::{ConvertConfig, ScanConfig, DEFAULT_POOL_SIZE};
use crate::pattern::DEFAULT_PATTERN;
use crate::probe::{DEFAULT_EXPECTED_FORMAT, DEFAULT_FFPROBE};
use crate::transcode::{DEFAULT_CODEC, DEFAULT_FFMPEG};

/// mislabel CLI 인자 구조체
#[derive(Parser, Debug)]
#[command(
    name = "mislabel",
    author = "YourName <your@email.com>",
    version,
    about = "MISLABELED AUDIO FIXER - 확장자와 실제 포맷이 다른 오디오 파일을 찾아 재인코딩",
    long_about = r#"
MISLABELED AUDIO FIXER
======================

확장자는 .mp3인데 실제 내용은 다른 포맷인 파일을 찾아
ffmpeg로 다시 인코딩한 뒤 원본 자리에 덮어씁니다.

단계:
  1. scan    : ffprobe로 실제 포맷을 검사하여 후보 목록 파일에 추가
  2. convert : 후보 목록의 파일을 여러 워커로 동시에 재인코딩

예제:
  mislabel scan -i ~/Music
  mislabel scan -i ~/Music --clear --yes
  mislabel convert -j 8 --timeout 10m
  mislabel convert --dry-run
"#
)]
pub struct Args {
    /// 모든 확인 질문에 기본값으로 자동 응답
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// 상세 출력 모드 (debug 로그 포함)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 하위 명령
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 포맷이 확장자와 다른 파일 찾기 (ffprobe 필요)
    Scan(ScanArgs),
    /// 후보 목록의 파일을 재인코딩하여 교체 (ffmpeg 필요)
    Convert(ConvertArgs),
}

/// `scan` 인자
#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// 검사할 폴더 (하위 폴더 포함)
    #[arg(short, long)]
    pub input: PathBuf,

    /// 파일 이름 패턴 (glob 형식, 대소문자 무시)
    #[arg(short, long, default_value = DEFAULT_PATTERN)]
    pub pattern: String,

    /// 기대하는 실제 포맷 이름 (ffprobe format_name)
    #[arg(short, long, default_value = DEFAULT_EXPECTED_FORMAT)]
    pub expect: String,

    /// 후보 목록 파일 경로
    #[arg(short, long, default_value = DEFAULT_CANDIDATE_LIST)]
    pub list: PathBuf,

    /// 이전 결과를 지우고 시작
    #[arg(long)]
    pub clear: bool,

    /// 최대 폴더 탐색 깊이
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// ffprobe 실행 파일
    #[arg(long, default_value = DEFAULT_FFPROBE)]
    pub ffprobe: String,
}

/// `convert` 인자
#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// 후보 목록 파일 경로 (scan 결과)
    #[arg(short, long, default_value = DEFAULT_CANDIDATE_LIST)]
    pub list: PathBuf,

    /// 실패 목록 파일 경로 (매번 덮어씀)
    #[arg(short, long, default_value = DEFAULT_FAILURE_LIST)]
    pub failures: PathBuf,

    /// 동시 워커 수
    #[arg(short = 'j', long, default_value_t = DEFAULT_POOL_SIZE)]
    pub workers: usize,

    /// 임시 폴더 경로 (기본값: 시스템 임시 폴더/mislabel-scratch-<pid>)
    #[arg(long)]
    pub scratch: Option<PathBuf>,

    /// 목표 오디오 코덱
    #[arg(long, default_value = DEFAULT_CODEC)]
    pub codec: String,

    /// ffmpeg 실행 파일
    #[arg(long, default_value = DEFAULT_FFMPEG)]
    pub ffmpeg: String,

    /// 파일 하나당 변환 제한 시간 (예: 90s, 10m, 1h30m)
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// 실제 변환 없이 처리될 파일 목록만 표시
    #[arg(long)]
    pub dry_run: bool,
}

impl ScanArgs {
    /// 스캔 설정으로 변환. 이전 결과 삭제 여부는 질문 결과로 받음
    pub fn to_config(&self, clear_prior_results: bool) -> ScanConfig {
        ScanConfig::new(&self.input)
            .with_pattern(&self.pattern)
            .with_expected_format(&self.expect)
            .with_list_path(&self.list)
            .with_clear_prior_results(clear_prior_results)
            .with_max_depth(self.max_depth)
    }
}

impl ConvertArgs {
    /// 변환 설정으로 변환. 누락 파일 진행 여부는 질문 결과로 받음
    pub fn to_config(&self, proceed_despite_missing: bool) -> ConvertConfig {
        let mut config = ConvertConfig::new()
            .with_list_path(&self.list)
            .with_failure_path(&self.failures)
            .with_pool_size(self.workers)
            .with_proceed_despite_missing(proceed_despite_missing)
            .with_timeout(self.timeout)
            .with_codec(&self.codec);
        if let Some(ref scratch) = self.scratch {
            config = config.with_scratch_root(scratch);
        }
        config
    }
}

/// 사람이 읽기 쉬운 시간 문자열을 [`Duration`]으로 변환
///
/// 단위: `ms`, `s`, `m`, `h`. `"1m30s"`처럼 이어 쓸 수 있으며 0보다 커야 합니다.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let input = value.trim();
    if input.is_empty() {
        return Err("시간 값이 비어 있습니다".into());
    }

    let invalid = || format!("잘못된 시간 형식: '{value}'");
    let mut total_ms: u64 = 0;
    let mut rest = input;

    while !rest.is_empty() {
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            return Err(invalid());
        }
        let number: u64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let (unit_len, factor) = if rest.starts_with("ms") {
            (2, 1)
        } else if rest.starts_with('s') {
            (1, 1_000)
        } else if rest.starts_with('m') {
            (1, 60_000)
        } else if rest.starts_with('h') {
            (1, 3_600_000)
        } else {
            return Err(invalid());
        };
        rest = &rest[unit_len..];

        total_ms = number
            .checked_mul(factor)
            .and_then(|ms| total_ms.checked_add(ms))
            .ok_or_else(|| "시간 값이 너무 큽니다".to_string())?;
    }

    if total_ms == 0 {
        return Err("시간 값은 0보다 커야 합니다".into());
    }

    Ok(Duration::from_millis(total_ms))
}
