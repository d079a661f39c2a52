//! 포맷 불일치 파일 스캔 모듈
//!
//! 폴더 트리를 돌며 패턴에 맞는 파일을 하나씩 검사하고,
//! 실제 포맷이 기대 포맷과 다른 파일을 후보 목록에 추가합니다.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{info, warn};
use walkdir::WalkDir;

use crate::candidates::{append_path_list, clear_path_list, read_path_list};
use crate::config::ScanConfig;
use crate::error::{MislabelError, Result};
use crate::pattern::PatternMatcher;
use crate::probe::{formats_match, FormatProbe};

/// 스캔 결과
#[derive(Debug, Default)]
pub struct ScanReport {
    /// 검사한 파일 수
    pub examined: usize,
    /// 포맷이 다른 파일 (검사 순서)
    pub mislabeled: Vec<PathBuf>,
}

/// 패턴에 맞는 파일 수집 (하위 폴더 포함, 경로 순 정렬)
pub fn collect_candidates(
    root: &Path,
    matcher: &PatternMatcher,
    max_depth: Option<usize>,
) -> Vec<PathBuf> {
    let walker = match max_depth {
        Some(depth) => WalkDir::new(root).max_depth(depth),
        None => WalkDir::new(root),
    };

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|name| matcher.matches(name))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();

    files.sort();
    files
}

/// 폴더 트리 스캔
///
/// 파일은 한 번에 하나씩 순차적으로 검사합니다.
/// 검사기 실패는 "다른 포맷"으로 간주되어 후보에 포함됩니다.
///
/// # Arguments
/// * `config` - 스캔 설정
/// * `probe` - 포맷 검사기
/// * `on_file` - 파일 하나 검사가 끝날 때마다 호출 (경로, 불일치 여부)
pub fn scan<P, F>(config: &ScanConfig, probe: &P, mut on_file: F) -> Result<ScanReport>
where
    P: FormatProbe + ?Sized,
    F: FnMut(&Path, bool),
{
    validate_root(&config.root)?;

    let matcher = PatternMatcher::new(&config.pattern)?;
    let files = collect_candidates(&config.root, &matcher, config.max_depth);
    info!("scanning {} file(s) under {:?}", files.len(), config.root);

    let mut report = ScanReport {
        examined: files.len(),
        mislabeled: Vec::new(),
    };

    for file in files {
        let mislabeled = match probe.probe(&file) {
            Ok(detected) => !formats_match(&detected, &config.expected_format),
            Err(e) => {
                warn!("probe failed for {:?}: {}", file, e);
                true
            }
        };

        on_file(&file, mislabeled);
        if mislabeled {
            report.mislabeled.push(file);
        }
    }

    Ok(report)
}

/// 스캔 결과를 후보 목록 파일에 저장
///
/// `clear_first`가 참이면 기존 목록을 먼저 지웁니다. 그렇지 않으면 뒤에 추가하되,
/// 이미 목록에 있는 경로는 다시 쓰지 않습니다. 새로 추가된 경로 수를 반환합니다.
pub fn persist(report: &ScanReport, list_path: &Path, clear_first: bool) -> Result<usize> {
    if clear_first {
        clear_path_list(list_path)?;
    }

    let mut known: HashSet<PathBuf> = match read_path_list(list_path) {
        Ok(existing) => existing.into_iter().collect(),
        Err(MislabelError::MissingCandidateList { .. }) => HashSet::new(),
        Err(e) => return Err(e),
    };

    let fresh: Vec<PathBuf> = report
        .mislabeled
        .iter()
        .filter(|path| known.insert((*path).clone()))
        .cloned()
        .collect();

    append_path_list(list_path, &fresh)?;
    Ok(fresh.len())
}

fn validate_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(MislabelError::InputNotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(MislabelError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    Ok(())
}
