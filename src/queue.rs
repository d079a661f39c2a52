//! 작업 큐 및 실패 목록 모듈
//!
//! 워커들이 공유하는 두 가지 가변 상태입니다.
//! 둘 다 내부 잠금을 사용하므로 호출하는 쪽에서 따로 잠글 필요가 없습니다.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::warn;

// 다른 워커의 패닉으로 잠금이 오염되어도 큐와 목록은 일관된 상태다.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 변환 대기 큐
#[derive(Debug, Default)]
pub struct WorkQueue {
    pending: Mutex<VecDeque<PathBuf>>,
}

impl WorkQueue {
    /// 후보 목록으로 큐 생성
    ///
    /// 1. 중복 경로 제거 (처음 나온 순서 유지)
    /// 2. 디스크에 없는 경로 제외 (각각 로그 기록)
    ///
    /// 제외된 경로 목록을 함께 반환합니다.
    pub fn from_candidates<I>(candidates: I) -> (Self, Vec<PathBuf>)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut seen = HashSet::new();
        let mut pending = VecDeque::new();
        let mut dropped = Vec::new();

        for path in candidates {
            if !seen.insert(path.clone()) {
                continue;
            }
            if path.is_file() {
                pending.push_back(path);
            } else {
                warn!("candidate no longer exists, skipping: {:?}", path);
                dropped.push(path);
            }
        }

        let queue = Self {
            pending: Mutex::new(pending),
        };
        (queue, dropped)
    }

    /// 다음 경로를 꺼냄. 비어 있으면 None
    ///
    /// 동시에 호출해도 같은 경로가 두 워커에게 가지 않습니다.
    pub fn try_take(&self) -> Option<PathBuf> {
        lock(&self.pending).pop_front()
    }

    /// 남은 경로 수
    pub fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 남은 경로 복사본 (드라이런 출력용)
    pub fn snapshot(&self) -> Vec<PathBuf> {
        lock(&self.pending).iter().cloned().collect()
    }
}

/// 변환 실패 목록 (추가만 가능)
#[derive(Debug, Default)]
pub struct FailureLedger {
    failed: Mutex<BTreeSet<PathBuf>>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 실패 경로 기록
    pub fn record(&self, path: PathBuf) {
        lock(&self.failed).insert(path);
    }

    pub fn contains(&self, path: &Path) -> bool {
        lock(&self.failed).contains(path)
    }

    pub fn len(&self) -> usize {
        lock(&self.failed).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 정렬된 실패 경로 목록
    pub fn snapshot(&self) -> Vec<PathBuf> {
        lock(&self.failed).iter().cloned().collect()
    }
}
