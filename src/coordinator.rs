//! 변환 조정 모듈
//!
//! 고정 크기 워커 풀을 띄워 공유 큐를 비우고, 실행 단위 임시 폴더의
//! 생명주기와 실패 목록 저장을 관리합니다.

use std::fs;
use std::io::ErrorKind;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::candidates::{read_path_list, write_path_list};
use crate::config::ConvertConfig;
use crate::error::{MislabelError, Result};
use crate::queue::{FailureLedger, WorkQueue};
use crate::transcode::Transcoder;
use crate::worker::{ConversionWorker, Outcome};

/// 실행 단위 임시 폴더 트리
///
/// 루트 아래에 워커마다 하나씩 하위 폴더를 둡니다.
/// 값이 drop될 때 (정상 종료, 에러, 패닉 모두) 트리 전체를 삭제합니다.
#[derive(Debug)]
pub struct ScratchTree {
    root: PathBuf,
    workers: Vec<PathBuf>,
}

/// 이 프로그램이 만든 임시 폴더임을 표시하는 파일
pub const SCRATCH_MARKER: &str = ".mislabel-scratch";

impl ScratchTree {
    /// 루트를 새로 만들고 (이전 실행이 남긴 것이면 지우고) 워커별 하위 폴더 생성
    ///
    /// 이미 있는 루트가 비어 있지 않고 표시 파일도 없으면 사용자 폴더로 보고
    /// 아무것도 지우지 않은 채 [`MislabelError::Scratch`]를 반환합니다.
    pub fn create(root: &Path, worker_count: usize) -> Result<Self> {
        let scratch_error = |path: &Path, e: std::io::Error| MislabelError::Scratch {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        if is_foreign_directory(root).map_err(|e| scratch_error(root, e))? {
            return Err(MislabelError::Scratch {
                path: root.to_path_buf(),
                reason: format!("비어 있지 않고 {SCRATCH_MARKER} 표시가 없는 폴더입니다"),
            });
        }

        match fs::remove_dir_all(root) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(scratch_error(root, e)),
        }
        fs::create_dir_all(root).map_err(|e| scratch_error(root, e))?;

        // 여기서부터 실패하면 drop이 루트를 정리함
        let mut tree = Self {
            root: root.to_path_buf(),
            workers: Vec::with_capacity(worker_count),
        };
        let marker = root.join(SCRATCH_MARKER);
        fs::write(&marker, b"").map_err(|e| scratch_error(&marker, e))?;
        for id in 0..worker_count {
            let dir = root.join(format!("worker-{id}"));
            fs::create_dir(&dir).map_err(|e| scratch_error(&dir, e))?;
            tree.workers.push(dir);
        }

        Ok(tree)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 워커별 하위 폴더
    pub fn worker_dirs(&self) -> &[PathBuf] {
        &self.workers
    }
}

impl Drop for ScratchTree {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("could not remove scratch directory {:?}: {}", self.root, e),
        }
    }
}

/// 표시 파일 없이 내용이 들어 있는 기존 폴더인지
fn is_foreign_directory(root: &Path) -> std::io::Result<bool> {
    let mut entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if root.join(SCRATCH_MARKER).is_file() {
        return Ok(false);
    }
    Ok(entries.next().is_some())
}

/// 변환 실행 결과
#[derive(Debug, Default)]
pub struct ConversionReport {
    /// 큐에 들어간 파일 수 (중복/누락 제외 후)
    pub total: usize,
    /// 원본 교체에 성공한 파일 수
    pub replaced: usize,
    /// 실패한 파일 (정렬됨, 실패 목록 파일과 동일)
    pub failed: Vec<PathBuf>,
    /// 디스크에 없어 제외된 파일
    pub dropped: Vec<PathBuf>,
    /// 소요 시간
    pub elapsed: Duration,
}

/// 후보 목록을 읽어 필터링된 작업 큐 생성
///
/// 목록 파일이 없으면 [`MislabelError::MissingCandidateList`]를 반환합니다.
pub fn load_queue(list_path: &Path) -> Result<(WorkQueue, Vec<PathBuf>)> {
    let candidates = read_path_list(list_path)?;
    Ok(WorkQueue::from_candidates(candidates))
}

/// 변환 단계 전체 실행
///
/// 1. 후보 목록 로드 및 필터링 (누락 파일이 있고 진행 거부 시 아무것도 바꾸지 않고 종료)
/// 2. 임시 폴더 트리 생성
/// 3. `pool_size`개의 워커 실행 후 대기
/// 4. 임시 폴더 삭제 (모든 경로에서 정확히 한 번)
/// 5. 실패 목록 저장
///
/// # Arguments
/// * `config` - 변환 설정
/// * `transcoder` - 외부 코덱 도구
/// * `on_outcome` - 파일 하나가 끝날 때마다 워커 스레드에서 호출
pub fn run_conversion<T, F>(
    config: &ConvertConfig,
    transcoder: &T,
    on_outcome: &F,
) -> Result<ConversionReport>
where
    T: Transcoder + ?Sized,
    F: Fn(&Path, &Outcome) + Sync + ?Sized,
{
    config.validate()?;

    let (queue, dropped) = load_queue(&config.list_path)?;
    if !dropped.is_empty() && !config.proceed_despite_missing {
        return Err(MislabelError::Declined {
            count: dropped.len(),
        });
    }

    let mut report = run_queue(config, queue, transcoder, on_outcome)?;
    report.dropped = dropped;
    Ok(report)
}

/// 이미 필터링된 큐로 워커 풀 실행 후 실패 목록 저장
pub fn run_queue<T, F>(
    config: &ConvertConfig,
    queue: WorkQueue,
    transcoder: &T,
    on_outcome: &F,
) -> Result<ConversionReport>
where
    T: Transcoder + ?Sized,
    F: Fn(&Path, &Outcome) + Sync + ?Sized,
{
    config.validate()?;

    let started = Instant::now();
    let total = queue.len();
    let ledger = FailureLedger::new();

    info!(
        "converting {} file(s) with {} worker(s) in {:?}",
        total, config.pool_size, config.scratch_root
    );

    {
        let scratch = ScratchTree::create(&config.scratch_root, config.pool_size)?;
        run_pool(&scratch, &queue, &ledger, transcoder, on_outcome)?;
        // scratch drop: 임시 폴더 삭제
    }

    let failed = ledger.snapshot();
    write_path_list(&config.failure_path, &failed)?;
    info!(
        "{} of {} file(s) failed, list written to {:?}",
        failed.len(),
        total,
        config.failure_path
    );

    Ok(ConversionReport {
        total,
        replaced: total - failed.len(),
        failed,
        dropped: Vec::new(),
        elapsed: started.elapsed(),
    })
}

fn run_pool<T, F>(
    scratch: &ScratchTree,
    queue: &WorkQueue,
    ledger: &FailureLedger,
    transcoder: &T,
    on_outcome: &F,
) -> Result<()>
where
    T: Transcoder + ?Sized,
    F: Fn(&Path, &Outcome) + Sync + ?Sized,
{
    let worker_dirs = scratch.worker_dirs();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_dirs.len())
        .thread_name(|i| format!("mislabel-worker-{i}"))
        .build()
        .map_err(|e| MislabelError::PoolFailure {
            reason: e.to_string(),
        })?;

    // 워커 내부의 패닉은 파일 단위로 잡힌다. 여기까지 오는 패닉은 풀 자체의 실패.
    let joined = panic::catch_unwind(AssertUnwindSafe(|| {
        pool.scope(|s| {
            for (id, dir) in worker_dirs.iter().enumerate() {
                s.spawn(move |_| {
                    let mut worker = ConversionWorker::new(id, dir);
                    worker.run(queue, ledger, transcoder, on_outcome);
                });
            }
        })
    }));

    joined.map_err(|_| MislabelError::PoolFailure {
        reason: "a worker thread panicked outside of a conversion".to_string(),
    })
}
