//! 변환 워커 모듈
//!
//! 워커 하나는 공유 큐에서 파일을 하나씩 꺼내 자신만의 임시 폴더로 변환하고,
//! 성공하면 원본을 교체합니다. 파일 하나의 실패는 실패 목록에 기록될 뿐
//! 워커나 전체 작업을 멈추지 않습니다.

use std::any::Any;
use std::fs;
use std::io::ErrorKind;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{MislabelError, Result};
use crate::queue::{FailureLedger, WorkQueue};
use crate::transcode::Transcoder;

/// 확장자가 없는 원본에 쓰는 임시 파일 확장자
const FALLBACK_EXTENSION: &str = "mp3";

/// 파일 하나의 처리 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 원본을 새 내용으로 교체함
    Replaced { bytes_before: u64, bytes_after: u64 },
    /// 변환 실패, 원본은 그대로
    Failed { reason: String },
}

impl Outcome {
    pub fn is_replaced(&self) -> bool {
        matches!(self, Outcome::Replaced { .. })
    }
}

/// 변환 워커
#[derive(Debug)]
pub struct ConversionWorker {
    id: usize,
    scratch_dir: PathBuf,
    attempts: u64,
}

impl ConversionWorker {
    /// 새 워커 생성
    ///
    /// `scratch_dir`는 이 워커 전용이어야 하며 이미 존재해야 합니다.
    pub fn new(id: usize, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            id,
            scratch_dir: scratch_dir.into(),
            attempts: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// 지금까지 시도한 변환 수
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// 큐가 빌 때까지 처리
    ///
    /// 처리한 파일 수를 반환합니다.
    pub fn run<T, F>(
        &mut self,
        queue: &WorkQueue,
        ledger: &FailureLedger,
        transcoder: &T,
        on_outcome: &F,
    ) -> usize
    where
        T: Transcoder + ?Sized,
        F: Fn(&Path, &Outcome) + Sync + ?Sized,
    {
        let mut processed = 0;

        while let Some(source) = queue.try_take() {
            let outcome = self.process(&source, transcoder);
            if let Outcome::Failed { reason } = &outcome {
                warn!("worker {}: failed {:?}: {}", self.id, source, reason);
                ledger.record(source.clone());
            }
            on_outcome(&source, &outcome);
            processed += 1;
        }

        debug!(
            "worker {} drained the queue after {} file(s)",
            self.id, processed
        );
        processed
    }

    /// 파일 하나 처리. 패닉도 이 파일의 실패로만 취급
    pub fn process<T>(&mut self, source: &Path, transcoder: &T) -> Outcome
    where
        T: Transcoder + ?Sized,
    {
        let attempt =
            panic::catch_unwind(AssertUnwindSafe(|| self.convert(source, transcoder)));

        match attempt {
            Ok(Ok((bytes_before, bytes_after))) => Outcome::Replaced {
                bytes_before,
                bytes_after,
            },
            Ok(Err(e)) => Outcome::Failed {
                reason: e.to_string(),
            },
            Err(payload) => Outcome::Failed {
                reason: format!("panic: {}", panic_message(payload.as_ref())),
            },
        }
    }

    /// 다음 임시 출력 경로 (워커별 증가 카운터)
    fn next_scratch_path(&mut self, source: &Path) -> PathBuf {
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(FALLBACK_EXTENSION);
        let name = format!("{}-{}.{}", self.id, self.attempts, extension);
        self.attempts += 1;
        self.scratch_dir.join(name)
    }

    fn convert<T>(&mut self, source: &Path, transcoder: &T) -> Result<(u64, u64)>
    where
        T: Transcoder + ?Sized,
    {
        let scratch = self.next_scratch_path(source);
        let result = self.convert_into(source, &scratch, transcoder);

        // 결과와 상관없이 임시 출력은 남기지 않음
        remove_if_exists(&scratch);

        result
    }

    fn convert_into<T>(
        &self,
        source: &Path,
        scratch: &Path,
        transcoder: &T,
    ) -> Result<(u64, u64)>
    where
        T: Transcoder + ?Sized,
    {
        transcoder.transcode(source, scratch)?;

        // 종료 코드가 아니라 비어 있지 않은 출력 파일이 성공 기준
        let bytes_after = fs::metadata(scratch).map(|m| m.len()).unwrap_or(0);
        if bytes_after == 0 {
            return Err(MislabelError::NoOutput {
                file: source.to_path_buf(),
            });
        }

        let bytes_before = fs::metadata(source).map(|m| m.len()).unwrap_or(0);
        self.replace(source, scratch)?;
        Ok((bytes_before, bytes_after))
    }

    /// 임시 출력을 원본 옆에 복사한 뒤 rename으로 원본을 교체
    ///
    /// rename 전에 중단되면 원본은 변경되지 않습니다.
    /// 심볼릭 링크는 가리키는 실제 파일을 교체하고, 하드 링크가 여러 개인
    /// 파일은 모든 이름이 새 내용을 보도록 제자리에 덮어씁니다.
    fn replace(&self, source: &Path, scratch: &Path) -> Result<()> {
        let replace_error = |e: std::io::Error| MislabelError::ReplaceFailed {
            file: source.to_path_buf(),
            reason: e.to_string(),
        };

        let target = fs::canonicalize(source).map_err(replace_error)?;
        let permissions = fs::metadata(&target).map_err(replace_error)?.permissions();

        if has_other_links(&target).map_err(replace_error)? {
            // fs::copy는 임시 출력의 권한도 복사하므로 원래 권한으로 되돌림
            return fs::copy(scratch, &target)
                .and_then(|_| fs::set_permissions(&target, permissions))
                .map_err(replace_error);
        }

        let staged = staging_path(&target, self.id);
        let staged_result = fs::copy(scratch, &staged)
            .and_then(|_| fs::set_permissions(&staged, permissions))
            .and_then(|_| fs::rename(&staged, &target));

        if let Err(e) = staged_result {
            remove_if_exists(&staged);
            return Err(replace_error(e));
        }
        Ok(())
    }
}

/// 같은 inode를 가리키는 다른 이름이 있는지
#[cfg(unix)]
fn has_other_links(path: &Path) -> std::io::Result<bool> {
    use std::os::unix::fs::MetadataExt;
    Ok(fs::metadata(path)?.nlink() > 1)
}

#[cfg(not(unix))]
fn has_other_links(_path: &Path) -> std::io::Result<bool> {
    Ok(false)
}

/// 원본과 같은 폴더의 숨김 스테이징 경로
fn staging_path(source: &Path, worker_id: usize) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!(".{file_name}.mislabel-{worker_id}.tmp"))
}

fn remove_if_exists(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove {:?}: {}", path, e),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// 원본 내용 앞에 표식을 붙여 출력하고 사용한 임시 경로를 기억하는 변환기
    #[derive(Default)]
    struct RecordingTranscoder {
        targets: Mutex<Vec<PathBuf>>,
    }

    impl Transcoder for RecordingTranscoder {
        fn transcode(&self, source: &Path, target: &Path) -> Result<()> {
            self.targets.lock().unwrap().push(target.to_path_buf());
            let mut content = b"reencoded:".to_vec();
            content.extend(fs::read(source).unwrap());
            fs::write(target, content).unwrap();
            Ok(())
        }
    }

    struct EmptyOutputTranscoder;

    impl Transcoder for EmptyOutputTranscoder {
        fn transcode(&self, _source: &Path, target: &Path) -> Result<()> {
            fs::write(target, b"").unwrap();
            Ok(())
        }
    }

    /// 출력 일부를 쓰다가 시간 초과로 끝나는 변환기
    struct TimedOutTranscoder;

    impl Transcoder for TimedOutTranscoder {
        fn transcode(&self, source: &Path, target: &Path) -> Result<()> {
            fs::write(target, b"partial").unwrap();
            Err(MislabelError::ToolTimeout {
                file: source.to_path_buf(),
                seconds: 1,
            })
        }
    }

    struct UnlaunchableTranscoder;

    impl Transcoder for UnlaunchableTranscoder {
        fn transcode(&self, _source: &Path, _target: &Path) -> Result<()> {
            Err(MislabelError::ToolLaunch {
                program: "ffmpeg".to_string(),
                reason: "No such file or directory".to_string(),
            })
        }
    }

    struct PanickingTranscoder;

    impl Transcoder for PanickingTranscoder {
        fn transcode(&self, _source: &Path, _target: &Path) -> Result<()> {
            panic!("codec exploded");
        }
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let scratch = temp_dir.path().join("scratch");
        fs::create_dir(&scratch).unwrap();
        let source = temp_dir.path().join("song.mp3");
        fs::write(&source, b"original").unwrap();
        (temp_dir, scratch, source)
    }

    #[test]
    fn test_success_replaces_original_and_cleans_scratch() {
        let (_temp_dir, scratch, source) = setup();
        let mut worker = ConversionWorker::new(0, &scratch);
        let transcoder = RecordingTranscoder::default();

        let outcome = worker.process(&source, &transcoder);

        assert_eq!(
            outcome,
            Outcome::Replaced {
                bytes_before: 8,
                bytes_after: 18
            }
        );
        assert_eq!(fs::read(&source).unwrap(), b"reencoded:original");
        assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
        assert!(!staging_path(&source, 0).exists());
    }

    #[test]
    fn test_empty_output_is_failure_and_original_kept() {
        let (_temp_dir, scratch, source) = setup();
        let mut worker = ConversionWorker::new(1, &scratch);

        let outcome = worker.process(&source, &EmptyOutputTranscoder);

        assert!(!outcome.is_replaced());
        assert_eq!(fs::read(&source).unwrap(), b"original");
        assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[test]
    fn test_panic_is_contained() {
        let (_temp_dir, scratch, source) = setup();
        let mut worker = ConversionWorker::new(2, &scratch);

        let outcome = worker.process(&source, &PanickingTranscoder);

        match outcome {
            Outcome::Failed { reason } => assert!(reason.contains("codec exploded")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fs::read(&source).unwrap(), b"original");
    }

    #[test]
    fn test_scratch_names_increase_per_attempt() {
        let (temp_dir, scratch, source) = setup();
        let other = temp_dir.path().join("other.mp3");
        fs::write(&other, b"other").unwrap();

        let mut worker = ConversionWorker::new(3, &scratch);
        let transcoder = RecordingTranscoder::default();
        worker.process(&source, &transcoder);
        worker.process(&other, &transcoder);

        let targets = transcoder.targets.lock().unwrap().clone();
        assert_eq!(
            targets,
            vec![scratch.join("3-0.mp3"), scratch.join("3-1.mp3")]
        );
        assert_eq!(worker.attempts(), 2);
    }

    #[test]
    fn test_run_drains_queue_and_records_failures() {
        let (temp_dir, scratch, source) = setup();
        let (queue, _) = WorkQueue::from_candidates(vec![source.clone()]);
        let ledger = FailureLedger::new();
        let seen = Mutex::new(Vec::new());

        let mut worker = ConversionWorker::new(0, &scratch);
        let on_outcome = |path: &Path, outcome: &Outcome| {
            seen.lock()
                .unwrap()
                .push((path.to_path_buf(), outcome.is_replaced()));
        };
        let processed = worker.run(&queue, &ledger, &EmptyOutputTranscoder, &on_outcome);

        assert_eq!(processed, 1);
        assert!(queue.is_empty());
        assert_eq!(ledger.snapshot(), vec![source.clone()]);
        assert_eq!(seen.into_inner().unwrap(), vec![(source, false)]);
        drop(temp_dir);
    }

    #[test]
    fn test_partial_output_from_timed_out_tool_is_discarded() {
        let (_temp_dir, scratch, source) = setup();
        let (queue, _) = WorkQueue::from_candidates(vec![source.clone()]);
        let ledger = FailureLedger::new();

        let mut worker = ConversionWorker::new(0, &scratch);
        worker.run(&queue, &ledger, &TimedOutTranscoder, &|_: &Path, _: &Outcome| {});

        assert_eq!(ledger.snapshot(), vec![source.clone()]);
        assert_eq!(fs::read(&source).unwrap(), b"original");
        assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[test]
    fn test_launch_error_is_failure() {
        let (_temp_dir, scratch, source) = setup();
        let mut worker = ConversionWorker::new(0, &scratch);

        let outcome = worker.process(&source, &UnlaunchableTranscoder);

        match outcome {
            Outcome::Failed { reason } => assert!(reason.contains("ffmpeg")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fs::read(&source).unwrap(), b"original");
        assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_replaces_link_target() {
        let (temp_dir, scratch, source) = setup();
        let link = temp_dir.path().join("link.mp3");
        std::os::unix::fs::symlink(&source, &link).unwrap();

        let mut worker = ConversionWorker::new(0, &scratch);
        let outcome = worker.process(&link, &RecordingTranscoder::default());

        assert!(outcome.is_replaced());
        assert_eq!(fs::read(&source).unwrap(), b"reencoded:original");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert!(!staging_path(&source, 0).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_hard_links_all_see_new_content() {
        use std::os::unix::fs::PermissionsExt;

        let (temp_dir, scratch, source) = setup();
        fs::set_permissions(&source, fs::Permissions::from_mode(0o600)).unwrap();
        let alias = temp_dir.path().join("alias.mp3");
        fs::hard_link(&source, &alias).unwrap();

        let mut worker = ConversionWorker::new(0, &scratch);
        let outcome = worker.process(&source, &RecordingTranscoder::default());

        assert!(outcome.is_replaced());
        assert_eq!(fs::read(&source).unwrap(), b"reencoded:original");
        assert_eq!(fs::read(&alias).unwrap(), b"reencoded:original");
        let mode = fs::metadata(&alias).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
