//! 외부 코덱 도구 모듈
//!
//! ffmpeg로 원본 파일을 임시 출력 파일로 재인코딩합니다.
//! 종료 코드는 성공 판단에 쓰지 않습니다. 성공 여부는 워커가
//! 출력 파일의 존재와 크기로 판단합니다.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::error::{MislabelError, Result};

/// 기본 ffmpeg 실행 파일
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// 기본 목표 코덱
pub const DEFAULT_CODEC: &str = "libmp3lame";

/// 시간 제한이 있을 때 프로세스 상태를 확인하는 간격
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 원본을 대상 경로로 재인코딩하는 도구
pub trait Transcoder: Send + Sync {
    /// `source`를 읽어 `target`에 쓴다.
    ///
    /// 도구를 실행하지 못했거나 시간 초과일 때만 에러를 반환합니다.
    fn transcode(&self, source: &Path, target: &Path) -> Result<()>;
}

/// ffmpeg 기반 변환기
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
    codec: String,
    timeout: Option<Duration>,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>, codec: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            codec: codec.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, source: &Path, target: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-hide_banner")
            .arg("-nostdin")
            .arg("-y")
            .arg("-i")
            .arg(source)
            .arg("-acodec")
            .arg(&self.codec)
            .arg(target);
        cmd
    }

    fn wait(&self, child: &mut Child, source: &Path) -> Result<ExitStatus> {
        let wait_error = |e: std::io::Error| MislabelError::ToolLaunch {
            program: self.program.clone(),
            reason: e.to_string(),
        };

        let Some(timeout) = self.timeout else {
            return child.wait().map_err(wait_error);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(wait_error)? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                // 이미 종료된 경우 kill 실패는 무시
                let _ = child.kill();
                let _ = child.wait();
                return Err(MislabelError::ToolTimeout {
                    file: source.to_path_buf(),
                    seconds: timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new(DEFAULT_FFMPEG, DEFAULT_CODEC)
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, source: &Path, target: &Path) -> Result<()> {
        // 도구 출력은 임시 폴더의 로그 파일로 받되, 성공 판단에는 쓰지 않음
        let log_path = tool_log_path(target);
        let stdout = File::create(&log_path).map_err(|e| MislabelError::Scratch {
            path: log_path.clone(),
            reason: e.to_string(),
        })?;
        let stderr = stdout.try_clone().map_err(|e| MislabelError::Scratch {
            path: log_path.clone(),
            reason: e.to_string(),
        })?;

        debug!(
            "{} -i {:?} -acodec {} {:?}",
            self.program, source, self.codec, target
        );

        let spawned = self
            .command(source, target)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn();

        let result = match spawned {
            Ok(mut child) => self.wait(&mut child, source),
            Err(e) => Err(MislabelError::ToolLaunch {
                program: self.program.clone(),
                reason: e.to_string(),
            }),
        };

        if let Ok(status) = &result {
            if !status.success() {
                debug!(
                    "{} exited with {} for {:?}: {}",
                    self.program,
                    status,
                    source,
                    log_tail(&log_path)
                );
            }
        }
        let _ = fs::remove_file(&log_path);

        result.map(|_| ())
    }
}

fn tool_log_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".log");
    PathBuf::from(name)
}

fn log_tail(path: &Path) -> String {
    let content = fs::read_to_string(path).unwrap_or_default();
    let lines: Vec<&str> = content.lines().rev().take(3).collect();
    lines.into_iter().rev().collect::<Vec<_>>().join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_command_arguments() {
        let transcoder = FfmpegTranscoder::default();
        let cmd = transcoder.command(Path::new("in.mp3"), Path::new("out.mp3"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(cmd.get_program(), "ffmpeg");
        assert_eq!(
            args,
            vec![
                "-hide_banner",
                "-nostdin",
                "-y",
                "-i",
                "in.mp3",
                "-acodec",
                "libmp3lame",
                "out.mp3"
            ]
        );
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let temp_dir = TempDir::new().unwrap();
        let transcoder =
            FfmpegTranscoder::new("definitely-not-a-real-ffmpeg-binary", "libmp3lame");
        let target = temp_dir.path().join("0-0.mp3");

        let result = transcoder.transcode(Path::new("in.mp3"), &target);
        assert!(matches!(result, Err(MislabelError::ToolLaunch { .. })));
        assert!(!tool_log_path(&target).exists());
    }

    #[test]
    fn test_tool_log_path_appends_suffix() {
        assert_eq!(
            tool_log_path(Path::new("/tmp/w/0-3.mp3")),
            PathBuf::from("/tmp/w/0-3.mp3.log")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_hung_tool() {
        let transcoder =
            FfmpegTranscoder::default().with_timeout(Some(Duration::from_millis(200)));
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let started = Instant::now();

        let result = transcoder.wait(&mut child, Path::new("in.mp3"));

        assert!(matches!(result, Err(MislabelError::ToolTimeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_without_timeout_returns_status() {
        let transcoder = FfmpegTranscoder::default();
        let mut child = Command::new("sh").arg("-c").arg("exit 3").spawn().unwrap();

        let status = transcoder.wait(&mut child, Path::new("in.mp3")).unwrap();
        assert_eq!(status.code(), Some(3));
    }
}
