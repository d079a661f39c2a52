//! 포맷 검사 모듈
//!
//! 외부 도구(ffprobe)로 파일의 실제 포맷(확장자가 아닌 내용 기준)을 알아냅니다.

use std::path::Path;
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{MislabelError, Result};

/// 기본 ffprobe 실행 파일
pub const DEFAULT_FFPROBE: &str = "ffprobe";

/// 기본 기대 포맷
pub const DEFAULT_EXPECTED_FORMAT: &str = "mp3";

/// 파일 하나의 논리적 포맷을 알려주는 검사기
pub trait FormatProbe: Send + Sync {
    /// 감지된 포맷 이름 반환 (예: "mp3", "mov,mp4,m4a,3gp,3g2,mj2")
    fn probe(&self, path: &Path) -> Result<String>;
}

/// ffprobe 기반 포맷 검사기
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: String,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new(DEFAULT_FFPROBE)
    }
}

impl FormatProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-v")
            .arg("quiet")
            .arg("-show_entries")
            .arg("format=format_name")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| MislabelError::ToolLaunch {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        // 종료 코드와 무관하게 출력만 본다. 출력이 비면 불일치로 취급됨.
        debug!(
            "{} {:?} -> {} ({})",
            self.program,
            path,
            String::from_utf8_lossy(&output.stdout).trim_end(),
            output.status
        );

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// 감지된 포맷이 기대 포맷과 같은지 비교 (앞뒤 공백 제거, 대소문자 무시)
///
/// # Examples
/// ```
/// use mislabel::probe::formats_match;
///
/// assert!(formats_match("mp3\n", "mp3"));
/// assert!(formats_match(" MP3 ", "mp3"));
/// assert!(!formats_match("mov,mp4,m4a,3gp,3g2,mj2", "mp3"));
/// ```
pub fn formats_match(detected: &str, expected: &str) -> bool {
    detected.trim().eq_ignore_ascii_case(expected.trim())
}

/// 외부 도구가 PATH에 있고 실행 가능한지 확인
pub fn tool_available(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_match_trims_whitespace() {
        assert!(formats_match("mp3\r\n", "mp3"));
        assert!(formats_match("mp3", " mp3 "));
    }

    #[test]
    fn test_formats_match_rejects_other_containers() {
        assert!(!formats_match("wav", "mp3"));
        assert!(!formats_match("", "mp3"));
        assert!(!formats_match("mp3,mp2", "mp3"));
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let probe = FfprobeProbe::new("definitely-not-a-real-ffprobe-binary");
        let result = probe.probe(Path::new("whatever.mp3"));
        assert!(matches!(result, Err(MislabelError::ToolLaunch { .. })));
        assert!(!tool_available(probe.program()));
    }
}
