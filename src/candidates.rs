//! 경로 목록 파일 모듈
//!
//! 스캔 단계와 변환 단계 사이에서 주고받는 줄 단위 경로 목록을 읽고 씁니다.
//! 형식: UTF-8, 한 줄에 경로 하나, 헤더 없음.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{MislabelError, Result};

/// 기본 후보 목록 파일 이름
pub const DEFAULT_CANDIDATE_LIST: &str = "missing-mp3-files.txt";

/// 기본 실패 목록 파일 이름
pub const DEFAULT_FAILURE_LIST: &str = "failed-mp3-files.txt";

fn list_error(path: &Path, e: std::io::Error) -> MislabelError {
    MislabelError::ListIo {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// 경로 목록 읽기
///
/// 빈 줄은 무시하고, 윈도우 줄바꿈(`\r`)은 제거합니다.
/// 파일이 없으면 [`MislabelError::MissingCandidateList`]를 반환합니다.
pub fn read_path_list(path: &Path) -> Result<Vec<PathBuf>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(MislabelError::MissingCandidateList {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(list_error(path, e)),
    };

    Ok(content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(PathBuf::from)
        .collect())
}

/// 경로 목록을 기존 파일 뒤에 추가 (없으면 생성)
pub fn append_path_list(path: &Path, entries: &[PathBuf]) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| list_error(path, e))?;
    write_entries(path, file, entries)
}

/// 경로 목록을 새로 쓰기 (기존 내용은 덮어씀)
pub fn write_path_list(path: &Path, entries: &[PathBuf]) -> Result<()> {
    let file = File::create(path).map_err(|e| list_error(path, e))?;
    write_entries(path, file, entries)
}

/// 목록 파일 삭제 (없으면 아무것도 하지 않음)
pub fn clear_path_list(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(list_error(path, e)),
    }
}

fn write_entries(path: &Path, file: File, entries: &[PathBuf]) -> Result<()> {
    let mut writer = BufWriter::new(file);
    for entry in entries {
        writeln!(writer, "{}", entry.display()).map_err(|e| list_error(path, e))?;
    }
    writer.flush().map_err(|e| list_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_list_is_usage_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = read_path_list(&temp_dir.path().join("nope.txt"));
        assert!(matches!(
            result,
            Err(MislabelError::MissingCandidateList { .. })
        ));
    }

    #[test]
    fn test_append_accumulates() {
        let temp_dir = TempDir::new().unwrap();
        let list = temp_dir.path().join("list.txt");

        append_path_list(&list, &[PathBuf::from("a.mp3")]).unwrap();
        append_path_list(&list, &[PathBuf::from("b.mp3")]).unwrap();

        let paths = read_path_list(&list).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.mp3"), PathBuf::from("b.mp3")]);
    }

    #[test]
    fn test_write_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let list = temp_dir.path().join("failed.txt");

        write_path_list(&list, &[PathBuf::from("a.mp3"), PathBuf::from("b.mp3")]).unwrap();
        write_path_list(&list, &[PathBuf::from("c.mp3")]).unwrap();

        assert_eq!(read_path_list(&list).unwrap(), vec![PathBuf::from("c.mp3")]);
    }

    #[test]
    fn test_read_skips_blank_lines_and_crlf() {
        let temp_dir = TempDir::new().unwrap();
        let list = temp_dir.path().join("list.txt");
        fs::write(&list, "a.mp3\r\n\r\n  \nb c.mp3\n").unwrap();

        let paths = read_path_list(&list).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.mp3"), PathBuf::from("b c.mp3")]);
    }

    #[test]
    fn test_clear_missing_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let list = temp_dir.path().join("list.txt");
        clear_path_list(&list).unwrap();

        write_path_list(&list, &[PathBuf::from("a.mp3")]).unwrap();
        clear_path_list(&list).unwrap();
        assert!(!list.exists());
    }
}
