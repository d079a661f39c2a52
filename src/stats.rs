//! 통계 및 유틸리티 모듈
//!
//! 처리 통계 수집 및 포맷팅을 담당합니다.

use colored::Colorize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::worker::Outcome;

/// 처리 통계 구조체
#[derive(Debug, Default)]
pub struct Statistics {
    /// 총 파일 수
    pub total_files: usize,
    /// 교체 성공 수
    pub replaced_count: AtomicUsize,
    /// 실패 수
    pub failed_count: AtomicUsize,
    /// 교체 전 원본 총 바이트
    pub total_bytes_before: AtomicU64,
    /// 교체 후 총 바이트
    pub total_bytes_after: AtomicU64,
    /// 처리 시작 시간
    start_time: Option<Instant>,
}

impl Statistics {
    /// 새 통계 인스턴스 생성
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// 파일 하나의 결과 반영
    pub fn record(&self, outcome: &Outcome) {
        match outcome {
            Outcome::Replaced {
                bytes_before,
                bytes_after,
            } => {
                self.replaced_count.fetch_add(1, Ordering::Relaxed);
                self.total_bytes_before
                    .fetch_add(*bytes_before, Ordering::Relaxed);
                self.total_bytes_after.fetch_add(*bytes_after, Ordering::Relaxed);
            }
            Outcome::Failed { .. } => {
                self.failed_count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// 성공 수 반환
    pub fn get_replaced_count(&self) -> usize {
        self.replaced_count.load(Ordering::Relaxed)
    }

    /// 실패 수 반환
    pub fn get_failed_count(&self) -> usize {
        self.failed_count.load(Ordering::Relaxed)
    }

    /// 경과 시간 반환
    pub fn elapsed(&self) -> Duration {
        self.start_time
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// 변환 통계 요약 출력
    pub fn print_summary(&self) {
        let replaced = self.get_replaced_count();
        let failed = self.get_failed_count();
        let bytes_before = self.total_bytes_before.load(Ordering::Relaxed);
        let bytes_after = self.total_bytes_after.load(Ordering::Relaxed);

        println!("\n{}", "═".repeat(50).bright_blue());
        println!("{}", " 📊 변환 통계".bright_white().bold());
        println!("{}", "═".repeat(50).bright_blue());

        println!(
            "  {} 전체 파일:    {}",
            "📁".bright_cyan(),
            self.total_files
        );
        println!(
            "  {} 교체 성공:    {}",
            "✅".bright_green(),
            replaced.to_string().green()
        );

        if failed > 0 {
            println!(
                "  {} 실패:         {}",
                "❌".bright_red(),
                failed.to_string().red()
            );
        } else {
            println!("  {} 실패:         {}", "✅".bright_green(), "0".green());
        }

        println!(
            "  {} 변환 전 용량: {}",
            "📥".bright_yellow(),
            format_bytes(bytes_before)
        );
        println!(
            "  {} 변환 후 용량: {}",
            "📤".bright_magenta(),
            format_bytes(bytes_after)
        );

        if self.total_files > 0 {
            let success_rate = (replaced as f64 / self.total_files as f64) * 100.0;
            println!(
                "  {} 성공률:       {:.1}%",
                "📈".bright_white(),
                success_rate
            );
        }

        println!(
            "  {} 처리 시간:    {}",
            "⏱️".bright_cyan(),
            format_duration(self.elapsed())
        );

        println!("{}", "═".repeat(50).bright_blue());
    }
}

/// 스캔 결과 요약 출력
pub fn print_scan_summary(examined: usize, mislabeled: usize, added: usize, elapsed: Duration) {
    println!("\n{}", "═".repeat(50).bright_blue());
    println!("{}", " 🔍 스캔 결과".bright_white().bold());
    println!("{}", "═".repeat(50).bright_blue());

    println!("  {} 검사한 파일:  {}", "📁".bright_cyan(), examined);

    if mislabeled > 0 {
        println!(
            "  {} 포맷 불일치:  {}",
            "⚠️".bright_yellow(),
            mislabeled.to_string().yellow()
        );
    } else {
        println!("  {} 포맷 불일치:  {}", "✅".bright_green(), "0".green());
    }

    println!("  {} 목록에 추가:  {}", "📝".bright_white(), added);
    println!(
        "  {} 검사 시간:    {}",
        "⏱️".bright_cyan(),
        format_duration(elapsed)
    );

    println!("{}", "═".repeat(50).bright_blue());
}

/// 바이트를 읽기 쉬운 형식으로 변환
///
/// # Examples
/// ```
/// use mislabel::stats::format_bytes;
///
/// assert_eq!(format_bytes(500), "500 B");
/// assert_eq!(format_bytes(1024), "1.00 KB");
/// assert_eq!(format_bytes(1048576), "1.00 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// 경과 시간을 읽기 쉬운 형식으로 변환
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 3600 {
        format!("{}시간 {}분", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}분 {}초", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}.{:03}초", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(5)), "5.000초");
        assert_eq!(format_duration(Duration::from_secs(65)), "1분 5초");
        assert_eq!(format_duration(Duration::from_secs(3665)), "1시간 1분");
    }

    #[test]
    fn test_record_outcomes() {
        let stats = Statistics::new(3);

        stats.record(&Outcome::Replaced {
            bytes_before: 1000,
            bytes_after: 800,
        });
        stats.record(&Outcome::Replaced {
            bytes_before: 24,
            bytes_after: 224,
        });
        stats.record(&Outcome::Failed {
            reason: "no output".to_string(),
        });

        assert_eq!(stats.get_replaced_count(), 2);
        assert_eq!(stats.get_failed_count(), 1);
        assert_eq!(stats.total_bytes_before.load(Ordering::Relaxed), 1024);
        assert_eq!(stats.total_bytes_after.load(Ordering::Relaxed), 1024);
    }
}
