//! mislabel - MISLABELED AUDIO FIXER
//!
//! 확장자(예: `.mp3`)와 실제 인코딩 포맷이 다른 오디오 파일을 찾아
//! 외부 코덱 도구로 다시 인코딩한 뒤 원본 자리에 교체하는 CLI 도구입니다.
//!
//! # 주요 기능
//!
//! - 🔍 **포맷 검사**: ffprobe로 확장자가 아닌 실제 포맷을 확인
//! - 📝 **후보 목록**: 검사 결과를 줄 단위 텍스트 파일에 누적
//! - 🚀 **병렬 변환**: 고정 크기 워커 풀이 공유 큐에서 파일을 가져가 동시에 변환
//! - 🛡️ **안전한 교체**: 임시 폴더에 변환 후, 결과가 있을 때만 원본을 교체
//! - ❌ **실패 기록**: 개별 파일 실패는 전체 작업을 멈추지 않고 실패 목록에 저장
//! - ⏱️ **제한 시간**: 멈춘 변환 프로세스를 선택적으로 종료
//!
//! # 예제
//!
//! ```bash
//! # 1단계: 검사
//! mislabel scan -i ~/Music
//!
//! # 2단계: 변환 (워커 8개)
//! mislabel convert -j 8
//! ```

pub mod candidates;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod pattern;
pub mod probe;
pub mod queue;
pub mod scanner;
pub mod stats;
pub mod transcode;
pub mod worker;

// Re-exports for convenient access
pub use cli::Args;
pub use config::{ConvertConfig, ScanConfig};
pub use coordinator::{run_conversion, ConversionReport, ScratchTree};
pub use error::{MislabelError, Result};
pub use pattern::PatternMatcher;
pub use probe::{FfprobeProbe, FormatProbe};
pub use queue::{FailureLedger, WorkQueue};
pub use scanner::{scan, ScanReport};
pub use stats::{format_bytes, Statistics};
pub use transcode::{FfmpegTranscoder, Transcoder};
pub use worker::{ConversionWorker, Outcome};
