//! mislabel - MISLABELED AUDIO FIXER
//!
//! 메인 엔트리포인트

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use mislabel::{
    cli::{Args, Commands, ConvertArgs, ScanArgs},
    coordinator::{load_queue, run_conversion},
    error::MislabelError,
    probe::{tool_available, FfprobeProbe},
    scanner::{persist, scan},
    stats::{print_scan_summary, Statistics},
    transcode::FfmpegTranscoder,
    worker::Outcome,
};

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match &args.command {
        Commands::Scan(scan_args) => run_scan(&args, scan_args),
        Commands::Convert(convert_args) => run_convert(&args, convert_args),
    }
}

/// 스캔 단계 실행
fn run_scan(args: &Args, scan_args: &ScanArgs) -> Result<()> {
    print_banner(" 🔍 MISLABELED AUDIO SCAN");
    println!("  {} 검사 폴더: {:?}", "📂".bright_cyan(), scan_args.input);
    println!("  {} 패턴: {}", "🔍".bright_magenta(), scan_args.pattern);
    println!("  {} 기대 포맷: {}", "🎵".bright_green(), scan_args.expect);
    println!("  {} 후보 목록: {:?}", "📄".bright_white(), scan_args.list);
    println!("{}", "═".repeat(50).bright_blue());

    if !tool_available(&scan_args.ffprobe) {
        println!(
            "{} {} 를 PATH에서 찾을 수 없습니다. 모든 파일이 불일치로 처리됩니다.",
            "⚠️".bright_yellow(),
            scan_args.ffprobe.yellow()
        );
    }

    // 이전 결과 삭제 여부 (기존 목록이 있을 때만 묻고, 기본값은 삭제)
    let clear = scan_args.clear
        || (scan_args.list.exists()
            && interactive(args)
            && confirm("이전 스캔 결과를 삭제할까요?", true)?);

    let config = scan_args.to_config(clear);
    let probe = FfprobeProbe::new(&scan_args.ffprobe);
    let started = Instant::now();

    println!("\n{}", "📁 파일 검사 중...".bright_cyan());
    let spinner = create_spinner();
    let report = scan(&config, &probe, |path, mislabeled| {
        spinner.inc(1);
        if mislabeled && args.verbose {
            spinner.println(format!("  {} {:?}", "✗".yellow(), path));
        }
    })
    .context("스캔 실패")?;
    spinner.finish_with_message("완료!");

    let added = persist(&report, &config.list_path, config.clear_prior_results)
        .context("후보 목록 저장 실패")?;

    print_scan_summary(
        report.examined,
        report.mislabeled.len(),
        added,
        started.elapsed(),
    );
    println!(
        "\n{} {}개 파일이 {:?}에 추가되었습니다.\n",
        "✅".bright_green(),
        added.to_string().bright_green(),
        config.list_path
    );

    Ok(())
}

/// 변환 단계 실행
fn run_convert(args: &Args, convert_args: &ConvertArgs) -> Result<()> {
    print_banner(" 🚀 MISLABELED AUDIO CONVERT");
    println!("  {} 후보 목록: {:?}", "📄".bright_white(), convert_args.list);
    println!("  {} 실패 목록: {:?}", "📝".bright_white(), convert_args.failures);
    println!("  {} 워커 수: {}", "⚙️".bright_yellow(), convert_args.workers);
    println!("  {} 코덱: {}", "🎵".bright_green(), convert_args.codec);
    if let Some(timeout) = convert_args.timeout {
        println!("  {} 제한 시간: {:?}", "⏱️".bright_cyan(), timeout);
    }
    if convert_args.dry_run {
        println!(
            "  {} {}",
            "⚠️".bright_yellow(),
            "드라이런 모드 (실제 변환 없음)".yellow()
        );
    }
    println!("{}", "═".repeat(50).bright_blue());

    // 미리 읽어 누락 파일 안내와 드라이런에만 사용. 실제 실행은 run_conversion이 다시 읽음
    let (preview, dropped) = match load_queue(&convert_args.list) {
        Ok(loaded) => loaded,
        Err(MislabelError::MissingCandidateList { path }) => {
            anyhow::bail!(
                "후보 목록 파일이 없습니다: {:?} (먼저 `mislabel scan`을 실행하세요)",
                path
            );
        }
        Err(e) => return Err(anyhow::Error::new(e).context("후보 목록 로드 실패")),
    };

    if !dropped.is_empty() {
        print_paths("❓ 존재하지 않아 제외된 파일:", &dropped, args.verbose);
    }

    if preview.is_empty() {
        println!("{}", "⚠️ 변환할 파일이 없습니다.".yellow());
    } else {
        println!(
            "  {} 변환 대상 파일 수: {}",
            "📋".bright_white(),
            preview.len().to_string().bright_green()
        );
    }

    if convert_args.dry_run {
        print_dry_run(&preview.snapshot());
        return Ok(());
    }

    let proceed = dropped.is_empty()
        || !interactive(args)
        || confirm("나머지 파일로 계속할까요?", true)?;

    if !preview.is_empty() && !tool_available(&convert_args.ffmpeg) {
        println!(
            "{} {} 를 PATH에서 찾을 수 없습니다. 모든 파일이 실패로 기록됩니다.",
            "⚠️".bright_yellow(),
            convert_args.ffmpeg.yellow()
        );
    }

    let config = convert_args.to_config(proceed);
    let transcoder = FfmpegTranscoder::new(&convert_args.ffmpeg, &convert_args.codec)
        .with_timeout(convert_args.timeout);
    let stats = Statistics::new(preview.len());
    let pb = create_progress_bar(preview.len());

    if proceed {
        println!("\n{}", "⚡ 병렬 변환 중...".bright_cyan());
    }

    let result = run_conversion(&config, &transcoder, &|path: &Path, outcome: &Outcome| {
        stats.record(outcome);
        pb.inc(1);
        if args.verbose {
            let mark = if outcome.is_replaced() {
                "✓".green()
            } else {
                "✗".red()
            };
            pb.println(format!("  {} {:?}", mark, path));
        }
    });

    let report = match result {
        Ok(report) => report,
        Err(MislabelError::Declined { .. }) => {
            pb.finish_and_clear();
            println!(
                "\n{} 변환을 중단했습니다. 변경된 파일은 없습니다.\n",
                "ℹ️".bright_blue()
            );
            return Ok(());
        }
        Err(e) => return Err(anyhow::Error::new(e).context("워커 풀 실행 실패")),
    };

    pb.finish_with_message("완료!");

    print_paths("❌ 변환 실패 파일:", &report.failed, args.verbose);
    stats.print_summary();

    if report.failed.is_empty() {
        println!("\n{} 모든 파일을 교체했습니다!\n", "✅".bright_green());
    } else {
        println!(
            "\n{} {} 개의 파일이 실패했습니다. 목록: {:?}\n",
            "⚠️".bright_yellow(),
            report.failed.len().to_string().red(),
            config.failure_path
        );
    }

    Ok(())
}

/// 질문을 해도 되는지 (--yes 없음 + 터미널 입력)
fn interactive(args: &Args) -> bool {
    !args.yes && io::stdin().is_terminal()
}

/// 예/아니오 질문. 빈 입력은 기본값
fn confirm(question: &str, default: bool) -> Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    let stdin = io::stdin();

    loop {
        print!("{} {} {} ", "❔".bright_cyan(), question, hint.dimmed());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(default);
        }

        match line.trim().to_ascii_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("  y 또는 n을 입력하세요."),
        }
    }
}

/// 헤더 출력
fn print_banner(title: &str) {
    println!("\n{}", "═".repeat(50).bright_blue());
    println!("{}", title.bright_white().bold());
    println!("{}", "═".repeat(50).bright_blue());
}

/// 드라이런 출력
fn print_dry_run(paths: &[PathBuf]) {
    println!("\n{}", "📋 변환 예정 파일 목록:".bright_cyan());
    for (i, path) in paths.iter().enumerate() {
        println!("  {}. {:?}", i + 1, path);
    }
    println!(
        "\n{} 총 {} 개의 파일이 변환될 예정입니다.",
        "ℹ️".bright_blue(),
        paths.len().to_string().bright_green()
    );
}

/// 경로 목록 출력 (verbose가 아니면 10개까지만)
fn print_paths(title: &str, paths: &[PathBuf], verbose: bool) {
    if paths.is_empty() {
        return;
    }

    const PREVIEW: usize = 10;
    let shown = if verbose { paths.len() } else { PREVIEW.min(paths.len()) };

    println!("\n{}", title.bright_red());
    for path in &paths[..shown] {
        println!("  {} {:?}", "•".red(), path);
    }
    if shown < paths.len() {
        println!("  {} 외 {}개", "…".dimmed(), paths.len() - shown);
    }
}

/// 진행률 바 생성
fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("█▓▒░"));
    }
    pb
}

/// 스캔용 스피너 생성 (전체 개수를 미리 세지 않음)
fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos}개 검사 {msg}")
    {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
