//! Copy every file in a directory using a bounded worker pool
//!
//! Usage: cargo run --example copy_files -- <src-dir> <dst-dir> [workers]
//!
//! Set RUST_LOG=workpool=debug to see the executor's lifecycle events.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use workpool::prelude::*;

fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn copy_one(src: &Path, dst_dir: &Path) -> std::io::Result<u64> {
    let data = std::fs::read(src)?;
    let name = src
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"))?;
    std::fs::write(dst_dir.join(name), &data)?;
    Ok(data.len() as u64)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let (src, dst) = match (args.next(), args.next()) {
        (Some(src), Some(dst)) => (PathBuf::from(src), PathBuf::from(dst)),
        _ => {
            eprintln!("usage: copy_files <src-dir> <dst-dir> [workers]");
            std::process::exit(2);
        }
    };
    let workers = args
        .next()
        .and_then(|w| w.parse().ok())
        .unwrap_or_else(num_cpus_fallback);

    std::fs::create_dir_all(&dst)?;
    let files = list_files(&src)?;

    let config = Config::builder()
        .num_workers(workers)
        .thread_name_prefix("copy")
        .stall_timeout(Duration::from_secs(5))
        .build()?;

    println!("=== Copying {} files with {} workers ===\n", files.len(), workers);

    let report = Executor::new(config)?.run(files, |path| copy_one(path, &dst))?;

    for outcome in report.in_submission_order() {
        match &outcome.outcome {
            Outcome::Succeeded(bytes) => {
                println!("   ✓ {} ({} bytes)", outcome.id.display(), bytes)
            }
            Outcome::Failed(err) => println!("   ✗ {}: {}", outcome.id.display(), err),
            Outcome::Aborted => println!("   - {}: aborted", outcome.id.display()),
        }
    }

    let metrics = report.metrics();
    println!(
        "\n{} copied, {} failed in {:?} ({:.1} files/s, p99 {} µs)",
        report.succeeded(),
        report.failed(),
        report.elapsed(),
        metrics.tasks_per_second(),
        metrics.p99_latency_ns / 1_000
    );

    if report.is_success() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn num_cpus_fallback() -> usize {
    Config::default().worker_threads()
}
