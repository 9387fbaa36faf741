use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::WaitDoneArgs;

const PROGRESS_EVERY: Duration = Duration::from_secs(30);

/// Block until the expected `.done` marker files exist.
///
/// Replaces a manual sleep/ls polling loop: runs once and blocks until all
/// markers are present, or fails when the timeout is reached.
pub fn run(args: WaitDoneArgs) -> Result<()> {
    let timeout = Duration::from_secs_f64(args.timeout);
    let interval = Duration::from_secs_f64(args.interval);

    match (&args.dir, args.files.is_empty()) {
        (Some(_), false) => bail!("--dir and --files are mutually exclusive"),
        (None, true) => bail!("one of --dir or --files is required"),
        (Some(dir), true) => {
            let Some(count) = args.count else {
                bail!("--count is required when using --dir");
            };
            if !dir.is_dir() {
                bail!("not a directory: {}", dir.display());
            }
            wait_for_count(dir, count, timeout, interval)
        }
        (None, false) => wait_for_files(&args.files, timeout, interval),
    }
}

fn wait_for_count(dir: &Path, count: usize, timeout: Duration, interval: Duration) -> Result<()> {
    let start = Instant::now();
    let mut last_progress = start;

    loop {
        let found = discover_markers(dir)?;
        if found.len() >= count {
            info!(count, dir = %dir.display(), "all .done markers found");
            for path in &found {
                info!(marker = %path.display(), "marker present");
            }
            return Ok(());
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            for path in &found {
                warn!(marker = %path.display(), "marker present at timeout");
            }
            bail!(
                "timeout after {}s: found {}/{} .done markers in {}",
                elapsed.as_secs(),
                found.len(),
                count,
                dir.display()
            );
        }

        if last_progress.elapsed() >= PROGRESS_EVERY {
            info!(
                found = found.len(),
                expected = count,
                elapsed_s = elapsed.as_secs(),
                "waiting for markers"
            );
            last_progress = Instant::now();
        }

        thread::sleep(interval);
    }
}

fn wait_for_files(files: &[PathBuf], timeout: Duration, interval: Duration) -> Result<()> {
    let start = Instant::now();
    let mut last_progress = start;

    loop {
        let missing: Vec<&PathBuf> = files.iter().filter(|path| !path.exists()).collect();
        if missing.is_empty() {
            info!(count = files.len(), "all .done markers found");
            for path in files {
                info!(marker = %path.display(), "marker present");
            }
            return Ok(());
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            for path in &missing {
                warn!(marker = %path.display(), "still missing at timeout");
            }
            bail!(
                "timeout after {}s: still missing {}/{} markers",
                elapsed.as_secs(),
                missing.len(),
                files.len()
            );
        }

        if last_progress.elapsed() >= PROGRESS_EVERY {
            info!(
                found = files.len() - missing.len(),
                expected = files.len(),
                elapsed_s = elapsed.as_secs(),
                "waiting for markers"
            );
            last_progress = Instant::now();
        }

        thread::sleep(interval);
    }
}

fn discover_markers(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    let mut markers = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();

        let is_marker = path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("done"))
                .unwrap_or(false);

        if is_marker {
            markers.push(path);
        }
    }

    markers.sort();
    Ok(markers)
}
