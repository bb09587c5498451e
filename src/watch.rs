use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use notify::{EventKind, RecursiveMode, Watcher};

use crate::allocator::calculate;
use crate::currency::Currency;
use crate::input::{load_document, problems};
use crate::output;

pub struct WatchOptions {
    pub file: PathBuf,
    pub interval: u64,
    pub columns: Vec<String>,
    pub currency: Currency,
}

pub fn run(opts: &WatchOptions) -> Result<()> {
    let interval = Duration::from_secs(opts.interval);

    // Initial render
    render(opts)?;

    // Editors often replace the file instead of writing it in place, so
    // watch the parent directory and filter by file name.
    let file = opts
        .file
        .canonicalize()
        .with_context(|| format!("cannot watch {}", opts.file.display()))?;
    let dir = file
        .parent()
        .map(Path::to_path_buf)
        .context("document has no parent directory")?;
    let name = file.file_name().map(|n| n.to_os_string());

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let ours = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == name);
            match event.kind {
                EventKind::Create(_) | EventKind::Modify(_) if ours => {
                    let _ = tx.send(());
                }
                _ => {}
            }
        }
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    tracing::info!(path = %file.display(), "watching for changes");

    // Event loop with debounce
    while let Ok(()) = rx.recv() {
        // Debounce: drain any additional events within the interval
        let deadline = Instant::now() + interval;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match rx.recv_timeout(remaining) {
                Ok(()) => continue,
                Err(mpsc::RecvTimeoutError::Timeout) => break,
                Err(mpsc::RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }

        render(opts)?;
    }

    Ok(())
}

/// Redraw the full table. A half-saved or invalid document is reported and
/// the previous screen is replaced by the error, without stopping the watch.
fn render(opts: &WatchOptions) -> Result<()> {
    // Clear screen and move cursor to top-left
    print!("\x1b[2J\x1b[H");
    std::io::stdout().flush()?;

    let inputs = match load_document(&opts.file).and_then(|doc| Ok(doc.normalize()?)) {
        Ok(inputs) => inputs,
        Err(e) => {
            tracing::warn!("skipping recalculation: {e:#}");
            println!("{}: {e:#}", opts.file.display());
            return Ok(());
        }
    };

    let found = problems(&inputs);
    if !found.is_empty() {
        output::print_problems(&found);
        return Ok(());
    }

    let results = calculate(&inputs.setup, &inputs.products);
    println!("{}", output::compact_line(&results, &opts.currency));
    output::print_results(&results, &opts.columns, &opts.currency);

    Ok(())
}
