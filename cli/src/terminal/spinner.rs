use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

static ACTIVE: Mutex<Option<ProgressBar>> = Mutex::new(None);

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

/// Shows a spinner until [`finish`] is called. Log lines are printed above it.
pub fn start(total: usize) {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_strings(TICKS));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(progress_message(0, total));

    if let Ok(mut active) = ACTIVE.lock() {
        *active = Some(pb);
    }
}

pub fn report_progress(settled: usize, total: usize) {
    if let Ok(active) = ACTIVE.lock()
        && let Some(pb) = active.as_ref()
    {
        pb.set_message(progress_message(settled, total));
    }
}

pub fn finish() {
    if let Ok(mut active) = ACTIVE.lock()
        && let Some(pb) = active.take()
    {
        pb.finish_and_clear();
    }
}

fn progress_message(settled: usize, total: usize) -> String {
    format!(
        "{}/{} hosts settled",
        settled.to_string().green().bold(),
        total.to_string().bold()
    )
}

/// Routes log output above the spinner while one is running.
pub struct SpinnerWriter;

impl Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(active) = ACTIVE.lock()
            && let Some(pb) = active.as_ref()
            && !pb.is_hidden()
        {
            let msg = String::from_utf8_lossy(buf);
            pb.println(msg.trim_end());
            return Ok(buf.len());
        }

        std::io::stderr().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stderr().flush()
    }
}
