//! Progress line rewritten in place on stderr.

use std::io::{self, Write};
use std::sync::Arc;

use tickvault_core::ProgressObserver;

fn format_progress(completed: usize, total: usize) -> String {
    let percent = if total == 0 {
        100
    } else {
        completed * 100 / total
    };
    format!("{completed}/{total} archives ({percent}%)")
}

/// Observer that rewrites one stderr line per settled archive and finishes
/// it with a newline once the run completes.
pub fn stderr_observer() -> ProgressObserver {
    Arc::new(|completed, total| {
        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "\r{}", format_progress(completed, total));
        if completed >= total {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    })
}
