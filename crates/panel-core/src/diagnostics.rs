//! Optional logger wiring for example binaries and integration tests.
//!
//! This module never runs on its own — nothing in `panel-core` installs a
//! global logger for you (a library shouldn't), but something has to, or
//! every `log::trace!`/`log::debug!`/`log::warn!` call threaded through
//! the message loop and signal bus lands in the void. `init_logger` is
//! that something, split into a native, file-backed variant and a
//! browser-console variant for `wasm32`, where there is no filesystem
//! to append to.

use log::LevelFilter;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use log::{Level, Metadata, Record};
    use std::fs::OpenOptions;
    use std::io::Write;

    pub struct FileLogger {
        file_path: String,
    }

    impl FileLogger {
        pub fn new(file_path: &str) -> Self {
            Self {
                file_path: file_path.to_string(),
            }
        }
    }

    impl log::Log for FileLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= Level::Trace
        }

        fn log(&self, record: &Record) {
            if !self.enabled(record.metadata()) {
                return;
            }
            if let Ok(mut file) = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.file_path)
            {
                let _ = writeln!(
                    file,
                    "[{}] {}: {}",
                    record.level(),
                    record.target(),
                    record.args()
                );
            }
        }

        fn flush(&self) {}
    }
}

/// Install a process-wide logger writing to `file_path`, at `Trace` and
/// above. Intended for example binaries and native integration tests —
/// call once, near the top of `main`.
///
/// # Panics
/// Panics if a logger has already been installed (same contract as
/// [`log::set_boxed_logger`]).
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logger(file_path: &str) {
    log::set_boxed_logger(Box::new(file::FileLogger::new(file_path)))
        .expect("a logger is already installed");
    log::set_max_level(LevelFilter::Trace);
}

/// Install a process-wide logger writing to the browser console via
/// `web_sys::console`, color-coded by level. The `wasm32` counterpart of
/// [`init_logger`] — there is no file to append to inside a browser
/// sandbox.
#[cfg(target_arch = "wasm32")]
pub fn init_logger(_file_path: &str) {
    console_log::init_with_level(log::Level::Trace).expect("a logger is already installed");
    log::set_max_level(LevelFilter::Trace);
}
