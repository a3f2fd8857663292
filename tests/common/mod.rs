//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use adb_commander::fs::ListingParser;
use adb_commander::providers::{AdbProvider, Bridge, ProviderError, ProviderResult};

type Handler = dyn Fn(&[String]) -> ProviderResult<String> + Send + Sync;

/// Bridge that answers from a closure and records every argv it was given
#[derive(Clone)]
pub struct FakeBridge {
    handler: Arc<Handler>,
    progress: Vec<f64>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeBridge {
    pub fn new(handler: impl Fn(&[String]) -> ProviderResult<String> + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            progress: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fractions every transfer command reports before it finishes
    pub fn with_progress(mut self, progress: &[f64]) -> Self {
        self.progress = progress.to_vec();
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded calls whose first argument is `verb`
    pub fn calls_to(&self, verb: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|c| c.first().map(String::as_str) == Some(verb))
            .collect()
    }

    pub fn provider(&self) -> AdbProvider {
        AdbProvider::new(Box::new(self.clone()), "/sdcard").with_parser(ListingParser::with_year(2024))
    }

    fn record(&self, args: &[&str]) -> Vec<String> {
        let argv: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.calls.lock().unwrap().push(argv.clone());
        argv
    }
}

impl Bridge for FakeBridge {
    fn execute(&self, args: &[&str]) -> ProviderResult<String> {
        let argv = self.record(args);
        (self.handler)(&argv)
    }

    fn execute_with_progress(&self, args: &[&str], on_progress: &mut dyn FnMut(f64)) -> ProviderResult<()> {
        let argv = self.record(args);
        for fraction in &self.progress {
            on_progress(*fraction);
        }
        (self.handler)(&argv).map(drop)
    }
}

pub fn command_error(message: &str) -> ProviderError {
    ProviderError::Command {
        code: Some(1),
        message: message.to_string(),
    }
}

/// `ls -la /sdcard` as printed by toybox
pub const SDCARD_LISTING: &str = "\
total 48
drwxrwx--x  8 root sdcard_rw 4096 2024-01-15 10:30 .
drwx--x--x  4 root sdcard_rw 4096 2024-01-10 08:00 ..
drwxrwx--x  2 root sdcard_rw 4096 2024-01-12 09:15 .thumbnails
drwxrwx--x  2 root sdcard_rw 4096 2024-01-15 10:30 Download
drwxrwx--x  5 root sdcard_rw 4096 2024-01-14 18:02 DCIM
-rw-rw----  1 root sdcard_rw 1536 2024-01-13 11:11 notes.txt
-rw-rw----  1 root sdcard_rw   12 2024-01-13 11:12 .nomedia
lrwxrwxrwx  1 root root        21 2024-01-13 11:13 music -> /storage/emulated/0/Music
";

/// Answer `shell ls -la '<path>/'` with `listing` for /sdcard and "no such
/// file" for anything else; every other command succeeds with no output
pub fn sdcard_device(listing: &'static str) -> FakeBridge {
    FakeBridge::new(move |argv| {
        if argv.first().map(String::as_str) == Some("shell") && argv.get(1).map(String::as_str) == Some("ls") {
            return match argv.last().map(String::as_str) {
                Some("'/sdcard/'") => Ok(listing.to_string()),
                Some(path) => Err(command_error(&format!("ls: {}: No such file or directory", path.trim_matches('\'')))),
                None => Ok(String::new()),
            };
        }
        Ok(String::new())
    })
}
