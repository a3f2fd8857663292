//! Command execution channel to the device
//!
//! Everything the adb provider does goes through [`Bridge`]: one argv in,
//! stdout text out. Transfer commands additionally stream their stderr so
//! `[ NN%]` markers can be turned into progress callbacks.

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use regex::Regex;

use super::{ProviderError, ProviderResult};

/// Executes bridge commands
pub trait Bridge: Send {
    /// Run the bridge with `args` and return its stdout.
    /// Non-zero exit fails with the diagnostic output; a spawn failure
    /// (executable missing) fails with the I/O error unchanged.
    fn execute(&self, args: &[&str]) -> ProviderResult<String>;

    /// Run a transfer command, reporting every percentage marker seen on
    /// its diagnostic stream as a fraction in 0..=1
    fn execute_with_progress(
        &self,
        args: &[&str],
        on_progress: &mut dyn FnMut(f64),
    ) -> ProviderResult<()>;
}

/// Bridge backed by the `adb` executable
#[derive(Debug, Clone)]
pub struct AdbBridge {
    program: String,
    serial: Option<String>,
}

impl AdbBridge {
    pub fn new(program: impl Into<String>, serial: Option<String>) -> Self {
        Self {
            program: program.into(),
            serial,
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd.args(args);
        log::debug!("bridge: {} {}", self.program, args.join(" "));
        cmd
    }

    fn failure(&self, code: Option<i32>, diagnostics: &str) -> ProviderError {
        let message = diagnostics.trim();
        let message = if message.is_empty() {
            match code {
                Some(code) => format!("{} exited with code {}", self.program, code),
                None => format!("{} was terminated by a signal", self.program),
            }
        } else {
            message.to_string()
        };
        ProviderError::Command { code, message }
    }
}

impl Default for AdbBridge {
    fn default() -> Self {
        Self::new("adb", None)
    }
}

impl Bridge for AdbBridge {
    fn execute(&self, args: &[&str]) -> ProviderResult<String> {
        let output = self.command(args).stdin(Stdio::null()).output()?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(self.failure(output.status.code(), &stderr))
        }
    }

    fn execute_with_progress(
        &self,
        args: &[&str],
        on_progress: &mut dyn FnMut(f64),
    ) -> ProviderResult<()> {
        let mut child = self
            .command(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let diagnostics = match child.stderr.take() {
            Some(stderr) => read_diagnostics(stderr, on_progress),
            None => Vec::new(),
        };

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            let diagnostics = String::from_utf8_lossy(&diagnostics);
            Err(self.failure(status.code(), &strip_progress(&diagnostics)))
        }
    }
}

/// Read a diagnostic stream to the end, reporting progress markers as they
/// arrive. The raw bytes are returned so text split mid-character between
/// reads decodes intact.
fn read_diagnostics(mut stream: impl Read, on_progress: &mut dyn FnMut(f64)) -> Vec<u8> {
    let mut raw = Vec::new();
    let mut scanner = ProgressScanner::default();
    let mut buf = [0u8; 4096];
    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("bridge: reading diagnostics failed: {}", e);
                break;
            }
        };
        raw.extend_from_slice(&buf[..n]);
        for fraction in scanner.feed(&String::from_utf8_lossy(&buf[..n])) {
            on_progress(fraction);
        }
    }
    raw
}

static PERCENT_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[\s*(\d{1,3})%\]").ok());

/// Longest unterminated "[..." tail carried over to the next chunk
const MAX_PENDING: usize = 16;

/// Extracts `[NN%]` markers from a stream that arrives in arbitrary chunks.
/// A marker split across two chunks is still reported once.
#[derive(Debug, Default)]
pub struct ProgressScanner {
    pending: String,
}

impl ProgressScanner {
    /// Feed the next chunk; returns the fractions of all complete markers in it
    pub fn feed(&mut self, chunk: &str) -> Vec<f64> {
        self.pending.push_str(chunk);

        let Some(re) = PERCENT_RE.as_ref() else {
            self.pending.clear();
            return Vec::new();
        };

        let mut fractions = Vec::new();
        let mut consumed = 0;
        for caps in re.captures_iter(&self.pending) {
            if let Some(pct) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                fractions.push(f64::from(pct.min(100)) / 100.0);
            }
            if let Some(whole) = caps.get(0) {
                consumed = whole.end();
            }
        }

        let tail = &self.pending[consumed..];
        let carry = match tail.rfind('[') {
            Some(idx) if !tail[idx..].contains(']') && tail.len() - idx <= MAX_PENDING => {
                tail[idx..].to_string()
            }
            _ => String::new(),
        };
        self.pending = carry;

        fractions
    }
}

/// Drop the progress lines from diagnostics so error messages stay readable
fn strip_progress(diagnostics: &str) -> String {
    diagnostics
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| PERCENT_RE.as_ref().is_none_or(|re| !re.is_match(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Quote a path for the device shell (`adb shell` joins its arguments and
/// hands them to `sh -c`)
pub fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}
