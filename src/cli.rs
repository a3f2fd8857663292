use std::str::FromStr;

use clap::{Parser, Subcommand};

use adb_commander::providers::BackendKind;

/// adbc - browse and move files between this machine and an Android device
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether a device is attached and ready
    Devices,

    /// List a directory the way a panel shows it
    Ls {
        /// Backend to list: "local" or "adb"
        #[arg(value_name = "BACKEND")]
        backend: Backend,
        /// Directory; the backend's home when omitted
        #[arg(value_name = "PATH")]
        path: Option<String>,
        /// Include hidden entries (names starting with '.')
        #[arg(short = 'a', long)]
        all: bool,
    },

    /// Copy items into a directory, e.g. `cp local:/tmp/a.txt adb:/sdcard/Download`
    Cp {
        #[arg(value_name = "SOURCE", required = true)]
        sources: Vec<Location>,
        #[arg(value_name = "DEST_DIR")]
        dest: Location,
    },

    /// Move items into a directory
    Mv {
        #[arg(value_name = "SOURCE", required = true)]
        sources: Vec<Location>,
        #[arg(value_name = "DEST_DIR")]
        dest: Location,
    },

    /// Delete files or directory trees
    Rm {
        #[arg(value_name = "PATH", required = true)]
        targets: Vec<Location>,
        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Create a directory and any missing parents
    Mkdir {
        #[arg(value_name = "PATH")]
        target: Location,
    },

    /// Show type, size and modification time of a device path
    Stat {
        #[arg(value_name = "DEVICE_PATH")]
        path: String,
    },

    /// Show entries whose names exist in only one of two directories
    Diff {
        #[arg(value_name = "LEFT")]
        left: Location,
        #[arg(value_name = "RIGHT")]
        right: Location,
    },

    /// Remember which device to talk to; without a serial, forget it
    Use {
        #[arg(value_name = "SERIAL")]
        serial: Option<String>,
    },
}

/// Backend name on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backend(pub BackendKind);

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Backend(BackendKind::Local)),
            "adb" | "device" => Ok(Backend(BackendKind::Adb)),
            other => Err(format!("unknown backend '{}' (expected local or adb)", other)),
        }
    }
}

/// `<backend>:<path>`; a bare path means the local filesystem
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub kind: BackendKind,
    pub path: String,
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((prefix, path)) = s.split_once(':')
            && let Ok(Backend(kind)) = prefix.parse::<Backend>()
        {
            if path.is_empty() {
                return Err(format!("missing path after '{}:'", prefix));
            }
            return Ok(Location {
                kind,
                path: path.to_string(),
            });
        }
        Ok(Location {
            kind: BackendKind::Local,
            path: s.to_string(),
        })
    }
}
