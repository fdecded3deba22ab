use std::{fmt, time::Duration};

use serde::{Serialize, Serializer};

use crate::{
    config::SnapshotSettings,
    snapshot::format::{NA, format_bytes, format_percent, format_time, truncate},
};

/// Sentinel for a process owner that could not be resolved.
pub const UNKNOWN_USER: &str = "unknown";

/// Column titles matching the [`fmt::Display`] layout of a record.
pub const TEXT_HEADER: &str =
    "    PID USER      PR  NI    VIRT     RES     SHR S  CPU%  MEM%     TIME+ Command";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    pub virt: u64,
    pub res: u64,
    pub shr: Option<u64>,
}

/// Raw per-process readings. Each method stands alone so one field failing
/// never costs the others; `None` means the value could not be read.
pub trait ProcessSource {
    fn pid(&self) -> u32;
    /// False once the process has gone away.
    fn exists(&self) -> bool;
    fn name(&self) -> Option<String>;
    fn cmdline(&self) -> Option<Vec<String>>;
    fn user(&self) -> Option<String>;
    fn nice(&self) -> Option<i32>;
    fn memory(&self) -> Option<MemoryInfo>;
    fn cpu_percent(&self) -> Option<f32>;
    fn mem_percent(&self) -> Option<f32>;
    /// Single letter state code, see [`crate::snapshot::source::status_code`].
    fn status(&self) -> Option<&'static str>;
    fn cpu_time(&self) -> Option<Duration>;
}

/// One row of the process table, shaped for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub user: String,
    pub pr: String,
    pub ni: String,
    pub virt: String,
    pub res: String,
    pub shr: String,
    pub s: String,
    #[serde(rename = "cpu", serialize_with = "one_decimal")]
    pub cpu_percent: f32,
    #[serde(rename = "mem", serialize_with = "one_decimal")]
    pub mem_percent: f32,
    pub time: String,
    pub command: String,
}

fn one_decimal<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_percent(*value))
}

impl ProcessRecord {
    /// Read every field from `source`, substituting sentinels for whatever
    /// is unavailable. Returns `None` if the process is already gone.
    pub fn extract<P: ProcessSource>(source: &P, limits: &SnapshotSettings) -> Option<Self> {
        if !source.exists() {
            return None;
        }
        let status = source.status();
        let user = source
            .user()
            .map(|u| truncate(&u, limits.user_width))
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        let nice = match status {
            Some("Z") => None,
            _ => source.nice(),
        }
        .map(|n| n.to_string())
        .unwrap_or_else(|| NA.to_string());
        let (virt, res, shr) = match source.memory() {
            Some(mem) => (
                format_bytes(mem.virt as f64),
                format_bytes(mem.res as f64),
                mem.shr
                    .map(|s| format_bytes(s as f64))
                    .unwrap_or_else(|| NA.to_string()),
            ),
            None => (NA.to_string(), NA.to_string(), NA.to_string()),
        };
        let command = match source.cmdline() {
            Some(args) if !args.is_empty() => args.join(" "),
            _ => source.name().unwrap_or_default(),
        };
        Some(Self {
            pid: source.pid(),
            user,
            pr: nice.clone(),
            ni: nice,
            virt,
            res,
            shr,
            s: status.unwrap_or("?").to_string(),
            cpu_percent: source.cpu_percent().unwrap_or(0.0),
            mem_percent: source.mem_percent().unwrap_or(0.0),
            time: source
                .cpu_time()
                .map(|t| format_time(t.as_secs_f64()))
                .unwrap_or_else(|| NA.to_string()),
            command: truncate(&command, limits.command_width),
        })
    }

    /// Lowercase substring match against every displayed column.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        [
            self.pid.to_string(),
            self.user.to_lowercase(),
            self.command.to_lowercase(),
            format_percent(self.cpu_percent),
            format_percent(self.mem_percent),
            self.virt.to_lowercase(),
            self.res.to_lowercase(),
            self.shr.to_lowercase(),
            self.time.to_lowercase(),
            self.pr.to_lowercase(),
            self.ni.to_lowercase(),
            self.s.to_lowercase(),
        ]
        .iter()
        .any(|field| field.contains(&term))
    }
}

impl fmt::Display for ProcessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>7} {:<8} {:>3} {:>3} {:>7} {:>7} {:>7} {:1} {:>5} {:>5} {:>9} {}",
            self.pid,
            self.user,
            self.pr,
            self.ni,
            self.virt,
            self.res,
            self.shr,
            self.s,
            format_percent(self.cpu_percent),
            format_percent(self.mem_percent),
            self.time,
            self.command
        )
    }
}
