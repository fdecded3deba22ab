use std::{thread, time::Duration};

use log::*;
use serde::Serialize;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind, Users};

use crate::config::SnapshotSettings;

pub mod format;
pub mod record;
pub mod source;

pub use record::ProcessRecord;
use source::SysinfoProcess;

/// Takes point in time, htop style views of the process table.
///
/// Holds no scan state between calls: every [`Collector::collect`] walks the
/// whole table again, so one Collector can serve any number of callers.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    settings: SnapshotSettings,
}

impl Collector {
    pub fn new(settings: SnapshotSettings) -> Self {
        Self { settings }
    }

    /// Scan all processes and return the busiest ones first.
    ///
    /// CPU usage needs two scans; the call blocks for `sample_ms` between them.
    pub fn collect(&self) -> Vec<ProcessRecord> {
        let kind = ProcessRefreshKind::nothing()
            .with_cpu()
            .with_memory()
            .with_user(UpdateKind::OnlyIfNotSet)
            .with_cmd(UpdateKind::OnlyIfNotSet);
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_processes_specifics(ProcessesToUpdate::All, true, kind);
        if self.settings.sample_ms > 0 {
            thread::sleep(Duration::from_millis(self.settings.sample_ms));
            sys.refresh_processes_specifics(ProcessesToUpdate::All, true, kind);
        }
        let users = Users::new_with_refreshed_list();
        let total_memory = sys.total_memory();

        let records: Vec<ProcessRecord> = sys
            .processes()
            .values()
            .filter(|p| p.thread_kind().is_none())
            .filter_map(|p| {
                ProcessRecord::extract(
                    &SysinfoProcess::new(p, &users, total_memory),
                    &self.settings,
                )
            })
            .collect();
        debug!(target: "Snapshot", "Scanned {} processes", records.len());
        rank(records, self.settings.limit)
    }
}

/// Sort by CPU usage, highest first, and keep the first `limit`.
///
/// The sort is stable, so equal CPU values keep their scan order (which is
/// itself unordered).
pub fn rank(mut records: Vec<ProcessRecord>, limit: usize) -> Vec<ProcessRecord> {
    records.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
    records.truncate(limit);
    records
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminateError {
    pub pid: u32,
    pub error: String,
}

/// Outcome of a kill request. Per-pid failures are listed, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminateReport {
    pub success: bool,
    pub errors: Vec<TerminateError>,
}

/// Send a kill signal to each of `pids`.
pub fn terminate(pids: &[u32]) -> TerminateReport {
    let targets: Vec<Pid> = pids.iter().map(|p| Pid::from_u32(*p)).collect();
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&targets),
        true,
        ProcessRefreshKind::nothing(),
    );
    let mut errors = Vec::new();
    for (pid, target) in pids.iter().zip(&targets) {
        let error = match sys.process(*target) {
            None => Some("No such process"),
            Some(process) if process.kill() => None,
            Some(_) => Some("Access denied"),
        };
        match error {
            Some(error) => {
                warn!(target: "Snapshot", "Cannot kill {}: {}", pid, error);
                errors.push(TerminateError {
                    pid: *pid,
                    error: error.to_string(),
                });
            }
            None => info!(target: "Snapshot", "Killed {}", pid),
        }
    }
    TerminateReport {
        success: true,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::record::tests::FakeProcess;

    fn records(cpus: &[f32]) -> Vec<ProcessRecord> {
        cpus.iter()
            .enumerate()
            .filter_map(|(i, cpu)| {
                ProcessRecord::extract(
                    &FakeProcess::full(i as u32 + 1, *cpu),
                    &SnapshotSettings::default(),
                )
            })
            .collect()
    }

    #[test]
    fn rank_orders_by_cpu_descending() {
        let ranked = rank(records(&[0.5, 80.0, 0.0, 12.5, 80.0]), 100);
        let cpus: Vec<f32> = ranked.iter().map(|r| r.cpu_percent).collect();
        assert_eq!(cpus, vec![80.0, 80.0, 12.5, 0.5, 0.0]);
        let pids: Vec<u32> = ranked.iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![2, 5, 4, 1, 3]);
    }

    #[test]
    fn rank_truncates() {
        let many: Vec<f32> = (0..250).map(|i| i as f32 / 10.0).collect();
        let ranked = rank(records(&many), 100);
        assert_eq!(ranked.len(), 100);
        assert_eq!(ranked[0].cpu_percent, 24.9);
        assert!(ranked.windows(2).all(|w| w[0].cpu_percent >= w[1].cpu_percent));
    }

    #[test]
    fn collect_live_table() {
        let collector = Collector::new(SnapshotSettings {
            sample_ms: 0,
            ..Default::default()
        });
        let snapshot = collector.collect();
        assert!(!snapshot.is_empty());
        assert!(snapshot.len() <= 100);
        assert!(snapshot.windows(2).all(|w| w[0].cpu_percent >= w[1].cpu_percent));
        assert!(snapshot.iter().all(|r| r.command.chars().count() <= 100));
        assert!(snapshot.iter().all(|r| r.user.chars().count() <= 8));
    }

    #[test]
    fn collect_finds_this_process() {
        let collector = Collector::new(SnapshotSettings {
            limit: usize::MAX,
            sample_ms: 0,
            ..Default::default()
        });
        let own = std::process::id();
        let snapshot = collector.collect();
        let me = snapshot.iter().find(|r| r.pid == own).unwrap();
        assert!(["R", "S", "D"].contains(&me.s.as_str()));
        assert_ne!(me.time, "NA");
    }

    #[test]
    fn terminate_unknown_pid() {
        let report = terminate(&[999_999_999]);
        assert!(report.success);
        assert_eq!(
            report.errors,
            vec![TerminateError {
                pid: 999_999_999,
                error: "No such process".to_string()
            }]
        );
    }

    #[cfg(unix)]
    #[test]
    fn terminate_child() {
        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let report = terminate(&[child.id()]);
        assert!(report.errors.is_empty());
        let status = child.wait().unwrap();
        assert!(!status.success());
    }
}
