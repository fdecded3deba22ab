use std::time::Duration;

use sysinfo::{ProcessStatus, Users};

use crate::snapshot::record::{MemoryInfo, ProcessSource};

/// Letter used in the `S` column for each process state.
pub fn status_code(status: ProcessStatus) -> &'static str {
    match status {
        ProcessStatus::Run => "R",
        ProcessStatus::Sleep => "S",
        ProcessStatus::UninterruptibleDiskSleep => "D",
        ProcessStatus::Stop => "T",
        ProcessStatus::Tracing => "t",
        ProcessStatus::Zombie => "Z",
        ProcessStatus::Dead => "X",
        ProcessStatus::Wakekill => "K",
        ProcessStatus::Waking => "W",
        ProcessStatus::Idle => "I",
        ProcessStatus::LockBlocked => "L",
        _ => "?",
    }
}

/// A process as seen by the last sysinfo scan, topped up from procfs on Linux.
pub struct SysinfoProcess<'a> {
    process: &'a sysinfo::Process,
    users: &'a Users,
    total_memory: u64,
}

impl<'a> SysinfoProcess<'a> {
    pub fn new(process: &'a sysinfo::Process, users: &'a Users, total_memory: u64) -> Self {
        Self {
            process,
            users,
            total_memory,
        }
    }
}

impl ProcessSource for SysinfoProcess<'_> {
    fn pid(&self) -> u32 {
        self.process.pid().as_u32()
    }

    #[cfg(target_os = "linux")]
    fn exists(&self) -> bool {
        std::path::Path::new(&format!("/proc/{}", self.pid())).exists()
    }

    #[cfg(not(target_os = "linux"))]
    fn exists(&self) -> bool {
        true
    }

    fn name(&self) -> Option<String> {
        Some(self.process.name().to_string_lossy().into_owned())
    }

    fn cmdline(&self) -> Option<Vec<String>> {
        let args: Vec<String> = self
            .process
            .cmd()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        (!args.is_empty()).then_some(args)
    }

    fn user(&self) -> Option<String> {
        let uid = self.process.user_id()?;
        self.users
            .get_user_by_id(uid)
            .map(|u| u.name().to_string())
    }

    #[cfg(target_os = "linux")]
    fn nice(&self) -> Option<i32> {
        linux::nice(self.pid())
    }

    #[cfg(not(target_os = "linux"))]
    fn nice(&self) -> Option<i32> {
        None
    }

    #[cfg(target_os = "linux")]
    fn memory(&self) -> Option<MemoryInfo> {
        linux::memory(self.pid())
    }

    #[cfg(not(target_os = "linux"))]
    fn memory(&self) -> Option<MemoryInfo> {
        Some(MemoryInfo {
            virt: self.process.virtual_memory(),
            res: self.process.memory(),
            shr: None,
        })
    }

    fn cpu_percent(&self) -> Option<f32> {
        Some(self.process.cpu_usage())
    }

    fn mem_percent(&self) -> Option<f32> {
        if self.total_memory == 0 {
            return None;
        }
        Some((self.process.memory() as f64 / self.total_memory as f64 * 100.0) as f32)
    }

    fn status(&self) -> Option<&'static str> {
        Some(status_code(self.process.status()))
    }

    fn cpu_time(&self) -> Option<Duration> {
        Some(Duration::from_millis(self.process.accumulated_cpu_time()))
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use procfs::process::Process;

    use crate::snapshot::record::MemoryInfo;

    fn process(pid: u32) -> Option<Process> {
        Process::new(i32::try_from(pid).ok()?).ok()
    }

    pub fn nice(pid: u32) -> Option<i32> {
        let stat = process(pid)?.stat().ok()?;
        i32::try_from(stat.nice).ok()
    }

    pub fn memory(pid: u32) -> Option<MemoryInfo> {
        let statm = process(pid)?.statm().ok()?;
        Some(from_pages(
            statm.size,
            statm.resident,
            statm.shared,
            procfs::page_size(),
        ))
    }

    /// `statm` counts pages.
    pub fn from_pages(size: u64, resident: u64, shared: u64, page_size: u64) -> MemoryInfo {
        MemoryInfo {
            virt: size * page_size,
            res: resident * page_size,
            shr: Some(shared * page_size),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn pages_to_bytes() {
            let mem = from_pages(100, 20, 5, 4096);
            assert_eq!(mem.virt, 409_600);
            assert_eq!(mem.res, 81_920);
            assert_eq!(mem.shr, Some(20_480));
        }

        #[test]
        fn reads_own_process() {
            let pid = std::process::id();
            assert!(nice(pid).is_some_and(|n| (-20..=19).contains(&n)));
            assert!(memory(pid).is_some_and(|m| m.res > 0 && m.virt >= m.res));
            assert_eq!(nice(u32::MAX), None);
            assert!(memory(999_999_999).is_none());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_letters() {
        assert_eq!(status_code(ProcessStatus::Run), "R");
        assert_eq!(status_code(ProcessStatus::Tracing), "t");
        assert_eq!(status_code(ProcessStatus::UninterruptibleDiskSleep), "D");
        assert_eq!(status_code(ProcessStatus::Unknown(99)), "?");
    }
}
