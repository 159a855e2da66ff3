//! Per-process readings from Linux `/proc`.
//!
//! Every public reading returns `0.0` when its file is missing or malformed;
//! the parsing helpers return `Option` so failures stay testable.

use std::{path::Path, sync::Arc};

use tracing::debug;

use crate::fs::FileSystem;

pub const PROC_SELF_STAT: &str = "/proc/self/stat";
pub const PROC_SELF_LIMITS: &str = "/proc/self/limits";
pub const PROC_SELF_FD: &str = "/proc/self/fd";
pub const PROC_STAT: &str = "/proc/stat";

// USER_HZ; fixed at 100 on every mainstream Linux architecture.
const CLK_TCK: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatTimes {
    pub utime_ticks: u64,
    pub stime_ticks: u64,
    pub start_ticks: u64,
}

pub struct ProcessSource<F> {
    fs: Arc<F>,
}

impl<F: FileSystem> ProcessSource<F> {
    pub fn new(fs: Arc<F>) -> Self {
        Self { fs }
    }

    /// User plus system CPU time in seconds.
    pub fn cpu_seconds_total(&self) -> f64 {
        self.stat_times()
            .map(|times| (times.utime_ticks + times.stime_ticks) as f64 / CLK_TCK)
            .unwrap_or(0.0)
    }

    /// Process start time in seconds since the unix epoch.
    pub fn start_time_seconds(&self) -> f64 {
        let Some(times) = self.stat_times() else {
            return 0.0;
        };
        let Some(boot_time) = self.read(PROC_STAT).as_deref().and_then(parse_boot_time) else {
            debug!("btime missing from /proc/stat");
            return 0.0;
        };
        boot_time as f64 + times.start_ticks as f64 / CLK_TCK
    }

    pub fn open_fds(&self) -> f64 {
        match self.fs.read_dir(Path::new(PROC_SELF_FD)) {
            Ok(entries) => entries.len() as f64,
            Err(err) => {
                debug!(error = %err, "failed to list open file descriptors");
                0.0
            }
        }
    }

    /// Soft limit on open files; `+Inf` when unlimited.
    pub fn max_fds(&self) -> f64 {
        self.read(PROC_SELF_LIMITS)
            .as_deref()
            .and_then(parse_max_open_files)
            .unwrap_or(0.0)
    }

    fn stat_times(&self) -> Option<StatTimes> {
        let stat = self.read(PROC_SELF_STAT)?;
        let times = parse_stat_times(&stat);
        if times.is_none() {
            debug!("malformed /proc/self/stat");
        }
        times
    }

    fn read(&self, path: &str) -> Option<String> {
        match self.fs.read_to_string(Path::new(path)) {
            Ok(content) => Some(content),
            Err(err) => {
                debug!(path, error = %err, "failed to read process file");
                None
            }
        }
    }
}

/// Parses `/proc/[pid]/stat`. The command name may contain spaces and
/// parentheses, so fields are counted from the last `)`.
pub fn parse_stat_times(stat: &str) -> Option<StatTimes> {
    let after_comm = &stat[stat.rfind(')')? + 1..];
    // Index 0 here is field 3 (state) of proc(5).
    let fields: Vec<&str> = after_comm.split_whitespace().collect();
    let field = |index: usize| fields.get(index)?.parse::<u64>().ok();

    Some(StatTimes {
        utime_ticks: field(11)?,
        stime_ticks: field(12)?,
        start_ticks: field(19)?,
    })
}

pub fn parse_boot_time(proc_stat: &str) -> Option<u64> {
    proc_stat
        .lines()
        .find_map(|line| line.strip_prefix("btime "))
        .and_then(|value| value.trim().parse().ok())
}

pub fn parse_max_open_files(limits: &str) -> Option<f64> {
    let soft = limits
        .lines()
        .find_map(|line| line.strip_prefix("Max open files"))?
        .split_whitespace()
        .next()?;

    if soft == "unlimited" {
        Some(f64::INFINITY)
    } else {
        soft.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    const STAT: &str = "4242 (my (odd) proc) S 1 4242 4242 0 -1 4194304 120 0 0 0 250 50 0 0 20 0 4 0 1000 12345678 300 18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 17 3 0 0 0 0 0";
    const LIMITS: &str = "Limit                     Soft Limit           Hard Limit           Units     \nMax cpu time              unlimited            unlimited            seconds   \nMax open files            1024                 524288               files     \n";

    #[test]
    fn stat_fields_are_counted_after_the_command_name() {
        assert_eq!(
            parse_stat_times(STAT),
            Some(StatTimes {
                utime_ticks: 250,
                stime_ticks: 50,
                start_ticks: 1000,
            })
        );
        assert_eq!(parse_stat_times("4242 (truncated) S 1"), None);
        assert_eq!(parse_stat_times("no parenthesis"), None);
    }

    #[test]
    fn limits_and_boot_time_parse() {
        assert_eq!(parse_max_open_files(LIMITS), Some(1024.0));
        let unlimited = "Max open files            unlimited            unlimited            files";
        assert_eq!(parse_max_open_files(unlimited), Some(f64::INFINITY));
        assert_eq!(parse_max_open_files("Max cpu time unlimited"), None);

        assert_eq!(
            parse_boot_time("cpu  1 2 3\nbtime 1700000000\nprocesses 10\n"),
            Some(1_700_000_000)
        );
        assert_eq!(parse_boot_time("cpu  1 2 3\n"), None);
    }

    #[test]
    fn readings_from_a_fake_proc() {
        let mut fs = MemoryFs::new();
        fs.add_file(PROC_SELF_STAT, STAT)
            .add_file(PROC_STAT, "btime 1700000000\n")
            .add_file(PROC_SELF_LIMITS, LIMITS)
            .add_file("/proc/self/fd/0", "")
            .add_file("/proc/self/fd/1", "")
            .add_file("/proc/self/fd/2", "");
        let source = ProcessSource::new(Arc::new(fs));

        assert_eq!(source.cpu_seconds_total(), 3.0);
        assert_eq!(source.start_time_seconds(), 1_700_000_010.0);
        assert_eq!(source.open_fds(), 3.0);
        assert_eq!(source.max_fds(), 1024.0);
    }

    #[test]
    fn readings_degrade_to_zero_without_proc() {
        let source = ProcessSource::new(Arc::new(MemoryFs::new()));

        assert_eq!(source.cpu_seconds_total(), 0.0);
        assert_eq!(source.start_time_seconds(), 0.0);
        assert_eq!(source.open_fds(), 0.0);
        assert_eq!(source.max_fds(), 0.0);
    }
}
