use std::path::Path;

use crate::{
    fs::{FileSystem, RealFs},
    source::PROC_SELF_FD,
    status::PROC_SELF_STATUS,
};

/// Which optional process metrics this host can back with real data.
///
/// Determined once, before registration, so that registration itself never
/// has to inspect the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformCapabilities {
    pub file_descriptors: bool,
    pub memory_status: bool,
}

impl PlatformCapabilities {
    pub fn detect() -> Self {
        Self::probe(&RealFs)
    }

    pub fn probe<F: FileSystem + ?Sized>(fs: &F) -> Self {
        Self::probe_for(fs, cfg!(unix), cfg!(target_os = "linux"))
    }

    pub fn probe_for<F: FileSystem + ?Sized>(fs: &F, unix: bool, linux: bool) -> Self {
        Self {
            file_descriptors: unix && fs.exists(Path::new(PROC_SELF_FD)),
            memory_status: linux && fs.exists(Path::new(PROC_SELF_STATUS)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    #[test]
    fn capabilities_follow_platform_and_files() {
        let mut fs = MemoryFs::new();
        fs.add_dir(PROC_SELF_FD).add_file(PROC_SELF_STATUS, "VmRSS:\t1 kB\n");

        assert_eq!(
            PlatformCapabilities::probe_for(&fs, true, true),
            PlatformCapabilities {
                file_descriptors: true,
                memory_status: true,
            }
        );
        assert_eq!(
            PlatformCapabilities::probe_for(&fs, true, false),
            PlatformCapabilities {
                file_descriptors: true,
                memory_status: false,
            }
        );
        assert_eq!(
            PlatformCapabilities::probe_for(&fs, false, false),
            PlatformCapabilities::default()
        );
    }

    #[test]
    fn missing_files_disable_each_capability_independently() {
        let mut fs = MemoryFs::new();
        fs.add_file(PROC_SELF_STATUS, "");

        assert_eq!(
            PlatformCapabilities::probe_for(&fs, true, true),
            PlatformCapabilities {
                file_descriptors: false,
                memory_status: true,
            }
        );
    }
}
