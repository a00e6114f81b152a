use crate::error::ReduceError;
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    pub retry_interval: Duration,
    pub max_attempts: u32,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_millis(500),
            max_attempts: 100,
        }
    }
}

/// Exclusive OS lock on a staging file. The lock lives on the open handle,
/// so it is released when the guard drops or the process dies.
#[derive(Debug)]
pub struct StagingLock {
    path: PathBuf,
    file: File,
}

impl StagingLock {
    pub fn try_acquire(target: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(target)?;
        file.try_lock_exclusive()?;
        Ok(Self {
            path: target.to_path_buf(),
            file,
        })
    }

    pub fn acquire(target: &Path, policy: LockPolicy) -> Result<Self, ReduceError> {
        let attempts = policy.max_attempts.max(1);
        for attempt in 1..=attempts {
            match Self::try_acquire(target) {
                Ok(lock) => return Ok(lock),
                Err(err) if is_contended(&err) => {
                    debug!(attempt, path = %target.display(), "staging file busy");
                    if attempt < attempts {
                        thread::sleep(policy.retry_interval);
                    }
                }
                Err(source) => return Err(ReduceError::io(target, source)),
            }
        }
        Err(ReduceError::Lock {
            path: target.to_path_buf(),
            attempts,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the file's contents through the locked handle.
    pub fn replace(&mut self, contents: &[u8]) -> Result<(), ReduceError> {
        self.overwrite(contents)
            .map_err(|err| ReduceError::io(&self.path, err))
    }

    fn overwrite(&mut self, contents: &[u8]) -> io::Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(contents)?;
        self.file.flush()
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs4::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn quick_policy(max_attempts: u32) -> LockPolicy {
        LockPolicy {
            retry_interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    #[test]
    fn lock_is_exclusive_until_dropped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("Tests.cs");

        let held = StagingLock::acquire(&target, quick_policy(1)).expect("first lock");
        assert_eq!(held.path(), target.as_path());

        let err = StagingLock::acquire(&target, quick_policy(3)).expect_err("second lock");
        assert!(matches!(err, ReduceError::Lock { attempts: 3, .. }));

        drop(held);
        StagingLock::acquire(&target, quick_policy(1)).expect("relock");
    }

    #[test]
    fn lock_waits_for_release() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("unit.rs");
        let held = StagingLock::try_acquire(&target).expect("first lock");

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            drop(held);
        });
        let policy = LockPolicy {
            retry_interval: Duration::from_millis(5),
            max_attempts: 200,
        };
        StagingLock::acquire(&target, policy).expect("lock after release");
        releaser.join().expect("join");
    }

    #[test]
    fn leftover_files_from_earlier_runs_do_not_block() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("lib.rs");
        fs::write(&target, "fn main() {}\n").expect("write target");
        fs::write(dir.path().join("lib.rs.lock"), "pid=999999\n").expect("write sidecar");

        let mut lock = StagingLock::acquire(&target, quick_policy(1)).expect("lock");
        lock.replace(b"fn main() { run(); }\n").expect("replace");
        drop(lock);

        assert_eq!(
            fs::read_to_string(&target).expect("read target"),
            "fn main() { run(); }\n"
        );
    }

    #[test]
    fn replace_truncates_longer_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("unit.rs");
        fs::write(&target, "a much longer original body\n").expect("write target");

        let mut lock = StagingLock::try_acquire(&target).expect("lock");
        lock.replace(b"short\n").expect("replace");

        assert_eq!(fs::read_to_string(&target).expect("read target"), "short\n");
    }
}
