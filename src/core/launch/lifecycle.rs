// ─── Process Lifecycle ───
// Bounded waits and graceful-then-forced termination over a launched process.
// A handle may be shared across threads: one thread can block in `wait_for`
// while another calls `destroy`.

use std::io::{PipeReader, Read};
use std::process::{Child, ChildStderr, ChildStdout};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

/// Grace period between the termination request and the forced kill.
pub const DEFAULT_DESTROY_GRACE: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub enum ProcessState {
    NotStarted,
    Running(Child),
    /// Exit code, `None` when terminated by a signal.
    Exited(Option<i32>),
}

/// Point-in-time view of a handle's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    NotStarted,
    Running { pid: u32 },
    Exited { code: Option<i32> },
}

#[derive(Debug)]
pub struct ProcessHandle {
    pid: Option<u32>,
    state: Mutex<ProcessState>,
    merged_output: Mutex<Option<PipeReader>>,
}

impl ProcessHandle {
    /// A handle for a process that was never spawned.
    pub fn not_started() -> Self {
        Self {
            pid: None,
            state: Mutex::new(ProcessState::NotStarted),
            merged_output: Mutex::new(None),
        }
    }

    pub(crate) fn running(child: Child, merged_output: Option<PipeReader>) -> Self {
        Self {
            pid: Some(child.id()),
            state: Mutex::new(ProcessState::Running(child)),
            merged_output: Mutex::new(merged_output),
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn lock_state(&self) -> MutexGuard<'_, ProcessState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Refreshes and returns the current state without blocking.
    pub fn status(&self) -> ProcessStatus {
        let mut state = self.lock_state();
        refresh(&mut state);
        match &*state {
            ProcessState::NotStarted => ProcessStatus::NotStarted,
            ProcessState::Running(child) => ProcessStatus::Running { pid: child.id() },
            ProcessState::Exited(code) => ProcessStatus::Exited { code: *code },
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.status(), ProcessStatus::Running { .. })
    }

    /// Exit code once the process has exited with one.
    pub fn exit_code(&self) -> Option<i32> {
        match self.status() {
            ProcessStatus::Exited { code } => code,
            _ => None,
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self.status() {
            ProcessStatus::NotStarted => "not-started",
            ProcessStatus::Running { .. } => "running",
            ProcessStatus::Exited { .. } => "exited",
        }
    }

    /// Blocks up to `timeout` for the process to exit. Returns `false` for a
    /// handle that was never started.
    /// A bound too large to represent as an instant waits without a deadline.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        if self.status() == ProcessStatus::NotStarted {
            return false;
        }
        let deadline = Instant::now().checked_add(timeout);
        loop {
            match self.status() {
                ProcessStatus::Exited { .. } => return true,
                ProcessStatus::NotStarted => return false,
                ProcessStatus::Running { .. } => {}
            }
            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    POLL_INTERVAL.min(deadline - now)
                }
                None => POLL_INTERVAL,
            };
            std::thread::sleep(pause);
        }
    }

    /// Graceful termination with the default grace period, then a forced
    /// kill. A no-op for handles that never started or already exited.
    pub fn destroy(&self) {
        self.destroy_with_grace(DEFAULT_DESTROY_GRACE);
    }

    pub fn destroy_with_grace(&self, grace: Duration) {
        let requested = {
            let mut state = self.lock_state();
            refresh(&mut state);
            match &*state {
                ProcessState::Running(child) => request_termination(child.id()),
                _ => return,
            }
        };

        if requested && self.wait_for(grace) {
            info!("Process {:?} terminated gracefully", self.pid);
            return;
        }

        let mut state = self.lock_state();
        if let ProcessState::Running(child) = &mut *state {
            if let Err(err) = child.kill() {
                debug!("Kill of {} reported: {}", child.id(), err);
            }
            let code = match child.wait() {
                Ok(status) => status.code(),
                Err(err) => {
                    warn!("Failed to reap process {}: {}", child.id(), err);
                    None
                }
            };
            info!("Process {:?} killed", self.pid);
            *state = ProcessState::Exited(code);
        }
    }

    /// Merged stdout/stderr when the launch asked for a merged pipe, otherwise
    /// the piped stdout.
    pub fn take_output(&self) -> Option<Box<dyn Read + Send>> {
        let merged = self
            .merged_output
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(reader) = merged {
            return Some(Box::new(reader));
        }
        self.take_stdout()
            .map(|stdout| Box::new(stdout) as Box<dyn Read + Send>)
    }

    pub fn take_stdout(&self) -> Option<ChildStdout> {
        match &mut *self.lock_state() {
            ProcessState::Running(child) => child.stdout.take(),
            _ => None,
        }
    }

    pub fn take_stderr(&self) -> Option<ChildStderr> {
        match &mut *self.lock_state() {
            ProcessState::Running(child) => child.stderr.take(),
            _ => None,
        }
    }
}

fn refresh(state: &mut ProcessState) {
    let ProcessState::Running(child) = state else {
        return;
    };
    match child.try_wait() {
        Ok(Some(status)) => *state = ProcessState::Exited(status.code()),
        Ok(None) => {}
        Err(err) => warn!("Failed to poll process {}: {}", child.id(), err),
    }
}

#[cfg(unix)]
fn request_termination(pid: u32) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) => true,
        Err(err) => {
            warn!("Failed to send SIGTERM to {}: {}", pid, err);
            false
        }
    }
}

#[cfg(not(unix))]
fn request_termination(_pid: u32) -> bool {
    false
}

/// See [`ProcessHandle::wait_for`].
pub fn wait_for(handle: &ProcessHandle, timeout: Duration) -> bool {
    handle.wait_for(timeout)
}

/// Cleanup helper safe to call on any handle, or none at all.
pub fn destroy_process(handle: Option<&ProcessHandle>) {
    if let Some(handle) = handle {
        handle.destroy();
    }
}
