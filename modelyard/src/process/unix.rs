//! Unix process controller backend.
//!
//! Spawns the trainer into its own process group via `setpgid` and
//! terminates process trees by walking the `/proc` parent-pid table:
//! descendants first, root last, SIGTERM with a SIGKILL escalation halfway
//! through the grace period.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use super::controller::{
    BoxedWait, ProcessController, ProcessError, RunningProcess, TerminationReport,
    TrainCommand, TrainingOutcome,
};

/// Default grace period before a termination is considered failed.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Liveness poll interval during a termination sweep.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Production process controller for Unix platforms.
#[derive(Debug, Clone)]
pub struct UnixProcessController {
    grace: Duration,
}

impl Default for UnixProcessController {
    fn default() -> Self {
        Self {
            grace: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl UnixProcessController {
    /// Creates a controller with the default grace period.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the termination grace period.
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }
}

/// A spawned Unix trainer process.
struct UnixProcess {
    pid: i64,
    child: tokio::process::Child,
}

impl RunningProcess for UnixProcess {
    fn pid(&self) -> i64 {
        self.pid
    }

    fn wait(self: Box<Self>) -> BoxedWait<Result<TrainingOutcome, ProcessError>> {
        let pid = self.pid;
        Box::pin(async move {
            let output = self.child.wait_with_output().await?;
            let outcome = TrainingOutcome {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            };

            debug!(
                pid,
                exit_code = outcome.exit_code,
                stdout_bytes = outcome.stdout.len(),
                stderr_bytes = outcome.stderr.len(),
                "Training process exited"
            );

            Ok(outcome)
        })
    }
}

impl ProcessController for UnixProcessController {
    fn spawn(&self, command: &TrainCommand) -> Result<Box<dyn RunningProcess>, ProcessError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // New process group so the whole descendant tree can be
            // terminated as one unit.
            .process_group(0);

        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            program: command.program.clone(),
            source,
        })?;

        let pid = child.id().map(i64::from).ok_or(ProcessError::NoPid)?;
        info!(pid, program = %command.program, "Spawned training process");

        Ok(Box::new(UnixProcess { pid, child }))
    }

    fn terminate_tree(
        &self,
        pid: i64,
    ) -> BoxedWait<Result<TerminationReport, ProcessError>> {
        let grace = self.grace;
        Box::pin(async move { terminate_tree_impl(pid, grace).await })
    }
}

async fn terminate_tree_impl(
    pid: i64,
    grace: Duration,
) -> Result<TerminationReport, ProcessError> {
    if !process_alive(pid) {
        debug!(pid, "Termination requested for dead process tree, nothing to do");
        return Ok(TerminationReport::default());
    }

    // /proc scan is blocking filesystem work.
    let descendants = tokio::task::spawn_blocking(move || {
        let table = process_table();
        descendants_of(&table, pid)
    })
    .await
    .unwrap_or_default();

    info!(
        pid,
        descendants = descendants.len(),
        "Terminating training process tree"
    );

    // Polite signal: descendants first, root last.
    let mut signaled = 0usize;
    for child in &descendants {
        if send_signal(*child, libc::SIGTERM) {
            signaled += 1;
        }
    }
    send_signal(pid, libc::SIGTERM);

    // Wait for the root to die, escalating to SIGKILL halfway through.
    let deadline = tokio::time::Instant::now() + grace;
    let escalate_at = tokio::time::Instant::now() + grace / 2;
    let mut forced = false;

    loop {
        if !process_alive(pid) {
            break;
        }
        let now = tokio::time::Instant::now();
        if now >= deadline {
            warn!(pid, ?grace, "Process survived termination grace period");
            return Err(ProcessError::Termination { pid, grace });
        }
        if !forced && now >= escalate_at {
            for child in &descendants {
                send_signal(*child, libc::SIGKILL);
            }
            send_signal(pid, libc::SIGKILL);
            forced = true;
            debug!(pid, "Escalated process tree termination to SIGKILL");
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    info!(pid, signaled, forced, "Training process tree terminated");

    Ok(TerminationReport {
        root_was_alive: true,
        descendants_signaled: signaled,
        forced,
    })
}

/// True if a process with this pid exists and can still be terminated.
///
/// EPERM still means the process exists. An exited-but-unreaped zombie
/// keeps its pid (so `kill(pid, 0)` succeeds) but no signal can affect it;
/// it counts as dead here, otherwise a termination sweep would poll it
/// until the grace period expires.
fn process_alive(pid: i64) -> bool {
    if pid <= 0 {
        return false;
    }
    let rc = unsafe { libc::kill(pid as libc::pid_t, 0) };
    if rc != 0 && std::io::Error::last_os_error().raw_os_error() != Some(libc::EPERM) {
        return false;
    }
    !is_zombie(pid)
}

/// True if `/proc/<pid>/stat` reports the `Z` (zombie) state.
fn is_zombie(pid: i64) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => parse_stat_state(&stat) == Some('Z'),
        Err(_) => false,
    }
}

/// Extracts the state character (field 3) from `/proc/<pid>/stat` contents.
fn parse_stat_state(stat: &str) -> Option<char> {
    let rest = &stat[stat.rfind(')')? + 1..];
    rest.split_whitespace().next()?.chars().next()
}

/// Sends a signal, ignoring failures (the target may already be gone).
fn send_signal(pid: i64, signal: libc::c_int) -> bool {
    if pid <= 0 {
        return false;
    }
    unsafe { libc::kill(pid as libc::pid_t, signal) == 0 }
}

/// Snapshot of the system's (pid, ppid) table from `/proc`.
fn process_table() -> Vec<(i64, i64)> {
    let mut table = Vec::new();
    let entries = match std::fs::read_dir("/proc") {
        Ok(entries) => entries,
        Err(_) => return table,
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(pid) = name.to_str().and_then(|s| s.parse::<i64>().ok()) else {
            continue;
        };
        if let Some(ppid) = read_ppid(&entry.path()) {
            table.push((pid, ppid));
        }
    }
    table
}

/// Reads the parent pid from `/proc/<pid>/stat`.
fn read_ppid(proc_dir: &Path) -> Option<i64> {
    let stat = std::fs::read_to_string(proc_dir.join("stat")).ok()?;
    parse_stat_ppid(&stat)
}

/// Extracts the ppid (field 4) from `/proc/<pid>/stat` contents.
///
/// The comm field (2) may contain spaces and parentheses, so fields are
/// located relative to the last closing parenthesis.
fn parse_stat_ppid(stat: &str) -> Option<i64> {
    let rest = &stat[stat.rfind(')')? + 1..];
    // rest = " <state> <ppid> ..."
    rest.split_whitespace().nth(1)?.parse().ok()
}

/// Collects every descendant of `root` from a (pid, ppid) table.
///
/// Traversal order is not significant: every collected pid gets the same
/// signal during a sweep.
fn descendants_of(table: &[(i64, i64)], root: i64) -> Vec<i64> {
    let mut result = Vec::new();
    let mut frontier = vec![root];

    while let Some(parent) = frontier.pop() {
        for (pid, ppid) in table {
            if *ppid == parent && !result.contains(pid) {
                result.push(*pid);
                frontier.push(*pid);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stat_ppid_simple() {
        let stat = "1234 (sleep) S 1000 1234 1000 0 -1 4194560";
        assert_eq!(parse_stat_ppid(stat), Some(1000));
    }

    #[test]
    fn test_parse_stat_ppid_comm_with_spaces_and_parens() {
        let stat = "99 (tmux: server (1)) S 42 99 99 0 -1 0";
        assert_eq!(parse_stat_ppid(stat), Some(42));
    }

    #[test]
    fn test_parse_stat_ppid_garbage() {
        assert_eq!(parse_stat_ppid("not a stat line"), None);
        assert_eq!(parse_stat_ppid(""), None);
    }

    #[test]
    fn test_parse_stat_state() {
        assert_eq!(
            parse_stat_state("1234 (sleep) S 1000 1234 1000 0 -1 4194560"),
            Some('S')
        );
        assert_eq!(
            parse_stat_state("1234 (sh) Z 1000 1234 1000 0 -1 4194560"),
            Some('Z')
        );
        assert_eq!(parse_stat_state("not a stat line"), None);
    }

    #[test]
    fn test_descendants_of_transitive() {
        // 1 -> 2 -> 4, 1 -> 3; 5 unrelated
        let table = vec![(2, 1), (3, 1), (4, 2), (5, 99)];
        let mut found = descendants_of(&table, 1);
        found.sort_unstable();
        assert_eq!(found, vec![2, 3, 4]);
    }

    #[test]
    fn test_descendants_of_no_children() {
        let table = vec![(2, 1), (3, 1)];
        assert!(descendants_of(&table, 42).is_empty());
    }

    #[test]
    fn test_process_alive_rejects_nonpositive() {
        assert!(!process_alive(0));
        assert!(!process_alive(-99));
    }

    #[tokio::test]
    async fn test_spawn_captures_output_and_exit_code() {
        let controller = UnixProcessController::new();
        let command = TrainCommand::new("sh")
            .arg("-c")
            .arg("echo out; echo err 1>&2; exit 3");

        let process = controller.spawn(&command).unwrap();
        assert!(process.pid() > 0);

        let outcome = process.wait().await.unwrap();
        assert_eq!(outcome.exit_code, 3);
        assert_eq!(outcome.stdout, "out\n");
        assert_eq!(outcome.stderr, "err\n");
        assert!(!outcome.success());
    }

    #[tokio::test]
    async fn test_spawn_success() {
        let controller = UnixProcessController::new();
        let process = controller.spawn(&TrainCommand::new("true")).unwrap();
        let outcome = process.wait().await.unwrap();
        assert!(outcome.success());
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let controller = UnixProcessController::new();
        let result = controller.spawn(&TrainCommand::new("definitely-not-a-real-binary-xyz"));
        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_terminate_running_tree() {
        let controller = UnixProcessController::new();
        let process = controller
            .spawn(&TrainCommand::new("sh").arg("-c").arg("sleep 30"))
            .unwrap();
        let pid = process.pid();

        let report = controller.terminate_tree(pid).await.unwrap();
        assert!(report.root_was_alive);

        // The wait path must observe the termination, not error out.
        let outcome = process.wait().await.unwrap();
        assert!(!outcome.success());
    }

    #[tokio::test]
    async fn test_terminate_unreaped_zombie_is_noop() {
        // The child exits on its own but nobody awaits wait(), leaving a
        // zombie. Termination must report a dead tree immediately instead
        // of polling the pid until the grace period expires.
        let controller = UnixProcessController::new();
        let process = controller.spawn(&TrainCommand::new("true")).unwrap();
        let pid = process.pid();

        tokio::time::sleep(Duration::from_millis(300)).await;

        let report = controller.terminate_tree(pid).await.unwrap();
        assert_eq!(report, TerminationReport::default());

        // Reaping afterward still yields the exit status.
        let outcome = process.wait().await.unwrap();
        assert!(outcome.success());
    }

    #[tokio::test]
    async fn test_terminate_dead_tree_is_noop() {
        let controller = UnixProcessController::new();
        let process = controller.spawn(&TrainCommand::new("true")).unwrap();
        let pid = process.pid();
        let outcome = process.wait().await.unwrap();
        assert!(outcome.success());

        let report = controller.terminate_tree(pid).await.unwrap();
        assert_eq!(report, TerminationReport::default());
    }
}
