//! Drains the reap queue into the job table and blocks the controller on
//! a foreground job's completion or stop.

use crate::jobs::{JobStatus, JobTable};
use crate::reap_queue::{self, ReapOutcome};

/// What a completed foreground wait reported, for the shell's `$?`-style
/// bookkeeping at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForegroundOutcome {
    Exited(i32),
    Signaled(i32),
    Stopped,
}

/// Block until the job at `pgid` either finishes (every member reaped) or
/// any of its members is stopped. Drains the whole reap queue on every
/// wake, so background jobs reaped in the same batch get their status
/// updated too rather than waiting for their own dedicated wait call.
pub fn foreground_wait(pgid: libc::pid_t, job_table: &mut JobTable) -> ForegroundOutcome {
    loop {
        drain_into_table(job_table);

        match job_table.find_by_pgid(pgid) {
            None => {
                // Already removed by some earlier call; the exit/signal
                // code was captured as it happened.
                return LAST_FOREGROUND_OUTCOME.with(|cell| cell.get());
            }
            Some(job) if job.status == JobStatus::Stopped => return ForegroundOutcome::Stopped,
            Some(job) if job.status == JobStatus::Done => {
                // Normal exit or signal termination: remove the Job now
                // rather than deferring to the next prompt's sweep, which
                // never runs while the controller is still blocked here.
                job_table.remove(pgid);
                return LAST_FOREGROUND_OUTCOME.with(|cell| cell.get());
            }
            Some(_) => {}
        }

        block_for_next_signal();
    }
}

/// Non-blocking drain for the per-prompt sweep: picks up status changes
/// for background jobs without waiting on anything.
pub fn background_reap(job_table: &mut JobTable) {
    drain_into_table(job_table);
}

thread_local! {
    static LAST_FOREGROUND_OUTCOME: std::cell::Cell<ForegroundOutcome> =
        std::cell::Cell::new(ForegroundOutcome::Exited(0));
}

fn drain_into_table(job_table: &mut JobTable) {
    while let Some(event) = reap_queue::pop() {
        let Some(job) = job_table.find_by_member_pid_mut(event.pid) else {
            log::debug!("reap event for untracked pid {}", event.pid);
            continue;
        };
        let pgid = job.pgid;
        let is_last_stage = event.pid == job.last_stage_pid;

        match event.outcome {
            ReapOutcome::Stopped => {
                job_table.set_status(pgid, JobStatus::Stopped);
                job_table.set_foreground_flag(pgid, false);
            }
            ReapOutcome::Exited(code) => {
                if is_last_stage {
                    LAST_FOREGROUND_OUTCOME.with(|cell| {
                        cell.set(ForegroundOutcome::Exited(code));
                    });
                }
                retire_member(job_table, pgid, event.pid);
            }
            ReapOutcome::Signaled(signal) => {
                if is_last_stage {
                    LAST_FOREGROUND_OUTCOME.with(|cell| {
                        cell.set(ForegroundOutcome::Signaled(signal));
                    });
                }
                retire_member(job_table, pgid, event.pid);
            }
        }
    }
}

/// Drop `pid` from its job's pending set; mark the job Done once every
/// member has been accounted for.
fn retire_member(job_table: &mut JobTable, pgid: libc::pid_t, pid: libc::pid_t) {
    let Some(job) = job_table.find_by_pgid_mut(pgid) else {
        return;
    };
    job.pending_pids.retain(|&p| p != pid);
    if job.pending_pids.is_empty() {
        job_table.set_status(pgid, JobStatus::Done);
    }
}

/// Suspend the calling thread until any signal is delivered. The signal
/// handlers that matter here (SIGCHLD, SIGINT, SIGTSTP) all return
/// normally, so this just needs to wake up and let the caller re-check
/// the queue and job table state; `sigsuspend` itself always returns `-1`
/// with `EINTR`.
fn block_for_next_signal() {
    unsafe {
        let mut empty_mask: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut empty_mask);
        libc::sigsuspend(&empty_mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobTable;

    #[test]
    fn background_reap_marks_job_done_when_all_members_exit() {
        reap_queue::push(111, ReapOutcome::Exited(0));
        let mut table = JobTable::new();
        table.push("sleep 1".into(), 111, JobStatus::Running, false, vec![111], 111);
        background_reap(&mut table);
        assert_eq!(table.find_by_pgid(111).unwrap().status, JobStatus::Done);
    }

    #[test]
    fn background_reap_ignores_untracked_pid() {
        reap_queue::push(999999, ReapOutcome::Exited(0));
        let mut table = JobTable::new();
        background_reap(&mut table);
        assert!(table.find_by_pgid(999999).is_none());
    }

    #[test]
    fn foreground_wait_removes_job_on_normal_exit() {
        reap_queue::push(333, ReapOutcome::Exited(0));
        let mut table = JobTable::new();
        table.push("echo hi".into(), 333, JobStatus::Running, true, vec![333], 333);
        let outcome = foreground_wait(333, &mut table);
        assert_eq!(outcome, ForegroundOutcome::Exited(0));
        assert!(table.find_by_pgid(333).is_none());
    }

    #[test]
    fn partial_pipeline_exit_keeps_job_running() {
        reap_queue::push(222, ReapOutcome::Exited(0));
        let mut table = JobTable::new();
        table.push(
            "cat | wc -l".into(),
            222,
            JobStatus::Running,
            true,
            vec![222, 223],
            223,
        );
        background_reap(&mut table);
        let job = table.find_by_pgid(222).unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.pending_pids, vec![223]);
    }
}
