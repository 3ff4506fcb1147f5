//! `jobs`, `fg`, and `bg` — the only built-ins. Neither takes arguments;
//! each always acts on the most recent eligible job.

use crate::jobs::{JobStatus, JobTable};
use crate::signals::{self, ForegroundTerminalGuard};
use crate::waiter::{self, ForegroundOutcome};

const BUILTINS: &[&str] = &["jobs", "fg", "bg"];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Run a built-in, returning the exit status to report for it.
pub fn execute(program: &str, job_table: &mut JobTable) -> i32 {
    match program {
        "jobs" => builtin_jobs(job_table),
        "fg" => builtin_fg(job_table),
        "bg" => builtin_bg(job_table),
        _ => {
            eprintln!("yash: {program}: not a builtin");
            1
        }
    }
}

fn builtin_jobs(job_table: &mut JobTable) -> i32 {
    waiter::background_reap(job_table);
    job_table.print_table();
    0
}

fn builtin_fg(job_table: &mut JobTable) -> i32 {
    let Some(job) = job_table.most_recent_stopped_or_background() else {
        eprintln!("fg: no current job");
        return 1;
    };
    let pgid = job.pgid;
    let was_stopped = job.status == JobStatus::Stopped;
    println!("{}", job.command_text);

    job_table.set_foreground_flag(pgid, true);
    if was_stopped {
        job_table.set_status(pgid, JobStatus::Running);
        if let Err(err) = signals::send_continue_to_group(pgid) {
            eprintln!("fg: failed to resume job: {err}");
            return 1;
        }
    }

    let guard = match ForegroundTerminalGuard::new(pgid) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("fg: failed to take the terminal: {err}");
            return 1;
        }
    };
    let outcome = waiter::foreground_wait(pgid, job_table);
    drop(guard);

    match outcome {
        ForegroundOutcome::Exited(code) => code,
        ForegroundOutcome::Signaled(signal) => 128 + signal,
        ForegroundOutcome::Stopped => 0,
    }
}

fn builtin_bg(job_table: &mut JobTable) -> i32 {
    let Some(job) = job_table.most_recent_stopped() else {
        eprintln!("bg: no stopped job");
        return 1;
    };
    let pgid = job.pgid;

    if let Err(err) = signals::send_continue_to_group(pgid) {
        eprintln!("bg: failed to resume job: {err}");
        return 1;
    }
    job_table.set_status(pgid, JobStatus::Running);
    job_table.set_foreground_flag(pgid, false);
    job_table.append_background_marker(pgid);
    0
}
