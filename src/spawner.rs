//! Turns a parsed line into running processes: joins every stage of a
//! pipeline into one process group, wires the pipe between two-stage
//! pipelines, and inserts the resulting job into the table before any
//! SIGCHLD for it can possibly arrive.

use std::os::unix::io::FromRawFd;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use crate::error::SpawnError;
use crate::jobs::{JobStatus, JobTable};
use crate::lexer::{ParsedLine, Stage};
use crate::redirect::RedirectionSpec;
use crate::signals;

/// Signals a freshly exec'd child must see at their default disposition —
/// the shell itself ignores or specially handles all of these, and `SIG_IGN`
/// survives `exec`, so without this reset every pipeline stage would
/// silently ignore Ctrl-C and Ctrl-Z too.
const RESET_TO_DEFAULT: [libc::c_int; 4] = [
    libc::SIGINT,
    libc::SIGTSTP,
    libc::SIGQUIT,
    libc::SIGPIPE,
];

/// Launch the pipeline described by `parsed` as one job. Returns the new
/// job's id. The job is in the table — as `Running`, with `in_foreground`
/// set per `background` — by the time this returns; the caller still owns
/// putting it in the foreground (terminal handoff + blocking wait) or
/// leaving it running in the background.
pub fn spawn_pipeline(
    parsed: &ParsedLine,
    command_text: String,
    background: bool,
    job_table: &mut JobTable,
) -> Result<usize, SpawnError> {
    signals::block_sigchld_during(|| {
        spawn_pipeline_locked(parsed, command_text, background, job_table)
    })
}

/// Runs with SIGCHLD blocked: nothing spawned here can be reaped out from
/// under the job table before `push` records it.
fn spawn_pipeline_locked(
    parsed: &ParsedLine,
    command_text: String,
    background: bool,
    job_table: &mut JobTable,
) -> Result<usize, SpawnError> {
    let (first_pid, pgid, mut pending_pids) = match &parsed.stage2 {
        None => {
            let child_pid = spawn_stage(&parsed.stage1, None, Stdio::inherit(), Stdio::inherit())?;
            (child_pid, child_pid, vec![child_pid])
        }
        Some(stage2) => {
            let (read_fd, write_fd) = make_pipe()?;
            // `Command::spawn` takes ownership of the fd behind each
            // `Stdio::from_raw_fd` and closes the parent's copy once the
            // child has it duplicated onto its own descriptor, so neither
            // pipe end needs an explicit close here.
            let first_pid = spawn_stage(
                &parsed.stage1,
                None,
                Stdio::inherit(),
                unsafe { Stdio::from_raw_fd(write_fd) },
            )?;
            let second_pid = match spawn_stage(
                stage2,
                Some(first_pid),
                unsafe { Stdio::from_raw_fd(read_fd) },
                Stdio::inherit(),
            ) {
                Ok(pid) => pid,
                Err(err) => {
                    // The first stage has no Job to be reaped through; it
                    // would otherwise run forever with a dangling pipe.
                    // The signal handler still reaps it (it waits on every
                    // pid, tracked or not), it just won't find a Job.
                    unsafe {
                        libc::kill(first_pid, libc::SIGKILL);
                    }
                    return Err(err);
                }
            };
            (first_pid, first_pid, vec![first_pid, second_pid])
        }
    };

    // Close the parent-side race: both the child's pre_exec and this call
    // race to setpgid the first stage. Whichever wins, the result is the
    // same; the loser gets EACCES/ESRCH, both safely ignored.
    let last_stage_pid = *pending_pids.last().unwrap();
    let _ = signals::set_process_group(first_pid, pgid);
    if last_stage_pid != first_pid {
        let _ = signals::set_process_group(last_stage_pid, pgid);
    }
    pending_pids.sort_unstable();
    pending_pids.dedup();

    let job_id = job_table.push(
        command_text,
        pgid,
        JobStatus::Running,
        !background,
        pending_pids,
        last_stage_pid,
    );
    Ok(job_id)
}

/// Spawn one stage, joining process group `target_pgid` (or creating a new
/// one, as group leader, when `target_pgid` is `None` — the first stage of
/// any pipeline).
fn spawn_stage(
    stage: &Stage,
    target_pgid: Option<libc::pid_t>,
    stdin: Stdio,
    stdout: Stdio,
) -> Result<libc::pid_t, SpawnError> {
    let mut command = Command::new(&stage.argv[0]);
    command.args(&stage.argv[1..]);
    command.stdin(stdin).stdout(stdout).stderr(Stdio::inherit());

    let redirection: RedirectionSpec = stage.redirection.clone();
    unsafe {
        command.pre_exec(move || {
            for &signal in &RESET_TO_DEFAULT {
                if libc::signal(signal, libc::SIG_DFL) == libc::SIG_ERR {
                    return Err(std::io::Error::last_os_error());
                }
            }
            let leader = target_pgid.unwrap_or(0);
            if libc::setpgid(0, leader) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            crate::redirect::apply_in_child(&redirection);
            Ok(())
        });
    }

    let child = command.spawn().map_err(|source| classify_spawn_error(&stage.argv[0], source))?;
    // The child owns its own lifecycle from here; we track it only by pid
    // in the job table, so let `Child` drop without waiting on it — the
    // signal handler and `waiter` module own reaping it.
    Ok(child.id() as libc::pid_t)
}

/// `std::process::Command` relays a failed `execvp` in the child back to
/// the parent's `spawn()` call over a pipe rather than letting the child
/// live on to fail and be reaped normally, so a missing or unrunnable
/// program never actually reaches the job table — there is no Job to
/// remove because there was never a live, tracked child. Only a genuine
/// resource failure in `fork` itself (no memory, pid space exhausted)
/// should take the shell down; that failure mode is vanishingly rare next
/// to "program not found" or "not executable", which are the common case
/// in practice and must not be fatal.
fn classify_spawn_error(program: &str, source: std::io::Error) -> SpawnError {
    use std::io::ErrorKind;
    match source.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => SpawnError::Exec {
            program: program.to_string(),
            source,
        },
        _ => SpawnError::Fork(source),
    }
}

fn make_pipe() -> Result<(libc::c_int, libc::c_int), SpawnError> {
    let mut fds: [libc::c_int; 2] = [0; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return Err(SpawnError::Pipe(std::io::Error::last_os_error()));
    }
    Ok((fds[0], fds[1]))
}
