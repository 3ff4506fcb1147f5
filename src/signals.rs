//! Signal router: installs the handlers that turn terminal-generated and
//! child-status signals into either a reap-queue event or a forwarded
//! signal to the foreground process group, plus the terminal-control
//! primitives the controller needs around a foreground wait.
//!
//! Everything running inside `extern "C" fn` here is restricted to
//! async-signal-safe calls (`waitpid`, `kill`) and atomic loads/stores —
//! no allocation, no `println!`, no locking.

use std::io;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::reap_queue::{self, ReapOutcome};
use crate::status::{self, WaitStatus};

/// pgid of the job currently holding the terminal, or 0 if none. Read by
/// the SIGINT/SIGTSTP handlers to decide where to forward the signal.
static FOREGROUND_PGID: AtomicI32 = AtomicI32::new(0);

pub fn set_foreground_pgid(pgid: libc::pid_t) {
    FOREGROUND_PGID.store(pgid, Ordering::Release);
}

pub fn clear_foreground_pgid() {
    FOREGROUND_PGID.store(0, Ordering::Release);
}

/// Install SIGCHLD/SIGINT/SIGTSTP handlers and set SIGTTIN/SIGTTOU to
/// `SIG_IGN` so the shell itself, backgrounded by its own pipeline, never
/// stops on terminal I/O. Callable repeatedly and defensively — the
/// controller reinstalls on every prompt iteration in case something in a
/// pipeline's `exec`d program reset a disposition it shouldn't have.
pub fn install_handlers() -> io::Result<()> {
    install(libc::SIGCHLD, handle_sigchld)?;
    install(libc::SIGINT, handle_sigint)?;
    install(libc::SIGTSTP, handle_sigtstp)?;
    ignore(libc::SIGTTIN)?;
    ignore(libc::SIGTTOU)?;
    Ok(())
}

fn install(signal: libc::c_int, handler: extern "C" fn(libc::c_int)) -> io::Result<()> {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handler as usize;
        libc::sigemptyset(&mut action.sa_mask);
        action.sa_flags = libc::SA_RESTART;
        if libc::sigaction(signal, &action, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

fn ignore(signal: libc::c_int) -> io::Result<()> {
    unsafe {
        if libc::signal(signal, libc::SIG_IGN) == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Drain every currently-reapable child with a non-blocking, signal-safe
/// loop and push one event per pid onto the reap queue. Never blocks: a
/// SIGCHLD can coalesce several child-status changes, so this keeps
/// calling `waitpid` until it reports nothing left.
extern "C" fn handle_sigchld(_signal: libc::c_int) {
    loop {
        let mut raw_status: libc::c_int = 0;
        let pid = unsafe { libc::waitpid(-1, &mut raw_status, libc::WNOHANG | libc::WUNTRACED) };
        if pid <= 0 {
            break;
        }
        let outcome = match status::decode(raw_status) {
            Some(WaitStatus::Exited(code)) => ReapOutcome::Exited(code),
            Some(WaitStatus::Signaled(signal)) => ReapOutcome::Signaled(signal),
            Some(WaitStatus::Stopped) => ReapOutcome::Stopped,
            None => continue,
        };
        reap_queue::push(pid, outcome);
    }
}

/// Forward Ctrl-C to the foreground process group. If nothing currently
/// owns the terminal, absorb it: a bare newline and a fresh prompt.
extern "C" fn handle_sigint(_signal: libc::c_int) {
    forward_to_foreground(libc::SIGINT);
}

/// Forward Ctrl-Z the same way.
extern "C" fn handle_sigtstp(_signal: libc::c_int) {
    forward_to_foreground(libc::SIGTSTP);
}

fn forward_to_foreground(signal: libc::c_int) {
    let pgid = FOREGROUND_PGID.load(Ordering::Acquire);
    if pgid > 0 {
        unsafe {
            libc::kill(-pgid, signal);
        }
    } else {
        write_prompt_redraw();
    }
}

/// Async-signal-safe "absorbed" response for SIGINT/SIGTSTP arriving at an
/// empty prompt (no foreground job to forward to): a bare newline plus a
/// fresh prompt, written directly via `write(2)` rather than buffered stdio.
/// The prompt string is the literal `config::ShellConfig`'s default — it
/// can't be reached from here since handler bodies may not call into
/// allocating, non-async-signal-safe code.
fn write_prompt_redraw() {
    const MSG: &[u8] = b"\n# ";
    unsafe {
        libc::write(libc::STDOUT_FILENO, MSG.as_ptr() as *const libc::c_void, MSG.len());
    }
}

/// Block SIGCHLD for the duration of `f`, then restore the previous mask.
/// Used to wrap a fork-then-insert-into-job-table sequence so the reaper
/// cannot run, and thus cannot observe a pid the job table doesn't know
/// about yet, between the two steps.
pub fn block_sigchld_during<T>(f: impl FnOnce() -> T) -> T {
    unsafe {
        let mut block_set: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut block_set);
        libc::sigaddset(&mut block_set, libc::SIGCHLD);
        let mut previous: libc::sigset_t = std::mem::zeroed();
        libc::sigprocmask(libc::SIG_BLOCK, &block_set, &mut previous);
        let result = f();
        libc::sigprocmask(libc::SIG_SETMASK, &previous, std::ptr::null_mut());
        result
    }
}

/// Hands the controlling terminal to `pgid` on construction and back to
/// the shell's own process group on drop, ignoring SIGTTOU for the
/// duration of each `tcsetpgrp` call (the shell itself may be in a
/// background group relative to some ancestor, in which case `tcsetpgrp`
/// would otherwise stop it).
pub struct ForegroundTerminalGuard {
    tty_fd: Option<libc::c_int>,
    shell_pgid: libc::pid_t,
}

impl ForegroundTerminalGuard {
    pub fn new(target_pgid: libc::pid_t) -> io::Result<Self> {
        let tty_fd = if unsafe { libc::isatty(libc::STDIN_FILENO) } == 1 {
            Some(libc::STDIN_FILENO)
        } else {
            None
        };
        let shell_pgid = unsafe { libc::getpgrp() };
        let guard = Self { tty_fd, shell_pgid };
        if let Some(fd) = guard.tty_fd {
            set_terminal_foreground(fd, target_pgid)?;
        }
        set_foreground_pgid(target_pgid);
        Ok(guard)
    }
}

impl Drop for ForegroundTerminalGuard {
    fn drop(&mut self) {
        clear_foreground_pgid();
        if let Some(fd) = self.tty_fd {
            let _ = set_terminal_foreground(fd, self.shell_pgid);
        }
    }
}

fn set_terminal_foreground(fd: libc::c_int, pgid: libc::pid_t) -> io::Result<()> {
    if pgid <= 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "invalid pgid"));
    }
    let previous = unsafe { libc::signal(libc::SIGTTOU, libc::SIG_IGN) };
    let result = loop {
        let rc = unsafe { libc::tcsetpgrp(fd, pgid) };
        if rc == 0 {
            break Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        break Err(err);
    };
    unsafe {
        libc::signal(libc::SIGTTOU, previous);
    }
    result
}

/// `setpgid` with EINTR retry. Called both from the parent (to set the
/// child's group from outside, closing the fork/exec race on slow
/// schedulers) and mirrored inside the child's `pre_exec`.
pub fn set_process_group(pid: libc::pid_t, pgid: libc::pid_t) -> io::Result<()> {
    loop {
        let rc = unsafe { libc::setpgid(pid, pgid) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(code) if code == libc::EINTR => continue,
            Some(code) if code == libc::EACCES || code == libc::ESRCH => return Ok(()),
            _ => return Err(err),
        }
    }
}

/// Send `SIGCONT` to an entire process group, used by `bg`/`fg` to wake a
/// stopped job back up.
pub fn send_continue_to_group(pgid: libc::pid_t) -> io::Result<()> {
    if pgid <= 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "invalid pgid"));
    }
    loop {
        let rc = unsafe { libc::kill(-pgid, libc::SIGCONT) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreground_pgid_round_trips() {
        set_foreground_pgid(4242);
        assert_eq!(FOREGROUND_PGID.load(Ordering::Acquire), 4242);
        clear_foreground_pgid();
        assert_eq!(FOREGROUND_PGID.load(Ordering::Acquire), 0);
    }

    #[test]
    fn block_sigchld_during_runs_closure_and_returns_value() {
        let value = block_sigchld_during(|| 7);
        assert_eq!(value, 7);
    }
}
