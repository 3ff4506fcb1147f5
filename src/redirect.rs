//! Redirection descriptor + child-side applier.
//!
//! The descriptor is built by the lexer (one per stage); `apply_in_child`
//! runs inside the forked child's `pre_exec` closure, after the process has
//! joined its pipeline's process group but before `exec`. A file-open
//! failure here is fatal only to the child: it prints a diagnostic tagged
//! with the offending path to its still-current stderr and exits(1) — it
//! must never surface as an `Err` from the parent's `Command::spawn()`,
//! since the parent observes it only through the normal reap path.

use std::ffi::CString;

/// The (at most) three named redirection targets for one stage.
#[derive(Debug, Clone, Default)]
pub struct RedirectionSpec {
    pub stdin: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

/// Mode bits for files created by `>`/`2>`: user rw, group rw, other r.
const CREATE_MODE: libc::mode_t = 0o664;

/// Open and wire up the three standard streams per the descriptor. Called
/// from within `pre_exec`, so it runs after `fork` and before `exec` in the
/// child — everything here must be async-signal-safe-adjacent in spirit
/// (no Rust-level panics, no allocation beyond what `CString` needs, which
/// is fine this late: `pre_exec` runs before the process image is replaced,
/// not inside an actual signal handler).
pub fn apply_in_child(spec: &RedirectionSpec) {
    if let Some(path) = &spec.stdin {
        let fd = open_checked(path, libc::O_RDONLY, 0, path);
        dup_onto(fd, libc::STDIN_FILENO, path);
    }
    if let Some(path) = &spec.stdout {
        let fd = open_checked(
            path,
            libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC,
            CREATE_MODE,
            path,
        );
        dup_onto(fd, libc::STDOUT_FILENO, path);
    }
    if let Some(path) = &spec.stderr {
        let fd = open_checked(
            path,
            libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC,
            CREATE_MODE,
            path,
        );
        dup_onto(fd, libc::STDERR_FILENO, path);
    }
}

/// `open(2)` a path, exiting the child with a diagnostic on failure.
fn open_checked(path: &str, flags: libc::c_int, mode: libc::mode_t, label: &str) -> libc::c_int {
    let Ok(c_path) = CString::new(path) else {
        diagnostic_and_exit(label);
    };
    let fd = unsafe { libc::open(c_path.as_ptr(), flags, mode as libc::c_int) };
    if fd < 0 {
        diagnostic_and_exit(label);
    }
    fd
}

/// `dup2` `fd` onto `target`, then close the original if they differ.
fn dup_onto(fd: libc::c_int, target: libc::c_int, label: &str) {
    if unsafe { libc::dup2(fd, target) } < 0 {
        diagnostic_and_exit(label);
    }
    if fd != target {
        unsafe { libc::close(fd) };
    }
}

fn diagnostic_and_exit(path: &str) -> ! {
    eprintln!("yash: {path}: {}", std::io::Error::last_os_error());
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_has_no_redirections() {
        let spec = RedirectionSpec::default();
        assert!(spec.stdin.is_none());
        assert!(spec.stdout.is_none());
        assert!(spec.stderr.is_none());
    }
}
