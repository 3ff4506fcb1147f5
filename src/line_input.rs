//! Line acquisition. Deliberately canonical-mode: the terminal's own line
//! discipline (ISIG, ICANON) does the editing and is what turns Ctrl-C and
//! Ctrl-Z into real `SIGINT`/`SIGTSTP` delivered to the whole foreground
//! process group, which is what the signal router depends on. A raw-mode
//! line editor would have to reimplement that forwarding by hand and would
//! fight the kernel's own terminal-stop handling.

use std::io::{self, BufRead, Write};

/// Print `prompt`, then read one line. Returns `Ok(None)` at end-of-input,
/// `Ok(Some(line))` with the trailing newline stripped otherwise. A read
/// interrupted by a signal (possible even under `SA_RESTART` on some
/// platforms for certain signal/fd combinations) is retried rather than
/// surfaced as an error.
pub fn read_line(prompt: &str, stdin: &mut dyn BufRead) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut buffer = String::new();
    loop {
        buffer.clear();
        match stdin.read_line(&mut buffer) {
            Ok(0) => return Ok(None),
            Ok(_) => {
                if buffer.ends_with('\n') {
                    buffer.pop();
                    if buffer.ends_with('\r') {
                        buffer.pop();
                    }
                }
                return Ok(Some(buffer));
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_one_line_without_newline() {
        let mut input = io::Cursor::new(b"echo hi\n".to_vec());
        let line = read_line("# ", &mut input).unwrap();
        assert_eq!(line.as_deref(), Some("echo hi"));
    }

    #[test]
    fn eof_on_empty_input() {
        let mut input = io::Cursor::new(Vec::new());
        let line = read_line("# ", &mut input).unwrap();
        assert_eq!(line, None);
    }

    #[test]
    fn strips_trailing_carriage_return() {
        let mut input = io::Cursor::new(b"ls\r\n".to_vec());
        let line = read_line("# ", &mut input).unwrap();
        assert_eq!(line.as_deref(), Some("ls"));
    }
}
