mod builtins;
mod config;
mod error;
mod jobs;
mod lexer;
mod line_input;
mod reap_queue;
mod redirect;
mod signals;
mod spawner;
mod status;
mod waiter;

use std::io::{self, BufRead};
use std::process::ExitCode;

use config::ShellConfig;
use jobs::JobTable;
use signals::ForegroundTerminalGuard;

fn main() -> ExitCode {
    env_logger::init();

    if let Err(err) = signals::install_handlers() {
        eprintln!("yash: failed to install signal handlers: {err}");
        return ExitCode::FAILURE;
    }

    let config = ShellConfig::default();
    let mut job_table = JobTable::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    run(&config, &mut job_table, &mut stdin_lock)
}

fn run(config: &ShellConfig, job_table: &mut JobTable, stdin: &mut dyn BufRead) -> ExitCode {
    loop {
        // Defensive reinstall: a previous exec'd child in this process
        // image never runs here, but a future signal-disposition bug
        // should not be able to wedge the shell out of its own handlers.
        if let Err(err) = signals::install_handlers() {
            log::warn!("signal handler reinstall failed: {err}");
        }

        waiter::background_reap(job_table);
        job_table.print_done_notices();
        job_table.sweep_done();

        let line = match line_input::read_line(config.prompt, stdin) {
            Ok(None) => return ExitCode::SUCCESS,
            Ok(Some(line)) => line,
            Err(err) => {
                eprintln!("yash: {err}");
                return ExitCode::FAILURE;
            }
        };

        let parsed = match lexer::parse_line(&line, config) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::debug!("line rejected: {err}");
                println!();
                continue;
            }
        };

        let first_token = parsed.stage1.argv[0].as_str();
        if builtins::is_builtin(first_token) {
            builtins::execute(first_token, job_table);
            continue;
        }

        match spawner::spawn_pipeline(&parsed, line.clone(), parsed.background, job_table) {
            Ok(job_id) => {
                if !parsed.background {
                    run_foreground_wait(job_id, job_table);
                }
            }
            Err(err) if err.is_fatal() => {
                eprintln!("yash: {err}");
                return ExitCode::FAILURE;
            }
            Err(err) => {
                // Exec failure: no child ever lived to become a Job, so
                // there is nothing to reap or remove. Not shell-visible,
                // per spec — the same as any other external-command
                // failure; only logged for diagnostics.
                log::debug!("{err}");
            }
        }
    }
}

fn run_foreground_wait(job_id: usize, job_table: &mut JobTable) {
    let Some(job) = job_table.foreground_job() else {
        return;
    };
    debug_assert_eq!(job.job_id, job_id);
    let pgid = job.pgid;

    let guard = match ForegroundTerminalGuard::new(pgid) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("yash: failed to take the terminal: {err}");
            return;
        }
    };
    waiter::foreground_wait(pgid, job_table);
    drop(guard);
}
