//! Job table.
//!
//! A value-typed, head-ordered sequence addressed by pgid rather than a
//! pointer-linked list. Insertion is always at the head; "most recent" means
//! "nearest the head".

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Stopped,
    Done,
}

/// One pipeline submitted by one user command.
#[derive(Debug, Clone)]
pub struct Job {
    pub job_id: usize,
    pub pgid: libc::pid_t,
    pub command_text: String,
    pub status: JobStatus,
    pub in_foreground: bool,
    /// Pids of every process in this job's group that have not yet been
    /// reaped. Internal bookkeeping, not part of the user-visible record:
    /// it lets the controller, as the reap queue's sole consumer, attribute
    /// a reaped pid to a job without a second syscall.
    pub(crate) pending_pids: Vec<libc::pid_t>,
    /// Pid of the pipeline's last stage — its exit/signal status is the
    /// one the shell reports for the whole job, the usual pipeline
    /// convention.
    pub(crate) last_stage_pid: libc::pid_t,
}

/// Ordered collection of jobs, head = most recently inserted.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: VecDeque<Job>,
    next_id: usize,
}

impl JobTable {
    pub fn new() -> Self {
        JobTable {
            jobs: VecDeque::new(),
            next_id: 1,
        }
    }

    /// Insert a job at the head. `job_id` = previous head's `job_id` + 1, or
    /// 1 if the table is empty.
    pub fn push(
        &mut self,
        command_text: String,
        pgid: libc::pid_t,
        status: JobStatus,
        in_foreground: bool,
        pending_pids: Vec<libc::pid_t>,
        last_stage_pid: libc::pid_t,
    ) -> usize {
        let job_id = self.next_id;
        self.next_id += 1;
        log::debug!("job table: push [{job_id}] pgid={pgid} {command_text:?}");
        self.jobs.push_front(Job {
            job_id,
            pgid,
            command_text,
            status,
            in_foreground,
            pending_pids,
            last_stage_pid,
        });
        job_id
    }

    pub fn find_by_pgid(&self, pgid: libc::pid_t) -> Option<&Job> {
        self.jobs.iter().find(|j| j.pgid == pgid)
    }

    pub fn find_by_pgid_mut(&mut self, pgid: libc::pid_t) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.pgid == pgid)
    }

    /// Find whichever job currently owns `pid` as one of its unreaped
    /// member processes.
    pub fn find_by_member_pid_mut(&mut self, pid: libc::pid_t) -> Option<&mut Job> {
        self.jobs
            .iter_mut()
            .find(|j| j.pending_pids.contains(&pid))
    }

    /// The unique job with `in_foreground = true`, if any.
    pub fn foreground_job(&self) -> Option<&Job> {
        self.jobs.iter().find(|j| j.in_foreground)
    }

    /// First job in head-to-tail order that is Stopped or a non-Done
    /// background job — the `fg` target.
    pub fn most_recent_stopped_or_background(&self) -> Option<&Job> {
        self.jobs.iter().find(|j| {
            j.status == JobStatus::Stopped || (j.status == JobStatus::Running && !j.in_foreground)
        })
    }

    /// First Stopped job in head-to-tail order — the `bg` target.
    pub fn most_recent_stopped(&self) -> Option<&Job> {
        self.jobs.iter().find(|j| j.status == JobStatus::Stopped)
    }

    pub fn set_status(&mut self, pgid: libc::pid_t, new_status: JobStatus) {
        if let Some(job) = self.find_by_pgid_mut(pgid) {
            log::debug!("job table: [{}] status -> {new_status:?}", job.job_id);
            job.status = new_status;
        }
    }

    pub fn set_foreground_flag(&mut self, pgid: libc::pid_t, flag: bool) {
        if let Some(job) = self.find_by_pgid_mut(pgid) {
            job.in_foreground = flag;
        }
    }

    /// Append ` &` to the job's command text, once. Called on every `bg`
    /// demotion; a no-op on the second and later call for the same job so
    /// repeated `bg`/`fg`/`bg` cycling never accumulates more than one.
    pub fn append_background_marker(&mut self, pgid: libc::pid_t) {
        if let Some(job) = self.find_by_pgid_mut(pgid) {
            if !job.command_text.ends_with(" &") {
                job.command_text.push_str(" &");
            }
        }
    }

    /// Structural removal by pgid.
    pub fn remove(&mut self, pgid: libc::pid_t) -> Option<Job> {
        let idx = self.jobs.iter().position(|j| j.pgid == pgid)?;
        let job = self.jobs.remove(idx);
        if let Some(ref j) = job {
            log::debug!("job table: remove [{}] pgid={}", j.job_id, j.pgid);
        }
        job
    }

    /// Remove every Done job. Runs at the start of each prompt cycle, after
    /// `print_done_notices`.
    pub fn sweep_done(&mut self) {
        self.jobs.retain(|j| j.status != JobStatus::Done);
    }

    /// All jobs oldest-first (tail-to-head) — the display order.
    fn tail_to_head(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter().rev()
    }

    /// Emit one line per job, oldest-first, in the job-listing format.
    /// `+` marks the head (most recent); `-` marks every other.
    pub fn print_table(&self) {
        for line in self.format_table() {
            println!("{line}");
        }
    }

    /// Emit one line per Done job, oldest-first, in the same format.
    pub fn print_done_notices(&self) {
        for line in self.format_done_notices() {
            println!("{line}");
        }
    }

    fn format_table(&self) -> Vec<String> {
        let head_pgid = self.jobs.front().map(|j| j.pgid);
        self.tail_to_head()
            .map(|j| format_line(j, head_pgid))
            .collect()
    }

    fn format_done_notices(&self) -> Vec<String> {
        let head_pgid = self.jobs.front().map(|j| j.pgid);
        self.tail_to_head()
            .filter(|j| j.status == JobStatus::Done)
            .map(|j| format_line(j, head_pgid))
            .collect()
    }
}

fn format_line(job: &Job, head_pgid: Option<libc::pid_t>) -> String {
    let marker = if Some(job.pgid) == head_pgid { '+' } else { '-' };
    match job.status {
        JobStatus::Running => format!("[{}]{marker}  Running         {}", job.job_id, job.command_text),
        JobStatus::Stopped => format!("[{}]{marker}  Stopped         {}", job.job_id, job.command_text),
        JobStatus::Done => format!("[{}]{marker}  Done            {}", job.job_id, job.command_text),
    }
}
