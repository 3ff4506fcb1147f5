//! Lock-free single-producer/single-consumer queue between the SIGCHLD
//! handler (producer) and the controller loop (sole consumer): child-status
//! events are delivered onto a queue drained by the controller, rather than
//! by re-entering job-table code from a signal.
//!
//! Only atomics are used so the producer side stays safe to call from a
//! signal handler: no allocation, no locks, no syscalls beyond the ones the
//! handler already makes to reap children.

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

const CAPACITY: usize = 256;

/// What happened to one reaped pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapOutcome {
    Exited(i32),
    Signaled(i32),
    Stopped,
}

#[derive(Debug, Clone, Copy)]
pub struct ReapEvent {
    pub pid: libc::pid_t,
    pub outcome: ReapOutcome,
}

/// `0` = empty, `1` = exited, `2` = signaled, `3` = stopped. `code` is the
/// exit code or signal number; unused (0) for `Stopped`.
struct Slot {
    pid: AtomicI32,
    kind: AtomicI32,
    code: AtomicI32,
}

const EMPTY_SLOT: Slot = Slot {
    pid: AtomicI32::new(0),
    kind: AtomicI32::new(0),
    code: AtomicI32::new(0),
};

static SLOTS: [Slot; CAPACITY] = [EMPTY_SLOT; CAPACITY];
static HEAD: AtomicUsize = AtomicUsize::new(0);
static TAIL: AtomicUsize = AtomicUsize::new(0);

/// Producer side: called only from the SIGCHLD handler. Drops the event if
/// the queue is full rather than blocking — an interactive shell tracks at
/// most a handful of jobs, so `CAPACITY` is never realistically exhausted;
/// dropping is safer than any allocation or blocking behavior here.
pub fn push(pid: libc::pid_t, outcome: ReapOutcome) {
    let head = HEAD.load(Ordering::Relaxed);
    let tail = TAIL.load(Ordering::Acquire);
    if head.wrapping_sub(tail) >= CAPACITY {
        return;
    }
    let idx = head % CAPACITY;
    let (kind, code) = match outcome {
        ReapOutcome::Exited(c) => (1, c),
        ReapOutcome::Signaled(s) => (2, s),
        ReapOutcome::Stopped => (3, 0),
    };
    SLOTS[idx].pid.store(pid, Ordering::Relaxed);
    SLOTS[idx].code.store(code, Ordering::Relaxed);
    SLOTS[idx].kind.store(kind, Ordering::Release);
    HEAD.store(head.wrapping_add(1), Ordering::Release);
}

/// Consumer side: called only from the single controller thread.
pub fn pop() -> Option<ReapEvent> {
    let tail = TAIL.load(Ordering::Relaxed);
    let head = HEAD.load(Ordering::Acquire);
    if tail == head {
        return None;
    }
    let idx = tail % CAPACITY;
    let kind = SLOTS[idx].kind.load(Ordering::Acquire);
    let pid = SLOTS[idx].pid.load(Ordering::Relaxed);
    let code = SLOTS[idx].code.load(Ordering::Relaxed);
    TAIL.store(tail.wrapping_add(1), Ordering::Release);

    let outcome = match kind {
        1 => ReapOutcome::Exited(code),
        2 => ReapOutcome::Signaled(code),
        3 => ReapOutcome::Stopped,
        _ => return None,
    };
    Some(ReapEvent { pid, outcome })
}
