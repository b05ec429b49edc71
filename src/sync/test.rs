//! # Synchronization Tests
//!
//! Valida a semântica de `Completion` (gate binário, timeout, complete_all)
//! e o agendamento coalescido do `IrqWork`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::{Completion, IrqWork};
use crate::hal::Monotonic;

struct HostClock(Instant);

impl Monotonic for HostClock {
    fn now_ns(&self) -> u64 {
        self.0.elapsed().as_nanos() as u64
    }
}

#[test]
fn gate_starts_open_and_closes_after_wait() {
    let gate = Completion::new_done();
    assert!(gate.is_done());
    assert!(gate.try_wait());
    assert!(!gate.try_wait());
    gate.complete();
    assert!(gate.try_wait());
}

#[test]
fn wait_timeout_expires_without_event() {
    let clock = HostClock(Instant::now());
    let c = Completion::new();
    let start = Instant::now();
    assert!(!c.wait_timeout(&clock, 2_000_000));
    assert!(start.elapsed() >= Duration::from_millis(2));
}

#[test]
fn reinit_discards_pending_events() {
    let c = Completion::new();
    c.complete();
    c.complete();
    c.reinit();
    assert!(!c.is_done());
}

#[test]
fn complete_all_releases_every_waiter() {
    let c = Completion::new();
    c.complete_all();
    assert!(c.try_wait());
    assert!(c.try_wait());
    c.complete();
    assert!(c.try_wait());
}

#[test]
fn gate_serializes_two_threads() {
    let gate = Arc::new(Completion::new_done());
    let inside = Arc::new(AtomicUsize::new(0));
    let overlap = Arc::new(AtomicBool::new(false));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let gate = gate.clone();
            let inside = inside.clone();
            let overlap = overlap.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    gate.wait();
                    if inside.fetch_add(1, Ordering::SeqCst) != 0 {
                        overlap.store(true, Ordering::SeqCst);
                    }
                    inside.fetch_sub(1, Ordering::SeqCst);
                    gate.complete();
                }
            })
        })
        .collect();

    for w in workers {
        w.join().unwrap();
    }
    assert!(!overlap.load(Ordering::SeqCst));
    assert!(gate.is_done());
}

#[test]
fn irq_work_coalesces_schedules() {
    let work = IrqWork::new();
    assert!(work.schedule());
    assert!(!work.schedule());

    let mut runs = 0;
    assert!(work.run(|| runs += 1));
    assert!(!work.run(|| runs += 1));
    assert_eq!(runs, 1);
}

#[test]
fn irq_work_schedule_during_run_is_kept() {
    let work = IrqWork::new();
    work.schedule();
    work.run(|| {
        assert!(work.schedule());
    });
    assert!(work.is_scheduled());
}
