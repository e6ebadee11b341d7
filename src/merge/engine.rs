//! Thread merge / correlation engine.
//!
//! Correlates stack-walk samples with context-switch events by thread
//! identity. Each thread runs a small state machine:
//!
//! ```text
//! Idle -> Scheduled   on context-switch-in
//! Scheduled -> Idle   on context-switch-out
//! ```
//!
//! Stack samples arriving while `Scheduled` attribute to the running
//! thread's current run. Samples arriving while `Idle` attribute to the
//! thread's most recent completed run (earliest-preceding-switch wins);
//! with no prior run they are discarded and counted.
//!
//! The engine is optional: callers construct it only when merge mode is
//! requested, and feed it decoded events in chronological order.

use crate::catalog::providers::{
    OP_CSWITCH, OP_DC_START, OP_SET_NAME, OP_STACK, OP_START, STACK_WALK, THREAD,
};
use crate::decoder::{FieldValue, TypedEvent};
use crate::utils::config::{KERNEL_ADDRESS_CUTOFF_32, KERNEL_ADDRESS_CUTOFF_64};
use log::debug;
use std::collections::HashMap;

/// Whether an address belongs to kernel space, given the capture's
/// pointer width in bytes.
pub fn is_kernel_address(address: u64, pointer_size: u32) -> bool {
    if pointer_size == 4 {
        address >= KERNEL_ADDRESS_CUTOFF_32
    } else {
        address >= KERNEL_ADDRESS_CUTOFF_64
    }
}

/// One captured call stack attributed to a run.
#[derive(Debug, Clone, PartialEq)]
pub struct StackSample {
    /// Raw timestamp the sample was taken at
    pub timestamp: u64,
    /// Frames, innermost first
    pub frames: Vec<u64>,
}

/// A completed (or still-open) scheduled run of one thread, with the
/// stacks collected while it was on CPU.
#[derive(Debug, Clone)]
pub struct MergedRecord {
    pub thread_id: u32,
    pub thread_name: Option<String>,
    /// Raw timestamp of the context-switch-in
    pub schedule_timestamp: u64,
    /// Raw timestamp of the context-switch-out; None when the trace ended
    /// while the thread was still scheduled
    pub run_end: Option<u64>,
    /// Ticks spent off CPU before this run, if a prior run is known
    pub wait_ticks: Option<u64>,
    pub stacks: Vec<StackSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedState {
    Idle,
    Scheduled,
}

/// Per-thread accumulated state.
struct ThreadContext {
    thread_id: u32,
    name: Option<String>,
    state: SchedState,
    /// Raw timestamp of the last switch-out, for wait attribution
    last_switch_out: Option<u64>,
    /// Open run while Scheduled
    current: Option<MergedRecord>,
    completed: Vec<MergedRecord>,
}

impl ThreadContext {
    fn new(thread_id: u32) -> Self {
        Self {
            thread_id,
            name: None,
            state: SchedState::Idle,
            last_switch_out: None,
            current: None,
            completed: Vec::new(),
        }
    }
}

/// Outcome of a merge pass.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    /// All runs, ordered by schedule timestamp
    pub records: Vec<MergedRecord>,
    /// Samples that arrived while Idle with no prior run to attach to
    pub discarded_samples: u64,
    /// Distinct threads observed switching
    pub thread_count: usize,
}

/// Correlation engine over a chronological event stream.
#[derive(Default)]
pub struct MergeEngine {
    threads: HashMap<u32, ThreadContext>,
    discarded_samples: u64,
}

impl MergeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one decoded event. Events the engine does not care about are
    /// ignored; unknown events never reach a schema match here.
    pub fn handle_event(&mut self, event: &TypedEvent) {
        if event.provider == THREAD && event.opcode == OP_CSWITCH {
            let new_thread = event.field("NewThreadId").and_then(FieldValue::as_u32);
            let old_thread = event.field("OldThreadId").and_then(FieldValue::as_u32);
            if let Some(old) = old_thread {
                self.handle_switch_out(old, event.timestamp);
            }
            if let Some(new) = new_thread {
                self.handle_switch_in(new, event.timestamp);
            }
        } else if event.provider == STACK_WALK && event.opcode == OP_STACK {
            let thread_id = event.field("StackThread").and_then(FieldValue::as_u32);
            let timestamp = event
                .field("EventTimeStamp")
                .and_then(FieldValue::as_u64)
                .unwrap_or(event.timestamp);
            let frames = event
                .field("Stack")
                .and_then(FieldValue::as_pointer_array)
                .map(<[u64]>::to_vec);
            if let (Some(tid), Some(frames)) = (thread_id, frames) {
                self.handle_stack_sample(tid, timestamp, frames);
            }
        } else if event.provider == THREAD
            && (event.opcode == OP_SET_NAME
                || event.opcode == OP_START
                || event.opcode == OP_DC_START)
        {
            let thread_id = event.thread_id();
            let name = event.field("ThreadName").and_then(FieldValue::as_str);
            if let (Some(tid), Some(name)) = (thread_id, name) {
                if !name.is_empty() {
                    self.set_thread_name(tid, name.to_string());
                }
            }
        }
    }

    /// Context-switch-in: `Idle -> Scheduled`, opening a new run.
    pub fn handle_switch_in(&mut self, thread_id: u32, timestamp: u64) {
        // Thread 0 is the idle thread; it is never a real run.
        if thread_id == 0 {
            return;
        }
        let ctx = self
            .threads
            .entry(thread_id)
            .or_insert_with(|| ThreadContext::new(thread_id));
        if ctx.state == SchedState::Scheduled {
            // Missed the switch-out (dropped event). Close the open run
            // without an end before starting the next one.
            debug!("thread {thread_id}: switch-in while scheduled, closing open run");
            if let Some(run) = ctx.current.take() {
                ctx.completed.push(run);
            }
        }
        ctx.state = SchedState::Scheduled;
        ctx.current = Some(MergedRecord {
            thread_id,
            thread_name: ctx.name.clone(),
            schedule_timestamp: timestamp,
            run_end: None,
            wait_ticks: ctx
                .last_switch_out
                .map(|out| timestamp.saturating_sub(out)),
            stacks: Vec::new(),
        });
    }

    /// Context-switch-out: `Scheduled -> Idle`, completing the run.
    pub fn handle_switch_out(&mut self, thread_id: u32, timestamp: u64) {
        if thread_id == 0 {
            return;
        }
        let ctx = self
            .threads
            .entry(thread_id)
            .or_insert_with(|| ThreadContext::new(thread_id));
        if let Some(mut run) = ctx.current.take() {
            run.run_end = Some(timestamp);
            ctx.completed.push(run);
        }
        ctx.state = SchedState::Idle;
        ctx.last_switch_out = Some(timestamp);
    }

    /// Attribute a stack sample to the thread's current or prior run.
    pub fn handle_stack_sample(&mut self, thread_id: u32, timestamp: u64, frames: Vec<u64>) {
        let Some(ctx) = self.threads.get_mut(&thread_id) else {
            self.discarded_samples += 1;
            return;
        };
        let sample = StackSample { timestamp, frames };
        match ctx.state {
            SchedState::Scheduled => {
                if let Some(run) = ctx.current.as_mut() {
                    run.stacks.push(sample);
                } else {
                    self.discarded_samples += 1;
                }
            }
            // Earliest-preceding-switch wins: the sample belongs to the
            // most recent completed run.
            SchedState::Idle => match ctx.completed.last_mut() {
                Some(run) => run.stacks.push(sample),
                None => self.discarded_samples += 1,
            },
        }
    }

    /// Record a thread name for later runs of that thread.
    pub fn set_thread_name(&mut self, thread_id: u32, name: String) {
        let ctx = self
            .threads
            .entry(thread_id)
            .or_insert_with(|| ThreadContext::new(thread_id));
        if let Some(run) = ctx.current.as_mut() {
            run.thread_name = Some(name.clone());
        }
        ctx.name = Some(name);
    }

    /// Flush all per-thread state into the final outcome. Open runs are
    /// emitted without an end timestamp.
    pub fn finish(self) -> MergeOutcome {
        let thread_count = self.threads.len();
        let mut records = Vec::new();
        for (_, mut ctx) in self.threads {
            records.append(&mut ctx.completed);
            if let Some(run) = ctx.current.take() {
                records.push(run);
            }
        }
        records.sort_by_key(|r| r.schedule_timestamp);
        MergeOutcome {
            records,
            discarded_samples: self.discarded_samples,
            thread_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_while_scheduled_attribute_to_run() {
        let mut engine = MergeEngine::new();
        engine.handle_switch_in(7, 100);
        engine.handle_stack_sample(7, 110, vec![0x1000]);
        engine.handle_stack_sample(7, 120, vec![0x2000]);
        engine.handle_stack_sample(7, 130, vec![0x3000]);
        engine.handle_switch_out(7, 140);

        let outcome = engine.finish();
        assert_eq!(outcome.records.len(), 1);
        let run = &outcome.records[0];
        assert_eq!(run.thread_id, 7);
        assert_eq!(run.schedule_timestamp, 100);
        assert_eq!(run.run_end, Some(140));
        assert_eq!(run.stacks.len(), 3);
        assert_eq!(outcome.discarded_samples, 0);
    }

    #[test]
    fn test_idle_sample_attributes_to_prior_run() {
        let mut engine = MergeEngine::new();
        engine.handle_switch_in(7, 100);
        engine.handle_switch_out(7, 140);
        // The stack walk for a sample near the switch-out can arrive after
        // the thread has gone idle.
        engine.handle_stack_sample(7, 139, vec![0x1000]);

        let outcome = engine.finish();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].stacks.len(), 1);
        assert_eq!(outcome.discarded_samples, 0);
    }

    #[test]
    fn test_idle_sample_with_no_prior_run_is_discarded() {
        let mut engine = MergeEngine::new();
        engine.handle_switch_out(7, 90);
        engine.handle_stack_sample(7, 95, vec![0x1000]);
        engine.handle_stack_sample(9, 96, vec![0x2000]);

        let outcome = engine.finish();
        assert_eq!(outcome.records.len(), 0);
        assert_eq!(outcome.discarded_samples, 2);
    }

    #[test]
    fn test_wait_ticks_between_runs() {
        let mut engine = MergeEngine::new();
        engine.handle_switch_in(7, 100);
        engine.handle_switch_out(7, 140);
        engine.handle_switch_in(7, 200);
        engine.handle_switch_out(7, 210);

        let outcome = engine.finish();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].wait_ticks, None);
        assert_eq!(outcome.records[1].wait_ticks, Some(60));
    }

    #[test]
    fn test_missed_switch_out_closes_open_run() {
        let mut engine = MergeEngine::new();
        engine.handle_switch_in(7, 100);
        engine.handle_switch_in(7, 150);
        engine.handle_switch_out(7, 180);

        let outcome = engine.finish();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].run_end, None);
        assert_eq!(outcome.records[1].run_end, Some(180));
    }

    #[test]
    fn test_idle_thread_is_ignored() {
        let mut engine = MergeEngine::new();
        engine.handle_switch_in(0, 100);
        engine.handle_switch_out(0, 140);
        let outcome = engine.finish();
        assert_eq!(outcome.records.len(), 0);
        assert_eq!(outcome.thread_count, 0);
    }

    #[test]
    fn test_thread_name_applies_to_open_and_later_runs() {
        let mut engine = MergeEngine::new();
        engine.handle_switch_in(7, 100);
        engine.set_thread_name(7, "worker".to_string());
        engine.handle_switch_out(7, 140);
        engine.handle_switch_in(7, 200);
        engine.handle_switch_out(7, 240);

        let outcome = engine.finish();
        assert_eq!(outcome.records[0].thread_name.as_deref(), Some("worker"));
        assert_eq!(outcome.records[1].thread_name.as_deref(), Some("worker"));
    }

    #[test]
    fn test_kernel_address_cutoffs() {
        assert!(is_kernel_address(0xFFFF_8000_0000_0000, 8));
        assert!(!is_kernel_address(0x0000_7FFF_0000_0000, 8));
        assert!(is_kernel_address(0x8000_0000, 4));
        assert!(!is_kernel_address(0x7FFF_FFFF, 4));
    }
}
