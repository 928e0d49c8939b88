//! Shared debate-lifetime control state (§3 "Interrupt signal", §5 "Shared-resource
//! policy"): the user constraint list and the single-shot interrupt latch, guarded
//! by one mutex since they are always mutated together from `InjectConstraint`.

use std::sync::Mutex;

struct ControlState {
    constraints: Vec<String>,
    interrupted: bool,
}

/// Owned by the orchestrator for one debate's lifetime; a clone of the `Arc`
/// wrapping this is held by the session handler so `InjectConstraint` can reach
/// it from outside the orchestrator's task.
pub struct DebateControl {
    state: Mutex<ControlState>,
}

impl DebateControl {
    pub fn new() -> Self {
        DebateControl { state: Mutex::new(ControlState { constraints: Vec::new(), interrupted: false }) }
    }

    /// Append `text` to the constraint list and set the interrupt latch. Safe to
    /// call concurrently with the orchestrator reading constraints or consuming
    /// the latch; no deduplication is performed (§8 round-trip property).
    pub fn inject_constraint(&self, text: String) {
        let mut state = self.state.lock().unwrap();
        state.constraints.push(text);
        state.interrupted = true;
    }

    /// Snapshot of every constraint injected so far, in injection order.
    pub fn constraints_snapshot(&self) -> Vec<String> {
        self.state.lock().unwrap().constraints.clone()
    }

    /// Consume the interrupt latch, returning whether it was set. Auto-clears on
    /// read, matching the single-shot latch semantics in §3.
    pub fn take_interrupt(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        std::mem::replace(&mut state.interrupted, false)
    }
}

impl Default for DebateControl {
    fn default() -> Self {
        Self::new()
    }
}
