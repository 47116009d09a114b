//! Monitor Loop State Machine
//!
//! Decides what the polling loop does after each cycle. A failed cycle is
//! never fatal; it only selects the longer backoff delay.

use std::time::Duration;

/// States of the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
}

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Modem initialised, polling begins
    Start,
    /// A polling cycle ran to completion
    CycleSucceeded,
    /// A polling cycle was aborted by an error
    CycleFailed,
    /// External stop signal observed between cycles
    StopRequested,
}

/// Result of processing an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Loop entered the running state
    Started,
    /// Wait the regular interval, then poll again
    Poll { delay: Duration },
    /// Wait the backoff interval, then poll again
    Backoff {
        delay: Duration,
        consecutive_failures: u32,
    },
    /// Loop left the running state
    Stopped,
    /// Event has no meaning in the current state
    Ignored {
        state: MonitorState,
        event: MonitorEvent,
    },
}

#[derive(Debug)]
pub struct MonitorStateMachine {
    state: MonitorState,
    poll_interval: Duration,
    backoff: Duration,
    cycles: u64,
    consecutive_failures: u32,
}

impl MonitorStateMachine {
    /// Create a new state machine in Stopped state
    pub fn new(poll_interval: Duration, backoff: Duration) -> Self {
        Self {
            state: MonitorState::Stopped,
            poll_interval,
            backoff,
            cycles: 0,
            consecutive_failures: 0,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Number of cycles completed or aborted since start
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: MonitorEvent) -> Transition {
        use MonitorEvent::*;
        use MonitorState::*;

        match (self.state, event) {
            (Stopped, Start) => {
                self.state = Running;
                self.consecutive_failures = 0;
                Transition::Started
            }
            (Running, CycleSucceeded) => {
                self.cycles += 1;
                self.consecutive_failures = 0;
                Transition::Poll {
                    delay: self.poll_interval,
                }
            }
            (Running, CycleFailed) => {
                self.cycles += 1;
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                Transition::Backoff {
                    delay: self.backoff,
                    consecutive_failures: self.consecutive_failures,
                }
            }
            (Running, StopRequested) => {
                self.state = Stopped;
                Transition::Stopped
            }
            (state, event) => Transition::Ignored { state, event },
        }
    }
}
