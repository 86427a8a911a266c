//! Test doubles for the control channel and the key-event source.
//!
//! End-to-end behavior needs real EnergyDrv hardware, so the unit and
//! integration tests across the workspace run against these scripted
//! stand-ins instead.

use std::collections::{HashMap, VecDeque};

use parking_lot::{Condvar, Mutex};

use crate::channel::ControlChannel;
use crate::error::ChannelError;
use crate::events::EventSource;
use crate::ioctl;

/// Scripted control channel: replies keyed by `(ioctl, payload)`,
/// injectable failures, and an ordered log of every exchange sent.
#[derive(Default)]
pub struct MockChannel {
    replies: Mutex<HashMap<(u32, u32), u32>>,
    failures: Mutex<Vec<(u32, u32)>>,
    sent: Mutex<Vec<(u32, u32)>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the reply for one `(ioctl, payload)` exchange.
    /// Unscripted exchanges reply 0.
    pub fn reply(&self, ioctl: u32, payload: u32, reply: u32) {
        self.replies.lock().insert((ioctl, payload), reply);
    }

    /// Make a specific exchange fail with an I/O error.
    pub fn fail_on(&self, ioctl: u32, payload: u32) {
        self.failures.lock().push((ioctl, payload));
    }

    /// Stop failing a previously failed exchange.
    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// Every exchange issued so far, in order.
    pub fn sent(&self) -> Vec<(u32, u32)> {
        self.sent.lock().clone()
    }

    /// Payloads sent to one ioctl family, in order.
    pub fn sent_to(&self, ioctl: u32) -> Vec<u32> {
        self.sent
            .lock()
            .iter()
            .filter(|(i, _)| *i == ioctl)
            .map(|(_, p)| *p)
            .collect()
    }
}

impl ControlChannel for MockChannel {
    fn exchange(&self, ioctl: u32, payload: u32) -> Result<u32, ChannelError> {
        self.sent.lock().push((ioctl, payload));
        if self.failures.lock().contains(&(ioctl, payload)) {
            return Err(ChannelError::Io { ioctl, code: 31 });
        }
        Ok(self
            .replies
            .lock()
            .get(&(ioctl, payload))
            .copied()
            .unwrap_or(0))
    }
}

#[derive(Default)]
struct SourceState {
    pending: VecDeque<u32>,
    signals: usize,
    woken: bool,
    fail_reads: usize,
}

/// Condvar-backed event source: tests push key values and the listener
/// thread blocks exactly as it would on the driver's wait primitive.
#[derive(Default)]
pub struct MockEventSource {
    state: Mutex<SourceState>,
    cv: Condvar,
}

impl MockEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal one key event carrying `raw` flags.
    pub fn push(&self, raw: u32) {
        let mut st = self.state.lock();
        st.pending.push_back(raw);
        st.signals += 1;
        self.cv.notify_one();
    }

    /// Make the next `count` key-value reads fail.
    pub fn fail_reads(&self, count: usize) {
        self.state.lock().fail_reads = count;
    }
}

impl EventSource for MockEventSource {
    fn wait(&self) -> Result<(), ChannelError> {
        let mut st = self.state.lock();
        while st.signals == 0 && !st.woken {
            self.cv.wait(&mut st);
        }
        if st.signals > 0 {
            // Auto-reset: one wait consumes one signal.
            st.signals -= 1;
        }
        Ok(())
    }

    fn wake(&self) {
        let mut st = self.state.lock();
        st.woken = true;
        self.cv.notify_all();
    }

    fn read_key_value(&self) -> Result<u32, ChannelError> {
        let mut st = self.state.lock();
        let value = st.pending.pop_front().unwrap_or(0);
        if st.fail_reads > 0 {
            st.fail_reads -= 1;
            return Err(ChannelError::Io {
                ioctl: ioctl::ENERGY_KEY_VALUE,
                code: 31,
            });
        }
        Ok(value)
    }
}
