// SPDX-License-Identifier: MIT

//! Scrollback ring: the evicting frame log behind `attachClient`'s replay
//! and the live output stream.

use std::collections::VecDeque;

use cw_core::TerminalFrame;

use crate::error::{Result, TerminalError};

pub const DEFAULT_MAX_SCROLLBACK_BYTES: usize = 2 * 1024 * 1024;

struct Entry {
    frame: TerminalFrame,
    byte_len: usize,
}

/// An append-only, byte-budgeted log of `TerminalFrame`s. Frames are
/// evicted from the front once the total retained byte size exceeds
/// `max_bytes`; the exit frame, once appended, is exempt from eviction
/// (it is the last frame a session will ever produce).
pub struct Scrollback {
    entries: VecDeque<Entry>,
    next_seq: u64,
    max_bytes: usize,
    retained_bytes: usize,
    exited: bool,
}

impl Scrollback {
    pub fn new(max_bytes: usize) -> Self {
        Self { entries: VecDeque::new(), next_seq: 0, max_bytes, retained_bytes: 0, exited: false }
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Lowest `seq` still retained, or `next_seq` if the log is empty.
    pub fn is_exited(&self) -> bool {
        self.exited
    }

    pub fn first_seq(&self) -> u64 {
        self.entries.front().map(|e| e.frame_seq()).unwrap_or(self.next_seq)
    }

    pub fn push_output(&mut self, data: Vec<u8>) -> TerminalFrame {
        let seq = self.next_seq;
        self.next_seq += 1;
        let frame = TerminalFrame::Output { offset: seq, data };
        self.push(frame.clone());
        frame
    }

    pub fn push_exit(&mut self, exit_code: Option<i32>) -> TerminalFrame {
        let seq = self.next_seq;
        self.next_seq += 1;
        let frame = TerminalFrame::Exit { offset: seq, exit_code };
        self.push(frame.clone());
        self.exited = true;
        frame
    }

    fn push(&mut self, frame: TerminalFrame) {
        let byte_len = match &frame {
            TerminalFrame::Output { data, .. } => data.len(),
            TerminalFrame::Exit { .. } => 0,
        };
        self.retained_bytes += byte_len;
        self.entries.push_back(Entry { frame, byte_len });
        self.evict_to_budget();
    }

    fn evict_to_budget(&mut self) {
        while self.retained_bytes > self.max_bytes && self.entries.len() > 1 {
            // Never evict the exit frame: it is the last word on this
            // session and callers must always be able to observe it.
            if matches!(self.entries.front().map(|e| &e.frame), Some(TerminalFrame::Exit { .. })) {
                break;
            }
            if let Some(evicted) = self.entries.pop_front() {
                self.retained_bytes -= evicted.byte_len;
            }
        }
    }

    /// Replay frames with `seq > from_seq`: `from_seq` must be `>= -1`; if
    /// the oldest retained frame's seq is already past `from_seq + 1` the
    /// requested tail has fallen out of the window and the cursor has
    /// expired.
    pub fn replay(&self, from_seq: i64) -> Result<Vec<TerminalFrame>> {
        if from_seq < -1 {
            return Err(TerminalError::CursorExpired);
        }
        if let Some(oldest) = self.entries.front() {
            if oldest.frame_seq() as i64 > from_seq + 1 {
                return Err(TerminalError::CursorExpired);
            }
        } else if from_seq + 1 < self.next_seq as i64 {
            return Err(TerminalError::CursorExpired);
        }

        Ok(self.entries.iter().filter(|e| e.frame_seq() as i64 > from_seq).map(|e| e.frame.clone()).collect())
    }
}

impl Entry {
    fn frame_seq(&self) -> u64 {
        match &self.frame {
            TerminalFrame::Output { offset, .. } | TerminalFrame::Exit { offset, .. } => *offset,
        }
    }
}

#[cfg(test)]
#[path = "scrollback_tests.rs"]
mod tests;
