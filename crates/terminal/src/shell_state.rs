// SPDX-License-Identifier: MIT

//! Output filter: extracts `__CW_STATE__:<busy|idle>:<jobs>` shell-state
//! markers and suppresses pre-bootstrap noise. Installed alongside the
//! shell-hook script that emits these markers via `preexec`/`precmd` (the
//! hook script itself is shipped as a static asset, not generated by this
//! crate).

use std::time::{Duration, Instant};

use cw_core::ShellStateFlags;

const STATE_MARKER_PREFIX: &str = "__CW_STATE__:";
const BOOTSTRAP_MARKER: &str = "__CW_BOOTSTRAP_DONE__";
const BOOTSTRAP_GRACE: Duration = Duration::from_secs(15);

/// Scans PTY output for state markers, yields the visible text with
/// markers stripped, and suppresses everything before bootstrap completes
/// (bounded by a 15s grace period so a shell with no hooks installed still
/// becomes visible).
pub struct ShellStateFilter {
    bootstrapped: bool,
    spawned_at: Instant,
    pub flags: ShellStateFlags,
    carry: Vec<u8>,
}

impl ShellStateFilter {
    pub fn new() -> Self {
        Self { bootstrapped: false, spawned_at: Instant::now(), flags: ShellStateFlags::idle(), carry: Vec::new() }
    }

    /// Process a raw PTY chunk, returning the visible bytes (after marker
    /// extraction and bootstrap suppression) and updating `self.flags`.
    pub fn process(&mut self, chunk: &[u8]) -> Vec<u8> {
        self.carry.extend_from_slice(chunk);

        if !self.bootstrapped {
            if self.spawned_at.elapsed() >= BOOTSTRAP_GRACE {
                self.bootstrapped = true;
            } else if let Some(pos) = find_subslice(&self.carry, BOOTSTRAP_MARKER.as_bytes()) {
                self.bootstrapped = true;
                self.carry.drain(..pos + BOOTSTRAP_MARKER.len());
            } else {
                // Still waiting for bootstrap: hold the whole chunk back,
                // but still scan it for state markers so flags stay fresh.
                self.extract_markers_in_place();
                return Vec::new();
            }
        }

        self.extract_markers_in_place();
        std::mem::take(&mut self.carry)
    }

    fn extract_markers_in_place(&mut self) {
        loop {
            let Some(start) = find_subslice(&self.carry, STATE_MARKER_PREFIX.as_bytes()) else { break };
            let body_start = start + STATE_MARKER_PREFIX.len();
            let Some(rel_end) = self.carry[body_start..].iter().position(|&b| b == b'\n' || b == b'\r') else {
                // Marker body not fully arrived yet; wait for more input.
                break;
            };
            let body_end = body_start + rel_end;
            let body = String::from_utf8_lossy(&self.carry[body_start..body_end]).into_owned();
            if let Some(flags) = ShellStateFlags::parse_marker_body(&body) {
                self.flags = flags;
            }
            self.carry.drain(start..body_end);
        }
    }
}

impl Default for ShellStateFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len().max(1)).position(|window| window == needle)
}

#[cfg(test)]
#[path = "shell_state_tests.rs"]
mod tests;
