// SPDX-License-Identifier: MIT

//! Push delivery. Actual APNs/FCM delivery is not implemented;
//! `LoggingPushSink` is the Worker's concrete `cw_engine::PushSink`: it
//! records what would have been sent, which is enough to exercise
//! `notify_push`'s fan-out and for an operator to see push activity in
//! the logs.

use cw_core::PushDevice;
use cw_engine::{PushNotification, PushSink};
use tracing::info;

pub struct LoggingPushSink;

impl PushSink for LoggingPushSink {
    fn deliver(&self, device: &PushDevice, notification: &PushNotification) {
        info!(
            token = %device.token,
            platform = device.platform.as_str(),
            environment = device.environment.as_str(),
            thread_id = %notification.thread_id,
            job_id = %notification.job_id,
            reason = ?notification.reason,
            title = %notification.title,
            "push notification (delivery not implemented, logged only)"
        );
    }
}
