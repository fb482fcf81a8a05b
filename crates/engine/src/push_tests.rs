// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex};

use super::*;
use cw_core::{PushDevice, PushEnvironment, PushPlatform};

struct RecordingSink {
    notifications: Mutex<Vec<PushNotification>>,
}

impl RecordingSink {
    fn new() -> Self {
        Self { notifications: Mutex::new(Vec::new()) }
    }
}

impl PushSink for RecordingSink {
    fn deliver(&self, _device: &PushDevice, notification: &PushNotification) {
        self.notifications.lock().expect("lock").push(notification.clone());
    }
}

fn device(token: &str) -> PushDevice {
    PushDevice::new(token, PushPlatform::Ios, "com.example.app", PushEnvironment::Sandbox, None)
}

async fn test_engine_with_sink(sink: Arc<RecordingSink>) -> Engine {
    let bridge = cw_rpc::RpcBridge::start(cw_rpc::process::SpawnSpec { command: "sh".into(), args: vec!["-c".into(), "cat >/dev/null".into()], cwd: None, env: vec![] }).expect("spawn");
    let engine = Engine::new(cw_store::Store::open_in_memory().expect("open store"), crate::upstream::UpstreamClient::new(bridge), vec![]);
    engine.with_push_sink(sink)
}

#[tokio::test]
async fn noop_sink_delivers_nothing() {
    let sink = NoopPushSink;
    sink.deliver(&device("tok-1"), &PushNotification { thread_id: cw_core::ThreadId::new(), job_id: cw_core::JobId::new(), reason: PushReason::JobFinished, title: "x".into(), body: "y".into() });
}

#[tokio::test]
async fn notify_push_is_a_noop_when_no_devices_are_registered() {
    let sink = Arc::new(RecordingSink::new());
    let engine = test_engine_with_sink(sink.clone()).await;

    engine.notify_push(cw_core::ThreadId::new(), cw_core::JobId::new(), PushReason::JobFinished, "Job finished", "done").await;

    assert!(sink.notifications.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn notify_push_fans_out_to_every_registered_device() {
    let sink = Arc::new(RecordingSink::new());
    let engine = test_engine_with_sink(sink.clone()).await;
    engine.store.upsert_push_device(device("tok-1")).await.expect("register 1");
    engine.store.upsert_push_device(device("tok-2")).await.expect("register 2");

    let thread_id = cw_core::ThreadId::new();
    let job_id = cw_core::JobId::new();
    engine.notify_push(thread_id.clone(), job_id.clone(), PushReason::ApprovalRequired, "Approval needed", "please decide").await;

    let notifications = sink.notifications.lock().expect("lock");
    assert_eq!(notifications.len(), 2);
    assert!(notifications.iter().all(|n| n.thread_id == thread_id && n.job_id == job_id && n.reason == PushReason::ApprovalRequired));
}
