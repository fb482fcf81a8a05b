// SPDX-License-Identifier: MIT

use super::*;
use crate::connection::Store;

fn sample_device() -> PushDevice {
    PushDevice::new("tok-1", PushPlatform::Ios, "com.example.app", PushEnvironment::Sandbox, Some("iPhone".into()))
}

#[tokio::test]
async fn upsert_then_list_round_trips_a_device() {
    let store = Store::open_in_memory().expect("open");
    store.upsert_push_device(sample_device()).await.expect("upsert");

    let devices = store.list_push_devices().await.expect("list");
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].token, "tok-1");
    assert_eq!(devices[0].platform, PushPlatform::Ios);
}

#[tokio::test]
async fn re_registering_the_same_token_updates_in_place() {
    let store = Store::open_in_memory().expect("open");
    store.upsert_push_device(sample_device()).await.expect("upsert");

    let mut updated = sample_device();
    updated.environment = PushEnvironment::Production;
    store.upsert_push_device(updated).await.expect("upsert again");

    let devices = store.list_push_devices().await.expect("list");
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].environment, PushEnvironment::Production);
}

#[tokio::test]
async fn remove_push_device_deletes_the_row() {
    let store = Store::open_in_memory().expect("open");
    store.upsert_push_device(sample_device()).await.expect("upsert");
    store.remove_push_device("tok-1".into()).await.expect("remove");

    let devices = store.list_push_devices().await.expect("list");
    assert!(devices.is_empty());
}
