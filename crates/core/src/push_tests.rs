// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn platform_and_environment_serialize_lowercase() {
    assert_eq!(serde_json::to_string(&PushPlatform::Ios).unwrap(), "\"ios\"");
    assert_eq!(serde_json::to_string(&PushPlatform::Android).unwrap(), "\"android\"");
    assert_eq!(serde_json::to_string(&PushEnvironment::Sandbox).unwrap(), "\"sandbox\"");
    assert_eq!(serde_json::to_string(&PushEnvironment::Production).unwrap(), "\"production\"");
}

#[test]
fn touch_refreshes_timestamps_and_fields() {
    let mut device = PushDevice::new("tok-1", PushPlatform::Ios, "com.example.app", PushEnvironment::Sandbox, None);
    let original_created = device.created_at;

    std::thread::sleep(std::time::Duration::from_millis(2));
    device.touch(PushPlatform::Ios, "com.example.app", PushEnvironment::Production, Some("iPhone".into()));

    assert_eq!(device.created_at, original_created);
    assert_eq!(device.environment, PushEnvironment::Production);
    assert_eq!(device.device_name.as_deref(), Some("iPhone"));
    assert!(device.updated_at >= original_created);
}
