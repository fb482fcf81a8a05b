// SPDX-License-Identifier: MIT

//! Push device registration: the record a mobile client leaves so the
//! Worker can notify it of job completion while it is not connected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of push platforms a device can register under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushPlatform {
    Ios,
    Android,
}

impl PushPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
        }
    }
}

/// Closed set of push environments, distinguishing sandbox APNs/FCM
/// endpoints from production ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushEnvironment {
    Sandbox,
    Production,
}

impl PushEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

/// A registered push-notification destination for a single client device.
///
/// Devices are keyed by `token` (upsert on re-registration); `last_seen_at`
/// is touched on every successful registration call, independent of
/// whether the token's other fields changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushDevice {
    pub token: String,
    pub platform: PushPlatform,
    pub bundle_id: String,
    pub environment: PushEnvironment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl PushDevice {
    pub fn new(
        token: impl Into<String>,
        platform: PushPlatform,
        bundle_id: impl Into<String>,
        environment: PushEnvironment,
        device_name: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            token: token.into(),
            platform,
            bundle_id: bundle_id.into(),
            environment,
            device_name,
            created_at: now,
            updated_at: now,
            last_seen_at: now,
        }
    }

    /// Re-registration: refresh mutable fields and touch both timestamps.
    pub fn touch(&mut self, platform: PushPlatform, bundle_id: impl Into<String>, environment: PushEnvironment, device_name: Option<String>) {
        self.platform = platform;
        self.bundle_id = bundle_id.into();
        self.environment = environment;
        self.device_name = device_name;
        let now = Utc::now();
        self.updated_at = now;
        self.last_seen_at = now;
    }
}

#[cfg(test)]
#[path = "push_tests.rs"]
mod tests;
