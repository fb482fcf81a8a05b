// SPDX-License-Identifier: MIT

//! Push device registration persistence.

use cw_core::{PushDevice, PushEnvironment, PushPlatform};
use rusqlite::{params, Row};

use crate::connection::Store;
use crate::error::StoreError;

fn platform_to_str(platform: PushPlatform) -> &'static str {
    platform.as_str()
}

fn platform_from_str(raw: &str) -> rusqlite::Result<PushPlatform> {
    match raw {
        "ios" => Ok(PushPlatform::Ios),
        "android" => Ok(PushPlatform::Android),
        other => Err(rusqlite::Error::InvalidColumnType(0, format!("unknown push platform {other}"), rusqlite::types::Type::Text)),
    }
}

fn environment_to_str(environment: PushEnvironment) -> &'static str {
    environment.as_str()
}

fn environment_from_str(raw: &str) -> rusqlite::Result<PushEnvironment> {
    match raw {
        "sandbox" => Ok(PushEnvironment::Sandbox),
        "production" => Ok(PushEnvironment::Production),
        other => Err(rusqlite::Error::InvalidColumnType(0, format!("unknown push environment {other}"), rusqlite::types::Type::Text)),
    }
}

fn row_to_device(row: &Row<'_>) -> rusqlite::Result<PushDevice> {
    Ok(PushDevice {
        token: row.get("token")?,
        platform: platform_from_str(&row.get::<_, String>("platform")?)?,
        bundle_id: row.get("bundle_id")?,
        environment: environment_from_str(&row.get::<_, String>("environment")?)?,
        device_name: row.get("device_name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        last_seen_at: row.get("last_seen_at")?,
    })
}

impl Store {
    /// Upsert keyed by `token`: a re-registration refreshes the row in
    /// place and touches `updated_at`/`last_seen_at`.
    pub async fn upsert_push_device(&self, device: PushDevice) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO push_devices (token, platform, bundle_id, environment, device_name, created_at, updated_at, last_seen_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (token) DO UPDATE SET
                    platform = excluded.platform,
                    bundle_id = excluded.bundle_id,
                    environment = excluded.environment,
                    device_name = excluded.device_name,
                    updated_at = excluded.updated_at,
                    last_seen_at = excluded.last_seen_at",
                params![
                    device.token,
                    platform_to_str(device.platform),
                    device.bundle_id,
                    environment_to_str(device.environment),
                    device.device_name,
                    device.created_at,
                    device.updated_at,
                    device.last_seen_at,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn list_push_devices(&self) -> Result<Vec<PushDevice>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM push_devices ORDER BY last_seen_at DESC")?;
            let rows = stmt.query_map([], row_to_device)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StoreError::from)
        })
        .await
    }

    pub async fn remove_push_device(&self, token: String) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM push_devices WHERE token = ?1", params![token])?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
#[path = "push_tests.rs"]
mod tests;
