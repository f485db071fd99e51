//! Shared test helpers for `userdeck-core` integration tests.
//!
//! These helpers provide a scriptable fetcher and a recording event bus so
//! the store and coordinator tests can focus on behaviour instead of
//! boilerplate.

#![allow(dead_code)]

pub mod bus;
pub mod fetcher;

use std::time::Duration;

use userdeck_domain::{ProfileEntity, ProfileKey};

/// Profile the default fetcher returns for `key`.
pub fn profile_for(key: &ProfileKey) -> ProfileEntity {
    ProfileEntity {
        id: key.user_id,
        full_name: format!("User {}", key.user_id),
        email: Some(format!("user{}@example.com", key.user_id)),
        ..ProfileEntity::default()
    }
}

/// Poll until `condition` holds; fails the test after two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}
