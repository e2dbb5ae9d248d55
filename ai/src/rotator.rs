//! Credential pool for the vision API.
//!
//! Holds one [`GeminiClient`] per configured credential and rotates which one
//! services a call after a fixed quota of calls. The pool is built eagerly at
//! startup and injected into application state; it is never a module-level
//! global. Rotation is driven purely by call volume, not wall-clock time, and
//! there is no health checking or removal — a failing credential is simply
//! used again when its turn comes back around, and its errors surface to the
//! caller per document.

use crate::client::GeminiClient;
use crate::error::AiError;
use std::sync::Mutex;
use std::time::Duration;

/// Rotates a fixed pool of vision-model clients by call count.
///
/// Every acquisition increments a single monotonically increasing counter,
/// guarded by one `std::sync::Mutex` so that blocking and async callers
/// serialize on the same state. Two call-style-specific locks would let the
/// counter race and skew which keys absorb the traffic.
pub struct ModelRotator {
    clients: Vec<GeminiClient>,
    quota_per_key: u64,
    calls: Mutex<u64>,
}

impl ModelRotator {
    /// Builds the pool, one client per credential, in the given order.
    ///
    /// Fails fast with [`AiError::NoCredentials`] when `keys` is empty:
    /// startup should refuse to bring the subsystem up rather than defer the
    /// failure to the first extraction request.
    pub fn from_credentials(
        keys: Vec<String>,
        quota_per_key: u64,
        model: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        if keys.is_empty() {
            return Err(AiError::NoCredentials);
        }

        let mut clients = Vec::with_capacity(keys.len());
        for key in keys {
            clients.push(GeminiClient::new(key, model, base_url, timeout)?);
        }

        Ok(Self {
            clients,
            // Quota 0 would never advance past division; treat it as 1.
            quota_per_key: quota_per_key.max(1),
            calls: Mutex::new(0),
        })
    }

    /// Returns the client that services the next call.
    ///
    /// Call `n` (1-based) lands on pool slot `((n - 1) / quota) % size`, so
    /// calls 1..=quota use slot 0, the next quota-sized block uses slot 1,
    /// and the pool wraps around indefinitely.
    pub fn acquire_model(&self) -> &GeminiClient {
        let call_number = {
            let mut calls = self
                .calls
                .lock()
                .expect("Failed to acquire rotation counter lock");
            *calls += 1;
            *calls
        };

        &self.clients[self.instance_index(call_number)]
    }

    /// Pool slot a given 1-based call number maps to.
    pub fn instance_index(&self, call_number: u64) -> usize {
        (((call_number - 1) / self.quota_per_key) as usize) % self.clients.len()
    }

    /// Number of configured credentials.
    pub fn pool_size(&self) -> usize {
        self.clients.len()
    }

    /// Total calls acquired so far.
    pub fn calls_made(&self) -> u64 {
        *self
            .calls
            .lock()
            .expect("Failed to acquire rotation counter lock")
    }
}
