//! # Pollada Testing
//!
//! Test doubles and fixtures for the pollada ticket office.
//!
//! This crate provides:
//! - [`InMemoryTicketStore`]: a [`TicketStore`](pollada_core::TicketStore) with
//!   real per-ticket locking, for service and HTTP tests without a database
//! - Mock implementations of the environment traits
//! - Fixture builders for registrations and items
//!
//! ## Example
//!
//! ```ignore
//! use pollada_testing::{fixtures, InMemoryTicketStore};
//!
//! #[tokio::test]
//! async fn test_issue() {
//!     let store = InMemoryTicketStore::new();
//!     let item = store.create_item(&fixtures::item("Pierna", 1, 2000)).await.unwrap();
//!     // ...
//! }
//! ```

pub mod store;

pub use store::InMemoryTicketStore;

use chrono::{DateTime, Utc};
use pollada_core::environment::Clock;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use pollada_core::environment::{CodeGenerator, EncodedImage, ImageEncoder};
    use pollada_core::types::TicketCode;
    use pollada_core::{PolladaError, Result};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use pollada_testing::mocks::FixedClock;
    /// use pollada_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-09-13 18:00:00 UTC, pollada day)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which never happens.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-09-13T18:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Predictable ticket codes.
    ///
    /// Hands out the scripted codes first, then `T0000001`, `T0000002`, ...
    /// Scripting the same code twice is how tests force a collision.
    #[derive(Debug, Default)]
    pub struct SequenceCodeGenerator {
        scripted: Mutex<VecDeque<TicketCode>>,
        counter: AtomicU64,
    }

    impl SequenceCodeGenerator {
        /// Counter-only generator
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Generator that yields `codes` before falling back to the counter
        #[must_use]
        pub fn with_codes<I, S>(codes: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: AsRef<str>,
        {
            Self {
                scripted: Mutex::new(codes.into_iter().map(|c| TicketCode::parse(c.as_ref())).collect()),
                counter: AtomicU64::new(0),
            }
        }
    }

    impl CodeGenerator for SequenceCodeGenerator {
        fn generate(&self) -> TicketCode {
            let scripted = self
                .scripted
                .lock()
                .ok()
                .and_then(|mut queue| queue.pop_front());
            scripted.unwrap_or_else(|| {
                let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
                TicketCode::parse(&format!("T{n:07}"))
            })
        }
    }

    /// Image encoder that records every payload and echoes it as the image bytes.
    #[derive(Debug, Default)]
    pub struct RecordingImageEncoder {
        payloads: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingImageEncoder {
        /// Encoder that always succeeds
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Encoder that always fails
        #[must_use]
        pub fn failing() -> Self {
            Self {
                payloads: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        /// Payloads received so far
        #[must_use]
        pub fn payloads(&self) -> Vec<String> {
            self.payloads.lock().map(|p| p.clone()).unwrap_or_default()
        }
    }

    impl ImageEncoder for RecordingImageEncoder {
        fn encode(&self, payload: &str) -> Result<EncodedImage> {
            if let Ok(mut payloads) = self.payloads.lock() {
                payloads.push(payload.to_string());
            }
            if self.fail {
                return Err(PolladaError::ImageEncoding("encoder offline".to_string()));
            }
            Ok(EncodedImage {
                media_type: "image/png".to_string(),
                bytes: payload.as_bytes().to_vec(),
            })
        }
    }
}

/// Fixture builders.
pub mod fixtures {
    use pollada_core::types::{CustomerRegistration, DeliveryMode, Money, NewItem};

    /// A valid pickup registration.
    ///
    /// # Panics
    ///
    /// Panics if `name` or `phone` are invalid; fixtures are for valid input.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn registration(name: &str, phone: &str) -> CustomerRegistration {
        CustomerRegistration::new(name, phone, DeliveryMode::Pickup, None, None)
            .expect("fixture registration should be valid")
    }

    /// A valid delivery registration with an address.
    ///
    /// # Panics
    ///
    /// Panics if `name` or `phone` are invalid.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn delivery_registration(name: &str, phone: &str, address: &str) -> CustomerRegistration {
        CustomerRegistration::new(name, phone, DeliveryMode::Delivery, Some(address), None)
            .expect("fixture registration should be valid")
    }

    /// A valid item submission.
    ///
    /// # Panics
    ///
    /// Panics if `name` is blank.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn item(name: &str, remaining: u32, price_cents: u64) -> NewItem {
        NewItem::new(name, remaining, Some(Money::from_cents(price_cents)))
            .expect("fixture item should be valid")
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock, RecordingImageEncoder, SequenceCodeGenerator};
