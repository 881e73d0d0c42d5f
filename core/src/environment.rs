//! Injected collaborators.
//!
//! Everything the ticket office needs from the outside world that is not the
//! store: time, randomness for ticket codes, image encoding for redemption
//! references and staff identity. Production and test implementations are
//! swapped through these traits.

use crate::error::Result;
use crate::types::{TicketCode, TICKET_CODE_ALPHABET, TICKET_CODE_LENGTH};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```
/// use pollada_core::environment::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let before = chrono::Utc::now();
/// assert!(clock.now() >= before);
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> chrono::DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of candidate ticket codes.
///
/// Candidates need not be unique; the store enforces uniqueness and the
/// service asks for another candidate on collision.
pub trait CodeGenerator: Send + Sync {
    /// Produce one candidate code
    fn generate(&self) -> TicketCode;
}

/// Random upper-case alphanumeric codes of [`TICKET_CODE_LENGTH`] characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> TicketCode {
        let mut rng = rand::thread_rng();
        let code: String = (0..TICKET_CODE_LENGTH)
            .map(|_| char::from(TICKET_CODE_ALPHABET[rng.gen_range(0..TICKET_CODE_ALPHABET.len())]))
            .collect();
        TicketCode::parse(&code)
    }
}

/// Opaque image produced by an [`ImageEncoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// MIME type, e.g. `image/png`
    pub media_type: String,
    /// Encoded bytes
    pub bytes: Vec<u8>,
}

/// Turns a redemption reference (a URL) into a scannable image.
///
/// The ticket office only supplies the string and never inspects the result.
pub trait ImageEncoder: Send + Sync {
    /// Encode `payload` into an image.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PolladaError::ImageEncoding`] if the payload cannot be encoded.
    fn encode(&self, payload: &str) -> Result<EncodedImage>;
}

/// An authenticated staff member allowed to redeem tickets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StaffActor {
    /// Display name recorded in logs
    pub name: String,
}

impl StaffActor {
    /// Create a staff actor
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Resolves a presented credential into a staff identity.
pub trait StaffAuthenticator: Send + Sync {
    /// Return the staff member owning `token`, if any
    fn authenticate(&self, token: &str) -> Option<StaffActor>;
}
