//! Error types for ticket office operations.

use crate::types::{CustomerId, ItemId};
use thiserror::Error;

/// Result type alias for ticket office operations.
pub type Result<T> = std::result::Result<T, PolladaError>;

/// Every way a ticket office operation can fail.
///
/// Variants are grouped by who can fix them: the submitter (validation),
/// the business rules (stock, payment, redemption) and the infrastructure
/// (store, image encoder).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolladaError {
    // ═══════════════════════════════════════════════════════════
    // Input Errors
    // ═══════════════════════════════════════════════════════════

    /// A submitted field is malformed.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Business Rules
    // ═══════════════════════════════════════════════════════════

    /// The selected item has no remaining units.
    #[error("{item} is sold out")]
    OutOfStock {
        /// Item name
        item: String,
    },

    /// No ticket carries this code.
    #[error("Ticket {code} not found")]
    TicketNotFound {
        /// Normalized code that was looked up
        code: String,
    },

    /// The ticket exists but payment has not been confirmed.
    #[error("Ticket {code} has not been paid")]
    NotPaid {
        /// Ticket code
        code: String,
    },

    /// The ticket was already consumed.
    #[error("Ticket {code} has already been redeemed")]
    AlreadyRedeemed {
        /// Ticket code
        code: String,
    },

    /// Customer does not exist.
    #[error("Customer {0} not found")]
    CustomerNotFound(CustomerId),

    /// Inventory item does not exist.
    #[error("Item {0} not found")]
    ItemNotFound(ItemId),

    /// The store rejected a ticket code because another ticket already has it.
    #[error("Ticket code {code} is already taken")]
    DuplicateCode {
        /// The colliding code
        code: String,
    },

    /// No free ticket code was found within the retry budget.
    #[error("Could not allocate a unique ticket code after {attempts} attempts")]
    CodeAllocationExhausted {
        /// Number of codes tried
        attempts: u32,
    },

    /// Caller is not an authenticated staff member.
    #[error("Staff authentication required")]
    Unauthorized,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// The image encoder failed to render a redemption reference.
    #[error("Image encoding failed: {0}")]
    ImageEncoding(String),

    /// The durable store failed or is unreachable.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PolladaError {
    /// Build a validation error for `field`.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Returns `true` if the caller can recover by changing the request.
    ///
    /// # Examples
    ///
    /// ```
    /// use pollada_core::PolladaError;
    ///
    /// assert!(PolladaError::NotPaid { code: "A1B2C3D4".into() }.is_user_error());
    /// assert!(!PolladaError::Storage("connection reset".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(
            self,
            Self::DuplicateCode { .. }
                | Self::CodeAllocationExhausted { .. }
                | Self::ImageEncoding(_)
                | Self::Storage(_)
        )
    }

    /// Human-readable message for the counter or registration screen.
    ///
    /// Redemption outcomes each get their own wording so staff can tell an
    /// unpaid ticket from a consumed one or a mistyped code at a glance.
    /// Infrastructure failures collapse into one generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::OutOfStock { item } => {
                format!("{item} is sold out, please select another item.")
            },
            Self::TicketNotFound { .. } => "Invalid ticket code.".to_string(),
            Self::NotPaid { .. } => "This ticket has not been paid.".to_string(),
            Self::AlreadyRedeemed { .. } => "This ticket has already been redeemed.".to_string(),
            Self::CustomerNotFound(_) => "Customer not found.".to_string(),
            Self::ItemNotFound(_) => "Item not found.".to_string(),
            Self::Unauthorized => "Staff login required.".to_string(),
            Self::DuplicateCode { .. }
            | Self::CodeAllocationExhausted { .. }
            | Self::ImageEncoding(_)
            | Self::Storage(_) => "Something went wrong, please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redemption_messages_are_distinct() {
        let code = "A1B2C3D4".to_string();
        let not_found = PolladaError::TicketNotFound { code: code.clone() }.user_message();
        let not_paid = PolladaError::NotPaid { code: code.clone() }.user_message();
        let redeemed = PolladaError::AlreadyRedeemed { code }.user_message();

        assert_ne!(not_found, not_paid);
        assert_ne!(not_paid, redeemed);
        assert_ne!(not_found, redeemed);
    }

    #[test]
    fn storage_failures_are_not_user_errors() {
        assert!(!PolladaError::Storage("down".into()).is_user_error());
        assert!(!PolladaError::CodeAllocationExhausted { attempts: 5 }.is_user_error());
        assert!(PolladaError::validation("phone", "bad").is_user_error());
    }

    #[test]
    fn validation_display_names_field() {
        let err = PolladaError::validation("phone", "must have exactly 9 digits");
        assert_eq!(err.to_string(), "Invalid phone: must have exactly 9 digits");
    }
}
