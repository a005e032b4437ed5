//! Session-scoped flow state.
//!
//! Pending offer/presentation configuration is owned by the enclosing flow
//! and passed through the call chain explicitly; nothing here is
//! process-global. `take_*` accessors consume the value so a pending
//! configuration cannot leak into a later, unrelated flow.

/// A credential offer waiting for the user to act on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOffer {
    /// The OpenID4VCI offer URI.
    pub offer_uri: String,
    /// Transaction code, when the offer requires one.
    pub tx_code: Option<String>,
}

/// State for one UI session: at most one pending issuance offer and one
/// pending presentation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    pending_offer: Option<PendingOffer>,
    pending_presentation: Option<String>,
}

impl WalletSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a pending credential offer, replacing any previous one.
    pub fn set_pending_offer(&mut self, offer_uri: String, tx_code: Option<String>) {
        self.pending_offer = Some(PendingOffer { offer_uri, tx_code });
    }

    /// Takes the pending offer, leaving none behind.
    pub fn take_pending_offer(&mut self) -> Option<PendingOffer> {
        self.pending_offer.take()
    }

    /// Stores a pending presentation request URI, replacing any previous
    /// one.
    pub fn set_pending_presentation(&mut self, request_uri: String) {
        self.pending_presentation = Some(request_uri);
    }

    /// Takes the pending presentation request, leaving none behind.
    pub fn take_pending_presentation(&mut self) -> Option<String> {
        self.pending_presentation.take()
    }

    /// Drops everything pending, e.g. when the user aborts the flow.
    pub fn clear(&mut self) {
        self.pending_offer = None;
        self.pending_presentation = None;
    }
}
