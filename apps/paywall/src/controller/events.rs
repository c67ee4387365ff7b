//! Backend events and host-facing signals for the offer screen.

use catalog_client::CatalogOutcome;

/// Results posted by the backend worker, applied on the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    OfferingsRefreshed(Result<(), String>),
    PurchaseFinished(CatalogOutcome),
    RestoreFinished(CatalogOutcome),
    CloseButtonEnabled,
}

/// Signals the host navigation layer acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSignal {
    /// Purchase succeeded; the screen should close.
    Completed,
    /// User closed the screen with the close button.
    Dismissed,
}

/// What a call to `purchase()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseAttempt {
    Issued,
    PlanUnavailable,
    AlreadyInFlight,
    BackendUnavailable,
}
