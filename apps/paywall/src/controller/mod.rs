//! Controller layer: backend events, reducer-like state transitions, and command orchestration.

pub mod events;
pub mod flow;
pub mod orchestration;
pub mod reducer;

pub use events::{FlowSignal, PurchaseAttempt};
pub use flow::PurchaseFlowController;
pub use reducer::{OfferingsStatus, RestoreStatus};
