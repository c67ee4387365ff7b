//! Offer screen state and the transitions backend events drive.

use catalog_client::CatalogOutcome;
use shared::{
    domain::Plan,
    error::{PurchaseError, RESTORE_FAILED_FALLBACK},
    offer::TESTIMONIALS,
};
use tracing::{info, warn};

use crate::controller::events::{FlowSignal, UiEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferingsStatus {
    Loading,
    Ready,
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreStatus {
    InFlight,
    Restored,
    Failed(String),
}

/// Transient state of one presented offer screen.
#[derive(Debug, Clone)]
pub struct PurchaseFlowState {
    selected_plan: Plan,
    is_purchasing: bool,
    error: Option<PurchaseError>,
    close_enabled: bool,
    testimonial_index: usize,
    offerings: OfferingsStatus,
    restore_status: Option<RestoreStatus>,
}

impl Default for PurchaseFlowState {
    fn default() -> Self {
        Self::new()
    }
}

impl PurchaseFlowState {
    pub fn new() -> Self {
        Self {
            selected_plan: Plan::default(),
            is_purchasing: false,
            error: None,
            close_enabled: false,
            testimonial_index: 0,
            offerings: OfferingsStatus::Loading,
            restore_status: None,
        }
    }

    pub fn selected_plan(&self) -> Plan {
        self.selected_plan
    }

    pub fn is_purchasing(&self) -> bool {
        self.is_purchasing
    }

    /// Text for the error alert, if one is showing.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub fn close_enabled(&self) -> bool {
        self.close_enabled
    }

    pub fn testimonial_index(&self) -> usize {
        self.testimonial_index
    }

    pub fn offerings(&self) -> &OfferingsStatus {
        &self.offerings
    }

    pub fn restore_status(&self) -> Option<&RestoreStatus> {
        self.restore_status.as_ref()
    }

    pub fn select_plan(&mut self, plan: Plan) {
        self.selected_plan = plan;
    }

    /// Enters the purchasing state. Returns false if a purchase is already in flight.
    pub fn begin_purchase(&mut self) -> bool {
        if self.is_purchasing {
            return false;
        }
        self.is_purchasing = true;
        true
    }

    /// Leaves the purchasing state without a backend result, e.g. when the
    /// command never reached the worker.
    pub fn abort_purchase(&mut self, error: PurchaseError) {
        self.is_purchasing = false;
        self.error = Some(error);
    }

    pub fn fail(&mut self, error: PurchaseError) {
        self.error = Some(error);
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn begin_restore(&mut self) {
        self.restore_status = Some(RestoreStatus::InFlight);
    }

    pub fn restore_not_sent(&mut self, reason: String) {
        self.restore_status = Some(RestoreStatus::Failed(reason));
    }

    pub fn select_testimonial(&mut self, index: usize) -> bool {
        if index >= TESTIMONIALS.len() {
            return false;
        }
        self.testimonial_index = index;
        true
    }

    pub fn next_testimonial(&mut self) {
        self.testimonial_index = (self.testimonial_index + 1) % TESTIMONIALS.len();
    }

    pub fn apply(&mut self, event: UiEvent) -> Option<FlowSignal> {
        match event {
            UiEvent::OfferingsRefreshed(result) => {
                self.offerings = match result {
                    Ok(()) => OfferingsStatus::Ready,
                    Err(reason) => OfferingsStatus::Unavailable(reason),
                };
                None
            }
            UiEvent::PurchaseFinished(outcome) => {
                if !self.is_purchasing {
                    warn!("purchase result arrived with no purchase in flight; ignoring");
                    return None;
                }
                self.is_purchasing = false;
                match outcome {
                    CatalogOutcome::Succeeded => {
                        info!(plan = ?self.selected_plan, "purchase completed");
                        Some(FlowSignal::Completed)
                    }
                    CatalogOutcome::Failed { message } => {
                        let error = PurchaseError::from_collaborator(message);
                        info!(plan = ?self.selected_plan, "purchase failed: {error}");
                        self.error = Some(error);
                        None
                    }
                }
            }
            UiEvent::RestoreFinished(outcome) => {
                self.restore_status = Some(match outcome {
                    CatalogOutcome::Succeeded => RestoreStatus::Restored,
                    CatalogOutcome::Failed { message } => RestoreStatus::Failed(
                        message
                            .filter(|message| !message.trim().is_empty())
                            .unwrap_or_else(|| RESTORE_FAILED_FALLBACK.to_string()),
                    ),
                });
                None
            }
            UiEvent::CloseButtonEnabled => {
                self.close_enabled = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::PURCHASE_FAILED_FALLBACK;

    #[test]
    fn starts_idle_on_yearly_with_close_disabled() {
        let state = PurchaseFlowState::new();
        assert_eq!(state.selected_plan(), Plan::Yearly);
        assert!(!state.is_purchasing());
        assert!(!state.close_enabled());
        assert_eq!(state.error_message(), None);
        assert_eq!(state.offerings(), &OfferingsStatus::Loading);
    }

    #[test]
    fn second_begin_purchase_is_refused() {
        let mut state = PurchaseFlowState::new();
        assert!(state.begin_purchase());
        assert!(!state.begin_purchase());
        assert!(state.is_purchasing());
    }

    #[test]
    fn success_signals_completion_once() {
        let mut state = PurchaseFlowState::new();
        state.begin_purchase();
        assert_eq!(
            state.apply(UiEvent::PurchaseFinished(CatalogOutcome::Succeeded)),
            Some(FlowSignal::Completed)
        );
        assert!(!state.is_purchasing());
        assert_eq!(state.error_message(), None);

        assert_eq!(
            state.apply(UiEvent::PurchaseFinished(CatalogOutcome::Succeeded)),
            None
        );
    }

    #[test]
    fn failure_without_message_uses_fallback() {
        let mut state = PurchaseFlowState::new();
        state.begin_purchase();
        let signal = state.apply(UiEvent::PurchaseFinished(CatalogOutcome::Failed {
            message: None,
        }));
        assert_eq!(signal, None);
        assert!(!state.is_purchasing());
        assert_eq!(
            state.error_message().as_deref(),
            Some(PURCHASE_FAILED_FALLBACK)
        );
    }

    #[test]
    fn restore_outcome_never_touches_alert() {
        let mut state = PurchaseFlowState::new();
        state.begin_restore();
        state.apply(UiEvent::RestoreFinished(CatalogOutcome::failed(
            "No purchases to restore",
        )));
        assert_eq!(
            state.restore_status(),
            Some(&RestoreStatus::Failed("No purchases to restore".into()))
        );
        assert_eq!(state.error_message(), None);
    }

    #[test]
    fn close_enable_is_sticky() {
        let mut state = PurchaseFlowState::new();
        state.apply(UiEvent::CloseButtonEnabled);
        state.apply(UiEvent::OfferingsRefreshed(Err("offline".into())));
        state.dismiss_error();
        assert!(state.close_enabled());
    }

    #[test]
    fn carousel_wraps_and_rejects_out_of_range() {
        let mut state = PurchaseFlowState::new();
        assert!(!state.select_testimonial(TESTIMONIALS.len()));
        assert!(state.select_testimonial(TESTIMONIALS.len() - 1));
        state.next_testimonial();
        assert_eq!(state.testimonial_index(), 0);
    }
}
