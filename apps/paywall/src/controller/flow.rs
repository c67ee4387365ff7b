//! The purchase flow controller behind the premium offer screen.
//!
//! All methods run on the UI thread. Catalog calls are handed to the backend
//! worker and their results only touch the state inside `process_ui_events`
//! or `wait_for_ui_events`.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use catalog_client::SubscriptionCatalog;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use shared::{
    domain::Plan,
    error::{PurchaseError, PURCHASE_FAILED_FALLBACK},
};
use tracing::{debug, warn};

use crate::backend_bridge::{commands::BackendCommand, runtime};
use crate::controller::{
    events::{FlowSignal, PurchaseAttempt, UiEvent},
    orchestration::{dispatch_backend_command, DispatchError},
    reducer::{OfferingsStatus, PurchaseFlowState, RestoreStatus},
};

pub const DEFAULT_CLOSE_BUTTON_DELAY: Duration = Duration::from_millis(700);
const COMMAND_QUEUE_CAPACITY: usize = 32;
const UI_EVENT_CAPACITY: usize = 64;

pub struct PurchaseFlowController {
    catalog: Arc<dyn SubscriptionCatalog>,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    state: PurchaseFlowState,
    close_delay: Duration,
    close_timer_armed: bool,
    backend_connected: bool,
}

impl PurchaseFlowController {
    /// Creates a controller with its own backend worker thread.
    pub fn launch(
        catalog: Arc<dyn SubscriptionCatalog>,
        close_delay: Duration,
    ) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(COMMAND_QUEUE_CAPACITY);
        let (ui_tx, ui_rx) = bounded::<UiEvent>(UI_EVENT_CAPACITY);
        runtime::launch(Arc::clone(&catalog), cmd_rx, ui_tx)
            .context("failed to spawn paywall backend worker")?;
        Ok(Self::new(catalog, cmd_tx, ui_rx, close_delay))
    }

    pub fn new(
        catalog: Arc<dyn SubscriptionCatalog>,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        close_delay: Duration,
    ) -> Self {
        Self {
            catalog,
            cmd_tx,
            ui_rx,
            state: PurchaseFlowState::new(),
            close_delay,
            close_timer_armed: false,
            backend_connected: true,
        }
    }

    pub fn state(&self) -> &PurchaseFlowState {
        &self.state
    }

    pub fn price(&self, plan: Plan) -> String {
        self.catalog.localized_price(plan.subscription_type())
    }

    /// False once the backend worker has gone away; nothing queued will resolve.
    pub fn backend_connected(&self) -> bool {
        self.backend_connected
    }

    /// Whether the Continue control should accept input.
    pub fn continue_enabled(&self) -> bool {
        !self.state.is_purchasing()
    }

    pub fn select(&mut self, plan: Plan) {
        self.state.select_plan(plan);
    }

    pub fn purchase(&mut self) -> PurchaseAttempt {
        if self.state.is_purchasing() {
            warn!("purchase requested while another is in flight; ignoring");
            return PurchaseAttempt::AlreadyInFlight;
        }

        let plan = self.state.selected_plan();
        let Some(package) = self.catalog.package(plan.subscription_type()) else {
            warn!(?plan, "no purchasable package for selected plan");
            self.state.fail(PurchaseError::PlanUnavailable);
            return PurchaseAttempt::PlanUnavailable;
        };

        self.state.begin_purchase();
        match dispatch_backend_command(&self.cmd_tx, BackendCommand::Purchase { package }) {
            Ok(()) => PurchaseAttempt::Issued,
            Err(err) => {
                warn!("purchase not sent: {err}");
                self.state.abort_purchase(PurchaseError::PurchaseFailed(
                    PURCHASE_FAILED_FALLBACK.to_string(),
                ));
                PurchaseAttempt::BackendUnavailable
            }
        }
    }

    pub fn restore(&mut self) {
        self.state.begin_restore();
        if let Err(err) = dispatch_backend_command(&self.cmd_tx, BackendCommand::Restore) {
            self.state.restore_not_sent(err.to_string());
        }
    }

    /// Called when the screen is presented. Arms the close button timer once
    /// and refreshes the catalog offerings.
    pub fn on_appear(&mut self) {
        if !self.close_timer_armed && !self.state.close_enabled() {
            let armed = dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::ArmCloseButton {
                    delay: self.close_delay,
                },
            );
            self.close_timer_armed = armed.is_ok();
        }
        if let Err(err) = dispatch_backend_command(&self.cmd_tx, BackendCommand::RefreshOfferings)
        {
            self.state
                .apply(UiEvent::OfferingsRefreshed(Err(err.to_string())));
        }
    }

    pub fn dismiss_error(&mut self) {
        self.state.dismiss_error();
    }

    /// The close button. Ignored until the close delay has elapsed.
    pub fn request_close(&mut self) -> Option<FlowSignal> {
        if self.state.close_enabled() {
            Some(FlowSignal::Dismissed)
        } else {
            debug!("close requested before the close button was enabled");
            None
        }
    }

    pub fn select_testimonial(&mut self, index: usize) -> bool {
        self.state.select_testimonial(index)
    }

    pub fn next_testimonial(&mut self) {
        self.state.next_testimonial();
    }

    /// Applies every backend event already queued, without blocking.
    pub fn process_ui_events(&mut self) -> Vec<FlowSignal> {
        let mut signals = Vec::new();
        loop {
            match self.ui_rx.try_recv() {
                Ok(event) => signals.extend(self.state.apply(event)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.backend_lost();
                    break;
                }
            }
        }
        signals
    }

    /// Blocks up to `timeout` for the next backend event, then drains the rest.
    pub fn wait_for_ui_events(&mut self, timeout: Duration) -> Vec<FlowSignal> {
        let mut signals = Vec::new();
        match self.ui_rx.recv_timeout(timeout) {
            Ok(event) => signals.extend(self.state.apply(event)),
            Err(RecvTimeoutError::Timeout) => return signals,
            Err(RecvTimeoutError::Disconnected) => {
                self.backend_lost();
                return signals;
            }
        }
        signals.extend(self.process_ui_events());
        signals
    }

    /// Settles anything still waiting on the worker once its event channel closes.
    fn backend_lost(&mut self) {
        if !self.backend_connected {
            return;
        }
        self.backend_connected = false;
        warn!("backend worker closed its event channel");
        if self.state.is_purchasing() {
            self.state.abort_purchase(PurchaseError::PurchaseFailed(
                PURCHASE_FAILED_FALLBACK.to_string(),
            ));
        }
        if self.state.restore_status() == Some(&RestoreStatus::InFlight) {
            self.state
                .restore_not_sent(DispatchError::Disconnected.to_string());
        }
        if *self.state.offerings() == OfferingsStatus::Loading {
            self.state.apply(UiEvent::OfferingsRefreshed(Err(
                DispatchError::Disconnected.to_string()
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
        time::Instant,
    };

    use async_trait::async_trait;
    use catalog_client::{CatalogError, CatalogOutcome, StaticCatalog};
    use shared::{
        domain::{PackageHandle, SubscriptionType},
        error::{PLAN_UNAVAILABLE_MESSAGE, RESTORE_FAILED_FALLBACK},
    };
    use tokio::sync::oneshot;

    /// Catalog whose purchase call stays pending until the test releases it.
    struct GatedCatalog {
        packages: Vec<SubscriptionType>,
        purchase_calls: AtomicUsize,
        release: Mutex<Option<oneshot::Receiver<CatalogOutcome>>>,
    }

    impl GatedCatalog {
        fn new(packages: Vec<SubscriptionType>) -> (Arc<Self>, oneshot::Sender<CatalogOutcome>) {
            let (tx, rx) = oneshot::channel();
            let catalog = Arc::new(Self {
                packages,
                purchase_calls: AtomicUsize::new(0),
                release: Mutex::new(Some(rx)),
            });
            (catalog, tx)
        }

        fn purchase_calls(&self) -> usize {
            self.purchase_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SubscriptionCatalog for GatedCatalog {
        fn localized_price(&self, subscription_type: SubscriptionType) -> String {
            format!("price-{}", subscription_type.as_str())
        }

        fn package(&self, subscription_type: SubscriptionType) -> Option<PackageHandle> {
            self.packages.contains(&subscription_type).then(|| {
                PackageHandle::new(
                    format!("${}", subscription_type.as_str()),
                    format!("premium_{}", subscription_type.as_str()),
                    subscription_type,
                )
            })
        }

        async fn refresh_offerings(&self) -> Result<(), CatalogError> {
            Ok(())
        }

        async fn purchase_package(&self, _package: &PackageHandle) -> CatalogOutcome {
            self.purchase_calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.release.lock().expect("gate lock").take();
            match gate {
                Some(gate) => gate.await.unwrap_or(CatalogOutcome::Failed { message: None }),
                None => CatalogOutcome::Succeeded,
            }
        }

        async fn restore_purchases(&self) -> CatalogOutcome {
            CatalogOutcome::Succeeded
        }
    }

    fn detached_controller(
        catalog: Arc<dyn SubscriptionCatalog>,
    ) -> (
        PurchaseFlowController,
        Receiver<BackendCommand>,
        Sender<UiEvent>,
    ) {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        let controller =
            PurchaseFlowController::new(catalog, cmd_tx, ui_rx, DEFAULT_CLOSE_BUTTON_DELAY);
        (controller, cmd_rx, ui_tx)
    }

    fn wait_until(
        controller: &mut PurchaseFlowController,
        deadline: Duration,
        done: impl Fn(&PurchaseFlowController) -> bool,
    ) -> Vec<FlowSignal> {
        let started = Instant::now();
        let mut signals = Vec::new();
        while !done(controller) && started.elapsed() < deadline {
            signals.extend(controller.wait_for_ui_events(Duration::from_millis(20)));
        }
        signals
    }

    #[test]
    fn select_sets_each_plan() {
        let (mut controller, _cmd_rx, _ui_tx) = detached_controller(Arc::new(StaticCatalog::new()));
        for plan in [Plan::Monthly, Plan::Yearly, Plan::Yearly] {
            controller.select(plan);
            assert_eq!(controller.state().selected_plan(), plan);
        }
    }

    #[test]
    fn missing_package_sets_error_without_contacting_backend() {
        let catalog = StaticCatalog::new().with_package(SubscriptionType::Yearly, "$22.99");
        let (mut controller, cmd_rx, _ui_tx) = detached_controller(Arc::new(catalog));
        controller.select(Plan::Monthly);

        assert_eq!(controller.purchase(), PurchaseAttempt::PlanUnavailable);
        assert!(!controller.state().is_purchasing());
        assert_eq!(
            controller.state().error_message().as_deref(),
            Some(PLAN_UNAVAILABLE_MESSAGE)
        );
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn purchasing_flag_spans_exactly_the_backend_call() {
        let catalog = StaticCatalog::with_demo_offerings("$4.99", "$22.99");
        let (mut controller, cmd_rx, ui_tx) = detached_controller(Arc::new(catalog));

        assert_eq!(controller.purchase(), PurchaseAttempt::Issued);
        assert!(controller.state().is_purchasing());
        assert!(!controller.continue_enabled());
        match cmd_rx.try_recv() {
            Ok(BackendCommand::Purchase { package }) => {
                assert_eq!(package.subscription_type, SubscriptionType::Yearly)
            }
            other => panic!("expected purchase command, got {other:?}"),
        }

        assert!(controller.process_ui_events().is_empty());
        assert!(controller.state().is_purchasing());
        assert_eq!(controller.purchase(), PurchaseAttempt::AlreadyInFlight);
        assert!(cmd_rx.try_recv().is_err());

        ui_tx
            .send(UiEvent::PurchaseFinished(CatalogOutcome::failed("Card declined")))
            .expect("event");
        assert!(controller.process_ui_events().is_empty());
        assert!(!controller.state().is_purchasing());
        assert_eq!(
            controller.state().error_message().as_deref(),
            Some("Card declined")
        );

        controller.dismiss_error();
        assert_eq!(controller.state().error_message(), None);
        assert_eq!(controller.purchase(), PurchaseAttempt::Issued);
    }

    #[test]
    fn dead_backend_does_not_leave_purchase_stuck() {
        let catalog = StaticCatalog::with_demo_offerings("$4.99", "$22.99");
        let (mut controller, cmd_rx, _ui_tx) = detached_controller(Arc::new(catalog));
        drop(cmd_rx);

        assert_eq!(controller.purchase(), PurchaseAttempt::BackendUnavailable);
        assert!(!controller.state().is_purchasing());
        assert_eq!(
            controller.state().error_message().as_deref(),
            Some(PURCHASE_FAILED_FALLBACK)
        );
    }

    #[test]
    fn lost_backend_settles_in_flight_purchase() {
        let catalog = StaticCatalog::with_demo_offerings("$4.99", "$22.99");
        let (mut controller, cmd_rx, ui_tx) = detached_controller(Arc::new(catalog));

        assert_eq!(controller.purchase(), PurchaseAttempt::Issued);
        drop(ui_tx);
        drop(cmd_rx);

        assert!(controller.process_ui_events().is_empty());
        assert!(!controller.backend_connected());
        assert!(!controller.state().is_purchasing());
        assert_eq!(
            controller.state().error_message().as_deref(),
            Some(PURCHASE_FAILED_FALLBACK)
        );
        assert!(matches!(
            controller.state().offerings(),
            OfferingsStatus::Unavailable(_)
        ));
    }

    #[test]
    fn on_appear_arms_close_timer_only_once() {
        let (mut controller, cmd_rx, _ui_tx) = detached_controller(Arc::new(StaticCatalog::new()));
        controller.on_appear();
        controller.on_appear();

        let commands: Vec<_> = cmd_rx.try_iter().collect();
        let armed = commands
            .iter()
            .filter(|cmd| matches!(cmd, BackendCommand::ArmCloseButton { .. }))
            .count();
        assert_eq!(armed, 1);
        assert!(commands.contains(&BackendCommand::ArmCloseButton {
            delay: DEFAULT_CLOSE_BUTTON_DELAY
        }));
    }

    #[test]
    fn close_request_ignored_until_enabled() {
        let (mut controller, _cmd_rx, ui_tx) = detached_controller(Arc::new(StaticCatalog::new()));
        assert_eq!(controller.request_close(), None);

        ui_tx.send(UiEvent::CloseButtonEnabled).expect("event");
        controller.process_ui_events();
        assert_eq!(controller.request_close(), Some(FlowSignal::Dismissed));
    }

    #[test]
    fn yearly_purchase_success_signals_completion_once() {
        let (catalog, release) = GatedCatalog::new(vec![SubscriptionType::Yearly]);
        let mut controller =
            PurchaseFlowController::launch(catalog.clone(), DEFAULT_CLOSE_BUTTON_DELAY)
                .expect("launch");

        assert_eq!(controller.purchase(), PurchaseAttempt::Issued);
        std::thread::sleep(Duration::from_millis(50));
        assert!(controller.process_ui_events().is_empty());
        assert!(controller.state().is_purchasing());

        release.send(CatalogOutcome::Succeeded).expect("release");
        let signals = wait_until(&mut controller, Duration::from_secs(5), |c| {
            !c.state().is_purchasing()
        });

        assert_eq!(signals, vec![FlowSignal::Completed]);
        assert!(!controller.state().is_purchasing());
        assert_eq!(controller.state().error_message(), None);
        assert_eq!(catalog.purchase_calls(), 1);
        assert!(controller
            .wait_for_ui_events(Duration::from_millis(50))
            .is_empty());
    }

    #[test]
    fn declined_purchase_surfaces_collaborator_message() {
        let (catalog, release) = GatedCatalog::new(vec![SubscriptionType::Yearly]);
        let mut controller =
            PurchaseFlowController::launch(catalog, DEFAULT_CLOSE_BUTTON_DELAY).expect("launch");

        assert_eq!(controller.purchase(), PurchaseAttempt::Issued);
        release
            .send(CatalogOutcome::failed("Card declined"))
            .expect("release");
        let signals = wait_until(&mut controller, Duration::from_secs(5), |c| {
            !c.state().is_purchasing()
        });

        assert!(signals.is_empty());
        assert_eq!(
            controller.state().error_message().as_deref(),
            Some("Card declined")
        );
    }

    #[test]
    fn monthly_without_package_never_reaches_catalog() {
        let (catalog, _release) = GatedCatalog::new(vec![SubscriptionType::Yearly]);
        let mut controller =
            PurchaseFlowController::launch(catalog.clone(), DEFAULT_CLOSE_BUTTON_DELAY)
                .expect("launch");
        controller.select(Plan::Monthly);

        assert_eq!(controller.purchase(), PurchaseAttempt::PlanUnavailable);
        controller.wait_for_ui_events(Duration::from_millis(50));
        assert_eq!(catalog.purchase_calls(), 0);
        assert!(!controller.state().is_purchasing());
        assert_eq!(
            controller.state().error_message().as_deref(),
            Some("Selected plan is not available. Please try again.")
        );
    }

    #[test]
    fn close_button_enables_after_delay_and_stays_enabled() {
        let mut controller = PurchaseFlowController::launch(
            Arc::new(StaticCatalog::new()),
            DEFAULT_CLOSE_BUTTON_DELAY,
        )
        .expect("launch");
        let presented = Instant::now();
        controller.on_appear();
        controller.process_ui_events();
        assert!(!controller.state().close_enabled());

        wait_until(&mut controller, Duration::from_secs(5), |c| {
            c.state().close_enabled()
        });
        assert!(controller.state().close_enabled());
        assert!(presented.elapsed() >= DEFAULT_CLOSE_BUTTON_DELAY);
        assert_eq!(controller.state().offerings(), &OfferingsStatus::Ready);

        controller.on_appear();
        controller.wait_for_ui_events(Duration::from_millis(50));
        assert!(controller.state().close_enabled());
    }

    #[test]
    fn restore_result_is_recorded_without_alert() {
        let catalog = StaticCatalog::new().with_restore_outcome(CatalogOutcome::Failed {
            message: None,
        });
        let mut controller =
            PurchaseFlowController::launch(Arc::new(catalog), DEFAULT_CLOSE_BUTTON_DELAY)
                .expect("launch");

        controller.restore();
        assert_eq!(
            controller.state().restore_status(),
            Some(&RestoreStatus::InFlight)
        );
        wait_until(&mut controller, Duration::from_secs(5), |c| {
            c.state().restore_status() != Some(&RestoreStatus::InFlight)
        });
        assert_eq!(
            controller.state().restore_status(),
            Some(&RestoreStatus::Failed(RESTORE_FAILED_FALLBACK.to_string()))
        );
        assert_eq!(controller.state().error_message(), None);
    }

    #[test]
    fn prices_come_from_catalog() {
        let (catalog, _release) = GatedCatalog::new(vec![]);
        let (controller, _cmd_rx, _ui_tx) = detached_controller(catalog);
        assert_eq!(controller.price(Plan::Monthly), "price-monthly");
        assert_eq!(controller.price(Plan::Yearly), "price-yearly");
    }
}
