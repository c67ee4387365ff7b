//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use catalog_client::SubscriptionCatalog;
use crossbeam_channel::{Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

/// Starts the backend worker on its own thread. The worker runs until every
/// command sender is dropped.
pub fn launch(
    catalog: Arc<dyn SubscriptionCatalog>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("paywall-backend".to_string())
        .spawn(move || run_backend(catalog, cmd_rx, ui_tx))
}

fn run_backend(
    catalog: Arc<dyn SubscriptionCatalog>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("failed to build backend runtime: {err}");
            return;
        }
    };

    runtime.block_on(async move {
        let mut close_timer: Option<JoinHandle<()>> = None;
        let mut in_flight: Vec<JoinHandle<()>> = Vec::new();

        while let Ok(cmd) = cmd_rx.recv() {
            in_flight.retain(|task| !task.is_finished());
            match cmd {
                BackendCommand::RefreshOfferings => {
                    let catalog = Arc::clone(&catalog);
                    let ui_tx = ui_tx.clone();
                    in_flight.push(tokio::spawn(async move {
                        let result = catalog
                            .refresh_offerings()
                            .await
                            .map_err(|err| err.to_string());
                        if let Err(reason) = &result {
                            info!("catalog offerings unavailable: {reason}");
                        }
                        deliver(&ui_tx, UiEvent::OfferingsRefreshed(result));
                    }));
                }
                BackendCommand::Purchase { package } => {
                    let catalog = Arc::clone(&catalog);
                    let ui_tx = ui_tx.clone();
                    in_flight.push(tokio::spawn(async move {
                        let outcome = catalog.purchase_package(&package).await;
                        info!(
                            package = %package.identifier,
                            success = outcome.is_success(),
                            "purchase call resolved"
                        );
                        deliver(&ui_tx, UiEvent::PurchaseFinished(outcome));
                    }));
                }
                BackendCommand::Restore => {
                    let catalog = Arc::clone(&catalog);
                    let ui_tx = ui_tx.clone();
                    in_flight.push(tokio::spawn(async move {
                        let outcome = catalog.restore_purchases().await;
                        info!(success = outcome.is_success(), "restore call resolved");
                        deliver(&ui_tx, UiEvent::RestoreFinished(outcome));
                    }));
                }
                BackendCommand::ArmCloseButton { delay } => {
                    if let Some(previous) = close_timer.take() {
                        previous.abort();
                    }
                    let ui_tx = ui_tx.clone();
                    close_timer = Some(tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        deliver(&ui_tx, UiEvent::CloseButtonEnabled);
                    }));
                }
            }
        }

        if let Some(timer) = close_timer.take() {
            timer.abort();
        }
        // Store calls are not cancelled mid-flight; their results are dropped.
        futures::future::join_all(in_flight).await;
        debug!("backend worker stopped");
    });
}

fn deliver(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    if ui_tx.send(event).is_err() {
        debug!("offer screen is gone; dropping backend event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use catalog_client::StaticCatalog;
    use crossbeam_channel::bounded;
    use shared::domain::SubscriptionType;

    #[test]
    fn teardown_cancels_pending_close_timer() {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        let worker = launch(Arc::new(StaticCatalog::new()), cmd_rx, ui_tx).expect("spawn");

        cmd_tx
            .send(BackendCommand::ArmCloseButton {
                delay: Duration::from_secs(30),
            })
            .expect("queue");
        drop(cmd_tx);

        worker.join().expect("worker exits cleanly");
        assert!(ui_rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn timer_firing_after_screen_is_gone_is_a_no_op() {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        let worker = launch(Arc::new(StaticCatalog::new()), cmd_rx, ui_tx).expect("spawn");

        drop(ui_rx);
        cmd_tx
            .send(BackendCommand::ArmCloseButton {
                delay: Duration::from_millis(10),
            })
            .expect("queue");
        thread::sleep(Duration::from_millis(100));
        drop(cmd_tx);

        worker.join().expect("worker exits cleanly");
    }

    #[test]
    fn in_flight_purchase_settles_before_worker_exits() {
        let catalog = Arc::new(StaticCatalog::with_demo_offerings("$4.99", "$22.99"));
        let package = catalog
            .package(SubscriptionType::Monthly)
            .expect("monthly package");
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        let worker = launch(catalog.clone(), cmd_rx, ui_tx).expect("spawn");

        cmd_tx
            .send(BackendCommand::Purchase {
                package: package.clone(),
            })
            .expect("queue");
        drop(cmd_tx);
        worker.join().expect("worker exits cleanly");

        assert_eq!(catalog.purchases(), vec![package]);
        assert_eq!(
            ui_rx.try_recv(),
            Ok(UiEvent::PurchaseFinished(catalog_client::CatalogOutcome::Succeeded))
        );
    }
}
