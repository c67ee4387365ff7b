use std::{path::PathBuf, sync::Arc, time::Duration};

mod backend_bridge;
mod config;
mod controller;
mod screen;

use anyhow::{bail, Context, Result};
use catalog_client::{HttpCatalog, StaticCatalog, SubscriptionCatalog};
use clap::{Parser, Subcommand};
use shared::domain::Plan;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::controller::{
    FlowSignal, OfferingsStatus, PurchaseAttempt, PurchaseFlowController, RestoreStatus,
};

const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "paywall", about = "Premium offer purchase flow")]
struct Cli {
    /// Settings file (defaults to ./paywall.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Catalog service base URL; without one the built-in demo catalog is used.
    #[arg(long)]
    catalog_url: Option<String>,
    #[arg(long, default_value = "yearly")]
    plan: Plan,
    /// Testimonial shown in the carousel.
    #[arg(long, default_value_t = 0)]
    testimonial: usize,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the offer screen.
    Show,
    /// Purchase the selected plan and wait for the store to answer.
    Purchase,
    /// Restore previous purchases.
    Restore,
    /// Wait for the close button and dismiss the offer.
    Close,
}

fn build_catalog(settings: &Settings) -> Result<Arc<dyn SubscriptionCatalog>> {
    match &settings.catalog_url {
        Some(url) => {
            let catalog = HttpCatalog::new(url, settings.catalog_api_key.clone())
                .with_context(|| format!("invalid catalog configuration for '{url}'"))?;
            tracing::info!(catalog_url = %catalog.base_url(), "using remote catalog");
            Ok(Arc::new(catalog))
        }
        None => {
            tracing::info!("no catalog url configured; using demo catalog");
            Ok(Arc::new(StaticCatalog::with_demo_offerings(
                &settings.demo_monthly_price,
                &settings.demo_yearly_price,
            )))
        }
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();

    let mut settings = config::load_settings(cli.config.as_deref())?;
    if let Some(url) = cli.catalog_url {
        settings.catalog_url = Some(url);
    }

    let catalog = build_catalog(&settings)?;
    let mut controller = PurchaseFlowController::launch(catalog, settings.close_button_delay())?;
    controller.on_appear();
    while *controller.state().offerings() == OfferingsStatus::Loading {
        controller.wait_for_ui_events(EVENT_POLL_INTERVAL);
    }
    if let OfferingsStatus::Unavailable(reason) = controller.state().offerings() {
        tracing::warn!("offerings could not be refreshed: {reason}");
    }

    match cli.command {
        Command::Show => {
            controller.select(cli.plan);
            if !controller.select_testimonial(cli.testimonial) {
                tracing::warn!(index = cli.testimonial, "no such testimonial; showing the first");
            }
            println!("{}", screen::render_offer(&controller));
        }
        Command::Purchase => {
            controller.select(cli.plan);
            if controller.purchase() == PurchaseAttempt::AlreadyInFlight {
                bail!("a purchase is already in progress");
            }
            let mut completed = false;
            while controller.state().is_purchasing() {
                let signals = controller.wait_for_ui_events(EVENT_POLL_INTERVAL);
                completed |= signals.contains(&FlowSignal::Completed);
            }
            if completed {
                println!("Purchase complete: {} plan unlocked", cli.plan.title());
            } else if let Some(message) = controller.state().error_message() {
                controller.dismiss_error();
                bail!("{message}");
            }
        }
        Command::Restore => {
            controller.restore();
            while controller.state().restore_status() == Some(&RestoreStatus::InFlight) {
                controller.wait_for_ui_events(EVENT_POLL_INTERVAL);
            }
            match controller.state().restore_status() {
                Some(RestoreStatus::Restored) => println!("Purchases restored"),
                Some(RestoreStatus::Failed(reason)) => {
                    println!("Restore did not complete: {reason}")
                }
                _ => {}
            }
        }
        Command::Close => {
            while !controller.state().close_enabled() && controller.backend_connected() {
                controller.wait_for_ui_events(EVENT_POLL_INTERVAL);
            }
            if controller.request_close() != Some(FlowSignal::Dismissed) {
                bail!("close button never became available");
            }
            println!("Offer dismissed");
        }
    }

    Ok(())
}
