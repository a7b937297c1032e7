//! # QuickMySlot Admin Console
//!
//! Headless entry point for the admin dashboard data layer: restores or
//! opens a session, loads the overview and a page of customers, and can keep
//! following both until interrupted.

mod config;
mod state;
mod telemetry;

use anyhow::bail;
use serde_json::Value;

use qms_client::api::{dashboard, users};
use qms_client::{AdminClient, QueryView, ViewState};
use qms_shared::Page;

use config::AppConfig;
use state::AppState;
use telemetry::TelemetryConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();
    tracing::info!(base_url = %config.http.base_url, "Starting QuickMySlot admin console");

    let state = AppState::new(&config).await?;
    open_session(&state.client, &config).await?;

    let overview = state.client.dashboard().overview().await?;
    tracing::info!(overview = %overview, "Dashboard overview");

    let customers = state.client.users().list(&config.users).await?;
    log_customers(&customers);

    if config.follow {
        follow(&state.client, &config).await;
    }

    state.shutdown();
    Ok(())
}

/// Restore the persisted session, logging in with the configured
/// credentials when there is none.
async fn open_session(client: &AdminClient, config: &AppConfig) -> anyhow::Result<()> {
    if let Some(session) = client.session().restore_session().await {
        tracing::info!(admin = %session.identity().display_name(), "Session restored");
        return Ok(());
    }

    let Some(credentials) = config.credentials.clone() else {
        bail!("no stored session; set QMS_ADMIN_EMAIL and QMS_ADMIN_PASSWORD to log in");
    };
    let identity = client.login(credentials).await?;
    tracing::info!(admin = %identity.display_name(), "Logged in");
    Ok(())
}

fn log_customers(page: &Page<Value>) {
    tracing::info!(
        shown = page.items.len(),
        total = page.total,
        page = page.current_page,
        last_page = page.last_page,
        "Customers"
    );
}

/// Follow the overview, the customer list and the session until Ctrl-C or logout.
async fn follow(client: &AdminClient, config: &AppConfig) {
    let mut overview: QueryView<Value> = client.view(&dashboard::GET_OVERVIEW, &());
    let mut customers: QueryView<Value> = client.view(&users::GET_USERS, &config.users);
    let mut session = client.session().subscribe();

    tracing::info!("Following dashboard changes, press Ctrl-C to stop");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            changed = session.changed() => {
                if changed.is_err() || session.borrow_and_update().is_none() {
                    tracing::warn!("Session ended");
                    break;
                }
            }
            state = overview.changed() => {
                if let ViewState::Success(data) = state {
                    tracing::info!(overview = %data, "Dashboard overview updated");
                }
            }
            state = customers.changed() => {
                match state {
                    ViewState::Success(data) => match Page::<Value>::from_response(&data) {
                        Ok(page) => log_customers(&page),
                        Err(e) => tracing::warn!(error = %e, "Unreadable customer list"),
                    },
                    ViewState::Loading { .. } => tracing::debug!("Customer list refreshing"),
                    _ => {}
                }
            }
        }
    }
}
