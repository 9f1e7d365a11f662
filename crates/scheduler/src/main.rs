//! Rebanho notification scheduler daemon.
//!
//! Wires the database, the WhatsApp gateway client, and the notifier
//! together, then runs the weekly absence sweep and the hourly retry job
//! until interrupted.

use std::env;
use std::sync::Arc;

use database::Database;
use notifier::{Notifier, NotifierConfig};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use wa_gateway::{GatewayClient, GatewayConfig, SessionEvent};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let db_url =
        env::var("REBANHO_DB").unwrap_or_else(|_| "sqlite:rebanho.db?mode=rwc".to_string());
    let gateway_url =
        env::var("WA_GATEWAY_URL").unwrap_or_else(|_| "http://localhost:21465".to_string());
    let session = env::var("WA_SESSION").unwrap_or_else(|_| "rebanho".to_string());

    let db = match Database::connect(&db_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = db.migrate().await {
        error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    let client = match GatewayClient::connect(GatewayConfig::with_session(gateway_url, session))
        .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to WhatsApp gateway: {}", e);
            std::process::exit(1);
        }
    };

    // The monitor keeps the client's connected flag current; the receipt
    // consumer below keeps message lifecycle columns current.
    let (_monitor, mut events) = client.start_session_monitor();

    let notifier = Arc::new(Notifier::new(
        db.clone(),
        client.clone(),
        NotifierConfig::default(),
    ));

    let ack_notifier = Arc::clone(&notifier);
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::Ack(ack)) => {
                    if let Err(e) = ack_notifier.record_ack(&ack).await {
                        error!("Failed to record delivery receipt: {}", e);
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Receipt consumer lagged behind session events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::spawn(scheduler::run_weekly_absence_job(Arc::clone(&notifier)));
    tokio::spawn(scheduler::run_hourly_retry_job(
        Arc::clone(&notifier),
        scheduler::RETRY_PERIOD,
    ));

    info!("Rebanho notification scheduler running");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
    db.close().await;
}
