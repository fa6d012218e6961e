//! Search demonstration
//!
//! Runs `audio.search` and prints the resulting model rows.
//!
//! Run with:
//! ```bash
//! VK_ACCESS_TOKEN=... cargo run -p core-service --example audio_search -- "query"
//!
//! # List a group's catalog instead
//! VK_ACCESS_TOKEN=... cargo run -p core-service --example audio_search -- --owner -55
//! ```

use bridge_traits::logging::LogLevel;
use core_service::{
    init_logging, AudioModel, CoreService, ListModel, LoggingConfig, ModelChange, SearchQuery,
};
use core_runtime::logging::LogFormat;
use std::env;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let logging = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);
    if let Err(e) = init_logging(logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let service = match CoreService::from_env() {
        Ok(service) => service,
        Err(e) => {
            error!(error = %e, "Cannot start service");
            return;
        }
    };

    let mut model = AudioModel::new();
    model.subscribe(Box::new(|change: &ModelChange| {
        if let ModelChange::RowsInserted { first, .. } = change {
            info!(row = first, "Row inserted");
        }
    }));

    let result = match args.as_slice() {
        [flag, owner] if flag == "--owner" => match owner.parse::<i64>() {
            Ok(owner_id) => service.load_contact_audio(&mut model, owner_id, 20, 0).await,
            Err(_) => {
                error!(owner = %owner, "Owner id must be an integer");
                return;
            }
        },
        [query, ..] => {
            let search = SearchQuery::new(query.as_str()).page(20, 0);
            service.load_search_results(&mut model, &search).await
        }
        [] => {
            error!("Usage: audio_search <query> | --owner <id>");
            return;
        }
    };

    match result {
        Ok(added) => info!(added, "Request complete"),
        Err(e) => {
            error!(error = %e, "Request failed");
            return;
        }
    }

    for row in 0..model.row_count() {
        if let Some(track) = model.get(row) {
            println!(
                "{:>3}. {} [{}s]",
                row + 1,
                track.display_name(),
                track.duration as u64
            );
        }
    }
}
