// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use common::QuoteState;
use elevate::config::AppConfig;
use elevate::App;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting up...");

    let config = AppConfig::load();

    let app = match App::start(&config).await {
        Ok(app) => {
            tracing::info!("Database connection was made successfully.");
            app
        }
        Err(e) => {
            tracing::error!("Failed to start: {:?}", e);
            std::process::exit(1);
        }
    };

    let diaries = app.diaries.subscribe().first().await.unwrap_or_else(|e| {
        tracing::error!("Could not load diaries: {}", e);
        Vec::new()
    });
    let tasks = app.tasks.subscribe().first().await.unwrap_or_else(|e| {
        tracing::error!("Could not load tasks: {}", e);
        Vec::new()
    });
    tracing::info!(
        "{} diaries, {} tasks ({} expired).",
        diaries.len(),
        tasks.len(),
        app.tasks.get_expired_tasks().len()
    );

    app.quotes.fetch_random_quote().await;
    match app.quotes.quote_state() {
        QuoteState::Loaded { quote, author } => {
            tracing::info!("Quote of the moment: \"{}\" - {}", quote, author);
        }
        QuoteState::Failed(message) => {
            tracing::warn!("Could not fetch a quote: {}", message);
            match app.quotes.random_saved_quote().await {
                Ok(Some(saved)) => {
                    tracing::info!("From your favourites: \"{}\" - {}", saved.quote, saved.author);
                }
                Ok(None) => {}
                Err(e) => tracing::error!("Could not load favourites: {}", e),
            }
        }
        other => tracing::debug!("Quote state: {:?}", other),
    }
}
