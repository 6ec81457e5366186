use anyhow::Context;

use contact_relay::config::RelayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = RelayConfig::from_env().context("Invalid configuration")?;

    eprintln!("📬 Contact Relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Listening: http://0.0.0.0:{}/contact", config.port);
    eprintln!(
        "   CORS origin: {}",
        config.allowed_origin.to_str().unwrap_or("(non-ascii)")
    );
    match &config.llm {
        Some(llm) => eprintln!("   Classifier: gemini ({})", llm.model),
        None => eprintln!("   Classifier: disabled (GEMINI_API_KEY not set)"),
    }
    if config.telegram.bot_token.is_some() && config.telegram.chat_id.is_some() {
        eprintln!("   Telegram: enabled");
    } else {
        eprintln!("   Telegram: not configured (notifications will report failure)");
    }

    let app = contact_relay::build_app(&config);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Contact relay started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
