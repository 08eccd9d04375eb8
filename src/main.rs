mod aircraft;
mod alerts;
mod app;
mod auth;
mod aviapages;
mod bookings;
mod config;
mod contact;
mod empty_legs;
mod error;
mod mailer;
mod partners;
mod prices;
mod search;
mod state;
mod throttle;
mod users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "aerocharter=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let mut app_state = state::AppState::init().await?;
    error::set_expose_stack(!app_state.config.is_production());

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    app_state.start_scheduler();
    let scheduler = app_state.scheduler.clone();

    app::serve(app::build_app(app_state)).await?;

    scheduler.shutdown().await;
    Ok(())
}
