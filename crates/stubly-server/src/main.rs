use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use stubly_api::auth::{self, AppState, AppStateInner};
use stubly_api::mailer::Mailer;
use stubly_api::{banks, events, notifications, otp, uploads};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "stubly=debug,stubly_api=debug,stubly_db=debug,tower_http=debug".into()
                }),
        )
        .init();

    // Config
    let host = std::env::var("STUBLY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("STUBLY_PORT").unwrap_or_else(|_| "3005".into()).parse()?;
    let db_path = std::env::var("STUBLY_DB_PATH").unwrap_or_else(|_| "stubly.db".into());
    let upload_dir: PathBuf =
        std::env::var("STUBLY_UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into()).into();
    let jwt_secret = std::env::var("JWT_KEY").unwrap_or_else(|_| "dev-secret-change-me".into());
    let event_token_secret =
        std::env::var("EVENT_EXPIRY_KEY").unwrap_or_else(|_| "dev-event-secret-change-me".into());
    let token_expiry_secs: i64 =
        std::env::var("TOKEN_EXPIRY").unwrap_or_else(|_| "3600".into()).parse()?;
    let event_base_url = std::env::var("EVENT_BASE_URL")
        .unwrap_or_else(|_| "https://stublyevent.web.app/event".into());
    let paystack_secret_key = std::env::var("PAYSTACKKEY1").unwrap_or_default();
    let mail_user = std::env::var("MAIL_USER").ok();
    let mail_key = std::env::var("MAIL_KEY").ok();

    // Init database and the upload directory
    let db = stubly_db::Database::open(&PathBuf::from(&db_path))?;
    tokio::fs::create_dir_all(&upload_dir).await?;

    let mailer = match (mail_user, mail_key) {
        (Some(user), Some(key)) => Mailer::smtp(&user, &key)?,
        _ => {
            info!("MAIL_USER/MAIL_KEY unset; outgoing email disabled");
            Mailer::disabled()
        }
    };

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        mailer,
        http: reqwest::Client::new(),
        jwt_secret,
        event_token_secret,
        token_expiry_secs,
        event_base_url,
        upload_dir: upload_dir.clone(),
        paystack_secret_key,
    });

    // Routes — paths match the hosted API this server replaces, casing and all
    let app = Router::new()
        .route("/send-otp", post(otp::send_otp))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/managerLogin", post(auth::manager_login))
        .route("/api/events", get(events::list_events))
        .route("/api/allevents", get(events::list_all_events))
        .route("/createEvent", post(events::create_event))
        .route("/eventByCreator", post(events::events_by_creator))
        .route("/event/{token}", get(events::event_by_token))
        .route("/notifications", post(notifications::unread_notifications))
        .route("/notifications2", post(notifications::all_notifications))
        .route("/notifications/read", put(notifications::mark_read))
        .route("/ManagerNotifications", post(notifications::unread_manager_notifications))
        .route("/ManagerNotifications2", post(notifications::all_manager_notifications))
        .route("/ManagerNotifications/read", put(notifications::mark_manager_read))
        .route("/banks", post(banks::list_banks))
        .route("/verify-bank-account", post(banks::verify_bank_account))
        .route("/get-image", post(uploads::get_image))
        .nest_service("/uploads", ServeDir::new(&upload_dir))
        .layer(DefaultBodyLimit::max(64 * 1024 * 1024)) // creation form carries images
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Stubly server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
