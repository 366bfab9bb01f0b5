use {
    axum::{
        Router,
        extract::DefaultBodyLimit,
        routing::{get, post},
    },
    give_sync::{
        AppState,
        adapters::{http, mollie::MollieGateway},
        domain::transaction::Mode,
        infra::postgres::PgLedgerStore,
        services::{
            provisioner::SubscriptionProvisioner,
            reconciler::PaymentStatusReconciler,
            refunds::RefundService,
            worker::{job_channel, run_worker},
        },
    },
    sqlx::postgres::PgPoolOptions,
    std::{env, sync::Arc, time::Duration},
    tokio::{signal, sync::watch},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let api_key = env::var("MOLLIE_API_KEY").expect("MOLLIE_API_KEY must be set");
    let mode = env::var("MOLLIE_MODE")
        .as_deref()
        .map(Mode::try_from)
        .unwrap_or(Ok(Mode::Test))
        .expect("MOLLIE_MODE must be 'test' or 'live'");
    let webhook_url = env::var("WEBHOOK_URL").expect("WEBHOOK_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_url)
        .await
        .expect("failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let store = Arc::new(PgLedgerStore::new(pool));
    let gateway = Arc::new(MollieGateway::new(api_key, mode));

    let provisioner = SubscriptionProvisioner::new(store.clone(), gateway.clone(), webhook_url);
    let reconciler = Arc::new(PaymentStatusReconciler::new(
        store.clone(),
        gateway.clone(),
        provisioner,
    ));
    let refunds = Arc::new(RefundService::new(store.clone(), gateway.clone()));

    let (jobs, rx) = job_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(run_worker(
        reconciler.clone(),
        jobs.clone(),
        rx,
        shutdown_rx,
    ));

    let state = AppState { jobs, refunds };

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/payment/webhook", post(http::webhook_handler))
        .route("/payment/refund", post(http::refund_handler))
        .layer(DefaultBodyLimit::max(16 * 1024)) // webhook bodies carry one id
        .layer(tower_http::timeout::TimeoutLayer::new(Duration::from_secs(10)))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    tracing::info!("listening on 0.0.0.0:3000, mode {mode}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    let _ = shutdown_tx.send(true);
    let _ = worker.await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
