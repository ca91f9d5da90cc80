use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::sync::Arc;
use tokio::sync::mpsc;

use backend::config::Config;
use backend::job_controller::state::{start_session_updater, WorkerState};
use backend::pipeline::worker::SubmissionWorker;
use backend::services;
use backend::storage::{SessionStore, SqliteSessionStore};
use backend::submission::DemoSubmissionClient;
use backend::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = Config::from_env();

    let store: Arc<dyn SessionStore> = Arc::new(
        SqliteSessionStore::open(&config.database_path).map_err(std::io::Error::other)?,
    );
    let client = Arc::new(DemoSubmissionClient::new(config.demo_latency));

    // Initialize worker coordination state and the central updater.
    let (tx, rx) = mpsc::channel(100);
    let workers = WorkerState::new(tx);
    {
        let store = store.clone();
        let workers = workers.clone();
        tokio::spawn(async move {
            start_session_updater(store, workers, rx).await;
        });
    }

    let worker = SubmissionWorker::new(
        store.clone(),
        client,
        workers.clone(),
        config.submission_timeout,
    );
    let state = AppState {
        store,
        worker,
        workers,
    };

    info!("Server running at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(state.clone()))
            .service(services::bulk_uploads::configure_routes())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
