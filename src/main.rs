use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{info, warn};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use taskgate::auth::{spawn_expiry_sweeper, SessionManager};
use taskgate::config::Config;
use taskgate::routes::{self, health::health};
use taskgate::store::{MemoryStore, PgStore, TaskStore, TokenStore, UserStore};

fn to_io_error(err: taskgate::AppError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

/// Hands one store to every component that needs it.
fn wire<S>(store: S, bcrypt_cost: u32) -> (SessionManager, Arc<dyn TaskStore>)
where
    S: UserStore + TokenStore + TaskStore + 'static,
{
    let store = Arc::new(store);
    let users: Arc<dyn UserStore> = store.clone();
    let tokens: Arc<dyn TokenStore> = store.clone();
    let tasks: Arc<dyn TaskStore> = store;
    let sessions = SessionManager::new(users, tokens).with_hash_cost(bcrypt_cost);
    (sessions, tasks)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(to_io_error)?;

    let (sessions, tasks) = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.database_max_connections)
                .await
                .map_err(to_io_error)?;
            info!("Connected to database");
            wire(store, config.bcrypt_cost)
        }
        None => {
            warn!("DATABASE_URL is not set; using the in-memory store, data will not persist");
            wire(MemoryStore::new(), config.bcrypt_cost)
        }
    };

    let sessions = web::Data::new(sessions);
    let tasks: web::Data<dyn TaskStore> = web::Data::from(tasks);

    if config.token_sweep_interval_secs > 0 {
        spawn_expiry_sweeper(
            sessions.clone(),
            Duration::from_secs(config.token_sweep_interval_secs),
        );
    }

    info!("Starting taskgate server at {}", config.server_url());
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(sessions.clone())
            .app_data(tasks.clone())
            .service(health)
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
