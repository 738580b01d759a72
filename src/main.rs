use axum::{http::Method, Extension};
use envconfig::Envconfig;
use tower_http::cors::{Any, CorsLayer};
use xclubs_backend::{auth::ensure_jwt_secret_is_valid, connect_to_db, email};

#[derive(Envconfig)]
struct Config {
    #[envconfig(from = "DATABASE_URL")]
    pub db_url: String,
    #[envconfig(from = "PORT", default = "8080")]
    pub port: u16,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("xclubs_backend=info")),
        )
        .init();

    let config = Config::init_from_env().unwrap();
    ensure_jwt_secret_is_valid();
    if !email::is_configured() {
        tracing::warn!("email credentials are not set, approval notifications will be skipped");
    }

    let pool = connect_to_db(&config.db_url);
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(Any);
    let app = xclubs_backend::app().layer(Extension(pool)).layer(cors);

    tracing::info!(port = config.port, "starting club directory backend");
    axum::Server::bind(&([0, 0, 0, 0], config.port).into())
        .serve(app.into_make_service())
        .await
        .unwrap();
}
