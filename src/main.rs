use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use planit::{config::Config, routes, state::AppState};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn cors(origin: Option<&str>) -> Cors {
    match origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header(),
        None => Cors::permissive(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load().map_err(|err| {
        error!(error = %err, "invalid configuration");
        std::io::Error::other(err)
    })?;

    let state = AppState::open(&config).await.map_err(|err| {
        error!(error = %err, "failed to open the store");
        std::io::Error::other(err)
    })?;
    let state = web::Data::new(state);

    let address = (config.host.clone(), config.port);
    info!(host = %address.0, port = address.1, "starting server");

    let server_state = state.clone();
    let cors_origin = config.cors_origin.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors(cors_origin.as_deref()))
            .app_data(server_state.clone())
            .configure(routes::configure)
    })
    .bind(address);
    let result = match server {
        Ok(server) => server.run().await,
        Err(err) => {
            error!(error = %err, "failed to bind");
            Err(err)
        }
    };

    info!("server stopped, closing the store");
    state.close().await;
    result
}
