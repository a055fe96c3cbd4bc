#[cfg(not(target_arch = "wasm32"))]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    use actix_web::{App, HttpServer};
    use tracing::info;
    use tracing_subscriber::{fmt, EnvFilter};

    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = ruhverse::config::Config::load();
    let address = format!("0.0.0.0:{}", config.health_port);
    info!("Health service listening on http://{address}");

    HttpServer::new(|| App::new().configure(ruhverse::health::configure))
        .bind(&address)?
        .run()
        .await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
