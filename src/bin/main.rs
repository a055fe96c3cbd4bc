#[cfg(not(target_arch = "wasm32"))]
mod native {
    extern crate ruhverse;

    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
    use ruhverse::config::Config;
    use ruhverse::core::{db, store::MemoryStore};
    use tracing::{error, info};

    mod adapter {
        use actix_web::HttpRequest;
        use spin_sdk::http::{Method, Request};

        pub fn actix_to_spin_request(
            req: &HttpRequest,
            body: actix_web::web::Bytes,
        ) -> anyhow::Result<Request> {
            let method = match req.method().as_str() {
                "GET" => Method::Get,
                "POST" => Method::Post,
                "PUT" => Method::Put,
                "DELETE" => Method::Delete,
                "HEAD" => Method::Head,
                "OPTIONS" => Method::Options,
                "PATCH" => Method::Patch,
                other => anyhow::bail!("unsupported method {other}"),
            };

            let uri = req.uri().to_string();

            let mut builder = Request::builder();
            builder.method(method).uri(&uri);
            for (name, value) in req.headers() {
                if let Ok(val_str) = value.to_str() {
                    builder.header(name.as_str(), val_str);
                }
            }

            Ok(builder.body(body.to_vec()).build())
        }

        pub fn spin_to_actix_response(spin_resp: spin_sdk::http::Response) -> actix_web::HttpResponse {
            let status = *spin_resp.status();
            let content_type = spin_resp
                .header("content-type")
                .and_then(|h| h.as_str())
                .map(str::to_string);
            let body = spin_resp.body().to_vec();

            let mut response = actix_web::HttpResponse::build(
                actix_web::http::StatusCode::from_u16(status)
                    .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR),
            );
            if let Some(ct) = content_type {
                response.content_type(ct);
            }

            response.body(body)
        }
    }

    pub async fn run() -> std::io::Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();

        let config = Config::load();
        let store = web::Data::new(MemoryStore::new());
        if config.seed_demo {
            if let Err(e) = db::init_seed_data(store.get_ref()) {
                error!("seeding demo data failed: {e}");
            }
        }

        let address = format!("0.0.0.0:{}", config.port);
        info!("Server listening on http://{address}");

        HttpServer::new(move || {
            App::new()
                .app_data(store.clone())
                .app_data(web::PayloadConfig::new(ruhverse::config::MAX_MEDIA_BYTES + 1024))
                .default_service(web::route().to(handle_all))
        })
        .bind(&address)?
        .run()
        .await
    }

    async fn handle_all(
        store: web::Data<MemoryStore>,
        req: HttpRequest,
        body: web::Bytes,
    ) -> HttpResponse {
        let spin_req = match adapter::actix_to_spin_request(&req, body) {
            Ok(r) => r,
            Err(e) => {
                error!("could not adapt request: {e}");
                return HttpResponse::BadRequest()
                    .json(serde_json::json!({"error": "Invalid request"}));
            }
        };

        let spin_resp = ruhverse::router::route(store.get_ref(), &spin_req);
        adapter::spin_to_actix_response(spin_resp)
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    native::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
