use actix_web::{get, web, App, HttpResponse, HttpServer};
use da_calculator::net::{CachedPrice, PriceClient};
use da_calculator::CalculatorConfig;
use std::sync::Arc;

struct AppState {
    price: CachedPrice,
}

/// Token price proxy. Always answers 200; an unknown price is `{}`.
#[get("/api/price")]
async fn price(data: web::Data<Arc<AppState>>) -> HttpResponse {
    HttpResponse::Ok().json(data.price.get().await)
}

fn build_state(cfg: &CalculatorConfig) -> std::io::Result<Arc<AppState>> {
    let client = PriceClient::new(cfg.price.clone())
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err.to_string()))?;
    Ok(Arc::new(AppState {
        price: CachedPrice::new(client),
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    let cfg = CalculatorConfig::from_env()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;
    if cfg.price.api_key.is_none() {
        log::warn!("CMC_KEY not set; /api/price will report an unknown price");
    }
    let bind = std::env::var("BIND").unwrap_or_else(|_| "0.0.0.0:8086".to_string());
    let state = build_state(&cfg)?;

    log::info!("QSYS|mod=PRICE|evt=LISTEN|addr={bind}|symbol={}", cfg.price.symbol);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .service(price)
    })
    .bind(bind)?
    .run()
    .await
}
