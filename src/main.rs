use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;

use roteiro_surpresa::gemini::GeminiClient;
use roteiro_surpresa::geo::{CachedLocator, EnvLocator};
use roteiro_surpresa::images::{ImageResolver, PexelsClient};
use roteiro_surpresa::server;
use roteiro_surpresa::suggest::SuggestionEngine;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(8080);

    let engine: web::Data<server::AppEngine> = web::Data::new(SuggestionEngine::new(
        GeminiClient::from_env(),
        ImageResolver::new(PexelsClient::from_env()),
        CachedLocator::new(EnvLocator::from_env()),
    ));

    info!("Servidor rodando em http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(engine.clone())
            .configure(server::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
