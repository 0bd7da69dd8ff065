use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::{error, info};

use churn_backend::config::ServiceConfig;
use churn_backend::features::FeatureEncoder;
use churn_backend::inference::{ChurnScorer, OnnxChurnScorer};
use churn_backend::routes::{self, AppState, API_KEY_HEADER};

/// Customer churn prediction API. Settings come from the environment.
#[derive(Debug, Parser)]
#[command(name = "churn-server", version)]
struct ServerArgs {
    /// Print the feature-name layout the model must be exported with, then exit
    #[arg(long)]
    print_feature_names: bool,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    if args.print_feature_names {
        let names = FeatureEncoder::canonical().names().to_vec();
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    info!("Starting customer churn prediction API");

    let config = ServiceConfig::from_env()?;

    // No model, no service.
    let scorer = match OnnxChurnScorer::load(&config.model) {
        Ok(scorer) => {
            info!(
                "Model {} loaded from {} ({} features)",
                config.model.version,
                config.model.model_path.display(),
                scorer.feature_names().len()
            );
            scorer
        }
        Err(e) => {
            error!("Unable to load model: {}", e);
            return Err(e.into());
        }
    };

    let state = web::Data::new(AppState::new(Arc::new(scorer), &config));
    let bind_address = config.bind_address();

    info!("Server listening on http://{}", bind_address);
    info!("Workers: {}", config.workers);
    info!("Endpoints:");
    info!("   GET  /health               - liveness");
    info!("   GET  /model_info           - model metadata");
    info!("   GET  /stats                - counters");
    info!("   POST /predict_churn        - single prediction");
    info!("   POST /predict_churn/batch  - batch prediction");
    if !config.api_keys.is_empty() {
        info!("Prediction routes require the {} header", API_KEY_HEADER);
    }

    let server_config = config.clone();
    HttpServer::new(move || {
        let cors = server_config
            .allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::HeaderName::from_static("x-api-key"),
            ])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .wrap(cors)
            .app_data(state.clone())
            .app_data(routes::payload_config(server_config.max_body_bytes))
            .configure(routes::configure)
    })
    .workers(config.workers)
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
