use std::sync::Arc;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gatekeep::{
    admission_middleware, AdmissionConfig, AdmissionPipeline, MemoryCache, PolicyDecision,
    PolicyRegistry,
};

async fn create_order(
    req: HttpRequest,
    body: web::Bytes,
    pipeline: web::Data<AdmissionPipeline>,
    registry: web::Data<PolicyRegistry>,
) -> HttpResponse {
    if let Err(rejection) = admission_middleware(&req, &body, &pipeline, &registry) {
        return rejection;
    }
    HttpResponse::Ok().json(serde_json::json!({ "status": "accepted" }))
}

async fn health(
    req: HttpRequest,
    pipeline: web::Data<AdmissionPipeline>,
    registry: web::Data<PolicyRegistry>,
) -> HttpResponse {
    if let Err(rejection) = admission_middleware(&req, b"", &pipeline, &registry) {
        return rejection;
    }
    HttpResponse::Ok().json(serde_json::json!({ "status": "healthy" }))
}

async fn metrics(pipeline: web::Data<AdmissionPipeline>) -> HttpResponse {
    match pipeline.metrics().render() {
        Ok(text) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(text),
        Err(_) => HttpResponse::InternalServerError().finish(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AdmissionConfig::from_env();
    let pipeline = match AdmissionPipeline::new(config, Arc::new(MemoryCache::new())) {
        Ok(pipeline) => web::Data::new(pipeline),
        Err(e) => {
            eprintln!("admission configuration invalid: {e}");
            std::process::exit(1);
        }
    };

    let mut registry = PolicyRegistry::new();
    registry.register("GET", "/api/health", PolicyDecision::open());
    registry.register(
        "POST",
        "/api/orders",
        PolicyDecision::strict().repeat_submit(5_000, &["request_id"]),
    );
    let registry = web::Data::new(registry);

    info!("server running at http://127.0.0.1:8080");

    HttpServer::new(move || {
        App::new()
            .app_data(pipeline.clone())
            .app_data(registry.clone())
            .service(web::resource("/api/health").route(web::get().to(health)))
            .service(web::resource("/api/orders").route(web::post().to(create_order)))
            .service(web::resource("/metrics").route(web::get().to(metrics)))
    })
    .bind("127.0.0.1:8080")?
    .run()
    .await
}
