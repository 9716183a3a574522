use crate::{
    api::{self, attendance, hours},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, error::InternalError, middleware::Condition, web};
use serde_json::json;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    // Helper to build the per-IP limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let per_ms = 60_000 / requests_per_min as u64;
        let cfg = GovernorConfigBuilder::default()
            .milliseconds_per_request(per_ms.max(1))
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("period and burst size are non-zero");
        Governor::new(&cfg)
    }

    let limiter = Arc::new(build_limiter(config.rate_api_per_min));
    let limited = config.rate_api_per_min > 0;

    // Malformed bodies answer in the same `{ "error": ... }` shape as the store
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let body = json!({ "error": err.to_string() });
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    }));

    cfg.service(api::index);

    cfg.service(
        web::scope("/api")
            .wrap(Condition::new(limited, limiter.clone()))
            // /api/internList
            .service(
                web::resource("/internList")
                    .route(web::get().to(attendance::list_interns))
                    .route(web::post().to(attendance::create_intern)),
            )
            // /api/hours/{name}
            .service(web::resource("/hours/{name}").route(web::get().to(hours::intern_hours)))
            // /api/summary
            .service(web::resource("/summary").route(web::get().to(hours::activity_summary))),
    );

    // The kiosk pages call edit/delete outside the /api prefix
    cfg.service(
        web::resource("/editIntern/{name}")
            .wrap(Condition::new(limited, limiter.clone()))
            .route(web::patch().to(attendance::edit_intern)),
    );
    cfg.service(
        web::resource("/deleteIntern/{name}")
            .wrap(Condition::new(limited, limiter))
            .route(web::delete().to(attendance::delete_intern)),
    );
}
