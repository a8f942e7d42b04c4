use crate::configuration::Settings;
use crate::middleware;
use crate::routes;
use actix_cors::Cors;
use actix_web::{dev::Server, error, http, web, App, HttpResponse, HttpServer};
use sqlx::{Pool, Postgres};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub async fn run(
    listener: TcpListener,
    pg_pool: Pool<Postgres>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let settings = web::Data::new(settings);
    let pg_pool = web::Data::new(pg_pool);

    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        // A payload that doesn't deserialize is a client problem, reported
        // in the same envelope as every other error
        let message = format!("Invalid request body: {}", err);
        let body = serde_json::json!({
            "error": message,
            "code": "MISSING_FIELDS",
        });
        error::InternalError::from_response(message, HttpResponse::BadRequest().json(body)).into()
    });

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::AUTHORIZATION,
            ])
            .max_age(86400);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .service(web::scope("/health_check").service(routes::health_check))
            .service(
                web::scope("/sync")
                    .wrap(middleware::authentication::Manager::new())
                    .service(routes::sync::push_handler),
            )
            .service(
                web::scope("/bookmarks")
                    .wrap(middleware::authentication::Manager::new())
                    .service(routes::bookmark::status_handler),
            )
            .service(
                web::scope("/bookmark")
                    .wrap(middleware::authentication::Manager::new())
                    .service(routes::bookmark::toggle_handler)
                    .service(routes::bookmark::list_handler),
            )
            .service(
                web::scope("/conversation")
                    .wrap(middleware::authentication::Manager::new())
                    .service(routes::conversation::get::list_handler)
                    .service(routes::conversation::get::item_handler)
                    .service(routes::conversation::delete::item_handler),
            )
            .service(
                web::scope("/stats")
                    .wrap(middleware::authentication::Manager::new())
                    .service(routes::stats_handler),
            )
            .app_data(json_config.clone())
            .app_data(pg_pool.clone())
            .app_data(settings.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
