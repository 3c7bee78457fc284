use std::env;
use std::time::Duration;

use actix::{Addr, SyncArbiter};
use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use dotenv::dotenv;

use services::db_utils::{get_db_pool, AppState, PgActor};
use services::rate_limit::RateLimiter;

mod blockchain;
mod pos;
mod qr;
mod schema;
mod services;
mod types;
mod variance;

fn init_pg_db() -> Addr<PgActor> {
    let db_url = env::var("PG_DATABASE_URL").expect("PG_DATABASE_URL must be set");
    let pool: Pool<ConnectionManager<PgConnection>> = get_db_pool(&db_url).unwrap();

    SyncArbiter::start(5, move || PgActor(pool.clone()))
}

fn init_redis_db() -> redis::Client {
    let db_uri = env::var("REDIS_DATABASE_URI").expect("REDIS_DATABASE_URI must be set");

    redis::Client::open(db_uri).unwrap()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let pg_db = init_pg_db();
    let redis_db = init_redis_db();

    // One shared limiter for the report endpoint across all workers.
    let report_limiter = Data::new(RateLimiter::new(30, Duration::from_secs(60)));

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_owned());

    log::info!("Listening on {bind_addr}");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(Data::new(AppState {
                pg_db: pg_db.clone(),
                redis_db: redis_db.clone(),
            }))
            .app_data(report_limiter.clone())
            .service(services::home_page)
            .service(
                web::scope("/directory")
                    .service(services::directory_route::fetch_breweries)
                    .service(services::directory_route::fetch_restaurants),
            )
            .service(
                web::scope("/kegs")
                    .service(services::kegs_route::fetch_kegs)
                    .service(services::kegs_route::add_keg)
                    .service(services::kegs_route::update_pints)
                    .service(services::kegs_route::mark_empty)
                    .service(services::kegs_route::keg_qr_payload)
                    .service(services::kegs_route::get_keg),
            )
            .service(
                web::scope("/deliveries")
                    .service(services::deliveries_route::create_delivery)
                    .service(services::deliveries_route::fetch_deliveries)
                    .service(services::deliveries_route::accept_delivery)
                    .service(services::deliveries_route::reject_delivery)
                    .service(services::deliveries_route::cancel_delivery)
                    .service(services::deliveries_route::get_delivery),
            )
            .service(
                web::scope("/scans")
                    .service(services::scans_route::record_scan)
                    .service(services::scans_route::keg_scans),
            )
            .service(
                web::scope("/pos")
                    .service(services::pos_route::tap_status)
                    .service(services::pos_route::sync_pint_count),
            )
            .service(
                web::scope("/analytics")
                    .service(services::analytics_route::variance_report)
                    .service(services::analytics_route::latest_report)
                    .service(services::analytics_route::list_alerts)
                    .service(services::analytics_route::update_alert_status),
            )
            .service(
                web::scope("/test")
                    .service(services::test_route::healthcheck)
                    .service(services::test_route::seed_demo_data),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
