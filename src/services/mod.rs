use actix_web::{get, HttpResponse, Responder};

pub mod db_models;
pub mod db_utils;
pub mod insertable;
pub mod messages;
pub mod pg_handling;
pub mod rate_limit;
pub mod redis_handling;

#[get("/")]
pub async fn home_page() -> impl Responder {
    HttpResponse::Ok().body("Keg tracking service")
}

// sub-route "/directory"
pub mod directory_route {
    use actix_web::web::Data;
    use actix_web::{get, HttpResponse, Responder};

    use crate::services::db_utils::AppState;
    use crate::services::messages::{FetchBreweries, FetchRestaurants};

    #[get("/breweries")]
    pub async fn fetch_breweries(state: Data<AppState>) -> impl Responder {
        match state.pg_db.send(FetchBreweries).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(_)) => HttpResponse::NotFound().json("Breweries not found"),
            _ => HttpResponse::InternalServerError().json("Unable to retrieve breweries"),
        }
    }

    #[get("/restaurants")]
    pub async fn fetch_restaurants(state: Data<AppState>) -> impl Responder {
        match state.pg_db.send(FetchRestaurants).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(_)) => HttpResponse::NotFound().json("Restaurants not found"),
            _ => HttpResponse::InternalServerError().json("Unable to retrieve restaurants"),
        }
    }
}

// sub-route "/kegs"
pub mod kegs_route {
    use actix_web::web::{Data, Json, Path};
    use actix_web::{get, post, put, HttpResponse, Responder};
    use diesel::result::Error as DieselError;
    use serde::Deserialize;

    use crate::blockchain;
    use crate::qr::format_qr_payload;
    use crate::services::db_utils::AppState;
    use crate::services::messages::{
        AddKeg, FetchKeg, FetchKegs, MarkKegEmpty, SetKegToken, UpdatePintsSold,
    };
    use crate::types::KegSize;

    #[get("/all")]
    pub async fn fetch_kegs(state: Data<AppState>) -> impl Responder {
        match state.pg_db.send(FetchKegs).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(_)) => HttpResponse::NotFound().json("Kegs not found"),
            _ => HttpResponse::InternalServerError().json("Unable to retrieve kegs"),
        }
    }

    #[get("/{id}")]
    pub async fn get_keg(state: Data<AppState>, path: Path<i64>) -> impl Responder {
        match state.pg_db.send(FetchKeg(path.into_inner())).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(_)) => HttpResponse::NotFound().json("Keg with that id not found"),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to fetch keg: {err}")),
        }
    }

    #[derive(Deserialize)]
    pub struct AddKegBody {
        pub brewery_id: i64,
        pub beer_name: String,
        pub beer_style: String,
        pub abv: f64,
        pub ibu: i32,
        pub keg_size: String,
        pub current_holder: String,
    }

    #[post("/add")]
    pub async fn add_keg(state: Data<AppState>, body: Json<AddKegBody>) -> impl Responder {
        let keg_size = match KegSize::parse(&body.keg_size) {
            Some(size) => size,
            None => return HttpResponse::BadRequest().json("Unknown keg size"),
        };

        if body.abv < 0.0 || body.abv > 20.0 {
            return HttpResponse::BadRequest().json("ABV must be between 0 and 20");
        }

        let keg = match state
            .pg_db
            .send(AddKeg {
                brewery_id: body.brewery_id,
                beer_name: body.beer_name.clone(),
                beer_style: body.beer_style.clone(),
                abv: body.abv,
                ibu: body.ibu,
                keg_size,
                current_holder: body.current_holder.clone(),
            })
            .await
        {
            Ok(Ok(keg)) => keg,
            Ok(Err(err)) => return HttpResponse::BadRequest().json(err.to_string()),
            Err(err) => {
                return HttpResponse::InternalServerError()
                    .json(format!("Unable to insert new keg: {err}"))
            }
        };

        // Minting is best-effort; a keg without a token still tracks pours,
        // it just cannot be resolved by QR scan.
        match blockchain::mint_keg(keg.id).await {
            Ok(receipt) => {
                let set_token = state
                    .pg_db
                    .send(SetKegToken {
                        keg_id: keg.id,
                        token_id: receipt.token_id,
                        contract_address: blockchain::KEG_CONTRACT_ADDRESS.to_owned(),
                    })
                    .await;

                if !matches!(set_token, Ok(Ok(()))) {
                    log::error!("Failed to persist token for keg {}", keg.id);
                }
            }
            Err(err) => log::warn!("Mint failed for keg {}: {err}", keg.id),
        }

        match state.pg_db.send(FetchKeg(keg.id)).await {
            Ok(Ok(fresh)) => HttpResponse::Ok().json(fresh),
            _ => HttpResponse::Ok().json(keg),
        }
    }

    #[put("/{id}/pints/{count}")]
    pub async fn update_pints(state: Data<AppState>, path: Path<(i64, i32)>) -> impl Responder {
        let (keg_id, count) = path.into_inner();

        if count < 0 {
            return HttpResponse::BadRequest().json("Pint count cannot be negative");
        }

        match state
            .pg_db
            .send(UpdatePintsSold {
                keg_id,
                pints_sold: count,
            })
            .await
        {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(DieselError::NotFound)) => {
                HttpResponse::NotFound().json("Keg with that id not found")
            }
            Ok(Err(err)) => HttpResponse::BadRequest().json(err.to_string()),
            Err(err) => HttpResponse::InternalServerError()
                .json(format!("Unable to perform action: {err}")),
        }
    }

    #[post("/{id}/empty")]
    pub async fn mark_empty(state: Data<AppState>, path: Path<i64>) -> impl Responder {
        match state.pg_db.send(MarkKegEmpty(path.into_inner())).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(DieselError::NotFound)) => {
                HttpResponse::NotFound().json("Keg with that id not found")
            }
            Ok(Err(err)) => HttpResponse::BadRequest().json(err.to_string()),
            Err(err) => HttpResponse::InternalServerError()
                .json(format!("Unable to perform action: {err}")),
        }
    }

    #[get("/{id}/qr")]
    pub async fn keg_qr_payload(state: Data<AppState>, path: Path<i64>) -> impl Responder {
        let keg = match state.pg_db.send(FetchKeg(path.into_inner())).await {
            Ok(Ok(keg)) => keg,
            Ok(Err(_)) => return HttpResponse::NotFound().json("Keg with that id not found"),
            Err(err) => {
                return HttpResponse::InternalServerError()
                    .json(format!("Unable to fetch keg: {err}"))
            }
        };

        match (keg.contract_address, keg.token_id) {
            (Some(contract), Some(token)) => {
                HttpResponse::Ok().json(format_qr_payload(&contract, &token.to_string()))
            }
            _ => HttpResponse::NotFound().json("Keg has no minted token yet"),
        }
    }
}

// sub-route "/deliveries"
pub mod deliveries_route {
    use actix_web::web::{Data, Json, Path};
    use actix_web::{get, post, HttpRequest, HttpResponse, Responder};
    use serde::Deserialize;

    use crate::blockchain;
    use crate::services::db_models::Delivery;
    use crate::services::db_utils::AppState;
    use crate::services::messages::{
        CreateDelivery, FetchDeliveries, FetchDelivery, FetchDeliveryKegIds, SetDeliveryStatus,
    };
    use crate::types::DeliveryStatus;

    #[derive(Deserialize)]
    pub struct CreateDeliveryBody {
        pub driver_name: String,
        pub restaurant_id: i64,
        pub brewery_id: i64,
        pub deposit_cents: i32,
        pub notes: Option<String>,
        pub keg_ids: Vec<i64>,
    }

    #[post("/create")]
    pub async fn create_delivery(
        state: Data<AppState>,
        body: Json<CreateDeliveryBody>,
    ) -> impl Responder {
        if body.keg_ids.is_empty() {
            return HttpResponse::BadRequest().json("A delivery needs at least one keg");
        }

        match state
            .pg_db
            .send(CreateDelivery {
                driver_name: body.driver_name.clone(),
                restaurant_id: body.restaurant_id,
                brewery_id: body.brewery_id,
                deposit_cents: body.deposit_cents,
                notes: body.notes.clone(),
                keg_ids: body.keg_ids.clone(),
            })
            .await
        {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => HttpResponse::BadRequest().json(err.to_string()),
            Err(err) => HttpResponse::InternalServerError()
                .json(format!("Unable to perform action: {err}")),
        }
    }

    #[get("/all")]
    pub async fn fetch_deliveries(state: Data<AppState>) -> impl Responder {
        match state.pg_db.send(FetchDeliveries).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(_)) => HttpResponse::NotFound().json("Deliveries not found"),
            _ => HttpResponse::InternalServerError().json("Unable to retrieve deliveries"),
        }
    }

    #[get("/{id}")]
    pub async fn get_delivery(state: Data<AppState>, path: Path<i64>) -> impl Responder {
        match state.pg_db.send(FetchDelivery(path.into_inner())).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(_)) => HttpResponse::NotFound().json("Delivery with that id not found"),
            Err(err) => HttpResponse::InternalServerError()
                .json(format!("Unable to fetch delivery: {err}")),
        }
    }

    fn requesting_restaurant(req: &HttpRequest) -> Option<i64> {
        req.headers()
            .get("X-Restaurant-Id")?
            .to_str()
            .ok()?
            .parse::<i64>()
            .ok()
    }

    #[derive(Debug, PartialEq, Eq)]
    pub enum TransitionDenial {
        Unauthenticated,
        Forbidden,
        NotPending,
    }

    /// Gate for restaurant-side status changes: the requester must identify
    /// itself, own the delivery, and the delivery must still be PENDING.
    pub fn authorize_transition(
        delivery_status: &str,
        delivery_restaurant: i64,
        requester: Option<i64>,
    ) -> Result<(), TransitionDenial> {
        let requester = requester.ok_or(TransitionDenial::Unauthenticated)?;
        if delivery_restaurant != requester {
            return Err(TransitionDenial::Forbidden);
        }
        if delivery_status != DeliveryStatus::Pending.as_str() {
            return Err(TransitionDenial::NotPending);
        }
        Ok(())
    }

    fn denial_response(denial: TransitionDenial) -> HttpResponse {
        match denial {
            TransitionDenial::Unauthenticated => {
                HttpResponse::Unauthorized().json("Missing X-Restaurant-Id header")
            }
            TransitionDenial::Forbidden => {
                HttpResponse::Forbidden().json("Delivery belongs to another restaurant")
            }
            TransitionDenial::NotPending => {
                HttpResponse::BadRequest().json("Only PENDING deliveries can change status")
            }
        }
    }

    async fn load_delivery(
        state: &Data<AppState>,
        delivery_id: i64,
    ) -> Result<Delivery, HttpResponse> {
        match state.pg_db.send(FetchDelivery(delivery_id)).await {
            Ok(Ok(delivery)) => Ok(delivery),
            Ok(Err(_)) => Err(HttpResponse::NotFound().json("Delivery with that id not found")),
            Err(err) => Err(HttpResponse::InternalServerError()
                .json(format!("Unable to fetch delivery: {err}"))),
        }
    }

    #[post("/{id}/accept")]
    pub async fn accept_delivery(
        state: Data<AppState>,
        path: Path<i64>,
        req: HttpRequest,
    ) -> impl Responder {
        let delivery_id = path.into_inner();

        let delivery = match load_delivery(&state, delivery_id).await {
            Ok(delivery) => delivery,
            Err(resp) => return resp,
        };

        if let Err(denial) = authorize_transition(
            &delivery.status,
            delivery.restaurant_id,
            requesting_restaurant(&req),
        ) {
            return denial_response(denial);
        }

        // Ledger transfer is best-effort; acceptance proceeds either way.
        let tx_hash = match state.pg_db.send(FetchDeliveryKegIds(delivery_id)).await {
            Ok(Ok(keg_ids)) => {
                let from = format!("brewery-{}", delivery.brewery_id);
                let to = format!("restaurant-{}", delivery.restaurant_id);
                match blockchain::transfer_keg_nfts(&keg_ids, &from, &to).await {
                    Ok(hash) => Some(hash),
                    Err(err) => {
                        log::error!("NFT transfer failed for delivery {delivery_id}: {err}");
                        None
                    }
                }
            }
            _ => {
                log::error!("Unable to load keg ids for delivery {delivery_id}");
                None
            }
        };

        match state
            .pg_db
            .send(SetDeliveryStatus {
                delivery_id,
                status: DeliveryStatus::Accepted,
                tx_hash,
            })
            .await
        {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => HttpResponse::BadRequest().json(err.to_string()),
            Err(err) => HttpResponse::InternalServerError()
                .json(format!("Unable to perform action: {err}")),
        }
    }

    #[post("/{id}/reject")]
    pub async fn reject_delivery(
        state: Data<AppState>,
        path: Path<i64>,
        req: HttpRequest,
    ) -> impl Responder {
        let delivery_id = path.into_inner();

        let delivery = match load_delivery(&state, delivery_id).await {
            Ok(delivery) => delivery,
            Err(resp) => return resp,
        };

        if let Err(denial) = authorize_transition(
            &delivery.status,
            delivery.restaurant_id,
            requesting_restaurant(&req),
        ) {
            return denial_response(denial);
        }

        match state
            .pg_db
            .send(SetDeliveryStatus {
                delivery_id,
                status: DeliveryStatus::Rejected,
                tx_hash: None,
            })
            .await
        {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => HttpResponse::BadRequest().json(err.to_string()),
            Err(err) => HttpResponse::InternalServerError()
                .json(format!("Unable to perform action: {err}")),
        }
    }

    // Brewery/driver side, so no restaurant ownership check.
    #[post("/{id}/cancel")]
    pub async fn cancel_delivery(state: Data<AppState>, path: Path<i64>) -> impl Responder {
        let delivery_id = path.into_inner();

        let delivery = match load_delivery(&state, delivery_id).await {
            Ok(delivery) => delivery,
            Err(resp) => return resp,
        };

        if delivery.status != DeliveryStatus::Pending.as_str() {
            return HttpResponse::BadRequest().json("Only PENDING deliveries can change status");
        }

        match state
            .pg_db
            .send(SetDeliveryStatus {
                delivery_id,
                status: DeliveryStatus::Cancelled,
                tx_hash: None,
            })
            .await
        {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => HttpResponse::BadRequest().json(err.to_string()),
            Err(err) => HttpResponse::InternalServerError()
                .json(format!("Unable to perform action: {err}")),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::{authorize_transition, TransitionDenial};

        #[test]
        fn acceptance_requires_identity_ownership_and_pending_status() {
            assert_eq!(authorize_transition("PENDING", 7, Some(7)), Ok(()));
            assert_eq!(
                authorize_transition("PENDING", 7, None),
                Err(TransitionDenial::Unauthenticated)
            );
            assert_eq!(
                authorize_transition("PENDING", 7, Some(8)),
                Err(TransitionDenial::Forbidden)
            );
        }

        #[test]
        fn settled_deliveries_are_terminal() {
            for status in ["ACCEPTED", "REJECTED", "CANCELLED"] {
                assert_eq!(
                    authorize_transition(status, 7, Some(7)),
                    Err(TransitionDenial::NotPending)
                );
            }
        }

        #[test]
        fn ownership_is_checked_before_status() {
            // A foreign requester learns nothing about the delivery state.
            assert_eq!(
                authorize_transition("ACCEPTED", 7, Some(8)),
                Err(TransitionDenial::Forbidden)
            );
        }
    }
}

// sub-route "/scans"
pub mod scans_route {
    use actix_web::web::{Data, Json, Path};
    use actix_web::{get, post, HttpResponse, Responder};
    use serde::Deserialize;

    use crate::qr::parse_qr_payload;
    use crate::services::db_utils::AppState;
    use crate::services::messages::{FetchKegScans, FindKegByToken, RecordScan};

    #[derive(Deserialize)]
    pub struct RecordScanBody {
        pub payload: String,
        pub scanned_by: String,
        pub location: String,
    }

    #[post("/record")]
    pub async fn record_scan(state: Data<AppState>, body: Json<RecordScanBody>) -> impl Responder {
        let parsed = match parse_qr_payload(&body.payload) {
            Some(parsed) => parsed,
            None => return HttpResponse::BadRequest().json("Malformed QR payload"),
        };

        let token_id = match parsed.token_id.parse::<i64>() {
            Ok(token_id) => token_id,
            Err(_) => return HttpResponse::BadRequest().json("Token id is not numeric"),
        };

        let keg = match state
            .pg_db
            .send(FindKegByToken {
                contract_address: parsed.contract_address,
                token_id,
            })
            .await
        {
            Ok(Ok(keg)) => keg,
            Ok(Err(_)) => return HttpResponse::NotFound().json("No keg matches that token"),
            Err(err) => {
                return HttpResponse::InternalServerError()
                    .json(format!("Unable to resolve token: {err}"))
            }
        };

        match state
            .pg_db
            .send(RecordScan {
                keg_id: keg.id,
                scanned_by: body.scanned_by.clone(),
                location: body.location.clone(),
            })
            .await
        {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => HttpResponse::BadRequest().json(err.to_string()),
            Err(err) => HttpResponse::InternalServerError()
                .json(format!("Unable to perform action: {err}")),
        }
    }

    #[get("/keg/{id}")]
    pub async fn keg_scans(state: Data<AppState>, path: Path<i64>) -> impl Responder {
        match state.pg_db.send(FetchKegScans(path.into_inner())).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(_)) => HttpResponse::NotFound().json("No scans for that keg"),
            Err(err) => HttpResponse::InternalServerError()
                .json(format!("Unable to fetch scans: {err}")),
        }
    }
}

// sub-route "/pos"
pub mod pos_route {
    use actix_web::web::{Data, Path};
    use actix_web::{get, post, HttpResponse, Responder};
    use diesel::result::Error as DieselError;

    use crate::pos::{retry_pos_operation, PosClient, PosVendor};
    use crate::services::db_utils::AppState;
    use crate::services::messages::UpdatePintsSold;

    const SYNC_ATTEMPTS: u32 = 3;

    #[get("/{vendor}/keg/{keg_id}/tap/{tap_number}")]
    pub async fn tap_status(path: Path<(String, i64, u8)>) -> impl Responder {
        let (vendor_raw, keg_id, tap_number) = path.into_inner();

        let vendor = match PosVendor::parse(&vendor_raw) {
            Some(vendor) => vendor,
            None => return HttpResponse::BadRequest().json("Unknown POS vendor"),
        };

        match PosClient::new(vendor).get_tap_status(keg_id, tap_number).await {
            Ok(status) => HttpResponse::Ok().json(status),
            Err(err) => HttpResponse::InternalServerError().json(err),
        }
    }

    /// Pulls the vendor's pint count for a keg and writes it back, which
    /// also recomputes the keg's variance fields.
    #[post("/{vendor}/sync/{keg_id}")]
    pub async fn sync_pint_count(state: Data<AppState>, path: Path<(String, i64)>) -> impl Responder {
        let (vendor_raw, keg_id) = path.into_inner();

        let vendor = match PosVendor::parse(&vendor_raw) {
            Some(vendor) => vendor,
            None => return HttpResponse::BadRequest().json("Unknown POS vendor"),
        };

        let client = PosClient::new(vendor);

        let pints = match retry_pos_operation(|| client.get_pint_count(keg_id), SYNC_ATTEMPTS).await
        {
            Ok(pints) => pints,
            Err(err) => {
                return HttpResponse::InternalServerError()
                    .json(format!("POS sync failed after retries: {err}"))
            }
        };

        match state
            .pg_db
            .send(UpdatePintsSold {
                keg_id,
                pints_sold: pints,
            })
            .await
        {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(DieselError::NotFound)) => {
                HttpResponse::NotFound().json("Keg with that id not found")
            }
            Ok(Err(err)) => HttpResponse::BadRequest().json(err.to_string()),
            Err(err) => HttpResponse::InternalServerError()
                .json(format!("Unable to perform action: {err}")),
        }
    }
}

// sub-route "/analytics"
pub mod analytics_route {
    use actix_web::web::{Data, Path, Query};
    use actix_web::{get, put, HttpRequest, HttpResponse, Responder};
    use chrono::Utc;
    use serde::{Deserialize, Serialize};

    use crate::services::db_utils::AppState;
    use crate::services::insertable::NewVarianceAlert;
    use crate::services::messages::{
        FetchOpsSnapshot, FetchVarianceAlert, FetchVarianceAlerts, StoreVarianceAlerts,
        UpdateAlertStatus,
    };
    use crate::services::rate_limit::RateLimiter;
    use crate::services::redis_handling::{get_active_report, get_cached_report, put_report_to_db};
    use crate::types::{AlertStatus, Sensitivity, Severity};
    use crate::variance::{analyze_snapshot, OpsSnapshot, VarianceFinding};

    #[derive(Deserialize)]
    pub struct VarianceQuery {
        pub sensitivity: Option<String>,
        pub window_days: Option<i64>,
        pub refresh: Option<bool>,
    }

    #[derive(Serialize)]
    struct ReportSummary {
        total: usize,
        critical: usize,
        high: usize,
        medium: usize,
        low: usize,
    }

    #[derive(Serialize)]
    struct VarianceReport {
        generated_at: chrono::DateTime<Utc>,
        window_days: i64,
        sensitivity: Sensitivity,
        snapshot: OpsSnapshot,
        summary: ReportSummary,
        findings: Vec<VarianceFinding>,
    }

    fn summarize(findings: &[VarianceFinding]) -> ReportSummary {
        let count = |severity| findings.iter().filter(|f| f.severity == severity).count();
        ReportSummary {
            total: findings.len(),
            critical: count(Severity::Critical),
            high: count(Severity::High),
            medium: count(Severity::Medium),
            low: count(Severity::Low),
        }
    }

    fn to_alert_rows(findings: &[VarianceFinding]) -> Vec<NewVarianceAlert> {
        findings
            .iter()
            .map(|f| NewVarianceAlert {
                alert_type: f.category.as_str().to_owned(),
                severity: f.severity.as_str().to_owned(),
                current_value: f.current_value,
                expected_value: f.expected_value,
                variance: f.variance,
                variance_percentage: f.variance_percentage,
                confidence: f.confidence,
                recommendations: serde_json::to_string(&f.recommendations)
                    .unwrap_or_else(|_| "[]".to_owned()),
                status: AlertStatus::New.as_str().to_owned(),
                created_at: Utc::now(),
            })
            .collect()
    }

    fn caller_identifier(req: &HttpRequest) -> String {
        req.peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_owned())
    }

    #[get("/variance")]
    pub async fn variance_report(
        state: Data<AppState>,
        limiter: Data<RateLimiter>,
        query: Query<VarianceQuery>,
        req: HttpRequest,
    ) -> impl Responder {
        if !limiter.check(&caller_identifier(&req)) {
            return HttpResponse::TooManyRequests().json("Variance report rate limit exceeded");
        }

        let sensitivity = match &query.sensitivity {
            Some(raw) => match Sensitivity::parse(raw) {
                Some(sensitivity) => sensitivity,
                None => return HttpResponse::BadRequest().json("Unknown sensitivity"),
            },
            None => Sensitivity::Medium,
        };

        let window_days = query.window_days.unwrap_or(30);
        if !(1..=365).contains(&window_days) {
            return HttpResponse::BadRequest().json("window_days must be between 1 and 365");
        }

        let today = Utc::now().date_naive();
        if !query.refresh.unwrap_or(false) {
            if let Ok(Some(cached)) =
                get_cached_report(&state.redis_db, today, sensitivity, window_days)
            {
                return HttpResponse::Ok()
                    .content_type("application/json")
                    .body(cached);
            }
        }

        let snapshot = match state.pg_db.send(FetchOpsSnapshot { window_days }).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(err)) => return HttpResponse::InternalServerError().json(err.to_string()),
            Err(err) => {
                return HttpResponse::InternalServerError()
                    .json(format!("Unable to aggregate metrics: {err}"))
            }
        };

        let findings = analyze_snapshot(&snapshot, sensitivity);

        if !findings.is_empty() {
            match state
                .pg_db
                .send(StoreVarianceAlerts(to_alert_rows(&findings)))
                .await
            {
                Ok(Ok(_)) => {}
                _ => log::error!("Failed to persist variance alerts"),
            }
        }

        let report = VarianceReport {
            generated_at: Utc::now(),
            window_days,
            sensitivity,
            snapshot,
            summary: summarize(&findings),
            findings,
        };

        let report_json = match serde_json::to_string(&report) {
            Ok(json) => json,
            Err(_) => {
                return HttpResponse::InternalServerError()
                    .json("Failed to compose JSON object of report")
            }
        };

        if let Err(err) =
            put_report_to_db(&state.redis_db, &report_json, today, sensitivity, window_days)
        {
            log::warn!("Failed to cache variance report: {err}");
        }

        HttpResponse::Ok()
            .content_type("application/json")
            .body(report_json)
    }

    /// Serves whichever report was generated most recently, regardless of
    /// its window or sensitivity.
    #[get("/variance/latest")]
    pub async fn latest_report(state: Data<AppState>) -> impl Responder {
        match get_active_report(&state.redis_db) {
            Ok(report_json) => HttpResponse::Ok()
                .content_type("application/json")
                .body(report_json),
            Err(_) => HttpResponse::NotFound().json("No variance report has been generated yet"),
        }
    }

    #[get("/alerts")]
    pub async fn list_alerts(state: Data<AppState>) -> impl Responder {
        match state.pg_db.send(FetchVarianceAlerts).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(_)) => HttpResponse::NotFound().json("Alerts not found"),
            _ => HttpResponse::InternalServerError().json("Unable to retrieve alerts"),
        }
    }

    #[put("/alerts/{id}/status/{status}")]
    pub async fn update_alert_status(
        state: Data<AppState>,
        path: Path<(i64, String)>,
    ) -> impl Responder {
        let (alert_id, status_raw) = path.into_inner();

        let next = match AlertStatus::parse(&status_raw) {
            Some(status) => status,
            None => return HttpResponse::BadRequest().json("Unknown alert status"),
        };

        let alert = match state.pg_db.send(FetchVarianceAlert(alert_id)).await {
            Ok(Ok(alert)) => alert,
            Ok(Err(_)) => return HttpResponse::NotFound().json("Alert with that id not found"),
            Err(err) => {
                return HttpResponse::InternalServerError()
                    .json(format!("Unable to fetch alert: {err}"))
            }
        };

        let current = match AlertStatus::parse(&alert.status) {
            Some(status) => status,
            None => {
                return HttpResponse::InternalServerError()
                    .json("Alert has an unknown status on record")
            }
        };

        if !current.can_transition_to(next) {
            return HttpResponse::BadRequest().json(format!(
                "Cannot move alert from '{}' to '{}'",
                alert.status, status_raw
            ));
        }

        match state
            .pg_db
            .send(UpdateAlertStatus {
                alert_id,
                status: next,
            })
            .await
        {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => HttpResponse::BadRequest().json(err.to_string()),
            Err(err) => HttpResponse::InternalServerError()
                .json(format!("Unable to perform action: {err}")),
        }
    }
}

// sub-route "/test"
pub mod test_route {
    use actix_web::web::Data;
    use actix_web::{get, post, HttpResponse, Responder};

    use crate::services::db_utils::AppState;
    use crate::services::messages::SeedDemoData;

    #[get("/healthcheck")]
    pub async fn healthcheck() -> impl Responder {
        HttpResponse::Ok().body("I'm alive!")
    }

    #[post("/seed-demo-data")]
    pub async fn seed_demo_data(state: Data<AppState>) -> impl Responder {
        match state.pg_db.send(SeedDemoData).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => HttpResponse::InternalServerError().json(err.to_string()),
            _ => HttpResponse::InternalServerError().json("Unable to seed demo data"),
        }
    }
}
