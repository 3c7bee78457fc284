use actix::Message;
use diesel::QueryResult;

use crate::services::db_models::{Brewery, Delivery, Keg, KegScan, Restaurant, VarianceAlert};
use crate::services::insertable::NewVarianceAlert;
use crate::types::{AlertStatus, DeliveryStatus, KegSize};
use crate::variance::OpsSnapshot;

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<Brewery>>")]
pub struct FetchBreweries;

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<Restaurant>>")]
pub struct FetchRestaurants;

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<Keg>>")]
pub struct FetchKegs;

#[derive(Message)]
#[rtype(result = "QueryResult<Keg>")]
pub struct FetchKeg(pub i64);

#[derive(Message)]
#[rtype(result = "QueryResult<Keg>")]
pub struct AddKeg {
    pub brewery_id: i64,
    pub beer_name: String,
    pub beer_style: String,
    pub abv: f64,
    pub ibu: i32,
    pub keg_size: KegSize,
    pub current_holder: String,
}

#[derive(Message)]
#[rtype(result = "QueryResult<()>")]
pub struct SetKegToken {
    pub keg_id: i64,
    pub token_id: i64,
    pub contract_address: String,
}

#[derive(Message)]
#[rtype(result = "QueryResult<Keg>")]
pub struct UpdatePintsSold {
    pub keg_id: i64,
    pub pints_sold: i32,
}

#[derive(Message)]
#[rtype(result = "QueryResult<Keg>")]
pub struct MarkKegEmpty(pub i64);

#[derive(Message)]
#[rtype(result = "QueryResult<Keg>")]
pub struct FindKegByToken {
    pub contract_address: String,
    pub token_id: i64,
}

#[derive(Message)]
#[rtype(result = "QueryResult<Delivery>")]
pub struct CreateDelivery {
    pub driver_name: String,
    pub restaurant_id: i64,
    pub brewery_id: i64,
    pub deposit_cents: i32,
    pub notes: Option<String>,
    pub keg_ids: Vec<i64>,
}

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<Delivery>>")]
pub struct FetchDeliveries;

#[derive(Message)]
#[rtype(result = "QueryResult<Delivery>")]
pub struct FetchDelivery(pub i64);

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<i64>>")]
pub struct FetchDeliveryKegIds(pub i64);

#[derive(Message)]
#[rtype(result = "QueryResult<Delivery>")]
pub struct SetDeliveryStatus {
    pub delivery_id: i64,
    pub status: DeliveryStatus,
    pub tx_hash: Option<String>,
}

#[derive(Message)]
#[rtype(result = "QueryResult<KegScan>")]
pub struct RecordScan {
    pub keg_id: i64,
    pub scanned_by: String,
    pub location: String,
}

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<KegScan>>")]
pub struct FetchKegScans(pub i64);

#[derive(Message)]
#[rtype(result = "QueryResult<OpsSnapshot>")]
pub struct FetchOpsSnapshot {
    pub window_days: i64,
}

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<VarianceAlert>>")]
pub struct StoreVarianceAlerts(pub Vec<NewVarianceAlert>);

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<VarianceAlert>>")]
pub struct FetchVarianceAlerts;

#[derive(Message)]
#[rtype(result = "QueryResult<VarianceAlert>")]
pub struct FetchVarianceAlert(pub i64);

#[derive(Message)]
#[rtype(result = "QueryResult<VarianceAlert>")]
pub struct UpdateAlertStatus {
    pub alert_id: i64,
    pub status: AlertStatus,
}

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<Keg>>")]
pub struct SeedDemoData;
