use chrono::{DateTime, Utc};
use diesel::Insertable;
use serde::Serialize;

use crate::schema::breweries;
use crate::schema::deliveries;
use crate::schema::delivery_kegs;
use crate::schema::keg_scans;
use crate::schema::kegs;
use crate::schema::restaurants;
use crate::schema::variance_alerts;

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = breweries)]
pub struct NewBrewery {
    pub name: String,
    pub city: String,
}

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = restaurants)]
pub struct NewRestaurant {
    pub name: String,
    pub city: String,
}

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = kegs)]
pub struct NewKeg {
    pub brewery_id: i64,
    pub beer_name: String,
    pub beer_style: String,
    pub abv: f64,
    pub ibu: i32,
    pub keg_size: String,
    pub current_holder: String,
    pub pints_sold: i32,
    pub variance: i32,
    pub variance_status: String,
    pub is_empty: bool,
    pub filled_at: DateTime<Utc>,
}

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = deliveries)]
pub struct NewDelivery {
    pub driver_name: String,
    pub restaurant_id: i64,
    pub brewery_id: i64,
    pub status: String,
    pub deposit_cents: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = delivery_kegs)]
pub struct DeliveryKegMapping {
    pub delivery_id: i64,
    pub keg_id: i64,
}

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = keg_scans)]
pub struct NewKegScan {
    pub keg_id: i64,
    pub scanned_by: String,
    pub location: String,
    pub scanned_at: DateTime<Utc>,
}

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = variance_alerts)]
pub struct NewVarianceAlert {
    pub alert_type: String,
    pub severity: String,
    pub current_value: f64,
    pub expected_value: f64,
    pub variance: f64,
    pub variance_percentage: f64,
    pub confidence: f64,
    pub recommendations: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
