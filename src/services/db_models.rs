use chrono::{serde::ts_seconds_option, DateTime, Utc};
use diesel::Queryable;
use serde::Serialize;

#[derive(Queryable, Debug, Clone, Serialize)]
pub struct Brewery {
    pub id: i64,
    pub name: String,
    pub city: String,
}

#[derive(Queryable, Debug, Clone, Serialize)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub city: String,
}

#[derive(Queryable, Debug, Clone, Serialize)]
pub struct Keg {
    pub id: i64,
    pub brewery_id: i64,
    pub beer_name: String,
    pub beer_style: String,
    pub abv: f64,
    pub ibu: i32,
    pub keg_size: String,
    pub current_holder: String,
    pub token_id: Option<i64>,
    pub contract_address: Option<String>,
    pub pints_sold: i32,
    pub variance: i32,
    pub variance_status: String,
    pub is_empty: bool,
    pub filled_at: DateTime<Utc>,
    #[serde(with = "ts_seconds_option")]
    pub emptied_at: Option<DateTime<Utc>>,
}

#[derive(Queryable, Debug, Clone, Serialize)]
pub struct Delivery {
    pub id: i64,
    pub driver_name: String,
    pub restaurant_id: i64,
    pub brewery_id: i64,
    pub status: String,
    pub blockchain_tx_hash: Option<String>,
    pub deposit_cents: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_seconds_option")]
    pub accepted_at: Option<DateTime<Utc>>,
}

#[derive(Queryable, Debug, Clone, Serialize)]
pub struct KegScan {
    pub id: i64,
    pub keg_id: i64,
    pub scanned_by: String,
    pub location: String,
    pub scanned_at: DateTime<Utc>,
}

#[derive(Queryable, Debug, Clone, Serialize)]
pub struct VarianceAlert {
    pub id: i64,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brewery_serializes_with_expected_fields() {
        let brewery = Brewery {
            id: 1,
            name: "Hoppy Trails Brewing".to_owned(),
            city: "Portland".to_owned(),
        };

        let json = serde_json::to_value(&brewery).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "Hoppy Trails Brewing");
        assert_eq!(json["city"], "Portland");
    }

    #[test]
    fn restaurant_serializes_with_expected_fields() {
        let restaurant = Restaurant {
            id: 2,
            name: "The Tap Room".to_owned(),
            city: "Seattle".to_owned(),
        };

        let json = serde_json::to_value(&restaurant).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["name"], "The Tap Room");
        assert_eq!(json["city"], "Seattle");
    }
}
