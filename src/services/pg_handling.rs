use actix::Handler;
use chrono::{DateTime, Duration, Utc};
use diesel::{
    r2d2::{ConnectionManager, Pool, PooledConnection},
    result::{DatabaseErrorKind, Error},
    ExpressionMethods, PgConnection, QueryDsl, QueryResult, RunQueryDsl,
};

use crate::services::db_models::{Brewery, Delivery, Keg, KegScan, Restaurant, VarianceAlert};
use crate::services::db_utils::PgActor;
use crate::services::insertable::{
    DeliveryKegMapping, NewBrewery, NewDelivery, NewKeg, NewKegScan, NewRestaurant,
};
use crate::services::messages::{
    AddKeg, CreateDelivery, FetchBreweries, FetchDeliveries, FetchDelivery, FetchDeliveryKegIds,
    FetchKeg, FetchKegScans, FetchKegs, FetchOpsSnapshot, FetchRestaurants, FetchVarianceAlert,
    FetchVarianceAlerts, FindKegByToken, MarkKegEmpty, RecordScan, SeedDemoData, SetDeliveryStatus,
    SetKegToken, StoreVarianceAlerts, UpdateAlertStatus, UpdatePintsSold,
};
use crate::types::{DeliveryStatus, KegSize, VarianceStatus};
use crate::variance::{expected_pints, keg_variance_status, OpsSnapshot};

fn establish_connection(
    pool: &Pool<ConnectionManager<PgConnection>>,
) -> Result<PooledConnection<ConnectionManager<PgConnection>>, Error> {
    match pool.get() {
        Ok(val) => Ok(val),
        Err(_) => Err(connection_err()),
    }
}

fn connection_err() -> Error {
    Error::DatabaseError(
        DatabaseErrorKind::ClosedConnection,
        Box::new("Failed to establish connection".to_owned()),
    )
}

fn get_db_err(msg: &str) -> Error {
    Error::DatabaseError(
        DatabaseErrorKind::UnableToSendCommand,
        Box::new(msg.to_owned()),
    )
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

impl Handler<FetchBreweries> for PgActor {
    type Result = QueryResult<Vec<Brewery>>;

    fn handle(&mut self, _msg: FetchBreweries, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::breweries::{dsl::breweries, name};

        let mut conn = establish_connection(&self.0)?;

        breweries.order(name.asc()).get_results::<Brewery>(&mut conn)
    }
}

impl Handler<FetchRestaurants> for PgActor {
    type Result = QueryResult<Vec<Restaurant>>;

    fn handle(&mut self, _msg: FetchRestaurants, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::restaurants::{dsl::restaurants, name};

        let mut conn = establish_connection(&self.0)?;

        restaurants
            .order(name.asc())
            .get_results::<Restaurant>(&mut conn)
    }
}

impl Handler<FetchKegs> for PgActor {
    type Result = QueryResult<Vec<Keg>>;

    fn handle(&mut self, _msg: FetchKegs, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::kegs::dsl::kegs;

        let mut conn = establish_connection(&self.0)?;

        kegs.get_results::<Keg>(&mut conn)
    }
}

impl Handler<FetchKeg> for PgActor {
    type Result = QueryResult<Keg>;

    fn handle(&mut self, msg: FetchKeg, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::kegs::dsl::kegs;

        let mut conn = establish_connection(&self.0)?;

        kegs.find(msg.0).first(&mut conn)
    }
}

impl Handler<AddKeg> for PgActor {
    type Result = QueryResult<Keg>;

    fn handle(&mut self, msg: AddKeg, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::breweries::dsl::breweries;
        use crate::schema::kegs::dsl::kegs;

        let mut conn = establish_connection(&self.0)?;

        let brewery_count = breweries
            .find(msg.brewery_id)
            .count()
            .get_result::<i64>(&mut conn)?;
        if brewery_count == 0 {
            return Err(get_db_err("Brewery with that id does not exist"));
        }

        // A fresh keg has nothing to reconcile yet; variance is recomputed
        // once pour counts arrive.
        diesel::insert_into(kegs)
            .values(NewKeg {
                brewery_id: msg.brewery_id,
                beer_name: msg.beer_name,
                beer_style: msg.beer_style,
                abv: msg.abv,
                ibu: msg.ibu,
                keg_size: msg.keg_size.as_str().to_owned(),
                current_holder: msg.current_holder,
                pints_sold: 0,
                variance: 0,
                variance_status: VarianceStatus::Normal.as_str().to_owned(),
                is_empty: false,
                filled_at: Utc::now(),
            })
            .get_result::<Keg>(&mut conn)
    }
}

impl Handler<SetKegToken> for PgActor {
    type Result = QueryResult<()>;

    fn handle(&mut self, msg: SetKegToken, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::kegs::{contract_address, dsl::kegs, token_id};

        let mut conn = establish_connection(&self.0)?;

        diesel::update(kegs.find(msg.keg_id))
            .set((
                token_id.eq(Some(msg.token_id)),
                contract_address.eq(Some(msg.contract_address)),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}

impl Handler<UpdatePintsSold> for PgActor {
    type Result = QueryResult<Keg>;

    fn handle(&mut self, msg: UpdatePintsSold, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::kegs::{
            dsl::kegs, is_empty, keg_size, pints_sold, variance, variance_status,
        };

        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            let (size_raw, empty) = kegs
                .find(msg.keg_id)
                .select((keg_size, is_empty))
                .first::<(String, bool)>(trx_conn)?;

            if empty {
                return Err(get_db_err("Keg is already marked empty"));
            }

            let size = KegSize::parse(&size_raw)
                .ok_or_else(|| get_db_err("Keg has an unknown size on record"))?;

            let new_variance = expected_pints(size) - msg.pints_sold;
            let new_status = keg_variance_status(new_variance);

            diesel::update(kegs.find(msg.keg_id))
                .set((
                    pints_sold.eq(msg.pints_sold),
                    variance.eq(new_variance),
                    variance_status.eq(new_status.as_str()),
                ))
                .get_result::<Keg>(trx_conn)
        })
    }
}

impl Handler<MarkKegEmpty> for PgActor {
    type Result = QueryResult<Keg>;

    fn handle(&mut self, msg: MarkKegEmpty, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::kegs::{
            dsl::kegs, emptied_at, is_empty, keg_size, pints_sold, variance, variance_status,
        };

        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            let (size_raw, sold, empty) = kegs
                .find(msg.0)
                .select((keg_size, pints_sold, is_empty))
                .first::<(String, i32, bool)>(trx_conn)?;

            if empty {
                return Err(get_db_err("Keg is already marked empty"));
            }

            let size = KegSize::parse(&size_raw)
                .ok_or_else(|| get_db_err("Keg has an unknown size on record"))?;

            let final_variance = expected_pints(size) - sold;
            let final_status = keg_variance_status(final_variance);

            diesel::update(kegs.find(msg.0))
                .set((
                    is_empty.eq(true),
                    emptied_at.eq(Some(Utc::now())),
                    variance.eq(final_variance),
                    variance_status.eq(final_status.as_str()),
                ))
                .get_result::<Keg>(trx_conn)
        })
    }
}

impl Handler<FindKegByToken> for PgActor {
    type Result = QueryResult<Keg>;

    fn handle(&mut self, msg: FindKegByToken, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::kegs::{contract_address, dsl::kegs, token_id};

        let mut conn = establish_connection(&self.0)?;

        kegs.filter(contract_address.eq(Some(msg.contract_address)))
            .filter(token_id.eq(Some(msg.token_id)))
            .first(&mut conn)
    }
}

impl Handler<CreateDelivery> for PgActor {
    type Result = QueryResult<Delivery>;

    fn handle(&mut self, msg: CreateDelivery, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::delivery_kegs::dsl::delivery_kegs;
        use crate::schema::kegs::{dsl::kegs, id as keg_pk};
        use crate::schema::restaurants::dsl::restaurants;

        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(move |trx_conn| {
            let restaurant_count = restaurants
                .find(msg.restaurant_id)
                .count()
                .get_result::<i64>(trx_conn)?;
            if restaurant_count == 0 {
                return Err(get_db_err("Restaurant with that id does not exist"));
            }

            let known_kegs = kegs
                .filter(keg_pk.eq_any(&msg.keg_ids))
                .count()
                .get_result::<i64>(trx_conn)?;
            if known_kegs != msg.keg_ids.len() as i64 {
                return Err(get_db_err("One or more keg ids do not exist"));
            }

            let delivery = diesel::insert_into(crate::schema::deliveries::dsl::deliveries)
                .values(NewDelivery {
                    driver_name: msg.driver_name,
                    restaurant_id: msg.restaurant_id,
                    brewery_id: msg.brewery_id,
                    status: DeliveryStatus::Pending.as_str().to_owned(),
                    deposit_cents: msg.deposit_cents,
                    notes: msg.notes,
                    created_at: Utc::now(),
                })
                .get_result::<Delivery>(trx_conn)?;

            for keg_id in msg.keg_ids {
                diesel::insert_into(delivery_kegs)
                    .values(DeliveryKegMapping {
                        delivery_id: delivery.id,
                        keg_id,
                    })
                    .execute(trx_conn)?;
            }

            Ok(delivery)
        })
    }
}

impl Handler<FetchDeliveries> for PgActor {
    type Result = QueryResult<Vec<Delivery>>;

    fn handle(&mut self, _msg: FetchDeliveries, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::deliveries::{created_at, dsl::deliveries};

        let mut conn = establish_connection(&self.0)?;

        deliveries
            .order(created_at.desc())
            .get_results::<Delivery>(&mut conn)
    }
}

impl Handler<FetchDelivery> for PgActor {
    type Result = QueryResult<Delivery>;

    fn handle(&mut self, msg: FetchDelivery, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::deliveries::dsl::deliveries;

        let mut conn = establish_connection(&self.0)?;

        deliveries.find(msg.0).first(&mut conn)
    }
}

impl Handler<FetchDeliveryKegIds> for PgActor {
    type Result = QueryResult<Vec<i64>>;

    fn handle(&mut self, msg: FetchDeliveryKegIds, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::delivery_kegs::{delivery_id, dsl::delivery_kegs, keg_id};

        let mut conn = establish_connection(&self.0)?;

        delivery_kegs
            .filter(delivery_id.eq(msg.0))
            .select(keg_id)
            .get_results(&mut conn)
    }
}

impl Handler<SetDeliveryStatus> for PgActor {
    type Result = QueryResult<Delivery>;

    fn handle(&mut self, msg: SetDeliveryStatus, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::deliveries::{accepted_at, blockchain_tx_hash, dsl::deliveries, status};

        let mut conn = establish_connection(&self.0)?;

        let stamped_at = if msg.status == DeliveryStatus::Accepted {
            Some(Utc::now())
        } else {
            None
        };

        diesel::update(deliveries.find(msg.delivery_id))
            .set((
                status.eq(msg.status.as_str()),
                blockchain_tx_hash.eq(msg.tx_hash),
                accepted_at.eq(stamped_at),
            ))
            .get_result::<Delivery>(&mut conn)
    }
}

impl Handler<RecordScan> for PgActor {
    type Result = QueryResult<KegScan>;

    fn handle(&mut self, msg: RecordScan, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::keg_scans::dsl::keg_scans;
        use crate::schema::kegs::{current_holder, dsl::kegs};

        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(move |trx_conn| {
            let scan = diesel::insert_into(keg_scans)
                .values(NewKegScan {
                    keg_id: msg.keg_id,
                    scanned_by: msg.scanned_by.clone(),
                    location: msg.location,
                    scanned_at: Utc::now(),
                })
                .get_result::<KegScan>(trx_conn)?;

            diesel::update(kegs.find(msg.keg_id))
                .set(current_holder.eq(msg.scanned_by))
                .execute(trx_conn)?;

            Ok(scan)
        })
    }
}

impl Handler<FetchKegScans> for PgActor {
    type Result = QueryResult<Vec<KegScan>>;

    fn handle(&mut self, msg: FetchKegScans, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::keg_scans::{dsl::keg_scans, keg_id, scanned_at};

        let mut conn = establish_connection(&self.0)?;

        keg_scans
            .filter(keg_id.eq(msg.0))
            .order(scanned_at.desc())
            .get_results(&mut conn)
    }
}

impl Handler<FetchOpsSnapshot> for PgActor {
    type Result = QueryResult<OpsSnapshot>;

    fn handle(&mut self, msg: FetchOpsSnapshot, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::deliveries::{
            accepted_at, created_at as delivery_created, dsl::deliveries, status,
        };
        use crate::schema::keg_scans::{dsl::keg_scans, scanned_at};
        use crate::schema::kegs::{
            beer_style, dsl::kegs, emptied_at, filled_at, is_empty, variance_status,
        };

        let mut conn = establish_connection(&self.0)?;

        let cutoff = Utc::now() - Duration::days(msg.window_days);

        let active_kegs = kegs
            .filter(is_empty.eq(false))
            .count()
            .get_result::<i64>(&mut conn)?;

        let flagged_kegs = kegs
            .filter(is_empty.eq(false))
            .filter(variance_status.ne(VarianceStatus::Normal.as_str()))
            .count()
            .get_result::<i64>(&mut conn)?;

        let lifecycle_rows = kegs
            .filter(is_empty.eq(true))
            .filter(emptied_at.gt(cutoff))
            .select((filled_at, emptied_at))
            .get_results::<(DateTime<Utc>, Option<DateTime<Utc>>)>(&mut conn)?;

        let lifecycle_days: Vec<f64> = lifecycle_rows
            .iter()
            .filter_map(|(filled, emptied)| {
                emptied.map(|e| (e - *filled).num_seconds() as f64 / 86_400.0)
            })
            .collect();

        let delivery_count = deliveries
            .filter(delivery_created.gt(cutoff))
            .count()
            .get_result::<i64>(&mut conn)?;

        let accepted_rows = deliveries
            .filter(delivery_created.gt(cutoff))
            .filter(status.eq(DeliveryStatus::Accepted.as_str()))
            .select((delivery_created, accepted_at))
            .get_results::<(DateTime<Utc>, Option<DateTime<Utc>>)>(&mut conn)?;

        let acceptance_lags: Vec<f64> = accepted_rows
            .iter()
            .filter_map(|(created, accepted)| {
                accepted.map(|a| (a - *created).num_seconds() as f64 / 3_600.0)
            })
            .collect();

        let rejected_deliveries = deliveries
            .filter(delivery_created.gt(cutoff))
            .filter(status.eq(DeliveryStatus::Rejected.as_str()))
            .count()
            .get_result::<i64>(&mut conn)?;

        let styles = kegs
            .filter(is_empty.eq(false))
            .select(beer_style)
            .distinct()
            .get_results::<String>(&mut conn)?;

        let scans = keg_scans
            .filter(scanned_at.gt(cutoff))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(OpsSnapshot {
            window_days: msg.window_days,
            active_kegs,
            flagged_kegs,
            emptied_kegs: lifecycle_rows.len() as i64,
            avg_lifecycle_days: average(&lifecycle_days),
            deliveries: delivery_count,
            accepted_deliveries: accepted_rows.len() as i64,
            rejected_deliveries,
            avg_acceptance_lag_hours: average(&acceptance_lags),
            distinct_styles: styles.len() as i64,
            scans,
        })
    }
}

impl Handler<StoreVarianceAlerts> for PgActor {
    type Result = QueryResult<Vec<VarianceAlert>>;

    fn handle(&mut self, msg: StoreVarianceAlerts, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::variance_alerts::dsl::variance_alerts;

        let mut conn = establish_connection(&self.0)?;

        diesel::insert_into(variance_alerts)
            .values(&msg.0)
            .get_results::<VarianceAlert>(&mut conn)
    }
}

impl Handler<FetchVarianceAlerts> for PgActor {
    type Result = QueryResult<Vec<VarianceAlert>>;

    fn handle(&mut self, _msg: FetchVarianceAlerts, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::variance_alerts::{created_at, dsl::variance_alerts};

        let mut conn = establish_connection(&self.0)?;

        variance_alerts
            .order(created_at.desc())
            .get_results(&mut conn)
    }
}

impl Handler<FetchVarianceAlert> for PgActor {
    type Result = QueryResult<VarianceAlert>;

    fn handle(&mut self, msg: FetchVarianceAlert, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::variance_alerts::dsl::variance_alerts;

        let mut conn = establish_connection(&self.0)?;

        variance_alerts.find(msg.0).first(&mut conn)
    }
}

impl Handler<UpdateAlertStatus> for PgActor {
    type Result = QueryResult<VarianceAlert>;

    fn handle(&mut self, msg: UpdateAlertStatus, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::variance_alerts::{dsl::variance_alerts, status};

        let mut conn = establish_connection(&self.0)?;

        diesel::update(variance_alerts.find(msg.alert_id))
            .set(status.eq(msg.status.as_str()))
            .get_result::<VarianceAlert>(&mut conn)
    }
}

impl Handler<SeedDemoData> for PgActor {
    type Result = QueryResult<Vec<Keg>>;

    fn handle(&mut self, _msg: SeedDemoData, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::breweries::dsl::breweries;
        use crate::schema::kegs::dsl::kegs;
        use crate::schema::restaurants::dsl::restaurants;

        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            let brewery_id: i64 = diesel::insert_into(breweries)
                .values(NewBrewery {
                    name: "Hoppy Trails Brewing".to_owned(),
                    city: "Portland".to_owned(),
                })
                .returning(crate::schema::breweries::id)
                .get_result(trx_conn)?;

            diesel::insert_into(restaurants)
                .values(NewRestaurant {
                    name: "The Tap Room".to_owned(),
                    city: "Portland".to_owned(),
                })
                .execute(trx_conn)?;

            let demo_kegs = [
                ("Cascade Haze", "Hazy IPA", 6.8, 55, KegSize::HalfBarrel),
                ("Velvet Stout", "Dry Stout", 4.5, 38, KegSize::QuarterBarrel),
                ("Pils Nine", "Pilsner", 5.1, 30, KegSize::SixthBarrel),
            ];

            let mut inserted = Vec::with_capacity(demo_kegs.len());
            for (name, style, abv_val, ibu_val, size) in demo_kegs {
                let keg = diesel::insert_into(kegs)
                    .values(NewKeg {
                        brewery_id,
                        beer_name: name.to_owned(),
                        beer_style: style.to_owned(),
                        abv: abv_val,
                        ibu: ibu_val,
                        keg_size: size.as_str().to_owned(),
                        current_holder: "Hoppy Trails Brewing".to_owned(),
                        pints_sold: 0,
                        variance: 0,
                        variance_status: VarianceStatus::Normal.as_str().to_owned(),
                        is_empty: false,
                        filled_at: Utc::now(),
                    })
                    .get_result::<Keg>(trx_conn)?;
                inserted.push(keg);
            }

            Ok(inserted)
        })
    }
}
