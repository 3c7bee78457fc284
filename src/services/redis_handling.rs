use chrono::NaiveDate;

use crate::types::{Sensitivity, ACTIVE_REPORT_KEY, REPORT_KEY};

fn sensitivity_tag(sensitivity: Sensitivity) -> &'static str {
    match sensitivity {
        Sensitivity::Low => "low",
        Sensitivity::Medium => "medium",
        Sensitivity::High => "high",
    }
}

pub fn report_cache_key(date: NaiveDate, sensitivity: Sensitivity, window_days: i64) -> String {
    format!(
        "{REPORT_KEY}_{date}_{window_days}d_{}",
        sensitivity_tag(sensitivity)
    )
}

pub fn put_report_to_db(
    db: &redis::Client,
    report_json: &str,
    date: NaiveDate,
    sensitivity: Sensitivity,
    window_days: i64,
) -> Result<String, String> {
    let mut conn = match db.get_connection() {
        Ok(conn) => conn,
        Err(_) => return Err("Failed to establish connection with redis".into()),
    };

    let report_key = report_cache_key(date, sensitivity, window_days);

    redis::cmd("SET")
        .arg(&report_key)
        .arg(report_json)
        .execute(&mut conn);

    redis::cmd("SET")
        .arg(ACTIVE_REPORT_KEY)
        .arg(&report_key)
        .execute(&mut conn);

    Ok(report_key)
}

pub fn get_cached_report(
    db: &redis::Client,
    date: NaiveDate,
    sensitivity: Sensitivity,
    window_days: i64,
) -> Result<Option<String>, String> {
    let mut conn = match db.get_connection() {
        Ok(conn) => conn,
        Err(_) => return Err("Failed to establish connection with redis".into()),
    };

    match redis::cmd("GET")
        .arg(report_cache_key(date, sensitivity, window_days))
        .query::<Option<String>>(&mut conn)
    {
        Ok(report_json) => Ok(report_json),
        Err(_) => Err("Failed to get JSON object of report from redis db".into()),
    }
}

pub fn get_active_report(db: &redis::Client) -> Result<String, String> {
    let mut conn = match db.get_connection() {
        Ok(conn) => conn,
        Err(_) => return Err("Failed to establish connection with redis".into()),
    };

    match redis::cmd("GET")
        .arg(ACTIVE_REPORT_KEY)
        .query::<String>(&mut conn)
    {
        Ok(active_report_key) => {
            match redis::cmd("GET")
                .arg(active_report_key)
                .query::<String>(&mut conn)
            {
                Ok(report_json) => Ok(report_json),
                Err(_) => Err("Failed to get JSON object of report from redis db".into()),
            }
        }
        Err(_) => Err("Failed to get value of active report".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_includes_date_window_and_sensitivity() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();
        assert_eq!(
            report_cache_key(date, Sensitivity::Medium, 30),
            "variance-report_2026-08-25_30d_medium"
        );
        // same day, different window: distinct cache entries
        assert_ne!(
            report_cache_key(date, Sensitivity::Medium, 7),
            report_cache_key(date, Sensitivity::Medium, 30)
        );
    }

    #[test]
    fn active_report_surfaces_connection_failure() {
        // port 1 is never a redis server; get_connection must fail cleanly
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        assert_eq!(
            get_active_report(&client),
            Err("Failed to establish connection with redis".to_owned())
        );
    }
}
