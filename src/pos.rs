//! Mocked point-of-sale adapters. All three vendors share one simulated
//! implementation behind the same interface; real vendor protocols are out
//! of scope. The retry helper exists for the day a real adapter lands.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;

const SIMULATED_LATENCY_MS: u64 = 120;
const RETRY_BASE_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PosVendor {
    Toast,
    Square,
    Clover,
}

impl PosVendor {
    pub fn parse(raw: &str) -> Option<PosVendor> {
        match raw {
            "toast" => Some(PosVendor::Toast),
            "square" => Some(PosVendor::Square),
            "clover" => Some(PosVendor::Clover),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TapStatus {
    pub vendor: PosVendor,
    pub keg_id: i64,
    pub tap_number: u8,
    pub is_active: bool,
    pub pints_remaining: i32,
}

pub struct PosClient {
    vendor: PosVendor,
}

impl PosClient {
    pub fn new(vendor: PosVendor) -> PosClient {
        PosClient { vendor }
    }

    pub async fn install_keg(&self, keg_id: i64, tap_number: u8) -> Result<TapStatus, String> {
        if tap_number == 0 {
            return Err("tap numbers start at 1".to_owned());
        }

        sleep(Duration::from_millis(SIMULATED_LATENCY_MS)).await;

        Ok(TapStatus {
            vendor: self.vendor,
            keg_id,
            tap_number,
            is_active: true,
            pints_remaining: 40,
        })
    }

    pub async fn get_pint_count(&self, keg_id: i64) -> Result<i32, String> {
        sleep(Duration::from_millis(SIMULATED_LATENCY_MS)).await;

        // Deterministic pseudo-count so repeated polls look stable per keg.
        Ok((keg_id % 40) as i32)
    }

    pub async fn sync_sales(&self, keg_ids: &[i64]) -> Result<usize, String> {
        sleep(Duration::from_millis(SIMULATED_LATENCY_MS)).await;

        Ok(keg_ids.len())
    }

    pub async fn get_tap_status(&self, keg_id: i64, tap_number: u8) -> Result<TapStatus, String> {
        sleep(Duration::from_millis(SIMULATED_LATENCY_MS)).await;

        Ok(TapStatus {
            vendor: self.vendor,
            keg_id,
            tap_number,
            is_active: true,
            pints_remaining: 40 - (keg_id % 40) as i32,
        })
    }
}

/// Retries a POS call with exponential backoff (100ms, 200ms, 400ms, ...).
pub async fn retry_pos_operation<T, F, Fut>(mut operation: F, max_attempts: u32) -> Result<T, String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, String>>,
{
    let mut last_err = "no attempts were made".to_owned();

    for attempt in 0..max_attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                log::warn!("POS operation failed on attempt {}: {err}", attempt + 1);
                last_err = err;
            }
        }

        if attempt + 1 < max_attempts {
            sleep(Duration::from_millis(RETRY_BASE_DELAY_MS << attempt)).await;
        }
    }

    Err(last_err)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn vendors_share_one_mock_behaviour() {
        for vendor in [PosVendor::Toast, PosVendor::Square, PosVendor::Clover] {
            let client = PosClient::new(vendor);
            let status = client.install_keg(12, 3).await.unwrap();
            assert_eq!(status.vendor, vendor);
            assert!(status.is_active);
            assert_eq!(status.tap_number, 3);
            assert_eq!(client.get_pint_count(12).await.unwrap(), 12);
            assert_eq!(client.sync_sales(&[1, 2, 3]).await.unwrap(), 3);
        }
    }

    #[tokio::test]
    async fn install_rejects_tap_zero() {
        let client = PosClient::new(PosVendor::Square);
        assert!(client.install_keg(1, 0).await.is_err());
    }

    #[tokio::test]
    async fn retry_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);

        let result = retry_pos_operation(
            || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err("transient".to_owned())
                    } else {
                        Ok(attempt)
                    }
                }
            },
            5,
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_with_last_error() {
        let result: Result<(), String> =
            retry_pos_operation(|| async { Err("still down".to_owned()) }, 3).await;
        assert_eq!(result.unwrap_err(), "still down");
    }
}
