//! In-memory stand-in for the keg NFT ledger. Calls sleep briefly to mimic
//! network latency and hand back fabricated token ids and transaction
//! hashes. Callers treat every failure as log-and-continue; a ledger error
//! must never block the business transaction it decorates.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

pub const KEG_CONTRACT_ADDRESS: &str = "0x6b3a55ke6tr4ck000000000000000000000c0de";

const SIMULATED_LATENCY_MS: u64 = 150;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReceipt {
    pub token_id: i64,
    pub tx_hash: String,
}

fn fake_tx_hash() -> String {
    let mut rng = rand::thread_rng();
    let mut hash = String::with_capacity(66);
    hash.push_str("0x");
    for _ in 0..64 {
        let nibble: u8 = rng.gen_range(0..16);
        hash.push(char::from_digit(nibble as u32, 16).unwrap_or('0'));
    }
    hash
}

/// Mints a token for a newly registered keg.
pub async fn mint_keg(keg_id: i64) -> Result<MintReceipt, String> {
    if keg_id <= 0 {
        return Err(format!("cannot mint token for invalid keg id {keg_id}"));
    }

    sleep(Duration::from_millis(SIMULATED_LATENCY_MS)).await;

    Ok(MintReceipt {
        token_id: keg_id,
        tx_hash: fake_tx_hash(),
    })
}

/// Transfers the tokens behind the given kegs between holders, returning a
/// single batched transaction hash.
pub async fn transfer_keg_nfts(keg_ids: &[i64], from: &str, to: &str) -> Result<String, String> {
    if keg_ids.is_empty() {
        return Err("transfer requires at least one keg".to_owned());
    }
    if from == to {
        return Err(format!("transfer from '{from}' to itself"));
    }

    sleep(Duration::from_millis(SIMULATED_LATENCY_MS)).await;

    Ok(fake_tx_hash())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mint_returns_token_and_hash() {
        let receipt = mint_keg(7).await.unwrap();
        assert_eq!(receipt.token_id, 7);
        assert!(receipt.tx_hash.starts_with("0x"));
        assert_eq!(receipt.tx_hash.len(), 66);
    }

    #[tokio::test]
    async fn mint_rejects_invalid_keg_id() {
        assert!(mint_keg(0).await.is_err());
        assert!(mint_keg(-3).await.is_err());
    }

    #[tokio::test]
    async fn transfer_returns_batched_hash() {
        let hash = transfer_keg_nfts(&[1, 2, 3], "Hoppy Trails Brewing", "The Tap Room")
            .await
            .unwrap();
        assert!(hash.starts_with("0x"));
    }

    #[tokio::test]
    async fn transfer_rejects_empty_batch_and_self_transfer() {
        assert!(transfer_keg_nfts(&[], "a", "b").await.is_err());
        assert!(transfer_keg_nfts(&[1], "a", "a").await.is_err());
    }
}
