//! Fixed-format QR payloads: `<contract_address>:<token_id>`. Image
//! generation happens client-side; the backend only round-trips the text.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrPayload {
    pub contract_address: String,
    pub token_id: String,
}

pub fn format_qr_payload(contract_address: &str, token_id: &str) -> String {
    format!("{contract_address}:{token_id}")
}

pub fn parse_qr_payload(raw: &str) -> Option<QrPayload> {
    let (contract_address, token_id) = raw.split_once(':')?;
    if contract_address.is_empty() || token_id.is_empty() || token_id.contains(':') {
        return None;
    }

    Some(QrPayload {
        contract_address: contract_address.to_owned(),
        token_id: token_id.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let cases = [("0xabc123", "42"), ("keg-contract", "token-9"), ("a", "b")];
        for (contract, token) in cases {
            let parsed = parse_qr_payload(&format_qr_payload(contract, token)).unwrap();
            assert_eq!(parsed.contract_address, contract);
            assert_eq!(parsed.token_id, token);
        }
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(parse_qr_payload("no-separator").is_none());
        assert!(parse_qr_payload(":42").is_none());
        assert!(parse_qr_payload("0xabc:").is_none());
        assert!(parse_qr_payload("0xabc:1:2").is_none());
    }
}
