//! Session identifiers: full UUIDs or 22-character base57 short ids

use crate::error::WorkflowError;
use uuid::Uuid;

const ALPHABET: &[u8; 57] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const SHORT_LEN: usize = 22;

/// Encode a UUID as a 22-character base57 string, most significant digit first
pub fn encode_short(id: &Uuid) -> String {
    let mut value = id.as_u128();
    let mut digits = Vec::with_capacity(SHORT_LEN);
    while value > 0 {
        digits.push(ALPHABET[(value % 57) as usize]);
        value /= 57;
    }
    digits.resize(SHORT_LEN, ALPHABET[0]);
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

fn decode_short(short: &str) -> Option<Uuid> {
    if short.len() != SHORT_LEN {
        return None;
    }
    let mut value: u128 = 0;
    for byte in short.bytes() {
        let digit = ALPHABET.iter().position(|&c| c == byte)? as u128;
        value = value.checked_mul(57)?.checked_add(digit)?;
    }
    Some(Uuid::from_u128(value))
}

/// Validate a user-supplied session id and normalise it to a full UUID.
///
/// Runs before any storage access so malformed ids fail fast.
pub fn resolve_session_id(raw: &str) -> Result<Uuid, WorkflowError> {
    let raw = raw.trim();
    if let Ok(id) = Uuid::parse_str(raw) {
        return Ok(id);
    }
    decode_short(raw).ok_or_else(|| WorkflowError::InvalidSessionId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_round_trip() {
        for _ in 0..50 {
            let id = Uuid::new_v4();
            let short = encode_short(&id);
            assert_eq!(short.len(), 22);
            assert_eq!(resolve_session_id(&short).unwrap(), id);
        }
    }

    #[test]
    fn test_extreme_values() {
        assert_eq!(encode_short(&Uuid::nil()), "2222222222222222222222");
        let max = Uuid::from_u128(u128::MAX);
        assert_eq!(resolve_session_id(&encode_short(&max)).unwrap(), max);
    }

    #[test]
    fn test_full_uuid_accepted() {
        let id = Uuid::new_v4();
        assert_eq!(resolve_session_id(&id.to_string()).unwrap(), id);
        assert_eq!(
            resolve_session_id(&format!("  {}  ", id)).unwrap(),
            id,
            "surrounding whitespace is ignored"
        );
    }

    #[test]
    fn test_malformed_ids_rejected() {
        for bad in [
            "",
            "../../etc/passwd",
            "not-a-session",
            // right length, '0' and 'l' are not in the alphabet
            "0222222222222222222222",
            "l222222222222222222222",
            // 23 characters
            "22222222222222222222222",
            // overflows 128 bits
            "zzzzzzzzzzzzzzzzzzzzzz",
        ] {
            assert!(
                matches!(
                    resolve_session_id(bad),
                    Err(WorkflowError::InvalidSessionId(_))
                ),
                "{:?} should be rejected",
                bad
            );
        }
    }
}
