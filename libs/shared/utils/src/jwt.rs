use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use tracing::debug;

use shared_models::auth::JwtClaims;

/// Reads the claims section of a JWT without verifying the signature.
///
/// The portal API is the only party that can verify tokens; the client only
/// needs `exp` to avoid sending a token it already knows is dead.
pub fn decode_claims(token: &str) -> Result<JwtClaims, String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(parts[1].trim_end_matches('=')) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    serde_json::from_str(&claims_json).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        "Invalid claims format".to_string()
    })
}

/// `true` only when the token is a readable JWT whose `exp` has passed.
/// Opaque tokens are left for the server to judge.
pub fn is_token_expired(token: &str, now: DateTime<Utc>) -> bool {
    match decode_claims(token) {
        Ok(claims) => {
            let expired = claims.is_expired_at(now);
            if expired {
                debug!("Token for {} expired at {:?}", claims.sub, claims.exp);
            }
            expired
        }
        Err(_) => false,
    }
}
