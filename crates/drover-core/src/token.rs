//! Tracking token codec.
//!
//! A token is a signed, self-contained encoding of a recipient identity,
//! carried in public open/click URLs: `base64url(id) + "." + base64url(mac)`,
//! unpadded, where `mac = HMAC-SHA256(secret, id)`. Tokens stay valid as
//! long as the signing secret is unchanged.
//!
//! Verification returns `None` on *any* failure — malformed input, decode
//! error, missing secret, MAC mismatch. Tracking endpoints must always
//! render a pixel or redirect regardless of token validity, so there is
//! nothing useful to propagate.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies tracking tokens with an explicit server secret.
#[derive(Clone)]
pub struct TokenCodec {
  secret: Vec<u8>,
}

impl TokenCodec {
  pub fn new(secret: impl Into<String>) -> Self {
    Self { secret: secret.into().into_bytes() }
  }

  /// Sign an identifier. Errors only when the secret is unconfigured.
  pub fn sign(&self, id: &str) -> Result<String> {
    if self.secret.is_empty() {
      return Err(Error::MissingTrackingSecret);
    }
    let mac = self.mac_over(id.as_bytes());
    Ok(format!("{}.{}", B64.encode(id.as_bytes()), B64.encode(mac)))
  }

  /// Verify a token and return the identifier it carries, or `None`.
  pub fn verify(&self, token: &str) -> Option<String> {
    if self.secret.is_empty() {
      return None;
    }
    let (payload_b64, sig_b64) = token.split_once('.')?;
    let payload = B64.decode(payload_b64).ok()?;
    let sig     = B64.decode(sig_b64).ok()?;
    let id      = String::from_utf8(payload).ok()?;

    // Mac::verify_slice is constant-time.
    let mut mac = HmacSha256::new_from_slice(&self.secret)
      .expect("HMAC accepts any key length");
    mac.update(id.as_bytes());
    mac.verify_slice(&sig).ok()?;

    Some(id)
  }

  fn mac_over(&self, payload: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(&self.secret)
      .expect("HMAC accepts any key length");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
  }
}
