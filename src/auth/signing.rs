//! Signing key provider for identity assertions.
//!
//! Holds one RSA keypair. The private half signs ID tokens (RS256); the public
//! half is exposed as a JWK set for verifiers.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{IdentityError, Result};

/// Public RSA key in JWK form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: String,
    pub alg: String,
    #[serde(rename = "use")]
    pub use_: String,
    pub n: String,
    pub e: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

#[derive(Clone)]
pub struct SigningKeyProvider {
    key_id: String,
    encoding_key: EncodingKey,
    public_key: RsaPublicKey,
}

impl std::fmt::Debug for SigningKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyProvider")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl SigningKeyProvider {
    /// Generate a fresh keypair. Slow for production key sizes; call it from
    /// a blocking context.
    pub fn generate(bits: usize) -> Result<Self> {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), bits)?;
        Self::from_private_key(&private_key, Uuid::new_v4().to_string())
    }

    pub fn from_private_key(private_key: &RsaPrivateKey, key_id: impl Into<String>) -> Result<Self> {
        let pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| {
                IdentityError::server_error_with_source(
                    "RSA私钥编码失败",
                    anyhow::anyhow!("pkcs1 encoding failed: {e}"),
                )
            })?;
        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes())?;

        Ok(Self {
            key_id: key_id.into(),
            encoding_key,
            public_key: private_key.to_public_key(),
        })
    }

    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        Algorithm::RS256
    }

    #[must_use]
    pub fn signature_algorithms(&self) -> Vec<Algorithm> {
        vec![self.algorithm()]
    }

    #[must_use]
    pub fn public_jwk(&self) -> Jwk {
        Jwk {
            kty: "RSA".to_string(),
            kid: self.key_id.clone(),
            alg: "RS256".to_string(),
            use_: "sig".to_string(),
            n: URL_SAFE_NO_PAD.encode(self.public_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(self.public_key.e().to_bytes_be()),
        }
    }

    /// Current public keys. A single key, no rotation.
    #[must_use]
    pub fn key_set(&self) -> JwkSet {
        JwkSet {
            keys: vec![self.public_jwk()],
        }
    }

    /// Verification key built from the public half, as a verifier would.
    pub fn decoding_key(&self) -> Result<DecodingKey> {
        let jwk = self.public_jwk();
        Ok(DecodingKey::from_rsa_components(&jwk.n, &jwk.e)?)
    }

    /// Sign `claims` as a compact JWS carrying this key's `kid`.
    pub fn sign_claims<T: Serialize>(&self, claims: &T) -> Result<String> {
        let mut header = Header::new(self.algorithm());
        header.kid = Some(self.key_id.clone());
        Ok(jsonwebtoken::encode(&header, claims, &self.encoding_key)?)
    }
}
