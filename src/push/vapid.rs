use base64::{URL_SAFE_NO_PAD, encode_config};
use jwt_simple::prelude::ES256KeyPair;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::types::push::VapidConfig;

#[derive(Debug, Clone)]
pub struct VapidCredentials {
    pub private_key: String,
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VapidConfigStatus {
    Missing,
    /// Some keys were given but not both.
    Incomplete,
    Ready(VapidConfig),
}

/// Blank values count as absent.
pub fn load_vapid_config(
    private_key: Option<&str>,
    public_key: Option<&str>,
    subject: &str,
) -> VapidConfigStatus {
    let private_key = private_key.map(str::trim).filter(|key| !key.is_empty());
    let public_key = public_key.map(str::trim).filter(|key| !key.is_empty());

    match (private_key, public_key) {
        (Some(private_key), Some(public_key)) => VapidConfigStatus::Ready(VapidConfig {
            private_key: private_key.to_string(),
            public_key: public_key.to_string(),
            subject: subject.trim().to_string(),
        }),
        (None, None) => VapidConfigStatus::Missing,
        _ => VapidConfigStatus::Incomplete,
    }
}

pub fn generate_vapid_credentials() -> Result<VapidCredentials, web_push::WebPushError> {
    let mut rng = OsRng;
    generate_vapid_credentials_with_rng(&mut rng)
}

pub(crate) fn generate_vapid_credentials_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<VapidCredentials, web_push::WebPushError> {
    let key_pair = generate_es256_keypair_with_rng(rng);
    let private_key = encode_config(key_pair.to_bytes(), URL_SAFE_NO_PAD);
    let public_key =
        web_push::VapidSignatureBuilder::from_base64_no_sub(&private_key, URL_SAFE_NO_PAD)?
            .get_public_key();
    let public_key = encode_config(public_key, URL_SAFE_NO_PAD);

    Ok(VapidCredentials {
        private_key,
        public_key,
    })
}

fn generate_es256_keypair_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> ES256KeyPair {
    let mut key_bytes = [0u8; 32];
    loop {
        rng.fill_bytes(&mut key_bytes);
        if let Ok(key_pair) = ES256KeyPair::from_bytes(&key_bytes) {
            return key_pair;
        }
    }
}
