use anyhow::Result;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Detached Ed25519 signature with the signer's public key embedded, so a
/// verifier needs nothing beyond the record itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSignature {
    pub signature: Vec<u8>,
    pub public_key: Vec<u8>,
    pub algorithm: String,
}

impl LedgerSignature {
    /// Hex rendering stored on work items and audit records.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.signature)
    }
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public_key: VerifyingKey,
    pub secret_key: SigningKey,
}

/// Signing engine holding one keypair per entity (worker, auditor, miner).
///
/// Constructed explicitly and passed to the services that need it; there is
/// no process-wide instance.
pub struct CryptoEngine {
    key_pairs: HashMap<String, KeyPair>,
}

impl CryptoEngine {
    pub fn new() -> Self {
        Self {
            key_pairs: HashMap::new(),
        }
    }

    /// Generate and register a keypair for an entity.
    pub fn generate_keypair(&mut self, entity_id: &str) -> Result<VerifyingKey> {
        let mut csprng = OsRng;
        let mut secret_bytes = [0u8; 32];
        csprng.fill_bytes(&mut secret_bytes);

        let secret_key = SigningKey::from_bytes(&secret_bytes);
        let public_key = secret_key.verifying_key();

        self.key_pairs.insert(
            entity_id.to_string(),
            KeyPair {
                public_key,
                secret_key,
            },
        );
        Ok(public_key)
    }

    pub fn has_keypair(&self, entity_id: &str) -> bool {
        self.key_pairs.contains_key(entity_id)
    }

    /// Get public key for an entity.
    pub fn get_public_key(&self, entity_id: &str) -> Option<VerifyingKey> {
        self.key_pairs.get(entity_id).map(|kp| kp.public_key)
    }

    /// Sign raw bytes with an entity's key.
    pub fn sign(&self, entity_id: &str, data: &[u8]) -> Result<LedgerSignature> {
        let key_pair = self
            .key_pairs
            .get(entity_id)
            .ok_or_else(|| anyhow::anyhow!("no key pair for entity: {}", entity_id))?;

        let signature = key_pair.secret_key.sign(data);
        Ok(LedgerSignature {
            signature: signature.to_bytes().to_vec(),
            public_key: key_pair.public_key.to_bytes().to_vec(),
            algorithm: "Ed25519".to_string(),
        })
    }

    /// Sign a message string (convenience wrapper).
    pub fn sign_message(&self, entity_id: &str, message: &str) -> Result<LedgerSignature> {
        self.sign(entity_id, message.as_bytes())
    }

    /// Verify a signature against the public key it carries.
    pub fn verify(&self, signature: &LedgerSignature, data: &[u8]) -> Result<bool> {
        let public_key_bytes: [u8; 32] = signature
            .public_key
            .clone()
            .try_into()
            .map_err(|_| anyhow::anyhow!("invalid public key length"))?;
        let public_key = VerifyingKey::from_bytes(&public_key_bytes)
            .map_err(|e| anyhow::anyhow!("invalid public key: {}", e))?;

        let signature_bytes: [u8; 64] = signature
            .signature
            .clone()
            .try_into()
            .map_err(|_| anyhow::anyhow!("invalid signature length"))?;
        let sig = Signature::from_bytes(&signature_bytes);

        Ok(public_key.verify(data, &sig).is_ok())
    }
}

impl Default for CryptoEngine {
    fn default() -> Self {
        Self::new()
    }
}
