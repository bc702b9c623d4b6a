//! Legacy (EIP-155) transaction building, RLP encoding, and local signing.
//!
//! Only the pre-EIP-1559 transaction format is implemented: every node this
//! tool targets (Anvil, Hardhat, public Sepolia endpoints) accepts it, and it
//! keeps the gas handling to a single price field.

use alloy_core::primitives::{Address, B256, U256, keccak256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};

/// An unsigned legacy transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
}

impl LegacyTransaction {
    /// The EIP-155 signing hash: keccak of the RLP list with the chain ID in
    /// place of `v` and empty `r`/`s`.
    pub fn signing_hash(&self, chain_id: u64) -> B256 {
        let payload = rlp::list(&[
            rlp::uint(self.nonce as u128),
            rlp::uint(self.gas_price),
            rlp::uint(self.gas_limit as u128),
            self.encode_to(),
            rlp::uint_256(self.value),
            rlp::bytes(&self.data),
            rlp::uint(chain_id as u128),
            rlp::uint(0),
            rlp::uint(0),
        ]);
        keccak256(&payload)
    }

    /// Sign with a local key and return the raw transaction bytes ready for
    /// `eth_sendRawTransaction`.
    pub fn sign(&self, chain_id: u64, signer: &PrivateKeySigner) -> Result<Vec<u8>> {
        let hash = self.signing_hash(chain_id);
        let signature = signer
            .sign_hash_sync(&hash)
            .context("Failed to sign transaction hash")?;

        // EIP-155 v encodes the chain ID alongside the recovery parity.
        let parity = u64::from(signature.v());
        let v = chain_id * 2 + 35 + parity;

        Ok(rlp::list(&[
            rlp::uint(self.nonce as u128),
            rlp::uint(self.gas_price),
            rlp::uint(self.gas_limit as u128),
            self.encode_to(),
            rlp::uint_256(self.value),
            rlp::bytes(&self.data),
            rlp::uint(v as u128),
            rlp::uint_256(signature.r()),
            rlp::uint_256(signature.s()),
        ]))
    }

    fn encode_to(&self) -> Vec<u8> {
        match self.to {
            Some(addr) => rlp::bytes(addr.as_slice()),
            None => rlp::bytes(&[]),
        }
    }
}

/// Minimal RLP encoding, covering exactly what a legacy transaction needs:
/// byte strings and flat lists of pre-encoded items.
pub mod rlp {
    use alloy_core::primitives::U256;

    /// Encode a byte string.
    pub fn bytes(data: &[u8]) -> Vec<u8> {
        match data.len() {
            1 if data[0] < 0x80 => vec![data[0]],
            len if len <= 55 => {
                let mut out = Vec::with_capacity(1 + len);
                out.push(0x80 + len as u8);
                out.extend_from_slice(data);
                out
            }
            len => {
                let len_bytes = trimmed_be(len as u128);
                let mut out = Vec::with_capacity(1 + len_bytes.len() + len);
                out.push(0xb7 + len_bytes.len() as u8);
                out.extend_from_slice(&len_bytes);
                out.extend_from_slice(data);
                out
            }
        }
    }

    /// Encode an unsigned integer as a minimal big-endian byte string.
    pub fn uint(value: u128) -> Vec<u8> {
        bytes(&trimmed_be(value))
    }

    /// Encode a 256-bit unsigned integer.
    pub fn uint_256(value: U256) -> Vec<u8> {
        bytes(&value.to_be_bytes_trimmed_vec())
    }

    /// Encode a list from already-encoded items.
    pub fn list(items: &[Vec<u8>]) -> Vec<u8> {
        let payload_len: usize = items.iter().map(Vec::len).sum();
        let mut out = Vec::with_capacity(1 + 8 + payload_len);
        if payload_len <= 55 {
            out.push(0xc0 + payload_len as u8);
        } else {
            let len_bytes = trimmed_be(payload_len as u128);
            out.push(0xf7 + len_bytes.len() as u8);
            out.extend_from_slice(&len_bytes);
        }
        for item in items {
            out.extend_from_slice(item);
        }
        out
    }

    /// Big-endian bytes with leading zeros stripped. Zero encodes as empty.
    fn trimmed_be(value: u128) -> Vec<u8> {
        let be = value.to_be_bytes();
        let first = be.iter().position(|b| *b != 0).unwrap_or(be.len());
        be[first..].to_vec()
    }
}
