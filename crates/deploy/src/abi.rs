//! Hand-rolled ABI encoding for the handful of static calls this tool makes.
//!
//! Every parameter the Raffle and mock-coordinator interfaces use is a static
//! type (addresses, unsigned integers, bytes32), so encoding is a 4-byte
//! selector followed by left-padded 32-byte words. Dynamic types are out of
//! scope.

use alloy_core::primitives::{Address, B256, U256, keccak256};

/// A single statically-encoded ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `address`, left-padded to 32 bytes.
    Address(Address),
    /// Any `uintN` up to 256 bits, big-endian in a 32-byte word.
    Uint(U256),
    /// `bytes32`, stored as-is.
    FixedBytes(B256),
}

impl Token {
    /// Encode this token into its 32-byte ABI word.
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        match self {
            Token::Address(addr) => word[12..].copy_from_slice(addr.as_slice()),
            Token::Uint(value) => word.copy_from_slice(&value.to_be_bytes::<32>()),
            Token::FixedBytes(bytes) => word.copy_from_slice(bytes.as_slice()),
        }
        word
    }
}

impl From<Address> for Token {
    fn from(addr: Address) -> Self {
        Token::Address(addr)
    }
}

impl From<U256> for Token {
    fn from(value: U256) -> Self {
        Token::Uint(value)
    }
}

impl From<B256> for Token {
    fn from(bytes: B256) -> Self {
        Token::FixedBytes(bytes)
    }
}

/// Compute the 4-byte function selector for a canonical signature,
/// e.g. `"addConsumer(uint64,address)"`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encode a sequence of static tokens (no selector). Used for constructor
/// arguments, which are appended raw to the creation bytecode.
pub fn encode_tokens(tokens: &[Token]) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(tokens.len() * 32);
    for token in tokens {
        encoded.extend_from_slice(&token.to_word());
    }
    encoded
}

/// Encode a full call: selector of `signature` followed by the argument words.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + tokens.len() * 32);
    data.extend_from_slice(&selector(signature));
    data.extend_from_slice(&encode_tokens(tokens));
    data
}

/// Compute the topic hash of an event signature,
/// e.g. `"SubscriptionCreated(uint64,address)"`.
pub fn event_topic(signature: &str) -> B256 {
    keccak256(signature.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::address;

    #[test]
    fn test_known_selectors() {
        // Documented VRFCoordinatorV2 selectors.
        assert_eq!(hex::encode(selector("createSubscription()")), "a21a23e4");
        assert_eq!(hex::encode(selector("addConsumer(uint64,address)")), "7341c10c");
        // The classic ERC-20 transfer selector as a sanity anchor.
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
    }

    #[test]
    fn test_address_word_is_left_padded() {
        let token = Token::Address(address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"));
        let word = token.to_word();
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(
            hex::encode(word),
            "00000000000000000000000070997970c51812dc3a010c7d01b50e0d17dc79c8"
        );
    }

    #[test]
    fn test_uint_word() {
        let token = Token::Uint(U256::from(1_000_000_000_000_000_000u128));
        assert_eq!(
            hex::encode(token.to_word()),
            "0000000000000000000000000000000000000000000000000de0b6b3a7640000"
        );
    }

    #[test]
    fn test_fixed_bytes_word_is_verbatim() {
        let lane = B256::repeat_byte(0xab);
        assert_eq!(Token::FixedBytes(lane).to_word(), [0xab; 32]);
    }

    #[test]
    fn test_encode_call_layout() {
        let data = encode_call(
            "addConsumer(uint64,address)",
            &[
                Token::Uint(U256::from(1u64)),
                Token::Address(address!("70997970C51812dc3A010C7d01b50e0d17dc79C8")),
            ],
        );

        // Selector + 2 words.
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(hex::encode(&data[..4]), "7341c10c");
        assert_eq!(
            hex::encode(&data[4..36]),
            "0000000000000000000000000000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_encode_tokens_empty() {
        assert!(encode_tokens(&[]).is_empty());
        assert_eq!(encode_call("createSubscription()", &[]).len(), 4);
    }
}
