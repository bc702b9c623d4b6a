//! Shared JSON-RPC utilities for talking to an Ethereum node.

use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Default timeout for a single RPC request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default interval between polling attempts when waiting on a condition.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// Returns an error if the request failed, the node returned an `error`
/// object, or the `result` field could not be deserialized.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, anyhow::Error> {
    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let result: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", method))?;

    if let Some(error) = result.get("error") {
        anyhow::bail!(
            "RPC error from {}: {}",
            method,
            error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
        );
    }

    let result_value = result
        .get("result")
        .context("No result in response")?
        .clone();

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

/// Parse a `0x`-prefixed hex quantity (as returned by the JSON-RPC quantity
/// encoding) into a u64.
pub fn parse_quantity(hex_quantity: &str) -> Result<u64, anyhow::Error> {
    let digits = hex_quantity.trim_start_matches("0x");
    u64::from_str_radix(digits, 16)
        .with_context(|| format!("Invalid hex quantity: {}", hex_quantity))
}

/// Format a u64 as a JSON-RPC hex quantity.
pub fn to_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Wait for a condition by repeatedly calling a check function.
///
/// Returns `Ok(())` once the check passes, or an error after `timeout_secs`.
pub async fn wait_until_ready<F, Fut>(
    name: &str,
    timeout_secs: u64,
    check_fn: F,
) -> Result<(), anyhow::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<(), anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let max_duration = Duration::from_secs(timeout_secs);

    loop {
        if start.elapsed() > max_duration {
            anyhow::bail!("Timeout waiting for {}", name);
        }

        match check_fn().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::trace!(error = %e, target = %name, "Check failed, retrying...");
            }
        }

        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x10").unwrap(), 16);
        assert_eq!(parse_quantity("0xaa36a7").unwrap(), 11155111);
        // Missing prefix is still accepted as bare hex
        assert_eq!(parse_quantity("ff").unwrap(), 255);
        assert!(parse_quantity("0xzz").is_err());
        assert!(parse_quantity("").is_err());
    }

    #[test]
    fn test_to_quantity() {
        assert_eq!(to_quantity(0), "0x0");
        assert_eq!(to_quantity(16), "0x10");
        assert_eq!(to_quantity(11155111), "0xaa36a7");
    }

    #[test]
    fn test_quantity_round_trip() {
        for value in [0u64, 1, 31337, 11155111, u64::MAX] {
            assert_eq!(parse_quantity(&to_quantity(value)).unwrap(), value);
        }
    }
}
