//! End-to-end reward pipeline scenarios, chained the way the detection
//! handler chains them: inference result -> reward decision -> alert
//! decision -> chain submission outcome.

use axum::routing::post;
use axum::{Json, Router};
use ethers::providers::{Http, Provider};
use ethers::types::{Address, U256};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use agroai_backend::config::Config;
use agroai_backend::ipfs;
use agroai_backend::rewards::{calculate_token_reward, evaluate_community_alert, Confidence};
use agroai_backend::web3::nonce::NonceAllocator;
use agroai_backend::web3::{ChainError, ChainService, TransactionOutcome};

fn pct(value: f64) -> Confidence {
    Confidence::from_raw(value).unwrap()
}

#[test]
fn severe_late_blight_pays_early_detection_and_alerts() {
    let confidence = pct(95.0);
    let reward = calculate_token_reward("Tomato Late Blight", confidence);
    assert_eq!(reward.base_reward, 5);
    assert_eq!(reward.bonus_reward, 200);
    assert_eq!(reward.total_reward, 205);
    assert!(reward.is_early_detection);

    let alert = evaluate_community_alert("Tomato Late Blight", confidence, 0.85, "Oregon");
    assert!(alert.should_alert);
    assert_eq!(alert.severity, 3);
    assert_eq!(alert.location, "Oregon");
}

#[test]
fn healthy_plant_pays_small_bonus_and_never_alerts() {
    let confidence = pct(98.0);
    let reward = calculate_token_reward("Healthy", confidence);
    assert_eq!(reward.total_reward, 25);
    assert!(!reward.is_early_detection);

    let alert = evaluate_community_alert("Healthy", confidence, 0.0, "Oregon");
    assert!(!alert.should_alert);
}

#[test]
fn classifier_fraction_and_client_percent_agree() {
    // The model emits 0.95; a client-submitted value arrives as 95.0.
    // Both must land on the same reward band.
    let from_model = calculate_token_reward("Late Blight", pct(0.95));
    let from_client = calculate_token_reward("Late Blight", pct(95.0));
    assert_eq!(from_model, from_client);
}

#[tokio::test]
async fn concurrent_submissions_reserve_distinct_nonces() {
    let allocator = Arc::new(NonceAllocator::with_start(Address::zero(), U256::from(100)));
    // The seeded allocator never touches the node.
    let node = Arc::new(Provider::<Http>::try_from("http://127.0.0.1:1").unwrap());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let allocator = allocator.clone();
        let node = node.clone();
        handles.push(tokio::spawn(async move {
            allocator.reserve(node.as_ref()).await.unwrap()
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        let nonce = handle.await.unwrap();
        assert!(seen.insert(nonce), "nonce {nonce} handed out twice");
    }
    assert_eq!(seen.len(), 16);
    for n in 100u64..116 {
        assert!(seen.contains(&U256::from(n)));
    }
}

/// Minimal JSON-RPC node: accepts the broadcast but never produces a
/// receipt, so the submission path has to give up on its own clock.
async fn receiptless_rpc(Json(request): Json<Value>) -> Json<Value> {
    let result = match request["method"].as_str().unwrap_or("") {
        "eth_chainId" => json!("0x1"),
        "eth_blockNumber" => json!("0x1"),
        "eth_estimateGas" => json!("0x5208"),
        "eth_getTransactionCount" => json!("0x0"),
        "eth_sendRawTransaction" => {
            json!("0x1111111111111111111111111111111111111111111111111111111111111111")
        }
        "eth_getTransactionReceipt" => Value::Null,
        _ => Value::Null,
    };
    Json(json!({ "jsonrpc": "2.0", "id": request["id"], "result": result }))
}

async fn spawn_receiptless_node() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/", post(receiptless_rpc));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn receipt_that_never_arrives_times_out_into_failed_outcome() {
    let addr = spawn_receiptless_node().await;

    let mut config = Config::default();
    config.web3.rpc_url = format!("http://{addr}");
    config.web3.private_key =
        "0x0000000000000000000000000000000000000000000000000000000000000001".to_string();
    config.web3.confirmation_timeout_secs = 1;
    config.contracts.agro_token = "0x1000000000000000000000000000000000000001".to_string();
    config.contracts.agro_core = "0x1000000000000000000000000000000000000002".to_string();

    let chain = ChainService::connect(&config).await.unwrap();
    let outcome = chain.reward_photo_upload(Address::zero()).await;

    assert!(!outcome.success);
    assert!(outcome.transaction_hash.is_none());
    let message = outcome.error.unwrap();
    assert!(message.contains("unknown"), "unexpected error: {message}");
}

#[test]
fn chain_failure_becomes_a_failed_outcome_in_the_response() {
    // The handler embeds outcomes in a 200 body; a timeout must therefore
    // serialize as a failed outcome, not bubble up as an HTTP error.
    let outcome = TransactionOutcome::failed(&ChainError::ConfirmationTimeout(120));
    assert!(!outcome.success);
    assert!(outcome.transaction_hash.is_none());

    let body = serde_json::to_value(&outcome).unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("120"));
}

#[test]
fn ipfs_fallback_hash_is_stable_across_the_flow() {
    let photo = b"raw jpeg bytes";
    let first = ipfs::fallback_hash(photo);
    let second = ipfs::fallback_hash(photo);
    assert_eq!(first, second);
    assert!(first.starts_with("Qm"));
    assert_eq!(first.len(), 46);
}
