//! Scripted doubles for the wallet and the RPC node
//!
//! Enabled for this crate's tests and, through the `testing` feature, for
//! downstream crates that drive a [`FloorClient`](crate::FloorClient).

use crate::abi::{self, RawFloor};
use crate::rpc::LedgerTransport;
use crate::signer::{SignerError, TransactionRequest, WalletSigner};
use crate::{Error, Result};
use async_trait::async_trait;
use ethereum_types::U256;
use parking_lot::Mutex;
use serde_json::{json, Value};
use skyblocks_config::ChainParams;
use skyblocks_core::TxHash;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Wallet double with a settable network and queued send outcomes
pub struct ScriptedSigner {
    chain_id: Mutex<std::result::Result<u64, String>>,
    outcomes: Mutex<VecDeque<std::result::Result<TxHash, SignerError>>>,
    sent: Mutex<Vec<TransactionRequest>>,
    switch_requests: Mutex<Vec<ChainParams>>,
    reject_switch: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedSigner {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id: Mutex::new(Ok(chain_id)),
            outcomes: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            switch_requests: Mutex::new(Vec::new()),
            reject_switch: AtomicBool::new(false),
            gate: Mutex::new(None),
        }
    }

    /// Simulate the holder switching networks in the wallet
    pub fn set_chain_id(&self, chain_id: u64) {
        *self.chain_id.lock() = Ok(chain_id);
    }

    pub fn fail_chain_id(&self, reason: &str) {
        *self.chain_id.lock() = Err(reason.to_string());
    }

    /// Outcome for the next `send_transaction`. Unscripted sends succeed.
    pub fn push_outcome(&self, outcome: std::result::Result<TxHash, SignerError>) {
        self.outcomes.lock().push_back(outcome);
    }

    pub fn reject_switch(&self) {
        self.reject_switch.store(true, Ordering::SeqCst);
    }

    /// Hold every send until the returned handle is notified, like a holder
    /// sitting on the approval prompt
    pub fn hold_approval(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock() = Some(notify.clone());
        notify
    }

    /// Requests the wallet was asked to sign, in order
    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().clone()
    }

    pub fn switch_requests(&self) -> Vec<ChainParams> {
        self.switch_requests.lock().clone()
    }
}

#[async_trait]
impl WalletSigner for ScriptedSigner {
    async fn chain_id(&self) -> std::result::Result<u64, SignerError> {
        self.chain_id.lock().clone().map_err(SignerError::Unavailable)
    }

    async fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> std::result::Result<TxHash, SignerError> {
        let count = {
            let mut sent = self.sent.lock();
            sent.push(tx);
            sent.len() as u64
        };
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(TxHash::from_low_u64_be(count)))
    }

    async fn switch_chain(&self, params: &ChainParams) -> std::result::Result<(), SignerError> {
        if self.reject_switch.load(Ordering::SeqCst) {
            return Err(SignerError::Rejected);
        }
        self.switch_requests.lock().push(params.clone());
        let chain = u64::from_str_radix(params.chain_id.trim_start_matches("0x"), 16)
            .map_err(|e| SignerError::Other(e.to_string()))?;
        self.set_chain_id(chain);
        Ok(())
    }
}

/// What the scripted node says about sent transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptScript {
    Success,
    Reverted,
    /// Never included
    Pending,
}

type Handler = dyn Fn(&str, &Value) -> Result<Value> + Send + Sync;

/// RPC node double answering from a closure, recording every method called
pub struct ScriptedTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(handler: impl Fn(&str, &Value) -> Result<Value> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Node hosting a floor contract with the given history and cost
    pub fn ledger(floors: Vec<RawFloor>, cost: U256, receipts: ReceiptScript) -> Self {
        let floors_hex = format!("0x{}", hex::encode(abi::encode_floors(&floors)));
        let cost_hex = format!("0x{}", hex::encode(abi::uint_word(cost)));
        let get_all = format!("0x{}", hex::encode(abi::selector(abi::GET_ALL_FLOORS)));
        let cost_sel = format!("0x{}", hex::encode(abi::selector(abi::COST)));

        Self::new(move |method, params| match method {
            "eth_call" => {
                let data = params[0]["data"].as_str().unwrap_or_default();
                if data == get_all {
                    Ok(json!(floors_hex))
                } else if data == cost_sel {
                    Ok(json!(cost_hex))
                } else {
                    Err(Error::Rpc { code: 3, message: "execution reverted".into() })
                }
            }
            "eth_getTransactionReceipt" => {
                let status = match receipts {
                    ReceiptScript::Pending => return Ok(Value::Null),
                    ReceiptScript::Success => "0x1",
                    ReceiptScript::Reverted => "0x0",
                };
                Ok(json!({
                    "transactionHash": params[0].clone(),
                    "blockNumber": "0x2a",
                    "status": status,
                    "gasUsed": "0x1d4c0",
                }))
            }
            other => Err(Error::Rpc { code: -32601, message: format!("method {other} not found") }),
        })
    }

    /// Node that cannot be reached at all
    pub fn unreachable() -> Self {
        Self::new(|_, _| Err(Error::NetworkFetch("connection refused".into())))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl LedgerTransport for ScriptedTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.calls.lock().push(method.to_string());
        (self.handler)(method, &params)
    }
}
