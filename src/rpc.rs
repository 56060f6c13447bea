//! JSON-RPC client surface
//!
//! The core never opens sockets. A [`Transport`] carries JSON-RPC calls to a
//! node and hands back the `result` member of the reply; [`RpcClient`] layers
//! typed requests and replies on top of it. [`JsonRpcTransport`] does the
//! envelope work for any function that can post a request body and return
//! the response body.

use crate::config::{ClientConfig, TransactionEncoding};
use crate::error::{Result, TxWireError};
use crate::layout::LayoutRecord;
use crate::transaction::Transaction;
use crate::types::{BlockHash, PublicKey, Signature};
use log::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Methods this client knows how to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RpcMethod {
    GetLatestBlockhash,
    GetBalance,
    GetAccountInfo,
    RequestAirdrop,
    SendTransaction,
}

impl RpcMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetLatestBlockhash => "getLatestBlockhash",
            Self::GetBalance => "getBalance",
            Self::GetAccountInfo => "getAccountInfo",
            Self::RequestAirdrop => "requestAirdrop",
            Self::SendTransaction => "sendTransaction",
        }
    }
}

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: RpcMethod,
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: RpcMethod, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method,
            params,
        }
    }
}

/// The `error` member of a failed reply
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Pull the `result` member out of a reply body.
///
/// An `error` member becomes [`TxWireError::Rpc`]; a reply with neither
/// member is a [`TxWireError::ReplyError`].
pub fn parse_reply(body: &str) -> Result<Value> {
    let mut reply: Value = serde_json::from_str(body)?;
    if let Some(error) = reply.get("error") {
        let error: RpcErrorObject = serde_json::from_value(error.clone())?;
        return Err(TxWireError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    reply
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| TxWireError::ReplyError("reply has neither result nor error".to_string()))
}

/// Carries JSON-RPC calls to a node.
pub trait Transport {
    /// Run `method` with `params` and return the reply's `result` member.
    fn query(&self, method: RpcMethod, params: Value) -> Result<Value>;

    /// Submit signed wire bytes with the send options of `config`.
    fn submit(&self, raw: &[u8], config: &ClientConfig) -> Result<Value> {
        let params = json!([config.encoding.encode(raw), config.send_options()]);
        self.query(RpcMethod::SendTransaction, params)
    }
}

/// Frames requests for a `post` function that exchanges raw bodies
pub struct JsonRpcTransport<F> {
    post: F,
    next_id: AtomicU64,
}

impl<F> JsonRpcTransport<F>
where
    F: Fn(&str) -> Result<String>,
{
    pub fn new(post: F) -> Self {
        Self {
            post,
            next_id: AtomicU64::new(1),
        }
    }
}

impl<F> Transport for JsonRpcTransport<F>
where
    F: Fn(&str) -> Result<String>,
{
    fn query(&self, method: RpcMethod, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::to_string(&RpcRequest::new(id, method, params))
            .map_err(|e| TxWireError::EncodingError(e.to_string()))?;
        trace!("rpc request {}", body);

        let reply = (self.post)(&body)?;
        trace!("rpc reply {}", reply);
        parse_reply(&reply)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestBlockhash {
    pub blockhash: BlockHash,
    pub last_valid_block_height: u64,
}

/// Account state as returned by `getAccountInfo`, data already decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub lamports: u64,
    pub owner: PublicKey,
    pub executable: bool,
    pub rent_epoch: u64,
    pub space: u64,
    pub data: Vec<u8>,
}

impl AccountInfo {
    /// Interpret the account data as a layout record
    pub fn decode_data<R: LayoutRecord>(&self) -> Result<R> {
        R::decode(&self.data)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiAccount {
    data: (String, TransactionEncoding),
    executable: bool,
    lamports: u64,
    owner: PublicKey,
    rent_epoch: u64,
    #[serde(default)]
    space: Option<u64>,
}

impl TryFrom<UiAccount> for AccountInfo {
    type Error = TxWireError;

    fn try_from(account: UiAccount) -> Result<Self> {
        let (text, encoding) = account.data;
        let data = encoding.decode(&text)?;
        Ok(Self {
            lamports: account.lamports,
            owner: account.owner,
            executable: account.executable,
            rent_epoch: account.rent_epoch,
            space: account.space.unwrap_or(data.len() as u64),
            data,
        })
    }
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

fn from_result<T: DeserializeOwned>(result: Value) -> Result<T> {
    Ok(serde_json::from_value(result)?)
}

/// Typed calls over a [`Transport`]
pub struct RpcClient<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> RpcClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn get_latest_blockhash(&self) -> Result<LatestBlockhash> {
        let result = self
            .transport
            .query(RpcMethod::GetLatestBlockhash, json!([self.config.query_options()]))?;
        let latest: WithContext<LatestBlockhash> = from_result(result)?;
        debug!(
            "latest blockhash {} valid until height {}",
            latest.value.blockhash, latest.value.last_valid_block_height
        );
        Ok(latest.value)
    }

    pub fn get_balance(&self, address: &PublicKey) -> Result<u64> {
        let result = self.transport.query(
            RpcMethod::GetBalance,
            json!([address.to_string(), self.config.query_options()]),
        )?;
        let balance: WithContext<u64> = from_result(result)?;
        Ok(balance.value)
    }

    /// `None` when the account does not exist
    pub fn get_account_info(&self, address: &PublicKey) -> Result<Option<AccountInfo>> {
        let mut options = self.config.query_options();
        options["encoding"] = json!(TransactionEncoding::Base64);

        let result = self
            .transport
            .query(RpcMethod::GetAccountInfo, json!([address.to_string(), options]))?;
        let account: WithContext<Option<UiAccount>> = from_result(result)?;
        let account = account.value.map(AccountInfo::try_from).transpose()?;
        if let Some(info) = &account {
            debug!("account {} holds {} bytes", address, info.data.len());
        }
        Ok(account)
    }

    pub fn request_airdrop(&self, address: &PublicKey, lamports: u64) -> Result<Signature> {
        let options = json!({ "commitment": self.config.commitment });
        let result = self.transport.query(
            RpcMethod::RequestAirdrop,
            json!([address.to_string(), lamports, options]),
        )?;
        from_result(result)
    }

    pub fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        let raw = transaction.serialize()?;
        debug!("submitting {} byte transaction", raw.len());
        let signature: Signature = from_result(self.transport.submit(&raw, &self.config)?)?;
        if transaction.signatures.first() != Some(&signature) {
            warn!("node returned signature {} for a different transaction", signature);
        }
        Ok(signature)
    }
}
