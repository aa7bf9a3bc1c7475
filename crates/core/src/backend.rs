use crate::error::AutomationError;
use crate::types::vault::RootAccountData;
use alloy::primitives::Address;
use async_trait::async_trait;
use eyre::Result;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Access and refresh token issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    access_token: String,
    refresh_token: String,
}

impl KeyPair {
    pub fn new(access_token: String, refresh_token: String) -> Result<Self> {
        if access_token.len() < refresh_token.len() {
            return Err(AutomationError::InvalidTokens.into());
        }
        Ok(Self {
            access_token,
            refresh_token,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationData {
    pub access_token: String,
    pub refresh_token: String,
    pub full_user_data: RootAccountData,
}

/// Backend endpoints the sdk talks to. `None` means the backend answered with an error body.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Message the wallet signs to authenticate.
    async fn nonce(&self, wallet: Address) -> Result<Option<String>>;

    async fn verify_signature(
        &self,
        signature: &str,
        wallet: Address,
    ) -> Result<Option<AuthenticationData>>;

    async fn refresh_token(&self, key_pair: &KeyPair) -> Result<Option<AuthenticationData>>;

    /// Records a deployed vault for the account. Returns false if the backend refused it.
    async fn link_vault(
        &self,
        chain_id: u64,
        account: Address,
        vault: Address,
        access_token: &str,
    ) -> Result<bool>;

    async fn account_data(&self, access_token: &str) -> Result<Option<RootAccountData>>;
}

pub struct HttpBackend {
    client: Client,
    url: String,
}

impl HttpBackend {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into().trim_end_matches('/').to_string(),
        }
    }

    fn get(&self, path: &str, access_token: Option<&str>) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.url, path))
            .header("Authorization", access_token.unwrap_or_default())
    }

    fn post(&self, path: &str, body: &Value, access_token: Option<&str>) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.url, path))
            .header("Authorization", access_token.unwrap_or_default())
            .json(body)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<Option<T>> {
        let response = request.send().await?;
        let body = response.json::<Value>().await?;
        parse_body(body)
    }
}

/// Error bodies carry a `statusCode`; everything else is the payload.
fn parse_body<T: DeserializeOwned>(body: Value) -> Result<Option<T>> {
    if let Some(status) = body.get("statusCode") {
        warn!("Backend returned status {}", status);
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(body)?))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn nonce(&self, wallet: Address) -> Result<Option<String>> {
        #[derive(Deserialize)]
        struct Nonce {
            nonce: Option<String>,
        }

        let request = self.get(&format!("/authentication/nonce?walletAddress={wallet}"), None);
        let nonce: Option<Nonce> = Self::send(request).await?;
        Ok(nonce.and_then(|n| n.nonce))
    }

    async fn verify_signature(
        &self,
        signature: &str,
        wallet: Address,
    ) -> Result<Option<AuthenticationData>> {
        let body = json!({
            "signature": signature,
            "walletAddress": wallet,
        });
        Self::send(self.post("/authentication/verify", &body, None)).await
    }

    async fn refresh_token(&self, key_pair: &KeyPair) -> Result<Option<AuthenticationData>> {
        let body = json!({ "refreshToken": key_pair.refresh_token() });
        Self::send(self.post(
            "/authentication/refresh",
            &body,
            Some(key_pair.access_token()),
        ))
        .await
    }

    async fn link_vault(
        &self,
        chain_id: u64,
        account: Address,
        vault: Address,
        access_token: &str,
    ) -> Result<bool> {
        debug!("Linking vault {} on chain {}", vault, chain_id);
        let body = json!({
            "chainId": chain_id,
            "vaultAddress": vault,
            "accountAddress": account,
        });
        let linked: Option<Value> =
            Self::send(self.post("/vault/add-deployed", &body, Some(access_token))).await?;
        Ok(linked.is_some())
    }

    async fn account_data(&self, access_token: &str) -> Result<Option<RootAccountData>> {
        Self::send(self.get("/user/full-data", Some(access_token))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_pair_rejects_short_access_token() {
        let err = KeyPair::new("short".into(), "much longer refresh".into()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AutomationError>(),
            Some(&AutomationError::InvalidTokens)
        );
        assert!(KeyPair::new("access.token.jwt".into(), "refresh".into()).is_ok());
    }

    #[test]
    fn status_code_body_is_no_data() {
        let body = json!({ "statusCode": 401, "message": "Unauthorized" });
        let parsed: Option<RootAccountData> = parse_body(body).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn authentication_body_is_parsed() {
        let body = json!({
            "accessToken": "aaaa",
            "refreshToken": "bb",
            "fullUserData": { "id": "root", "accounts": [] }
        });
        let parsed: Option<AuthenticationData> = parse_body(body).unwrap();
        let data = parsed.unwrap();
        assert_eq!(data.access_token, "aaaa");
        assert!(data.full_user_data.accounts.is_empty());
    }
}
