use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::header::CONTENT_LENGTH;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use url::Url;

use crate::crypto::SecretKey;
use crate::linked_data::Cid;

use super::{ObjectStore, StorageError};

const CHALLENGE_ENDPOINT: &str = "s5/account/login/challenge";
const LOGIN_ENDPOINT: &str = "s5/account/login";
const UPLOAD_ENDPOINT: &str = "s5/upload";

#[derive(Debug, Deserialize)]
struct ChallengeResponse {
    challenge: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "pubKey")]
    pub_key: String,
    challenge: &'a str,
    signature: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    cid: String,
}

/// Client for a storage portal's account and upload API.
///
/// Authentication is a challenge/response: the portal hands out a nonce,
/// we sign it with the portal private key and trade the signature for a
/// bearer token used on every upload.
#[derive(Debug)]
pub struct PortalClient {
    base: Url,
    key: SecretKey,
    http: reqwest::Client,
    token: Mutex<Option<String>>,
}

impl PortalClient {
    pub fn new(base: Url, key: SecretKey) -> Self {
        Self {
            base,
            key,
            http: reqwest::Client::new(),
            token: Mutex::new(None),
        }
    }

    /// Establish a portal session for the configured key.
    pub async fn login(&self) -> Result<(), StorageError> {
        let pub_key = format!("ed25519:{}", self.key.public().to_hex());

        let challenge_url = self.base.join(CHALLENGE_ENDPOINT)?;
        tracing::debug!("requesting login challenge from {}", challenge_url);
        let response = self
            .http
            .get(challenge_url)
            .query(&[("pubKey", pub_key.as_str())])
            .send()
            .await?;
        let response = Self::check(response).await?;
        let ChallengeResponse { challenge } = response.json().await?;

        let (_, challenge_bytes) = multibase::decode(&challenge)
            .map_err(|e| StorageError::Auth(format!("undecodable challenge: {}", e)))?;
        let signature = self.key.sign(&challenge_bytes);

        let login_url = self.base.join(LOGIN_ENDPOINT)?;
        let response = self
            .http
            .post(login_url)
            .json(&LoginRequest {
                pub_key,
                challenge: &challenge,
                signature: hex::encode(signature.to_bytes()),
            })
            .send()
            .await?;
        let response = Self::check(response).await?;
        let LoginResponse { token } = response.json().await?;

        tracing::debug!("portal session established with {}", self.base);
        *self.token.lock() = Some(token);
        Ok(())
    }

    fn bearer(&self) -> Result<String, StorageError> {
        self.token
            .lock()
            .clone()
            .ok_or_else(|| StorageError::Auth("login required before upload".to_string()))
    }

    async fn upload(
        &self,
        body: reqwest::Body,
        declared_len: Option<u64>,
    ) -> Result<Cid, StorageError> {
        let url = self.base.join(UPLOAD_ENDPOINT)?;
        let mut request = self.http.post(url).bearer_auth(self.bearer()?).body(body);
        if let Some(len) = declared_len {
            request = request.header(CONTENT_LENGTH, len);
        }

        let response = Self::check(request.send().await?).await?;
        let UploadResponse { cid } = response.json().await?;
        Ok(cid.parse()?)
    }

    /// Map a non-success response to [`StorageError::Rejected`], keeping
    /// whatever body the portal sent as the message.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StorageError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ObjectStore for PortalClient {
    async fn put(&self, bytes: Bytes) -> Result<Cid, StorageError> {
        let len = bytes.len() as u64;
        self.upload(reqwest::Body::from(bytes), Some(len)).await
    }

    async fn put_file(&self, file: File, declared_len: u64) -> Result<Cid, StorageError> {
        // reqwest streams the file body; nothing is buffered here
        self.upload(reqwest::Body::from(file), Some(declared_len))
            .await
    }
}
