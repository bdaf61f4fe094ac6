//! Guard logic and HTTP plumbing shared by the vendor providers.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, info};

use crate::{Error, ProviderConfig, Result};

/// Stored configuration plus the client built from it.
pub(crate) struct Session<C> {
    pub config: ProviderConfig,
    pub client: C,
}

/// Initialization state of one provider.
///
/// Holds nothing until `install` runs; afterwards the session is only read,
/// so concurrent calls need no locking.
pub(crate) struct ProviderState<C> {
    name: &'static str,
    session: Option<Session<C>>,
}

impl<C> ProviderState<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            session: None,
        }
    }

    /// Store a validated config and its client, replacing any previous one.
    pub fn install(&mut self, config: ProviderConfig, client: C) {
        self.session = Some(Session { config, client });
        info!(provider = self.name, "{} provider initialized", self.name);
    }

    pub fn is_available(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| !session.config.api_key.is_empty())
    }

    /// The session, or `NotInitialized` when the provider cannot be called.
    pub fn ready(&self) -> Result<&Session<C>> {
        match &self.session {
            Some(session) if !session.config.api_key.is_empty() => Ok(session),
            _ => Err(Error::NotInitialized(self.name.to_string())),
        }
    }
}

/// Marks a credential as a sensitive header value.
pub(crate) fn secret_header(value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value.trim())
        .map_err(|_| Error::config("API key contains characters not allowed in an HTTP header"))?;
    value.set_sensitive(true);
    Ok(value)
}

/// A vendor HTTP client with its auth headers baked in.
pub(crate) struct VendorClient {
    provider: &'static str,
    base_url: String,
    http: reqwest::Client,
}

impl VendorClient {
    pub fn new(
        provider: &'static str,
        base_url: &str,
        headers: impl IntoIterator<Item = (HeaderName, HeaderValue)>,
    ) -> Result<Self> {
        let headers: HeaderMap = headers.into_iter().collect();
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("failed to build {provider} client: {e}")))?;

        Ok(Self {
            provider,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// POST a JSON body and decode the JSON reply.
    ///
    /// Every failure, including non-2xx statuses and undecodable bodies,
    /// comes back as `Error::ProviderCall`.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let result = self.send(&url, body).await;
        if let Err(e) = &result {
            error!(provider = self.provider, error = %e, "vendor call failed");
        }
        result
    }

    async fn send<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::provider_call(self.provider, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider_call(
                self.provider,
                format!("{status}: {}", vendor_message(&body)),
            ));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| Error::provider_call(self.provider, format!("malformed response: {e}")))
    }
}

/// Pull `error.message` out of a vendor error body, falling back to the raw text.
fn vendor_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
