// --- File: crates/slotbook_booking/src/client.rs ---
use crate::backend::{BookingBackend, RawResponse, TransportError};
use crate::cancel::CancelRequest;
use crate::identity::DeviceIdentity;
use crate::submitter::BookingPayload;
use http::header::HeaderName;
use reqwest::{Client, RequestBuilder};
use slotbook_common::{client_for_backend, config_error, BoxFuture, SlotbookError};
use slotbook_config::AppConfig;
use tracing::{debug, warn};

/// reqwest implementation of [`BookingBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    catalog_url: String,
    api_key: Option<String>,
    api_key_header: HeaderName,
    identity_header: HeaderName,
}

impl HttpBackend {
    pub fn new(config: &AppConfig) -> Result<Self, SlotbookError> {
        let backend = &config.backend;
        let base_url = backend.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(config_error("backend.base_url is empty"));
        }
        let api_key_header = HeaderName::from_bytes(backend.api_key_header.as_bytes())
            .map_err(|e| config_error(format!("invalid api_key_header: {}", e)))?;
        let identity_header = HeaderName::from_bytes(backend.identity_header.as_bytes())
            .map_err(|e| config_error(format!("invalid identity_header: {}", e)))?;
        let catalog_url = config
            .booking
            .catalog_url
            .clone()
            .unwrap_or_else(|| format!("{}/haircuts.json", base_url));
        if backend.api_key.is_none() {
            warn!("No backend API key configured, bookings will be sent without one");
        }

        Ok(Self {
            client: client_for_backend(backend)?,
            base_url,
            catalog_url,
            api_key: backend.api_key.clone(),
            api_key_header,
            identity_header,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(request: RequestBuilder) -> Result<RawResponse, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(format!("reading response body: {}", e)))?;
        debug!("Backend answered {}", status);
        Ok(RawResponse::new(status, body))
    }
}

impl BookingBackend for HttpBackend {
    fn get_windows<'a>(
        &'a self,
        identity: &'a DeviceIdentity,
    ) -> BoxFuture<'a, RawResponse, TransportError> {
        let request = self
            .client
            .get(self.endpoint("/"))
            .header(self.identity_header.clone(), identity.as_str());
        Box::pin(Self::send(request))
    }

    fn get_catalog(&self) -> BoxFuture<'_, RawResponse, TransportError> {
        Box::pin(Self::send(self.client.get(&self.catalog_url)))
    }

    fn post_booking<'a>(
        &'a self,
        payload: &'a BookingPayload,
        identity: &'a DeviceIdentity,
    ) -> BoxFuture<'a, RawResponse, TransportError> {
        let mut request = self
            .client
            .post(self.endpoint("/book"))
            .header(self.identity_header.clone(), identity.as_str())
            .json(payload);
        if let Some(key) = &self.api_key {
            request = request.header(self.api_key_header.clone(), key.as_str());
        }
        Box::pin(Self::send(request))
    }

    fn post_cancel<'a>(
        &'a self,
        request: &'a CancelRequest,
    ) -> BoxFuture<'a, RawResponse, TransportError> {
        let request = self.client.post(self.endpoint("/cancel")).json(request);
        Box::pin(Self::send(request))
    }
}
