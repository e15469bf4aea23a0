//! Hosting-platform API client.
//!
//! Thin blocking client over the platform's v3 REST API. Reads are allowed
//! anonymously; writes require a token in the configured environment variable.

use reqwest::blocking::{Client, Response};
use serde_json::Value;
use std::time::Duration;

use crate::config::HostingConfig;
use crate::error::{Error, Result};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

pub struct HostClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HostClient {
    /// Creates a client from hosting configuration. The token is read from the
    /// configured environment variable; absence is not an error here.
    pub fn new(hosting: &HostingConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("shipwright/{}", VERSION))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                Error::internal_io(e.to_string(), Some("create HTTP client".to_string()))
            })?;

        Ok(Self {
            client,
            base_url: hosting.api_base.trim_end_matches('/').to_string(),
            token: std::env::var(&hosting.token_env).ok().filter(|t| !t.is_empty()),
        })
    }

    /// Fails unless a token was found in the environment.
    pub fn require_token(&self, token_env: &str) -> Result<()> {
        if self.token.is_some() {
            Ok(())
        } else {
            Err(Error::api_token_missing(token_env))
        }
    }

    pub fn get(&self, endpoint: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let request = self
            .client
            .get(&url)
            .header("Accept", ACCEPT_HEADER);

        let response = self
            .authorize(request)
            .send()
            .map_err(|e| Error::api_request_failed(format!("GET {}", url), e))?;
        parse_json_response(response, &url)
    }

    pub fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let request = self
            .client
            .post(&url)
            .header("Accept", ACCEPT_HEADER)
            .json(body);

        let response = self
            .authorize(request)
            .send()
            .map_err(|e| Error::api_request_failed(format!("POST {}", url), e))?;
        parse_json_response(response, &url)
    }

    pub fn patch(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let request = self
            .client
            .patch(&url)
            .header("Accept", ACCEPT_HEADER)
            .json(body);

        let response = self
            .authorize(request)
            .send()
            .map_err(|e| Error::api_request_failed(format!("PATCH {}", url), e))?;
        parse_json_response(response, &url)
    }

    fn authorize(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("token {}", token)),
            None => request,
        }
    }
}

fn parse_json_response(response: Response, url: &str) -> Result<Value> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| Error::api_request_failed(format!("read body from {}", url), e))?;

    if !status.is_success() {
        return Err(Error::api_error_status(status.as_u16(), body, url));
    }

    serde_json::from_str(&body)
        .map_err(|e| Error::internal_json(e.to_string(), Some(format!("parse response from {}", url))))
}
