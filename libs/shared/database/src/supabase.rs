use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

/// PostgREST reports unique violations with the Postgres SQLSTATE in the body.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DatabaseError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, DatabaseError::Conflict(_))
    }
}

pub type DbResult<T> = Result<T, DatabaseError>;

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_role_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> DbResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.service_key).map_err(|_| DatabaseError::InvalidHeader("apikey"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Public flows carry no end-user token and act with the service role.
        let bearer = auth_token.unwrap_or(&self.service_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer))
                .map_err(|_| DatabaseError::InvalidHeader("authorization"))?,
        );

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> DbResult<T>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         auth_token: Option<&str>, body: Option<Value>,
                                         extra_headers: Option<HeaderMap>)
                                         -> DbResult<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;

            return Err(match status.as_u16() {
                401 | 403 => {
                    error!("Data store rejected credentials ({}): {}", status, error_text);
                    DatabaseError::Auth(error_text)
                }
                404 => DatabaseError::NotFound(error_text),
                409 => {
                    warn!("Data store constraint conflict: {}", error_text);
                    DatabaseError::Conflict(error_text)
                }
                _ if error_text.contains(UNIQUE_VIOLATION) => DatabaseError::Conflict(error_text),
                code => {
                    error!("API error ({}): {}", status, error_text);
                    DatabaseError::Api { status: code, message: error_text }
                }
            });
        }

        let bytes = response.bytes().await?;
        let data = serde_json::from_slice::<T>(&bytes)?;
        Ok(data)
    }

    /// Builds the `Prefer` header PostgREST uses for write semantics.
    pub fn prefer(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static(value));
        headers
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let config = AppConfig {
            supabase_url: "http://localhost:54321/".to_string(),
            supabase_service_role_key: "key".to_string(),
            ..AppConfig::default()
        };
        let client = SupabaseClient::new(&config);
        assert_eq!(client.get_base_url(), "http://localhost:54321");
    }

    #[test]
    fn conflict_is_recognised() {
        assert!(DatabaseError::Conflict("dup".into()).is_conflict());
        assert!(!DatabaseError::NotFound("x".into()).is_conflict());
    }
}
