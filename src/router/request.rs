use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FetchError, StorageError};

/// Petición interceptada por el router
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub body: Option<Bytes>,
}

impl Request {
    pub fn new(method: Method, url: &str) -> Result<Self, FetchError> {
        let url = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        Ok(Self {
            method,
            url,
            body: None,
        })
    }

    pub fn get(url: &str) -> Result<Self, FetchError> {
        Self::new(Method::GET, url)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Clave de la petición en el store: la URL completa
    pub fn cache_key(&self) -> String {
        self.url.as_str().to_string()
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }
}

/// Respuesta de red o de caché
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Serializa la respuesta para guardarla en un store
    pub fn to_cache_body(&self) -> Result<String, StorageError> {
        let cached = CachedResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: STANDARD.encode(&self.body),
        };
        Ok(serde_json::to_string(&cached)?)
    }

    pub fn from_cache_body(body: &str) -> Result<Self, StorageError> {
        let cached: CachedResponse = serde_json::from_str(body)?;
        let bytes = STANDARD
            .decode(cached.body.as_bytes())
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        Ok(Self {
            status: cached.status,
            headers: cached.headers,
            body: Bytes::from(bytes),
        })
    }
}

/// Forma persistida de una respuesta: cuerpo en base64
#[derive(Debug, Serialize, Deserialize)]
struct CachedResponse {
    status: u16,
    #[serde(default)]
    headers: Vec<(String, String)>,
    body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_full_url() {
        let request = Request::get("http://localhost:8080/api/search?q=lofi").unwrap();
        assert_eq!(request.cache_key(), "http://localhost:8080/api/search?q=lofi");
        assert!(request.is_get());
    }

    #[test]
    fn rejects_relative_urls() {
        assert!(matches!(
            Request::get("/static/app.js"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn binary_bodies_survive_storage() {
        let response = Response::new(200, vec![0u8, 159, 146, 150])
            .with_header("Content-Type", "image/png");

        let stored = response.to_cache_body().unwrap();
        let restored = Response::from_cache_body(&stored).unwrap();

        assert_eq!(restored, response);
        assert_eq!(restored.header("content-type"), Some("image/png"));
    }

    #[test]
    fn corrupt_cached_body_is_an_error() {
        assert!(Response::from_cache_body(r#"{"status":200,"body":"***"}"#).is_err());
        assert!(Response::from_cache_body("not json").is_err());
    }
}
