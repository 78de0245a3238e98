//! Thin wrappers over the academy REST backend.

pub mod dashboard;
pub mod payments;
pub mod schedule;
pub mod students;

use crate::config::AppSettings;
use crate::error::ApiError;
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq)]
pub struct ApiClient {
    base_url: String,
    image_base_url: String,
}

impl ApiClient {
    pub fn new(settings: &AppSettings) -> Self {
        ApiClient {
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            image_base_url: settings.image_base_url.clone(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn image_base_url(&self) -> &str {
        &self.image_base_url
    }

    async fn read<T: DeserializeOwned>(resp: Response, fallback: &str) -> Result<T, ApiError> {
        if !resp.ok() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let err = ApiError::from_body(status, &body, fallback);
            log::error!("{} {} -> {}: {}", fallback, resp.url(), status, err);
            return Err(err);
        }
        Ok(resp.json::<T>().await?)
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder, fallback: &str) -> Result<T, ApiError> {
        let resp = builder.send().await.map_err(|e| {
            log::error!("{}: {}", fallback, e);
            ApiError::from(e)
        })?;
        Self::read(resp, fallback).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T, ApiError> {
        Self::send(Request::get(&self.url(path)), fallback).await
    }

    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        fallback: &str,
    ) -> Result<T, ApiError> {
        let builder = Request::get(&self.url(path)).query(query.iter().map(|(k, v)| (*k, v.as_str())));
        Self::send(builder, fallback).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let request = Request::post(&self.url(path)).json(body)?;
        let resp = request.send().await?;
        Self::read(resp, fallback).await
    }

    pub async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let request = Request::patch(&self.url(path)).json(body)?;
        let resp = request.send().await?;
        Self::read(resp, fallback).await
    }

    pub async fn send_form<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        form: web_sys::FormData,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let resp = builder.body(form)?.send().await?;
        Self::read(resp, fallback).await
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        Request::post(&self.url(path))
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        Request::patch(&self.url(path))
    }

    pub async fn delete(&self, path: &str, fallback: &str) -> Result<serde_json::Value, ApiError> {
        let resp = Request::delete(&self.url(path)).send().await?;
        if !resp.ok() {
            return Self::read(resp, fallback).await;
        }
        // 204 and empty 200 bodies are both success.
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Cache-busting query value, like the `_t` parameter the backend expects.
pub fn cache_buster() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_double_slashes() {
        let client = ApiClient::new(&AppSettings {
            api_base_url: "https://school.example/api/".to_string(),
            ..AppSettings::default()
        });
        assert_eq!(client.url("/students/4"), "https://school.example/api/students/4");
        assert_eq!(client.url("courses"), "https://school.example/api/courses");
    }
}
