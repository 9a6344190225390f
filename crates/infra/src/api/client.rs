//! Entity-agnostic request helpers
//!
//! Every per-entity client goes through [`ApiClient`], which owns the
//! etag rules:
//! - `get`/`create`/`update` return the etag from the `ETag` header,
//!   falling back to the embedded `configETag` body field
//! - `update` sends `If-Match`; an empty etag triggers a GET first
//! - `delete` treats 200/204 and 404 as success

use permsys_domain::{ApiResult, ETag, Entity, EntityBundle};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::errors::classify;
use crate::errors::InfraError;
use crate::http::{HttpClient, RawResponse};

/// Shape of list responses: either a bare array or an `items` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Bare(Vec<T>),
    Wrapped { items: Vec<T> },
}

impl<T> ListBody<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { items } => items,
        }
    }
}

/// JSON request helpers over the authenticated transport.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
}

impl ApiClient {
    /// Entity client over `http`.
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Underlying transport.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// GET a collection.
    #[instrument(level = "debug", skip(self))]
    pub async fn list<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let response = self.http.execute(Method::GET, path, None, &[]).await?;
        let body = success_body(response)?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let list: ListBody<T> = serde_json::from_str(&body).map_err(InfraError::from)?;
        Ok(list.into_vec())
    }

    /// GET one entity with its etag.
    #[instrument(level = "debug", skip(self))]
    pub async fn get<T>(&self, path: &str) -> ApiResult<EntityBundle<T>>
    where
        T: Entity + DeserializeOwned,
    {
        let response = self.http.execute(Method::GET, path, None, &[]).await?;
        decode_entity(response)
    }

    /// POST a create body to a collection path.
    #[instrument(level = "debug", skip(self, body))]
    pub async fn create<B, T>(&self, path: &str, body: &B) -> ApiResult<EntityBundle<T>>
    where
        B: Serialize + Sync,
        T: Entity + DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(InfraError::from)?;
        let response = self.http.execute(Method::POST, path, Some(&body), &[]).await?;
        decode_entity(response)
    }

    /// Full-state PUT guarded by `If-Match`.
    ///
    /// An empty `etag` means the caller does not know the current version;
    /// it is fetched with a GET first. Nothing else from that GET is used.
    #[instrument(level = "debug", skip(self, body, etag), fields(etag = etag.as_str()))]
    pub async fn update<B, T>(&self, path: &str, body: &B, etag: &ETag) -> ApiResult<EntityBundle<T>>
    where
        B: Serialize + Sync,
        T: Entity + DeserializeOwned,
    {
        let etag = if etag.is_empty() {
            debug!("no etag known, fetching current version");
            self.get::<T>(path).await?.etag
        } else {
            etag.clone()
        };

        let body = serde_json::to_value(body).map_err(InfraError::from)?;
        let headers = [("If-Match", etag.as_str().to_string())];
        let response = self.http.execute(Method::PUT, path, Some(&body), &headers).await?;
        decode_entity(response)
    }

    /// DELETE; an absent target counts as deleted.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let response = self.http.execute(Method::DELETE, path, None, &[]).await?;
        if response.is_success() {
            return Ok(());
        }
        match classify(response.status, &response.body) {
            err if err.is_not_found() => {
                debug!("delete target already absent");
                Ok(())
            }
            err => Err(err),
        }
    }
}

fn success_body(response: RawResponse) -> ApiResult<String> {
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(classify(response.status, &response.body))
    }
}

/// Decode an entity response and settle its etag: header first, embedded
/// `configETag` second.
fn decode_entity<T>(response: RawResponse) -> ApiResult<EntityBundle<T>>
where
    T: Entity + DeserializeOwned,
{
    let header_etag = response.etag.clone();
    let body = success_body(response)?;
    let mut entity: T = serde_json::from_str(&body).map_err(InfraError::from)?;
    let embedded = std::mem::take(&mut entity.meta_mut().etag);
    let etag = header_etag.or(embedded);
    if etag.is_empty() {
        warn!(kind = T::KIND, "response carried no etag");
    }
    entity.meta_mut().etag = etag.clone();
    Ok(EntityBundle::new(entity, etag))
}
