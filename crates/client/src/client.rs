use crate::wire::{decode_action, decode_water, PlantRequest};
use garden_core::{GardenError, Result, WaterReply};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// The server side of the page: every call is keyed by plant name.
///
/// Implementations report a server refusal as a value (`WaterReply::Rejected`
/// or `Ok(false)`) and reserve `Err` for requests that never produced a
/// usable answer.
pub trait PlantService: Send + Sync + 'static {
    /// `POST /water_plant`.
    fn water(&self, plant: &str) -> impl Future<Output = Result<WaterReply>> + Send;

    /// `POST /delete_plant`.
    fn delete(&self, plant: &str) -> impl Future<Output = Result<bool>> + Send;

    /// `POST /revive_plant`.
    fn revive(&self, plant: &str) -> impl Future<Output = Result<bool>> + Send;
}

/// Plant Service client speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPlantService {
    http: reqwest::Client,
    /// Base URL without a trailing slash, e.g. `http://127.0.0.1:8080`.
    base_url: String,
}

impl HttpPlantService {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GardenError::Http(format!("build client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST `{"plant_name": plant}` and return the status code and raw body.
    async fn post(&self, path: &str, plant: &str) -> Result<(u16, String)> {
        let url = self.endpoint(path);
        debug!("Sending plant '{plant}' to {url}");

        let response = self
            .http
            .post(&url)
            .json(&PlantRequest { plant_name: plant })
            .send()
            .await
            .map_err(|e| GardenError::Http(format!("{path}: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GardenError::Http(format!("{path}: read body: {e}")))?;

        debug!("Received {status} from {url}: {body}");
        Ok((status, body))
    }
}

impl PlantService for HttpPlantService {
    async fn water(&self, plant: &str) -> Result<WaterReply> {
        let (status, body) = self.post("water_plant", plant).await?;
        decode_water(status, &body)
    }

    async fn delete(&self, plant: &str) -> Result<bool> {
        let (status, body) = self.post("delete_plant", plant).await?;
        decode_action(status, &body)
    }

    async fn revive(&self, plant: &str) -> Result<bool> {
        let (status, body) = self.post("revive_plant", plant).await?;
        decode_action(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let svc = HttpPlantService::new("http://flowers.local/", Duration::from_secs(1)).unwrap();
        assert_eq!(svc.base_url(), "http://flowers.local");
        assert_eq!(svc.endpoint("water_plant"), "http://flowers.local/water_plant");
    }

    #[tokio::test]
    async fn unreachable_service_is_http_error() {
        // Bind a free port, then release it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let svc = HttpPlantService::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
        assert!(matches!(svc.water("rose").await, Err(GardenError::Http(_))));
        assert!(matches!(svc.delete("rose").await, Err(GardenError::Http(_))));
    }
}
