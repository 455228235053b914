// air_aura - Alert aggregation service for the Air Aura dashboard
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::alert::Alert;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug)]
pub enum ClientError {
    Internal(reqwest::Error),
    InvalidUrl(String),
    Unexpected(StatusCode, Url),
    Fallback(io::Error),
    FallbackFormat(serde_json::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(e) => write!(f, "{}", e),
            Self::InvalidUrl(u) => write!(f, "invalid API URL {}", u),
            Self::Unexpected(status, url) => write!(f, "unexpected status {} for {}", status, url),
            Self::Fallback(e) => write!(f, "unable to read fallback alerts: {}", e),
            Self::FallbackFormat(e) => write!(f, "invalid fallback alerts: {}", e),
        }
    }
}

impl error::Error for ClientError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Internal(e) => Some(e),
            Self::Fallback(e) => Some(e),
            Self::FallbackFormat(e) => Some(e),
            _ => None,
        }
    }
}

/// Alerts decoded from one payload, along with the number of records that
/// were kept as unclassified because they failed to decode.
#[derive(Debug, Clone, Default)]
pub struct AlertBatch {
    pub alerts: Vec<Alert>,
    pub malformed: usize,
}

impl AlertBatch {
    /// Decode each record on its own so one bad record doesn't reject the rest.
    pub fn from_values(values: Vec<Value>) -> Self {
        let mut malformed = 0;
        let alerts = values
            .into_iter()
            .map(|value| {
                let (alert, err) = Alert::from_value_lossy(value);
                if let Some(e) = err {
                    malformed += 1;
                    tracing::warn!(message = "keeping malformed alert as unclassified", id = ?alert.id(), error = %e);
                }
                alert
            })
            .collect();

        AlertBatch { alerts, malformed }
    }
}

/// Client for the alert endpoint of the Air Aura backend.
#[derive(Debug)]
pub struct AlertSourceClient {
    client: Client,
    alerts_url: Url,
}

impl AlertSourceClient {
    const USER_AGENT: &'static str = "Air Aura alert service (https://github.com/56quarters/air_aura)";
    const JSON_RESPONSE: &'static str = "application/json";

    pub fn new(client: Client, base_url: &str) -> Result<Self, ClientError> {
        let mut alerts_url = Url::parse(base_url).map_err(|_| ClientError::InvalidUrl(base_url.to_owned()))?;
        alerts_url
            .path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(base_url.to_owned()))?
            .pop_if_empty()
            .push("alerts");

        Ok(AlertSourceClient { client, alerts_url })
    }

    pub fn alerts_url(&self) -> &Url {
        &self.alerts_url
    }

    /// Fetch the complete list of currently active alerts.
    pub async fn alerts(&self) -> Result<AlertBatch, ClientError> {
        tracing::debug!(message = "making alerts request", url = %self.alerts_url);

        let res = self.make_request(self.alerts_url.clone()).await?;
        let values = res.json::<Vec<Value>>().await.map_err(ClientError::Internal)?;
        Ok(AlertBatch::from_values(values))
    }

    async fn make_request(&self, url: Url) -> Result<Response, ClientError> {
        let res = self
            .client
            .get(url.clone())
            .header(USER_AGENT, Self::USER_AGENT)
            .header(ACCEPT, Self::JSON_RESPONSE)
            .send()
            .await
            .map_err(ClientError::Internal)?;

        let status = res.status();
        if status == StatusCode::OK {
            Ok(res)
        } else {
            Err(ClientError::Unexpected(status, url))
        }
    }
}

/// Load a static alert list from a JSON file, used when the backend cannot
/// be reached.
pub fn load_fallback<P: AsRef<Path>>(path: P) -> Result<AlertBatch, ClientError> {
    let contents = fs::read_to_string(path).map_err(ClientError::Fallback)?;
    let values = serde_json::from_str::<Vec<Value>>(&contents).map_err(ClientError::FallbackFormat)?;
    Ok(AlertBatch::from_values(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertKind;
    use serde_json::json;
    use std::io::Write;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> serde_json::Value {
        json!([
            {
                "id": "d-1",
                "type": "wildfire",
                "severity": "critical",
                "title": "Queimada",
                "description": "Foco de incêndio próximo",
                "location": "Cuiabá",
                "distance": 8.0,
                "estimatedArrival": "2024-05-01T15:00:00Z",
                "affectedRadius": 20.0,
                "source": "INPE",
                "createdAt": "2024-05-01T12:00:00Z",
                "isActive": true
            },
            { "id": "x-1", "message": "sem tipo" }
        ])
    }

    #[test]
    fn test_alerts_url() {
        let client = AlertSourceClient::new(Client::new(), "https://api.example.com/v1/").unwrap();
        assert_eq!("https://api.example.com/v1/alerts", client.alerts_url().as_str());

        let client = AlertSourceClient::new(Client::new(), "https://api.example.com").unwrap();
        assert_eq!("https://api.example.com/alerts", client.alerts_url().as_str());
    }

    #[test]
    fn test_invalid_url() {
        let err = AlertSourceClient::new(Client::new(), "not a url").unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_fetch_alerts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alerts"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .mount(&server)
            .await;

        let client = AlertSourceClient::new(Client::new(), &server.uri()).unwrap();
        let batch = client.alerts().await.unwrap();
        let alerts = batch.alerts;

        assert_eq!(0, batch.malformed);
        assert_eq!(2, alerts.len());
        assert_eq!(AlertKind::Disaster, alerts[0].kind());
        assert!(alerts[0].as_disaster().unwrap().estimated_arrival.is_some());
        assert_eq!(AlertKind::Unclassified, alerts[1].kind());
    }

    #[tokio::test]
    async fn test_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alerts"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = AlertSourceClient::new(Client::new(), &server.uri()).unwrap();
        let err = client.alerts().await.unwrap_err();

        assert!(matches!(err, ClientError::Unexpected(StatusCode::SERVICE_UNAVAILABLE, _)));
    }

    #[tokio::test]
    async fn test_malformed_record_keeps_rest_of_list() {
        let mut records = payload();
        records[0]["type"] = json!("landslide");
        records.as_array_mut().unwrap().push(json!({
            "id": "h-1",
            "condition": { "id": "c-1", "name": "Asma", "severity": "high", "affectedSystems": ["respiratory"] },
            "riskLevel": "high",
            "title": "Risco respiratório",
            "description": "Qualidade do ar ruim",
            "recommendations": [],
            "affectedBy": {},
            "createdAt": "2024-05-01T12:00:00Z",
            "isActive": true
        }));

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alerts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(records))
            .mount(&server)
            .await;

        let client = AlertSourceClient::new(Client::new(), &server.uri()).unwrap();
        let batch = client.alerts().await.unwrap();
        let kinds: Vec<AlertKind> = batch.alerts.iter().map(|a| a.kind()).collect();

        assert_eq!(1, batch.malformed);
        assert_eq!(
            vec![AlertKind::Unclassified, AlertKind::Unclassified, AlertKind::Health],
            kinds
        );
        assert_eq!(Some("d-1"), batch.alerts[0].id());
        assert!(batch.alerts[0].is_critical());
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alerts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "alerts": [] })))
            .mount(&server)
            .await;

        let client = AlertSourceClient::new(Client::new(), &server.uri()).unwrap();
        let err = client.alerts().await.unwrap_err();

        assert!(matches!(err, ClientError::Internal(_)));
    }

    #[test]
    fn test_load_fallback() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", payload()).unwrap();

        let batch = load_fallback(file.path()).unwrap();
        assert_eq!(2, batch.alerts.len());
        assert_eq!(0, batch.malformed);
    }

    #[test]
    fn test_load_bundled_fallback() {
        let batch = load_fallback(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/fallback_alerts.json")).unwrap();
        let kinds: Vec<AlertKind> = batch.alerts.iter().map(|a| a.kind()).collect();

        assert_eq!(vec![AlertKind::Disaster, AlertKind::Health], kinds);
    }

    #[test]
    fn test_load_fallback_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_fallback(dir.path().join("missing.json")).unwrap_err();

        assert!(matches!(err, ClientError::Fallback(_)));
    }
}
