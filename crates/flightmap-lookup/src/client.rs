//! Airport lookup service HTTP client.

use crate::config::LookupConfig;
use flightmap_core::{normalize_iata, Airport, AirportLookup, Coordinate, LookupError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const AIRPORTS_PATH: &str = "/unified_flights/v1/airports";

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    airport_iata_codes: &'a [String],
}

/// The service sends decimal strings; some deployments send plain numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Degrees {
    Number(f64),
    Text(String),
}

impl Degrees {
    fn value(&self) -> Option<f64> {
        let value = match self {
            Degrees::Number(value) => *value,
            Degrees::Text(text) => text.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AirportRow {
    iata_code: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    latitude: Degrees,
    longitude: Degrees,
    #[serde(default)]
    timezone: Option<String>,
}

impl AirportRow {
    fn into_airport(self) -> Option<Airport> {
        let iata_code = normalize_iata(&self.iata_code)?;
        let latitude = self.latitude.value().filter(|lat| lat.abs() <= 90.0)?;
        let longitude = self.longitude.value().filter(|lon| lon.abs() <= 180.0)?;
        Some(Airport {
            iata_code,
            coordinate: Coordinate::new(latitude, longitude),
            name: self.name,
            city: self.city,
            timezone: self.timezone,
        })
    }
}

/// Flat public shape served by the airport proxy endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirportRecord {
    pub iata_code: String,
    pub name: Option<String>,
    pub city: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
}

impl From<Airport> for AirportRecord {
    fn from(airport: Airport) -> Self {
        Self {
            iata_code: airport.iata_code,
            name: airport.name,
            city: airport.city,
            latitude: airport.coordinate.latitude,
            longitude: airport.coordinate.longitude,
            timezone: airport.timezone,
        }
    }
}

impl From<AirportRecord> for Airport {
    fn from(record: AirportRecord) -> Self {
        Self {
            iata_code: record.iata_code,
            coordinate: Coordinate::new(record.latitude, record.longitude),
            name: record.name,
            city: record.city,
            timezone: record.timezone,
        }
    }
}

/// Decode response rows, skipping any that lack a code or usable coordinates.
pub fn parse_rows(rows: Vec<Value>) -> Vec<Airport> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<AirportRow>(row) {
            Ok(row) => {
                let code = row.iata_code.clone();
                let airport = row.into_airport();
                if airport.is_none() {
                    tracing::warn!("Skipping airport {:?} with unusable coordinates", code);
                }
                airport
            }
            Err(err) => {
                tracing::warn!("Skipping malformed airport row: {}", err);
                None
            }
        })
        .collect()
}

/// HTTP client for the batched airport lookup service.
#[derive(Debug, Clone)]
pub struct AirportLookupClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AirportLookupClient {
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| LookupError::Config(err.to_string()))?;
        if config.api_key.is_none() {
            tracing::debug!("No airport lookup API key configured");
        }
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Look up `codes` in one request. Unknown codes are simply absent.
    pub async fn fetch_airports(&self, codes: &[String]) -> Result<Vec<Airport>, LookupError> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}{}", self.base_url, AIRPORTS_PATH);
        let mut request = self.client.post(&url).json(&LookupRequest {
            airport_iata_codes: codes,
        });
        if let Some(key) = self.api_key.as_deref() {
            request = request.header("X-API-KEY", key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| LookupError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Airport lookup request failed: {} {}", status, body);
            return Err(LookupError::Status(status.as_u16()));
        }

        let rows = response
            .json::<Vec<Value>>()
            .await
            .map_err(|err| LookupError::Decode(err.to_string()))?;

        let airports = parse_rows(rows);
        tracing::debug!(
            "Airport lookup returned {} airport(s) for {} code(s)",
            airports.len(),
            codes.len()
        );
        Ok(airports)
    }
}

impl AirportLookup for AirportLookupClient {
    async fn lookup(&self, codes: &[String]) -> Result<Vec<Airport>, LookupError> {
        self.fetch_airports(codes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_accept_strings_and_numbers() {
        let airports = parse_rows(vec![
            json!({"iata_code": "jfk", "name": "John F Kennedy Intl", "city": "New York",
                   "latitude": "40.6413", "longitude": "-73.7781", "timezone": "America/New_York"}),
            json!({"iata_code": "LHR", "latitude": 51.47, "longitude": -0.4543}),
        ]);

        assert_eq!(airports.len(), 2);
        assert_eq!(airports[0].iata_code, "JFK");
        assert_eq!(airports[0].coordinate, Coordinate::new(40.6413, -73.7781));
        assert_eq!(airports[0].timezone.as_deref(), Some("America/New_York"));
        assert_eq!(airports[1].name, None);
    }

    #[test]
    fn bad_rows_are_skipped() {
        let airports = parse_rows(vec![
            json!({"iata_code": "BAD", "latitude": "n/a", "longitude": "0"}),
            json!({"iata_code": "FAR", "latitude": "95.0", "longitude": "0"}),
            json!({"name": "No Code", "latitude": "1", "longitude": "2"}),
            json!({"iata_code": "  ", "latitude": "1", "longitude": "2"}),
            json!({"iata_code": "CDG", "latitude": "49.0097", "longitude": "2.5479"}),
        ]);

        assert_eq!(airports.len(), 1);
        assert_eq!(airports[0].iata_code, "CDG");
    }

    #[test]
    fn record_is_flat_camel_case() {
        let mut airport = Airport::new("CDG", 49.0097, 2.5479);
        airport.city = Some("Paris".to_string());

        let value = serde_json::to_value(AirportRecord::from(airport)).unwrap();

        assert_eq!(value["iataCode"], "CDG");
        assert_eq!(value["latitude"], 49.0097);
        assert_eq!(value["city"], "Paris");
    }
}
