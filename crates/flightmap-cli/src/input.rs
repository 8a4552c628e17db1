//! Command-line and file input parsing.

use anyhow::{Context, Result};
use flightmap_core::{normalize_iata, Airport, HotelPoint, SegmentCodes};
use flightmap_lookup::AirportRecord;
use std::path::Path;

/// Parse `JFK-LHR` (or `JFK>LHR`) into a segment.
pub fn parse_segment(value: &str) -> Result<SegmentCodes, String> {
    let (from, to) = value
        .split_once('-')
        .or_else(|| value.split_once('>'))
        .ok_or_else(|| format!("expected FROM-TO, got {value:?}"))?;
    match (normalize_iata(from), normalize_iata(to)) {
        (Some(from), Some(to)) => Ok(SegmentCodes::new(from, to)),
        _ => Err(format!("empty airport code in {value:?}")),
    }
}

/// Parse `ID:LAT,LON[:LABEL]` into a hotel point. The label defaults to the id.
pub fn parse_hotel(value: &str) -> Result<HotelPoint, String> {
    let mut parts = value.splitn(3, ':');
    let id = parts.next().map(str::trim).unwrap_or_default();
    if id.is_empty() {
        return Err(format!("missing hotel id in {value:?}"));
    }

    let position = parts
        .next()
        .ok_or_else(|| format!("expected ID:LAT,LON, got {value:?}"))?;
    let (lat, lon) = position
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got {position:?}"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude {lat:?}"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude {lon:?}"))?;

    let label = parts.next().unwrap_or(id);
    Ok(HotelPoint::new(id, lat, lon, label))
}

/// Read airports from a JSON array in the proxy's record shape.
pub fn load_airports(path: &Path) -> Result<Vec<Airport>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read airports file {}", path.display()))?;
    let records: Vec<AirportRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse airports file {}", path.display()))?;
    Ok(records.into_iter().map(Airport::from).collect())
}

/// Read hotels from a JSON array of hotel points.
pub fn load_hotels(path: &Path) -> Result<Vec<HotelPoint>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read hotels file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse hotels file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightmap_core::Coordinate;

    #[test]
    fn segments_parse_and_normalize() {
        assert_eq!(parse_segment("jfk-lhr").unwrap(), SegmentCodes::new("JFK", "LHR"));
        assert_eq!(parse_segment("LHR>CDG").unwrap(), SegmentCodes::new("LHR", "CDG"));
        assert!(parse_segment("JFK").is_err());
        assert!(parse_segment("JFK- ").is_err());
    }

    #[test]
    fn hotels_parse_with_optional_label() {
        let hotel = parse_hotel("h1:40.0,-73.9:$189").unwrap();
        assert_eq!(hotel.id, "h1");
        assert_eq!(hotel.coordinate, Coordinate::new(40.0, -73.9));
        assert_eq!(hotel.label, "$189");

        assert_eq!(parse_hotel("h2:1.5,2.5").unwrap().label, "h2");
        assert!(parse_hotel("h3").is_err());
        assert!(parse_hotel("h4:north,2").is_err());
        assert!(parse_hotel(":1,2").is_err());
    }

    #[test]
    fn airports_file_uses_record_shape() {
        let path = std::env::temp_dir().join(format!("flightmap-airports-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"iataCode":"CDG","name":"Charles de Gaulle","city":"Paris",
                 "latitude":49.0097,"longitude":2.5479,"timezone":"Europe/Paris"}]"#,
        )
        .unwrap();

        let airports = load_airports(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(airports.len(), 1);
        assert_eq!(airports[0].coordinate, Coordinate::new(49.0097, 2.5479));
        assert_eq!(airports[0].city.as_deref(), Some("Paris"));
    }
}
