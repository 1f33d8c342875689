//! Real Las Vegas / Henderson locations for realistic tour fixtures.
//!
//! Coordinates sourced from OpenStreetMap. Travel times are estimated from
//! great-circle distance at an assumed average speed.

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 30.0;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    /// Haversine distance to `other` in kilometers.
    pub fn distance_km(&self, other: &Location) -> f64 {
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (delta_lng / 2.0).sin().powi(2);
        EARTH_RADIUS_KM * 2.0 * a.sqrt().asin()
    }

    /// Estimated driving time to `other` in seconds.
    pub fn travel_seconds(&self, other: &Location) -> i64 {
        let hours = self.distance_km(other) / DEFAULT_SPEED_KMH;
        (hours * 3600.0).round() as i64
    }
}

// ============================================================================
// Hotel (start and end of every day)
// ============================================================================

pub const HOTEL: Location = Location::new("Bellagio", 36.1126, -115.1767);

// ============================================================================
// Shows and reservations (fixed-time events)
// ============================================================================

pub const SHOWS: &[Location] = &[
    Location::new("Brooklyn Bowl", 36.1175388, -115.1695094),
    Location::new("Gordon Ramsay Steak", 36.1127744, -115.1712029),
];

// ============================================================================
// Sights (optional points of interest)
// ============================================================================

pub const SIGHTS: &[Location] = &[
    Location::new("Wynn Las Vegas", 36.1263781, -115.1658180),
    Location::new("MGM Grand", 36.1023654, -115.1688720),
    Location::new("Caesars Palace", 36.1162, -115.1745),
    Location::new("Hard Rock Cafe", 36.1041592, -115.1722166),
    Location::new("Sinatra", 36.1300035, -115.1654850),
    Location::new("Public House", 36.1219193, -115.1689317),
    Location::new("The Crack Shack", 36.1050709, -115.1735287),
    Location::new("Yard House", 36.1177147, -115.1691992),
    Location::new("Spago by Wolfgang Puck", 36.1139368, -115.1741462),
    Location::new("Hash House A Go Go", 36.1181377, -115.1710989),
    Location::new("Longhorn Casino", 36.1070664, -115.0591256),
    Location::new("Henderson Pavilion", 36.0156, -115.0387),
];

