/// Where to ask the provider about, parsed from the user's location field.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// `"<lat>,<lon>"`
    Coordinates { latitude: f64, longitude: f64 },
    /// Anything else, passed through as a place-name query
    Query(String),
}

impl Location {
    /// Parse the location field. Coordinates win when both halves are valid
    /// numbers in range; everything else is a place-name query.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        if let Some((lat, lon)) = raw.split_once(',') {
            if let (Ok(latitude), Ok(longitude)) =
                (lat.trim().parse::<f64>(), lon.trim().parse::<f64>())
            {
                if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
                    return Self::Coordinates {
                        latitude,
                        longitude,
                    };
                }
            }
        }

        Self::Query(raw.to_string())
    }

    /// Query parameters identifying this location.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Coordinates {
                latitude,
                longitude,
            } => vec![("lat", latitude.to_string()), ("lon", longitude.to_string())],
            Self::Query(q) => vec![("q", q.clone())],
        }
    }
}
