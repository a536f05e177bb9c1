//! Zone (geofence) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A family-scoped geofence, either a circle or a polygon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub shape: ZoneShape,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Zone geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ZoneShape {
    Circle {
        latitude: f64,
        longitude: f64,
        radius_m: f64,
    },
    /// Ordered (lat, lon) vertex list; closed implicitly.
    Polygon { vertices: Vec<(f64, f64)> },
}

impl Zone {
    /// Containment test for a point: great-circle distance against the
    /// radius for circles, ray casting for polygons.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        match &self.shape {
            ZoneShape::Circle {
                latitude: clat,
                longitude: clon,
                radius_m,
            } => shared::geo::within_radius_m(latitude, longitude, *clat, *clon, *radius_m),
            ZoneShape::Polygon { vertices } => {
                shared::geo::point_in_polygon(latitude, longitude, vertices)
            }
        }
    }
}
