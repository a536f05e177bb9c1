//! Zone entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{Zone, ZoneShape};

/// Database row mapping for the zones table. Circle zones populate the
/// center/radius columns, polygon zones the vertices JSON.
#[derive(Debug, Clone, FromRow)]
pub struct ZoneEntity {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    pub kind: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_m: Option<f64>,
    pub vertices: Option<serde_json::Value>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl ZoneEntity {
    /// Converts the row into a domain zone; rows with inconsistent
    /// geometry columns yield None and are skipped by callers.
    pub fn into_zone(self) -> Option<Zone> {
        let shape = match self.kind.as_str() {
            "circle" => ZoneShape::Circle {
                latitude: self.latitude?,
                longitude: self.longitude?,
                radius_m: self.radius_m?,
            },
            "polygon" => {
                let vertices: Vec<(f64, f64)> =
                    serde_json::from_value(self.vertices?).ok()?;
                ZoneShape::Polygon { vertices }
            }
            _ => return None,
        };
        Some(Zone {
            id: self.id,
            family_id: self.family_id,
            name: self.name,
            shape,
            active: self.active,
            created_at: self.created_at,
        })
    }
}
