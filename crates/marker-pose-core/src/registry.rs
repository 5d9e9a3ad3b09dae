use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::WorldPoint;

/// Surveyed world data for one marker.
///
/// Marker local axes are assumed aligned with the world axes: the registry
/// models no per-marker rotation. Re-surveying a room means rebuilding the
/// table and restarting the session; entries never change while tracking.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerWorldEntry {
    /// Marker center in the world frame, meters.
    pub position: WorldPoint,
    /// Physical edge length, meters. Always positive.
    pub edge_m: f64,
}

/// Read-only lookup capability the engine depends on.
///
/// A lookup miss is a normal outcome (the marker is simply ignored for the
/// frame), never an error. Implementations must not mutate during a session,
/// which is what makes shared, unsynchronized reads sound.
pub trait MarkerRegistry {
    fn lookup(&self, id: u32) -> Option<&MarkerWorldEntry>;

    /// All registered identifiers, ascending.
    fn known_ids(&self) -> Vec<u32>;

    fn is_empty(&self) -> bool {
        self.known_ids().is_empty()
    }
}

/// One record of the registry's serialized form.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegisteredMarker {
    pub id: u32,
    pub position: WorldPoint,
    pub edge_m: f64,
}

/// Map-backed [`MarkerRegistry`] with construction-time validation.
///
/// Built from survey records; an empty table, a duplicate id, a non-finite
/// position or a non-positive edge length is a fatal configuration error.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkerTable {
    entries: BTreeMap<u32, MarkerWorldEntry>,
}

impl MarkerTable {
    pub fn from_markers(
        markers: impl IntoIterator<Item = RegisteredMarker>,
    ) -> Result<Self, ConfigError> {
        let mut entries = BTreeMap::new();
        for m in markers {
            if !(m.edge_m.is_finite() && m.edge_m > 0.0) {
                return Err(ConfigError::InvalidEdgeLength {
                    id: m.id,
                    edge_m: m.edge_m,
                });
            }
            if !m.position.coords.iter().all(|v| v.is_finite()) {
                return Err(ConfigError::InvalidWorldPosition { id: m.id });
            }
            let entry = MarkerWorldEntry {
                position: m.position,
                edge_m: m.edge_m,
            };
            if entries.insert(m.id, entry).is_some() {
                return Err(ConfigError::DuplicateMarkerId { id: m.id });
            }
        }
        if entries.is_empty() {
            return Err(ConfigError::EmptyRegistry);
        }
        Ok(Self { entries })
    }

    /// Parse a survey file: a JSON array of `{id, position, edge_m}` records.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let markers: Vec<RegisteredMarker> = serde_json::from_str(json)?;
        Self::from_markers(markers)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MarkerRegistry for MarkerTable {
    fn lookup(&self, id: u32) -> Option<&MarkerWorldEntry> {
        self.entries.get(&id)
    }

    fn known_ids(&self) -> Vec<u32> {
        self.entries.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn marker(id: u32) -> RegisteredMarker {
        RegisteredMarker {
            id,
            position: Point3::new(id as f64, 0.0, 1.5),
            edge_m: 0.15,
        }
    }

    #[test]
    fn lookup_hits_and_misses() {
        let table = MarkerTable::from_markers([marker(0), marker(3)]).unwrap();
        assert!(table.lookup(0).is_some());
        assert!(table.lookup(1).is_none());
        assert_eq!(table.known_ids(), vec![0, 3]);
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(matches!(
            MarkerTable::from_markers([]),
            Err(ConfigError::EmptyRegistry)
        ));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        assert!(matches!(
            MarkerTable::from_markers([marker(5), marker(5)]),
            Err(ConfigError::DuplicateMarkerId { id: 5 })
        ));
    }

    #[test]
    fn bad_edge_length_is_rejected() {
        let mut m = marker(1);
        m.edge_m = 0.0;
        assert!(matches!(
            MarkerTable::from_markers([m]),
            Err(ConfigError::InvalidEdgeLength { id: 1, .. })
        ));
    }

    #[test]
    fn non_finite_position_is_rejected() {
        let mut m = marker(2);
        m.position.x = f64::NAN;
        assert!(matches!(
            MarkerTable::from_markers([m]),
            Err(ConfigError::InvalidWorldPosition { id: 2 })
        ));
    }

    #[test]
    fn parses_survey_json() {
        let json = r#"[
            {"id": 0, "position": [0.0, 0.0, 1.5], "edge_m": 0.15},
            {"id": 7, "position": [2.0, -1.0, 1.2], "edge_m": 0.2}
        ]"#;
        let table = MarkerTable::from_json_str(json).unwrap();
        assert_eq!(table.len(), 2);
        let entry = table.lookup(7).unwrap();
        assert_eq!(entry.edge_m, 0.2);
        assert_eq!(entry.position, Point3::new(2.0, -1.0, 1.2));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            MarkerTable::from_json_str("{not json"),
            Err(ConfigError::RegistryParse(_))
        ));
    }
}
