//! GeoJSON input model.
//!
//! The engine consumes per-floor vector features: polygons for rooms, lines
//! for walls and doors, points for navigation anchors, plus the side tables
//! (`kinds`, walkable/non-walkable sets, connections, navigation flags).
//! This module is the typed form of that input.
//!
//! Parsing is fault-tolerant at feature granularity: a single malformed
//! feature is logged and skipped, never aborting ingestion
//! ([`FeatureCollection::from_json_lenient`]).

use geo::{LineString, MultiPolygon, Polygon};
use log::warn;
use serde::de::{DeserializeOwned, IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::coord::Coord;
use crate::error::{CoreError, CoreResult};

// ── Position ──────────────────────────────────────────────────────────────────

/// A GeoJSON position: `[lng, lat]`, tolerating (and discarding) a trailing
/// elevation or any further axes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Position(pub f64, pub f64);

impl From<Position> for Coord {
    #[inline]
    fn from(p: Position) -> Coord {
        Coord::new(p.0, p.1)
    }
}

impl From<Coord> for Position {
    #[inline]
    fn from(c: Coord) -> Position {
        Position(c.lng, c.lat)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PosVisitor;

        impl<'de> Visitor<'de> for PosVisitor {
            type Value = Position;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a position array of at least two numbers")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Position, A::Error> {
                let lng: f64 = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
                let lat: f64 = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(1, &self))?;
                // Drain elevation and anything after it.
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(Position(lng, lat))
            }
        }

        deserializer.deserialize_seq(PosVisitor)
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.0)?;
        seq.serialize_element(&self.1)?;
        seq.end()
    }
}

// ── Geometry ──────────────────────────────────────────────────────────────────

/// GeoJSON geometry, restricted to the five types the engine routes over.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

impl Geometry {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::LineString { .. } => "LineString",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
        }
    }

    /// Every coordinate of the geometry, ring/sub-line structure flattened.
    pub fn all_coords(&self) -> Vec<Coord> {
        let mut out = Vec::new();
        match self {
            Geometry::Point { coordinates } => out.push((*coordinates).into()),
            Geometry::LineString { coordinates } => {
                out.extend(coordinates.iter().map(|&p| Coord::from(p)));
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                for part in coordinates {
                    out.extend(part.iter().map(|&p| Coord::from(p)));
                }
            }
            Geometry::MultiPolygon { coordinates } => {
                for poly in coordinates {
                    for ring in poly {
                        out.extend(ring.iter().map(|&p| Coord::from(p)));
                    }
                }
            }
        }
        out
    }

    /// Line paths for line-like geometry: one path for a `LineString`, one
    /// per sub-line for a `MultiLineString`, empty for everything else.
    pub fn line_paths(&self) -> Vec<Vec<Coord>> {
        match self {
            Geometry::LineString { coordinates } => {
                vec![coordinates.iter().map(|&p| Coord::from(p)).collect()]
            }
            Geometry::MultiLineString { coordinates } => coordinates
                .iter()
                .map(|line| line.iter().map(|&p| Coord::from(p)).collect())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Convert area geometry into a `geo` multipolygon.  `None` for points
    /// and lines.
    pub fn to_multipolygon(&self) -> Option<MultiPolygon<f64>> {
        fn ring(positions: &[Position]) -> LineString<f64> {
            LineString::new(positions.iter().map(|p| Coord::from(*p).to_geo()).collect())
        }
        fn polygon(rings: &[Vec<Position>]) -> Option<Polygon<f64>> {
            let mut it = rings.iter();
            let exterior = ring(it.next()?);
            let interiors = it.map(|r| ring(r)).collect();
            Some(Polygon::new(exterior, interiors))
        }

        match self {
            Geometry::Polygon { coordinates } => {
                polygon(coordinates).map(|p| MultiPolygon::new(vec![p]))
            }
            Geometry::MultiPolygon { coordinates } => {
                let polys: Vec<_> = coordinates.iter().filter_map(|p| polygon(p)).collect();
                if polys.is_empty() {
                    None
                } else {
                    Some(MultiPolygon::new(polys))
                }
            }
            _ => None,
        }
    }

    pub fn is_area(&self) -> bool {
        matches!(self, Geometry::Polygon { .. } | Geometry::MultiPolygon { .. })
    }

    pub fn is_line(&self) -> bool {
        matches!(self, Geometry::LineString { .. } | Geometry::MultiLineString { .. })
    }
}

// ── Features ──────────────────────────────────────────────────────────────────

/// A GeoJSON feature with typed properties.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Feature<P> {
    pub properties: P,
    pub geometry: Geometry,
}

/// A GeoJSON feature collection with typed properties.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FeatureCollection<P> {
    pub features: Vec<Feature<P>>,
}

impl<P> Default for FeatureCollection<P> {
    fn default() -> Self {
        Self { features: Vec::new() }
    }
}

impl<P: DeserializeOwned> FeatureCollection<P> {
    /// Parse a feature collection, skipping (and logging) any feature that
    /// fails to deserialize instead of failing the whole collection.
    pub fn from_json_lenient(raw: &str) -> CoreResult<Self> {
        #[derive(Deserialize)]
        struct RawCollection {
            #[serde(default)]
            features: Vec<serde_json::Value>,
        }

        let raw: RawCollection =
            serde_json::from_str(raw).map_err(|e| CoreError::Parse(e.to_string()))?;

        let mut features = Vec::with_capacity(raw.features.len());
        for (i, value) in raw.features.into_iter().enumerate() {
            match serde_json::from_value::<Feature<P>>(value) {
                Ok(f) => features.push(f),
                Err(e) => warn!("skipping malformed feature #{i}: {e}"),
            }
        }
        Ok(Self { features })
    }
}

// ── Property schemas ──────────────────────────────────────────────────────────

/// Properties carried by source-geometry features (rooms, walls, objects).
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryProps {
    pub id: String,
    pub floor_id: String,
}

/// Properties carried by sample-point features (walkable grid, connectors,
/// entrances) after normalization.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProps {
    pub id: String,
    pub floor_id: String,
    #[serde(default)]
    pub geometry_ids: Vec<String>,
    #[serde(default)]
    pub node_type: Option<String>,
}

// ── Connections ───────────────────────────────────────────────────────────────

/// One entry of the `connections` table: a door, or a multi-floor connector.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Connection {
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    #[serde(default)]
    pub entrances: Vec<Entrance>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Door,
    Stairs,
    Elevator,
    Escalator,
}

/// A geometry anchor of a connection on one floor, with its property flags.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entrance {
    pub geometry_id: String,
    pub floor_id: String,
    #[serde(default)]
    pub flags: u32,
}

/// Which bit positions of [`Entrance::flags`] encode which door properties.
///
/// If the `public` bit is absent the dataset does not distinguish locked
/// doors and every door is treated as public.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct NavigationFlags {
    #[serde(default)]
    pub public: Option<FlagBit>,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct FlagBit {
    pub bit: u32,
}

impl NavigationFlags {
    /// Whether the given flag word marks a door public.  Absent bit → all
    /// doors are public.
    pub fn is_public(&self, flags: u32) -> bool {
        match self.public {
            Some(FlagBit { bit }) => flags & (1 << bit) != 0,
            None => true,
        }
    }
}
