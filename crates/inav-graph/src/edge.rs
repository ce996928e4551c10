//! Graph edge model.

/// Traversal class of an edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum EdgeKind {
    Walkable,
    DoorLink,
    Stairs,
    Elevator,
    Escalator,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Walkable => "walkable",
            EdgeKind::DoorLink => "door-link",
            EdgeKind::Stairs => "stairs",
            EdgeKind::Elevator => "elevator",
            EdgeKind::Escalator => "escalator",
        }
    }
}

/// A directed, weighted edge.  Visibility edges always exist as a
/// bidirectional pair with identical weight; connector edges are
/// materialized bidirectionally as well.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub from: String,
    pub to: String,
    /// Metres; finite and non-negative (enforced at insert).
    pub weight_m: f64,
    pub kind: EdgeKind,
    pub accessible: bool,
}

impl Edge {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        weight_m: f64,
        kind: EdgeKind,
        accessible: bool,
    ) -> Self {
        Self { from: from.into(), to: to.into(), weight_m, kind, accessible }
    }

    /// The same edge travelled the other way.
    pub fn reversed(&self) -> Edge {
        Edge {
            from: self.to.clone(),
            to: self.from.clone(),
            weight_m: self.weight_m,
            kind: self.kind,
            accessible: self.accessible,
        }
    }
}
