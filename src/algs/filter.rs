//! Element removal by centroid position, and cleanup of unreferenced entities.

use std::fmt;
use std::str::FromStr;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::data::coordinates::Coordinates;
use crate::data::model::{MeshModel, Property};
use crate::mesh_error::MeshEquivError;
use crate::topology::element::{Element, ElementTable};
use crate::topology::point::{ElementId, MaterialId, PointId, PropertyId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl FromStr for Axis {
    type Err = MeshEquivError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "x" | "X" => Ok(Axis::X),
            "y" | "Y" => Ok(Axis::Y),
            "z" | "Z" => Ok(Axis::Z),
            other => Err(MeshEquivError::Configuration(format!(
                "unknown axis {other:?}; expected x, y or z"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl Comparison {
    #[inline]
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Less => lhs < rhs,
            Comparison::LessEqual => lhs <= rhs,
            Comparison::Greater => lhs > rhs,
            Comparison::GreaterEqual => lhs >= rhs,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Comparison::Less => "<",
            Comparison::LessEqual => "<=",
            Comparison::Greater => ">",
            Comparison::GreaterEqual => ">=",
        }
    }
}

impl FromStr for Comparison {
    type Err = MeshEquivError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(Comparison::Less),
            "<=" => Ok(Comparison::LessEqual),
            ">" => Ok(Comparison::Greater),
            ">=" => Ok(Comparison::GreaterEqual),
            other => Err(MeshEquivError::Configuration(format!(
                "unknown comparison {other:?}"
            ))),
        }
    }
}

/// `centroid[axis] <comparison> value`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CentroidFilter {
    pub axis: Axis,
    pub comparison: Comparison,
    pub value: f64,
}

impl CentroidFilter {
    pub fn new(axis: Axis, comparison: Comparison, value: f64) -> Result<Self, MeshEquivError> {
        if !value.is_finite() {
            return Err(MeshEquivError::Configuration(format!(
                "filter value must be finite, got {value}"
            )));
        }
        Ok(Self {
            axis,
            comparison,
            value,
        })
    }

    /// Parses an axis name and a `"<op> <value>"` condition such as `"< 0."`.
    pub fn parse(axis: &str, condition: &str) -> Result<Self, MeshEquivError> {
        let condition = condition.trim();
        let split = condition
            .find(|c: char| !matches!(c, '<' | '>' | '='))
            .unwrap_or(condition.len());
        let (op, value) = condition.split_at(split);
        let value = value.trim().parse::<f64>().map_err(|e| {
            MeshEquivError::Configuration(format!("bad filter value in {condition:?}: {e}"))
        })?;
        Self::new(axis.parse()?, op.parse()?, value)
    }

    #[inline]
    pub fn matches(&self, centroid: [f64; 3]) -> bool {
        self.comparison.holds(centroid[self.axis.index()], self.value)
    }
}

impl fmt::Display for CentroidFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = match self.axis {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        write!(f, "{axis} {} {}", self.comparison.symbol(), self.value)
    }
}

/// Mean of the element's vertex coordinates.
pub fn element_centroid(
    element: &Element,
    coordinates: &Coordinates,
) -> Result<[f64; 3], MeshEquivError> {
    let mut sum = [0.0; 3];
    for &node in &element.nodes {
        let p = coordinates.get(node).ok_or(MeshEquivError::UnknownNode {
            element: element.id,
            node,
        })?;
        for k in 0..3 {
            sum[k] += p[k];
        }
    }
    let n = element.nodes.len().max(1) as f64;
    Ok(sum.map(|s| s / n))
}

/// Entities dropped by [`remove_unused`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnusedReport {
    pub nodes: Vec<PointId>,
    pub properties: Vec<PropertyId>,
    pub materials: Vec<MaterialId>,
}

/// Entities dropped by [`filter_elements`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub elements: Vec<ElementId>,
    pub unused: UnusedReport,
}

/// Removes every element whose centroid matches any of `filters`, then
/// drops what the removal left unreferenced.
pub fn filter_elements(
    model: &MeshModel,
    filters: &[CentroidFilter],
) -> Result<(MeshModel, FilterReport), MeshEquivError> {
    model.validate()?;
    let mut kept = ElementTable::with_capacity(model.elements.len());
    let mut removed = Vec::new();
    for element in &model.elements {
        let centroid = element_centroid(element, &model.coordinates)?;
        if filters.iter().any(|f| f.matches(centroid)) {
            removed.push(element.id);
        } else {
            kept.try_insert(element.clone())?;
        }
    }
    if !removed.is_empty() {
        log::info!("filtered out {} of {} elements", removed.len(), model.elements.len());
    }

    let trimmed = MeshModel {
        elements: kept,
        ..model.clone()
    };
    let (out, unused) = remove_unused(&trimmed)?;
    Ok((
        out,
        FilterReport {
            elements: removed,
            unused,
        },
    ))
}

/// Drops nodes no element references, properties no element references and
/// materials no surviving property references. Deck order is kept.
pub fn remove_unused(model: &MeshModel) -> Result<(MeshModel, UnusedReport), MeshEquivError> {
    model.validate()?;
    let used_nodes: HashSet<PointId> = model
        .elements
        .iter()
        .flat_map(|e| e.nodes.iter().copied())
        .collect();
    let used_props: HashSet<PropertyId> =
        model.elements.iter().filter_map(|e| e.property).collect();

    let mut report = UnusedReport::default();
    let mut coordinates = Coordinates::with_capacity(used_nodes.len());
    for (id, xyz) in model.coordinates.iter() {
        if used_nodes.contains(&id) {
            coordinates.try_insert(id, xyz)?;
        } else {
            report.nodes.push(id);
        }
    }

    let (properties, dropped): (Vec<Property>, Vec<Property>) = model
        .properties
        .iter()
        .copied()
        .partition(|p| used_props.contains(&p.id));
    report.properties = dropped.into_iter().map(|p| p.id).collect();

    let used_mats: HashSet<MaterialId> = properties.iter().filter_map(|p| p.material).collect();
    let (materials, dropped): (Vec<_>, Vec<_>) = model
        .materials
        .iter()
        .copied()
        .partition(|m| used_mats.contains(m));
    report.materials = dropped;

    log::debug!(
        "removed {} unused nodes, {} properties, {} materials",
        report.nodes.len(),
        report.properties.len(),
        report.materials.len()
    );
    Ok((
        MeshModel {
            coordinates,
            elements: model.elements.clone(),
            properties,
            materials,
        },
        report,
    ))
}
