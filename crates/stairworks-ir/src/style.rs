//! Category style table.
//!
//! The style table is read-only configuration: it is loaded once (from TOML
//! or the built-in defaults) and passed by reference to every call that
//! needs it.
//!
//! ```toml
//! order = ["treads", "stringers"]
//!
//! [categories.treads]
//! color = [0.72, 0.52, 0.30]
//! opacity = 0.5
//! stock = "20mm_timber"
//! nestable = true
//!
//! [stock.20mm_timber]
//! thickness = 20.0
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::part::Part;

/// Errors raised while loading a style table.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML could not be parsed.
    #[error("failed to parse style table: {0}")]
    Toml(#[from] toml::de::Error),

    /// The table parsed but is inconsistent.
    #[error("invalid style table: {0}")]
    Invalid(String),
}

fn default_opacity() -> f64 {
    1.0
}

fn default_metallic() -> f64 {
    0.05
}

fn default_roughness() -> f64 {
    0.65
}

/// Render and fabrication settings for one part category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStyle {
    /// Base color as `[r, g, b]` in 0.0..1.0.
    pub color: [f64; 3],
    /// Opacity in 0.0..=1.0. Anything below 1.0 renders translucent.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Metallic factor override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metallic: Option<f64>,
    /// Roughness factor override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f64>,
    /// Stock key the category is cut from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<String>,
    /// Whether parts of this category can be cut from flat sheet stock.
    #[serde(default)]
    pub nestable: bool,
}

/// A sheet stock material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDef {
    /// Sheet thickness (mm).
    pub thickness: f64,
    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Immutable category → style lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleTable {
    /// Category order used when grouping parts for export.
    #[serde(default)]
    pub order: Vec<String>,
    /// Default metallic factor.
    #[serde(default = "default_metallic")]
    pub metallic: f64,
    /// Default roughness factor.
    #[serde(default = "default_roughness")]
    pub roughness: f64,
    /// Per-category styles.
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryStyle>,
    /// Stock definitions keyed by stock name.
    #[serde(default)]
    pub stock: BTreeMap<String, StockDef>,
}

impl StyleTable {
    /// The studio's default staircase styles.
    pub fn builtin() -> Self {
        let entries: [(&str, [f64; 3], f64, Option<&str>, bool); 7] = [
            ("treads", [0.72, 0.52, 0.30], 0.5, Some("20mm_timber"), true),
            ("risers", [0.78, 0.60, 0.38], 0.5, Some("20mm_timber"), true),
            ("plaster", [0.93, 0.91, 0.87], 0.5, Some("18mm_plywood"), true),
            ("stringers", [0.55, 0.38, 0.20], 1.0, Some("50mm_structural"), true),
            ("carriages", [0.48, 0.33, 0.18], 1.0, Some("50mm_structural"), true),
            ("ribs", [0.60, 0.45, 0.25], 1.0, Some("18mm_plywood"), true),
            ("handrail", [0.40, 0.26, 0.13], 1.0, None, false),
        ];

        let mut categories = BTreeMap::new();
        let mut order = Vec::with_capacity(entries.len());
        for (name, color, opacity, stock, nestable) in entries {
            order.push(name.to_string());
            categories.insert(
                name.to_string(),
                CategoryStyle {
                    color,
                    opacity,
                    metallic: None,
                    roughness: None,
                    stock: stock.map(str::to_string),
                    nestable,
                },
            );
        }

        let mut stock = BTreeMap::new();
        for (name, thickness, description) in [
            ("20mm_timber", 20.0, "20mm Timber"),
            ("50mm_structural", 50.0, "50mm Structural"),
            ("18mm_plywood", 18.0, "18mm Plywood"),
        ] {
            stock.insert(
                name.to_string(),
                StockDef {
                    thickness,
                    description: Some(description.to_string()),
                },
            );
        }

        Self {
            order,
            metallic: default_metallic(),
            roughness: default_roughness(),
            categories,
            stock,
        }
    }

    /// Parse and validate a TOML style table.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let table: StyleTable = toml::from_str(source)?;
        table.validate()?;
        Ok(table)
    }

    /// Read, parse and validate a TOML style table file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// Check value ranges and cross references.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, style) in &self.categories {
            if !(0.0..=1.0).contains(&style.opacity) {
                return Err(ConfigError::Invalid(format!(
                    "category '{name}': opacity {} outside 0..=1",
                    style.opacity
                )));
            }
            if style.color.iter().any(|c| !(0.0..=1.0).contains(c)) {
                return Err(ConfigError::Invalid(format!(
                    "category '{name}': color components must be within 0..=1"
                )));
            }
            if let Some(stock) = &style.stock {
                if !self.stock.contains_key(stock) {
                    return Err(ConfigError::Invalid(format!(
                        "category '{name}' references unknown stock '{stock}'"
                    )));
                }
            }
        }
        for name in &self.order {
            if !self.categories.contains_key(name) {
                return Err(ConfigError::Invalid(format!(
                    "order lists unknown category '{name}'"
                )));
            }
        }
        for (name, stock) in &self.stock {
            if stock.thickness <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "stock '{name}': thickness must be positive"
                )));
            }
        }
        Ok(())
    }

    /// Style for a category.
    pub fn style(&self, category: &str) -> Option<&CategoryStyle> {
        self.categories.get(category)
    }

    /// Metallic factor for a category, falling back to the table default.
    pub fn metallic_for(&self, style: &CategoryStyle) -> f64 {
        style.metallic.unwrap_or(self.metallic)
    }

    /// Roughness factor for a category, falling back to the table default.
    pub fn roughness_for(&self, style: &CategoryStyle) -> f64 {
        style.roughness.unwrap_or(self.roughness)
    }

    /// Whether parts of `category` go to the nesting engine.
    pub fn is_nestable(&self, category: &str) -> bool {
        self.style(category).is_some_and(|s| s.nestable)
    }

    /// Stock key for a category.
    pub fn stock_for(&self, category: &str) -> Option<&str> {
        self.style(category).and_then(|s| s.stock.as_deref())
    }

    /// Stable-sort parts into the configured category order.
    ///
    /// Categories missing from `order` keep their first-seen order after the
    /// configured ones; parts within a category keep their relative order.
    pub fn order_parts(&self, parts: Vec<Part>) -> Vec<Part> {
        let mut unlisted: Vec<String> = Vec::new();
        for part in &parts {
            if !self.order.contains(&part.category) && !unlisted.contains(&part.category) {
                unlisted.push(part.category.clone());
            }
        }
        let rank = |category: &str| {
            self.order
                .iter()
                .chain(unlisted.iter())
                .position(|c| c == category)
                .unwrap_or(usize::MAX)
        };
        let mut parts = parts;
        parts.sort_by_key(|p| rank(&p.category));
        parts
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_builtin_is_valid() {
        let table = StyleTable::builtin();
        table.validate().unwrap();
        assert_eq!(table.order.len(), 7);
        assert!(table.is_nestable("ribs"));
        assert!(!table.is_nestable("handrail"));
        assert_eq!(table.stock_for("carriages"), Some("50mm_structural"));
        assert_relative_eq!(table.style("treads").unwrap().opacity, 0.5);
    }

    #[test]
    fn test_parse_toml() {
        let table = StyleTable::parse(
            r#"
order = ["stringers", "treads"]
roughness = 0.5

[categories.stringers]
color = [0.55, 0.38, 0.20]
stock = "ply"
nestable = true

[categories.treads]
color = [0.72, 0.52, 0.30]
opacity = 0.4
metallic = 0.2

[stock.ply]
thickness = 18.0
"#,
        )
        .unwrap();

        let stringers = table.style("stringers").unwrap();
        assert_relative_eq!(stringers.opacity, 1.0);
        assert_relative_eq!(table.metallic_for(stringers), 0.05);
        assert_relative_eq!(table.roughness_for(stringers), 0.5);
        let treads = table.style("treads").unwrap();
        assert_relative_eq!(table.metallic_for(treads), 0.2);
        assert!(!table.is_nestable("treads"));
    }

    #[test]
    fn test_rejects_unknown_stock() {
        let err = StyleTable::parse(
            r#"
[categories.ribs]
color = [0.6, 0.45, 0.25]
stock = "missing"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_out_of_range_opacity() {
        let err = StyleTable::parse(
            r#"
[categories.ribs]
color = [0.6, 0.45, 0.25]
opacity = 1.5
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("opacity"));
    }

    #[test]
    fn test_order_parts_is_stable() {
        let table = StyleTable::builtin();
        let parts = vec![
            Part::cuboid("stringers", [0.0; 3], [1.0; 3]),
            Part::cuboid("treads", [0.0; 3], [2.0; 3]),
            Part::cuboid("custom", [0.0; 3], [3.0; 3]),
            Part::cuboid("treads", [0.0; 3], [4.0; 3]),
        ];
        let ordered = table.order_parts(parts);
        let categories: Vec<&str> = ordered.iter().map(|p| p.category.as_str()).collect();
        assert_eq!(categories, ["treads", "treads", "stringers", "custom"]);
        assert_relative_eq!(ordered[0].bounding_box.max[0], 2.0);
        assert_relative_eq!(ordered[1].bounding_box.max[0], 4.0);
    }
}
