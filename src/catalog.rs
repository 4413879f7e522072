use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const BUNDLED_CATALOG: &str = include_str!("../data/catalog.yaml");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

/// A single parameter value as edited in the configurator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Flag(_) => ParamKind::Boolean,
            ParamValue::Number(_) => ParamKind::Number,
            ParamValue::Text(_) => ParamKind::Text,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Number,
    Text,
    Boolean,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TemplateParam {
    pub name: String,
    pub label: String,
    pub kind: ParamKind,
    pub default: ParamValue,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl TemplateParam {
    /// Clamps a numeric value into the parameter's `[min, max]` range.
    pub fn clamp(&self, value: f64) -> f64 {
        let lower = self.min.unwrap_or(f64::NEG_INFINITY);
        let upper = self.max.unwrap_or(f64::INFINITY);
        value.max(lower).min(upper)
    }
}

/// A parameterized 2D part recipe offered by the configurator.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Decorative shapes with no adjustable parameters.
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub params: Vec<TemplateParam>,
}

impl Template {
    pub fn param(&self, name: &str) -> Option<&TemplateParam> {
        self.params.iter().find(|p| p.name == name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Gauge {
    pub id: String,
    pub label: String,
    pub thickness: f64,
    pub price_per_sq_in: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MaterialSubcategory {
    pub id: String,
    pub name: String,
    pub gauges: Vec<Gauge>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MaterialCategory {
    pub id: String,
    pub name: String,
    pub subcategories: Vec<MaterialSubcategory>,
}

/// Service-specific add-on pricing, driven by the service's option bag.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceRule {
    #[default]
    None,
    Welding {
        setup_fee: f64,
        per_inch: f64,
        per_spot: f64,
    },
    Bending {
        per_bend: f64,
    },
    Tapping {
        per_hole: f64,
    },
    Hardware {
        per_unit: f64,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub base_price: f64,
    #[serde(default)]
    pub price_per_sq_in: f64,
    #[serde(default)]
    pub rule: ServiceRule,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FinishOption {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub upcharge: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Finish {
    pub id: String,
    pub name: String,
    pub multiplier: f64,
    #[serde(default)]
    pub options: Vec<FinishOption>,
}

impl Finish {
    pub fn option(&self, id: &str) -> Option<&FinishOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DiscountTier {
    pub min_qty: u32,
    /// `None` means the tier has no upper bound.
    pub max_qty: Option<u32>,
    pub discount: f64,
}

impl DiscountTier {
    pub fn contains(&self, quantity: u32) -> bool {
        quantity >= self.min_qty && self.max_qty.is_none_or(|max| quantity <= max)
    }
}

/// Read-only lookup tables for templates, materials, services, finishes and
/// volume discounts. Loaded once at start-up.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Catalog {
    pub cutting_rate_per_inch: f64,
    pub templates: Vec<Template>,
    pub materials: Vec<MaterialCategory>,
    pub services: Vec<Service>,
    pub finishes: Vec<Finish>,
    #[serde(default)]
    pub discount_tiers: Vec<DiscountTier>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_yaml(BUNDLED_CATALOG)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_yaml::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.cutting_rate_per_inch < 0.0 {
            return Err(CatalogError::Invalid("cutting rate must not be negative".into()));
        }
        for template in &self.templates {
            for param in &template.params {
                if param.default.kind() != param.kind {
                    return Err(CatalogError::Invalid(format!(
                        "template '{}' param '{}' default does not match its kind",
                        template.id, param.name
                    )));
                }
            }
        }
        for finish in &self.finishes {
            if finish.multiplier < 1.0 {
                return Err(CatalogError::Invalid(format!(
                    "finish '{}' multiplier is below 1",
                    finish.id
                )));
            }
        }
        self.validate_tiers()
    }

    /// Tiers must start at 1, be contiguous and non-overlapping, and only the
    /// last one may be unbounded.
    fn validate_tiers(&self) -> Result<(), CatalogError> {
        let Some(first) = self.discount_tiers.first() else {
            return Ok(());
        };
        if first.min_qty != 1 {
            return Err(CatalogError::Invalid("first discount tier must start at 1".into()));
        }
        let last = self.discount_tiers.len() - 1;
        for (i, tier) in self.discount_tiers.iter().enumerate() {
            if !(0.0..1.0).contains(&tier.discount) {
                return Err(CatalogError::Invalid(format!(
                    "discount tier {} fraction {} is outside [0, 1)",
                    i, tier.discount
                )));
            }
            match tier.max_qty {
                Some(max) if max < tier.min_qty => {
                    return Err(CatalogError::Invalid(format!(
                        "discount tier {} ends before it starts",
                        i
                    )));
                }
                None if i != last => {
                    return Err(CatalogError::Invalid(format!(
                        "discount tier {} is unbounded but not last",
                        i
                    )));
                }
                _ => {}
            }
            if let (Some(max), Some(next)) = (tier.max_qty, self.discount_tiers.get(i + 1)) {
                if max.checked_add(1) != Some(next.min_qty) {
                    return Err(CatalogError::Invalid(format!(
                        "discount tiers {} and {} are not contiguous",
                        i,
                        i + 1
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn gauge(&self, category: &str, subcategory: &str, gauge: &str) -> Option<&Gauge> {
        self.materials
            .iter()
            .find(|c| c.id == category)?
            .subcategories
            .iter()
            .find(|s| s.id == subcategory)?
            .gauges
            .iter()
            .find(|g| g.id == gauge)
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn finish(&self, id: &str) -> Option<&Finish> {
        self.finishes.iter().find(|f| f.id == id)
    }

    /// Last tier in table order whose range contains `quantity`.
    pub fn discount_for(&self, quantity: u32) -> Option<&DiscountTier> {
        self.discount_tiers.iter().rev().find(|t| t.contains(quantity))
    }

    /// Human-readable material name, e.g. "Mild Steel (A36), 16 ga (0.060\")".
    pub fn material_label(&self, category: &str, subcategory: &str, gauge: &str) -> Option<String> {
        let sub = self
            .materials
            .iter()
            .find(|c| c.id == category)?
            .subcategories
            .iter()
            .find(|s| s.id == subcategory)?;
        let gauge = sub.gauges.iter().find(|g| g.id == gauge)?;
        Some(format!("{}, {}", sub.name, gauge.label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(min_qty: u32, max_qty: Option<u32>, discount: f64) -> DiscountTier {
        DiscountTier { min_qty, max_qty, discount }
    }

    #[test]
    fn bundled_catalog_loads() {
        let catalog = Catalog::bundled().unwrap();
        assert!(catalog.template("rectangle").is_some());
        assert!(catalog.template("star").unwrap().fixed);
        let gauge = catalog.gauge("steel", "mild_steel", "16ga").unwrap();
        assert_eq!(gauge.price_per_sq_in, 0.01);
        assert_eq!(catalog.cutting_rate_per_inch, 0.02);
        assert!(matches!(
            catalog.service("welding").unwrap().rule,
            ServiceRule::Welding { .. }
        ));
        assert_eq!(catalog.service("deburring").unwrap().rule, ServiceRule::None);
    }

    #[test]
    fn hole_limits_are_described() {
        let catalog = Catalog::bundled().unwrap();
        assert!(catalog.template("circle").unwrap().description.contains("left out"));
        assert!(catalog.template("washer").unwrap().description.contains("half the outer"));
    }

    #[test]
    fn bundled_tiers_match_exactly_one_predicate() {
        let catalog = Catalog::bundled().unwrap();
        for qty in 1..=500 {
            let matching = catalog.discount_tiers.iter().filter(|t| t.contains(qty)).count();
            assert_eq!(matching, 1, "quantity {qty}");
        }
    }

    #[test]
    fn discount_lookup_picks_containing_tier() {
        let catalog = Catalog::bundled().unwrap();
        assert_eq!(catalog.discount_for(1).unwrap().discount, 0.0);
        assert_eq!(catalog.discount_for(49).unwrap().discount, 0.05);
        assert_eq!(catalog.discount_for(50).unwrap().discount, 0.08);
        assert_eq!(catalog.discount_for(10_000).unwrap().discount, 0.1);
    }

    #[test]
    fn rejects_gap_between_tiers() {
        let mut catalog = Catalog::bundled().unwrap();
        catalog.discount_tiers = vec![tier(1, Some(9), 0.0), tier(11, None, 0.1)];
        assert!(matches!(catalog.validate(), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn rejects_overlapping_tiers() {
        let mut catalog = Catalog::bundled().unwrap();
        catalog.discount_tiers = vec![tier(1, Some(10), 0.0), tier(10, None, 0.1)];
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn rejects_tier_after_maximum_quantity() {
        let mut catalog = Catalog::bundled().unwrap();
        catalog.discount_tiers = vec![tier(1, Some(u32::MAX), 0.0), tier(0, None, 0.1)];
        assert!(matches!(catalog.validate(), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn rejects_unbounded_tier_before_last() {
        let mut catalog = Catalog::bundled().unwrap();
        catalog.discount_tiers = vec![tier(1, None, 0.0), tier(10, None, 0.1)];
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn rejects_mistyped_param_default() {
        let raw = r#"
cutting_rate_per_inch: 0.02
templates:
  - id: rectangle
    name: Rectangle
    params:
      - { name: width, label: Width, kind: number, default: wide }
materials: []
services: []
finishes: []
"#;
        assert!(matches!(Catalog::from_yaml(raw), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn material_label_joins_subcategory_and_gauge() {
        let catalog = Catalog::bundled().unwrap();
        assert_eq!(
            catalog.material_label("aluminum", "al_5052", "0.090").unwrap(),
            "Aluminum 5052-H32, 0.090\""
        );
        assert!(catalog.material_label("aluminum", "al_5052", "9ga").is_none());
    }
}
