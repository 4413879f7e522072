use crate::catalog::{Catalog, Service, ServiceRule};
use crate::shapes::PartDimensions;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MaterialChoice {
    pub category: String,
    pub subcategory: String,
    pub gauge: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeldType {
    #[default]
    Seam,
    Spot,
}

/// Per-service configuration bag. Only the fields a service's rule reads
/// affect its price.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ServiceOptions {
    pub weld_type: Option<WeldType>,
    pub weld_length: Option<f64>,
    pub spot_count: Option<u32>,
    pub bend_count: Option<u32>,
    pub hole_count: Option<u32>,
    pub hardware_count: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServiceChoice {
    pub id: String,
    #[serde(default)]
    pub options: ServiceOptions,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FinishChoice {
    pub id: String,
    #[serde(default)]
    pub option: Option<String>,
}

/// The price-relevant selections of one configured part.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Selections {
    pub material: Option<MaterialChoice>,
    pub services: Vec<ServiceChoice>,
    pub finish: Option<FinishChoice>,
    pub quantity: u32,
}

impl Default for Selections {
    fn default() -> Self {
        Self {
            material: None,
            services: Vec::new(),
            finish: None,
            quantity: 1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServiceLine {
    pub id: String,
    pub name: String,
    pub amount: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriceBreakdown {
    pub material_cost: f64,
    pub cutting_cost: f64,
    pub services_cost: f64,
    pub service_lines: Vec<ServiceLine>,
    pub finish_cost: f64,
    /// Per-part price before quantity and discount.
    pub subtotal: f64,
    pub quantity: u32,
    pub discount_rate: f64,
    pub volume_discount: f64,
    pub total: f64,
    pub unit_price: f64,
}

/// Computes the full price breakdown, or `None` while material or
/// dimensions are still missing.
pub fn calculate(
    catalog: &Catalog,
    selections: &Selections,
    dimensions: Option<&PartDimensions>,
) -> Option<PriceBreakdown> {
    let dims = dimensions?;
    let material = selections.material.as_ref()?;
    let gauge = catalog.gauge(&material.category, &material.subcategory, &material.gauge)?;

    let material_cost = dims.area * gauge.price_per_sq_in;
    let cutting_cost = dims.perimeter * catalog.cutting_rate_per_inch;

    let service_lines: Vec<ServiceLine> = selections
        .services
        .iter()
        .filter_map(|choice| {
            let service = catalog.service(&choice.id)?;
            Some(ServiceLine {
                id: service.id.clone(),
                name: service.name.clone(),
                amount: service_cost(service, &choice.options, dims.area),
            })
        })
        .collect();
    let services_cost: f64 = service_lines.iter().map(|l| l.amount).sum();

    let (multiplier, upcharge) = selections
        .finish
        .as_ref()
        .and_then(|choice| {
            let finish = catalog.finish(&choice.id)?;
            let upcharge = choice
                .option
                .as_deref()
                .and_then(|id| finish.option(id))
                .map_or(0.0, |o| o.upcharge);
            Some((finish.multiplier, upcharge))
        })
        .unwrap_or((1.0, 0.0));

    let base = material_cost + cutting_cost + services_cost;
    let finish_cost = base * (multiplier - 1.0) + upcharge;
    let subtotal = base + finish_cost;

    let quantity = selections.quantity.max(1);
    let discount_rate = catalog.discount_for(quantity).map_or(0.0, |t| t.discount);
    let gross = subtotal * quantity as f64;
    let volume_discount = gross * discount_rate;
    let total = gross - volume_discount;

    Some(PriceBreakdown {
        material_cost,
        cutting_cost,
        services_cost,
        service_lines,
        finish_cost,
        subtotal,
        quantity,
        discount_rate,
        volume_discount,
        total,
        unit_price: total / quantity as f64,
    })
}

fn service_cost(service: &Service, options: &ServiceOptions, area: f64) -> f64 {
    let base = service.base_price + service.price_per_sq_in * area;
    let extras = match service.rule {
        ServiceRule::None => 0.0,
        ServiceRule::Welding { setup_fee, per_inch, per_spot } => match options.weld_type.unwrap_or_default() {
            WeldType::Seam => setup_fee + per_inch * options.weld_length.unwrap_or(0.0).max(0.0),
            WeldType::Spot => setup_fee + per_spot * options.spot_count.unwrap_or(0) as f64,
        },
        ServiceRule::Bending { per_bend } => per_bend * options.bend_count.unwrap_or(0) as f64,
        ServiceRule::Tapping { per_hole } => per_hole * options.hole_count.unwrap_or(0) as f64,
        ServiceRule::Hardware { per_unit } => per_unit * options.hardware_count.unwrap_or(0) as f64,
    };
    base + extras
}
