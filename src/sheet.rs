//! Plain-text specification sheet for a configured part.

use crate::catalog::ParamValue;
use crate::wizard::Configurator;

fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

fn inches(value: f64) -> String {
    format!("{value:.3} in")
}

pub fn render(configurator: &Configurator) -> String {
    let catalog = configurator.catalog();
    let selections = configurator.selections();
    let mut lines = vec!["PART SPECIFICATION".to_string(), "=".repeat(40)];

    lines.push(String::new());
    lines.push("Part".to_string());
    if let Some(selected) = configurator.template() {
        let template = catalog.template(&selected.template_id);
        let name = template.map_or(selected.template_id.as_str(), |t| t.name.as_str());
        lines.push(format!("  Template: {name}"));
        for (key, value) in &selected.params {
            let label = template
                .and_then(|t| t.param(key))
                .map_or(key.as_str(), |p| p.label.as_str());
            let value = match value {
                ParamValue::Number(n) => inches(*n),
                ParamValue::Flag(b) => (if *b { "yes" } else { "no" }).to_string(),
                ParamValue::Text(s) => s.clone(),
            };
            lines.push(format!("  {label}: {value}"));
        }
    }
    if let Some(file) = configurator.upload() {
        lines.push(format!("  Drawing: {} ({} bytes)", file.name, file.size));
    }
    match configurator.dimensions() {
        Some(dims) => {
            lines.push(format!("  Size: {} x {}", inches(dims.width), inches(dims.height)));
            lines.push(format!("  Area: {:.3} sq in", dims.area));
            lines.push(format!("  Perimeter: {}", inches(dims.perimeter)));
        }
        None => lines.push("  Size: not specified".to_string()),
    }

    lines.push(String::new());
    let material = selections
        .material
        .as_ref()
        .and_then(|m| catalog.material_label(&m.category, &m.subcategory, &m.gauge))
        .unwrap_or_else(|| "not selected".to_string());
    lines.push(format!("Material: {material}"));

    lines.push("Services:".to_string());
    if selections.services.is_empty() {
        lines.push("  none".to_string());
    }
    for choice in &selections.services {
        let name = catalog.service(&choice.id).map_or(choice.id.as_str(), |s| s.name.as_str());
        let mut details = Vec::new();
        let o = &choice.options;
        if let Some(t) = o.weld_type {
            details.push(format!("{t:?} weld").to_lowercase());
        }
        if let Some(v) = o.weld_length {
            details.push(format!("{v} in weld"));
        }
        for (count, unit) in [
            (o.spot_count, "spots"),
            (o.bend_count, "bends"),
            (o.hole_count, "holes"),
            (o.hardware_count, "hardware"),
        ] {
            if let Some(n) = count {
                details.push(format!("{n} {unit}"));
            }
        }
        if details.is_empty() {
            lines.push(format!("  - {name}"));
        } else {
            lines.push(format!("  - {name} ({})", details.join(", ")));
        }
    }

    let finish = selections
        .finish
        .as_ref()
        .and_then(|choice| {
            let finish = catalog.finish(&choice.id)?;
            Some(match choice.option.as_deref().and_then(|o| finish.option(o)) {
                Some(option) => format!("{} ({})", finish.name, option.name),
                None => finish.name.clone(),
            })
        })
        .unwrap_or_else(|| "none".to_string());
    lines.push(format!("Finish: {finish}"));
    lines.push(format!("Quantity: {}", selections.quantity));

    lines.push(String::new());
    match configurator.price() {
        Some(price) => {
            lines.push("Estimate (per part)".to_string());
            lines.push(format!("  Material: {}", money(price.material_cost)));
            lines.push(format!("  Cutting: {}", money(price.cutting_cost)));
            for line in &price.service_lines {
                lines.push(format!("  {}: {}", line.name, money(line.amount)));
            }
            if price.finish_cost != 0.0 {
                lines.push(format!("  Finish: {}", money(price.finish_cost)));
            }
            lines.push(format!("  Subtotal: {}", money(price.subtotal)));
            if price.volume_discount > 0.0 {
                lines.push(format!(
                    "Volume discount ({:.0}%): -{}",
                    price.discount_rate * 100.0,
                    money(price.volume_discount)
                ));
            }
            lines.push(format!("Unit price: {}", money(price.unit_price)));
            lines.push(format!("Total: {}", money(price.total)));
        }
        None => lines.push("Estimate: add material and dimensions to see a price".to_string()),
    }

    lines.push(String::new());
    lines.push("Estimates are not binding; final pricing is confirmed with your quote.".to_string());
    lines.join("\n") + "\n"
}
