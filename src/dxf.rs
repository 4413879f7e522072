//! ASCII DXF (R12) export of part models.
//!
//! Outline primitives go on layer `OUTLINE`; each child model gets its own
//! layer named after it (e.g. `HOLE`, `HOLES`). Units are inches.

use crate::shapes::{Model, Primitive};
use std::fmt::Display;

const OUTLINE_LAYER: &str = "OUTLINE";

struct DxfWriter {
    out: String,
}

impl DxfWriter {
    fn new() -> Self {
        Self { out: String::new() }
    }

    fn pair(&mut self, code: u16, value: impl Display) {
        self.out.push_str(&format!("{code}\n{value}\n"));
    }

    fn coord(&mut self, code: u16, value: f64) {
        self.pair(code, format!("{value:.6}"));
    }

    fn section(&mut self, name: &str) {
        self.pair(0, "SECTION");
        self.pair(2, name);
    }

    fn end_section(&mut self) {
        self.pair(0, "ENDSEC");
    }

    fn header(&mut self) {
        self.section("HEADER");
        self.pair(9, "$ACADVER");
        self.pair(1, "AC1009");
        self.pair(9, "$INSUNITS");
        self.pair(70, 1);
        self.end_section();
    }

    fn tables(&mut self, layers: &[String]) {
        self.section("TABLES");

        self.pair(0, "TABLE");
        self.pair(2, "LTYPE");
        self.pair(70, 1);
        self.pair(0, "LTYPE");
        self.pair(2, "CONTINUOUS");
        self.pair(70, 0);
        self.pair(3, "Solid line");
        self.pair(72, 65);
        self.pair(73, 0);
        self.pair(40, "0.0");
        self.pair(0, "ENDTAB");

        self.pair(0, "TABLE");
        self.pair(2, "LAYER");
        self.pair(70, layers.len());
        for (i, layer) in layers.iter().enumerate() {
            self.pair(0, "LAYER");
            self.pair(2, layer);
            self.pair(70, 0);
            // White outline, cutouts cycle through ACI colours 1..=6.
            self.pair(62, if i == 0 { 7 } else { (i - 1) % 6 + 1 });
            self.pair(6, "CONTINUOUS");
        }
        self.pair(0, "ENDTAB");

        self.end_section();
    }

    fn entity(&mut self, layer: &str, primitive: &Primitive) {
        match *primitive {
            Primitive::Line { start, end } => {
                self.pair(0, "LINE");
                self.pair(8, layer);
                self.coord(10, start.x);
                self.coord(20, start.y);
                self.coord(11, end.x);
                self.coord(21, end.y);
            }
            Primitive::Arc { center, radius, start_angle, end_angle } => {
                self.pair(0, "ARC");
                self.pair(8, layer);
                self.coord(10, center.x);
                self.coord(20, center.y);
                self.coord(40, radius);
                self.coord(50, start_angle.rem_euclid(360.0));
                self.coord(51, end_angle.rem_euclid(360.0));
            }
            Primitive::Circle { center, radius } => {
                self.pair(0, "CIRCLE");
                self.pair(8, layer);
                self.coord(10, center.x);
                self.coord(20, center.y);
                self.coord(40, radius);
            }
        }
    }

    fn model(&mut self, layer: &str, model: &Model) {
        for primitive in &model.paths {
            self.entity(layer, primitive);
        }
        for (name, child) in &model.models {
            self.model(&layer_name(name), child);
        }
    }

    fn finish(mut self) -> String {
        self.pair(0, "EOF");
        self.out
    }
}

fn layer_name(model_name: &str) -> String {
    model_name.to_ascii_uppercase()
}

fn collect_layers(model: &Model, layers: &mut Vec<String>) {
    for (name, child) in &model.models {
        let layer = layer_name(name);
        if !layers.contains(&layer) {
            layers.push(layer);
        }
        collect_layers(child, layers);
    }
}

/// Renders a model as a complete DXF document.
pub fn to_dxf(model: &Model) -> String {
    let mut layers = vec![OUTLINE_LAYER.to_string()];
    collect_layers(model, &mut layers);

    let mut writer = DxfWriter::new();
    writer.header();
    writer.tables(&layers);
    writer.section("ENTITIES");
    writer.model(OUTLINE_LAYER, model);
    writer.end_section();
    writer.finish()
}
