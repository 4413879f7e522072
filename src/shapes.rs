//! 2D part geometry: primitives, models and the template registry.
//!
//! Every template id maps to one construction function. Models are built in
//! inches with the lower-left of the part near the origin, and feed both the
//! preview JSON and the DXF writer.

use crate::catalog::ParamValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type ParamMap = BTreeMap<String, ParamValue>;

pub const DEFAULT_TEMPLATE: &str = "rectangle";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn polar(center: Point, radius: f64, degrees: f64) -> Self {
        let rad = degrees.to_radians();
        Self::new(center.x + radius * rad.cos(), center.y + radius * rad.sin())
    }
}

/// Angles are in degrees, arcs run counter-clockwise from `start_angle`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Line {
        start: Point,
        end: Point,
    },
    Arc {
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    Circle {
        center: Point,
        radius: f64,
    },
}

impl Primitive {
    fn line(start: Point, end: Point) -> Self {
        Primitive::Line { start, end }
    }

    fn circle(center: Point, diameter: f64) -> Self {
        Primitive::Circle { center, radius: diameter / 2.0 }
    }

    fn extend(&self, bounds: &mut Bounds) {
        match *self {
            Primitive::Line { start, end } => {
                bounds.include(start);
                bounds.include(end);
            }
            Primitive::Circle { center, radius } => {
                bounds.include(Point::new(center.x - radius, center.y - radius));
                bounds.include(Point::new(center.x + radius, center.y + radius));
            }
            Primitive::Arc { center, radius, start_angle, end_angle } => {
                bounds.include(Point::polar(center, radius, start_angle));
                bounds.include(Point::polar(center, radius, end_angle));
                let sweep = (end_angle - start_angle).rem_euclid(360.0);
                for cardinal in [0.0, 90.0, 180.0, 270.0] {
                    if (cardinal - start_angle).rem_euclid(360.0) <= sweep {
                        bounds.include(Point::polar(center, radius, cardinal));
                    }
                }
            }
        }
    }
}

/// A set of primitives plus named child models (cutouts).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub paths: Vec<Primitive>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<String, Model>,
}

impl Model {
    pub fn from_paths(paths: Vec<Primitive>) -> Self {
        Self { paths, models: BTreeMap::new() }
    }

    pub fn with_child(mut self, name: &str, child: Model) -> Self {
        self.models.insert(name.to_string(), child);
        self
    }

    pub fn primitive_count(&self) -> usize {
        self.paths.len() + self.models.values().map(Model::primitive_count).sum::<usize>()
    }

    /// Every primitive in this model and its children, depth first.
    pub fn primitives(&self) -> Vec<&Primitive> {
        let mut out: Vec<&Primitive> = self.paths.iter().collect();
        for child in self.models.values() {
            out.extend(child.primitives());
        }
        out
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut bounds = Bounds::empty();
        for primitive in self.primitives() {
            primitive.extend(&mut bounds);
        }
        bounds.is_set().then_some(bounds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    fn empty() -> Self {
        Self {
            min: Point::new(f64::INFINITY, f64::INFINITY),
            max: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    fn is_set(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    fn include(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Derived part measurements used for pricing.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PartDimensions {
    pub width: f64,
    pub height: f64,
    pub area: f64,
    pub perimeter: f64,
}

impl PartDimensions {
    /// Area and perimeter are those of the bounding box, for every shape.
    pub fn from_extent(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            area: width * height,
            perimeter: 2.0 * (width + height),
        }
    }
}

pub fn measure(model: &Model) -> PartDimensions {
    match model.bounds() {
        Some(b) => PartDimensions::from_extent(b.width(), b.height()),
        None => PartDimensions::from_extent(0.0, 0.0),
    }
}

/// Typed access to a flat parameter map with per-recipe defaults.
pub struct ParamReader<'a> {
    params: &'a ParamMap,
}

impl<'a> ParamReader<'a> {
    pub fn new(params: &'a ParamMap) -> Self {
        Self { params }
    }

    pub fn number(&self, name: &str, default: f64) -> f64 {
        self.params
            .get(name)
            .and_then(ParamValue::as_number)
            .filter(|n| n.is_finite())
            .unwrap_or(default)
    }
}

pub type ShapeFn = fn(&ParamReader<'_>) -> Model;

/// Maps template ids to geometry construction functions.
#[derive(Clone)]
pub struct ShapeRegistry {
    recipes: HashMap<String, ShapeFn>,
}

impl ShapeRegistry {
    pub fn empty() -> Self {
        Self { recipes: HashMap::new() }
    }

    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register("rectangle", rectangle);
        registry.register("circle", circle);
        registry.register("triangle", triangle);
        registry.register("mounting_plate", mounting_plate);
        registry.register("washer", washer);
        registry.register("star", star);
        registry.register("hexagon", hexagon);
        registry.register("arrow", arrow);
        registry
    }

    pub fn register(&mut self, id: &str, recipe: ShapeFn) {
        self.recipes.insert(id.to_string(), recipe);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.recipes.contains_key(id)
    }

    /// Unknown ids build the default rectangle.
    pub fn build(&self, template_id: &str, params: &ParamMap) -> Model {
        let recipe = match self.recipes.get(template_id) {
            Some(recipe) => *recipe,
            None => {
                tracing::debug!(template_id, "unknown template, using default rectangle");
                self.recipes.get(DEFAULT_TEMPLATE).copied().unwrap_or(rectangle)
            }
        };
        recipe(&ParamReader::new(params))
    }
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn polygon(points: &[Point]) -> Vec<Primitive> {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| Primitive::line(*a, *b))
        .collect()
}

fn rectangle(p: &ParamReader<'_>) -> Model {
    let w = p.number("width", 6.0);
    let h = p.number("height", 4.0);
    let r = p.number("corner_radius", 0.0).clamp(0.0, w.min(h) / 2.0);

    if r <= 0.0 {
        return Model::from_paths(polygon(&[
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ]));
    }

    let arc = |cx: f64, cy: f64, start: f64| Primitive::Arc {
        center: Point::new(cx, cy),
        radius: r,
        start_angle: start,
        end_angle: start + 90.0,
    };
    Model::from_paths(vec![
        Primitive::line(Point::new(r, 0.0), Point::new(w - r, 0.0)),
        Primitive::line(Point::new(w, r), Point::new(w, h - r)),
        Primitive::line(Point::new(w - r, h), Point::new(r, h)),
        Primitive::line(Point::new(0.0, h - r), Point::new(0.0, r)),
        arc(w - r, r, 270.0),
        arc(w - r, h - r, 0.0),
        arc(r, h - r, 90.0),
        arc(r, r, 180.0),
    ])
}

/// A hole at least as wide as the disc is left out.
fn circle(p: &ParamReader<'_>) -> Model {
    let d = p.number("diameter", 6.0);
    let hole = p.number("hole_diameter", 0.0);
    let center = Point::new(d / 2.0, d / 2.0);
    let model = Model::from_paths(vec![Primitive::circle(center, d)]);
    if hole >= d {
        tracing::debug!(hole, diameter = d, "hole does not fit the disc; left out");
    }
    if hole > 0.0 && hole < d {
        model.with_child("hole", Model::from_paths(vec![Primitive::circle(center, hole)]))
    } else {
        model
    }
}

fn triangle(p: &ParamReader<'_>) -> Model {
    let base = p.number("base", 6.0);
    let h = p.number("height", 4.0);
    Model::from_paths(polygon(&[
        Point::new(0.0, 0.0),
        Point::new(base, 0.0),
        Point::new(base / 2.0, h),
    ]))
}

fn mounting_plate(p: &ParamReader<'_>) -> Model {
    let w = p.number("width", 6.0);
    let h = p.number("height", 6.0);
    let hole = p.number("hole_diameter", 0.375);
    let inset = p.number("hole_inset", 0.75);

    let outline = polygon(&[
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    ]);
    let holes = [
        Point::new(inset, inset),
        Point::new(w - inset, inset),
        Point::new(w - inset, h - inset),
        Point::new(inset, h - inset),
    ]
    .into_iter()
    .map(|c| Primitive::circle(c, hole))
    .collect();
    Model::from_paths(outline).with_child("holes", Model::from_paths(holes))
}

/// An inner diameter that does not fit inside the outer one becomes half of it.
fn washer(p: &ParamReader<'_>) -> Model {
    let outer = p.number("outer_diameter", 3.0);
    let mut inner = p.number("inner_diameter", 1.5);
    if inner >= outer {
        tracing::debug!(inner, outer, "washer inner diameter reduced to half the outer");
        inner = outer / 2.0;
    }
    let center = Point::new(outer / 2.0, outer / 2.0);
    Model::from_paths(vec![Primitive::circle(center, outer)])
        .with_child("hole", Model::from_paths(vec![Primitive::circle(center, inner)]))
}

fn star(_: &ParamReader<'_>) -> Model {
    let center = Point::new(3.0, 3.0);
    let points: Vec<Point> = (0..10)
        .map(|i| {
            let radius = if i % 2 == 0 { 3.0 } else { 1.2 };
            Point::polar(center, radius, 90.0 + 36.0 * i as f64)
        })
        .collect();
    Model::from_paths(polygon(&points))
}

fn hexagon(_: &ParamReader<'_>) -> Model {
    let side = 2.0;
    let center = Point::new(side, side * 3f64.sqrt() / 2.0);
    let points: Vec<Point> = (0..6).map(|i| Point::polar(center, side, 60.0 * i as f64)).collect();
    Model::from_paths(polygon(&points))
}

fn arrow(_: &ParamReader<'_>) -> Model {
    Model::from_paths(polygon(&[
        Point::new(0.0, 1.25),
        Point::new(5.0, 1.25),
        Point::new(5.0, 0.0),
        Point::new(8.0, 2.0),
        Point::new(5.0, 4.0),
        Point::new(5.0, 2.75),
        Point::new(0.0, 2.75),
    ]))
}
