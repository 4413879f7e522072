//! The parts configurator: a step-by-step wizard that owns every selection
//! of one configuration session and keeps dimensions and price current.

use crate::catalog::{Catalog, ParamKind, ParamValue};
use crate::dxf;
use crate::pricing::{self, FinishChoice, MaterialChoice, PriceBreakdown, Selections, ServiceChoice, ServiceOptions};
use crate::shapes::{self, Model, ParamMap, PartDimensions, ShapeRegistry};
use crate::sheet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfiguratorError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
    #[error("No template selected")]
    NoTemplate,
    #[error("Template '{template}' has no parameter '{param}'")]
    UnknownParam { template: String, param: String },
    #[error("Parameter '{param}' expects a {expected:?} value")]
    KindMismatch { param: String, expected: ParamKind },
    #[error("Invalid value for '{0}'")]
    InvalidValue(String),
    #[error("Unknown material: {0}")]
    UnknownMaterial(String),
    #[error("Unknown service: {0}")]
    UnknownService(String),
    #[error("Unknown finish: {0}")]
    UnknownFinish(String),
    #[error("Finish '{finish}' has no option '{option}'")]
    UnknownFinishOption { finish: String, option: String },
    #[error("Step {step:?} is not part of the current path")]
    StepNotInPath { step: Step },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Pseudo-step shown before a path has been chosen.
    Entry,
    Template,
    Dimensions,
    Upload,
    Material,
    Services,
    Finish,
    Review,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryPath {
    /// Pick a template and size it.
    Scratch,
    /// Pick a ready-made fixed shape.
    Library,
    /// Send a customer drawing; no template or dimensions step.
    Upload,
}

impl EntryPath {
    pub fn steps(self) -> &'static [Step] {
        use Step::*;
        match self {
            EntryPath::Scratch => &[Template, Dimensions, Material, Services, Finish, Review],
            EntryPath::Library => &[Template, Material, Services, Finish, Review],
            EntryPath::Upload => &[Upload, Material, Services, Finish, Review],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SelectedTemplate {
    pub template_id: String,
    pub params: ParamMap,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
}

/// One configuration session. Every mutation recomputes dimensions and price.
#[derive(Clone)]
pub struct Configurator {
    catalog: Arc<Catalog>,
    shapes: Arc<ShapeRegistry>,
    path: Option<EntryPath>,
    step: Step,
    template: Option<SelectedTemplate>,
    manual_dimensions: Option<(f64, f64)>,
    upload: Option<UploadedFile>,
    selections: Selections,
    dimensions: Option<PartDimensions>,
    price: Option<PriceBreakdown>,
}

impl Configurator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_shapes(catalog, Arc::new(ShapeRegistry::standard()))
    }

    pub fn with_shapes(catalog: Arc<Catalog>, shapes: Arc<ShapeRegistry>) -> Self {
        Self {
            catalog,
            shapes,
            path: None,
            step: Step::Entry,
            template: None,
            manual_dimensions: None,
            upload: None,
            selections: Selections::default(),
            dimensions: None,
            price: None,
        }
    }

    // --- navigation ---

    /// Drops selections the new path has no step for: the template on the
    /// upload path, the drawing and its manual size on the others.
    pub fn open(&mut self, path: EntryPath) {
        self.path = Some(path);
        self.step = path.steps()[0];
        match path {
            EntryPath::Upload => self.template = None,
            EntryPath::Scratch | EntryPath::Library => {
                self.manual_dimensions = None;
                self.upload = None;
            }
        }
        self.recompute();
    }

    pub fn advance(&mut self) {
        if let Some(i) = self.position() {
            let steps = self.steps();
            if i + 1 < steps.len() {
                self.step = steps[i + 1];
            }
        }
    }

    /// Never moves back onto the entry pseudo-step.
    pub fn retreat(&mut self) {
        if let Some(i) = self.position() {
            if i > 0 {
                self.step = self.steps()[i - 1];
            }
        }
    }

    pub fn jump_to(&mut self, step: Step) -> Result<(), ConfiguratorError> {
        if !self.steps().contains(&step) {
            return Err(ConfiguratorError::StepNotInPath { step });
        }
        self.step = step;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::with_shapes(self.catalog.clone(), self.shapes.clone());
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn path(&self) -> Option<EntryPath> {
        self.path
    }

    pub fn steps(&self) -> &'static [Step] {
        self.path.map(EntryPath::steps).unwrap_or(&[])
    }

    /// Selections made before a path is chosen are always accepted.
    fn require_step(&self, step: Step) -> Result<(), ConfiguratorError> {
        match self.path {
            Some(path) if !path.steps().contains(&step) => Err(ConfiguratorError::StepNotInPath { step }),
            _ => Ok(()),
        }
    }

    fn position(&self) -> Option<usize> {
        self.steps().iter().position(|s| *s == self.step)
    }

    /// 1-based position of the active step and the number of steps.
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.position().map(|i| (i + 1, self.steps().len()))
    }

    // --- selections ---

    /// Snapshots the template's parameter defaults.
    pub fn select_template(&mut self, id: &str) -> Result<(), ConfiguratorError> {
        self.require_step(Step::Template)?;
        let template = self
            .catalog
            .template(id)
            .ok_or_else(|| ConfiguratorError::UnknownTemplate(id.to_string()))?;
        let params = template
            .params
            .iter()
            .map(|p| (p.name.clone(), p.default.clone()))
            .collect();
        self.template = Some(SelectedTemplate { template_id: template.id.clone(), params });
        self.recompute();
        Ok(())
    }

    /// Numeric values are clamped into the parameter's range.
    pub fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), ConfiguratorError> {
        let selected = self.template.as_mut().ok_or(ConfiguratorError::NoTemplate)?;
        let param = self
            .catalog
            .template(&selected.template_id)
            .and_then(|t| t.param(name))
            .ok_or_else(|| ConfiguratorError::UnknownParam {
                template: selected.template_id.clone(),
                param: name.to_string(),
            })?;
        if value.kind() != param.kind {
            return Err(ConfiguratorError::KindMismatch {
                param: name.to_string(),
                expected: param.kind,
            });
        }
        let value = match value {
            ParamValue::Number(n) if !n.is_finite() => {
                return Err(ConfiguratorError::InvalidValue(name.to_string()));
            }
            ParamValue::Number(n) => ParamValue::Number(param.clamp(n)),
            other => other,
        };
        selected.params.insert(name.to_string(), value);
        self.recompute();
        Ok(())
    }

    /// Overall part size for uploaded drawings, which have no template.
    pub fn set_manual_dimensions(&mut self, width: f64, height: f64) -> Result<(), ConfiguratorError> {
        self.require_step(Step::Upload)?;
        for (name, v) in [("width", width), ("height", height)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(ConfiguratorError::InvalidValue(name.to_string()));
            }
        }
        self.manual_dimensions = Some((width, height));
        self.recompute();
        Ok(())
    }

    pub fn attach_file(&mut self, name: &str, size: u64) -> Result<(), ConfiguratorError> {
        self.require_step(Step::Upload)?;
        self.upload = Some(UploadedFile { name: name.to_string(), size });
        Ok(())
    }

    pub fn select_material(&mut self, category: &str, subcategory: &str, gauge: &str) -> Result<(), ConfiguratorError> {
        if self.catalog.gauge(category, subcategory, gauge).is_none() {
            return Err(ConfiguratorError::UnknownMaterial(format!("{category}/{subcategory}/{gauge}")));
        }
        self.selections.material = Some(MaterialChoice {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            gauge: gauge.to_string(),
        });
        self.recompute();
        Ok(())
    }

    /// Adds the service with default options, or removes it if selected.
    pub fn toggle_service(&mut self, id: &str) -> Result<(), ConfiguratorError> {
        self.check_service(id)?;
        if let Some(i) = self.selections.services.iter().position(|s| s.id == id) {
            self.selections.services.remove(i);
        } else {
            self.selections.services.push(ServiceChoice {
                id: id.to_string(),
                options: ServiceOptions::default(),
            });
        }
        self.recompute();
        Ok(())
    }

    /// Replaces the options of a service, selecting it if needed.
    pub fn configure_service(&mut self, id: &str, options: ServiceOptions) -> Result<(), ConfiguratorError> {
        self.check_service(id)?;
        match self.selections.services.iter_mut().find(|s| s.id == id) {
            Some(choice) => choice.options = options,
            None => self.selections.services.push(ServiceChoice { id: id.to_string(), options }),
        }
        self.recompute();
        Ok(())
    }

    fn check_service(&self, id: &str) -> Result<(), ConfiguratorError> {
        match self.catalog.service(id) {
            Some(_) => Ok(()),
            None => Err(ConfiguratorError::UnknownService(id.to_string())),
        }
    }

    pub fn select_finish(&mut self, id: &str, option: Option<&str>) -> Result<(), ConfiguratorError> {
        let finish = self
            .catalog
            .finish(id)
            .ok_or_else(|| ConfiguratorError::UnknownFinish(id.to_string()))?;
        if let Some(option) = option {
            if finish.option(option).is_none() {
                return Err(ConfiguratorError::UnknownFinishOption {
                    finish: id.to_string(),
                    option: option.to_string(),
                });
            }
        }
        self.selections.finish = Some(FinishChoice {
            id: id.to_string(),
            option: option.map(str::to_string),
        });
        self.recompute();
        Ok(())
    }

    pub fn clear_finish(&mut self) {
        self.selections.finish = None;
        self.recompute();
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.selections.quantity = quantity.max(1);
        self.recompute();
    }

    fn recompute(&mut self) {
        let manual = self.manual_dimensions.map(|(w, h)| PartDimensions::from_extent(w, h));
        self.dimensions = match self.path {
            Some(EntryPath::Upload) => manual,
            Some(EntryPath::Scratch | EntryPath::Library) => self.model().map(|m| shapes::measure(&m)),
            None => self.model().map(|m| shapes::measure(&m)).or(manual),
        };
        self.price = pricing::calculate(&self.catalog, &self.selections, self.dimensions.as_ref());
    }

    // --- derived state ---

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn template(&self) -> Option<&SelectedTemplate> {
        self.template.as_ref()
    }

    pub fn upload(&self) -> Option<&UploadedFile> {
        self.upload.as_ref()
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    pub fn dimensions(&self) -> Option<&PartDimensions> {
        self.dimensions.as_ref()
    }

    /// `None` until material and dimensions are both known.
    pub fn price(&self) -> Option<&PriceBreakdown> {
        self.price.as_ref()
    }

    pub fn model(&self) -> Option<Model> {
        let selected = self.template.as_ref()?;
        Some(self.shapes.build(&selected.template_id, &selected.params))
    }

    pub fn dxf(&self) -> Option<String> {
        self.model().map(|m| dxf::to_dxf(&m))
    }

    pub fn spec_sheet(&self) -> String {
        sheet::render(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::WeldType;
    use approx::assert_relative_eq;

    fn configurator() -> Configurator {
        Configurator::new(Arc::new(Catalog::bundled().unwrap()))
    }

    #[test]
    fn open_jumps_to_first_real_step() {
        let mut c = configurator();
        assert_eq!(c.step(), Step::Entry);
        c.open(EntryPath::Scratch);
        assert_eq!(c.step(), Step::Template);
        c.open(EntryPath::Upload);
        assert_eq!(c.step(), Step::Upload);
    }

    #[test]
    fn walks_the_scratch_path_in_order() {
        let mut c = configurator();
        c.open(EntryPath::Scratch);
        let mut visited = vec![c.step()];
        for _ in 0..10 {
            c.advance();
            if visited.last() != Some(&c.step()) {
                visited.push(c.step());
            }
        }
        assert_eq!(visited, EntryPath::Scratch.steps());
        assert_eq!(c.step(), Step::Review);
        assert_eq!(c.progress(), Some((6, 6)));
    }

    #[test]
    fn retreat_stops_at_first_real_step() {
        let mut c = configurator();
        c.open(EntryPath::Upload);
        c.advance();
        c.retreat();
        c.retreat();
        c.retreat();
        assert_eq!(c.step(), Step::Upload);
    }

    #[test]
    fn navigation_without_path_is_a_no_op() {
        let mut c = configurator();
        c.advance();
        c.retreat();
        assert_eq!(c.step(), Step::Entry);
        assert_eq!(c.progress(), None);
    }

    #[test]
    fn jump_to_rejects_steps_outside_the_path() {
        let mut c = configurator();
        c.open(EntryPath::Upload);
        assert_eq!(
            c.jump_to(Step::Dimensions),
            Err(ConfiguratorError::StepNotInPath { step: Step::Dimensions })
        );
        assert_eq!(c.step(), Step::Upload);
        c.jump_to(Step::Finish).unwrap();
        assert_eq!(c.step(), Step::Finish);
        assert!(c.jump_to(Step::Entry).is_err());
    }

    #[test]
    fn active_step_always_belongs_to_path() {
        for path in [EntryPath::Scratch, EntryPath::Library, EntryPath::Upload] {
            assert!(!path.steps().is_empty());
            let mut c = configurator();
            c.open(path);
            for _ in 0..3 {
                c.advance();
                assert!(path.steps().contains(&c.step()));
            }
            for _ in 0..5 {
                c.retreat();
                assert!(path.steps().contains(&c.step()));
            }
        }
    }

    #[test]
    fn reset_discards_everything() {
        let mut c = configurator();
        c.open(EntryPath::Scratch);
        c.select_template("rectangle").unwrap();
        c.select_material("steel", "mild_steel", "16ga").unwrap();
        c.set_quantity(12);
        assert!(c.price().is_some());

        c.reset();
        assert_eq!(c.step(), Step::Entry);
        assert_eq!(c.path(), None);
        assert!(c.template().is_none());
        assert!(c.dimensions().is_none());
        assert!(c.price().is_none());
        assert_eq!(c.selections(), &Selections::default());
    }

    #[test]
    fn price_appears_once_material_and_dimensions_exist() {
        let mut c = configurator();
        c.open(EntryPath::Scratch);
        c.toggle_service("deburring").unwrap();
        c.select_finish("powder_coat", Some("black")).unwrap();
        assert!(c.price().is_none());

        c.select_template("rectangle").unwrap();
        assert!(c.dimensions().is_some());
        assert!(c.price().is_none());

        c.select_material("steel", "mild_steel", "16ga").unwrap();
        assert!(c.price().is_some());
    }

    #[test]
    fn worked_example_six_by_four_rectangle() {
        let mut c = configurator();
        c.open(EntryPath::Scratch);
        c.select_template("rectangle").unwrap();
        c.set_param("width", ParamValue::Number(6.0)).unwrap();
        c.set_param("height", ParamValue::Number(4.0)).unwrap();
        c.select_material("steel", "mild_steel", "16ga").unwrap();
        let price = c.price().unwrap();
        assert_relative_eq!(price.material_cost, 0.24, epsilon = 1e-9);
        assert_relative_eq!(price.cutting_cost, 0.40, epsilon = 1e-9);
        assert_relative_eq!(price.total, 0.64, epsilon = 1e-9);
    }

    #[test]
    fn param_edits_recompute_dimensions() {
        let mut c = configurator();
        c.select_template("rectangle").unwrap();
        c.set_param("width", ParamValue::Number(10.0)).unwrap();
        let dims = c.dimensions().unwrap();
        assert_relative_eq!(dims.width, 10.0);
        assert_relative_eq!(dims.area, 40.0);
    }

    #[test]
    fn param_values_are_validated_and_clamped() {
        let mut c = configurator();
        assert_eq!(c.set_param("width", ParamValue::Number(1.0)), Err(ConfiguratorError::NoTemplate));

        c.select_template("rectangle").unwrap();
        c.set_param("width", ParamValue::Number(500.0)).unwrap();
        assert_eq!(c.template().unwrap().params["width"], ParamValue::Number(48.0));

        assert!(matches!(
            c.set_param("width", ParamValue::Text("wide".into())),
            Err(ConfiguratorError::KindMismatch { .. })
        ));
        assert!(matches!(
            c.set_param("depth", ParamValue::Number(1.0)),
            Err(ConfiguratorError::UnknownParam { .. })
        ));
        assert!(c.set_param("height", ParamValue::Number(f64::NAN)).is_err());
    }

    #[test]
    fn fixed_templates_have_no_params() {
        let mut c = configurator();
        c.open(EntryPath::Library);
        c.select_template("star").unwrap();
        assert!(c.template().unwrap().params.is_empty());
        assert!(c.set_param("width", ParamValue::Number(2.0)).is_err());
        assert!(c.dimensions().unwrap().width > 0.0);
    }

    #[test]
    fn rejects_unknown_catalog_ids() {
        let mut c = configurator();
        assert!(c.select_template("gear").is_err());
        assert!(c.select_material("steel", "mild_steel", "2ga").is_err());
        assert!(c.toggle_service("engraving").is_err());
        assert!(c.select_finish("chrome", None).is_err());
        assert!(matches!(
            c.select_finish("anodize", Some("pink")),
            Err(ConfiguratorError::UnknownFinishOption { .. })
        ));
    }

    #[test]
    fn toggle_and_configure_services() {
        let mut c = configurator();
        c.toggle_service("welding").unwrap();
        assert_eq!(c.selections().services.len(), 1);
        c.toggle_service("welding").unwrap();
        assert!(c.selections().services.is_empty());

        let options = ServiceOptions {
            weld_type: Some(WeldType::Spot),
            spot_count: Some(8),
            ..Default::default()
        };
        c.configure_service("welding", options.clone()).unwrap();
        c.configure_service("welding", options.clone()).unwrap();
        assert_eq!(c.selections().services.len(), 1);
        assert_eq!(c.selections().services[0].options, options);
    }

    #[test]
    fn upload_path_prices_from_manual_dimensions() {
        let mut c = configurator();
        c.open(EntryPath::Upload);
        c.attach_file("bracket.dxf", 2048).unwrap();
        c.select_material("aluminum", "al_5052", "0.090").unwrap();
        assert!(c.price().is_none());
        assert!(c.dxf().is_none());

        c.set_manual_dimensions(10.0, 5.0).unwrap();
        let price = c.price().unwrap();
        assert_relative_eq!(price.material_cost, 50.0 * 0.03, epsilon = 1e-9);
        assert!(c.set_manual_dimensions(0.0, 5.0).is_err());
    }

    #[test]
    fn switching_to_upload_drops_the_template() {
        let mut c = configurator();
        c.open(EntryPath::Scratch);
        c.select_template("rectangle").unwrap();
        c.open(EntryPath::Upload);
        assert!(c.template().is_none());
        assert!(c.dxf().is_none());

        c.set_manual_dimensions(10.0, 5.0).unwrap();
        c.select_material("aluminum", "al_5052", "0.090").unwrap();
        let dims = c.dimensions().unwrap();
        assert_relative_eq!(dims.width, 10.0);
        assert_relative_eq!(dims.height, 5.0);
        assert_relative_eq!(dims.area, 50.0);
        assert_relative_eq!(c.price().unwrap().material_cost, 50.0 * 0.03, epsilon = 1e-9);
    }

    #[test]
    fn switching_from_upload_drops_the_drawing() {
        let mut c = configurator();
        c.open(EntryPath::Upload);
        c.attach_file("bracket.dxf", 2048).unwrap();
        c.set_manual_dimensions(10.0, 5.0).unwrap();
        c.open(EntryPath::Scratch);
        assert!(c.upload().is_none());
        assert!(c.dimensions().is_none());

        c.select_template("rectangle").unwrap();
        assert_relative_eq!(c.dimensions().unwrap().area, 24.0);
    }

    #[test]
    fn selections_must_belong_to_the_path() {
        let mut c = configurator();
        c.open(EntryPath::Upload);
        assert_eq!(
            c.select_template("rectangle"),
            Err(ConfiguratorError::StepNotInPath { step: Step::Template })
        );
        c.open(EntryPath::Library);
        assert_eq!(
            c.set_manual_dimensions(4.0, 4.0),
            Err(ConfiguratorError::StepNotInPath { step: Step::Upload })
        );
        assert!(c.attach_file("plate.dxf", 10).is_err());
    }

    #[test]
    fn quantity_is_at_least_one() {
        let mut c = configurator();
        c.set_quantity(0);
        assert_eq!(c.selections().quantity, 1);
    }

    #[test]
    fn dxf_follows_current_template() {
        let mut c = configurator();
        c.select_template("washer").unwrap();
        let dxf = c.dxf().unwrap();
        assert!(dxf.contains("CIRCLE"));
        assert!(dxf.contains("HOLE"));
    }
}
