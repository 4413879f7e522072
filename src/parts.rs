//! Stateless configurator endpoints. The browser keeps the wizard state and
//! posts its selections; each request is replayed into a fresh
//! [`Configurator`].

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::ApiError;
use crate::pricing::{FinishChoice, MaterialChoice, PriceBreakdown, ServiceChoice};
use crate::routes::AppState;
use crate::shapes::{ParamMap, PartDimensions};
use crate::wizard::{ConfiguratorError, Configurator, EntryPath, UploadedFile};

fn one() -> u32 {
    1
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct ManualDimensions {
    pub width: f64,
    pub height: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PartRequest {
    #[serde(default)]
    pub path: Option<EntryPath>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub params: ParamMap,
    #[serde(default)]
    pub dimensions: Option<ManualDimensions>,
    #[serde(default)]
    pub upload: Option<UploadedFile>,
    #[serde(default)]
    pub material: Option<MaterialChoice>,
    #[serde(default)]
    pub services: Vec<ServiceChoice>,
    #[serde(default)]
    pub finish: Option<FinishChoice>,
    #[serde(default = "one")]
    pub quantity: u32,
}

impl PartRequest {
    /// Applies the request's selections in wizard order. Selections for a
    /// step outside the chosen path are rejected.
    pub fn replay(&self, configurator: &mut Configurator) -> Result<(), ConfiguratorError> {
        if let Some(path) = self.path {
            configurator.open(path);
        }
        if let Some(id) = &self.template_id {
            configurator.select_template(id)?;
            for (name, value) in &self.params {
                configurator.set_param(name, value.clone())?;
            }
        }
        if let Some(file) = &self.upload {
            configurator.attach_file(&file.name, file.size)?;
        }
        if let Some(dims) = self.dimensions {
            configurator.set_manual_dimensions(dims.width, dims.height)?;
        }
        if let Some(m) = &self.material {
            configurator.select_material(&m.category, &m.subcategory, &m.gauge)?;
        }
        for service in &self.services {
            configurator.configure_service(&service.id, service.options.clone())?;
        }
        if let Some(finish) = &self.finish {
            configurator.select_finish(&finish.id, finish.option.as_deref())?;
        }
        configurator.set_quantity(self.quantity);
        Ok(())
    }
}

/// JSON body extractor whose rejections use the `{ "error": ... }` shape.
pub struct PartJson(pub PartRequest);

impl<S> FromRequest<S> for PartJson
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<PartRequest>::from_request(req, state).await {
            Ok(Json(request)) => Ok(Self(request)),
            Err(rejection) => {
                tracing::debug!("part request rejected: {}", rejection.body_text());
                let message = match rejection {
                    JsonRejection::MissingJsonContentType(_) => "Expected an application/json body",
                    JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
                    JsonRejection::JsonDataError(_) => "Request body is not a valid part configuration",
                    _ => "Failed to read request body",
                };
                Err(ApiError::BadRequest(message.into()))
            }
        }
    }
}

#[derive(Serialize, Debug)]
pub struct PriceResponse {
    pub dimensions: Option<PartDimensions>,
    pub price: Option<PriceBreakdown>,
}

fn configure(state: &AppState, request: &PartRequest) -> Result<Configurator, ApiError> {
    let mut configurator = Configurator::with_shapes(state.catalog.clone(), state.shapes.clone());
    request.replay(&mut configurator)?;
    Ok(configurator)
}

fn download(content_type: &str, filename: &str, body: String, headers: &HeaderMap) -> Response {
    let etag = format!("\"{}\"", blake3::hash(body.as_bytes()).to_hex());
    let unchanged = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == etag);
    if unchanged {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
            (header::ETAG, etag),
        ],
        body,
    )
        .into_response()
}

pub async fn get_catalog(State(state): State<AppState>) -> Json<Catalog> {
    Json(state.catalog.as_ref().clone())
}

pub async fn price(
    State(state): State<AppState>,
    PartJson(request): PartJson,
) -> Result<Json<PriceResponse>, ApiError> {
    let configurator = configure(&state, &request)?;
    Ok(Json(PriceResponse {
        dimensions: configurator.dimensions().copied(),
        price: configurator.price().cloned(),
    }))
}

pub async fn dxf(
    State(state): State<AppState>,
    headers: HeaderMap,
    PartJson(request): PartJson,
) -> Result<Response, ApiError> {
    let configurator = configure(&state, &request)?;
    let template_id = configurator
        .template()
        .map(|t| t.template_id.clone())
        .ok_or_else(|| ApiError::BadRequest("A template is required for DXF export".into()))?;
    let body = configurator
        .dxf()
        .ok_or_else(|| ApiError::Internal("template selected but no model built".into()))?;
    Ok(download("application/dxf", &format!("{template_id}.dxf"), body, &headers))
}

pub async fn spec_sheet(
    State(state): State<AppState>,
    headers: HeaderMap,
    PartJson(request): PartJson,
) -> Result<Response, ApiError> {
    let configurator = configure(&state, &request)?;
    Ok(download(
        "text/plain; charset=utf-8",
        "part-specification.txt",
        configurator.spec_sheet(),
        &headers,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ParamValue;
    use std::sync::Arc;

    fn request(raw: serde_json::Value) -> PartRequest {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn replay_applies_selections() {
        let catalog = Arc::new(Catalog::bundled().unwrap());
        let mut c = Configurator::new(catalog);
        request(serde_json::json!({
            "path": "scratch",
            "template_id": "rectangle",
            "params": { "width": 6, "height": 4 },
            "material": { "category": "steel", "subcategory": "mild_steel", "gauge": "16ga" },
            "services": [{ "id": "bending", "options": { "bend_count": 1 } }],
            "finish": { "id": "raw" },
        }))
        .replay(&mut c)
        .unwrap();

        assert_eq!(c.template().unwrap().params["width"], ParamValue::Number(6.0));
        assert_eq!(c.selections().services.len(), 1);
        assert_eq!(c.selections().quantity, 1);
        assert!(c.price().is_some());
    }

    #[test]
    fn replay_uses_manual_dimensions_without_template() {
        let catalog = Arc::new(Catalog::bundled().unwrap());
        let mut c = Configurator::new(catalog);
        request(serde_json::json!({
            "path": "upload",
            "dimensions": { "width": 12, "height": 2 },
            "quantity": 0,
        }))
        .replay(&mut c)
        .unwrap();
        assert_eq!(c.dimensions().unwrap().area, 24.0);
        assert_eq!(c.selections().quantity, 1);
    }

    #[test]
    fn replay_rejects_template_on_upload_path() {
        let catalog = Arc::new(Catalog::bundled().unwrap());
        let mut c = Configurator::new(catalog);
        let err = request(serde_json::json!({
            "path": "upload",
            "template_id": "rectangle",
            "dimensions": { "width": 10, "height": 5 },
        }))
        .replay(&mut c)
        .unwrap_err();
        assert!(matches!(err, ConfiguratorError::StepNotInPath { .. }));
    }

    #[test]
    fn replay_attaches_uploaded_drawing() {
        let catalog = Arc::new(Catalog::bundled().unwrap());
        let mut c = Configurator::new(catalog);
        request(serde_json::json!({
            "path": "upload",
            "upload": { "name": "bracket.dxf", "size": 2048 },
            "dimensions": { "width": 10, "height": 5 },
        }))
        .replay(&mut c)
        .unwrap();
        assert_eq!(c.upload().unwrap().name, "bracket.dxf");
        assert_eq!(c.dimensions().unwrap().area, 50.0);
        assert!(c.spec_sheet().contains("Drawing: bracket.dxf (2048 bytes)"));
    }

    #[test]
    fn replay_surfaces_invalid_selection() {
        let catalog = Arc::new(Catalog::bundled().unwrap());
        let mut c = Configurator::new(catalog);
        let err = request(serde_json::json!({ "template_id": "rectangle", "params": { "depth": 1 } }))
            .replay(&mut c)
            .unwrap_err();
        assert!(matches!(err, ConfiguratorError::UnknownParam { .. }));
    }
}
