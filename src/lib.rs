pub mod catalog;
pub mod config;
pub mod dxf;
pub mod email;
pub mod error;
pub mod forms;
pub mod guard;
pub mod mailer;
pub mod parts;
pub mod pricing;
pub mod routes;
pub mod shapes;
pub mod sheet;
pub mod wizard;

pub use catalog::{Catalog, CatalogError};
pub use config::Config;
pub use error::ApiError;
pub use mailer::{HttpMailer, Mailer, OutboundEmail};
pub use pricing::PriceBreakdown;
pub use routes::{AppState, create_router};
pub use shapes::ShapeRegistry;
pub use wizard::{Configurator, ConfiguratorError, EntryPath, Step};
