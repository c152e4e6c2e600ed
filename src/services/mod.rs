pub mod auth_service;
pub mod body_composition;
pub mod body_metrics_service;
pub mod crud_service;
pub mod users_service;

pub use auth_service::AuthService;
pub use body_metrics_service::{BodyMetricsHooks, BodyMetricsService};
pub use crud_service::{CrudService, EntityHooks, ValidatedAction, ValidationContext};
pub use users_service::{UserHooks, UsersService};
