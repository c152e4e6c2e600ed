// Protected handlers (JWT authentication required)
//
// Every route in this tier is mounted behind `jwt_auth_middleware`, so
// handlers can rely on the `AuthUser` extension being present.
pub mod auth;
pub mod metrics;
pub mod users;
