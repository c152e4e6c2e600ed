pub mod create; // POST /api/metrics - record a snapshot for the current user
pub mod detail; // GET /api/metrics/detail/:id - single snapshot by record id
pub mod history; // GET /api/metrics/:id - snapshot history for a user id
pub mod remove; // DELETE /api/metrics/:id - delete a snapshot
pub mod update; // PATCH /api/metrics/:id - partial snapshot update

pub use create::metrics_create;
pub use detail::metrics_detail;
pub use history::metrics_history;
pub use remove::metrics_remove;
pub use update::metrics_update;
