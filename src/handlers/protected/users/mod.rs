pub mod disable; // PATCH /api/users/disable/:id - deactivate an account
pub mod remove; // DELETE /api/users/:id - delete an account
pub mod update; // PATCH /api/users/:id - partial profile update

pub use disable::user_disable;
pub use remove::user_remove;
pub use update::user_update;
