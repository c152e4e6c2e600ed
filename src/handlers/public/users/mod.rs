pub mod list; // GET /api/users - paginated listing
pub mod register; // POST /api/users - create an account
pub mod show; // GET /api/users/:id - single user

pub use list::users_list;
pub use register::user_register;
pub use show::user_show;
