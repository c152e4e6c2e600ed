pub mod login; // POST /api/auth/login - authenticate and receive a token

pub use login::login_post;
