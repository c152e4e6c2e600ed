pub mod whoami; // GET /api/auth/whoami - current token identity

pub use whoami::whoami_get;
