// Route handlers, split by security tier.
//
// Public handlers serve token acquisition, registration, and user lookup
// with no credentials required. Protected handlers sit behind the JWT
// guard and read the authenticated identity from a request extension.
pub mod protected;
pub mod public;
