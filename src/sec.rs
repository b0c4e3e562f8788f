pub mod authn;
pub mod credentials;
