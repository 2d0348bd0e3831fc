//! OAuth redirect completion and the value types it produces.

mod code_verifier;
mod completer;
mod nonce;
mod parameters;
mod permission;
mod profile;
mod token;

pub use code_verifier::CodeVerifier;
pub use completer::{
    challenge_from, data_access_expiration_date_from, distant_future, error_from,
    expiration_date_from, LoginCompleting, LoginUrlCompleter, LoginUrlCompleterDependencies,
};
pub use nonce::Nonce;
pub use parameters::LoginCompletionParameters;
pub use permission::{permissions_from_raw, permissions_from_scopes, Permission};
pub use profile::{Location, Profile, UserAgeRange};
pub use token::{
    AuthenticationToken, AuthenticationTokenClaims, AuthenticationTokenCreating,
    AuthenticationTokenFactory,
};
