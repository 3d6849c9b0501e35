pub mod access_token;
pub mod authenticator;
pub mod claims;
pub mod codec;
pub mod error;
pub mod principal;
pub mod public_paths;
pub mod revocation;
pub mod signer;

pub use access_token::AuthService;
pub use authenticator::{AuthOutcome, Authenticated, Authenticator, Unauthenticated};
pub use error::{AuthError, IssueError};
pub use principal::{MasterAccount, Principal, PrincipalError, PrincipalLookup, UserDirectory};
pub use public_paths::PublicPaths;
pub use revocation::{InMemoryRevocationStore, RevocationOracle, ValkeyRevocationStore};
