use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,   // user public identifier
    pub iat: u64,    // issued at (unix timestamp)
    pub exp: u64,    // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}
