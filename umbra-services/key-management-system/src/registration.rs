use serde::{Deserialize, Serialize};

/// How an account authenticates the requests it originates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountMode {
    /// Requests carry a signature of the account key over the request.
    Signing,
    /// Requests carry no authorization; the called contract decides whether
    /// an unauthenticated origin is acceptable.
    Signerless,
}

impl core::fmt::Display for AccountMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Signing => write!(f, "signing"),
            Self::Signerless => write!(f, "signerless"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationInfo<KeyId, PublicKey> {
    pub key_id: KeyId,
    pub public_key: PublicKey,
    pub mode: AccountMode,
}
