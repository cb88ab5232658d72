pub mod errors;
pub mod secured_key;

mod account;

pub use self::{
    account::{AccountKey, UnsecuredAccountKey, ACCOUNT_SECRET_KEY_SIZE},
    errors::KeyError,
    secured_key::{DecryptingKey, SecuredKey},
};
