use std::sync::RwLock;

use secrecy::SecretString;

use crate::error::Error;

/// Where the client reads and writes its bearer tokens.
///
/// The access token is attached to every request; the refresh token is
/// only read when a request comes back 401. Implementations must be
/// safe to share across tasks.
pub trait TokenStore: Send + Sync {
    fn access_token(&self) -> Option<SecretString>;

    fn refresh_token(&self) -> Option<SecretString>;

    fn set_access_token(&self, token: SecretString) -> Result<(), Error>;

    fn set_refresh_token(&self, token: SecretString) -> Result<(), Error>;

    /// Forget both tokens (logout).
    fn clear(&self) -> Result<(), Error>;
}

#[derive(Default)]
struct Tokens {
    access: Option<SecretString>,
    refresh: Option<SecretString>,
}

/// In-process token store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryTokenStore {
    inner: RwLock<Tokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing token pair.
    pub fn with_tokens(access: Option<SecretString>, refresh: Option<SecretString>) -> Self {
        Self {
            inner: RwLock::new(Tokens { access, refresh }),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<SecretString> {
        self.inner.read().expect("token lock poisoned").access.clone()
    }

    fn refresh_token(&self) -> Option<SecretString> {
        self.inner
            .read()
            .expect("token lock poisoned")
            .refresh
            .clone()
    }

    fn set_access_token(&self, token: SecretString) -> Result<(), Error> {
        self.inner.write().expect("token lock poisoned").access = Some(token);
        Ok(())
    }

    fn set_refresh_token(&self, token: SecretString) -> Result<(), Error> {
        self.inner.write().expect("token lock poisoned").refresh = Some(token);
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.inner.write().expect("token lock poisoned") = Tokens::default();
        Ok(())
    }
}
