use std::collections::HashMap;

use async_trait::async_trait;
use bcrypt::{hash, verify, DEFAULT_COST};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthProvider, AuthProviderError, AuthProviderResult};
use crate::models::auth::{AuthTokens, AuthUser};

#[derive(Debug, Clone)]
struct Account {
    id: Uuid,
    email: String,
    password_hash: String,
}

#[derive(Default)]
struct AuthTables {
    accounts: HashMap<String, Account>,
    // access token -> email
    tokens: HashMap<String, String>,
}

/// Proveedor de auth en memoria con contraseñas hasheadas con bcrypt
pub struct MemoryAuthProvider {
    tables: RwLock<AuthTables>,
    cost: u32,
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::with_cost(DEFAULT_COST)
    }

    /// Coste bcrypt reducido para tests
    pub fn with_cost(cost: u32) -> Self {
        Self {
            tables: RwLock::new(AuthTables::default()),
            cost,
        }
    }

    /// Registra una cuenta ya existente con un id conocido
    pub fn with_account(mut self, id: Uuid, email: &str, password: &str) -> AuthProviderResult<Self> {
        let password_hash = self.hash_password(password)?;
        self.tables.get_mut().accounts.insert(
            email.to_string(),
            Account {
                id,
                email: email.to_string(),
                password_hash,
            },
        );
        Ok(self)
    }

    fn hash_password(&self, password: &str) -> AuthProviderResult<String> {
        hash(password, self.cost).map_err(|e| AuthProviderError::Hash(e.to_string()))
    }

    fn auth_user(account: &Account) -> AuthUser {
        AuthUser {
            id: account.id,
            email: Some(account.email.clone()),
        }
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthProviderResult<AuthTokens> {
        let mut tables = self.tables.write().await;
        let account = tables
            .accounts
            .get(email)
            .cloned()
            .ok_or(AuthProviderError::InvalidCredentials)?;

        let valid = verify(password, &account.password_hash)
            .map_err(|e| AuthProviderError::Hash(e.to_string()))?;
        if !valid {
            return Err(AuthProviderError::InvalidCredentials);
        }

        let access_token = Uuid::new_v4().to_string();
        tables.tokens.insert(access_token.clone(), account.email.clone());

        Ok(AuthTokens {
            access_token,
            refresh_token: Some(Uuid::new_v4().to_string()),
            user: Self::auth_user(&account),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthProviderResult<AuthUser> {
        let password_hash = self.hash_password(password)?;
        let mut tables = self.tables.write().await;
        if tables.accounts.contains_key(email) {
            return Err(AuthProviderError::AlreadyRegistered);
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash,
        };
        let user = Self::auth_user(&account);
        tables.accounts.insert(email.to_string(), account);
        Ok(user)
    }

    async fn sign_out(&self, access_token: &str) -> AuthProviderResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .tokens
            .remove(access_token)
            .map(|_| ())
            .ok_or(AuthProviderError::SessionMissing)
    }

    async fn get_user(&self, access_token: &str) -> AuthProviderResult<AuthUser> {
        let tables = self.tables.read().await;
        tables
            .tokens
            .get(access_token)
            .and_then(|email| tables.accounts.get(email))
            .map(Self::auth_user)
            .ok_or(AuthProviderError::SessionMissing)
    }

    async fn update_password(&self, access_token: &str, new_password: &str) -> AuthProviderResult<()> {
        let password_hash = self.hash_password(new_password)?;
        let mut tables = self.tables.write().await;
        let email = tables
            .tokens
            .get(access_token)
            .cloned()
            .ok_or(AuthProviderError::SessionMissing)?;
        let account = tables
            .accounts
            .get_mut(&email)
            .ok_or(AuthProviderError::SessionMissing)?;
        account.password_hash = password_hash;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let provider = MemoryAuthProvider::with_cost(TEST_COST);
        let user = provider.sign_up("admin@fleet.test", "secret").await.unwrap();

        let tokens = provider
            .sign_in_with_password("admin@fleet.test", "secret")
            .await
            .unwrap();
        assert_eq!(tokens.user.id, user.id);

        let current = provider.get_user(&tokens.access_token).await.unwrap();
        assert_eq!(current.email.as_deref(), Some("admin@fleet.test"));
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let provider = MemoryAuthProvider::with_cost(TEST_COST)
            .with_account(Uuid::new_v4(), "admin@fleet.test", "secret")
            .unwrap();

        let err = provider
            .sign_in_with_password("admin@fleet.test", "nope")
            .await
            .unwrap_err();
        assert_eq!(err, AuthProviderError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_rejected() {
        let provider = MemoryAuthProvider::with_cost(TEST_COST);
        provider.sign_up("admin@fleet.test", "a").await.unwrap();
        let err = provider.sign_up("admin@fleet.test", "b").await.unwrap_err();
        assert_eq!(err, AuthProviderError::AlreadyRegistered);
    }

    #[tokio::test]
    async fn test_update_password_and_sign_out() {
        let provider = MemoryAuthProvider::with_cost(TEST_COST)
            .with_account(Uuid::new_v4(), "admin@fleet.test", "old")
            .unwrap();
        let tokens = provider
            .sign_in_with_password("admin@fleet.test", "old")
            .await
            .unwrap();

        provider.update_password(&tokens.access_token, "new").await.unwrap();
        assert!(provider.sign_in_with_password("admin@fleet.test", "new").await.is_ok());

        provider.sign_out(&tokens.access_token).await.unwrap();
        assert_eq!(
            provider.get_user(&tokens.access_token).await.unwrap_err(),
            AuthProviderError::SessionMissing
        );
    }
}
