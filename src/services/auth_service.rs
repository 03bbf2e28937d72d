//! Servicio de autenticación
//!
//! Login de administradores contra el servicio de auth alojado, emisión del
//! token de sesión, logout y alta pública de administradores.

use std::sync::Arc;

use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use uuid::Uuid;

use crate::clients::{AuthProvider, AuthProviderError};
use crate::dto::auth_dto::{AdminCreationRequest, LoginRequest, LoginResponse, SessionInfo};
use crate::models::auth::AdminSession;
use crate::models::user::{NewUser, Role, User};
use crate::repositories::{FleetStore, StoreError};
use crate::services::session::SessionContext;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::jwt::{generate_token, verify_token, JwtConfig};

pub const EMAIL_NOT_FOUND: &str = "Email not found. Please check your email address.";
pub const ADMIN_REQUIRED: &str = "Access denied. Admin privileges required.";
pub const INCORRECT_PASSWORD: &str = "Incorrect password. Please try again.";
pub const SESSION_REQUIRED: &str = "An authenticated session is required.";

pub struct AuthService {
    store: Arc<dyn FleetStore>,
    auth: Arc<dyn AuthProvider>,
    sessions: Arc<SessionContext>,
    jwt: JwtConfig,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn FleetStore>,
        auth: Arc<dyn AuthProvider>,
        sessions: Arc<SessionContext>,
        jwt: JwtConfig,
    ) -> Self {
        Self {
            store,
            auth,
            sessions,
            jwt,
            bcrypt_cost: DEFAULT_COST,
        }
    }

    /// Coste de bcrypt para los hashes de nuevas cuentas
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Autentica un administrador y establece su sesión
    pub async fn login(&self, request: &LoginRequest) -> AppResult<LoginResponse> {
        let email = request.email.trim();

        let user = match self.store.find_user_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => {
                log::warn!("🔍 Login con email desconocido: {}", email);
                return Err(AppError::Unauthorized(EMAIL_NOT_FOUND.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if !user.role.is_admin() {
            log::warn!("⛔ Login rechazado para {}: no es administrador", email);
            return Err(AppError::Forbidden(ADMIN_REQUIRED.to_string()));
        }

        let tokens = self
            .auth
            .sign_in_with_password(email, &request.password)
            .await
            .map_err(|e| match e {
                AuthProviderError::InvalidCredentials => {
                    AppError::Unauthorized(INCORRECT_PASSWORD.to_string())
                }
                other => AppError::AuthService(other),
            })?;

        let now = Utc::now();
        let session = AdminSession {
            session_id: Uuid::new_v4(),
            user_id: user.user_id,
            auth_user_id: user.auth_user_id.unwrap_or(tokens.user.id),
            email: user.email.clone(),
            name: user.name.clone(),
            provider_token: tokens.access_token,
            established_at: now,
            expires_at: self.jwt.expires_at(now),
        };

        let token = generate_token(
            session.session_id,
            session.user_id,
            &session.email,
            session.established_at,
            session.expires_at,
            &self.jwt,
        )?;

        let response = LoginResponse {
            token,
            expires_at: session.expires_at,
            admin: SessionInfo::from(&session),
        };
        self.sessions.establish(session).await;
        log::info!("✅ Administrador {} autenticado", email);
        Ok(response)
    }

    /// Resuelve el token de sesión a una sesión viva
    pub async fn authenticate(&self, token: &str) -> AppResult<AdminSession> {
        let claims = verify_token(token, &self.jwt)?;
        self.sessions
            .get(claims.sid)
            .await
            .ok_or_else(|| AppError::Unauthorized(SESSION_REQUIRED.to_string()))
    }

    /// Cierra la sesión local y la del servicio de auth
    pub async fn logout(&self, session: &AdminSession) -> AppResult<()> {
        self.sessions.revoke(session.session_id).await;

        // la sesión local ya no existe aunque el proveedor falle
        if let Err(e) = self.auth.sign_out(&session.provider_token).await {
            log::warn!("⚠️ Sign-out remoto falló para {}: {}", session.email, e);
        }
        Ok(())
    }

    /// Alta de administrador: cuenta de auth + fila en `users` con `role_id = 3`
    pub async fn create_admin(&self, request: &AdminCreationRequest) -> AppResult<User> {
        let email = request.email.trim();
        let auth_user = self
            .auth
            .sign_up(email, &request.password)
            .await
            .map_err(|e| match e {
                AuthProviderError::AlreadyRegistered => {
                    AppError::Conflict(format!("Error signing up: {}", e))
                }
                other => AppError::AuthService(other),
            })?;

        let password_hash =
            hash(&request.password, self.bcrypt_cost).map_err(|e| AppError::Hash(e.to_string()))?;

        let user = self
            .store
            .insert_user(NewUser {
                auth_user_id: auth_user.id,
                name: request.name.trim().to_string(),
                username: request.username.trim().to_string(),
                email: email.to_string(),
                password_hash,
                role: Role::Admin,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(msg) => {
                    AppError::Conflict(format!("Error inserting user into database: {}", msg))
                }
                other => AppError::Store(other),
            })?;

        log::info!("👤 Administrador {} creado", user.email);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MemoryAuthProvider;
    use crate::models::auth::AuthStateChange;
    use crate::repositories::MemoryFleetStore;

    fn jwt() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            expiration: 3600,
        }
    }

    fn user(id: i64, email: &str, role: Role, auth_user_id: Uuid) -> User {
        User {
            user_id: id,
            auth_user_id: Some(auth_user_id),
            name: format!("User {}", id),
            username: format!("user{}", id),
            email: email.to_string(),
            role,
        }
    }

    struct Fixture {
        service: AuthService,
        store: Arc<MemoryFleetStore>,
        sessions: Arc<SessionContext>,
    }

    fn fixture() -> Fixture {
        let admin_id = Uuid::new_v4();
        let driver_id = Uuid::new_v4();
        let store = Arc::new(
            MemoryFleetStore::new()
                .with_user(user(1, "admin@fleet.test", Role::Admin, admin_id))
                .with_user(user(2, "driver@fleet.test", Role::Driver, driver_id)),
        );
        let auth = MemoryAuthProvider::with_cost(4)
            .with_account(admin_id, "admin@fleet.test", "admin-pass")
            .unwrap()
            .with_account(driver_id, "driver@fleet.test", "driver-pass")
            .unwrap();
        let sessions = Arc::new(SessionContext::new());
        let service = AuthService::new(store.clone(), Arc::new(auth), sessions.clone(), jwt())
            .with_bcrypt_cost(4);

        Fixture {
            service,
            store,
            sessions,
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_admin_login_establishes_session() {
        let f = fixture();
        let response = f.service.login(&login("admin@fleet.test", "admin-pass")).await.unwrap();

        let session = f.service.authenticate(&response.token).await.unwrap();
        assert_eq!(session.user_id, 1);
        assert_eq!(f.sessions.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_email() {
        let f = fixture();
        let err = f.service.login(&login("ghost@fleet.test", "x")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == EMAIL_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_non_admin_gets_no_session() {
        let f = fixture();
        let err = f.service.login(&login("driver@fleet.test", "driver-pass")).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(msg) if msg == ADMIN_REQUIRED));
        assert_eq!(f.sessions.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let f = fixture();
        let err = f.service.login(&login("admin@fleet.test", "nope")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == INCORRECT_PASSWORD));
        assert_eq!(f.sessions.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_logout_revokes_and_broadcasts() {
        let f = fixture();
        let mut events = f.sessions.subscribe();
        let response = f.service.login(&login("admin@fleet.test", "admin-pass")).await.unwrap();
        let session = f.service.authenticate(&response.token).await.unwrap();

        f.service.logout(&session).await.unwrap();
        assert!(matches!(events.next().await, Some(AuthStateChange::SignedIn { .. })));
        assert_eq!(
            events.next().await,
            Some(AuthStateChange::SignedOut { session_id: session.session_id })
        );
        assert!(f.service.authenticate(&response.token).await.is_err());
    }

    #[tokio::test]
    async fn test_admin_creation_stores_bcrypt_hash() {
        let f = fixture();
        let request = AdminCreationRequest {
            name: "Ana".into(),
            username: "ana".into(),
            email: "ana@fleet.test".into(),
            password: "ana-pass".into(),
        };

        let created = f.service.create_admin(&request).await.unwrap();
        assert_eq!(created.role, Role::Admin);
        assert!(created.auth_user_id.is_some());

        let stored = f.store.password_hash_of("ana@fleet.test").await.unwrap();
        assert!(bcrypt::verify("ana-pass", &stored).unwrap());

        // la nueva cuenta puede entrar
        f.service.login(&login("ana@fleet.test", "ana-pass")).await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_admin_signup_rejected() {
        let f = fixture();
        let request = AdminCreationRequest {
            name: "Admin".into(),
            username: "admin2".into(),
            email: "admin@fleet.test".into(),
            password: "whatever".into(),
        };
        let err = f.service.create_admin(&request).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "Error signing up: User already registered"));
    }
}
