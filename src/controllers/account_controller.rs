use std::sync::Arc;

use validator::Validate;

use crate::clients::{AuthProvider, AuthProviderError};
use crate::dto::account_dto::{AccountResponse, ChangePasswordRequest, UpdateAccountRequest};
use crate::dto::ApiResponse;
use crate::models::auth::AdminSession;
use crate::models::user::ProfileChanges;
use crate::repositories::{FleetStore, StoreError};
use crate::utils::errors::{conflict_error, AppError, AppResult};

pub const INCORRECT_PASSWORD: &str = "Incorrect password.";

/// Pantalla de cuenta del administrador autenticado
pub struct AccountController {
    store: Arc<dyn FleetStore>,
    auth: Arc<dyn AuthProvider>,
}

impl AccountController {
    pub fn new(store: Arc<dyn FleetStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }

    pub async fn get(&self, session: &AdminSession) -> AppResult<AccountResponse> {
        let user = self.store.find_user_by_auth_id(session.auth_user_id).await?;
        Ok(AccountResponse::from(user))
    }

    /// Confirma la contraseña actual volviendo a autenticarse
    async fn verify_current_password(&self, session: &AdminSession, password: &str) -> AppResult<()> {
        let auth_user = self.auth.get_user(&session.provider_token).await?;
        let email = auth_user.email.unwrap_or_else(|| session.email.clone());

        match self.auth.sign_in_with_password(&email, password).await {
            Ok(_) => Ok(()),
            Err(AuthProviderError::InvalidCredentials) => {
                Err(AppError::Unauthorized(INCORRECT_PASSWORD.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update(
        &self,
        session: &AdminSession,
        request: UpdateAccountRequest,
    ) -> AppResult<ApiResponse<AccountResponse>> {
        request.validate()?;
        let current = self.store.find_user_by_auth_id(session.auth_user_id).await?;
        self.verify_current_password(session, &request.current_password).await?;

        let email = request
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_string)
            .unwrap_or(current.email);

        let user = self
            .store
            .update_user_profile(
                session.auth_user_id,
                ProfileChanges {
                    name: request.name.trim().to_string(),
                    username: request.username.trim().to_string(),
                    email: email.clone(),
                },
            )
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => conflict_error("User", "email", &email),
                other => AppError::Store(other),
            })?;

        log::info!("📝 Cuenta {} actualizada", user.email);
        Ok(ApiResponse::success_with_message(
            AccountResponse::from(user),
            "Account details updated successfully",
        ))
    }

    pub async fn change_password(
        &self,
        session: &AdminSession,
        request: ChangePasswordRequest,
    ) -> AppResult<()> {
        request.validate()?;
        self.verify_current_password(session, &request.current_password).await?;
        self.auth
            .update_password(&session.provider_token, &request.new_password)
            .await?;
        log::info!("🔑 Contraseña actualizada para {}", session.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MemoryAuthProvider;
    use crate::dto::account_dto::PASSWORDS_DO_NOT_MATCH;
    use crate::models::user::{Role, User};
    use crate::repositories::MemoryFleetStore;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    async fn setup() -> (AccountController, AdminSession) {
        let auth_id = Uuid::new_v4();
        let store = MemoryFleetStore::new().with_user(User {
            user_id: 1,
            auth_user_id: Some(auth_id),
            name: "Admin".into(),
            username: "admin".into(),
            email: "admin@fleet.test".into(),
            role: Role::Admin,
        });
        let auth = MemoryAuthProvider::with_cost(4)
            .with_account(auth_id, "admin@fleet.test", "admin-pass")
            .unwrap();
        let tokens = auth
            .sign_in_with_password("admin@fleet.test", "admin-pass")
            .await
            .unwrap();

        let now = Utc::now();
        let session = AdminSession {
            session_id: Uuid::new_v4(),
            user_id: 1,
            auth_user_id: auth_id,
            email: "admin@fleet.test".into(),
            name: "Admin".into(),
            provider_token: tokens.access_token,
            established_at: now,
            expires_at: now + Duration::hours(1),
        };
        (AccountController::new(Arc::new(store), Arc::new(auth)), session)
    }

    fn edit(name: &str, password: &str) -> UpdateAccountRequest {
        UpdateAccountRequest {
            name: name.into(),
            username: "admin".into(),
            email: None,
            current_password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_unchanged_edit_is_idempotent() {
        let (controller, session) = setup().await;
        let before = controller.get(&session).await.unwrap();

        controller.update(&session, edit("Admin", "admin-pass")).await.unwrap();
        let after = controller.get(&session).await.unwrap();

        assert_eq!(before.name, after.name);
        assert_eq!(before.username, after.username);
        assert_eq!(before.email, after.email);
    }

    #[tokio::test]
    async fn test_edit_requires_current_password() {
        let (controller, session) = setup().await;
        let err = controller.update(&session, edit("Renamed", "wrong")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == INCORRECT_PASSWORD));
        assert_eq!(controller.get(&session).await.unwrap().name, "Admin");
    }

    #[tokio::test]
    async fn test_password_change_flow() {
        let (controller, session) = setup().await;

        let mismatch = ChangePasswordRequest {
            current_password: "admin-pass".into(),
            new_password: "brand-new".into(),
            confirm_password: "brand-nex".into(),
        };
        let err = controller.change_password(&session, mismatch).await.unwrap_err();
        match err {
            AppError::Validation(errors) => {
                let schema = &errors.field_errors()["__all__"];
                assert_eq!(schema[0].message.as_deref(), Some(PASSWORDS_DO_NOT_MATCH));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let ok = ChangePasswordRequest {
            current_password: "admin-pass".into(),
            new_password: "brand-new".into(),
            confirm_password: "brand-new".into(),
        };
        controller.change_password(&session, ok).await.unwrap();
        assert!(controller.update(&session, edit("Admin", "brand-new")).await.is_ok());
    }
}
