use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{AuthProvider, AuthProviderError, AuthProviderResult};
use crate::models::auth::{AuthTokens, AuthUser};

#[derive(Debug, Deserialize)]
struct GoTrueError {
    #[serde(default, alias = "error_description", alias = "msg")]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// /signup devuelve el usuario a secas o una sesión completa según la
// confirmación por email esté activa o no
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session { user: AuthUser },
    User(AuthUser),
}

/// Cliente REST de GoTrue (`/auth/v1`)
pub struct SupabaseAuthClient {
    base_url: String,
    anon_key: String,
    client: Client,
}

impl SupabaseAuthClient {
    pub fn new(base_url: &str, anon_key: &str) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn request(&self, builder: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.anon_key);
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn send(&self, builder: RequestBuilder) -> AuthProviderResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| AuthProviderError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        log::warn!("⚠️ Auth service respondió {}: {}", status, body);
        Err(classify_failure(status, &body))
    }
}

fn classify_failure(status: StatusCode, body: &str) -> AuthProviderError {
    let parsed: Option<GoTrueError> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone().or_else(|| e.error.clone()))
        .unwrap_or_else(|| body.to_string());
    let lowered = message.to_lowercase();

    match status {
        StatusCode::BAD_REQUEST if lowered.contains("invalid login credentials") => {
            AuthProviderError::InvalidCredentials
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
            if lowered.contains("already registered") =>
        {
            AuthProviderError::AlreadyRegistered
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AuthProviderError::SessionMissing,
        _ => AuthProviderError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuthClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthProviderResult<AuthTokens> {
        log::info!("🔐 Sign-in en auth service para {}", email);

        let builder = self
            .client
            .post(self.endpoint("token?grant_type=password"))
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(self.request(builder, None)).await?;

        response
            .json::<AuthTokens>()
            .await
            .map_err(|e| AuthProviderError::Decode(e.to_string()))
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthProviderResult<AuthUser> {
        log::info!("📝 Sign-up en auth service para {}", email);

        let builder = self
            .client
            .post(self.endpoint("signup"))
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(self.request(builder, None)).await?;

        let parsed = response
            .json::<SignUpResponse>()
            .await
            .map_err(|e| AuthProviderError::Decode(e.to_string()))?;

        Ok(match parsed {
            SignUpResponse::Session { user } => user,
            SignUpResponse::User(user) => user,
        })
    }

    async fn sign_out(&self, access_token: &str) -> AuthProviderResult<()> {
        let builder = self.client.post(self.endpoint("logout"));
        self.send(self.request(builder, Some(access_token))).await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> AuthProviderResult<AuthUser> {
        let builder = self.client.get(self.endpoint("user"));
        let response = self.send(self.request(builder, Some(access_token))).await?;

        response
            .json::<AuthUser>()
            .await
            .map_err(|e| AuthProviderError::Decode(e.to_string()))
    }

    async fn update_password(&self, access_token: &str, new_password: &str) -> AuthProviderResult<()> {
        let builder = self
            .client
            .put(self.endpoint("user"))
            .json(&json!({ "password": new_password }));
        self.send(self.request(builder, Some(access_token))).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_grant_maps_to_invalid_credentials() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            classify_failure(StatusCode::BAD_REQUEST, body),
            AuthProviderError::InvalidCredentials
        );
    }

    #[test]
    fn test_duplicate_signup_maps_to_already_registered() {
        let body = r#"{"code":422,"msg":"User already registered"}"#;
        assert_eq!(
            classify_failure(StatusCode::UNPROCESSABLE_ENTITY, body),
            AuthProviderError::AlreadyRegistered
        );
    }

    #[test]
    fn test_unknown_failure_keeps_status() {
        let err = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(
            err,
            AuthProviderError::Rejected {
                status: 500,
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_signup_response_shapes() {
        let id = "8f14e45f-ceea-467f-a0e6-1d0b4c1f6c2a";
        let bare = format!(r#"{{"id":"{}","email":"a@b.c"}}"#, id);
        let session = format!(r#"{{"access_token":"t","user":{{"id":"{}","email":"a@b.c"}}}}"#, id);

        for body in [bare, session] {
            let parsed: SignUpResponse = serde_json::from_str(&body).unwrap();
            let user = match parsed {
                SignUpResponse::Session { user } | SignUpResponse::User(user) => user,
            };
            assert_eq!(user.id.to_string(), id);
        }
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = SupabaseAuthClient::new("https://project.supabase.co/", "anon").unwrap();
        assert_eq!(
            client.endpoint("signup"),
            "https://project.supabase.co/auth/v1/signup"
        );
    }
}
