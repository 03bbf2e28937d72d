//! Contexto de sesión
//!
//! Guarda las sesiones de administrador vivas y difunde los cambios de estado
//! de autenticación. Los guards de rutas consultan este contexto; los
//! componentes que reaccionan a un sign-out se suscriben y cancelan su
//! suscripción de forma explícita.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::auth::{AdminSession, AuthStateChange};

const EVENT_CAPACITY: usize = 64;

pub struct SessionContext {
    sessions: RwLock<HashMap<Uuid, AdminSession>>,
    events: broadcast::Sender<AuthStateChange>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            sessions: RwLock::new(HashMap::new()),
            events,
        }
    }

    pub async fn establish(&self, session: AdminSession) {
        let session_id = session.session_id;
        self.sessions.write().await.insert(session_id, session);
        tracing::info!("🔓 Sesión {} establecida", session_id);
        let _ = self.events.send(AuthStateChange::SignedIn { session_id });
    }

    /// Sesión vigente; las expiradas se retiran al consultarlas
    pub async fn get(&self, session_id: Uuid) -> Option<AdminSession> {
        let session = self.sessions.read().await.get(&session_id).cloned()?;
        if session.is_expired() {
            self.revoke(session_id).await;
            return None;
        }
        Some(session)
    }

    pub async fn revoke(&self, session_id: Uuid) -> Option<AdminSession> {
        let removed = self.sessions.write().await.remove(&session_id);
        if removed.is_some() {
            tracing::info!("🔒 Sesión {} cerrada", session_id);
            let _ = self.events.send(AuthStateChange::SignedOut { session_id });
        }
        removed
    }

    /// Cierra todas las sesiones vencidas; devuelve cuántas se retiraron
    pub async fn revoke_expired(&self) -> usize {
        let expired: Vec<Uuid> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<Uuid> = sessions
                .values()
                .filter(|session| session.is_expired())
                .map(|session| session.session_id)
                .collect();
            for id in &ids {
                sessions.remove(id);
            }
            ids
        };

        for session_id in &expired {
            tracing::info!("⌛ Sesión {} expirada", session_id);
            let _ = self.events.send(AuthStateChange::SignedOut { session_id: *session_id });
        }
        expired.len()
    }

    /// Barrido periódico de sesiones vencidas aunque el cliente no vuelva
    pub fn spawn_expiry_sweeper(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let revoked = self.revoke_expired().await;
                if revoked > 0 {
                    tracing::debug!("🧹 {} sesiones expiradas retiradas", revoked);
                }
            }
        })
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            receiver: self.events.subscribe(),
        }
    }
}

/// Suscripción a cambios de autenticación
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthStateChange>,
}

impl AuthSubscription {
    /// Siguiente cambio; `None` cuando el contexto desapareció
    pub async fn next(&mut self) -> Option<AuthStateChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("⚠️ Suscripción de auth perdió {} eventos", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {
        tracing::debug!("👋 Suscripción de auth cancelada");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn session(expires_in: Duration) -> AdminSession {
        let now = Utc::now();
        AdminSession {
            session_id: Uuid::new_v4(),
            user_id: 1,
            auth_user_id: Uuid::new_v4(),
            email: "admin@fleet.test".to_string(),
            name: "Admin".to_string(),
            provider_token: "token".to_string(),
            established_at: now,
            expires_at: now + expires_in,
        }
    }

    #[tokio::test]
    async fn test_establish_and_revoke_broadcast() {
        let context = SessionContext::new();
        let mut subscription = context.subscribe();
        let admin = session(Duration::hours(1));
        let id = admin.session_id;

        context.establish(admin).await;
        assert_eq!(
            subscription.next().await,
            Some(AuthStateChange::SignedIn { session_id: id })
        );
        assert!(context.get(id).await.is_some());

        assert!(context.revoke(id).await.is_some());
        assert_eq!(
            subscription.next().await,
            Some(AuthStateChange::SignedOut { session_id: id })
        );
        assert!(context.get(id).await.is_none());
        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped() {
        let context = SessionContext::new();
        let admin = session(Duration::seconds(-5));
        let id = admin.session_id;

        context.establish(admin).await;
        assert!(context.get(id).await.is_none());
        assert_eq!(context.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_sweeper_revokes_abandoned_sessions() {
        let context = Arc::new(SessionContext::new());
        let mut subscription = context.subscribe();
        let abandoned = session(Duration::seconds(-1));
        let abandoned_id = abandoned.session_id;
        context.establish(abandoned).await;
        context.establish(session(Duration::hours(1))).await;

        let sweeper = context
            .clone()
            .spawn_expiry_sweeper(std::time::Duration::from_millis(10));

        let mut signed_out = None;
        while let Some(change) = subscription.next().await {
            if let AuthStateChange::SignedOut { session_id } = change {
                signed_out = Some(session_id);
                break;
            }
        }
        assert_eq!(signed_out, Some(abandoned_id));
        assert_eq!(context.active_count().await, 1);
        sweeper.abort();
    }

    #[tokio::test]
    async fn test_revoking_unknown_session_is_silent() {
        let context = SessionContext::new();
        let mut subscription = context.subscribe();
        assert!(context.revoke(Uuid::new_v4()).await.is_none());
        drop(context);
        assert_eq!(subscription.next().await, None);
    }
}
