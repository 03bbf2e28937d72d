//! Feed de cambios en tablas
//!
//! Reparte los cambios de `modern_jeeps` a todos los suscriptores del proceso.
//! En producción el feed lo alimenta un `LISTEN` de Postgres sobre el canal
//! que publica el trigger de `sql/realtime.sql`; el store en memoria publica
//! directamente en el mismo hub.

use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::broadcast;

/// Canal NOTIFY usado por el trigger de `modern_jeeps`
pub const REALTIME_CHANNEL: &str = "modern_jeeps_changes";

const DEFAULT_CAPACITY: usize = 256;

/// Tipo de cambio en una fila
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeEvent {
    Insert,
    Update,
    Delete,
}

/// Cambio de una fila tal como lo emite el trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableChange {
    pub table: String,
    #[serde(rename = "type")]
    pub event: ChangeEvent,
    #[serde(default)]
    pub record: Option<Value>,
    #[serde(default)]
    pub old_record: Option<Value>,
}

impl TableChange {
    pub fn update(table: &str, record: Value, old_record: Value) -> Self {
        Self {
            table: table.to_string(),
            event: ChangeEvent::Update,
            record: Some(record),
            old_record: Some(old_record),
        }
    }

    pub fn insert(table: &str, record: Value) -> Self {
        Self {
            table: table.to_string(),
            event: ChangeEvent::Insert,
            record: Some(record),
            old_record: None,
        }
    }

    pub fn delete(table: &str, old_record: Value) -> Self {
        Self {
            table: table.to_string(),
            event: ChangeEvent::Delete,
            record: None,
            old_record: Some(old_record),
        }
    }

    /// Indica si `column` difiere entre la fila nueva y la anterior.
    ///
    /// Sin ambas filas no hay forma de saberlo y se considera que no cambió.
    pub fn column_changed(&self, column: &str) -> bool {
        match (&self.record, &self.old_record) {
            (Some(new), Some(old)) => new.get(column) != old.get(column),
            _ => false,
        }
    }
}

/// Hub de difusión de cambios
pub struct RealtimeHub {
    sender: broadcast::Sender<TableChange>,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publica un cambio; devuelve cuántos suscriptores lo recibirán
    pub fn publish(&self, change: TableChange) -> usize {
        self.sender.send(change).unwrap_or(0)
    }

    /// Suscripción a una tabla, opcionalmente filtrada por tipo de evento
    pub fn subscribe(&self, table: &str, event: Option<ChangeEvent>) -> TableSubscription {
        TableSubscription {
            receiver: self.sender.subscribe(),
            table: table.to_string(),
            event,
        }
    }
}

/// Receptor filtrado de cambios
pub struct TableSubscription {
    receiver: broadcast::Receiver<TableChange>,
    table: String,
    event: Option<ChangeEvent>,
}

impl TableSubscription {
    fn matches(&self, change: &TableChange) -> bool {
        change.table == self.table && self.event.map_or(true, |event| event == change.event)
    }

    /// Siguiente cambio que pasa el filtro; `None` cuando el hub se cerró
    pub async fn next(&mut self) -> Option<TableChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if self.matches(&change) => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("⚠️ Suscripción a '{}' perdió {} cambios", self.table, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Escucha el canal NOTIFY de Postgres y reenvía cada payload al hub.
///
/// Sólo termina con error; los payloads mal formados se registran y se ignoran.
pub async fn listen_postgres(pool: PgPool, hub: Arc<RealtimeHub>) -> anyhow::Result<()> {
    let mut listener = PgListener::connect_with(&pool)
        .await
        .context("Failed to open realtime listener connection")?;
    listener
        .listen(REALTIME_CHANNEL)
        .await
        .with_context(|| format!("Failed to LISTEN on {}", REALTIME_CHANNEL))?;

    tracing::info!("📡 Escuchando cambios en canal '{}'", REALTIME_CHANNEL);

    loop {
        let notification = listener
            .recv()
            .await
            .context("Realtime listener connection lost")?;

        match serde_json::from_str::<TableChange>(notification.payload()) {
            Ok(change) => {
                tracing::debug!("📨 Cambio {:?} en '{}'", change.event, change.table);
                hub.publish(change);
            }
            Err(e) => {
                tracing::warn!("⚠️ Payload realtime inválido: {}", e);
            }
        }
    }
}
