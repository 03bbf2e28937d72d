//! Driver de sondeo
//!
//! Una tarea tokio por vista montada. Cada periodo lanza un fetch si no hay
//! otro en curso, numera las respuestas y avisa al objetivo cuando vence su
//! ventana de debounce. Al parar la tarea se aborta el fetch pendiente: nada
//! que termine después del desmontaje llega al objetivo.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Objetivo de un sondeo periódico
#[async_trait]
pub trait PollTarget: Send + Sync + 'static {
    type Output: Send + 'static;

    async fn fetch(&self) -> Self::Output;

    /// Entrega la respuesta `seq`; devuelve el próximo vencimiento de debounce
    async fn complete(&self, seq: u64, output: Self::Output, now: Instant) -> Option<Instant>;

    /// Vencimiento alcanzado; devuelve el siguiente si queda alguno
    async fn flush(&self, now: Instant) -> Option<Instant>;
}

/// Handle de una tarea de sondeo; soltarlo la aborta
pub struct PollHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Para el sondeo y espera a que la tarea termine
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub fn spawn_polling<T: PollTarget>(target: Arc<T>, period: Duration) -> PollHandle {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let (done_tx, mut done_rx) = mpsc::channel::<(u64, T::Output)>(1);
        let mut seq: u64 = 0;
        let mut in_flight: Option<JoinHandle<()>> = None;
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {
                    if in_flight.is_some() {
                        tracing::trace!("⏳ Tick omitido: fetch #{} sigue en curso", seq);
                        continue;
                    }
                    seq += 1;
                    let current = seq;
                    let target = target.clone();
                    let done_tx = done_tx.clone();
                    in_flight = Some(tokio::spawn(async move {
                        let output = target.fetch().await;
                        let _ = done_tx.send((current, output)).await;
                    }));
                }
                Some((done_seq, output)) = done_rx.recv() => {
                    in_flight = None;
                    deadline = target.complete(done_seq, output, Instant::now()).await;
                }
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = target.flush(Instant::now()).await;
                }
            }
        }

        if let Some(fetch) = in_flight {
            fetch.abort();
        }
        tracing::debug!("🛑 Sondeo detenido tras {} fetches", seq);
    });

    PollHandle {
        shutdown: Some(shutdown_tx),
        task: Some(task),
    }
}
