use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::websocket::connection::{ConnectionId, ConnectionManager};
use typemate_core::{SoloRound, WordStatus};
use typemate_types::ServerMessage;

const SAMPLE_PERIOD: Duration = Duration::from_secs(1);

/// Runs a solo round for one connection: a WPM sample every second and a
/// single deadline that freezes the round and reports the result.
pub struct SoloDriver {
    round: Arc<Mutex<SoloRound>>,
    task: JoinHandle<()>,
}

impl SoloDriver {
    pub fn start(
        round: SoloRound,
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
    ) -> Self {
        let started = Instant::now();
        let deadline = started + round.duration();
        let round = Arc::new(Mutex::new(round));

        let task = tokio::spawn(run_round(
            round.clone(),
            started,
            deadline,
            connection_id,
            connection_manager,
        ));

        Self { round, task }
    }

    pub async fn submit_word(&self, typed: &str) -> anyhow::Result<WordStatus> {
        self.round.lock().await.submit_word(typed)
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for SoloDriver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_round(
    round: Arc<Mutex<SoloRound>>,
    started: Instant,
    deadline: Instant,
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
) {
    let mut sampler = tokio::time::interval_at(started + SAMPLE_PERIOD, SAMPLE_PERIOD);
    sampler.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let finish = tokio::time::sleep_until(deadline);
    tokio::pin!(finish);

    loop {
        tokio::select! {
            biased;
            _ = &mut finish => {
                let result = round.lock().await.finish(started.elapsed());
                info!(
                    "Solo round for {} finished at {} wpm, {}% accuracy",
                    connection_id, result.wpm, result.accuracy
                );
                let _ = connection_manager
                    .send_to_connection(connection_id, ServerMessage::SoloFinished { result })
                    .await;
                break;
            }
            _ = sampler.tick() => {
                let sample = round.lock().await.sample(started.elapsed());
                let Some(sample) = sample else { break };

                debug!("Solo sample for {}: {:?}", connection_id, sample);
                let tick = ServerMessage::SoloTick {
                    second: sample.second,
                    wpm: sample.wpm,
                };
                if connection_manager.send_to_connection(connection_id, tick).await.is_err() {
                    break;
                }
            }
        }
    }
}
