use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::time::{interval, Duration};

use crate::core::state::AppState;
use crate::services::session::timer::TimerTick;
use crate::services::session::SessionError;
use crate::services::session_finalize::{finalize_session, FinishReason};

/// Drives one session's countdown at a 1-second cadence. Each tick
/// persists the decremented value and checks the armed tab-violation
/// deadline; expiry runs the shared finisher exactly once. The ticker is
/// registered with the engine so every finish path can cancel it.
pub(crate) async fn spawn_session_ticker(state: AppState, session_id: String) {
    let (cancel_tx, mut cancel_rx) = watch::channel(false);
    state.sessions().attach_ticker(&session_id, cancel_tx).await;

    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(1));
        // The first interval tick completes immediately; skip it so the
        // countdown starts one full second after session start.
        tick.tick().await;

        loop {
            tokio::select! {
                _ = cancel_rx.changed() => break,
                _ = tick.tick() => {
                    let now = OffsetDateTime::now_utc();

                    // Escalate an overdue blur even if the hidden tab never
                    // reports another visibility event.
                    match state.sessions().poll_focus(&session_id, now).await {
                        Ok(status) => {
                            if status.redirect.is_some() {
                                metrics::counter!("exam_tab_violations_total").increment(1);
                            }
                        }
                        Err(SessionError::NotFound) => {
                            state.sessions().detach_ticker(&session_id).await;
                            break;
                        }
                        Err(err) => {
                            tracing::error!(
                                session_id = %session_id,
                                error = %err,
                                "Focus poll failed"
                            );
                        }
                    }

                    match state.sessions().tick(&session_id).await {
                        Ok(TimerTick::Running(_)) => {}
                        Ok(TimerTick::Expired) => {
                            metrics::counter!("exam_sessions_expired_total").increment(1);
                            if let Err(err) =
                                finalize_session(&state, &session_id, FinishReason::Timeout).await
                            {
                                tracing::error!(
                                    session_id = %session_id,
                                    error = %err,
                                    "Failed to finalize expired session"
                                );
                            }
                            break;
                        }
                        Ok(TimerTick::Idle) => {}
                        Err(SessionError::NotFound) => {
                            state.sessions().detach_ticker(&session_id).await;
                            break;
                        }
                        Err(err) => {
                            tracing::error!(
                                session_id = %session_id,
                                error = %err,
                                "Countdown tick failed"
                            );
                        }
                    }
                }
            }
        }
    });
}
