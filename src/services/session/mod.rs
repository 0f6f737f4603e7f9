pub(crate) mod focus;
pub(crate) mod store;
pub(crate) mod timer;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::core::config::{Settings, TimerPolicy};
use crate::core::time::{format_offset, parse_offset};
use crate::db::models::TestContent;
use crate::db::types::SectionId;
use focus::{FocusMonitor, FocusRecord, FocusSignal, VisibilityEvent};
use store::{SharedStore, StoreError};
use timer::{reconcile, CountdownTimer, TimerTick};

const FIELD_TEST: &str = "test";
const FIELD_KEY: &str = "key";
const FIELD_STARTED_AT: &str = "started_at";
const FIELD_ANSWERS: &str = "answers";
const FIELD_TIME_REMAINING: &str = "time_remaining";
const FIELD_INITIAL: &str = "initial";
const FIELD_FOCUS: &str = "focus";
const FIELD_OWNER: &str = "owner";

#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("no active session")]
    NotFound,
    #[error("an exam session is already active for this user")]
    AlreadyActive,
    #[error("exam service is at capacity")]
    AtCapacity,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where the client should navigate next. Mirrors the page routes of the
/// exam UI: the key-entry page, the tab-violation page, the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RedirectTarget {
    Entry,
    Violation,
    Landing,
}

impl RedirectTarget {
    pub(crate) fn as_path(self) -> &'static str {
        match self {
            Self::Entry => "/mock",
            Self::Violation => "/mock/blur",
            Self::Landing => "/",
        }
    }
}

/// The exam content as handed to one session: media references already
/// resolved to servable URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SessionTest {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) content: TestContent,
}

#[derive(Debug)]
pub(crate) struct SessionData {
    pub(crate) test: SessionTest,
    pub(crate) test_key: String,
    pub(crate) started_at: OffsetDateTime,
    pub(crate) answers: BTreeMap<String, String>,
    pub(crate) time_remaining: u64,
    pub(crate) focus: FocusRecord,
}

#[derive(Debug)]
pub(crate) enum InitOutcome {
    Ready(Box<SessionData>),
    /// Precondition failed: nothing stored (or unreadable). Exactly one
    /// redirect back to the entry page, no retry.
    Missing { redirect: RedirectTarget },
}

#[derive(Debug)]
pub(crate) struct StartedSession {
    pub(crate) session_id: String,
    pub(crate) time_remaining: u64,
}

#[derive(Debug)]
pub(crate) struct FocusStatus {
    pub(crate) blurred: bool,
    pub(crate) violations: u32,
    pub(crate) redirect: Option<RedirectTarget>,
}

/// Everything the finisher flushes out of the transient store; the caller
/// turns this into the durable result record.
#[derive(Debug)]
pub(crate) struct FinishedSession {
    pub(crate) user_id: String,
    pub(crate) test_id: String,
    pub(crate) test_title: String,
    pub(crate) test_key: String,
    pub(crate) started_at: OffsetDateTime,
    pub(crate) ended_at: OffsetDateTime,
    pub(crate) duration_seconds: i64,
    pub(crate) initial_html: BTreeMap<String, String>,
    pub(crate) final_html: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub(crate) struct SessionConfig {
    pub(crate) duration_seconds: u64,
    pub(crate) blur_grace_seconds: u64,
    pub(crate) timer_policy: TimerPolicy,
    pub(crate) max_concurrent_sessions: u64,
}

impl SessionConfig {
    pub(crate) fn from_settings(settings: &Settings) -> Self {
        Self {
            duration_seconds: settings.exam().duration_minutes * 60,
            blur_grace_seconds: settings.exam().blur_grace_seconds,
            timer_policy: settings.exam().timer_policy,
            max_concurrent_sessions: settings.exam().max_concurrent_sessions,
        }
    }
}

/// Server-held exam session runtime. All state lives behind the injected
/// `StateStore`; a per-user lease enforces one live session per student and
/// the atomic take of the key field makes the finisher single-winner.
pub(crate) struct SessionEngine {
    store: SharedStore,
    config: SessionConfig,
    tickers: Mutex<HashMap<String, watch::Sender<bool>>>,
}

fn field_key(session_id: &str, field: &str) -> String {
    format!("session:{session_id}:{field}")
}

fn lease_key(user_id: &str) -> String {
    format!("session:owner:{user_id}")
}

impl SessionEngine {
    pub(crate) fn new(store: SharedStore, config: SessionConfig) -> Self {
        Self { store, config, tickers: Mutex::new(HashMap::new()) }
    }

    pub(crate) async fn start(
        &self,
        user_id: &str,
        test: &SessionTest,
        test_key: &str,
        now: OffsetDateTime,
    ) -> Result<StartedSession, SessionError> {
        if self.active_sessions().await as u64 >= self.config.max_concurrent_sessions {
            return Err(SessionError::AtCapacity);
        }

        let session_id = Uuid::new_v4().to_string();

        if !self.store.set_if_absent(&lease_key(user_id), &session_id).await? {
            return Err(SessionError::AlreadyActive);
        }

        let test_json = serde_json::to_string(test).unwrap_or_else(|_| "{}".to_string());
        let initial = test.content.section_snapshots();
        let initial_json = serde_json::to_string(&initial).unwrap_or_else(|_| "{}".to_string());
        let focus_json = serde_json::to_string(&FocusRecord::default())
            .unwrap_or_else(|_| "{}".to_string());

        self.store.set(&field_key(&session_id, FIELD_OWNER), user_id).await?;
        self.store.set(&field_key(&session_id, FIELD_TEST), &test_json).await?;
        self.store.set(&field_key(&session_id, FIELD_KEY), test_key).await?;
        self.store
            .set(&field_key(&session_id, FIELD_STARTED_AT), &format_offset(now))
            .await?;
        self.store.set(&field_key(&session_id, FIELD_ANSWERS), "{}").await?;
        self.store
            .set(
                &field_key(&session_id, FIELD_TIME_REMAINING),
                &self.config.duration_seconds.to_string(),
            )
            .await?;
        self.store.set(&field_key(&session_id, FIELD_INITIAL), &initial_json).await?;
        self.store.set(&field_key(&session_id, FIELD_FOCUS), &focus_json).await?;

        tracing::info!(
            session_id = %session_id,
            user_id = %user_id,
            test_id = %test.id,
            "Exam session started"
        );

        Ok(StartedSession { session_id, time_remaining: self.config.duration_seconds })
    }

    /// Hydrates the session record. Missing or unreadable state is not an
    /// error: it resolves to a redirect back to the entry page.
    pub(crate) async fn initialize(
        &self,
        session_id: &str,
        now: OffsetDateTime,
    ) -> Result<InitOutcome, SessionError> {
        let stored_test = self.store.get(&field_key(session_id, FIELD_TEST)).await?;
        let stored_key = self.store.get(&field_key(session_id, FIELD_KEY)).await?;

        let (Some(raw_test), Some(test_key)) = (stored_test, stored_key) else {
            return Ok(InitOutcome::Missing { redirect: RedirectTarget::Entry });
        };

        let Ok(test) = serde_json::from_str::<SessionTest>(&raw_test) else {
            // Corrupt state is indistinguishable from absent state for the
            // caller: same single redirect.
            return Ok(InitOutcome::Missing { redirect: RedirectTarget::Entry });
        };

        let started_at = self
            .store
            .get(&field_key(session_id, FIELD_STARTED_AT))
            .await?
            .as_deref()
            .and_then(parse_offset)
            .unwrap_or(now);

        let answers = self
            .store
            .get(&field_key(session_id, FIELD_ANSWERS))
            .await?
            .and_then(|raw| serde_json::from_str::<BTreeMap<String, String>>(&raw).ok())
            .unwrap_or_default();

        let stored_remaining = self
            .store
            .get(&field_key(session_id, FIELD_TIME_REMAINING))
            .await?
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(self.config.duration_seconds);

        let time_remaining = reconcile(
            self.config.timer_policy,
            stored_remaining,
            started_at,
            self.config.duration_seconds,
            now,
        );

        let focus = self
            .store
            .get(&field_key(session_id, FIELD_FOCUS))
            .await?
            .and_then(|raw| serde_json::from_str::<FocusRecord>(&raw).ok())
            .unwrap_or_default();

        Ok(InitOutcome::Ready(Box::new(SessionData {
            test,
            test_key,
            started_at,
            answers,
            time_remaining,
            focus,
        })))
    }

    /// Merges one answer, last-write-wins per section. Content is stored
    /// verbatim; the runtime never interprets it.
    pub(crate) async fn update_answer(
        &self,
        session_id: &str,
        section: SectionId,
        content: &str,
    ) -> Result<(), SessionError> {
        self.ensure_active(session_id).await?;

        let mut answers = self
            .store
            .get(&field_key(session_id, FIELD_ANSWERS))
            .await?
            .and_then(|raw| serde_json::from_str::<BTreeMap<String, String>>(&raw).ok())
            .unwrap_or_default();

        answers.insert(section.as_str().to_string(), content.to_string());

        let serialized = serde_json::to_string(&answers).unwrap_or_else(|_| "{}".to_string());
        self.store.set(&field_key(session_id, FIELD_ANSWERS), &serialized).await?;
        Ok(())
    }

    /// One countdown tick: decrement, persist, report. The driver invokes
    /// the finisher when this returns `Expired`; after that ticks are idle.
    pub(crate) async fn tick(&self, session_id: &str) -> Result<TimerTick, SessionError> {
        let stored = self
            .store
            .get(&field_key(session_id, FIELD_TIME_REMAINING))
            .await?
            .and_then(|raw| raw.parse::<u64>().ok())
            .ok_or(SessionError::NotFound)?;

        let mut timer = CountdownTimer::new(stored);
        let outcome = timer.tick();

        match outcome {
            TimerTick::Running(remaining) => {
                self.store
                    .set(&field_key(session_id, FIELD_TIME_REMAINING), &remaining.to_string())
                    .await?;
            }
            TimerTick::Expired => {
                self.store.set(&field_key(session_id, FIELD_TIME_REMAINING), "0").await?;
            }
            TimerTick::Idle => {}
        }

        Ok(outcome)
    }

    /// Feeds a visibility transition into the focus monitor.
    pub(crate) async fn visibility(
        &self,
        session_id: &str,
        event: VisibilityEvent,
        now: OffsetDateTime,
    ) -> Result<FocusStatus, SessionError> {
        let record = self.load_focus(session_id).await?;
        let mut monitor = FocusMonitor::new(self.config.blur_grace_seconds, record);
        let signal = monitor.on_event(event, now);
        self.persist_focus(session_id, monitor.record()).await?;

        Ok(Self::status_from(signal, monitor.into_record()))
    }

    /// Checks the armed violation deadline without an event; the ticker
    /// calls this every second so a tab that stays hidden still escalates.
    pub(crate) async fn poll_focus(
        &self,
        session_id: &str,
        now: OffsetDateTime,
    ) -> Result<FocusStatus, SessionError> {
        let record = self.load_focus(session_id).await?;
        let mut monitor = FocusMonitor::new(self.config.blur_grace_seconds, record);
        let signal = monitor.poll(now);
        if signal == FocusSignal::Violation {
            self.persist_focus(session_id, monitor.record()).await?;
        }

        Ok(Self::status_from(signal, monitor.into_record()))
    }

    /// Flushes final answers and destroys the session. The atomic take of
    /// the key field picks a single winner between concurrent finishers;
    /// losers get `None`. A subsequent `initialize` behaves exactly as for
    /// a session that was never started.
    pub(crate) async fn finish(
        &self,
        session_id: &str,
        now: OffsetDateTime,
    ) -> Result<Option<FinishedSession>, SessionError> {
        let Some(test_key) = self.store.take(&field_key(session_id, FIELD_KEY)).await? else {
            return Ok(None);
        };

        let test = self
            .store
            .get(&field_key(session_id, FIELD_TEST))
            .await?
            .and_then(|raw| serde_json::from_str::<SessionTest>(&raw).ok());

        let started_at = self
            .store
            .get(&field_key(session_id, FIELD_STARTED_AT))
            .await?
            .as_deref()
            .and_then(parse_offset)
            .unwrap_or(now);

        let final_html = self
            .store
            .get(&field_key(session_id, FIELD_ANSWERS))
            .await?
            .and_then(|raw| serde_json::from_str::<BTreeMap<String, String>>(&raw).ok())
            .unwrap_or_default();

        let initial_html = self
            .store
            .get(&field_key(session_id, FIELD_INITIAL))
            .await?
            .and_then(|raw| serde_json::from_str::<BTreeMap<String, String>>(&raw).ok())
            .unwrap_or_default();

        let owner = self.store.get(&field_key(session_id, FIELD_OWNER)).await?;

        for field in [
            FIELD_TEST,
            FIELD_STARTED_AT,
            FIELD_ANSWERS,
            FIELD_TIME_REMAINING,
            FIELD_INITIAL,
            FIELD_FOCUS,
            FIELD_OWNER,
        ] {
            self.store.remove(&field_key(session_id, field)).await?;
        }

        let Some(owner) = owner else {
            return Ok(None);
        };
        self.store.remove(&lease_key(&owner)).await?;

        let Some(test) = test else {
            return Ok(None);
        };

        let duration_seconds = (now - started_at).whole_seconds().max(0);

        tracing::info!(
            session_id = %session_id,
            user_id = %owner,
            test_id = %test.id,
            duration_seconds,
            "Exam session finished"
        );

        Ok(Some(FinishedSession {
            user_id: owner,
            test_id: test.id,
            test_title: test.title,
            test_key,
            started_at,
            ended_at: now,
            duration_seconds,
            initial_html,
            final_html,
        }))
    }

    pub(crate) async fn attach_ticker(&self, session_id: &str, cancel: watch::Sender<bool>) {
        self.tickers.lock().await.insert(session_id.to_string(), cancel);
    }

    /// Cancels the 1-second ticker for one session. Must run on every
    /// finish path so no timer outlives its session.
    pub(crate) async fn detach_ticker(&self, session_id: &str) {
        if let Some(cancel) = self.tickers.lock().await.remove(session_id) {
            let _ = cancel.send(true);
        }
    }

    pub(crate) async fn active_sessions(&self) -> usize {
        self.tickers.lock().await.len()
    }

    pub(crate) async fn shutdown_tickers(&self) {
        let mut tickers = self.tickers.lock().await;
        for (_, cancel) in tickers.drain() {
            let _ = cancel.send(true);
        }
    }

    /// Session id currently leased by this user, if any.
    pub(crate) async fn active_session_for(
        &self,
        user_id: &str,
    ) -> Result<Option<String>, SessionError> {
        Ok(self.store.get(&lease_key(user_id)).await?)
    }

    /// The user id the session belongs to, if it is live.
    pub(crate) async fn owner(&self, session_id: &str) -> Result<Option<String>, SessionError> {
        if self.store.get(&field_key(session_id, FIELD_KEY)).await?.is_none() {
            return Ok(None);
        }
        Ok(self.store.get(&field_key(session_id, FIELD_OWNER)).await?)
    }

    async fn ensure_active(&self, session_id: &str) -> Result<(), SessionError> {
        match self.store.get(&field_key(session_id, FIELD_KEY)).await? {
            Some(_) => Ok(()),
            None => Err(SessionError::NotFound),
        }
    }

    async fn load_focus(&self, session_id: &str) -> Result<FocusRecord, SessionError> {
        self.ensure_active(session_id).await?;
        Ok(self
            .store
            .get(&field_key(session_id, FIELD_FOCUS))
            .await?
            .and_then(|raw| serde_json::from_str::<FocusRecord>(&raw).ok())
            .unwrap_or_default())
    }

    async fn persist_focus(
        &self,
        session_id: &str,
        record: &FocusRecord,
    ) -> Result<(), SessionError> {
        let serialized = serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string());
        self.store.set(&field_key(session_id, FIELD_FOCUS), &serialized).await?;
        Ok(())
    }

    fn status_from(signal: FocusSignal, record: FocusRecord) -> FocusStatus {
        FocusStatus {
            blurred: record.blurred,
            violations: record.violations,
            redirect: (signal == FocusSignal::Violation).then_some(RedirectTarget::Violation),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::store::MemoryStore;
    use super::*;
    use crate::db::models::SectionContent;

    fn engine_with(policy: TimerPolicy) -> SessionEngine {
        SessionEngine::new(
            Arc::new(MemoryStore::new()),
            SessionConfig {
                duration_seconds: 10_800,
                blur_grace_seconds: 1,
                timer_policy: policy,
                max_concurrent_sessions: 150,
            },
        )
    }

    fn engine() -> SessionEngine {
        engine_with(TimerPolicy::TickCount)
    }

    fn sample_test() -> SessionTest {
        let mut content = TestContent::default();
        content.reading.sections.one = SectionContent {
            title: "Passage 1".to_string(),
            content: "<p>questions</p>".to_string(),
            files: vec![],
        };
        SessionTest { id: "test-1".to_string(), title: "Mock #1".to_string(), content }
    }

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000 + seconds).unwrap()
    }

    #[tokio::test]
    async fn initialize_without_session_redirects_to_entry() {
        let engine = engine();

        let outcome = engine.initialize("missing", at(0)).await.expect("initialize");
        match outcome {
            InitOutcome::Missing { redirect } => assert_eq!(redirect, RedirectTarget::Entry),
            InitOutcome::Ready(_) => panic!("expected missing session"),
        }
    }

    #[tokio::test]
    async fn start_then_initialize_hydrates_state() {
        let engine = engine();
        let started = engine
            .start("user-1", &sample_test(), "ABC12DE3", at(0))
            .await
            .expect("start");
        assert_eq!(started.time_remaining, 10_800);

        let outcome = engine.initialize(&started.session_id, at(1)).await.expect("initialize");
        let InitOutcome::Ready(data) = outcome else {
            panic!("expected ready session");
        };

        assert_eq!(data.test.id, "test-1");
        assert_eq!(data.test_key, "ABC12DE3");
        assert_eq!(data.time_remaining, 10_800);
        assert!(data.answers.is_empty());
        assert_eq!(data.started_at, at(0));
    }

    #[tokio::test]
    async fn update_answer_is_last_write_wins() {
        let engine = engine();
        let started =
            engine.start("user-1", &sample_test(), "KEY", at(0)).await.expect("start");

        engine
            .update_answer(&started.session_id, SectionId::WritingOne, "first draft")
            .await
            .expect("first write");
        engine
            .update_answer(&started.session_id, SectionId::WritingOne, "final draft")
            .await
            .expect("second write");
        engine
            .update_answer(&started.session_id, SectionId::Listening, "answer B")
            .await
            .expect("other section");

        let InitOutcome::Ready(data) =
            engine.initialize(&started.session_id, at(5)).await.expect("initialize")
        else {
            panic!("expected ready session");
        };

        assert_eq!(data.answers["writing_one"], "final draft");
        assert_eq!(data.answers["listening"], "answer B");
    }

    #[tokio::test]
    async fn update_answer_without_session_is_not_found() {
        let engine = engine();
        let err = engine
            .update_answer("missing", SectionId::Listening, "late answer")
            .await
            .expect_err("no session");
        assert!(matches!(err, SessionError::NotFound));
    }

    #[tokio::test]
    async fn tick_persists_and_expires_once() {
        let engine = engine();
        let started =
            engine.start("user-1", &sample_test(), "KEY", at(0)).await.expect("start");

        engine
            .store
            .set(&field_key(&started.session_id, FIELD_TIME_REMAINING), "2")
            .await
            .expect("seed time");

        assert_eq!(engine.tick(&started.session_id).await.expect("tick"), TimerTick::Running(1));
        let persisted = engine
            .store
            .get(&field_key(&started.session_id, FIELD_TIME_REMAINING))
            .await
            .expect("get")
            .expect("present");
        assert_eq!(persisted, "1");

        assert_eq!(engine.tick(&started.session_id).await.expect("tick"), TimerTick::Expired);
        let persisted = engine
            .store
            .get(&field_key(&started.session_id, FIELD_TIME_REMAINING))
            .await
            .expect("get")
            .expect("present");
        assert_eq!(persisted, "0");

        assert_eq!(engine.tick(&started.session_id).await.expect("tick"), TimerTick::Expired);
    }

    #[tokio::test]
    async fn finish_clears_everything_and_reports_once() {
        let engine = engine();
        let started =
            engine.start("user-1", &sample_test(), "KEY", at(0)).await.expect("start");

        engine
            .update_answer(&started.session_id, SectionId::ReadingOne, "<p>done</p>")
            .await
            .expect("answer");

        let finished = engine
            .finish(&started.session_id, at(90))
            .await
            .expect("finish")
            .expect("first finish wins");

        assert_eq!(finished.user_id, "user-1");
        assert_eq!(finished.test_id, "test-1");
        assert_eq!(finished.duration_seconds, 90);
        assert_eq!(finished.final_html["reading_one"], "<p>done</p>");
        assert_eq!(finished.initial_html["reading_one"], "<p>questions</p>");

        // Second finish loses: the session is gone.
        assert!(engine.finish(&started.session_id, at(91)).await.expect("finish").is_none());

        // And initialize behaves as if the session never existed.
        let outcome = engine.initialize(&started.session_id, at(92)).await.expect("initialize");
        assert!(matches!(outcome, InitOutcome::Missing { redirect: RedirectTarget::Entry }));
    }

    #[tokio::test]
    async fn lease_blocks_second_session_until_finish() {
        let engine = engine();
        let first = engine.start("user-1", &sample_test(), "KEY1", at(0)).await.expect("start");

        let err = engine
            .start("user-1", &sample_test(), "KEY2", at(1))
            .await
            .expect_err("second start");
        assert!(matches!(err, SessionError::AlreadyActive));

        engine.finish(&first.session_id, at(2)).await.expect("finish");

        engine
            .start("user-1", &sample_test(), "KEY3", at(3))
            .await
            .expect("start after finish");
    }

    #[tokio::test]
    async fn wall_clock_policy_charges_reload_time() {
        let engine = engine_with(TimerPolicy::WallClock);
        let started =
            engine.start("user-1", &sample_test(), "KEY", at(0)).await.expect("start");

        // The persisted value lags behind wall-clock elapsed time, as it
        // would after a reload.
        engine
            .store
            .set(&field_key(&started.session_id, FIELD_TIME_REMAINING), "10790")
            .await
            .expect("seed time");

        let InitOutcome::Ready(data) =
            engine.initialize(&started.session_id, at(600)).await.expect("initialize")
        else {
            panic!("expected ready session");
        };
        assert_eq!(data.time_remaining, 10_200);
    }

    #[tokio::test]
    async fn tick_count_policy_resumes_from_persisted_value() {
        let engine = engine();
        let started =
            engine.start("user-1", &sample_test(), "KEY", at(0)).await.expect("start");

        engine
            .store
            .set(&field_key(&started.session_id, FIELD_TIME_REMAINING), "10790")
            .await
            .expect("seed time");

        let InitOutcome::Ready(data) =
            engine.initialize(&started.session_id, at(600)).await.expect("initialize")
        else {
            panic!("expected ready session");
        };
        assert_eq!(data.time_remaining, 10_790);
    }

    #[tokio::test]
    async fn visibility_round_trip_arms_and_cancels() {
        let engine = engine();
        let started =
            engine.start("user-1", &sample_test(), "KEY", at(0)).await.expect("start");

        let status = engine
            .visibility(&started.session_id, VisibilityEvent::Hidden, at(10))
            .await
            .expect("hidden");
        assert!(status.blurred);
        assert!(status.redirect.is_none());

        // Back within the grace period: no violation.
        let status = engine
            .visibility(&started.session_id, VisibilityEvent::Visible, at(10))
            .await
            .expect("visible");
        assert!(!status.blurred);
        assert_eq!(status.violations, 0);

        // Hidden past the deadline: the ticker poll fires the redirect.
        engine
            .visibility(&started.session_id, VisibilityEvent::Hidden, at(20))
            .await
            .expect("hidden again");
        let status = engine.poll_focus(&started.session_id, at(22)).await.expect("poll");
        assert_eq!(status.redirect, Some(RedirectTarget::Violation));
        assert_eq!(status.violations, 1);

        // The violation fired exactly once.
        let status = engine.poll_focus(&started.session_id, at(23)).await.expect("poll");
        assert!(status.redirect.is_none());
        assert_eq!(status.violations, 1);
    }
}
