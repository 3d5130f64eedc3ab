use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use mentor_core::{
    classify_topic, greeting, normalize_text, select_response, ChatInput, ChatMessage,
    ChatSession, FinanceTopic, PendingTurn, ProfileType, Sender,
};
use mentor_observability::AppMetrics;
use mentor_storage::SessionRepository;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

/// Default simulated response latency. The delay always completes; there is
/// no cancellation once a turn has started.
const DEFAULT_LATENCY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Serialize)]
pub enum SubmitOutcome {
    Accepted {
        session_id: String,
        user_message: ChatMessage,
    },
    RejectedEmpty,
    RejectedTurnInFlight {
        session_id: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub session_id: String,
    pub topic: FinanceTopic,
    pub reply: ChatMessage,
    pub message_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub enum TurnOutcome {
    Completed(TurnReply),
    Rejected(SubmitOutcome),
}

/// Sequences one classify-select-deliver cycle per user message. Each
/// session holds at most one in-flight turn: `submit` appends the user
/// message synchronously and gates further input, `resolve` delivers the
/// bot reply after the simulated latency and reopens the session.
#[derive(Clone)]
pub struct ChatTurnController<S: SessionRepository> {
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
    rng: Arc<Mutex<StdRng>>,
    latency: Duration,
}

impl<S: SessionRepository> ChatTurnController<S> {
    pub fn new(store: Arc<S>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            store,
            metrics,
            rng: Arc::new(Mutex::new(StdRng::from_os_rng())),
            latency: DEFAULT_LATENCY,
        }
    }

    /// Fixes the fallback random source so tests reproduce the same
    /// general-topic reply sequence.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Idle -> AwaitingResponse. Blank input and in-flight turns are
    /// rejected as no-ops; the log length is unchanged on rejection.
    #[instrument(skip(self, text))]
    pub async fn submit(
        &self,
        session_id: Option<&str>,
        profile: Option<ProfileType>,
        text: &str,
    ) -> Result<SubmitOutcome> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            self.metrics.inc_rejected_submission();
            return Ok(SubmitOutcome::RejectedEmpty);
        }

        // The gate and the append run inside one store mutation, so two
        // racing submissions to the same session cannot both pass the
        // pending-turn check.
        let id = self.session_key(session_id);
        let outcome = self
            .store
            .mutate_session(
                &id,
                || self.seed_session(&id, profile),
                |session| {
                    if session.pending_turn.is_some() {
                        return SubmitOutcome::RejectedTurnInFlight {
                            session_id: session.session_id.clone(),
                        };
                    }

                    // Profile is chosen once per session; later submissions
                    // never overwrite it.
                    if session.profile.is_none() {
                        session.profile = profile;
                    }

                    let user_message = session.append_message(normalized.clone(), Sender::User);
                    session.pending_turn = Some(PendingTurn { text: normalized.clone() });
                    SubmitOutcome::Accepted {
                        session_id: session.session_id.clone(),
                        user_message,
                    }
                },
            )
            .await?;

        if matches!(outcome, SubmitOutcome::RejectedTurnInFlight { .. }) {
            self.metrics.inc_rejected_submission();
        }
        Ok(outcome)
    }

    /// AwaitingResponse -> Idle. Sleeps the simulated latency, then appends
    /// exactly one bot message for the pending user message. Returns `None`
    /// when the session is idle.
    #[instrument(skip(self))]
    pub async fn resolve(&self, session_id: &str) -> Result<Option<TurnReply>> {
        tokio::time::sleep(self.latency).await;

        let Some(mut session) = self.store.load_session(session_id).await? else {
            return Ok(None);
        };
        let Some(pending) = session.pending_turn.take() else {
            return Ok(None);
        };

        let topic = classify_topic(&pending.text);
        if topic == FinanceTopic::General {
            self.metrics.inc_general_fallback();
        }

        let reply_text = {
            let mut rng = self.rng.lock();
            select_response(topic, session.profile, &mut *rng)
        };
        let reply = session.append_message(reply_text.to_string(), Sender::Bot);
        let message_count = session.messages.len();
        self.store.upsert_session(&session).await?;

        self.metrics.inc_turn();
        info!(
            session_id = %session.session_id,
            topic = ?topic,
            messages = message_count,
            "turn resolved"
        );

        Ok(Some(TurnReply {
            session_id: session.session_id,
            topic,
            reply,
            message_count,
        }))
    }

    /// One full submit-resolve cycle, as driven by the api and cli.
    pub async fn handle_turn(&self, input: ChatInput) -> Result<TurnOutcome> {
        let started = Instant::now();
        let profile = ProfileType::from_optional_str(input.profile.as_deref());

        let outcome = self
            .submit(input.session_id.as_deref(), profile, &input.text)
            .await?;
        let session_id = match &outcome {
            SubmitOutcome::Accepted { session_id, .. } => session_id.clone(),
            _ => return Ok(TurnOutcome::Rejected(outcome)),
        };

        let reply = self.resolve(&session_id).await?;
        self.metrics.observe_turn_latency(started.elapsed());

        match reply {
            Some(reply) => Ok(TurnOutcome::Completed(reply)),
            // submit just registered the pending turn, so resolve always
            // finds it; this arm only guards against a dropped session.
            None => Ok(TurnOutcome::Rejected(SubmitOutcome::RejectedTurnInFlight {
                session_id,
            })),
        }
    }

    pub async fn session(&self, session_id: &str) -> Result<Option<ChatSession>> {
        self.store.load_session(session_id).await
    }

    /// Sets the session profile once; later calls are ignored. Creates the
    /// session (with its greeting) when it does not exist yet.
    pub async fn set_profile_once(
        &self,
        session_id: Option<&str>,
        profile: ProfileType,
    ) -> Result<ChatSession> {
        let id = self.session_key(session_id);
        self.store
            .mutate_session(
                &id,
                || self.seed_session(&id, Some(profile)),
                |session| {
                    if session.profile.is_none() {
                        session.profile = Some(profile);
                    }
                    session.clone()
                },
            )
            .await
    }

    fn session_key(&self, session_id: Option<&str>) -> String {
        session_id
            .map(ToString::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    fn seed_session(&self, session_id: &str, profile: Option<ProfileType>) -> ChatSession {
        let mut session = ChatSession::new(session_id, profile);
        session.append_message(greeting(profile), Sender::Bot);
        session
    }
}
