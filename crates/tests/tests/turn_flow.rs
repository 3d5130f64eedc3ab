use std::sync::Arc;
use std::time::Duration;

use mentor_agents::{ChatTurnController, TurnOutcome};
use mentor_core::{ChatInput, FinanceTopic, GENERAL_RESPONSES};
use mentor_observability::AppMetrics;
use mentor_storage::MemoryStore;

fn controller(seed: u64) -> ChatTurnController<MemoryStore> {
    ChatTurnController::new(Arc::new(MemoryStore::new()), AppMetrics::shared())
        .with_seed(seed)
        .with_latency(Duration::from_millis(0))
}

async fn complete_turn(
    controller: &ChatTurnController<MemoryStore>,
    session_id: Option<String>,
    text: &str,
) -> mentor_agents::TurnReply {
    match controller
        .handle_turn(ChatInput {
            session_id,
            text: text.to_string(),
            profile: None,
        })
        .await
        .unwrap()
    {
        TurnOutcome::Completed(reply) => reply,
        TurnOutcome::Rejected(rejection) => panic!("turn rejected: {rejection:?}"),
    }
}

#[tokio::test]
async fn general_replies_come_from_the_fixed_catalog() {
    let controller = controller(42);
    let mut session_id: Option<String> = None;

    for _ in 0..20 {
        let reply = complete_turn(&controller, session_id.clone(), "hello there").await;
        assert_eq!(reply.topic, FinanceTopic::General);
        assert!(GENERAL_RESPONSES.contains(&reply.reply.text.as_str()));
        session_id = Some(reply.session_id);
    }
}

#[tokio::test]
async fn same_seed_reproduces_the_fallback_sequence() {
    let replies = |seed: u64| async move {
        let controller = controller(seed);
        let mut session_id: Option<String> = None;
        let mut texts = Vec::new();
        for _ in 0..5 {
            let reply = complete_turn(&controller, session_id.clone(), "good morning").await;
            session_id = Some(reply.session_id.clone());
            texts.push(reply.reply.text);
        }
        texts
    };

    assert_eq!(replies(7).await, replies(7).await);
}

#[tokio::test]
async fn sessions_do_not_share_state() {
    let controller = controller(3);

    let first = complete_turn(&controller, None, "budget tips").await;
    let second = complete_turn(&controller, None, "tax tips").await;

    assert_ne!(first.session_id, second.session_id);
    assert_eq!(first.topic, FinanceTopic::Budget);
    assert_eq!(second.topic, FinanceTopic::Tax);

    // Each log holds its own greeting, user message, and reply.
    assert_eq!(first.message_count, 3);
    assert_eq!(second.message_count, 3);
}
