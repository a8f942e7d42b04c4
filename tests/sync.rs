// test me: cargo t --test sync -- --nocapture
// Needs a reachable Postgres; tests skip themselves otherwise.

mod common;

use reqwest::StatusCode;
use serde_json::json;

fn two_message_payload() -> serde_json::Value {
    json!({
        "provider": "chatgpt",
        "externalId": "abc",
        "title": "Greetings",
        "url": "https://chatgpt.com/c/abc",
        "messages": [
            {"role": "user", "content": "Hi", "index": 0},
            {"role": "assistant", "content": "Hello!", "index": 1},
        ],
    })
}

#[tokio::test]
async fn push_without_token_is_rejected() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/sync", app.address))
        .json(&two_message_payload())
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(StatusCode::UNAUTHORIZED, response.status());
    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn push_with_garbage_token_is_rejected() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/sync", app.address))
        .header("Authorization", "Bearer not.a.token")
        .json(&two_message_payload())
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(StatusCode::UNAUTHORIZED, response.status());
    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn push_with_expired_token_is_rejected() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/sync", app.address))
        .bearer_auth(app.expired_token_for("user_1"))
        .json(&two_message_payload())
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(StatusCode::UNAUTHORIZED, response.status());
    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn push_with_foreign_issuer_is_rejected() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/sync", app.address))
        .bearer_auth(app.foreign_issuer_token_for("user_1"))
        .json(&two_message_payload())
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(StatusCode::UNAUTHORIZED, response.status());
}

#[tokio::test]
async fn push_with_subjectless_token_is_rejected() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/sync", app.address))
        .bearer_auth(app.subjectless_token())
        .json(&two_message_payload())
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(StatusCode::UNAUTHORIZED, response.status());
    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["code"], "MISSING_USER_ID");
}

#[tokio::test]
async fn rejected_push_reaches_no_storage() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/sync", app.address))
        .header("Authorization", "Bearer forged.token.value")
        .json(&two_message_payload())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(StatusCode::UNAUTHORIZED, response.status());

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations")
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to count conversations");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn push_with_unknown_provider_is_rejected() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let mut payload = two_message_payload();
    payload["provider"] = json!("copilot");

    let response = client
        .post(format!("{}/sync", app.address))
        .bearer_auth(app.token_for("user_1"))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(StatusCode::BAD_REQUEST, response.status());
    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["code"], "INVALID_PROVIDER");
}

#[tokio::test]
async fn push_with_missing_fields_is_rejected() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/sync", app.address))
        .bearer_auth(app.token_for("user_1"))
        .json(&json!({"provider": "chatgpt"}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(StatusCode::BAD_REQUEST, response.status());
    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["code"], "MISSING_FIELDS");
}

#[tokio::test]
async fn repeated_push_updates_one_conversation() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let token = app.token_for("user_1");

    let first = client
        .post(format!("{}/sync", app.address))
        .bearer_auth(&token)
        .json(&two_message_payload())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(StatusCode::OK, first.status());
    let first = first.json::<serde_json::Value>().await.unwrap();
    assert_eq!(first["success"], true);
    let conversation_id = first["conversationId"].as_str().unwrap().to_string();

    let second = client
        .post(format!("{}/sync", app.address))
        .bearer_auth(&token)
        .json(&two_message_payload())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(StatusCode::OK, second.status());
    let second = second.json::<serde_json::Value>().await.unwrap();
    assert_eq!(second["conversationId"].as_str().unwrap(), conversation_id);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations")
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to count conversations");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn stored_messages_match_snapshot_order() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let token = app.token_for("user_1");

    let response = client
        .post(format!("{}/sync", app.address))
        .bearer_auth(&token)
        .json(&two_message_payload())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(StatusCode::OK, response.status());
    let body = response.json::<serde_json::Value>().await.unwrap();
    let conversation_id = body["conversationId"].as_str().unwrap();

    let item = client
        .get(format!("{}/conversation/{}", app.address, conversation_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json::<serde_json::Value>()
        .await
        .unwrap();

    let messages = item["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["position"], 0);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "Hi");
    assert_eq!(messages[1]["position"], 1);
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "Hello!");
}

#[tokio::test]
async fn shrinking_snapshot_leaves_no_stale_rows() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let token = app.token_for("user_1");

    let five = json!({
        "provider": "claude",
        "externalId": "conv-5",
        "messages": (0..5).map(|i| json!({
            "role": if i % 2 == 0 { "user" } else { "assistant" },
            "content": format!("message {}", i),
            "index": i,
        })).collect::<Vec<_>>(),
    });
    let response = client
        .post(format!("{}/sync", app.address))
        .bearer_auth(&token)
        .json(&five)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(StatusCode::OK, response.status());

    let two = json!({
        "provider": "claude",
        "externalId": "conv-5",
        "messages": [
            {"role": "user", "content": "rewritten", "index": 0},
            {"role": "assistant", "content": "entirely", "index": 1},
        ],
    });
    let response = client
        .post(format!("{}/sync", app.address))
        .bearer_auth(&token)
        .json(&two)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(StatusCode::OK, response.status());
    let body = response.json::<serde_json::Value>().await.unwrap();
    let conversation_id = body["conversationId"].as_str().unwrap();

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = $1::uuid")
            .bind(conversation_id)
            .fetch_one(&app.db_pool)
            .await
            .expect("Failed to count messages");
    assert_eq!(count, 2);
}

#[tokio::test]
async fn growing_conversation_keeps_identity_and_advances_sync_time() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let token = app.token_for("user_1");

    let first = client
        .post(format!("{}/sync", app.address))
        .bearer_auth(&token)
        .json(&two_message_payload())
        .send()
        .await
        .expect("Failed to send request")
        .json::<serde_json::Value>()
        .await
        .unwrap();
    let conversation_id = first["conversationId"].as_str().unwrap().to_string();

    let before = client
        .get(format!("{}/conversation/{}", app.address, conversation_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    let first_synced_at = before["conversation"]["last_synced_at"]
        .as_str()
        .unwrap()
        .to_string();

    let mut payload = two_message_payload();
    payload["messages"]
        .as_array_mut()
        .unwrap()
        .push(json!({"role": "user", "content": "One more thing", "index": 2}));

    let second = client
        .post(format!("{}/sync", app.address))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request")
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(second["conversationId"].as_str().unwrap(), conversation_id);

    let after = client
        .get(format!("{}/conversation/{}", app.address, conversation_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();

    assert_eq!(after["conversation"]["message_count"], 3);
    let first_synced_at =
        chrono::DateTime::parse_from_rfc3339(&first_synced_at).expect("timestamp should parse");
    let second_synced_at = chrono::DateTime::parse_from_rfc3339(
        after["conversation"]["last_synced_at"].as_str().unwrap(),
    )
    .expect("timestamp should parse");
    assert!(second_synced_at > first_synced_at);
}

#[tokio::test]
async fn owners_do_not_see_each_other() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    for owner in ["user_1", "user_2"] {
        let response = client
            .post(format!("{}/sync", app.address))
            .bearer_auth(app.token_for(owner))
            .json(&two_message_payload())
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(StatusCode::OK, response.status());
    }

    // Same natural key pushed by two owners stays two conversations.
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations")
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to count conversations");
    assert_eq!(count, 2);

    let list = client
        .get(format!("{}/conversation", app.address))
        .bearer_auth(app.token_for("user_1"))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(list["conversations"].as_array().unwrap().len(), 1);
    assert_eq!(list["conversations"][0]["owner_id"], "user_1");
}

#[tokio::test]
async fn deleting_a_conversation_cascades() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let token = app.token_for("user_1");

    let pushed = client
        .post(format!("{}/sync", app.address))
        .bearer_auth(&token)
        .json(&two_message_payload())
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    let conversation_id = pushed["conversationId"].as_str().unwrap().to_string();

    let toggled = client
        .post(format!("{}/bookmark", app.address))
        .bearer_auth(&token)
        .json(&json!({"provider": "chatgpt", "externalId": "abc", "messageIndex": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::OK, toggled.status());

    let deleted = client
        .delete(format!("{}/conversation/{}", app.address, conversation_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::OK, deleted.status());

    for table in ["messages", "bookmarks"] {
        let (count,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&app.db_pool)
                .await
                .expect("Failed to count rows");
        assert_eq!(count, 0, "{} should be empty after cascade", table);
    }

    let gone = client
        .get(format!("{}/conversation/{}", app.address, conversation_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::NOT_FOUND, gone.status());
}

#[tokio::test]
async fn stats_reflect_synced_content() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let token = app.token_for("user_1");

    let response = client
        .post(format!("{}/sync", app.address))
        .bearer_auth(&token)
        .json(&two_message_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::OK, response.status());

    let stats = client
        .get(format!("{}/stats", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();

    assert_eq!(stats["totalConversations"], 1);
    assert_eq!(stats["totalMessages"], 2);
    assert_eq!(stats["totalBookmarks"], 0);
    assert_eq!(stats["byProvider"]["chatgpt"], 1);
}
