//! Tests for the simulator facade.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

use super::Graph;
use crate::client::{ConnectionQuery, FetchOptions};
use crate::config::GraphConfig;
use crate::error::Error;
use crate::graph::{GraphObject, NodeKind};

const SECRET: &str = "s3cr3t";

fn graph() -> Arc<Graph> {
    let mut config = GraphConfig::for_app("app", SECRET);
    config.test_users.seed = Some(7);
    Arc::new(Graph::from_config(config).unwrap())
}

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Provisions a user directly and returns (id, token).
fn provision(graph: &Graph, installed: bool) -> (String, String) {
    let created = graph
        .put(
            None,
            "app",
            "accounts/test-users",
            &fields(json!({"installed": installed})),
        )
        .unwrap();
    (
        created["id"].as_str().unwrap().to_string(),
        created["access_token"].as_str().unwrap().to_string(),
    )
}

#[test]
fn test_invalid_config_is_rejected() {
    assert!(matches!(Graph::new("app", ""), Err(Error::Config(_))));
    assert!(Graph::new("", SECRET).is_err());
}

#[test]
fn test_application_object_exists() {
    let graph = graph();
    let app = graph.fetch(None, "app", &FetchOptions::new()).unwrap();
    assert_eq!(app, json!({"id": "app", "name": "app"}));
}

#[test]
fn test_provisioning_scenario() {
    let graph = graph();
    let (id, token) = provision(&graph, true);

    assert!(id.starts_with("testuser"));
    assert!(id["testuser".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    assert!(graph.is_installed(&id));

    let me = graph.fetch(Some(&token), "me", &FetchOptions::new()).unwrap();
    assert_eq!(me["id"], json!(id));
    assert!(!me["name"].as_str().unwrap().is_empty());
}

#[test]
fn test_me_requires_token() {
    let graph = graph();
    assert!(matches!(
        graph.fetch(None, "me", &FetchOptions::new()),
        Err(Error::AuthRequired)
    ));
    assert!(matches!(
        graph.fetch(Some("bogus"), "me", &FetchOptions::new()),
        Err(Error::InvalidToken(_))
    ));
}

#[test]
fn test_fetch_unknown_object() {
    let graph = graph();
    assert!(matches!(
        graph.fetch(None, "404", &FetchOptions::new()),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_fetch_fields_projection() {
    let graph = graph();
    let (id, _) = provision(&graph, false);
    let options = FetchOptions::new().with_fields(["first_name"]);
    let user = graph.fetch(None, &id, &options).unwrap();

    let keys: Vec<&String> = user.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 2);
    assert!(user.get("first_name").is_some());
    assert_eq!(user["id"], json!(id));
}

#[test]
fn test_fetch_metadata() {
    let graph = graph();
    let (id, _) = provision(&graph, false);
    let user = graph
        .fetch(None, &id, &FetchOptions::new().with_metadata())
        .unwrap();

    assert_eq!(user["type"], "user");
    assert_eq!(
        user["metadata"]["connections"]["friends"],
        json!(format!("https://graph.facebook.com/{id}/friends"))
    );
    assert!(user["metadata"]["connections"].get("accounts").is_none());
}

#[test]
fn test_fetch_with_path_reads_connection() {
    let graph = graph();
    let (_, token) = provision(&graph, true);
    let feed = graph
        .fetch(Some(&token), "me/feed", &FetchOptions::new())
        .unwrap();
    assert_eq!(feed, json!({"data": []}));
}

#[test]
fn test_mutual_friends() {
    let graph = graph();
    let (a, a_token) = provision(&graph, true);
    let (b, b_token) = provision(&graph, true);

    graph
        .put(Some(&a_token), &a, &format!("friends/{b}"), &Map::new())
        .unwrap();
    graph
        .put(Some(&b_token), &b, &format!("friends/{a}"), &Map::new())
        .unwrap();
    // Repeating a friend write is a no-op
    graph
        .put(Some(&a_token), "me", &format!("friends/{b}"), &Map::new())
        .unwrap();

    let a_friends = graph
        .fetch_connection(Some(&a_token), "me", "friends", &ConnectionQuery::new())
        .unwrap();
    let b_friends = graph
        .fetch_connection(Some(&b_token), "me", "friends", &ConnectionQuery::new())
        .unwrap();
    assert_eq!(a_friends, json!({"data": [{"id": b}]}));
    assert_eq!(b_friends, json!({"data": [{"id": a}]}));
}

#[test]
fn test_friend_write_is_one_sided() {
    let graph = graph();
    let (a, _) = provision(&graph, true);
    let (b, _) = provision(&graph, true);
    graph
        .put(None, &a, &format!("friends/{b}"), &Map::new())
        .unwrap();

    let b_friends = graph
        .fetch_connection(None, &b, "friends", &ConnectionQuery::new())
        .unwrap();
    assert_eq!(b_friends["data"], json!([]));
}

#[test]
fn test_unknown_relation_is_not_found() {
    let graph = graph();
    let (id, _) = provision(&graph, true);
    assert!(matches!(
        graph.fetch_connection(None, &id, "photos", &ConnectionQuery::new()),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        graph.put(None, &id, "photos", &Map::new()),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_read_sub_path_is_not_found() {
    let graph = graph();
    let (id, _) = provision(&graph, true);
    assert!(graph
        .fetch_connection(None, &id, "friends/someone", &ConnectionQuery::new())
        .is_err());
    assert!(graph
        .fetch_connection(None, "app", "accounts", &ConnectionQuery::new())
        .is_err());
}

#[test]
fn test_listing_test_users() {
    let graph = graph();
    let (a, a_token) = provision(&graph, true);
    let (b, _) = provision(&graph, false);

    let listed = graph
        .fetch_connection(None, "app", "accounts/test-users", &ConnectionQuery::new())
        .unwrap();
    let data = listed["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0], json!({"id": a, "access_token": a_token}));
    assert_eq!(data[1]["id"], json!(b));
}

#[test]
fn test_connection_paging() {
    let graph = graph();
    let (id, token) = provision(&graph, true);
    for n in 0..5 {
        graph
            .put(Some(&token), "me", "feed", &fields(json!({"message": format!("post {n}")})))
            .unwrap();
    }

    let query = ConnectionQuery::new().with_offset(1).with_limit(2);
    let page = graph.fetch_connection(None, &id, "feed", &query).unwrap();
    let messages: Vec<&str> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["message"].as_str().unwrap())
        .collect();
    assert_eq!(messages, vec!["post 1", "post 2"]);
}

#[test]
fn test_connection_time_window() {
    let graph = graph();
    let (id, token) = provision(&graph, true);
    graph
        .put(Some(&token), "me", "feed", &fields(json!({"message": "hi"})))
        .unwrap();

    let hour = Duration::hours(1);
    let future = ConnectionQuery::new().since(Utc::now() + hour);
    let past = ConnectionQuery::new().until(Utc::now() - hour);
    let around = ConnectionQuery::new()
        .since(Utc::now() - hour)
        .until(Utc::now() + hour);

    let count = |q: &ConnectionQuery| {
        graph.fetch_connection(None, &id, "feed", q).unwrap()["data"]
            .as_array()
            .unwrap()
            .len()
    };
    assert_eq!(count(&future), 0);
    assert_eq!(count(&past), 0);
    assert_eq!(count(&around), 1);
}

#[test]
fn test_time_window_keeps_entries_without_timestamp() {
    let graph = graph();
    let (a, _) = provision(&graph, true);
    let (b, _) = provision(&graph, true);
    graph
        .put(None, &a, &format!("friends/{b}"), &Map::new())
        .unwrap();

    let query = ConnectionQuery::new().since(Utc::now() + Duration::days(1));
    let friends = graph.fetch_connection(None, &a, "friends", &query).unwrap();
    assert_eq!(friends["data"].as_array().unwrap().len(), 1);
}

#[test]
fn test_wall_post_becomes_object() {
    let graph = graph();
    let (id, token) = provision(&graph, true);
    let created = graph
        .put(Some(&token), "me", "feed", &fields(json!({"message": "hello"})))
        .unwrap();
    let post_id = created["id"].as_str().unwrap();

    let post = graph.fetch(None, post_id, &FetchOptions::new()).unwrap();
    assert_eq!(post["message"], "hello");
    assert_eq!(post["from"]["id"], json!(id));

    graph
        .put(Some(&token), post_id, "comments", &fields(json!({"message": "nice"})))
        .unwrap();
    graph.put(Some(&token), post_id, "likes", &Map::new()).unwrap();
    let comments = graph
        .fetch_connection(None, post_id, "comments", &ConnectionQuery::new())
        .unwrap();
    assert_eq!(comments["data"][0]["message"], "nice");
}

#[test]
fn test_multi_fetch() {
    let graph = graph();
    let (a, a_token) = provision(&graph, true);
    let result = graph.multi_fetch(Some(&a_token), &["app", "me"]).unwrap();
    assert_eq!(result["app"]["id"], "app");
    assert_eq!(result["me"]["id"], json!(a));

    assert!(graph.multi_fetch(None, &["app", "missing"]).is_err());
}

#[test]
fn test_search() {
    let graph = graph();
    graph.set(
        "1",
        GraphObject::new("1", NodeKind::User).with_field("name", json!("Ada Lovelace")),
    );
    graph.set(
        "2",
        GraphObject::new("2", NodeKind::User).with_field("name", json!("Charles Babbage")),
    );
    graph.set(
        "3",
        GraphObject::new("3", NodeKind::Post).with_field("message", json!("ada rocks")),
    );

    let hits = graph.search(None, "user", "ADA", &BTreeMap::new()).unwrap();
    assert_eq!(hits, json!({"data": [{"id": "1", "name": "Ada Lovelace"}]}));

    let posts = graph.search(None, "post", "ada", &BTreeMap::new()).unwrap();
    assert_eq!(posts["data"][0]["id"], "3");

    assert!(matches!(
        graph.search(None, "page", "ada", &BTreeMap::new()),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_search_paging() {
    let graph = graph();
    for n in 0..4 {
        let id = format!("u{n}");
        graph.set(
            &id,
            GraphObject::new(&id, NodeKind::User).with_field("name", json!(format!("Smith {n}"))),
        );
    }
    let mut extra = BTreeMap::new();
    extra.insert("limit".to_string(), "2".to_string());
    extra.insert("offset".to_string(), "1".to_string());
    let hits = graph.search(None, "user", "smith", &extra).unwrap();
    assert_eq!(hits["data"][0]["id"], "u1");
    assert_eq!(hits["data"].as_array().unwrap().len(), 2);

    extra.insert("limit".to_string(), "many".to_string());
    assert!(matches!(
        graph.search(None, "user", "smith", &extra),
        Err(Error::InvalidParameter(_))
    ));
}

#[test]
fn test_delete_revokes_and_cascades() {
    let graph = graph();
    let (a, a_token) = provision(&graph, true);
    let (b, _) = provision(&graph, true);
    graph
        .put(None, &b, &format!("friends/{a}"), &Map::new())
        .unwrap();

    assert_eq!(graph.delete(None, &a).unwrap(), Value::Bool(true));
    assert!(graph.get(&a).is_err());
    assert!(!graph.is_installed(&a));
    assert!(matches!(
        graph.fetch(Some(&a_token), "me", &FetchOptions::new()),
        Err(Error::InvalidToken(_))
    ));

    let b_friends = graph
        .fetch_connection(None, &b, "friends", &ConnectionQuery::new())
        .unwrap();
    assert_eq!(b_friends["data"], json!([]));
    let listed = graph
        .fetch_connection(None, "app", "accounts/test-users", &ConnectionQuery::new())
        .unwrap();
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    assert!(graph.delete(None, &a).is_err());
}

#[test]
fn test_update_merges_profile() {
    let graph = graph();
    let (id, _) = provision(&graph, false);
    graph
        .update(&id, fields(json!({"gender": "female"})))
        .unwrap();
    assert_eq!(graph.get(&id).unwrap().str_field("gender"), Some("female"));
    assert!(graph.update("missing", Map::new()).is_err());
}

#[test]
fn test_install_and_uninstall() {
    let graph = graph();
    let (id, _) = provision(&graph, false);
    assert!(!graph.is_installed(&id));

    graph.install_user(&id, &["email"]).unwrap();
    assert_eq!(graph.permissions(&id), Some(vec!["email".to_string()]));
    assert!(graph.uninstall_user(&id));
    assert!(!graph.uninstall_user(&id));

    assert!(graph.install_user("ghost", &["email"]).is_err());
}

#[test]
fn test_signed_request_embeds_token_only_when_installed() {
    let graph = graph();
    let (installed, token) = provision(&graph, true);
    let (visitor, _) = provision(&graph, false);

    let request = graph
        .parse_signed_request(&graph.build_signed_request(&installed).unwrap())
        .unwrap();
    assert_eq!(request.user_id.as_deref(), Some(installed.as_str()));
    assert_eq!(request.oauth_token.as_deref(), Some(token.as_str()));

    let anonymous = graph
        .parse_signed_request(&graph.build_signed_request(&visitor).unwrap())
        .unwrap();
    assert_eq!(anonymous.oauth_token, None);
}

#[test]
fn test_cookie_round_trip() {
    let graph = graph();
    let (id, token) = provision(&graph, true);

    let mut cookies = HashMap::new();
    cookies.insert(graph.cookie_name(), graph.build_cookie(&id, 0));
    let session = graph.user_from_cookies(&cookies).unwrap();
    assert_eq!(session["uid"], id);
    assert_eq!(session["access_token"], token);

    cookies.insert(graph.cookie_name(), "uid=1&sig=00".to_string());
    assert!(graph.user_from_cookies(&cookies).is_none());
}

#[test]
fn test_rotated_token_replaces_old_one() {
    let graph = graph();
    let (id, token) = provision(&graph, true);
    let rotated = graph.rotate_access_token(&id);
    assert_ne!(rotated, token);
    assert!(graph.fetch(Some(&token), "me", &FetchOptions::new()).is_err());
    assert_eq!(
        graph.fetch(Some(&rotated), "me", &FetchOptions::new()).unwrap()["id"],
        json!(id)
    );
}

#[test]
fn test_app_access_token() {
    let graph = graph();
    let token = graph.app_access_token("app", SECRET).unwrap();
    assert_eq!(token, graph.build_access_token("app"));
    assert!(matches!(
        graph.app_access_token("app", "wrong"),
        Err(Error::Authentication(_))
    ));
    assert!(graph.app_access_token("other", SECRET).is_err());
}

#[test]
fn test_realtime_update() {
    let graph = graph();
    let (id, _) = provision(&graph, true);

    let mut changes = BTreeMap::new();
    changes.insert(id.clone(), vec!["name", "friends"]);
    let update = graph.realtime_update("user", &changes).unwrap();
    assert_eq!(update["object"], "user");
    assert_eq!(update["entry"][0]["uid"], json!(id));
    assert_eq!(update["entry"][0]["changed_fields"], json!(["name", "friends"]));
    assert!(update["entry"][0]["time"].as_i64().unwrap() > 0);

    assert!(graph.realtime_update("page", &changes).is_err());
    let mut wrong_kind = BTreeMap::new();
    wrong_kind.insert("app".to_string(), vec!["name"]);
    assert!(graph.realtime_update("user", &wrong_kind).is_err());
}

#[test]
fn test_create_user_with_profile() {
    let graph = graph();
    let user = graph
        .create_user(true, &["email"], fields(json!({"locale": "fr_FR"})))
        .unwrap();
    assert!(graph.is_installed(user.id()));
    assert_eq!(graph.get(user.id()).unwrap().str_field("locale"), Some("fr_FR"));
}

#[test]
fn test_concurrent_writes_are_not_lost() {
    let graph = graph();
    let (id, _) = provision(&graph, true);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let graph = Arc::clone(&graph);
            let id = id.clone();
            std::thread::spawn(move || {
                for n in 0..25 {
                    graph
                        .put(None, &id, "feed", &fields(json!({"message": format!("{t}-{n}")})))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let feed = graph
        .fetch_connection(None, &id, "feed", &ConnectionQuery::new())
        .unwrap();
    assert_eq!(feed["data"].as_array().unwrap().len(), 100);
}
