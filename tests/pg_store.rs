//! Store checks against a real Postgres database.
//!
//! Run with `DATABASE_URL` pointing at a scratch database:
//! `cargo test --test pg_store -- --ignored`

use chrono::{Duration, Utc};
use dotenv::dotenv;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use taskgate::auth::token::{generate_pair, generate_token};
use taskgate::auth::SessionManager;
use taskgate::error::AppError;
use taskgate::models::{NewSessionToken, NewTask, NewUser, RegisterRequest, TaskChanges, User};
use taskgate::store::{PgStore, TaskStore, TokenStore, UserStore};

async fn store() -> PgStore {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    PgStore::connect(&database_url, 2)
        .await
        .expect("Failed to connect to test DB")
}

/// Emails are unique per run so the suite can share a database.
fn unique_email() -> String {
    format!("{}@example.com", &generate_token()[..16])
}

async fn seed_user(store: &PgStore) -> User {
    UserStore::create(
        store,
        NewUser {
            name: "Test".into(),
            email: unique_email(),
            password_hash: "hash".into(),
        },
    )
    .await
    .unwrap()
}

fn new_token(user_id: i32, ttl: Duration) -> NewSessionToken {
    let (access_token, refresh_token) = generate_pair();
    NewSessionToken {
        access_token,
        refresh_token,
        expires_at: Utc::now() + ttl,
        user_id,
    }
}

#[ignore]
#[actix_rt::test]
async fn test_users_round_trip_and_duplicate_email_conflicts() {
    let store = store().await;
    let user = seed_user(&store).await;

    let by_id = store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, user.email);
    let by_email = store.find_by_email(&user.email).await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);

    let err = UserStore::create(
        &store,
        NewUser {
            name: "Other".into(),
            email: user.email.clone(),
            password_hash: "hash".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[ignore]
#[actix_rt::test]
async fn test_duplicate_registration_reports_email_taken() {
    let store = Arc::new(store().await);
    let sessions = SessionManager::new(store.clone(), store).with_hash_cost(4);
    let email = unique_email();
    let request = || RegisterRequest {
        name: Some("Ana".into()),
        email: Some(email.clone()),
        password: Some("pw123".into()),
    };

    sessions.register(request()).await.unwrap();
    let err = sessions.register(request()).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(msg) if msg == "Email already registered"));
}

#[ignore]
#[actix_rt::test]
async fn test_supersede_replaces_all_user_tokens() {
    let store = store().await;
    let ana = seed_user(&store).await;
    let bob = seed_user(&store).await;

    TokenStore::create(&store, new_token(ana.id, Duration::hours(1)))
        .await
        .unwrap();
    TokenStore::create(&store, new_token(ana.id, Duration::hours(1)))
        .await
        .unwrap();
    TokenStore::create(&store, new_token(bob.id, Duration::hours(1)))
        .await
        .unwrap();

    let fresh = store
        .supersede(new_token(ana.id, Duration::hours(1)))
        .await
        .unwrap();

    let ana_tokens = store.find_all_by_user(ana.id).await.unwrap();
    assert_eq!(ana_tokens.len(), 1);
    assert_eq!(ana_tokens[0].id, fresh.id);
    assert_eq!(store.find_all_by_user(bob.id).await.unwrap().len(), 1);
}

#[ignore]
#[actix_rt::test]
async fn test_supersede_rolls_back_on_clash() {
    let store = store().await;
    let ana = seed_user(&store).await;
    let bob = seed_user(&store).await;
    let kept = TokenStore::create(&store, new_token(ana.id, Duration::hours(1)))
        .await
        .unwrap();
    let taken = TokenStore::create(&store, new_token(bob.id, Duration::hours(1)))
        .await
        .unwrap();

    let mut clashing = new_token(ana.id, Duration::hours(1));
    clashing.access_token = taken.access_token.clone();
    let err = store.supersede(clashing).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // The delete inside the failed transaction was rolled back.
    assert!(store
        .find_by_access_token(&kept.access_token)
        .await
        .unwrap()
        .is_some());
}

#[ignore]
#[actix_rt::test]
async fn test_rotate_keeps_identity() {
    let store = store().await;
    let ana = seed_user(&store).await;
    let row = TokenStore::create(&store, new_token(ana.id, Duration::hours(1)))
        .await
        .unwrap();

    let (access, refresh) = generate_pair();
    let later = Utc::now() + Duration::hours(2);
    let rotated = store
        .rotate(row.id, &access, &refresh, later)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rotated.id, row.id);
    assert_eq!(rotated.access_token, access);
    assert_eq!(rotated.refresh_token, refresh);
    // Postgres stores microseconds.
    assert!((rotated.expires_at - later).num_milliseconds().abs() < 1);
    assert!(store
        .find_by_refresh_token(&row.refresh_token)
        .await
        .unwrap()
        .is_none());

    assert!(store.delete_by_id(row.id).await.unwrap());
    let (access, refresh) = generate_pair();
    assert!(store
        .rotate(row.id, &access, &refresh, later)
        .await
        .unwrap()
        .is_none());
}

#[ignore]
#[actix_rt::test]
async fn test_delete_all_by_user_and_expired() {
    let store = store().await;
    let ana = seed_user(&store).await;
    let bob = seed_user(&store).await;

    let stale = TokenStore::create(&store, new_token(ana.id, -Duration::minutes(5)))
        .await
        .unwrap();
    let live = TokenStore::create(&store, new_token(ana.id, Duration::hours(1)))
        .await
        .unwrap();

    // Other tests may leave expired rows behind, so only a lower bound holds.
    assert!(store.delete_expired(Utc::now()).await.unwrap() >= 1);
    assert!(store
        .find_by_access_token(&stale.access_token)
        .await
        .unwrap()
        .is_none());
    assert!(store
        .find_by_access_token(&live.access_token)
        .await
        .unwrap()
        .is_some());

    TokenStore::create(&store, new_token(bob.id, Duration::hours(1)))
        .await
        .unwrap();
    assert_eq!(store.delete_all_by_user(ana.id).await.unwrap(), 1);
    assert!(store.find_all_by_user(ana.id).await.unwrap().is_empty());
    assert_eq!(store.find_all_by_user(bob.id).await.unwrap().len(), 1);
}

#[ignore]
#[actix_rt::test]
async fn test_tasks_are_owner_scoped() {
    let store = store().await;
    let ana = seed_user(&store).await;
    let bob = seed_user(&store).await;

    let task = TaskStore::create(
        &store,
        NewTask {
            title: "Buy milk".into(),
            completed: false,
            user_id: ana.id,
        },
    )
    .await
    .unwrap();

    assert!(store.find(bob.id, task.id).await.unwrap().is_none());
    assert!(store.list(bob.id).await.unwrap().is_empty());
    let stolen = TaskChanges {
        title: Some("Stolen".into()),
        completed: None,
    };
    assert!(store.update(bob.id, task.id, stolen).await.unwrap().is_none());
    assert!(!TaskStore::delete(&store, bob.id, task.id).await.unwrap());

    assert_eq!(store.find(ana.id, task.id).await.unwrap(), Some(task.clone()));
    assert_eq!(store.list(ana.id).await.unwrap(), vec![task.clone()]);
    assert!(TaskStore::delete(&store, ana.id, task.id).await.unwrap());
    assert!(store.find(ana.id, task.id).await.unwrap().is_none());
}

#[ignore]
#[actix_rt::test]
async fn test_partial_update_keeps_untouched_fields() {
    let store = store().await;
    let ana = seed_user(&store).await;
    let task = TaskStore::create(
        &store,
        NewTask {
            title: "Buy milk".into(),
            completed: true,
            user_id: ana.id,
        },
    )
    .await
    .unwrap();

    let only_title = TaskChanges {
        title: Some("Buy oat milk".into()),
        completed: None,
    };
    let updated = store.update(ana.id, task.id, only_title).await.unwrap().unwrap();
    assert_eq!(updated.title, "Buy oat milk");
    assert!(updated.completed);

    let explicit_false = TaskChanges {
        title: None,
        completed: Some(false),
    };
    let updated = store
        .update(ana.id, task.id, explicit_false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Buy oat milk");
    assert!(!updated.completed);

    let untouched = store
        .update(ana.id, task.id, TaskChanges::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched, updated);
}
