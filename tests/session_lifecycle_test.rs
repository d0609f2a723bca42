//! Integration tests for the login / refresh / logout lifecycle.

mod helpers;

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use askhub_auth::{AccessPolicy, AuthError, TokenScope};
use askhub_entity::user::UserRole;

use helpers::TestApp;

#[tokio::test]
async fn test_login_scenario() {
    let app = TestApp::new();
    app.create_user("alice@example.com", "correct", UserRole::User)
        .await;

    let tokens = app
        .sessions
        .login("alice@example.com", "correct")
        .await
        .unwrap();
    assert_eq!(tokens.token_type, "bearer");
    assert_ne!(tokens.access_token, tokens.refresh_token);

    assert!(matches!(
        app.sessions.login("alice@example.com", "wrong").await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_multiple_sessions_coexist() {
    let app = TestApp::new();
    app.create_user("alice@example.com", "correct", UserRole::User)
        .await;

    let first = app.sessions.login("alice@example.com", "correct").await.unwrap();
    let second = app.sessions.login("alice@example.com", "correct").await.unwrap();

    assert!(app.sessions.authenticate(&first.access_token).await.is_ok());
    assert!(app.sessions.authenticate(&second.access_token).await.is_ok());
    assert_eq!(app.tokens.len().await, 4);
}

#[tokio::test]
async fn test_refresh_rotation_is_single_use() {
    let app = TestApp::new();
    app.create_user("alice@example.com", "correct", UserRole::User)
        .await;
    let initial = app
        .sessions
        .login("alice@example.com", "correct")
        .await
        .unwrap();

    let rotated = app.sessions.refresh(&initial.refresh_token).await.unwrap();
    assert!(app.sessions.authenticate(&rotated.access_token).await.is_ok());

    assert!(matches!(
        app.sessions.refresh(&initial.refresh_token).await,
        Err(AuthError::InvalidRefreshToken)
    ));

    let again = app.sessions.refresh(&rotated.refresh_token).await.unwrap();
    assert_ne!(again.refresh_token, rotated.refresh_token);
}

#[tokio::test]
async fn test_concurrent_refresh_has_one_winner() {
    let app = TestApp::new();
    app.create_user("alice@example.com", "correct", UserRole::User)
        .await;
    let initial = app
        .sessions
        .login("alice@example.com", "correct")
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let sessions = Arc::clone(&app.sessions);
            let token = initial.refresh_token.clone();
            tokio::spawn(async move { sessions.refresh(&token).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AuthError::InvalidRefreshToken) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn test_access_token_cannot_refresh() {
    let app = TestApp::new();
    app.create_user("alice@example.com", "correct", UserRole::User)
        .await;
    let tokens = app
        .sessions
        .login("alice@example.com", "correct")
        .await
        .unwrap();

    assert!(matches!(
        app.sessions.refresh(&tokens.access_token).await,
        Err(AuthError::InvalidScope)
    ));
}

#[tokio::test]
async fn test_logout_revokes_every_token() {
    let app = TestApp::new();
    let alice = app
        .create_user("alice@example.com", "correct", UserRole::User)
        .await;
    let bob = app
        .create_user("bob@example.com", "hunter2", UserRole::User)
        .await;

    let a1 = app.sessions.login("alice@example.com", "correct").await.unwrap();
    let a2 = app.sessions.login("alice@example.com", "correct").await.unwrap();
    let b1 = app.sessions.login("bob@example.com", "hunter2").await.unwrap();

    app.sessions.logout(alice.id).await.unwrap();

    for tokens in [&a1, &a2] {
        assert!(matches!(
            app.sessions.authenticate(&tokens.access_token).await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            app.sessions.refresh(&tokens.refresh_token).await,
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    let identity = app.sessions.authenticate(&b1.access_token).await.unwrap();
    assert_eq!(identity.user_id, bob.id);
}

#[tokio::test]
async fn test_banned_user_is_locked_out() {
    let app = TestApp::new();
    let alice = app
        .create_user("alice@example.com", "correct", UserRole::User)
        .await;
    let tokens = app
        .sessions
        .login("alice@example.com", "correct")
        .await
        .unwrap();

    app.sessions.ban(alice.id).await.unwrap();

    assert!(app.sessions.authenticate(&tokens.access_token).await.is_err());
    assert!(app.sessions.refresh(&tokens.refresh_token).await.is_err());
    assert!(matches!(
        app.sessions.login("alice@example.com", "correct").await,
        Err(AuthError::UserBanned)
    ));
}

#[tokio::test]
async fn test_access_policy_after_authentication() {
    let app = TestApp::new();
    app.create_user("mod@example.com", "pw-mod", UserRole::Moderator)
        .await;
    let tokens = app.sessions.login("mod@example.com", "pw-mod").await.unwrap();

    let identity = app.sessions.authenticate(&tokens.access_token).await.unwrap();

    assert!(AccessPolicy::STAFF.authorize(&identity).is_ok());
    assert!(AccessPolicy::AUTHENTICATED.authorize(&identity).is_ok());
    assert!(matches!(
        AccessPolicy::ADMIN.authorize(&identity),
        Err(AuthError::Forbidden)
    ));
}

#[tokio::test]
async fn test_token_of_deleted_subject_is_invalid() {
    let app = TestApp::new();
    let token = app
        .codec
        .mint("ghost@example.com", TokenScope::AccessToken, Duration::hours(1))
        .unwrap();

    assert!(matches!(
        app.sessions.authenticate(&token).await,
        Err(AuthError::InvalidToken)
    ));
}

#[tokio::test]
async fn test_sweep_removes_exactly_expired_rows() {
    let app = TestApp::new();
    let owner = Uuid::new_v4();
    app.store
        .add("expired", owner, Utc::now() - Duration::minutes(1))
        .await
        .unwrap();
    app.store
        .add("live", owner, Utc::now() + Duration::minutes(1))
        .await
        .unwrap();

    assert_eq!(app.store.sweep_expired().await.unwrap(), 1);
    assert!(app.store.get("live").await.unwrap().is_some());
}

#[tokio::test]
async fn test_login_sweep_fires_in_background() {
    let app = TestApp::with_sweep_probability(1.0);
    let alice = app
        .create_user("alice@example.com", "correct", UserRole::User)
        .await;
    app.store
        .add("stale", alice.id, Utc::now() - Duration::days(1))
        .await
        .unwrap();

    app.sessions.login("alice@example.com", "correct").await.unwrap();

    for _ in 0..100 {
        if app.store.get("stale").await.unwrap().is_none() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(app.store.get("stale").await.unwrap().is_none());
    assert_eq!(app.tokens.len().await, 2);
}
