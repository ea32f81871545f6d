//! Integration tests for the in-memory user repository.

use std::io::Write;

use tokengate_core::error::GateError;
use tokengate_core::models::exter::ExterToken;
use tokengate_core::models::user::CreateUser;
use tokengate_core::repository::UserRepository;
use tokengate_store::{MemoryUserRepository, StoreError, load_seed_file, parse_seed};

fn alice() -> CreateUser {
    CreateUser {
        id: "u-alice".into(),
        username: "alice".into(),
        display_name: "Alice".into(),
        password_hash: "0123abcd".into(),
    }
}

fn exter_token(user_id: &str, user_name: &str) -> ExterToken {
    ExterToken {
        id: "t-1".into(),
        token_type: "login".into(),
        app_id: "demo-app".into(),
        user_id: user_id.into(),
        user_name: user_name.into(),
        expires_at: 4_102_444_800,
    }
}

#[tokio::test]
async fn create_and_get_by_username() {
    let repo = MemoryUserRepository::new();
    let user = repo.create(alice()).await.unwrap();

    assert_eq!(user.id, "u-alice");
    assert_eq!(user.display_name, "Alice");

    let fetched = repo.get_by_username("alice").await.unwrap().unwrap();
    assert_eq!(fetched, user);
    assert_eq!(repo.get_by_id("u-alice").await.unwrap(), user);
}

#[tokio::test]
async fn unknown_username_is_none() {
    let repo = MemoryUserRepository::with_users([alice()]).await.unwrap();
    assert!(repo.get_by_username("bob").await.unwrap().is_none());
    // Lookups are exact.
    assert!(repo.get_by_username("Alice").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let repo = MemoryUserRepository::with_users([alice()]).await.unwrap();
    let err = repo
        .create(CreateUser {
            id: "u-other".into(),
            ..alice()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Duplicate { ref field, .. } if field == "username"));
    assert!(matches!(
        GateError::from(err),
        GateError::AlreadyExists { .. }
    ));
}

#[tokio::test]
async fn duplicate_id_is_rejected() {
    let repo = MemoryUserRepository::with_users([alice()]).await.unwrap();
    let err = repo
        .create(CreateUser {
            username: "alice2".into(),
            ..alice()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { ref field, .. } if field == "id"));
}

#[tokio::test]
async fn exter_login_creates_user_once() {
    let repo = MemoryUserRepository::new();
    let token = exter_token("ext-42", "Bob Builder");

    let first = repo.create_from_exter_token(&token).await.unwrap().unwrap();
    assert_eq!(first.id, "ext-42");
    assert_eq!(first.display_name, "Bob Builder");
    assert!(first.password_hash.is_empty());

    let second = repo.create_from_exter_token(&token).await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn exter_user_without_name_uses_id() {
    let repo = MemoryUserRepository::new();
    let user = repo
        .create_from_exter_token(&exter_token("ext-7", " "))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.display_name, "ext-7");
}

#[tokio::test]
async fn exter_token_without_user_id_yields_none() {
    let repo = MemoryUserRepository::new();
    let user = repo
        .create_from_exter_token(&exter_token("", "Nobody"))
        .await
        .unwrap();
    assert!(user.is_none());
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn concurrent_first_logins_create_one_account() {
    let repo = MemoryUserRepository::new();
    let token = exter_token("ext-race", "Racer");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = repo.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            repo.create_from_exter_token(&token).await.unwrap().unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().id, "ext-race");
    }
    assert_eq!(repo.len().await, 1);
}

#[test]
fn parse_seed_reads_array() {
    let users = parse_seed(
        r#"[{"id":"u-1","username":"alice","display_name":"Alice","password_hash":"abc"},
            {"id":"u-2","username":"bob","display_name":"Bob"}]"#,
    )
    .unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].password_hash, "");
}

#[test]
fn parse_seed_rejects_garbage() {
    assert!(matches!(parse_seed("{not json"), Err(StoreError::Parse(_))));
}

#[tokio::test]
async fn load_seed_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{{"id":"u-1","username":"alice","display_name":"Alice","password_hash":"abc"}}]"#
    )
    .unwrap();

    let users = load_seed_file(file.path()).await.unwrap();
    let repo = MemoryUserRepository::with_users(users).await.unwrap();
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn missing_seed_file_is_io_error() {
    let err = load_seed_file("/definitely/not/here.json").await.unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
}
