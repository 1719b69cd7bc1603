use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Bootstrap, Engine, EngineError, Role};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn stored_hash(db: &DatabaseConnection, username: &str) -> String {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT password FROM users WHERE username = ?",
            vec![username.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "password").unwrap()
}

#[tokio::test]
async fn authenticate_returns_session_with_role() {
    let (engine, _db) = engine_with_db().await;
    let admin = engine
        .create_user("boss", "s3cret", Role::Admin)
        .await
        .unwrap();
    engine
        .create_user("desk", "desk-pass", Role::Staff)
        .await
        .unwrap();

    let session = engine.authenticate("boss", "s3cret").await.unwrap();
    assert_eq!(session.user_id, admin.id);
    assert_eq!(session.username, "boss");
    assert_eq!(session.role, Role::Admin);
    assert!(!session.must_change_password);

    let session = engine.authenticate("desk", "desk-pass").await.unwrap();
    assert_eq!(session.role, Role::Staff);
    assert!(!session.is_admin());
}

#[tokio::test]
async fn authenticate_failures_are_indistinguishable() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_user("desk", "desk-pass", Role::Staff)
        .await
        .unwrap();

    assert_eq!(
        engine.authenticate("desk", "wrong").await,
        Err(EngineError::InvalidCredentials)
    );
    assert_eq!(
        engine.authenticate("nobody", "desk-pass").await,
        Err(EngineError::InvalidCredentials)
    );
    assert_eq!(
        engine.authenticate("DESK", "desk-pass").await,
        Err(EngineError::InvalidCredentials)
    );
}

#[tokio::test]
async fn passwords_are_stored_hashed() {
    let (engine, db) = engine_with_db().await;
    engine
        .create_user("desk", "desk-pass", Role::Staff)
        .await
        .unwrap();

    let hash = stored_hash(&db, "desk").await;
    assert_ne!(hash, "desk-pass");
    assert!(engine::verify_password("desk-pass", &hash).unwrap());
}

#[tokio::test]
async fn duplicate_username_keeps_existing_hash() {
    let (engine, db) = engine_with_db().await;
    engine
        .create_user("desk", "first", Role::Staff)
        .await
        .unwrap();
    let before = stored_hash(&db, "desk").await;

    assert_eq!(
        engine.create_user("desk", "second", Role::Admin).await,
        Err(EngineError::ExistingKey("desk".to_string()))
    );

    assert_eq!(stored_hash(&db, "desk").await, before);
    assert_eq!(engine.users().await.unwrap().len(), 1);
    assert_eq!(
        engine.authenticate("desk", "first").await.unwrap().role,
        Role::Staff
    );
}

#[tokio::test]
async fn empty_credentials_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    assert!(matches!(
        engine.create_user("  ", "pass", Role::Staff).await,
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.create_user("desk", "", Role::Staff).await,
        Err(EngineError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn update_without_password_keeps_hash() {
    let (engine, db) = engine_with_db().await;
    let user = engine
        .create_user("desk", "desk-pass", Role::Staff)
        .await
        .unwrap();
    let before = stored_hash(&db, "desk").await;

    let updated = engine
        .update_user(user.id, Role::Admin, Some(""))
        .await
        .unwrap();
    assert_eq!(updated.role, Role::Admin);
    assert_eq!(stored_hash(&db, "desk").await, before);

    engine.update_user(user.id, Role::Admin, None).await.unwrap();
    assert_eq!(stored_hash(&db, "desk").await, before);
}

#[tokio::test]
async fn update_with_password_rehashes() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .create_user("desk", "old-pass", Role::Staff)
        .await
        .unwrap();

    engine
        .update_user(user.id, Role::Staff, Some("new-pass"))
        .await
        .unwrap();

    assert!(engine.authenticate("desk", "new-pass").await.is_ok());
    assert_eq!(
        engine.authenticate("desk", "old-pass").await,
        Err(EngineError::InvalidCredentials)
    );
}

#[tokio::test]
async fn update_unknown_user_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    assert_eq!(
        engine.update_user(99, Role::Staff, None).await,
        Err(EngineError::KeyNotFound("user 99".to_string()))
    );
}

#[tokio::test]
async fn users_are_listed_newest_first() {
    let (engine, _db) = engine_with_db().await;
    for name in ["first", "second", "third"] {
        engine.create_user(name, "pass", Role::Staff).await.unwrap();
    }

    let listed: Vec<String> = engine
        .users()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(listed, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn bootstrap_admin_only_runs_on_empty_store() {
    let (engine, _db) = engine_with_db().await;

    let Bootstrap::Created(admin) = engine
        .ensure_bootstrap_admin("admin", "initial")
        .await
        .unwrap()
    else {
        panic!("expected the bootstrap admin to be created");
    };
    assert_eq!(admin.role, Role::Admin);
    assert!(admin.must_change_password);

    assert_eq!(
        engine
            .ensure_bootstrap_admin("other", "initial")
            .await
            .unwrap(),
        Bootstrap::Skipped
    );
    assert_eq!(engine.user_count().await.unwrap(), 1);
}

#[tokio::test]
async fn changing_password_clears_rotation_flag() {
    let (engine, _db) = engine_with_db().await;
    engine
        .ensure_bootstrap_admin("admin", "initial")
        .await
        .unwrap();
    let session = engine.authenticate("admin", "initial").await.unwrap();
    assert!(session.must_change_password);

    assert_eq!(
        engine
            .change_password(session.user_id, "wrong", "rotated")
            .await,
        Err(EngineError::InvalidCredentials)
    );
    assert!(matches!(
        engine
            .change_password(session.user_id, "initial", "initial")
            .await,
        Err(EngineError::InvalidInput(_))
    ));

    engine
        .change_password(session.user_id, "initial", "rotated")
        .await
        .unwrap();
    let session = engine.session(session.user_id).await.unwrap().unwrap();
    assert!(!session.must_change_password);
    assert!(engine.authenticate("admin", "rotated").await.is_ok());
}

#[tokio::test]
async fn reset_password_clears_rotation_flag() {
    let (engine, _db) = engine_with_db().await;
    engine
        .ensure_bootstrap_admin("admin", "initial")
        .await
        .unwrap();

    engine.reset_password("admin", "from-cli").await.unwrap();

    let session = engine.authenticate("admin", "from-cli").await.unwrap();
    assert!(!session.must_change_password);
    assert_eq!(
        engine.reset_password("ghost", "x").await,
        Err(EngineError::KeyNotFound("ghost".to_string()))
    );
}

#[tokio::test]
async fn session_reflects_role_changes_and_missing_users() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .create_user("desk", "pass", Role::Staff)
        .await
        .unwrap();

    engine.update_user(user.id, Role::Admin, None).await.unwrap();
    let session = engine.session(user.id).await.unwrap().unwrap();
    assert_eq!(session.role, Role::Admin);

    assert_eq!(engine.session(user.id + 100).await.unwrap(), None);
}
