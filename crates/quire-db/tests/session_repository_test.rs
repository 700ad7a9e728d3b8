//! Session repository integration tests.

use chrono::Duration;

use quire_db::test_fixtures::{test_database, TestData};
use quire_db::SessionRepository;

async fn session_rows(db: &quire_db::Database, user_id: uuid::Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM user_session WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&db.pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_purge_expired_removes_only_expired_rows() {
    let db = test_database().await;
    let data = TestData::new(&db).await;

    let expired = db.sessions.create(data.user.id, Duration::seconds(-60)).await.unwrap();
    let live = db.sessions.create(data.user.id, Duration::hours(1)).await.unwrap();
    assert_eq!(session_rows(&db, data.user.id).await, 2);

    let purged = db.sessions.purge_expired().await.unwrap();
    assert!(purged >= 1);

    assert_eq!(session_rows(&db, data.user.id).await, 1);
    assert!(db.sessions.resolve(&expired).await.unwrap().is_none());
    assert_eq!(db.sessions.resolve(&live).await.unwrap().unwrap().id, data.user.id);
}
