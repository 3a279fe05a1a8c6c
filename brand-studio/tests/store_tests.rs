//! JSON file session store against a real directory.

use brand_core::{
    BrandError, Feedback, NameCandidate, NamingStrategy, RefinementSession, SessionStore,
};
use brand_studio::JsonFileSessionStore;
use tempfile::TempDir;

fn session_with_round(brief: &str) -> RefinementSession {
    let mut session = RefinementSession::new(brief, 3, 10);
    session
        .record_round(vec![
            NameCandidate::new("Acme", NamingStrategy::Descriptive)
                .with_rationale("plain and strong")
                .with_tagline("Build anything, anywhere today"),
            NameCandidate::new("Zenith", NamingStrategy::Invented),
        ])
        .unwrap();
    session
}

#[tokio::test]
async fn round_trips_a_session() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileSessionStore::new(dir.path().join("sessions"));

    let mut session = session_with_round("Product: tools");
    session
        .record_feedback(
            Feedback::refine().liked_name("Acme").tone_adjustment("bolder").build().unwrap(),
        )
        .unwrap();
    store.save(&session).await.unwrap();

    let loaded = store.load(session.id()).await.unwrap();
    assert_eq!(loaded, session);
    assert_eq!(loaded.carry_over()[0].tagline, "Build anything, anywhere today");
    assert!(dir.path().join("sessions").join(format!("{}.json", session.id())).exists());
}

#[tokio::test]
async fn missing_session_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileSessionStore::new(dir.path());

    let err = store.load("0b7c6c1e-0000-4000-8000-000000000000").await.unwrap_err();
    assert!(matches!(err, BrandError::SessionNotFound(ref id) if id.starts_with("0b7c6c1e")));
    assert!(matches!(
        store.delete("0b7c6c1e-0000-4000-8000-000000000000").await,
        Err(BrandError::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn save_overwrites_without_leaving_temp_files() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileSessionStore::new(dir.path());
    let mut session = session_with_round("Product: tools");
    store.save(&session).await.unwrap();

    session.approve(vec!["Zenith".to_string()]).unwrap();
    store.save(&session).await.unwrap();

    let loaded = store.load(session.id()).await.unwrap();
    assert!(loaded.is_complete());
    assert_eq!(loaded.approved_names().unwrap(), ["Zenith"]);

    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec![format!("{}.json", session.id())]);
}

#[tokio::test]
async fn lists_most_recent_first_and_skips_junk() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileSessionStore::new(dir.path());
    assert!(store.list().await.unwrap().is_empty());

    let older = session_with_round("Product: first");
    store.save(&older).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newer = session_with_round("Product: second");
    store.save(&newer).await.unwrap();
    std::fs::write(dir.path().join("notes.json"), "not a session").unwrap();
    std::fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, newer.id());
    assert_eq!(listed[1].brief, "Product: first");
    assert_eq!(listed[0].rounds, 1);

    store.delete(older.id()).await.unwrap();
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_directory_lists_empty() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileSessionStore::new(dir.path().join("never-created"));
    assert!(store.list().await.unwrap().is_empty());
}
