use dds_core::db::open_db_in_memory;
use dds_core::db::schema::schema_status;
use dds_core::{
    ConstraintKind, HashKey, HubRepository, LetterHub, PostLink, PostService, PublishRequest,
    RepoError, SatelliteRepository, ServiceError, SqliteHubRepository,
    SqliteSatelliteRepository, UserHub,
};
use rusqlite::Connection;

#[test]
fn publish_writes_hubs_content_and_link() {
    let mut conn = open_db_in_memory().unwrap();

    let published = PostService::new(&mut conn)
        .publish(&request(1, 'a', 10, 'b', "Hello"))
        .unwrap();

    assert_eq!(published.link, PostLink::new(key('a'), key('b')));
    assert!(published.user_hub_created);
    assert!(published.letter_hub_created);
    assert_eq!(row_counts(&conn), vec![1, 1, 1, 1]);

    let content = SqliteSatelliteRepository::try_new(&conn)
        .unwrap()
        .get_letter_content(&key('b'))
        .unwrap()
        .unwrap();
    assert_eq!(content.letter_title, "Hello");
}

#[test]
fn publish_reuses_existing_user_hub() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = PostService::new(&mut conn);

    service.publish(&request(1, 'a', 10, 'b', "first")).unwrap();
    let second = service.publish(&request(1, 'a', 11, 'c', "second")).unwrap();

    assert!(!second.user_hub_created);
    assert!(second.letter_hub_created);
    assert_eq!(row_counts(&conn), vec![1, 2, 2, 2]);
}

#[test]
fn publish_rejects_hub_key_bound_to_other_id_and_writes_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    SqliteHubRepository::try_new(&conn)
        .unwrap()
        .create_user(&UserHub::new(99, key('a')))
        .unwrap();

    let err = PostService::new(&mut conn)
        .publish(&request(1, 'a', 10, 'b', "Hello"))
        .unwrap_err();

    match err {
        ServiceError::HubConflict {
            table,
            existing_id,
            requested_id,
            ..
        } => {
            assert_eq!(table, "h_users");
            assert_eq!(existing_id, 99);
            assert_eq!(requested_id, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(row_counts(&conn), vec![1, 0, 0, 0]);
}

#[test]
fn publish_rejects_letter_key_bound_to_other_id_and_writes_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    SqliteHubRepository::try_new(&conn)
        .unwrap()
        .create_letter(&LetterHub::new(9, key('b')))
        .unwrap();

    let err = PostService::new(&mut conn)
        .publish(&request(1, 'a', 10, 'b', "Hello"))
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::HubConflict {
            table: "h_letters",
            existing_id: 9,
            requested_id: 10,
            ..
        }
    ));
    assert_eq!(row_counts(&conn), vec![0, 1, 0, 0]);
    let hubs = SqliteHubRepository::try_new(&conn).unwrap();
    assert!(hubs.get_user(&key('a')).unwrap().is_none());
}

#[test]
fn publishing_same_letter_twice_rolls_back_second_attempt() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = PostService::new(&mut conn);
    service.publish(&request(1, 'a', 10, 'b', "Hello")).unwrap();

    // Another user re-publishing the same letter collides on its content row.
    let err = service
        .publish(&request(2, 'd', 10, 'b', "Hello again"))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repo(RepoError::Constraint {
            kind: ConstraintKind::PrimaryKey,
            ..
        })
    ));

    assert_eq!(row_counts(&conn), vec![1, 1, 1, 1]);
    let hubs = SqliteHubRepository::try_new(&conn).unwrap();
    assert!(hubs.get_user(&key('d')).unwrap().is_none());
}

fn request(user_id: i32, user: char, letter_id: i32, letter: char, title: &str) -> PublishRequest {
    PublishRequest {
        user: UserHub::new(user_id, key(user)),
        letter: LetterHub::new(letter_id, key(letter)),
        letter_title: title.to_string(),
        letter_body: format!("{title} body"),
    }
}

fn row_counts(conn: &Connection) -> Vec<i64> {
    schema_status(conn)
        .unwrap()
        .tables
        .into_iter()
        .map(|table| table.rows)
        .collect()
}

fn key(ch: char) -> HashKey {
    HashKey::parse(ch.to_string().repeat(32)).unwrap()
}
