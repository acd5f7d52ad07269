use person_core::db::open_db_in_memory;
use person_core::{
    Address, Person, PersonInput, PersonService, PersonStore, RemoteContact, RemoteSource,
    RepoError, ServiceError, SqliteMetadataRepository, SqlitePersonRepository, SyncResult,
    PERSON_METADATA_MODEL_ID,
};
use rusqlite::Connection;
use uuid::Uuid;

struct OfflineRemote;

impl RemoteSource for OfflineRemote {
    fn fetch_all(&self) -> SyncResult<Option<Vec<RemoteContact>>> {
        Ok(None)
    }
}

type Service<'conn> =
    PersonService<SqlitePersonRepository<'conn>, SqliteMetadataRepository<'conn>, OfflineRemote>;

fn service(conn: &Connection) -> Service<'_> {
    SqliteMetadataRepository::new(conn)
        .ensure_metadata(PERSON_METADATA_MODEL_ID)
        .unwrap();
    PersonService::new(
        SqlitePersonRepository::new(conn),
        SqliteMetadataRepository::new(conn),
        OfflineRemote,
        PERSON_METADATA_MODEL_ID,
    )
    .unwrap()
}

fn input(model_id: &str, first_name: &str) -> PersonInput {
    PersonInput {
        model_id: Some(model_id.to_string()),
        first_name: Some(first_name.to_string()),
        ..PersonInput::default()
    }
}

#[test]
fn create_assigns_identity_and_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service.create(Some(input("003A", "Ada"))).unwrap();
    assert_eq!(created.model_id, "003A");
    assert!(created.last_modified > 0);

    let loaded = service
        .get_by_id(&created.id.to_string())
        .unwrap()
        .unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn create_without_model_id_uses_new_id_as_correlation_key() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service.create(Some(PersonInput::default())).unwrap();
    assert_eq!(created.model_id, created.id.to_string());
}

#[test]
fn create_rejects_absent_payload() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.create(None).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
    assert!(service.get_all().unwrap().is_empty());
}

#[test]
fn malformed_ids_are_invalid_arguments() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    assert!(matches!(
        service.get_by_id("not-an-id").unwrap_err(),
        ServiceError::InvalidArgument(_)
    ));
    assert!(matches!(
        service
            .update_by_id("12345", Some(PersonInput::default()))
            .unwrap_err(),
        ServiceError::InvalidArgument(_)
    ));
    assert!(matches!(
        service.delete_by_id("").unwrap_err(),
        ServiceError::InvalidArgument(_)
    ));
}

#[test]
fn get_by_id_returns_none_for_unknown_id() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let missing = service.get_by_id(&Uuid::new_v4().to_string()).unwrap();
    assert!(missing.is_none());
}

#[test]
fn update_unknown_id_returns_false() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let updated = service
        .update_by_id(&Uuid::new_v4().to_string(), Some(input("003A", "Ada")))
        .unwrap();
    assert!(!updated);
}

#[test]
fn update_replaces_fields_and_keeps_model_id() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service.create(Some(input("003A", "Ada"))).unwrap();

    let mut change = input("SOMETHING-ELSE", "Augusta");
    change.address = Some(Address {
        city: Some("London".to_string()),
        ..Address::default()
    });
    let updated = service
        .update_by_id(&created.id.to_string(), Some(change))
        .unwrap();
    assert!(updated);

    let loaded = service
        .get_by_id(&created.id.to_string())
        .unwrap()
        .unwrap();
    assert_eq!(loaded.model_id, "003A");
    assert_eq!(loaded.first_name.as_deref(), Some("Augusta"));
    assert_eq!(
        loaded.address.and_then(|address| address.city),
        Some("London".to_string())
    );
    assert!(loaded.last_modified >= created.last_modified);
}

#[test]
fn update_rejects_absent_payload() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service.create(Some(input("003A", "Ada"))).unwrap();

    let err = service
        .update_by_id(&created.id.to_string(), None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
}

#[test]
fn delete_reports_whether_one_document_was_removed() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service.create(Some(input("003A", "Ada"))).unwrap();
    let id = created.id.to_string();

    assert!(service.delete_by_id(&id).unwrap());
    assert!(!service.delete_by_id(&id).unwrap());
    assert!(service.get_by_id(&id).unwrap().is_none());
}

#[test]
fn get_all_returns_every_person() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service.create(Some(input("003A", "Ada"))).unwrap();
    service.create(Some(input("003B", "Grace"))).unwrap();

    let mut model_ids: Vec<_> = service
        .get_all()
        .unwrap()
        .into_iter()
        .map(|person| person.model_id)
        .collect();
    model_ids.sort();
    assert_eq!(model_ids, vec!["003A".to_string(), "003B".to_string()]);
}

#[test]
fn repository_rejects_invalid_person_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::new(&conn);

    let mut person = Person::from_input(input("003A", "Ada"), 1);
    person.model_id = "   ".to_string();
    let err = repo.insert_one(&person).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn repository_delete_by_model_id_removes_all_matches() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::new(&conn);
    repo.insert_one(&Person::from_input(input("003A", "one"), 1))
        .unwrap();
    repo.insert_one(&Person::from_input(input("003A", "two"), 1))
        .unwrap();
    repo.insert_one(&Person::from_input(input("003B", "three"), 1))
        .unwrap();

    let outcome = repo.delete_by_model_id("003A").unwrap();
    assert!(outcome.acknowledged);
    assert_eq!(outcome.count, 2);
    assert_eq!(repo.find_all().unwrap().len(), 1);
}

#[test]
fn repository_reports_corrupt_rows_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO persons (id, model_id, last_modified) VALUES ('not-a-uuid', '003A', 1);",
        [],
    )
    .unwrap();

    let err = SqlitePersonRepository::new(&conn).find_all().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("not-a-uuid")));
}

#[test]
fn repository_rejects_model_id_with_surrounding_whitespace() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::new(&conn);

    let mut person = Person::from_input(input("003A", "Ada"), 1);
    person.model_id = "003A ".to_string();
    let err = repo.insert_one(&person).unwrap_err();

    assert!(matches!(err, RepoError::Validation(_)));
    assert!(repo.find_all().unwrap().is_empty());
}
