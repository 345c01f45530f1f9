//! Full user lifecycle through `UserClient` against the real router.
//!
//! The app runs on a random port with the in-memory repository, so every
//! request goes over real HTTP and through the same envelope handling a
//! browser client would see.

use userhub::app::build_app;
use userhub::client::{ClientError, UserClient};
use userhub::state::AppState;
use userhub::users::dto::{CreateUserRequest, UpdateUserRequest};
use userhub::users::repo_types::UserStatus;

async fn spawn_app() -> UserClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_app(AppState::fake()))
            .await
            .unwrap();
    });
    UserClient::new(format!("http://{addr}/api"))
}

fn ana() -> CreateUserRequest {
    CreateUserRequest::new("Ana", "Gomez", "ana@x.com", "+57 300 1234567")
}

#[tokio::test]
async fn crud_lifecycle() {
    let client = spawn_app().await;

    // Empty to start.
    let listed = client.list_users().await.unwrap();
    assert!(listed.success);
    assert!(listed.data.unwrap().is_empty());

    let created = client.create_user(&ana()).await.unwrap().data.unwrap();
    assert_eq!(created.full_name, "Ana Gomez");
    assert_eq!(created.status, UserStatus::Active);
    let id = created.id;

    let fetched = client.get_user(id).await.unwrap().data.unwrap();
    assert_eq!(fetched.email, "ana@x.com");
    assert_eq!(fetched.phone, "+57 300 1234567");

    let update = UpdateUserRequest::default().last_name("Gómez Ruiz");
    let updated = client.update_user(id, &update).await.unwrap().data.unwrap();
    assert_eq!(updated.full_name, "Ana Gómez Ruiz");
    assert_eq!(updated.email, "ana@x.com");

    let listed = client.list_users().await.unwrap().data.unwrap();
    assert_eq!(listed.len(), 1);

    let deleted = client.delete_user(id).await.unwrap();
    assert!(deleted.success);
    assert!(deleted.data.is_none());

    // Soft deleted: gone from the list, still readable.
    assert!(client.list_users().await.unwrap().data.unwrap().is_empty());
    let fetched = client.get_user(id).await.unwrap().data.unwrap();
    assert_eq!(fetched.status, UserStatus::Inactive);

    // Its email is free again.
    let again = client.create_user(&ana()).await.unwrap().data.unwrap();
    assert_ne!(again.id, id);
}

#[tokio::test]
async fn rejections_are_classified() {
    let client = spawn_app().await;
    client.create_user(&ana()).await.unwrap();

    let err = client.create_user(&ana()).await.unwrap_err();
    match &err {
        ClientError::Validation(v) => {
            assert_eq!(v.messages(), vec!["This email is already registered."]);
            assert!(v.help.is_some());
            assert!(v.full_message().contains("This email is already registered."));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = client.get_user(999).await.unwrap_err();
    assert!(
        matches!(&err, ClientError::Http { status: 404, message } if message == "User not found."),
        "{err:?}"
    );

    let err = client
        .update_user(
            999,
            &UpdateUserRequest::default().first_name("Eva"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));

    // An explicit null is a rejected value, not an omitted field.
    let id = client.list_users().await.unwrap().data.unwrap()[0].id;
    let clear_phone = UpdateUserRequest {
        phone: Some(None),
        ..UpdateUserRequest::default()
    };
    match client.update_user(id, &clear_phone).await.unwrap_err() {
        ClientError::Validation(v) => assert_eq!(v.messages(), vec!["The phone is required."]),
        other => panic!("expected validation error, got {other:?}"),
    }
}
