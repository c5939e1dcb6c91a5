//! Full proxy lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, binds a real `UreqTransport`
//! to it, and drives every proxy operation over actual HTTP: listing,
//! validated creation (422 bridging into the shared validator), fetch,
//! update, the multipart method-override path, query parameters, and
//! deletion.

use std::sync::Arc;

use proxy_core::{FileAttachment, Payload, Proxy, ProxyError, SharedValidator, UreqTransport};
use serde_json::json;

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn proxy_lifecycle() {
    let base_url = start_server();
    let transport: Arc<UreqTransport> = Arc::new(UreqTransport::new(&base_url));
    let validator = SharedValidator::new();
    let mut proxy = Proxy::new("users")
        .with_transport(transport)
        .with_validator(validator.clone());

    // Step 1: list — empty collection.
    let body = proxy.all().unwrap();
    assert_eq!(body, json!([]));
    assert!(validator.successful());
    assert!(!validator.processing());

    // Step 2: invalid create — 422 bridged into the shared validator.
    let err = proxy
        .store(Payload::from_json(json!({"name": "Jane", "email": "nope"})))
        .unwrap_err();
    match &err {
        ProxyError::Validation { status, errors } => {
            assert_eq!(*status, 422);
            assert_eq!(
                errors["email"],
                vec!["The email must be a valid email address."]
            );
        }
        other => panic!("expected Validation error, got {other:?}"),
    }
    assert_eq!(
        validator.first("email"),
        Some("The email must be a valid email address.".to_string())
    );
    assert!(!validator.successful());
    assert!(!validator.processing());

    // Step 3: valid create — the validator resets on the next submission.
    let created = proxy
        .store(Payload::from_json(
            json!({"name": "Jane", "email": "jane@example.com"}),
        ))
        .unwrap();
    assert_eq!(created["name"], "Jane");
    assert!(!validator.any());
    assert!(validator.successful());
    let id = created["id"].as_str().unwrap().to_string();

    // Step 4: find.
    let fetched = proxy.find(&id).unwrap();
    assert_eq!(fetched["email"], "jane@example.com");

    // Step 5: put.
    let updated = proxy
        .put(&id, Payload::from_json(json!({"name": "Janet"})))
        .unwrap();
    assert_eq!(updated["name"], "Janet");

    // Step 6: patch.
    let patched = proxy
        .patch(
            &id,
            Payload::from_json(json!({"email": "janet@example.com"})),
        )
        .unwrap();
    assert_eq!(patched["email"], "janet@example.com");

    // Step 7: put_with_file — multipart POST with the method override.
    let mut payload = Payload::new();
    payload.set("name", "Janey").set(
        "avatar",
        FileAttachment::new("avatar.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47]),
    );
    let overridden = proxy.put_with_file(&id, payload).unwrap();
    assert_eq!(overridden["name"], "Janey");
    assert_eq!(overridden["avatar"], "avatar.png");

    // Step 8: another user, then a sorted list via query parameters.
    proxy
        .store(Payload::from_json(
            json!({"name": "Amy", "email": "amy@example.com"}),
        ))
        .unwrap();
    proxy.set_parameter("sort", "name");
    let listed = proxy.all().unwrap();
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|user| user["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Amy", "Janey"]);
    proxy.remove_parameters(&[]);

    // Step 9: delete, then find — a non-422 failure leaves the error map
    // untouched.
    proxy.delete(&id).unwrap();
    let err = proxy.find(&id).unwrap_err();
    match err {
        ProxyError::Transport(failure) => {
            assert_eq!(failure.response.unwrap().status, 404);
        }
        other => panic!("expected Transport error, got {other:?}"),
    }
    assert!(!validator.any());
    assert!(!validator.processing());
}

#[test]
fn update_validation_bridges_through_put() {
    let base_url = start_server();
    let proxy = Proxy::new("users").with_transport(Arc::new(UreqTransport::new(&base_url)));

    let created = proxy
        .store(Payload::from_json(
            json!({"name": "Jane", "email": "jane@example.com"}),
        ))
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let err = proxy
        .put(&id, Payload::from_json(json!({"email": ""})))
        .unwrap_err();
    assert!(matches!(err, ProxyError::Validation { .. }));
    assert!(proxy.validator().has("email"));
}
