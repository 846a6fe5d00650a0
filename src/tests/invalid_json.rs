use axum::http::StatusCode;

use crate::tests::helper;

#[tokio::test]
async fn test_invalid_json() {
    let (mut app, _storage) = helper::setup_test_app().await;

    // missing data
    let body = r"{}";
    let (status_code, _, error) =
        helper::maybe_create_alias_with_raw_body(&mut app, helper::ADMIN_TOKEN, body, true).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert!(error.is_some());
    let error = error.unwrap();
    assert_eq!("Data error".to_string(), error.error);
    assert!(error.description.unwrap().contains("domainAlias"));

    // wrong type
    let body = r#"{"domainAlias":"example.org","blogId":"one"}"#;
    let (status_code, _, error) =
        helper::maybe_create_alias_with_raw_body(&mut app, helper::ADMIN_TOKEN, body, true).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert!(error.is_some());
    assert_eq!("Data error".to_string(), error.unwrap().error);

    // syntax error
    let body = r#"{"}"#;
    let (status_code, _, error) =
        helper::maybe_create_alias_with_raw_body(&mut app, helper::ADMIN_TOKEN, body, true).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert!(error.is_some());
    let error = error.unwrap();
    assert_eq!("JSON syntax error".to_string(), error.error);
    assert!(
        error
            .description
            .unwrap()
            .contains("EOF while parsing a string at line 1 column 3")
    );

    // missing content type
    let body = r"{}";
    let (status_code, _, error) =
        helper::maybe_create_alias_with_raw_body(&mut app, helper::ADMIN_TOKEN, body, false).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert!(error.is_some());
    let error = error.unwrap();
    assert_eq!(
        "Missing `application/json` content type".to_string(),
        error.error
    );
}
