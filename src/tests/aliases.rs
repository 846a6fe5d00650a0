use axum::http::StatusCode;

use crate::tests::helper;

#[tokio::test]
async fn test_aliases() {
    let (mut app, _storage) = helper::setup_test_app().await;

    let blog = helper::create_blog(&mut app, "example.com", "https://example.com/").await;
    let other = helper::create_blog(&mut app, "example.net", "https://example.net/").await;

    // verify empty alias list
    let (status_code, aliases) = helper::list_aliases(&mut app, helper::ADMIN_TOKEN).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(Vec::<helper::Alias>::new(), aliases.unwrap());

    // create aliases, domains are normalized
    let alias = helper::create_alias(&mut app, "WWW.Example.org.", blog.id).await;
    assert_eq!("www.example.org", alias.domain_alias);
    assert_eq!(blog.id, alias.blog_id);

    let other_alias = helper::create_alias(&mut app, "example.info", other.id).await;

    // verify alias
    let (status_code, single, _) =
        helper::single_alias(&mut app, helper::ADMIN_TOKEN, &alias.id.to_string()).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(Some(&alias), single.as_ref());

    // all aliases in order of creation
    let (status_code, aliases) = helper::list_aliases(&mut app, helper::ADMIN_TOKEN).await;
    assert_eq!(StatusCode::OK, status_code);
    let aliases = aliases.unwrap();
    assert_eq!(2, aliases.len());
    assert_eq!(alias.id, aliases[0].id);
    assert_eq!(other_alias.id, aliases[1].id);

    // only the aliases of the blog
    let (status_code, aliases) =
        helper::list_blog_aliases(&mut app, helper::ADMIN_TOKEN, blog.id).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(vec![alias], aliases.unwrap());

    let (status_code, _) = helper::list_blog_aliases(&mut app, helper::ADMIN_TOKEN, 1234).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);

    // delete alias
    let (status_code, _) =
        helper::maybe_delete_alias(&mut app, helper::ADMIN_TOKEN, &other_alias.id).await;
    assert_eq!(StatusCode::NO_CONTENT, status_code);

    let (status_code, _, error) =
        helper::single_alias(&mut app, helper::ADMIN_TOKEN, &other_alias.id.to_string()).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(Some("Alias not found".to_string()), error);

    let (status_code, error) =
        helper::maybe_delete_alias(&mut app, helper::ADMIN_TOKEN, &other_alias.id).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(Some("Alias not found".to_string()), error);

    let (status_code, aliases) = helper::list_aliases(&mut app, helper::ADMIN_TOKEN).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(1, aliases.unwrap().len());
}

#[tokio::test]
async fn test_create_alias_validation() {
    let (mut app, _storage) = helper::setup_test_app().await;

    let blog = helper::create_blog(&mut app, "example.com", "https://example.com/").await;
    helper::create_alias(&mut app, "example.org", blog.id).await;

    let (status_code, _, error) =
        helper::maybe_create_alias(&mut app, helper::ADMIN_TOKEN, "Example.ORG", blog.id).await;
    assert_eq!(StatusCode::CONFLICT, status_code);
    assert_eq!(Some("Domain alias already exists".to_string()), error);

    let (status_code, _, error) =
        helper::maybe_create_alias(&mut app, helper::ADMIN_TOKEN, "example.com", blog.id).await;
    assert_eq!(StatusCode::CONFLICT, status_code);
    assert_eq!(Some("Domain is used by a blog".to_string()), error);

    let (status_code, _, error) =
        helper::maybe_create_alias(&mut app, helper::ADMIN_TOKEN, "example.net", 1234).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(Some("Blog not found".to_string()), error);

    let (status_code, _, error) =
        helper::maybe_create_alias(&mut app, helper::ADMIN_TOKEN, "", blog.id).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Invalid domain".to_string()), error);

    let (status_code, _, error) =
        helper::maybe_create_alias(&mut app, helper::ADMIN_TOKEN, "127.0.0.1", blog.id).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Domain can not be an IP address".to_string()), error);

    let (status_code, _, error) =
        helper::maybe_create_alias(&mut app, helper::ADMIN_TOKEN, "example.org/path", blog.id)
            .await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Invalid domain".to_string()), error);
}

#[tokio::test]
async fn test_invalid_alias_id() {
    let (mut app, _storage) = helper::setup_test_app().await;

    let (status_code, _, error) =
        helper::single_alias(&mut app, helper::ADMIN_TOKEN, "not-a-uuid").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Invalid path parameter".to_string()), error);
}
