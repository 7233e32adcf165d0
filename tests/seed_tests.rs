use chrono::Utc;
use devblog::{
    AppConfig, MemoryRepository,
    auth::verify_password,
    models::Category,
    repository::Repository,
    seed::{demo_article, demo_articles, seed_admin, seed_demo_articles},
};

#[test]
fn test_demo_articles_are_ordered_by_index() {
    let now = Utc::now();
    let older = demo_article(1, now, Category::Other);
    let newer = demo_article(2, now, Category::Other);

    assert!(older.published < newer.published);
    assert_eq!(newer.slug, "other-article-2");
    assert_eq!(newer.title, "Other Article 2");
    assert!(!newer.is_edited());

    let all = demo_articles(3, now);
    assert_eq!(all.len(), 6);
    assert_eq!(
        all.iter().filter(|a| a.category == Category::Programming).count(),
        3
    );
}

#[tokio::test]
async fn test_seed_admin_is_idempotent() {
    let repo = MemoryRepository::new();
    let config = AppConfig::default();

    assert!(seed_admin(&repo, &config).await.unwrap());
    assert!(!seed_admin(&repo, &config).await.unwrap());

    let user = repo.get_user(&config.admin_username).await.unwrap();
    assert_eq!(user.email, config.admin_email);
    assert_ne!(user.password_hash, config.admin_password);
    assert!(verify_password(&user.password_hash, &config.admin_password));
}

#[tokio::test]
async fn test_demo_seeding_only_fills_an_empty_store() {
    let repo = MemoryRepository::new();

    assert_eq!(seed_demo_articles(&repo, 0).await.unwrap(), 0);
    assert_eq!(seed_demo_articles(&repo, 12).await.unwrap(), 24);
    assert_eq!(seed_demo_articles(&repo, 12).await.unwrap(), 0);

    let page = repo.get_page(1, Category::Programming).await;
    assert_eq!(page.max_page, 1);
    assert_eq!(page.items[0].slug, "programming-article-12");
}
