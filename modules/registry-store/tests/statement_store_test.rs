//! Integration tests for StatementStore and search.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use chrono::NaiveDate;
use registry_common::{
    LinkCheck, LinkCheckPolicy, RegistryError, StatementInput, UrlCheckStatus,
};
use registry_store::{Company, Country, SearchCriteria, Sector, StatementStore, User, MIGRATOR};
use sqlx::PgPool;
use tokio::sync::{Mutex, MutexGuard};

/// Tests share one database; run them one at a time.
static DB_LOCK: Mutex<()> = Mutex::const_new(());

/// Get a migrated, empty test database, or skip if none is available.
async fn test_pool() -> Option<(PgPool, MutexGuard<'static, ()>)> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let guard = DB_LOCK.lock().await;
    let pool = PgPool::connect(&url).await.ok()?;

    MIGRATOR.run(&pool).await.ok()?;

    // Clean slate for each test
    sqlx::query(
        "TRUNCATE snapshots, statements, companies, users, sectors, countries RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await
    .ok()?;

    Some((pool, guard))
}

struct Fixture {
    software: Sector,
    retail: Sector,
    gb: Country,
    fr: Country,
    cucumber: Company,
}

async fn fixture(pool: &PgPool) -> Fixture {
    let software = Sector::create("Software", pool).await.unwrap();
    let retail = Sector::create("Retail", pool).await.unwrap();
    let gb = Country::create("GB", "United Kingdom", pool).await.unwrap();
    let fr = Country::create("FR", "France", pool).await.unwrap();
    let cucumber = Company::create("Cucumber Ltd", Some(gb.id), Some(software.id), pool)
        .await
        .unwrap();
    Fixture {
        software,
        retail,
        gb,
        fr,
        cucumber,
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn statement(company_id: i64, url: &str, seen: &str, published: bool) -> StatementInput {
    StatementInput {
        company_id: Some(company_id),
        date_seen: Some(date(seen)),
        published,
        ..StatementInput::new(url)
    }
}

fn store(pool: &PgPool) -> StatementStore {
    StatementStore::new(pool.clone(), LinkCheckPolicy::default())
}

// =========================================================================
// Saving
// =========================================================================

#[tokio::test]
async fn create_defaults_date_seen_to_today() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let f = fixture(&pool).await;

    let input = StatementInput {
        company_id: Some(f.cucumber.id),
        contributor_email: Some("anon@host.com".into()),
        ..StatementInput::new("http://cucumber.io/")
    };
    let created = store(&pool).create(&input).await.unwrap();

    assert_eq!(created.date_seen, chrono::Utc::now().date_naive());
    assert_eq!(created.url_checked, UrlCheckStatus::Pending);
    assert!(!created.broken_url);
    assert!(!created.published);
}

#[tokio::test]
async fn update_never_changes_date_seen() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let f = fixture(&pool).await;
    let store = store(&pool);

    let created = store
        .create(&statement(f.cucumber.id, "http://cucumber.io/", "2016-05-21", false))
        .await
        .unwrap();

    let mut input = created.to_input();
    input.date_seen = Some(date("2020-01-01"));
    input.published = true;
    let updated = store.update(created.id, &input).await.unwrap();

    assert_eq!(updated.date_seen, date("2016-05-21"));
    assert!(updated.published);
}

#[tokio::test]
async fn verified_statement_without_fields_is_rejected() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let f = fixture(&pool).await;
    let admin = User::create("Super", "Admin", "admin@somewhere.com", true, &pool)
        .await
        .unwrap();

    let input = StatementInput {
        company_id: Some(f.cucumber.id),
        verified_by_id: Some(admin.id),
        contributor_email: Some("somebody@host.com".into()),
        ..StatementInput::new("http://cucumber.io/")
    };

    let err = store(&pool).create(&input).await.unwrap_err();
    let RegistryError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(
        errors.fields().collect::<Vec<_>>(),
        vec!["approved_by_board", "link_on_front_page", "signed_by_director"]
    );

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM statements")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn update_of_missing_statement_is_not_found() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };

    let err = store(&pool)
        .update(999, &StatementInput::new("http://cucumber.io/"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { entity: "statement", id: 999 }));
}

#[tokio::test]
async fn disabled_checks_mark_statements_skipped() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let f = fixture(&pool).await;
    let store = StatementStore::new(pool.clone(), LinkCheckPolicy::disabled());

    let created = store
        .create(&statement(f.cucumber.id, "http://cucumber.io/", "2017-03-22", true))
        .await
        .unwrap();

    assert_eq!(created.url_checked, UrlCheckStatus::Skipped);
    assert!(store.pending_link_checks(0, 10).await.unwrap().is_empty());
}

// =========================================================================
// Link check write-back
// =========================================================================

#[tokio::test]
async fn link_check_result_is_written_back() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let f = fixture(&pool).await;
    let store = store(&pool);

    let created = store
        .create(&statement(f.cucumber.id, "http://cucumber.io/", "2017-03-22", true))
        .await
        .unwrap();
    assert_eq!(store.pending_link_checks(0, 10).await.unwrap(), vec![created.id]);

    let applied = store
        .record_link_check(
            created.id,
            "http://cucumber.io/",
            &LinkCheck::reachable("https://cucumber.io/"),
        )
        .await
        .unwrap();
    assert!(applied);

    let reloaded = store.find_by_id(created.id).await.unwrap();
    assert_eq!(reloaded.url, "https://cucumber.io/");
    assert!(!reloaded.broken_url);
    assert_eq!(reloaded.url_checked, UrlCheckStatus::Checked);
    assert!(store.pending_link_checks(0, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn stale_link_check_does_not_overwrite_newer_url() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let f = fixture(&pool).await;
    let store = store(&pool);

    let created = store
        .create(&statement(f.cucumber.id, "http://old.example/", "2017-03-22", true))
        .await
        .unwrap();

    let mut input = created.to_input();
    input.url = "http://new.example/".into();
    store.update(created.id, &input).await.unwrap();

    let applied = store
        .record_link_check(created.id, "http://old.example/", &LinkCheck::broken("http://old.example/"))
        .await
        .unwrap();
    assert!(!applied);

    let reloaded = store.find_by_id(created.id).await.unwrap();
    assert_eq!(reloaded.url, "http://new.example/");
    assert!(!reloaded.broken_url);
    assert_eq!(reloaded.url_checked, UrlCheckStatus::Pending);
}

// =========================================================================
// Search
// =========================================================================

#[tokio::test]
async fn visitors_see_newest_published_statement_per_company() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let f = fixture(&pool).await;
    let store = store(&pool);

    store
        .create(&statement(f.cucumber.id, "https://cucumber.io/2016", "2016-05-21", true))
        .await
        .unwrap();
    store
        .create(&statement(f.cucumber.id, "https://cucumber.io/2017", "2017-03-22", true))
        .await
        .unwrap();
    store
        .create(&statement(f.cucumber.id, "https://cucumber.io/draft", "2018-01-01", false))
        .await
        .unwrap();

    let results = store.search(&SearchCriteria::default(), false).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, "https://cucumber.io/2017");
    assert_eq!(results[0].company_name, "Cucumber Ltd");
    assert_eq!(results[0].sector_name.as_deref(), Some("Software"));
    assert_eq!(results[0].country_name.as_deref(), Some("United Kingdom"));
}

#[tokio::test]
async fn admins_see_unpublished_statements() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let f = fixture(&pool).await;
    let store = store(&pool);

    store
        .create(&statement(f.cucumber.id, "https://cucumber.io/2017", "2017-03-22", true))
        .await
        .unwrap();
    store
        .create(&statement(f.cucumber.id, "https://cucumber.io/draft", "2018-01-01", false))
        .await
        .unwrap();

    let results = store.search(&SearchCriteria::default(), true).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, "https://cucumber.io/draft");
    assert!(!results[0].published);

    let newest_published = store.newest(true).await.unwrap();
    assert_eq!(newest_published[0].url, "https://cucumber.io/2017");
}

#[tokio::test]
async fn same_day_statements_resolve_to_lowest_id() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let f = fixture(&pool).await;
    let store = store(&pool);

    let first = store
        .create(&statement(f.cucumber.id, "https://cucumber.io/a", "2017-03-22", true))
        .await
        .unwrap();
    store
        .create(&statement(f.cucumber.id, "https://cucumber.io/b", "2017-03-22", true))
        .await
        .unwrap();

    let results = store.search(&SearchCriteria::default(), false).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, first.id);
}

#[tokio::test]
async fn company_name_filter_is_case_insensitive_substring() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let f = fixture(&pool).await;
    let store = store(&pool);
    let other = Company::create("Gherkin plc", Some(f.gb.id), Some(f.software.id), &pool)
        .await
        .unwrap();

    store
        .create(&statement(f.cucumber.id, "https://cucumber.io/", "2017-03-22", true))
        .await
        .unwrap();
    store
        .create(&statement(other.id, "https://gherkin.example/", "2017-03-22", true))
        .await
        .unwrap();

    let criteria = SearchCriteria {
        company_name: Some("cucumber".into()),
        ..SearchCriteria::default()
    };
    let results = store.search(&criteria, false).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].company_name, "Cucumber Ltd");

    let criteria = SearchCriteria {
        company_name: Some("UMBER".into()),
        ..SearchCriteria::default()
    };
    assert_eq!(store.search(&criteria, false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sector_and_country_filters_match_any_given_id() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let f = fixture(&pool).await;
    let store = store(&pool);
    let shop = Company::create("Shop SA", Some(f.fr.id), Some(f.retail.id), &pool)
        .await
        .unwrap();

    store
        .create(&statement(f.cucumber.id, "https://cucumber.io/", "2017-03-22", true))
        .await
        .unwrap();
    store
        .create(&statement(shop.id, "https://shop.example/", "2017-03-22", true))
        .await
        .unwrap();

    let by_sector = SearchCriteria {
        sector_ids: vec![f.retail.id],
        ..SearchCriteria::default()
    };
    let results = store.search(&by_sector, false).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].company_name, "Shop SA");

    let by_country = SearchCriteria {
        country_ids: vec![f.gb.id, f.fr.id],
        ..SearchCriteria::default()
    };
    assert_eq!(store.search(&by_country, false).await.unwrap().len(), 2);

    let no_match = SearchCriteria {
        sector_ids: vec![f.software.id],
        country_ids: vec![f.fr.id],
        ..SearchCriteria::default()
    };
    assert!(store.search(&no_match, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_page_counts_the_whole_result_set() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let f = fixture(&pool).await;
    let store = store(&pool);

    for i in 0..5 {
        let company = Company::create(&format!("Company {i}"), Some(f.gb.id), None, &pool)
            .await
            .unwrap();
        store
            .create(&statement(company.id, "https://example.com/", "2017-03-22", true))
            .await
            .unwrap();
    }

    let page = store
        .search_page(&SearchCriteria::default(), false, 2, 2)
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].company_name, "Company 2");
    assert_eq!(page.total_pages(), 3);

    let beyond = store
        .search_page(&SearchCriteria::default(), false, i64::MAX, 25)
        .await
        .unwrap();
    assert_eq!(beyond.total, 5);
    assert!(beyond.items.is_empty());
    assert!(!beyond.has_next());
}

#[tokio::test]
async fn statements_without_a_company_are_not_listed() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let store = store(&pool);

    store
        .create(&StatementInput {
            published: true,
            ..StatementInput::new("https://orphan.example/")
        })
        .await
        .unwrap();

    assert!(store.search(&SearchCriteria::default(), true).await.unwrap().is_empty());
}

// =========================================================================
// Snapshots
// =========================================================================

#[tokio::test]
async fn latest_snapshot_is_returned() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let f = fixture(&pool).await;
    let created = store(&pool)
        .create(&statement(f.cucumber.id, "https://cucumber.io/", "2017-03-22", true))
        .await
        .unwrap();

    assert!(registry_store::Snapshot::latest_for_statement(created.id, &pool)
        .await
        .unwrap()
        .is_none());

    registry_store::Snapshot::create(created.id, Some((&b"<html/>"[..], "text/html")), None, &pool)
        .await
        .unwrap();
    let second = registry_store::Snapshot::create(
        created.id,
        Some((&b"%PDF-1.4"[..], "application/pdf")),
        Some((&b"png"[..], "image/png")),
        &pool,
    )
    .await
    .unwrap();

    let latest = registry_store::Snapshot::latest_for_statement(created.id, &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, second.id);
    assert!(latest.original_is_pdf());
    assert_eq!(latest.screenshot_or_original().unwrap().content_type, "image/png");
}

#[tokio::test]
async fn find_detail_resolves_verifier_email() {
    let Some((pool, _guard)) = test_pool().await else {
        return;
    };
    let f = fixture(&pool).await;
    let admin = User::create("Super", "Admin", "admin@somewhere.com", true, &pool)
        .await
        .unwrap();

    let input = StatementInput {
        approved_by_board: Some("Yes".into()),
        approved_by: Some("Big Boss".into()),
        signed_by_director: Some(false),
        link_on_front_page: Some(true),
        verified_by_id: Some(admin.id),
        ..statement(f.cucumber.id, "https://cucumber.io/", "2017-03-22", true)
    };
    let created = store(&pool).create(&input).await.unwrap();

    let detail = store(&pool).find_detail(created.id).await.unwrap().unwrap();
    assert_eq!(detail.verified_by_email.as_deref(), Some("admin@somewhere.com"));
    assert_eq!(detail.approved_by_board.as_deref(), Some("Yes"));
    assert!(store(&pool).find_detail(created.id + 1).await.unwrap().is_none());
}
