//! Integration tests for record assembly
//!
//! These tests serve canned Stack Overflow pages from a wiremock server and
//! drive the coordinator and fetcher against it end-to-end.

use stack_scrape::config::Config;
use stack_scrape::crawler::{Coordinator, Fetcher, PageSource};
use stack_scrape::model::{Owner, UserType};
use stack_scrape::output::ApiResponse;
use stack_scrape::query::{FilterMode, QueryParams};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUESTION: &str = include_str!("../fixtures/question.html");
const QUESTION_TIMELINE: &str = include_str!("../fixtures/question_timeline.html");
const ANSWER_TIMELINE: &str = include_str!("../fixtures/answer_timeline.html");
const PROFILE: &str = include_str!("../fixtures/profile.html");
const LISTING: &str = include_str!("../fixtures/listing.html");
const MIGRATED_TIMELINE: &str = include_str!("../fixtures/migrated_timeline.html");
const MIGRATED_REVISIONS: &str = include_str!("../fixtures/migrated_revisions.html");
const MIGRATED_USER: &str = include_str!("../fixtures/migrated_user.html");

const QUESTION_ID: i64 = 11227809;
const ANSWER_ID: i64 = 11227902;

/// Creates a test configuration pointed at the mock server, with no pacing
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.fetcher.max_concurrent = 4;
    config.fetcher.rate_window_ms = 0;
    config.fetcher.retry_budget_secs = 10;
    config.fetcher.default_retry_after_secs = 0;
    config.fetcher.request_timeout_secs = 5;
    config
}

/// Fills the `{{BASE}}` and `{{ID}}` placeholders of a fixture
fn fill(template: &str, base: &str, id: i64) -> String {
    template
        .replace("{{BASE}}", base)
        .replace("{{ID}}", &id.to_string())
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts the question, its answer, both timelines and the owner profile
async fn mount_question(server: &MockServer) {
    let base = server.uri();
    let question = fill(QUESTION, &base, QUESTION_ID);

    mount_page(server, &format!("/questions/{}", QUESTION_ID), question.clone()).await;
    mount_page(server, &format!("/questions/{}", ANSWER_ID), question).await;
    mount_page(
        server,
        &format!("/posts/{}/timeline", QUESTION_ID),
        fill(QUESTION_TIMELINE, &base, QUESTION_ID),
    )
    .await;
    mount_page(
        server,
        &format!("/posts/{}/timeline", ANSWER_ID),
        fill(ANSWER_TIMELINE, &base, ANSWER_ID),
    )
    .await;
    mount_page(server, "/users/87234/gmannickg", PROFILE.to_string()).await;
}

/// Mounts a migrated question whose owner lives on another site
async fn mount_migrated(server: &MockServer, with_revisions: bool) {
    let base = server.uri();
    mount_page(server, "/questions/500", fill(QUESTION, &base, 500)).await;
    mount_page(server, "/posts/500/timeline", fill(MIGRATED_TIMELINE, &base, 500)).await;
    if with_revisions {
        mount_page(server, "/other/posts/77/revisions", MIGRATED_REVISIONS.to_string()).await;
    }
    mount_page(server, "/other/users/12/old-timer", fill(MIGRATED_USER, &base, 500)).await;
    mount_page(server, "/users/87234/gmannickg", PROFILE.to_string()).await;
}

fn items<T>(response: ApiResponse<T>) -> (Vec<T>, bool) {
    match response {
        ApiResponse::Items { items, has_more } => (items, has_more),
        _ => panic!("expected an items response"),
    }
}

fn registered(owner: &Owner) -> &stack_scrape::model::RegisteredOwner {
    match owner {
        Owner::Registered(owner) => owner,
        other => panic!("expected a registered owner, got {:?}", other),
    }
}

#[tokio::test]
async fn test_question_by_id_full_assembly() {
    let server = MockServer::start().await;
    mount_question(&server).await;

    let config = create_test_config(&server.uri());
    let coordinator = Coordinator::from_config(&config).expect("Failed to build coordinator");

    let response = coordinator
        .questions_by_ids(&[QUESTION_ID], &QueryParams::default())
        .await
        .expect("Request failed");
    let (questions, has_more) = items(response);

    assert!(!has_more);
    assert_eq!(questions.len(), 1);
    let q = &questions[0];

    assert_eq!(q.question_id, QUESTION_ID);
    assert_eq!(q.title, "Why is processing a sorted array faster");
    assert_eq!(q.tags, vec!["java", "c++", "performance"]);
    assert_eq!(q.score, 27153);
    assert_eq!(q.answer_count, 1);
    assert_eq!(q.accepted_answer_id, Some(ANSWER_ID));
    assert!(q.is_answered);
    assert_eq!(q.view_count, 1912345);
    assert_eq!(q.creation_date, 1340805096);
    assert_eq!(q.last_activity_date, 1714554000);
    assert_eq!(q.last_edit_date, Some(1665560113));
    assert_eq!(q.protected_date, Some(1388534400));
    assert_eq!(q.closed_date, None);
    assert_eq!(q.content_license.as_deref(), Some("CC BY-SA 4.0"));
    assert_eq!(
        q.link,
        format!("{}/questions/{}/why-is-it-faster", server.uri(), QUESTION_ID)
    );
    assert_eq!(q.migrated_from, None);
    assert_eq!(q.body, None);

    let owner = registered(&q.owner);
    assert_eq!(owner.user_id, 87234);
    assert_eq!(owner.account_id, 29142);
    assert_eq!(owner.reputation, 501436);
    assert_eq!(owner.user_type, UserType::Registered);
    assert_eq!(owner.display_name, "GManNickG");
    assert_eq!(owner.link, format!("{}/users/87234/gmannickg", server.uri()));
}

#[tokio::test]
async fn test_question_with_body() {
    let server = MockServer::start().await;
    mount_question(&server).await;

    let coordinator = Coordinator::from_config(&create_test_config(&server.uri())).unwrap();
    let params = QueryParams {
        filter: FilterMode::WithBody,
        ..QueryParams::default()
    };

    let (questions, _) = items(coordinator.questions_by_ids(&[QUESTION_ID], &params).await.unwrap());
    let body = questions[0].body.as_deref().expect("body requested");
    assert!(body.contains("peculiar behavior"));
}

#[tokio::test]
async fn test_id_resolving_elsewhere_is_discarded() {
    let server = MockServer::start().await;
    mount_question(&server).await;
    // /questions/42 redirects to a different question on the real site
    mount_page(&server, "/questions/42", fill(QUESTION, &server.uri(), QUESTION_ID)).await;

    let coordinator = Coordinator::from_config(&create_test_config(&server.uri())).unwrap();

    let (questions, _) = items(
        coordinator
            .questions_by_ids(&[42, QUESTION_ID, QUESTION_ID], &QueryParams::default())
            .await
            .unwrap(),
    );
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].question_id, QUESTION_ID);

    let total = coordinator
        .questions_by_ids(
            &[42, QUESTION_ID],
            &QueryParams {
                filter: FilterMode::Total,
                ..QueryParams::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(total, ApiResponse::Total { total: 1 });
}

#[tokio::test]
async fn test_answers_of_question() {
    let server = MockServer::start().await;
    mount_question(&server).await;

    let coordinator = Coordinator::from_config(&create_test_config(&server.uri())).unwrap();

    let (answers, has_more) = items(
        coordinator
            .answers_by_question_ids(&[QUESTION_ID], &QueryParams::default())
            .await
            .unwrap(),
    );

    assert!(!has_more);
    assert_eq!(answers.len(), 1);
    let a = &answers[0];
    assert_eq!(a.answer_id, ANSWER_ID);
    assert_eq!(a.question_id, QUESTION_ID);
    assert_eq!(a.score, 34587);
    assert!(a.is_accepted);
    assert_eq!(a.creation_date, 1340805402);
    assert_eq!(a.last_activity_date, 1340805402);
    assert_eq!(a.last_edit_date, None);
    assert_eq!(a.content_license.as_deref(), Some("CC BY-SA 3.0"));
    assert!(a.recommendations.is_empty());
    assert!(a.posted_by_collectives.is_empty());
    assert_eq!(registered(&a.owner).user_id, 87234);

    let total = coordinator
        .answers_by_question_ids(
            &[QUESTION_ID],
            &QueryParams {
                filter: FilterMode::Total,
                ..QueryParams::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(total, ApiResponse::Total { total: 1 });
}

#[tokio::test]
async fn test_answer_by_id_found_through_question_page() {
    let server = MockServer::start().await;
    mount_question(&server).await;

    let coordinator = Coordinator::from_config(&create_test_config(&server.uri())).unwrap();
    let params = QueryParams {
        filter: FilterMode::WithBody,
        ..QueryParams::default()
    };

    let (answers, _) = items(coordinator.answers_by_ids(&[ANSWER_ID, 1], &params).await.unwrap());
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].answer_id, ANSWER_ID);
    assert!(answers[0]
        .body
        .as_deref()
        .is_some_and(|body| body.contains("branch prediction")));
}

#[tokio::test]
async fn test_migrated_owner_followed_to_stack_overflow() {
    let server = MockServer::start().await;
    mount_migrated(&server, true).await;

    let coordinator = Coordinator::from_config(&create_test_config(&server.uri())).unwrap();

    let (questions, _) = items(
        coordinator
            .questions_by_ids(&[500], &QueryParams::default())
            .await
            .unwrap(),
    );
    let q = &questions[0];

    let migration = q.migrated_from.as_ref().expect("question was migrated");
    assert_eq!(migration.other_site.site_url, "https://superuser.com");
    assert_eq!(migration.on_date, 1267401600);
    assert_eq!(migration.question_id, Some(77));
    assert_eq!(q.content_license.as_deref(), Some("CC BY-SA 2.5"));

    let owner = registered(&q.owner);
    assert_eq!(owner.display_name, "GManNickG");
    assert_eq!(owner.link, "https://stackoverflow.com/users/87234/gmannickg");
    assert_eq!(owner.user_id, 87234);
}

#[tokio::test]
async fn test_migrated_owner_lookup_failure_keeps_name() {
    let server = MockServer::start().await;
    mount_migrated(&server, false).await;

    let coordinator = Coordinator::from_config(&create_test_config(&server.uri())).unwrap();

    let (questions, _) = items(
        coordinator
            .questions_by_ids(&[500], &QueryParams::default())
            .await
            .unwrap(),
    );
    assert_eq!(
        questions[0].owner,
        Owner::NameOnly {
            display_name: "old timer".to_string()
        }
    );
}

#[tokio::test]
async fn test_listing_walk_drops_failed_entities() {
    let server = MockServer::start().await;
    mount_question(&server).await;
    mount_page(&server, "/questions", fill(LISTING, &server.uri(), QUESTION_ID)).await;

    let coordinator = Coordinator::from_config(&create_test_config(&server.uri())).unwrap();

    // The second card points at /questions/404, which is not mounted
    let (questions, has_more) = items(coordinator.questions(&QueryParams::default()).await.unwrap());
    assert!(!has_more);
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].question_id, QUESTION_ID);

    let total = coordinator
        .questions(&QueryParams {
            filter: FilterMode::Total,
            ..QueryParams::default()
        })
        .await
        .unwrap();
    assert_eq!(total, ApiResponse::Total { total: 24197857 });
}

#[tokio::test]
async fn test_total_mode_skips_timeline_and_owner_hops() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/questions", fill(LISTING, &base, QUESTION_ID)).await;
    mount_page(
        &server,
        &format!("/questions/{}", QUESTION_ID),
        fill(QUESTION, &base, QUESTION_ID),
    )
    .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/posts/\d+/timeline$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/users/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let coordinator = Coordinator::from_config(&create_test_config(&base)).unwrap();
    let params = QueryParams {
        filter: FilterMode::Total,
        ..QueryParams::default()
    };

    let listing = coordinator.questions(&params).await.unwrap();
    assert_eq!(listing, ApiResponse::Total { total: 24197857 });

    let by_id = coordinator
        .questions_by_ids(&[QUESTION_ID], &params)
        .await
        .unwrap();
    assert_eq!(by_id, ApiResponse::Total { total: 1 });

    let answers = coordinator
        .answers_by_question_ids(&[QUESTION_ID], &params)
        .await
        .unwrap();
    assert_eq!(answers, ApiResponse::Total { total: 1 });

    server.verify().await;
}

#[tokio::test]
async fn test_missing_listing_fails_request() {
    let server = MockServer::start().await;
    let coordinator = Coordinator::from_config(&create_test_config(&server.uri())).unwrap();

    assert!(coordinator.questions(&QueryParams::default()).await.is_err());
}

#[tokio::test]
async fn test_filter_none_fetches_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let coordinator = Coordinator::from_config(&create_test_config(&server.uri())).unwrap();
    let params = QueryParams {
        filter: FilterMode::None,
        ..QueryParams::default()
    };

    assert!(coordinator.questions(&params).await.unwrap().is_empty());
    assert!(coordinator
        .answers_by_ids(&[1], &params)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_fetcher_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/flaky", "<html>ok</html>".to_string()).await;

    let fetcher = Fetcher::new(&create_test_config(&server.uri())).unwrap();
    let body = fetcher
        .fetch(&format!("{}/flaky", server.uri()))
        .await
        .expect("retry should succeed");
    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn test_fetcher_does_not_retry_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(&create_test_config(&server.uri())).unwrap();
    let err = fetcher
        .fetch(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();

    assert_eq!(err.status, Some(404));
    assert!(!err.retryable);
}

#[tokio::test]
async fn test_fetcher_waits_out_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/busy", "<html>done</html>".to_string()).await;

    let fetcher = Fetcher::new(&create_test_config(&server.uri())).unwrap();
    let body = fetcher
        .fetch(&format!("{}/busy", server.uri()))
        .await
        .expect("rate limit should be retried");
    assert_eq!(body, "<html>done</html>");
}
