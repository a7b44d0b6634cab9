//! End-to-end comparison tests against a mock marketplace.
//!
//! Each test stands up a `wiremock` server serving product pages under
//! `/dp/{ASIN}` and search results under `/s?k=…`.

use std::time::Duration;

use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prodcmp_core::WeightOverrides;
use prodcmp_ranking::{CompareError, CompareOptions, CompareRequest, Comparator};
use prodcmp_scraper::{ClientOptions, ExtractionRules, MarketplaceClient, RetryPolicy};

const BASE_ASIN: &str = "B08N5WRWNW";
const BASE_TITLE: &str = "Acme Smart Speaker Mini Gen 3 with Alexa";

const CANDIDATES: &[(&str, &str, &str, &str)] = &[
    ("B09B8V1LZ3", "Acme Smart Speaker Max", "₹5,999.00", "4.6 out of 5 stars"),
    ("B07PFFMP9P", "Acme Smart Speaker Lite", "₹2,499.00", "4.1 out of 5 stars"),
    ("B0C1H26C46", "Boomy Smart Speaker Mini", "₹3,299.00", "4.3 out of 5 stars"),
    ("B0BSHF7WHW", "Acme Smart Display 8", "₹7,999.00", "4.4 out of 5 stars"),
    ("B0CHX1W1XY", "Sonix Smart Speaker Gen 2", "₹3,999.00", "3.9 out of 5 stars"),
    ("B0D5J6ZPZ1", "Acme Kids Smart Speaker", "₹3,499.00", "4.0 out of 5 stars"),
];

const CAPTCHA_PAGE: &str = r#"<html><head><title>Amazon.in</title></head><body>
<form method="get" action="/errors/validateCaptcha">
<h4>Enter the characters you see below</h4>
</form></body></html>"#;

fn comparator(server: &MockServer) -> Comparator {
    let client = MarketplaceClient::new(
        &server.uri(),
        ClientOptions {
            timeout_secs: 5,
            user_agent: Some("prodcmp-test/0.1".to_owned()),
            retry: RetryPolicy {
                max_retries: 1,
                backoff_base_ms: 1,
                max_delay_ms: 5,
                max_total_wait_ms: 500,
            },
            inter_request_delay_ms: 0,
        },
        ExtractionRules::default()
            .compile()
            .expect("default rules compile"),
    )
    .expect("failed to build test MarketplaceClient");

    Comparator::new(
        client,
        CompareOptions {
            timeout: Duration::from_secs(20),
            ..CompareOptions::default()
        },
    )
}

fn product_html(title: &str, price: &str, rating: &str, reviews: &str) -> String {
    format!(
        r#"<html><body>
<span id="productTitle">{title}</span>
<a id="bylineInfo">Visit the Acme Store</a>
<span class="a-price"><span class="a-offscreen">{price}</span></span>
<span class="a-icon-alt">{rating}</span>
<span id="acrCustomerReviewText">{reviews}</span>
<div id="feature-bullets"><ul>
<li><span class="a-list-item">Room-filling sound</span></li>
<li><span class="a-list-item">Voice control</span></li>
</ul></div>
</body></html>"#
    )
}

fn search_html(asins: &[&str]) -> String {
    let cards: String = asins
        .iter()
        .map(|a| {
            format!(
                r#"<div data-component-type="s-search-result" data-asin="{a}">
<a class="a-link-normal s-no-outline" href="/Some-Item/dp/{a}/ref=sr_1_1">item</a></div>"#
            )
        })
        .collect();
    format!("<html><body>{cards}</body></html>")
}

async fn mount_base(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/dp/{BASE_ASIN}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_html(
            BASE_TITLE,
            "₹4,499.00",
            "4.5 out of 5 stars",
            "12,345 ratings",
        )))
        .mount(server)
        .await;
}

async fn mount_candidates(server: &MockServer, candidates: &[(&str, &str, &str, &str)]) {
    for (asin, title, price, rating) in candidates {
        Mock::given(method("GET"))
            .and(path(format!("/dp/{asin}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(product_html(
                title,
                price,
                rating,
                "1,024 ratings",
            )))
            .mount(server)
            .await;
    }
}

/// Any search returns `asins`. Mount after more specific search mocks.
async fn mount_any_search(server: &MockServer, asins: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_html(asins)))
        .mount(server)
        .await;
}

fn candidate_asins(count: usize) -> Vec<&'static str> {
    CANDIDATES.iter().take(count).map(|(asin, ..)| *asin).collect()
}

#[tokio::test]
async fn asin_input_ranks_base_against_search_candidates() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    mount_candidates(&server, CANDIDATES).await;
    let mut results = vec![BASE_ASIN];
    results.extend(candidate_asins(CANDIDATES.len()));
    mount_any_search(&server, &results).await;

    let result = comparator(&server)
        .compare(&CompareRequest::new(BASE_ASIN))
        .await
        .expect("comparison should succeed");

    assert_eq!(result.base.id, BASE_ASIN);
    assert_eq!(result.base.brand.as_deref(), Some("Acme"));
    assert!(result.candidates().count() >= 5);
    assert!(result.ranked.iter().any(|r| r.is_base));
    assert_eq!(
        result.ranked.iter().filter(|r| r.product.id == BASE_ASIN).count(),
        1,
        "base product must not appear as its own candidate"
    );

    let ranks: Vec<usize> = result.ranked.iter().map(|r| r.score.rank).collect();
    assert_eq!(ranks, (1..=result.ranked.len()).collect::<Vec<_>>());
    for pair in result.ranked.windows(2) {
        assert!(pair[0].score.total_score >= pair[1].score.total_score);
    }
    assert_eq!(result.best.id, result.ranked[0].product.id);
    assert!(result.recommendation.contains(&result.best.title));

    assert_eq!(result.diagnostics.strategies_attempted[0], "direct_lookup");
    assert!(!result.diagnostics.escalated);
    assert!(!result.diagnostics.timed_out);
}

#[tokio::test]
async fn blocked_search_is_recorded_and_other_strategies_fill_the_set() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    mount_candidates(&server, CANDIDATES).await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", BASE_TITLE))
        .respond_with(ResponseTemplate::new(200).set_body_string(CAPTCHA_PAGE))
        .expect(1)
        .mount(&server)
        .await;
    mount_any_search(&server, &candidate_asins(CANDIDATES.len())).await;

    let result = comparator(&server)
        .compare(&CompareRequest::new(BASE_ASIN))
        .await
        .expect("comparison should succeed despite a blocked search");

    assert_eq!(
        result.diagnostics.strategies_blocked,
        vec!["keyword_search:full_title".to_owned()]
    );
    assert!(result.candidates().count() >= 5);
}

#[tokio::test]
async fn too_few_candidates_escalates_then_reports_insufficient_data() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    mount_candidates(&server, &CANDIDATES[..2]).await;
    mount_any_search(&server, &candidate_asins(2)).await;

    let err = comparator(&server)
        .compare(&CompareRequest::new(BASE_ASIN))
        .await
        .expect_err("two candidates are not enough");

    match err {
        CompareError::InsufficientData {
            found,
            required,
            diagnostics,
        } => {
            assert_eq!(found, 2);
            assert_eq!(required, 5);
            assert!(diagnostics.escalated);
            assert!(diagnostics
                .strategies_attempted
                .contains(&"keyword_search:relaxed".to_owned()));
            assert!(diagnostics
                .strategies_attempted
                .contains(&"keyword_search:brand_only".to_owned()));
        }
        other => panic!("expected InsufficientData, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_weights_fail_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = CompareRequest {
        weights: WeightOverrides {
            price: Some(0.9),
            ..WeightOverrides::default()
        },
        ..CompareRequest::new(BASE_ASIN)
    };
    let err = comparator(&server)
        .compare(&request)
        .await
        .expect_err("weights summing above 1 must be rejected");
    assert!(matches!(err, CompareError::Configuration(_)), "got {err:?}");
}

#[tokio::test]
async fn unrecognised_input_is_an_invalid_reference() {
    let server = MockServer::start().await;
    let err = comparator(&server)
        .compare(&CompareRequest::new("   "))
        .await
        .expect_err("blank input must be rejected");
    assert!(matches!(err, CompareError::InvalidReference(_)), "got {err:?}");
}

#[tokio::test]
async fn missing_base_product_is_an_invalid_reference() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/dp/{BASE_ASIN}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_any_search(&server, &[]).await;

    let err = comparator(&server)
        .compare(&CompareRequest::new(BASE_ASIN))
        .await
        .expect_err("no base product");
    assert!(matches!(err, CompareError::InvalidReference(_)), "got {err:?}");
}

#[tokio::test]
async fn name_input_uses_first_search_result_as_base() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    mount_candidates(&server, CANDIDATES).await;
    let mut results = vec![BASE_ASIN];
    results.extend(candidate_asins(CANDIDATES.len()));
    mount_any_search(&server, &results).await;

    let result = comparator(&server)
        .compare(&CompareRequest::new("acme smart speaker"))
        .await
        .expect("comparison by name should succeed");

    assert_eq!(result.base.id, BASE_ASIN);
    assert_eq!(result.diagnostics.strategies_attempted[0], "search_by_name");
    assert!(result.candidates().all(|r| r.product.id != BASE_ASIN));
}

#[tokio::test]
async fn deadline_keeps_results_collected_so_far() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    mount_candidates(&server, CANDIDATES).await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", BASE_TITLE))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(search_html(&candidate_asins(CANDIDATES.len()))),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(search_html(&[]))
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;

    let request = CompareRequest {
        timeout: Some(Duration::from_millis(1_500)),
        ..CompareRequest::new(BASE_ASIN)
    };
    let result = comparator(&server)
        .compare(&request)
        .await
        .expect("results gathered before the deadline should be ranked");

    assert!(result.diagnostics.timed_out);
    assert!(!result.diagnostics.escalated);
    assert!(result.candidates().count() >= 5);
}

#[tokio::test]
async fn deadline_keeps_a_finished_strategy_behind_a_hung_one() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    mount_candidates(&server, CANDIDATES).await;
    // First strategy in the batch hangs past the deadline.
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", BASE_TITLE))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(search_html(&[]))
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;
    // Second strategy returns every candidate at once.
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "Acme Smart Speaker Mini"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(search_html(&candidate_asins(CANDIDATES.len()))),
        )
        .mount(&server)
        .await;
    mount_any_search(&server, &[]).await;

    let request = CompareRequest {
        timeout: Some(Duration::from_millis(1_500)),
        ..CompareRequest::new(BASE_ASIN)
    };
    let result = comparator(&server)
        .compare(&request)
        .await
        .expect("the finished strategy's candidates should be ranked");

    assert!(result.diagnostics.timed_out);
    assert!(result.candidates().count() >= 5);
    assert_eq!(
        &result.diagnostics.strategies_attempted[1..],
        ["keyword_search:full_title", "keyword_search:short_title"]
    );
}
