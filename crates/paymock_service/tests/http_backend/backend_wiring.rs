#![forbid(unsafe_code)]

use paymock_service::{MockConfig, MockServer};
use serde_json::{json, Value};

struct Reply {
    status: u16,
    content_type: Option<String>,
    suggested_currency: Vec<String>,
    click_token: Option<String>,
    body: String,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

fn reply(result: Result<ureq::Response, ureq::Error>) -> Reply {
    let resp = match result {
        Ok(resp) => resp,
        Err(ureq::Error::Status(_, resp)) => resp,
        Err(err) => panic!("transport error: {err}"),
    };
    Reply {
        status: resp.status(),
        content_type: resp.header("Content-Type").map(str::to_string),
        suggested_currency: resp
            .all("X-Suggested-Currency")
            .into_iter()
            .map(str::to_string)
            .collect(),
        click_token: resp.header("X-Click-Token").map(str::to_string),
        body: resp.into_string().unwrap(),
    }
}

fn get(server: &MockServer, tail: &str) -> Reply {
    reply(ureq::get(&server.url(tail)).call())
}

fn post_json(server: &MockServer, tail: &str, body: Value) -> Reply {
    reply(
        ureq::post(&server.url(tail))
            .set("Content-Type", "application/json")
            .send_string(&body.to_string()),
    )
}

fn start() -> MockServer {
    MockServer::start(MockConfig::default()).unwrap()
}

#[test]
fn at_http_01_listing_then_completeadd_grows_credit_card_choices() {
    let server = start();
    let listing = get(&server, "/paymentmethods/").json();
    let types = listing.as_array().unwrap();
    assert_eq!(types.len(), 2);
    assert_eq!(types[0]["id"], "paypal");
    assert_eq!(types[1]["preferred"], true);
    assert_eq!(types[1]["choices"].as_array().unwrap().len(), 2);

    let done = get(&server, "/paymentmethods/completeadd");
    assert_eq!(done.status, 200);
    assert_eq!(done.content_type.as_deref(), Some("text/html"));
    assert!(done.body.contains("/click/succeeded"));

    let listing = get(&server, "/paymentmethods/").json();
    let choices = listing[1]["choices"].as_array().unwrap();
    assert_eq!(choices.len(), 3);
    assert_eq!(
        choices[2],
        json!({
            "currencies": ["USD"],
            "id": 1999,
            "requires_interaction": false,
            "preferred": false,
            "description": "Yet another payment method"
        })
    );
}

// Regression guard: an injected purchase failure is still a 200 with an empty object.
#[test]
fn at_http_02_fail_flag_turns_purchase_into_empty_object_with_200() {
    let server = start();
    let ok = post_json(&server, "/purchases/", json!({"name": "com.example.app"}));
    assert_eq!(ok.status, 200);
    assert_eq!(ok.json(), json!({"state": "Complete"}));

    let set = post_json(&server, "/__control/fail", json!({"enabled": true}));
    assert_eq!(set.status, 200);
    let failed = post_json(&server, "/purchases/", json!({}));
    assert_eq!(failed.status, 200);
    assert_eq!(failed.content_type.as_deref(), Some("application/json"));
    assert_eq!(failed.body, "{}");

    post_json(&server, "/__control/fail", json!({"enabled": false}));
    assert_eq!(get(&server, "/purchases/").json()["state"], "Complete");
}

#[test]
fn at_http_03_interaction_required_then_completed_flow() {
    let server = start();
    let control = server.control();
    control.require_interaction(None).unwrap();

    let purchase = post_json(&server, "/purchases/", json!({}));
    assert_eq!(
        purchase.json(),
        json!({"state": "InProgress", "redirect_to": "/creditcard_interaction"})
    );

    let page = get(&server, "/creditcard_interaction/");
    assert_eq!(page.content_type.as_deref(), Some("text/html"));
    assert!(page.body.contains("/paymentmethods/completeadd"));

    get(&server, "/paymentmethods/completeadd");
    assert_eq!(
        control.snapshot().unwrap().catalog.choice_count("credit_card"),
        Some(3)
    );
}

#[test]
fn at_http_04_control_paths_drive_interaction_and_cancel() {
    let server = start();
    let set = post_json(
        &server,
        "/__control/interaction",
        json!({"redirect_to": "/verify/card"}),
    );
    assert_eq!(set.json(), json!({"redirect_to": "/verify/card"}));
    assert_eq!(get(&server, "/purchases/").json()["redirect_to"], "/verify/card");

    let cleared = reply(ureq::delete(&server.url("/__control/interaction")).call());
    assert_eq!(cleared.status, 200);
    assert_eq!(get(&server, "/purchases/").json(), json!({"state": "Complete"}));

    post_json(&server, "/__control/cancel", json!({}));
    let page = get(&server, "/paymentmethods/add/");
    assert!(page.body.contains("Click anywhere to cancel"));
    let state = get(&server, "/__control/state").json();
    assert_eq!(state["flags"]["interaction_cancelled"], true);
}

#[test]
fn at_http_05_scenario_tags_on_purchase() {
    let server = start();
    let interaction = get(&server, "/interaction/purchases/");
    assert_eq!(
        interaction.json(),
        json!({"state": "InProgress", "redirect_to": "/redirect.url?currency=USD"})
    );

    let not_purchased = get(&server, "/notpurchased/purchases/");
    assert_eq!(not_purchased.status, 404);
    assert_eq!(not_purchased.json(), json!({"state": "Complete"}));

    let failed = get(&server, "/fail/purchases/");
    assert_eq!(failed.status, 200);
    assert_eq!(failed.body, "{}");
}

#[test]
fn at_http_06_failing_listing_credentials_and_item_info_are_bare_404s() {
    let server = start();
    for tail in ["/fail/paymentmethods/", "/fail/creds/", "/fail/wallet/", "/fail/iteminfo/x"] {
        let r = get(&server, tail);
        assert_eq!(r.status, 404, "{tail}");
        assert_eq!(r.content_type.as_deref(), Some("application/json"), "{tail}");
        assert!(r.body.is_empty(), "{tail}");
    }

    // Per-endpoint failure leaves the other categories alone.
    post_json(
        &server,
        "/__control/fail",
        json!({"enabled": true, "category": "credentials"}),
    );
    assert_eq!(get(&server, "/creds/").status, 404);
    assert_eq!(get(&server, "/paymentmethods/").status, 200);
}

#[test]
fn at_http_07_item_info_and_credentials_payloads() {
    let server = start();
    let info = get(&server, "/eurozone/dotar/iteminfo/com.example.app");
    assert_eq!(info.status, 200);
    assert_eq!(info.suggested_currency, vec!["EUR", "ARS"]);
    assert_eq!(
        info.json(),
        json!({
            "title": "title",
            "publisher": "publisher",
            "price": 9.99,
            "prices": {"USD": 1.99, "EUR": 1.69, "GBP": 1.29, "ARS": 18.05},
            "icon_url": "icon_url"
        })
    );
    assert!(get(&server, "/iteminfo/x").suggested_currency.is_empty());

    let creds = post_json(&server, "/creds/", json!({}));
    assert_eq!(
        creds.json(),
        json!({
            "token_key": "token_key",
            "token_secret": "token_secret",
            "consumer_key": "consumer_key",
            "consumer_secret": "consumer_secret"
        })
    );
}

#[test]
fn at_http_08_head_auth_error_and_unhandled() {
    let server = start();
    let head = reply(ureq::head(&server.url("/anything/at/all")).call());
    assert_eq!(head.status, 200);
    assert_eq!(head.click_token.as_deref(), Some("X-Click-Token"));
    assert!(head.body.is_empty());

    let auth = get(&server, "/authError/purchases/");
    assert_eq!(auth.status, 401);
    assert_eq!(auth.json(), json!({}));

    let unknown = get(&server, "/no/such/resource");
    assert_eq!(unknown.status, 404);
    assert_eq!(unknown.json(), json!({"error": "unhandled"}));

    let put = reply(ureq::put(&server.url("/purchases/")).send_string("{}"));
    assert_eq!(put.status, 404);
    assert_eq!(put.json(), json!({"error": "unhandled"}));
}

#[test]
fn at_http_09_add_flow_pages_follow_scenario_segment() {
    let server = start();
    let prompt = get(&server, "/js_prompt/paymentmethods/add/");
    assert!(prompt.body.contains("window.prompt"));
    assert!(prompt.body.contains("'friend'"));
    assert!(get(&server, "/js_alert/paymentmethods/add/")
        .body
        .contains("alert("));
    assert!(get(&server, "/js_confirm/paymentmethods/add/")
        .body
        .contains("window.confirm"));
    assert!(get(&server, "/js_beforeunload/paymentmethods/add/")
        .body
        .contains("onbeforeunload"));
    assert!(get(&server, "/paymentmethods/add/")
        .body
        .contains("Click anywhere to proceed"));
}

#[test]
fn at_http_10_catalog_replacement_over_control_path() {
    let server = start();
    let replaced = reply(
        ureq::put(&server.url("/__control/payment-methods"))
            .set("Content-Type", "application/json")
            .send_string(
                &json!([{
                    "description": "Bitcoin",
                    "id": "bitcoin",
                    "preferred": true,
                    "choices": []
                }])
                .to_string(),
            ),
    );
    assert_eq!(replaced.status, 200);
    let listing = get(&server, "/paymentmethods/").json();
    assert_eq!(listing, json!([{"description": "Bitcoin", "id": "bitcoin", "preferred": true, "choices": []}]));

    // Without a credit-card type the completion has nowhere to land.
    let done = get(&server, "/paymentmethods/completeadd");
    assert_eq!(done.status, 404);

    let added = post_json(
        &server,
        "/__control/payment-methods",
        json!({"description": "Card", "id": "credit_card", "preferred": false}),
    );
    assert_eq!(added.status, 200);
    let count = post_json(&server, "/__control/complete-add", json!({})).json();
    assert_eq!(count, json!({"choices": 1}));
}
