//! Client subscription flows, the mail reader and popup handling

mod support;

use chrono::NaiveDate;
use std::sync::Arc;

use crm_e2e::flows::{ClientFlow, FlowContext};
use crm_e2e::mail::MailReader;
use crm_e2e::window::{follow_link, open_in_new_tab};
use crm_e2e::{E2eError, Locator};
use crm_e2e_common::Error;
use support::Fake;

const PERIOD: &str = "span.subscription-period";

fn client(fake: &Fake) -> ClientFlow {
    let config = support::config();
    let mail = Arc::new(MailReader::new(fake.browser(), &config));
    ClientFlow::new(FlowContext::new(fake.page(), config), fake.browser(), mail)
}

fn mail(fake: &Fake) -> MailReader {
    MailReader::new(fake.browser(), &support::config())
}

#[tokio::test]
async fn overdue_subscription_blocks_login() {
    let fake = Fake::new();
    fake.text(PERIOD, "Subscription: 01/01/1999 - 01/01/2000")
        .hidden("text=Dashboard");
    let page = fake.page();

    client(&fake)
        .edit_client_subscription(page.as_ref(), "ada.official@chitthi.in", true)
        .await
        .unwrap();

    assert!(fake.logged("fill #update-subscription-form_subscriptionPeriod = 01/01/1999"));
    assert!(fake.logged("type 01/01/2000"));
    assert!(fake.logged(r#"wait span.ant-tag-error >> has-text="Overdue""#));
    assert!(fake.logged("fill #login_email = ada.official@chitthi.in"));
    assert_eq!(fake.contexts(), (1, 1));
}

#[tokio::test]
async fn overdue_client_reaching_dashboard_fails() {
    let fake = Fake::new();
    fake.text(PERIOD, "Subscription: 01/01/1999 - 01/01/2000");
    let page = fake.page();

    let err = client(&fake)
        .edit_client_subscription(page.as_ref(), "ada.official@chitthi.in", true)
        .await
        .unwrap_err();

    assert!(matches!(err, E2eError::AssertionFailed(_)));
    assert_eq!(fake.contexts(), (1, 1));
}

#[tokio::test]
async fn active_subscription_allows_login() {
    let fake = Fake::new();
    fake.text(PERIOD, "Subscription: 01-10-2026 - 01-10-2027");
    let page = fake.page();
    let period = (
        NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        NaiveDate::from_ymd_opt(2027, 10, 1).unwrap(),
    );

    client(&fake)
        .edit_client_subscription_to(page.as_ref(), "ada.official@chitthi.in", period, false)
        .await
        .unwrap();

    assert!(fake.logged(r#"wait span.ant-tag-success >> has-text="Active""#));
    assert!(fake.logged("text=Dashboard"));
    assert_eq!(fake.contexts(), (1, 1));
}

#[tokio::test]
async fn shown_period_must_match_written_period() {
    let fake = Fake::new();
    fake.text(PERIOD, "Subscription: 02/01/1999 - 01/01/2000");
    let page = fake.page();

    let err = client(&fake)
        .edit_client_subscription(page.as_ref(), "ada.official@chitthi.in", true)
        .await
        .unwrap_err();

    assert!(matches!(err, E2eError::AssertionFailed(_)));
    // Login is never attempted
    assert_eq!(fake.contexts(), (0, 0));
}

#[tokio::test]
async fn unreadable_period_is_a_format_error() {
    let fake = Fake::new();
    fake.text(PERIOD, "Subscription: pending");
    let page = fake.page();

    let err = client(&fake)
        .edit_client_subscription(page.as_ref(), "ada.official@chitthi.in", false)
        .await
        .unwrap_err();

    assert!(matches!(err, E2eError::Common(Error::SubscriptionFormat(_))));
}

#[tokio::test]
async fn client_page_opens_in_new_tab() {
    let fake = Fake::new();
    fake.popup_opens();

    let page = client(&fake).verify_client_creation("01234567").await.unwrap();

    assert_eq!(page.url().await.unwrap(), "fake://page/2");
    assert!(fake.logged("fill placeholder=\"Search...\" = 01234567"));
    assert!(fake.logged(r#"click role=tab[name="Subscription"]"#));
}

#[tokio::test]
async fn client_link_without_new_tab_fails() {
    let fake = Fake::new();

    let Err(err) = client(&fake).open_client_page("01234567").await else {
        panic!("client page opened without a new tab");
    };
    assert!(matches!(err, E2eError::PopupNotOpened(_)));
}

#[tokio::test]
async fn otp_is_read_and_inbox_closed() {
    let fake = Fake::new();
    fake.text(r"has-text=/^\d{4}$/", " 4821 ");

    let otp = mail(&fake).read_otp("ada.official").await.unwrap();

    assert_eq!(otp, "4821");
    assert!(fake.logged("goto https://tempmail.plus/en/#!"));
    assert!(fake.logged(r#"click role=button[name="chitthi.in"]"#));
    assert_eq!(fake.contexts(), (1, 1));
}

#[tokio::test]
async fn malformed_otp_is_rejected() {
    let fake = Fake::new();
    fake.text(r"has-text=/^\d{4}$/", "48a1");

    let err = mail(&fake).read_otp("ada.official").await.unwrap_err();

    assert!(matches!(err, E2eError::StepFailed { .. }));
    assert_eq!(fake.contexts(), (1, 1));
}

#[tokio::test]
async fn inbox_closed_when_reading_fails() {
    let fake = Fake::new();
    fake.fail_on("Verification Code");

    assert!(mail(&fake).read_otp("ada.official").await.is_err());
    assert_eq!(fake.contexts(), (1, 1));
}

#[tokio::test]
async fn inbox_closed_when_mailbox_selection_fails() {
    let fake = Fake::new();
    fake.fail_on("#pre_button");

    assert!(mail(&fake).open_inbox("ada.official").await.is_err());
    assert_eq!(fake.contexts(), (1, 1));
}

#[tokio::test]
async fn follow_link_falls_back_to_same_page() {
    let fake = Fake::new();
    let page = fake.page();
    let link = Locator::text("Pay Now");

    let same = follow_link(&page, &link, std::time::Duration::from_millis(10))
        .await
        .unwrap();
    assert_eq!(same.url().await.unwrap(), page.url().await.unwrap());
    assert!(fake.logged("click! text=Pay Now"));

    fake.popup_opens();
    let popup = follow_link(&page, &link, std::time::Duration::from_millis(10))
        .await
        .unwrap();
    assert_ne!(popup.url().await.unwrap(), page.url().await.unwrap());
}

#[tokio::test]
async fn new_tab_required() {
    let fake = Fake::new();
    let page = fake.page();

    let Err(err) =
        open_in_new_tab(&page, &Locator::css("a.client"), std::time::Duration::from_millis(10)).await
    else {
        panic!("new tab reported without a popup");
    };
    assert!(matches!(err, E2eError::PopupNotOpened(_)));
}
