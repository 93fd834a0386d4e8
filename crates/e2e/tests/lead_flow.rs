//! Lead flows and the shared CRM helpers against the scripted fake browser

mod support;

use serde_json::json;
use test_case::test_case;

use crm_e2e::flows::{FlowContext, LeadFlow};
use crm_e2e::{E2eError, Locator};
use crm_e2e_common::generators::generate_contact_form_data;
use crm_e2e_common::{Error, LeadMode, LeadStatus};
use support::Fake;

fn context(fake: &Fake) -> FlowContext {
    FlowContext::new(fake.page(), support::config())
}

fn evaluations(fake: &Fake) -> usize {
    fake.log().iter().filter(|l| l.starts_with("evaluate ")).count()
}

#[tokio::test]
async fn company_number_retries_after_collision() {
    let fake = Fake::new();
    fake.visible("Business already exists", [true, false]);

    let number = context(&fake)
        .pick_company_number(&Locator::css("#companyNo"))
        .await
        .unwrap();

    assert_eq!(number.len(), 8);
    assert!(fake.logged(&format!("type {number}")));
    assert_eq!(fake.occurrences(r#"click role=button[name="Save"]"#), 2);
    assert_eq!(
        fake.occurrences("click a.ant-notification-notice-close >> nth=0"),
        1
    );
}

#[tokio::test]
async fn company_number_skips_unoffered_candidates() {
    let fake = Fake::new();
    fake.hidden("Business already exists")
        .count("role=option", [0, 1]);

    context(&fake)
        .pick_company_number(&Locator::css("#companyNo"))
        .await
        .unwrap();

    assert_eq!(fake.occurrences("key Escape"), 1);
    assert_eq!(fake.occurrences(r#"click role=button[name="Save"]"#), 1);
}

#[tokio::test]
async fn company_number_gives_up_after_configured_attempts() {
    let fake = Fake::new();
    fake.count("role=option", [0]);
    let config = support::config_with(|c| c.retry.company_number_attempts = 3);

    let err = FlowContext::new(fake.page(), config.into())
        .pick_company_number(&Locator::css("#companyNo"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        E2eError::Common(Error::ExhaustedRetries { attempts: 3, .. })
    ));
    assert_eq!(fake.occurrences("key Escape"), 3);
}

#[tokio::test]
async fn first_response_scrolls_until_rendered() {
    let fake = Fake::new();
    fake.count(r#"has-text="Avik Sain""#, [0, 0, 1]);

    context(&fake).select_first_response("Avik Sain").await.unwrap();

    assert_eq!(evaluations(&fake), 2);
    assert!(fake.logged(r#"click .ant-select-item-option-content >> has-text="Avik Sain" >> nth=0"#));
}

#[tokio::test]
async fn first_response_stops_when_list_end_reached() {
    let fake = Fake::new();
    fake.count(r#"has-text="Nobody""#, [0])
        .evaluate(".rc-virtual-list", [json!(true), json!(false)]);

    let err = context(&fake)
        .select_first_response("Nobody")
        .await
        .unwrap_err();

    assert!(matches!(err, E2eError::Common(Error::ExhaustedRetries { .. })));
    assert_eq!(evaluations(&fake), 2);
}

#[tokio::test]
async fn first_response_rendered_by_last_allowed_scroll_is_picked() {
    let fake = Fake::new();
    fake.count(r#"has-text="Avik Sain""#, [0, 1]);
    let config = support::config_with(|c| c.retry.dropdown_scroll_attempts = 1);

    FlowContext::new(fake.page(), config.into())
        .select_first_response("Avik Sain")
        .await
        .unwrap();

    assert_eq!(evaluations(&fake), 1);
    assert!(fake.logged(r#"click .ant-select-item-option-content >> has-text="Avik Sain" >> nth=0"#));
}

#[tokio::test]
async fn first_response_gives_up_after_configured_scrolls() {
    let fake = Fake::new();
    fake.count(r#"has-text="Nobody""#, [0]);
    let config = support::config_with(|c| c.retry.dropdown_scroll_attempts = 1);

    let err = FlowContext::new(fake.page(), config.into())
        .select_first_response("Nobody")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        E2eError::Common(Error::ExhaustedRetries { attempts: 1, .. })
    ));
    assert_eq!(evaluations(&fake), 1);
    assert_eq!(fake.occurrences(r#"count .ant-select-item-option-content >> has-text="Nobody""#), 2);
}

#[tokio::test]
async fn admin_login_waits_for_dashboard() {
    let fake = Fake::new();
    context(&fake).login_admin().await.unwrap();

    assert!(fake.logged("goto http://localhost:3000/login"));
    assert!(fake.logged(r#"fill label="Username" = "#));
    assert!(fake.logged("wait_url **/dashboard"));
}

#[tokio::test]
async fn create_lead_fills_form_and_picks_mode() {
    let fake = Fake::new();
    let data = generate_contact_form_data();

    let created = LeadFlow::new(context(&fake))
        .create_portal_lead_with(data.clone(), LeadMode::LiveChat, "Lead Manager")
        .await
        .unwrap();

    assert_eq!(created, data);
    assert!(fake.logged(&format!(
        "fill #edit-lead-form_name_first = {}",
        data.first_name()
    )));
    assert!(fake.logged(&format!(
        "fill #edit-lead-form_emailList_0_email = {}",
        data.email
    )));
    assert!(fake.logged(r#"has-text="Live Chat""#));
    assert!(fake.logged("text=Lead saved successfully"));
}

#[tokio::test]
async fn promoting_lead_registers_company_number() {
    let fake = Fake::new();
    fake.hidden("Business already exists");

    let number = LeadFlow::new(context(&fake))
        .change_status(LeadStatus::Business)
        .await
        .unwrap();

    assert!(number.is_some());
    assert!(fake.logged("press #change-lead-status-form_status Enter"));
}

#[test_case(LeadStatus::LeadLost, "Lead Lost" ; "lead lost")]
#[test_case(LeadStatus::NotLead, "Not Lead" ; "not lead")]
#[tokio::test]
async fn closing_lead_checks_status_tag(status: LeadStatus, label: &str) {
    let fake = Fake::new();

    let number = LeadFlow::new(context(&fake))
        .change_status(status)
        .await
        .unwrap();

    assert_eq!(number, None);
    assert!(fake.logged(&format!(r#"has-text="{label}" >> nth=0"#)));
    assert!(fake.logged(&format!(r#"span.ant-tag >> has-text="{label}""#)));
}

#[tokio::test]
async fn lead_activity_lands_in_history() {
    let fake = Fake::new();
    let lead = LeadFlow::new(context(&fake));

    lead.add_note().await.unwrap();
    lead.add_callback().await.unwrap();

    assert!(fake.logged("text=Note Added"));
    assert!(fake.logged("text=Callback Added"));
    assert_eq!(fake.occurrences(r#"click role=tab[name="History"]"#), 2);
}
