//! Lead management in the CRM panel

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crm_e2e_common::generators::{
    generate_callback_date_time, generate_contact_form_data_with, lorem_sentence,
};
use crm_e2e_common::{ContactFormData, FollowUp, LeadHistory, LeadMode, LeadStatus};

use super::{FlowContext, OPTION_CONTENT};
use crate::driver::Locator;
use crate::error::{E2eError, E2eResult};

pub struct LeadFlow {
    ctx: FlowContext,
}

impl LeadFlow {
    pub fn new(ctx: FlowContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &FlowContext {
        &self.ctx
    }

    /// Create a lead from the CRM panel with fresh contact data, a random mode
    /// and a random first responder
    pub async fn create_portal_lead(&self) -> E2eResult<ContactFormData> {
        let (data, mode, responder) = {
            let mut rng = rand::thread_rng();
            let data = generate_contact_form_data_with(&mut rng, &self.ctx.config.mail.domain);
            let mode = *LeadMode::ALL.choose(&mut rng).unwrap_or(&LeadMode::Other);
            let responder = self
                .ctx
                .config
                .data
                .first_responders
                .choose(&mut rng)
                .cloned()
                .ok_or_else(|| E2eError::step("create lead", "no first responders configured"))?;
            (data, mode, responder)
        };
        self.create_portal_lead_with(data, mode, &responder).await
    }

    pub async fn create_portal_lead_with(
        &self,
        data: ContactFormData,
        mode: LeadMode,
        first_responder: &str,
    ) -> E2eResult<ContactFormData> {
        let page = &self.ctx.page;
        let expect = self.ctx.expect();

        page.goto(&self.ctx.config.crm_url("/lead")).await?;
        expect.text("Lead ID").await?;

        page.click(&Locator::button("Add New")).await?;
        page.fill(&Locator::css("#edit-lead-form_name_first"), data.first_name())
            .await?;
        page.fill(&Locator::css("#edit-lead-form_name_last"), data.last_name())
            .await?;
        page.fill(&Locator::css("#edit-lead-form_emailList_0_email"), &data.email)
            .await?;

        page.click(&Locator::css("#edit-lead-form_mode")).await?;
        page.click(
            &Locator::css(".ant-select-dropdown")
                .locate(Locator::css(OPTION_CONTENT))
                .has_text(mode.label())
                .first(),
        )
        .await?;

        page.click(&Locator::css("#edit-lead-form_firstResponse"))
            .await?;
        self.ctx.select_first_response(first_responder).await?;

        page.click(&Locator::button("Save")).await?;
        expect.text("Lead saved successfully").await?;

        info!(mode = mode.label(), "Created lead {}", data.full_name);
        Ok(data)
    }

    /// Open the lead whose row carries the contact's first name
    pub async fn enter_lead_page(&self, data: &ContactFormData) -> E2eResult<()> {
        let page = &self.ctx.page;

        page.goto(&self.ctx.config.crm_url("/lead")).await?;
        self.ctx.expect().text("Lead ID").await?;

        let row = Locator::role("row", data.first_name());
        page.click(&row.locate(Locator::css("a")).first()).await
    }

    /// A freshly opened lead shows the "New Lead" status
    pub async fn verify_new_lead(&self) -> E2eResult<()> {
        self.ctx.expect().text("New Lead").await
    }

    pub async fn check_lead_history(&self, entry: LeadHistory) -> E2eResult<()> {
        self.ctx.page.click(&Locator::tab("History")).await?;
        self.ctx.expect().text(entry.label()).await
    }

    pub async fn update_follow_up(&self, follow_up: FollowUp) -> E2eResult<()> {
        let page = &self.ctx.page;

        page.click(&Locator::css(r#"svg[data-icon="down"]"#).first())
            .await?;
        page.click(&Locator::text(follow_up.label()).first()).await?;
        self.ctx.close_notification().await?;

        self.check_lead_history(LeadHistory::FollowUp).await
    }

    pub async fn add_callback(&self) -> E2eResult<()> {
        let page = &self.ctx.page;
        let note = lorem_sentence(&mut rand::thread_rng(), 10);

        page.click(&Locator::css(r#"button[title="Add Callback"]"#))
            .await?;
        page.click(&Locator::css("#internal-callback_dateTime")).await?;
        page.keyboard_type(&generate_callback_date_time()).await?;
        page.keyboard_press("Enter").await?;

        page.fill(&Locator::css("#internal-callback_note"), &note)
            .await?;
        page.click(&Locator::button("Save")).await?;
        self.ctx.close_notification().await?;

        self.check_lead_history(LeadHistory::Callback).await
    }

    pub async fn add_note(&self) -> E2eResult<()> {
        let page = &self.ctx.page;
        let note = lorem_sentence(&mut rand::thread_rng(), 8);

        page.click(&Locator::css(r#"button[title="Add Note"]"#)).await?;
        page.fill(&Locator::css("#add-note-form_note"), &note).await?;
        page.click(&Locator::button("Save")).await?;
        self.ctx.close_notification().await?;

        self.check_lead_history(LeadHistory::Note).await
    }

    pub async fn send_email(&self) -> E2eResult<()> {
        let page = &self.ctx.page;
        let subject = lorem_sentence(&mut rand::thread_rng(), 5);

        page.click(&Locator::css(r#"button[title="Send Email"]"#))
            .await?;
        page.fill(&Locator::css("#compose-email-form_subject"), &subject)
            .await?;
        page.click(&Locator::button("Send")).await?;

        self.check_lead_history(LeadHistory::Email).await
    }

    /// Change the open lead's status. Promoting to a business registers a
    /// fresh company number, which is returned.
    pub async fn change_status(&self, status: LeadStatus) -> E2eResult<Option<String>> {
        let page = &self.ctx.page;
        let select = Locator::css("#change-lead-status-form_status");

        page.click(&Locator::css(r#"button[title="Change Status"]"#))
            .await?;
        page.click(&select).await?;

        match status {
            LeadStatus::Business => {
                // Business is the first option
                page.press(&select, "Enter").await?;
                let number = self
                    .ctx
                    .pick_company_number(&Locator::css("#change-lead-status-form_companyNo"))
                    .await?;
                info!("Lead promoted to business {}", number);
                Ok(Some(number))
            }
            LeadStatus::LeadLost | LeadStatus::NotLead => {
                page.click(&Locator::css(OPTION_CONTENT).has_text(status.label()).first())
                    .await?;
                page.click(&Locator::button("Save")).await?;
                self.ctx
                    .expect()
                    .contains_text(&Locator::css("span.ant-tag"), status.label())
                    .await?;
                info!("Lead marked {}", status.label());
                Ok(None)
            }
        }
    }
}

/// Random follow-up shortcut
pub fn random_follow_up() -> FollowUp {
    let index = rand::thread_rng().gen_range(0..FollowUp::ALL.len());
    FollowUp::ALL[index]
}
