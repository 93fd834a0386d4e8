//! Leads created from the public website and the portal compliance test

use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tracing::info;

use crm_e2e_common::generators::generate_contact_form_data_with;
use crm_e2e_common::{ContactFormData, PricingPlan};

use super::FlowContext;
use crate::driver::Locator;
use crate::error::{E2eError, E2eResult};
use crate::mail::MailReader;

const TEL_INPUT: &str = "input[type='tel']";

/// Result of the pricing query: the lead and the plan chosen afterwards
#[derive(Debug, Clone)]
pub struct PricingLead {
    pub data: ContactFormData,
    pub plan: PricingPlan,
}

pub struct WebsiteFlow {
    ctx: FlowContext,
    mail: Arc<MailReader>,
}

impl WebsiteFlow {
    pub fn new(ctx: FlowContext, mail: Arc<MailReader>) -> Self {
        Self { ctx, mail }
    }

    fn fresh_contact(&self) -> ContactFormData {
        generate_contact_form_data_with(&mut rand::thread_rng(), &self.ctx.config.mail.domain)
    }

    /// Submit the website contact form
    pub async fn create_contact_query_lead(&self) -> E2eResult<ContactFormData> {
        let data = self.fresh_contact();
        let page = &self.ctx.page;
        let employees = data.employees.unwrap_or(1).to_string();

        page.goto(&self.ctx.config.website_url("/contact")).await?;
        page.fill(&Locator::css("#name"), &data.full_name).await?;
        page.fill(&Locator::css("#company"), &data.company).await?;
        page.fill(&Locator::css("#total_employee"), &employees).await?;
        page.fill(&Locator::css("#email"), &data.email).await?;
        page.fill(&Locator::css(TEL_INPUT), &data.phone).await?;
        page.fill(&Locator::css("#message"), &data.message).await?;

        page.click(&Locator::button("Submit")).await?;
        self.ctx.expect().text("Success").await?;

        info!("Contact query submitted for {}", data.full_name);
        Ok(data)
    }

    /// Submit the pricing query, verify the emailed OTP and pick a random plan
    pub async fn create_pricing_query_lead(&self) -> E2eResult<PricingLead> {
        let plan = if rand::thread_rng().gen_bool(0.5) {
            PricingPlan::Annual
        } else {
            PricingPlan::Custom
        };
        self.create_pricing_query_lead_with(plan).await
    }

    pub async fn create_pricing_query_lead_with(&self, plan: PricingPlan) -> E2eResult<PricingLead> {
        let data = self.fresh_contact();
        let page = &self.ctx.page;
        let expect = self.ctx.expect();

        page.goto(&self.ctx.config.website_url("")).await?;
        page.click(&Locator::button("Get Started")).await?;

        page.fill(&Locator::css("#full_name"), &data.full_name).await?;
        page.fill(&Locator::css("#company_name"), &data.company).await?;
        page.fill(&Locator::css("#email"), &data.email).await?;
        page.fill(&Locator::css(TEL_INPUT), &data.phone).await?;
        page.fill(&Locator::css("#message"), &data.message).await?;
        page.click(&Locator::button("Submit")).await?;

        let verify = Locator::button("Verify");
        expect.visible(&verify).await?;

        let otp = self.mail.read_otp(&data.mailbox_username()).await?;
        page.fill(&Locator::css("input[name='otp']"), &otp).await?;
        page.click(&verify).await?;

        expect.text("Sponsicore Pricing Plans").await?;

        match plan {
            PricingPlan::Annual => {
                page.click(&Locator::text("Proceed to Pay")).await?;
            }
            PricingPlan::Custom => {
                page.click(&Locator::text("Let us know")).await?;
                expect.text("Thank you for your response").await?;
            }
        }

        info!(?plan, "Pricing query submitted for {}", data.full_name);
        Ok(PricingLead { data, plan })
    }

    /// Start a compliance test on a random campaign and finish its first page
    pub async fn create_compliance_test_lead(&self) -> E2eResult<ContactFormData> {
        let campaign = self
            .ctx
            .config
            .data
            .compliance_campaigns
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| E2eError::step("compliance test", "no campaigns configured"))?;
        self.create_compliance_test_lead_with(&campaign).await
    }

    pub async fn create_compliance_test_lead_with(&self, campaign: &str) -> E2eResult<ContactFormData> {
        let data = self.fresh_contact();
        let page = &self.ctx.page;
        let expect = self.ctx.expect();
        let (total, sponsored) = {
            let mut rng = rand::thread_rng();
            let total: u32 = rng.gen_range(10..=500);
            (total, rng.gen_range(10..=total))
        };

        page.goto(
            &self
                .ctx
                .config
                .portal_url(&format!("/compliance-test/{campaign}")),
        )
        .await?;

        page.fill(&Locator::css("#login_name"), &data.full_name).await?;
        page.fill(&Locator::css("#login_email"), &data.email).await?;
        page.fill(&Locator::css(TEL_INPUT), &data.phone).await?;
        page.click(&Locator::button("Submit")).await?;

        // One input box per digit
        let otp = self.mail.read_otp(&data.mailbox_username()).await?;
        for (i, digit) in otp.chars().enumerate() {
            page.fill(&Locator::css(format!("#Otp{}", i + 1)), &digit.to_string())
                .await?;
        }
        page.click(&Locator::button("Verify")).await?;

        expect.text("Company Information").await?;
        page.fill(
            &Locator::css("#survey-questions-form_basicInfoFirst"),
            &data.company,
        )
        .await?;
        page.fill(
            &Locator::css("#survey-questions-form_basicInfoSecond"),
            &total.to_string(),
        )
        .await?;
        page.fill(
            &Locator::css("#survey-questions-form_basicInfoThird"),
            &sponsored.to_string(),
        )
        .await?;
        page.click(&Locator::button("Save & Next")).await?;

        expect.text("Questions 1/8").await?;

        info!(campaign, "Compliance test started for {}", data.full_name);
        Ok(data)
    }
}
