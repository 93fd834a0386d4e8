//! Businesses, quotes, invoices and payments

use chrono::Local;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crm_e2e_common::format::{
    amount_input, format_currency_gbp, format_date_ddmmyyyy, slash_to_hyphen,
};
use crm_e2e_common::generators::{generate_contact_form_data_with, random_date, DEFAULT_DAYS_RANGE};
use crm_e2e_common::quote::{generate_quote_data, validate_quote_data};
use crm_e2e_common::{
    plan_option_steps, BusinessType, ContactFormData, DateDirection, DocumentKind, HistoryMode,
    PaymentHistory, QuoteData, QuoteStage, QuoteType,
};

use super::FlowContext;
use crate::driver::{ClickOptions, Locator, Page, WaitState};
use crate::error::{E2eError, E2eResult};
use crate::expect::expect;
use crate::mail::MailReader;
use crate::window::follow_link;

const BUSINESS_LINK: &str = r#"a[title="Click for business details"]"#;
const ACTIONS_TRIGGER: &str = "span.ant-dropdown-trigger";

/// Test card accepted by Stripe in test mode
const STRIPE_CARD: &str = "4242 4242 4242 4242";

/// A quote or invoice created during the scenario, with the terms typed into
/// it and where it stands in its lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub plan: QuoteType,
    pub document: DocumentKind,
    pub data: QuoteData,
    pub stage: QuoteStage,
}

impl QuoteRecord {
    fn advance(&mut self, next: QuoteStage) -> E2eResult<()> {
        self.stage = self.stage.advance(next)?;
        debug!(stage = %self.stage, "quote record advanced");
        Ok(())
    }

    fn history(&self, document: DocumentKind, mode: HistoryMode) -> PaymentHistory {
        let entry = PaymentHistory::new(document, mode, self.plan, self.data.amount);
        match mode {
            HistoryMode::Stripe | HistoryMode::Marked => entry.with_employees(self.data.employees),
            HistoryMode::Create | HistoryMode::Accept => entry,
        }
    }
}

/// How an invoice gets settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Client pays by card through the emailed payment link
    Stripe,
    /// Admin records an offline payment
    MarkAsPaid,
}

impl PaymentMethod {
    pub fn random() -> Self {
        if rand::thread_rng().gen_bool(0.5) {
            PaymentMethod::Stripe
        } else {
            PaymentMethod::MarkAsPaid
        }
    }
}

/// Where payment details are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoSurface {
    /// Detail drawer in the CRM
    AdminDrawer,
    /// Quote or invoice page the client opens from an email
    CustomerPage,
}

/// Texts a quote/invoice detail view must show.
///
/// VAT and total are recomputed from the amount that was typed in; the
/// customer page prints dates with hyphens.
pub fn payment_info_lines(record: &QuoteRecord, surface: InfoSurface) -> Vec<String> {
    let totals = record.data.totals();
    let date = |d| {
        let text = format_date_ddmmyyyy(d);
        match surface {
            InfoSurface::AdminDrawer => text,
            InfoSurface::CustomerPage => slash_to_hyphen(&text),
        }
    };

    let mut lines = vec![
        record.plan.plan_label().to_string(),
        date(record.data.date),
        record.data.employees.to_string(),
        format_currency_gbp(totals.amount),
        format_currency_gbp(totals.vat),
        format_currency_gbp(totals.total),
    ];

    if record.plan.has_subscription_period() {
        lines.push(date(record.data.start));
        lines.push(date(record.data.end));
    }

    if surface == InfoSurface::AdminDrawer {
        if let Some(discount) = &record.data.discount {
            lines.push(format_currency_gbp(discount.amount));
        }
    }

    lines
}

/// Business created from the portal's business list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalBusiness {
    pub company_number: String,
    pub email: String,
    pub is_trial: bool,
}

/// Existing active business picked from the list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChosenBusiness {
    pub company_number: String,
    pub email: String,
}

impl ChosenBusiness {
    /// Inbox name is the local part of the business email
    pub fn mailbox_username(&self) -> &str {
        mailbox_of(&self.email)
    }
}

impl PortalBusiness {
    pub fn mailbox_username(&self) -> &str {
        mailbox_of(&self.email)
    }
}

fn mailbox_of(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

pub struct BusinessFlow {
    ctx: FlowContext,
    mail: Arc<MailReader>,
}

impl BusinessFlow {
    pub fn new(ctx: FlowContext, mail: Arc<MailReader>) -> Self {
        Self { ctx, mail }
    }

    pub fn context(&self) -> &FlowContext {
        &self.ctx
    }

    /// Search the business list by company number and open the match
    pub async fn enter_business_page(&self, company_number: &str) -> E2eResult<()> {
        let page = &self.ctx.page;

        page.goto(&self.ctx.config.crm_url("/business")).await?;
        self.ctx.expect().text("Business ID").await?;

        let search = Locator::placeholder("Search...");
        page.fill(&search, company_number).await?;
        page.press(&search, "Enter").await?;

        page.click(&Locator::css(BUSINESS_LINK).first()).await?;
        debug!("Opened business {}", company_number);
        Ok(())
    }

    /// Create a quote or invoice of type `plan` with freshly generated terms
    pub async fn create_quote_invoice(
        &self,
        plan: QuoteType,
        document: DocumentKind,
        create_exists: bool,
    ) -> E2eResult<QuoteRecord> {
        self.create_quote_invoice_with(plan, document, create_exists, generate_quote_data())
            .await
    }

    pub async fn create_quote_invoice_with(
        &self,
        plan: QuoteType,
        document: DocumentKind,
        create_exists: bool,
        data: QuoteData,
    ) -> E2eResult<QuoteRecord> {
        // Reject impossible plan choices before touching the page
        let steps = plan_option_steps(plan, create_exists)?;
        validate_quote_data(&data)?;

        let page = &self.ctx.page;
        let field = |name: &str| Locator::css(format!("{}-form_{}", document.form_id_prefix(), name));

        page.click(&Locator::tab(document.tab_name())).await?;
        page.click(&Locator::button("Add New")).await?;

        page.click(&field("planType")).await?;
        for _ in 0..steps {
            page.keyboard_press("ArrowDown").await?;
        }
        page.keyboard_press("Enter").await?;
        page.keyboard_press("Enter").await?;

        if plan.has_subscription_period() {
            self.ctx
                .fill_date_range(
                    &field("subscriptionPeriod"),
                    &format_date_ddmmyyyy(data.start),
                    &format_date_ddmmyyyy(data.end),
                )
                .await?;
        }

        page.fill(&field("empCount"), &data.employees.to_string())
            .await?;
        page.fill(&field("amount"), &amount_input(data.amount)).await?;

        let date = field("date");
        page.click(&date).await?;
        page.fill(&date, &format_date_ddmmyyyy(data.date)).await?;
        page.keyboard_press("Enter").await?;

        // Totals are recomputed by the form after the date changes
        page.wait_for_timeout(self.ctx.config.timeouts.settle())
            .await?;

        if let Some(discount) = &data.discount {
            debug!(amount = %discount.amount, "adding discount");
            page.click(&field("isDiscount")).await?;
            page.fill(&field("discount"), &amount_input(discount.amount))
                .await?;
            page.fill(&field("discountNote"), &discount.note).await?;
        }

        page.click(&Locator::button("Save")).await?;
        self.ctx.expect().text(document.saved_message()).await?;
        self.ctx.close_notification().await?;

        let stage = match document {
            DocumentKind::Quote => QuoteStage::Draft.advance(QuoteStage::Saved)?,
            DocumentKind::Invoice => QuoteStage::Invoiced,
        };

        info!(
            %plan,
            %document,
            amount = %data.amount,
            discount = data.is_discount(),
            "{} saved",
            document
        );
        Ok(QuoteRecord {
            plan,
            document,
            data,
            stage,
        })
    }

    /// Check the "Quote Created" history entry and the quote drawer
    pub async fn verify_quote_creation(&self, record: &QuoteRecord) -> E2eResult<()> {
        self.check_payment_history(&record.history(DocumentKind::Quote, HistoryMode::Create))
            .await?;
        self.open_document_drawer(DocumentKind::Quote).await?;
        self.verify_payment_info(self.ctx.page.as_ref(), record, InfoSurface::AdminDrawer)
            .await?;
        self.close_drawer().await
    }

    /// Email the quote, accept it from the client's inbox and check the
    /// "Quote Accepted" entry. The CRM issues the invoice dated today.
    pub async fn quote_to_invoice(&self, record: &mut QuoteRecord, username: &str) -> E2eResult<()> {
        self.ctx
            .page
            .click(&Locator::tab(DocumentKind::Quote.tab_name()))
            .await?;

        self.send_payment_email(DocumentKind::Quote).await?;
        record.advance(QuoteStage::Sent)?;

        let lines = payment_info_lines(record, InfoSurface::CustomerPage);
        self.mail.accept_quote(username, &lines).await?;
        record.advance(QuoteStage::Accepted)?;

        self.check_payment_history(&record.history(DocumentKind::Quote, HistoryMode::Accept))
            .await?;

        record.advance(QuoteStage::Invoiced)?;
        record.document = DocumentKind::Invoice;
        record.data = record.data.clone().with_date(Local::now().date_naive());
        info!("Quote converted to invoice");
        Ok(())
    }

    /// Check the invoice drawer and optionally settle the invoice
    pub async fn verify_invoice_pay(
        &self,
        record: &mut QuoteRecord,
        username: &str,
        payment: Option<PaymentMethod>,
    ) -> E2eResult<()> {
        self.open_document_drawer(DocumentKind::Invoice).await?;
        self.verify_payment_info(self.ctx.page.as_ref(), record, InfoSurface::AdminDrawer)
            .await?;
        self.close_drawer().await?;

        match payment {
            None => Ok(()),
            Some(PaymentMethod::Stripe) => self.pay_with_stripe(record, username).await,
            Some(PaymentMethod::MarkAsPaid) => self.mark_as_paid(record).await,
        }
    }

    async fn pay_with_stripe(&self, record: &mut QuoteRecord, username: &str) -> E2eResult<()> {
        self.send_payment_email(DocumentKind::Invoice).await?;
        record.advance(QuoteStage::InvoiceSent)?;

        let popup_timeout = self.ctx.config.timeouts.popup();
        let snapshot = record.clone();
        self.mail
            .with_inbox(username, |inbox| async move {
                inbox
                    .click(&Locator::text("Complete Your Payment").first())
                    .await?;
                let invoice_page =
                    follow_link(&inbox, &Locator::text("Pay Now").first(), popup_timeout).await?;

                self.verify_payment_info(invoice_page.as_ref(), &snapshot, InfoSurface::CustomerPage)
                    .await?;
                self.make_stripe_payment(invoice_page.as_ref()).await
            })
            .await?;
        record.advance(QuoteStage::Paid)?;

        self.check_payment_history(&record.history(DocumentKind::Invoice, HistoryMode::Stripe))
            .await?;
        info!("Invoice paid through Stripe");
        Ok(())
    }

    async fn mark_as_paid(&self, record: &mut QuoteRecord) -> E2eResult<()> {
        let page = &self.ctx.page;

        self.open_actions_menu().await?;
        page.click(&Locator::role("menuitem", "Mark As Paid")).await?;
        page.fill(&Locator::css("#onb-notify-form_remark"), "Client gave us coins.")
            .await?;
        page.click(&Locator::button("Save")).await?;
        self.ctx.expect().text("Marked as paid successfully").await?;
        record.advance(QuoteStage::MarkedPaid)?;

        self.check_payment_history(&record.history(DocumentKind::Invoice, HistoryMode::Marked))
            .await?;
        info!("Invoice marked as paid");
        Ok(())
    }

    /// Open the History tab and look for every line of `entry`
    pub async fn check_payment_history(&self, entry: &PaymentHistory) -> E2eResult<()> {
        let lines = entry.expected_lines()?;
        self.ctx.page.click(&Locator::tab("History")).await?;
        self.ctx.expect().all_texts(&lines).await?;
        debug!(document = %entry.document, mode = %entry.mode, "payment history entry present");
        Ok(())
    }

    /// Check that `page` shows the plan, dates, employees and recomputed totals
    pub async fn verify_payment_info(
        &self,
        page: &dyn Page,
        record: &QuoteRecord,
        surface: InfoSurface,
    ) -> E2eResult<()> {
        let lines = payment_info_lines(record, surface);
        expect(page, self.ctx.config.timeouts.assertion())
            .all_texts(&lines)
            .await
    }

    /// Send the latest quote/invoice on the current tab to the client
    pub async fn send_payment_email(&self, document: DocumentKind) -> E2eResult<()> {
        self.open_actions_menu().await?;
        self.ctx
            .page
            .click(&Locator::role("menuitem", "Send Email"))
            .await?;
        self.ctx.expect().text("Email sent successfully").await?;
        self.ctx.close_notification().await?;
        info!("{} emailed to client", document);
        Ok(())
    }

    /// Fill Stripe checkout with the test card and pay
    pub async fn make_stripe_payment(&self, page: &dyn Page) -> E2eResult<()> {
        page.fill(&Locator::css("#cardNumber"), STRIPE_CARD).await?;
        page.fill(&Locator::css("#cardExpiry"), "12 / 34").await?;
        page.fill(&Locator::css("#cardCvc"), "123").await?;
        page.fill(&Locator::css("#billingName"), "E2E Client").await?;
        page.click(&Locator::button("Pay")).await?;

        expect(page, self.ctx.config.timeouts.popup())
            .text("Payment successful")
            .await
    }

    async fn open_document_drawer(&self, document: DocumentKind) -> E2eResult<()> {
        let page = &self.ctx.page;
        let link = Locator::css(format!(r#"span[title="{}"]"#, document.detail_link_title())).first();

        page.click(&Locator::tab(document.tab_name())).await?;
        self.ctx.expect().visible(&link).await?;
        page.click(&link).await
    }

    async fn close_drawer(&self) -> E2eResult<()> {
        self.ctx
            .page
            .click_with(
                &Locator::any_role("dialog").locate(Locator::button("close")),
                ClickOptions::forced(),
            )
            .await
    }

    async fn open_actions_menu(&self) -> E2eResult<()> {
        let page = &self.ctx.page;
        page.hover(&Locator::css(ACTIONS_TRIGGER).first()).await?;
        let opened = page
            .wait_for(
                &Locator::css(".ant-dropdown-menu:visible"),
                WaitState::Visible,
                self.ctx.config.timeouts.assertion(),
            )
            .await?;
        if opened {
            Ok(())
        } else {
            Err(E2eError::step("open actions menu", "dropdown menu did not open"))
        }
    }

    /// Create a business from the portal with fresh contact data and random options
    pub async fn create_portal_business(&self) -> E2eResult<PortalBusiness> {
        let (data, business_type, responder, trial) = {
            let mut rng = rand::thread_rng();
            let data = generate_contact_form_data_with(&mut rng, &self.ctx.config.mail.domain);
            let business_type = *BusinessType::ALL
                .choose(&mut rng)
                .unwrap_or(&BusinessType::Limited);
            let responder = self
                .ctx
                .config
                .data
                .first_responders
                .choose(&mut rng)
                .cloned()
                .ok_or_else(|| E2eError::step("create business", "no first responders configured"))?;
            (data, business_type, responder, rng.gen_bool(0.5))
        };
        self.create_portal_business_with(&data, business_type, &responder, trial)
            .await
    }

    pub async fn create_portal_business_with(
        &self,
        data: &ContactFormData,
        business_type: BusinessType,
        first_responder: &str,
        trial: bool,
    ) -> E2eResult<PortalBusiness> {
        let page = &self.ctx.page;

        page.goto(&self.ctx.config.crm_url("/business")).await?;
        page.click(&Locator::button("Add New")).await?;

        page.click(&Locator::css("#edit-basic-info_type")).await?;
        page.click(&Locator::exact_text(business_type.label())).await?;

        page.click(&Locator::css("#edit-basic-info_firstResponse"))
            .await?;
        self.ctx.select_first_response(first_responder).await?;

        page.fill(&Locator::css("#edit-basic-info_name_first"), data.first_name())
            .await?;
        page.fill(&Locator::css("#edit-basic-info_name_last"), data.last_name())
            .await?;
        page.fill(&Locator::css("#edit-basic-info_email"), &data.email)
            .await?;
        page.fill(&Locator::css("input[type='tel']"), &data.phone).await?;

        if trial {
            let employees = data.employees.unwrap_or(1).to_string();
            page.click(&Locator::css("input[type='checkbox']")).await?;
            page.fill(&Locator::css("#edit-basic-info_allowedEmps"), &employees)
                .await?;
            self.ctx
                .fill_date_range(
                    &Locator::css("#edit-basic-info_subscriptionPeriod"),
                    &format_date_ddmmyyyy(random_date(DateDirection::Past, DEFAULT_DAYS_RANGE)),
                    &format_date_ddmmyyyy(random_date(DateDirection::Future, DEFAULT_DAYS_RANGE)),
                )
                .await?;
        }

        let company_number = self
            .ctx
            .pick_company_number(&Locator::css("#edit-basic-info_companyNumber"))
            .await?;

        info!(
            business_type = business_type.label(),
            trial, "Portal business {} created", company_number
        );
        Ok(PortalBusiness {
            company_number,
            email: data.email.clone(),
            is_trial: trial,
        })
    }

    /// Open the business and check its "Business Created" history entry
    pub async fn verify_business_created(&self, business: &PortalBusiness) -> E2eResult<()> {
        self.enter_business_page(&business.company_number).await?;
        self.ctx
            .expect()
            .all_texts(&[
                "Business Created:".to_string(),
                format!("- Company Number: {}", business.company_number),
                format!("- Email: {}", business.email),
            ])
            .await
    }

    /// Open the first active business and read its email and company number
    pub async fn choose_business(&self) -> E2eResult<ChosenBusiness> {
        let page = &self.ctx.page;

        page.goto(&self.ctx.config.crm_url("/business?tagStatus=4"))
            .await?;
        page.click(&Locator::css(BUSINESS_LINK).first()).await?;
        page.click(&Locator::tab("Profile")).await?;

        let email = page
            .inner_text(&Locator::exact_text("Email").locate(Locator::css(
                r#"xpath=ancestor::div[contains(@class,"ant-form-item-row")]//span[contains(text(),"@")]"#,
            )))
            .await?
            .trim()
            .to_string();

        let href = page
            .get_attribute(&Locator::role("link", "Click for company details"), "href")
            .await?
            .unwrap_or_default();
        let company_number = href
            .rsplit('/')
            .next()
            .filter(|number| !number.is_empty())
            .ok_or_else(|| E2eError::step("choose business", format!("no company number in {href:?}")))?
            .to_string();

        if !email.contains('@') {
            return Err(E2eError::step(
                "choose business",
                format!("profile email {email:?} is not an address"),
            ));
        }

        info!("Chose business {} ({})", company_number, email);
        Ok(ChosenBusiness {
            company_number,
            email,
        })
    }
}
