//! Scenario catalogue: flows composed into full user journeys

use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crm_e2e_common::generators::true_false;
use crm_e2e_common::{DocumentKind, LeadHistory, LeadStatus, QuoteType, SuiteConfig};

use crate::driver::{Browser, BrowserContext, Page};
use crate::error::{E2eError, E2eResult};
use crate::flows::lead::random_follow_up;
use crate::flows::{BusinessFlow, ClientFlow, FlowContext, LeadFlow, PaymentMethod, WebsiteFlow};
use crate::mail::MailReader;

/// Timeout for journeys that cross the CRM, the inbox and the portal
pub const LONG_JOURNEY_TIMEOUT: Duration = Duration::from_secs(100);

pub type ScenarioFn = for<'a> fn(&'a ScenarioContext) -> BoxFuture<'a, E2eResult<()>>;

/// Everything a scenario runs against: an isolated browser context, its
/// first page, and the suite configuration
pub struct ScenarioContext {
    pub browser: Arc<dyn Browser>,
    pub context: Arc<dyn BrowserContext>,
    pub page: Arc<dyn Page>,
    pub config: Arc<SuiteConfig>,
    mail: Arc<MailReader>,
}

impl ScenarioContext {
    pub fn new(
        browser: Arc<dyn Browser>,
        context: Arc<dyn BrowserContext>,
        page: Arc<dyn Page>,
        config: Arc<SuiteConfig>,
    ) -> Self {
        let mail = Arc::new(MailReader::new(Arc::clone(&browser), &config));
        Self {
            browser,
            context,
            page,
            config,
            mail,
        }
    }

    pub fn flow_context(&self) -> FlowContext {
        FlowContext::new(Arc::clone(&self.page), Arc::clone(&self.config))
    }

    pub fn lead(&self) -> LeadFlow {
        LeadFlow::new(self.flow_context())
    }

    pub fn website(&self) -> WebsiteFlow {
        WebsiteFlow::new(self.flow_context(), Arc::clone(&self.mail))
    }

    pub fn business(&self) -> BusinessFlow {
        BusinessFlow::new(self.flow_context(), Arc::clone(&self.mail))
    }

    pub fn client(&self) -> ClientFlow {
        ClientFlow::new(
            self.flow_context(),
            Arc::clone(&self.browser),
            Arc::clone(&self.mail),
        )
    }
}

/// A named journey in the catalogue
#[derive(Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub suite: &'static str,
    pub tags: &'static [&'static str],
    /// Overrides the suite-wide scenario timeout
    pub timeout: Option<Duration>,
    pub run: ScenarioFn,
}

impl Scenario {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout.unwrap_or(default)
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("suite", &self.suite)
            .field("tags", &self.tags)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Every scenario, in run order
pub fn catalogue() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "contact-lead",
            suite: "Create Leads from Website",
            tags: &["website", "lead", "smoke"],
            timeout: None,
            run: |s| contact_lead(s).boxed(),
        },
        Scenario {
            name: "pricing-lead",
            suite: "Create Leads from Website",
            tags: &["website", "lead", "mail"],
            timeout: None,
            run: |s| pricing_lead(s).boxed(),
        },
        Scenario {
            name: "compliance-lead",
            suite: "Create Leads from Website",
            tags: &["website", "lead", "mail"],
            timeout: None,
            run: |s| compliance_lead(s).boxed(),
        },
        Scenario {
            name: "create-lead",
            suite: "CRM Panel",
            tags: &["crm", "lead", "smoke"],
            timeout: None,
            run: |s| create_lead(s).boxed(),
        },
        Scenario {
            name: "lead-activity",
            suite: "CRM Panel",
            tags: &["crm", "lead"],
            timeout: None,
            run: |s| lead_activity(s).boxed(),
        },
        Scenario {
            name: "quote-invoice-creation",
            suite: "Company creation from Lead",
            tags: &["crm", "business", "quote", "invoice", "mail"],
            timeout: Some(LONG_JOURNEY_TIMEOUT),
            run: |s| quote_invoice_creation(s).boxed(),
        },
        Scenario {
            name: "direct-invoice-creation",
            suite: "Company creation from Lead",
            tags: &["crm", "business", "invoice", "mail"],
            timeout: Some(LONG_JOURNEY_TIMEOUT),
            run: |s| direct_invoice_creation(s).boxed(),
        },
        Scenario {
            name: "portal-business",
            suite: "Portal Business Creation",
            tags: &["crm", "business", "client"],
            timeout: Some(LONG_JOURNEY_TIMEOUT),
            run: |s| portal_business(s).boxed(),
        },
        Scenario {
            name: "subscription-status",
            suite: "Subscription Status Test",
            tags: &["crm", "client"],
            timeout: Some(LONG_JOURNEY_TIMEOUT),
            run: |s| subscription_status(s).boxed(),
        },
    ]
}

/// Look a scenario up by exact name
pub fn find(name: &str) -> E2eResult<Scenario> {
    catalogue()
        .into_iter()
        .find(|s| s.name == name)
        .ok_or_else(|| E2eError::ScenarioNotFound(name.to_string()))
}

async fn contact_lead(s: &ScenarioContext) -> E2eResult<()> {
    let data = s.website().create_contact_query_lead().await?;
    open_created_lead(s, &data).await
}

async fn pricing_lead(s: &ScenarioContext) -> E2eResult<()> {
    let lead = s.website().create_pricing_query_lead().await?;
    open_created_lead(s, &lead.data).await
}

async fn compliance_lead(s: &ScenarioContext) -> E2eResult<()> {
    let data = s.website().create_compliance_test_lead().await?;
    open_created_lead(s, &data).await
}

async fn open_created_lead(
    s: &ScenarioContext,
    data: &crm_e2e_common::ContactFormData,
) -> E2eResult<()> {
    let lead = s.lead();
    lead.context().login_admin().await?;
    lead.enter_lead_page(data).await?;
    lead.check_lead_history(LeadHistory::Create).await
}

async fn create_lead(s: &ScenarioContext) -> E2eResult<()> {
    let lead = s.lead();
    lead.context().login_admin().await?;

    let data = lead.create_portal_lead().await?;
    lead.enter_lead_page(&data).await?;
    lead.verify_new_lead().await?;
    lead.check_lead_history(LeadHistory::Create).await
}

async fn lead_activity(s: &ScenarioContext) -> E2eResult<()> {
    let lead = s.lead();
    lead.context().login_admin().await?;

    let data = lead.create_portal_lead().await?;
    lead.enter_lead_page(&data).await?;

    lead.update_follow_up(random_follow_up()).await?;
    lead.add_callback().await?;
    lead.add_note().await?;
    lead.send_email().await?;

    let status = if true_false() {
        LeadStatus::LeadLost
    } else {
        LeadStatus::NotLead
    };
    lead.change_status(status).await?;
    Ok(())
}

/// Log in, create a lead and promote it, returning the lead and its company number
async fn lead_to_business(
    s: &ScenarioContext,
) -> E2eResult<(crm_e2e_common::ContactFormData, String)> {
    let lead = s.lead();
    lead.context().login_admin().await?;

    let data = lead.create_portal_lead().await?;
    lead.enter_lead_page(&data).await?;
    lead.check_lead_history(LeadHistory::Create).await?;

    let company = lead
        .change_status(LeadStatus::Business)
        .await?
        .ok_or_else(|| E2eError::step("promote lead", "no company number registered"))?;
    Ok((data, company))
}

fn maybe_payment() -> Option<PaymentMethod> {
    true_false().then(PaymentMethod::random)
}

async fn quote_invoice_creation(s: &ScenarioContext) -> E2eResult<()> {
    let (data, company) = lead_to_business(s).await?;
    let business = s.business();
    let username = data.mailbox_username();

    business.enter_business_page(&company).await?;
    let mut record = business
        .create_quote_invoice(QuoteType::Create, DocumentKind::Quote, true)
        .await?;
    business.verify_quote_creation(&record).await?;
    business.quote_to_invoice(&mut record, &username).await?;

    let payment = maybe_payment();
    business
        .verify_invoice_pay(&mut record, &username, payment)
        .await?;
    settle_client(s, &company, &data.email, payment).await
}

async fn direct_invoice_creation(s: &ScenarioContext) -> E2eResult<()> {
    let (data, company) = lead_to_business(s).await?;
    let business = s.business();

    business.enter_business_page(&company).await?;
    let mut record = business
        .create_quote_invoice(QuoteType::Create, DocumentKind::Invoice, true)
        .await?;

    let payment = maybe_payment();
    business
        .verify_invoice_pay(&mut record, &data.mailbox_username(), payment)
        .await?;
    settle_client(s, &company, &data.email, payment).await
}

/// A paid invoice activates the client, who can then log in
async fn settle_client(
    s: &ScenarioContext,
    company: &str,
    email: &str,
    payment: Option<PaymentMethod>,
) -> E2eResult<()> {
    if payment.is_none() {
        info!("Invoice left unpaid; skipping client checks");
        return Ok(());
    }
    let client = s.client();
    client.verify_client_creation(company).await?;
    client
        .login_client(email, &s.config.client.password, true)
        .await
}

async fn portal_business(s: &ScenarioContext) -> E2eResult<()> {
    let business = s.business();
    business.context().login_admin().await?;

    let created = business.create_portal_business().await?;
    business.verify_business_created(&created).await?;

    if !created.is_trial {
        let mut record = business
            .create_quote_invoice(QuoteType::Create, DocumentKind::Invoice, true)
            .await?;
        business
            .verify_invoice_pay(
                &mut record,
                created.mailbox_username(),
                Some(PaymentMethod::random()),
            )
            .await?;
    }

    let client = s.client();
    client.open_client_page(&created.company_number).await?;
    client
        .login_client(&created.email, &s.config.client.password, true)
        .await
}

async fn subscription_status(s: &ScenarioContext) -> E2eResult<()> {
    let business = s.business();
    business.context().login_admin().await?;
    let chosen = business.choose_business().await?;

    let client = s.client();
    let client_page = client.open_client_page(&chosen.company_number).await?;
    client
        .edit_client_subscription(client_page.as_ref(), &chosen.email, true)
        .await?;
    client
        .edit_client_subscription(client_page.as_ref(), &chosen.email, false)
        .await
}
