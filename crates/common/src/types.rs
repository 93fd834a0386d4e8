//! Core types for the CRM end-to-end suite

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Mailbox suffix appended to a lead's first name
pub const MAILBOX_SUFFIX: &str = ".official";

/// Synthetic lead identity used to fill website and CRM forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFormData {
    pub full_name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub employees: Option<u32>,
    pub message: String,
}

impl ContactFormData {
    pub fn first_name(&self) -> &str {
        self.full_name.split(' ').next().unwrap_or_default()
    }

    pub fn last_name(&self) -> &str {
        self.full_name.split(' ').nth(1).unwrap_or_default()
    }

    /// Inbox name on the external mail provider: the first name as generated
    /// plus [`MAILBOX_SUFFIX`]. The provider matches inboxes case-insensitively,
    /// so this names the same inbox as the lowercased email.
    pub fn mailbox_username(&self) -> String {
        format!("{}{}", self.first_name(), MAILBOX_SUFFIX)
    }
}

/// Plan type selected when creating a quote or invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteType {
    Create,
    Renew,
    Activate,
    Expand,
}

impl QuoteType {
    pub const ALL: [QuoteType; 4] = [
        QuoteType::Create,
        QuoteType::Renew,
        QuoteType::Activate,
        QuoteType::Expand,
    ];

    /// Label the CRM shows for this plan type in drawers and history
    pub fn plan_label(&self) -> &'static str {
        match self {
            QuoteType::Create => "Create Company",
            QuoteType::Renew => "Renew Subscription",
            QuoteType::Activate => "Activate Company",
            QuoteType::Expand => "Expand Team",
        }
    }

    /// Expand keeps the current subscription period, every other plan sets one
    pub fn has_subscription_period(&self) -> bool {
        !matches!(self, QuoteType::Expand)
    }
}

impl std::fmt::Display for QuoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteType::Create => write!(f, "Create"),
            QuoteType::Renew => write!(f, "Renew"),
            QuoteType::Activate => write!(f, "Activate"),
            QuoteType::Expand => write!(f, "Expand"),
        }
    }
}

impl std::str::FromStr for QuoteType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(QuoteType::Create),
            "renew" => Ok(QuoteType::Renew),
            "activate" => Ok(QuoteType::Activate),
            "expand" => Ok(QuoteType::Expand),
            other => Err(format!(
                "unknown plan type `{other}` (expected create|renew|activate|expand)"
            )),
        }
    }
}

/// Optional discount attached to a quote or invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub amount: Decimal,
    pub note: String,
}

/// Financial and scheduling terms of one quote or invoice.
///
/// Generated once by the creation flow and carried unchanged through
/// acceptance, payment and verification so the expected VAT and total can
/// be recomputed from the same values that were typed into the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteData {
    pub date: NaiveDate,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub employees: u32,
    pub amount: Decimal,
    #[serde(default)]
    pub discount: Option<Discount>,
}

impl QuoteData {
    pub fn is_discount(&self) -> bool {
        self.discount.is_some()
    }

    /// Same terms with a different document date (invoices are dated on acceptance)
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }
}

/// Quote or invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Quote,
    Invoice,
}

impl DocumentKind {
    pub fn from_is_quote(is_quote: bool) -> Self {
        if is_quote {
            DocumentKind::Quote
        } else {
            DocumentKind::Invoice
        }
    }

    /// Tab on the business page listing documents of this kind
    pub fn tab_name(&self) -> &'static str {
        match self {
            DocumentKind::Quote => "Quotes",
            DocumentKind::Invoice => "Invoices",
        }
    }

    /// Prefix of the form field ids in the create drawer
    pub fn form_id_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Quote => "#esit-quote",
            DocumentKind::Invoice => "#update-subscription",
        }
    }

    pub fn saved_message(&self) -> &'static str {
        match self {
            DocumentKind::Quote => "Quote saved successfully",
            DocumentKind::Invoice => "Invoice created successfully",
        }
    }

    /// Title attribute of the row link opening the detail drawer
    pub fn detail_link_title(&self) -> &'static str {
        match self {
            DocumentKind::Quote => "Click for quote details",
            DocumentKind::Invoice => "Click for invoice details",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Quote => write!(f, "quote"),
            DocumentKind::Invoice => write!(f, "invoice"),
        }
    }
}

/// Entry categories in a lead's History tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadHistory {
    Create,
    Designation,
    Story,
    FollowUp,
    Callback,
    Note,
    Email,
}

impl LeadHistory {
    /// Text the History tab shows for this entry
    pub fn label(&self) -> &'static str {
        match self {
            LeadHistory::Create => "Lead Created",
            LeadHistory::Designation => "- Designation",
            LeadHistory::Story => "- Story",
            LeadHistory::FollowUp => "- Follow-Up Date",
            LeadHistory::Callback => "Callback Added",
            LeadHistory::Note => "Note Added",
            LeadHistory::Email => "Email Sent",
        }
    }
}

/// Target of the lead "Change Status" action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Business,
    LeadLost,
    NotLead,
}

impl LeadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LeadStatus::Business => "Business",
            LeadStatus::LeadLost => "Lead Lost",
            LeadStatus::NotLead => "Not Lead",
        }
    }
}

/// Lead source offered in the CRM "Mode" dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadMode {
    WebContactQuery,
    WebPricingQuery,
    ComplianceTest,
    LiveChat,
    Call,
    Email,
    Referral,
    Other,
}

impl LeadMode {
    pub const ALL: [LeadMode; 8] = [
        LeadMode::WebContactQuery,
        LeadMode::WebPricingQuery,
        LeadMode::ComplianceTest,
        LeadMode::LiveChat,
        LeadMode::Call,
        LeadMode::Email,
        LeadMode::Referral,
        LeadMode::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LeadMode::WebContactQuery => "Web Contact Query",
            LeadMode::WebPricingQuery => "Web Pricing Query",
            LeadMode::ComplianceTest => "Compliance Test",
            LeadMode::LiveChat => "Live Chat",
            LeadMode::Call => "Call",
            LeadMode::Email => "Email",
            LeadMode::Referral => "Referral",
            LeadMode::Other => "Other",
        }
    }
}

/// Legal form chosen when a business is created from the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    Llp,
    Limited,
    Individual,
    Partnership,
    LimitedPartnership,
}

impl BusinessType {
    pub const ALL: [BusinessType; 5] = [
        BusinessType::Llp,
        BusinessType::Limited,
        BusinessType::Individual,
        BusinessType::Partnership,
        BusinessType::LimitedPartnership,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BusinessType::Llp => "LLP",
            BusinessType::Limited => "Limited",
            BusinessType::Individual => "Individual",
            BusinessType::Partnership => "Partnership",
            BusinessType::LimitedPartnership => "Limited Partnership",
        }
    }
}

/// Follow-up shortcut in the lead header dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUp {
    Tomorrow,
    LaterThisWeek,
    ThisWeekend,
    NextWeek,
    TwoWeeks,
}

impl FollowUp {
    pub const ALL: [FollowUp; 5] = [
        FollowUp::Tomorrow,
        FollowUp::LaterThisWeek,
        FollowUp::ThisWeekend,
        FollowUp::NextWeek,
        FollowUp::TwoWeeks,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FollowUp::Tomorrow => "Tomorrow",
            FollowUp::LaterThisWeek => "Later this week",
            FollowUp::ThisWeekend => "This weekend",
            FollowUp::NextWeek => "Next week",
            FollowUp::TwoWeeks => "Two week",
        }
    }
}

/// Outcome of the website pricing query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingPlan {
    Annual,
    Custom,
}

/// Direction of a random date offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateDirection {
    Past,
    Future,
}
