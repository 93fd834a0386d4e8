//! Generate Commands
//!
//! Print the synthetic data the flows would type into the CRM.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use std::path::Path;

use crm_e2e_common::format::{format_currency_gbp, format_date_ddmmyyyy};
use crm_e2e_common::generators::{generate_contact_form_data_with, generate_uk_company_number};
use crm_e2e_common::quote::generate_quote_data;
use crm_e2e_common::{plan_option_steps, ContactFormData, QuoteData, QuoteType, SuiteConfig};

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum GenerateCommands {
    /// Lead contact details
    Contact {
        /// Number of records
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },

    /// Quote/invoice terms with the totals the CRM must show
    Quote {
        /// Plan type (create, renew, activate, expand)
        #[arg(short, long, default_value = "create")]
        plan: QuoteType,

        /// Number of records
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },

    /// UK company numbers
    CompanyNumber {
        /// Number of records
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },
}

#[derive(Serialize)]
pub struct ContactDisplay {
    #[serde(flatten)]
    pub data: ContactFormData,
    pub mailbox: String,
}

impl TableDisplay for ContactDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Company", "Email", "Phone", "Employees", "Mailbox"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.data.full_name.clone(),
            self.data.company.clone(),
            self.data.email.clone(),
            self.data.phone.clone(),
            self.data
                .employees
                .map(|n| n.to_string())
                .unwrap_or_default(),
            self.mailbox.clone(),
        ]
    }
}

#[derive(Serialize)]
pub struct QuoteDisplay {
    pub plan: QuoteType,
    pub option_steps: u32,
    #[serde(flatten)]
    pub data: QuoteData,
}

impl TableDisplay for QuoteDisplay {
    fn headers() -> Vec<&'static str> {
        vec![
            "Plan", "Steps", "Date", "Period", "Employees", "Amount", "VAT", "Total", "Discount",
        ]
    }

    fn row(&self) -> Vec<String> {
        let totals = self.data.totals();
        let period = if self.plan.has_subscription_period() {
            format!(
                "{} - {}",
                format_date_ddmmyyyy(self.data.start),
                format_date_ddmmyyyy(self.data.end)
            )
        } else {
            "-".to_string()
        };
        vec![
            self.plan.plan_label().to_string(),
            self.option_steps.to_string(),
            format_date_ddmmyyyy(self.data.date),
            period,
            self.data.employees.to_string(),
            format_currency_gbp(totals.amount),
            format_currency_gbp(totals.vat),
            format_currency_gbp(totals.total),
            self.data
                .discount
                .as_ref()
                .map(|d| format_currency_gbp(d.amount))
                .unwrap_or_else(|| "-".to_string()),
        ]
    }
}

#[derive(Serialize)]
pub struct CompanyNumberDisplay {
    pub company_number: String,
}

impl TableDisplay for CompanyNumberDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Company Number"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.company_number.clone()]
    }
}

pub fn execute(cmd: GenerateCommands, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    match cmd {
        GenerateCommands::Contact { count } => {
            let config = SuiteConfig::load(config_path).context("loading suite configuration")?;
            let mut rng = rand::thread_rng();
            let contacts: Vec<ContactDisplay> = (0..count)
                .map(|_| {
                    let data = generate_contact_form_data_with(&mut rng, &config.mail.domain);
                    ContactDisplay {
                        mailbox: data.mailbox_username(),
                        data,
                    }
                })
                .collect();
            print_list(&contacts, format);
        }

        GenerateCommands::Quote { plan, count } => {
            // Quotes are created on businesses that already have a company
            let option_steps = plan_option_steps(plan, true)?;
            let quotes: Vec<QuoteDisplay> = (0..count)
                .map(|_| QuoteDisplay {
                    plan,
                    option_steps,
                    data: generate_quote_data(),
                })
                .collect();
            print_list(&quotes, format);
        }

        GenerateCommands::CompanyNumber { count } => {
            let numbers: Vec<CompanyNumberDisplay> = (0..count)
                .map(|_| CompanyNumberDisplay {
                    company_number: generate_uk_company_number(),
                })
                .collect();
            print_list(&numbers, format);
        }
    }

    Ok(())
}
