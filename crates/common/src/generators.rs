//! Synthetic data generation.
//!
//! Every generator is random on purpose: each run exercises different names,
//! amounts and dates. The `*_with` variants take the RNG (and the clock where
//! relevant) explicitly so properties can be checked in tests.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::format::{format_date_ddmmyyyy, format_date_time};
use crate::types::{ContactFormData, DateDirection, MAILBOX_SUFFIX};

/// Domain of the external inbox that receives OTPs and quote emails
pub const DEFAULT_MAIL_DOMAIN: &str = "chitthi.in";

/// Default window, in days, for random past/future dates
pub const DEFAULT_DAYS_RANGE: u32 = 14;

const FIRST_NAMES: &[&str] = &[
    "Amelia", "Oliver", "Isla", "George", "Ava", "Harry", "Freya", "Noah", "Mia", "Jack",
    "Sophia", "Leo", "Grace", "Arthur", "Evie", "Oscar", "Poppy", "Theo", "Ruby", "Finley",
    "Zoë", "Chloé", "D'Arcy", "Mary-Jane", "Ishaan", "Priya", "Aarav", "Ananya", "Rohan",
    "Meera", "Kabir", "Saanvi",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Jones", "Taylor", "Brown", "Williams", "Wilson", "Johnson", "Davies", "Patel",
    "Robinson", "Wright", "Thompson", "Evans", "Walker", "White", "Roberts", "Green", "Hall",
    "O'Connor", "Smith-Jones", "Sharma", "Gupta", "Khan", "Mehta",
];

const COMPANY_SUFFIXES: &[&str] = &[
    "Group", "and Sons", "LLC", "Inc", "Holdings", "Partners", "Consulting", "Logistics",
];

const LOREM_WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua",
    "enim", "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris",
    "nisi", "aliquip", "ex", "ea", "commodo", "consequat",
];

/// Keep ASCII letters only
pub fn sanitize_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphabetic()).collect()
}

/// Fresh contact identity with the default mail domain
pub fn generate_contact_form_data() -> ContactFormData {
    generate_contact_form_data_with(&mut rand::thread_rng(), DEFAULT_MAIL_DOMAIN)
}

pub fn generate_contact_form_data_with<R: Rng + ?Sized>(
    rng: &mut R,
    mail_domain: &str,
) -> ContactFormData {
    let first_name = pick_name(rng, FIRST_NAMES);
    let last_name = pick_name(rng, LAST_NAMES);

    ContactFormData {
        full_name: format!("{first_name} {last_name}"),
        company: company_name(rng),
        email: format!(
            "{}{}@{}",
            first_name.to_lowercase(),
            MAILBOX_SUFFIX,
            mail_domain
        ),
        phone: format!("90{}", rng.gen_range(6_000_000_000u64..=9_999_999_999)),
        employees: Some(rng.gen_range(1..=500)),
        message: lorem_sentence(rng, 6),
    }
}

fn pick_name<R: Rng + ?Sized>(rng: &mut R, names: &[&str]) -> String {
    // Sanitizing can empty a name in theory; the lists never contain one that does.
    let name = names.choose(rng).copied().unwrap_or("Alex");
    let clean = sanitize_name(name);
    if clean.is_empty() {
        "Alex".to_string()
    } else {
        clean
    }
}

fn company_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let owner = LAST_NAMES.choose(rng).copied().unwrap_or("Smith");
    let suffix = COMPANY_SUFFIXES.choose(rng).copied().unwrap_or("Group");
    format!("{owner} {suffix}")
}

/// Capitalised sentence of `words` lorem words ending with a full stop
pub fn lorem_sentence<R: Rng + ?Sized>(rng: &mut R, words: usize) -> String {
    let words: Vec<&str> = (0..words.max(1))
        .map(|_| LOREM_WORDS.choose(rng).copied().unwrap_or("lorem"))
        .collect();
    let mut sentence = words.join(" ");
    if let Some(first) = sentence.get(..1) {
        let upper = first.to_uppercase();
        sentence.replace_range(..1, &upper);
    }
    sentence.push('.');
    sentence
}

/// Uniform coin flip
pub fn true_false() -> bool {
    rand::thread_rng().gen_bool(0.5)
}

/// Eight digit company registration number starting with 0 or 1.
///
/// Collisions with existing businesses are possible; callers retry through
/// [`crate::retry::pick_unique`].
pub fn generate_uk_company_number() -> String {
    generate_uk_company_number_with(&mut rand::thread_rng())
}

pub fn generate_uk_company_number_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = if rng.gen_bool(0.5) { '0' } else { '1' };
    let mut number = String::with_capacity(8);
    number.push(first);
    for _ in 0..7 {
        number.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    number
}

/// `today` shifted by a random whole number of days in `[0, days_range)`
pub fn random_date_with<R: Rng + ?Sized>(
    rng: &mut R,
    today: NaiveDate,
    direction: DateDirection,
    days_range: u32,
) -> NaiveDate {
    let offset = i64::from(rng.gen_range(0..days_range.max(1)));
    match direction {
        DateDirection::Past => today - Duration::days(offset),
        DateDirection::Future => today + Duration::days(offset),
    }
}

pub fn random_date(direction: DateDirection, days_range: u32) -> NaiveDate {
    random_date_with(
        &mut rand::thread_rng(),
        Local::now().date_naive(),
        direction,
        days_range,
    )
}

/// Random date relative to today as `DD/MM/YYYY`
pub fn get_date_ddmmyyyy(direction: DateDirection, days_range: u32) -> String {
    format_date_ddmmyyyy(random_date(direction, days_range))
}

/// Random instant within the next 14 days
pub fn random_date_time_with<R: Rng + ?Sized>(rng: &mut R, now: NaiveDateTime) -> NaiveDateTime {
    let window = Duration::days(i64::from(DEFAULT_DAYS_RANGE)).num_seconds();
    now + Duration::seconds(rng.gen_range(0..window))
}

/// Random callback time within the next 14 days as `DD/MM/YYYY hh:mm AM/PM`
pub fn generate_callback_date_time() -> String {
    format_date_time(random_date_time_with(
        &mut rand::thread_rng(),
        Local::now().naive_local(),
    ))
}
