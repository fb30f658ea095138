//! Brazilian document and contact validation.
//!
//! Format and checksum checks only. A valid CPF is not proof the person
//! exists; results are advisory and never consult an external registry.
//! Every function accepts masked or unmasked input.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{GymError, GymResult};
use crate::mask::only_digits;

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").ok()
});

/// Shortest staff password accepted anywhere a password is set.
pub const MIN_PASSWORD_LEN: usize = 8;

fn digits_of(input: &str) -> Vec<u32> {
    input.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_equal(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// Weighted sum over `digits` using weights descending from `start`.
fn cpf_check_digit(digits: &[u32], start: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .zip((2..=start).rev())
        .map(|(d, w)| d * w)
        .sum();
    let r = (sum * 10) % 11;
    if r == 10 { 0 } else { r }
}

/// Validate a CPF (individual taxpayer number).
pub fn is_valid_cpf(input: &str) -> bool {
    let digits = digits_of(input);
    if digits.len() != 11 || all_equal(&digits) {
        return false;
    }
    cpf_check_digit(&digits[..9], 10) == digits[9]
        && cpf_check_digit(&digits[..10], 11) == digits[10]
}

const CNPJ_WEIGHTS_1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

fn cnpj_check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let r = sum % 11;
    if r < 2 { 0 } else { 11 - r }
}

/// Validate a CNPJ (company registration number).
pub fn is_valid_cnpj(input: &str) -> bool {
    let digits = digits_of(input);
    if digits.len() != 14 || all_equal(&digits) {
        return false;
    }
    cnpj_check_digit(&digits[..12], &CNPJ_WEIGHTS_1) == digits[12]
        && cnpj_check_digit(&digits[..13], &CNPJ_WEIGHTS_2) == digits[13]
}

/// Validate a phone number with area code (DDD).
///
/// Landlines have 10 digits, mobiles 11 with a leading 9 after the area
/// code. Area codes range 11–99 and never contain a zero.
pub fn is_valid_phone(input: &str) -> bool {
    let digits = digits_of(input);
    let area_ok = digits.len() >= 2 && digits[0] != 0 && digits[1] != 0;
    match digits.len() {
        10 => area_ok,
        11 => area_ok && digits[2] == 9,
        _ => false,
    }
}

/// Validate a CEP (postal code): exactly eight digits.
pub fn is_valid_cep(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '.')
        && digits_of(trimmed).len() == 8
}

pub fn is_valid_email(input: &str) -> bool {
    EMAIL_RE
        .as_ref()
        .is_some_and(|re| re.is_match(input.trim()))
}

/// Contact fields of a lead, as typed by the user.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContactFields<'a> {
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub cpf: Option<&'a str>,
}

/// Check every present contact field and report all failures at once.
///
/// Empty strings are treated as absent.
pub fn validate_lead_contact(fields: ContactFields<'_>) -> GymResult<()> {
    fn present(value: Option<&str>) -> Option<&str> {
        value.map(str::trim).filter(|s| !s.is_empty())
    }

    let mut failures = Vec::new();
    if let Some(email) = present(fields.email)
        && !is_valid_email(email)
    {
        failures.push("email");
    }
    if let Some(phone) = present(fields.phone)
        && !is_valid_phone(phone)
    {
        failures.push("phone");
    }
    if let Some(cpf) = present(fields.cpf)
        && !is_valid_cpf(cpf)
    {
        failures.push("cpf");
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(GymError::validation(format!(
            "invalid {}",
            failures.join(", ")
        )))
    }
}

/// Normalise an optional document/phone field to digits, dropping empties.
pub fn normalize_digits(value: Option<String>) -> Option<String> {
    value.map(|v| only_digits(&v)).filter(|v| !v.is_empty())
}
