//! Brazilian mobile number (MSISDN) format heuristic.
//!
//! Tenants register with either the 12-digit form (55 + area code + 8-digit
//! subscriber) or the 13-digit form with the extra leading 9. When the
//! billing API rejects one form, the other is worth one try.

/// Toggle the 9th-digit form of a Brazilian MSISDN.
///
/// `55 82 9xxxx xxxx` (13 digits) drops the 9; `55 82 xxxx xxxx`
/// (12 digits) gains it. Anything else returns `None`.
pub fn adjust_msisdn(msisdn: &str) -> Option<String> {
    if !msisdn.chars().all(|c| c.is_ascii_digit()) || !msisdn.starts_with("55") {
        return None;
    }
    match msisdn.len() {
        13 if msisdn.as_bytes()[4] == b'9' => {
            Some(format!("{}{}", &msisdn[..4], &msisdn[5..]))
        }
        12 => Some(format!("{}9{}", &msisdn[..4], &msisdn[4..])),
        _ => None,
    }
}
