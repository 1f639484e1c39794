//! Per-field normalisation rules
//!
//! Every function here is total: unparsable input falls back to a default
//! instead of failing. The only fallible rule is [`year`], whose failure
//! rejects the whole article.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

static MANUFACTURER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([\w-]+)\s").unwrap());
static LEADING_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)").unwrap());

pub const UNKNOWN: &str = "Unknown";
pub const DEFAULT_FUEL: &str = "benzyna";
pub const DEFAULT_ENGINE_CAPACITY: &str = "50 cm3";

/// Price qualifier flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceQualifiers {
    pub brutto: bool,
    pub netto: bool,
    pub negotiation: bool,
    pub vat_invoice: bool,
}

/// Collapses whitespace runs into `separator` and lowercases
pub fn collapse(text: &str, separator: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(separator)
        .to_lowercase()
}

/// Splits a listing title into `(name, manufacturer)`
///
/// The first token is the manufacturer when it is followed by more text.
pub fn name_and_manufacturer(raw: Option<&str>) -> (String, String) {
    let name = collapse(raw.unwrap_or_default(), " ");

    let manufacturer = MANUFACTURER
        .captures(&name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    match manufacturer {
        Some(manufacturer) => {
            let rest = name[manufacturer.len()..].trim_start().to_string();
            (rest, manufacturer)
        }
        None => (name, UNKNOWN.to_string()),
    }
}

/// Parses the integer part of a price into a two-digit fixed-point decimal
pub fn price(raw: Option<&str>) -> Decimal {
    let compact: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let integral = compact.split(',').next().unwrap_or_default();

    let mut value = Decimal::from_str(integral).unwrap_or(Decimal::ZERO);
    value.rescale(2);
    value
}

pub fn currency(raw: Option<&str>) -> String {
    collapse(raw.unwrap_or_default(), " ")
}

/// Splits the qualifier text into whitespace-free tokens
///
/// Missing text is read as a gross price.
pub fn qualifier_tokens(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(text) => collapse(text, "").split(',').map(str::to_string).collect(),
        None => vec!["brutto".to_string()],
    }
}

pub fn qualifiers(tokens: &[String]) -> PriceQualifiers {
    let any = |needle: &str| tokens.iter().any(|t| t.contains(needle));
    PriceQualifiers {
        brutto: any("brutto"),
        netto: any("netto"),
        negotiation: any("negocjacji"),
        vat_invoice: any("vat"),
    }
}

/// Reads a four-digit production year from free text
pub fn year(raw: Option<&str>) -> Option<i32> {
    let digits: String = raw?.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 4 {
        return None;
    }
    digits.parse().ok()
}

/// Parses a mileage such as `"125 000 km"`; unparsable values become zero
pub fn mileage(raw: Option<&str>) -> i64 {
    let compact: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let count = compact.chars().count();
    if count < 2 {
        return 0;
    }
    let number: String = compact.chars().take(count - 2).collect();
    number.parse().unwrap_or(0)
}

/// Converts a displacement in cm3 to litres, rounded up to one decimal
pub fn engine_capacity(raw: Option<&str>) -> f64 {
    let text = raw
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_ENGINE_CAPACITY);
    let cm3 = cubic_centimetres(text)
        .or_else(|| cubic_centimetres(DEFAULT_ENGINE_CAPACITY))
        .unwrap_or(50);

    // Ceiling to tenths of a litre
    let tenths = cm3.div_ceil(100);
    tenths as f64 / 10.0
}

fn cubic_centimetres(text: &str) -> Option<u64> {
    let compact = collapse(text, "");
    LEADING_DIGITS
        .captures(&compact)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn fuel_type(raw: Option<&str>) -> String {
    match raw {
        Some(text) => collapse(text, ""),
        None => DEFAULT_FUEL.to_string(),
    }
}

pub fn location(raw: Option<&str>) -> String {
    let location = collapse(raw.unwrap_or_default(), " ");
    if location.is_empty() {
        UNKNOWN.to_string()
    } else {
        location
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_with_manufacturer() {
        let (name, manufacturer) = name_and_manufacturer(Some("  Audi   A4 \n Avant "));
        assert_eq!(manufacturer, "audi");
        assert_eq!(name, "a4 avant");
    }

    #[test]
    fn test_hyphenated_manufacturer() {
        let (name, manufacturer) = name_and_manufacturer(Some("Mercedes-Benz C 220"));
        assert_eq!(manufacturer, "mercedes-benz");
        assert_eq!(name, "c 220");
    }

    #[test]
    fn test_manufacturer_repeated_in_name() {
        let (name, manufacturer) = name_and_manufacturer(Some("Mini Cooper Mini"));
        assert_eq!(manufacturer, "mini");
        assert_eq!(name, "cooper mini");
    }

    #[test]
    fn test_single_word_name() {
        let (name, manufacturer) = name_and_manufacturer(Some("Trabant"));
        assert_eq!(manufacturer, UNKNOWN);
        assert_eq!(name, "trabant");
    }

    #[test]
    fn test_price_with_spaces() {
        let value = price(Some("12 900"));
        assert_eq!(value, Decimal::from_str("12900.00").unwrap());
        assert_eq!(value.to_string(), "12900.00");
    }

    #[test]
    fn test_price_drops_fraction_after_comma() {
        assert_eq!(price(Some("12 900,50")).to_string(), "12900.00");
    }

    #[test]
    fn test_price_fallback() {
        assert_eq!(price(Some("bad")).to_string(), "0.00");
        assert_eq!(price(None).to_string(), "0.00");
    }

    #[test]
    fn test_currency() {
        assert_eq!(currency(Some("  PLN ")), "pln");
        assert_eq!(currency(None), "");
    }

    #[test]
    fn test_qualifier_parsing() {
        let tokens = qualifier_tokens(Some("Brutto, Możliwość negocjacji"));
        let flags = qualifiers(&tokens);
        assert_eq!(
            flags,
            PriceQualifiers {
                brutto: true,
                netto: false,
                negotiation: true,
                vat_invoice: false,
            }
        );
    }

    #[test]
    fn test_qualifier_netto_with_invoice() {
        let flags = qualifiers(&qualifier_tokens(Some("Netto, Faktura VAT")));
        assert!(flags.netto);
        assert!(flags.vat_invoice);
        assert!(!flags.brutto);
    }

    #[test]
    fn test_missing_qualifiers_default_to_brutto() {
        let tokens = qualifier_tokens(None);
        assert_eq!(tokens, vec!["brutto".to_string()]);
        assert!(qualifiers(&tokens).brutto);
    }

    #[test]
    fn test_year() {
        assert_eq!(year(Some(" 2011 ")), Some(2011));
        assert_eq!(year(Some("rok 2008")), Some(2008));
        assert_eq!(year(Some("08")), None);
        assert_eq!(year(None), None);
    }

    #[test]
    fn test_mileage() {
        assert_eq!(mileage(Some("125 000 km")), 125_000);
        assert_eq!(mileage(Some("7km")), 7);
        assert_eq!(mileage(Some("unknown")), 0);
        assert_eq!(mileage(None), 0);
    }

    #[test]
    fn test_engine_capacity_rounds_up() {
        assert_eq!(engine_capacity(Some("1450 cm3")), 1.5);
        assert_eq!(engine_capacity(Some("1 000 cm3")), 1.0);
        assert_eq!(engine_capacity(Some("1100 cm3")), 1.1);
        assert_eq!(engine_capacity(Some("1998 cm3")), 2.0);
    }

    #[test]
    fn test_engine_capacity_huge_displacement() {
        let litres = engine_capacity(Some("18446744073709551615 cm3"));
        assert!(litres.is_finite());
        assert!(litres > 1.0e15);
    }

    #[test]
    fn test_engine_capacity_default() {
        assert_eq!(engine_capacity(None), 0.1);
        assert_eq!(engine_capacity(Some("  ")), 0.1);
        assert_eq!(engine_capacity(Some("electric")), 0.1);
    }

    #[test]
    fn test_fuel_type() {
        assert_eq!(fuel_type(Some(" Diesel ")), "diesel");
        assert_eq!(fuel_type(Some("Benzyna + LPG")), "benzyna+lpg");
        assert_eq!(fuel_type(None), DEFAULT_FUEL);
    }

    #[test]
    fn test_location() {
        assert_eq!(location(Some(" Warszawa  Mazowieckie ")), "warszawa mazowieckie");
        assert_eq!(location(Some("")), UNKNOWN);
        assert_eq!(location(None), UNKNOWN);
    }
}
