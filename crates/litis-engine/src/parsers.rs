//! Value parsers: text to typed values
//!
//! Every parser is total and side-effect-free: malformed or absent input
//! yields `None`, never a panic or an error. The catalog selects one
//! parser per field; candidates whose chunk text does not parse are
//! discarded by the collector.

use chrono::NaiveDate;
use litis_domain::NormalizedValue;
use regex::Regex;
use std::sync::LazyLock;

static MONEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$?\s?(\d{1,3}(?:,\d{3})*(?:\.\d{2})?)").unwrap());

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d{1,2})\s+(?:de\s+)?(enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|octubre|noviembre|diciembre)\s+(?:de\s+)?(\d{4})|(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})",
    )
    .unwrap()
});

/// Maximum length of a captured excerpt line
const EXCERPT_CAP: usize = 120;

/// A successfully parsed value: the raw matched text plus its typed form.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedValue {
    /// The substring the parser matched
    pub raw: String,
    /// The normalized, typed payload
    pub value: NormalizedValue,
}

/// The closed set of parser strategies the catalog can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueParser {
    /// Decimal amount, optionally `$`-prefixed, thousands separators
    Money,
    /// `D de <mes> de YYYY` or `D/M/Y`; two-digit years are 2000s
    Date,
    /// Contract modality by keyword presence
    ContractType,
    /// First non-empty line, capped
    Excerpt,
}

impl ValueParser {
    /// Parse `text`, returning `None` when no confident match exists.
    pub fn parse(&self, text: &str) -> Option<ParsedValue> {
        match self {
            ValueParser::Money => parse_money(text),
            ValueParser::Date => parse_date(text),
            ValueParser::ContractType => parse_contract_type(text),
            ValueParser::Excerpt => parse_excerpt(text),
        }
    }
}

fn parse_money(text: &str) -> Option<ParsedValue> {
    let captures = MONEY_RE.captures(text)?;
    let raw = captures.get(1)?.as_str();
    let amount: f64 = raw.replace(',', "").parse().ok()?;
    Some(ParsedValue {
        raw: raw.to_string(),
        value: NormalizedValue::Money {
            amount,
            currency: "MXN".to_string(),
        },
    })
}

fn month_number(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "enero" => Some(1),
        "febrero" => Some(2),
        "marzo" => Some(3),
        "abril" => Some(4),
        "mayo" => Some(5),
        "junio" => Some(6),
        "julio" => Some(7),
        "agosto" => Some(8),
        "septiembre" => Some(9),
        "octubre" => Some(10),
        "noviembre" => Some(11),
        "diciembre" => Some(12),
        _ => None,
    }
}

fn parse_date(text: &str) -> Option<ParsedValue> {
    let captures = DATE_RE.captures(text)?;
    let raw = captures.get(0)?.as_str().to_string();

    let date = if let Some(month_name) = captures.get(2) {
        // "12 de enero de 2022"
        let day: u32 = captures.get(1)?.as_str().parse().ok()?;
        let month = month_number(month_name.as_str())?;
        let year: i32 = captures.get(3)?.as_str().parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)?
    } else {
        // "12/01/2022" or "12-01-22"
        let day: u32 = captures.get(4)?.as_str().parse().ok()?;
        let month: u32 = captures.get(5)?.as_str().parse().ok()?;
        let year_str = captures.get(6)?.as_str();
        let mut year: i32 = year_str.parse().ok()?;
        if year_str.len() == 2 {
            year += 2000;
        }
        NaiveDate::from_ymd_opt(year, month, day)?
    };

    Some(ParsedValue {
        raw,
        value: NormalizedValue::Date { iso_date: date },
    })
}

fn parse_contract_type(text: &str) -> Option<ParsedValue> {
    let content = text.to_lowercase();
    // "indeterminado" must be checked before its substring "determinado".
    let (raw, label) = if content.contains("indeterminado") {
        ("indeterminado", "INDETERMINADO")
    } else if content.contains("determinado") {
        ("determinado", "DETERMINADO")
    } else if content.contains("periodo de prueba") || content.contains("prueba") {
        ("prueba", "PRUEBA")
    } else {
        return None;
    };
    Some(ParsedValue {
        raw: raw.to_string(),
        value: NormalizedValue::ContractType {
            contract_type: label.to_string(),
        },
    })
}

fn parse_excerpt(text: &str) -> Option<ParsedValue> {
    let line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    let capped: String = line.chars().take(EXCERPT_CAP).collect();
    Some(ParsedValue {
        raw: capped.clone(),
        value: NormalizedValue::Excerpt { excerpt: capped },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_with_prefix_and_separators() {
        let parsed = ValueParser::Money
            .parse("Percibe un salario de $12,345.67 mensuales")
            .unwrap();
        assert_eq!(parsed.raw, "12,345.67");
        assert_eq!(
            parsed.value,
            NormalizedValue::Money {
                amount: 12345.67,
                currency: "MXN".to_string()
            }
        );
    }

    #[test]
    fn test_money_plain_amount() {
        let parsed = ValueParser::Money.parse("cuota diaria 210.00 pesos").unwrap();
        assert_eq!(parsed.value.amount(), Some(210.0));
    }

    #[test]
    fn test_money_no_match() {
        assert!(ValueParser::Money.parse("sin cantidades aqui").is_none());
        assert!(ValueParser::Money.parse("").is_none());
    }

    #[test]
    fn test_date_spanish_form() {
        let parsed = ValueParser::Date
            .parse("con fecha de ingreso 15 de marzo de 2021")
            .unwrap();
        assert_eq!(parsed.raw, "15 de marzo de 2021");
        assert_eq!(
            parsed.value,
            NormalizedValue::Date {
                iso_date: NaiveDate::from_ymd_opt(2021, 3, 15).unwrap()
            }
        );
    }

    #[test]
    fn test_date_numeric_form() {
        let parsed = ValueParser::Date.parse("ingreso: 01/02/2022").unwrap();
        assert_eq!(
            parsed.value,
            NormalizedValue::Date {
                iso_date: NaiveDate::from_ymd_opt(2022, 2, 1).unwrap()
            }
        );
    }

    #[test]
    fn test_date_two_digit_year_is_2000s() {
        let parsed = ValueParser::Date.parse("alta el 5/6/19").unwrap();
        assert_eq!(
            parsed.value,
            NormalizedValue::Date {
                iso_date: NaiveDate::from_ymd_opt(2019, 6, 5).unwrap()
            }
        );
    }

    #[test]
    fn test_date_impossible_calendar_date() {
        assert!(ValueParser::Date.parse("el 31/02/2022").is_none());
        assert!(ValueParser::Date.parse("45 de enero de 2022").is_none());
    }

    #[test]
    fn test_date_no_match() {
        assert!(ValueParser::Date.parse("sin fechas").is_none());
    }

    #[test]
    fn test_contract_type_indeterminado_wins_over_substring() {
        let parsed = ValueParser::ContractType
            .parse("Contrato por tiempo INDETERMINADO")
            .unwrap();
        assert_eq!(
            parsed.value,
            NormalizedValue::ContractType {
                contract_type: "INDETERMINADO".to_string()
            }
        );
    }

    #[test]
    fn test_contract_type_determinado_and_prueba() {
        let determinado = ValueParser::ContractType
            .parse("contrato por tiempo determinado")
            .unwrap();
        assert_eq!(
            determinado.value,
            NormalizedValue::ContractType {
                contract_type: "DETERMINADO".to_string()
            }
        );
        let prueba = ValueParser::ContractType
            .parse("sujeto a periodo de prueba")
            .unwrap();
        assert_eq!(
            prueba.value,
            NormalizedValue::ContractType {
                contract_type: "PRUEBA".to_string()
            }
        );
    }

    #[test]
    fn test_contract_type_no_match() {
        assert!(ValueParser::ContractType.parse("sin tipo").is_none());
    }

    #[test]
    fn test_excerpt_first_non_empty_line() {
        let parsed = ValueParser::Excerpt
            .parse("\n\n  Gerente de Operaciones  \nsegunda linea")
            .unwrap();
        assert_eq!(parsed.raw, "Gerente de Operaciones");
    }

    #[test]
    fn test_excerpt_caps_length() {
        let long = "x".repeat(500);
        let parsed = ValueParser::Excerpt.parse(&long).unwrap();
        assert_eq!(parsed.raw.chars().count(), 120);
    }

    #[test]
    fn test_excerpt_empty_input() {
        assert!(ValueParser::Excerpt.parse("").is_none());
        assert!(ValueParser::Excerpt.parse("  \n \n ").is_none());
    }
}
