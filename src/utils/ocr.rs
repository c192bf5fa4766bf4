//! Parseo de montos sobre texto OCR de comprobantes
//!
//! El texto llega del motor OCR externo con las confusiones típicas
//! (O por 0, l/I por 1) y montos en formato LATAM o US. Se elige el
//! candidato más grande porque el total suele ser la cifra mayor del
//! comprobante.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

lazy_static! {
    // Captura: $1.250.000 | $50.000 | 1,250,000 | 1250000 | $1.250,50
    static ref AMOUNT_RE: Regex =
        Regex::new(r"\$?\s?\d{1,3}(?:[.,]\d{3})*(?:[.,]\d{1,2})?|\d{4,}").unwrap();
    static ref SPACES_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Extraer el monto más plausible de un texto OCR. None si no hay candidato.
pub fn parse_amount_from_text(text: &str) -> Option<Decimal> {
    if text.trim().is_empty() {
        return None;
    }

    let normalized = SPACES_RE
        .replace_all(text, " ")
        .replace(['O', 'o'], "0")
        .replace(['l', 'I'], "1");

    let mut best: Option<Decimal> = None;

    for m in AMOUNT_RE.find_iter(&normalized) {
        let cleaned: String = m
            .as_str()
            .chars()
            .filter(|c| *c != ' ' && *c != '$')
            .collect();

        let Some(num) = interpret_number(&cleaned) else {
            continue;
        };

        if num > Decimal::ZERO && best.map_or(true, |b| num > b) {
            best = Some(num);
        }
    }

    best
}

/// Decidir si puntos y comas son separadores de miles o decimales.
fn interpret_number(cleaned: &str) -> Option<Decimal> {
    let dot_count = cleaned.matches('.').count();
    let comma_count = cleaned.matches(',').count();

    let canonical = if dot_count > 1 {
        // Formato LATAM: 1.250.000 o 1.250.000,50
        cleaned.replace('.', "").replace(',', ".")
    } else if comma_count > 1 {
        // Formato US: 1,250,000
        cleaned.replace(',', "")
    } else if dot_count == 1 && comma_count == 1 {
        let dot_idx = cleaned.find('.')?;
        let comma_idx = cleaned.find(',')?;
        if dot_idx < comma_idx {
            // 1.250,50 -> LATAM
            cleaned.replace('.', "").replace(',', ".")
        } else {
            // 1,250.50 -> US
            cleaned.replace(',', "")
        }
    } else if comma_count == 1 {
        // Puede ser 1,50 (decimal) o 1,250 (miles LATAM)
        let after_comma = cleaned.split(',').nth(1)?;
        if after_comma.len() == 3 {
            cleaned.replace(',', "")
        } else {
            cleaned.replace(',', ".")
        }
    } else if dot_count == 1 {
        // Misma ambigüedad con punto: 50.000 son miles, 50.5 es decimal
        let after_dot = cleaned.split('.').nth(1)?;
        if after_dot.len() == 3 {
            cleaned.replace('.', "")
        } else {
            cleaned.to_string()
        }
    } else {
        cleaned.to_string()
    };

    Decimal::from_str(&canonical).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_latam_thousands() {
        assert_eq!(parse_amount_from_text("TOTAL $1.250.000"), Some(dec("1250000")));
    }

    #[test]
    fn test_latam_with_decimals() {
        assert_eq!(parse_amount_from_text("$1.250,50"), Some(dec("1250.50")));
    }

    #[test]
    fn test_us_thousands() {
        assert_eq!(parse_amount_from_text("paid 1,250,000 today"), Some(dec("1250000")));
    }

    #[test]
    fn test_plain_number() {
        assert_eq!(parse_amount_from_text("abono 150"), Some(dec("150")));
    }

    #[test]
    fn test_ocr_glyph_confusions() {
        // O -> 0: "5O.OOO" debe leerse como 50.000
        assert_eq!(parse_amount_from_text("TOTAL $5O.OOO"), Some(dec("50000")));
    }

    #[test]
    fn test_picks_largest_candidate() {
        let text = "Cuenta 123 Valor $300.000 Propina $30.000";
        assert_eq!(parse_amount_from_text(text), Some(dec("300000")));
    }

    #[test]
    fn test_no_amount() {
        assert_eq!(parse_amount_from_text("sin numeros aqui"), None);
        assert_eq!(parse_amount_from_text(""), None);
    }
}
