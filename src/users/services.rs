use serde_json::{Map, Value};
use uuid::Uuid;

use super::dto::AddPaymentMethodRequest;
use crate::{auth::repo_types::PaymentMethod, error::ApiError};

pub(crate) fn card_brand(digits: &str) -> &'static str {
    if digits.starts_with('4') {
        "visa"
    } else if digits.starts_with("34") || digits.starts_with("37") {
        "amex"
    } else if digits.starts_with('5') || digits.starts_with('2') {
        "mastercard"
    } else if digits.starts_with('6') {
        "discover"
    } else {
        "card"
    }
}

/// Validates the card and reduces it to a storable descriptor.
pub(crate) fn build_payment_method(
    req: &AddPaymentMethodRequest,
    current_year: u16,
) -> Result<PaymentMethod, ApiError> {
    let digits: String = req
        .card_number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if !(12..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::bad_request("Invalid card number"));
    }
    if !(1..=12).contains(&req.exp_month) || req.exp_year < current_year {
        return Err(ApiError::bad_request("Invalid card expiry"));
    }
    if req.holder_name.trim().is_empty() {
        return Err(ApiError::bad_request("Card holder name is required"));
    }
    Ok(PaymentMethod {
        id: Uuid::new_v4(),
        brand: card_brand(&digits).to_string(),
        last4: digits[digits.len() - 4..].to_string(),
        exp_month: req.exp_month,
        exp_year: req.exp_year,
        holder_name: req.holder_name.trim().to_string(),
        is_default: req.make_default,
    })
}

/// The first card added becomes default; a new default clears the old one.
pub(crate) fn add_method(methods: &mut Vec<PaymentMethod>, mut method: PaymentMethod) {
    if methods.is_empty() {
        method.is_default = true;
    }
    if method.is_default {
        for m in methods.iter_mut() {
            m.is_default = false;
        }
    }
    methods.push(method);
}

/// Removing the default promotes the first remaining card.
pub(crate) fn remove_method(methods: &mut Vec<PaymentMethod>, id: Uuid) -> bool {
    let Some(pos) = methods.iter().position(|m| m.id == id) else {
        return false;
    };
    let removed = methods.remove(pos);
    if removed.is_default {
        if let Some(first) = methods.first_mut() {
            first.is_default = true;
        }
    }
    true
}

pub(crate) fn set_default_method(methods: &mut [PaymentMethod], id: Uuid) -> bool {
    if !methods.iter().any(|m| m.id == id) {
        return false;
    }
    for m in methods.iter_mut() {
        m.is_default = m.id == id;
    }
    true
}

/// Shallow merge; a `null` value removes the key.
pub(crate) fn merge_preferences(current: &Value, patch: Map<String, Value>) -> Value {
    let mut merged = current.as_object().cloned().unwrap_or_default();
    for (k, v) in patch {
        if v.is_null() {
            merged.remove(&k);
        } else {
            merged.insert(k, v);
        }
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn req(number: &str) -> AddPaymentMethodRequest {
        AddPaymentMethodRequest {
            card_number: number.into(),
            exp_month: 8,
            exp_year: 2030,
            holder_name: "Ada Lovelace".into(),
            make_default: false,
        }
    }

    #[test]
    fn keeps_only_last_four_digits() {
        let pm = build_payment_method(&req("4242 4242 4242 4242"), 2026).unwrap();
        assert_eq!(pm.last4, "4242");
        assert_eq!(pm.brand, "visa");
        let json = serde_json::to_string(&pm).unwrap();
        assert!(!json.contains("424242"));
    }

    #[test]
    fn rejects_bad_numbers_and_expired_cards() {
        assert!(build_payment_method(&req("1234"), 2026).is_err());
        assert!(build_payment_method(&req("4242-4242-4242-424x"), 2026).is_err());
        let mut expired = req("5555555555554444");
        expired.exp_year = 2020;
        assert!(build_payment_method(&expired, 2026).is_err());
    }

    #[test]
    fn first_card_becomes_default_and_removal_promotes() {
        let mut methods = Vec::new();
        let a = build_payment_method(&req("4111111111111111"), 2026).unwrap();
        let b = build_payment_method(&req("5555555555554444"), 2026).unwrap();
        let (a_id, b_id) = (a.id, b.id);
        add_method(&mut methods, a);
        add_method(&mut methods, b);
        assert!(methods[0].is_default);
        assert!(!methods[1].is_default);

        assert!(remove_method(&mut methods, a_id));
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].id, b_id);
        assert!(methods[0].is_default);
        assert!(!remove_method(&mut methods, a_id));
    }

    #[test]
    fn set_default_is_exclusive() {
        let mut methods = Vec::new();
        for n in ["4111111111111111", "5555555555554444", "378282246310005"] {
            add_method(&mut methods, build_payment_method(&req(n), 2026).unwrap());
        }
        let third = methods[2].id;
        assert!(set_default_method(&mut methods, third));
        assert_eq!(methods.iter().filter(|m| m.is_default).count(), 1);
        assert!(methods[2].is_default);
        assert_eq!(methods[2].brand, "amex");
        assert!(!set_default_method(&mut methods, Uuid::new_v4()));
    }

    #[test]
    fn preferences_merge_and_delete() {
        let current = json!({"preferred_currency": "USD", "newsletter": true});
        let patch = json!({"preferred_currency": "EUR", "newsletter": null, "seat": "aisle"});
        let merged = merge_preferences(&current, patch.as_object().unwrap().clone());
        assert_eq!(merged, json!({"preferred_currency": "EUR", "seat": "aisle"}));
    }
}
