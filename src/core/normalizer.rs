use crate::domain::model::{CanonicalTicket, FieldValue, RawRecord, TicketInput};
use crate::utils::error::Result;

// 各欄位可接受的原始鍵名，依優先順序排列
pub const CODE_ALIASES: &[&str] = &[
    "ticket_code",
    "code",
    "code_ticket",
    "code_billet",
    "billet_code",
];
pub const EVENT_ID_ALIASES: &[&str] = &["event_id", "eventid", "idevent", "id_event", "event"];
pub const USER_ID_ALIASES: &[&str] = &["user_id", "id_user", "uid", "u_id", "id"];
pub const FIRST_NAME_ALIASES: &[&str] = &[
    "user_first_name",
    "firstname",
    "first_name",
    "prenom",
    "name",
];
pub const LAST_NAME_ALIASES: &[&str] = &["user_last_name", "lastname", "last_name", "nom"];
pub const TICKET_TYPE_ALIASES: &[&str] = &[
    "ticket_type",
    "type_ticket",
    "tickettype",
    "typeticket",
    "type",
    "type_billet",
    "billet_type",
    "typebillet",
    "billettype",
];
pub const TICKET_PRICE_ALIASES: &[&str] = &[
    "ticket_price",
    "price_ticket",
    "price",
    "ticketprice",
    "priceticket",
    "prix",
    "billet_prix",
    "prix_billet",
    "billetprix",
    "prixbillet",
];
pub const BUY_DATE_ALIASES: &[&str] = &[
    "ticket_buy_date",
    "ticket_buy",
    "ticketbuydate",
    "buy_date",
    "buydate",
    "date_buy",
    "date_achat",
    "date_achat_billet",
];
pub const VALIDATION_LINK_ALIASES: &[&str] = &[
    "link_validation",
    "link",
    "lien_validation",
    "validation",
    "lien",
    "validation_lien",
    "lienvalidation",
    "valid",
    "validation_link",
];

/// 將原始紀錄對應到標準票券欄位
///
/// 每個欄位取別名清單中第一個出現的鍵，後面的別名不會覆寫；
/// 沒有任何別名時為 [`FieldValue::Missing`]
pub fn normalize(raw: &RawRecord) -> CanonicalTicket {
    CanonicalTicket {
        code: resolve(raw, CODE_ALIASES),
        event_id: resolve(raw, EVENT_ID_ALIASES),
        user_first_name: resolve(raw, FIRST_NAME_ALIASES),
        user_last_name: resolve(raw, LAST_NAME_ALIASES),
        ticket_type: match resolve(raw, TICKET_TYPE_ALIASES) {
            FieldValue::Value(value) => FieldValue::Value(value.to_uppercase()),
            FieldValue::Missing => FieldValue::Missing,
        },
        ticket_price: resolve(raw, TICKET_PRICE_ALIASES),
        buy_date: resolve(raw, BUY_DATE_ALIASES),
        validation_link: resolve(raw, VALIDATION_LINK_ALIASES),
        user_id: resolve(raw, USER_ID_ALIASES),
    }
}

/// 正規化 JSON 值，非物件時回傳 `NormalizationError`
pub fn normalize_json(value: serde_json::Value) -> Result<CanonicalTicket> {
    RawRecord::from_json(value).map(|raw| normalize(&raw))
}

/// 已是標準票券的輸入原樣通過
pub fn normalize_input(input: TicketInput) -> CanonicalTicket {
    match input {
        TicketInput::Raw(raw) => normalize(&raw),
        TicketInput::Canonical(ticket) => ticket,
    }
}

fn resolve(raw: &RawRecord, aliases: &[&str]) -> FieldValue {
    aliases
        .iter()
        .find_map(|alias| raw.get(alias))
        .map(|value| FieldValue::Value(value.to_string()))
        .unwrap_or(FieldValue::Missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::TicketError;
    use serde_json::json;

    #[test]
    fn test_single_alias_per_field() {
        let raw: RawRecord = [
            ("code_billet", "A1"),
            ("idevent", "42"),
            ("prenom", "Ada"),
            ("nom", "Lovelace"),
            ("type", "vip"),
            ("prix", "25"),
            ("date_achat", "2026-10-01"),
            ("lien", "https://example.com/v/A1"),
        ]
        .into_iter()
        .collect();

        let ticket = normalize(&raw);
        assert_eq!(ticket.code, FieldValue::from("A1"));
        assert_eq!(ticket.event_id, FieldValue::from("42"));
        assert_eq!(ticket.user_first_name, FieldValue::from("Ada"));
        assert_eq!(ticket.user_last_name, FieldValue::from("Lovelace"));
        assert_eq!(ticket.ticket_type, FieldValue::from("VIP"));
        assert_eq!(ticket.ticket_price, FieldValue::from("25"));
        assert_eq!(ticket.buy_date, FieldValue::from("2026-10-01"));
        assert_eq!(
            ticket.validation_link,
            FieldValue::from("https://example.com/v/A1")
        );
        assert_eq!(ticket.user_id, FieldValue::Missing);
    }

    #[test]
    fn test_unmatched_fields_are_missing() {
        let raw = RawRecord::new().with("code", "A1").with("colour", "red");
        let ticket = normalize(&raw);

        assert_eq!(ticket.code(), Some("A1"));
        assert!(ticket.event_id.is_missing());
        assert!(ticket.user_first_name.is_missing());
        assert!(ticket.user_last_name.is_missing());
        assert!(ticket.ticket_type.is_missing());
        assert!(ticket.ticket_price.is_missing());
        assert!(ticket.buy_date.is_missing());
        assert!(ticket.validation_link.is_missing());
    }

    #[test]
    fn test_first_declared_alias_wins() {
        // billet_code 在別名清單最後，ticket_code 最前
        let raw = RawRecord::new()
            .with("billet_code", "LATE")
            .with("ticket_code", "EARLY")
            .with("code", "MIDDLE");
        assert_eq!(normalize(&raw).code(), Some("EARLY"));

        let raw = RawRecord::new()
            .with("validation_link", "https://late.example.com")
            .with("link", "https://early.example.com");
        assert_eq!(
            normalize(&raw).validation_link,
            FieldValue::from("https://early.example.com")
        );
    }

    #[test]
    fn test_empty_value_is_kept_as_value() {
        let raw = RawRecord::new().with("code", "");
        let ticket = normalize(&raw);
        assert_eq!(ticket.code, FieldValue::from(""));
        assert_eq!(ticket.code(), None);
    }

    #[test]
    fn test_normalize_json_rejects_scalars() {
        let err = normalize_json(json!(12)).unwrap_err();
        assert!(matches!(err, TicketError::NormalizationError { .. }));

        let ticket = normalize_json(json!({"code": "A1", "type": "standard"})).unwrap();
        assert_eq!(ticket.ticket_type, FieldValue::from("STANDARD"));
    }

    #[test]
    fn test_canonical_input_passes_through() {
        let ticket = CanonicalTicket {
            code: "A1".into(),
            ticket_type: "mixedCase".into(),
            ..Default::default()
        };
        assert_eq!(normalize_input(ticket.clone().into()), ticket);
    }
}
