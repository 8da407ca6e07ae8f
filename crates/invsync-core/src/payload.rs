//! Mapping from a source [`ItemRecord`] to the storefront product payload.

use serde::Serialize;

use crate::items::{ItemRecord, SourceNumber};

/// Price sent when the source has no usable average cost.
pub const DEFAULT_PRICE: &str = "0.00";

/// Product body sent to the external catalog on create and update.
///
/// Field names follow the Shopify Admin REST product resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalProductPayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    pub variants: Vec<ExternalVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalVariant {
    pub price: String,
    pub inventory_quantity: SourceNumber,
}

/// Builds the external payload for `item`. Pure and total.
#[must_use]
pub fn map_item(item: &ItemRecord) -> ExternalProductPayload {
    let price = item
        .average_cost
        .raw_value()
        .map_or_else(|| DEFAULT_PRICE.to_owned(), str::to_owned);

    ExternalProductPayload {
        title: format!("{} - {}", item.internal_id, item.display_name),
        body_html: item.sales_description.clone(),
        variants: vec![ExternalVariant {
            price,
            inventory_quantity: item.quantity_available.clone(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn record(cost: SourceNumber, quantity: SourceNumber) -> ItemRecord {
        ItemRecord {
            internal_id: 742,
            item_code: "WID-742".to_owned(),
            display_name: "Blue Widget".to_owned(),
            sales_description: Some("<p>Sturdy</p>".to_owned()),
            quantity_available: quantity,
            average_cost: cost,
            external_product_id: None,
        }
    }

    #[test]
    fn price_defaults_when_cost_missing_or_not_numeric() {
        for cost in [
            SourceNumber::Absent,
            SourceNumber::Unparsable("abc".to_owned()),
        ] {
            let payload = map_item(&record(cost, SourceNumber::Absent));
            assert_eq!(payload.variants[0].price, DEFAULT_PRICE);
        }
    }

    #[test]
    fn numeric_cost_is_sent_unchanged() {
        for raw in ["5", "5.00", "0", "19.995"] {
            let payload = map_item(&record(
                SourceNumber::parse(Some(raw)),
                SourceNumber::Absent,
            ));
            assert_eq!(payload.variants[0].price, raw);
        }
    }

    #[test]
    fn unusual_numeric_cost_literals_are_sent_as_written() {
        for raw in [".5", "5.", "+5", "007", "12345678901234567890123456789012.5"] {
            let payload = map_item(&record(
                SourceNumber::parse(Some(raw)),
                SourceNumber::Absent,
            ));
            assert_eq!(payload.variants[0].price, raw);
        }
    }

    #[test]
    fn numeric_cost_is_trimmed_before_sending() {
        let payload = map_item(&record(
            SourceNumber::parse(Some("  4.20 ")),
            SourceNumber::Absent,
        ));
        assert_eq!(payload.variants[0].price, "4.20");
    }

    #[test]
    fn title_joins_internal_id_and_display_name() {
        let payload = map_item(&record(SourceNumber::Absent, SourceNumber::Absent));
        assert_eq!(payload.title, "742 - Blue Widget");
    }

    #[test]
    fn quantity_is_passed_through_even_when_not_positive() {
        let payload = map_item(&record(
            SourceNumber::Absent,
            SourceNumber::from(Decimal::new(-4, 0)),
        ));
        assert_eq!(
            payload.variants[0].inventory_quantity,
            SourceNumber::from(Decimal::new(-4, 0))
        );
    }

    #[test]
    fn payload_serializes_in_product_resource_shape() {
        let payload = map_item(&record(
            SourceNumber::parse(Some("12.50")),
            SourceNumber::parse(Some("3")),
        ));
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "742 - Blue Widget",
                "body_html": "<p>Sturdy</p>",
                "variants": [{ "price": "12.50", "inventory_quantity": 3 }]
            })
        );
    }

    #[test]
    fn missing_description_is_omitted() {
        let mut item = record(SourceNumber::Absent, SourceNumber::Absent);
        item.sales_description = None;
        let value = serde_json::to_value(map_item(&item)).unwrap();
        assert!(value.get("body_html").is_none());
        assert_eq!(value["variants"][0]["inventory_quantity"], json!(null));
    }
}
