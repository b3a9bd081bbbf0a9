use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::order::model::ShipmentItem;

// ============================================================================
// Invoice Records
// ============================================================================
//
// Invoicing is a capability parallel to the order lifecycle, not a lifecycle
// state. Lines default from the vendor's shipment items and stay editable
// while the invoice is a draft; the number is assigned when the invoice is
// sent.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            other => Err(format!("unknown invoice status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub title: String,
    pub quantity: i32,
    /// Minor currency units.
    pub unit_price: i64,
}

impl From<ShipmentItem> for InvoiceLine {
    fn from(item: ShipmentItem) -> Self {
        Self {
            title: item.title,
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    /// Assigned when the invoice is sent, None while drafting.
    pub number: Option<i64>,
    pub status: InvoiceStatus,
    pub lines: Vec<InvoiceLine>,
    pub issued_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn total(&self) -> i64 {
        self.lines
            .iter()
            .map(|l| l.unit_price * i64::from(l.quantity))
            .sum()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_total_sums_lines() {
        let invoice = Invoice {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            number: None,
            status: InvoiceStatus::Draft,
            lines: vec![
                InvoiceLine {
                    title: "Ceramic mug".into(),
                    quantity: 2,
                    unit_price: 4_00,
                },
                InvoiceLine {
                    title: "Shipping".into(),
                    quantity: 1,
                    unit_price: 3_50,
                },
            ],
            issued_at: None,
            created_at: Utc::now(),
        };

        assert_eq!(invoice.total(), 11_50);
    }

    #[test]
    fn test_invoice_status_text_round_trip() {
        for status in [InvoiceStatus::Draft, InvoiceStatus::Sent] {
            let back: InvoiceStatus = status.as_str().parse().unwrap();
            assert_eq!(status, back);
        }
    }
}
