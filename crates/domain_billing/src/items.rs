//! Line items shared by quotations and invoices

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, QuotationItemId, ServiceId};

use crate::error::BillingError;
use crate::service::Service;
use crate::tax::{calculate_gst, GstBreakdown, GstRate};

/// A requested line: which service and how many
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub service_id: ServiceId,
    pub quantity: u32,
    pub description: Option<String>,
}

/// A priced line, copied from the catalog at the time it was added
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: QuotationItemId,
    pub service_id: ServiceId,
    pub service_name: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub hsn_code: String,
    pub gst_rate: GstRate,
    /// quantity × unit price
    pub total: Money,
    /// Full-precision GST on `total`
    pub gst_amount: Money,
}

impl LineItem {
    pub fn from_service(
        service: &Service,
        request: &LineItemRequest,
    ) -> Result<Self, BillingError> {
        if !service.is_active {
            return Err(BillingError::validation(format!(
                "Service {} is not active",
                service.name
            )));
        }
        if request.quantity == 0 {
            return Err(BillingError::validation("Quantity must be at least 1"));
        }

        let total = service.price * Decimal::from(request.quantity);
        Ok(Self {
            id: QuotationItemId::new_v7(),
            service_id: service.id,
            service_name: service.name.clone(),
            description: request
                .description
                .clone()
                .filter(|d| !d.trim().is_empty())
                .or_else(|| service.description.clone())
                .unwrap_or_else(|| service.name.clone()),
            quantity: request.quantity,
            unit_price: service.price,
            hsn_code: service.hsn_code.clone(),
            gst_rate: service.gst_rate,
            total,
            gst_amount: total.percent(service.gst_rate.as_decimal()),
        })
    }

    pub fn gst(&self, is_inter_state: bool) -> GstBreakdown {
        calculate_gst(self.total, self.gst_rate, is_inter_state)
    }
}

/// Document totals, rounded once from full-precision sums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillTotals {
    pub subtotal: Money,
    pub gst: GstBreakdown,
    pub total_amount: Money,
}

impl BillTotals {
    pub fn compute(items: &[LineItem], is_inter_state: bool) -> Self {
        let subtotal: Money = items.iter().map(|item| item.total).sum();
        let gst = items
            .iter()
            .map(|item| item.gst(is_inter_state))
            .fold(GstBreakdown::zero(is_inter_state), |acc, line| acc + line);

        Self {
            subtotal: subtotal.rounded(),
            gst: gst.rounded(),
            total_amount: (subtotal + gst.total_gst).rounded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{NewService, ServiceCategory};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn service(price: Decimal, rate: GstRate) -> Service {
        Service::create(
            NewService {
                name: "Knee brace".to_string(),
                category: ServiceCategory::Orthotics,
                price: Money::new(price),
                hsn_code: "9021".to_string(),
                gst_rate: rate,
                description: None,
                doctor_id: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn line(service: &Service, quantity: u32) -> LineItem {
        LineItem::from_service(
            service,
            &LineItemRequest {
                service_id: service.id,
                quantity,
                description: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_quotation_scenario_totals() {
        let a = service(dec!(500), GstRate::Eighteen);
        let b = service(dec!(600), GstRate::Eighteen);
        let items = vec![line(&a, 1), line(&b, 2)];

        let totals = BillTotals::compute(&items, false);
        assert_eq!(totals.subtotal, Money::new(dec!(1700)));
        assert_eq!(totals.gst.total_gst, Money::new(dec!(306)));
        assert_eq!(totals.gst.cgst, Money::new(dec!(153)));
        assert_eq!(totals.gst.sgst, Money::new(dec!(153)));
        assert_eq!(totals.total_amount, Money::new(dec!(2006)));
    }

    #[test]
    fn test_line_copies_catalog_fields() {
        let s = service(dec!(1250.50), GstRate::Twelve);
        let item = line(&s, 3);
        assert_eq!(item.unit_price, s.price);
        assert_eq!(item.total, Money::new(dec!(3751.50)));
        assert_eq!(item.gst_amount, Money::new(dec!(450.18)));
        assert_eq!(item.description, "Knee brace");
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let s = service(dec!(100), GstRate::Five);
        let request = LineItemRequest {
            service_id: s.id,
            quantity: 0,
            description: None,
        };
        assert!(LineItem::from_service(&s, &request).is_err());
    }

    #[test]
    fn test_odd_paisa_split_keeps_total() {
        let s = service(dec!(1), GstRate::Five);
        let totals = BillTotals::compute(&[line(&s, 1)], false);
        assert_eq!(totals.gst.total_gst, Money::new(dec!(0.05)));
        assert_eq!(totals.gst.cgst, Money::new(dec!(0.03)));
        assert_eq!(totals.gst.sgst, Money::new(dec!(0.02)));
        assert_eq!(totals.gst.cgst + totals.gst.sgst, totals.gst.total_gst);
        assert_eq!(totals.total_amount, Money::new(dec!(1.05)));
    }

    #[test]
    fn test_gst_sum_rounds_once() {
        let a = service(dec!(0.35), GstRate::Five);
        let items = vec![line(&a, 1), line(&a, 1), line(&a, 1)];
        // 0.0175 per line; per-line rounding would give 0.06
        let totals = BillTotals::compute(&items, true);
        assert_eq!(totals.gst.igst, Money::new(dec!(0.05)));
    }
}
