//! Billing summary and GST report

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::Money;

use crate::invoice::{Invoice, InvoiceStatus};
use crate::quotation::{Quotation, QuotationStatus};
use crate::tax::{GstBreakdown, GstRate};

/// Dashboard figures over the invoices and quotations a principal can see
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSummary {
    pub total_revenue: Money,
    pub paid_amount: Money,
    pub pending_amount: Money,
    pub overdue_amount: Money,
    pub total_invoices: usize,
    pub paid_invoices: usize,
    pub pending_invoices: usize,
    pub overdue_invoices: usize,
    pub total_quotations: usize,
    /// Accepted, including those already converted
    pub accepted_quotations: usize,
    pub expired_quotations: usize,
    /// accepted / total × 100, two decimal places
    pub conversion_rate: Decimal,
}

impl BillingSummary {
    /// Cancelled invoices are left out of every invoice figure. An invoice
    /// past its due date counts as overdue on `today` even before a sweep
    /// has marked it.
    pub fn compute(invoices: &[Invoice], quotations: &[Quotation], today: NaiveDate) -> Self {
        let live: Vec<&Invoice> = invoices
            .iter()
            .filter(|invoice| invoice.status != InvoiceStatus::Cancelled)
            .collect();

        let mut summary = Self {
            total_revenue: live.iter().map(|i| i.total_amount).sum(),
            paid_amount: live.iter().map(|i| i.paid_amount).sum(),
            pending_amount: live.iter().map(|i| i.balance_amount).sum(),
            overdue_amount: Money::zero(),
            total_invoices: live.len(),
            paid_invoices: 0,
            pending_invoices: 0,
            overdue_invoices: 0,
            total_quotations: quotations.len(),
            accepted_quotations: 0,
            expired_quotations: 0,
            conversion_rate: Decimal::ZERO,
        };

        for invoice in &live {
            if invoice.status == InvoiceStatus::Paid {
                summary.paid_invoices += 1;
            } else if invoice.status == InvoiceStatus::Overdue || invoice.is_overdue_on(today) {
                summary.overdue_invoices += 1;
                summary.overdue_amount += invoice.balance_amount;
            } else {
                summary.pending_invoices += 1;
            }
        }

        for quotation in quotations {
            match quotation.status {
                QuotationStatus::Accepted | QuotationStatus::Converted => {
                    summary.accepted_quotations += 1
                }
                QuotationStatus::Expired => summary.expired_quotations += 1,
                _ => {}
            }
        }
        if summary.total_quotations > 0 {
            summary.conversion_rate = (Decimal::from(summary.accepted_quotations as u64) * dec!(100)
                / Decimal::from(summary.total_quotations as u64))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        }
        summary
    }
}

/// Taxable amount and GST collected at one rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateBreakdown {
    pub rate: GstRate,
    pub taxable_amount: Money,
    pub gst_amount: Money,
}

/// GST collected over invoices dated within a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub invoice_count: usize,
    /// Sum of invoice totals, tax included
    pub total_sales: Money,
    pub taxable_amount: Money,
    pub total_gst: Money,
    pub cgst_amount: Money,
    pub sgst_amount: Money,
    pub igst_amount: Money,
    /// One entry per rate that occurs, lowest rate first
    pub breakdown: Vec<RateBreakdown>,
}

impl GstReport {
    /// Builds the report for `from..=to`; cancelled invoices are excluded
    pub fn compute(invoices: &[Invoice], from: NaiveDate, to: NaiveDate) -> Self {
        let in_period: Vec<&Invoice> = invoices
            .iter()
            .filter(|i| i.status != InvoiceStatus::Cancelled)
            .filter(|i| i.invoice_date >= from && i.invoice_date <= to)
            .collect();

        let gst: GstBreakdown = in_period.iter().map(|i| i.gst).sum();
        let mut by_rate: BTreeMap<GstRate, (Money, Money)> = BTreeMap::new();
        for item in in_period.iter().flat_map(|i| i.items.iter()) {
            let entry = by_rate.entry(item.gst_rate).or_default();
            entry.0 += item.total;
            entry.1 += item.gst_amount;
        }

        Self {
            from,
            to,
            invoice_count: in_period.len(),
            total_sales: in_period.iter().map(|i| i.total_amount).sum(),
            taxable_amount: in_period.iter().map(|i| i.subtotal).sum(),
            total_gst: gst.total_gst,
            cgst_amount: gst.cgst,
            sgst_amount: gst.sgst,
            igst_amount: gst.igst,
            breakdown: by_rate
                .into_iter()
                .map(|(rate, (taxable, tax))| RateBreakdown {
                    rate,
                    taxable_amount: taxable.rounded(),
                    gst_amount: tax.rounded(),
                })
                .collect(),
        }
    }
}
