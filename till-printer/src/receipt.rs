//! Receipt renderer
//!
//! Renders order data into a fixed-width text layout for 80mm paper.
//! The output is plain text with CRLF line endings; serial printers get it
//! wrapped by [`crate::escpos::encode`], spooler queues get it as-is.

use chrono::{Local, NaiveDateTime};

use crate::config::PrinterConfig;
use crate::text::{center, line_lr, pad, text_width, truncate, wrap};
use crate::types::{LineItem, OrderSnapshot, ShopInfo};

/// Characters per line on 80mm paper
pub const RECEIPT_WIDTH: usize = 48;

const NAME_COL: usize = 20;
const QTY_COL: usize = 5;
const PRICE_COL: usize = 10;
const TRAILING_LINES: usize = 3;

/// Which document is being printed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptKind {
    /// Customer receipt with prices and total
    Customer,
    /// Preparation ticket: no prices, notes block
    Kitchen { notes: Option<String> },
    /// Test page
    Test,
}

/// Receipt renderer
pub struct ReceiptFormatter {
    width: usize,
    currency: String,
    footer: String,
    fixed_time: Option<NaiveDateTime>,
}

impl ReceiptFormatter {
    pub fn new(currency: impl Into<String>, footer: impl Into<String>) -> Self {
        Self {
            width: RECEIPT_WIDTH,
            currency: currency.into(),
            footer: footer.into(),
            fixed_time: None,
        }
    }

    /// Stamp every receipt with `at` instead of the wall clock
    pub fn with_fixed_time(mut self, at: NaiveDateTime) -> Self {
        self.fixed_time = Some(at);
        self
    }

    pub fn from_config(config: &PrinterConfig) -> Self {
        Self::new(&config.currency, &config.footer)
    }

    /// Render using the current local time
    pub fn format(&self, order: &OrderSnapshot, shop: &ShopInfo, kind: &ReceiptKind) -> String {
        let now = self
            .fixed_time
            .unwrap_or_else(|| Local::now().naive_local());
        self.format_at(order, shop, kind, now)
    }

    /// Render with an explicit timestamp
    pub fn format_at(
        &self,
        order: &OrderSnapshot,
        shop: &ShopInfo,
        kind: &ReceiptKind,
        now: NaiveDateTime,
    ) -> String {
        let mut lines = Vec::new();

        self.render_header(&mut lines, shop, kind);
        self.render_meta(&mut lines, order, now);
        self.render_items(&mut lines, &order.items, kind);

        if !matches!(kind, ReceiptKind::Kitchen { .. }) {
            lines.push(line_lr("TOTAL:", &self.money(order.total), self.width));
        }

        self.render_block(&mut lines, "Delivery Address:", &order.delivery_address);
        if let Some(ref instructions) = order.special_instructions {
            self.render_block(&mut lines, "Special Instructions:", instructions);
        }
        if let ReceiptKind::Kitchen { notes: Some(notes) } = kind {
            self.render_block(&mut lines, "Preparation Notes:", notes);
        }

        self.render_footer(&mut lines, shop, kind);

        let mut out = String::with_capacity((self.width + 2) * lines.len());
        for line in &lines {
            out.push_str(line);
            out.push_str("\r\n");
        }
        out
    }

    /// `Rs.1234.50`
    pub fn money(&self, value: f64) -> String {
        format!("{}{:.2}", self.currency, value)
    }

    fn fit(&self, s: &str) -> String {
        pad(s, self.width, false)
    }

    fn rule(&self, c: char) -> String {
        c.to_string().repeat(self.width)
    }

    fn render_header(&self, lines: &mut Vec<String>, shop: &ShopInfo, kind: &ReceiptKind) {
        let shop_name = shop.name.trim();
        match kind {
            ReceiptKind::Customer => {
                let title = if shop_name.is_empty() {
                    "MY STORE"
                } else {
                    shop_name
                };
                lines.push(center(title, self.width));
            }
            ReceiptKind::Kitchen { .. } | ReceiptKind::Test => {
                let title = if matches!(kind, ReceiptKind::Test) {
                    "TEST RECEIPT"
                } else {
                    "KITCHEN ORDER"
                };
                lines.push(center(title, self.width));
                if !shop_name.is_empty() {
                    lines.push(self.fit(shop_name));
                }
            }
        }
        lines.push(self.rule('='));
    }

    fn render_meta(&self, lines: &mut Vec<String>, order: &OrderSnapshot, now: NaiveDateTime) {
        lines.push(self.fit(&format!("Order #: {}", order.order_number)));
        lines.push(self.fit(&format!("Date: {}", format_timestamp(now))));

        let customer = order.customer_name.trim();
        let customer = if customer.is_empty() {
            "Walk-in Customer"
        } else {
            customer
        };
        lines.push(self.fit(&format!("Customer: {}", customer)));
        if !order.customer_phone.trim().is_empty() {
            lines.push(self.fit(&format!("Phone: {}", order.customer_phone.trim())));
        }
        lines.push(self.rule('='));
    }

    fn render_items(&self, lines: &mut Vec<String>, items: &[LineItem], kind: &ReceiptKind) {
        let show_price = !matches!(kind, ReceiptKind::Kitchen { .. });

        let header = format!(
            "{}{}{}",
            pad("Item", NAME_COL, false),
            pad("Qty", QTY_COL, true),
            if show_price {
                pad("Price", PRICE_COL, true)
            } else {
                String::new()
            }
        );
        lines.push(self.fit(&header));
        lines.push(self.rule('-'));

        for item in items {
            // Long names are cut to one less than the column so a gap remains
            let name = if text_width(&item.name) > NAME_COL {
                truncate(&item.name, NAME_COL - 1)
            } else {
                item.name.clone()
            };
            // Row amounts are bare; the currency only appears on the total.
            // The leading space keeps wide amounts clear of the quantity.
            let price = if show_price {
                format!(" {:>width$.2}", item.amount(), width = PRICE_COL - 1)
            } else {
                String::new()
            };
            let row = format!(
                "{}{:>width$}{}",
                pad(&name, NAME_COL, false),
                item.quantity,
                price,
                width = QTY_COL
            );
            lines.push(self.fit(&row));
        }

        lines.push(self.rule('-'));
    }

    fn render_block(&self, lines: &mut Vec<String>, title: &str, body: &str) {
        let body = body.trim();
        if body.is_empty() {
            return;
        }
        lines.push(self.fit(title));
        for chunk in wrap(body, self.width) {
            lines.push(self.fit(&chunk));
        }
    }

    fn render_footer(&self, lines: &mut Vec<String>, shop: &ShopInfo, kind: &ReceiptKind) {
        lines.push(self.rule('='));

        if *kind == ReceiptKind::Customer {
            if let Some(phone) = shop.phone.as_deref().map(str::trim)
                && !phone.is_empty()
            {
                lines.push(self.fit(&format!("Tel: {}", phone)));
            }
            if let Some(address) = shop.address.as_deref().map(str::trim)
                && !address.is_empty()
            {
                for chunk in wrap(&format!("Address: {}", address), self.width) {
                    lines.push(self.fit(&chunk));
                }
            }
        }

        lines.push(center(&self.footer, self.width));
        lines.push(self.rule('='));
        lines.extend(std::iter::repeat_n(String::new(), TRAILING_LINES));
    }
}

impl Default for ReceiptFormatter {
    fn default() -> Self {
        Self::from_config(&PrinterConfig::default())
    }
}

/// `D-M-YYYY h:mm:ss AM/PM`
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%-d-%-m-%Y %-I:%M:%S %p").to_string()
}

/// Fixed order used for test pages
pub fn sample_order() -> OrderSnapshot {
    OrderSnapshot {
        order_number: "TEST-0001".to_string(),
        customer_name: "Test Customer".to_string(),
        items: vec![
            LineItem::new("Test Item 1", 100.0, 1),
            LineItem::new("Test Item 2", 150.0, 1),
        ],
        total: 250.0,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(22, 53, 43)
            .unwrap()
    }

    fn order() -> OrderSnapshot {
        OrderSnapshot {
            order_number: "ORD-1042".into(),
            customer_name: "Ayesha Khan".into(),
            customer_phone: "0300-1234567".into(),
            delivery_address: "House 12, Street 4, Jinnah Town, Quetta, near the big mosque"
                .into(),
            special_instructions: Some("Less sugar".into()),
            items: vec![
                LineItem::new("Tea", 50.0, 2),
                LineItem::new("Chicken Karahi Special Family Size", 1450.0, 1),
                LineItem::new("", 10.0, 3),
            ],
            total: 1560.0,
        }
    }

    fn shop() -> ShopInfo {
        ShopInfo {
            name: "Alamgir Hotel".into(),
            phone: Some("081-2345678".into()),
            address: Some("Shaheed-e-Millat Branch 3".into()),
        }
    }

    fn content_lines(out: &str) -> Vec<&str> {
        let lines: Vec<&str> = out.split("\r\n").collect();
        // Trailing blank lines plus the empty tail after the final CRLF
        lines[..lines.len() - 1 - TRAILING_LINES].to_vec()
    }

    #[test]
    fn test_width_invariant() {
        let f = ReceiptFormatter::default();
        for kind in [
            ReceiptKind::Customer,
            ReceiptKind::Test,
            ReceiptKind::Kitchen {
                notes: Some("No onions on the karahi, extra naan".into()),
            },
        ] {
            let out = f.format_at(&order(), &shop(), &kind, at());
            for line in content_lines(&out) {
                assert_eq!(text_width(line), RECEIPT_WIDTH, "{:?}", line);
            }
        }
    }

    #[test]
    fn test_crlf_only() {
        let out =
            ReceiptFormatter::default().format_at(&order(), &shop(), &ReceiptKind::Customer, at());
        assert!(out.ends_with("\r\n\r\n\r\n\r\n"));
        assert_eq!(out.matches('\n').count(), out.matches("\r\n").count());
    }

    #[test]
    fn test_customer_layout() {
        let out =
            ReceiptFormatter::default().format_at(&order(), &shop(), &ReceiptKind::Customer, at());
        let lines = content_lines(&out);

        assert_eq!(lines[0].trim(), "Alamgir Hotel");
        assert_eq!(lines[1], "=".repeat(48));
        assert_eq!(lines[2].trim_end(), "Order #: ORD-1042");
        assert_eq!(lines[3].trim_end(), "Date: 1-2-2026 10:53:43 PM");
        assert_eq!(lines[4].trim_end(), "Customer: Ayesha Khan");
        assert_eq!(lines[5].trim_end(), "Phone: 0300-1234567");
        assert_eq!(lines[6], "=".repeat(48));
        assert_eq!(lines[7].trim_end(), "Item                  Qty     Price");
        assert_eq!(lines[8], "-".repeat(48));
        assert_eq!(lines[9].trim_end(), "Tea                     2    100.00");
        assert_eq!(lines[10].trim_end(), "Chicken Karahi Spec     1   1450.00");
        assert_eq!(lines[11].trim_end(), "                        3     30.00");
        assert_eq!(lines[12], "-".repeat(48));
        assert!(lines[13].starts_with("TOTAL:"));
        assert!(lines[13].ends_with("Rs.1560.00"));
        assert!(out.contains("Delivery Address:"));
        assert!(out.contains("Special Instructions:"));
        assert!(out.contains("Tel: 081-2345678"));
        assert!(out.contains("Thank You! Visit Again!"));
    }

    #[test]
    fn test_kitchen_hides_prices() {
        let out = ReceiptFormatter::default().format_at(
            &order(),
            &shop(),
            &ReceiptKind::Kitchen {
                notes: Some("Rush".into()),
            },
            at(),
        );
        assert!(out.starts_with(&center("KITCHEN ORDER", 48)));
        assert!(!out.contains("Rs."));
        assert!(!out.contains("TOTAL:"));
        assert!(out.contains("Preparation Notes:"));
    }

    #[test]
    fn test_empty_optional_blocks() {
        let o = OrderSnapshot {
            order_number: "A1".into(),
            items: vec![LineItem::new("Tea", 50.0, 1)],
            total: 50.0,
            ..Default::default()
        };
        let out = ReceiptFormatter::default().format_at(
            &o,
            &ShopInfo::default(),
            &ReceiptKind::Customer,
            at(),
        );
        assert!(out.starts_with(&center("MY STORE", 48)));
        assert!(out.contains("Customer: Walk-in Customer"));
        assert!(!out.contains("Delivery Address:"));
        assert!(!out.contains("Phone:"));
    }

    #[test]
    fn test_wide_amounts_stay_apart_from_quantity() {
        let o = OrderSnapshot {
            order_number: "A2".into(),
            items: vec![
                LineItem::new("Karahi", 1450.0, 1),
                LineItem::new("Mega Family Platter", 1234567.5, 1),
            ],
            total: 1236017.5,
            ..Default::default()
        };
        let out = ReceiptFormatter::default().format_at(
            &o,
            &ShopInfo::default(),
            &ReceiptKind::Customer,
            at(),
        );
        let lines = content_lines(&out);

        // No phone line: items start right after the column header rule
        assert_eq!(lines[8].trim_end(), "Karahi                  1   1450.00");
        assert_eq!(lines[9].trim_end(), "Mega Family Platter     1 1234567.50");
        assert_eq!(text_width(lines[9]), RECEIPT_WIDTH);
        assert!(lines[11].starts_with("TOTAL:"));
        assert!(lines[11].ends_with("Rs.1236017.50"));
    }

    #[test]
    fn test_money_format() {
        let f = ReceiptFormatter::default();
        assert_eq!(f.money(1234.5), "Rs.1234.50");
        assert_eq!(f.money(0.0), "Rs.0.00");
        assert_eq!(f.money(1000000.0), "Rs.1000000.00");
        assert_eq!(f.money(99.999), "Rs.100.00");
    }

    #[test]
    fn test_timestamp_format() {
        let morning = NaiveDate::from_ymd_opt(2026, 10, 9)
            .unwrap()
            .and_hms_opt(0, 5, 7)
            .unwrap();
        assert_eq!(format_timestamp(morning), "9-10-2026 12:05:07 AM");
        assert_eq!(format_timestamp(at()), "1-2-2026 10:53:43 PM");
    }
}
