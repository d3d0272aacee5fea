//! Subcommand handlers
//!
//! Each handler returns the [`PrintOutcome`] to report. Print failures are
//! outcomes, not errors; `Err` is reserved for bad input files. The caller
//! disconnects and shuts the service down afterwards.

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use till_printer::{DeviceDescriptor, OrderSnapshot, PrintOutcome, PrinterService, ShopInfo};
use tracing::warn;

pub async fn devices(service: &PrinterService) -> Vec<DeviceDescriptor> {
    service.list_devices().await
}

/// `NAME  CLASS  PATH` table
pub fn render_devices(devices: &[DeviceDescriptor]) -> String {
    if devices.is_empty() {
        return "No printers found\n".to_string();
    }

    let name_width = devices
        .iter()
        .map(|d| d.display_name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for device in devices {
        out.push_str(&format!(
            "{:<width$}  {:<6}  {}\n",
            device.display_name,
            format!("{:?}", device.device_class).to_lowercase(),
            device.path,
            width = name_width
        ));
    }
    out
}

pub async fn test(
    service: &PrinterService,
    printer: &str,
    shop: Option<&Path>,
) -> anyhow::Result<PrintOutcome> {
    let shop = load_shop(shop).await?;

    if let Err(e) = service.connect(printer).await {
        return Ok(failure(e.reason(), &e));
    }

    Ok(match service.test_print(&shop).await {
        Ok(outcome) => outcome,
        Err(e) => failure(e.reason(), &e),
    })
}

pub async fn receipt(
    service: &PrinterService,
    order: &Path,
    shop: Option<&Path>,
    printer: &str,
) -> anyhow::Result<PrintOutcome> {
    let order: OrderSnapshot = read_json(order).await?;
    let shop = load_shop(shop).await?;

    if let Err(e) = service.connect(printer).await {
        return Ok(failure(e.reason(), &e));
    }

    Ok(match service.print_receipt(&order, &shop, None).await {
        Ok(outcome) => outcome,
        Err(e) => failure(e.reason(), &e),
    })
}

/// Always yields a successful outcome once the order file parses
pub async fn kitchen(
    service: &PrinterService,
    order: &Path,
    notes: Option<&str>,
    printer: Option<&str>,
) -> anyhow::Result<PrintOutcome> {
    let order: OrderSnapshot = read_json(order).await?;

    if let Some(printer) = printer
        && let Err(e) = service.connect(printer).await
    {
        warn!(printer, error = %e, "Kitchen printer unavailable");
    }

    Ok(service.print_kitchen_ticket(&order, notes, None).await)
}

fn failure(reason: &str, error: &dyn std::fmt::Display) -> PrintOutcome {
    PrintOutcome {
        success: false,
        message: format!("{}: {}", reason, error),
    }
}

async fn load_shop(path: Option<&Path>) -> anyhow::Result<ShopInfo> {
    match path {
        Some(path) => read_json(path).await,
        None => Ok(ShopInfo::default()),
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_render_devices_table() {
        let devices = vec![
            DeviceDescriptor::queue("Front Counter"),
            DeviceDescriptor::serial("COM3"),
        ];
        let table = render_devices(&devices);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Front Counter"));
        assert!(lines[0].contains("queue"));
        assert!(lines[1].starts_with("USB Thermal Printer - COM3"));
        assert!(lines[1].ends_with("COM3"));
    }

    #[test]
    fn test_render_no_devices() {
        assert_eq!(render_devices(&[]), "No printers found\n");
    }

    #[tokio::test]
    async fn test_read_order_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = r#"{"orderNumber":"ORD-9","items":[{"name":"Chai","price":60.0,"quantity":2}],
            "total":120.0}"#;
        file.write_all(json.as_bytes()).unwrap();

        let order: OrderSnapshot = read_json(file.path()).await.unwrap();
        assert_eq!(order.order_number, "ORD-9");
        assert_eq!(order.items[0].quantity, 2);
        assert!(order.customer_name.is_empty());
    }

    #[tokio::test]
    async fn test_read_json_missing_file() {
        let err = read_json::<OrderSnapshot>(Path::new("/nonexistent/order.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
