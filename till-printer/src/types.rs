//! Device and print data types

use serde::{Deserialize, Serialize};

// ============================================================================
// Devices
// ============================================================================

/// How a device is addressed and which encoding it receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// Printer registered with the OS spooler, addressed by queue name
    Queue,
    /// Thermal printer on a serial port, spoken to with raw ESC/POS bytes
    Serial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Serial line settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialParameters {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: Parity,
}

impl Default for SerialParameters {
    /// 9600-8-N-1
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
        }
    }
}

/// One discoverable or connected print target
///
/// Built fresh on every discovery call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub id: String,
    pub display_name: String,
    pub path: String,
    pub device_class: DeviceClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_parameters: Option<SerialParameters>,
}

impl DeviceDescriptor {
    /// Spooler queue addressed by name
    pub fn queue(name: &str) -> Self {
        Self {
            id: format!("queue_{}", name),
            display_name: name.to_string(),
            path: name.to_string(),
            device_class: DeviceClass::Queue,
            serial_parameters: None,
        }
    }

    /// Serial thermal printer on `port`
    pub fn serial(port: &str) -> Self {
        let port = normalize_port(port);
        Self {
            id: format!("serial_{}", port),
            display_name: format!("USB Thermal Printer - {}", port),
            path: port,
            device_class: DeviceClass::Serial,
            serial_parameters: Some(SerialParameters::default()),
        }
    }

    /// Classify a device path: serial port names become serial devices,
    /// anything else is a queue name
    pub fn from_path(path: &str) -> Self {
        let path = path.trim();
        if is_serial_port_name(path) {
            Self::serial(path)
        } else {
            Self::queue(path)
        }
    }

    /// Dedup key within one discovery cycle
    pub fn key(&self) -> (DeviceClass, &str) {
        (self.device_class, self.path.as_str())
    }

    pub fn is_serial(&self) -> bool {
        self.device_class == DeviceClass::Serial
    }
}

/// Whether `name` looks like a serial port a thermal printer sits on
///
/// Accepts `COM<n>` (any case) and the USB serial device nodes
/// `/dev/ttyUSB<n>` / `/dev/ttyACM<n>`.
pub fn is_serial_port_name(name: &str) -> bool {
    fn numbered(rest: &str) -> bool {
        !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
    }

    if name.len() > 3 && name.is_char_boundary(3) && name[..3].eq_ignore_ascii_case("com") {
        return numbered(&name[3..]);
    }
    ["/dev/ttyUSB", "/dev/ttyACM"]
        .iter()
        .any(|prefix| name.strip_prefix(prefix).is_some_and(numbered))
}

/// `com3` -> `COM3`; device nodes are left alone
fn normalize_port(port: &str) -> String {
    let port = port.trim();
    if port.len() > 3 && port.is_char_boundary(3) && port[..3].eq_ignore_ascii_case("com") {
        port.to_ascii_uppercase()
    } else {
        port.to_string()
    }
}

// ============================================================================
// Orders
// ============================================================================

/// One order line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(name: impl Into<String>, price: f64, quantity: u32) -> Self {
        Self {
            name: name.into(),
            price,
            quantity,
        }
    }

    /// Line total (`price × quantity`)
    pub fn amount(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// Read-only order data supplied by the order workflow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderSnapshot {
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_address: String,
    pub special_instructions: Option<String>,
    pub items: Vec<LineItem>,
    pub total: f64,
}

/// Shop header/footer data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShopInfo {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

// ============================================================================
// Results
// ============================================================================

/// `{success, message}` result reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintOutcome {
    pub success: bool,
    pub message: String,
}

impl PrintOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_port_names() {
        assert!(is_serial_port_name("COM3"));
        assert!(is_serial_port_name("com12"));
        assert!(is_serial_port_name("/dev/ttyUSB0"));
        assert!(is_serial_port_name("/dev/ttyACM1"));
        assert!(!is_serial_port_name("COM"));
        assert!(!is_serial_port_name("COMX"));
        assert!(!is_serial_port_name("COM3 Printer"));
        assert!(!is_serial_port_name("BlackCopper 80mm Series(2)"));
        assert!(!is_serial_port_name("/dev/ttyS0"));
    }

    #[test]
    fn test_from_path_classifies() {
        let d = DeviceDescriptor::from_path("com3");
        assert_eq!(d.device_class, DeviceClass::Serial);
        assert_eq!(d.path, "COM3");
        assert_eq!(d.id, "serial_COM3");
        assert_eq!(d.display_name, "USB Thermal Printer - COM3");
        assert_eq!(d.serial_parameters, Some(SerialParameters::default()));

        let q = DeviceDescriptor::from_path("POS-80 Printer");
        assert_eq!(q.device_class, DeviceClass::Queue);
        assert_eq!(q.id, "queue_POS-80 Printer");
        assert!(q.serial_parameters.is_none());
    }

    #[test]
    fn test_order_snapshot_json() {
        let order: OrderSnapshot = serde_json::from_str(
            r#"{"orderNumber":"ORD-1","items":[{"name":"Tea","price":50,"quantity":2}],"total":100}"#,
        )
        .unwrap();
        assert_eq!(order.items[0].amount(), 100.0);
        assert!(order.customer_name.is_empty());
    }
}
