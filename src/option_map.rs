//! Translation of human-authored JSON option objects into an [`Options`] table.
//!
//! Keys are option names as returned by [`OptionCode::name`] (or a decimal
//! code such as `"224"`), values are written according to the option's
//! [`ValueKind`]:
//!
//! ```json
//! {
//!     "SubnetMask": "255.255.255.0",
//!     "Router": ["192.168.1.1"],
//!     "StaticRoute": ["10.0.0.0 192.168.1.254"],
//!     "TimeOffset": -3600,
//!     "InterfaceMtu": 1500,
//!     "IpForwarding": false,
//!     "DomainName": "example.lan",
//!     "VendorSpecificInformation": [1, 4, 0, 0, 0, 1]
//! }
//! ```
//!
//! Values that encode to zero bytes (empty lists or strings) are left out of
//! the table.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::options::{OptionCode, Options, ValueKind};

/// Parses a JSON object text into an option table.
pub fn options_from_json(json: &str) -> Result<Options> {
    let map: BTreeMap<String, Value> = serde_json::from_str(json)?;
    options_from_map(&map)
}

/// Translates every entry of `map` into an option table.
///
/// # Errors
///
/// Returns [`Error::InvalidOption`] for unknown names, Pad or End, and any
/// value that does not fit its option's kind.
pub fn options_from_map(map: &BTreeMap<String, Value>) -> Result<Options> {
    let mut options = Options::new();
    for (name, value) in map {
        let code = lookup(name)?;
        let bytes = encode_value(code, value)?;
        if !bytes.is_empty() {
            options.insert(code, bytes);
        }
    }
    Ok(options)
}

/// Encodes one JSON value as the wire bytes of option `code`.
pub fn encode_value(code: OptionCode, value: &Value) -> Result<Vec<u8>> {
    encode_kind(code.kind(), value)
        .and_then(check_length)
        .map_err(|reason| Error::InvalidOption(format!("{}: {}", code, reason)))
}

type Encoded = std::result::Result<Vec<u8>, String>;

fn encode_kind(kind: ValueKind, value: &Value) -> Encoded {
    let bytes = match kind {
        ValueKind::Reserved => return Err("option carries no value".to_string()),
        ValueKind::Ipv4 => parse_ip(as_str(value)?)?.octets().to_vec(),
        ValueKind::Ipv4List => {
            let mut bytes = Vec::new();
            for item in as_array(value)? {
                bytes.extend_from_slice(&parse_ip(as_str(item)?)?.octets());
            }
            bytes
        }
        ValueKind::Ipv4PairList => {
            let mut bytes = Vec::new();
            for item in as_array(value)? {
                let entry = as_str(item)?;
                let Some((first, second)) = entry.trim().split_once(' ') else {
                    return Err(format!("expected two addresses in {:?}", entry));
                };
                bytes.extend_from_slice(&parse_ip(first)?.octets());
                bytes.extend_from_slice(&parse_ip(second)?.octets());
            }
            bytes
        }
        ValueKind::I32 => {
            let number = value.as_i64().ok_or("expected an integer")?;
            let Ok(number) = i32::try_from(number) else {
                return Err(format!("{} is out of range", number));
            };
            number.to_be_bytes().to_vec()
        }
        ValueKind::U32 => unsigned::<u32>(value)?.to_be_bytes().to_vec(),
        ValueKind::U16 => unsigned::<u16>(value)?.to_be_bytes().to_vec(),
        ValueKind::U8 => vec![unsigned::<u8>(value)?],
        ValueKind::U16List => {
            let mut bytes = Vec::new();
            for item in as_array(value)? {
                bytes.extend_from_slice(&unsigned::<u16>(item)?.to_be_bytes());
            }
            bytes
        }
        ValueKind::Flag => vec![u8::from(value.as_bool().ok_or("expected true or false")?)],
        ValueKind::Text => as_str(value)?.as_bytes().to_vec(),
        ValueKind::Bytes => {
            let mut bytes = Vec::new();
            for item in as_array(value)? {
                bytes.push(unsigned::<u8>(item)?);
            }
            bytes
        }
    };
    Ok(bytes)
}

fn check_length(bytes: Vec<u8>) -> Encoded {
    if bytes.len() > 255 {
        return Err(format!("value is {} bytes (maximum 255)", bytes.len()));
    }
    Ok(bytes)
}

fn lookup(name: &str) -> Result<OptionCode> {
    let code = name
        .parse::<u8>()
        .ok()
        .map(OptionCode::from)
        .or_else(|| OptionCode::from_name(name))
        .ok_or_else(|| Error::InvalidOption(format!("Unknown option name {:?}", name)))?;
    if code.kind() == ValueKind::Reserved {
        return Err(Error::InvalidOption(format!("{} cannot be configured", code)));
    }
    Ok(code)
}

fn parse_ip(address: &str) -> std::result::Result<Ipv4Addr, String> {
    address
        .trim()
        .parse()
        .map_err(|_| format!("{:?} is not an IPv4 address", address))
}

fn as_str(value: &Value) -> std::result::Result<&str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("expected a string, got {}", value))
}

fn as_array(value: &Value) -> std::result::Result<&Vec<Value>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("expected an array, got {}", value))
}

fn unsigned<T: TryFrom<u64>>(value: &Value) -> std::result::Result<T, String> {
    let number = value
        .as_u64()
        .ok_or_else(|| format!("expected a non-negative integer, got {}", value))?;
    T::try_from(number).map_err(|_| format!("{} is out of range", number))
}
