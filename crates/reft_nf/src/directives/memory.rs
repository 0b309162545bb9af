//! The `memory` directive.

use super::DirectiveError;
use crate::args::CallArgs;
use reft_ast::{Constant, ExprKind, MethodCall};
use serde::{Serialize, Serializer};
use std::fmt;

/// A memory unit. Decimal and binary prefixes are both powers of 1024,
/// which is how Nextflow's `MemoryUnit` reads them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemoryUnit {
    B,
    KB,
    MB,
    GB,
    TB,
    PB,
    KiB,
    MiB,
    GiB,
    TiB,
    PiB,
}

impl MemoryUnit {
    pub fn parse(unit: &str) -> Option<Self> {
        let unit = match unit {
            "B" => MemoryUnit::B,
            "KB" => MemoryUnit::KB,
            "MB" => MemoryUnit::MB,
            "GB" => MemoryUnit::GB,
            "TB" => MemoryUnit::TB,
            "PB" => MemoryUnit::PB,
            "KiB" => MemoryUnit::KiB,
            "MiB" => MemoryUnit::MiB,
            "GiB" => MemoryUnit::GiB,
            "TiB" => MemoryUnit::TiB,
            "PiB" => MemoryUnit::PiB,
            _ => return None,
        };
        Some(unit)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryUnit::B => "B",
            MemoryUnit::KB => "KB",
            MemoryUnit::MB => "MB",
            MemoryUnit::GB => "GB",
            MemoryUnit::TB => "TB",
            MemoryUnit::PB => "PB",
            MemoryUnit::KiB => "KiB",
            MemoryUnit::MiB => "MiB",
            MemoryUnit::GiB => "GiB",
            MemoryUnit::TiB => "TiB",
            MemoryUnit::PiB => "PiB",
        }
    }

    /// The number of bytes in one of this unit.
    pub fn bytes(&self) -> u64 {
        let exponent = match self {
            MemoryUnit::B => 0,
            MemoryUnit::KB | MemoryUnit::KiB => 1,
            MemoryUnit::MB | MemoryUnit::MiB => 2,
            MemoryUnit::GB | MemoryUnit::GiB => 3,
            MemoryUnit::TB | MemoryUnit::TiB => 4,
            MemoryUnit::PB | MemoryUnit::PiB => 5,
        };
        1024u64.pow(exponent)
    }
}

impl fmt::Display for MemoryUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MemoryUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A memory amount such as `6.GB` or `'512 MB'`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Memory {
    /// The amount as written, e.g. `6 GB`.
    pub memory: String,
    pub value: f64,
    pub unit: MemoryUnit,
}

impl Memory {
    pub fn new(value: f64, unit: MemoryUnit) -> Self {
        Self {
            memory: format!("{} {}", value, unit),
            value,
            unit,
        }
    }

    /// Parses `6 GB`, `6GB`, `6.GB` and `1.5 TB`. A bare number is bytes.
    pub fn parse(text: &str) -> Result<Self, DirectiveError> {
        let trimmed = text.trim();
        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(split);
        let number = number.strip_suffix('.').unwrap_or(number);
        let unit = unit.trim().trim_start_matches('.');

        let value: f64 = number
            .parse()
            .map_err(|_| DirectiveError::InvalidMemory(text.to_string()))?;
        let unit = if unit.is_empty() {
            MemoryUnit::B
        } else {
            MemoryUnit::parse(unit)
                .ok_or_else(|| DirectiveError::UnknownMemoryUnit(unit.to_string()))?
        };

        Ok(Self {
            memory: text.to_string(),
            value,
            unit,
        })
    }

    pub fn bytes(&self) -> u64 {
        (self.value * self.unit.bytes() as f64).round() as u64
    }

    pub fn gigabytes(&self) -> f64 {
        self.value * self.unit.bytes() as f64 / MemoryUnit::GB.bytes() as f64
    }
}

pub(super) fn extract(call: &MethodCall) -> Result<Option<Memory>, DirectiveError> {
    let args = CallArgs::of(call);
    let Some(arg) = args.single() else {
        return Ok(None);
    };

    match &arg.kind {
        ExprKind::Constant(Constant::String(text)) => Memory::parse(text).map(Some),
        ExprKind::Constant(Constant::Int(n)) => Ok(Some(Memory::new(*n as f64, MemoryUnit::B))),
        ExprKind::Property(prop) => {
            let value = match prop.object.kind {
                ExprKind::Constant(Constant::Int(n)) => n as f64,
                ExprKind::Constant(Constant::Float(n)) => n,
                _ => return Ok(None),
            };
            let unit = MemoryUnit::parse(&prop.property)
                .ok_or_else(|| DirectiveError::UnknownMemoryUnit(prop.property.clone()))?;
            Ok(Some(Memory {
                memory: arg.text(),
                value,
                unit,
            }))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        for text in ["6 GB", "6.GB", "6GB", " 6  GB "] {
            let memory = Memory::parse(text).unwrap();
            assert_eq!(memory.value, 6.0, "{text}");
            assert_eq!(memory.unit, MemoryUnit::GB, "{text}");
        }
    }

    #[test]
    fn test_fractional_value() {
        let memory = Memory::parse("1.5 TB").unwrap();
        assert_eq!(memory.value, 1.5);
        assert_eq!(memory.gigabytes(), 1536.0);
    }

    #[test]
    fn test_unknown_unit() {
        let err = Memory::parse("3 GBB").unwrap_err();
        assert_eq!(err, DirectiveError::UnknownMemoryUnit("GBB".into()));
        assert_eq!(err.to_string(), "unknown memory unit: GBB");
    }

    #[test]
    fn test_invalid_number() {
        assert!(matches!(
            Memory::parse("lots"),
            Err(DirectiveError::InvalidMemory(_))
        ));
    }

    #[test]
    fn test_binary_and_decimal_units_agree() {
        let kb = Memory::parse("2 KB").unwrap();
        let kib = Memory::parse("2 KiB").unwrap();
        assert_eq!(kb.bytes(), 2048);
        assert_eq!(kb.bytes(), kib.bytes());
    }

    #[test]
    fn test_bare_number_is_bytes() {
        let memory = Memory::parse("1024").unwrap();
        assert_eq!(memory.unit, MemoryUnit::B);
        assert_eq!(memory.bytes(), 1024);
    }

    #[test]
    fn test_gigabytes() {
        assert_eq!(Memory::parse("512 MB").unwrap().gigabytes(), 0.5);
        assert_eq!(Memory::new(2.0, MemoryUnit::GB).bytes(), 2 * 1024 * 1024 * 1024);
    }
}
