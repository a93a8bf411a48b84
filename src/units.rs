use log::debug;

use crate::types::ChannelInfo;

/// Mask selecting the base physical quantity of a unit code
pub const DIMENSION_MASK: u16 = 0xffe0;

pub const SECOND: u16 = 2176;
pub const MILLISECOND: u16 = 2194;
pub const VOLT: u16 = 4256;
pub const MILLIVOLT: u16 = 4274;
pub const AMPERE: u16 = 4160;
pub const PICOAMPERE: u16 = 4181;
pub const OHM: u16 = 4288;

/// Lookup service for physical unit codes
///
/// Codes follow the ISO/IEEE 11073 layout: the upper bits select the
/// physical quantity, the lower five bits a decimal prefix. Hosts with a
/// complete unit table implement this trait; [`BasicUnits`] covers the
/// quantities the converter itself needs.
pub trait UnitRegistry {
    /// Factor converting one unit of `code` to its unprefixed base unit
    fn scale_factor(&self, code: u16) -> f64;

    /// Code of a unit string, `0` when unknown
    fn code(&self, unit: &str) -> u16;

    /// Human-readable unit string for `code`
    fn label(&self, code: u16) -> String;

    fn dimension(&self, code: u16) -> u16 {
        code & DIMENSION_MASK
    }
}

/// 十进制前缀：(索引, 符号, 系数)
const PREFIXES: &[(u16, &str, f64)] = &[
    (0, "", 1e0),
    (1, "da", 1e1),
    (2, "h", 1e2),
    (3, "k", 1e3),
    (4, "M", 1e6),
    (5, "G", 1e9),
    (6, "T", 1e12),
    (7, "P", 1e15),
    (8, "E", 1e18),
    (9, "Z", 1e21),
    (10, "Y", 1e24),
    (16, "d", 1e-1),
    (17, "c", 1e-2),
    (18, "m", 1e-3),
    (19, "u", 1e-6),
    (20, "n", 1e-9),
    (21, "p", 1e-12),
    (22, "f", 1e-15),
    (23, "a", 1e-18),
    (24, "z", 1e-21),
    (25, "y", 1e-24),
];

const BASE_UNITS: &[(u16, &str)] = &[(SECOND, "s"), (VOLT, "V"), (AMPERE, "A"), (OHM, "Ohm")];

/// Minimal unit registry for time, voltage, current and resistance
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicUnits;

impl UnitRegistry for BasicUnits {
    fn scale_factor(&self, code: u16) -> f64 {
        if code == 0 {
            return 1.0;
        }
        let index = code & !DIMENSION_MASK;
        PREFIXES
            .iter()
            .find(|(i, _, _)| *i == index)
            .map(|(_, _, factor)| *factor)
            .unwrap_or(f64::NAN)
    }

    fn code(&self, unit: &str) -> u16 {
        let unit = unit.trim().replace('µ', "u").replace('μ', "u");
        for (base, symbol) in BASE_UNITS {
            if let Some(prefix) = unit.strip_suffix(*symbol) {
                if let Some((index, _, _)) = PREFIXES.iter().find(|(_, p, _)| *p == prefix) {
                    return *base | *index;
                }
            }
        }
        0
    }

    fn label(&self, code: u16) -> String {
        let base = self.dimension(code);
        let index = code & !DIMENSION_MASK;
        let symbol = BASE_UNITS.iter().find(|(b, _)| *b == base).map(|(_, s)| *s);
        let prefix = PREFIXES.iter().find(|(i, _, _)| *i == index).map(|(_, p, _)| *p);
        match (symbol, prefix) {
            (Some(symbol), Some(prefix)) => format!("{}{}", prefix, symbol),
            _ if code == 0 => String::new(),
            _ => "?".to_string(),
        }
    }
}

/// Rescales a channel's calibration to mV (voltage) or pA (current)
///
/// Only the calibration is touched; samples read afterwards come out in
/// the target unit. Must run once per channel, before the bulk read.
/// Returns the new unit code when the channel was rescaled.
pub fn rescale_channel(channel: &mut ChannelInfo, units: &dyn UnitRegistry) -> Option<u16> {
    let (target, factor) = match units.dimension(channel.phys_dim_code) {
        VOLT => (MILLIVOLT, 1e3),
        AMPERE => (PICOAMPERE, 1e12),
        _ => return None,
    };

    let scale = units.scale_factor(channel.phys_dim_code) * factor;
    debug!(
        "Rescaling channel '{}' from {} to {} (factor {})",
        channel.label,
        units.label(channel.phys_dim_code),
        units.label(target),
        scale
    );
    channel.apply_scale(scale);
    channel.phys_dim_code = target;
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let units = BasicUnits;
        assert_eq!(units.code("V"), VOLT);
        assert_eq!(units.code("mV"), MILLIVOLT);
        assert_eq!(units.code("pA"), PICOAMPERE);
        assert_eq!(units.code("ms"), MILLISECOND);
        assert_eq!(units.code("µV"), VOLT | 19);
        assert_eq!(units.code("furlong"), 0);
    }

    #[test]
    fn test_scale_and_label() {
        let units = BasicUnits;
        assert_eq!(units.scale_factor(MILLIVOLT), 1e-3);
        assert_eq!(units.scale_factor(SECOND), 1.0);
        assert_eq!(units.label(PICOAMPERE), "pA");
        assert_eq!(units.label(units.code("uV")), "uV");
        assert_eq!(units.dimension(MILLISECOND), SECOND);
    }

    #[test]
    fn test_rescale_volt_to_millivolt() {
        let mut channel = ChannelInfo::new("Vm", VOLT);
        channel.cal = 0.5;
        assert_eq!(rescale_channel(&mut channel, &BasicUnits), Some(MILLIVOLT));
        assert_eq!(channel.to_physical(2.0), 1000.0);
    }

    #[test]
    fn test_rescale_nanoamp_to_picoamp() {
        let mut channel = ChannelInfo::new("Im", AMPERE | 20);
        assert_eq!(rescale_channel(&mut channel, &BasicUnits), Some(PICOAMPERE));
        assert!((channel.to_physical(1.0) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_rescale_leaves_other_units() {
        let mut channel = ChannelInfo::new("R", OHM);
        assert_eq!(rescale_channel(&mut channel, &BasicUnits), None);
        assert_eq!(channel.cal, 1.0);
        assert_eq!(channel.phys_dim_code, OHM);
    }
}
