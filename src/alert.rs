//! Immediate Alert Service alert level.
//!
//! Values follow the Alert Level characteristic (0x2A06):
//! ```text
//! 0x00  No Alert
//! 0x01  Mild Alert
//! 0x02  High Alert
//! 0x03-0xFF  reserved
//! ```

/// Alert level requested by the central.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertLevel {
    #[default]
    NoAlert,
    MildAlert,
    HighAlert,
    /// A reserved value was written. It is kept as written and the ALERT
    /// output is left as it is.
    Reserved(u8),
}

impl AlertLevel {
    /// Decode a written characteristic byte.
    pub fn from_byte(value: u8) -> Self {
        match value {
            0 => AlertLevel::NoAlert,
            1 => AlertLevel::MildAlert,
            2 => AlertLevel::HighAlert,
            other => AlertLevel::Reserved(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            AlertLevel::NoAlert => 0,
            AlertLevel::MildAlert => 1,
            AlertLevel::HighAlert => 2,
            AlertLevel::Reserved(value) => value,
        }
    }
}

impl From<u8> for AlertLevel {
    fn from(value: u8) -> Self {
        AlertLevel::from_byte(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_defined_levels() {
        assert_eq!(AlertLevel::from_byte(0), AlertLevel::NoAlert);
        assert_eq!(AlertLevel::from_byte(1), AlertLevel::MildAlert);
        assert_eq!(AlertLevel::from_byte(2), AlertLevel::HighAlert);
    }

    #[test]
    fn keeps_reserved_values_as_written() {
        assert_eq!(AlertLevel::from_byte(3), AlertLevel::Reserved(3));
        assert_eq!(AlertLevel::from(0xFF), AlertLevel::Reserved(0xFF));
        assert_eq!(AlertLevel::Reserved(0x7F).as_byte(), 0x7F);
    }

    #[test]
    fn default_is_no_alert() {
        assert_eq!(AlertLevel::default(), AlertLevel::NoAlert);
        assert_eq!(AlertLevel::HighAlert.as_byte(), 2);
    }
}
