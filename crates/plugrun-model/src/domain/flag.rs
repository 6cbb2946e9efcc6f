use serde::{Deserialize, Serialize};

/// On/off switch for descriptor options; serialized as a bare boolean.
///
/// Defaults to enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flag(bool);

impl Flag {
    pub const fn enabled() -> Self {
        Self(true)
    }

    pub const fn disabled() -> Self {
        Self(false)
    }

    pub const fn is_enabled(&self) -> bool {
        self.0
    }

    pub const fn is_disabled(&self) -> bool {
        !self.0
    }
}

impl Default for Flag {
    fn default() -> Self {
        Self::enabled()
    }
}

impl From<bool> for Flag {
    fn from(b: bool) -> Self {
        Self(b)
    }
}

#[cfg(test)]
mod tests {
    use super::Flag;

    #[test]
    fn defaults_to_enabled() {
        assert!(Flag::default().is_enabled());
        assert!(Flag::disabled().is_disabled());
        assert_eq!(Flag::from(false), Flag::disabled());
    }

    #[test]
    fn serializes_as_plain_bool() {
        assert_eq!(serde_json::to_string(&Flag::disabled()).unwrap(), "false");
        let back: Flag = serde_json::from_str("true").unwrap();
        assert!(back.is_enabled());
    }
}
