use clap::ValueEnum;

/// How to fetch the target regardless of what the probe reported.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Split when the server advertises range support, stream otherwise.
    Auto,
    /// Always use one streamed request.
    Single,
    /// Always split into range requests.
    Split,
}

impl Strategy {
    pub fn supports_ranges(self, advertised: bool) -> bool {
        match self {
            Strategy::Auto => advertised,
            Strategy::Single => false,
            Strategy::Split => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_overrides_advertised_ranges() {
        assert!(Strategy::Auto.supports_ranges(true));
        assert!(!Strategy::Auto.supports_ranges(false));
        assert!(!Strategy::Single.supports_ranges(true));
        assert!(Strategy::Split.supports_ranges(false));
    }
}
