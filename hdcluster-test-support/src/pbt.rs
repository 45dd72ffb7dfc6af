//! Property-test run profile shared by the hdcluster suites.
//!
//! CI raises case counts and enables forking through the environment; local
//! runs fall back to the defaults each suite passes in.

use std::env;

/// Environment variable overriding proptest case counts.
pub const PROGTEST_CASES_ENV_KEY: &str = "PROGTEST_CASES";
/// Environment variable toggling forked proptest execution.
pub const HDCLUSTER_PBT_FORK_ENV_KEY: &str = "HDCLUSTER_PBT_FORK";

/// Case count and fork setting for one property suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PbtProfile {
    cases: u32,
    fork: bool,
}

impl PbtProfile {
    /// Reads the profile from the environment, keeping the defaults for
    /// unset or malformed variables.
    ///
    /// # Examples
    /// ```
    /// use hdcluster_test_support::pbt::PbtProfile;
    ///
    /// let profile = PbtProfile::load(32, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self {
            cases: override_or(PROGTEST_CASES_ENV_KEY, default_cases, parse_cases),
            fork: override_or(HDCLUSTER_PBT_FORK_ENV_KEY, default_fork, parse_switch),
        }
    }

    /// Returns the number of cases per property.
    #[must_use]
    #[rustfmt::skip]
    pub const fn cases(&self) -> u32 { self.cases }

    /// Returns whether cases run in forked subprocesses.
    #[must_use]
    #[rustfmt::skip]
    pub const fn fork(&self) -> bool { self.fork }
}

fn override_or<T: Copy>(
    key: &'static str,
    default: T,
    parse: impl Fn(&str) -> Result<T, String>,
) -> T {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    parse(&raw).unwrap_or_else(|reason| {
        tracing::warn!(env = key, raw = %raw, reason = %reason, "ignoring property-test override");
        default
    })
}

fn parse_cases(raw: &str) -> Result<u32, String> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err("case count must be positive".to_owned()),
        Ok(cases) => Ok(cases),
        Err(error) => Err(format!("not a case count: {error}")),
    }
}

fn parse_switch(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean switch, got {other:?}")),
    }
}
