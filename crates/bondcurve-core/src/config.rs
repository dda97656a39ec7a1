//! # Launch Profiles
//!
//! TOML description of a launch, loaded and validated before any curve is built.
//!
//! ```toml
//! name = "community-launch"
//!
//! [launch]
//! total_token_supply = 1_000_000_000_000_000
//! migration_fee_percent = 1
//!
//! [launch.shape]
//! kind = "flat"
//! percentage_supply_on_migration = 20
//! migration_quote_threshold = 85_000_000_000
//!
//! [launch.fees.base_fee]
//! mode = "fee_scheduler"
//! starting_fee_bps = 100
//! ending_fee_bps = 100
//! number_of_period = 0
//! total_duration = 0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::{build_curve, validate_build_params, BuildCurveParams, BuiltCurve};
use crate::errors::{CoreResult, CurveError};

/// Launch configuration loaded from a TOML file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LaunchProfile {
    /// Launch name for logging
    pub name: String,

    /// Curve, fee, vesting and migration targets
    pub launch: BuildCurveParams,
}

impl LaunchProfile {
    /// Parse and validate a profile
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let profile: LaunchProfile = toml::from_str(content)
            .map_err(|e| CurveError::Config(format!("Failed to parse launch profile: {}", e)))?;

        profile.validate()?;

        Ok(profile)
    }

    /// Load a profile from a TOML file
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CurveError::Config(format!("Failed to read launch profile {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    /// Serialize the profile back to TOML
    pub fn to_toml_string(&self) -> CoreResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CurveError::Config(format!("Failed to serialize launch profile: {}", e)))
    }

    /// Save the profile to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        fs::write(path, content).map_err(|e| {
            CurveError::Config(format!("Failed to write launch profile {}: {}", path.display(), e))
        })
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CurveError::Config("launch name must not be empty".to_string()));
        }

        validate_build_params(&self.launch)
    }

    /// Build the curve and fee config this profile describes
    pub fn build(&self) -> CoreResult<BuiltCurve> {
        debug!(name = %self.name, "building launch profile");
        build_curve(&self.launch)
    }
}
