//! `mdclean rules` command implementation
//!
//! Prints the effective ruleset as TOML, a starting point for a custom rules
//! file.

use crate::config::Config;
use crate::error::Result;

/// Print the ruleset that `run` would use
pub fn run(config: &Config) -> Result<()> {
    let rules = config.load_rules()?;
    print!("{}", rules.to_toml()?);
    Ok(())
}
