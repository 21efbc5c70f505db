//! Hardware profile listing.

use crate::cli::common::{load_catalog, load_config, print_json, CliResult};
use crate::hardware::{ProfileSource, ProfileSummary};
use clap::Args;

/// List available hardware profiles
#[derive(Debug, Clone, Args)]
pub struct ProfilesArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ProfilesArgs {
    /// Execute the profiles command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config();
        let catalog = load_catalog(&config)?;
        let summaries: Vec<ProfileSummary> =
            catalog.entries().iter().map(ProfileSummary::from).collect();

        if self.json {
            return print_json(&summaries);
        }

        println!("Hardware Profiles ({})", summaries.len());
        println!("==================");
        for s in &summaries {
            let mut tags = vec![if s.epaper { "e-paper" } else { "lcd" }];
            if s.touch {
                tags.push("touch");
            }
            if s.lvgl {
                tags.push("lvgl");
            }
            if s.package {
                tags.push("template");
            }
            if s.source == ProfileSource::Recipe {
                tags.push("recipe");
            }
            println!(
                "  {:<36} {:<10} {:>9}  {} [{}]",
                s.id,
                s.chip,
                s.resolution,
                s.name,
                tags.join(", ")
            );
        }
        Ok(())
    }
}
