//! List the recipes available to the simulator.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use runtime::RuntimeConfig;

/// List the recipes in the library
#[derive(Parser)]
pub struct ListRecipes {
    /// Also print every step of each recipe
    #[arg(short, long)]
    steps: bool,
}

impl ListRecipes {
    pub fn execute(self, config: &RuntimeConfig) -> Result<()> {
        let library = config
            .load_library()
            .context("Failed to load recipe library")?;

        println!(
            "{} {} recipes",
            style("Library:").bold().cyan(),
            library.len()
        );
        println!();

        for name in library.names() {
            let Some(recipe) = library.get(name) else {
                continue;
            };
            let channel = if recipe.is_channeling {
                format!(
                    " channel {:?} every {}s for {}s",
                    recipe
                        .channel
                        .step_indices
                        .iter()
                        .map(|index| index.0)
                        .collect::<Vec<_>>(),
                    recipe.channel.tick_duration,
                    recipe.channel.max_duration
                )
            } else {
                String::new()
            };
            println!(
                "{} ({} steps){}",
                style(name).bold().yellow(),
                recipe.len(),
                channel
            );

            if self.steps {
                for (index, entry) in recipe.steps.iter().enumerate() {
                    let window = if entry.start_percent == entry.end_percent {
                        format!("@ {:.2}", entry.start_percent)
                    } else {
                        format!("{:.2}..{:.2}", entry.start_percent, entry.end_percent)
                    };
                    println!("  #{index} {} {window}", entry.id());
                    for sub in entry.sub_entries() {
                        println!("      - {}", sub.id());
                    }
                }
            }
        }

        Ok(())
    }
}
