//! The `aquamark template` command for managing saved templates.

use clap::{Args, Subcommand};

use aquamark_core::{load_templates, save_templates, Config, TemplateRecord};

/// Arguments for the `template` command.
#[derive(Args, Debug)]
pub struct TemplateArgs {
    #[command(subcommand)]
    pub command: TemplateCommand,
}

/// Subcommands for template management.
#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// List saved templates
    List,

    /// Show one template as JSON
    Show {
        /// Template name
        name: String,
    },

    /// Save a new template from a JSON record on stdin
    Save {
        /// Template name
        name: String,

        /// Overwrite an existing template
        #[arg(long)]
        force: bool,
    },

    /// Delete a template
    Delete {
        /// Template name
        name: String,
    },
}

/// Execute the template command.
pub async fn execute(args: TemplateArgs) -> anyhow::Result<()> {
    let path = Config::templates_path();

    match args.command {
        TemplateCommand::List => {
            let templates = load_templates(&path)?;
            if templates.is_empty() {
                println!("No templates saved. ({})", path.display());
                return Ok(());
            }
            for (name, record) in &templates {
                println!("{}  {}", name, describe(record));
            }
        }

        TemplateCommand::Show { name } => {
            let templates = load_templates(&path)?;
            let record = templates
                .get(&name)
                .ok_or_else(|| anyhow::anyhow!("Template '{}' not found", name))?;
            println!("{}", serde_json::to_string_pretty(record)?);
        }

        TemplateCommand::Save { name, force } => {
            let mut templates = load_templates(&path)?;
            if templates.contains_key(&name) && !force {
                anyhow::bail!(
                    "Template '{}' already exists.\nUse --force to overwrite.",
                    name
                );
            }

            let record: TemplateRecord = serde_json::from_reader(std::io::stdin().lock())?;
            templates.insert(name.clone(), record);
            save_templates(&path, &templates)?;
            println!("Template '{}' saved to {}", name, path.display());
        }

        TemplateCommand::Delete { name } => {
            let mut templates = load_templates(&path)?;
            if templates.remove(&name).is_none() {
                anyhow::bail!("Template '{}' not found", name);
            }
            save_templates(&path, &templates)?;
            println!("Template '{}' deleted", name);
        }
    }

    Ok(())
}

/// One-line description for the list output.
fn describe(record: &TemplateRecord) -> String {
    let mut parts = Vec::new();
    if !record.watermark_text.is_empty() {
        parts.push(format!("\"{}\"", record.watermark_text));
    }
    if let Some(image) = &record.image_watermark_path {
        parts.push(format!("image: {}", image.display()));
    }
    let position = match record.custom_pos {
        Some([fx, fy]) => format!("custom ({:.2}, {:.2})", fx, fy),
        None => record.position_mode.clone(),
    };
    parts.push(position);
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquamark_core::{Anchor, PlacementSpec};

    #[test]
    fn test_describe_text_template() {
        let record = TemplateRecord {
            watermark_text: "© 2026".to_string(),
            ..Default::default()
        };
        assert_eq!(describe(&record), "\"© 2026\", right_bottom");
    }

    #[test]
    fn test_describe_custom_position() {
        let record = TemplateRecord {
            custom_pos: Some([0.25, 0.5]),
            ..Default::default()
        };
        assert_eq!(describe(&record), "custom (0.25, 0.50)");
        // Custom position supersedes the anchor when applied
        assert_ne!(
            record.to_config().placement,
            PlacementSpec::Anchor(Anchor::RightBottom)
        );
    }
}
