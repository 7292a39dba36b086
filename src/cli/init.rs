//! Project initialization command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::composer::{SCRIPT_ENTRY_DIR, STYLE_ENTRY_DIR};
use crate::utils::project_path;

/// Initialize a new project
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Project name / directory
    #[arg(default_value = ".")]
    pub name: String,

    /// Style entries to scaffold, one stylesheet per page
    #[arg(short, long, value_delimiter = ',', default_value = "app")]
    pub pages: Vec<String>,
}

impl InitCommand {
    pub async fn execute(&self) -> Result<()> {
        let project_dir = Path::new(&self.name);

        eprintln!("{} Initializing new project...\n", "→".blue());

        // Create project directory if needed
        if self.name != "." {
            fs::create_dir_all(project_dir)
                .context("Failed to create project directory")?;
        }

        let config_path = project_dir.join("mixture.toml");
        if config_path.exists() {
            anyhow::bail!("{} already exists", config_path.display());
        }
        fs::write(&config_path, self.generate_config())
            .context("Failed to write mixture.toml")?;
        eprintln!("  {} Created {}", "✓".green(), "mixture.toml".cyan());

        let js_dir = project_path(project_dir, SCRIPT_ENTRY_DIR);
        fs::create_dir_all(&js_dir).context("Failed to create script directory")?;
        write_if_missing(&js_dir.join("app.js"), "console.log('ready');\n")?;

        let css_dir = project_path(project_dir, STYLE_ENTRY_DIR);
        fs::create_dir_all(&css_dir).context("Failed to create style directory")?;
        for page in &self.pages {
            write_if_missing(
                &css_dir.join(format!("{}.css", page)),
                &format!("/* styles for the {} page */\n", page),
            )?;
        }

        eprintln!(
            "\n{} Project initialized successfully!\n",
            "✓".green().bold()
        );

        eprintln!("  Next steps:");
        if self.name != "." {
            eprintln!("    {} cd {}", "→".dimmed(), self.name.cyan());
        }
        eprintln!("    {} mixture config", "→".dimmed());
        eprintln!();

        Ok(())
    }

    fn generate_config(&self) -> String {
        let mut config = format!(
r#"# Mixture configuration

[project]
name = "{name}"

[output]
manifest = "manifest.json"
runtime = "includes/js/runtime"
vendor = "includes/js/vendor"

[classifier]
vendor_dirs = ["node_modules"]
tie_break = "insertion-order"

[[scripts]]
file = "app.js"
name = "main"
"#,
            name = if self.name == "." { "my-site" } else { &self.name },
        );

        for page in &self.pages {
            config.push_str(&format!("\n[[styles]]\nfile = \"{}.css\"\n", page));
        }

        config
    }
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("  {} Created {}", "✓".green(), path.display().to_string().cyan());
    Ok(())
}
