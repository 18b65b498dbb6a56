use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::department::DepartmentSheets;
use crate::sheets::writer::DEFAULT_TAB;

pub const TOKEN_ENV: &str = "SNAPM_SHEETS_TOKEN";

/// Where LLM outputs are read from and summaries written to.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PathsConfig {
    pub llm_outputs: PathBuf,
    pub outputs: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            llm_outputs: PathBuf::from("outputs/LLM_outputs"),
            outputs: PathBuf::from("outputs"),
        }
    }
}

/// Spreadsheet access settings.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct SheetsConfig {
    pub tab: Option<String>,
    pub base_url: Option<String>,
    pub access_token: Option<String>,
    pub access_token_command: Option<String>,
}

/// Top-level snapm config file structure.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
#[serde(default)]
pub struct SnapmConfig {
    pub paths: PathsConfig,
    pub sheets: SheetsConfig,
    /// Department key to spreadsheet id.
    pub departments: HashMap<String, String>,
}

impl SnapmConfig {
    /// Load config from `path`, or ~/.snapm/config.toml. Returns default if the file doesn't exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };
        if !path.exists() {
            return Ok(SnapmConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: SnapmConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn tab(&self) -> &str {
        self.sheets.tab.as_deref().unwrap_or(DEFAULT_TAB)
    }

    pub fn department_sheets(&self) -> DepartmentSheets {
        DepartmentSheets::from_config(&self.departments)
    }

    /// Copy with the access token masked, safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.sheets.access_token = copy.sheets.access_token.as_deref().map(redact);
        copy
    }

    /// Display config with secrets redacted.
    pub fn display_redacted(&self) -> String {
        let mut lines = vec![
            "[paths]".to_string(),
            format!("  llm_outputs = \"{}\"", self.paths.llm_outputs.display()),
            format!("  outputs = \"{}\"", self.paths.outputs.display()),
            "[sheets]".to_string(),
            format!("  tab = \"{}\"", self.tab()),
        ];
        let sc = &self.sheets;
        if let Some(ref url) = sc.base_url {
            lines.push(format!("  base_url = \"{}\"", url));
        }
        if let Some(ref token) = sc.access_token {
            lines.push(format!("  access_token = \"{}\"", redact(token)));
        }
        if let Some(ref cmd) = sc.access_token_command {
            lines.push(format!("  access_token_command = \"{}\"", cmd));
        }

        lines.push("[departments]".to_string());
        if self.departments.is_empty() {
            lines.push("  (no departments configured)".to_string());
        }
        let sorted: BTreeMap<_, _> = self.departments.iter().collect();
        for (key, id) in sorted {
            lines.push(format!("  {} = \"{}\"", key, id));
        }
        lines.join("\n")
    }
}

fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}

/// Resolve the Sheets token through the chain: CLI flag > env var > config key > config command.
/// Ok(None) when nothing is configured.
pub fn resolve_token(
    cli_flag: Option<&str>,
    env_var_name: &str,
    config: &SheetsConfig,
) -> Result<Option<String>> {
    // 1. CLI flag
    if let Some(token) = cli_flag {
        if !token.is_empty() {
            return Ok(Some(token.to_string()));
        }
    }

    // 2. Environment variable
    if let Ok(val) = std::env::var(env_var_name) {
        if !val.is_empty() {
            return Ok(Some(val));
        }
    }

    // 3. Config file access_token
    if let Some(ref token) = config.access_token {
        if !token.is_empty() {
            return Ok(Some(token.clone()));
        }
    }

    // 4. External command
    if let Some(ref cmd) = config.access_token_command {
        if !cmd.is_empty() {
            let output = std::process::Command::new("sh")
                .arg("-c")
                .arg(cmd)
                .output()
                .with_context(|| format!("Failed to run access_token_command: {cmd}"))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                bail!(
                    "access_token_command failed (exit {}): {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                );
            }

            let secret = String::from_utf8(output.stdout)
                .context("access_token_command output is not valid UTF-8")?
                .trim()
                .to_string();

            if !secret.is_empty() {
                return Ok(Some(secret));
            }
        }
    }

    Ok(None)
}

/// Path to the config file: ~/.snapm/config.toml
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".snapm").join("config.toml"))
}

/// Default config template content.
pub fn default_config_template() -> &'static str {
    r#"# ~/.snapm/config.toml
# Token resolution order: --token > SNAPM_SHEETS_TOKEN > access_token > access_token_command

[paths]
llm_outputs = "outputs/LLM_outputs"
outputs = "outputs"

[sheets]
tab = "Data"
# access_token = "ya29...."
# access_token_command = "gcloud auth print-access-token"

[departments]
# doctors = "spreadsheet-id"
# delighters = "spreadsheet-id"
# cc_sales = "spreadsheet-id"
# cc_resolvers = "spreadsheet-id"
# filipina = "spreadsheet-id"
# african = "spreadsheet-id"
# ethiopian = "spreadsheet-id"
# mv_resolvers = "spreadsheet-id"
# mv_sales = "spreadsheet-id"
"#
}

/// Create the default config file at `path` if it doesn't already exist.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, default_config_template())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}
