use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{AppError, AppResult};

/// Turns an HTML document into a file.
#[async_trait]
pub trait PrintToFile: Send + Sync {
    /// Extension of the files this printer produces.
    fn extension(&self) -> &'static str;

    async fn print(&self, html: &str, output: &Path) -> AppResult<()>;
}

/// Hands a finished file to the user.
#[async_trait]
pub trait ShareTarget: Send + Sync {
    async fn is_available(&self) -> bool;

    /// Returns where the shared copy ended up.
    async fn share(&self, file: &Path) -> AppResult<PathBuf>;
}

/// External HTML-to-PDF converter, e.g. `wkhtmltopdf {input} {output}`.
pub struct CommandPrinter {
    command: String,
}

impl CommandPrinter {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl PrintToFile for CommandPrinter {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    async fn print(&self, html: &str, output: &Path) -> AppResult<()> {
        let input = output.with_extension("html");
        tokio::fs::write(&input, html).await?;

        let mut parts = self.command.split_whitespace().map(|part| {
            part.replace("{input}", &input.to_string_lossy())
                .replace("{output}", &output.to_string_lossy())
        });
        let program = parts
            .next()
            .ok_or_else(|| AppError::Report("commande d'impression vide".to_string()))?;
        tracing::debug!("printing report with {}", program);

        let result = Command::new(&program).args(parts).output().await;
        if let Err(e) = tokio::fs::remove_file(&input).await {
            tracing::warn!("could not remove {}: {}", input.display(), e);
        }

        let out = result.map_err(|e| AppError::Report(format!("{}: {}", program, e)))?;
        if !out.status.success() {
            return Err(AppError::Report(format!(
                "{} a échoué ({}): {}",
                program,
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(AppError::Report(format!("{} n'a produit aucun fichier", program)));
        }
        Ok(())
    }
}

/// Writes the HTML document as is.
pub struct HtmlPrinter;

#[async_trait]
impl PrintToFile for HtmlPrinter {
    fn extension(&self) -> &'static str {
        "html"
    }

    async fn print(&self, html: &str, output: &Path) -> AppResult<()> {
        tokio::fs::write(output, html).await?;
        Ok(())
    }
}

/// Copies the file into a destination directory.
pub struct DirectoryShare {
    dir: PathBuf,
}

impl DirectoryShare {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ShareTarget for DirectoryShare {
    async fn is_available(&self) -> bool {
        tokio::fs::create_dir_all(&self.dir).await.is_ok()
    }

    async fn share(&self, file: &Path) -> AppResult<PathBuf> {
        let name = file
            .file_name()
            .ok_or_else(|| AppError::Report(format!("nom de fichier invalide: {}", file.display())))?;
        let destination = self.dir.join(name);
        tokio::fs::copy(file, &destination).await?;
        Ok(destination)
    }
}
