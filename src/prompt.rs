//! Interactive prompts for the pieces a `scan` invocation left out.
//!
//! Cancelling a menu (Esc or `q`) returns [`Cancelled`], which the binary maps
//! to exit code 130.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Input, Select};

use crate::catalog::SourceFile;
use crate::error::Cancelled;

/// Ask for a folder until an existing one is entered.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read.
pub fn ask_directory() -> Result<PathBuf> {
    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Folder containing the tables")
        .validate_with(|input: &String| -> Result<(), String> {
            let path = PathBuf::from(input.trim());
            if path.is_dir() {
                Ok(())
            } else if path.exists() {
                Err(format!("'{}' is not a folder", input.trim()))
            } else {
                Err(format!("Folder '{}' not found", input.trim()))
            }
        })
        .interact_text()
        .context("Failed to read folder name")?;
    Ok(PathBuf::from(input.trim()))
}

/// Let the user pick one of `files`. Returns its index.
///
/// # Errors
///
/// Returns [`Cancelled`] if the menu is dismissed.
pub fn choose_file(files: &[SourceFile]) -> Result<usize> {
    let items: Vec<String> = files.iter().map(file_label).collect();
    select("Choose a table", &items)
}

/// Let the user pick a column. Returns its zero-based index.
///
/// # Errors
///
/// Returns [`Cancelled`] if the menu is dismissed.
pub fn choose_column(columns: &[String]) -> Result<usize> {
    let items: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| column_label(i, c))
        .collect();
    select("Column to check for duplicates", &items)
}

fn select(prompt: &str, items: &[String]) -> Result<usize> {
    Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact_opt()
        .context("Failed to read selection")?
        .ok_or_else(|| Cancelled.into())
}

/// Block until Enter is pressed.
pub fn wait_for_enter() {
    print!("\nPress Enter to exit...");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}

/// Menu label for a table.
#[must_use]
pub fn file_label(file: &SourceFile) -> String {
    format!("{} ({}, {})", file.name, file.size_display(), file.format)
}

/// Menu label for a column, numbered from 1.
#[must_use]
pub fn column_label(index: usize, name: &str) -> String {
    if name.trim().is_empty() {
        format!("{}. <unnamed>", index + 1)
    } else {
        format!("{}. {}", index + 1, name)
    }
}
