//! Parse exported artifacts back into integer blocks.
//!
//! The inverse of [`crate::writer`]. A block name is only accepted on the
//! first non-blank line or right after a blank line; every other line
//! inside a block must be a comma-separated list of integers. Anything else
//! is a malformed artifact.

use std::path::Path;

use anyhow::{bail, Context, Result};

/// One block read back from an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBlock {
    pub name: String,
    pub values: Vec<i8>,
}

/// `Some(values)` if every non-empty token on the line is an integer.
fn value_tokens(line: &str) -> Option<Vec<i64>> {
    line.split(',')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(|tok| tok.parse::<i64>().ok())
        .collect()
}

pub fn parse_artifact(text: &str) -> Result<Vec<ParsedBlock>> {
    let mut blocks: Vec<ParsedBlock> = Vec::new();
    let mut expect_name = true;
    for (lineno, line) in text.lines().enumerate() {
        let lineno = lineno + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            expect_name = true;
            continue;
        }
        let tokens = value_tokens(trimmed);
        if expect_name {
            if tokens.is_some() {
                bail!("line {lineno}: values before a block name");
            }
            blocks.push(ParsedBlock {
                name: trimmed.to_string(),
                values: Vec::new(),
            });
            expect_name = false;
            continue;
        }
        let (Some(values), Some(block)) = (tokens, blocks.last_mut()) else {
            bail!("line {lineno}: malformed value line {trimmed:?}");
        };
        for v in values {
            let q = i8::try_from(v)
                .with_context(|| format!("line {lineno}: value {v} outside [-128, 127]"))?;
            block.values.push(q);
        }
    }
    Ok(blocks)
}

pub fn read_artifact(path: &Path) -> Result<Vec<ParsedBlock>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read artifact {}", path.display()))?;
    parse_artifact(&text).with_context(|| format!("parse artifact {}", path.display()))
}
