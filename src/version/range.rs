//! npm version range parsing on top of [`semver::VersionReq`].
//!
//! The `semver` crate implements Cargo's requirement syntax, which differs from
//! npm's in a few ways: a bare `1.2.3` is a caret requirement in Cargo but an
//! exact match in npm, comparators are comma separated instead of whitespace
//! separated, and there are no `||` alternatives or hyphen ranges. This module
//! translates npm syntax into one `VersionReq` per `||` alternative.
//!
//! # Supported Syntax
//!
//! | npm range | Meaning |
//! |-----------|---------|
//! | `1.2.3` | exactly `1.2.3` |
//! | `1`, `1.x`, `1.x.x`, `1.2.*` | any version with that prefix |
//! | `*`, `x`, empty | any release version |
//! | `^1.2.3`, `~1.2`, `~>1.2` | caret / tilde ranges |
//! | `>=1.2.3 <2`, `>= 1.2` | intersection of comparators |
//! | `1.2.3 - 2.3` | inclusive hyphen range |
//! | `1.x \|\| >=3` | union of alternatives |
//!
//! Prerelease versions only satisfy a comparator that names the same
//! `major.minor.patch` with a prerelease tag, as in npm.

use anyhow::{Result, anyhow, bail};
use semver::{Version, VersionReq};
use std::fmt;

/// Operators in matching order; two-character operators first.
const OPERATORS: [&str; 8] = [">=", "<=", "~>", ">", "<", "=", "^", "~"];

/// A parsed npm version range.
#[derive(Debug, Clone)]
pub struct VersionRange {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    /// Parse an npm range. Fails if any alternative is not a valid range.
    pub fn parse(raw: &str) -> Result<Self> {
        let alternatives = raw
            .split("||")
            .map(parse_comparator_set)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| anyhow!("Invalid semver range '{raw}': {e}"))?;

        Ok(Self {
            raw: raw.to_string(),
            alternatives,
        })
    }

    /// Whether `version` satisfies at least one alternative.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// The range as written in `allowScripts`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One comparator after translation.
#[derive(Debug, PartialEq, Eq)]
enum Comparator {
    Any,
    Never,
    Req(String),
}

/// A possibly partial version such as `1`, `1.2`, `1.x` or `1.2.3-beta.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PartialVersion {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Option<String>,
}

impl fmt::Display for PartialVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.major, self.minor, self.patch) {
            (Some(major), Some(minor), Some(patch)) => {
                write!(f, "{major}.{minor}.{patch}")?;
                if let Some(pre) = &self.pre {
                    write!(f, "-{pre}")?;
                }
                Ok(())
            }
            (Some(major), Some(minor), None) => write!(f, "{major}.{minor}"),
            (Some(major), None, _) => write!(f, "{major}"),
            (None, _, _) => f.write_str("*"),
        }
    }
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "x" | "X" | "*")
}

fn parse_partial(text: &str) -> Result<PartialVersion> {
    let text = text.strip_prefix(['v', 'V']).unwrap_or(text);
    if text.is_empty() || is_wildcard(text) {
        return Ok(PartialVersion {
            major: None,
            minor: None,
            patch: None,
            pre: None,
        });
    }

    // Build metadata never takes part in matching
    let text = text.split_once('+').map_or(text, |(version, _)| version);
    let (core, pre) = match text.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (text, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 {
        bail!("'{text}' has more than three version components");
    }

    let mut numbers: [Option<u64>; 3] = [None; 3];
    let mut wildcard = false;
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        if wildcard || is_wildcard(part) {
            wildcard = true;
            continue;
        }
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            bail!("'{part}' is not a version number");
        }
        *slot = Some(part.parse::<u64>()?);
    }

    if let Some(pre) = pre {
        if pre.is_empty() || numbers.iter().any(Option::is_none) {
            bail!("'{text}' has a prerelease tag without a full version");
        }
    }

    Ok(PartialVersion {
        major: numbers[0],
        minor: numbers[1],
        patch: numbers[2],
        pre: pre.map(str::to_string),
    })
}

fn split_operator(token: &str) -> (&str, &str) {
    for op in OPERATORS {
        if let Some(rest) = token.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", token)
}

fn parse_comparator(token: &str) -> Result<Comparator> {
    let (op, rest) = split_operator(token);
    let partial = parse_partial(rest.trim())?;

    if partial.major.is_none() {
        // `>*` and `<*` can never be satisfied
        return Ok(match op {
            ">" | "<" => Comparator::Never,
            _ => Comparator::Any,
        });
    }

    let op = match op {
        "" => "=",
        "~>" => "~",
        other => other,
    };
    Ok(Comparator::Req(format!("{op}{partial}")))
}

fn parse_hyphen(lower: &str, upper: &str) -> Result<Vec<Comparator>> {
    let lower = parse_partial(lower)?;
    let upper = parse_partial(upper)?;

    let mut comparators = Vec::new();
    if lower.major.is_some() {
        comparators.push(Comparator::Req(format!(">={lower}")));
    }
    if upper.major.is_some() {
        comparators.push(Comparator::Req(format!("<={upper}")));
    }
    Ok(comparators)
}

/// Split on whitespace, joining a bare operator with the version after it.
fn tokenize(set: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut pending_op: Option<&str> = None;

    for word in set.split_whitespace() {
        if let Some(op) = pending_op.take() {
            tokens.push(format!("{op}{word}"));
        } else if OPERATORS.contains(&word) {
            pending_op = Some(word);
        } else {
            tokens.push(word.to_string());
        }
    }

    if let Some(op) = pending_op {
        bail!("operator '{op}' is missing a version");
    }
    Ok(tokens)
}

fn parse_comparator_set(set: &str) -> Result<VersionReq> {
    let words: Vec<&str> = set.split_whitespace().collect();
    let comparators = if words.len() == 3 && words[1] == "-" {
        parse_hyphen(words[0], words[2])?
    } else {
        tokenize(set)?.iter().map(|token| parse_comparator(token)).collect::<Result<Vec<_>>>()?
    };

    if comparators.contains(&Comparator::Never) {
        return Ok(VersionReq::parse("<0.0.0")?);
    }

    let reqs: Vec<String> = comparators
        .into_iter()
        .filter_map(|comparator| match comparator {
            Comparator::Req(req) => Some(req),
            Comparator::Any | Comparator::Never => None,
        })
        .collect();

    if reqs.is_empty() {
        return Ok(VersionReq::STAR);
    }
    Ok(VersionReq::parse(&reqs.join(", "))?)
}
