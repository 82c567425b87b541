// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// Parsed URI template such as `/user/{name}/images/{image_name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

/// Values captured from `{param}` segments, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Result<Self, String> {
        if !raw.starts_with('/') {
            return Err(format!("pattern '{}' must start with '/'", raw));
        }

        let mut segments = Vec::new();
        let trimmed = &raw[1..];
        if !trimmed.is_empty() {
            for part in trimmed.split('/') {
                segments.push(parse_segment(raw, part)?);
            }
        }

        let mut seen = Vec::new();
        for segment in &segments {
            if let Segment::Param(name) = segment {
                if seen.contains(&name) {
                    return Err(format!("pattern '{}' repeats parameter '{}'", raw, name));
                }
                seen.push(name);
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Shape of the pattern with parameter names erased. Two patterns with
    /// the same shape match exactly the same paths.
    pub fn normalized(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Param(_) => out.push_str("{}"),
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    }

    /// Matches a raw request path. Segments are percent-decoded before
    /// comparison and a single trailing slash is ignored.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let path = path.strip_prefix('/')?;
        let path = path.strip_suffix('/').unwrap_or(path);

        let parts: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            let decoded = urlencoding::decode(part).ok()?;
            match segment {
                Segment::Literal(text) => {
                    if decoded != text.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if decoded.is_empty() {
                        return None;
                    }
                    params.push((name.clone(), decoded.into_owned()));
                }
            }
        }
        Some(PathParams(params))
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_segment(raw: &str, part: &str) -> Result<Segment, String> {
    if part.is_empty() {
        return Err(format!("pattern '{}' contains an empty segment", raw));
    }
    if let Some(inner) = part.strip_prefix('{') {
        let name = inner
            .strip_suffix('}')
            .ok_or_else(|| format!("pattern '{}' has unterminated parameter '{}'", raw, part))?;
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("pattern '{}' has invalid parameter '{}'", raw, part));
        }
        return Ok(Segment::Param(name.to_string()));
    }
    if part.contains('{') || part.contains('}') {
        return Err(format!("pattern '{}' has stray braces in '{}'", raw, part));
    }
    Ok(Segment::Literal(part.to_string()))
}
