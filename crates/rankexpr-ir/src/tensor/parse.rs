//! Parsing of the canonical tensor type text form, e.g. `tensor(d0[],d1[784],x{})`.

use std::str::FromStr;

use super::{Dimension, TensorType};
use crate::error::IrError;

impl FromStr for TensorType {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| IrError::InvalidTensorType(format!("'{}': {}", s, reason));

        let body = s
            .trim()
            .strip_prefix("tensor")
            .ok_or_else(|| invalid("expected 'tensor'"))?
            .trim_start();
        // An optional cell value type, e.g. tensor<float>(...), does not affect the type algebra.
        let body = match body.strip_prefix('<') {
            Some(rest) => rest
                .split_once('>')
                .map(|(_, rest)| rest.trim_start())
                .ok_or_else(|| invalid("unterminated value type"))?,
            None => body,
        };
        let body = body
            .strip_prefix('(')
            .and_then(|rest| rest.trim_end().strip_suffix(')'))
            .ok_or_else(|| invalid("expected a parenthesized dimension list"))?;

        if body.trim().is_empty() {
            return Ok(TensorType::empty());
        }

        let mut dimensions = Vec::new();
        for part in body.split(',') {
            let part = part.trim();
            let dimension = if let Some(name) = part.strip_suffix("{}") {
                Dimension::mapped(parse_name(name.trim()).map_err(|e| invalid(&e))?)
            } else if let Some(rest) = part.strip_suffix(']') {
                let (name, size) = rest
                    .split_once('[')
                    .ok_or_else(|| invalid("expected '[' in indexed dimension"))?;
                let name = parse_name(name.trim()).map_err(|e| invalid(&e))?;
                match size.trim() {
                    "" => Dimension::indexed_unbound(name),
                    size => Dimension::indexed(
                        name,
                        size.parse::<u64>()
                            .map_err(|_| invalid(&format!("bad dimension size '{}'", size)))?,
                    ),
                }
            } else {
                return Err(invalid(&format!("bad dimension '{}'", part)));
            };
            dimensions.push(dimension);
        }
        TensorType::from_dimensions(dimensions)
    }
}

fn parse_name(name: &str) -> Result<&str, String> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@' || c == '$');
    if valid {
        Ok(name)
    } else {
        Err(format!("bad dimension name '{}'", name))
    }
}
