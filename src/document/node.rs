use std::fmt::{self, Write as _};

use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Yaml};
use snafu::prelude::*;
use tracing::debug;

/// YAML merge key. Its mapping (or sequence of mappings) supplies entries the
/// enclosing mapping does not define itself.
const MERGE_KEY: &str = "<<";

/// A leaf value of a parsed document
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Boolean(value) => write!(f, "{value}"),
            Scalar::Integer(value) => write!(f, "{value}"),
            Scalar::Float(value) if value.is_nan() => f.write_str("NaN"),
            Scalar::Float(value) if value.is_infinite() => {
                f.write_str(if *value > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Scalar::Float(value) => write_number(f, *value),
            Scalar::String(value) => f.write_str(value),
        }
    }
}

/// Writes a finite float the way ECMAScript `Number::toString` does: the
/// shortest round-trip digits, positional from `1e-6` up to `1e21`,
/// exponential (`1e+21`, `2.5e-7`) beyond, and `-0` as `0`.
fn write_number(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value == 0.0 {
        return f.write_char('0');
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `1.2345e2`
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits = mantissa.replace('.', "");
    let count = digits.len() as i32;
    // Position of the decimal point relative to the first digit
    let point = exponent + 1;

    if value < 0.0 {
        f.write_char('-')?;
    }

    if count <= point && point <= 21 {
        f.write_str(&digits)?;
        (0..point - count).try_for_each(|_| f.write_char('0'))
    } else if 0 < point && point <= 21 {
        let (integral, fractional) = digits.split_at(point as usize);
        write!(f, "{integral}.{fractional}")
    } else if -6 < point && point <= 0 {
        f.write_str("0.")?;
        (0..-point).try_for_each(|_| f.write_char('0'))?;
        f.write_str(&digits)
    } else {
        let (first, rest) = digits.split_at(1);
        let sign = if exponent < 0 { '-' } else { '+' };
        if rest.is_empty() {
            write!(f, "{first}e{sign}{}", exponent.abs())
        } else {
            write!(f, "{first}.{rest}e{sign}{}", exponent.abs())
        }
    }
}

impl From<&saphyr::Scalar<'_>> for Scalar {
    fn from(scalar: &saphyr::Scalar<'_>) -> Self {
        match scalar {
            saphyr::Scalar::Null => Scalar::Null,
            saphyr::Scalar::Boolean(value) => Scalar::Boolean(*value),
            saphyr::Scalar::Integer(value) => Scalar::Integer(*value),
            saphyr::Scalar::FloatingPoint(value) => Scalar::Float(value.into_inner()),
            saphyr::Scalar::String(value) => Scalar::String(value.to_string()),
        }
    }
}

/// One parsed input document.
///
/// Mappings keep their keys in document order. Keys are the textual form of
/// the scalar YAML key, so `1: x` and `"1": x` name the same attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericNode {
    Scalar(Scalar),
    Mapping(LinkedHashMap<String, GenericNode>),
    Sequence(Vec<GenericNode>),
}

impl GenericNode {
    /// Parses the first document of a YAML stream. An empty stream is `Null`.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let documents = Yaml::load_from_str(text).context(ParseSnafu)?;
        if documents.len() > 1 {
            debug!(
                "Stream holds {} documents, converting only the first",
                documents.len()
            );
        }
        match documents.first() {
            Some(document) => GenericNode::try_from(document),
            None => Ok(GenericNode::Scalar(Scalar::Null)),
        }
    }

    #[cfg(test)]
    pub fn as_mapping(&self) -> Option<&LinkedHashMap<String, GenericNode>> {
        match self {
            GenericNode::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_null(&self) -> bool {
        matches!(self, GenericNode::Scalar(Scalar::Null))
    }

    /// Copies the entries of a merge source into `mapping`, skipping keys that
    /// are already present. In a sequence the earlier mappings take precedence.
    fn merge_into(
        mapping: &mut LinkedHashMap<String, GenericNode>,
        source: GenericNode,
    ) -> Result<(), DocumentError> {
        let sources = match source {
            GenericNode::Mapping(entries) => vec![entries],
            GenericNode::Sequence(items) => items
                .into_iter()
                .map(|item| match item {
                    GenericNode::Mapping(entries) => Ok(entries),
                    _ => InvalidMergeSnafu.fail(),
                })
                .collect::<Result<_, _>>()?,
            GenericNode::Scalar(_) => return InvalidMergeSnafu.fail(),
        };

        for entries in sources {
            for (key, value) in entries {
                if !mapping.contains_key(&key) {
                    mapping.insert(key, value);
                }
            }
        }
        Ok(())
    }

    fn key_from_yaml(key: &Yaml<'_>) -> Result<String, DocumentError> {
        match key {
            Yaml::Value(scalar) => Ok(Scalar::from(scalar).to_string()),
            Yaml::Tagged(_, inner) => Self::key_from_yaml(inner),
            other => UnsupportedKeySnafu {
                key: format!("{other:?}"),
            }
            .fail(),
        }
    }
}

impl TryFrom<&Yaml<'_>> for GenericNode {
    type Error = DocumentError;

    fn try_from(yaml: &Yaml<'_>) -> Result<Self, Self::Error> {
        let node = match yaml {
            Yaml::Value(scalar) => GenericNode::Scalar(scalar.into()),
            Yaml::Sequence(items) => GenericNode::Sequence(
                items
                    .iter()
                    .map(GenericNode::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Yaml::Mapping(entries) => {
                let mut mapping: LinkedHashMap<String, GenericNode> =
                    LinkedHashMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = Self::key_from_yaml(key)?;
                    if key == MERGE_KEY {
                        Self::merge_into(&mut mapping, GenericNode::try_from(value)?)?;
                    } else {
                        mapping.replace(key, GenericNode::try_from(value)?);
                    }
                }
                GenericNode::Mapping(mapping)
            }
            Yaml::Tagged(_, inner) => GenericNode::try_from(inner.as_ref())?,
            // Aliases are resolved by the loader; anything left over is unusable
            _ => GenericNode::Scalar(Scalar::Null),
        };
        Ok(node)
    }
}

#[derive(Debug, Snafu)]
pub enum DocumentError {
    #[snafu(display("Malformed YAML document"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Mapping key {} is not a scalar", key))]
    UnsupportedKeyError { key: String },
    #[snafu(display("Merge key `<<` needs a mapping or a sequence of mappings"))]
    InvalidMergeError,
}
