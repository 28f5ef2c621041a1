//! Parameter manifests
//!
//! A manifest is the ordered list of parameter declarations used to coerce the
//! raw string inputs of a test case into typed values. It can be supplied as a
//! JSON list of entries or in the compact line syntax:
//!
//! ```text
//! array<integer> -> nums 5
//! integer -> target
//! integer[] -> return
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors produced while building a manifest
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("invalid manifest syntax at line {line}: {text}")]
    Syntax { line: usize, text: String },

    #[error("unknown type \"{tag}\" at line {line}")]
    UnknownType { line: usize, tag: String },

    #[error("invalid array size \"{size}\" at line {line}")]
    InvalidSize { line: usize, size: String },

    #[error("multiple return types defined (second at entry {entry})")]
    DuplicateReturn { entry: usize },

    #[error("parameter at entry {entry} has an empty name")]
    EmptyName { entry: usize },
}

/// Type tag of a declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    #[serde(alias = "char")]
    Character,
    Integer,
    Float,
    Double,
    Long,
    Boolean,
    Array,
    /// Declares the return type; never consumes an input
    Return,
}

impl ParamType {
    /// Look up a type by its tag, accepting `char` for `character`
    pub fn from_tag(tag: &str) -> Option<Self> {
        let ty = match tag.trim() {
            "string" => ParamType::String,
            "character" | "char" => ParamType::Character,
            "integer" => ParamType::Integer,
            "float" => ParamType::Float,
            "double" => ParamType::Double,
            "long" => ParamType::Long,
            "boolean" => ParamType::Boolean,
            "array" => ParamType::Array,
            "return" => ParamType::Return,
            _ => return None,
        };
        Some(ty)
    }

    /// Canonical tag for this type
    pub fn tag(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Character => "character",
            ParamType::Integer => "integer",
            ParamType::Float => "float",
            ParamType::Double => "double",
            ParamType::Long => "long",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Return => "return",
        }
    }

    #[must_use]
    pub fn is_return_marker(&self) -> bool {
        matches!(self, ParamType::Return)
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Element declaration for array parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayProps {
    /// Element type
    #[serde(rename = "type")]
    pub element: ParamType,

    /// Declared length; advisory only
    #[serde(default)]
    pub size: Option<usize>,
}

/// A single parameter declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ParamType,

    #[serde(default, rename = "arrayProps", skip_serializing_if = "Option::is_none")]
    pub array_props: Option<ArrayProps>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            array_props: None,
        }
    }

    /// Declare an array parameter with the given element type
    pub fn array(name: impl Into<String>, element: ParamType, size: Option<usize>) -> Self {
        Self {
            name: name.into(),
            kind: ParamType::Array,
            array_props: Some(ArrayProps { element, size }),
        }
    }

    /// Element type of an array parameter, if declared
    pub fn element_type(&self) -> Option<ParamType> {
        self.array_props.as_ref().map(|props| props.element)
    }
}

/// Ordered parameter declarations for one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ManifestRepr", into = "Vec<ParameterSpec>")]
pub struct Manifest {
    params: Vec<ParameterSpec>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestRepr {
    Entries(Vec<ParameterSpec>),
    Compact(String),
}

impl TryFrom<ManifestRepr> for Manifest {
    type Error = ManifestError;

    fn try_from(repr: ManifestRepr) -> Result<Self, Self::Error> {
        match repr {
            ManifestRepr::Entries(params) => Manifest::new(params),
            ManifestRepr::Compact(text) => Manifest::parse_compact(&text),
        }
    }
}

impl From<Manifest> for Vec<ParameterSpec> {
    fn from(manifest: Manifest) -> Self {
        manifest.params
    }
}

impl Manifest {
    /// Build a manifest from entries, rejecting unnamed inputs and duplicate return markers
    pub fn new(params: Vec<ParameterSpec>) -> Result<Self, ManifestError> {
        let mut seen_return = false;
        for (idx, param) in params.iter().enumerate() {
            let entry = idx + 1;
            if param.kind.is_return_marker() {
                if seen_return {
                    return Err(ManifestError::DuplicateReturn { entry });
                }
                seen_return = true;
            } else if param.name.trim().is_empty() {
                return Err(ManifestError::EmptyName { entry });
            }
        }
        Ok(Self { params })
    }

    /// Parse the compact line syntax (`type -> name [size]`, `type -> return`)
    pub fn parse_compact(text: &str) -> Result<Self, ManifestError> {
        let mut params = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            let syntax = || ManifestError::Syntax {
                line,
                text: trimmed.to_string(),
            };

            let (ty, rest) = trimmed.split_once("->").ok_or_else(syntax)?;
            let ty = ty.trim();
            let rest = rest.trim();
            if ty.is_empty() || rest.is_empty() {
                return Err(syntax());
            }

            // The return type never drives coercion, so only array element info is kept
            if rest == "return" {
                let mut spec = ParameterSpec::new("return", ParamType::Return);
                if let Some(Some(element)) = parse_array_type(ty) {
                    spec.array_props = Some(ArrayProps {
                        element,
                        size: None,
                    });
                }
                params.push(spec);
                continue;
            }

            let mut words = rest.split_whitespace();
            let name = words.next().ok_or_else(syntax)?;
            let size = words.next();
            if words.next().is_some() {
                return Err(syntax());
            }

            let spec = match parse_array_type(ty) {
                Some(element) => {
                    let element = element.ok_or_else(|| ManifestError::UnknownType {
                        line,
                        tag: ty.to_string(),
                    })?;
                    let size = size
                        .map(|s| {
                            s.parse::<usize>().map_err(|_| ManifestError::InvalidSize {
                                line,
                                size: s.to_string(),
                            })
                        })
                        .transpose()?;
                    ParameterSpec::array(name, element, size)
                }
                None => {
                    if size.is_some() {
                        return Err(syntax());
                    }
                    match ParamType::from_tag(ty) {
                        Some(kind) if !kind.is_return_marker() => ParameterSpec::new(name, kind),
                        _ => {
                            return Err(ManifestError::UnknownType {
                                line,
                                tag: ty.to_string(),
                            });
                        }
                    }
                }
            };
            params.push(spec);
        }

        debug!(count = params.len(), "parsed compact manifest");
        Manifest::new(params)
    }

    /// All declarations, return marker included
    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// Declarations that consume an input, in order
    pub fn inputs(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.params.iter().filter(|p| !p.kind.is_return_marker())
    }

    /// Number of inputs each test case must supply
    pub fn arity(&self) -> usize {
        self.inputs().count()
    }

    /// The return-marker declaration, if any
    pub fn return_spec(&self) -> Option<&ParameterSpec> {
        self.params.iter().find(|p| p.kind.is_return_marker())
    }
}

/// Parse `array<T>` or `T[]`.
///
/// Returns `None` when `ty` is not an array type at all, and `Some(None)` when
/// it is one but the element type is unknown. Nested arrays have element type
/// `array`.
fn parse_array_type(ty: &str) -> Option<Option<ParamType>> {
    let inner = if let Some(body) = ty.strip_prefix("array<") {
        body.strip_suffix('>')?
    } else {
        ty.strip_suffix("[]")?
    };
    let inner = inner.trim();
    if inner.starts_with("array<") || inner.ends_with("[]") {
        return Some(Some(ParamType::Array));
    }
    Some(ParamType::from_tag(inner).filter(|t| !t.is_return_marker()))
}
