//! Tensor types: the static shape of a ranking expression's value.
//!
//! A [`TensorType`] is an ordered set of named dimensions. Each dimension is
//! either *mapped* (sparse, labelled, unbounded) or *indexed* (dense, with a
//! fixed or unbound size). The type with no dimensions is the scalar type.
//!
//! Dimensions are kept sorted by name, so two types built from the same
//! dimensions in different orders compare equal.
//!
//! # Examples
//!
//! ```
//! use rankexpr_ir::TensorType;
//!
//! let image = TensorType::builder()
//!     .indexed_unbound("d0")
//!     .indexed("d1", 784)
//!     .build()
//!     .unwrap();
//! assert_eq!(image.to_string(), "tensor(d0[],d1[784])");
//!
//! let weights: TensorType = "tensor(d1[784],d2[10])".parse().unwrap();
//! let joined = image.join(&weights).unwrap();
//! assert_eq!(joined.to_string(), "tensor(d0[],d1[784],d2[10])");
//!
//! assert!(joined.reduce::<&str>(&[]).unwrap().is_empty());
//! ```

mod parse;
mod value;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::IrError;

pub use value::{Tensor, TensorCell};

/// Storage kind of a dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionKind {
    /// Sparse dimension addressed by string labels
    Mapped,
    /// Dense dimension addressed by integer indexes
    Indexed,
}

/// A named dimension of a tensor type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DimensionData")]
pub struct Dimension {
    name: String,
    kind: DimensionKind,
    /// Size of an indexed dimension, `None` when unbound. Always `None` for mapped dimensions.
    size: Option<u64>,
}

impl Dimension {
    /// A sparse dimension, written `name{}`.
    pub fn mapped(name: impl Into<String>) -> Self {
        Dimension {
            name: name.into(),
            kind: DimensionKind::Mapped,
            size: None,
        }
    }

    /// A dense dimension of a known size, written `name[size]`.
    pub fn indexed(name: impl Into<String>, size: u64) -> Self {
        Dimension {
            name: name.into(),
            kind: DimensionKind::Indexed,
            size: Some(size),
        }
    }

    /// A dense dimension whose size is only known at run time, written `name[]`.
    pub fn indexed_unbound(name: impl Into<String>) -> Self {
        Dimension {
            name: name.into(),
            kind: DimensionKind::Indexed,
            size: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DimensionKind {
        self.kind
    }

    /// Size of an indexed dimension, `None` if unbound or mapped.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn is_indexed(&self) -> bool {
        self.kind == DimensionKind::Indexed
    }

    pub fn is_mapped(&self) -> bool {
        self.kind == DimensionKind::Mapped
    }

    /// Returns a copy of this dimension with a different name.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Dimension {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Combines two same-named dimensions into the narrowest dimension compatible with both.
    ///
    /// A known non-zero size wins over an unbound one or over size zero.
    /// Differing kinds, or two different known non-zero sizes, cannot be combined.
    fn narrow(&self, other: &Dimension) -> Result<Dimension, String> {
        if self.kind != other.kind {
            return Err(format!(
                "dimension '{}' is {} in one operand and {} in the other",
                self.name,
                self.kind_name(),
                other.kind_name()
            ));
        }
        let non_zero = |size: Option<u64>| size.filter(|&n| n != 0);
        match (non_zero(self.size), non_zero(other.size)) {
            (Some(a), Some(b)) if a != b => Err(format!(
                "dimension '{}' has size {} in one operand and {} in the other",
                self.name, a, b
            )),
            (a, b) => Ok(Dimension {
                name: self.name.clone(),
                kind: self.kind,
                size: a.or(b).or(self.size).or(other.size),
            }),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            DimensionKind::Mapped => "mapped",
            DimensionKind::Indexed => "indexed",
        }
    }
}

/// The type of a tensor: its dimensions, sorted by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TensorTypeData")]
pub struct TensorType {
    dimensions: Vec<Dimension>,
}

/// Unchecked serialized form of a [`Dimension`].
#[derive(Deserialize)]
struct DimensionData {
    name: String,
    kind: DimensionKind,
    size: Option<u64>,
}

impl TryFrom<DimensionData> for Dimension {
    type Error = IrError;

    fn try_from(data: DimensionData) -> Result<Self, IrError> {
        if data.name.is_empty() {
            return Err(IrError::InvalidTensorType(
                "a dimension must have a name".to_string(),
            ));
        }
        match (data.kind, data.size) {
            (DimensionKind::Mapped, Some(size)) => Err(IrError::InvalidTensorType(format!(
                "mapped dimension '{}' cannot have size {}",
                data.name, size
            ))),
            (DimensionKind::Mapped, None) => Ok(Dimension::mapped(data.name)),
            (DimensionKind::Indexed, Some(size)) => Ok(Dimension::indexed(data.name, size)),
            (DimensionKind::Indexed, None) => Ok(Dimension::indexed_unbound(data.name)),
        }
    }
}

/// Unchecked serialized form of a [`TensorType`]; dimensions in any order.
#[derive(Deserialize)]
struct TensorTypeData {
    dimensions: Vec<Dimension>,
}

impl TryFrom<TensorTypeData> for TensorType {
    type Error = IrError;

    fn try_from(data: TensorTypeData) -> Result<Self, IrError> {
        TensorType::from_dimensions(data.dimensions)
    }
}

impl TensorType {
    /// The type with no dimensions, i.e. a scalar.
    pub fn empty() -> Self {
        TensorType::default()
    }

    /// Starts building a type dimension by dimension.
    pub fn builder() -> TensorTypeBuilder {
        TensorTypeBuilder::default()
    }

    /// Creates a type from dimensions in any order.
    ///
    /// Fails if two dimensions share a name.
    pub fn from_dimensions(
        dimensions: impl IntoIterator<Item = Dimension>,
    ) -> Result<Self, IrError> {
        let mut dimensions: Vec<Dimension> = dimensions.into_iter().collect();
        dimensions.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = dimensions.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(IrError::InvalidTensorType(format!(
                "dimension '{}' is declared more than once",
                pair[0].name
            )));
        }
        Ok(TensorType { dimensions })
    }

    /// Dimensions sorted by name.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension_names(&self) -> Vec<&str> {
        self.dimensions.iter().map(Dimension::name).collect()
    }

    /// Looks up a dimension by name.
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions
            .binary_search_by(|d| d.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.dimensions[i])
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Whether this is the scalar type.
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Number of cells of a dense tensor of this type, if every dimension is indexed and bound.
    pub fn dense_size(&self) -> Option<u64> {
        self.dimensions
            .iter()
            .try_fold(1u64, |acc, d| match (d.kind, d.size) {
                (DimensionKind::Indexed, Some(size)) => acc.checked_mul(size),
                _ => None,
            })
    }

    /// The type resulting from combining a tensor of this type with one of `other` cell by cell.
    ///
    /// The result has the union of both dimension sets; same-named dimensions are narrowed.
    pub fn join(&self, other: &TensorType) -> Result<TensorType, IrError> {
        let mut joined = Vec::with_capacity(self.rank() + other.rank());
        let mut left = self.dimensions.iter().peekable();
        let mut right = other.dimensions.iter().peekable();
        loop {
            let next = match (left.peek().copied(), right.peek().copied()) {
                (Some(a), Some(b)) => match a.name.cmp(&b.name) {
                    std::cmp::Ordering::Less => left.next().cloned(),
                    std::cmp::Ordering::Greater => right.next().cloned(),
                    std::cmp::Ordering::Equal => {
                        let merged = a.narrow(b).map_err(|reason| IrError::IncompatibleTypes {
                            left: self.to_string(),
                            right: other.to_string(),
                            reason,
                        })?;
                        left.next();
                        right.next();
                        Some(merged)
                    }
                },
                (Some(_), None) => left.next().cloned(),
                (None, Some(_)) => right.next().cloned(),
                (None, None) => None,
            };
            match next {
                Some(dimension) => joined.push(dimension),
                None => break,
            }
        }
        Ok(TensorType { dimensions: joined })
    }

    /// Removes the given dimensions, or all dimensions if none are given.
    pub fn reduce<S: AsRef<str>>(&self, dimensions: &[S]) -> Result<TensorType, IrError> {
        if dimensions.is_empty() {
            return Ok(TensorType::empty());
        }
        let mut removed = HashSet::with_capacity(dimensions.len());
        for name in dimensions {
            let name = name.as_ref();
            if self.dimension(name).is_none() {
                return Err(IrError::UnknownDimension {
                    dimension: name.to_string(),
                    tensor_type: self.to_string(),
                });
            }
            removed.insert(name);
        }
        Ok(TensorType {
            dimensions: self
                .dimensions
                .iter()
                .filter(|d| !removed.contains(d.name.as_str()))
                .cloned()
                .collect(),
        })
    }

    /// Renames dimensions `from[i]` to `to[i]`, keeping their kind and size.
    pub fn rename<S: AsRef<str>, T: AsRef<str>>(
        &self,
        from: &[S],
        to: &[T],
    ) -> Result<TensorType, IrError> {
        if from.len() != to.len() {
            return Err(IrError::InvalidTensorType(format!(
                "rename needs as many target names as source names, got {} and {}",
                from.len(),
                to.len()
            )));
        }
        let mut targets = HashSet::with_capacity(to.len());
        for target in to {
            if !targets.insert(target.as_ref()) {
                return Err(IrError::InvalidTensorType(format!(
                    "dimension '{}' is a rename target more than once",
                    target.as_ref()
                )));
            }
        }
        let mut sources = HashSet::with_capacity(from.len());
        let mut renamed: Vec<Dimension> = self.dimensions.clone();
        for (source, target) in from.iter().zip(to) {
            if !sources.insert(source.as_ref()) {
                return Err(IrError::InvalidTensorType(format!(
                    "dimension '{}' is renamed more than once",
                    source.as_ref()
                )));
            }
            let position = self
                .dimensions
                .iter()
                .position(|d| d.name == source.as_ref())
                .ok_or_else(|| IrError::UnknownDimension {
                    dimension: source.as_ref().to_string(),
                    tensor_type: self.to_string(),
                })?;
            renamed[position] = self.dimensions[position].with_name(target.as_ref());
        }
        TensorType::from_dimensions(renamed)
    }
}

/// Incremental builder for [`TensorType`].
#[derive(Clone, Debug, Default)]
pub struct TensorTypeBuilder {
    dimensions: Vec<Dimension>,
}

impl TensorTypeBuilder {
    pub fn mapped(mut self, name: impl Into<String>) -> Self {
        self.dimensions.push(Dimension::mapped(name));
        self
    }

    pub fn indexed(mut self, name: impl Into<String>, size: u64) -> Self {
        self.dimensions.push(Dimension::indexed(name, size));
        self
    }

    pub fn indexed_unbound(mut self, name: impl Into<String>) -> Self {
        self.dimensions.push(Dimension::indexed_unbound(name));
        self
    }

    pub fn dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    /// Sorts the dimensions and checks their names are unique.
    pub fn build(self) -> Result<TensorType, IrError> {
        TensorType::from_dimensions(self.dimensions)
    }
}
