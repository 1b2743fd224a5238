//! Constant tensor values.
//!
//! These hold the cells of constants taken from imported models. No arithmetic
//! is defined on them; evaluation belongs to the serving runtime.

use serde::{Deserialize, Serialize};

use super::TensorType;
use crate::error::IrError;

/// A cell of a sparse tensor: one label per dimension, in dimension order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TensorCell {
    pub address: Vec<String>,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum Cells {
    /// Row-major cells of a fully bound indexed type
    Dense(Vec<f64>),
    Sparse(Vec<TensorCell>),
}

/// A tensor value: a type and its cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TensorData")]
pub struct Tensor {
    tensor_type: TensorType,
    cells: Cells,
}

#[derive(Deserialize)]
struct TensorData {
    tensor_type: TensorType,
    cells: Cells,
}

impl TryFrom<TensorData> for Tensor {
    type Error = IrError;

    fn try_from(data: TensorData) -> Result<Self, IrError> {
        match data.cells {
            Cells::Dense(values) => Tensor::dense(data.tensor_type, values),
            Cells::Sparse(cells) => Tensor::sparse(data.tensor_type, cells),
        }
    }
}

impl Tensor {
    /// Creates a dense tensor. The type must have only bound indexed dimensions
    /// and `values` must hold exactly one value per cell.
    pub fn dense(tensor_type: TensorType, values: Vec<f64>) -> Result<Self, IrError> {
        let expected = tensor_type.dense_size().ok_or_else(|| {
            IrError::InvalidTensor(format!(
                "{} is not a bound dense type",
                tensor_type
            ))
        })?;
        if values.len() as u64 != expected {
            return Err(IrError::InvalidTensor(format!(
                "{} has {} cells, but {} values were given",
                tensor_type,
                expected,
                values.len()
            )));
        }
        Ok(Tensor {
            tensor_type,
            cells: Cells::Dense(values),
        })
    }

    /// Creates a sparse tensor from labelled cells.
    pub fn sparse(
        tensor_type: TensorType,
        cells: impl IntoIterator<Item = TensorCell>,
    ) -> Result<Self, IrError> {
        let cells: Vec<TensorCell> = cells.into_iter().collect();
        if let Some(cell) = cells.iter().find(|c| c.address.len() != tensor_type.rank()) {
            return Err(IrError::InvalidTensor(format!(
                "address {:?} does not match {}",
                cell.address, tensor_type
            )));
        }
        Ok(Tensor {
            tensor_type,
            cells: Cells::Sparse(cells),
        })
    }

    pub fn scalar(value: f64) -> Self {
        Tensor {
            tensor_type: TensorType::empty(),
            cells: Cells::Dense(vec![value]),
        }
    }

    pub fn tensor_type(&self) -> &TensorType {
        &self.tensor_type
    }

    /// Number of cells in this tensor.
    pub fn size(&self) -> usize {
        match &self.cells {
            Cells::Dense(values) => values.len(),
            Cells::Sparse(cells) => cells.len(),
        }
    }

    /// The cell values in storage order.
    pub fn values(&self) -> Vec<f64> {
        match &self.cells {
            Cells::Dense(values) => values.clone(),
            Cells::Sparse(cells) => cells.iter().map(|c| c.value).collect(),
        }
    }
}
