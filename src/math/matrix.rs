use rand::prelude::*;
use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};

/// Dense row-major 2D grid of `f64`.
///
/// The shape is fixed at construction. Every operation except
/// [`Matrix::randomize`] returns a new matrix and leaves its operands untouched.
/// Serializes as a plain nested array (`[[1.0, 2.0], [3.0, 4.0]]`); ragged
/// arrays are rejected on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Matrix of uniform samples in `[-1, 1]` drawn from the thread RNG.
    pub fn random(rows: usize, cols: usize) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        res.randomize();
        res
    }

    /// Copies a nested array. Every row must have the length of the first.
    pub fn from_data(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let cols = data.first().map_or(0, |row| row.len());
        if let Some((row, found)) = data
            .iter()
            .map(|r| r.len())
            .enumerate()
            .find(|&(_, len)| len != cols)
        {
            return Err(NnError::RaggedRows { row, expected: cols, found });
        }

        Ok(Matrix {
            rows: data.len(),
            cols,
            data,
        })
    }

    /// Single-column matrix `(values.len(), 1)` from a flat sequence.
    pub fn from_column(values: &[f64]) -> Matrix {
        Matrix {
            rows: values.len(),
            cols: 1,
            data: values.iter().map(|&v| vec![v]).collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn data(&self) -> &[Vec<f64>] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Elements in row-major order.
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.iter().flatten().copied().collect()
    }

    /// Overwrites every element with a uniform sample in `[-1, 1]` from the
    /// thread RNG. The only in-place operation.
    pub fn randomize(&mut self) {
        self.randomize_with(&mut rand::thread_rng());
    }

    /// Like [`Matrix::randomize`] but draws from the given RNG, so seeded
    /// construction is reproducible.
    pub fn randomize_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for row in &mut self.data {
            for x in row.iter_mut() {
                *x = rng.gen_range(-1.0..=1.0);
            }
        }
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Like [`Matrix::map`] but also passes the `(row, col)` of each element.
    pub fn map_indexed<F>(&self, functor: F) -> Matrix
    where
        F: Fn(usize, usize, f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .enumerate()
                .map(|(i, row)| row.iter().enumerate().map(|(j, &x)| functor(i, j, x)).collect())
                .collect(),
        }
    }

    /// Folds over all elements in row-major order.
    pub fn reduce<U, F>(&self, init: U, f: F) -> U
    where
        F: Fn(U, f64) -> U,
    {
        self.data.iter().flatten().fold(init, |acc, &x| f(acc, x))
    }

    pub fn sum(&self) -> f64 {
        self.reduce(0.0, |acc, x| acc + x)
    }

    pub fn scalar_multiply(&self, k: f64) -> Matrix {
        self.map(|x| x * k)
    }

    pub fn add_scalar(&self, k: f64) -> Matrix {
        self.map(|x| x + k)
    }

    /// Matrix product. Requires `self.cols == rhs.rows`; the result is
    /// `(self.rows, rhs.cols)`.
    pub fn dot(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(NnError::shape("dot", self.shape(), rhs.shape()));
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;

                for k in 0..self.cols {
                    sum += self.data[i][k] * rhs.data[k][j];
                }

                res.data[i][j] = sum;
            }
        }

        Ok(res)
    }

    /// Elementwise sum. If shapes differ, `rhs` is broadcast when it is a
    /// single row with matching `cols`, or a single column with matching
    /// `rows`.
    pub fn add(&self, rhs: &Matrix) -> Result<Matrix> {
        let compatible = self.shape() == rhs.shape()
            || (rhs.rows == 1 && rhs.cols == self.cols)
            || (rhs.cols == 1 && rhs.rows == self.rows);
        if !compatible {
            return Err(NnError::shape("add", self.shape(), rhs.shape()));
        }

        // A size-1 axis of rhs is repeated along that axis.
        let row_of = |i: usize| if rhs.rows == 1 { 0 } else { i };
        let col_of = |j: usize| if rhs.cols == 1 { 0 } else { j };

        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = self.data[i][j] + rhs.data[row_of(i)][col_of(j)];
            }
        }

        Ok(res)
    }

    /// Elementwise difference. Unlike [`Matrix::add`] there is no
    /// broadcasting: shapes must be identical.
    pub fn subtract(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "subtract", |a, b| a - b)
    }

    /// Hadamard product; shapes must be identical.
    pub fn multiply_elementwise(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "multiply_elementwise", |a, b| a * b)
    }

    fn zip_with<F>(&self, rhs: &Matrix, op: &'static str, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.shape() != rhs.shape() {
            return Err(NnError::shape(op, self.shape(), rhs.shape()));
        }

        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(row_a, row_b)| row_a.iter().zip(row_b.iter()).map(|(&x, &y)| f(x, y)).collect())
            .collect();

        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = NnError;

    fn try_from(data: Vec<Vec<f64>>) -> Result<Self> {
        Matrix::from_data(data)
    }
}

impl From<Matrix> for Vec<Vec<f64>> {
    fn from(m: Matrix) -> Self {
        m.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    fn m(data: Vec<Vec<f64>>) -> Matrix {
        Matrix::from_data(data).unwrap()
    }

    #[test]
    fn dot_produces_expected_product() {
        let a = m(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let b = m(vec![vec![7.0, 8.0], vec![9.0, 10.0], vec![11.0, 12.0]]);

        let c = a.dot(&b).unwrap();

        assert_eq!(c.shape(), (2, 2));
        assert_eq!(c, m(vec![vec![58.0, 64.0], vec![139.0, 154.0]]));
    }

    #[test]
    fn dot_rejects_incompatible_shapes_and_reports_both() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(2, 2);

        match a.dot(&b) {
            Err(NnError::ShapeMismatch { op, left, right }) => {
                assert_eq!(op, "dot");
                assert_eq!(left, (2, 3));
                assert_eq!(right, (2, 2));
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
        assert_eq!(a, Matrix::zeros(2, 3));
        assert_eq!(b, Matrix::zeros(2, 2));
    }

    #[test]
    fn transpose_of_product_equals_product_of_transposes() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut a = Matrix::zeros(3, 4);
        let mut b = Matrix::zeros(4, 2);
        a.randomize_with(&mut rng);
        b.randomize_with(&mut rng);

        let lhs = b.transpose().dot(&a.transpose()).unwrap();
        let rhs = a.dot(&b).unwrap().transpose();

        assert_eq!(lhs, rhs);
    }

    #[test]
    fn add_is_commutative_for_equal_shapes() {
        let a = m(vec![vec![1.0, -2.0], vec![0.5, 3.0]]);
        let b = m(vec![vec![4.0, 1.0], vec![-1.5, 2.0]]);

        assert_eq!(a.add(&b).unwrap(), b.add(&a).unwrap());
    }

    #[test]
    fn add_broadcasts_row_like_tiled_operand() {
        let a = m(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let row = m(vec![vec![10.0, 20.0, 30.0]]);
        let tiled = m(vec![vec![10.0, 20.0, 30.0], vec![10.0, 20.0, 30.0]]);

        assert_eq!(a.add(&row).unwrap(), a.add(&tiled).unwrap());
    }

    #[test]
    fn add_broadcasts_column_like_tiled_operand() {
        let a = m(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let col = Matrix::from_column(&[100.0, 200.0]);
        let tiled = m(vec![vec![100.0, 100.0, 100.0], vec![200.0, 200.0, 200.0]]);

        assert_eq!(a.add(&col).unwrap(), a.add(&tiled).unwrap());
    }

    #[test]
    fn add_rejects_unbroadcastable_shapes() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(3, 2);

        assert!(matches!(a.add(&b), Err(NnError::ShapeMismatch { op: "add", .. })));
    }

    #[test]
    fn subtract_does_not_broadcast_unlike_add() {
        let a = Matrix::zeros(2, 3);
        let row = Matrix::zeros(1, 3);

        assert!(a.add(&row).is_ok());
        assert!(matches!(
            a.subtract(&row),
            Err(NnError::ShapeMismatch { op: "subtract", left: (2, 3), right: (1, 3) })
        ));
    }

    #[test]
    fn subtract_and_hadamard_work_elementwise() {
        let a = m(vec![vec![5.0, 6.0], vec![7.0, 8.0]]);
        let b = m(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);

        assert_eq!(a.subtract(&b).unwrap(), m(vec![vec![4.0, 4.0], vec![4.0, 4.0]]));
        assert_eq!(
            a.multiply_elementwise(&b).unwrap(),
            m(vec![vec![5.0, 12.0], vec![21.0, 32.0]])
        );
        assert!(a.multiply_elementwise(&Matrix::zeros(2, 1)).is_err());
    }

    #[test]
    fn transpose_swaps_indices() {
        let a = m(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let t = a.transpose();

        assert_eq!(t.shape(), (3, 2));
        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(t.get(j, i), a.get(i, j));
            }
        }
    }

    #[test]
    fn map_scalar_and_reduce_preserve_shape_and_order() {
        let a = m(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);

        assert_eq!(a.map(|x| x * x), m(vec![vec![1.0, 4.0], vec![9.0, 16.0]]));
        assert_eq!(a.scalar_multiply(0.5).shape(), (2, 2));
        assert_eq!(a.add_scalar(1.0).sum(), 14.0);

        let visited = a.reduce(Vec::new(), |mut acc, x| {
            acc.push(x);
            acc
        });
        assert_eq!(visited, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn randomize_stays_in_unit_range() {
        let mut a = Matrix::zeros(10, 10);
        a.randomize();

        assert!(a.to_vec().iter().all(|x| (-1.0..=1.0).contains(x)));
        assert_eq!(a.shape(), (10, 10));
    }

    #[test]
    fn from_data_rejects_ragged_rows() {
        let err = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();

        assert!(matches!(err, NnError::RaggedRows { row: 1, expected: 2, found: 1 }));
    }

    #[test]
    fn serde_uses_nested_arrays() {
        let a = m(vec![vec![1.5, -2.0], vec![0.1, 3.0]]);

        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "[[1.5,-2.0],[0.1,3.0]]");

        let back: Matrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
        assert!(serde_json::from_str::<Matrix>("[[1.0],[2.0,3.0]]").is_err());
    }
}
