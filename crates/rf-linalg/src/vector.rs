//! Owning vectors and aliasing views.
//!
//! A `Vector` owns its storage. `VectorView` / `VectorViewMut` borrow a
//! contiguous sub-range of another vector (or view): every read and write goes
//! straight to the backing storage, nothing is copied.

use std::ops::{Deref, DerefMut};

use nalgebra::DVector;

use crate::error::{LinalgError, LinalgResult};

/// Sum of absolute values.
pub fn l1_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x.abs()).sum()
}

fn check_range(offset: usize, len: usize, size: usize) -> LinalgResult<()> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(LinalgError::ViewOutOfBounds { offset, len, size }),
    }
}

/// Dense owning vector.
#[derive(Clone, Debug, PartialEq)]
pub struct Vector {
    data: DVector<f64>,
}

impl Vector {
    pub fn zeros(len: usize) -> Self {
        Self {
            data: DVector::zeros(len),
        }
    }

    pub fn from_vec(values: Vec<f64>) -> Self {
        Self {
            data: DVector::from_vec(values),
        }
    }

    pub fn from_slice(values: &[f64]) -> Self {
        Self {
            data: DVector::from_column_slice(values),
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        self.data.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        self.data.as_mut_slice()
    }

    /// Copy `src` into this vector; lengths must agree.
    pub fn copy_from(&mut self, src: &[f64]) -> LinalgResult<()> {
        if src.len() != self.len() {
            return Err(LinalgError::DimensionMismatch {
                expected: self.len(),
                actual: src.len(),
            });
        }
        self.as_mut_slice().copy_from_slice(src);
        Ok(())
    }

    /// Read-only view of `len` entries starting at `offset`.
    pub fn view(&self, offset: usize, len: usize) -> LinalgResult<VectorView<'_>> {
        check_range(offset, len, self.len())?;
        Ok(VectorView {
            data: &self.as_slice()[offset..offset + len],
            offset,
        })
    }

    /// Writable view of `len` entries starting at `offset`.
    pub fn view_mut(&mut self, offset: usize, len: usize) -> LinalgResult<VectorViewMut<'_>> {
        check_range(offset, len, self.len())?;
        Ok(VectorViewMut {
            data: &mut self.as_mut_slice()[offset..offset + len],
            offset,
        })
    }

    /// Split into two disjoint writable views `[0, mid)` and `[mid, len)`.
    pub fn split_views_mut(
        &mut self,
        mid: usize,
    ) -> LinalgResult<(VectorViewMut<'_>, VectorViewMut<'_>)> {
        check_range(0, mid, self.len())?;
        let (head, tail) = self.as_mut_slice().split_at_mut(mid);
        Ok((
            VectorViewMut {
                data: head,
                offset: 0,
            },
            VectorViewMut {
                data: tail,
                offset: mid,
            },
        ))
    }
}

impl Deref for Vector {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        self.as_slice()
    }
}

impl DerefMut for Vector {
    fn deref_mut(&mut self) -> &mut [f64] {
        self.as_mut_slice()
    }
}

impl From<Vec<f64>> for Vector {
    fn from(values: Vec<f64>) -> Self {
        Self::from_vec(values)
    }
}

impl From<DVector<f64>> for Vector {
    fn from(data: DVector<f64>) -> Self {
        Self { data }
    }
}

/// Read-only alias of a sub-range of a vector.
#[derive(Clone, Copy, Debug)]
pub struct VectorView<'a> {
    data: &'a [f64],
    offset: usize,
}

impl<'a> VectorView<'a> {
    /// Offset of this view inside the vector it was taken from.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn as_slice(&self) -> &'a [f64] {
        self.data
    }

    /// Narrow this view further; offsets are relative to this view.
    pub fn view(&self, offset: usize, len: usize) -> LinalgResult<VectorView<'a>> {
        check_range(offset, len, self.data.len())?;
        Ok(VectorView {
            data: &self.data[offset..offset + len],
            offset: self.offset + offset,
        })
    }
}

impl Deref for VectorView<'_> {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        self.data
    }
}

/// Writable alias of a sub-range of a vector.
#[derive(Debug)]
pub struct VectorViewMut<'a> {
    data: &'a mut [f64],
    offset: usize,
}

impl VectorViewMut<'_> {
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Narrow this view further; offsets are relative to this view.
    pub fn view_mut(&mut self, offset: usize, len: usize) -> LinalgResult<VectorViewMut<'_>> {
        check_range(offset, len, self.data.len())?;
        Ok(VectorViewMut {
            data: &mut self.data[offset..offset + len],
            offset: self.offset + offset,
        })
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }
}

impl Deref for VectorViewMut<'_> {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &*self.data
    }
}

impl DerefMut for VectorViewMut<'_> {
    fn deref_mut(&mut self) -> &mut [f64] {
        &mut *self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_reads_backing_storage() {
        let v = Vector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let view = v.view(1, 2).unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(view[0], 2.0);
        assert_eq!(view[1], 3.0);
        assert_eq!(view.offset(), 1);
    }

    #[test]
    fn view_mut_writes_through() {
        let mut v = Vector::zeros(5);
        {
            let mut view = v.view_mut(2, 3).unwrap();
            view[0] = 7.0;
            view[2] = 9.0;
        }
        assert_eq!(v.as_slice(), &[0.0, 0.0, 7.0, 0.0, 9.0]);
    }

    #[test]
    fn nested_view_offsets_accumulate() {
        let mut v = Vector::zeros(6);
        let mut outer = v.view_mut(1, 5).unwrap();
        let mut inner = outer.view_mut(2, 2).unwrap();
        assert_eq!(inner.offset(), 3);
        inner.fill(1.5);
        assert_eq!(v.as_slice(), &[0.0, 0.0, 0.0, 1.5, 1.5, 0.0]);
    }

    #[test]
    fn split_views_are_disjoint() {
        let mut v = Vector::from_vec(vec![1.0, 2.0, 3.0]);
        let (mut head, mut tail) = v.split_views_mut(1).unwrap();
        head[0] = 10.0;
        tail[1] = 30.0;
        assert_eq!(tail.offset(), 1);
        assert_eq!(v.as_slice(), &[10.0, 2.0, 30.0]);
    }

    #[test]
    fn out_of_range_view_is_rejected() {
        let v = Vector::zeros(3);
        assert_eq!(
            v.view(2, 2).unwrap_err(),
            LinalgError::ViewOutOfBounds {
                offset: 2,
                len: 2,
                size: 3
            }
        );
        assert!(v.view(3, 0).is_ok());
    }

    #[test]
    fn copy_from_checks_length() {
        let mut v = Vector::zeros(2);
        assert!(v.copy_from(&[1.0]).is_err());
        v.copy_from(&[1.0, -2.0]).unwrap();
        assert_eq!(l1_norm(&v), 3.0);
    }
}
