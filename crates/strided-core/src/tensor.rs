// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Owning tensors and borrowed views.

use crate::{ops, Layout, Result, Shape, TensorError};
use buffer_manager::{AllocError, Allocator, Buffer};

/// An owned, n-dimensional `f32` tensor.
///
/// A `Tensor` is the sole owner of its [`Buffer`]; dropping it releases the
/// buffer and its metadata together. Owning tensors are always contiguous
/// (row-major). Any number of [`TensorView`]s may alias the buffer, and the
/// borrow checker guarantees none of them outlives the tensor.
#[derive(Debug)]
pub struct Tensor {
    layout: Layout,
    buffer: Buffer,
}

/// Checks rank and element count before anything is allocated.
fn checked_len(op: &'static str, shape: &Shape) -> Result<usize> {
    if shape.rank() == 0 {
        return Err(TensorError::invalid(op, "rank-0 shapes are not supported"));
    }
    shape.checked_num_elements()
}

impl Tensor {
    /// Metadata is fully built before the buffer is requested, and nothing
    /// escapes unless both succeed.
    fn allocate(
        op: &'static str,
        shape: Shape,
        alloc: impl FnOnce(usize) -> std::result::Result<Buffer, AllocError>,
    ) -> Result<Self> {
        let len = checked_len(op, &shape)?;
        let layout = Layout::contiguous(shape);
        let buffer = alloc(len)?;
        Ok(Self { layout, buffer })
    }

    /// Creates a tensor whose contents are unspecified by contract. The
    /// buffer is zero-initialised.
    pub fn empty(shape: impl Into<Shape>) -> Result<Self> {
        Self::empty_in(Allocator::global(), shape)
    }

    /// [`Tensor::empty`] charged to `allocator`.
    pub fn empty_in(allocator: &Allocator, shape: impl Into<Shape>) -> Result<Self> {
        Self::allocate("empty", shape.into(), |len| allocator.allocate_zeroed(len))
    }

    /// Creates a tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use strided_core::{Tensor, Shape};
    /// let t = Tensor::zeros(Shape::matrix(2, 3)).unwrap();
    /// assert_eq!(t.len(), 6);
    /// assert!(t.as_slice().iter().all(|&x| x == 0.0));
    /// ```
    pub fn zeros(shape: impl Into<Shape>) -> Result<Self> {
        Self::zeros_in(Allocator::global(), shape)
    }

    /// [`Tensor::zeros`] charged to `allocator`.
    pub fn zeros_in(allocator: &Allocator, shape: impl Into<Shape>) -> Result<Self> {
        Self::allocate("zeros", shape.into(), |len| allocator.allocate_zeroed(len))
    }

    /// Creates a tensor filled with ones.
    pub fn ones(shape: impl Into<Shape>) -> Result<Self> {
        Self::ones_in(Allocator::global(), shape)
    }

    /// [`Tensor::ones`] charged to `allocator`.
    pub fn ones_in(allocator: &Allocator, shape: impl Into<Shape>) -> Result<Self> {
        Self::allocate("ones", shape.into(), |len| allocator.allocate_filled(len, 1.0))
    }

    /// Creates a tensor with every element set to `value`.
    pub fn fill(value: f32, shape: impl Into<Shape>) -> Result<Self> {
        Self::fill_in(Allocator::global(), value, shape)
    }

    /// [`Tensor::fill`] charged to `allocator`.
    pub fn fill_in(allocator: &Allocator, value: f32, shape: impl Into<Shape>) -> Result<Self> {
        Self::allocate("fill", shape.into(), |len| allocator.allocate_filled(len, value))
    }

    /// Creates a tensor from row-major `data`.
    ///
    /// # Errors
    /// Returns [`TensorError::ShapeMismatch`] if `data.len()` differs from the
    /// shape's element count.
    ///
    /// # Examples
    /// ```
    /// use strided_core::{Tensor, Shape};
    /// let t = Tensor::from_data(&[1.0, 2.0, 3.0], Shape::vector(3)).unwrap();
    /// assert_eq!(t.get(&[2]).unwrap(), 3.0);
    /// ```
    pub fn from_data(data: &[f32], shape: impl Into<Shape>) -> Result<Self> {
        Self::from_data_in(Allocator::global(), data, shape)
    }

    /// [`Tensor::from_data`] charged to `allocator`.
    pub fn from_data_in(
        allocator: &Allocator,
        data: &[f32],
        shape: impl Into<Shape>,
    ) -> Result<Self> {
        let shape = shape.into();
        let expected = checked_len("from_data", &shape)?;
        if data.len() != expected {
            return Err(TensorError::ShapeMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Self::allocate("from_data", shape, |_| allocator.allocate_from_slice(data))
    }

    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    pub fn strides(&self) -> &[usize] {
        self.layout.strides()
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Number of elements, `product(shape)`.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the row-major element data.
    pub fn as_slice(&self) -> &[f32] {
        self.buffer.as_slice()
    }

    /// Returns the row-major element data mutably. Requires exclusive access,
    /// so no view of this tensor can be alive.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        self.buffer.as_mut_slice()
    }

    /// Returns the owning buffer handle.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Address of the underlying buffer, for identity checks.
    pub fn buffer_ptr(&self) -> *const f32 {
        self.buffer.as_ptr()
    }

    /// Returns the allocator this tensor's buffer is charged to.
    pub fn allocator(&self) -> Allocator {
        self.buffer.allocator()
    }

    /// Reads the element at `index`.
    ///
    /// # Errors
    /// Returns [`TensorError::IndexOutOfBounds`] for a wrong-rank or
    /// out-of-range index.
    pub fn get(&self, index: &[usize]) -> Result<f32> {
        let offset = self.layout.offset_of(index)?;
        Ok(self.buffer.as_slice()[offset])
    }

    /// Returns a view with this tensor's own layout.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            layout: self.layout.clone(),
            buffer: &self.buffer,
        }
    }

    /// Returns a contiguous view with a different shape of equal element
    /// count. No data is copied.
    ///
    /// # Errors
    /// Returns [`TensorError::ShapeMismatch`] if the element counts differ.
    pub fn reshape(&self, shape: impl Into<Shape>) -> Result<TensorView<'_>> {
        let shape = shape.into();
        let expected = checked_len("reshape", &shape)?;
        if expected != self.len() {
            return Err(TensorError::ShapeMismatch {
                shape,
                expected,
                actual: self.len(),
            });
        }
        reshape_alias(&self.buffer, shape)
    }

    /// See [`TensorView::expand`].
    pub fn expand(&self, shape: impl Into<Shape>) -> Result<TensorView<'_>> {
        self.view().expand(shape)
    }

    /// See [`TensorView::promote_to_column`].
    pub fn promote_to_column(&self) -> Result<TensorView<'_>> {
        self.view().promote_to_column()
    }

    /// Copies this tensor into a fresh buffer from the same allocator.
    pub fn deep_copy(&self) -> Result<Tensor> {
        let allocator = self.allocator();
        Self::from_data_in(&allocator, self.as_slice(), self.shape().clone())
    }

    pub fn add(&self, other: &Tensor) -> Result<Tensor> {
        ops::add(&self.view(), &other.view())
    }

    pub fn sub(&self, other: &Tensor) -> Result<Tensor> {
        ops::sub(&self.view(), &other.view())
    }

    pub fn mul(&self, other: &Tensor) -> Result<Tensor> {
        ops::mul(&self.view(), &other.view())
    }

    pub fn div(&self, other: &Tensor) -> Result<Tensor> {
        ops::div(&self.view(), &other.view())
    }

    /// Batched matrix multiply; see [`ops::matmul`].
    pub fn matmul(&self, other: &Tensor) -> Result<Tensor> {
        ops::matmul(&self.view(), &other.view())
    }
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident) => {
        impl std::ops::$trait<&Tensor> for &Tensor {
            type Output = Result<Tensor>;

            fn $method(self, rhs: &Tensor) -> Self::Output {
                ops::$method(&self.view(), &rhs.view())
            }
        }
    };
}

impl_binary_operator!(Add, add);
impl_binary_operator!(Sub, sub);
impl_binary_operator!(Mul, mul);
impl_binary_operator!(Div, div);

/// Builds a contiguous view of `shape` over an existing buffer. No data is
/// copied.
///
/// Only allocator-issued [`Buffer`]s can be aliased, so every viewed element
/// is accounted to some [`Allocator`]. Caller-owned `&[f32]` data has no such
/// handle; bring it in with [`Tensor::from_data`] (one copy) and alias the
/// resulting tensor's buffer.
///
/// # Errors
/// - [`TensorError::InvalidArgument`] for a rank-0 shape.
/// - [`TensorError::ShapeMismatch`] if the buffer holds fewer than
///   `product(shape)` elements.
pub fn reshape_alias(buffer: &Buffer, shape: impl Into<Shape>) -> Result<TensorView<'_>> {
    let shape = shape.into();
    let expected = checked_len("reshape_alias", &shape)?;
    if buffer.len() < expected {
        return Err(TensorError::ShapeMismatch {
            shape,
            expected,
            actual: buffer.len(),
        });
    }
    Ok(TensorView {
        layout: Layout::contiguous(shape),
        buffer,
    })
}

/// A borrowed, read-only view over a tensor's buffer.
///
/// A view owns only its [`Layout`]; the buffer stays with the owning
/// [`Tensor`]. Dropping a view never releases element data, and the lifetime
/// `'a` ties every view (including views of views) to that owner.
#[derive(Debug, Clone)]
pub struct TensorView<'a> {
    layout: Layout,
    buffer: &'a Buffer,
}

impl<'a> TensorView<'a> {
    /// Creates a view from a layout and a buffer.
    ///
    /// # Errors
    /// Returns [`TensorError::InvalidArgument`] if the layout addresses
    /// elements past the end of the buffer, or if its furthest offset
    /// overflows `usize`.
    pub fn from_parts(layout: Layout, buffer: &'a Buffer) -> Result<Self> {
        let Some(required) = layout.required_len() else {
            return Err(TensorError::invalid(
                "view",
                format!("layout {layout} addresses offsets beyond usize::MAX"),
            ));
        };
        if required > buffer.len() {
            return Err(TensorError::invalid(
                "view",
                format!(
                    "layout {layout} needs {required} elements, buffer has {}",
                    buffer.len()
                ),
            ));
        }
        Ok(Self { layout, buffer })
    }

    /// Re-lays this view's buffer. Only layouts derived from this view's own
    /// layout are passed here, so they stay within the buffer.
    pub(crate) fn with_layout(&self, layout: Layout) -> TensorView<'a> {
        TensorView {
            layout,
            buffer: self.buffer,
        }
    }

    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    pub fn strides(&self) -> &[usize] {
        self.layout.strides()
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Logical element count, `product(shape)`.
    pub fn len(&self) -> usize {
        self.layout.num_elements()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entire underlying buffer, indexed through
    /// [`strides`](TensorView::strides).
    pub fn as_slice(&self) -> &'a [f32] {
        self.buffer.as_slice()
    }

    pub fn buffer(&self) -> &'a Buffer {
        self.buffer
    }

    /// Address of the underlying buffer, for identity checks.
    pub fn buffer_ptr(&self) -> *const f32 {
        self.buffer.as_ptr()
    }

    /// Reads the element at `index` through this view's strides.
    ///
    /// # Errors
    /// Returns [`TensorError::IndexOutOfBounds`] for a wrong-rank or
    /// out-of-range index.
    pub fn get(&self, index: &[usize]) -> Result<f32> {
        let offset = self.layout.offset_of(index)?;
        self.buffer
            .as_slice()
            .get(offset)
            .copied()
            .ok_or_else(|| TensorError::IndexOutOfBounds {
                index: index.to_vec(),
                shape: self.shape().clone(),
            })
    }

    /// Broadcast view of this tensor with shape `shape`. New leading axes and
    /// stretched size-1 axes get stride 0. No data is copied.
    ///
    /// # Errors
    /// - [`TensorError::InvalidArgument`] if `shape` has lower rank.
    /// - [`TensorError::CannotExpand`] if an axis is neither equal nor 1.
    pub fn expand(&self, shape: impl Into<Shape>) -> Result<TensorView<'a>> {
        let layout = self.layout.expand(&shape.into())?;
        Ok(self.with_layout(layout))
    }

    /// Promotes a rank-1 view `[K]` to a column view `[K, 1]`.
    ///
    /// # Errors
    /// Returns [`TensorError::InvalidArgument`] unless this view is rank 1.
    pub fn promote_to_column(&self) -> Result<TensorView<'a>> {
        let layout = self.layout.promote_to_column()?;
        Ok(self.with_layout(layout))
    }

    /// Pads this view with leading size-1, stride-0 axes up to `rank`.
    pub fn align_rank(&self, rank: usize) -> TensorView<'a> {
        self.with_layout(self.layout.align_rank(rank))
    }

    /// Materialises this view into a new contiguous tensor charged to the
    /// same allocator as the viewed buffer.
    pub fn to_contiguous(&self) -> Result<Tensor> {
        let allocator = self.buffer.allocator();
        self.to_contiguous_in(&allocator)
    }

    /// [`TensorView::to_contiguous`] charged to `allocator`.
    pub fn to_contiguous_in(&self, allocator: &Allocator) -> Result<Tensor> {
        let shape = self.shape().clone();
        let len = checked_len("to_contiguous", &shape)?;
        let mut out = Tensor::allocate("to_contiguous", shape, |len| {
            allocator.allocate_zeroed(len)
        })?;

        let src = self.buffer.as_slice();
        let dims = self.layout.dims();
        let strides = self.layout.strides();
        let mut index = vec![0usize; dims.len()];
        let mut offset = 0usize;
        for dst in out.as_mut_slice().iter_mut().take(len) {
            *dst = src[offset];
            // Odometer step, innermost axis first.
            for axis in (0..dims.len()).rev() {
                index[axis] += 1;
                offset += strides[axis];
                if index[axis] < dims[axis] {
                    break;
                }
                offset -= index[axis] * strides[axis];
                index[axis] = 0;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buffer_manager::MemoryBudget;

    #[test]
    fn test_zeros() {
        let t = Tensor::zeros(Shape::matrix(2, 3)).unwrap();
        assert_eq!(t.len(), 6);
        assert_eq!(t.shape(), &Shape::matrix(2, 3));
        assert_eq!(t.strides(), &[3, 1]);
        assert!(t.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_ones_and_fill() {
        let t = Tensor::ones([2, 2]).unwrap();
        assert_eq!(t.as_slice(), &[1.0; 4]);

        let t = Tensor::fill(3.5, [3]).unwrap();
        assert_eq!(t.as_slice(), &[3.5; 3]);

        let t = Tensor::empty([4, 1]).unwrap();
        assert_eq!(t.len(), 4);
        assert_eq!(t.strides(), &[1, 1]);
    }

    #[test]
    fn test_from_data() {
        let data = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let t = Tensor::from_data(&data, Shape::matrix(2, 3)).unwrap();
        assert_eq!(t.as_slice(), &data[..]);
        assert_eq!(t.get(&[1, 0]).unwrap(), 4.0);
    }

    #[test]
    fn test_from_data_size_mismatch() {
        let err = Tensor::from_data(&[1.0; 5], Shape::matrix(2, 3)).unwrap_err();
        assert!(matches!(
            err,
            TensorError::ShapeMismatch { expected: 6, actual: 5, .. }
        ));
    }

    #[test]
    fn test_rank_zero_rejected() {
        let err = Tensor::zeros(Shape::new(vec![])).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_get_out_of_bounds() {
        let t = Tensor::zeros([2, 2]).unwrap();
        assert!(matches!(
            t.get(&[0, 2]),
            Err(TensorError::IndexOutOfBounds { .. })
        ));
        assert!(t.get(&[0, 0, 0]).is_err());
    }

    #[test]
    fn test_budget_refusal_leaves_nothing_allocated() {
        let alloc = Allocator::new(MemoryBudget::from_bytes(16));
        let ok = Tensor::zeros_in(&alloc, [4]).unwrap();
        let err = Tensor::ones_in(&alloc, [1]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::OutOfMemory);
        assert_eq!(alloc.allocated_bytes(), 16);
        drop(ok);
        assert_eq!(alloc.allocated_bytes(), 0);
    }

    #[test]
    fn test_view_shares_buffer() {
        let t = Tensor::from_data(&[1.0, 2.0, 3.0, 4.0], [4]).unwrap();
        let v = t.view();
        assert_eq!(v.buffer_ptr(), t.buffer_ptr());
        assert_eq!(v.get(&[3]).unwrap(), 4.0);
    }

    #[test]
    fn test_dropping_view_keeps_buffer() {
        let alloc = Allocator::unbounded();
        let t = Tensor::ones_in(&alloc, [8]).unwrap();
        let v = t.expand([2, 8]).unwrap();
        drop(v);
        assert_eq!(alloc.allocated_bytes(), 32);
        assert_eq!(t.as_slice(), &[1.0; 8]);
    }

    #[test]
    fn test_reshape_aliases() {
        let t = Tensor::from_data(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [6]).unwrap();
        let r = t.reshape([2, 3]).unwrap();
        assert_eq!(r.buffer_ptr(), t.buffer_ptr());
        assert_eq!(r.strides(), &[3, 1]);
        assert_eq!(r.get(&[1, 1]).unwrap(), 5.0);

        assert!(matches!(
            t.reshape([4, 2]),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_reshape_alias_over_larger_buffer() {
        let t = Tensor::from_data(&[1.0, 2.0, 3.0, 4.0, 5.0], [5]).unwrap();
        let v = reshape_alias(t.buffer(), [2, 2]).unwrap();
        assert_eq!(v.get(&[1, 1]).unwrap(), 4.0);
        assert!(reshape_alias(t.buffer(), [3, 2]).is_err());
    }

    #[test]
    fn test_promote_to_column_view() {
        let t = Tensor::from_data(&[1.0, 2.0, 3.0], [3]).unwrap();
        let c = t.promote_to_column().unwrap();
        assert_eq!(c.shape().dims(), &[3, 1]);
        assert_eq!(c.strides(), &[1, 0]);
        assert_eq!(c.buffer_ptr(), t.buffer_ptr());
        assert_eq!(c.get(&[2, 0]).unwrap(), 3.0);

        let m = Tensor::zeros([2, 2]).unwrap();
        assert!(m.promote_to_column().is_err());
    }

    #[test]
    fn test_expand_view() {
        let t = Tensor::from_data(&[1.0, 2.0, 3.0], [3, 1]).unwrap();
        let e = t.expand([2, 3, 4]).unwrap();
        assert_eq!(e.buffer_ptr(), t.buffer_ptr());
        assert_eq!(e.strides(), &[0, 1, 0]);
        assert_eq!(e.get(&[1, 2, 3]).unwrap(), 3.0);
        assert_eq!(e.len(), 24);
    }

    #[test]
    fn test_from_parts_checks_extent() {
        let t = Tensor::zeros([4]).unwrap();
        let too_big = Layout::contiguous(Shape::matrix(2, 3));
        assert!(TensorView::from_parts(too_big, t.buffer()).is_err());

        let strided = Layout::new(Shape::vector(2), vec![3]).unwrap();
        let v = TensorView::from_parts(strided, t.buffer()).unwrap();
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_from_parts_rejects_overflowing_stride() {
        let t = Tensor::zeros([4]).unwrap();
        let layout = Layout::new(Shape::vector(2), vec![usize::MAX]).unwrap();
        let err = TensorView::from_parts(layout, t.buffer()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);

        let layout = Layout::new(Shape::matrix(2, 2), vec![usize::MAX / 2 + 1, 1]).unwrap();
        assert!(TensorView::from_parts(layout, t.buffer()).is_err());
    }

    #[test]
    fn test_reshape_alias_over_imported_data() {
        let owner = Tensor::from_data(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [6]).unwrap();
        let v = reshape_alias(owner.buffer(), [3, 2]).unwrap();
        assert_eq!(v.buffer_ptr(), owner.buffer_ptr());
        assert_eq!(v.get(&[2, 1]).unwrap(), 6.0);

        let err = reshape_alias(owner.buffer(), [4, 2]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ShapeMismatch);
    }

    #[test]
    fn test_to_contiguous() {
        let t = Tensor::from_data(&[1.0, 2.0, 3.0], [3]).unwrap();
        let e = t.expand([2, 3]).unwrap();
        let c = e.to_contiguous().unwrap();
        assert_eq!(c.as_slice(), &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
        assert_ne!(c.buffer_ptr(), t.buffer_ptr());

        let col = t.promote_to_column().unwrap().expand([3, 2]).unwrap();
        let c = col.to_contiguous().unwrap();
        assert_eq!(c.as_slice(), &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_deep_copy() {
        let alloc = Allocator::unbounded();
        let t = Tensor::fill_in(&alloc, 2.0, [2, 2]).unwrap();
        let c = t.deep_copy().unwrap();
        assert_eq!(c.as_slice(), t.as_slice());
        assert_ne!(c.buffer_ptr(), t.buffer_ptr());
        assert_eq!(alloc.allocated_bytes(), 32);
    }

    #[test]
    fn test_as_mut_slice() {
        let mut t = Tensor::zeros([3]).unwrap();
        t.as_mut_slice().copy_from_slice(&[10.0, 20.0, 30.0]);
        assert_eq!(t.get(&[1]).unwrap(), 20.0);
    }
}
