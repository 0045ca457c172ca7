//! Scoped ownership of working matrices.
//!
//! Every matrix a transform needs (resized operands, grayscale copies,
//! kernels, 16-bit gradient planes, the result) is allocated through a
//! [`Scope`]. The scope owns them and releases each still-live matrix exactly
//! once when it is dropped, whichever way the invocation exits.
//!
//! [`live_mat_count`] reports how many matrices are alive on the current
//! thread. Matrices are not `Send`, so the count is exact per thread and a
//! completed invocation always brings it back to its starting value.

use std::cell::Cell;
use std::marker::PhantomData;

use log::{debug, trace, warn};

use crate::buffer::{expected_len, RasterBuffer};
use crate::error::{Result, TransformError};

thread_local! {
    static LIVE_MATS: Cell<usize> = const { Cell::new(0) };
}

/// Number of matrices currently alive on the calling thread.
pub fn live_mat_count() -> usize {
    LIVE_MATS.with(Cell::get)
}

fn track_acquire() {
    LIVE_MATS.with(|live| live.set(live.get() + 1));
}

fn track_release() {
    LIVE_MATS.with(|live| match live.get().checked_sub(1) {
        Some(n) => live.set(n),
        None => warn!("matrix released with no live matrices on this thread"),
    });
}

/// Element type of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// Unsigned 8-bit, the depth of every input and output image.
    U8,
    /// Signed 16-bit, used for gradient responses.
    I16,
    /// 32-bit float, used for kernels.
    F32,
}

impl Depth {
    fn elem_size(self) -> usize {
        match self {
            Depth::U8 => 1,
            Depth::I16 => 2,
            Depth::F32 => 4,
        }
    }
}

#[derive(Debug)]
enum MatData {
    U8(Vec<u8>),
    I16(Vec<i16>),
    F32(Vec<f32>),
}

impl MatData {
    fn depth(&self) -> Depth {
        match self {
            MatData::U8(_) => Depth::U8,
            MatData::I16(_) => Depth::I16,
            MatData::F32(_) => Depth::F32,
        }
    }
}

fn depth_mismatch(expected: Depth, found: Depth) -> TransformError {
    TransformError::InternalProcessingFailure(format!(
        "expected {expected:?} matrix, found {found:?}"
    ))
}

/// A working matrix: `rows x cols` interleaved elements with `channels`
/// values each.
#[derive(Debug)]
pub struct Mat {
    rows: u32,
    cols: u32,
    channels: u8,
    data: MatData,
    // Ties the matrix to the thread whose live counter it was added to.
    _not_send: PhantomData<*const ()>,
}

impl Mat {
    fn zeros(rows: u32, cols: u32, channels: u8, depth: Depth) -> Result<Self> {
        let alloc_failure = |bytes| TransformError::ResourceAllocationFailure {
            rows,
            cols,
            channels,
            bytes,
        };
        let len = expected_len(cols, rows, channels).ok_or_else(|| alloc_failure(usize::MAX))?;
        let bytes = len
            .checked_mul(depth.elem_size())
            .ok_or_else(|| alloc_failure(usize::MAX))?;

        let data = match depth {
            Depth::U8 => MatData::U8(try_alloc(len).ok_or_else(|| alloc_failure(bytes))?),
            Depth::I16 => MatData::I16(try_alloc(len).ok_or_else(|| alloc_failure(bytes))?),
            Depth::F32 => MatData::F32(try_alloc(len).ok_or_else(|| alloc_failure(bytes))?),
        };
        Ok(Self::with_data(rows, cols, channels, data))
    }

    fn with_data(rows: u32, cols: u32, channels: u8, data: MatData) -> Self {
        track_acquire();
        Self {
            rows,
            cols,
            channels,
            data,
            _not_send: PhantomData,
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn depth(&self) -> Depth {
        self.data.depth()
    }

    /// Number of scalar elements (`rows * cols * channels`).
    pub fn len(&self) -> usize {
        self.rows as usize * self.cols as usize * self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both matrices share rows, cols and channels.
    pub fn same_shape(&self, other: &Mat) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.channels == other.channels
    }

    pub fn as_u8(&self) -> Result<&[u8]> {
        match &self.data {
            MatData::U8(v) => Ok(v),
            other => Err(depth_mismatch(Depth::U8, other.depth())),
        }
    }

    pub fn as_u8_mut(&mut self) -> Result<&mut [u8]> {
        match &mut self.data {
            MatData::U8(v) => Ok(v),
            other => Err(depth_mismatch(Depth::U8, other.depth())),
        }
    }

    pub fn as_i16(&self) -> Result<&[i16]> {
        match &self.data {
            MatData::I16(v) => Ok(v),
            other => Err(depth_mismatch(Depth::I16, other.depth())),
        }
    }

    pub fn as_i16_mut(&mut self) -> Result<&mut [i16]> {
        match &mut self.data {
            MatData::I16(v) => Ok(v),
            other => Err(depth_mismatch(Depth::I16, other.depth())),
        }
    }

    pub fn as_f32(&self) -> Result<&[f32]> {
        match &self.data {
            MatData::F32(v) => Ok(v),
            other => Err(depth_mismatch(Depth::F32, other.depth())),
        }
    }

    pub fn as_f32_mut(&mut self) -> Result<&mut [f32]> {
        match &mut self.data {
            MatData::F32(v) => Ok(v),
            other => Err(depth_mismatch(Depth::F32, other.depth())),
        }
    }

    fn into_buffer(mut self) -> Result<RasterBuffer> {
        let pixels = match &mut self.data {
            MatData::U8(v) => std::mem::take(v),
            other => return Err(depth_mismatch(Depth::U8, other.depth())),
        };
        RasterBuffer::new(self.cols, self.rows, self.channels, pixels)
    }
}

impl Drop for Mat {
    fn drop(&mut self) {
        track_release();
    }
}

fn try_alloc<T: Clone + Default>(len: usize) -> Option<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).ok()?;
    v.resize(len, T::default());
    Some(v)
}

/// Handle to a matrix owned by a [`Scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatId(usize);

/// Per-invocation arena of working matrices.
pub struct Scope {
    label: &'static str,
    slots: Vec<Option<Mat>>,
}

impl Scope {
    /// Open a scope; `label` names the invocation in log output.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            slots: Vec::new(),
        }
    }

    /// Allocate a zero-filled matrix.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::ResourceAllocationFailure` if the size
    /// overflows or the allocator refuses the request.
    pub fn alloc(&mut self, rows: u32, cols: u32, channels: u8, depth: Depth) -> Result<MatId> {
        let mat = Mat::zeros(rows, cols, channels, depth)?;
        Ok(self.register(mat))
    }

    /// Allocate an 8-bit matrix shaped like `buffer` and copy its pixels in.
    pub fn import(&mut self, buffer: &RasterBuffer) -> Result<MatId> {
        let id = self.alloc(buffer.height, buffer.width, buffer.channels, Depth::U8)?;
        let data = self.mat_mut(id)?.as_u8_mut()?;
        if data.len() != buffer.pixels.len() {
            return Err(TransformError::InvalidInput(format!(
                "expected {} bytes, got {}",
                data.len(),
                buffer.pixels.len()
            )));
        }
        data.copy_from_slice(&buffer.pixels);
        Ok(id)
    }

    /// Move an owned buffer into the scope without copying.
    pub fn adopt(&mut self, buffer: RasterBuffer) -> MatId {
        let mat = Mat::with_data(
            buffer.height,
            buffer.width,
            buffer.channels,
            MatData::U8(buffer.pixels),
        );
        self.register(mat)
    }

    /// Allocate an 8-bit matrix with the same shape as `like`.
    pub fn alloc_like(&mut self, like: MatId) -> Result<MatId> {
        let (rows, cols, channels) = {
            let mat = self.mat(like)?;
            (mat.rows, mat.cols, mat.channels)
        };
        self.alloc(rows, cols, channels, Depth::U8)
    }

    fn register(&mut self, mat: Mat) -> MatId {
        let id = MatId(self.slots.len());
        trace!(
            "{}: acquired mat #{} ({}x{}x{} {:?})",
            self.label,
            id.0,
            mat.rows,
            mat.cols,
            mat.channels,
            mat.depth()
        );
        self.slots.push(Some(mat));
        id
    }

    pub fn mat(&self, id: MatId) -> Result<&Mat> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| self.dead_handle(id))
    }

    pub fn mat_mut(&mut self, id: MatId) -> Result<&mut Mat> {
        let err = self.dead_handle(id);
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(err)
    }

    /// Borrow `src` immutably and `dst` mutably at the same time.
    pub fn pair_mut(&mut self, src: MatId, dst: MatId) -> Result<(&Mat, &mut Mat)> {
        if src == dst {
            return Err(TransformError::InternalProcessingFailure(format!(
                "{}: mat #{} used as both source and destination",
                self.label, src.0
            )));
        }
        let (src_err, dst_err) = (self.dead_handle(src), self.dead_handle(dst));
        if src.0 >= self.slots.len() {
            return Err(src_err);
        }
        if dst.0 >= self.slots.len() {
            return Err(dst_err);
        }
        let (src_slot, dst_slot) = if src.0 < dst.0 {
            let (lo, hi) = self.slots.split_at_mut(dst.0);
            (&lo[src.0], &mut hi[0])
        } else {
            let (lo, hi) = self.slots.split_at_mut(src.0);
            (&hi[0], &mut lo[dst.0])
        };
        Ok((
            src_slot.as_ref().ok_or(src_err)?,
            dst_slot.as_mut().ok_or(dst_err)?,
        ))
    }

    /// Run `f` with `dst` checked out mutably while the rest of the scope
    /// stays readable. `dst` is checked back in whether or not `f` fails.
    pub fn with_output<R>(
        &mut self,
        dst: MatId,
        f: impl FnOnce(&Scope, &mut Mat) -> Result<R>,
    ) -> Result<R> {
        let err = self.dead_handle(dst);
        let mut out = self
            .slots
            .get_mut(dst.0)
            .and_then(Option::take)
            .ok_or(err)?;
        let result = f(self, &mut out);
        self.slots[dst.0] = Some(out);
        result
    }

    /// Release a matrix before the scope ends.
    ///
    /// Releasing an id twice is logged and otherwise ignored.
    pub fn release(&mut self, id: MatId) {
        match self.slots.get_mut(id.0).and_then(Option::take) {
            Some(mat) => {
                trace!("{}: released mat #{}", self.label, id.0);
                drop(mat);
            }
            None => warn!("{}: mat #{} already released", self.label, id.0),
        }
    }

    /// Move an 8-bit matrix out of the scope as a [`RasterBuffer`].
    pub fn take_buffer(&mut self, id: MatId) -> Result<RasterBuffer> {
        let err = self.dead_handle(id);
        let mat = self.slots.get_mut(id.0).and_then(Option::take).ok_or(err)?;
        mat.into_buffer()
    }

    /// Number of matrices still owned by this scope.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    fn dead_handle(&self, id: MatId) -> TransformError {
        TransformError::InternalProcessingFailure(format!(
            "{}: mat #{} is not live",
            self.label, id.0
        ))
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let live = self.live();
        debug!(
            "{}: closing scope, releasing {} of {} mats",
            self.label,
            live,
            self.slots.len()
        );
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_releases_everything_on_drop() {
        let baseline = live_mat_count();
        {
            let mut scope = Scope::new("test");
            scope.alloc(4, 4, 3, Depth::U8).unwrap();
            scope.alloc(4, 4, 1, Depth::I16).unwrap();
            scope.alloc(1, 5, 1, Depth::F32).unwrap();
            assert_eq!(scope.live(), 3);
            assert_eq!(live_mat_count(), baseline + 3);
        }
        assert_eq!(live_mat_count(), baseline);
    }

    #[test]
    fn test_early_release_is_not_repeated() {
        let baseline = live_mat_count();
        {
            let mut scope = Scope::new("test");
            let a = scope.alloc(2, 2, 1, Depth::U8).unwrap();
            scope.alloc(2, 2, 1, Depth::U8).unwrap();
            scope.release(a);
            assert_eq!(live_mat_count(), baseline + 1);
            // second release is a logged no-op
            scope.release(a);
            assert_eq!(live_mat_count(), baseline + 1);
            assert!(scope.mat(a).is_err());
        }
        assert_eq!(live_mat_count(), baseline);
    }

    #[test]
    fn test_scope_released_on_error_path() {
        fn failing() -> Result<()> {
            let mut scope = Scope::new("failing");
            scope.alloc(8, 8, 4, Depth::U8)?;
            scope.alloc(8, 8, 4, Depth::U8)?;
            Err(TransformError::InternalProcessingFailure("boom".into()))
        }

        let baseline = live_mat_count();
        assert!(failing().is_err());
        assert_eq!(live_mat_count(), baseline);
    }

    #[test]
    fn test_alloc_overflow_is_allocation_failure() {
        let baseline = live_mat_count();
        let mut scope = Scope::new("test");
        let result = scope.alloc(u32::MAX, u32::MAX, 4, Depth::I16);
        assert!(matches!(
            result,
            Err(TransformError::ResourceAllocationFailure { .. })
        ));
        assert_eq!(scope.live(), 0);
        assert_eq!(live_mat_count(), baseline);
    }

    #[test]
    fn test_import_and_take_buffer() {
        let baseline = live_mat_count();
        let buffer = RasterBuffer::new(3, 2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let mut scope = Scope::new("test");
        let id = scope.import(&buffer).unwrap();
        let mat = scope.mat(id).unwrap();
        assert_eq!((mat.rows(), mat.cols(), mat.channels()), (2, 3, 1));

        let out = scope.take_buffer(id).unwrap();
        assert_eq!(out, buffer);
        assert_eq!(scope.live(), 0);
        assert_eq!(live_mat_count(), baseline);
    }

    #[test]
    fn test_take_buffer_rejects_non_u8() {
        let mut scope = Scope::new("test");
        let id = scope.alloc(2, 2, 1, Depth::I16).unwrap();
        assert!(matches!(
            scope.take_buffer(id),
            Err(TransformError::InternalProcessingFailure(_))
        ));
    }

    #[test]
    fn test_pair_mut_both_orders() {
        let mut scope = Scope::new("test");
        let a = scope.adopt(RasterBuffer::filled(2, 2, 1, 9).unwrap());
        let b = scope.alloc(2, 2, 1, Depth::U8).unwrap();

        let (src, dst) = scope.pair_mut(a, b).unwrap();
        dst.as_u8_mut().unwrap().copy_from_slice(src.as_u8().unwrap());
        assert_eq!(scope.mat(b).unwrap().as_u8().unwrap(), &[9, 9, 9, 9]);

        let (src, dst) = scope.pair_mut(b, a).unwrap();
        assert!(src.same_shape(dst));
        assert!(scope.pair_mut(a, a).is_err());
    }

    #[test]
    fn test_with_output_checks_back_in_on_error() {
        let mut scope = Scope::new("test");
        let a = scope.alloc(1, 1, 1, Depth::U8).unwrap();
        let result: Result<()> = scope.with_output(a, |_, _| {
            Err(TransformError::InternalProcessingFailure("nope".into()))
        });
        assert!(result.is_err());
        assert!(scope.mat(a).is_ok());
    }

    #[test]
    fn test_depth_accessors() {
        let mut scope = Scope::new("test");
        let id = scope.alloc(1, 3, 1, Depth::F32).unwrap();
        let mat = scope.mat_mut(id).unwrap();
        assert_eq!(mat.depth(), Depth::F32);
        assert!(mat.as_u8().is_err());
        mat.as_f32_mut().unwrap()[0] = 1.0;
        assert_eq!(mat.as_f32().unwrap(), &[1.0, 0.0, 0.0]);
    }
}
