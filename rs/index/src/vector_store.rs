use anyhow::Result;

use crate::error::IndexError;

/// Index-addressable storage of `N` fixed-`D` f32 vectors (spec §3, §4.2).
/// Keys are exactly `{0,...,N-1}`; row `i` is fully overwritten on
/// `add_vector(i, ...)` and never partially written.
pub trait VectorStore {
    fn dim(&self) -> usize;
    fn len(&self) -> usize;

    fn add_vector(&mut self, id: u32, src: &[f32]) -> Result<()>;
    fn load_vector_into(&self, id: u32, dst: &mut [f32]) -> Result<()>;

    /// Zero-copy view over row `id`, for the distance kernel.
    fn get_segment(&self, id: u32) -> Result<&[f32]>;

    /// Freshly-allocated copy of row `id`; only meant for cold paths.
    fn get_vector(&self, id: u32) -> Result<Vec<f32>> {
        let mut dst = vec![0.0f32; self.dim()];
        self.load_vector_into(id, &mut dst)?;
        Ok(dst)
    }
}

fn check_id(id: u32, n: usize) -> Result<()> {
    if (id as usize) >= n {
        anyhow::bail!(IndexError::CapacityExceeded {
            detail: format!("id {} out of range [0, {})", id, n),
        });
    }
    Ok(())
}

fn check_len(actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        anyhow::bail!(IndexError::DimensionMismatch {
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_written(id: u32, written: &[bool]) -> Result<()> {
    if !written[id as usize] {
        anyhow::bail!(IndexError::InvalidFormat {
            detail: format!("row {} was never written", id),
        });
    }
    Ok(())
}

/// One owned `Vec<f32>` allocation per row. Higher per-row overhead, no
/// single contiguous region — suited to small datasets or when rows are
/// added in arbitrary order before `N` is known precisely.
pub struct HeapVectorStore {
    dim: usize,
    rows: Vec<Option<Vec<f32>>>,
}

impl HeapVectorStore {
    pub fn new(dim: usize, n: usize) -> Self {
        Self {
            dim,
            rows: vec![None; n],
        }
    }
}

impl VectorStore for HeapVectorStore {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn add_vector(&mut self, id: u32, src: &[f32]) -> Result<()> {
        check_id(id, self.rows.len())?;
        check_len(src.len(), self.dim)?;
        self.rows[id as usize] = Some(src.to_vec());
        Ok(())
    }

    fn load_vector_into(&self, id: u32, dst: &mut [f32]) -> Result<()> {
        check_id(id, self.rows.len())?;
        check_len(dst.len(), self.dim)?;
        let row = self.rows[id as usize]
            .as_ref()
            .ok_or_else(|| IndexError::InvalidFormat {
                detail: format!("row {} was never written", id),
            })?;
        dst.copy_from_slice(row);
        Ok(())
    }

    fn get_segment(&self, id: u32) -> Result<&[f32]> {
        check_id(id, self.rows.len())?;
        self.rows[id as usize]
            .as_deref()
            .ok_or_else(|| {
                IndexError::InvalidFormat {
                    detail: format!("row {} was never written", id),
                }
                .into()
            })
    }
}

/// Single contiguous `Vec<f32>` of length `N*D`, row-major (spec §3). This
/// is the layout the distance kernel and `IndexIo`'s bulk I/O are built
/// around — the whole backing region can be written to / read from disk in
/// one copy.
pub struct OffHeapVectorStore {
    dim: usize,
    n: usize,
    data: Vec<f32>,
    written: Vec<bool>,
}

impl OffHeapVectorStore {
    pub fn new(dim: usize, n: usize) -> Self {
        Self {
            dim,
            n,
            data: vec![0.0; dim * n],
            written: vec![false; n],
        }
    }

    /// Builds a store directly from an already-contiguous `N*D` buffer, as
    /// used by `IndexIo::read` after a single bulk read from disk.
    pub fn from_raw(dim: usize, n: usize, data: Vec<f32>) -> Result<Self> {
        check_len(data.len(), dim * n)?;
        Ok(Self {
            dim,
            n,
            written: vec![true; n],
            data,
        })
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

impl VectorStore for OffHeapVectorStore {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.n
    }

    fn add_vector(&mut self, id: u32, src: &[f32]) -> Result<()> {
        check_id(id, self.n)?;
        check_len(src.len(), self.dim)?;
        let start = id as usize * self.dim;
        self.data[start..start + self.dim].copy_from_slice(src);
        self.written[id as usize] = true;
        Ok(())
    }

    fn load_vector_into(&self, id: u32, dst: &mut [f32]) -> Result<()> {
        check_id(id, self.n)?;
        check_len(dst.len(), self.dim)?;
        check_written(id, &self.written)?;
        let start = id as usize * self.dim;
        dst.copy_from_slice(&self.data[start..start + self.dim]);
        Ok(())
    }

    fn get_segment(&self, id: u32) -> Result<&[f32]> {
        check_id(id, self.n)?;
        check_written(id, &self.written)?;
        let start = id as usize * self.dim;
        Ok(&self.data[start..start + self.dim])
    }
}
