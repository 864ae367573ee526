use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::IndexError;
use crate::int_list::IntList;
use crate::vector_store::{OffHeapVectorStore, VectorStore};

const NULL_POSTING_SENTINEL: i32 = -1;

/// Binary persistence for a built index, spec §4.8: `F.clus` (centroids +
/// posting lists) and `F.vec` (vectors), little-endian, no cross-endian
/// guarantee. Bulk vector transfer goes through `utils::mem`'s slice
/// transmutation so the write is a single contiguous copy out of the
/// off-heap region, mirroring the teacher's `FixedFileVectorStorage` bulk
/// read/write tests.
pub struct IndexIo;

impl IndexIo {
    pub fn write(
        base_name: impl AsRef<Path>,
        centroids: &OffHeapVectorStore,
        postings: &[IntList],
        vectors: &OffHeapVectorStore,
    ) -> Result<()> {
        let base = base_name.as_ref();
        Self::write_clus(&base.with_extension("clus"), centroids, postings)?;
        Self::write_vec(&base.with_extension("vec"), vectors)?;
        Ok(())
    }

    fn write_clus(
        path: &Path,
        centroids: &OffHeapVectorStore,
        postings: &[IntList],
    ) -> Result<()> {
        let file = File::create(path)
            .map_err(|e| io_failure(path, e))
            .with_context(|| format!("creating {}", path.display()))?;
        let mut w = BufWriter::new(file);

        let d = centroids.dim() as i32;
        let n = centroids.len() as i32;
        w.write_i32::<LittleEndian>(d)?;
        w.write_i32::<LittleEndian>(n)?;
        w.write_all(utils::mem::transmute_slice_to_u8(centroids.as_slice()))?;

        w.write_i32::<LittleEndian>(postings.len() as i32)?;
        for list in postings {
            w.write_i32::<LittleEndian>(list.size() as i32)?;
            for &id in list.iter() {
                w.write_i32::<LittleEndian>(id)?;
            }
        }
        w.flush()?;
        Ok(())
    }

    fn write_vec(path: &Path, vectors: &OffHeapVectorStore) -> Result<()> {
        let file = File::create(path)
            .map_err(|e| io_failure(path, e))
            .with_context(|| format!("creating {}", path.display()))?;
        let mut w = BufWriter::new(file);

        w.write_i32::<LittleEndian>(vectors.dim() as i32)?;
        w.write_i32::<LittleEndian>(vectors.len() as i32)?;
        w.write_all(utils::mem::transmute_slice_to_u8(vectors.as_slice()))?;
        w.flush()?;
        Ok(())
    }

    pub fn read(
        base_name: impl AsRef<Path>,
    ) -> Result<(OffHeapVectorStore, Vec<IntList>, OffHeapVectorStore)> {
        let base = base_name.as_ref();
        let clus_path = base.with_extension("clus");
        let vec_path = base.with_extension("vec");

        if !clus_path.exists() {
            anyhow::bail!(IndexError::MissingFile {
                path: clus_path.display().to_string(),
            });
        }
        if !vec_path.exists() {
            anyhow::bail!(IndexError::MissingFile {
                path: vec_path.display().to_string(),
            });
        }

        let (centroids, postings) = Self::read_clus(&clus_path)?;
        let vectors = Self::read_vec(&vec_path)?;

        if vectors.dim() != centroids.dim() {
            anyhow::bail!(IndexError::InvalidFormat {
                detail: format!(
                    "dimension mismatch between {} (D={}) and {} (D={})",
                    clus_path.display(),
                    centroids.dim(),
                    vec_path.display(),
                    vectors.dim()
                ),
            });
        }

        Ok((centroids, postings, vectors))
    }

    fn read_clus(path: &Path) -> Result<(OffHeapVectorStore, Vec<IntList>)> {
        let file = File::open(path)
            .map_err(|e| io_failure(path, e))
            .with_context(|| format!("opening {}", path.display()))?;
        let mut r = BufReader::new(file);

        let d = r.read_i32::<LittleEndian>()?;
        let n = r.read_i32::<LittleEndian>()?;
        if d < 0 || n < 0 {
            anyhow::bail!(IndexError::InvalidFormat {
                detail: format!("negative header field in {}", path.display()),
            });
        }
        let (d, n) = (d as usize, n as usize);

        let mut bytes = vec![0u8; n * d * 4];
        r.read_exact(&mut bytes).map_err(|e| {
            IndexError::InvalidFormat {
                detail: format!("truncated centroid data in {}: {}", path.display(), e),
            }
        })?;
        let centroids = OffHeapVectorStore::from_raw(
            d,
            n,
            utils::mem::transmute_u8_to_slice(&bytes).to_vec(),
        )?;

        let posting_count = r.read_i32::<LittleEndian>()?;
        if posting_count < 0 || posting_count as usize != n {
            anyhow::bail!(IndexError::InvalidFormat {
                detail: format!(
                    "posting count {} does not match centroid count {} in {}",
                    posting_count,
                    n,
                    path.display()
                ),
            });
        }

        let mut postings = Vec::with_capacity(n);
        for _ in 0..n {
            let size = r.read_i32::<LittleEndian>()?;
            let list = if size == NULL_POSTING_SENTINEL {
                IntList::new()
            } else if size < 0 {
                anyhow::bail!(IndexError::InvalidFormat {
                    detail: format!("invalid negative posting size {} in {}", size, path.display()),
                });
            } else {
                let mut list = IntList::with_capacity(size as usize);
                for _ in 0..size {
                    list.add(r.read_i32::<LittleEndian>()?);
                }
                list
            };
            postings.push(list);
        }

        Ok((centroids, postings))
    }

    fn read_vec(path: &Path) -> Result<OffHeapVectorStore> {
        let file = File::open(path)
            .map_err(|e| io_failure(path, e))
            .with_context(|| format!("opening {}", path.display()))?;
        let mut r = BufReader::new(file);

        let d = r.read_i32::<LittleEndian>()?;
        let n = r.read_i32::<LittleEndian>()?;
        if d < 0 || n < 0 {
            anyhow::bail!(IndexError::InvalidFormat {
                detail: format!("negative header field in {}", path.display()),
            });
        }
        let (d, n) = (d as usize, n as usize);

        let mut bytes = vec![0u8; n * d * 4];
        r.read_exact(&mut bytes).map_err(|e| IndexError::InvalidFormat {
            detail: format!("truncated vector data in {}: {}", path.display(), e),
        })?;

        OffHeapVectorStore::from_raw(d, n, utils::mem::transmute_u8_to_slice(&bytes).to_vec())
    }
}

fn io_failure(path: &Path, source: std::io::Error) -> anyhow::Error {
    IndexError::IoFailure {
        path: path.display().to_string(),
        source,
    }
    .into()
}
