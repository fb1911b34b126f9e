// SPDX-License-Identifier: MIT OR Apache-2.0
//! Memory-mapped dense matrix backings.
//!
//! Two mapped strategies sit behind the same row interface as
//! [`ArrayMatrix`](crate::ArrayMatrix):
//!
//! - [`MappedMatrix`]: the whole file in one mapping.
//! - [`RegionalMatrix`]: an ordered list of fixed-capacity mappings, each
//!   holding a bounded number of complete rows. This exists solely to load
//!   matrices too large for a single contiguous mapping; callers see the
//!   identical per-row contract and must not special-case it.
//!
//! Mapped backings reinterpret file bytes as native-endian `f32`, which
//! matches the little-endian wire layout on the platforms the models are
//! used on. The eager path decodes explicitly and is endian-safe.

use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

use memmap2::{Mmap, MmapOptions};
use serde::{Deserialize, Serialize};

use crate::{
    error::{MatrixError, Result},
    matrix::{read_shape, ArrayMatrix, MATRIX_HEADER_BYTES},
};

/// Region sizing for [`RegionalMatrix`].
///
/// The per-region element budget is a tuning constant, not a derived
/// platform limit. The default mirrors the reference implementation's
/// single-mapping ceiling of 2^28 floats (1 GiB) per region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Maximum number of `f32` elements a single region may hold.
    pub max_region_elements: usize,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            max_region_elements: 1 << 28,
        }
    }
}

impl RegionConfig {
    /// Complete rows per region under this budget. Never zero.
    #[must_use]
    pub fn rows_per_region(&self, cols: usize) -> usize {
        if cols == 0 {
            return 1;
        }
        (self.max_region_elements / cols).max(1)
    }
}

/// Backing strategy selector for loading a dense matrix from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatrixBacking {
    /// Eagerly decode all floats into an in-memory array.
    InMemory,
    /// Map the whole file once.
    Mapped,
    /// Map fixed-capacity regions of complete rows.
    Regional(RegionConfig),
}

impl Default for MatrixBacking {
    fn default() -> Self {
        Self::Regional(RegionConfig::default())
    }
}

fn expect_body(rows: usize, cols: usize, available: u64) -> Result<()> {
    let expected = rows as u64 * cols as u64 * 4;
    if available < expected {
        return Err(MatrixError::Truncated {
            expected,
            found: available,
        });
    }
    Ok(())
}

/// Read-only matrix over a single whole-file mapping.
#[derive(Debug)]
pub struct MappedMatrix {
    rows: usize,
    cols: usize,
    map: Mmap,
}

impl MappedMatrix {
    /// Map a dense matrix file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be opened, `InvalidShape` for a bad
    /// header, `Truncated` if the body is shorter than the shape requires.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: file opened read-only; the mapping is never mutated.
        let map = unsafe { Mmap::map(&file)? };
        if map.len() < MATRIX_HEADER_BYTES {
            return Err(MatrixError::Truncated {
                expected: MATRIX_HEADER_BYTES as u64,
                found: map.len() as u64,
            });
        }
        let (rows, cols) = read_shape(&mut &map[..MATRIX_HEADER_BYTES])?;
        expect_body(rows, cols, (map.len() - MATRIX_HEADER_BYTES) as u64)?;
        Ok(Self { rows, cols, map })
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn floats(&self) -> &[f32] {
        let end = MATRIX_HEADER_BYTES + self.rows * self.cols * 4;
        bytemuck::cast_slice(&self.map[MATRIX_HEADER_BYTES..end])
    }

    /// Read-only row view.
    #[inline]
    #[must_use]
    pub fn row(&self, r: usize) -> &[f32] {
        &self.floats()[r * self.cols..(r + 1) * self.cols]
    }

    /// Single element.
    #[inline]
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.floats()[r * self.cols + c]
    }
}

/// Read-only matrix split across multiple fixed-capacity mappings.
///
/// Row lookup is `region = row / rows_per_region`,
/// `local = row % rows_per_region`; the final region may hold fewer rows.
#[derive(Debug)]
pub struct RegionalMatrix {
    rows: usize,
    cols: usize,
    rows_per_region: usize,
    regions: Vec<Mmap>,
}

impl RegionalMatrix {
    /// Open a dense matrix file as independently mapped regions.
    ///
    /// Each region is mapped at its computed byte offset and covers complete
    /// rows only.
    ///
    /// # Errors
    ///
    /// Returns `Io`, `InvalidShape`, or `Truncated` as for
    /// [`MappedMatrix::open`].
    pub fn open<P: AsRef<Path>>(path: P, config: &RegionConfig) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        if file_len < MATRIX_HEADER_BYTES as u64 {
            return Err(MatrixError::Truncated {
                expected: MATRIX_HEADER_BYTES as u64,
                found: file_len,
            });
        }
        let (rows, cols) = {
            let mut header = BufReader::new(&file);
            read_shape(&mut header)?
        };
        expect_body(rows, cols, file_len - MATRIX_HEADER_BYTES as u64)?;

        let rows_per_region = config.rows_per_region(cols);
        let row_bytes = cols * 4;
        let mut regions = Vec::with_capacity(rows.div_ceil(rows_per_region.max(1)));

        let mut first_row = 0usize;
        // A zero-width matrix has no bytes to map.
        while first_row < rows && cols > 0 {
            let region_rows = rows_per_region.min(rows - first_row);
            let offset = MATRIX_HEADER_BYTES as u64 + first_row as u64 * row_bytes as u64;
            // SAFETY: file opened read-only; the mapping is never mutated.
            let map = unsafe {
                MmapOptions::new()
                    .offset(offset)
                    .len(region_rows * row_bytes)
                    .map(&file)?
            };
            regions.push(map);
            first_row += region_rows;
        }

        Ok(Self {
            rows,
            cols,
            rows_per_region,
            regions,
        })
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Number of mapped regions.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Rows held by every region except possibly the last.
    #[must_use]
    pub const fn rows_per_region(&self) -> usize {
        self.rows_per_region
    }

    /// Read-only row view.
    #[inline]
    #[must_use]
    pub fn row(&self, r: usize) -> &[f32] {
        if self.cols == 0 {
            return &[];
        }
        let region = r / self.rows_per_region;
        let local = r % self.rows_per_region;
        let floats: &[f32] = bytemuck::cast_slice(&self.regions[region]);
        &floats[local * self.cols..(local + 1) * self.cols]
    }

    /// Single element.
    #[inline]
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.row(r)[c]
    }
}

/// Dense matrix behind one of three interchangeable backings.
///
/// Inference code holds this enum and never branches on which backing is in
/// use beyond the per-row dispatch below.
#[derive(Debug)]
pub enum DenseMatrix {
    /// Flat in-memory array (also the mutable trainer target).
    Array(ArrayMatrix),
    /// Single whole-file mapping.
    Mapped(MappedMatrix),
    /// Multiple fixed-capacity mappings.
    Regional(RegionalMatrix),
}

impl DenseMatrix {
    /// Load a dense matrix file with the requested backing.
    ///
    /// # Errors
    ///
    /// Returns `Io` before any parsing if the file cannot be opened, then
    /// `InvalidShape`/`Truncated` for malformed content.
    pub fn load<P: AsRef<Path>>(path: P, backing: MatrixBacking) -> Result<Self> {
        match backing {
            MatrixBacking::InMemory => {
                let file = File::open(&path)?;
                let file_len = file.metadata()?.len();
                if file_len < MATRIX_HEADER_BYTES as u64 {
                    return Err(MatrixError::Truncated {
                        expected: MATRIX_HEADER_BYTES as u64,
                        found: file_len,
                    });
                }
                let mut reader = BufReader::new(file);
                let (rows, cols) = read_shape(&mut reader)?;
                expect_body(rows, cols, file_len - MATRIX_HEADER_BYTES as u64)?;
                let mut data = vec![0.0f32; rows * cols];
                let mut buf = [0u8; 4];
                use std::io::Read;
                for slot in &mut data {
                    reader.read_exact(&mut buf)?;
                    *slot = f32::from_le_bytes(buf);
                }
                Ok(Self::Array(ArrayMatrix::from_vec(rows, cols, data)?))
            }
            MatrixBacking::Mapped => Ok(Self::Mapped(MappedMatrix::open(path)?)),
            MatrixBacking::Regional(config) => {
                Ok(Self::Regional(RegionalMatrix::open(path, &config)?))
            }
        }
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        match self {
            Self::Array(m) => m.rows(),
            Self::Mapped(m) => m.rows(),
            Self::Regional(m) => m.rows(),
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        match self {
            Self::Array(m) => m.cols(),
            Self::Mapped(m) => m.cols(),
            Self::Regional(m) => m.cols(),
        }
    }

    /// Read-only row view, identical across backings.
    #[inline]
    #[must_use]
    pub fn row(&self, r: usize) -> &[f32] {
        match self {
            Self::Array(m) => m.row(r),
            Self::Mapped(m) => m.row(r),
            Self::Regional(m) => m.row(r),
        }
    }

    /// Single element.
    #[inline]
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> f32 {
        match self {
            Self::Array(m) => m.get(r, c),
            Self::Mapped(m) => m.get(r, c),
            Self::Regional(m) => m.get(r, c),
        }
    }

    /// Write the matrix in the dense wire layout, regardless of backing.
    ///
    /// # Errors
    ///
    /// Returns any underlying I/O error.
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&(self.rows() as i32).to_le_bytes())?;
        w.write_all(&(self.cols() as i32).to_le_bytes())?;
        for r in 0..self.rows() {
            for &v in self.row(r) {
                w.write_all(&v.to_le_bytes())?;
            }
        }
        Ok(())
    }
}

#[cfg(all(test, not(miri)))]
mod tests {
    use std::io::Write as _;

    use tempfile::tempdir;

    use super::*;

    fn write_matrix_file(dir: &std::path::Path, rows: usize, cols: usize) -> std::path::PathBuf {
        let m = ArrayMatrix::from_vec(
            rows,
            cols,
            (0..rows * cols).map(|i| i as f32 * 0.25 - 3.0).collect(),
        )
        .unwrap();
        let path = dir.join("m.matrix");
        let mut f = File::create(&path).unwrap();
        let mut buf = Vec::new();
        m.write_to(&mut buf).unwrap();
        f.write_all(&buf).unwrap();
        path
    }

    #[test]
    fn mapped_matches_eager() {
        let dir = tempdir().unwrap();
        let path = write_matrix_file(dir.path(), 7, 5);

        let eager = DenseMatrix::load(&path, MatrixBacking::InMemory).unwrap();
        let mapped = DenseMatrix::load(&path, MatrixBacking::Mapped).unwrap();

        assert_eq!(mapped.rows(), 7);
        assert_eq!(mapped.cols(), 5);
        for r in 0..7 {
            assert_eq!(eager.row(r), mapped.row(r));
        }
    }

    #[test]
    fn regional_parity_with_single_buffer() {
        let dir = tempdir().unwrap();
        let rows = 23;
        let cols = 6;
        let path = write_matrix_file(dir.path(), rows, cols);

        // Budget below the total element count forces multiple regions.
        let config = RegionConfig {
            max_region_elements: 4 * cols,
        };
        let single = DenseMatrix::load(&path, MatrixBacking::Mapped).unwrap();
        let regional = RegionalMatrix::open(&path, &config).unwrap();

        assert_eq!(regional.rows_per_region(), 4);
        assert_eq!(regional.region_count(), rows.div_ceil(4));

        // Deterministic pseudo-random (row, col) sampling.
        let mut state = 0x2545_f491_4f6c_dd1du64;
        for _ in 0..200 {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let r = (state >> 33) as usize % rows;
            let c = (state >> 17) as usize % cols;
            assert_eq!(regional.get(r, c), single.get(r, c), "({r}, {c})");
        }
        for r in 0..rows {
            assert_eq!(regional.row(r), single.row(r));
        }
    }

    #[test]
    fn regional_final_region_short() {
        let dir = tempdir().unwrap();
        let path = write_matrix_file(dir.path(), 10, 3);
        let config = RegionConfig {
            max_region_elements: 3 * 3,
        };
        let m = RegionalMatrix::open(&path, &config).unwrap();
        assert_eq!(m.rows_per_region(), 3);
        assert_eq!(m.region_count(), 4); // 3 + 3 + 3 + 1
        assert_eq!(m.row(9).len(), 3);
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = DenseMatrix::load(dir.path().join("nope"), MatrixBacking::Mapped).unwrap_err();
        assert!(matches!(err, MatrixError::Io(_)));
    }

    #[test]
    fn open_truncated_body_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.matrix");
        let mut f = File::create(&path).unwrap();
        f.write_all(&4i32.to_le_bytes()).unwrap();
        f.write_all(&4i32.to_le_bytes()).unwrap();
        f.write_all(&[0u8; 8]).unwrap(); // 2 of 16 floats
        drop(f);

        for backing in [
            MatrixBacking::InMemory,
            MatrixBacking::Mapped,
            MatrixBacking::Regional(RegionConfig::default()),
        ] {
            let err = DenseMatrix::load(&path, backing).unwrap_err();
            assert!(
                matches!(err, MatrixError::Truncated { expected: 64, found: 8 }),
                "{backing:?}: {err}"
            );
        }
    }

    #[test]
    fn write_to_roundtrips_from_mapped() {
        let dir = tempdir().unwrap();
        let path = write_matrix_file(dir.path(), 4, 4);
        let mapped = DenseMatrix::load(&path, MatrixBacking::Mapped).unwrap();

        let mut buf = Vec::new();
        mapped.write_to(&mut buf).unwrap();
        let back = ArrayMatrix::read_from(&mut buf.as_slice()).unwrap();
        for r in 0..4 {
            assert_eq!(back.row(r), mapped.row(r));
        }
    }

    #[test]
    fn region_config_rows() {
        let config = RegionConfig {
            max_region_elements: 100,
        };
        assert_eq!(config.rows_per_region(30), 3);
        assert_eq!(config.rows_per_region(1000), 1); // never zero
        assert_eq!(RegionConfig::default().max_region_elements, 1 << 28);
    }
}
