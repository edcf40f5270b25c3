//! On-disk format of the vocabulary index.
//!
//! Two files live in the cache directory:
//!
//! - `vocab_index.json`: format version, dimension, fingerprint of the
//!   embedding vocabulary it was built from, term list, layout (centroids
//!   and inverted lists for the clustered layout), and the SHA-256 of the
//!   vectors file.
//! - `vocab_index.vectors`: magic `SSVX`, dimension (`u32` LE), row count
//!   (`u64` LE), then `count * dimension` little-endian `f32`s.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{BuiltIndex, Layout};
use crate::error::ProcessingError;
use crate::persist::{read_optional, remove_if_exists, write_atomic, CacheLoad};

pub(crate) const META_FILE: &str = "vocab_index.json";
pub(crate) const VECTORS_FILE: &str = "vocab_index.vectors";

const FORMAT_VERSION: u32 = 2;
const MAGIC: &[u8; 4] = b"SSVX";
const HEADER_LEN: usize = 4 + 4 + 8;

#[derive(Serialize, Deserialize)]
struct IndexMeta {
    version: u32,
    dimension: usize,
    source: String,
    terms: Vec<String>,
    layout: Layout,
    checksum: String,
}

fn encode_vectors(index: &BuiltIndex) -> Vec<u8> {
    #[allow(clippy::cast_possible_truncation)]
    let dimension = index.dimension as u32;
    let mut bytes = Vec::with_capacity(HEADER_LEN + index.vectors.len() * 4);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&dimension.to_le_bytes());
    bytes.extend_from_slice(&(index.terms.len() as u64).to_le_bytes());
    for v in &index.vectors {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

pub(super) fn save(index: &BuiltIndex, dir: &Path) -> Result<(), ProcessingError> {
    let vectors = encode_vectors(index);
    let meta = IndexMeta {
        version: FORMAT_VERSION,
        dimension: index.dimension,
        source: index.source.clone(),
        terms: index.terms.clone(),
        layout: index.layout.clone(),
        checksum: format!("{:x}", Sha256::digest(&vectors)),
    };
    let meta = serde_json::to_vec(&meta)?;

    // Vectors first; a crash between the writes shows up as a checksum
    // mismatch on the next load.
    write_atomic(&dir.join(VECTORS_FILE), &vectors)?;
    write_atomic(&dir.join(META_FILE), &meta)
}

pub(super) fn clear(dir: &Path) -> Result<(), ProcessingError> {
    remove_if_exists(&dir.join(META_FILE))?;
    remove_if_exists(&dir.join(VECTORS_FILE))
}

/// Read the cached index, accepting it only if it was built from an
/// embedding vocabulary with `expected_dimension` and `expected_source`.
pub(super) fn load(
    dir: &Path,
    expected_dimension: usize,
    expected_source: &str,
) -> CacheLoad<BuiltIndex> {
    let meta_bytes = read_optional(&dir.join(META_FILE));
    let vector_bytes = read_optional(&dir.join(VECTORS_FILE));
    match (meta_bytes, vector_bytes) {
        (Ok(None), Ok(None)) => CacheLoad::Miss,
        (Ok(Some(meta)), Ok(Some(vectors))) => {
            match decode(&meta, &vectors, expected_dimension, expected_source) {
                Ok(index) => CacheLoad::Hit(index),
                Err(reason) => CacheLoad::Corrupt(reason),
            }
        }
        (Err(e), _) | (_, Err(e)) => CacheLoad::Corrupt(e.to_string()),
        _ => CacheLoad::Corrupt("index cache is missing one of its files".to_string()),
    }
}

fn decode(
    meta: &[u8],
    vectors: &[u8],
    expected_dimension: usize,
    expected_source: &str,
) -> Result<BuiltIndex, String> {
    let meta: IndexMeta =
        serde_json::from_slice(meta).map_err(|e| format!("unreadable metadata: {e}"))?;
    if meta.version != FORMAT_VERSION {
        return Err(format!(
            "format version {} is not {FORMAT_VERSION}",
            meta.version
        ));
    }
    if meta.dimension != expected_dimension {
        return Err(format!(
            "dimension {} does not match embeddings dimension {expected_dimension}",
            meta.dimension
        ));
    }
    if meta.source != expected_source {
        return Err("embedding vocabulary changed since the index was built".to_string());
    }
    if format!("{:x}", Sha256::digest(vectors)) != meta.checksum {
        return Err("vectors checksum mismatch".to_string());
    }
    if vectors.len() < HEADER_LEN || &vectors[..4] != MAGIC {
        return Err("vectors file has no valid header".to_string());
    }

    let mut dim_bytes = [0_u8; 4];
    dim_bytes.copy_from_slice(&vectors[4..8]);
    let mut count_bytes = [0_u8; 8];
    count_bytes.copy_from_slice(&vectors[8..16]);
    let dimension = u32::from_le_bytes(dim_bytes) as usize;
    let count = usize::try_from(u64::from_le_bytes(count_bytes))
        .map_err(|_| "row count overflows usize".to_string())?;

    if dimension != meta.dimension {
        return Err(format!(
            "vectors dimension {dimension} differs from metadata {}",
            meta.dimension
        ));
    }
    if count != meta.terms.len() {
        return Err(format!(
            "{count} vector rows for {} terms",
            meta.terms.len()
        ));
    }
    let body = &vectors[HEADER_LEN..];
    if Some(body.len()) != count.checked_mul(dimension).and_then(|n| n.checked_mul(4)) {
        return Err("vectors body has the wrong length".to_string());
    }
    check_layout(&meta.layout, dimension, count)?;

    let data = body
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    Ok(BuiltIndex {
        dimension,
        terms: meta.terms,
        vectors: data,
        layout: meta.layout,
        source: meta.source,
    })
}

fn check_layout(layout: &Layout, dimension: usize, count: usize) -> Result<(), String> {
    let Layout::Ivf {
        nprobe,
        centroids,
        lists,
    } = layout
    else {
        return Ok(());
    };
    if centroids.is_empty() || centroids.len() != lists.len() {
        return Err("centroid and list counts disagree".to_string());
    }
    if *nprobe == 0 || *nprobe > centroids.len() {
        return Err(format!("nprobe {nprobe} out of range"));
    }
    if centroids.iter().any(|c| c.len() != dimension) {
        return Err("centroid has the wrong dimension".to_string());
    }
    let mut seen = vec![false; count];
    for &i in lists.iter().flatten() {
        match seen.get_mut(i) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(format!("inverted list entry {i} is invalid or repeated")),
        }
    }
    if seen.iter().any(|s| !s) {
        return Err("inverted lists do not cover every row".to_string());
    }
    Ok(())
}
