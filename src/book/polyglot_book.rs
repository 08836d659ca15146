use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use super::polyglot_entry::PolyglotEntry;
use super::polyglot_hash::compute_polyglot_hash;
use crate::board::Board;
use crate::moves::movegen::{generate_pseudo_legal, GenMode};
use crate::moves::types::Move;
use arrayvec::ArrayVec;
use tracing::{debug, warn};

/// Fixed load priority, largest collection first. Invented for this build —
/// the source format only specifies that segments are named
/// `<4-char prefix><2-digit index>`, not which prefixes exist.
const TIER_PREFIXES: [&str; 3] = ["LRGE", "MAIN", "SMAL"];
const MAX_SEGMENTS_TOTAL: usize = 99;

#[derive(Debug)]
pub enum BookError {
    Io(io::Error),
    Truncated(String, usize, usize),
    SegmentMissing(PathBuf),
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::Io(e) => write!(f, "book io error: {e}"),
            BookError::Truncated(name, count, len) => {
                write!(f, "segment {name} is truncated: header claims {count} entries but only {len} bytes follow")
            }
            BookError::SegmentMissing(dir) => write!(f, "no book segments found under {}", dir.display()),
        }
    }
}

impl std::error::Error for BookError {}

impl From<io::Error> for BookError {
    fn from(e: io::Error) -> Self {
        BookError::Io(e)
    }
}

struct Segment {
    name: String,
    entries: Vec<PolyglotEntry>,
}

impl Segment {
    fn load(path: &Path, name: String) -> Result<Self, BookError> {
        let mut f = File::open(path)?;
        let mut header = [0u8; 4];
        f.read_exact(&mut header)?;
        let count = u32::from_le_bytes(header) as usize;

        let mut buffer = Vec::new();
        f.read_to_end(&mut buffer)?;
        if buffer.len() < count * 16 {
            return Err(BookError::Truncated(name, count, buffer.len()));
        }

        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let start = i * 16;
            entries.push(PolyglotEntry::from_bytes(&buffer[start..start + 16]));
        }
        Ok(Self { name, entries })
    }

    fn first_ge(&self, key: u64) -> usize {
        self.entries.partition_point(|e| e.key < key)
    }
}

/// A read-only, segmented Polyglot opening book. Segments are loaded once at
/// [`PolyglotBook::load_dir`] and kept resident; probing never touches disk
/// again.
pub struct PolyglotBook {
    segments: Vec<Segment>,
}

impl PolyglotBook {
    /// Walks `TIER_PREFIXES` in priority order, loading numbered segments
    /// `01`, `02`, ... from `dir` until a gap in the numbering or the global
    /// segment cap is hit. A completely absent prefix is skipped, not fatal;
    /// the book is ready as soon as at least one segment loaded.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, BookError> {
        let dir = dir.as_ref();
        let mut segments = Vec::new();

        'prefixes: for prefix in TIER_PREFIXES {
            for idx in 1..=99u32 {
                if segments.len() >= MAX_SEGMENTS_TOTAL {
                    break 'prefixes;
                }
                let name = format!("{prefix}{idx:02}");
                let path = dir.join(format!("{name}.bin"));
                if !path.exists() {
                    break;
                }
                let segment = Segment::load(&path, name)?;
                debug!(segment = %segment.name, entries = segment.entries.len(), "loaded book segment");
                segments.push(segment);
            }
        }

        if segments.is_empty() {
            return Err(BookError::SegmentMissing(dir.to_path_buf()));
        }

        segments.sort_by_key(|s| s.entries.first().map(|e| e.key).unwrap_or(u64::MAX));
        Ok(Self { segments })
    }

    pub fn is_ready(&self) -> bool {
        !self.segments.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn total_entries(&self) -> usize {
        self.segments.iter().map(|s| s.entries.len()).sum()
    }

    pub fn tier_name(&self, segment_idx: usize) -> Option<&str> {
        self.segments.get(segment_idx).map(|s| s.name.as_str())
    }

    /// Collects every entry sharing `key`, starting in the segment that
    /// reports the first match and spilling forward while the next
    /// segment's leading entries still carry the same key.
    fn collect_candidates(&self, key: u64) -> Vec<&PolyglotEntry> {
        let mut out = Vec::new();
        for (seg_idx, segment) in self.segments.iter().enumerate() {
            let start = segment.first_ge(key);
            if start >= segment.entries.len() || segment.entries[start].key != key {
                if !out.is_empty() {
                    break;
                }
                continue;
            }
            let mut i = start;
            while i < segment.entries.len() && segment.entries[i].key == key {
                out.push(&segment.entries[i]);
                i += 1;
            }
            if i == segment.entries.len() {
                if let Some(next) = self.segments.get(seg_idx + 1) {
                    let mut j = 0;
                    while j < next.entries.len() && next.entries[j].key == key {
                        out.push(&next.entries[j]);
                        j += 1;
                    }
                }
            }
            break;
        }
        out
    }

    /// Probes for `board`'s position. `seed` drives the weighted pick and
    /// should differ between successive calls (the caller owns this state,
    /// per the engine's shared-PRNG-per-handle model).
    pub fn probe(&self, board: &Board, seed: u64) -> Option<Move> {
        let key = compute_polyglot_hash(board);
        let candidates = self.collect_candidates(key);
        if candidates.is_empty() {
            return None;
        }

        let total_weight: u32 = candidates.iter().map(|e| e.weight as u32).sum();
        if total_weight == 0 {
            return candidates.iter().find_map(|e| decode_and_validate(board, e));
        }

        let low32 = (key & 0xFFFF_FFFF) as u32;
        let high32 = (key >> 32) as u32;
        let mut h = (seed as u32) ^ low32 ^ high32;
        h ^= h >> 16;
        h = h.wrapping_mul(0x045d_9f3b);
        h ^= h >> 16;
        let pick = h % total_weight;

        let mut acc = 0u32;
        let mut winner = None;
        for entry in &candidates {
            acc += entry.weight as u32;
            if acc > pick {
                winner = Some(*entry);
                break;
            }
        }

        if let Some(entry) = winner {
            if let Some(mv) = decode_and_validate(board, entry) {
                return Some(mv);
            }
        }

        warn!("book winner failed legality validation, falling back to linear scan");
        candidates.iter().find_map(|e| decode_and_validate(board, e))
    }
}

fn decode_and_validate(board: &Board, entry: &PolyglotEntry) -> Option<Move> {
    let candidate = entry.decode_move(board)?;
    let mut pseudo: ArrayVec<Move, 256> = ArrayVec::new();
    generate_pseudo_legal(board, GenMode::All, &mut pseudo);
    let generated = pseudo
        .iter()
        .find(|mv| mv.from == candidate.from && mv.to == candidate.to && mv.promotion == candidate.promotion)?;

    let mut scratch = board.clone();
    let keys = crate::hash::ZobristKeys::new(0);
    let undo = crate::moves::execute::make_move(&mut scratch, &keys, *generated);
    let legal = !crate::moves::attacks::in_check(&scratch, board.side);
    crate::moves::execute::unmake_move(&mut scratch, undo);

    legal.then_some(*generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen::STARTING_FEN;

    fn encode_entry(key: u64, move_poly: u16, weight: u16) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&key.to_be_bytes());
        bytes[8..10].copy_from_slice(&move_poly.to_be_bytes());
        bytes[10..12].copy_from_slice(&weight.to_be_bytes());
        bytes
    }

    #[test]
    fn segment_header_count_matches_entries() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&1u32.to_le_bytes());
        buffer.extend_from_slice(&encode_entry(0xABCD, 0, 1));

        let tmp = std::env::temp_dir().join(format!("sentinel-book-test-{}.bin", std::process::id()));
        std::fs::write(&tmp, &buffer).unwrap();
        let segment = Segment::load(&tmp, "TEST01".to_string()).unwrap();
        std::fs::remove_file(&tmp).ok();

        assert_eq!(segment.entries.len(), 1);
        assert_eq!(segment.entries[0].key, 0xABCD);
    }

    #[test]
    fn weighted_pick_favors_the_larger_weight_over_many_seeds() {
        let board: Board = STARTING_FEN.parse().unwrap();
        let key = compute_polyglot_hash(&board);

        let e2e4: u16 = 4 | (3 << 3) | (4 << 6) | (1 << 9);
        let d2d4: u16 = 3 | (3 << 3) | (3 << 6) | (1 << 9);

        let mut buffer = Vec::new();
        buffer.extend_from_slice(&2u32.to_le_bytes());
        buffer.extend_from_slice(&encode_entry(key, e2e4, 1));
        buffer.extend_from_slice(&encode_entry(key, d2d4, 9));

        let tmp_dir = std::env::temp_dir().join(format!("sentinel-book-dir-{}", std::process::id()));
        std::fs::create_dir_all(&tmp_dir).unwrap();
        std::fs::write(tmp_dir.join("MAIN01.bin"), &buffer).unwrap();

        let book = PolyglotBook::load_dir(&tmp_dir).unwrap();
        assert_eq!(book.total_entries(), 2);

        let mut d4_count = 0;
        for seed in 0..200u64 {
            if let Some(mv) = book.probe(&board, seed) {
                if mv.to.file() == 3 {
                    d4_count += 1;
                }
            }
        }
        assert!(d4_count > 120, "expected d2d4 (weight 9) to dominate, got {d4_count}/200");

        std::fs::remove_dir_all(&tmp_dir).ok();
    }
}
