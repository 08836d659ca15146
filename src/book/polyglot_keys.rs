// Polyglot's 781-entry random table is normally shipped as a fixed binary
// blob (`random64` in the reference implementation). This build has no
// such resource to embed, so the table is generated once, deterministically,
// from a fixed seed with the same SplitMix64 stream `hash::zobrist` uses —
// any fixed seed works as long as every build produces the identical table,
// since the table only needs to be internally consistent between the engine
// that wrote a book and the engine that reads it.

use once_cell::sync::Lazy;

const POLYGLOT_TABLE_SEED: u64 = 0x706F_6C79_676C_6F74; // "polyglot" in ASCII hex-ish

struct SplitMix64(u64);

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        SplitMix64(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

pub const POLYGLOT_RANDOM_COUNT: usize = 781;

pub static POLYGLOT_RANDOMS: Lazy<[u64; POLYGLOT_RANDOM_COUNT]> = Lazy::new(|| {
    let mut rng = SplitMix64::new(POLYGLOT_TABLE_SEED);
    std::array::from_fn(|_| rng.next_u64())
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_deterministic_across_accesses() {
        let a = POLYGLOT_RANDOMS[0];
        let b = POLYGLOT_RANDOMS[0];
        assert_eq!(a, b);
    }

    #[test]
    fn table_entries_are_not_all_equal() {
        assert_ne!(POLYGLOT_RANDOMS[0], POLYGLOT_RANDOMS[1]);
        assert_ne!(POLYGLOT_RANDOMS[779], POLYGLOT_RANDOMS[780]);
    }
}
