//! Deterministic seeded random stream
//!
//! A 32-bit xorshift register seeded from a hashed string. Two generators
//! built from the same seed produce the same infinite sequence, which is what
//! makes daily seeds and replay tests work. No external entropy is ever mixed in.

use rand::RngCore;
use rand::rand_core::impls;

/// FNV-1a 32-bit offset basis
pub const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
/// FNV-1a 32-bit prime
pub const FNV_PRIME: u32 = 16_777_619;

/// Hash seed text into a 32-bit seed (FNV-1a over the UTF-8 bytes)
pub fn hash_seed(text: &str) -> u32 {
    text.bytes().fold(FNV_OFFSET_BASIS, |h, b| (h ^ b as u32).wrapping_mul(FNV_PRIME))
}

/// Xorshift32 generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    /// Create a generator. A zero seed is a fixed point of xorshift and is coerced to 1.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Create a generator from seed text (daily date string or user input)
    pub fn from_text(text: &str) -> Self {
        Self::new(hash_seed(text))
    }

    /// Current register value
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Advance the register and return it
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform value in [0, 1)
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }

    /// Uniform value in [0, 1) at f32 precision (top 24 bits, never rounds up to 1.0)
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / 16_777_216.0
    }

    /// Uniform value in [lo, hi)
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.next_f32() * (hi - lo)
    }

    /// Uniform index in [0, n); returns 0 for n <= 1
    pub fn below(&mut self, n: u32) -> u32 {
        if n <= 1 {
            return 0;
        }
        (self.next_f64() * n as f64) as u32
    }
}

impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        SeededRng::next_u32(self)
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        impls::fill_bytes_via_next(self, dst)
    }
}

/// Format a UTC date as the daily seed string (`2024-1-1`, no zero padding)
pub fn date_seed(year: i64, month: u32, day: u32) -> String {
    format!("{}-{}-{}", year, month, day)
}

/// Convert days since 1970-01-01 to a (year, month, day) civil date
pub fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

/// Daily seed string for a unix timestamp in seconds
pub fn date_seed_for_unix(secs: i64) -> String {
    let (y, m, d) = civil_from_days(secs.div_euclid(86_400));
    date_seed(y, m, d)
}

/// Today's daily seed string (UTC)
#[cfg(target_arch = "wasm32")]
pub fn today_seed() -> String {
    let now = js_sys::Date::new_0();
    date_seed(
        now.get_utc_full_year() as i64,
        now.get_utc_month() + 1,
        now.get_utc_date(),
    )
}

/// Today's daily seed string (UTC)
#[cfg(not(target_arch = "wasm32"))]
pub fn today_seed() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    date_seed_for_unix(secs)
}

/// Resolve the seed text for a run: trimmed user text, or today's date
pub fn resolve_seed_text(user: Option<&str>) -> String {
    match user.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => today_seed(),
    }
}
