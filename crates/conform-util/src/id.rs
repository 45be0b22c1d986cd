use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use std::time::{SystemTime, UNIX_EPOCH};

const RADIX: u64 = 36;

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        let d = (n % RADIX) as u32;
        digits.push(char::from_digit(d, RADIX as u32).unwrap_or('0'));
        n /= RADIX;
    }
    digits.iter().rev().collect()
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn token_from(millis: u64, factor: f64) -> String {
    to_base36((millis as f64 * factor).floor() as u64)
}

/// Generate an opaque identity token for a list item.
///
/// Tokens are the current time scaled by a random factor, rendered in base
/// 36. They only need to differ from other tokens of the same form session;
/// a collision costs a re-mounted item, never data.
///
/// ```
/// let id = conform_util::generate_id();
/// assert!(!id.is_empty());
/// assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_id() -> String {
    token_from(now_millis(), rand::thread_rng().gen::<f64>())
}

/// Source of identity tokens.
pub trait KeyGenerator {
    fn next_key(&mut self) -> String;
}

/// Tokens from [`generate_id`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomKeys;

impl KeyGenerator for RandomKeys {
    fn next_key(&mut self) -> String {
        generate_id()
    }
}

/// Reproducible tokens from a seeded xoshiro256** generator.
pub struct SeededKeys {
    rng: Xoshiro256StarStar,
}

impl SeededKeys {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        }
    }
}

impl KeyGenerator for SeededKeys {
    fn next_key(&mut self) -> String {
        to_base36(self.rng.gen::<u64>())
    }
}

/// Predictable tokens `prefix0`, `prefix1`, ...
#[derive(Debug, Clone)]
pub struct SequentialKeys {
    prefix: String,
    next: u64,
}

impl SequentialKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl KeyGenerator for SequentialKeys {
    fn next_key(&mut self) -> String {
        let key = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        key
    }
}

impl<G: KeyGenerator + ?Sized> KeyGenerator for &mut G {
    fn next_key(&mut self) -> String {
        (**self).next_key()
    }
}

impl<G: KeyGenerator + ?Sized> KeyGenerator for Box<G> {
    fn next_key(&mut self) -> String {
        (**self).next_key()
    }
}
