//! Short code generation.
//!
//! Codes are either supplied by the caller or derived from the current Unix
//! second through a Hashids-style encoder: a salted, reversible mapping from
//! integers to short strings with a guaranteed minimum length.
//!
//! The encoding is deterministic, so two automatic creations inside the same
//! second yield the same code and the later one replaces the earlier one.

use chrono::{DateTime, Utc};

const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";
const DEFAULT_SEPARATORS: &str = "cfhistuCFHISTU";
const SEPARATOR_DIV: f64 = 3.5;
const GUARD_DIV: f64 = 12.0;

#[cfg(test)]
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("not a valid code for this salt")]
    InvalidCode,
}

// ── Encoder ────────────────────────────────────────────────────────────────

/// Salted integer <-> string encoder.
#[derive(Debug, Clone)]
pub struct Hashids {
    salt: Vec<char>,
    min_length: usize,
    alphabet: Vec<char>,
    separators: Vec<char>,
    guards: Vec<char>,
}

impl Hashids {
    /// Encoder over the default alphanumeric alphabet.
    pub fn new(salt: &str, min_length: usize) -> Self {
        Self::build(salt, min_length, unique_chars(DEFAULT_ALPHABET))
    }

    fn build(salt: &str, min_length: usize, alphabet: Vec<char>) -> Self {
        let salt: Vec<char> = salt.chars().collect();

        let mut separators: Vec<char> = DEFAULT_SEPARATORS
            .chars()
            .filter(|c| alphabet.contains(c))
            .collect();
        let mut alphabet: Vec<char> = alphabet
            .into_iter()
            .filter(|c| !separators.contains(c))
            .collect();

        consistent_shuffle(&mut separators, &salt);

        if separators.is_empty()
            || alphabet.len() as f64 / separators.len() as f64 > SEPARATOR_DIV
        {
            let mut wanted = (alphabet.len() as f64 / SEPARATOR_DIV).ceil() as usize;
            if wanted == 1 {
                wanted = 2;
            }
            if wanted > separators.len() {
                let diff = (wanted - separators.len()).min(alphabet.len());
                separators.extend(alphabet.drain(..diff));
            } else {
                separators.truncate(wanted);
            }
        }

        consistent_shuffle(&mut alphabet, &salt);

        let guard_count = (alphabet.len() as f64 / GUARD_DIV).ceil() as usize;
        let guards: Vec<char> = if alphabet.len() < 3 {
            separators.drain(..guard_count).collect()
        } else {
            alphabet.drain(..guard_count).collect()
        };

        Self {
            salt,
            min_length,
            alphabet,
            separators,
            guards,
        }
    }

    /// Encode a list of integers. An empty list encodes to an empty string.
    pub fn encode(&self, numbers: &[u64]) -> String {
        if numbers.is_empty() {
            return String::new();
        }

        let mut alphabet = self.alphabet.clone();
        let hash_int: u64 = numbers
            .iter()
            .enumerate()
            .map(|(i, n)| n % (i as u64 + 100))
            .sum();

        let lottery = alphabet[(hash_int % alphabet.len() as u64) as usize];
        let mut result = vec![lottery];

        for (i, &number) in numbers.iter().enumerate() {
            self.reshuffle(&mut alphabet, lottery);

            let last = hash(number, &alphabet);
            let first = last[0];
            result.extend_from_slice(&last);

            if i + 1 < numbers.len() {
                let n = number % (first as u64 + i as u64);
                result.push(self.separators[(n % self.separators.len() as u64) as usize]);
            }
        }

        if result.len() < self.min_length {
            let index = (hash_int + result[0] as u64) % self.guards.len() as u64;
            result.insert(0, self.guards[index as usize]);

            if result.len() < self.min_length {
                let index = (hash_int + result[2] as u64) % self.guards.len() as u64;
                result.push(self.guards[index as usize]);
            }
        }

        let half = alphabet.len() / 2;
        while result.len() < self.min_length {
            let key = alphabet.clone();
            consistent_shuffle(&mut alphabet, &key);

            let mut padded = alphabet[half..].to_vec();
            padded.extend_from_slice(&result);
            padded.extend_from_slice(&alphabet[..half]);
            result = padded;

            if result.len() > self.min_length {
                let start = (result.len() - self.min_length) / 2;
                result = result[start..start + self.min_length].to_vec();
            }
        }

        result.into_iter().collect()
    }

    /// Decode a string produced by [`Hashids::encode`] with the same salt.
    #[cfg(test)]
    pub fn decode(&self, code: &str) -> Result<Vec<u64>, CodecError> {
        let chars: Vec<char> = code.chars().collect();
        let parts: Vec<&[char]> = chars.split(|c| self.guards.contains(c)).collect();
        let body = match parts.len() {
            2 | 3 => parts[1],
            _ => parts[0],
        };

        let Some((&lottery, rest)) = body.split_first() else {
            return Err(CodecError::InvalidCode);
        };

        let mut alphabet = self.alphabet.clone();
        let mut numbers = Vec::new();
        for chunk in rest.split(|c| self.separators.contains(c)) {
            self.reshuffle(&mut alphabet, lottery);
            numbers.push(unhash(chunk, &alphabet).ok_or(CodecError::InvalidCode)?);
        }

        if self.encode(&numbers) != code {
            return Err(CodecError::InvalidCode);
        }
        Ok(numbers)
    }

    /// Shuffle `alphabet` keyed by `lottery + salt + alphabet`, truncated to
    /// the alphabet's length.
    fn reshuffle(&self, alphabet: &mut [char], lottery: char) {
        let mut key = Vec::with_capacity(1 + self.salt.len() + alphabet.len());
        key.push(lottery);
        key.extend_from_slice(&self.salt);
        key.extend_from_slice(alphabet);
        key.truncate(alphabet.len());
        consistent_shuffle(alphabet, &key);
    }
}

fn unique_chars(s: &str) -> Vec<char> {
    let mut out: Vec<char> = Vec::with_capacity(s.len());
    for c in s.chars() {
        if !out.contains(&c) {
            out.push(c);
        }
    }
    out
}

fn consistent_shuffle(alphabet: &mut [char], salt: &[char]) {
    if salt.is_empty() {
        return;
    }

    let mut v = 0usize;
    let mut p = 0usize;
    for i in (1..alphabet.len()).rev() {
        v %= salt.len();
        let ord = salt[v] as usize;
        p += ord;
        let j = (ord + v + p) % i;
        alphabet.swap(i, j);
        v += 1;
    }
}

fn hash(mut input: u64, alphabet: &[char]) -> Vec<char> {
    let len = alphabet.len() as u64;
    let mut out = Vec::new();
    loop {
        out.push(alphabet[(input % len) as usize]);
        input /= len;
        if input == 0 {
            break;
        }
    }
    out.reverse();
    out
}

#[cfg(test)]
fn unhash(input: &[char], alphabet: &[char]) -> Option<u64> {
    let len = alphabet.len() as u64;
    input.iter().try_fold(0u64, |acc, c| {
        let pos = alphabet.iter().position(|a| a == c)? as u64;
        acc.checked_mul(len)?.checked_add(pos)
    })
}

// ── Generator ──────────────────────────────────────────────────────────────

/// Picks the short code for a new link.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    encoder: Hashids,
}

impl CodeGenerator {
    pub fn new(salt: &str, min_length: usize) -> Self {
        Self {
            encoder: Hashids::new(salt, min_length),
        }
    }

    /// Return the custom code verbatim when one is given, otherwise encode the
    /// Unix second of `now`. Uniqueness of custom codes is checked by the caller.
    pub fn generate(&self, custom: Option<&str>, now: DateTime<Utc>) -> String {
        match custom.filter(|c| !c.is_empty()) {
            Some(code) => code.to_owned(),
            None => self.encode_timestamp(now.timestamp()),
        }
    }

    pub fn encode_timestamp(&self, unix_secs: i64) -> String {
        self.encoder.encode(&[unix_secs.max(0) as u64])
    }

    /// Recover the creation second from an automatically generated code.
    #[cfg(test)]
    pub fn decode_timestamp(&self, code: &str) -> Result<i64, CodecError> {
        match self.encoder.decode(code)?.as_slice() {
            [secs] => i64::try_from(*secs).map_err(|_| CodecError::InvalidCode),
            _ => Err(CodecError::InvalidCode),
        }
    }
}
