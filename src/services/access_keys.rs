use rand::seq::SliceRandom;
use rand::Rng;
use sha2::{Digest, Sha256};

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

pub(crate) const KEY_LEN: usize = 8;

/// Human-readable single-use key: six uppercase letters and two digits,
/// shuffled. Handed to the student out of band by the instructor.
pub(crate) fn generate_access_key() -> String {
    let mut rng = rand::thread_rng();
    let mut chars: Vec<u8> = Vec::with_capacity(KEY_LEN);

    for _ in 0..6 {
        chars.push(LETTERS[rng.gen_range(0..LETTERS.len())]);
    }
    for _ in 0..2 {
        chars.push(DIGITS[rng.gen_range(0..DIGITS.len())]);
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}

/// Keys are typed by hand; tolerate stray whitespace and lowercase.
pub(crate) fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Only this hash is persisted; the plaintext leaves the system at mint
/// time.
pub(crate) fn hash_access_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_key(key).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_has_expected_shape() {
        for _ in 0..50 {
            let key = generate_access_key();
            assert_eq!(key.len(), KEY_LEN);

            let letters = key.chars().filter(|c| c.is_ascii_uppercase()).count();
            let digits = key.chars().filter(|c| c.is_ascii_digit()).count();
            assert_eq!(letters, 6, "key: {key}");
            assert_eq!(digits, 2, "key: {key}");
        }
    }

    #[test]
    fn hash_is_stable_under_normalization() {
        let canonical = hash_access_key("ABC12DEF");
        assert_eq!(hash_access_key(" abc12def "), canonical);
        assert_eq!(hash_access_key("Abc12Def"), canonical);
        assert_ne!(hash_access_key("ABC12DEG"), canonical);
    }
}
