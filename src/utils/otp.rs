use anyhow::{anyhow, Result};

/// Generate a random 6-digit numeric one-time code.
pub fn generate_otp() -> Result<String> {
    let mut buf = [0u8; 4];
    getrandom::getrandom(&mut buf).map_err(|e| anyhow!("OS RNG unavailable: {}", e))?;
    let n = u32::from_le_bytes(buf);
    Ok(format!("{}", 100_000 + n % 900_000))
}

/// Generate an opaque reset token: 32 random bytes, hex-encoded.
pub fn generate_reset_token() -> Result<String> {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| anyhow!("OS RNG unavailable: {}", e))?;
    let mut out = String::with_capacity(64);
    for b in buf {
        out.push_str(&format!("{:02x}", b));
    }
    Ok(out)
}

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Generate a replacement password: 4 uppercase + 4 lowercase letters,
/// shuffled. Letters only — the generated password is read to the user
/// over email or SMS.
pub fn generate_password() -> Result<String> {
    let mut raw = [0u8; 16];
    getrandom::getrandom(&mut raw).map_err(|e| anyhow!("OS RNG unavailable: {}", e))?;

    let mut chars: Vec<u8> = Vec::with_capacity(8);
    for i in 0..4 {
        chars.push(UPPERCASE[raw[i] as usize % UPPERCASE.len()]);
    }
    for i in 4..8 {
        chars.push(LOWERCASE[raw[i] as usize % LOWERCASE.len()]);
    }

    // Fisher-Yates over the 8 slots, driven by the remaining random bytes
    for i in (1..chars.len()).rev() {
        let j = raw[8 + (chars.len() - 1 - i)] as usize % (i + 1);
        chars.swap(i, j);
    }

    Ok(String::from_utf8(chars).expect("letters are valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp().unwrap();
            assert_eq!(otp.len(), 6);
            let n: u32 = otp.parse().unwrap();
            assert!((100_000..1_000_000).contains(&n));
        }
    }

    #[test]
    fn reset_token_is_64_hex_chars() {
        let token = generate_reset_token().unwrap();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn reset_tokens_are_unique() {
        let a = generate_reset_token().unwrap();
        let b = generate_reset_token().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn password_is_four_upper_four_lower() {
        for _ in 0..100 {
            let pw = generate_password().unwrap();
            assert_eq!(pw.len(), 8);
            assert_eq!(pw.chars().filter(|c| c.is_ascii_uppercase()).count(), 4);
            assert_eq!(pw.chars().filter(|c| c.is_ascii_lowercase()).count(), 4);
        }
    }
}
