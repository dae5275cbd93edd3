//! Punycode transcoding of labels (RFC 3492).
//!
//! Only the bare algorithm lives here. Adding and stripping the `xn--`
//! prefix is left to the name codec.

use super::Error;

const BASE: u32 = 36;
const T_MIN: u32 = 1;
const T_MAX: u32 = 26;
const SKEW: u32 = 38;
const DAMP: u32 = 700;
const INITIAL_BIAS: u32 = 72;
const INITIAL_N: u32 = 128;

fn adapt(mut delta: u32, num_points: u32, first: bool) -> u32 {
    delta /= if first { DAMP } else { 2 };
    delta += delta / num_points;
    let mut k = 0;
    while delta > ((BASE - T_MIN) * T_MAX) / 2 {
        delta /= BASE - T_MIN;
        k += BASE;
    }
    k + ((BASE - T_MIN + 1) * delta) / (delta + SKEW)
}

fn threshold(k: u32, bias: u32) -> u32 {
    if k <= bias {
        T_MIN
    } else if k >= bias + T_MAX {
        T_MAX
    } else {
        k - bias
    }
}

fn encode_digit(digit: u32) -> char {
    if digit < 26 {
        (b'a' + digit as u8) as char
    } else {
        (b'0' + (digit - 26) as u8) as char
    }
}

fn decode_digit(byte: u8) -> Option<u32> {
    match byte {
        b'a'..=b'z' => Some((byte - b'a') as u32),
        b'A'..=b'Z' => Some((byte - b'A') as u32),
        b'0'..=b'9' => Some((byte - b'0') as u32 + 26),
        _ => None,
    }
}

/// Encodes a unicode label into its punycode form, without prefix.
pub fn encode(input: &str) -> Result<String, Error> {
    let code_points: Vec<u32> = input.chars().map(|c| c as u32).collect();
    let mut output: String = input.chars().filter(char::is_ascii).collect();
    let basic = output.len() as u32;
    if basic > 0 {
        output.push('-');
    }

    let mut n = INITIAL_N;
    let mut delta: u32 = 0;
    let mut bias = INITIAL_BIAS;
    let mut handled = basic;
    while (handled as usize) < code_points.len() {
        let m = code_points
            .iter()
            .copied()
            .filter(|&c| c >= n)
            .min()
            .ok_or(Error::InvalidPunycode)?;
        delta = (m - n)
            .checked_mul(handled + 1)
            .and_then(|d| d.checked_add(delta))
            .ok_or(Error::InvalidPunycode)?;
        n = m;

        for &c in &code_points {
            if c < n {
                delta = delta.checked_add(1).ok_or(Error::InvalidPunycode)?;
            }
            if c == n {
                let mut q = delta;
                let mut k = BASE;
                loop {
                    let t = threshold(k, bias);
                    if q < t {
                        break;
                    }
                    output.push(encode_digit(t + (q - t) % (BASE - t)));
                    q = (q - t) / (BASE - t);
                    k += BASE;
                }
                output.push(encode_digit(q));
                bias = adapt(delta, handled + 1, handled == basic);
                delta = 0;
                handled += 1;
            }
        }
        delta += 1;
        n += 1;
    }

    Ok(output)
}

/// Decodes the punycode form of a label, without prefix.
pub fn decode(input: &str) -> Result<String, Error> {
    let (basic, extended) = match input.rfind('-') {
        Some(pos) => (&input[..pos], &input[pos + 1..]),
        None => ("", input),
    };
    if !basic.is_ascii() {
        return Err(Error::InvalidPunycode);
    }

    let mut output: Vec<char> = basic.chars().collect();
    let mut n = INITIAL_N;
    let mut i: u32 = 0;
    let mut bias = INITIAL_BIAS;
    let mut digits = extended.bytes();

    while digits.len() > 0 {
        let old_i = i;
        let mut w: u32 = 1;
        let mut k = BASE;
        loop {
            let digit = digits
                .next()
                .and_then(decode_digit)
                .ok_or(Error::InvalidPunycode)?;
            i = digit
                .checked_mul(w)
                .and_then(|d| d.checked_add(i))
                .ok_or(Error::InvalidPunycode)?;
            let t = threshold(k, bias);
            if digit < t {
                break;
            }
            w = w.checked_mul(BASE - t).ok_or(Error::InvalidPunycode)?;
            k += BASE;
        }

        let len = output.len() as u32 + 1;
        bias = adapt(i - old_i, len, old_i == 0);
        n = n.checked_add(i / len).ok_or(Error::InvalidPunycode)?;
        i %= len;
        let c = std::char::from_u32(n).ok_or(Error::InvalidPunycode)?;
        output.insert(i as usize, c);
        i += 1;
    }

    Ok(output.into_iter().collect())
}

#[cfg(test)]
mod test {
    use super::{decode, encode};

    #[test]
    fn rfc_samples() {
        assert_eq!(encode("bücher").unwrap(), "bcher-kva");
        assert_eq!(encode("münchen").unwrap(), "mnchen-3ya");
        assert_eq!(decode("bcher-kva").unwrap(), "bücher");
        assert_eq!(decode("mnchen-3ya").unwrap(), "münchen");
    }

    #[test]
    fn only_non_ascii() {
        let encoded = encode("ü").unwrap();
        assert_eq!(encoded, "tda");
        assert_eq!(decode(&encoded).unwrap(), "ü");
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode("bcher-k!a").is_err());
        assert!(decode("99999999999").is_err());
    }
}
