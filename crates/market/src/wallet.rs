//! Injective wallet helpers for balance questions in chat.

use std::sync::OnceLock;

use regex::Regex;

pub const ADDRESS_PREFIX: &str = "inj";
pub const ASK_ADDRESS: &str = "Please provide your Injective account address.";
pub const INVALID_ADDRESS: &str = "Invalid Injective account address provided. \
Please provide a valid Injective address (starting with \"inj1\").";

const DECIMALS: u32 = 18;
const DISPLAY_DECIMALS: u32 = 6;

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"inj1[a-z0-9]{38}").expect("address pattern compiles"))
}

/// Anything that starts like an address, valid or not.
fn candidate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\binj1[a-z0-9]*").expect("candidate pattern compiles"))
}

/// First well-formed `inj1…` address in `text` whose bech32 checksum holds.
pub fn extract_injective_address(text: &str) -> Option<String> {
    address_pattern()
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|candidate| bech32_valid(candidate, ADDRESS_PREFIX))
        .map(str::to_string)
}

/// The address in `text`, or the prompt to send back instead.
///
/// Text with no `inj1` token at all gets [`ASK_ADDRESS`]; text with only
/// malformed or mis-checksummed candidates gets [`INVALID_ADDRESS`].
pub fn lookup_address(text: &str) -> Result<String, &'static str> {
    if let Some(address) = extract_injective_address(text) {
        return Ok(address);
    }
    if candidate_pattern().is_match(text) {
        Err(INVALID_ADDRESS)
    } else {
        Err(ASK_ADDRESS)
    }
}

// ── bech32 ──────────────────────────────────────────────────────────

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const GENERATOR: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];

fn polymod(values: impl Iterator<Item = u8>) -> u32 {
    values.fold(1u32, |chk, v| {
        let top = chk >> 25;
        let mut chk = ((chk & 0x1ff_ffff) << 5) ^ u32::from(v);
        for (i, g) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= g;
            }
        }
        chk
    })
}

fn bech32_valid(addr: &str, hrp: &str) -> bool {
    let Some((prefix, data)) = addr.rsplit_once('1') else {
        return false;
    };
    if prefix != hrp || data.len() < 6 {
        return false;
    }
    let Some(values) = data
        .bytes()
        .map(|b| CHARSET.iter().position(|c| *c == b).map(|p| p as u8))
        .collect::<Option<Vec<u8>>>()
    else {
        return false;
    };
    let expanded = hrp
        .bytes()
        .map(|b| b >> 5)
        .chain(std::iter::once(0))
        .chain(hrp.bytes().map(|b| b & 31));
    polymod(expanded.chain(values)) == 1
}

// ── Amounts ─────────────────────────────────────────────────────────

/// Base units (10^-18 INJ) rendered with six decimals, rounded half-up.
/// Returns `None` when `base_units` is not an unsigned integer.
pub fn format_inj_amount(base_units: &str) -> Option<String> {
    let units: u128 = base_units.trim().parse().ok()?;
    let step = 10u128.pow(DECIMALS - DISPLAY_DECIMALS);
    let mut scaled = units / step;
    if units % step >= step / 2 {
        scaled += 1;
    }
    let unit = 10u128.pow(DISPLAY_DECIMALS);
    Some(format!(
        "{}.{:0width$}",
        scaled / unit,
        scaled % unit,
        width = DISPLAY_DECIMALS as usize
    ))
}

pub fn balance_message(address: &str, amount: &str) -> String {
    format!("Your balance for account {address} is: {amount} INJ.")
}

/// Balance sentence for a raw base-unit amount, `None` if it does not parse.
pub fn balance_reply(address: &str, base_units: &str) -> Option<String> {
    format_inj_amount(base_units).map(|amount| balance_message(address, &amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "inj14tf02w7tpw8z7fcz6ju8xvhmaategcdna2mrqc";

    #[test]
    fn extracts_valid_address() {
        let text = format!("What is the balance of {VALID}?");
        assert_eq!(extract_injective_address(&text).as_deref(), Some(VALID));
    }

    #[test]
    fn rejects_bad_checksum() {
        let broken = "inj14tf02w7tpw8z7fcz6ju8xvhmaategcdna2mrqd";
        assert_eq!(extract_injective_address(broken), None);
    }

    #[test]
    fn skips_invalid_candidates() {
        let text = format!("inj14tf02w7tpw8z7fcz6ju8xvhmaategcdna2mrqd or {VALID}");
        assert_eq!(extract_injective_address(&text).as_deref(), Some(VALID));
    }

    #[test]
    fn no_address_in_text() {
        assert_eq!(extract_injective_address("what is my balance?"), None);
    }

    #[test]
    fn lookup_prompts_for_missing_address() {
        assert_eq!(lookup_address("what is my balance?"), Err(ASK_ADDRESS));
        assert_eq!(lookup_address("my injective wallet"), Err(ASK_ADDRESS));
    }

    #[test]
    fn lookup_rejects_malformed_address() {
        assert_eq!(lookup_address("check inj1abc please"), Err(INVALID_ADDRESS));
        assert_eq!(
            lookup_address("inj14tf02w7tpw8z7fcz6ju8xvhmaategcdna2mrqd"),
            Err(INVALID_ADDRESS)
        );
        assert_eq!(lookup_address(&format!("balance of {VALID}")), Ok(VALID.to_string()));
    }

    #[test]
    fn other_bech32_prefix_is_rejected() {
        assert!(!bech32_valid(VALID, "cosmos"));
        assert!(bech32_valid(VALID, ADDRESS_PREFIX));
    }

    #[test]
    fn formats_amounts_half_up() {
        assert_eq!(format_inj_amount("0").as_deref(), Some("0.000000"));
        assert_eq!(
            format_inj_amount("1000000000000000000").as_deref(),
            Some("1.000000")
        );
        assert_eq!(
            format_inj_amount("1234567500000000000").as_deref(),
            Some("1.234568")
        );
        assert_eq!(
            format_inj_amount("1234567499999999999").as_deref(),
            Some("1.234567")
        );
        assert_eq!(format_inj_amount("999999500000").as_deref(), Some("0.000001"));
        assert_eq!(format_inj_amount("-5"), None);
        assert_eq!(format_inj_amount("1.5"), None);
    }

    #[test]
    fn balance_sentence() {
        assert_eq!(
            balance_message(VALID, "1.000000"),
            format!("Your balance for account {VALID} is: 1.000000 INJ.")
        );
        assert_eq!(
            balance_reply(VALID, "2500000000000000000").as_deref(),
            Some(format!("Your balance for account {VALID} is: 2.500000 INJ.").as_str())
        );
        assert_eq!(balance_reply(VALID, "lots"), None);
    }
}
