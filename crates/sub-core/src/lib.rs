// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SUBSTRATUM (SUB) - CORE MODULE
//
// Shared primitives for the legacy token, the Substratum token and the dev
// chain that hosts them: 20-byte addresses, Keccak hashing, supply constants
// and the legacy → SUB conversion ratio.
// All financial arithmetic uses u128 atomic units (no floating-point).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

pub mod config;

// ─────────────────────────────────────────────────────────────────
// SUPPLY & DECIMALS
// ─────────────────────────────────────────────────────────────────

/// Display precision of the legacy token (MyAdvancedToken).
pub const LEGACY_DECIMALS: u8 = 2;
/// Display precision of the Substratum token.
pub const TOKEN_DECIMALS: u8 = 18;

/// 1 SUB = 10^18 atomic units
pub const WEI_PER_SUB: u128 = 10u128.pow(TOKEN_DECIMALS as u32);

/// 1 legacy atomic unit = 10^16 SUB atomic units (18 - 2 decimals)
pub const CONVERSION_FACTOR: u128 = 10u128.pow((TOKEN_DECIMALS - LEGACY_DECIMALS) as u32);

/// Substratum genesis supply: 472,000,000 SUB, credited to the deployer.
pub const INITIAL_SUPPLY: u128 = 472_000_000 * WEI_PER_SUB;

/// Legacy genesis supply in raw units (592,000,000.00 at 2 decimals).
pub const LEGACY_INITIAL_SUPPLY: u128 = 59_200_000_000;

pub const TOKEN_NAME: &str = "Substratum";
pub const TOKEN_SYMBOL: &str = "SUB";

/// Native balance every dev account starts with (100 ether in wei).
pub const DEV_ACCOUNT_BALANCE: u128 = 100 * WEI_PER_SUB;

/// Number of dev accounts created by a fresh chain.
pub const DEFAULT_DEV_ACCOUNTS: usize = 10;

/// Convert a legacy amount into Substratum units.
/// Returns `None` on u128 overflow.
pub fn legacy_to_sub(legacy_amount: u128) -> Option<u128> {
    legacy_amount.checked_mul(CONVERSION_FACTOR)
}

/// Largest precision `format_units` can split: 10^38 is the biggest power
/// of ten that fits in a u128.
pub const MAX_DISPLAY_DECIMALS: u8 = 38;

/// Render an atomic amount with its decimal point, e.g. `1.900000000000000000`.
/// Returns `None` when `decimals` exceeds [`MAX_DISPLAY_DECIMALS`].
pub fn format_units(amount: u128, decimals: u8) -> Option<String> {
    if decimals == 0 {
        return Some(amount.to_string());
    }
    let unit = 10u128.checked_pow(decimals as u32)?;
    Some(format!(
        "{}.{:0width$}",
        amount / unit,
        amount % unit,
        width = decimals as usize
    ))
}

// ─────────────────────────────────────────────────────────────────
// HASHING
// ─────────────────────────────────────────────────────────────────

/// Keccak-256 over the concatenation of `parts`.
pub fn keccak256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

// ─────────────────────────────────────────────────────────────────
// ADDRESS
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    #[error("address must be 40 hex characters (got {0})")]
    InvalidLength(usize),
    #[error("address is not valid hex: {0}")]
    InvalidHex(String),
}

/// 20-byte account or contract identifier, rendered as `0x`-prefixed hex.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// The zero address: mint source and burn sink in Transfer events.
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Last 20 bytes of a 32-byte hash.
    pub fn from_hash(hash: &[u8; 32]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Address(bytes)
    }

    /// Contract address created by `deployer` at `nonce`.
    pub fn derive_contract(deployer: &Address, nonce: u64) -> Self {
        Self::from_hash(&keccak256(&[
            b"substratum-create:",
            deployer.as_bytes(),
            &nonce.to_be_bytes(),
        ]))
    }

    /// Deterministic dev account `index`.
    pub fn dev_account(index: usize) -> Self {
        Self::from_hash(&keccak256(&[
            b"substratum-dev-account:",
            &(index as u64).to_be_bytes(),
        ]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if stripped.len() != 40 {
            return Err(AddressParseError::InvalidLength(stripped.len()));
        }
        let raw = hex::decode(stripped).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&raw);
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────
// u128 ↔ String serialization (JSON/TOML don't round-trip 128-bit integers)
// ─────────────────────────────────────────────────────────────

pub mod u128_str {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(val: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<u128>().map_err(serde::de::Error::custom)
    }
}

/// `BTreeMap<K, u128>` with the values as decimal strings.
pub mod u128_str_map {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<K, S>(map: &BTreeMap<K, u128>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize + Ord,
        S: Serializer,
    {
        map.iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect::<BTreeMap<_, _>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, K, D>(deserializer: D) -> Result<BTreeMap<K, u128>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        D: Deserializer<'de>,
    {
        BTreeMap::<K, String>::deserialize(deserializer)?
            .into_iter()
            .map(|(k, v)| {
                v.parse::<u128>()
                    .map(|v| (k, v))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

/// `BTreeMap<K, BTreeMap<K2, u128>>` with the inner values as decimal strings.
pub mod u128_str_nested_map {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    type Nested<K, K2> = BTreeMap<K, BTreeMap<K2, u128>>;

    pub fn serialize<K, K2, S>(map: &Nested<K, K2>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize + Ord,
        K2: Serialize + Ord,
        S: Serializer,
    {
        map.iter()
            .map(|(k, inner)| {
                let inner: BTreeMap<_, _> =
                    inner.iter().map(|(k2, v)| (k2, v.to_string())).collect();
                (k, inner)
            })
            .collect::<BTreeMap<_, _>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, K, K2, D>(deserializer: D) -> Result<Nested<K, K2>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        K2: Deserialize<'de> + Ord,
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<K, BTreeMap<K2, String>>::deserialize(deserializer)?;
        let mut out = BTreeMap::new();
        for (k, inner) in raw {
            let mut parsed = BTreeMap::new();
            for (k2, v) in inner {
                parsed.insert(k2, v.parse::<u128>().map_err(serde::de::Error::custom)?);
            }
            out.insert(k, parsed);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_factor() {
        assert_eq!(CONVERSION_FACTOR, 10_000_000_000_000_000);
        assert_eq!(legacy_to_sub(100), Some(WEI_PER_SUB));
        assert_eq!(legacy_to_sub(u128::MAX), None);
    }

    #[test]
    fn test_initial_supply_fits_u128() {
        assert_eq!(INITIAL_SUPPLY, 472_000_000_000_000_000_000_000_000);
        // The whole SUB supply is backed by 472,000,000.00 legacy tokens
        assert_eq!(INITIAL_SUPPLY / CONVERSION_FACTOR, 47_200_000_000);
        assert!(INITIAL_SUPPLY / CONVERSION_FACTOR <= LEGACY_INITIAL_SUPPLY);
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(190, 2).unwrap(), "1.90");
        assert_eq!(
            format_units(1_900_000_000_000_000_000, 18).unwrap(),
            "1.900000000000000000"
        );
        assert_eq!(format_units(42, 0).unwrap(), "42");
    }

    #[test]
    fn test_format_units_precision_limit() {
        assert_eq!(
            format_units(u128::MAX, MAX_DISPLAY_DECIMALS).unwrap(),
            format!("3.{}", &u128::MAX.to_string()[1..])
        );
        assert_eq!(format_units(1, MAX_DISPLAY_DECIMALS + 1), None);
        assert_eq!(format_units(1, u8::MAX), None);
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert_eq!(
            Address::ZERO.to_string(),
            "0x0000000000000000000000000000000000000000"
        );
        assert!(!Address::dev_account(0).is_zero());
    }

    #[test]
    fn test_parse_address() {
        let addr: Address = "0x00000000000000000000000000000000000000ff".parse().unwrap();
        assert_eq!(addr.as_bytes()[19], 0xff);
        let no_prefix: Address = "00000000000000000000000000000000000000ff".parse().unwrap();
        assert_eq!(addr, no_prefix);
    }

    #[test]
    fn test_parse_address_rejects_bad_input() {
        assert_eq!(
            "0x1234".parse::<Address>(),
            Err(AddressParseError::InvalidLength(4))
        );
        assert!("0xzz00000000000000000000000000000000000000"
            .parse::<Address>()
            .is_err());
    }

    #[test]
    fn test_contract_addresses_are_unique_per_nonce() {
        let deployer = Address::dev_account(0);
        let a = Address::derive_contract(&deployer, 0);
        let b = Address::derive_contract(&deployer, 1);
        assert_ne!(a, b);
        assert_eq!(a, Address::derive_contract(&deployer, 0));
    }

    #[test]
    fn test_address_serde_as_string() {
        let addr = Address::dev_account(3);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
