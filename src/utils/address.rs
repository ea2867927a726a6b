/// Identity helpers for Sui addresses and object ids.
///
/// The ledger renders addresses as `0x` + 64 hex digits, but nothing stops an
/// RPC node, an event payload or a caller from handing us short or mixed-case
/// forms. Every identity is folded through `normalize_address` before it is
/// stored on a domain record or compared, so ownership checks are plain
/// string equality.

pub const ADDRESS_HEX_LEN: usize = 64;

/// Canonical form: trimmed, lower-case, `0x`-prefixed, left-padded to 64 hex digits.
/// Input that is not hex is only trimmed and lower-cased.
pub fn normalize_address(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    let body = lowered.strip_prefix("0x").unwrap_or(&lowered);

    if body.is_empty() || body.len() > ADDRESS_HEX_LEN || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return lowered;
    }

    format!("0x{:0>width$}", body, width = ADDRESS_HEX_LEN)
}

pub fn same_identity(a: &str, b: &str) -> bool {
    normalize_address(a) == normalize_address(b)
}

pub fn is_valid_address(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    match lowered.strip_prefix("0x") {
        Some(body) => !body.is_empty() && body.len() <= ADDRESS_HEX_LEN && body.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Decode a (normalized) address or object id into its 32 raw bytes.
pub fn address_bytes(raw: &str) -> Result<[u8; 32], String> {
    let normalized = normalize_address(raw);
    let body = normalized
        .strip_prefix("0x")
        .ok_or_else(|| format!("Invalid address: {}", raw))?;

    let decoded = hex::decode(body).map_err(|e| format!("Invalid address {}: {}", raw, e))?;
    decoded
        .try_into()
        .map_err(|_| format!("Address must be 32 bytes: {}", raw))
}
