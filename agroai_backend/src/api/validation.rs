//! Request validation utilities.

use ethers::types::Address;

use super::errors::ApiError;

/// Upload extensions the detection endpoints accept.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

/// Maximum upload size in bytes (16 MiB).
pub const MAX_FILE_SIZE: usize = 16 * 1024 * 1024;

/// Validate an EVM wallet address and parse it.
pub fn validate_wallet_address(address: &str) -> Result<Address, ApiError> {
    if address.is_empty() {
        return Err(ApiError::validation_error("wallet_address", "address cannot be empty"));
    }
    if !address.starts_with("0x") {
        return Err(ApiError::validation_error("wallet_address", "address must start with '0x'"));
    }
    if address.len() != 42 {
        return Err(ApiError::validation_error(
            "wallet_address",
            "address must be 42 characters long (including '0x')",
        ));
    }
    address.parse::<Address>().map_err(|_| {
        ApiError::validation_error("wallet_address", "address contains invalid hex characters")
    })
}

/// Check an uploaded filename against the extension whitelist.
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reject non-positive or non-finite purchase amounts.
pub fn validate_purchase_amount(amount: f64) -> Result<(), ApiError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::validation_error(
            "purchase_amount",
            "purchase amount must be a positive number",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_address() {
        let address = validate_wallet_address("0x000000000000000000000000000000000000dEaD");
        assert!(address.is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(validate_wallet_address("").is_err());
        assert!(validate_wallet_address("deadbeef").is_err());
        assert!(validate_wallet_address("0x1234").is_err());
        assert!(validate_wallet_address("0xZZ00000000000000000000000000000000000000").is_err());
    }

    #[test]
    fn extension_whitelist() {
        assert!(allowed_file("leaf.jpg"));
        assert!(allowed_file("leaf.PNG"));
        assert!(allowed_file("a.b.tiff"));
        assert!(!allowed_file("leaf.exe"));
        assert!(!allowed_file("no_extension"));
    }

    #[test]
    fn purchase_amount_bounds() {
        assert!(validate_purchase_amount(25.99).is_ok());
        assert!(validate_purchase_amount(0.0).is_err());
        assert!(validate_purchase_amount(-5.0).is_err());
        assert!(validate_purchase_amount(f64::NAN).is_err());
    }
}
