//! TOTP enrollment and verification.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ExtendedColorType, ImageEncoder, Luma, codecs::png::PngEncoder};
use qrcode::QrCode;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::AuthError;

/// Result of a two-factor enrollment: the shared secret plus a
/// scannable rendering of the enrollment URI.
#[derive(Debug, Clone)]
pub struct TotpEnrollment {
    /// Base32-encoded shared secret.
    pub secret: String,
    /// `otpauth://totp/...` enrollment URI.
    pub otpauth_uri: String,
    /// PNG QR code of the URI, base64-encoded without a data prefix.
    pub qr_png_base64: String,
}

fn build_totp(secret_bytes: Vec<u8>, issuer: &str, account: &str) -> Result<TOTP, AuthError> {
    TOTP::new(
        Algorithm::SHA1, // RFC 6238 default
        6,               // digits
        1,               // skew (±1 step)
        30,              // step seconds
        secret_bytes,
        Some(issuer.to_string()),
        account.to_string(),
    )
    .map_err(|e| AuthError::Crypto(format!("TOTP init: {e}")))
}

/// Generate a TOTP enrollment: secret, otpauth URI, and QR PNG.
pub fn generate_enrollment(issuer: &str, account: &str) -> Result<TotpEnrollment, AuthError> {
    let secret = Secret::generate_secret();
    let secret_bytes = secret
        .to_bytes()
        .map_err(|e| AuthError::Crypto(format!("secret bytes: {e}")))?;

    let totp = build_totp(secret_bytes, issuer, account)?;
    let uri = totp.get_url();

    Ok(TotpEnrollment {
        secret: secret.to_encoded().to_string(),
        qr_png_base64: qr_png_base64(&uri)?,
        otpauth_uri: uri,
    })
}

/// Verify a one-time code against a base32 secret.
///
/// Valid for the current 30-second window with one window of
/// clock-skew tolerance on either side. Codes are not consumed; reuse
/// within the tolerance window is not tracked.
pub fn verify_code(
    secret_base32: &str,
    code: &str,
    issuer: &str,
    account: &str,
) -> Result<bool, AuthError> {
    let secret_bytes = Secret::Encoded(secret_base32.to_string())
        .to_bytes()
        .map_err(|e| AuthError::Crypto(format!("secret decode: {e}")))?;

    let totp = build_totp(secret_bytes, issuer, account)?;
    totp.check_current(code)
        .map_err(|e| AuthError::Crypto(format!("TOTP check: {e}")))
}

/// Generate the current code for a base32 secret. Test helper and
/// enrollment preview.
pub fn current_code(secret_base32: &str, issuer: &str, account: &str) -> Result<String, AuthError> {
    let secret_bytes = Secret::Encoded(secret_base32.to_string())
        .to_bytes()
        .map_err(|e| AuthError::Crypto(format!("secret decode: {e}")))?;

    let totp = build_totp(secret_bytes, issuer, account)?;
    totp.generate_current()
        .map_err(|e| AuthError::Crypto(format!("TOTP generate: {e}")))
}

/// Render a string as a PNG QR code, base64-encoded.
fn qr_png_base64(contents: &str) -> Result<String, AuthError> {
    let code =
        QrCode::new(contents.as_bytes()).map_err(|e| AuthError::Crypto(format!("QR: {e}")))?;
    let img = code.render::<Luma<u8>>().build();

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            ExtendedColorType::L8,
        )
        .map_err(|e| AuthError::Crypto(format!("PNG encode: {e}")))?;

    Ok(STANDARD.encode(png))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrollment_produces_valid_uri_and_qr() {
        let enrollment = generate_enrollment("Rentora", "alice@example.com").unwrap();
        assert!(!enrollment.secret.is_empty());
        assert!(enrollment.otpauth_uri.starts_with("otpauth://totp/"));
        assert!(enrollment.otpauth_uri.contains("Rentora"));
        assert!(enrollment.otpauth_uri.contains("alice"));
        // PNG magic bytes survive the base64 round trip.
        let png = STANDARD.decode(&enrollment.qr_png_base64).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }

    #[test]
    fn current_code_verifies() {
        let enrollment = generate_enrollment("Rentora", "test@test.com").unwrap();
        let code = current_code(&enrollment.secret, "Rentora", "test@test.com").unwrap();
        assert!(verify_code(&enrollment.secret, &code, "Rentora", "test@test.com").unwrap());
    }

    #[test]
    fn wrong_code_fails() {
        let enrollment = generate_enrollment("Rentora", "test@test.com").unwrap();
        assert!(!verify_code(&enrollment.secret, "000000", "Rentora", "test@test.com").unwrap());
    }

    #[test]
    fn code_from_different_secret_fails() {
        let a = generate_enrollment("Rentora", "a@test.com").unwrap();
        let b = generate_enrollment("Rentora", "b@test.com").unwrap();
        let code = current_code(&a.secret, "Rentora", "a@test.com").unwrap();
        assert!(!verify_code(&b.secret, &code, "Rentora", "b@test.com").unwrap());
    }
}
