//! Data size conversions between the user surface (gigabytes) and the
//! wire format (bytes).
//!
//! The conversions are pure shifts so that expand followed by flatten
//! returns the exact configured value.

const BYTES_PER_GB: i64 = 1 << 30;

/// Convert a gigabyte count from configuration into bytes for the API.
pub fn to_bytes(gigabytes: i64) -> i64 {
    gigabytes * BYTES_PER_GB
}

/// Convert a byte count from the API back into whole gigabytes.
pub fn to_gigabytes(bytes: i64) -> i64 {
    bytes / BYTES_PER_GB
}

/// Convert a fractional gigabyte count (e.g. instance memory) into bytes.
pub fn gb_to_bytes_f64(gigabytes: f64) -> i64 {
    (gigabytes * BYTES_PER_GB as f64) as i64
}

/// Convert bytes into a fractional gigabyte count.
pub fn bytes_to_gb_f64(bytes: i64) -> f64 {
    bytes as f64 / BYTES_PER_GB as f64
}
