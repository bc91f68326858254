pub mod hkdf;
