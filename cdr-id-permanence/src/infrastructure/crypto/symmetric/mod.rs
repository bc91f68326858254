pub mod aes_cipher;
pub mod nonce;
