pub mod identifier_cipher;
