//! Whole-file encryption
//!
//! Files are held fully in memory in both directions; there is no chunking.

use std::path::Path;

use crate::crypto::{Nonce, Secret, SecretError};

/// A plaintext file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainFile {
    pub name: String,
    /// MIME type, empty when unknown
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl PlainFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Build a file from bytes read at `path`, guessing the MIME type from
    /// the extension
    pub fn from_path(path: &Path, data: Vec<u8>) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let mime_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();
        Self::new(name, mime_type, data)
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Output of the cipher step: ciphertext plus the metadata kept in the clear
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedFile {
    pub name: String,
    /// Plaintext size in bytes
    pub size: u64,
    pub mime_type: String,
    pub nonce: Nonce,
    /// `ciphertext || tag`
    pub ciphertext: Vec<u8>,
}

/// Encrypt a file's full contents under `secret` with a fresh nonce
pub fn encrypt_file(file: &PlainFile, secret: &Secret) -> Result<EncryptedFile, SecretError> {
    let (nonce, ciphertext) = secret.encrypt(&file.data)?;
    Ok(EncryptedFile {
        name: file.name.clone(),
        size: file.size(),
        mime_type: file.mime_type.clone(),
        nonce,
        ciphertext,
    })
}

/// Decrypt ciphertext with the key and nonce it was encrypted under
pub fn decrypt_file(
    ciphertext: &[u8],
    secret: &Secret,
    nonce: &Nonce,
) -> Result<Vec<u8>, SecretError> {
    secret.decrypt(ciphertext, nonce)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encrypt_file_keeps_metadata() {
        let secret = Secret::derive(b"k");
        let file = PlainFile::new("notes.txt", "text/plain", b"ten bytes!".to_vec());

        let encrypted = encrypt_file(&file, &secret).unwrap();
        assert_eq!(encrypted.name, "notes.txt");
        assert_eq!(encrypted.mime_type, "text/plain");
        assert_eq!(encrypted.size, 10);
        assert_ne!(encrypted.ciphertext, file.data);

        let plain = decrypt_file(&encrypted.ciphertext, &secret, &encrypted.nonce).unwrap();
        assert_eq!(plain, file.data);
    }

    #[test]
    fn test_nonce_is_fresh_per_file() {
        let secret = Secret::derive(b"k");
        let file = PlainFile::new("a", "", b"same".to_vec());
        let a = encrypt_file(&file, &secret).unwrap();
        let b = encrypt_file(&file, &secret).unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_from_path_guesses_mime() {
        let file = PlainFile::from_path(Path::new("/tmp/photo.png"), vec![1, 2, 3]);
        assert_eq!(file.name, "photo.png");
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.size(), 3);

        let file = PlainFile::from_path(Path::new("blob.unknownext"), vec![0]);
        assert_eq!(file.mime_type, "");
    }
}
