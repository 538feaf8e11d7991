use tlsio_core::crypto::{Catalog, CatalogError, Category, CipherMode};
use tlsio_core::types::StreamError;

#[test]
fn closed_catalog_refuses_lookups() {
    let catalog = Catalog::new();
    assert!(!catalog.is_open());
    assert!(matches!(catalog.lookup_cipher("AES-128-CBC"), Err(CatalogError::Closed)));
    assert!(matches!(catalog.lookup_digest("SHA256"), Err(CatalogError::Closed)));
    assert!(catalog.enumerate(Category::Cipher).is_empty());
}

#[test]
fn open_and_close_are_idempotent() {
    let mut catalog = Catalog::new();
    catalog.open();
    catalog.open();
    assert!(catalog.is_open());
    assert_eq!(catalog.enumerate(Category::Cipher).len(), 10);

    catalog.close();
    catalog.close();
    assert!(!catalog.is_open());
    assert!(catalog.lookup_cipher("RC4").is_err());

    catalog.open();
    assert!(catalog.lookup_cipher("RC4").is_ok());
}

#[test]
fn names_are_case_insensitive_and_aliased() {
    let catalog = Catalog::opened();

    let cbc = catalog.lookup_cipher("aes-128-cbc").unwrap();
    assert_eq!(cbc.name, "AES-128-CBC");
    assert_eq!(cbc.nid, 419);
    assert_eq!(cbc.mode, CipherMode::Cbc);
    assert_eq!((cbc.block_size, cbc.iv_length, cbc.key_length), (16, 16, 16));

    assert_eq!(catalog.lookup_cipher("aes128").unwrap().name, "AES-128-CBC");
    assert_eq!(catalog.lookup_cipher(" Arcfour ").unwrap().name, "RC4");
    assert_eq!(catalog.lookup_digest("sha-256").unwrap().name, "SHA256");
    assert_eq!(catalog.lookup_digest("sha3-512").unwrap().digest_size, 64);
}

#[test]
fn cipher_table_shapes() {
    let catalog = Catalog::opened();

    let ctr = catalog.lookup_cipher("AES-256-CTR").unwrap();
    assert_eq!((ctr.block_size, ctr.iv_length, ctr.key_length), (1, 16, 32));
    assert!(!ctr.variable_key_len());

    let ecb = catalog.lookup_cipher("AES-192-ECB").unwrap();
    assert_eq!((ecb.block_size, ecb.iv_length), (16, 0));
    assert!(ecb.is_block_mode());

    let rc4 = catalog.lookup_cipher("RC4").unwrap();
    assert_eq!(rc4.mode, CipherMode::Stream);
    assert!(rc4.variable_key_len());
    assert!(rc4.accepts_key_len(5));
    assert!(!rc4.accepts_key_len(0));
    assert!(!rc4.accepts_key_len(33));
}

#[test]
fn enumerate_lists_canonical_names() {
    let catalog = Catalog::opened();

    let ciphers = catalog.enumerate(Category::Cipher);
    assert!(ciphers.contains("AES-256-CTR"));
    assert!(ciphers.contains("RC4"));
    assert!(!ciphers.contains("AES128"));

    let digests = catalog.enumerate(Category::Digest);
    assert_eq!(digests.len(), 7);
    assert!(digests.contains("SHA3-512"));
    assert!(digests.contains("SHA1"));
}

#[test]
fn unknown_names_are_invalid_parameters() {
    let catalog = Catalog::opened();

    let err = catalog.lookup_cipher("DES-EDE3").unwrap_err();
    assert!(matches!(err, CatalogError::UnknownCipher(ref n) if n == "DES-EDE3"));
    assert!(matches!(StreamError::from(err), StreamError::InvalidParameter(_)));

    let err = catalog.lookup_digest("MD5").unwrap_err();
    assert!(matches!(StreamError::from(err), StreamError::InvalidParameter(_)));

    assert!(matches!(StreamError::from(CatalogError::Closed), StreamError::InvalidState(_)));
}

#[test]
fn category_codes() {
    assert_eq!(Category::Digest as i32, 1);
    assert_eq!(Category::Cipher as i32, 2);
    assert_eq!(CipherMode::Ctr as u32, 5);
    assert_eq!(CipherMode::Cbc.to_string(), "CBC");
}
