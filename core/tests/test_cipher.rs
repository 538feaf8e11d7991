// ## tests/test_cipher.rs

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use tlsio_core::config::IoConfig;
    use tlsio_core::constants::types;
    use tlsio_core::crypto::{Catalog, Category, CipherContext, CipherError, CipherMode, Direction};
    use tlsio_core::pipeline::{AuthenticatedCipher, Lifecycle};
    use tlsio_core::types::StreamError;

    fn one_shot(catalog: &Catalog, alg: &str, key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
        let spec = catalog.lookup_cipher(alg).unwrap();
        let mut ctx = CipherContext::new(&spec, Direction::Encrypt, key, iv, false).unwrap();
        let mut out = Vec::new();
        ctx.update(data, &mut out).unwrap();
        ctx.finalize(&mut out).unwrap();
        out
    }

    fn seal(catalog: &Catalog, alg: &str, digest: &str, padding: bool, key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
        let mut enc = AuthenticatedCipher::encrypt(catalog, alg, Some(digest)).unwrap();
        enc.set_padding(padding).unwrap();
        enc.initialise(key, iv).unwrap();
        enc.update(data).unwrap();
        enc.finish().unwrap();
        enc.ciphertext().unwrap()
    }

    /// Where opening failed, if it did.
    #[derive(Debug, PartialEq)]
    enum Rejected {
        AtFinish,
        AtPlaintext,
    }

    fn open(
        catalog: &Catalog,
        alg: &str,
        digest: &str,
        padding: bool,
        key: &[u8],
        iv: &[u8],
        ct: &[u8],
    ) -> Result<Vec<u8>, Rejected> {
        let mut dec = AuthenticatedCipher::decrypt(catalog, alg, Some(digest)).unwrap();
        dec.set_padding(padding).unwrap();
        dec.initialise(key, iv).unwrap();
        dec.update(ct).unwrap();
        match dec.finish() {
            Ok(()) => {}
            Err(StreamError::AuthenticationFailure) => return Err(Rejected::AtFinish),
            Err(other) => panic!("finish failed with {other:?}"),
        }
        match dec.plaintext() {
            Ok(pt) => Ok(pt),
            Err(StreamError::AuthenticationFailure) => Err(Rejected::AtPlaintext),
            Err(other) => panic!("plaintext failed with {other:?}"),
        }
    }

    // ## 1️⃣ Known answers

    #[test]
    fn aes_128_ecb_fips197() {
        let catalog = Catalog::opened();
        let key = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let pt = hex::decode("00112233445566778899aabbccddeeff").unwrap();
        let ct = one_shot(&catalog, "AES-128-ECB", &key, &[], &pt);
        assert_eq!(hex::encode(ct), "69c4e0d86a7b0430d8cdb78070b4c55a");
    }

    #[test]
    fn aes_128_cbc_and_ctr_sp800_38a() {
        let catalog = Catalog::opened();
        let key = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let pt = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

        let iv = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let ct = one_shot(&catalog, "AES-128-CBC", &key, &iv, &pt);
        assert_eq!(hex::encode(ct), "7649abac8119b246cee98e9b12e9197d");

        let counter = hex::decode("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff").unwrap();
        let ct = one_shot(&catalog, "AES-128-CTR", &key, &counter, &pt);
        assert_eq!(hex::encode(ct), "874d6191b620e3261bef6864990db6ce");
    }

    #[test]
    fn pipeline_aes_128_cbc_zero_vector() {
        let catalog = Catalog::opened();
        let mut enc = AuthenticatedCipher::encrypt(&catalog, "AES-128-CBC", None).unwrap();
        enc.initialise(&[0u8; 16], &[0u8; 16]).unwrap();
        enc.update(&[0u8; 16]).unwrap();
        enc.finish().unwrap();
        assert_eq!(hex::encode(enc.ciphertext().unwrap()), "66e94bd4ef8a2c3b884cfa59ca342b2e");
    }

    #[test]
    fn pipeline_rc4_with_short_key() {
        let catalog = Catalog::opened();
        let mut enc = AuthenticatedCipher::encrypt(&catalog, "RC4", None).unwrap();
        enc.set_key_len(3).unwrap();
        assert_eq!(enc.key_len(), 3);
        enc.initialise(b"Key", b"").unwrap();
        enc.update(b"Plaintext").unwrap();
        enc.finish().unwrap();
        assert_eq!(hex::encode(enc.ciphertext().unwrap()), "bbf316e8d940af0ad3");
    }

    // ## 2️⃣ Cipher context behaviour

    #[test]
    fn context_padding_and_alignment() {
        let catalog = Catalog::opened();
        let spec = catalog.lookup_cipher("AES-128-CBC").unwrap();

        let mut ctx = CipherContext::new(&spec, Direction::Encrypt, &[1; 16], &[2; 16], true).unwrap();
        let mut out = Vec::new();
        ctx.update(b"0123456789abcdef", &mut out).unwrap();
        ctx.finalize(&mut out).unwrap();
        // a full block of padding follows aligned input
        assert_eq!(out.len(), 32);
        assert!(matches!(ctx.finalize(&mut out), Err(CipherError::Finalised)));
        assert!(matches!(ctx.update(b"x", &mut out), Err(CipherError::Finalised)));

        let mut ctx = CipherContext::new(&spec, Direction::Encrypt, &[1; 16], &[2; 16], false).unwrap();
        let mut out = Vec::new();
        ctx.update(b"short", &mut out).unwrap();
        assert_eq!(ctx.buffered_len(), 5);
        assert!(matches!(
            ctx.finalize(&mut out),
            Err(CipherError::NotBlockAligned { len: 5, block: 16 })
        ));
    }

    #[test]
    fn context_rejects_invalid_padding() {
        let catalog = Catalog::opened();
        let spec = catalog.lookup_cipher("AES-128-ECB").unwrap();
        // decrypts to sixteen zero bytes, which is not valid PKCS#7
        let ct = hex::decode("66e94bd4ef8a2c3b884cfa59ca342b2e").unwrap();

        let mut ctx = CipherContext::new(&spec, Direction::Decrypt, &[0; 16], &[], true).unwrap();
        let mut out = Vec::new();
        ctx.update(&ct, &mut out).unwrap();
        assert!(out.is_empty());
        assert!(matches!(ctx.finalize(&mut out), Err(CipherError::BadDecrypt)));
    }

    #[test]
    fn context_validates_lengths() {
        let catalog = Catalog::opened();
        let spec = catalog.lookup_cipher("AES-256-CBC").unwrap();
        assert!(matches!(
            CipherContext::new(&spec, Direction::Encrypt, &[0; 16], &[0; 16], false),
            Err(CipherError::InvalidKeyLen { expected: 32, actual: 16 })
        ));
        assert!(matches!(
            CipherContext::new(&spec, Direction::Encrypt, &[0; 32], &[0; 8], false),
            Err(CipherError::InvalidIvLen { expected: 16, actual: 8 })
        ));
    }

    // ## 3️⃣ Authenticated pipeline

    #[test]
    fn round_trip_with_digest() {
        let catalog = Catalog::opened();
        let (key, iv) = ([0x42u8; 32], [0x24u8; 16]);

        let mut enc = AuthenticatedCipher::encrypt(&catalog, "aes-256-cbc", Some("sha256")).unwrap();
        enc.set_padding(true).unwrap();
        enc.initialise(&key, &iv).unwrap();
        enc.update(b"attack ").unwrap();
        enc.update(b"at dawn").unwrap();
        enc.finish().unwrap();
        let ct = enc.ciphertext().unwrap();
        // 14 bytes of plaintext plus a 32 byte tag, padded to 48
        assert_eq!(ct.len(), 48);

        let mut dec = AuthenticatedCipher::decrypt(&catalog, "aes-256-cbc", Some("sha256")).unwrap();
        dec.set_padding(true).unwrap();
        dec.initialise(&key, &iv).unwrap();
        dec.update(&ct).unwrap();
        dec.finish().unwrap();
        assert_eq!(dec.plaintext().unwrap(), b"attack at dawn");
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let catalog = Catalog::opened();
        let key = [3u8; 16];

        let mut enc = AuthenticatedCipher::encrypt(&catalog, "RC4", Some("SHA1")).unwrap();
        enc.initialise(&key, &[]).unwrap();
        enc.update(b"attack at dawn").unwrap();
        enc.finish().unwrap();
        let mut ct = enc.ciphertext().unwrap();
        assert_eq!(ct.len(), 14 + 20);
        ct[0] ^= 0x01;

        let mut dec = AuthenticatedCipher::decrypt(&catalog, "RC4", Some("SHA1")).unwrap();
        dec.initialise(&key, &[]).unwrap();
        dec.update(&ct).unwrap();
        dec.finish().unwrap();
        let err = dec.plaintext().unwrap_err();
        assert!(matches!(err, StreamError::AuthenticationFailure));
        assert_eq!(err.to_string(), "invalid decrypt");
    }

    #[test]
    fn output_shorter_than_tag_fails_authentication() {
        let catalog = Catalog::opened();
        let mut dec = AuthenticatedCipher::decrypt(&catalog, "AES-128-CTR", Some("SHA256")).unwrap();
        dec.initialise(&[0; 16], &[0; 16]).unwrap();
        dec.update(b"tiny").unwrap();
        dec.finish().unwrap();
        assert!(matches!(dec.plaintext(), Err(StreamError::AuthenticationFailure)));
    }

    #[test]
    fn lifecycle_is_enforced() {
        let catalog = Catalog::opened();
        let mut enc = AuthenticatedCipher::encrypt(&catalog, "AES-128-CTR", None).unwrap();
        assert_eq!(enc.state(), Lifecycle::Uninitialised);
        assert!(matches!(enc.update(b"x"), Err(StreamError::InvalidState(_))));
        assert!(matches!(enc.finish(), Err(StreamError::InvalidState(_))));

        enc.initialise(&[0; 16], &[0; 16]).unwrap();
        enc.update(b"x").unwrap();
        enc.finish().unwrap();
        assert_eq!(enc.state(), Lifecycle::Finished);
        assert!(matches!(enc.update(b"y"), Err(StreamError::InvalidState(_))));

        // re-keying starts a fresh message
        enc.initialise(&[0; 16], &[0; 16]).unwrap();
        enc.update(b"x").unwrap();
        enc.finish().unwrap();
        assert_eq!(enc.ciphertext().unwrap().len(), 1);
    }

    #[test]
    fn output_accessors_respect_direction() {
        let catalog = Catalog::opened();
        let mut enc = AuthenticatedCipher::encrypt(&catalog, "RC4", None).unwrap();
        assert!(matches!(enc.plaintext(), Err(StreamError::InvalidState(_))));
        let mut dec = AuthenticatedCipher::decrypt(&catalog, "RC4", None).unwrap();
        assert!(matches!(dec.ciphertext(), Err(StreamError::InvalidState(_))));
    }

    #[test]
    fn initialise_checks_lengths_and_keeps_state() {
        let catalog = Catalog::opened();
        let mut enc = AuthenticatedCipher::encrypt(&catalog, "AES-128-CBC", None).unwrap();

        let err = enc.initialise(b"abc", &[0; 16]).unwrap_err();
        assert_eq!(err.to_string(), "invalid parameter: invalid key length: expected 16, got 3");
        let err = enc.initialise(&[0; 16], &[0; 4]).unwrap_err();
        assert!(matches!(err, StreamError::InvalidParameter(ref m) if m.contains("ivector")));
        assert_eq!(enc.state(), Lifecycle::Uninitialised);
    }

    #[test]
    fn set_key_len_only_for_variable_ciphers() {
        let catalog = Catalog::opened();
        let mut aes = AuthenticatedCipher::encrypt(&catalog, "AES-128-CBC", None).unwrap();
        assert!(matches!(aes.set_key_len(16), Err(StreamError::InvalidParameter(_))));

        let mut rc4 = AuthenticatedCipher::encrypt(&catalog, "RC4", None).unwrap();
        assert!(rc4.set_key_len(0).is_err());
        assert!(rc4.set_key_len(33).is_err());
        rc4.set_key_len(32).unwrap();
        assert!(rc4.initialise(&[0; 16], &[]).is_err());
        rc4.initialise(&[0; 32], &[]).unwrap();
    }

    #[test]
    fn unaligned_input_without_padding_fails_on_finish() {
        let catalog = Catalog::opened();
        let mut enc = AuthenticatedCipher::encrypt(&catalog, "AES-128-CBC", None).unwrap();
        enc.initialise(&[0; 16], &[0; 16]).unwrap();
        enc.update(b"five!").unwrap();
        assert!(matches!(enc.finish(), Err(StreamError::InvalidParameter(_))));
    }

    #[test]
    fn unknown_algorithms_are_rejected() {
        let catalog = Catalog::opened();
        assert!(matches!(
            AuthenticatedCipher::encrypt(&catalog, "BLOWFISH", None),
            Err(StreamError::InvalidParameter(_))
        ));
        assert!(matches!(
            AuthenticatedCipher::encrypt(&catalog, "AES-128-CBC", Some("MD2")),
            Err(StreamError::InvalidParameter(_))
        ));
        assert!(matches!(
            AuthenticatedCipher::encrypt(&Catalog::new(), "AES-128-CBC", None),
            Err(StreamError::InvalidState(_))
        ));
    }

    #[test]
    fn accessors_describe_the_pipeline() {
        let catalog = Catalog::opened();
        let c = AuthenticatedCipher::decrypt(&catalog, "aes192", Some("sha-512")).unwrap();
        assert_eq!(c.algorithm(), "AES-192-CBC");
        assert_eq!(c.digest_algorithm(), Some("SHA512"));
        assert!(!c.is_encrypting());
        assert_eq!(c.key_len(), 24);
        assert_eq!(c.ivector_len(), 16);
        assert_eq!(c.block_size(), 16);
        assert_eq!(c.mode(), CipherMode::Cbc);
        assert_eq!(c.digest_size(), Some(64));
        assert!(!c.padding());
        assert_eq!(c.kinds(), vec![types::MEM, types::BUFFER, types::CIPHER]);
    }

    #[test]
    fn padding_cannot_change_mid_message() {
        let catalog = Catalog::opened();
        let mut enc = AuthenticatedCipher::encrypt(&catalog, "AES-128-CBC", None).unwrap();
        enc.initialise(&[0; 16], &[0; 16]).unwrap();
        enc.update(&[0; 16]).unwrap();
        assert!(matches!(enc.set_padding(true), Err(StreamError::InvalidState(_))));
        assert!(!enc.padding());
        enc.finish().unwrap();
        assert_eq!(enc.ciphertext().unwrap().len(), 16);

        // allowed once finished, applied by the next initialise
        enc.set_padding(true).unwrap();
        enc.initialise(&[0; 16], &[0; 16]).unwrap();
        enc.update(&[0; 16]).unwrap();
        enc.finish().unwrap();
        assert_eq!(enc.ciphertext().unwrap().len(), 32);
    }

    #[test]
    fn update_after_finish_leaves_output_alone() {
        let catalog = Catalog::opened();
        let mut enc = AuthenticatedCipher::encrypt(&catalog, "AES-128-CTR", Some("SHA1")).unwrap();
        enc.initialise(&[7; 16], &[9; 16]).unwrap();
        enc.update(b"payload").unwrap();
        enc.finish().unwrap();
        assert!(matches!(enc.update(b"more"), Err(StreamError::InvalidState(_))));
        assert_eq!(enc.ciphertext().unwrap().len(), 7 + 20);
    }

    #[test]
    fn pipeline_buffer_follows_config() {
        let catalog = Catalog::opened();
        let zero = IoConfig { buffer_size: 0, ..IoConfig::default() };
        assert!(matches!(
            AuthenticatedCipher::with_config(&catalog, Direction::Encrypt, "AES-128-CBC", None, zero),
            Err(StreamError::InvalidParameter(_))
        ));

        let tiny = IoConfig { buffer_size: 1, ..IoConfig::default() };
        let mut enc =
            AuthenticatedCipher::with_config(&catalog, Direction::Encrypt, "AES-128-CBC", Some("SHA256"), tiny)
                .unwrap();
        enc.set_padding(true).unwrap();
        enc.initialise(&[1; 16], &[2; 16]).unwrap();
        enc.update(b"one byte at a time").unwrap();
        enc.finish().unwrap();
        let ct = enc.ciphertext().unwrap();
        assert_eq!(open(&catalog, "AES-128-CBC", "SHA256", true, &[1; 16], &[2; 16], &ct).unwrap(), b"one byte at a time");
    }

    // ## 4️⃣ Tampering and catalog coverage

    #[test]
    fn every_tampered_cbc_byte_is_rejected() {
        let catalog = Catalog::opened();
        let (key, iv) = ([0x11u8; 16], [0x22u8; 16]);
        let ct = seal(&catalog, "AES-128-CBC", "SHA256", true, &key, &iv, b"attack at dawn");
        // 14 + 32 = 46 bytes, padded with two 0x02 bytes
        assert_eq!(ct.len(), 48);
        assert_eq!(open(&catalog, "AES-128-CBC", "SHA256", true, &key, &iv, &ct).unwrap(), b"attack at dawn");

        let mut at_finish = Vec::new();
        for i in 0..ct.len() {
            let mut bad = ct.clone();
            bad[i] ^= 0x01;
            match open(&catalog, "AES-128-CBC", "SHA256", true, &key, &iv, &bad) {
                Ok(_) => panic!("tampered byte {i} was accepted"),
                Err(Rejected::AtFinish) => at_finish.push(i),
                Err(Rejected::AtPlaintext) => {}
            }
        }
        // the penultimate block's last two bytes land on the padding
        assert!(at_finish.contains(&30));
        assert!(at_finish.contains(&31));
        // early blocks decrypt cleanly and only the tag catches them
        assert!(!at_finish.contains(&0));
        assert!(at_finish.iter().all(|&i| i >= 30));
    }

    #[test]
    fn every_tampered_ctr_byte_is_rejected() {
        let catalog = Catalog::opened();
        let (key, iv) = ([0x33u8; 16], [0x44u8; 16]);
        let ct = seal(&catalog, "AES-128-CTR", "SHA256", false, &key, &iv, b"attack at dawn");
        assert_eq!(ct.len(), 14 + 32);

        for i in 0..ct.len() {
            let mut bad = ct.clone();
            bad[i] ^= 0x80;
            assert_eq!(
                open(&catalog, "AES-128-CTR", "SHA256", false, &key, &iv, &bad),
                Err(Rejected::AtPlaintext),
                "byte {i}"
            );
        }
    }

    #[test]
    fn every_catalog_cipher_round_trips_with_digest() {
        let catalog = Catalog::opened();
        let names = catalog.enumerate(Category::Cipher);
        assert_eq!(names.len(), 10);
        for name in names {
            let spec = catalog.lookup_cipher(&name).unwrap();
            let padding = spec.is_block_mode();
            let key = vec![0x5a; spec.key_length];
            let iv = vec![0xa5; spec.iv_length];
            let data = b"the quick brown fox jumps over the lazy dog";

            let ct = seal(&catalog, &name, "SHA1", padding, &key, &iv, data);
            assert_ne!(&ct[..data.len().min(ct.len())], &data[..], "{name}");
            assert_eq!(open(&catalog, &name, "SHA1", padding, &key, &iv, &ct).unwrap(), data, "{name}");
        }
    }

    proptest! {
        #[test]
        fn ctr_round_trip_with_mac(
            data in proptest::collection::vec(any::<u8>(), 0..2048),
            key in proptest::array::uniform16(any::<u8>()),
            iv in proptest::array::uniform16(any::<u8>()),
        ) {
            let catalog = Catalog::opened();

            let mut enc = AuthenticatedCipher::encrypt(&catalog, "AES-128-CTR", Some("SHA3-256")).unwrap();
            enc.initialise(&key, &iv).unwrap();
            enc.update(&data).unwrap();
            enc.finish().unwrap();
            let ct = enc.ciphertext().unwrap();
            prop_assert_eq!(ct.len(), data.len() + 32);

            let mut dec = AuthenticatedCipher::decrypt(&catalog, "AES-128-CTR", Some("SHA3-256")).unwrap();
            dec.initialise(&key, &iv).unwrap();
            dec.update(&ct).unwrap();
            dec.finish().unwrap();
            prop_assert_eq!(dec.plaintext().unwrap(), data);
        }
    }
}
