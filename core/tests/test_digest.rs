// ## 1️⃣ Plain digests (known answers for "abc")

use tlsio_core::crypto::{Catalog, DigestAlg, DigestState, KeyedDigest};

#[test]
fn digest_state_known_answers() {
    let cases: &[(DigestAlg, &str)] = &[
        (DigestAlg::Sha1, "a9993e364706816aba3e25717850c26c9cd0d89d"),
        (DigestAlg::Sha224, "23097d223405d8228642a477bda255b32aadbce4bda0b3f7e36c9da7"),
        (DigestAlg::Sha256, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"),
        (
            DigestAlg::Sha384,
            "cb00753f45a35e8bb5a03d699ac65007272c32ab0eded1631a8b605a43ff5bed8086072ba1e7cc2358baeca134c825a7",
        ),
        (
            DigestAlg::Sha512,
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f",
        ),
        (DigestAlg::Sha3_256, "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"),
        (
            DigestAlg::Sha3_512,
            "b751850b1a57168a5693cd924b6b096e08f621827444f70d884f5d0240d2712e10e116e9192af3c91a7ec57647e3934057340b4cf408d5a56592f8274eec53f0",
        ),
    ];
    for (alg, expected) in cases {
        let mut state = DigestState::new(*alg);
        state.update(b"a");
        state.update(b"bc");
        assert_eq!(hex::encode(state.finalize()), *expected, "{alg:?}");
    }
}

// ## 2️⃣ Streaming parity and reset

#[test]
fn peek_does_not_disturb_state() {
    let mut state = DigestState::new(DigestAlg::Sha256);
    state.update(b"ab");
    let early = state.peek();
    state.update(b"c");
    assert_ne!(early, state.peek());
    assert_eq!(
        hex::encode(state.peek()),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );

    state.reset();
    assert_eq!(state.alg(), DigestAlg::Sha256);
    assert_eq!(state.peek(), DigestState::new(DigestAlg::Sha256).finalize());
}

#[test]
fn catalog_sizes_match_output_lengths() {
    let catalog = Catalog::opened();
    for name in catalog.enumerate(tlsio_core::crypto::Category::Digest) {
        let spec = catalog.lookup_digest(&name).unwrap();
        assert_eq!(DigestState::new(spec.alg).finalize().len(), spec.digest_size, "{name}");
    }
}

// ## 3️⃣ Keyed digests (RFC 2202 / RFC 4231 case 2)

#[test]
fn keyed_digest_known_answers() {
    let catalog = Catalog::opened();

    let mut mac = KeyedDigest::new(catalog.lookup_digest("SHA256").unwrap(), b"Jefe").unwrap();
    mac.update(b"what do ya want for nothing?");
    assert_eq!(
        hex::encode(mac.tag()),
        "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
    );

    let mut mac = KeyedDigest::new(catalog.lookup_digest("SHA1").unwrap(), b"Jefe").unwrap();
    mac.update(b"what do ya want ");
    mac.update(b"for nothing?");
    assert_eq!(hex::encode(mac.tag()), "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79");
    assert_eq!(mac.digest_size(), 20);
}

#[test]
fn keyed_digest_verify() {
    let catalog = Catalog::opened();
    let spec = catalog.lookup_digest("SHA3-256").unwrap();

    let mut sender = KeyedDigest::new(spec, b"key").unwrap();
    sender.update(b"message");
    let tag = sender.tag();

    let receiver = KeyedDigest::new(spec, b"key").unwrap();
    assert!(receiver.verify(b"message", &tag));
    assert!(!receiver.verify(b"massage", &tag));
    assert!(!receiver.verify(b"message", &tag[..31]));

    let other_key = KeyedDigest::new(spec, b"yek").unwrap();
    assert!(!other_key.verify(b"message", &tag));

    // verify leaves the receiver usable
    assert!(receiver.verify(b"message", &tag));
}
