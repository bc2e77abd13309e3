use bitcoin::hashes::{sha256d, Hash};
use bitcoin::secp256k1::SecretKey;
use proptest::prelude::*;

use keysmith::config::{Algorithm, KeyConfig, Network};
use keysmith::crypto;
use keysmith::encoding::{convert_key, convert_key_with, decode_wif, encode_wif};
use keysmith::wallet::{ChildNumber, ExtendedKey};
use keysmith::{keccak256, to_checksum_address};

fn any_secret_key() -> impl Strategy<Value = SecretKey> {
    prop::array::uniform32(any::<u8>()).prop_filter_map("valid secp256k1 scalar", |bytes| {
        SecretKey::from_slice(&bytes).ok()
    })
}

proptest! {
    #[test]
    fn checksum_addresses_roundtrip(bytes in prop::array::uniform20(any::<u8>())) {
        let checksummed = to_checksum_address(&bytes);
        prop_assert!(checksummed.starts_with("0x"));

        let tail = checksummed.trim_start_matches("0x");
        let lower_expected = hex::encode(bytes);
        prop_assert_eq!(tail.to_ascii_lowercase(), lower_expected.clone());

        let hash = keccak256(lower_expected.as_bytes());
        let mut expected = String::from("0x");
        for (i, ch) in lower_expected.chars().enumerate() {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if ch.is_ascii_digit() || nibble < 8 {
                expected.push(ch);
            } else {
                expected.push(ch.to_ascii_uppercase());
            }
        }
        prop_assert_eq!(checksummed, expected);
    }

    #[test]
    fn wif_checksums_hold(secret in any_secret_key(), testnet in any::<bool>(), compressed in any::<bool>()) {
        let network = Network::from_testnet_flag(testnet);
        let encoded = encode_wif(&secret.secret_bytes(), network, compressed);

        let decoded = bs58::decode(&encoded).into_vec().expect("decode base58");
        let body_len = if compressed { 34 } else { 33 };
        prop_assert_eq!(decoded.len(), body_len + 4);
        prop_assert_eq!(decoded[0], network.wif_version());
        if compressed {
            prop_assert_eq!(decoded[33], 0x01);
        }
        let checksum = sha256d::Hash::hash(&decoded[..body_len]);
        prop_assert_eq!(&decoded[body_len..], &checksum.to_byte_array()[..4]);

        let wif = decode_wif(&encoded).expect("decodes");
        prop_assert_eq!(wif.secret_bytes(), &secret.secret_bytes());
        prop_assert_eq!(wif.network, network);
        prop_assert_eq!(wif.compressed, compressed);
    }

    #[test]
    fn convert_key_round_trips(secret in any_secret_key(), testnet in any::<bool>()) {
        let hex_key = hex::encode(secret.secret_bytes());
        let config = KeyConfig::default().with_network(Network::from_testnet_flag(testnet));

        let wif = convert_key_with(&hex_key, &config).unwrap();
        prop_assert_eq!(convert_key(&wif).unwrap(), hex_key.clone());
        prop_assert_eq!(convert_key_with(&convert_key(&wif).unwrap(), &config).unwrap(), wif);
    }

    #[test]
    fn public_derivation_matches_private(
        seed in prop::array::uniform32(any::<u8>()),
        index in 0u32..0x8000_0000,
    ) {
        let master = ExtendedKey::new_master(&seed, Network::Mainnet).unwrap();
        let child = ChildNumber::normal(index).unwrap();

        let from_private = master.derive_child(child).unwrap();
        let from_public = master.neuter().derive_child(child).unwrap();
        prop_assert_eq!(from_private.public_key(), from_public.public_key());
        prop_assert_eq!(from_private.chain_code(), from_public.chain_code());
        prop_assert_eq!(from_private.neuter().to_base58(), from_public.to_base58());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn signatures_verify_and_detect_tampering(
        message in prop::collection::vec(any::<u8>(), 1..128),
        flip in any::<prop::sample::Index>(),
    ) {
        for algorithm in [Algorithm::Ecdsa, Algorithm::Secp256k1, Algorithm::Schnorr, Algorithm::Bls] {
            let key = crypto::generate(algorithm).unwrap();
            let signature = crypto::sign(algorithm, &key.private_key, &message).unwrap();
            prop_assert!(crypto::verify(algorithm, &key.public_key, &message, &signature).unwrap());

            let mut tampered = message.clone();
            let bit = flip.index(tampered.len() * 8);
            tampered[bit / 8] ^= 1 << (bit % 8);
            prop_assert!(!crypto::verify(algorithm, &key.public_key, &tampered, &signature).unwrap());
        }
    }
}
