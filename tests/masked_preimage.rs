//! Emulated SIGHASH_ANYPREVOUT via masked preimages
//!
//! One signature must authorize spending either of two different funding
//! outputs, as long as the spending transaction follows the same template.
//! The prevout-dependent preimage fields are zeroed before hashing.


use covenant_proof::crypto::hash256;
use covenant_proof::preimage::*;
use covenant_proof::state::decode_script_num;
use covenant_proof::types::*;
use test_helpers::*;

const LOCKED: Satoshis = 1_000;

/// Serialized preimage for spending output 0 of `funding` into `template_outputs`
fn spend_of(funding: &Transaction, template_outputs: &[TxOutput]) -> ByteString {
    let spending = create_test_tx(
        outpoint_of(funding, 0).txid,
        0,
        template_outputs.to_vec(),
    );
    compute_preimage(
        &spending,
        0,
        &funding.outputs[0].script,
        LOCKED,
        SighashType::SINGLE_ANYONECANPAY_FORKID,
    )
    .unwrap()
    .serialize()
}

fn two_spends() -> (ByteString, ByteString) {
    let lock = p2pkh_output([0x77; 20], LOCKED).script;
    let first = create_funding_tx(1, LOCKED, lock.clone());
    let second = create_funding_tx(2, LOCKED, lock);

    let template = [p2pkh_output([0x99; 20], LOCKED - 100)];
    (spend_of(&first, &template), spend_of(&second, &template))
}

#[test]
fn test_unmasked_preimages_differ() {
    let (a, b) = two_spends();
    assert_ne!(a, b);
    assert_ne!(&a[68..104], &b[68..104]);
    assert_eq!(&a[104..], &b[104..]);
}

#[test]
fn test_masked_preimages_match() {
    let (a, b) = two_spends();
    let masked_a = reconstruct_masked(&a, ANYPREVOUT_MASK).unwrap();
    let masked_b = reconstruct_masked(&b, ANYPREVOUT_MASK).unwrap();
    assert_eq!(masked_a, masked_b);
    assert_eq!(
        masked_digest(&a, ANYPREVOUT_MASK).unwrap(),
        hash256(&masked_a)
    );
}

#[test]
fn test_one_signature_spends_either_output() {
    let (a, b) = two_spends();
    let (secret, public) = create_keypair(0x21);
    let digest = masked_digest(&a, ANYPREVOUT_MASK).unwrap();
    let sig = sign_digest(&secret, digest).serialize_der();
    let pubkey = public.serialize();

    assert!(verify_masked_signature(&a, ANYPREVOUT_MASK, &sig, &pubkey));
    assert!(verify_masked_signature(&b, ANYPREVOUT_MASK, &sig, &pubkey));

    // Without masking the signature only matches the preimage it was made for
    assert!(!verify_masked_signature(&a, &[], &sig, &pubkey));
    assert!(!verify_masked_signature(&b, &[], &sig, &pubkey));

    // Wrong key
    let (_, other) = create_keypair(0x22);
    assert!(!verify_masked_signature(
        &a,
        ANYPREVOUT_MASK,
        &sig,
        &other.serialize()
    ));
}

#[test]
fn test_template_change_invalidates_signature() {
    let (a, _) = two_spends();
    let (secret, public) = create_keypair(0x21);
    let sig = sign_digest(&secret, masked_digest(&a, ANYPREVOUT_MASK).unwrap());

    let lock = p2pkh_output([0x77; 20], LOCKED).script;
    let funding = create_funding_tx(3, LOCKED, lock);
    let redirected = spend_of(&funding, &[p2pkh_output([0x98; 20], LOCKED - 100)]);
    assert!(!verify_masked_signature(
        &redirected,
        ANYPREVOUT_MASK,
        &sig.serialize_compact(),
        &public.serialize()
    ));
}

/// The digest is used as a big-endian scalar; signing its byte reversal fails
#[test]
fn test_digest_byte_order() {
    let (a, _) = two_spends();
    let (secret, public) = create_keypair(0x21);
    let digest = masked_digest(&a, ANYPREVOUT_MASK).unwrap();

    let mut reversed = digest;
    reversed.reverse();
    let wrong = sign_digest(&secret, reversed).serialize_compact();
    assert!(!verify_masked_signature(
        &a,
        ANYPREVOUT_MASK,
        &wrong,
        &public.serialize()
    ));

    // Script-number view: reverse(digest) || 00, little-endian, non-negative
    let num = digest_scalar_script_num(&digest);
    assert_eq!(num.len(), 33);
    assert_eq!(num[32], 0x00);
    assert_eq!(num[0], digest[31]);
    assert_eq!(num[31], digest[0]);

    // The low 8 bytes of the script number are the last 8 digest bytes, big-endian
    let mut low = [0u8; 8];
    low.copy_from_slice(&num[..8]);
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&digest[24..]);
    assert_eq!(u64::from_le_bytes(low), u64::from_be_bytes(tail));
}

#[test]
fn test_small_script_num_matches_big_endian_digest() {
    let mut digest = [0u8; 32];
    digest[30] = 0x01;
    digest[31] = 0x02;
    let num = digest_scalar_script_num(&digest);
    // Trim trailing zero padding to get the minimal script number
    let end = num.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    assert_eq!(decode_script_num(&num[..end]).unwrap(), 0x0102);
}

#[test]
fn test_preimage_fields_after_masking() {
    let (a, _) = two_spends();
    let masked = reconstruct_masked(&a, ANYPREVOUT_MASK).unwrap();
    let parsed = Preimage::parse(&masked).unwrap();
    assert_eq!(parsed.hash_prevouts(), &[0u8; 32]);
    assert_eq!(parsed.outpoint(), OutPoint { txid: [0; 32], index: 0 });
    assert_eq!(parsed.value(), LOCKED);
    assert_eq!(parsed.sighash_flags().unwrap(), SighashType::SINGLE_ANYONECANPAY_FORKID);
}
